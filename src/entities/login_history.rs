use sea_orm::entity::prelude::*;

pub const STATUS_SUCCESS: &str = "Success";
pub const STATUS_FAILED: &str = "Failed";
pub const STATUS_FORCED: &str = "Forced";

/// Append-only trail of login/logout/forced-logout events.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "login_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// One of `STATUS_SUCCESS`, `STATUS_FAILED`, `STATUS_FORCED`.
    pub status: String,

    pub remark: Option<String>,

    pub ip_address: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
