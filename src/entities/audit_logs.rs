use sea_orm::entity::prelude::*;

/// Append-only record of every state-changing action performed by the
/// background core. Write-only from this crate's point of view.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub action: String,

    pub description: String,

    pub module: String,

    pub record_id: Option<i32>,

    pub user_id: Option<i32>,

    pub ip_address: Option<String>,

    pub date_added: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
