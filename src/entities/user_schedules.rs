use sea_orm::entity::prelude::*;

/// Per-user, per-day-of-week shift window. Read-only input to the
/// force-logout sweep; never mutated by the background core.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// 0 = Sunday through 6 = Saturday.
    pub day_of_week: i32,

    /// "HH:MM:SS" wall-clock times.
    pub shift_start: Option<String>,

    pub shift_end: Option<String>,

    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
