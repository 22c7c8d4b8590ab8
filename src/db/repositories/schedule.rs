use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::user_schedules;

pub struct ScheduleRepository {
    conn: DatabaseConnection,
}

impl ScheduleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// The active schedule row for a user on a given day (0 = Sunday).
    pub async fn get_active_for_day(
        &self,
        user_id: i32,
        day_of_week: i32,
    ) -> Result<Option<user_schedules::Model>> {
        user_schedules::Entity::find()
            .filter(user_schedules::Column::UserId.eq(user_id))
            .filter(user_schedules::Column::DayOfWeek.eq(day_of_week))
            .filter(user_schedules::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query user schedule")
    }

    pub async fn set(
        &self,
        user_id: i32,
        day_of_week: i32,
        shift_start: Option<&str>,
        shift_end: Option<&str>,
        is_active: bool,
    ) -> Result<user_schedules::Model> {
        let active = user_schedules::ActiveModel {
            user_id: Set(user_id),
            day_of_week: Set(day_of_week),
            shift_start: Set(shift_start.map(ToString::to_string)),
            shift_end: Set(shift_end.map(ToString::to_string)),
            is_active: Set(is_active),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert user schedule")
    }
}
