use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::sessions;

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn open(
        &self,
        user_id: i32,
        ip_address: Option<&str>,
        start_time: &str,
    ) -> Result<sessions::Model> {
        let active = sessions::ActiveModel {
            user_id: Set(user_id),
            start_time: Set(start_time.to_string()),
            end_time: Set(None),
            ip_address: Set(ip_address.map(ToString::to_string)),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to open session")
    }

    pub async fn get(&self, id: i32) -> Result<Option<sessions::Model>> {
        sessions::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query session")
    }

    pub async fn active_for_user(&self, user_id: i32) -> Result<Vec<sessions::Model>> {
        sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::EndTime.is_null())
            .all(&self.conn)
            .await
            .context("Failed to list active sessions")
    }

    /// Close every active session for a user. The `end_time IS NULL`
    /// predicate makes the close a one-shot transition even when two sweep
    /// runs overlap.
    pub async fn close_active_for_user(&self, user_id: i32, end_time: &str) -> Result<u64> {
        let result = sessions::Entity::update_many()
            .col_expr(
                sessions::Column::EndTime,
                sea_orm::sea_query::Expr::value(end_time),
            )
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::EndTime.is_null())
            .exec(&self.conn)
            .await
            .context("Failed to close active sessions")?;

        Ok(result.rows_affected)
    }
}
