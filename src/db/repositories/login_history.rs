use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::login_history;

pub struct LoginHistoryRepository {
    conn: DatabaseConnection,
}

impl LoginHistoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        user_id: i32,
        status: &str,
        remark: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<()> {
        let active = login_history::ActiveModel {
            user_id: Set(user_id),
            status: Set(status.to_string()),
            remark: Set(remark.map(ToString::to_string)),
            ip_address: Set(ip_address.map(ToString::to_string)),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        login_history::Entity::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to append login history")?;
        Ok(())
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<login_history::Model>> {
        login_history::Entity::find()
            .filter(login_history::Column::UserId.eq(user_id))
            .order_by_desc(login_history::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list login history")
    }
}
