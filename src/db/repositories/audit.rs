use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::audit_logs;

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// One-way append. The background core never reads these back.
    pub async fn add(
        &self,
        action: &str,
        description: &str,
        module: &str,
        record_id: Option<i32>,
        user_id: Option<i32>,
        ip_address: Option<&str>,
    ) -> Result<()> {
        let active = audit_logs::ActiveModel {
            action: Set(action.to_string()),
            description: Set(description.to_string()),
            module: Set(module.to_string()),
            record_id: Set(record_id),
            user_id: Set(user_id),
            ip_address: Set(ip_address.map(ToString::to_string)),
            date_added: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        audit_logs::Entity::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to append audit log")?;
        Ok(())
    }

    pub async fn list_by_module(&self, module: &str) -> Result<Vec<audit_logs::Model>> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::Module.eq(module))
            .order_by_asc(audit_logs::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list audit logs")
    }
}
