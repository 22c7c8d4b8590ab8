use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::scheduled_notifications;

/// Input for enqueueing a notification. Producers (booking scan, manual UI
/// actions, ack synthesis) fill in what they need; everything else defaults
/// to an undelivered screen+email message.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub from_user: Option<i32>,
    pub to_user: Option<i32>,
    pub to_email: Option<String>,
    pub subject: String,
    pub message: String,
    pub trigger_date: String,
    pub notify_screen: bool,
    pub notify_email: bool,
    pub notify_sms: bool,
    pub notify_phone: bool,
    pub notify_fax: bool,
    pub ack_required: bool,
    /// Pre-marked delivered rows (acks, admin alerts) are never dispatched.
    pub delivered: bool,
    pub sent_date: Option<String>,
}

impl Default for NewNotification {
    fn default() -> Self {
        Self {
            from_user: None,
            to_user: None,
            to_email: None,
            subject: String::new(),
            message: String::new(),
            trigger_date: chrono::Utc::now().to_rfc3339(),
            notify_screen: true,
            notify_email: true,
            notify_sms: false,
            notify_phone: false,
            notify_fax: false,
            ack_required: false,
            delivered: false,
            sent_date: None,
        }
    }
}

pub struct NotificationRepository {
    conn: DatabaseConnection,
}

impl NotificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, n: NewNotification) -> Result<scheduled_notifications::Model> {
        let active = scheduled_notifications::ActiveModel {
            from_user: Set(n.from_user),
            to_user: Set(n.to_user),
            to_email: Set(n.to_email),
            subject: Set(n.subject),
            message: Set(n.message),
            trigger_date: Set(n.trigger_date),
            notify_screen: Set(n.notify_screen),
            notify_screen2: Set(false),
            notify_email: Set(n.notify_email),
            notify_email2: Set(false),
            notify_sms: Set(n.notify_sms),
            notify_sms2: Set(false),
            notify_phone: Set(n.notify_phone),
            notify_phone2: Set(false),
            notify_fax: Set(n.notify_fax),
            notify_fax2: Set(false),
            delivered: Set(n.delivered),
            sent_date: Set(n.sent_date),
            retry_count: Set(0),
            error_message: Set(None),
            ack_required: Set(n.ack_required),
            ack_date: Set(None),
            deleted_at: Set(None),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to enqueue notification")
    }

    /// Due rows: triggered, undelivered, retries not exhausted, not
    /// soft-deleted. FIFO by trigger date, capped at `limit`.
    pub async fn due(
        &self,
        now: &str,
        max_retries: i32,
        limit: u64,
    ) -> Result<Vec<scheduled_notifications::Model>> {
        scheduled_notifications::Entity::find()
            .filter(scheduled_notifications::Column::TriggerDate.lte(now))
            .filter(scheduled_notifications::Column::Delivered.eq(false))
            .filter(scheduled_notifications::Column::RetryCount.lt(max_retries))
            .filter(scheduled_notifications::Column::DeletedAt.is_null())
            .order_by_asc(scheduled_notifications::Column::TriggerDate)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query due notifications")
    }

    pub async fn get(&self, id: i32) -> Result<Option<scheduled_notifications::Model>> {
        scheduled_notifications::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query notification")
    }

    pub async fn mark_delivered(&self, id: i32, sent_date: &str) -> Result<()> {
        let Some(model) = self.get(id).await? else {
            return Ok(());
        };

        let mut active: scheduled_notifications::ActiveModel = model.into();
        active.delivered = Set(true);
        active.sent_date = Set(Some(sent_date.to_string()));
        active.error_message = Set(None);
        active.update(&self.conn).await.context("Failed to mark notification delivered")?;
        Ok(())
    }

    /// Record a failed attempt: bump the retry count, keep the error, and
    /// push the trigger forward so the due-predicate enforces the backoff.
    pub async fn record_failure(
        &self,
        id: i32,
        retry_count: i32,
        error_message: &str,
        next_trigger: &str,
    ) -> Result<()> {
        let Some(model) = self.get(id).await? else {
            return Ok(());
        };

        let mut active: scheduled_notifications::ActiveModel = model.into();
        active.retry_count = Set(retry_count);
        active.error_message = Set(Some(error_message.to_string()));
        active.trigger_date = Set(next_trigger.to_string());
        active.update(&self.conn).await.context("Failed to record delivery failure")?;
        Ok(())
    }

    pub async fn soft_delete(&self, id: i32, deleted_at: &str) -> Result<()> {
        let Some(model) = self.get(id).await? else {
            return Ok(());
        };

        let mut active: scheduled_notifications::ActiveModel = model.into();
        active.deleted_at = Set(Some(deleted_at.to_string()));
        active.update(&self.conn).await.context("Failed to soft-delete notification")?;
        Ok(())
    }

    pub async fn list_for_user(&self, to_user: i32) -> Result<Vec<scheduled_notifications::Model>> {
        scheduled_notifications::Entity::find()
            .filter(scheduled_notifications::Column::ToUser.eq(to_user))
            .order_by_asc(scheduled_notifications::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list notifications for user")
    }

    pub async fn list_all(&self) -> Result<Vec<scheduled_notifications::Model>> {
        scheduled_notifications::Entity::find()
            .order_by_asc(scheduled_notifications::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list notifications")
    }
}
