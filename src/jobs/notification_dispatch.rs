//! Multi-channel notification dispatch.
//!
//! Each tick selects due notifications (triggered, undelivered, retries not
//! exhausted, not soft-deleted) FIFO by trigger date, capped at the batch
//! size, and attempts delivery. Failures are modeled as a typed
//! [`DeliveryError`] inside the job and only turned into retry state
//! (retry_count, error_message, pushed-forward trigger date) at the job
//! boundary — the due-predicate itself then enforces the backoff schedule.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::clients::{GatewayChannel, MailMessage, MailTransport, MessageGateway};
use crate::config::JobsConfig;
use crate::db::{NewNotification, Store};
use crate::entities::scheduled_notifications;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("no recipient address could be resolved")]
    NoRecipient,

    #[error("delivery failed: {0}")]
    Transient(String),
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub batch_size: u64,
    pub max_retries: i32,
    pub backoff_minutes: Vec<i64>,
    pub admin_user_id: Option<i32>,
}

impl From<&JobsConfig> for DispatchSettings {
    fn from(jobs: &JobsConfig) -> Self {
        Self {
            batch_size: jobs.notification_batch_size,
            max_retries: jobs.notification_max_retries,
            backoff_minutes: jobs.notification_backoff_minutes.clone(),
            admin_user_id: jobs.admin_user_id,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchSummary {
    pub processed: usize,
    pub delivered: usize,
    pub retried: usize,
    pub permanently_failed: usize,
}

pub struct NotificationDispatchJob {
    store: Store,
    mail: Arc<dyn MailTransport>,
    gateway: Arc<dyn MessageGateway>,
    settings: DispatchSettings,
}

impl NotificationDispatchJob {
    #[must_use]
    pub fn new(
        store: Store,
        mail: Arc<dyn MailTransport>,
        gateway: Arc<dyn MessageGateway>,
        settings: DispatchSettings,
    ) -> Self {
        Self { store, mail, gateway, settings }
    }

    pub async fn run(&self) -> Result<DispatchSummary> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<DispatchSummary> {
        let now_str = now.to_rfc3339();
        let due = self
            .store
            .due_notifications(&now_str, self.settings.max_retries, self.settings.batch_size)
            .await?;

        let mut summary = DispatchSummary::default();

        for notification in due {
            // Re-read before acting: a concurrent run (or a manual delete)
            // may have finished this row since the batch was selected.
            let Some(current) = self.store.get_notification(notification.id).await? else {
                continue;
            };
            if current.delivered || current.deleted_at.is_some() {
                debug!(notification = current.id, "Skipping already-settled notification");
                continue;
            }

            summary.processed += 1;

            match self.attempt(&current).await {
                Ok(()) => {
                    self.store.mark_notification_delivered(current.id, &now_str).await?;
                    summary.delivered += 1;

                    if current.ack_required
                        && let Some(sender) = current.from_user
                    {
                        self.enqueue_ack(&current, sender, &now_str).await?;
                    }
                }
                Err(err) => {
                    if self.handle_failure(&current, &err, now).await? {
                        summary.permanently_failed += 1;
                    } else {
                        summary.retried += 1;
                    }
                }
            }
        }

        if summary.processed > 0 {
            info!(
                processed = summary.processed,
                delivered = summary.delivered,
                retried = summary.retried,
                failed = summary.permanently_failed,
                "Notification dispatch tick complete"
            );
        }

        Ok(summary)
    }

    async fn attempt(&self, n: &scheduled_notifications::Model) -> Result<(), DeliveryError> {
        let wants_gateway = n.notify_sms
            || n.notify_sms2
            || n.notify_phone
            || n.notify_phone2
            || n.notify_fax
            || n.notify_fax2;
        let wants_email = n.notify_email || n.notify_email2;

        // Screen notifications need no transport; the row itself is what the
        // user sees in-app. A screen-only message delivers immediately.
        if !wants_email && !wants_gateway {
            return Ok(());
        }

        if wants_email {
            let recipient = self.resolve_recipient(n).await?;
            let message = MailMessage {
                to: recipient,
                subject: n.subject.clone(),
                body: n.message.clone(),
            };
            self.mail
                .send(&message)
                .await
                .map_err(|e| DeliveryError::Transient(e.to_string()))?;
        }

        if wants_gateway {
            let Some(user_id) = n.to_user else {
                return Err(DeliveryError::NoRecipient);
            };

            let channels = [
                (n.notify_sms || n.notify_sms2, GatewayChannel::Sms),
                (n.notify_phone || n.notify_phone2, GatewayChannel::Phone),
                (n.notify_fax || n.notify_fax2, GatewayChannel::Fax),
            ];

            for (enabled, channel) in channels {
                if enabled {
                    self.gateway
                        .submit(channel, user_id, &n.subject, &n.message)
                        .await
                        .map_err(|e| DeliveryError::Transient(e.to_string()))?;
                }
            }
        }

        Ok(())
    }

    /// Explicit to_email override wins; otherwise the recipient user's
    /// profile email.
    async fn resolve_recipient(
        &self,
        n: &scheduled_notifications::Model,
    ) -> Result<String, DeliveryError> {
        if let Some(email) = n.to_email.as_deref()
            && !email.is_empty()
        {
            return Ok(email.to_string());
        }

        if let Some(user_id) = n.to_user {
            let user = self
                .store
                .get_user(user_id)
                .await
                .map_err(|e| DeliveryError::Transient(e.to_string()))?;

            if let Some(email) = user.and_then(|u| u.email)
                && !email.is_empty()
            {
                return Ok(email);
            }
        }

        Err(DeliveryError::NoRecipient)
    }

    /// Record the failure and push the trigger date forward per the backoff
    /// schedule. Returns true when the notification has failed permanently.
    async fn handle_failure(
        &self,
        n: &scheduled_notifications::Model,
        err: &DeliveryError,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let retry_count = n.retry_count + 1;

        let backoff_index = usize::try_from(n.retry_count.max(0)).unwrap_or(0);
        let backoff = self
            .settings
            .backoff_minutes
            .get(backoff_index)
            .or_else(|| self.settings.backoff_minutes.last())
            .copied()
            .unwrap_or(1);
        let next_trigger = (now + Duration::minutes(backoff)).to_rfc3339();

        self.store
            .record_notification_failure(n.id, retry_count, &err.to_string(), &next_trigger)
            .await?;

        if retry_count < self.settings.max_retries {
            warn!(
                notification = n.id,
                attempt = retry_count,
                error = %err,
                "Notification delivery failed, will retry"
            );
            return Ok(false);
        }

        error!(
            notification = n.id,
            attempts = retry_count,
            error = %err,
            "Notification delivery failed permanently"
        );

        if n.ack_required {
            self.enqueue_admin_alert(n, err, now).await?;
        }

        Ok(true)
    }

    /// Delivery confirmation back to the original sender, pre-marked
    /// delivered so it is never dispatched itself.
    async fn enqueue_ack(
        &self,
        original: &scheduled_notifications::Model,
        sender: i32,
        sent_date: &str,
    ) -> Result<()> {
        self.store
            .enqueue_notification(NewNotification {
                from_user: original.to_user,
                to_user: Some(sender),
                subject: "Delivery Confirmation".to_string(),
                message: format!(
                    "Notification \"{}\" was delivered on {sent_date}",
                    original.subject
                ),
                trigger_date: sent_date.to_string(),
                notify_screen: true,
                notify_email: false,
                delivered: true,
                sent_date: Some(sent_date.to_string()),
                ..NewNotification::default()
            })
            .await?;

        debug!(notification = original.id, to_user = sender, "Queued delivery confirmation");
        Ok(())
    }

    /// Terminal-failure alert. Goes to the original sender when known,
    /// otherwise the configured admin; pre-marked delivered, never retried.
    async fn enqueue_admin_alert(
        &self,
        original: &scheduled_notifications::Model,
        err: &DeliveryError,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let Some(recipient) = original.from_user.or(self.settings.admin_user_id) else {
            warn!(
                notification = original.id,
                "No recipient for terminal-failure alert; skipping"
            );
            return Ok(());
        };

        let now_str = now.to_rfc3339();
        self.store
            .enqueue_notification(NewNotification {
                from_user: None,
                to_user: Some(recipient),
                subject: "Notification Delivery Failure".to_string(),
                message: format!(
                    "Notification \"{}\" (id {}) could not be delivered after {} attempts: {err}",
                    original.subject,
                    original.id,
                    self.settings.max_retries,
                ),
                trigger_date: now_str.clone(),
                notify_screen: true,
                notify_email: false,
                delivered: true,
                sent_date: Some(now_str),
                ..NewNotification::default()
            })
            .await?;

        Ok(())
    }
}
