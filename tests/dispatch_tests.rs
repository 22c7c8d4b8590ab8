//! Notification dispatch: delivery, retry backoff, terminal failure and
//! acknowledgment flows, with in-memory transport doubles.

use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use yardman::auth::LegacyHasher;
use yardman::clients::{GatewayChannel, MailMessage, MailTransport, MessageGateway};
use yardman::db::{NewNotification, NewUser, Store};
use yardman::jobs::{DispatchSettings, NotificationDispatchJob};

async fn test_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("yardman-dispatch-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test store")
}

#[derive(Default)]
struct RecordingMail {
    sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl MailTransport for RecordingMail {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

struct FailingMail;

#[async_trait]
impl MailTransport for FailingMail {
    async fn send(&self, _message: &MailMessage) -> Result<()> {
        bail!("relay down")
    }
}

#[derive(Default)]
struct RecordingGateway {
    submissions: Mutex<Vec<(GatewayChannel, i32)>>,
}

#[async_trait]
impl MessageGateway for RecordingGateway {
    async fn submit(
        &self,
        channel: GatewayChannel,
        user_id: i32,
        _subject: &str,
        _body: &str,
    ) -> Result<()> {
        self.submissions.lock().unwrap().push((channel, user_id));
        Ok(())
    }
}

fn settings() -> DispatchSettings {
    DispatchSettings {
        batch_size: 100,
        max_retries: 3,
        backoff_minutes: vec![1, 5, 10],
        admin_user_id: None,
    }
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap()
}

fn due_email(now: DateTime<Utc>, to: &str) -> NewNotification {
    NewNotification {
        to_email: Some(to.to_string()),
        subject: "Gate pass ready".to_string(),
        message: "Your gate pass for tomorrow is ready.".to_string(),
        trigger_date: (now - Duration::minutes(1)).to_rfc3339(),
        ..NewNotification::default()
    }
}

async fn create_user_with_email(store: &Store, username: &str, email: Option<&str>) -> i32 {
    let hashed = LegacyHasher::hash("pw");
    store
        .create_user(NewUser {
            username: username.to_string(),
            password_hash: hashed.hash,
            salt: Some(hashed.salt),
            email: email.map(str::to_string),
            archived: false,
            force_logout_enabled: false,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn email_notification_is_delivered_and_marked() {
    let store = test_store().await;
    let now = fixed_now();
    let mail = Arc::new(RecordingMail::default());
    let job = NotificationDispatchJob::new(
        store.clone(),
        mail.clone(),
        Arc::new(RecordingGateway::default()),
        settings(),
    );

    let created = store
        .enqueue_notification(due_email(now, "yard@example.com"))
        .await
        .unwrap();

    let summary = job.run_at(now).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.delivered, 1);

    let row = store.get_notification(created.id).await.unwrap().unwrap();
    assert!(row.delivered);
    assert!(row.sent_date.is_some());

    let sent = mail.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "yard@example.com");
    assert_eq!(sent[0].subject, "Gate pass ready");
}

#[tokio::test]
async fn delivered_rows_are_not_dispatched_again() {
    let store = test_store().await;
    let now = fixed_now();
    let mail = Arc::new(RecordingMail::default());
    let job = NotificationDispatchJob::new(
        store.clone(),
        mail.clone(),
        Arc::new(RecordingGateway::default()),
        settings(),
    );

    store
        .enqueue_notification(due_email(now, "once@example.com"))
        .await
        .unwrap();

    job.run_at(now).await.unwrap();
    let second = job.run_at(now).await.unwrap();

    assert_eq!(second.processed, 0);
    assert_eq!(mail.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn recipient_falls_back_to_user_profile_email() {
    let store = test_store().await;
    let now = fixed_now();
    let user_id = create_user_with_email(&store, "crane-op", Some("crane@example.com")).await;

    let mail = Arc::new(RecordingMail::default());
    let job = NotificationDispatchJob::new(
        store.clone(),
        mail.clone(),
        Arc::new(RecordingGateway::default()),
        settings(),
    );

    store
        .enqueue_notification(NewNotification {
            to_user: Some(user_id),
            subject: "Maintenance window".to_string(),
            message: "Crane 3 is down tonight.".to_string(),
            trigger_date: (now - Duration::minutes(1)).to_rfc3339(),
            ..NewNotification::default()
        })
        .await
        .unwrap();

    let summary = job.run_at(now).await.unwrap();
    assert_eq!(summary.delivered, 1);
    assert_eq!(mail.sent.lock().unwrap()[0].to, "crane@example.com");
}

#[tokio::test]
async fn failure_pushes_trigger_forward_for_retry() {
    let store = test_store().await;
    let now = fixed_now();
    let job = NotificationDispatchJob::new(
        store.clone(),
        Arc::new(FailingMail),
        Arc::new(RecordingGateway::default()),
        settings(),
    );

    let created = store
        .enqueue_notification(due_email(now, "retry@example.com"))
        .await
        .unwrap();

    let summary = job.run_at(now).await.unwrap();
    assert_eq!(summary.retried, 1);
    assert_eq!(summary.permanently_failed, 0);

    let row = store.get_notification(created.id).await.unwrap().unwrap();
    assert_eq!(row.retry_count, 1);
    assert!(row.error_message.as_deref().unwrap().contains("relay down"));
    assert!(row.trigger_date.as_str() > now.to_rfc3339().as_str());
    assert!(!row.delivered);

    // Not due again at the same instant; the pushed trigger is the backoff.
    let again = job.run_at(now).await.unwrap();
    assert_eq!(again.processed, 0);
}

#[tokio::test]
async fn exhausted_retries_fail_permanently_and_alert_the_sender() {
    let store = test_store().await;
    let now = fixed_now();
    let sender = create_user_with_email(&store, "dispatcher", Some("d@example.com")).await;

    let job = NotificationDispatchJob::new(
        store.clone(),
        Arc::new(FailingMail),
        Arc::new(RecordingGateway::default()),
        settings(),
    );

    let created = store
        .enqueue_notification(NewNotification {
            from_user: Some(sender),
            to_email: Some("dead-letter@example.com".to_string()),
            subject: "Berth change".to_string(),
            message: "Vessel moved to berth 7.".to_string(),
            trigger_date: (now - Duration::minutes(1)).to_rfc3339(),
            ack_required: true,
            ..NewNotification::default()
        })
        .await
        .unwrap();

    // Walk the clock past each backoff step (1, 5, 10 minutes).
    let first = job.run_at(now).await.unwrap();
    assert_eq!(first.retried, 1);

    let second = job.run_at(now + Duration::minutes(2)).await.unwrap();
    assert_eq!(second.retried, 1);

    let third = job.run_at(now + Duration::minutes(8)).await.unwrap();
    assert_eq!(third.permanently_failed, 1);

    let row = store.get_notification(created.id).await.unwrap().unwrap();
    assert_eq!(row.retry_count, 3);
    assert!(!row.delivered);

    // Exactly one failure alert went back to the sender, pre-marked
    // delivered so it never dispatches itself.
    let alerts = store.notifications_for_user(sender).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].subject, "Notification Delivery Failure");
    assert!(alerts[0].delivered);

    // The row is past max retries and never selected again.
    let afterwards = job.run_at(now + Duration::days(1)).await.unwrap();
    assert_eq!(afterwards.processed, 0);
}

#[tokio::test]
async fn ack_required_delivery_queues_a_confirmation() {
    let store = test_store().await;
    let now = fixed_now();
    let sender = create_user_with_email(&store, "foreman", None).await;

    let job = NotificationDispatchJob::new(
        store.clone(),
        Arc::new(RecordingMail::default()),
        Arc::new(RecordingGateway::default()),
        settings(),
    );

    store
        .enqueue_notification(NewNotification {
            from_user: Some(sender),
            to_email: Some("ack@example.com".to_string()),
            subject: "Customs hold released".to_string(),
            message: "Container MSKU1234567 cleared.".to_string(),
            trigger_date: (now - Duration::minutes(1)).to_rfc3339(),
            ack_required: true,
            ..NewNotification::default()
        })
        .await
        .unwrap();

    let summary = job.run_at(now).await.unwrap();
    assert_eq!(summary.delivered, 1);

    let acks = store.notifications_for_user(sender).await.unwrap();
    assert_eq!(acks.len(), 1);
    assert_eq!(acks[0].subject, "Delivery Confirmation");
    assert!(acks[0].delivered);
    assert!(acks[0].message.contains("Customs hold released"));
}

#[tokio::test]
async fn gateway_channels_are_submitted_per_flag() {
    let store = test_store().await;
    let now = fixed_now();
    let user_id = create_user_with_email(&store, "pager-user", Some("p@example.com")).await;

    let gateway = Arc::new(RecordingGateway::default());
    let mail = Arc::new(RecordingMail::default());
    let job = NotificationDispatchJob::new(store.clone(), mail.clone(), gateway.clone(), settings());

    store
        .enqueue_notification(NewNotification {
            to_user: Some(user_id),
            subject: "Reefer alarm".to_string(),
            message: "Temperature excursion on reefer row C.".to_string(),
            trigger_date: (now - Duration::minutes(1)).to_rfc3339(),
            notify_email: false,
            notify_sms: true,
            notify_phone: true,
            ..NewNotification::default()
        })
        .await
        .unwrap();

    let summary = job.run_at(now).await.unwrap();
    assert_eq!(summary.delivered, 1);

    let submissions = gateway.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 2);
    assert!(submissions.contains(&(GatewayChannel::Sms, user_id)));
    assert!(submissions.contains(&(GatewayChannel::Phone, user_id)));

    // No email flag set and a gateway channel was requested, so the mail
    // transport stays untouched.
    assert!(mail.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn screen_only_notification_delivers_without_transport() {
    let store = test_store().await;
    let now = fixed_now();
    let mail = Arc::new(RecordingMail::default());
    let gateway = Arc::new(RecordingGateway::default());
    let job = NotificationDispatchJob::new(store.clone(), mail.clone(), gateway.clone(), settings());

    // No email or gateway flags and no recipient address at all; the row
    // itself is the in-app message.
    let created = store
        .enqueue_notification(NewNotification {
            subject: "Yard meeting at 15:00".to_string(),
            message: "Briefing room 2.".to_string(),
            trigger_date: (now - Duration::minutes(1)).to_rfc3339(),
            notify_email: false,
            ..NewNotification::default()
        })
        .await
        .unwrap();

    let summary = job.run_at(now).await.unwrap();
    assert_eq!(summary.delivered, 1);

    let row = store.get_notification(created.id).await.unwrap().unwrap();
    assert!(row.delivered);
    assert!(mail.sent.lock().unwrap().is_empty());
    assert!(gateway.submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn notification_without_recipient_is_retried_not_crashed() {
    let store = test_store().await;
    let now = fixed_now();
    let job = NotificationDispatchJob::new(
        store.clone(),
        Arc::new(RecordingMail::default()),
        Arc::new(RecordingGateway::default()),
        settings(),
    );

    let created = store
        .enqueue_notification(NewNotification {
            subject: "Orphan".to_string(),
            message: "No recipient at all.".to_string(),
            trigger_date: (now - Duration::minutes(1)).to_rfc3339(),
            ..NewNotification::default()
        })
        .await
        .unwrap();

    let summary = job.run_at(now).await.unwrap();
    assert_eq!(summary.retried, 1);

    let row = store.get_notification(created.id).await.unwrap().unwrap();
    assert!(row.error_message.as_deref().unwrap().contains("no recipient"));
}

#[tokio::test]
async fn soft_deleted_notifications_are_skipped() {
    let store = test_store().await;
    let now = fixed_now();
    let mail = Arc::new(RecordingMail::default());
    let job = NotificationDispatchJob::new(
        store.clone(),
        mail.clone(),
        Arc::new(RecordingGateway::default()),
        settings(),
    );

    let created = store
        .enqueue_notification(due_email(now, "gone@example.com"))
        .await
        .unwrap();
    store
        .soft_delete_notification(created.id, &now.to_rfc3339())
        .await
        .unwrap();

    let summary = job.run_at(now).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert!(mail.sent.lock().unwrap().is_empty());
}
