use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::entities::{
    bookings, clients, login_history, scheduled_notifications, sessions, user_schedules, users,
};

pub mod migrator;
pub mod repositories;

pub use repositories::booking::NewBooking;
pub use repositories::notification::NewNotification;
pub use repositories::user::NewUser;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Presence probe for tables carried over from the retired system.
    /// The modern schema never has them, so callers treat `false` as "skip".
    pub async fn legacy_table_exists(&self, table: &str) -> Result<bool> {
        let backend = self.conn.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            [table.into()],
        );
        Ok(self.conn.query_one(stmt).await?.is_some())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn schedule_repo(&self) -> repositories::schedule::ScheduleRepository {
        repositories::schedule::ScheduleRepository::new(self.conn.clone())
    }

    fn login_history_repo(&self) -> repositories::login_history::LoginHistoryRepository {
        repositories::login_history::LoginHistoryRepository::new(self.conn.clone())
    }

    fn notification_repo(&self) -> repositories::notification::NotificationRepository {
        repositories::notification::NotificationRepository::new(self.conn.clone())
    }

    fn booking_repo(&self) -> repositories::booking::BookingRepository {
        repositories::booking::BookingRepository::new(self.conn.clone())
    }

    fn audit_repo(&self) -> repositories::audit::AuditRepository {
        repositories::audit::AuditRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(&self, user: NewUser) -> Result<users::Model> {
        self.user_repo().create(user).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_active_user(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_active_by_id(id).await
    }

    pub async fn find_user_for_auth(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<users::Model>> {
        self.user_repo().find_for_auth(username, email).await
    }

    pub async fn list_force_logout_candidates(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list_force_logout_candidates().await
    }

    // ========== Sessions ==========

    pub async fn open_session(
        &self,
        user_id: i32,
        ip_address: Option<&str>,
        start_time: &str,
    ) -> Result<sessions::Model> {
        self.session_repo().open(user_id, ip_address, start_time).await
    }

    pub async fn get_session(&self, id: i32) -> Result<Option<sessions::Model>> {
        self.session_repo().get(id).await
    }

    pub async fn active_sessions_for_user(&self, user_id: i32) -> Result<Vec<sessions::Model>> {
        self.session_repo().active_for_user(user_id).await
    }

    pub async fn close_active_sessions(&self, user_id: i32, end_time: &str) -> Result<u64> {
        self.session_repo().close_active_for_user(user_id, end_time).await
    }

    // ========== Auth tokens ==========

    pub async fn insert_token(&self, user_id: i32, token: &str, created_at: &str) -> Result<()> {
        self.token_repo().insert(user_id, token, created_at).await?;
        Ok(())
    }

    pub async fn token_count(&self, user_id: i32) -> Result<u64> {
        self.token_repo().count_for_user(user_id).await
    }

    pub async fn stale_token_counts(&self, cutoff: &str) -> Result<BTreeMap<i32, u64>> {
        self.token_repo().stale_counts_by_user(cutoff).await
    }

    pub async fn delete_stale_tokens(&self, user_id: i32, cutoff: &str) -> Result<u64> {
        self.token_repo().delete_stale_for_user(user_id, cutoff).await
    }

    pub async fn revoke_all_tokens(&self, user_id: i32) -> Result<u64> {
        self.token_repo().delete_all_for_user(user_id).await
    }

    // ========== Schedules ==========

    pub async fn get_schedule_for_day(
        &self,
        user_id: i32,
        day_of_week: i32,
    ) -> Result<Option<user_schedules::Model>> {
        self.schedule_repo().get_active_for_day(user_id, day_of_week).await
    }

    pub async fn set_schedule(
        &self,
        user_id: i32,
        day_of_week: i32,
        shift_start: Option<&str>,
        shift_end: Option<&str>,
        is_active: bool,
    ) -> Result<user_schedules::Model> {
        self.schedule_repo()
            .set(user_id, day_of_week, shift_start, shift_end, is_active)
            .await
    }

    // ========== Login history ==========

    pub async fn add_login_history(
        &self,
        user_id: i32,
        status: &str,
        remark: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<()> {
        self.login_history_repo().add(user_id, status, remark, ip_address).await
    }

    pub async fn login_history_for_user(&self, user_id: i32) -> Result<Vec<login_history::Model>> {
        self.login_history_repo().list_for_user(user_id).await
    }

    // ========== Notifications ==========

    pub async fn enqueue_notification(
        &self,
        n: NewNotification,
    ) -> Result<scheduled_notifications::Model> {
        self.notification_repo().create(n).await
    }

    pub async fn due_notifications(
        &self,
        now: &str,
        max_retries: i32,
        limit: u64,
    ) -> Result<Vec<scheduled_notifications::Model>> {
        self.notification_repo().due(now, max_retries, limit).await
    }

    pub async fn get_notification(&self, id: i32) -> Result<Option<scheduled_notifications::Model>> {
        self.notification_repo().get(id).await
    }

    pub async fn mark_notification_delivered(&self, id: i32, sent_date: &str) -> Result<()> {
        self.notification_repo().mark_delivered(id, sent_date).await
    }

    pub async fn record_notification_failure(
        &self,
        id: i32,
        retry_count: i32,
        error_message: &str,
        next_trigger: &str,
    ) -> Result<()> {
        self.notification_repo()
            .record_failure(id, retry_count, error_message, next_trigger)
            .await
    }

    pub async fn soft_delete_notification(&self, id: i32, deleted_at: &str) -> Result<()> {
        self.notification_repo().soft_delete(id, deleted_at).await
    }

    pub async fn notifications_for_user(
        &self,
        to_user: i32,
    ) -> Result<Vec<scheduled_notifications::Model>> {
        self.notification_repo().list_for_user(to_user).await
    }

    pub async fn list_notifications(&self) -> Result<Vec<scheduled_notifications::Model>> {
        self.notification_repo().list_all().await
    }

    // ========== Bookings & clients ==========

    pub async fn create_booking(&self, b: NewBooking) -> Result<bookings::Model> {
        self.booking_repo().create(b).await
    }

    pub async fn bookings_expiring_before(&self, cutoff_date: &str) -> Result<Vec<bookings::Model>> {
        self.booking_repo().expiring_before(cutoff_date).await
    }

    pub async fn create_client(&self, name: &str, email: Option<&str>) -> Result<clients::Model> {
        self.booking_repo().create_client(name, email).await
    }

    pub async fn client_email(&self, client_id: i32) -> Result<Option<String>> {
        self.booking_repo().client_email(client_id).await
    }

    // ========== Audit ==========

    pub async fn audit(
        &self,
        action: &str,
        description: &str,
        module: &str,
        record_id: Option<i32>,
        user_id: Option<i32>,
    ) -> Result<()> {
        self.audit_repo()
            .add(action, description, module, record_id, user_id, None)
            .await
    }

    pub async fn audit_entries_for_module(
        &self,
        module: &str,
    ) -> Result<Vec<crate::entities::audit_logs::Model>> {
        self.audit_repo().list_by_module(module).await
    }
}
