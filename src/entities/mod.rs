pub mod prelude;

pub mod audit_logs;
pub mod auth_tokens;
pub mod bookings;
pub mod clients;
pub mod login_history;
pub mod scheduled_notifications;
pub mod sessions;
pub mod user_schedules;
pub mod users;
