pub use super::audit_logs::Entity as AuditLogs;
pub use super::auth_tokens::Entity as AuthTokens;
pub use super::bookings::Entity as Bookings;
pub use super::clients::Entity as Clients;
pub use super::login_history::Entity as LoginHistory;
pub use super::scheduled_notifications::Entity as ScheduledNotifications;
pub use super::sessions::Entity as Sessions;
pub use super::user_schedules::Entity as UserSchedules;
pub use super::users::Entity as Users;
