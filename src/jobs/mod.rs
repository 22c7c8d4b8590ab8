pub mod booking_expiry;
pub mod force_logout;
pub mod notification_dispatch;
pub mod token_sweep;

pub use booking_expiry::{BookingExpiryJob, BookingExpirySummary};
pub use force_logout::{ForceLogoutJob, ForceLogoutSummary};
pub use notification_dispatch::{
    DeliveryError, DispatchSettings, DispatchSummary, NotificationDispatchJob,
};
pub use token_sweep::{TokenSweepJob, TokenSweepSummary};
