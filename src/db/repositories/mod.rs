pub mod audit;
pub mod booking;
pub mod login_history;
pub mod notification;
pub mod schedule;
pub mod session;
pub mod token;
pub mod user;
