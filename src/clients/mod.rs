pub mod gateway;
pub mod mail;

pub use gateway::{GatewayChannel, HttpMessageGateway, MessageGateway, NoopMessageGateway};
pub use mail::{HttpMailClient, LogMailTransport, MailMessage, MailTransport};
