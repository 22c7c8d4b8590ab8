use std::sync::Arc;

use crate::clients::{
    HttpMailClient, HttpMessageGateway, LogMailTransport, MailTransport, MessageGateway,
    NoopMessageGateway,
};
use crate::config::Config;
use crate::db::Store;
use crate::jobs::{
    BookingExpiryJob, DispatchSettings, ForceLogoutJob, NotificationDispatchJob, TokenSweepJob,
};

/// Shared application state: the store, the outbound collaborators, and the
/// four job handlers. Jobs hold no mutable state of their own; all
/// coordination goes through row-level predicates in the store.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub mail: Arc<dyn MailTransport>,

    pub gateway: Arc<dyn MessageGateway>,

    pub force_logout: Arc<ForceLogoutJob>,

    pub token_sweep: Arc<TokenSweepJob>,

    pub dispatcher: Arc<NotificationDispatchJob>,

    pub booking_expiry: Arc<BookingExpiryJob>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let mail: Arc<dyn MailTransport> = if config.mail.enabled {
            Arc::new(HttpMailClient::new(&config.mail)?)
        } else {
            Arc::new(LogMailTransport)
        };

        let gateway: Arc<dyn MessageGateway> = if config.gateway.enabled {
            Arc::new(HttpMessageGateway::new(&config.gateway)?)
        } else {
            Arc::new(NoopMessageGateway)
        };

        let force_logout = Arc::new(ForceLogoutJob::new(store.clone()));
        let token_sweep = Arc::new(TokenSweepJob::new(
            store.clone(),
            config.jobs.token_threshold_hours,
        ));
        let dispatcher = Arc::new(NotificationDispatchJob::new(
            store.clone(),
            mail.clone(),
            gateway.clone(),
            DispatchSettings::from(&config.jobs),
        ));
        let booking_expiry = Arc::new(BookingExpiryJob::new(
            store.clone(),
            config.jobs.booking_alert_days,
        ));

        Ok(Self {
            config,
            store,
            mail,
            gateway,
            force_logout,
            token_sweep,
            dispatcher,
            booking_expiry,
            start_time: std::time::Instant::now(),
        })
    }
}
