//! Outbound mail capability.
//!
//! The dispatcher only knows the trait; the concrete transport is an HTTP
//! mail-relay API. Deployments without a relay get the logging transport,
//! which reports every send as successful.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::MailConfig;

#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Mail relay client: POSTs messages to an HTTP mail API.
pub struct HttpMailClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from_address: String,
}

impl HttpMailClient {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent("Yardman/1.0")
            .build()
            .context("Failed to build mail HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailClient {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let payload = serde_json::json!({
            "from": self.from_address,
            "to": message.to,
            "subject": message.subject,
            "text": message.body,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Mail relay request failed")?;

        if !response.status().is_success() {
            bail!("Mail relay returned {}", response.status());
        }

        debug!(to = %message.to, "Mail accepted by relay");
        Ok(())
    }
}

/// Stand-in transport for deployments without a mail relay. Logs the send
/// and succeeds, so notification rows still reach their delivered state.
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        info!(to = %message.to, subject = %message.subject, "Mail transport disabled, logging only");
        Ok(())
    }
}
