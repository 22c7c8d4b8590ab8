//! SMS/phone/fax gateway capability.
//!
//! The carrier gateway is an external collaborator: submit a message, get an
//! acknowledgment or an error. Recipient numbers and per-carrier port
//! identifiers live on the gateway side, keyed by user id.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::fmt;
use tracing::debug;

use crate::config::GatewayConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayChannel {
    Sms,
    Phone,
    Fax,
}

impl fmt::Display for GatewayChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sms => write!(f, "sms"),
            Self::Phone => write!(f, "phone"),
            Self::Fax => write!(f, "fax"),
        }
    }
}

#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn submit(
        &self,
        channel: GatewayChannel,
        user_id: i32,
        subject: &str,
        body: &str,
    ) -> Result<()>;
}

pub struct HttpMessageGateway {
    client: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
}

impl HttpMessageGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent("Yardman/1.0")
            .build()
            .context("Failed to build gateway HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl MessageGateway for HttpMessageGateway {
    async fn submit(
        &self,
        channel: GatewayChannel,
        user_id: i32,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        let payload = serde_json::json!({
            "channel": channel.to_string(),
            "user_id": user_id,
            "subject": subject,
            "body": body,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .json(&payload)
            .send()
            .await
            .context("Gateway request failed")?;

        if !response.status().is_success() {
            bail!("Gateway returned {} for {} submission", response.status(), channel);
        }

        debug!(%channel, user_id, "Gateway acknowledged submission");
        Ok(())
    }
}

/// Used when no gateway is configured: acknowledges every submission after
/// logging it, so dispatch does not fail on channels nobody wired up.
pub struct NoopMessageGateway;

#[async_trait]
impl MessageGateway for NoopMessageGateway {
    async fn submit(
        &self,
        channel: GatewayChannel,
        user_id: i32,
        subject: &str,
        _body: &str,
    ) -> Result<()> {
        debug!(%channel, user_id, subject, "Gateway disabled, dropping submission");
        Ok(())
    }
}
