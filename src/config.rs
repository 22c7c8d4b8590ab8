use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub scheduler: SchedulerConfig,

    pub jobs: JobsConfig,

    pub mail: MailConfig,

    pub gateway: GatewayConfig,

    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// 0 = tokio default.
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:yardman.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 0,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Optional cron override for the per-minute jobs (force-logout and
    /// notification dispatch). When unset, interval timers are used.
    pub cron_expression: Option<String>,

    /// Cadence for the per-minute jobs.
    pub sweep_interval_minutes: u32,

    /// Cadence for the daily jobs (token sweep and booking-expiry scan).
    pub daily_interval_hours: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron_expression: None,
            sweep_interval_minutes: 1,
            daily_interval_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Auth tokens older than this are revoked by the sweep.
    pub token_threshold_hours: i64,

    /// Max notifications processed per dispatcher tick.
    pub notification_batch_size: u64,

    /// Delivery attempts before a notification fails permanently.
    pub notification_max_retries: i32,

    /// Backoff between delivery attempts, in minutes, indexed by retry.
    pub notification_backoff_minutes: Vec<i64>,

    /// Bookings expiring within this many days trigger a reminder.
    pub booking_alert_days: i64,

    /// Fallback recipient for terminal-failure alerts when the original
    /// notification has no sender.
    pub admin_user_id: Option<i32>,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            token_threshold_hours: 24,
            notification_batch_size: 100,
            notification_max_retries: 3,
            notification_backoff_minutes: vec![1, 5, 10],
            booking_alert_days: 3,
            admin_user_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub enabled: bool,

    pub endpoint: String,

    pub api_key: String,

    pub from_address: String,

    pub request_timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:8025/api/send".to_string(),
            api_key: String::new(),
            from_address: "terminal@localhost".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub enabled: bool,

    pub endpoint: String,

    pub username: String,

    pub password: String,

    pub request_timeout_seconds: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:9090/api/submit".to_string(),
            username: String::new(),
            password: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    /// Key required in the X-Api-Key header for the ops endpoints.
    pub api_key: String,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6710,
            api_key: String::new(),
            cors_allowed_origins: vec![
                "http://localhost:6710".to_string(),
                "http://127.0.0.1:6710".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("yardman").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".yardman").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.scheduler.enabled
            && self.scheduler.sweep_interval_minutes == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Sweep interval must be > 0 or a cron expression must be set");
        }

        if self.jobs.notification_max_retries < 1 {
            anyhow::bail!("Notification max retries must be at least 1");
        }

        if self.jobs.notification_backoff_minutes.is_empty() {
            anyhow::bail!("Notification backoff schedule cannot be empty");
        }

        if self.mail.enabled && self.mail.endpoint.is_empty() {
            anyhow::bail!("Mail endpoint cannot be empty when mail is enabled");
        }

        if self.gateway.enabled && self.gateway.endpoint.is_empty() {
            anyhow::bail!("Gateway endpoint cannot be empty when the gateway is enabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduler.sweep_interval_minutes, 1);
        assert_eq!(config.jobs.token_threshold_hours, 24);
        assert_eq!(config.jobs.notification_batch_size, 100);
        assert_eq!(config.jobs.notification_max_retries, 3);
        assert_eq!(config.jobs.notification_backoff_minutes, vec![1, 5, 10]);
        assert_eq!(config.jobs.booking_alert_days, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[scheduler]"));
        assert!(toml_str.contains("[jobs]"));
        assert!(toml_str.contains("[mail]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [jobs]
            booking_alert_days = 7
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.jobs.booking_alert_days, 7);

        assert_eq!(config.jobs.token_threshold_hours, 24);
    }

    #[test]
    fn test_invalid_scheduler_config_rejected() {
        let mut config = Config::default();
        config.scheduler.sweep_interval_minutes = 0;
        assert!(config.validate().is_err());

        config.scheduler.cron_expression = Some("0 * * * * *".to_string());
        assert!(config.validate().is_ok());
    }
}
