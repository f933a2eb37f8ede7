//! GSUP service configuration

use crate::errors::Result;
use crate::telemetry::{self, TelemetryConfig};
use crate::transport::KeyPrefix;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable prefix for overrides, e.g. `GSUP__TRANSPORT__HOSTNAME`
pub const ENV_PREFIX: &str = "GSUP";

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GsupConfig {
    /// Queue/transport settings
    pub transport: TransportConfig,
    /// Logging settings
    pub telemetry: TelemetryConfig,
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Prefix queue and key names with `{hostname}:{service_name}:`
    pub use_prefix: bool,
    pub hostname: String,
    pub service_name: String,
    /// Expiry applied to enqueued payloads (seconds)
    pub queue_expiry_secs: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let prefix = KeyPrefix::default();
        Self {
            use_prefix: false,
            hostname: prefix.hostname,
            service_name: prefix.service,
            queue_expiry_secs: None,
        }
    }
}

impl TransportConfig {
    pub fn key_prefix(&self) -> Option<KeyPrefix> {
        self.use_prefix
            .then(|| KeyPrefix::new(&self.hostname, &self.service_name))
    }

    pub fn queue_expiry(&self) -> Option<Duration> {
        self.queue_expiry_secs.map(Duration::from_secs)
    }
}

impl GsupConfig {
    /// Load configuration from a JSON, YAML or TOML file, with `GSUP__`
    /// environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Install logging from the `telemetry` section
    pub fn init_tracing(&self) -> Result<()> {
        telemetry::init_tracing(&self.telemetry)?;
        tracing::debug!(
            hostname = %self.transport.hostname,
            service = %self.transport.service_name,
            use_prefix = self.transport.use_prefix,
            "Transport identity"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GsupConfig::default();
        assert!(config.transport.key_prefix().is_none());
        assert!(config.transport.queue_expiry().is_none());
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_from_file_partial() {
        let path = std::env::temp_dir().join(format!("brivas-gsup-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"transport": {{"use_prefix": true, "hostname": "hss01", "service_name": "gsup", "queue_expiry_secs": 60}}}}"#
        )
        .unwrap();
        drop(file);

        let config = GsupConfig::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.transport.key_prefix(), Some(KeyPrefix::new("hss01", "gsup")));
        assert_eq!(config.transport.queue_expiry(), Some(Duration::from_secs(60)));
        assert!(!config.telemetry.json_logs);
    }

    #[test]
    fn test_missing_file() {
        assert!(GsupConfig::from_file("/nonexistent/brivas-gsup").is_err());
    }
}
