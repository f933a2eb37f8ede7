//! Tracing setup

use crate::errors::{GsupError, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level applied to every target other than this crate
const OTHER_TARGETS_LEVEL: &str = "warn";

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// Level for `brivas_gsup` targets
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "brivas-gsup".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Filter directives derived from `log_level`
    pub fn directives(&self) -> String {
        format!(
            "{},{}={}",
            OTHER_TARGETS_LEVEL,
            env!("CARGO_CRATE_NAME"),
            self.log_level
        )
    }

    /// `RUST_LOG` when set, otherwise [`directives`](Self::directives)
    pub fn env_filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(self.directives())
            .map_err(|e| GsupError::Config(format!("Invalid log level {:?}: {}", self.log_level, e)))
    }
}

/// Install the global subscriber, plain or JSON lines per `json_logs`
pub fn init_tracing(config: &TelemetryConfig) -> Result<()> {
    let json = config.json_logs.then(|| fmt::layer().json().with_current_span(false));
    let plain = (!config.json_logs).then(|| fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(json)
        .with(plain)
        .try_init()
        .map_err(|e| GsupError::Config(format!("Tracing initialization failed: {}", e)))?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Tracing initialized"
    );
    Ok(())
}
