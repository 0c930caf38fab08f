//! Receiver that reports each check through the tracing subscriber.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::merge_config;
use super::traits::{Notification, Receiver};
use crate::error::ReceiverError;

const NAME: &str = "log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Default)]
pub struct LogReceiver {
    config: LogConfig,
}

impl LogReceiver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Receiver for LogReceiver {
    fn name(&self) -> &str {
        NAME
    }

    fn display_name(&self) -> &str {
        "Log output"
    }

    fn version(&self) -> &str {
        "0.1"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn configure(&mut self, config: &toml::Value) -> Result<(), ReceiverError> {
        self.config = merge_config(NAME, &self.config, config)?;
        Ok(())
    }

    async fn notify(&mut self, n: &Notification) -> Result<(), ReceiverError> {
        if !self.config.enabled {
            return Ok(());
        }
        if n.needs_opening {
            warn!(
                seconds_open = n.seconds_open,
                required = n.required_open_seconds_per_hour,
                "window needs opening"
            );
        } else {
            info!(
                seconds_open = n.seconds_open,
                required = n.required_open_seconds_per_hour,
                "window has been open long enough"
            );
        }
        Ok(())
    }
}
