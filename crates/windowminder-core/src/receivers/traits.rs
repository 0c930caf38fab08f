use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ReceiverError;

/// What every receiver is told on a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// `seconds_open < required_open_seconds_per_hour`.
    pub needs_opening: bool,
    /// Seconds the window was open during the trailing hour.
    pub seconds_open: i64,
    /// Threshold the check was made against.
    pub required_open_seconds_per_hour: i64,
}

impl Notification {
    pub fn new(seconds_open: i64, required_open_seconds_per_hour: i64) -> Self {
        Self {
            needs_opening: seconds_open < required_open_seconds_per_hour,
            seconds_open,
            required_open_seconds_per_hour,
        }
    }
}

/// Every notification sink implements this trait.
/// Receivers own their state (configuration, remote handles) and are driven
/// one at a time by the dispatcher, hence `&mut self` on `notify`.
#[async_trait]
pub trait Receiver: Send + Sync {
    /// Unique identifier, also the key of its `[receivers.<name>]` table.
    fn name(&self) -> &str;

    /// Human-readable display name.
    fn display_name(&self) -> &str;

    fn version(&self) -> &str;

    /// Apply the user's configuration table on top of the defaults.
    fn configure(&mut self, _config: &toml::Value) -> Result<(), ReceiverError> {
        Ok(()) // default: nothing to configure
    }

    /// Whether `notify` does anything with the current configuration.
    fn enabled(&self) -> bool {
        true
    }

    /// React to the outcome of a check.
    async fn notify(&mut self, notification: &Notification) -> Result<(), ReceiverError>;
}
