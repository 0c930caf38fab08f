//! Outcome of a check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::receivers::Notification;

/// How a single receiver handled the notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// `notify` returned successfully
    Delivered,
    /// `notify` returned an error
    Failed {
        /// Human-readable reason for failure
        reason: String,
    },
}

/// Result of notifying one receiver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverOutcome {
    pub receiver: String,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

/// Everything a caller learns from `check_and_notify`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// When the check ran
    pub checked_at: DateTime<Utc>,
    #[serde(flatten)]
    pub notification: Notification,
    /// One entry per active receiver, in dispatch order
    pub receivers: Vec<ReceiverOutcome>,
}

impl CheckReport {
    pub fn new(notification: Notification, receivers: Vec<ReceiverOutcome>) -> Self {
        Self {
            checked_at: Utc::now(),
            notification,
            receivers,
        }
    }

    pub fn delivered_count(&self) -> usize {
        self.receivers
            .iter()
            .filter(|r| r.status == DeliveryStatus::Delivered)
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.receivers
            .iter()
            .filter(|r| matches!(r.status, DeliveryStatus::Failed { .. }))
            .count()
    }
}
