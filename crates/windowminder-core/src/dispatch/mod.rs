//! Sequential fan-out of a check result to the active receivers.
//!
//! Each receiver is awaited before the next one starts, so log output stays
//! in registration order. A failing receiver is recorded and skipped over.

mod report;

pub use report::{CheckReport, DeliveryStatus, ReceiverOutcome};

use tracing::{error, info};

use crate::receivers::{Notification, Receiver};

pub struct Dispatcher {
    receivers: Vec<Box<dyn Receiver>>,
}

impl Dispatcher {
    pub fn new(receivers: Vec<Box<dyn Receiver>>) -> Self {
        Self { receivers }
    }

    pub fn receiver_names(&self) -> Vec<&str> {
        self.receivers.iter().map(|r| r.name()).collect()
    }

    /// Notify every receiver in order. Never fails; errors end up in the outcomes.
    pub async fn dispatch(&mut self, notification: &Notification) -> Vec<ReceiverOutcome> {
        let mut outcomes = Vec::with_capacity(self.receivers.len());

        for receiver in &mut self.receivers {
            info!(receiver = receiver.name(), "notifying receiver");
            let status = match receiver.notify(notification).await {
                Ok(()) => DeliveryStatus::Delivered,
                Err(e) => {
                    error!(receiver = receiver.name(), error = %e, "notifying receiver failed");
                    DeliveryStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(ReceiverOutcome {
                receiver: receiver.name().to_string(),
                status,
            });
        }

        outcomes
    }
}
