//! The window minder: one timeline, one threshold, a set of receivers.
//!
//! All mutation goes through `&mut self`. Callers that share a minder between
//! the control server and the scheduler wrap it in [`SharedMinder`], which
//! serializes registrations and checks.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::dispatch::{CheckReport, Dispatcher};
use crate::receivers::{Notification, Receiver, ReceiverRegistry};
use crate::storage::Config;
use crate::timeline::{now_secs, Timeline};

/// Minder shared between the control server and the scheduler.
pub type SharedMinder = Arc<Mutex<WindowMinder>>;

pub struct WindowMinder {
    timeline: Timeline,
    dispatcher: Dispatcher,
    required_open_seconds_per_hour: i64,
}

impl WindowMinder {
    pub fn new(receivers: Vec<Box<dyn Receiver>>, required_open_seconds_per_hour: i64) -> Self {
        Self {
            timeline: Timeline::new(),
            dispatcher: Dispatcher::new(receivers),
            required_open_seconds_per_hour,
        }
    }

    /// Configure `registry` from `config` and build a minder around the active receivers.
    pub fn from_config(config: &Config, registry: ReceiverRegistry) -> Self {
        let receivers = registry.configure(&config.receivers);
        Self::new(receivers, config.required_open_seconds_per_hour)
    }

    pub fn into_shared(self) -> SharedMinder {
        Arc::new(Mutex::new(self))
    }

    pub fn required_open_seconds_per_hour(&self) -> i64 {
        self.required_open_seconds_per_hour
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn receiver_names(&self) -> Vec<&str> {
        self.dispatcher.receiver_names()
    }

    pub fn register_open(&mut self, timestamp: Option<i64>) -> i64 {
        let ts = self.timeline.register_open(timestamp);
        info!(timestamp = ts, "opened");
        ts
    }

    pub fn register_close(&mut self, timestamp: Option<i64>) -> i64 {
        let ts = self.timeline.register_close(timestamp);
        info!(timestamp = ts, "closed");
        ts
    }

    /// Current open-time against the threshold, without notifying anyone.
    pub fn status(&mut self) -> Notification {
        self.status_at(now_secs())
    }

    pub fn status_at(&mut self, now: i64) -> Notification {
        let seconds_open = self.timeline.seconds_open_last_hour_at(now);
        Notification::new(seconds_open, self.required_open_seconds_per_hour)
    }

    /// Compute the open-time and notify every receiver. Never fails.
    pub async fn check_and_notify(&mut self) -> CheckReport {
        self.check_and_notify_at(now_secs()).await
    }

    pub async fn check_and_notify_at(&mut self, now: i64) -> CheckReport {
        info!("checking");
        let notification = self.status_at(now);
        info!(
            seconds_open = notification.seconds_open,
            needs_opening = notification.needs_opening,
            "window open time during the last hour"
        );
        let outcomes = self.dispatcher.dispatch(&notification).await;
        CheckReport::new(notification, outcomes)
    }
}
