//! Rolling one-hour open-time accumulator.
//!
//! The timeline is a sparse log of window transitions keyed by Unix seconds.
//! Every computation prunes entries that fell out of the trailing hour, so the
//! log never grows beyond one hour of transitions plus the last known status.
//!
//! ```text
//!  hour_ago                                             now
//!     |----- undetermined -----|== open ==|-- closed --|== open ==|
//!                              ^ OPEN     ^ CLOSED     ^ OPEN
//! ```

mod status;

pub use status::WindowStatus;

use chrono::Utc;
use std::collections::BTreeMap;
use tracing::debug;

/// Length of the rolling window in seconds.
pub const WINDOW_SECS: i64 = 60 * 60;

/// Current wall-clock time truncated to whole seconds.
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Ordered log of window transitions.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: BTreeMap<i64, WindowStatus>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transition. A missing timestamp means "now".
    ///
    /// Timestamps are not checked for monotonicity; a duplicate timestamp
    /// overwrites the earlier status. Returns the timestamp that was stored.
    pub fn register(&mut self, timestamp: Option<i64>, status: WindowStatus) -> i64 {
        let ts = timestamp.unwrap_or_else(now_secs);
        self.events.insert(ts, status);
        ts
    }

    pub fn register_open(&mut self, timestamp: Option<i64>) -> i64 {
        self.register(timestamp, WindowStatus::Open)
    }

    pub fn register_close(&mut self, timestamp: Option<i64>) -> i64 {
        self.register(timestamp, WindowStatus::Closed)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Transitions in timestamp order.
    pub fn events(&self) -> impl Iterator<Item = (i64, WindowStatus)> + '_ {
        self.events.iter().map(|(&ts, &status)| (ts, status))
    }

    /// The most recent transition, if any.
    pub fn latest(&self) -> Option<(i64, WindowStatus)> {
        self.events.last_key_value().map(|(&ts, &status)| (ts, status))
    }

    /// Seconds the window was open during the hour ending now.
    pub fn seconds_open_last_hour(&mut self) -> i64 {
        self.seconds_open_last_hour_at(now_secs())
    }

    /// Seconds the window was open during the hour ending at `now`.
    ///
    /// Prunes transitions older than `now - WINDOW_SECS`. When nothing
    /// happened inside the window the last known status is assumed to have
    /// held for the whole hour, and only that transition is kept.
    pub fn seconds_open_last_hour_at(&mut self, now: i64) -> i64 {
        let hour_ago = now - WINDOW_SECS;
        // `events` keeps everything before `hour_ago`, `recent` the rest.
        let recent = self.events.split_off(&hour_ago);

        if recent.is_empty() {
            let Some((&ts, &status)) = self.events.last_key_value() else {
                return 0;
            };
            debug!(
                last_ts = ts,
                %status,
                "no transitions during the last hour, using last known status"
            );
            self.events = BTreeMap::from([(ts, status)]);
            return match status {
                WindowStatus::Open => WINDOW_SECS,
                WindowStatus::Closed => 0,
            };
        }

        let mut seconds_open = 0;
        let mut last_ts = hour_ago;
        // None until the first transition inside the window.
        let mut last_status: Option<WindowStatus> = None;

        for (&ts, &status) in &recent {
            if last_status == Some(status) {
                continue;
            }
            let since_last = ts - last_ts;
            debug!(ts, %status, since_last, "transition");
            if status == WindowStatus::Closed {
                seconds_open += since_last;
            }
            last_status = Some(status);
            last_ts = ts;
        }

        if last_status == Some(WindowStatus::Open) {
            seconds_open += now - last_ts;
        }

        self.events = recent;
        // Future-dated transitions can push the sum outside the window.
        seconds_open.clamp(0, WINDOW_SECS)
    }
}
