use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed state of the window at a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowStatus {
    Open,
    Closed,
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowStatus::Open => f.write_str("open"),
            WindowStatus::Closed => f.write_str("closed"),
        }
    }
}
