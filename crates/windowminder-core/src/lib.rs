//! # Windowminder Core Library
//!
//! Tracks how long a window has been open over a rolling hour and tells a
//! set of receivers whether it needs opening. The CLI binary is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Timeline**: sparse log of open/close transitions with the rolling
//!   one-hour open-time accumulator
//! - **Receivers**: notification sinks behind a single async trait, set up
//!   through an explicit registry
//! - **Dispatch**: sequential, failure-isolated fan-out of each check
//! - **Storage**: TOML-based configuration
//! - **Server / Scheduler**: HTTP control routes and the periodic check loop
//!
//! ## Key Components
//!
//! - [`WindowMinder`]: timeline + threshold + receivers
//! - [`Timeline`]: open-time accumulator
//! - [`Receiver`]: trait for notification sinks
//! - [`Config`]: application configuration management

pub mod dispatch;
pub mod error;
pub mod minder;
pub mod receivers;
pub mod scheduler;
pub mod server;
pub mod storage;
pub mod timeline;

pub use dispatch::{CheckReport, DeliveryStatus, Dispatcher, ReceiverOutcome};
pub use error::{ConfigError, CoreError, ReceiverError};
pub use minder::{SharedMinder, WindowMinder};
pub use receivers::{Notification, Receiver, ReceiverRegistry};
pub use storage::{Config, ServerConfig};
pub use timeline::{Timeline, WindowStatus, WINDOW_SECS};
