//! Notification receivers and the registry that configures them.
//!
//! Receivers are constructed explicitly and registered in order; the
//! registry hands each one its `[receivers.<name>]` table and keeps only the
//! ones that accept it.

pub mod das_keyboard;
pub mod log;
pub mod traits;

pub use das_keyboard::{DasKeyboardConfig, DasKeyboardReceiver};
pub use log::LogReceiver;
pub use traits::{Notification, Receiver};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

use crate::error::ReceiverError;

/// Overlay a user table on a receiver's current settings.
///
/// Keys missing from `overrides` keep their current value.
pub(crate) fn merge_config<T>(
    receiver: &str,
    current: &T,
    overrides: &toml::Value,
) -> Result<T, ReceiverError>
where
    T: Serialize + DeserializeOwned,
{
    let overrides = overrides
        .as_table()
        .ok_or_else(|| ReceiverError::invalid_config(receiver, "configuration must be a table"))?;

    let toml::Value::Table(mut merged) = toml::Value::try_from(current)
        .map_err(|e| ReceiverError::invalid_config(receiver, e.to_string()))?
    else {
        return Err(ReceiverError::invalid_config(receiver, "settings are not a table"));
    };
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }

    toml::Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| ReceiverError::invalid_config(receiver, e.message()))
}

/// Ordered set of known receivers, before configuration.
#[derive(Default)]
pub struct ReceiverRegistry {
    receivers: Vec<Box<dyn Receiver>>,
}

impl ReceiverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every receiver shipped with windowminder.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LogReceiver::new()));
        registry.register(Box::new(DasKeyboardReceiver::default()));
        registry
    }

    /// Add a receiver. A second receiver with an already registered name is ignored.
    pub fn register(&mut self, receiver: Box<dyn Receiver>) -> &mut Self {
        if self.receivers.iter().any(|r| r.name() == receiver.name()) {
            warn!(receiver = receiver.name(), "receiver already registered, skipping");
            return self;
        }
        info!(
            receiver = receiver.name(),
            version = receiver.version(),
            "found receiver"
        );
        self.receivers.push(receiver);
        self
    }

    pub fn receivers(&self) -> &[Box<dyn Receiver>] {
        &self.receivers
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Configure every receiver and return the active ones in registration order.
    ///
    /// Receivers without a table keep their defaults. A receiver whose
    /// `configure` fails is logged and left out.
    pub fn configure(self, config: &BTreeMap<String, toml::Value>) -> Vec<Box<dyn Receiver>> {
        for name in config.keys() {
            if !self.receivers.iter().any(|r| r.name() == name) {
                warn!(receiver = %name, "configuration given for unknown receiver");
            }
        }

        let mut active = Vec::with_capacity(self.receivers.len());
        for mut receiver in self.receivers {
            let Some(table) = config.get(receiver.name()) else {
                active.push(receiver);
                continue;
            };
            match receiver.configure(table) {
                Ok(()) => active.push(receiver),
                Err(e) => {
                    error!(receiver = receiver.name(), error = %e, "error configuring receiver, disabling");
                }
            }
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Named {
        name: &'static str,
        reject: bool,
    }

    #[async_trait]
    impl Receiver for Named {
        fn name(&self) -> &str {
            self.name
        }
        fn display_name(&self) -> &str {
            self.name
        }
        fn version(&self) -> &str {
            "1"
        }
        fn configure(&mut self, _config: &toml::Value) -> Result<(), ReceiverError> {
            if self.reject {
                Err(ReceiverError::invalid_config(self.name, "rejected"))
            } else {
                Ok(())
            }
        }
        async fn notify(&mut self, _n: &Notification) -> Result<(), ReceiverError> {
            Ok(())
        }
    }

    fn named(name: &'static str, reject: bool) -> Box<dyn Receiver> {
        Box::new(Named { name, reject })
    }

    fn empty_table() -> toml::Value {
        toml::Value::Table(toml::Table::new())
    }

    #[test]
    fn builtin_registry_order() {
        let registry = ReceiverRegistry::builtin();
        let names: Vec<_> = registry.receivers().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["log", "das-keyboard"]);
    }

    #[test]
    fn duplicate_names_are_ignored() {
        let mut registry = ReceiverRegistry::new();
        registry.register(named("a", false)).register(named("a", true));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_configuration_excludes_receiver() {
        let mut registry = ReceiverRegistry::new();
        registry
            .register(named("first", false))
            .register(named("broken", true))
            .register(named("last", false));

        let config = BTreeMap::from([
            ("broken".to_string(), empty_table()),
            ("last".to_string(), empty_table()),
        ]);
        let active = registry.configure(&config);
        let names: Vec<_> = active.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["first", "last"]);
    }

    #[test]
    fn unconfigured_receiver_keeps_defaults() {
        let mut registry = ReceiverRegistry::new();
        // Would reject any table, but gets none.
        registry.register(named("picky", true));
        let active = registry.configure(&BTreeMap::new());
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let current = DasKeyboardConfig::default();
        let overrides = toml::Value::Table(toml::from_str(r#"device = "DK5QPID""#).unwrap());
        let merged: DasKeyboardConfig = merge_config("das-keyboard", &current, &overrides).unwrap();
        assert_eq!(merged.device, "DK5QPID");
        assert_eq!(merged.key, current.key);
        assert_eq!(merged.color_needs_open, current.color_needs_open);
    }
}
