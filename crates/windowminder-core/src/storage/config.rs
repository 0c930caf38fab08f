//! TOML-based application configuration.
//!
//! Stores:
//! - The open-time threshold per rolling hour
//! - The periodic check interval
//! - Control server address and routes
//! - One table per receiver, handed to that receiver's `configure`
//!
//! Configuration is stored at `~/.config/windowminder/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timeline::WINDOW_SECS;

/// Control server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_route_opened")]
    pub route_opened: String,
    #[serde(default = "default_route_closed")]
    pub route_closed: String,
    #[serde(default = "default_route_check")]
    pub route_check: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/windowminder/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Seconds per rolling hour the window should be open.
    #[serde(default = "default_required_open_seconds")]
    pub required_open_seconds_per_hour: i64,
    /// Seconds between scheduled checks. 0 disables them.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    #[serde(default)]
    pub server: ServerConfig,
    /// Receiver name -> receiver-specific table.
    #[serde(default)]
    pub receivers: BTreeMap<String, toml::Value>,
}

// Default functions
fn default_required_open_seconds() -> i64 {
    5 * 60
}
fn default_check_interval() -> u64 {
    60
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_route_opened() -> String {
    "/opened".into()
}
fn default_route_closed() -> String {
    "/closed".into()
}
fn default_route_check() -> String {
    "/check".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            route_opened: default_route_opened(),
            route_closed: default_route_closed(),
            route_check: default_route_check(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            required_open_seconds_per_hour: default_required_open_seconds(),
            check_interval_secs: default_check_interval(),
            server: ServerConfig::default(),
            receivers: BTreeMap::new(),
        }
    }
}

/// Reserved for the read-only status endpoint.
pub(crate) const STATUS_ROUTE: &str = "/status";

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        // Receiver tables are free-form: `receivers.<name>.<setting>` may be new.
        let receiver_setting = key.starts_with("receivers.") && key.split('.').count() >= 3;

        let mut current = root;
        if let Some(parents) = parents {
            for part in parents.split('.') {
                if receiver_setting && current.get(part).is_none() {
                    if let Some(obj) = current.as_object_mut() {
                        obj.insert(part.to_string(), serde_json::Value::Object(Default::default()));
                    }
                }
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        if receiver_setting && !obj.contains_key(leaf) {
            obj.insert(leaf.to_string(), Self::parse_toml_scalar(value));
            return Ok(());
        }
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                if let Ok(n) = value.parse::<i64>() {
                    serde_json::Value::Number(n.into())
                } else if let Ok(n) = value.parse::<f64>() {
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                } else {
                    return Err(invalid(format!("cannot parse '{value}' as number")));
                }
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Interpret `value` as a TOML scalar, falling back to a plain string.
    fn parse_toml_scalar(value: &str) -> serde_json::Value {
        toml::from_str::<toml::Table>(&format!("value = {value}"))
            .ok()
            .and_then(|mut table| table.remove("value"))
            .and_then(|parsed| serde_json::to_value(parsed).ok())
            .unwrap_or_else(|| serde_json::Value::String(value.to_string()))
    }

    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first use.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path` or return (and persist) the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or is
    /// invalid, or if the default config cannot be written to disk.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=WINDOW_SECS).contains(&self.required_open_seconds_per_hour) {
            return Err(ConfigError::InvalidValue {
                key: "required_open_seconds_per_hour".into(),
                message: format!("must be between 0 and {WINDOW_SECS}"),
            });
        }

        let routes = [
            ("server.route_opened", &self.server.route_opened),
            ("server.route_closed", &self.server.route_closed),
            ("server.route_check", &self.server.route_check),
        ];
        for (i, (key, route)) in routes.iter().enumerate() {
            if !route.starts_with('/') || route.len() < 2 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("route '{route}' must start with '/' and name a path"),
                });
            }
            if route.as_str() == STATUS_ROUTE {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("'{STATUS_ROUTE}' is reserved"),
                });
            }
            if routes[..i].iter().any(|(_, other)| other == route) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("route '{route}' is used twice"),
                });
            }
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Returns error if key is unknown or the
    /// resulting configuration is invalid; `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
