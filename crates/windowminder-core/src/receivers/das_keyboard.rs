//! Das Keyboard integration -- light a key through the local Q REST API.
//!
//! While the window needs opening a colored signal is created on the
//! configured key, replacing the one created by the previous check. When the
//! state has no color or effect configured the previously created signal is
//! deleted instead.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::merge_config;
use super::traits::{Notification, Receiver};
use crate::error::ReceiverError;

const NAME: &str = "das-keyboard";

/// Effects accepted by the Das Keyboard signal API.
const EFFECTS: &[&str] = &[
    "SET_COLOR",
    "BLINK",
    "BREATHE",
    "COLOR_CYCLE",
    "RIPPLE",
    "INWARD_RIPPLE",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DasKeyboardConfig {
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_color_needs_open")]
    pub color_needs_open: Option<String>,
    #[serde(default)]
    pub color_enough_open: Option<String>,
    #[serde(default = "default_effect_needs_open")]
    pub effect_needs_open: Option<String>,
    #[serde(default)]
    pub effect_enough_open: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
}

fn default_key() -> String {
    "KEY_SCROLL_LOCK".into()
}
fn default_device() -> String {
    "DK4QPID".into()
}
fn default_color_needs_open() -> Option<String> {
    Some("#FF0000".into())
}
fn default_effect_needs_open() -> Option<String> {
    Some("BREATHE".into())
}
fn default_true() -> bool {
    true
}
fn default_backend_url() -> String {
    "http://localhost:27301/api/1.0/signals".into()
}

impl Default for DasKeyboardConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            device: default_device(),
            color_needs_open: default_color_needs_open(),
            color_enough_open: None,
            effect_needs_open: default_effect_needs_open(),
            effect_enough_open: None,
            enabled: true,
            backend_url: default_backend_url(),
        }
    }
}

impl DasKeyboardConfig {
    /// Empty strings switch a color/effect off, since TOML has no null.
    fn normalize(mut self) -> Self {
        for slot in [
            &mut self.color_needs_open,
            &mut self.color_enough_open,
            &mut self.effect_needs_open,
            &mut self.effect_enough_open,
        ] {
            if slot.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *slot = None;
            }
        }
        self.backend_url = self.backend_url.trim_end_matches('/').to_string();
        self
    }

    fn validate(&self) -> Result<(), ReceiverError> {
        for color in [&self.color_needs_open, &self.color_enough_open]
            .into_iter()
            .flatten()
        {
            if !is_hex_color(color) {
                return Err(ReceiverError::invalid_config(
                    NAME,
                    format!("color '{color}' is not of the form #RRGGBB"),
                ));
            }
        }
        for effect in [&self.effect_needs_open, &self.effect_enough_open]
            .into_iter()
            .flatten()
        {
            if !EFFECTS.contains(&effect.as_str()) {
                return Err(ReceiverError::invalid_config(
                    NAME,
                    format!("unknown effect '{effect}', expected one of {}", EFFECTS.join(", ")),
                ));
            }
        }
        if self.key.is_empty() || self.device.is_empty() {
            return Err(ReceiverError::invalid_config(NAME, "key and device must be set"));
        }
        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            return Err(ReceiverError::invalid_config(
                NAME,
                format!("backend_url '{}' must be an http(s) URL", self.backend_url),
            ));
        }
        Ok(())
    }

    /// Color and effect for the given state, or `None` if the signal should be removed.
    fn signal_style(&self, needs_opening: bool) -> Option<(&str, &str)> {
        let (color, effect) = if needs_opening {
            (&self.color_needs_open, &self.effect_needs_open)
        } else {
            (&self.color_enough_open, &self.effect_enough_open)
        };
        Some((color.as_deref()?, effect.as_deref()?))
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Deserialize)]
struct CreatedSignal {
    id: serde_json::Value,
}

pub struct DasKeyboardReceiver {
    config: DasKeyboardConfig,
    client: Client,
    /// Id of the signal created by the last POST, if it still exists.
    last_signal: Option<String>,
}

impl Default for DasKeyboardReceiver {
    fn default() -> Self {
        Self::new(DasKeyboardConfig::default())
    }
}

impl DasKeyboardReceiver {
    pub fn new(config: DasKeyboardConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            last_signal: None,
        }
    }

    pub fn config(&self) -> &DasKeyboardConfig {
        &self.config
    }

    pub fn last_signal(&self) -> Option<&str> {
        self.last_signal.as_deref()
    }

    async fn delete_last_signal(&mut self) -> Result<(), ReceiverError> {
        let Some(id) = self.last_signal.as_deref() else {
            debug!("should delete last signal, but no signal exists");
            return Ok(());
        };

        let url = format!("{}/{id}", self.config.backend_url);
        debug!(%url, "deleting last signal");
        let resp = self.client.delete(&url).send().await?;
        let status = resp.status();

        // 404: already gone, e.g. dismissed on the keyboard.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            self.last_signal = None;
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(ReceiverError::UnexpectedStatus {
            url,
            status: status.as_u16(),
            body,
        })
    }

    async fn create_signal(
        &mut self,
        color: &str,
        effect: &str,
        needs_opening: bool,
    ) -> Result<(), ReceiverError> {
        let (name, message) = if needs_opening {
            ("Open your window", "Your window has been closed for too long")
        } else {
            ("Window aired", "Your window has been open long enough")
        };
        let body = json!({
            "zoneId": self.config.key,
            "color": color,
            "effect": effect,
            "pid": self.config.device,
            "clientName": "windowminder",
            "message": message,
            "name": name,
        });

        let url = self.config.backend_url.clone();
        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReceiverError::UnexpectedStatus {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedSignal =
            resp.json()
                .await
                .map_err(|e| ReceiverError::MalformedResponse {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
        let id = match created.id {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(ReceiverError::MalformedResponse {
                    url,
                    message: format!("unexpected signal id {other}"),
                })
            }
        };
        debug!(%id, "created signal");
        self.last_signal = Some(id);
        Ok(())
    }
}

#[async_trait]
impl Receiver for DasKeyboardReceiver {
    fn name(&self) -> &str {
        NAME
    }

    fn display_name(&self) -> &str {
        "Das Keyboard local REST client"
    }

    fn version(&self) -> &str {
        "0.1"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn configure(&mut self, config: &toml::Value) -> Result<(), ReceiverError> {
        let merged: DasKeyboardConfig = merge_config(NAME, &self.config, config)?;
        let merged = merged.normalize();
        merged.validate()?;
        self.config = merged;
        Ok(())
    }

    async fn notify(&mut self, notification: &Notification) -> Result<(), ReceiverError> {
        if !self.config.enabled {
            return Ok(());
        }

        let needs_opening = notification.needs_opening;
        let style = self
            .config
            .signal_style(needs_opening)
            .map(|(color, effect)| (color.to_string(), effect.to_string()));
        match style {
            Some((color, effect)) => {
                // One signal per key: replace rather than stack.
                if let Err(e) = self.delete_last_signal().await {
                    warn!(error = %e, "could not delete previous signal");
                }
                self.create_signal(&color, &effect, needs_opening).await
            }
            None => self.delete_last_signal().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn needs_opening() -> Notification {
        Notification::new(120, 300)
    }

    fn enough_open() -> Notification {
        Notification::new(600, 300)
    }

    fn table(s: &str) -> toml::Value {
        toml::Value::Table(toml::from_str(s).unwrap())
    }

    fn receiver_for(server: &mockito::ServerGuard) -> DasKeyboardReceiver {
        let mut receiver = DasKeyboardReceiver::default();
        let config = table(&format!(
            "backend_url = \"{}/api/1.0/signals\"",
            server.url()
        ));
        receiver.configure(&config).unwrap();
        receiver
    }

    #[test]
    fn defaults_signal_only_when_needs_opening() {
        let config = DasKeyboardConfig::default();
        assert_eq!(config.signal_style(true), Some(("#FF0000", "BREATHE")));
        assert_eq!(config.signal_style(false), None);
    }

    #[test]
    fn configure_merges_over_defaults() {
        let mut receiver = DasKeyboardReceiver::default();
        let config = table(
            r##"
            key = "KEY_ESCAPE"
            color_enough_open = "#00ff00"
            effect_enough_open = "SET_COLOR"
            "##,
        );
        receiver.configure(&config).unwrap();

        let config = receiver.config();
        assert_eq!(config.key, "KEY_ESCAPE");
        assert_eq!(config.device, "DK4QPID");
        assert_eq!(config.signal_style(false), Some(("#00ff00", "SET_COLOR")));
    }

    #[test]
    fn empty_string_switches_signal_off() {
        let mut receiver = DasKeyboardReceiver::default();
        let config = table(r##"color_needs_open = """##);
        receiver.configure(&config).unwrap();
        assert_eq!(receiver.config().signal_style(true), None);
    }

    #[test]
    fn configure_rejects_bad_color() {
        let mut receiver = DasKeyboardReceiver::default();
        let config = table(r##"color_needs_open = "red""##);
        let err = receiver.configure(&config).unwrap_err();
        assert!(matches!(err, ReceiverError::InvalidConfig { .. }));
        // Previous configuration is untouched.
        assert_eq!(receiver.config(), &DasKeyboardConfig::default());
    }

    #[test]
    fn configure_rejects_unknown_effect_and_keys() {
        let mut receiver = DasKeyboardReceiver::default();
        let bad_effect = table(r##"effect_needs_open = "SPARKLE""##);
        assert!(receiver.configure(&bad_effect).is_err());

        let typo = table(r##"colour_needs_open = "#FF0000""##);
        assert!(receiver.configure(&typo).is_err());
    }

    #[tokio::test]
    async fn notify_creates_signal_and_remembers_id() {
        let mut server = mockito::Server::new_async().await;
        let post = server
            .mock("POST", "/api/1.0/signals")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "zoneId": "KEY_SCROLL_LOCK",
                "color": "#FF0000",
                "effect": "BREATHE",
                "pid": "DK4QPID",
                "clientName": "windowminder",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 42}"#)
            .create_async()
            .await;

        let mut receiver = receiver_for(&server);
        receiver.notify(&needs_opening()).await.unwrap();

        post.assert_async().await;
        assert_eq!(receiver.last_signal(), Some("42"));
    }

    #[tokio::test]
    async fn notify_deletes_last_signal_when_enough_open() {
        let mut server = mockito::Server::new_async().await;
        let _post = server
            .mock("POST", "/api/1.0/signals")
            .with_status(200)
            .with_body(r#"{"id": 7}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/1.0/signals/7")
            .with_status(204)
            .create_async()
            .await;

        let mut receiver = receiver_for(&server);
        receiver.notify(&needs_opening()).await.unwrap();
        receiver.notify(&enough_open()).await.unwrap();

        delete.assert_async().await;
        assert_eq!(receiver.last_signal(), None);
    }

    #[tokio::test]
    async fn repeated_signal_replaces_the_previous_one() {
        let mut server = mockito::Server::new_async().await;
        let post = server
            .mock("POST", "/api/1.0/signals")
            .with_status(200)
            .with_body(r#"{"id": 7}"#)
            .expect(2)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/1.0/signals/7")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let mut receiver = receiver_for(&server);
        receiver.notify(&needs_opening()).await.unwrap();
        receiver.notify(&needs_opening()).await.unwrap();

        post.assert_async().await;
        delete.assert_async().await;
        assert_eq!(receiver.last_signal(), Some("7"));
    }

    #[tokio::test]
    async fn notify_without_signal_to_delete_is_noop() {
        let mut server = mockito::Server::new_async().await;
        let delete = server
            .mock("DELETE", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let mut receiver = receiver_for(&server);
        receiver.notify(&enough_open()).await.unwrap();

        delete.assert_async().await;
    }

    #[tokio::test]
    async fn already_deleted_signal_is_forgotten() {
        let mut server = mockito::Server::new_async().await;
        let _post = server
            .mock("POST", "/api/1.0/signals")
            .with_status(200)
            .with_body(r#"{"id": "abc"}"#)
            .create_async()
            .await;
        let _delete = server
            .mock("DELETE", "/api/1.0/signals/abc")
            .with_status(404)
            .create_async()
            .await;

        let mut receiver = receiver_for(&server);
        receiver.notify(&needs_opening()).await.unwrap();
        receiver.notify(&enough_open()).await.unwrap();
        assert_eq!(receiver.last_signal(), None);
    }

    #[tokio::test]
    async fn failed_post_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _post = server
            .mock("POST", "/api/1.0/signals")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let mut receiver = receiver_for(&server);
        let err = receiver.notify(&needs_opening()).await.unwrap_err();
        match err {
            ReceiverError::UnexpectedStatus { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(receiver.last_signal(), None);
    }

    #[tokio::test]
    async fn disabled_receiver_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let post = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let mut receiver = receiver_for(&server);
        let config = table(r##"enabled = false"##);
        receiver.configure(&config).unwrap();
        assert!(!receiver.enabled());
        receiver.notify(&needs_opening()).await.unwrap();

        post.assert_async().await;
    }
}
