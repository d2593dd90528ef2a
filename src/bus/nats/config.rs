//! NATS bus configuration

use serde::{Deserialize, Serialize};

/// Configuration for the NATS channel bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatsConfig {
    /// Server URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Subject prefix; channel `alertState` publishes to `<prefix>.alertState`
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Authentication token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Client name reported to the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

fn default_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_subject_prefix() -> String {
    "onroad".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            subject_prefix: default_subject_prefix(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            token: None,
            client_name: None,
        }
    }
}

impl NatsConfig {
    /// Subject a channel is published on
    pub fn subject(&self, channel: &str) -> String {
        if self.subject_prefix.is_empty() {
            channel.to_string()
        } else {
            format!("{}.{}", self.subject_prefix, channel)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NatsConfig::default();
        assert_eq!(config.url, "nats://127.0.0.1:4222");
        assert_eq!(config.subject("alertState"), "onroad.alertState");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_empty_prefix() {
        let config = NatsConfig {
            subject_prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(config.subject("deviceState"), "deviceState");
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: NatsConfig = toml::from_str(r#"url = "nats://bus:4222""#).unwrap();
        assert_eq!(config.url, "nats://bus:4222");
        assert_eq!(config.subject_prefix, "onroad");
        assert_eq!(config.connect_timeout_secs, 5);
    }
}
