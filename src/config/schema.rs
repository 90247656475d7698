//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the replay server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the replay server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TroxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Recording sources to load at startup.
    pub recordings: RecordingsConfig,

    /// Response served when no recording matches.
    pub unmatched: UnmatchedConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

impl TroxyConfig {
    /// Build a config serving the given recordings on `127.0.0.1:<port>`.
    ///
    /// Port `0` asks the OS for a free port.
    pub fn for_recordings<I, S>(sources: I, port: u16) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        config.listener.bind_address = format!("127.0.0.1:{}", port);
        config.recordings.sources = sources.into_iter().map(Into::into).collect();
        config
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Recording sources, in precedence order.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RecordingsConfig {
    /// Paths to `.troxy` files. Position in this list is the load order.
    pub sources: Vec<String>,
}

/// Response for requests no recording accepts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UnmatchedConfig {
    /// HTTP status code.
    pub status: u16,

    /// Response body.
    pub body: String,
}

impl Default for UnmatchedConfig {
    fn default() -> Self {
        Self {
            status: 404,
            body: "No recording matches the request".to_string(),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin API.
    pub enabled: bool,

    /// Path prefix the admin API is nested under.
    pub path_prefix: String,

    /// Optional API key; when set, requests need `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path_prefix: "/troxy/api".to_string(),
            api_key: None,
        }
    }
}
