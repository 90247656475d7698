//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TroxyConfig (validated, immutable)
//!     → consumed once by lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the recording set lives as long as the server
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::TroxyConfig;
pub use schema::{
    AdminConfig, LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RecordingsConfig, TimeoutConfig, UnmatchedConfig,
};
