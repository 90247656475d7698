//! Troxy: an embeddable HTTP server replaying recorded responses.
//!
//! Recordings pair a request predicate with a canned response. Each inbound
//! request is matched against the loaded recordings, the best match is
//! replayed, and the hit is counted per path and per recording.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod recording;
pub mod routing;
pub mod statistics;

pub use admin::ApiHandler;
pub use config::schema::TroxyConfig;
pub use http::HttpServer;
pub use lifecycle::{EmbeddedServer, Shutdown, StartupError, TroxyEmbedded};
pub use recording::{LoadError, Recording, RecordingId, RecordingStore};
pub use statistics::StatisticsRegistry;
