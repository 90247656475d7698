//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, admin mount)
//!     → request.rs (request ID, body buffering)
//!     → dispatch.rs (routing → render → statistics)
//!     → response.rs (canned or unmatched response)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::Dispatcher;
pub use request::X_REQUEST_ID;
pub use response::{UnmatchedResponse, X_TROXY_UNMATCHED};
pub use server::HttpServer;
