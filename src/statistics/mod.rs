//! Request statistics subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher (matched request)
//!     → registry.rs record_hit(path, recording)
//!     → by-path and by-recording tables, one lock
//!
//! Admin facade
//!     → path_counts / recording_counts / snapshot (reads)
//!     → reset (zero all known keys)
//! ```
//!
//! # Design Decisions
//! - One registry per server instance, injected, never global
//! - Unmatched requests are never counted
//! - Keys are never removed; reset zeroes them

pub mod registry;

pub use registry::{StatisticsRegistry, StatisticsSnapshot};
