//! Async client for the Troxy admin API.

mod client;

pub use client::{RecordingSummary, ServerStatus, Statistics, TroxyClient};
