//! Request dispatch: match, render, count.
//!
//! # Responsibilities
//! - Ask the router for the best recording
//! - Render the canned response and count the hit
//! - Serve the unmatched response otherwise, without counting
//!
//! # Design Decisions
//! - Synchronous: once the body is buffered nothing here awaits, so a request
//!   aborted by the transport is never counted
//! - Holds only shared references; no per-request state

use std::sync::Arc;
use axum::body::Bytes;
use axum::http::Request;
use axum::response::Response;

use crate::http::request::request_id;
use crate::http::response::{render, UnmatchedResponse};
use crate::observability::metrics;
use crate::recording::RecordingStore;
use crate::routing::{match_request, MatchResult};
use crate::statistics::StatisticsRegistry;

/// Serves replayed responses for buffered requests.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Arc<RecordingStore>,
    statistics: Arc<StatisticsRegistry>,
    unmatched: UnmatchedResponse,
}

impl Dispatcher {
    pub fn new(
        store: Arc<RecordingStore>,
        statistics: Arc<StatisticsRegistry>,
        unmatched: UnmatchedResponse,
    ) -> Self {
        Self {
            store,
            statistics,
            unmatched,
        }
    }

    /// Answer a request from the recordings.
    pub fn handle(&self, req: &Request<Bytes>) -> Response {
        let path = req.uri().path();

        match match_request(&self.store, req) {
            MatchResult::Matched(recording) => {
                let response = render(&recording.response);
                self.statistics.record_hit(path, &recording.id);
                metrics::record_recording_hit(recording.id.as_str());

                tracing::debug!(
                    request_id = %request_id(req),
                    method = %req.method(),
                    path = %path,
                    recording = %recording.id,
                    status = %response.status(),
                    "Replayed recording"
                );
                response
            }
            MatchResult::NoMatch => {
                metrics::record_unmatched();
                tracing::warn!(
                    request_id = %request_id(req),
                    method = %req.method(),
                    path = %path,
                    "No recording matched"
                );
                self.unmatched.render()
            }
        }
    }

    pub fn statistics(&self) -> &Arc<StatisticsRegistry> {
        &self.statistics
    }
}
