//! Recording lookup.
//!
//! # Responsibilities
//! - Find recordings whose path predicate accepts the request
//! - Evaluate the remaining predicates of each candidate
//! - Return the best full match or explicit no-match
//!
//! # Design Decisions
//! - Pure function over (request, store); counting is the dispatcher's job
//! - Candidates are visited in the store's precedence order, first full match wins
//! - A path-only match is never a fallback
//! - Explicit NoMatch rather than silent default

use axum::body::Bytes;
use axum::http::Request;

use crate::recording::{Recording, RecordingStore};
use crate::routing::matcher::Matcher;

/// Outcome of matching a request against the store.
#[derive(Debug, Clone, Copy)]
pub enum MatchResult<'a> {
    Matched(&'a Recording),
    NoMatch,
}

impl<'a> MatchResult<'a> {
    pub fn recording(&self) -> Option<&'a Recording> {
        match self {
            MatchResult::Matched(recording) => Some(recording),
            MatchResult::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }
}

/// Select the best recording for a request.
pub fn match_request<'a>(store: &'a RecordingStore, req: &Request<Bytes>) -> MatchResult<'a> {
    let mut candidates = 0usize;

    for recording in store.iter().filter(|r| r.request.accepts_path(req)) {
        candidates += 1;
        if recording.request.matches(req) {
            tracing::trace!(
                recording = %recording.id,
                candidates,
                "Recording matched"
            );
            return MatchResult::Matched(recording);
        }
    }

    tracing::trace!(
        path = %req.uri().path(),
        candidates,
        "No recording fully matched"
    );
    MatchResult::NoMatch
}
