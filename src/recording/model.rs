//! Recording data model.

use std::borrow::Borrow;
use std::path::{Path, PathBuf};
use axum::body::Bytes;
use axum::http::{HeaderMap, Request, StatusCode};
use serde::Serialize;

use crate::routing::matcher::{Matcher, PathMatcher, Predicate, PredicateError};

/// Stable identity of a recording: the file name of its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordingId(String);

impl RecordingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identity from a source path (`dir/a.troxy` → `a.troxy`).
    pub fn from_source(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RecordingId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The response replayed when a recording is selected.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Default for CannedResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// The request side of a recording: predicates in declaration order.
///
/// The first predicate is always the path predicate.
#[derive(Debug, Clone)]
pub struct RequestPattern {
    predicates: Vec<Predicate>,
}

impl RequestPattern {
    pub fn new(path: PathMatcher, conditions: impl IntoIterator<Item = Predicate>) -> Self {
        let mut predicates = vec![Predicate::Path(path)];
        predicates.extend(conditions);
        Self { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// True when every path predicate accepts the request path.
    pub fn accepts_path(&self, req: &Request<Bytes>) -> bool {
        self.predicates
            .iter()
            .filter(|p| p.is_path())
            .all(|p| p.matches(req))
    }

    /// The literal path this pattern requires, if it is an exact match.
    pub fn exact_path(&self) -> Option<&str> {
        self.predicates.iter().find_map(Predicate::exact_path)
    }
}

impl Matcher for RequestPattern {
    fn evaluate(&self, req: &Request<Bytes>) -> Result<bool, PredicateError> {
        for predicate in &self.predicates {
            if !predicate.evaluate(req)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// An immutable recording loaded at startup.
#[derive(Debug, Clone)]
pub struct Recording {
    pub id: RecordingId,
    /// Where the recording was loaded from.
    pub source: PathBuf,
    /// Higher priority wins when several recordings fully match.
    pub priority: i32,
    /// Position in the configured source list.
    pub load_index: usize,
    pub request: RequestPattern,
    pub response: CannedResponse,
}

impl Recording {
    pub fn new(id: RecordingId, request: RequestPattern, response: CannedResponse) -> Self {
        Self {
            source: PathBuf::from(id.as_str()),
            id,
            priority: 0,
            load_index: 0,
            request,
            response,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_source_uses_file_name() {
        let id = RecordingId::from_source(Path::new(
            "src/test/resources/statistics/request_same_path1.troxy",
        ));
        assert_eq!(id.unwrap().as_str(), "request_same_path1.troxy");
        assert!(RecordingId::from_source(Path::new("/")).is_none());
    }

    #[test]
    fn test_pattern_puts_path_first() {
        let pattern = RequestPattern::new(PathMatcher::exact("/a"), Vec::new());
        assert_eq!(pattern.predicates().len(), 1);
        assert!(pattern.predicates()[0].is_path());
        assert_eq!(pattern.exact_path(), Some("/a"));

        let prefix = RequestPattern::new(PathMatcher::prefix("/a"), Vec::new());
        assert_eq!(prefix.exact_path(), None);
    }
}
