//! Request predicate logic.
//!
//! # Responsibilities
//! - Match request path (exact or prefix, case-sensitive)
//! - Match method, header values, query parameters and body
//! - Combine predicates with AND semantics
//!
//! # Design Decisions
//! - Header names are case-insensitive, values are not
//! - A header or query parameter that appears several times matches if any value does
//! - Evaluation errors mean "does not match", never a failed request
//! - No regex to guarantee O(n) matching

use axum::body::Bytes;
use axum::http::{HeaderName, Method, Request};
use thiserror::Error;

/// A predicate could not be evaluated against a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    #[error("header '{0}' is not valid UTF-8")]
    NonUtf8Header(HeaderName),
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Evaluate the condition against a buffered request.
    fn evaluate(&self, req: &Request<Bytes>) -> Result<bool, PredicateError>;

    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Bytes>) -> bool {
        match self.evaluate(req) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    matcher = ?self,
                    "Predicate evaluation failed, treating as no match"
                );
                false
            }
        }
    }
}

/// How a textual value is compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueCondition {
    Equals(String),
    Contains(String),
    Present,
    Absent,
}

impl ValueCondition {
    /// Apply the condition to every value found for a name.
    fn check<'a, I>(&self, mut values: I) -> bool
    where
        I: Iterator<Item = &'a str>,
    {
        match self {
            ValueCondition::Equals(expected) => values.any(|v| v == expected),
            ValueCondition::Contains(needle) => values.any(|v| v.contains(needle.as_str())),
            ValueCondition::Present => values.next().is_some(),
            ValueCondition::Absent => values.next().is_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    Prefix(String),
}

/// Matches the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatcher {
    pattern: PathPattern,
}

impl PathMatcher {
    /// Match only this exact path.
    pub fn exact(path: impl Into<String>) -> Self {
        Self {
            pattern: PathPattern::Exact(path.into()),
        }
    }

    /// Match any path starting with this prefix.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            pattern: PathPattern::Prefix(prefix.into()),
        }
    }

    pub fn pattern(&self) -> &str {
        match &self.pattern {
            PathPattern::Exact(p) | PathPattern::Prefix(p) => p,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self.pattern, PathPattern::Exact(_))
    }
}

impl Matcher for PathMatcher {
    fn evaluate(&self, req: &Request<Bytes>) -> Result<bool, PredicateError> {
        let path = req.uri().path();
        Ok(match &self.pattern {
            PathPattern::Exact(expected) => path == expected,
            PathPattern::Prefix(prefix) => path.starts_with(prefix.as_str()),
        })
    }
}

/// Matches the request method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMatcher {
    method: Method,
}

impl MethodMatcher {
    pub fn new(method: Method) -> Self {
        Self { method }
    }
}

impl Matcher for MethodMatcher {
    fn evaluate(&self, req: &Request<Bytes>) -> Result<bool, PredicateError> {
        Ok(*req.method() == self.method)
    }
}

/// Matches a request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatcher {
    name: HeaderName,
    condition: ValueCondition,
}

impl HeaderMatcher {
    pub fn new(name: HeaderName, condition: ValueCondition) -> Self {
        Self { name, condition }
    }
}

impl Matcher for HeaderMatcher {
    fn evaluate(&self, req: &Request<Bytes>) -> Result<bool, PredicateError> {
        let values = req
            .headers()
            .get_all(&self.name)
            .iter()
            .map(|v| {
                std::str::from_utf8(v.as_bytes())
                    .map_err(|_| PredicateError::NonUtf8Header(self.name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.condition.check(values.into_iter()))
    }
}

/// Matches a decoded query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatcher {
    name: String,
    condition: ValueCondition,
}

impl QueryMatcher {
    pub fn new(name: impl Into<String>, condition: ValueCondition) -> Self {
        Self {
            name: name.into(),
            condition,
        }
    }
}

impl Matcher for QueryMatcher {
    fn evaluate(&self, req: &Request<Bytes>) -> Result<bool, PredicateError> {
        let query = req.uri().query().unwrap_or("");
        let values: Vec<_> = url::form_urlencoded::parse(query.as_bytes())
            .filter(|(name, _)| name == &self.name)
            .map(|(_, value)| value)
            .collect();

        Ok(self.condition.check(values.iter().map(|v| &**v)))
    }
}

/// How the request body is compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyCondition {
    Equals(Bytes),
    Contains(Bytes),
}

/// Matches the buffered request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyMatcher {
    condition: BodyCondition,
}

impl BodyMatcher {
    pub fn new(condition: BodyCondition) -> Self {
        Self { condition }
    }
}

impl Matcher for BodyMatcher {
    fn evaluate(&self, req: &Request<Bytes>) -> Result<bool, PredicateError> {
        let body = req.body();
        Ok(match &self.condition {
            BodyCondition::Equals(expected) => body == expected,
            BodyCondition::Contains(needle) => {
                needle.is_empty() || body.windows(needle.len()).any(|w| w == needle.as_ref())
            }
        })
    }
}

/// One predicate of a recording, tagged by the request attribute it inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Path(PathMatcher),
    Method(MethodMatcher),
    Header(HeaderMatcher),
    Query(QueryMatcher),
    Body(BodyMatcher),
}

impl Predicate {
    pub fn is_path(&self) -> bool {
        matches!(self, Predicate::Path(_))
    }

    /// The literal path if this is an exact path predicate.
    pub fn exact_path(&self) -> Option<&str> {
        match self {
            Predicate::Path(p) if p.is_exact() => Some(p.pattern()),
            _ => None,
        }
    }
}

impl Matcher for Predicate {
    fn evaluate(&self, req: &Request<Bytes>) -> Result<bool, PredicateError> {
        match self {
            Predicate::Path(m) => m.evaluate(req),
            Predicate::Method(m) => m.evaluate(req),
            Predicate::Header(m) => m.evaluate(req),
            Predicate::Query(m) => m.evaluate(req),
            Predicate::Body(m) => m.evaluate(req),
        }
    }
}
