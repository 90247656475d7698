//! `.troxy` recording file format.
//!
//! A recording is a TOML document with a `[request]` section describing the
//! predicates and a `[response]` section holding the canned reply:
//!
//! ```toml
//! priority = 0
//!
//! [request]
//! method = "GET"
//! path = "/samepath"
//!
//! [[request.headers]]
//! name = "SomeHeader"
//! equals = "recording1"
//!
//! [response]
//! status = 200
//! body = "recording1"
//! ```
//!
//! Predicates compile in declaration order: path, method, headers, query, body.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::Deserialize;

use crate::recording::model::{CannedResponse, Recording, RecordingId, RequestPattern};
use crate::recording::LoadError;
use crate::routing::matcher::{
    BodyCondition, BodyMatcher, HeaderMatcher, MethodMatcher, PathMatcher, Predicate,
    QueryMatcher, ValueCondition,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordingFile {
    #[serde(default)]
    priority: i32,
    request: RequestSection,
    #[serde(default)]
    response: ResponseSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestSection {
    method: Option<String>,
    path: Option<String>,
    path_prefix: Option<String>,
    #[serde(default)]
    headers: Vec<ValueRule>,
    #[serde(default)]
    query: Vec<ValueRule>,
    body: Option<BodyRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ValueRule {
    name: String,
    equals: Option<String>,
    contains: Option<String>,
    present: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BodyRule {
    equals: Option<String>,
    contains: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ResponseSection {
    status: u16,
    headers: BTreeMap<String, String>,
    body: String,
}

impl Default for ResponseSection {
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: String::new(),
        }
    }
}

/// Read and parse a recording file. The identity is the file name.
pub fn load_recording(path: &Path) -> Result<Recording, LoadError> {
    let id = RecordingId::from_source(path).ok_or_else(|| LoadError::Invalid {
        path: path.to_path_buf(),
        reason: "source has no file name".to_string(),
    })?;

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut recording = parse_recording(id, &content).map_err(|e| e.at(path))?;
    recording.source = path.to_path_buf();
    Ok(recording)
}

/// Parse recording text into a [`Recording`] with the given identity.
pub fn parse_recording(id: RecordingId, content: &str) -> Result<Recording, LoadError> {
    let source = Path::new(id.as_str()).to_path_buf();
    let invalid = |reason: String| LoadError::Invalid {
        path: source.clone(),
        reason,
    };

    let file: RecordingFile = toml::from_str(content).map_err(|e| LoadError::Parse {
        path: source.clone(),
        source: e,
    })?;

    let request = compile_request(file.request).map_err(invalid)?;
    let response = compile_response(file.response).map_err(invalid)?;

    Ok(Recording::new(id, request, response).with_priority(file.priority))
}

fn compile_request(section: RequestSection) -> Result<RequestPattern, String> {
    let path = match (section.path, section.path_prefix) {
        (Some(path), None) => PathMatcher::exact(path),
        (None, Some(prefix)) => PathMatcher::prefix(prefix),
        (Some(_), Some(_)) => {
            return Err("request.path and request.path_prefix are mutually exclusive".into())
        }
        (None, None) => return Err("request.path or request.path_prefix is required".into()),
    };
    if !path.pattern().starts_with('/') {
        return Err(format!("path '{}' must start with '/'", path.pattern()));
    }

    let mut conditions = Vec::new();

    if let Some(method) = section.method {
        let method = Method::from_str(&method.to_ascii_uppercase())
            .map_err(|_| format!("invalid method '{}'", method))?;
        conditions.push(Predicate::Method(MethodMatcher::new(method)));
    }

    for rule in section.headers {
        let name = HeaderName::from_str(&rule.name)
            .map_err(|_| format!("invalid header name '{}'", rule.name))?;
        let condition = compile_condition(&rule)?;
        conditions.push(Predicate::Header(HeaderMatcher::new(name, condition)));
    }

    for rule in section.query {
        let condition = compile_condition(&rule)?;
        conditions.push(Predicate::Query(QueryMatcher::new(rule.name, condition)));
    }

    if let Some(body) = section.body {
        let condition = match (body.equals, body.contains) {
            (Some(equals), None) => BodyCondition::Equals(Bytes::from(equals)),
            (None, Some(contains)) => BodyCondition::Contains(Bytes::from(contains)),
            _ => return Err("request.body needs exactly one of 'equals' or 'contains'".into()),
        };
        conditions.push(Predicate::Body(BodyMatcher::new(condition)));
    }

    Ok(RequestPattern::new(path, conditions))
}

fn compile_condition(rule: &ValueRule) -> Result<ValueCondition, String> {
    match (&rule.equals, &rule.contains, rule.present) {
        (Some(equals), None, None) => Ok(ValueCondition::Equals(equals.clone())),
        (None, Some(contains), None) => Ok(ValueCondition::Contains(contains.clone())),
        (None, None, Some(true)) => Ok(ValueCondition::Present),
        (None, None, Some(false)) => Ok(ValueCondition::Absent),
        _ => Err(format!(
            "rule for '{}' needs exactly one of 'equals', 'contains' or 'present'",
            rule.name
        )),
    }
}

fn compile_response(section: ResponseSection) -> Result<CannedResponse, String> {
    let status = StatusCode::from_u16(section.status)
        .map_err(|_| format!("invalid response status {}", section.status))?;

    let mut headers = HeaderMap::new();
    for (name, value) in section.headers {
        let header_name = HeaderName::from_str(&name)
            .map_err(|_| format!("invalid response header name '{}'", name))?;
        let header_value = HeaderValue::from_str(&value)
            .map_err(|_| format!("invalid value for response header '{}'", name))?;
        headers.append(header_name, header_value);
    }

    Ok(CannedResponse {
        status,
        headers,
        body: Bytes::from(section.body),
    })
}
