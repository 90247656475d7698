//! Routing subsystem: request → recording selection.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, headers, query, body)
//!     → router.rs (walk recordings in precedence order)
//!     → matcher.rs (evaluate predicates)
//!     → Return: matched Recording or NoMatch
//!
//! Precedence (fixed at load time by the RecordingStore):
//!     priority (higher first) → load order
//! ```
//!
//! # Design Decisions
//! - Recordings compiled at startup, immutable at runtime
//! - No regex in hot path (exact/prefix/contains only)
//! - Deterministic: same input always matches same recording
//! - First full match wins

pub mod matcher;
pub mod router;

pub use matcher::{Matcher, Predicate, PredicateError};
pub use router::{match_request, MatchResult};
