//! Recording subsystem.
//!
//! # Data Flow
//! ```text
//! recording sources (ordered .troxy paths)
//!     → format.rs (read, parse TOML, compile predicates)
//!     → store.rs (reject duplicates, fix precedence order)
//!     → RecordingStore (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Recordings are loaded once at startup and never mutated
//! - Any load failure is fatal: no partially loaded recording set
//! - The identity of a recording is its source file name

pub mod format;
pub mod model;
pub mod store;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use format::{load_recording, parse_recording};
pub use model::{CannedResponse, Recording, RecordingId, RequestPattern};
pub use store::RecordingStore;

/// Errors raised while loading recordings.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be read.
    #[error("failed to read recording {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The source is not a well-formed recording document.
    #[error("failed to parse recording {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The document parsed but describes an unusable recording.
    #[error("invalid recording {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    /// Two sources resolve to the same identity.
    #[error("duplicate recording identity '{id}' (from {})", path.display())]
    DuplicateIdentity { id: String, path: PathBuf },
}

impl LoadError {
    /// Attribute the error to the given source path.
    pub(crate) fn at(self, source: &Path) -> Self {
        let path = source.to_path_buf();
        match self {
            LoadError::Io { source, .. } => LoadError::Io { path, source },
            LoadError::Parse { source, .. } => LoadError::Parse { path, source },
            LoadError::Invalid { reason, .. } => LoadError::Invalid { path, reason },
            LoadError::DuplicateIdentity { id, .. } => LoadError::DuplicateIdentity { id, path },
        }
    }
}
