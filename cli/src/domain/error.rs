//! Typed domain error enum.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application` or `std::fs`. The fetch, extract and env-file
//! operations return [`BuildpackError`] so callers can tell the failure
//! classes apart; command handlers convert it to `anyhow::Error` via `?`.

use std::path::PathBuf;

use thiserror::Error;

/// Failure classes of the download, unpack and env-file pipeline.
#[derive(Debug, Error)]
pub enum BuildpackError {
    /// The server could not be reached (DNS, connect, TLS, timeout).
    #[error("downloading {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The server answered with anything other than `200 OK`.
    #[error("downloading {url} failed: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("invalid download URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The archive is missing, unreadable or not a zip container.
    #[error("cannot open archive {}: {reason}", path.display())]
    ArchiveOpen { path: PathBuf, reason: String },

    /// An archive entry resolves outside the extraction root. Always fatal.
    #[error("illegal file path in archive: '{entry}' escapes {}", root.display())]
    PathTraversal { entry: String, root: PathBuf },

    #[error("invalid environment variable {name}: {reason}")]
    InvalidVariable { name: String, reason: String },

    /// Local filesystem failure.
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildpackError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// HTTP status carried by an [`BuildpackError::HttpStatus`], if any.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_path_traversal(&self) -> bool {
        matches!(self, Self::PathTraversal { .. })
    }

    /// Stable identifier for `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "TRANSPORT",
            Self::HttpStatus { .. } => "HTTP_STATUS",
            Self::InvalidUrl { .. } => "INVALID_URL",
            Self::ArchiveOpen { .. } => "ARCHIVE_OPEN",
            Self::PathTraversal { .. } => "PATH_TRAVERSAL",
            Self::InvalidVariable { .. } => "INVALID_VARIABLE",
            Self::Io { .. } => "IO",
        }
    }
}
