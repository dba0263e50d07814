//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::domain::{BuildpackError, EnvVarSet};

// ── Value Types ───────────────────────────────────────────────────────────────

/// A downloaded resource persisted on local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedResource {
    /// Where the body was written.
    pub path: PathBuf,
    /// Number of body bytes written.
    pub bytes: u64,
    /// Hex SHA-256 of the body. Reported, never verified.
    pub sha256: String,
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Buildpack staging output, passed explicitly into every service instead
/// of a process-wide logger. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit a top-level step (`-----> message`).
    fn step(&self, message: &str);
    /// Emit an indented detail line under the current step.
    fn info(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Emit a line only shown when `BP_DEBUG` is set.
    fn debug(&self, message: &str);
}

// ── Network Port ──────────────────────────────────────────────────────────────

/// Downloads a remote resource to local disk.
pub trait Fetcher {
    /// GET `url` and persist the body at `dest`. When `dest` is an existing
    /// directory the file name is the basename of the URL path.
    ///
    /// # Errors
    ///
    /// `Transport` when the server cannot be reached, `HttpStatus` for any
    /// status other than 200, `InvalidUrl` for an unusable URL and `Io` for
    /// local write failures. No file is left at the destination on failure.
    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchedResource, BuildpackError>;
}

// ── Filesystem Ports ──────────────────────────────────────────────────────────

/// Unpacks an agent package.
pub trait ArchiveExtractor {
    /// Extract the zip at `archive` below `root`, returning every path
    /// written in archive order.
    ///
    /// # Errors
    ///
    /// `ArchiveOpen`, `PathTraversal` or `Io`; see `crate::infra::archive`.
    fn extract(&self, archive: &Path, root: &Path) -> Result<Vec<PathBuf>, BuildpackError>;
}

/// Writes the launch-time env file.
pub trait EnvFileWriter {
    /// Render `vars` with the agent directive for `install_dir` and write
    /// the result, executable, to `env_file`.
    ///
    /// # Errors
    ///
    /// `InvalidVariable` for unusable names or values, `Io` otherwise.
    fn write_env_file(
        &self,
        vars: &EnvVarSet,
        install_dir: &Path,
        env_file: &Path,
        node_name_prefix: &str,
    ) -> Result<(), BuildpackError>;
}

/// Content hashing for local files.
pub trait FileHasher {
    /// Hex SHA-256 of the file at `path`.
    fn sha256_file(&self, path: &Path) -> Result<String>;
}

/// Filesystem operations used while staging.
pub trait StagingFs {
    /// Create each directory (and parents) that does not exist yet.
    fn ensure_dirs(&self, dirs: &[&Path]) -> Result<()>;
    fn is_dir(&self, path: &Path) -> bool;
    /// First file in `dir` (sorted by name) whose name matches `pattern`.
    fn find_package(&self, dir: &Path, pattern: &str) -> Result<Option<PathBuf>>;
    /// Directory named `name` below `root`; the last one in sorted walk order.
    fn locate_dir(&self, root: &Path, name: &str) -> Result<Option<PathBuf>>;
    /// Recursively copy `src` into `dst`, returning the number of files copied.
    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<usize>;
    /// Every path below `root`, for debug listings.
    fn list_tree(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

// ── Environment Port ──────────────────────────────────────────────────────────

/// Read access to the staging environment.
pub trait EnvSource {
    /// Value of `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
    /// All variables, for prefix-based config loading.
    fn vars(&self) -> Vec<(String, String)>;
}
