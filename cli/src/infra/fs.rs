//! Filesystem infrastructure — implements the extraction, env-file and
//! staging ports on the local disk.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;
use wax::{CandidatePath, Glob, Pattern};

use crate::application::ports::{ArchiveExtractor, EnvFileWriter, FileHasher, StagingFs};
use crate::domain::{BuildpackError, EnvVarSet};

/// Mode for staging directories created by the buildpack.
const STAGING_DIR_MODE: u32 = 0o755;

/// Production implementation of the filesystem ports.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl ArchiveExtractor for LocalFs {
    fn extract(&self, archive: &Path, root: &Path) -> Result<Vec<PathBuf>, BuildpackError> {
        crate::infra::archive::extract(archive, root)
    }
}

impl EnvFileWriter for LocalFs {
    fn write_env_file(
        &self,
        vars: &EnvVarSet,
        install_dir: &Path,
        env_file: &Path,
        node_name_prefix: &str,
    ) -> Result<(), BuildpackError> {
        crate::infra::envfile::write_env_file(vars, install_dir, env_file, node_name_prefix)
    }
}

impl FileHasher for LocalFs {
    fn sha256_file(&self, path: &Path) -> Result<String> {
        sha256_file(path)
    }
}

impl StagingFs for LocalFs {
    fn ensure_dirs(&self, dirs: &[&Path]) -> Result<()> {
        for dir in dirs {
            let mut builder = std::fs::DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::DirBuilderExt;
                builder.mode(STAGING_DIR_MODE);
            }
            builder
                .create(dir)
                .with_context(|| format!("creating directory {}", dir.display()))?;
        }
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn find_package(&self, dir: &Path, pattern: &str) -> Result<Option<PathBuf>> {
        find_package(dir, pattern)
    }

    fn locate_dir(&self, root: &Path, name: &str) -> Result<Option<PathBuf>> {
        locate_dir(root, name)
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<usize> {
        copy_dir(src, dst)
    }

    fn list_tree(&self, root: &Path) -> Result<Vec<PathBuf>> {
        list_tree(root)
    }
}

/// First regular file directly inside `dir` whose name matches the glob
/// `pattern`, in name order. A missing `dir` yields `None`.
///
/// # Errors
///
/// Returns an error if `pattern` is not a valid glob or `dir` exists but
/// cannot be read.
pub fn find_package(dir: &Path, pattern: &str) -> Result<Option<PathBuf>> {
    let glob = Glob::new(pattern)
        .map_err(|e| anyhow::anyhow!("invalid package pattern {pattern:?}: {e}"))?;
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names
        .into_iter()
        .find(|n| glob.matched(&CandidatePath::from(n.as_str())).is_some())
        .map(|n| dir.join(n)))
}

/// Directory named `name` below `root`. When several exist the last one in
/// walk order (sorted by file name) wins.
///
/// # Errors
///
/// Returns an error if `root` or any directory below it cannot be read.
pub fn locate_dir(root: &Path, name: &str) -> Result<Option<PathBuf>> {
    let mut found = None;
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("searching {} for {name}", root.display()))?;
        if entry.file_type().is_dir() && entry.file_name() == name {
            found = Some(entry.into_path());
        }
    }
    Ok(found)
}

/// Recursively copy the contents of `src` into `dst`, overwriting files that
/// already exist. Returns the number of files copied.
///
/// # Errors
///
/// Returns an error if any directory cannot be walked or created, or any
/// file cannot be copied.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("relativising {}", entry.path().display()))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("creating directory {}", target.display()))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!("copying {} to {}", entry.path().display(), target.display())
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Every path below `root`, sorted by walk order.
///
/// # Errors
///
/// Returns an error if any part of the tree cannot be read.
pub fn list_tree(root: &Path) -> Result<Vec<PathBuf>> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|e| {
            e.map(walkdir::DirEntry::into_path)
                .with_context(|| format!("listing {}", root.display()))
        })
        .collect()
}

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large files into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

/// Lowercase hex encoding.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
