//! Archive entry path resolution (zip-slip defence).
//!
//! Pure functions only. The extractor in `crate::infra::archive` calls
//! [`resolve_entry_path`] for every entry before touching the filesystem.

use std::path::{Component, Path, PathBuf};

use crate::domain::error::BuildpackError;

/// Lexically clean `path`: drop `.` components and fold `..` into the
/// preceding component. Never touches the filesystem.
///
/// `..` directly under the root directory is dropped (`/..` is `/`); on a
/// relative path with nothing left to pop it is kept.
#[must_use]
pub fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            _ => out.push(comp),
        }
    }
    out.iter().collect()
}

/// Normalize separators in a stored entry name (`\` becomes `/`).
#[must_use]
pub fn normalize_entry_name(name: &str) -> String {
    name.replace('\\', "/")
}

/// Whether a stored entry name marks a directory.
#[must_use]
pub fn is_dir_entry(name: &str) -> bool {
    normalize_entry_name(name).ends_with('/')
}

/// Resolve the destination of archive entry `entry_name` under `root`.
///
/// The name is joined onto the cleaned root the way a path join would
/// (a leading `/` does not make it absolute), cleaned, and must then lie
/// strictly below the root.
///
/// # Errors
///
/// Returns [`BuildpackError::PathTraversal`] when the entry would land on
/// or outside `root`.
pub fn resolve_entry_path(root: &Path, entry_name: &str) -> Result<PathBuf, BuildpackError> {
    let root = clean(root);
    let normalized = normalize_entry_name(entry_name);
    let relative: PathBuf = Path::new(&normalized)
        .components()
        .filter(|c| {
            matches!(
                c,
                Component::Normal(_) | Component::CurDir | Component::ParentDir
            )
        })
        .collect();
    let resolved = clean(&root.join(relative));

    let escapes_upward = resolved.components().any(|c| c == Component::ParentDir)
        && !root.components().any(|c| c == Component::ParentDir);
    if escapes_upward || !resolved.starts_with(&root) || resolved == root {
        return Err(BuildpackError::PathTraversal {
            entry: entry_name.to_string(),
            root,
        });
    }
    Ok(resolved)
}
