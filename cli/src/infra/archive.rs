//! Zip extraction with zip-slip protection.
//!
//! Every entry's destination is resolved by
//! [`crate::domain::archive::resolve_entry_path`] before anything is written.
//! The first escaping entry aborts the run; entries extracted before it stay
//! on disk.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::domain::BuildpackError;
use crate::domain::archive::{is_dir_entry, resolve_entry_path};

/// Mode for directories the archive does not describe itself.
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Extract the zip at `archive` below `root`.
///
/// Returns every destination path written (directories and files) in archive
/// order.
///
/// # Errors
///
/// - [`BuildpackError::ArchiveOpen`] if the file is missing, unreadable or
///   not a zip container.
/// - [`BuildpackError::PathTraversal`] for the first entry resolving outside
///   `root`; nothing is written for that entry.
/// - [`BuildpackError::Io`] for directory/file creation, decompression or
///   write failures. A file whose content could not be fully written is
///   removed.
pub fn extract(archive: &Path, root: &Path) -> Result<Vec<PathBuf>, BuildpackError> {
    let file = File::open(archive).map_err(|e| BuildpackError::ArchiveOpen {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut zip = ZipArchive::new(file).map_err(|e| BuildpackError::ArchiveOpen {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut written = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| {
            BuildpackError::io("reading entry of", archive, io::Error::other(e))
        })?;
        let name = entry.name().to_string();
        let dest = resolve_entry_path(root, &name)?;

        if entry.is_dir() || is_dir_entry(&name) {
            create_dir(&dest)?;
            tracing::trace!(entry = %name, "created directory");
        } else {
            if let Some(parent) = dest.parent() {
                create_dir(parent)?;
            }
            let mode = entry.unix_mode().map(|m| m & 0o7777);
            write_entry(&mut entry, &dest, mode)?;
            tracing::trace!(entry = %name, "extracted file");
        }
        written.push(dest);
    }
    tracing::debug!(
        archive = %archive.display(),
        root = %root.display(),
        entries = written.len(),
        "extraction complete"
    );
    Ok(written)
}

/// Create `dir` and any missing parents. An existing directory is fine.
fn create_dir(dir: &Path) -> Result<(), BuildpackError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DEFAULT_DIR_MODE);
    }
    match builder.create(dir) {
        Ok(()) => Ok(()),
        Err(_) if dir.is_dir() => Ok(()),
        Err(e) => Err(BuildpackError::io("creating directory", dir, e)),
    }
}

/// Stream one entry into `dest`. The output handle is closed before
/// returning so at most one extracted file is open at a time.
fn write_entry(
    content: &mut impl io::Read,
    dest: &Path,
    mode: Option<u32>,
) -> Result<(), BuildpackError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if let Some(mode) = mode {
            options.mode(mode);
        }
    }
    let mut out = options
        .open(dest)
        .map_err(|e| BuildpackError::io("creating", dest, e))?;

    let copied = io::copy(content, &mut out).and_then(|_| out.sync_all());
    drop(out);
    if let Err(e) = copied {
        fs::remove_file(dest).ok();
        return Err(BuildpackError::io("extracting", dest, e));
    }

    // `mode` on open only applies to new files and is masked by the umask.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            fs::set_permissions(dest, fs::Permissions::from_mode(mode))
                .map_err(|e| BuildpackError::io("setting permissions on", dest, e))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;
    Ok(())
}
