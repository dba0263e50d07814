//! Env-file writer — persists the text rendered by `crate::domain::envfile`.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::domain::BuildpackError;
use crate::domain::envfile::{EnvVarSet, render};

/// The env file is sourced by the launcher, so it is made executable.
pub const ENV_FILE_MODE: u32 = 0o755;

/// Render and write the env file to `env_file`.
///
/// The content goes to a temp file in the same directory which replaces
/// `env_file` atomically once fully written, so a failed write never leaves
/// a truncated script behind.
///
/// # Errors
///
/// Returns [`BuildpackError::InvalidVariable`] for unusable names or values
/// and [`BuildpackError::Io`] if the file cannot be written.
pub fn write_env_file(
    vars: &EnvVarSet,
    install_dir: &Path,
    env_file: &Path,
    node_name_prefix: &str,
) -> Result<(), BuildpackError> {
    let contents = render(vars, install_dir, node_name_prefix)?;
    tracing::debug!(
        path = %env_file.display(),
        variables = vars.len(),
        %node_name_prefix,
        "writing env file"
    );

    let dir = match env_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| BuildpackError::io("creating temp file in", dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| BuildpackError::io("writing", env_file, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| BuildpackError::io("flushing", env_file, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(ENV_FILE_MODE))
            .map_err(|e| BuildpackError::io("setting permissions on", env_file, e))?;
    }
    tmp.persist(env_file)
        .map_err(|e| BuildpackError::io("writing", env_file, e.error))?;
    Ok(())
}
