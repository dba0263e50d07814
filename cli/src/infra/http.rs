//! HTTP infrastructure — implements the `Fetcher` port with `ureq`.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::ProgressBar;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::application::ports::{FetchedResource, Fetcher};
use crate::domain::BuildpackError;
use crate::infra::fs::hex_encode;

const USER_AGENT: &str = concat!("appd-buildpack/", env!("CARGO_PKG_VERSION"));

/// Builds a progress bar from the expected body length and the file name.
pub type ProgressFactory = Box<dyn Fn(Option<u64>, &str) -> ProgressBar>;

/// Blocking HTTP downloader with an explicit request timeout.
pub struct UreqFetcher {
    agent: ureq::Agent,
    progress: Option<ProgressFactory>,
}

impl UreqFetcher {
    /// `timeout` bounds the whole request including the body transfer.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            progress: None,
        }
    }

    /// Show download progress using bars made by `factory`.
    #[must_use]
    pub fn with_progress(mut self, factory: ProgressFactory) -> Self {
        self.progress = Some(factory);
        self
    }

    fn progress_bar(&self, total: Option<u64>, target: &Path) -> ProgressBar {
        let Some(factory) = &self.progress else {
            return ProgressBar::hidden();
        };
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        factory(total, &name)
    }
}

impl Fetcher for UreqFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchedResource, BuildpackError> {
        let target = destination_for(url, dest)?;
        tracing::debug!(%url, dest = %target.display(), "starting download");

        let response = match self.agent.get(url).call() {
            Ok(r) => r,
            Err(ureq::Error::Status(status, _)) => {
                return Err(BuildpackError::HttpStatus {
                    url: url.to_string(),
                    status,
                });
            }
            Err(ureq::Error::Transport(t)) => {
                return Err(BuildpackError::Transport {
                    url: url.to_string(),
                    reason: t.to_string(),
                });
            }
        };
        // Only 200 carries the full resource; 2xx variants such as 204/206 do not.
        if response.status() != 200 {
            return Err(BuildpackError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let total = response
            .header("Content-Length")
            .and_then(|v| v.parse::<u64>().ok());
        let pb = self.progress_bar(total, &target);

        // The body goes to a sibling temp file that is only persisted once
        // complete; dropping it on any error removes it.
        let parent = parent_dir(&target);
        let mut tmp = NamedTempFile::new_in(parent)
            .map_err(|e| BuildpackError::io("creating temp file in", parent, e))?;

        let mut reader = response.into_reader();
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; 64 * 1024];
        let mut written = 0u64;
        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|e| BuildpackError::io("reading response body for", &target, e))?;
            if n == 0 {
                break;
            }
            tmp.write_all(&buf[..n])
                .map_err(|e| BuildpackError::io("writing", &target, e))?;
            hasher.update(&buf[..n]);
            written += n as u64;
            pb.inc(n as u64);
        }
        pb.finish_and_clear();
        tmp.as_file()
            .sync_all()
            .map_err(|e| BuildpackError::io("flushing", &target, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))
                .map_err(|e| BuildpackError::io("setting permissions on", &target, e))?;
        }
        tmp.persist(&target)
            .map_err(|e| BuildpackError::io("persisting", &target, e.error))?;

        let sha256 = hex_encode(&hasher.finalize());
        tracing::info!(%url, path = %target.display(), bytes = written, %sha256, "download complete");
        Ok(FetchedResource {
            path: target,
            bytes: written,
            sha256,
        })
    }
}

/// Resolve the file a download of `url` should land in.
///
/// An existing directory gets the URL path's basename appended; anything
/// else is used as the file path verbatim.
///
/// # Errors
///
/// Returns [`BuildpackError::InvalidUrl`] if `url` does not parse, or if a
/// directory destination is given and the URL path has no basename.
pub fn destination_for(url: &str, dest: &Path) -> Result<PathBuf, BuildpackError> {
    let parsed = url::Url::parse(url).map_err(|e| BuildpackError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !dest.is_dir() {
        return Ok(dest.to_path_buf());
    }
    let name = url_basename(&parsed).ok_or_else(|| BuildpackError::InvalidUrl {
        url: url.to_string(),
        reason: "URL path has no file name".to_string(),
    })?;
    Ok(dest.join(name))
}

/// Last non-empty segment of the URL path, percent-decoded. A segment that
/// decodes to something other than a plain file name yields `None`.
#[must_use]
pub fn url_basename(url: &url::Url) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    let name = urlencoding::decode(segment).ok()?.into_owned();
    let plain = !matches!(name.as_str(), "." | "..") && !name.contains(['/', '\\', '\0']);
    plain.then_some(name)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
