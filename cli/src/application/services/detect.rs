//! Application service — detect use-case.
//!
//! Decides whether the buildpack applies to an application. Imports only
//! from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use appd_common::{APPDYNAMICS_SERVICE, VcapServices};

use crate::application::ports::{EnvSource, StagingFs};
use crate::domain::BuildpackConfig;
use crate::domain::config::{ENV_VCAP_SERVICES, VENDOR_DIR_NAME};

/// Why the buildpack applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// An `appdynamics` service is bound.
    ServiceBinding,
    /// `APPD_AGENT_HTTP_URL` is set.
    HttpPackage(String),
    /// An agent package is vendored with the application.
    VendoredPackage(PathBuf),
}

impl Detection {
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::ServiceBinding => format!("{APPDYNAMICS_SERVICE} service binding"),
            Self::HttpPackage(url) => format!("agent package at {url}"),
            Self::VendoredPackage(path) => format!("vendored agent package {}", path.display()),
        }
    }
}

/// Check the service binding, then the download URL, then the vendor
/// directory. A malformed `VCAP_SERVICES` counts as no binding.
///
/// # Errors
///
/// Returns an error if the `APPD_*` settings cannot be parsed or the vendor
/// directory cannot be searched.
pub fn detect(
    fs: &impl StagingFs,
    env: &impl EnvSource,
    build_dir: &Path,
) -> Result<Option<Detection>> {
    let bound = env
        .var(ENV_VCAP_SERVICES)
        .and_then(|raw| VcapServices::from_json(&raw).ok())
        .is_some_and(|s| s.has_service(APPDYNAMICS_SERVICE));
    if bound {
        return Ok(Some(Detection::ServiceBinding));
    }

    let config = BuildpackConfig::from_vars(env.vars())?;
    if let Some(url) = config.agent_http_url {
        return Ok(Some(Detection::HttpPackage(url)));
    }

    let vendor_dir = build_dir.join(VENDOR_DIR_NAME);
    Ok(fs
        .find_package(&vendor_dir, &config.package_pattern)?
        .map(Detection::VendoredPackage))
}
