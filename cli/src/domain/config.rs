//! Configuration schema loaded from the staging environment.
//!
//! Pure functions only: callers hand in the variables (normally
//! `std::env::vars()`, a map in tests) and `envy` maps the prefixed ones onto
//! the structs below.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::error::BuildpackError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Variable holding the agent package download URL.
pub const ENV_AGENT_HTTP_URL: &str = "APPD_AGENT_HTTP_URL";
/// Variable holding the base URL that optional config files are fetched from.
pub const ENV_CONF_HTTP_URL: &str = "APPD_CONF_HTTP_URL";
/// Any non-empty value turns on debug logging and tree listings.
pub const ENV_BP_DEBUG: &str = "BP_DEBUG";
pub const ENV_VCAP_SERVICES: &str = "VCAP_SERVICES";
pub const ENV_VCAP_APPLICATION: &str = "VCAP_APPLICATION";

/// Install directory created inside the droplet's deps dir.
pub const DEFAULT_INSTALL_DIR_NAME: &str = ".appdynamics";
/// Directory in the application's build dir holding vendored packages.
pub const VENDOR_DIR_NAME: &str = "vendor";
/// Directory name searched for configuration overrides in the build dir.
pub const PACKAGE_DIR_NAME: &str = "appdynamics";
/// Sub-directory of [`PACKAGE_DIR_NAME`] holding the override files.
pub const AGENT_CONFIG_DIR_NAME: &str = "conf";
/// Env file sourced by the launcher at container start.
pub const ENV_FILE_NAME: &str = "appd.sh";
/// Scripts in this directory of the droplet are sourced before launch.
pub const PROFILE_DIR_NAME: &str = ".profile.d";
/// Runtime reference to the droplet root, expanded when the env file is sourced.
pub const RUNTIME_HOME_REF: &str = "$HOME";
/// Glob matched against files in the vendor directory.
pub const DEFAULT_PACKAGE_PATTERN: &str = "AppServerAgent*.zip";
/// Optional files fetched from [`ENV_CONF_HTTP_URL`].
pub const DEFAULT_CONFIG_FILES: &[&str] = &["controller-info.xml", "log4j2.xml", "custom-activity-correlation.xml"];

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

// ── APPD_* buildpack settings ────────────────────────────────────────────────

/// Buildpack settings read from `APPD_*` variables.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BuildpackConfig {
    /// `APPD_AGENT_HTTP_URL`
    #[serde(default)]
    pub agent_http_url: Option<String>,
    /// `APPD_CONF_HTTP_URL`
    #[serde(default)]
    pub conf_http_url: Option<String>,
    /// `APPD_HTTP_TIMEOUT_SECS`
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// `APPD_INSTALL_DIR_NAME`
    #[serde(default = "default_install_dir_name")]
    pub install_dir_name: String,
    /// `APPD_PACKAGE_PATTERN`
    #[serde(default = "default_package_pattern")]
    pub package_pattern: String,
    /// `APPD_CONFIG_FILES`, comma separated.
    #[serde(default = "default_config_files")]
    pub config_files: Vec<String>,
}

impl Default for BuildpackConfig {
    fn default() -> Self {
        Self {
            agent_http_url: None,
            conf_http_url: None,
            http_timeout_secs: default_http_timeout_secs(),
            install_dir_name: default_install_dir_name(),
            package_pattern: default_package_pattern(),
            config_files: default_config_files(),
        }
    }
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_install_dir_name() -> String {
    DEFAULT_INSTALL_DIR_NAME.to_string()
}

fn default_package_pattern() -> String {
    DEFAULT_PACKAGE_PATTERN.to_string()
}

fn default_config_files() -> Vec<String> {
    DEFAULT_CONFIG_FILES.iter().map(ToString::to_string).collect()
}

impl BuildpackConfig {
    /// Load from `APPD_*` variables. Empty URL values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be parsed (e.g. a non-numeric timeout).
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut cfg: Self = envy::prefixed("APPD_")
            .from_iter(vars)
            .context("failed to load buildpack settings from APPD_* variables")?;
        cfg.agent_http_url = cfg.agent_http_url.filter(|u| !u.trim().is_empty());
        cfg.conf_http_url = cfg.conf_http_url.filter(|u| !u.trim().is_empty());
        cfg.config_files.retain(|f| !f.trim().is_empty());
        Ok(cfg)
    }

    #[must_use]
    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_secs)
    }
}

// ── APPDYNAMICS_* agent overrides ────────────────────────────────────────────

/// Agent settings the operator can set explicitly with `APPDYNAMICS_*`
/// variables. Unset fields fall back to the service binding and
/// application metadata.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentSettings {
    pub agent_account_name: Option<String>,
    pub agent_account_access_key: Option<String>,
    pub controller_ssl_enabled: Option<String>,
    pub controller_host_name: Option<String>,
    pub controller_port: Option<String>,
    pub agent_application_name: Option<String>,
    pub agent_tier_name: Option<String>,
    pub agent_node_name: Option<String>,
    pub node_prefix: Option<String>,
}

impl AgentSettings {
    /// Load from `APPDYNAMICS_*` variables. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the variables cannot be deserialized.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars = vars.into_iter().filter(|(_, v)| !v.is_empty());
        envy::prefixed("APPDYNAMICS_")
            .from_iter(vars)
            .context("failed to load agent settings from APPDYNAMICS_* variables")
    }
}

/// Whether `BP_DEBUG` is set to a non-empty value.
#[must_use]
pub fn debug_enabled<I>(vars: I) -> bool
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter().any(|(k, v)| k == ENV_BP_DEBUG && !v.is_empty())
}

/// Path of `install_dir` as seen by the running app. Inside the build dir
/// it becomes relative to [`RUNTIME_HOME_REF`], since the droplet is
/// relocated at launch; anywhere else it is used as is.
#[must_use]
pub fn runtime_install_dir(build_dir: &Path, install_dir: &Path) -> PathBuf {
    match install_dir.strip_prefix(build_dir) {
        Ok(rel) => Path::new(RUNTIME_HOME_REF).join(rel),
        Err(_) => install_dir.to_path_buf(),
    }
}

/// URL of config file `name` under the `APPD_CONF_HTTP_URL` base: the name
/// is appended to the base path, query and fragment are kept.
///
/// # Errors
///
/// Returns [`BuildpackError::InvalidUrl`] if `base` does not parse or
/// cannot carry a path.
pub fn config_file_url(base: &str, name: &str) -> Result<String, BuildpackError> {
    let invalid = |reason: String| BuildpackError::InvalidUrl {
        url: base.to_string(),
        reason,
    };
    let mut url = url::Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot carry a path".to_string()));
    }
    let path = format!("{}/{}", url.path().trim_end_matches('/'), name.trim_start_matches('/'));
    url.set_path(&path);
    Ok(url.to_string())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
