//! Application service — supply use-case.
//!
//! Installs the agent into the droplet and writes the launch-time env file.
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use appd_common::{AppdCredentials, VcapApplication, VcapServices};
use serde::Serialize;

use crate::application::ports::{
    ArchiveExtractor, EnvFileWriter, EnvSource, Fetcher, FileHasher, ProgressReporter, StagingFs,
};
use crate::domain::config::{
    AGENT_CONFIG_DIR_NAME, ENV_AGENT_HTTP_URL, ENV_CONF_HTTP_URL, ENV_VCAP_APPLICATION,
    ENV_VCAP_SERVICES, PACKAGE_DIR_NAME, VENDOR_DIR_NAME, config_file_url, debug_enabled,
};
use crate::domain::naming::{self, REQUIRED_VARS};
use crate::domain::{AgentSettings, BuildpackConfig};

/// Where the staging run reads from and writes to.
pub struct SupplyRequest<'a> {
    /// Application build directory.
    pub build_dir: &'a Path,
    /// Directory the agent is extracted into.
    pub install_dir: &'a Path,
    /// Path the install directory has when the app runs; embedded in
    /// `-javaagent`. Defaults to `install_dir`.
    pub runtime_install_dir: Option<&'a Path>,
    /// Scratch directory for the downloaded package.
    pub download_dir: &'a Path,
    /// Env file to write.
    pub env_file: &'a Path,
}

/// Injected ports for the supply pipeline.
pub struct SupplyPorts<'a, F, X, W, S, H, E, R> {
    pub fetcher: &'a F,
    pub extractor: &'a X,
    pub writer: &'a W,
    pub fs: &'a S,
    pub hasher: &'a H,
    pub env: &'a E,
    pub reporter: &'a R,
}

/// Where the agent package came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PackageSource {
    Http { url: String },
    Vendored { path: PathBuf },
}

/// Outcome of a supply run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplyReport {
    pub source: PackageSource,
    pub package: PathBuf,
    pub package_sha256: String,
    pub extracted: usize,
    pub config_files_fetched: Vec<String>,
    pub config_files_skipped: Vec<String>,
    pub overrides_copied: usize,
    pub env_file: PathBuf,
    pub node_name_prefix: String,
    pub missing_variables: Vec<String>,
}

/// Run the supply pipeline.
///
/// Optional config downloads and missing controller settings only produce
/// warnings. Everything else, including an archive entry escaping the
/// install directory, aborts the run.
///
/// # Errors
///
/// Returns an error if no agent package can be resolved, the package cannot
/// be downloaded or extracted, the override directory cannot be copied, or
/// the env file cannot be written.
pub fn supply<F, X, W, S, H, E, R>(
    ports: &SupplyPorts<'_, F, X, W, S, H, E, R>,
    request: &SupplyRequest<'_>,
) -> Result<SupplyReport>
where
    F: Fetcher,
    X: ArchiveExtractor,
    W: EnvFileWriter,
    S: StagingFs,
    H: FileHasher,
    E: EnvSource,
    R: ProgressReporter,
{
    let reporter = ports.reporter;
    let vars = ports.env.vars();
    let config = BuildpackConfig::from_vars(vars.clone())?;
    let settings = AgentSettings::from_vars(vars.clone())?;
    let debug = debug_enabled(vars);

    reporter.step("AppDynamics Buildpack");
    let conf_dir = request.install_dir.join(AGENT_CONFIG_DIR_NAME);
    ports
        .fs
        .ensure_dirs(&[request.install_dir, conf_dir.as_path(), request.download_dir])?;

    // Looked up before extraction so directories inside the agent package
    // are never mistaken for user overrides.
    let overrides = locate_overrides(ports.fs, request.build_dir)?;

    let (source, package) = resolve_package(ports, &config, request)?;
    let package_sha256 = ports.hasher.sha256_file(&package)?;
    reporter.info(&format!("package sha256 {package_sha256}"));

    reporter.step(&format!(
        "Extracting {} to {}",
        package.display(),
        request.install_dir.display()
    ));
    let extracted = ports
        .extractor
        .extract(&package, request.install_dir)
        .with_context(|| format!("extracting agent package {}", package.display()))?;
    reporter.info(&format!("extracted {} entries", extracted.len()));

    let (config_files_fetched, config_files_skipped) =
        fetch_config_files(ports.fetcher, reporter, &config, &conf_dir)?;

    let overrides_copied = match overrides {
        Some(src) => {
            reporter.step(&format!(
                "Copying {} to {}",
                src.display(),
                conf_dir.display()
            ));
            ports
                .fs
                .copy_dir(&src, &conf_dir)
                .with_context(|| format!("copying configuration overrides from {}", src.display()))?
        }
        None => {
            reporter.info("no AppDynamics configuration overrides found");
            0
        }
    };

    reporter.step("Writing agent environment");
    let app = application_metadata(ports.env, reporter);
    let credentials = service_credentials(ports.env, reporter);
    let env_vars = naming::agent_env_vars(&settings, credentials.as_ref(), &app);
    let missing_variables: Vec<String> = env_vars
        .missing(REQUIRED_VARS)
        .into_iter()
        .map(ToString::to_string)
        .collect();
    if !missing_variables.is_empty() {
        reporter.warn(&format!(
            "missing agent settings: {}",
            missing_variables.join(", ")
        ));
    }
    let node_name_prefix = naming::node_name_prefix(&settings, &app);
    let agent_dir = request.runtime_install_dir.unwrap_or(request.install_dir);
    ports
        .writer
        .write_env_file(&env_vars, agent_dir, request.env_file, &node_name_prefix)
        .with_context(|| format!("writing env file {}", request.env_file.display()))?;
    reporter.info(&format!("wrote {}", request.env_file.display()));

    if debug {
        for path in ports.fs.list_tree(request.install_dir)? {
            reporter.debug(&path.display().to_string());
        }
    }

    reporter.success("AppDynamics agent installed");
    Ok(SupplyReport {
        source,
        package,
        package_sha256,
        extracted: extracted.len(),
        config_files_fetched,
        config_files_skipped,
        overrides_copied,
        env_file: request.env_file.to_path_buf(),
        node_name_prefix,
        missing_variables,
    })
}

/// The `appdynamics/conf` directory the app ships, if any. The last
/// `appdynamics` directory in walk order is used.
fn locate_overrides(fs: &impl StagingFs, build_dir: &Path) -> Result<Option<PathBuf>> {
    let Some(dir) = fs.locate_dir(build_dir, PACKAGE_DIR_NAME)? else {
        return Ok(None);
    };
    let conf = dir.join(AGENT_CONFIG_DIR_NAME);
    Ok(fs.is_dir(&conf).then_some(conf))
}

/// `APPD_AGENT_HTTP_URL` wins; otherwise the first vendored package.
fn resolve_package<F, X, W, S, H, E, R>(
    ports: &SupplyPorts<'_, F, X, W, S, H, E, R>,
    config: &BuildpackConfig,
    request: &SupplyRequest<'_>,
) -> Result<(PackageSource, PathBuf)>
where
    F: Fetcher,
    S: StagingFs,
    R: ProgressReporter,
{
    if let Some(url) = &config.agent_http_url {
        ports.reporter.step(&format!("Downloading agent package from {url}"));
        let fetched = ports
            .fetcher
            .fetch(url, request.download_dir)
            .with_context(|| format!("downloading agent package from {ENV_AGENT_HTTP_URL}"))?;
        ports.reporter.info(&format!(
            "downloaded {} ({} bytes)",
            fetched.path.display(),
            fetched.bytes
        ));
        return Ok((PackageSource::Http { url: url.clone() }, fetched.path));
    }

    let vendor_dir = request.build_dir.join(VENDOR_DIR_NAME);
    ports.reporter.step(&format!(
        "{ENV_AGENT_HTTP_URL} not set, looking for {} in {}",
        config.package_pattern,
        vendor_dir.display()
    ));
    let path = ports
        .fs
        .find_package(&vendor_dir, &config.package_pattern)?
        .with_context(|| {
            format!(
                "no AppDynamics agent package: set {ENV_AGENT_HTTP_URL} or vendor a package matching {} in {}",
                config.package_pattern,
                vendor_dir.display()
            )
        })?;
    ports.reporter.info(&format!("using vendored {}", path.display()));
    Ok((PackageSource::Vendored { path: path.clone() }, path))
}

/// Download each configured file from `APPD_CONF_HTTP_URL`. A file that
/// cannot be fetched is skipped with a warning.
fn fetch_config_files(
    fetcher: &impl Fetcher,
    reporter: &impl ProgressReporter,
    config: &BuildpackConfig,
    conf_dir: &Path,
) -> Result<(Vec<String>, Vec<String>)> {
    let Some(base) = &config.conf_http_url else {
        reporter.info(&format!(
            "{ENV_CONF_HTTP_URL} not set, skipping configuration download"
        ));
        return Ok((Vec::new(), Vec::new()));
    };

    reporter.step(&format!(
        "Downloading {} to {}",
        config.config_files.join(", "),
        conf_dir.display()
    ));
    let mut fetched = Vec::new();
    let mut skipped = Vec::new();
    for name in &config.config_files {
        let url = config_file_url(base, name)?;
        let Some(file_name) = Path::new(name).file_name() else {
            reporter.warn(&format!("skipping config file with no file name: {name:?}"));
            skipped.push(name.clone());
            continue;
        };
        match fetcher.fetch(&url, &conf_dir.join(file_name)) {
            Ok(res) => {
                reporter.info(&format!("{name} ({} bytes)", res.bytes));
                fetched.push(name.clone());
            }
            Err(e) => {
                reporter.warn(&format!("skipping download of {name}: {e}"));
                skipped.push(name.clone());
            }
        }
    }
    Ok((fetched, skipped))
}

/// `VCAP_APPLICATION`, or empty metadata with a warning.
fn application_metadata(env: &impl EnvSource, reporter: &impl ProgressReporter) -> VcapApplication {
    let Some(raw) = env.var(ENV_VCAP_APPLICATION) else {
        reporter.warn(&format!("{ENV_VCAP_APPLICATION} not set"));
        return VcapApplication::default();
    };
    VcapApplication::from_json(&raw).unwrap_or_else(|e| {
        reporter.warn(&e.to_string());
        VcapApplication::default()
    })
}

/// Credentials of the bound `appdynamics` service, or `None` with a warning.
fn service_credentials(
    env: &impl EnvSource,
    reporter: &impl ProgressReporter,
) -> Option<AppdCredentials> {
    let Some(raw) = env.var(ENV_VCAP_SERVICES) else {
        reporter.warn(&format!("{ENV_VCAP_SERVICES} not set"));
        return None;
    };
    match VcapServices::from_json(&raw).and_then(|s| s.appdynamics().cloned()) {
        Ok(creds) => Some(creds),
        Err(e) => {
            reporter.warn(&e.to_string());
            None
        }
    }
}
