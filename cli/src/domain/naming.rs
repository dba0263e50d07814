//! Agent identity and controller variables.
//!
//! Explicit `APPDYNAMICS_*` settings always win; otherwise values come from
//! the service binding and the application metadata.

use appd_common::{AppdCredentials, VcapApplication};

use crate::domain::config::AgentSettings;
use crate::domain::envfile::{EnvVarSet, ShellValue};

pub const VAR_ACCOUNT_NAME: &str = "APPDYNAMICS_AGENT_ACCOUNT_NAME";
pub const VAR_ACCESS_KEY: &str = "APPDYNAMICS_AGENT_ACCOUNT_ACCESS_KEY";
pub const VAR_SSL_ENABLED: &str = "APPDYNAMICS_CONTROLLER_SSL_ENABLED";
pub const VAR_HOST_NAME: &str = "APPDYNAMICS_CONTROLLER_HOST_NAME";
pub const VAR_PORT: &str = "APPDYNAMICS_CONTROLLER_PORT";
pub const VAR_APPLICATION_NAME: &str = "APPDYNAMICS_AGENT_APPLICATION_NAME";
pub const VAR_TIER_NAME: &str = "APPDYNAMICS_AGENT_TIER_NAME";
pub const VAR_NODE_NAME: &str = "APPDYNAMICS_AGENT_NODE_NAME";
pub const VAR_NODE_PREFIX: &str = "APPDYNAMICS_NODE_PREFIX";

/// Variables without which the agent cannot reach its controller.
pub const REQUIRED_VARS: &[&str] = &[VAR_ACCOUNT_NAME, VAR_ACCESS_KEY, VAR_HOST_NAME, VAR_PORT];

/// Platform variable holding the instance index at runtime.
pub const INSTANCE_INDEX_VAR: &str = "CF_INSTANCE_INDEX";

/// `<space>:<application>` unless overridden.
#[must_use]
pub fn application_name(explicit: Option<&str>, app: &VcapApplication) -> String {
    explicit.map_or_else(
        || format!("{}:{}", app.space_name, app.application_name),
        ToString::to_string,
    )
}

/// The application name unless overridden.
#[must_use]
pub fn tier_name(explicit: Option<&str>, app: &VcapApplication) -> String {
    explicit.map_or_else(|| app.application_name.clone(), ToString::to_string)
}

/// `<application>:${CF_INSTANCE_INDEX}` unless overridden; the index is
/// expanded by the shell when the env file is sourced. An explicit name is
/// written literally.
#[must_use]
pub fn node_name(explicit: Option<&str>, app: &VcapApplication) -> ShellValue {
    explicit.map_or_else(
        || ShellValue::literal(format!("{}:", app.application_name)).then_var(INSTANCE_INDEX_VAR),
        ShellValue::literal,
    )
}

/// Prefix used by the node-name-reuse policy: the explicit setting, else
/// the application name.
#[must_use]
pub fn node_name_prefix(settings: &AgentSettings, app: &VcapApplication) -> String {
    settings
        .node_prefix
        .clone()
        .unwrap_or_else(|| app.application_name.clone())
}

/// Assemble the full variable set. Unresolvable values become empty strings.
#[must_use]
pub fn agent_env_vars(
    settings: &AgentSettings,
    credentials: Option<&AppdCredentials>,
    app: &VcapApplication,
) -> EnvVarSet {
    let bound = credentials.cloned().unwrap_or_default();
    let pick = |explicit: &Option<String>, fallback: String| explicit.clone().unwrap_or(fallback);
    let ssl = if credentials.is_some() {
        bound.ssl_enabled.to_string()
    } else {
        String::new()
    };

    let mut vars = EnvVarSet::new();
    vars.insert(VAR_ACCOUNT_NAME, pick(&settings.agent_account_name, bound.account_name));
    vars.insert(VAR_ACCESS_KEY, pick(&settings.agent_account_access_key, bound.account_access_key));
    vars.insert(VAR_SSL_ENABLED, pick(&settings.controller_ssl_enabled, ssl));
    vars.insert(VAR_HOST_NAME, pick(&settings.controller_host_name, bound.controller_host));
    vars.insert(VAR_PORT, pick(&settings.controller_port, bound.port));
    vars.insert(
        VAR_APPLICATION_NAME,
        application_name(settings.agent_application_name.as_deref(), app),
    );
    vars.insert(VAR_TIER_NAME, tier_name(settings.agent_tier_name.as_deref(), app));
    vars.insert(VAR_NODE_NAME, node_name(settings.agent_node_name.as_deref(), app));
    vars.insert(VAR_NODE_PREFIX, node_name_prefix(settings, app));
    vars
}
