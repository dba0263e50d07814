//! Env-file synthesis — pure rendering of the launch-time shell script.
//!
//! Zero imports from `std::fs` or `crate::infra`; writing the rendered text
//! to disk is `crate::infra::envfile`'s job.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::BuildpackError;

/// Agent loader artifact shipped at the root of the agent package.
pub const AGENT_JAR: &str = "javaagent.jar";

/// Runtime-options variable the JVM launcher reads.
pub const JAVA_OPTS_VAR: &str = "JAVA_OPTS";

pub const REUSE_NODE_NAME_FLAG: &str = "appdynamics.agent.reuse.nodeName";
pub const REUSE_NODE_NAME_PREFIX_FLAG: &str = "appdynamics.agent.reuse.nodeName.prefix";

/// POSIX shell variable names.
pub static VAR_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex")
});

/// One piece of a [`ShellValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellPart {
    /// Text written verbatim; nothing in it is expanded by the shell.
    Literal(String),
    /// A variable the shell expands when the file is sourced.
    Var(String),
}

/// A value written into the env file.
///
/// Everything built from strings is literal: `$`, backticks, quotes and
/// backslashes in credentials reach the application unchanged. Runtime
/// references such as `CF_INSTANCE_INDEX` are added explicitly with
/// [`ShellValue::then_var`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellValue(Vec<ShellPart>);

impl ShellValue {
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self(vec![ShellPart::Literal(text.into())])
    }

    /// A reference to the shell variable `name`.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self(vec![ShellPart::Var(name.into())])
    }

    #[must_use]
    pub fn then_literal(mut self, text: impl Into<String>) -> Self {
        self.0.push(ShellPart::Literal(text.into()));
        self
    }

    #[must_use]
    pub fn then_var(mut self, name: impl Into<String>) -> Self {
        self.0.push(ShellPart::Var(name.into()));
        self
    }

    /// Append every part of `other`.
    #[must_use]
    pub fn then(mut self, other: ShellValue) -> Self {
        self.0.extend(other.0);
        self
    }

    /// No variable references and no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0
            .iter()
            .all(|part| matches!(part, ShellPart::Literal(text) if text.is_empty()))
    }

    /// Double-quote the value for a POSIX shell.
    ///
    /// Literal text has `"`, `\`, `` ` `` and `$` escaped; variable
    /// references are written as `${NAME}`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildpackError::InvalidVariable`] (reported against
    /// `name`) when literal text contains a newline, carriage return or NUL,
    /// or a referenced variable name is not a valid shell name.
    pub fn quote(&self, name: &str) -> Result<String, BuildpackError> {
        let mut quoted = String::from('"');
        for part in &self.0 {
            match part {
                ShellPart::Literal(text) => {
                    if text.contains(['\n', '\r', '\0']) {
                        return Err(BuildpackError::InvalidVariable {
                            name: name.to_string(),
                            reason: "value contains a line break or NUL byte".to_string(),
                        });
                    }
                    for ch in text.chars() {
                        if matches!(ch, '"' | '\\' | '`' | '$') {
                            quoted.push('\\');
                        }
                        quoted.push(ch);
                    }
                }
                ShellPart::Var(var) => {
                    if !VAR_NAME_RE.is_match(var) {
                        return Err(BuildpackError::InvalidVariable {
                            name: name.to_string(),
                            reason: format!("references invalid shell variable {var:?}"),
                        });
                    }
                    quoted.push_str(&format!("${{{var}}}"));
                }
            }
        }
        quoted.push('"');
        Ok(quoted)
    }
}

/// Unquoted shell form, for logs and assertions.
impl fmt::Display for ShellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.0 {
            match part {
                ShellPart::Literal(text) => f.write_str(text)?,
                ShellPart::Var(var) => write!(f, "${{{var}}}")?,
            }
        }
        Ok(())
    }
}

impl From<&str> for ShellValue {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for ShellValue {
    fn from(text: String) -> Self {
        Self::literal(text)
    }
}

/// Variables exported into the application container.
///
/// Backed by a `BTreeMap` so the generated file lists them sorted by name and
/// identical inputs always render identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVarSet(BTreeMap<String, ShellValue>);

impl EnvVarSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a variable. Plain strings are stored literally.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ShellValue>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ShellValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShellValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names from `required` that are absent or empty.
    #[must_use]
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none_or(ShellValue::is_empty))
            .collect()
    }
}

impl<K: Into<String>, V: Into<ShellValue>> FromIterator<(K, V)> for EnvVarSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Path of the agent jar below `install_dir`.
///
/// A leading `$NAME` component (such as `$HOME` for the relocated droplet)
/// stays a runtime reference; the rest of the path is literal.
#[must_use]
pub fn agent_jar_path(install_dir: &Path) -> ShellValue {
    let jar = install_dir.join(AGENT_JAR);
    let mut components = jar.components();
    if let Some(Component::Normal(first)) = components.next() {
        let reference = first
            .to_str()
            .and_then(|s| s.strip_prefix('$'))
            .filter(|name| VAR_NAME_RE.is_match(name));
        if let Some(name) = reference {
            return ShellValue::var(name)
                .then_literal(format!("/{}", components.as_path().display()));
        }
    }
    ShellValue::literal(jar.display().to_string())
}

/// The `-javaagent` directive plus the node-name-reuse system properties.
#[must_use]
pub fn java_agent_options(install_dir: &Path, node_name_prefix: &str) -> ShellValue {
    ShellValue::literal("-javaagent:")
        .then(agent_jar_path(install_dir))
        .then_literal(format!(
            " -D{REUSE_NODE_NAME_FLAG}=true -D{REUSE_NODE_NAME_PREFIX_FLAG}={node_name_prefix}"
        ))
}

/// Check that `name` is usable as a shell variable name.
///
/// # Errors
///
/// Returns [`BuildpackError::InvalidVariable`] otherwise.
pub fn validate_name(name: &str) -> Result<(), BuildpackError> {
    if VAR_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(BuildpackError::InvalidVariable {
            name: name.to_string(),
            reason: "not a valid shell variable name".to_string(),
        })
    }
}

/// Render the env file.
///
/// The first line folds the agent directive into `JAVA_OPTS`; every
/// variable of `vars` follows as one `export NAME="VALUE"` line, sorted by
/// name. Lines end with `\n`, including the last.
///
/// # Errors
///
/// Returns [`BuildpackError::InvalidVariable`] for an unusable name or value.
pub fn render(
    vars: &EnvVarSet,
    install_dir: &Path,
    node_name_prefix: &str,
) -> Result<String, BuildpackError> {
    let agent_opts = java_agent_options(install_dir, node_name_prefix)
        .then_literal(" ")
        .then_var(JAVA_OPTS_VAR);
    let mut out = format!("export {JAVA_OPTS_VAR}={}\n", agent_opts.quote(JAVA_OPTS_VAR)?);
    for (name, value) in vars.iter() {
        validate_name(name)?;
        out.push_str(&format!("export {name}={}\n", value.quote(name)?));
    }
    Ok(out)
}
