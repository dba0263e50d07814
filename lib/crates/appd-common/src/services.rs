//! `VCAP_SERVICES` service-binding payload.
//!
//! The platform injects one JSON object keyed by service label; each label
//! maps to the list of bound instances of that service.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::MetadataError;

/// Service label under which the controller binding is published.
pub const APPDYNAMICS_SERVICE: &str = "appdynamics";

/// Parsed `VCAP_SERVICES` payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct VcapServices(HashMap<String, Vec<ServicePlan>>);

/// One bound service instance.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServicePlan {
    /// Instance name chosen by the operator, when present.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub credentials: AppdCredentials,
}

/// Controller credentials carried by an `appdynamics` binding.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppdCredentials {
    #[serde(rename = "host-name", default)]
    pub controller_host: String,
    /// Brokers publish the port either as a string or as a number.
    #[serde(default, deserialize_with = "string_or_number")]
    pub port: String,
    #[serde(rename = "ssl-enabled", default, deserialize_with = "bool_or_string")]
    pub ssl_enabled: bool,
    #[serde(rename = "account-access-key", default)]
    pub account_access_key: String,
    #[serde(rename = "account-name", default)]
    pub account_name: String,
}

impl fmt::Debug for AppdCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppdCredentials")
            .field("controller_host", &self.controller_host)
            .field("port", &self.port)
            .field("ssl_enabled", &self.ssl_enabled)
            .field("account_access_key", &"<redacted>")
            .field("account_name", &self.account_name)
            .finish()
    }
}

impl VcapServices {
    /// Parse the raw `VCAP_SERVICES` value.
    pub fn from_json(raw: &str) -> Result<Self, MetadataError> {
        serde_json::from_str(raw).map_err(|source| MetadataError::Malformed {
            var: "VCAP_SERVICES",
            source,
        })
    }

    /// Credentials of the first instance bound under `label`.
    pub fn credentials(&self, label: &str) -> Result<&AppdCredentials, MetadataError> {
        self.0
            .get(label)
            .and_then(|plans| plans.first())
            .map(|plan| &plan.credentials)
            .ok_or_else(|| MetadataError::ServiceMissing(label.to_string()))
    }

    /// Shorthand for [`Self::credentials`] with [`APPDYNAMICS_SERVICE`].
    pub fn appdynamics(&self) -> Result<&AppdCredentials, MetadataError> {
        self.credentials(APPDYNAMICS_SERVICE)
    }

    #[must_use]
    pub fn has_service(&self, label: &str) -> bool {
        self.0.get(label).is_some_and(|plans| !plans.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrString {
    Bool(bool),
    String(String),
}

fn bool_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => b,
        BoolOrString::String(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}
