//! `VCAP_APPLICATION` application metadata.

use serde::{Deserialize, Serialize};

use crate::MetadataError;

/// The subset of `VCAP_APPLICATION` used to derive agent naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VcapApplication {
    #[serde(default)]
    pub application_name: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub space_name: String,
}

impl VcapApplication {
    /// Parse the raw `VCAP_APPLICATION` value.
    pub fn from_json(raw: &str) -> Result<Self, MetadataError> {
        serde_json::from_str(raw).map_err(|source| MetadataError::Malformed {
            var: "VCAP_APPLICATION",
            source,
        })
    }
}
