pub mod application;
pub mod services;

pub use application::VcapApplication;
pub use services::{APPDYNAMICS_SERVICE, AppdCredentials, ServicePlan, VcapServices};

use thiserror::Error;

/// Errors raised while decoding platform metadata payloads.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("could not unmarshal {var} JSON: {source}")]
    Malformed {
        var: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("service instance of {0} not present in VCAP_SERVICES")]
    ServiceMissing(String),
}
