//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod archive;
pub mod config;
pub mod envfile;
pub mod error;
pub mod naming;

pub use config::{AgentSettings, BuildpackConfig};
pub use envfile::{EnvVarSet, ShellValue};
pub use error::BuildpackError;
