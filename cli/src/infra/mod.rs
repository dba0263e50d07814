//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: HTTP downloads, zip
//! extraction, env-file writing, environment access and staging
//! filesystem operations.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod archive;
pub mod env;
pub mod envfile;
pub mod fs;
pub mod http;
