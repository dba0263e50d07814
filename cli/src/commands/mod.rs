//! Command implementations

pub mod detect;
pub mod extract;
pub mod fetch;
pub mod supply;
pub mod version;
pub mod write_env;
