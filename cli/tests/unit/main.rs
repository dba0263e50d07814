//! Unit tests for the appd-buildpack CLI
//!
//! These tests use stubbed ports and temp dirs and run without network
//! access beyond a loopback listener.

mod http_fetch;
mod mocks;
mod property_tests;
