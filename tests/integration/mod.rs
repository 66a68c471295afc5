//! Integration test module
//!
//! Contains end-to-end tests for the built-in endpoints and the security
//! layers around the mounted sub-APIs.

pub mod common;
pub mod health_tests;
pub mod security_tests;
