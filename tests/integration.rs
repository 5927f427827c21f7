//! Integration tests entry point
//!
//! This file serves as the entry point for all integration tests.
//! It includes the integration_tests module which contains:
//! - Monitor lifecycle tests
//! - Block info command tests
//! - Error scenario tests

mod common;
mod integration_tests;
