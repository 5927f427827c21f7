//! Integration tests module
//!
//! End-to-end tests that run the monitor and the command against a real
//! [`cellwatch::report::Reporter`] talking to a mock HTTP service:
//! - Startup batch and debounced updates
//! - The block info command
//! - Delivery failures and malformed watch lists

pub mod command_test;
pub mod error_scenarios;
pub mod fixtures;
pub mod monitor_test;
