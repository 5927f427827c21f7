//! Error scenario integration tests
//!
//! Tests failure modes that must never reach the host:
//! 1. Report endpoint errors and timeouts
//! 2. Unreachable report endpoint
//! 3. Malformed watch lists

use std::time::Duration;

use cellwatch::config::DuplicatePolicy;
use cellwatch::events::{CellSignal, SignalKind};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{sample_world, Harness};
use crate::common;

// ============================================================================
// Delivery Error Tests
// ============================================================================

#[tokio::test]
async fn test_server_errors_do_not_stop_monitoring() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let mut harness = Harness::new(common::create_test_config(&server.uri()), sample_world());
    harness.start();

    harness
        .bus
        .publish(&CellSignal::new(SignalKind::BlockBreak, common::watched(0)));
    harness
        .bus
        .publish(&CellSignal::new(SignalKind::BlockBreak, common::watched(1)));
    harness.queue.advance();
    harness.reporter.drain().await;

    assert!(harness.monitor.is_running());
    assert_eq!(harness.reporter.pending(), 0);
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut config = common::create_test_config(&server.uri());
    config.reporter.timeout_secs = 1;
    let mut harness = Harness::new(config, sample_world());

    let started = std::time::Instant::now();
    harness.start();
    harness.reporter.drain().await;

    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let mut harness = Harness::new(
        common::create_test_config(&common::closed_port_url()),
        sample_world(),
    );
    harness.start();

    harness
        .bus
        .publish(&CellSignal::new(SignalKind::BlockGrow, common::watched(0)));
    harness.queue.run_until_idle(4);
    harness.reporter.drain().await;

    assert!(!harness.monitor.debouncer().is_cooling_down(&common::watched(0)));
}

#[tokio::test]
async fn test_unconfigured_api_url_still_starts() {
    let mut harness = Harness::new(common::create_test_config(""), sample_world());
    harness.start();
    harness.reporter.drain().await;

    assert!(harness.monitor.is_running());
    assert_eq!(harness.monitor.endpoints().batch.url, "/monitor/batch");
}

// ============================================================================
// Watch List Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_entries_are_skipped() {
    let mut config = common::create_test_config("http://localhost:1");
    config.monitored_blocks.locations = vec![
        common::location("world", 0, 64, 0),
        toml::Value::String("world 1 2 3".into()),
        common::location("atlantis", 1, 1, 1),
        toml::from_str::<toml::Table>("world = \"world\"\nx = 1\ny = \"high\"\nz = 0")
            .map(toml::Value::Table)
            .unwrap(),
        common::location("world_nether", 8, 40, 8),
    ];

    let harness = Harness::new(config, sample_world());
    let registry = harness.monitor.registry();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.id_of(&common::watched(0)), Some(0));
    assert_eq!(
        registry.id_of(&cellwatch::Coordinate::new("world_nether", 8, 40, 8)),
        Some(1)
    );
}

#[tokio::test]
async fn test_duplicate_policies() {
    let entries = vec![
        common::location("world", 0, 64, 0),
        common::location("world", 1, 64, 0),
        common::location("world", 0, 64, 0),
    ];

    let mut config = common::create_test_config("http://localhost:1");
    config.monitored_blocks.locations = entries.clone();
    let harness = Harness::new(config, sample_world());
    assert_eq!(harness.monitor.registry().len(), 2);
    assert_eq!(harness.monitor.registry().id_of(&common::watched(0)), Some(0));

    let mut config = common::create_test_config("http://localhost:1");
    config.monitored_blocks.locations = entries;
    config.monitored_blocks.duplicates = DuplicatePolicy::LastWins;
    let harness = Harness::new(config, sample_world());
    assert_eq!(harness.monitor.registry().len(), 2);
    assert_eq!(harness.monitor.registry().id_of(&common::watched(0)), Some(2));
}
