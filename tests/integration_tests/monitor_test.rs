//! Monitor lifecycle integration tests
//!
//! Tests the complete flow:
//! 1. Startup batch for every loaded watched cell
//! 2. Change signals coalesced into one update per cell per tick
//! 3. No updates after stop

use cellwatch::events::{CellSignal, SignalKind};
use cellwatch::world::{CellState, Facet};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{sample_world, Harness};
use crate::common;

async fn mount_monitor_endpoints(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path("/monitor/batch"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/monitor"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn bodies_at(server: &MockServer, at: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == at)
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_startup_batch() {
    let server = MockServer::start().await;
    mount_monitor_endpoints(&server).await;

    let mut harness = Harness::new(common::create_test_config(&server.uri()), sample_world());
    harness.start();
    harness.reporter.drain().await;

    let batches = bodies_at(&server, "/monitor/batch").await;
    assert_eq!(batches.len(), 1);

    let cells = batches[0].as_array().unwrap();
    assert_eq!(cells.len(), 2);

    assert_eq!(cells[0]["id"], 0);
    assert_eq!(cells[0]["material"], "POWERED_RAIL");
    assert_eq!(cells[0]["powered"], true);
    assert_eq!(cells[0]["waterlogged"], false);
    assert_eq!(cells[0]["rail_shape"], "NORTH_SOUTH");

    assert_eq!(cells[1]["id"], 1);
    assert_eq!(cells[1]["lit"], false);
    assert!(cells[1].get("extraData").is_none());
}

#[tokio::test]
async fn test_startup_batch_skips_unloaded_cells() {
    let server = MockServer::start().await;
    mount_monitor_endpoints(&server).await;

    let world = sample_world();
    world.unload_region(&common::watched(0));
    // Both watched cells share a region
    let mut harness = Harness::new(common::create_test_config(&server.uri()), world);
    harness.start();
    harness.reporter.drain().await;

    assert!(bodies_at(&server, "/monitor/batch").await.is_empty());
}

#[tokio::test]
async fn test_change_signals_coalesce_into_one_update() {
    let server = MockServer::start().await;
    mount_monitor_endpoints(&server).await;

    let mut harness = Harness::new(common::create_test_config(&server.uri()), sample_world());
    harness.start();

    harness.world.set_cell(
        common::watched(1),
        CellState::new("REDSTONE_LAMP").with(Facet::Lightable { lit: true }),
    );
    for kind in [SignalKind::BlockPhysics, SignalKind::BlockPhysics, SignalKind::BlockPlace] {
        harness.bus.publish(&CellSignal::new(kind, common::watched(1)));
    }
    // Not watched
    harness.bus.publish(&CellSignal::new(
        SignalKind::BlockBreak,
        cellwatch::Coordinate::new("world", 10, 5, -3),
    ));

    harness.queue.advance();
    harness.reporter.drain().await;

    let updates = bodies_at(&server, "/monitor").await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["id"], 1);
    assert_eq!(updates[0]["lit"], true);
}

#[tokio::test]
async fn test_cell_reports_again_after_cooldown() {
    let server = MockServer::start().await;
    mount_monitor_endpoints(&server).await;

    let mut harness = Harness::new(common::create_test_config(&server.uri()), sample_world());
    harness.start();

    let signal = CellSignal::new(SignalKind::BlockBreak, common::watched(0));
    harness.bus.publish(&signal);
    harness.queue.advance();
    // Still cooling down
    harness.bus.publish(&signal);
    harness.queue.advance();
    harness.bus.publish(&signal);
    harness.queue.advance();
    harness.reporter.drain().await;

    assert_eq!(bodies_at(&server, "/monitor").await.len(), 2);
}

#[tokio::test]
async fn test_cancelled_signals_are_ignored() {
    let server = MockServer::start().await;
    mount_monitor_endpoints(&server).await;

    let mut harness = Harness::new(common::create_test_config(&server.uri()), sample_world());
    harness.start();

    harness
        .bus
        .publish(&CellSignal::new(SignalKind::BlockBreak, common::watched(0)).cancelled());
    harness.queue.run_until_idle(4);
    harness.reporter.drain().await;

    assert!(bodies_at(&server, "/monitor").await.is_empty());
}

#[tokio::test]
async fn test_no_updates_after_stop() {
    let server = MockServer::start().await;
    mount_monitor_endpoints(&server).await;

    let mut harness = Harness::new(common::create_test_config(&server.uri()), sample_world());
    harness.start();
    harness.monitor.stop();

    harness
        .bus
        .publish(&CellSignal::new(SignalKind::BlockFade, common::watched(0)));
    harness.queue.run_until_idle(4);
    harness.reporter.drain().await;

    assert!(bodies_at(&server, "/monitor").await.is_empty());
    assert_eq!(bodies_at(&server, "/monitor/batch").await.len(), 1);
}
