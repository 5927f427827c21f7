//! Test fixtures for integration tests
//!
//! Provides a world snapshot and helpers that wire a monitor to a mock server

use std::sync::Arc;

use cellwatch::config::Config;
use cellwatch::events::LocalEventBus;
use cellwatch::report::Reporter;
use cellwatch::scheduler::TickQueue;
use cellwatch::service::BlockMonitor;
use cellwatch::world::{GridWorld, WorldSnapshot};
use tokio::runtime::Handle;

/// World snapshot with a powered rail, a lamp and two players
pub const SAMPLE_WORLD_JSON: &str = r#"{
    "worlds": ["world", "world_nether"],
    "entities": ["alex", "steve"],
    "cells": [
        {
            "world": "world", "x": 0, "y": 64, "z": 0,
            "material": "POWERED_RAIL",
            "facets": [
                { "facet": "rail", "shape": "NORTH_SOUTH" },
                { "facet": "powerable", "powered": true },
                { "facet": "waterlogged", "waterlogged": false }
            ]
        },
        {
            "world": "world", "x": 1, "y": 64, "z": 0,
            "material": "REDSTONE_LAMP",
            "facets": [{ "facet": "lightable", "lit": false }]
        },
        {
            "world": "world", "x": 10, "y": 5, "z": -3,
            "material": "CHEST",
            "facets": [
                { "facet": "directional", "facing": "EAST" },
                { "facet": "chest", "chest_type": "SINGLE" }
            ]
        }
    ]
}"#;

/// Build the sample world
pub fn sample_world() -> Arc<GridWorld> {
    let snapshot: WorldSnapshot =
        serde_json::from_str(SAMPLE_WORLD_JSON).expect("sample world should parse");
    Arc::new(GridWorld::from_snapshot(snapshot))
}

/// A monitor wired to a real reporter
pub struct Harness {
    pub world: Arc<GridWorld>,
    pub queue: Arc<TickQueue>,
    pub reporter: Arc<Reporter>,
    pub bus: LocalEventBus,
    pub monitor: BlockMonitor,
}

impl Harness {
    /// Create an unstarted monitor for `config`
    pub fn new(config: Config, world: Arc<GridWorld>) -> Self {
        let queue = Arc::new(TickQueue::new());
        let reporter = Arc::new(
            Reporter::new(&config.reporter, Handle::current()).expect("reporter should build"),
        );
        let monitor = BlockMonitor::new(config, world.clone(), queue.clone(), reporter.clone())
            .expect("endpoints should resolve");

        Self {
            world,
            queue,
            reporter,
            bus: LocalEventBus::new(),
            monitor,
        }
    }

    pub fn start(&mut self) {
        self.monitor.start(&self.bus);
    }
}
