//! cellwatch - grid cell monitor and HTTP reporter
//!
//! Watches a configured set of cells in a host-owned 3-D grid and reports
//! snapshots of them to an HTTP service: once at startup, whenever a watched
//! cell changes (at most once per tick), and on demand through a command.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - TOML configuration, environment overrides and endpoints
//! - [`models`] - Coordinates, extra data and attribute maps
//! - [`world`] - The host grid boundary and an in-memory grid
//! - [`registry`] - The watch list
//! - [`extract`] - Capability probes that turn cell state into attributes
//! - [`scheduler`] - Tick-based deferred tasks
//! - [`debounce`] - Per-tick change coalescing
//! - [`events`] - Change signal intake
//! - [`command`] - The one-shot block info command
//! - [`report`] - Fire-and-forget HTTP delivery
//! - [`service`] - The [`BlockMonitor`] lifecycle
//! - [`metrics`] - Prometheus counters
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cellwatch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(std::path::Path::new("config.toml"))?;
//!     let world = Arc::new(GridWorld::new(["world"]));
//!     let queue = Arc::new(TickQueue::new());
//!     let reporter = Arc::new(Reporter::new(&config.reporter, tokio::runtime::Handle::current())?);
//!
//!     let mut monitor = BlockMonitor::new(config, world, queue.clone(), reporter.clone())?;
//!     let bus = LocalEventBus::new();
//!     monitor.start(&bus);
//!
//!     queue.advance();
//!     reporter.drain().await;
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod extract;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod service;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::command::{CommandHandler, CommandSender, Feedback, SelectorResolver};
    pub use crate::config::Config;
    pub use crate::debounce::{ChangeDebouncer, Signal};
    pub use crate::error::{CellwatchErrorTrait, Error, ErrorCategory, Result};
    pub use crate::events::{CellSignal, EventAdapter, EventBus, LocalEventBus, SignalKind};
    pub use crate::extract::AttributeExtractor;
    pub use crate::models::{AttrValue, AttributeMap, Coordinate, ExtraData, WatchedCell};
    pub use crate::registry::WatchRegistry;
    pub use crate::report::{Endpoint, ReportSink, Reporter, Route};
    pub use crate::scheduler::{TickQueue, TickScheduler};
    pub use crate::service::BlockMonitor;
    pub use crate::world::{CellState, Facet, GridWorld, World};
}

// Direct re-exports for convenience
pub use models::{AttributeMap, Coordinate, ExtraData};
pub use service::BlockMonitor;
