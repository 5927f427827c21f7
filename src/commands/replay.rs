use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::runtime::Handle;

use cellwatch::config::Config;
use cellwatch::events::{CellSignal, LocalEventBus, SignalKind};
use cellwatch::metrics;
use cellwatch::models::Coordinate;
use cellwatch::report::Reporter;
use cellwatch::scheduler::TickQueue;
use cellwatch::service::BlockMonitor;
use cellwatch::world::{CellState, GridWorld};

/// Ticks to keep advancing after the last event so pending reports go out
const SETTLE_TICKS: u64 = 4;

pub struct ReplayParams {
    pub world: PathBuf,
    pub events: String,
    pub tick_ms: u64,
    pub show_metrics: bool,
}

/// One line of the event log
#[derive(Debug, Deserialize)]
struct EventLine {
    tick: u64,
    signal: SignalKind,
    world: String,
    x: i32,
    y: i32,
    z: i32,
    /// New cell state applied before the signal fires
    #[serde(default)]
    state: Option<CellState>,
    #[serde(default)]
    cancelled: bool,
}

pub async fn replay(config: Config, params: ReplayParams) -> Result<()> {
    if params.show_metrics {
        if let Err(e) = metrics::init_metrics() {
            tracing::warn!("Metrics initialization failed: {e}");
        }
    }

    let world = Arc::new(
        GridWorld::from_file(&params.world)
            .with_context(|| format!("Failed to load world snapshot {}", params.world.display()))?,
    );
    let events = read_events(&params.events).await?;
    tracing::info!(events = events.len(), "Loaded event log");

    let queue = Arc::new(TickQueue::new());
    let reporter = Arc::new(
        Reporter::new(&config.reporter, Handle::current()).context("Failed to create reporter")?,
    );
    let mut monitor = BlockMonitor::new(config, world.clone(), queue.clone(), reporter.clone())?;

    let bus = LocalEventBus::new();
    monitor.start(&bus);

    let tick = Duration::from_millis(params.tick_ms);
    let mut interrupted = false;

    'events: for event in events {
        while queue.current_tick() < event.tick {
            queue.advance();
            if !wait_tick(tick).await {
                interrupted = true;
                break 'events;
            }
        }

        let coord = Coordinate::new(event.world, event.x, event.y, event.z);
        if let Some(state) = event.state {
            world.set_cell(coord.clone(), state);
        }

        let mut signal = CellSignal::new(event.signal, coord);
        signal.cancelled = event.cancelled;
        bus.publish(&signal);
    }

    if !interrupted {
        for _ in 0..SETTLE_TICKS {
            queue.advance();
            if !wait_tick(tick).await {
                break;
            }
        }
    }

    monitor.stop();
    println!("Replayed to tick {}; draining reports...", queue.current_tick());
    reporter.drain().await;

    if params.show_metrics {
        match metrics::encode_metrics() {
            Ok(text) => println!("{text}"),
            Err(e) => tracing::warn!("Failed to encode metrics: {e}"),
        }
    }

    Ok(())
}

/// Sleep one tick; false if interrupted
async fn wait_tick(tick: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(tick) => true,
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutdown signal received, stopping...");
            false
        }
    }
}

async fn read_events(source: &str) -> Result<Vec<EventLine>> {
    let content = if source == "-" {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("Failed to read events from stdin")?;
        buffer
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read event log {source}"))?
    };

    parse_events(&content)
}

fn parse_events(content: &str) -> Result<Vec<EventLine>> {
    let mut events: Vec<EventLine> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid event on line {}", index + 1))
        })
        .collect::<Result<_>>()?;

    // Stable, so same-tick events keep file order
    events.sort_by_key(|event| event.tick);
    Ok(events)
}
