//! Per-tick change debouncing
//!
//! A watched cell can produce many change signals in a single tick (a piston
//! push fires physics, place and break for the same cell). The debouncer
//! turns all of them into one report:
//!
//! ```text
//! tick T    signal -> cooldown += cell, emission scheduled for T+1
//! tick T    signal -> suppressed (already cooling down)
//! tick T+1  emission: re-read the cell, report it, schedule release for T+2
//! tick T+1  signal -> deferred (cell marked dirty)
//! tick T+2  release: cooldown -= cell, or, if dirty, emission scheduled
//!           for T+3 and the window starts over
//! ```
//!
//! The report is built from the cell's state at emission time, never from
//! the signal, so the last change a cell sees is always reported.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::extract::AttributeExtractor;
use crate::metrics;
use crate::models::Coordinate;
use crate::report::{Endpoint, ReportSink};
use crate::scheduler::TickScheduler;

/// What happened to one change signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The cell is not on the watch list
    Unwatched,
    /// An emission for the cell is already pending
    Suppressed,
    /// The cell already reported this window; it reports again when the
    /// cooldown clears
    Deferred,
    /// An emission was scheduled for the next tick
    Scheduled,
}

/// Where a cooling-down cell is in its window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Emission scheduled, not yet run
    Pending,
    /// Emission ran; `dirty` if the cell changed again since
    Emitted { dirty: bool },
}

struct Shared {
    extractor: AttributeExtractor,
    scheduler: Arc<dyn TickScheduler>,
    sink: Arc<dyn ReportSink>,
    endpoint: Endpoint,
    cooldown: Mutex<HashMap<Coordinate, Phase>>,
}

impl Shared {
    fn cooldown(&self) -> MutexGuard<'_, HashMap<Coordinate, Phase>> {
        self.cooldown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the emission for the next tick; the cell must already be `Pending`
    fn schedule_emission(self: &Arc<Self>, coord: Coordinate) {
        let shared = Arc::clone(self);
        self.scheduler.submit(1, Box::new(move || shared.emit(coord)));
    }

    fn emit(self: Arc<Self>, coord: Coordinate) {
        self.cooldown().insert(coord.clone(), Phase::Emitted { dirty: false });

        let attrs = self.extractor.extract(&coord, None);
        match attrs.to_json() {
            Ok(body) => {
                tracing::info!(coordinate = %coord, "Watched cell changed, sending update");
                metrics::record_emission();
                self.sink.submit(&self.endpoint, body);
            }
            Err(e) => {
                tracing::error!(coordinate = %coord, error = %e, "Failed to serialize cell snapshot");
            }
        }

        let shared = Arc::clone(&self);
        self.scheduler.submit(1, Box::new(move || shared.release(coord)));
    }

    fn release(self: Arc<Self>, coord: Coordinate) {
        let dirty = {
            let mut cooldown = self.cooldown();
            match cooldown.get(&coord) {
                Some(Phase::Emitted { dirty: true }) => {
                    cooldown.insert(coord.clone(), Phase::Pending);
                    true
                }
                _ => {
                    cooldown.remove(&coord);
                    false
                }
            }
        };

        if dirty {
            tracing::debug!(coordinate = %coord, "Cell changed during cooldown, reporting again");
            self.schedule_emission(coord);
        }
    }
}

/// Gates change signals so each watched cell reports at most once per window
///
/// A change that lands after a window's emission is not lost: the cell is
/// reported once more when the window closes.
#[derive(Clone)]
pub struct ChangeDebouncer {
    shared: Arc<Shared>,
}

impl ChangeDebouncer {
    /// Create a debouncer reporting to `endpoint`
    pub fn new(
        extractor: AttributeExtractor,
        scheduler: Arc<dyn TickScheduler>,
        sink: Arc<dyn ReportSink>,
        endpoint: Endpoint,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                extractor,
                scheduler,
                sink,
                endpoint,
                cooldown: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Handle one change signal for `coord`
    pub fn on_cell_changed(&self, coord: &Coordinate) -> Signal {
        if !self.shared.extractor.registry().is_watched(coord) {
            return Signal::Unwatched;
        }

        {
            let mut cooldown = self.shared.cooldown();
            match cooldown.get_mut(coord) {
                Some(Phase::Pending) => {
                    metrics::record_suppressed();
                    return Signal::Suppressed;
                }
                Some(Phase::Emitted { dirty }) => {
                    *dirty = true;
                    metrics::record_suppressed();
                    return Signal::Deferred;
                }
                None => {
                    cooldown.insert(coord.clone(), Phase::Pending);
                }
            }
        }

        self.shared.schedule_emission(coord.clone());
        Signal::Scheduled
    }

    /// Whether `coord` is waiting out its cooldown
    pub fn is_cooling_down(&self, coord: &Coordinate) -> bool {
        self.shared.cooldown().contains_key(coord)
    }

    /// Number of cells currently cooling down
    pub fn cooling_down(&self) -> usize {
        self.shared.cooldown().len()
    }
}

impl std::fmt::Debug for ChangeDebouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDebouncer")
            .field("endpoint", &self.shared.endpoint)
            .field("cooling_down", &self.cooling_down())
            .finish()
    }
}
