//! Change signal intake
//!
//! The host fires many kinds of change signal (break, place, physics,
//! growth, ...). [`EventAdapter`] subscribes to all of them through an
//! [`EventBus`] and funnels each into [`ChangeDebouncer::on_cell_changed`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::debounce::{ChangeDebouncer, Signal};
use crate::metrics;
use crate::models::Coordinate;

/// Kinds of host change signal that can affect a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    BlockBreak,
    BlockPlace,
    BlockPhysics,
    EntityChangeBlock,
    BlockFade,
    BlockGrow,
    BlockForm,
    BlockSpread,
    LeavesDecay,
}

impl SignalKind {
    pub const ALL: [SignalKind; 9] = [
        Self::BlockBreak,
        Self::BlockPlace,
        Self::BlockPhysics,
        Self::EntityChangeBlock,
        Self::BlockFade,
        Self::BlockGrow,
        Self::BlockForm,
        Self::BlockSpread,
        Self::LeavesDecay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlockBreak => "block_break",
            Self::BlockPlace => "block_place",
            Self::BlockPhysics => "block_physics",
            Self::EntityChangeBlock => "entity_change_block",
            Self::BlockFade => "block_fade",
            Self::BlockGrow => "block_grow",
            Self::BlockForm => "block_form",
            Self::BlockSpread => "block_spread",
            Self::LeavesDecay => "leaves_decay",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One change signal as delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSignal {
    pub kind: SignalKind,
    /// Affected cell, if the signal carries one
    pub cell: Option<Coordinate>,
    /// Another handler vetoed the change
    pub cancelled: bool,
}

impl CellSignal {
    pub fn new(kind: SignalKind, cell: Coordinate) -> Self {
        Self {
            kind,
            cell: Some(cell),
            cancelled: false,
        }
    }

    pub fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }
}

/// Callback invoked for each delivered signal
pub type SignalHandler = Arc<dyn Fn(&CellSignal) + Send + Sync>;

/// Host subscription mechanism
pub trait EventBus: Send + Sync {
    /// Register `handler` for every signal of `kind`
    fn subscribe(&self, kind: SignalKind, handler: SignalHandler);
}

/// In-process bus that calls subscribers synchronously
#[derive(Default)]
pub struct LocalEventBus {
    handlers: RwLock<HashMap<SignalKind, Vec<SignalHandler>>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a signal to its subscribers; returns how many were called
    pub fn publish(&self, signal: &CellSignal) -> usize {
        let handlers: Vec<SignalHandler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&signal.kind)
            .cloned()
            .unwrap_or_default();

        for handler in &handlers {
            handler(signal);
        }
        handlers.len()
    }

    /// Number of subscribers for `kind`
    pub fn subscribers(&self, kind: SignalKind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

impl EventBus for LocalEventBus {
    fn subscribe(&self, kind: SignalKind, handler: SignalHandler) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(handler);
    }
}

/// Normalizes host signals into debouncer calls
pub struct EventAdapter {
    debouncer: ChangeDebouncer,
    active: AtomicBool,
}

impl EventAdapter {
    pub fn new(debouncer: ChangeDebouncer) -> Arc<Self> {
        Arc::new(Self {
            debouncer,
            active: AtomicBool::new(true),
        })
    }

    /// Subscribe to every signal kind on `bus`
    pub fn register(self: &Arc<Self>, bus: &dyn EventBus) {
        for kind in SignalKind::ALL {
            let adapter = Arc::clone(self);
            bus.subscribe(
                kind,
                Arc::new(move |signal: &CellSignal| {
                    adapter.handle(signal);
                }),
            );
        }
        tracing::debug!(kinds = SignalKind::ALL.len(), "Registered change signal handlers");
    }

    /// Process one signal
    pub fn handle(&self, signal: &CellSignal) -> Option<Signal> {
        if !self.is_active() || signal.cancelled {
            return None;
        }
        let cell = signal.cell.as_ref()?;

        let outcome = self.debouncer.on_cell_changed(cell);
        if outcome != Signal::Unwatched {
            metrics::record_signal(signal.kind.as_str());
            tracing::trace!(kind = %signal.kind, coordinate = %cell, ?outcome, "Watched cell signal");
        }
        Some(outcome)
    }

    /// Ignore all further signals
    pub fn stop(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
