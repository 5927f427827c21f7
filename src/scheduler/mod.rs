//! Tick-based deferred task scheduling
//!
//! The host advances simulation time in discrete ticks. Deferred work is
//! expressed as "run this closure N ticks from now" through the
//! [`TickScheduler`] trait, so the debounce pipeline never depends on a
//! concrete host.
//!
//! [`TickQueue`] is the in-crate implementation: a cooperative queue whose
//! clock only moves when [`TickQueue::advance`] is called. Hosts call it from
//! their tick loop; tests use it as a fake clock.
//!
//! # Ordering
//!
//! - Tasks due at the same tick run in submission order.
//! - A delay of 0 is treated as 1: nothing runs in the tick that scheduled it.
//! - Tasks submitted while a tick is running always land on a later tick.
//! - A task that panics is logged and skipped; the rest of its tick still
//!   runs. Release builds abort on panic, so tasks should not rely on this.
//!
//! ```rust,ignore
//! let queue = TickQueue::new();
//! queue.submit(1, Box::new(|| println!("next tick")));
//! queue.advance(); // prints
//! ```

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

/// A unit of deferred work
pub type TickTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks a number of ticks in the future
pub trait TickScheduler: Send + Sync {
    /// Schedule `task` to run `delay_ticks` ticks from now (minimum 1)
    fn submit(&self, delay_ticks: u64, task: TickTask);
}

#[derive(Default)]
struct QueueState {
    now: u64,
    pending: BTreeMap<u64, Vec<TickTask>>,
}

/// Cooperative tick queue
#[derive(Default)]
pub struct TickQueue {
    state: Mutex<QueueState>,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick most recently advanced to
    pub fn current_tick(&self) -> u64 {
        self.lock().now
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.lock().pending.values().map(Vec::len).sum()
    }

    /// Move the clock one tick and run every task due at it
    ///
    /// Returns the number of tasks run, panicked ones included.
    pub fn advance(&self) -> usize {
        let (tick, due) = {
            let mut state = self.lock();
            state.now += 1;
            let now = state.now;
            let later = state.pending.split_off(&(now + 1));
            let due: Vec<TickTask> = std::mem::replace(&mut state.pending, later)
                .into_values()
                .flatten()
                .collect();
            (now, due)
        };

        let count = due.len();
        if count > 0 {
            tracing::trace!(tick, tasks = count, "Running tick tasks");
        }
        for task in due {
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                tracing::error!(tick, "Tick task panicked; continuing with the remaining tasks");
            }
        }
        count
    }

    /// Advance until the queue is empty or `max_ticks` ticks have passed
    ///
    /// Returns the number of ticks advanced.
    pub fn run_until_idle(&self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while ticks < max_ticks && self.pending() > 0 {
            self.advance();
            ticks += 1;
        }
        ticks
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TickScheduler for TickQueue {
    fn submit(&self, delay_ticks: u64, task: TickTask) {
        let mut state = self.lock();
        let due = state.now + delay_ticks.max(1);
        state.pending.entry(due).or_default().push(task);
    }
}

impl std::fmt::Debug for TickQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TickQueue")
            .field("now", &state.now)
            .field("pending", &state.pending.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}
