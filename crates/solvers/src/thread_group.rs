//! In-process workers that communicate through shared memory.
//!
//! A [`ThreadGroup`] stands in for a distributed communicator when several
//! workers run as threads of one process: each worker gets one handle, and
//! every collective call meets at a barrier. Reductions add contributions in
//! rank order, so results are bit-identical on every worker.
//!
//! A worker that fails calls [`Communicator::abort`]; every peer waiting in
//! or entering a collective then panics instead of waiting forever, so the
//! whole group unwinds together.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use burnup_core::Communicator;
use tracing::error;

#[derive(Debug, Default)]
struct GateState {
    arrived: usize,
    generation: u64,
    aborted: Option<usize>,
}

/// A reusable barrier that can be torn down by any worker.
#[derive(Debug)]
struct Gate {
    size: usize,
    state: Mutex<GateState>,
    released: Condvar,
}

impl Gate {
    fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(GateState::default()),
            released: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait(&self, rank: usize) {
        let mut state = self.lock();
        let failed = state.aborted;
        if let Some(failed) = failed {
            drop(state);
            aborted(rank, failed);
        }

        state.arrived += 1;
        if state.arrived == self.size {
            state.arrived = 0;
            state.generation += 1;
            self.released.notify_all();
            return;
        }

        let generation = state.generation;
        while state.generation == generation && state.aborted.is_none() {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        // A release that happened before the abort still counts.
        if state.generation == generation {
            let failed = state.aborted.unwrap_or(rank);
            drop(state);
            aborted(rank, failed);
        }
    }

    fn abort(&self, rank: usize) {
        let mut state = self.lock();
        state.aborted.get_or_insert(rank);
        self.released.notify_all();
    }
}

fn aborted(rank: usize, failed: usize) -> ! {
    error!(rank, failed, "worker group aborted");
    panic!("worker {rank}: worker group aborted after worker {failed} failed");
}

#[derive(Debug)]
struct Shared {
    gate: Gate,
    slots: Mutex<Vec<Vec<f64>>>,
}

impl Shared {
    fn slots(&self) -> MutexGuard<'_, Vec<Vec<f64>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One worker's handle on a group of in-process workers.
#[derive(Debug, Clone)]
pub struct ThreadGroup {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl ThreadGroup {
    /// Creates handles for `size` workers, indexed by rank.
    ///
    /// Each handle must be moved to its own thread; collective calls block
    /// until every handle has made the same call.
    #[must_use]
    pub fn new(size: usize) -> Vec<Self> {
        let size = size.max(1);
        let shared = Arc::new(Shared {
            gate: Gate::new(size),
            slots: Mutex::new(vec![Vec::new(); size]),
        });
        (0..size)
            .map(|rank| Self {
                rank,
                size,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

impl Communicator for ThreadGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    /// # Panics
    ///
    /// Panics if any worker of the group has aborted.
    fn barrier(&self) {
        self.shared.gate.wait(self.rank);
    }

    fn sum_reduce(&self, values: &mut [f64]) {
        self.shared.slots()[self.rank] = values.to_vec();
        self.barrier();

        {
            let slots = self.shared.slots();
            for (i, value) in values.iter_mut().enumerate() {
                *value = slots[0][i];
                for contribution in &slots[1..] {
                    *value += contribution[i];
                }
            }
        }

        // Nobody may overwrite a slot before everyone has read them all.
        self.barrier();
    }

    fn broadcast(&self, root: usize, values: &mut Vec<f64>) {
        if self.rank == root {
            self.shared.slots()[root] = values.clone();
        }
        self.barrier();

        if self.rank != root {
            values.clone_from(&self.shared.slots()[root]);
        }
        self.barrier();
    }

    fn abort(&self) {
        self.shared.gate.abort(self.rank);
    }
}
