//! In-memory actuator for host runs and tests.
//!
//! Every write is appended to a shared history that the paired
//! [`SimMonitor`] can inspect, so a test can assert on the exact sequence a
//! physical pin would have seen.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::app::ports::Actuator;

/// One write as the pin would have seen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinWrite {
    Activate,
    Deactivate,
    Release,
}

#[derive(Default)]
struct History {
    writes: Vec<PinWrite>,
}

/// Simulated binary output.
pub struct SimActuator {
    label: String,
    history: Arc<Mutex<History>>,
}

/// Read side of a [`SimActuator`].
#[derive(Clone)]
pub struct SimMonitor {
    history: Arc<Mutex<History>>,
}

impl SimActuator {
    pub fn new(label: impl Into<String>) -> (Self, SimMonitor) {
        let history = Arc::new(Mutex::new(History::default()));
        (
            Self {
                label: label.into(),
                history: Arc::clone(&history),
            },
            SimMonitor { history },
        )
    }

    fn record(&self, write: PinWrite) {
        debug!("sim[{}] {:?}", self.label, write);
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .writes
            .push(write);
    }
}

impl Actuator for SimActuator {
    fn activate(&mut self) {
        self.record(PinWrite::Activate);
    }

    fn deactivate(&mut self) {
        self.record(PinWrite::Deactivate);
    }

    fn release(&mut self) {
        self.record(PinWrite::Release);
    }
}

impl SimMonitor {
    /// Copy of every write so far.
    pub fn writes(&self) -> Vec<PinWrite> {
        self.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    pub fn activations(&self) -> usize {
        self.count(PinWrite::Activate)
    }

    pub fn deactivations(&self) -> usize {
        self.count(PinWrite::Deactivate)
    }

    /// Level after the last write (released counts as off).
    pub fn is_active(&self) -> bool {
        self.lock()
            .writes
            .iter()
            .rev()
            .find(|w| **w != PinWrite::Release)
            .is_some_and(|w| *w == PinWrite::Activate)
            && !self.is_released()
    }

    pub fn is_released(&self) -> bool {
        self.lock().writes.contains(&PinWrite::Release)
    }

    /// Whether activate and deactivate strictly alternate.
    pub fn alternates(&self) -> bool {
        let history = self.lock();
        let levels: Vec<_> = history
            .writes
            .iter()
            .filter(|w| **w != PinWrite::Release)
            .collect();
        levels.windows(2).all(|pair| pair[0] != pair[1])
    }

    pub fn clear(&self) {
        self.lock().writes.clear();
    }

    fn count(&self, kind: PinWrite) -> usize {
        self.lock().writes.iter().filter(|w| **w == kind).count()
    }

    fn lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
