//! Actuator plumbing shared by channels, blink tasks and the buzzer.
//!
//! [`ActuatorCell`] serialises access to one [`Actuator`] and remembers the
//! last level written, so repeated `on`/`off` requests never reach the pin
//! twice and the physical output sees a strictly alternating sequence.
//!
//! The release flag and the output level live in atomics beside the write
//! lock, so status checks and [`ActuatorCell::release`] never wait behind a
//! writer stuck inside the driver. A release that finds the lock held is
//! completed by that writer as soon as its write returns.
//!
//! [`PinActuator`] adapts any `embedded-hal` 1.0 [`OutputPin`] to the
//! [`Actuator`] port.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use embedded_hal::digital::{Error as _, OutputPin};
use log::{debug, error, warn};

use crate::app::ports::Actuator;

// ───────────────────────────────────────────────────────────────
// ActuatorCell
// ───────────────────────────────────────────────────────────────

struct Slot {
    actuator: Box<dyn Actuator>,
    /// Last level written; `None` until the first write.
    level: Option<bool>,
    /// The actuator's own `release` has run.
    released: bool,
}

struct Shared {
    slot: Mutex<Slot>,
    active: AtomicBool,
    /// Set once a release is requested; no write starts after this.
    release_requested: AtomicBool,
}

/// Shared handle to a single actuator.
///
/// Cloned between a channel and its blink task; at most one of them writes
/// at a time because the channel joins the task before touching the output.
#[derive(Clone)]
pub struct ActuatorCell {
    shared: Arc<Shared>,
}

impl ActuatorCell {
    pub fn new(actuator: Box<dyn Actuator>) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    actuator,
                    level: None,
                    released: false,
                }),
                active: AtomicBool::new(false),
                release_requested: AtomicBool::new(false),
            }),
        }
    }

    /// Drive the output to `on`. No-op if the output is already there or
    /// the cell is released.
    pub fn set(&self, on: bool) {
        if self.is_released() {
            self.try_finish_release();
            return;
        }
        {
            let mut slot = self.lock();
            if !slot.released && !self.is_released() && slot.level != Some(on) {
                if on {
                    slot.actuator.activate();
                } else {
                    slot.actuator.deactivate();
                }
                slot.level = Some(on);
                self.shared.active.store(on, Ordering::Release);
            }
        }
        // A release may have arrived while the write was in flight.
        if self.is_released() {
            self.try_finish_release();
        }
    }

    /// Force the output off and release the actuator. Idempotent and never
    /// blocks: if a write is in flight, that writer finishes the release.
    pub fn release(&self) {
        self.shared.release_requested.store(true, Ordering::SeqCst);
        if !self.try_finish_release() {
            warn!("output busy in a write; release deferred to the writer");
        }
    }

    /// Last level written to the output.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// A release was requested; the output accepts no further writes.
    pub fn is_released(&self) -> bool {
        self.shared.release_requested.load(Ordering::SeqCst)
    }

    /// Complete a requested release if the write lock is free. Returns
    /// `false` only when another thread holds the lock.
    fn try_finish_release(&self) -> bool {
        let mut slot = match self.shared.slot.try_lock() {
            Ok(slot) => slot,
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };
        if !slot.released {
            if slot.level != Some(false) {
                slot.actuator.deactivate();
                slot.level = Some(false);
                self.shared.active.store(false, Ordering::Release);
            }
            slot.actuator.release();
            slot.released = true;
            debug!("output released");
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.shared.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ───────────────────────────────────────────────────────────────
// PinActuator
// ───────────────────────────────────────────────────────────────

/// Electrical level that lights the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveLevel {
    High,
    Low,
}

/// [`Actuator`] over an `embedded-hal` output pin.
///
/// Pin errors are logged and swallowed: the controller treats hardware
/// faults as unreachable and surfaces them as an unavailable device
/// through the log.
pub struct PinActuator<P> {
    pin: Option<P>,
    active: ActiveLevel,
    label: &'static str,
}

impl<P: OutputPin + Send> PinActuator<P> {
    pub fn new(pin: P, active: ActiveLevel, label: &'static str) -> Self {
        Self {
            pin: Some(pin),
            active,
            label,
        }
    }

    /// Hand the pin back (e.g. to reconfigure it as an input).
    pub fn into_inner(self) -> Option<P> {
        self.pin
    }

    fn write(&mut self, on: bool) {
        let Some(pin) = self.pin.as_mut() else {
            warn!("{}: write after release ignored", self.label);
            return;
        };
        let high = on == matches!(self.active, ActiveLevel::High);
        let result = if high { pin.set_high() } else { pin.set_low() };
        if let Err(e) = result {
            error!("{}: pin write failed ({:?}), device unavailable", self.label, e.kind());
        }
    }
}

impl<P: OutputPin + Send> Actuator for PinActuator<P> {
    fn activate(&mut self) {
        self.write(true);
    }

    fn deactivate(&mut self) {
        self.write(false);
    }

    fn release(&mut self) {
        if self.pin.take().is_some() {
            log::debug!("{}: pin released", self.label);
        }
    }
}
