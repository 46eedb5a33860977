//! Actuator registry — owns every output and the sensor.
//!
//! ```text
//!                   ┌──────────────── ActuatorRegistry ────────────────┐
//!  set_all ───────▶ │ Mutex<Channel> red  ── BlinkSupervisor ── task   │
//!  blink_all ─────▶ │ Mutex<Channel> blue ── BlinkSupervisor ── task   │
//!  set_channel ───▶ │ Mutex<Channel> ...                               │
//!                   │ Mutex<Buzzer>                                    │
//!  snapshot ◀────── │ Arc<ModeCell> / Arc<AtomicBool> (lock-free)      │
//!  read_sensor ◀──▶ │ Mutex<Box<dyn SensorPort>>                       │
//!                   └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//!
//! Each channel sits behind its own mutex, so operations on one channel are
//! applied strictly in arrival order while different channels never wait
//! on each other. Aggregate operations (`set_all`, `blink_all`) lock one
//! channel at a time and are therefore atomic per channel only.
//!
//! Snapshots read the shared mode cells and never take a channel lock:
//! a status request during a multi-second fixed blink returns at once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use heapless::Vec;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{Actuator, SensorPort};
use crate::drivers::blink::ShutdownSignal;
use crate::drivers::buzzer::Buzzer;
use crate::drivers::channel::{Channel, ChannelState, LedColour, ModeCell};
use crate::error::{ConfigError, Error, Result};
use crate::sensors::SensorResult;

/// Upper bound on LED channels (one per [`LedColour`]).
pub const MAX_CHANNELS: usize = LedColour::ALL.len();

// ───────────────────────────────────────────────────────────────
// Snapshot
// ───────────────────────────────────────────────────────────────

/// One channel's entry in a [`StateSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub colour: LedColour,
    #[serde(flatten)]
    pub state: ChannelState,
}

/// Point-in-time copy of every output's state. A value, not a view:
/// it may be stale by the time the caller looks at it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub channels: Vec<ChannelEntry, MAX_CHANNELS>,
    pub buzzer: bool,
}

impl StateSnapshot {
    pub fn get(&self, colour: LedColour) -> Option<ChannelState> {
        self.channels
            .iter()
            .find(|e| e.colour == colour)
            .map(|e| e.state)
    }

    /// No channel steady or blinking and the buzzer silent.
    pub fn all_off(&self) -> bool {
        !self.buzzer
            && self
                .channels
                .iter()
                .all(|e| e.state == ChannelState::default())
    }
}

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

struct Slot {
    colour: LedColour,
    mode: Arc<ModeCell>,
    blinks: Arc<AtomicUsize>,
    channel: Mutex<Channel>,
}

/// Owns every channel, the buzzer and the sensor for the process lifetime.
pub struct ActuatorRegistry {
    slots: Vec<Slot, MAX_CHANNELS>,
    buzzer: Mutex<Buzzer>,
    buzzer_on: Arc<AtomicBool>,
    sensor: Mutex<Box<dyn SensorPort>>,
    shutdown: ShutdownSignal,
    released: AtomicBool,
}

impl ActuatorRegistry {
    /// Take ownership of the outputs and drive every one of them off.
    ///
    /// `cancel_timeout` bounds how long a request waits for a superseded
    /// blink task to exit.
    pub fn new(
        leds: impl IntoIterator<Item = (LedColour, Box<dyn Actuator>)>,
        buzzer: Box<dyn Actuator>,
        sensor: Box<dyn SensorPort>,
        cancel_timeout: Duration,
    ) -> Result<Self> {
        let mut slots: Vec<Slot, MAX_CHANNELS> = Vec::new();
        for (colour, actuator) in leds {
            if slots.iter().any(|s| s.colour == colour) {
                return Err(ConfigError::DuplicateChannel(colour).into());
            }
            let mut channel = Channel::new(colour, actuator, cancel_timeout);
            channel.turn_off()?;
            let slot = Slot {
                colour,
                mode: channel.mode_cell(),
                blinks: channel.blink_counter(),
                channel: Mutex::new(channel),
            };
            if slots.push(slot).is_err() {
                return Err(ConfigError::TooManyChannels.into());
            }
        }

        let mut buzzer = Buzzer::new(buzzer);
        buzzer.set(false);

        info!("registry ready: {} channel(s) + buzzer, all off", slots.len());
        Ok(Self {
            slots,
            buzzer_on: buzzer.on_flag(),
            buzzer: Mutex::new(buzzer),
            sensor: Mutex::new(sensor),
            shutdown: ShutdownSignal::new(),
            released: AtomicBool::new(false),
        })
    }

    /// Configured colours, in table order.
    pub fn colours(&self) -> impl Iterator<Item = LedColour> + '_ {
        self.slots.iter().map(|s| s.colour)
    }

    pub fn is_shut_down(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    // ── Single channel ────────────────────────────────────────

    /// Hold one channel on or off.
    pub fn set_channel(&self, colour: LedColour, on: bool) -> Result<ChannelState> {
        let mut ch = self.channel(colour)?;
        if on {
            ch.turn_on()?;
        } else {
            ch.turn_off()?;
        }
        Ok(ch.state())
    }

    /// Flip one channel's steady state; returns the new steady state.
    pub fn toggle_channel(&self, colour: LedColour) -> Result<bool> {
        Ok(self.channel(colour)?.toggle()?)
    }

    /// Start (or restart) a continuous blink on one channel.
    pub fn blink_channel(&self, colour: LedColour, interval: Duration) -> Result<()> {
        Ok(self.channel(colour)?.start_blink(interval)?)
    }

    /// Blink one channel `times` cycles; blocks for `times × 2 × interval`.
    pub fn run_fixed(&self, colour: LedColour, times: u32, interval: Duration) -> Result<u32> {
        let mut ch = self.channel(colour)?;
        Ok(ch.run_fixed(times, interval, &self.shutdown)?)
    }

    // ── Aggregate ─────────────────────────────────────────────

    /// Hold every channel on or off. Turning everything off also silences
    /// the buzzer. Every channel is attempted; the first failure is returned.
    pub fn set_all(&self, on: bool) -> Result<()> {
        self.ensure_live()?;
        let mut first_err = None;
        for slot in &self.slots {
            let mut ch = lock(&slot.channel);
            let res = if on { ch.turn_on() } else { ch.turn_off() };
            if let Err(e) = res {
                warn!("set_all: {}", e);
                first_err.get_or_insert(Error::from(e));
            }
        }
        if !on {
            lock(&self.buzzer).set(false);
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Start an independent continuous blink on every channel. Loops are not
    /// phase-locked and may drift apart over time.
    pub fn blink_all(&self, interval: Duration) -> Result<()> {
        self.ensure_live()?;
        let mut first_err = None;
        for slot in &self.slots {
            if let Err(e) = lock(&slot.channel).start_blink(interval) {
                warn!("blink_all: {}", e);
                first_err.get_or_insert(Error::from(e));
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    // ── Buzzer ────────────────────────────────────────────────

    pub fn set_buzzer(&self, on: bool) -> Result<()> {
        self.ensure_live()?;
        lock(&self.buzzer).set(on);
        Ok(())
    }

    /// Sound the buzzer for `duration`; blocks the caller.
    pub fn pulse_buzzer(&self, duration: Duration) -> Result<()> {
        self.ensure_live()?;
        lock(&self.buzzer).pulse(duration, &self.shutdown);
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────

    /// Copy every output's current state without taking any channel lock.
    pub fn snapshot(&self) -> StateSnapshot {
        let mut channels = Vec::new();
        for slot in &self.slots {
            // Capacity equals the slot table's; push cannot fail.
            let _ = channels.push(ChannelEntry {
                colour: slot.colour,
                state: slot.mode.load().into(),
            });
        }
        StateSnapshot {
            channels,
            buzzer: self.buzzer_on.load(Ordering::Acquire),
        }
    }

    /// Blink threads still running on `colour`, read without the channel
    /// lock. `None` for an unconfigured colour.
    pub fn live_blink_tasks(&self, colour: LedColour) -> Option<usize> {
        self.slots
            .iter()
            .find(|s| s.colour == colour)
            .map(|s| s.blinks.load(Ordering::Acquire))
    }

    /// Read the sensor. Never fails: misses come back as
    /// [`SensorResult::Failed`] and leave every output untouched.
    pub fn read_sensor(&self) -> SensorResult {
        let result = lock(&self.sensor).read();
        if let Err(e) = &result {
            warn!("sensor read failed: {}", e);
        }
        result.into()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Cancel every blink, force all outputs off and release them.
    ///
    /// Meant to be called once by the process's top-level lifecycle; later
    /// calls are no-ops. Fixed blinks and pulses in flight are cut short.
    pub fn shutdown(&self) -> Result<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            warn!("shutdown called twice; ignoring");
            return Ok(());
        }
        self.shutdown.fire();

        let mut first_err = None;
        for slot in &self.slots {
            if let Err(e) = lock(&slot.channel).release() {
                warn!("shutdown: {}", e);
                first_err.get_or_insert(Error::from(e));
            }
        }
        lock(&self.buzzer).release();
        lock(&self.sensor).release();
        info!("registry shut down, all outputs released");
        first_err.map_or(Ok(()), Err)
    }

    // ── Internal ──────────────────────────────────────────────

    fn ensure_live(&self) -> Result<()> {
        if self.is_shut_down() {
            Err(Error::ShutDown)
        } else {
            Ok(())
        }
    }

    fn channel(&self, colour: LedColour) -> Result<MutexGuard<'_, Channel>> {
        self.ensure_live()?;
        let slot = self
            .slots
            .iter()
            .find(|s| s.colour == colour)
            .ok_or_else(|| Error::UnknownTarget(colour.to_string()))?;
        let guard = lock(&slot.channel);
        // Shutdown may have won the race for this channel's lock.
        if guard.is_released() {
            return Err(Error::ShutDown);
        }
        Ok(guard)
    }
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
