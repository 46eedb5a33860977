//! LED channel: one coloured output plus its steady/blinking state.
//!
//! The channel's mode lives in a single atomic byte, so `steady` and
//! `blinking` can never be observed together and snapshot readers never
//! wait on a channel that is busy (e.g. in the middle of a fixed blink).
//!
//! All mutating operations go through [`BlinkSupervisor::stop`] first:
//! the actuator is only written once any previous blink task is gone.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::app::ports::Actuator;
use crate::drivers::actuator::ActuatorCell;
use crate::drivers::blink::{BlinkSupervisor, ShutdownSignal};
use crate::error::BlinkError;

// ───────────────────────────────────────────────────────────────
// Identity
// ───────────────────────────────────────────────────────────────

/// Closed set of LED colours a deployment can wire up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedColour {
    Red,
    Blue,
    White,
    Green,
}

impl LedColour {
    pub const ALL: [Self; 4] = [Self::Red, Self::Blue, Self::White, Self::Green];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::White => "white",
            Self::Green => "green",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for LedColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───────────────────────────────────────────────────────────────
// Mode
// ───────────────────────────────────────────────────────────────

/// What currently drives the channel's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelMode {
    Off = 0,
    Steady = 1,
    Blinking = 2,
}

/// Lock-free mode cell shared between a channel and snapshot readers.
#[derive(Debug)]
pub struct ModeCell(AtomicU8);

impl ModeCell {
    fn new(mode: ChannelMode) -> Self {
        Self(AtomicU8::new(mode as u8))
    }

    pub fn load(&self) -> ChannelMode {
        match self.0.load(Ordering::Acquire) {
            1 => ChannelMode::Steady,
            2 => ChannelMode::Blinking,
            _ => ChannelMode::Off,
        }
    }

    fn store(&self, mode: ChannelMode) {
        self.0.store(mode as u8, Ordering::Release);
    }
}

/// Externally visible channel flags. At most one is `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelState {
    pub steady_on: bool,
    pub blinking: bool,
}

impl From<ChannelMode> for ChannelState {
    fn from(mode: ChannelMode) -> Self {
        Self {
            steady_on: mode == ChannelMode::Steady,
            blinking: mode == ChannelMode::Blinking,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Channel
// ───────────────────────────────────────────────────────────────

pub struct Channel {
    colour: LedColour,
    output: ActuatorCell,
    mode: Arc<ModeCell>,
    blink: BlinkSupervisor,
}

impl Channel {
    /// Wrap `actuator` as the `colour` channel. The output is not touched
    /// until the first operation.
    pub fn new(colour: LedColour, actuator: Box<dyn Actuator>, cancel_timeout: Duration) -> Self {
        Self {
            colour,
            output: ActuatorCell::new(actuator),
            mode: Arc::new(ModeCell::new(ChannelMode::Off)),
            blink: BlinkSupervisor::new(colour, cancel_timeout),
        }
    }

    pub fn colour(&self) -> LedColour {
        self.colour
    }

    /// Shared handle for lock-free snapshot reads.
    pub fn mode_cell(&self) -> Arc<ModeCell> {
        Arc::clone(&self.mode)
    }

    pub fn mode(&self) -> ChannelMode {
        self.mode.load()
    }

    pub fn state(&self) -> ChannelState {
        self.mode.load().into()
    }

    /// Blink threads still running for this channel (0 or 1).
    pub fn live_blink_tasks(&self) -> usize {
        self.blink.live_tasks()
    }

    /// Shared live-task count, see [`BlinkSupervisor::live_counter`].
    pub fn blink_counter(&self) -> Arc<AtomicUsize> {
        self.blink.live_counter()
    }

    /// Whether the physical output is currently lit.
    pub fn output_active(&self) -> bool {
        self.output.is_active()
    }

    /// Hold the output on.
    pub fn turn_on(&mut self) -> Result<(), BlinkError> {
        self.blink.stop()?;
        self.output.set(true);
        self.mode.store(ChannelMode::Steady);
        info!("{} on", self.colour);
        Ok(())
    }

    /// Hold the output off.
    pub fn turn_off(&mut self) -> Result<(), BlinkError> {
        self.blink.stop()?;
        self.output.set(false);
        self.mode.store(ChannelMode::Off);
        info!("{} off", self.colour);
        Ok(())
    }

    /// Flip the steady state. A blinking channel counts as off, so toggling
    /// it ends the blink and holds the output on. Returns the new steady state.
    pub fn toggle(&mut self) -> Result<bool, BlinkError> {
        if self.mode() == ChannelMode::Steady {
            self.turn_off()?;
            Ok(false)
        } else {
            self.turn_on()?;
            Ok(true)
        }
    }

    /// Start (or restart with a new interval) the continuous blink.
    pub fn start_blink(&mut self, interval: Duration) -> Result<(), BlinkError> {
        self.blink.stop()?;
        self.mode.store(ChannelMode::Blinking);
        if let Err(e) = self.blink.start_continuous(self.output.clone(), interval) {
            self.output.set(false);
            self.mode.store(ChannelMode::Off);
            return Err(e);
        }
        Ok(())
    }

    /// Blink `times` cycles on the calling thread and end off.
    pub fn run_fixed(
        &mut self,
        times: u32,
        interval: Duration,
        shutdown: &ShutdownSignal,
    ) -> Result<u32, BlinkError> {
        self.blink.stop()?;
        self.mode.store(ChannelMode::Off);
        let completed = self.blink.run_fixed(&self.output, times, interval, shutdown)?;
        self.mode.store(ChannelMode::Off);
        info!("{} fixed blink done ({} cycles)", self.colour, completed);
        Ok(completed)
    }

    /// Stop blinking, force the output off and release the actuator.
    ///
    /// A wedged blink task is reported but does not hold up the release:
    /// the cell stops accepting writes at once, and the task completes the
    /// off-and-release when its stuck write returns.
    pub fn release(&mut self) -> Result<(), BlinkError> {
        let stopped = self.blink.stop();
        self.output.release();
        self.mode.store(ChannelMode::Off);
        stopped
    }

    pub fn is_released(&self) -> bool {
        self.output.is_released()
    }
}
