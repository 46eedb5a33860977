//! Intent executor — the boundary the API layer talks to.
//!
//! [`IntentExecutor`] owns the [`ActuatorRegistry`] and the configuration.
//! It turns a resolved [`Intent`] into registry calls, reports what
//! happened through an [`EventSink`], and always answers with a state
//! snapshot. On failure the snapshot rides along with the error so the
//! caller can still render current state.
//!
//! ```text
//!  text ──▶ phrases::resolve ─┐
//!                             ├─▶ IntentExecutor ──▶ ActuatorRegistry ──▶ outputs
//!  (channel, action) ─────────┘          │
//!                                        └──▶ EventSink
//! ```
//!
//! All methods take `&self`; wrap the executor in an `Arc` to serve
//! concurrent requests.

use core::fmt;

use log::{info, warn};

use crate::config::SystemConfig;
use crate::drivers::channel::LedColour;
use crate::error::Error;
use crate::registry::{ActuatorRegistry, StateSnapshot};
use crate::sensors::SensorResult;

use super::commands::{Action, Intent, IntentParams, Target};
use super::events::AppEvent;
use super::phrases::{self, Locale};
use super::ports::EventSink;

// ───────────────────────────────────────────────────────────────
// Failure result
// ───────────────────────────────────────────────────────────────

/// A refused or failed intent, with the state as it stands afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentFailure {
    pub error: Error,
    pub snapshot: StateSnapshot,
}

impl fmt::Display for IntentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for IntentFailure {}

pub type IntentResult = Result<StateSnapshot, IntentFailure>;

// ───────────────────────────────────────────────────────────────
// IntentExecutor
// ───────────────────────────────────────────────────────────────

pub struct IntentExecutor {
    registry: ActuatorRegistry,
    config: SystemConfig,
}

impl IntentExecutor {
    pub fn new(registry: ActuatorRegistry, config: SystemConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ActuatorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Intents ───────────────────────────────────────────────

    /// Apply a resolved intent and return the resulting snapshot.
    ///
    /// Fixed blinks and buzzer pulses block for their full duration.
    pub fn execute(&self, intent: &Intent, sink: &mut impl EventSink) -> IntentResult {
        match self.apply(intent, sink) {
            Ok(()) => {
                info!("intent '{}' applied", intent);
                sink.emit(&AppEvent::IntentApplied(*intent));
                Ok(self.registry.snapshot())
            }
            Err(error) => Err(self.reject(error, sink)),
        }
    }

    /// Apply an intent given as raw channel and action ids.
    pub fn execute_raw(
        &self,
        channel: &str,
        action: &str,
        params: IntentParams,
        sink: &mut impl EventSink,
    ) -> IntentResult {
        match Intent::parse(channel, action, params) {
            Ok(intent) => self.execute(&intent, sink),
            Err(error) => Err(self.reject(error, sink)),
        }
    }

    /// Resolve free text with the configured locale and apply it.
    pub fn execute_text(&self, text: &str, sink: &mut impl EventSink) -> IntentResult {
        self.execute_text_in(text, self.config.locale, sink)
    }

    /// Resolve free text with an explicit locale and apply it.
    pub fn execute_text_in(
        &self,
        text: &str,
        locale: Locale,
        sink: &mut impl EventSink,
    ) -> IntentResult {
        match phrases::resolve(text, locale) {
            Some(intent) => self.execute(&intent, sink),
            None => Err(self.reject(Error::Unrecognised(text.trim().to_owned()), sink)),
        }
    }

    // ── Reads ─────────────────────────────────────────────────

    pub fn snapshot(&self) -> StateSnapshot {
        self.registry.snapshot()
    }

    pub fn read_sensor(&self, sink: &mut impl EventSink) -> SensorResult {
        let result = self.registry.read_sensor();
        sink.emit(&AppEvent::SensorRead(result.clone()));
        result
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Cancel all blinks, force every output off and release the hardware.
    pub fn shutdown(&self, sink: &mut impl EventSink) -> Result<(), Error> {
        let result = self.registry.shutdown();
        sink.emit(&AppEvent::ShutDown);
        result
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply(&self, intent: &Intent, sink: &mut impl EventSink) -> Result<(), Error> {
        let reg = &self.registry;
        let params = intent
            .params
            .resolve(intent.target, intent.action, &self.config)?;

        match (intent.target, intent.action) {
            (Target::Led(colour), Action::On | Action::Off) => {
                reg.set_channel(colour, intent.action == Action::On)?;
                self.emit_channel(colour, sink);
            }
            (Target::Led(colour), Action::Toggle) => {
                reg.toggle_channel(colour)?;
                self.emit_channel(colour, sink);
            }
            (Target::Led(colour), Action::Blink) => {
                reg.blink_channel(colour, params.interval)?;
                self.emit_channel(colour, sink);
            }
            (Target::Led(colour), Action::Pulse) => {
                let cycles = reg.run_fixed(colour, params.times, params.interval)?;
                sink.emit(&AppEvent::FixedBlinkDone { colour, cycles });
            }

            (Target::All, Action::On | Action::Off) => {
                let on = intent.action == Action::On;
                let result = reg.set_all(on);
                self.emit_all(sink);
                if !on {
                    sink.emit(&AppEvent::BuzzerChanged { on: false });
                }
                result?;
            }
            (Target::All, Action::Blink) => {
                let result = reg.blink_all(params.interval);
                self.emit_all(sink);
                result?;
            }

            (Target::Buzzer, Action::On | Action::Off) => {
                let on = intent.action == Action::On;
                reg.set_buzzer(on)?;
                sink.emit(&AppEvent::BuzzerChanged { on });
            }
            (Target::Buzzer, Action::Pulse) => {
                reg.pulse_buzzer(params.duration)?;
                sink.emit(&AppEvent::BuzzerChanged { on: false });
            }

            (target @ (Target::All | Target::Buzzer), action) => {
                return Err(Error::Unsupported {
                    target: target.as_str(),
                    action: action.as_str(),
                });
            }
        }
        Ok(())
    }

    fn emit_channel(&self, colour: LedColour, sink: &mut impl EventSink) {
        if let Some(state) = self.registry.snapshot().get(colour) {
            sink.emit(&AppEvent::ChannelChanged { colour, state });
        }
    }

    fn emit_all(&self, sink: &mut impl EventSink) {
        for entry in &self.registry.snapshot().channels {
            sink.emit(&AppEvent::ChannelChanged {
                colour: entry.colour,
                state: entry.state,
            });
        }
    }

    fn reject(&self, error: Error, sink: &mut impl EventSink) -> IntentFailure {
        warn!("intent rejected: {}", error);
        sink.emit(&AppEvent::IntentRejected {
            reason: error.to_string(),
        });
        IntentFailure {
            error,
            snapshot: self.registry.snapshot(),
        }
    }
}
