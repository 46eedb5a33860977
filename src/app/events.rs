//! Outbound application events.
//!
//! The [`IntentExecutor`](super::service::IntentExecutor) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them: log to the console,
//! push to a status page.

use crate::drivers::channel::{ChannelState, LedColour};
use crate::sensors::SensorResult;

use super::commands::Intent;

/// Structured events emitted by the controller core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// An intent was applied successfully.
    IntentApplied(Intent),

    /// An intent was refused; state is unchanged.
    IntentRejected { reason: String },

    /// A channel settled into a new steady/blinking state.
    ChannelChanged { colour: LedColour, state: ChannelState },

    /// A fixed blink finished (or was cut short by shutdown).
    FixedBlinkDone { colour: LedColour, cycles: u32 },

    /// The buzzer was switched or pulsed.
    BuzzerChanged { on: bool },

    /// A sensor request completed.
    SensorRead(SensorResult),

    /// Every output is off and released.
    ShutDown,
}
