//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (the host binary routes it to stderr). A status-page
//! or MQTT adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::sensors::SensorResult;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::IntentApplied(intent) => {
                info!("INTENT | {} ok", intent);
            }
            AppEvent::IntentRejected { reason } => {
                warn!("INTENT | rejected: {}", reason);
            }
            AppEvent::ChannelChanged { colour, state } => {
                info!(
                    "LED | {} steady={} blinking={}",
                    colour, state.steady_on, state.blinking
                );
            }
            AppEvent::FixedBlinkDone { colour, cycles } => {
                info!("LED | {} fixed blink, {} cycles", colour, cycles);
            }
            AppEvent::BuzzerChanged { on } => {
                info!("BUZZER | {}", if *on { "ON" } else { "OFF" });
            }
            AppEvent::SensorRead(SensorResult::Ok(r)) => {
                info!(
                    "SENSOR | T={:.1}\u{00b0}C RH={:.1}%",
                    r.temperature, r.humidity
                );
            }
            AppEvent::SensorRead(SensorResult::Failed { error }) => {
                warn!("SENSOR | read failed: {}", error);
            }
            AppEvent::ShutDown => {
                info!("SHUTDOWN | all outputs released");
            }
        }
    }
}

/// Sink that keeps events in memory, for callers that want to inspect or
/// forward them after a request completes.
#[derive(Default)]
pub struct MemorySink {
    pub events: Vec<AppEvent>,
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
