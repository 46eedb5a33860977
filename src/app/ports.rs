//! Port traits — the hexagonal boundary between the controller and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ IntentExecutor (domain)
//! ```
//!
//! Driven adapters (pins, sensors, event sinks) implement these traits.
//! The registry owns boxed trait objects so the domain core never touches
//! hardware directly and every piece is testable with in-memory doubles.

use crate::error::SensorError;
use crate::sensors::ClimateReading;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// A single physical binary output (LED, buzzer).
///
/// Implementations are assumed infallible at this layer: a driver that
/// cannot write its pin logs the fault and carries on. `Send` is required
/// because blink tasks drive the actuator from their own thread.
pub trait Actuator: Send {
    /// Drive the output to its active level.
    fn activate(&mut self);

    /// Drive the output to its inactive level.
    fn deactivate(&mut self);

    /// Give the underlying pin back to the platform. Called once at shutdown,
    /// after the output has been deactivated.
    fn release(&mut self);
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn activate(&mut self) {
        (**self).activate();
    }

    fn deactivate(&mut self) {
        (**self).deactivate();
    }

    fn release(&mut self) {
        (**self).release();
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the environmental sensor.
pub trait SensorPort: Send {
    /// Take one reading. Misses are expected; the caller converts every
    /// error into a reported failure.
    fn read(&mut self) -> Result<ClimateReading, SensorError>;

    /// Give the sensor handle back to the platform.
    fn release(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The executor emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

/// Sink that drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &super::events::AppEvent) {}
}
