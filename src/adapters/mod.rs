//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `log_sink`     | EventSink          | `log` facade / memory        |
//! | `sim`          | Actuator           | in-memory pin history        |
//! | [`PinActuator`](crate::drivers::actuator::PinActuator) | Actuator | `embedded-hal` `OutputPin` (GPIO) |
//! | [`SimClimateSensor`](crate::sensors::climate::SimClimateSensor) | SensorPort | injected readings |
//!
//! `PinActuator` sits beside the write dedup in `drivers::actuator` since
//! both deal in pin levels; wrap a board's GPIO in it and hand the box to
//! [`ActuatorRegistry::new`](crate::ActuatorRegistry::new).

pub mod log_sink;
pub mod sim;
