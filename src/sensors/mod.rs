//! Environmental sensing.
//!
//! The controller treats the sensor as an opaque read: every request goes
//! to the hardware, nothing is cached, and every failure becomes a
//! [`SensorResult::Failed`] value rather than an error.

pub mod climate;

use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// One successful temperature/humidity reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateReading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity, percent.
    pub humidity: f32,
}

/// Outcome of a sensor request as reported to callers.
///
/// Serialises flat: `{"success":true,"temperature":..,"humidity":..}` or
/// `{"success":false,"error":".."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SensorWire", from = "SensorWire")]
pub enum SensorResult {
    Ok(ClimateReading),
    Failed { error: String },
}

impl SensorResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn reading(&self) -> Option<ClimateReading> {
        match self {
            Self::Ok(r) => Some(*r),
            Self::Failed { .. } => None,
        }
    }
}

impl From<Result<ClimateReading, SensorError>> for SensorResult {
    fn from(result: Result<ClimateReading, SensorError>) -> Self {
        match result {
            Ok(r) => Self::Ok(r),
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SensorWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    humidity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<SensorResult> for SensorWire {
    fn from(result: SensorResult) -> Self {
        match result {
            SensorResult::Ok(r) => Self {
                success: true,
                temperature: Some(r.temperature),
                humidity: Some(r.humidity),
                error: None,
            },
            SensorResult::Failed { error } => Self {
                success: false,
                temperature: None,
                humidity: None,
                error: Some(error),
            },
        }
    }
}

impl From<SensorWire> for SensorResult {
    fn from(wire: SensorWire) -> Self {
        match (wire.success, wire.temperature, wire.humidity) {
            (true, Some(temperature), Some(humidity)) => Self::Ok(ClimateReading {
                temperature,
                humidity,
            }),
            _ => Self::Failed {
                error: wire.error.unwrap_or_else(|| "malformed reading".into()),
            },
        }
    }
}
