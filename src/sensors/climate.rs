//! DHT22 / AM2302 temperature and humidity sensor.
//!
//! The sensor answers a start pulse with a 40-bit frame:
//!
//! | byte | content                         |
//! |------|---------------------------------|
//! | 0-1  | humidity × 10 (big endian)      |
//! | 2-3  | temperature × 10, bit 15 = sign |
//! | 4    | low byte of the sum of 0-3      |
//!
//! ## Dual-target design
//!
//! On hardware: a platform adapter clocks the frame in and hands it to
//! [`decode_frame`].
//! On host/test: [`SimClimateSensor`] serves a frame injected through its
//! [`SimClimateHandle`], including scripted read misses.

use std::sync::{Arc, Mutex, PoisonError};

use crate::app::ports::SensorPort;
use crate::error::SensorError;
use crate::sensors::ClimateReading;

const HUMIDITY_MAX: f32 = 100.0;
const TEMP_MIN_C: f32 = -40.0;
const TEMP_MAX_C: f32 = 80.0;

/// Validate and decode one raw frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<ClimateReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }

    let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
    let raw_temp = u16::from_be_bytes([frame[2], frame[3]]);
    let magnitude = f32::from(raw_temp & 0x7FFF) / 10.0;
    let temperature = if raw_temp & 0x8000 != 0 { -magnitude } else { magnitude };

    if humidity > HUMIDITY_MAX || !(TEMP_MIN_C..=TEMP_MAX_C).contains(&temperature) {
        return Err(SensorError::OutOfRange);
    }
    Ok(ClimateReading {
        temperature,
        humidity,
    })
}

/// Build a valid frame for the given values (used by the simulator).
pub fn encode_frame(temperature: f32, humidity: f32) -> [u8; 5] {
    let hum = (humidity * 10.0).round().clamp(0.0, f32::from(u16::MAX)) as u16;
    let mag = (temperature.abs() * 10.0).round().min(f32::from(0x7FFF_u16)) as u16;
    let temp = if temperature < 0.0 { mag | 0x8000 } else { mag };
    let [h0, h1] = hum.to_be_bytes();
    let [t0, t1] = temp.to_be_bytes();
    let sum = h0.wrapping_add(h1).wrapping_add(t0).wrapping_add(t1);
    [h0, h1, t0, t1, sum]
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

struct SimState {
    frame: [u8; 5],
    misses: u32,
    released: bool,
}

/// In-memory sensor for host runs and tests.
pub struct SimClimateSensor {
    state: Arc<Mutex<SimState>>,
}

/// Injection side of a [`SimClimateSensor`].
#[derive(Clone)]
pub struct SimClimateHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimClimateSensor {
    /// A sensor reporting 22.0 °C / 45 % until told otherwise.
    pub fn new() -> (Self, SimClimateHandle) {
        let state = Arc::new(Mutex::new(SimState {
            frame: encode_frame(22.0, 45.0),
            misses: 0,
            released: false,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimClimateHandle { state },
        )
    }
}

impl SensorPort for SimClimateSensor {
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.released {
            return Err(SensorError::Unavailable);
        }
        if state.misses > 0 {
            state.misses -= 1;
            return Err(SensorError::NoResponse);
        }
        decode_frame(state.frame)
    }

    fn release(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .released = true;
    }
}

impl SimClimateHandle {
    pub fn set(&self, temperature: f32, humidity: f32) {
        self.set_frame(encode_frame(temperature, humidity));
    }

    /// Serve a raw frame verbatim (e.g. a corrupted one).
    pub fn set_frame(&self, frame: [u8; 5]) {
        self.lock().frame = frame;
    }

    /// Make the next `n` reads miss.
    pub fn fail_next(&self, n: u32) {
        self.lock().misses = n;
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
