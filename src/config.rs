//! System configuration parameters
//!
//! Which outputs exist, where they are wired, and the timing defaults the
//! intent executor falls back to. Loaded from a JSON file by the host
//! binary; every field has a default matching the reference board.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::phrases::Locale;
use crate::drivers::channel::LedColour;
use crate::error::ConfigError;
use crate::pins;

/// One LED output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedConfig {
    pub colour: LedColour,
    /// BCM GPIO number.
    pub gpio: u8,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Outputs ---
    /// LED channels, in display order
    pub leds: Vec<LedConfig>,
    /// Buzzer BCM GPIO
    pub buzzer_gpio: u8,
    /// Temperature/humidity sensor data BCM GPIO
    pub sensor_gpio: u8,

    // --- Blink ---
    /// Default blink half-period (milliseconds)
    pub blink_interval_ms: u32,
    /// Shortest accepted blink half-period (milliseconds)
    pub min_interval_ms: u32,
    /// Longest accepted blink half-period (milliseconds); bounds how long a
    /// fixed blink can hold its channel
    pub max_interval_ms: u32,
    /// Default cycle count for a fixed blink
    pub pulse_times: u32,
    /// Largest accepted cycle count for a fixed blink
    pub max_pulse_times: u32,
    /// How long a request waits for a superseded blink task to exit (milliseconds)
    pub cancel_timeout_ms: u32,

    // --- Buzzer ---
    /// Default buzzer pulse length (milliseconds)
    pub buzz_duration_ms: u32,
    /// Longest accepted buzzer pulse (milliseconds)
    pub max_buzz_ms: u32,

    // --- Free text ---
    /// Phrase table used for free-text intents
    pub locale: Locale,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            leds: vec![
                LedConfig {
                    colour: LedColour::White,
                    gpio: pins::WHITE_LED_GPIO,
                },
                LedConfig {
                    colour: LedColour::Blue,
                    gpio: pins::BLUE_LED_GPIO,
                },
                LedConfig {
                    colour: LedColour::Red,
                    gpio: pins::RED_LED_GPIO,
                },
            ],
            buzzer_gpio: pins::BUZZER_GPIO,
            sensor_gpio: pins::DHT_GPIO,

            blink_interval_ms: 500,
            min_interval_ms: 10,
            max_interval_ms: 60_000,
            pulse_times: 3,
            max_pulse_times: 100,
            cancel_timeout_ms: 1000,

            buzz_duration_ms: 500,
            max_buzz_ms: 10_000,

            locale: Locale::En,
        }
    }
}

impl SystemConfig {
    /// Reject values the controller cannot run with. Invalid ranges are
    /// refused, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leds.is_empty() {
            return Err(ConfigError::ValidationFailed("leds: at least one channel required"));
        }
        if self.leds.len() > LedColour::ALL.len() {
            return Err(ConfigError::TooManyChannels);
        }
        for (i, led) in self.leds.iter().enumerate() {
            if self.leds[..i].iter().any(|l| l.colour == led.colour) {
                return Err(ConfigError::DuplicateChannel(led.colour));
            }
            if self.leds[..i].iter().any(|l| l.gpio == led.gpio)
                || led.gpio == self.buzzer_gpio
                || led.gpio == self.sensor_gpio
            {
                return Err(ConfigError::ValidationFailed("gpio assigned twice"));
            }
        }
        if self.buzzer_gpio == self.sensor_gpio {
            return Err(ConfigError::ValidationFailed("gpio assigned twice"));
        }
        if self.min_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("min_interval_ms must be > 0"));
        }
        if self.max_interval_ms < self.min_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "max_interval_ms below min_interval_ms",
            ));
        }
        if !(self.min_interval_ms..=self.max_interval_ms).contains(&self.blink_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "blink_interval_ms must be in min_interval_ms..=max_interval_ms",
            ));
        }
        if self.pulse_times == 0 || self.pulse_times > self.max_pulse_times {
            return Err(ConfigError::ValidationFailed(
                "pulse_times must be in 1..=max_pulse_times",
            ));
        }
        if self.buzz_duration_ms == 0 || self.buzz_duration_ms > self.max_buzz_ms {
            return Err(ConfigError::ValidationFailed(
                "buzz_duration_ms must be in 1..=max_buzz_ms",
            ));
        }
        if self.cancel_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("cancel_timeout_ms must be > 0"));
        }
        Ok(())
    }

    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}
