//! Inbound intents to the controller.
//!
//! An [`Intent`] is a resolved action request (channel, action and
//! optional parameters), independent of whether it came from a button,
//! a structured API call or a matched phrase.

use core::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::drivers::channel::LedColour;
use crate::error::Error;

/// What an intent acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Led(LedColour),
    All,
    Buzzer,
}

impl Target {
    pub fn parse(id: &str) -> Result<Self, Error> {
        let id = id.trim();
        if id.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else if id.eq_ignore_ascii_case("buzzer") {
            Ok(Self::Buzzer)
        } else {
            LedColour::parse(id)
                .map(Self::Led)
                .ok_or_else(|| Error::UnknownTarget(id.to_owned()))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Led(c) => c.as_str(),
            Self::All => "all",
            Self::Buzzer => "buzzer",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    On,
    Off,
    Toggle,
    /// Continuous blink until superseded.
    Blink,
    /// LEDs: fixed number of blink cycles. Buzzer: timed beep.
    Pulse,
}

impl Action {
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "toggle" => Ok(Self::Toggle),
            "blink" => Ok(Self::Blink),
            "pulse" | "buzz" => Ok(Self::Pulse),
            _ => Err(Error::UnknownAction(name.trim().to_owned())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Toggle => "toggle",
            Self::Blink => "blink",
            Self::Pulse => "pulse",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional intent parameters. Missing values fall back to the config.
/// Durations are in seconds, as callers think of them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IntentParams {
    /// Buzzer pulse length.
    pub duration: Option<f32>,
    /// Blink half-period.
    pub interval: Option<f32>,
    /// Fixed blink cycle count.
    pub times: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub target: Target,
    pub action: Action,
    #[serde(default)]
    pub params: IntentParams,
}

impl Intent {
    pub const fn new(target: Target, action: Action) -> Self {
        Self {
            target,
            action,
            params: IntentParams {
                duration: None,
                interval: None,
                times: None,
            },
        }
    }

    /// Build from raw channel/action ids as received at the API boundary.
    pub fn parse(channel: &str, action: &str, params: IntentParams) -> Result<Self, Error> {
        Ok(Self {
            target: Target::parse(channel)?,
            action: Action::parse(action)?,
            params,
        })
    }

    #[must_use]
    pub fn with_params(mut self, params: IntentParams) -> Self {
        self.params = params;
        self
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target, self.action)
    }
}

/// Parameters after defaulting and range checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Resolved {
    pub interval: Duration,
    pub times: u32,
    pub duration: Duration,
}

impl IntentParams {
    /// Apply defaults from `config` and reject out-of-range values before
    /// anything touches an output.
    ///
    /// Only the parameters `action` on `target` actually reads are checked;
    /// the rest are ignored and keep their configured defaults.
    pub(crate) fn resolve(
        &self,
        target: Target,
        action: Action,
        config: &SystemConfig,
    ) -> Result<Resolved, Error> {
        let led_pulse = action == Action::Pulse && matches!(target, Target::Led(_));
        let uses_interval = action == Action::Blink || led_pulse;
        let uses_duration = action == Action::Pulse && target == Target::Buzzer;

        let mut resolved = Resolved {
            interval: Duration::from_millis(u64::from(config.blink_interval_ms)),
            times: config.pulse_times,
            duration: Duration::from_millis(u64::from(config.buzz_duration_ms)),
        };

        if uses_interval {
            if let Some(secs) = self.interval {
                resolved.interval =
                    seconds(secs, "interval must be a finite positive number of seconds")?;
            }
            if resolved.interval < Duration::from_millis(u64::from(config.min_interval_ms)) {
                return Err(Error::InvalidParameter("interval below minimum"));
            }
            if resolved.interval > Duration::from_millis(u64::from(config.max_interval_ms)) {
                return Err(Error::InvalidParameter("interval above maximum"));
            }
        }

        if led_pulse {
            resolved.times = self.times.unwrap_or(config.pulse_times);
            if resolved.times == 0 || resolved.times > config.max_pulse_times {
                return Err(Error::InvalidParameter("times out of range"));
            }
        }

        if uses_duration {
            if let Some(secs) = self.duration {
                resolved.duration =
                    seconds(secs, "duration must be a finite positive number of seconds")?;
            }
            if resolved.duration > Duration::from_millis(u64::from(config.max_buzz_ms)) {
                return Err(Error::InvalidParameter("duration above maximum"));
            }
        }

        Ok(resolved)
    }
}

fn seconds(secs: f32, msg: &'static str) -> Result<Duration, Error> {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f32(secs).map_err(|_| Error::InvalidParameter(msg))
    } else {
        Err(Error::InvalidParameter(msg))
    }
}
