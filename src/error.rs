//! Unified error types for the controller.
//!
//! A single [`Error`] enum that every subsystem converts into, so the
//! intent executor and the host binary handle failures uniformly.
//! Hardware faults on the actuator side are not represented here: pin
//! writes are treated as infallible at this layer and only logged by the
//! pin adapter.

use core::fmt;

use crate::drivers::channel::LedColour;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible controller operation funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The channel id of an intent did not name a configured output.
    UnknownTarget(String),
    /// The action of an intent is not recognised.
    UnknownAction(String),
    /// Free text did not match any phrase of the active locale.
    Unrecognised(String),
    /// The action exists but is meaningless for the target (e.g. blinking the buzzer).
    Unsupported { target: &'static str, action: &'static str },
    /// An intent parameter is outside its accepted range.
    InvalidParameter(&'static str),
    /// A blink task could not be superseded or started.
    Blink(BlinkError),
    /// The registry was built with an invalid channel table.
    Config(ConfigError),
    /// The registry has been shut down and its actuators released.
    ShutDown,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTarget(id) => write!(f, "unknown channel '{id}'"),
            Self::UnknownAction(action) => write!(f, "unknown action '{action}'"),
            Self::Unrecognised(text) => write!(f, "no intent matches '{text}'"),
            Self::Unsupported { target, action } => {
                write!(f, "action '{action}' is not supported on '{target}'")
            }
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::Blink(e) => write!(f, "blink: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::ShutDown => write!(f, "controller is shut down"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Blink supervision errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkError {
    /// The previous blink task did not acknowledge cancellation within the
    /// bounded wait. The new request was not started.
    CancelTimeout { channel: LedColour, waited_ms: u64 },
    /// The OS refused to create the blink thread.
    SpawnFailed(LedColour),
}

impl fmt::Display for BlinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CancelTimeout { channel, waited_ms } => write!(
                f,
                "{channel} blink task did not stop within {waited_ms} ms"
            ),
            Self::SpawnFailed(channel) => write!(f, "could not spawn {channel} blink task"),
        }
    }
}

impl From<BlinkError> for Error {
    fn from(e: BlinkError) -> Self {
        Self::Blink(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Sensor failures. All of them are transient from the controller's point
/// of view and are reported, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer the start pulse (a missed read).
    NoResponse,
    /// The frame checksum did not match its payload.
    ChecksumMismatch,
    /// Decoded values are outside the physically plausible range.
    OutOfRange,
    /// The sensor handle has been released.
    Unavailable,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "sensor did not respond"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::Unavailable => write!(f, "sensor unavailable"),
        }
    }
}

impl std::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// The same colour appears twice in the channel table.
    DuplicateChannel(LedColour),
    /// More channels than the registry can hold.
    TooManyChannels,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::DuplicateChannel(colour) => write!(f, "channel {} configured twice", colour),
            Self::TooManyChannels => write!(f, "too many channels"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
