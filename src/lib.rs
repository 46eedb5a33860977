//! Lampctl library.
//!
//! Drives a small set of indicator LEDs and a buzzer, runs independent
//! cancellable blink loops per channel, reads an environmental sensor, and
//! exposes the whole thing through an intent executor that an API layer
//! can sit on top of.
//!
//! All hardware access goes through the port traits in [`app::ports`];
//! the [`adapters`] module provides in-memory doubles for host runs.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod registry;
pub mod sensors;

pub use app::service::{IntentExecutor, IntentFailure};
pub use error::{Error, Result};
pub use registry::{ActuatorRegistry, StateSnapshot};
