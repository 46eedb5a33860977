//! Application core — intent handling, zero direct I/O.
//!
//! This module turns resolved or free-text intents into registry
//! operations. All interaction with hardware happens through the **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod commands;
pub mod events;
pub mod phrases;
pub mod ports;
pub mod service;
