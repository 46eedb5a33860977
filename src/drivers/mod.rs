//! Output drivers: actuator plumbing, LED channels, blink supervision, buzzer.

pub mod actuator;
pub mod blink;
pub mod buzzer;
pub mod channel;
