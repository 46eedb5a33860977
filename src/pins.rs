//! GPIO assignments for the reference board (Raspberry Pi, BCM numbering).
//!
//! Single source of truth for the default configuration: change a pin here
//! and the defaults follow. Deployments with different wiring override the
//! numbers in the config file instead.

// ---------------------------------------------------------------------------
// Indicator LEDs
// ---------------------------------------------------------------------------

/// White LED — physical pin 40.
pub const WHITE_LED_GPIO: u8 = 21;
/// Blue LED — physical pin 38.
pub const BLUE_LED_GPIO: u8 = 20;
/// Red LED — physical pin 36.
pub const RED_LED_GPIO: u8 = 16;

// ---------------------------------------------------------------------------
// Audible alert
// ---------------------------------------------------------------------------

/// Active buzzer — physical pin 11.
pub const BUZZER_GPIO: u8 = 17;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DHT22 single-wire data line — physical pin 7.
pub const DHT_GPIO: u8 = 4;
