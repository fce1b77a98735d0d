//! GPIO / peripheral pin assignments for the CocktailCube main board
//! (ESP32-S2).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Rotary encoder with push-button (pull-ups enabled, button active-low)
// ---------------------------------------------------------------------------

pub const ENCODER_A_GPIO: i32 = 34;
pub const ENCODER_B_GPIO: i32 = 21;
pub const ENCODER_BUTTON_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Dispense lever (active-low reed switch)
// ---------------------------------------------------------------------------

pub const LEVER_GPIO: i32 = 35;

// ---------------------------------------------------------------------------
// Pump MOSFET gates (active HIGH)
// ---------------------------------------------------------------------------

pub const PUMP1_GPIO: i32 = 1;
pub const PUMP2_GPIO: i32 = 2;
pub const PUMP3_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Piezo buzzer and status LED (LEDC)
// ---------------------------------------------------------------------------

pub const BUZZER_GPIO: i32 = 6;
pub const STATUS_LED_GPIO: i32 = 15;

/// LEDC frequency for the status LED.
pub const LED_PWM_FREQ_HZ: u32 = 1_000;
/// Initial buzzer timer frequency; reprogrammed per tone.
pub const BUZZER_BASE_FREQ_HZ: u32 = 500;
