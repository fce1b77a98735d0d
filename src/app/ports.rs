//! Port traits: the hexagonal boundary between the control core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (input latch, pumps, display, stores) implement these
//! traits.  The [`AppService`](super::service::AppService) consumes them
//! via generics, so the control core never touches hardware directly.

use crate::config::{DeviceConfig, EncoderDirection, LedMode, ProfileName, Settings};
use crate::dispense::FlowTotals;
use crate::fsm::context::{Beep, Redraw};

use super::view::DisplayView;

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: encoder / lever → domain)
// ───────────────────────────────────────────────────────────────

/// Snapshot-and-reset access to the user input recorded since the last
/// poll.  Every `poll_*` call consumes what it returns.
pub trait InputPort {
    /// Signed encoder detents since the last poll.
    fn poll_rotation(&mut self) -> i32;

    /// Debounced short press since the last poll.
    fn poll_short_press(&mut self) -> bool;

    /// Fires once per qualifying hold and suppresses that hold's release.
    fn poll_long_press(&mut self, now_ms: u32) -> bool;

    /// Level of the dispense lever.  Not consumed by reading.
    fn dispense_requested(&self) -> bool;

    /// Polarity applied where rotation steps are counted.
    fn set_encoder_direction(&mut self, direction: EncoderDirection);

    /// Drop everything recorded so far (used after the settle pause).
    fn discard_pending(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

pub trait ActuatorPort {
    /// Drive the three pump outputs.
    fn set_pumps(&mut self, on: [bool; 3]);

    /// Select the status LED pattern.
    fn set_led_mode(&mut self, mode: LedMode);

    /// Start a feedback tone.
    fn beep(&mut self, beep: Beep, now_ms: u32);

    /// Advance time-based outputs (LED pattern, tone end).  Called once
    /// per tick after every other actuator call.
    fn update(&mut self, _now_ms: u32) {}

    /// Pumps off, LED off, buzzer silent.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Display port (push model)
// ───────────────────────────────────────────────────────────────

/// The service pushes redraw requests; the renderer decides how much of
/// the screen to repaint.
pub trait DisplayPort {
    fn render(&mut self, what: Redraw, view: &DisplayView<'_>);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Persistence ports
// ───────────────────────────────────────────────────────────────

/// Persisted user settings.
///
/// `load_settings` returns [`ConfigError::NotFound`] on first boot; the
/// caller falls back to the profile's factory settings.
pub trait SettingsPort {
    fn load_settings(&self) -> Result<Settings, ConfigError>;
    fn save_settings(&self, settings: &Settings) -> Result<(), ConfigError>;
}

/// Cumulative pump on-time, written whenever dispensing stops.
pub trait FlowLogPort {
    fn load_flow(&self) -> Result<FlowTotals, ConfigError>;
    fn save_flow(&self, flow: &FlowTotals) -> Result<(), ConfigError>;
}

/// Named device profiles.
///
/// Implementations MUST validate a profile before returning it; an
/// invalid document is reported, never silently repaired.
pub trait ProfilePort {
    /// Profile names in switching order.
    fn names(&self) -> Vec<ProfileName>;

    fn load(&self, name: &str) -> Result<DeviceConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from the persistence and profile ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Nothing stored under the key, or no profile by that name.
    NotFound,
    /// Stored data failed deserialization.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Corrupted => write!(f, "data corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
