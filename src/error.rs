//! Rejection reasons for validated setters.
//!
//! Nothing in the control core is fatal: a bad request is refused, the
//! caller receives the reason, and the previous state stays in place.
//! All variants are `Copy` so they can be logged and forwarded as events
//! without allocation.

use core::fmt;

/// Why a request against the control core was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// Requested cycle length is outside the configured bounds.
    CycleOutOfRange { ms: u32, min: u32, max: u32 },
    /// Angle increment magnitude exceeds a full turn.
    AngleOutOfRange(i32),
    /// The liquid selector does not name a single liquid.
    InvalidLiquid,
    /// Bottle slot index is not 0, 1 or 2.
    InvalidSlot(usize),
    /// Another slot already holds the sparkling bottle.
    SparklingTaken,
    /// Bottle assignments only exist on pour devices.
    NotPourDevice,
    /// Dial angles only exist on mixer devices.
    NotMixerDevice,
    /// Remote access is switched off in the settings.
    RemoteDisabled,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleOutOfRange { ms, min, max } => {
                write!(f, "cycle length {ms} ms outside {min}..={max} ms")
            }
            Self::AngleOutOfRange(deg) => write!(f, "angle increment {deg}° exceeds 360°"),
            Self::InvalidLiquid => write!(f, "selector does not name a single liquid"),
            Self::InvalidSlot(slot) => write!(f, "bottle slot {slot} does not exist"),
            Self::SparklingTaken => write!(f, "sparkling already assigned to another slot"),
            Self::NotPourDevice => write!(f, "bottle assignment requires a pour device"),
            Self::NotMixerDevice => write!(f, "angle adjustment requires a mixer device"),
            Self::RemoteDisabled => write!(f, "remote access disabled"),
        }
    }
}
