//! Ratio engine: turns the user's set-point into per-liquid percentages.
//!
//! A *mixer* describes its blend with three boundary angles on a 360°
//! dial.  The arc between liquid *n* and liquid *n+1* is liquid *n*'s
//! share:
//!
//! ```text
//!            0° (α1)
//!             │
//!     d3      │      d1
//!   ╭─────────┼─────────╮
//!   │  L3     │     L1  │
//!   │         ●         │
//!   │  ╲             ╱  │
//!   ╰───╲── L2 ────╱────╯
//!     240° (α3)   120° (α2)
//!         d2
//! ```
//!
//! A *pour* device instead keeps one sparkling share per slot and pours a
//! single bottle, optionally topped up with sparkling.

pub mod bottles;
pub mod engine;

pub use engine::{RatioEngine, angular_distance};

use serde::{Deserialize, Serialize};

/// Which interpretation of the set-point a device uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Three-way blend set by dial angles.
    Mixer,
    /// One bottle at a time plus optional sparkling.
    Pour,
}

/// Liquid selector.  `All` and `None` are only meaningful for cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Liquid {
    One,
    Two,
    Three,
    All,
    None,
}

impl Liquid {
    pub const SLOTS: [Self; 3] = [Self::One, Self::Two, Self::Three];

    /// Slot index for a single liquid.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::One => Some(0),
            Self::Two => Some(1),
            Self::Three => Some(2),
            Self::All | Self::None => None,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::SLOTS.get(index).copied().unwrap_or(Self::None)
    }

    /// Dispense cursor order: 1 → 2 → 3 → 1.
    pub fn next_slot(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::Three,
            Self::Three | Self::All | Self::None => Self::One,
        }
    }

    /// Cleaning cursor order: 1 → 2 → 3 → all → 1.
    pub fn next_cleaning(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::Three,
            Self::Three => Self::All,
            Self::All | Self::None => Self::One,
        }
    }
}

/// Per-liquid percentages handed to the duty scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ratios(pub [f32; 3]);

impl Ratios {
    pub const ZERO: Self = Self([0.0; 3]);
    pub const ALL_FULL: Self = Self([100.0; 3]);

    /// Only the given liquid at 100 %; `All` fills every slot, `None` none.
    pub fn solo(liquid: Liquid) -> Self {
        match liquid {
            Liquid::All => Self::ALL_FULL,
            Liquid::None => Self::ZERO,
            single => {
                let mut r = [0.0; 3];
                if let Some(i) = single.index() {
                    r[i] = 100.0;
                }
                Self(r)
            }
        }
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    pub fn get(&self, index: usize) -> f32 {
        self.0.get(index).copied().unwrap_or(0.0)
    }
}
