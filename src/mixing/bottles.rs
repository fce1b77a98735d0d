//! Bottle assignment for pour devices.
//!
//! Each of the three slots holds one bottle type.  At most one slot may
//! hold sparkling; a slot marked `Empty` is skipped by the pour cursor.

use serde::{Deserialize, Serialize};

use crate::error::Rejected;
use crate::mixing::Liquid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bottle {
    Sparkling,
    Empty,
    RedWine,
    WhiteWine,
    RoseWine,
}

impl Bottle {
    /// Order used when cycling a slot with the encoder.
    pub const ALL: [Self; 5] = [
        Self::Sparkling,
        Self::Empty,
        Self::RedWine,
        Self::WhiteWine,
        Self::RoseWine,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Sparkling => "Sparkling",
            Self::Empty => "Empty",
            Self::RedWine => "Red wine",
            Self::WhiteWine => "White wine",
            Self::RoseWine => "Rose wine",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BottleRack {
    slots: [Bottle; 3],
}

impl Default for BottleRack {
    fn default() -> Self {
        Self {
            slots: [Bottle::RedWine, Bottle::WhiteWine, Bottle::RoseWine],
        }
    }
}

impl BottleRack {
    pub fn from_slots(slots: [Bottle; 3]) -> Result<Self, Rejected> {
        let sparkling = slots.iter().filter(|b| **b == Bottle::Sparkling).count();
        if sparkling > 1 {
            return Err(Rejected::SparklingTaken);
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> [Bottle; 3] {
        self.slots
    }

    pub fn get(&self, slot: usize) -> Option<Bottle> {
        self.slots.get(slot).copied()
    }

    pub fn sparkling_slot(&self) -> Option<usize> {
        self.slots.iter().position(|b| *b == Bottle::Sparkling)
    }

    /// `true` for `Empty` slots and for selectors that are not a slot.
    pub fn is_empty_slot(&self, liquid: Liquid) -> bool {
        liquid
            .index()
            .is_none_or(|i| self.slots[i] == Bottle::Empty)
    }

    /// Step a slot through the bottle list.  Sparkling is skipped while
    /// another slot already holds it.
    pub fn cycle(&mut self, slot: usize, dir: i32) -> Result<Bottle, Rejected> {
        let current = self.get(slot).ok_or(Rejected::InvalidSlot(slot))?;
        if dir == 0 {
            return Ok(current);
        }
        let taken = self.sparkling_slot().is_some_and(|s| s != slot);
        let len = Bottle::ALL.len() as i32;
        let mut idx = Bottle::ALL.iter().position(|b| *b == current).unwrap_or(0) as i32;
        loop {
            idx = (idx + dir.signum()).rem_euclid(len);
            let candidate = Bottle::ALL[idx as usize];
            if !(taken && candidate == Bottle::Sparkling) {
                self.slots[slot] = candidate;
                return Ok(candidate);
            }
        }
    }

    pub fn assign(&mut self, slot: usize, bottle: Bottle) -> Result<(), Rejected> {
        if slot >= self.slots.len() {
            return Err(Rejected::InvalidSlot(slot));
        }
        if bottle == Bottle::Sparkling && self.sparkling_slot().is_some_and(|s| s != slot) {
            return Err(Rejected::SparklingTaken);
        }
        self.slots[slot] = bottle;
        Ok(())
    }

    /// Next non-empty slot after `from`.  Stays on `from` when every
    /// other slot is empty.
    pub fn next_filled(&self, from: Liquid) -> Liquid {
        let mut candidate = from;
        for _ in 0..3 {
            candidate = candidate.next_slot();
            if !self.is_empty_slot(candidate) {
                return candidate;
            }
        }
        from
    }
}
