//! Cumulative pump on-time per liquid.

use serde::{Deserialize, Serialize};

/// Monotonic on-time totals.  Persisted whenever dispensing stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTotals {
    on_time_ms: [u64; 3],
}

impl FlowTotals {
    pub fn new(on_time_ms: [u64; 3]) -> Self {
        Self { on_time_ms }
    }

    pub(crate) fn add(&mut self, liquid: usize, ms: u32) {
        if let Some(t) = self.on_time_ms.get_mut(liquid) {
            *t = t.saturating_add(u64::from(ms));
        }
    }

    pub fn on_time_ms(&self) -> [u64; 3] {
        self.on_time_ms
    }

    /// Estimated delivered volume for one liquid.
    pub fn millilitres(&self, liquid: usize, ml_per_min: u16) -> f32 {
        let ms = self.on_time_ms.get(liquid).copied().unwrap_or(0);
        ms as f32 * f32::from(ml_per_min) / 60_000.0
    }
}
