//! Pulse schedule within a shared cycle.
//!
//! Time is a wrapping `u32` millisecond clock; every difference is taken
//! with `wrapping_sub` so a clock rollover only costs one short cycle.

use log::{debug, info};

use crate::dispense::FlowTotals;
use crate::error::Rejected;
use crate::mixing::Ratios;

/// Inclusive cycle-length limits from the active profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleBounds {
    pub min_ms: u32,
    pub max_ms: u32,
}

impl CycleBounds {
    pub fn contains(&self, ms: u32) -> bool {
        (self.min_ms..=self.max_ms).contains(&ms)
    }
}

#[derive(Debug)]
pub struct DutyScheduler {
    bounds: CycleBounds,
    cycle_ms: u32,
    ratios: Ratios,
    durations_ms: [u32; 3],

    enabled: bool,
    cycle_start_ms: u32,
    outputs: [bool; 3],
    pulse_start_ms: [Option<u32>; 3],

    flow: FlowTotals,
}

impl DutyScheduler {
    /// `cycle_ms` outside `bounds` is pulled to the nearest bound.
    pub fn new(bounds: CycleBounds, cycle_ms: u32) -> Self {
        Self {
            bounds,
            cycle_ms: cycle_ms.clamp(bounds.min_ms, bounds.max_ms),
            ratios: Ratios::ZERO,
            durations_ms: [0; 3],
            enabled: false,
            cycle_start_ms: 0,
            outputs: [false; 3],
            pulse_start_ms: [None; 3],
            flow: FlowTotals::default(),
        }
    }

    pub fn restore_flow(&mut self, flow: FlowTotals) {
        self.flow = flow;
    }

    /// Clip each ratio to 0–100 and recompute pulse durations.
    pub fn set_ratios(&mut self, ratios: Ratios) {
        let clipped = ratios.0.map(|r| if r.is_nan() { 0.0 } else { r.clamp(0.0, 100.0) });
        self.ratios = Ratios(clipped);
        self.recompute();
        debug!(
            "duty: ratios {:?} -> durations {:?} ms",
            self.ratios.0, self.durations_ms
        );
    }

    /// Rejected outside the bounds, leaving the current length in place.
    pub fn set_cycle_ms(&mut self, ms: u32) -> Result<(), Rejected> {
        if !self.bounds.contains(ms) {
            return Err(Rejected::CycleOutOfRange {
                ms,
                min: self.bounds.min_ms,
                max: self.bounds.max_ms,
            });
        }
        self.cycle_ms = ms;
        self.recompute();
        info!("duty: cycle length {} ms", ms);
        Ok(())
    }

    /// New profile bounds; the current length is pulled inside them.
    pub fn set_bounds(&mut self, bounds: CycleBounds, fallback_ms: u32) {
        self.bounds = bounds;
        if !bounds.contains(self.cycle_ms) {
            self.cycle_ms = fallback_ms.clamp(bounds.min_ms, bounds.max_ms);
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        let scale = self.ratios.0.iter().copied().fold(1.0_f32, f32::max);
        let cycle = self.cycle_ms as f32;
        // Rounded, not truncated: a product that lands just below a whole
        // millisecond in f32 keeps its millisecond.
        self.durations_ms = self.ratios.0.map(|r| (r / scale * cycle).round() as u32);
    }

    /// Start a fresh cycle at `now_ms`.  No-op when already enabled.
    pub fn enable(&mut self, now_ms: u32) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.cycle_start_ms = now_ms;
        self.outputs = [false; 3];
        self.pulse_start_ms = [None; 3];
    }

    /// Force every pump off and book the open pulses into the totals.
    pub fn disable(&mut self, now_ms: u32) {
        for i in 0..3 {
            if let Some(start) = self.pulse_start_ms[i].take() {
                self.flow.add(i, now_ms.wrapping_sub(start));
            }
        }
        self.outputs = [false; 3];
        self.enabled = false;
    }

    /// Advance to `now_ms` and return the pump states.
    pub fn tick(&mut self, now_ms: u32) -> [bool; 3] {
        if !self.enabled {
            return self.outputs;
        }
        if now_ms.wrapping_sub(self.cycle_start_ms) > self.cycle_ms {
            self.cycle_start_ms = now_ms;
        }
        let elapsed = now_ms.wrapping_sub(self.cycle_start_ms);

        for i in 0..3 {
            let on = elapsed < self.durations_ms[i];
            if on && !self.outputs[i] {
                self.pulse_start_ms[i] = Some(now_ms);
            } else if !on && self.outputs[i] {
                if let Some(start) = self.pulse_start_ms[i].take() {
                    self.flow.add(i, now_ms.wrapping_sub(start));
                }
            }
            self.outputs[i] = on;
        }
        self.outputs
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn outputs(&self) -> [bool; 3] {
        self.outputs
    }

    pub fn ratios(&self) -> Ratios {
        self.ratios
    }

    pub fn durations_ms(&self) -> [u32; 3] {
        self.durations_ms
    }

    pub fn cycle_ms(&self) -> u32 {
        self.cycle_ms
    }

    pub fn bounds(&self) -> CycleBounds {
        self.bounds
    }

    pub fn flow(&self) -> FlowTotals {
        self.flow
    }
}
