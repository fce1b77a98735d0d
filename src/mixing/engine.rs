//! Set-point ownership and normalization.

use core::fmt::Write as _;

use log::debug;

use crate::config::DeviceConfig;
use crate::mixing::bottles::BottleRack;
use crate::mixing::{DeviceKind, Liquid, Ratios};

/// Highest sparkling share a pour slot can be set to.
pub const MAX_POUR_PERCENT: i32 = 95;

/// Clockwise distance from boundary `from` to boundary `to`, in 0..360.
pub fn angular_distance(from: i16, to: i16) -> i16 {
    (i32::from(to) - i32::from(from)).rem_euclid(360) as i16
}

/// Zero every distance sitting exactly on the threshold and donate it to
/// the larger of the other two.  Liquids are processed in order; on a tie
/// the later liquid receives the donation.
pub fn apply_dead_zone(distances: &mut [i16; 3], threshold: i16) {
    for i in 0..3 {
        if distances[i] != threshold {
            continue;
        }
        let a = (i + 1) % 3;
        let b = (i + 2) % 3;
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let target = if distances[first] > distances[second] {
            first
        } else {
            second
        };
        distances[target] += distances[i];
        distances[i] = 0;
    }
}

/// Owns the three set-points and derives dispense ratios from them.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioEngine {
    kind: DeviceKind,
    angles: [i16; 3],
    percentages: [u8; 3],
    step_deg: i16,
}

impl RatioEngine {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            kind: config.kind(),
            angles: config.default_angles,
            percentages: config.default_percentages,
            step_deg: config.step_angle_deg,
        }
    }

    /// Back to the profile's default set-point.
    pub fn restore_defaults(&mut self, config: &DeviceConfig) {
        *self = Self::new(config);
        debug!("ratio: defaults restored {:?}", self.angles);
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn angles(&self) -> [i16; 3] {
        self.angles
    }

    pub fn percentages(&self) -> [u8; 3] {
        self.percentages
    }

    pub fn step_deg(&self) -> i16 {
        self.step_deg
    }

    /// Encoder path: `steps` detents on the selected liquid.
    pub fn adjust_selected(&mut self, selector: Liquid, steps: i32) {
        match self.kind {
            DeviceKind::Mixer => {
                self.adjust_angle(selector, steps.saturating_mul(i32::from(self.step_deg)));
            }
            DeviceKind::Pour => {
                if let Some(i) = selector.index() {
                    let p = (i32::from(self.percentages[i]).saturating_add(steps))
                        .clamp(0, MAX_POUR_PERCENT);
                    self.percentages[i] = p as u8;
                }
            }
        }
    }

    /// Move the selected boundary by `degrees`, keeping the other two
    /// fixed.  The move is clamped so no distance drops below one step.
    /// Returns the movement actually applied.
    pub fn adjust_angle(&mut self, selector: Liquid, degrees: i32) -> i32 {
        let Some(i) = selector.index() else {
            return 0;
        };
        let prev = (i + 2) % 3;
        let next = (i + 1) % 3;
        let min = i32::from(self.step_deg);
        let before = i32::from(angular_distance(self.angles[prev], self.angles[i]));
        let after = i32::from(angular_distance(self.angles[i], self.angles[next]));

        let applied = degrees.clamp(-(before - min).max(0), (after - min).max(0));
        self.angles[i] = (i32::from(self.angles[i]) + applied).rem_euclid(360) as i16;
        applied
    }

    /// Raw arc lengths d1 = α1→α2, d2 = α2→α3, d3 = α3→α1.
    pub fn distances(&self) -> [i16; 3] {
        let [a1, a2, a3] = self.angles;
        [
            angular_distance(a1, a2),
            angular_distance(a2, a3),
            angular_distance(a3, a1),
        ]
    }

    /// Set-point as percentages.  Mixer ratios always sum to 100.
    pub fn normalize(&self) -> Ratios {
        match self.kind {
            DeviceKind::Mixer => {
                let mut d = self.distances();
                apply_dead_zone(&mut d, self.step_deg);
                Ratios(d.map(|x| f32::from(x) * 100.0 / 360.0))
            }
            DeviceKind::Pour => Ratios(self.percentages.map(f32::from)),
        }
    }

    /// Per-pump ratios for pouring the `selected` slot.
    ///
    /// With a sparkling bottle in another slot the selected slot's
    /// percentage is the sparkling share: `100 − p` goes to the selected
    /// pump and `p` to the sparkling pump.  Without one the selected
    /// bottle is poured neat.
    pub fn pour_ratios(&self, selected: Liquid, rack: &BottleRack) -> Ratios {
        let Some(i) = selected.index() else {
            return Ratios::ZERO;
        };
        if rack.is_empty_slot(selected) {
            return Ratios::ZERO;
        }
        let mut r = [0.0; 3];
        match rack.sparkling_slot() {
            Some(s) if s != i => {
                let p = f32::from(self.percentages[i]);
                r[i] = 100.0 - p;
                r[s] = p;
            }
            _ => r[i] = 100.0,
        }
        Ratios(r)
    }

    /// What the dispense page feeds the scheduler.
    pub fn dispense_ratios(&self, selected: Liquid, rack: &BottleRack) -> Ratios {
        match self.kind {
            DeviceKind::Mixer => self.normalize(),
            DeviceKind::Pour => self.pour_ratios(selected, rack),
        }
    }

    /// One-line description: `name: p% (angle°), … Sum: s%`.
    pub fn summary<S: AsRef<str>>(&self, names: &[S; 3]) -> String {
        let ratios = self.normalize();
        let mut out = String::new();
        for (i, name) in names.iter().enumerate() {
            let _ = match self.kind {
                DeviceKind::Mixer => write!(
                    out,
                    "{}: {:.2}% ({}°), ",
                    name.as_ref(),
                    ratios.0[i],
                    self.angles[i]
                ),
                DeviceKind::Pour => write!(out, "{}: {:.2}%, ", name.as_ref(), ratios.0[i]),
            };
        }
        let sum = ratios.sum();
        let _ = write!(out, "Sum: {:.2}%", sum);
        if self.kind == DeviceKind::Mixer && (sum - 100.0).abs() > 0.1 {
            out.push_str(" Error: Sum of all percentages must be ~100%");
        }
        out
    }
}
