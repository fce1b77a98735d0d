//! Status LED pattern engine.
//!
//! Turns the user's [`LedMode`] choice into a brightness value.  The
//! service feeds it the idle or dispensing selector each tick, and the
//! phase restarts whenever the selector changes so a blink always begins
//! with the LED on.
//!
//! | Mode      | Shape                      | Period  |
//! |-----------|----------------------------|---------|
//! | Off       | dark                       | —       |
//! | On        | full                       | —       |
//! | BlinkSlow | on/off square              | 1000 ms |
//! | BlinkFast | on/off square              | 250 ms  |
//! | FadeSlow  | triangular ramp 0→255→0    | 2000 ms |
//! | FadeFast  | triangular ramp 0→255→0    | 500 ms  |

use crate::config::LedMode;

pub struct LedPatternEngine {
    active: Option<LedMode>,
    phase_start_ms: u32,
}

impl Default for LedPatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LedPatternEngine {
    pub fn new() -> Self {
        Self {
            active: None,
            phase_start_ms: 0,
        }
    }

    /// Brightness (0–255) for `mode` at `now_ms`.
    pub fn level(&mut self, mode: LedMode, now_ms: u32) -> u8 {
        if self.active != Some(mode) {
            self.active = Some(mode);
            self.phase_start_ms = now_ms;
        }
        let phase = now_ms.wrapping_sub(self.phase_start_ms);
        match mode {
            LedMode::Off => 0,
            LedMode::On => 255,
            LedMode::BlinkSlow => Self::square(phase, 1000),
            LedMode::BlinkFast => Self::square(phase, 250),
            LedMode::FadeSlow => Self::triangle(phase, 2000),
            LedMode::FadeFast => Self::triangle(phase, 500),
        }
    }

    fn square(phase_ms: u32, period_ms: u32) -> u8 {
        if phase_ms % period_ms < period_ms / 2 {
            255
        } else {
            0
        }
    }

    /// Ramps 0→255→0 over `period_ms`, no libm needed.
    fn triangle(phase_ms: u32, period_ms: u32) -> u8 {
        let pos = u64::from(phase_ms % period_ms);
        let half = u64::from(period_ms) / 2;
        if pos < half {
            ((pos * 255) / half) as u8
        } else {
            (((u64::from(period_ms) - pos) * 255) / half) as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_modes() {
        let mut led = LedPatternEngine::new();
        assert_eq!(led.level(LedMode::Off, 123), 0);
        assert_eq!(led.level(LedMode::On, 456), 255);
    }

    #[test]
    fn blink_starts_on_after_mode_change() {
        let mut led = LedPatternEngine::new();
        assert_eq!(led.level(LedMode::BlinkFast, 10_000), 255);
        assert_eq!(led.level(LedMode::BlinkFast, 10_130), 0);
        assert_eq!(led.level(LedMode::BlinkFast, 10_250), 255);
        // Switching restarts the phase.
        assert_eq!(led.level(LedMode::BlinkSlow, 10_130), 255);
    }

    #[test]
    fn fade_ramps() {
        assert_eq!(LedPatternEngine::triangle(0, 2000), 0);
        assert_eq!(LedPatternEngine::triangle(1000, 2000), 255);
        assert_eq!(LedPatternEngine::triangle(2000, 2000), 0);
    }
}
