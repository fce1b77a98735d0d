//! Piezo buzzer on an LEDC channel.
//!
//! Tones are fire-and-forget: `play` starts one and `update` silences it
//! once its duration has elapsed.  A new tone replaces a running one.

use crate::drivers::hw_init;

pub struct Buzzer {
    until_ms: Option<u32>,
}

impl Default for Buzzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buzzer {
    pub fn new() -> Self {
        Self { until_ms: None }
    }

    pub fn play(&mut self, freq_hz: u32, duration_ms: u32, now_ms: u32) {
        hw_init::buzzer_tone(freq_hz);
        self.until_ms = Some(now_ms.wrapping_add(duration_ms));
    }

    /// Call every tick.
    pub fn update(&mut self, now_ms: u32) {
        if let Some(until) = self.until_ms {
            // Signed difference so a wrapped clock still compares correctly.
            if now_ms.wrapping_sub(until) as i32 >= 0 {
                hw_init::buzzer_off();
                self.until_ms = None;
            }
        }
    }

    pub fn is_sounding(&self) -> bool {
        self.until_ms.is_some()
    }
}
