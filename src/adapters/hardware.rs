//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the pump bank, LED pattern engine and buzzer, and reads the input
//! latch the GPIO interrupts write into, exposing them through
//! [`InputPort`], [`ActuatorPort`] and `DelayNs`.  On non-espidf targets
//! the LEDC calls underneath are simulation stubs.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::{ActuatorPort, InputPort};
use crate::config::{EncoderDirection, LedMode};
use crate::drivers::buzzer::Buzzer;
use crate::drivers::hw_init::{self, LEDC_CH_LED};
use crate::drivers::input::InputLatch;
use crate::drivers::led::LedPatternEngine;
use crate::drivers::pump::PumpBank;
use crate::fsm::context::Beep;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<'a, P: OutputPin> {
    input: &'a InputLatch,
    pumps: PumpBank<P>,
    led: LedPatternEngine,
    led_mode: LedMode,
    buzzer: Buzzer,
}

impl<'a, P: OutputPin> HardwareAdapter<'a, P> {
    pub fn new(input: &'a InputLatch, pumps: PumpBank<P>) -> Self {
        Self {
            input,
            pumps,
            led: LedPatternEngine::new(),
            led_mode: LedMode::Off,
            buzzer: Buzzer::new(),
        }
    }

    pub fn pump_state(&self) -> [bool; 3] {
        self.pumps.state()
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<P: OutputPin> InputPort for HardwareAdapter<'_, P> {
    fn poll_rotation(&mut self) -> i32 {
        self.input.take_rotation()
    }

    fn poll_short_press(&mut self) -> bool {
        self.input.take_short_press()
    }

    fn poll_long_press(&mut self, now_ms: u32) -> bool {
        self.input.take_long_press(now_ms)
    }

    fn dispense_requested(&self) -> bool {
        self.input.dispense_held()
    }

    fn set_encoder_direction(&mut self, direction: EncoderDirection) {
        self.input.set_direction(direction);
    }

    fn discard_pending(&mut self) {
        self.input.discard();
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: OutputPin> ActuatorPort for HardwareAdapter<'_, P> {
    fn set_pumps(&mut self, on: [bool; 3]) {
        if let Err(e) = self.pumps.set(on) {
            warn!("pumps: GPIO write failed: {:?}", e);
        }
    }

    fn set_led_mode(&mut self, mode: LedMode) {
        self.led_mode = mode;
    }

    fn beep(&mut self, beep: Beep, now_ms: u32) {
        self.buzzer.play(beep.freq_hz(), beep.duration_ms(), now_ms);
    }

    fn update(&mut self, now_ms: u32) {
        hw_init::ledc_set(LEDC_CH_LED, self.led.level(self.led_mode, now_ms));
        self.buzzer.update(now_ms);
    }

    fn all_off(&mut self) {
        if let Err(e) = self.pumps.all_off() {
            warn!("pumps: GPIO write failed during shutdown: {:?}", e);
        }
        self.led_mode = LedMode::Off;
        hw_init::ledc_set(LEDC_CH_LED, 0);
        hw_init::buzzer_off();
    }
}

// ── Settle pause ──────────────────────────────────────────────

impl<P: OutputPin> DelayNs for HardwareAdapter<'_, P> {
    fn delay_ns(&mut self, ns: u32) {
        // Blocks only the control task; FreeRTOS keeps scheduling others.
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
