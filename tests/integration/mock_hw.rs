//! Mock adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/LEDC registers.  Input is scripted:
//! a test queues rotation or presses, and the next `tick` consumes them.

use std::cell::{Cell, RefCell};

use cocktailcube::app::events::AppEvent;
use cocktailcube::app::ports::{
    ActuatorPort, ConfigError, DisplayPort, EventSink, FlowLogPort, InputPort, SettingsPort,
};
use cocktailcube::app::view::DisplayView;
use cocktailcube::config::{EncoderDirection, LedMode, Settings};
use cocktailcube::dispense::FlowTotals;
use cocktailcube::fsm::Mode;
use cocktailcube::fsm::context::{Beep, Redraw};
use embedded_hal::delay::DelayNs;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    SetLed(LedMode),
    Beep(Beep),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    // Scripted input
    pub rotation: i32,
    pub short_press: bool,
    pub long_press: bool,
    pub lever: bool,

    // Recorded output
    pub calls: Vec<ActuatorCall>,
    pub pumps: [bool; 3],
    pub pump_writes: usize,
    pub direction: Option<EncoderDirection>,
    pub delayed_ns: u64,
    pub discards: usize,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotate(&mut self, steps: i32) {
        self.rotation += steps;
    }

    pub fn press(&mut self) {
        self.short_press = true;
    }

    pub fn hold(&mut self) {
        self.long_press = true;
    }

    pub fn delayed_ms(&self) -> u64 {
        self.delayed_ns / 1_000_000
    }

    pub fn beeps(&self) -> Vec<Beep> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Beep(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn last_led(&self) -> Option<LedMode> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::SetLed(m) => Some(*m),
            _ => None,
        })
    }
}

impl InputPort for MockHardware {
    fn poll_rotation(&mut self) -> i32 {
        core::mem::take(&mut self.rotation)
    }

    fn poll_short_press(&mut self) -> bool {
        core::mem::take(&mut self.short_press)
    }

    fn poll_long_press(&mut self, _now_ms: u32) -> bool {
        core::mem::take(&mut self.long_press)
    }

    fn dispense_requested(&self) -> bool {
        self.lever
    }

    fn set_encoder_direction(&mut self, direction: EncoderDirection) {
        self.direction = Some(direction);
    }

    fn discard_pending(&mut self) {
        self.rotation = 0;
        self.short_press = false;
        self.long_press = false;
        self.discards += 1;
    }
}

impl ActuatorPort for MockHardware {
    fn set_pumps(&mut self, on: [bool; 3]) {
        self.pumps = on;
        self.pump_writes += 1;
    }

    fn set_led_mode(&mut self, mode: LedMode) {
        self.calls.push(ActuatorCall::SetLed(mode));
    }

    fn beep(&mut self, beep: Beep, _now_ms: u32) {
        self.calls.push(ActuatorCall::Beep(beep));
    }

    fn all_off(&mut self) {
        self.pumps = [false; 3];
        self.calls.push(ActuatorCall::AllOff);
    }
}

impl DelayNs for MockHardware {
    fn delay_ns(&mut self, ns: u32) {
        self.delayed_ns += u64::from(ns);
    }
}

// ── MockDisplay ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockDisplay {
    pub frames: Vec<(Redraw, Mode)>,
}

#[allow(dead_code)]
impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> Vec<Mode> {
        self.frames
            .iter()
            .filter(|(r, _)| *r == Redraw::Page)
            .map(|(_, m)| *m)
            .collect()
    }
}

impl DisplayPort for MockDisplay {
    fn render(&mut self, what: Redraw, view: &DisplayView<'_>) {
        self.frames.push((what, view.mode()));
    }
}

// ── MockStore ─────────────────────────────────────────────────

/// Settings and flow store backed by `RefCell`s; the ports take `&self`.
#[derive(Default)]
pub struct MockStore {
    pub settings: RefCell<Option<Settings>>,
    pub flow: RefCell<Option<FlowTotals>>,
    pub settings_saves: Cell<usize>,
    pub flow_saves: Cell<usize>,
    /// Every load fails with this error when set.
    pub load_error: Cell<Option<ConfigError>>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::new();
        *store.settings.borrow_mut() = Some(settings);
        store
    }
}

impl SettingsPort for MockStore {
    fn load_settings(&self) -> Result<Settings, ConfigError> {
        if let Some(e) = self.load_error.get() {
            return Err(e);
        }
        self.settings.borrow().clone().ok_or(ConfigError::NotFound)
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), ConfigError> {
        *self.settings.borrow_mut() = Some(settings.clone());
        self.settings_saves.set(self.settings_saves.get() + 1);
        Ok(())
    }
}

impl FlowLogPort for MockStore {
    fn load_flow(&self) -> Result<FlowTotals, ConfigError> {
        if let Some(e) = self.load_error.get() {
            return Err(e);
        }
        (*self.flow.borrow()).ok_or(ConfigError::NotFound)
    }

    fn save_flow(&self, flow: &FlowTotals) -> Result<(), ConfigError> {
        *self.flow.borrow_mut() = Some(*flow);
        self.flow_saves.set(self.flow_saves.get() + 1);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
