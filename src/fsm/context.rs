//! Shared mutable context threaded through every mode handler.
//!
//! `FsmContext` is the blackboard the handlers read from and write to:
//! the polled input snapshot, the active profile and settings, the ratio
//! engine, cursors, and the requests the service applies after each tick
//! (pump ratios, beeps, redraws, persistence).

use crate::config::{DeviceConfig, SettingItem, Settings};
use crate::fsm::Mode;
use crate::mixing::{DeviceKind, Liquid, RatioEngine, Ratios};

// ---------------------------------------------------------------------------
// Input snapshot (written by the service before each tick)
// ---------------------------------------------------------------------------

/// Everything the input source reported since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub rotation: i32,
    pub short_press: bool,
    pub long_press: bool,
}

impl InputSnapshot {
    pub fn rotate(steps: i32) -> Self {
        Self {
            rotation: steps,
            ..Self::default()
        }
    }

    pub fn short() -> Self {
        Self {
            short_press: true,
            ..Self::default()
        }
    }

    pub fn long() -> Self {
        Self {
            long_press: true,
            ..Self::default()
        }
    }

    pub fn any(&self) -> bool {
        self.rotation != 0 || self.short_press || self.long_press
    }
}

// ---------------------------------------------------------------------------
// Outputs (written by handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Acoustic feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beep {
    /// Cursor moved or value stepped.
    Click,
    /// Page opened from the menu, or back to the menu.
    Confirm,
    /// Defaults restored.
    Long,
}

impl Beep {
    pub fn freq_hz(self) -> u32 {
        match self {
            Self::Click => 500,
            Self::Confirm | Self::Long => 800,
        }
    }

    pub fn duration_ms(self) -> u32 {
        match self {
            Self::Long => 500,
            Self::Click | Self::Confirm => 40,
        }
    }
}

/// What the display collaborator should refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    /// Whole page for the current mode.
    Page,
    /// Ratios, selected liquid or bottles changed.
    Values,
    MenuCursor,
    Settings,
    /// Screensaver animation frame.
    Screensaver,
}

/// One-shot requests the service honours after the tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requests {
    pub save_settings: bool,
    /// Switch profile by this many entries (sign only).
    pub profile_step: i32,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    pub now_ms: u32,
    pub mode_entered_ms: u32,
    /// Last time the user touched anything (or the pumps ran).
    pub last_input_ms: u32,

    // -- Input --
    pub input: InputSnapshot,

    // -- Configuration --
    pub config: DeviceConfig,
    pub settings: Settings,

    // -- Set-point --
    pub engine: RatioEngine,

    // -- Cursors --
    /// Mirrors the engine's current mode.
    pub mode: Mode,
    pub menu_cursor: Mode,
    /// Where the screensaver returns to.
    pub resume_mode: Mode,
    pub selected: Liquid,
    pub cleaning: Liquid,
    pub setting_cursor: SettingItem,

    // -- Outputs --
    /// Pump ratios requested by the current mode.
    pub ratios: Ratios,
    pub beep: Option<Beep>,
    pub redraw: heapless::Vec<Redraw, 4>,
    pub requests: Requests,
    /// Bumped on every value change the remote side should pick up.
    pub change_counter: u16,
}

impl FsmContext {
    pub fn new(config: DeviceConfig, settings: Settings) -> Self {
        Self {
            now_ms: 0,
            mode_entered_ms: 0,
            last_input_ms: 0,
            input: InputSnapshot::default(),
            engine: RatioEngine::new(&config),
            config,
            settings,
            mode: Mode::Dashboard,
            menu_cursor: Mode::Dashboard,
            resume_mode: Mode::Dashboard,
            selected: Liquid::One,
            cleaning: Liquid::All,
            setting_cursor: SettingItem::CycleTime,
            ratios: Ratios::ZERO,
            beep: None,
            redraw: heapless::Vec::new(),
            requests: Requests::default(),
            change_counter: 0,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.config.kind()
    }

    /// Menu entries in cursor order.  Pour devices offer Pour where mixers
    /// offer Reset.
    pub fn menu_entries(&self) -> [Mode; 4] {
        match self.kind() {
            DeviceKind::Mixer => [Mode::Dashboard, Mode::Cleaning, Mode::Reset, Mode::Settings],
            DeviceKind::Pour => [Mode::Dashboard, Mode::Cleaning, Mode::Pour, Mode::Settings],
        }
    }

    /// Ratios the dispense pages hand to the scheduler right now.
    pub fn dispense_ratios(&self) -> Ratios {
        self.engine
            .dispense_ratios(self.selected, &self.settings.bottles)
    }

    /// Re-derive pump ratios if the current mode dispenses the set-point.
    pub fn sync_dispense_ratios(&mut self) {
        if matches!(self.mode, Mode::Dashboard | Mode::Pour) {
            self.ratios = self.dispense_ratios();
        }
    }

    /// Queue a redraw.  A pending full page supersedes everything else.
    pub fn request_redraw(&mut self, what: Redraw) {
        if self.redraw.contains(&Redraw::Page) || self.redraw.contains(&what) {
            return;
        }
        if what == Redraw::Page {
            self.redraw.clear();
        }
        // Full queue: the pending entries already cover a redraw.
        let _ = self.redraw.push(what);
    }

    /// A displayed value changed.
    pub fn touch_values(&mut self) {
        self.change_counter = self.change_counter.wrapping_add(1);
        self.request_redraw(Redraw::Values);
    }

    /// No input for longer than the screensaver timeout.
    pub fn idle_expired(&self) -> bool {
        self.settings
            .screensaver
            .timeout_ms()
            .is_some_and(|t| self.now_ms.wrapping_sub(self.last_input_ms) > t)
    }

    pub fn ms_in_mode(&self) -> u32 {
        self.now_ms.wrapping_sub(self.mode_entered_ms)
    }
}
