//! Read-only view handed to the display collaborator.
//!
//! Every accessor is a plain read with no side effects.  How much of the
//! screen to repaint for a given [`Redraw`](crate::fsm::context::Redraw)
//! is the renderer's concern.

use crate::config::{DeviceConfig, SettingItem, Settings};
use crate::dispense::DutyScheduler;
use crate::fsm::Mode;
use crate::fsm::context::FsmContext;
use crate::mixing::bottles::Bottle;
use crate::mixing::{DeviceKind, Liquid, Ratios};

pub struct DisplayView<'a> {
    ctx: &'a FsmContext,
    scheduler: &'a DutyScheduler,
}

impl<'a> DisplayView<'a> {
    pub(crate) fn new(ctx: &'a FsmContext, scheduler: &'a DutyScheduler) -> Self {
        Self { ctx, scheduler }
    }

    pub fn mode(&self) -> Mode {
        self.ctx.mode
    }

    pub fn kind(&self) -> DeviceKind {
        self.ctx.kind()
    }

    pub fn menu_cursor(&self) -> Mode {
        self.ctx.menu_cursor
    }

    /// Entries the menu page shows, in cursor order.
    pub fn menu_entries(&self) -> [Mode; 4] {
        self.ctx.menu_entries()
    }

    pub fn selected(&self) -> Liquid {
        self.ctx.selected
    }

    pub fn cleaning(&self) -> Liquid {
        self.ctx.cleaning
    }

    pub fn setting_cursor(&self) -> SettingItem {
        self.ctx.setting_cursor
    }

    pub fn bottles(&self) -> [Bottle; 3] {
        self.ctx.settings.bottles.slots()
    }

    /// Set-point as percentages (mixer blend or pour sparkling shares).
    pub fn set_point(&self) -> Ratios {
        self.ctx.engine.normalize()
    }

    pub fn angles(&self) -> [i16; 3] {
        self.ctx.engine.angles()
    }

    pub fn percentages(&self) -> [u8; 3] {
        self.ctx.engine.percentages()
    }

    /// Ratios currently driving the pumps.
    pub fn pump_ratios(&self) -> Ratios {
        self.scheduler.ratios()
    }

    pub fn cycle_ms(&self) -> u32 {
        self.scheduler.cycle_ms()
    }

    pub fn remote_access(&self) -> bool {
        self.ctx.settings.remote_access
    }

    pub fn dispensing(&self) -> bool {
        self.scheduler.is_enabled()
    }

    /// Delivered volume per liquid in ml.
    pub fn flow_ml(&self) -> [f32; 3] {
        let flow = self.scheduler.flow();
        let rate = self.ctx.config.flow_ml_per_min;
        [0, 1, 2].map(|i| flow.millilitres(i, rate))
    }

    pub fn change_counter(&self) -> u16 {
        self.ctx.change_counter
    }

    pub fn settings(&self) -> &Settings {
        &self.ctx.settings
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.ctx.config
    }
}
