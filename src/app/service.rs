//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the mode machine, its context and the duty-cycle
//! scheduler.  It exposes a hardware-agnostic API; all I/O flows through
//! port traits injected at call sites, making the entire service testable
//! with mock adapters.
//!
//! ```text
//!  InputPort ────▶ ┌──────────────────────────┐ ──▶ EventSink
//!                  │        AppService        │
//!  ActuatorPort ◀──│  FSM · Ratio · Duty      │ ──▶ DisplayPort
//!                  └──────────────────────────┘
//!                    ▲          ▲          ▲
//!             SettingsPort  FlowLogPort  ProfilePort
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{
    DEFAULT_PROFILE, DeviceConfig, EncoderDirection, LedMode, SettingItem, Settings, label,
};
use crate::dispense::{CycleBounds, DutyScheduler, FlowTotals};
use crate::error::Rejected;
use crate::fsm::context::{FsmContext, InputSnapshot, Redraw};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, Mode};
use crate::mixing::bottles::{Bottle, BottleRack};
use crate::mixing::{DeviceKind, Liquid, Ratios};

use super::commands::RemoteCommand;
use super::events::AppEvent;
use super::ports::{
    ActuatorPort, ConfigError, DisplayPort, EventSink, FlowLogPort, InputPort, ProfilePort,
    SettingsPort,
};
use super::remote::RemoteQueue;
use super::view::DisplayView;

fn bounds_of(config: &DeviceConfig) -> CycleBounds {
    CycleBounds {
        min_ms: config.cycle_min_ms,
        max_ms: config.cycle_max_ms,
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    scheduler: DutyScheduler,
    /// Last values pushed to the ports, so unchanged ones are not resent.
    applied_direction: Option<EncoderDirection>,
    applied_led: Option<LedMode>,
    tick_count: u64,
}

impl AppService {
    /// Construct the service.  Stored settings are pulled back inside the
    /// profile's bounds.
    ///
    /// Does **not** start the mode machine; call [`start`](Self::start).
    pub fn new(config: DeviceConfig, mut settings: Settings, flow: FlowTotals) -> Self {
        if settings.sanitize(&config) {
            warn!("settings: stored values adjusted to profile '{}'", settings.profile);
        }
        let mut scheduler = DutyScheduler::new(bounds_of(&config), settings.cycle_ms);
        scheduler.restore_flow(flow);

        Self {
            fsm: Fsm::new(build_state_table(), Mode::Dashboard),
            ctx: FsmContext::new(config, settings),
            scheduler,
            applied_direction: None,
            applied_led: None,
            tick_count: 0,
        }
    }

    /// Boot path: stored settings, the profile they name, stored flow
    /// totals.  Every failure degrades to factory values.
    pub fn load(store: &(impl SettingsPort + FlowLogPort), profiles: &impl ProfilePort) -> Self {
        let stored = match store.load_settings() {
            Ok(s) => Some(s),
            Err(ConfigError::NotFound) => {
                info!("settings: none stored, using factory settings");
                None
            }
            Err(e) => {
                warn!("settings: load failed ({}), using factory settings", e);
                None
            }
        };

        let profile = stored
            .as_ref()
            .map_or_else(|| label(DEFAULT_PROFILE), |s| s.profile.clone());
        let config = profiles.load(&profile).unwrap_or_else(|e| {
            warn!("profile '{}': {}, using built-in defaults", profile, e);
            DeviceConfig::default()
        });
        info!("profile '{}' active ({:?})", profile, config.kind());

        let settings = stored.unwrap_or_else(|| Settings::defaults_for(&config, &profile));

        let flow = match store.load_flow() {
            Ok(f) => f,
            Err(ConfigError::NotFound) => FlowTotals::default(),
            Err(e) => {
                warn!("flow: load failed ({}), starting from zero", e);
                FlowTotals::default()
            }
        };

        Self::new(config, settings, flow)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter the boot mode and push the first full frame.
    pub fn start(
        &mut self,
        now_ms: u32,
        hw: &mut (impl InputPort + ActuatorPort),
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;
        self.ctx.last_input_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}", self.fsm.current_state());

        // Nothing can be dispensing yet, so there is no flow to persist.
        let _ = self.sync_outputs(hw, sink);
        self.flush_display(display);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: poll input → mode machine → requests →
    /// scheduler and actuators → display → settle pause.
    ///
    /// `hw` satisfies input, actuator and delay at once, avoiding a double
    /// mutable borrow while keeping the port boundary explicit.
    pub fn tick<H>(
        &mut self,
        now_ms: u32,
        hw: &mut H,
        display: &mut impl DisplayPort,
        store: &(impl SettingsPort + FlowLogPort),
        profiles: &impl ProfilePort,
        sink: &mut impl EventSink,
    ) where
        H: InputPort + ActuatorPort + DelayNs,
    {
        self.tick_count += 1;
        self.ctx.now_ms = now_ms;
        let prev = self.fsm.current_state();

        // 1. Snapshot input.  Long press first: it cancels the pending short.
        let long_press = hw.poll_long_press(now_ms);
        let input = InputSnapshot {
            rotation: hw.poll_rotation(),
            short_press: hw.poll_short_press(),
            long_press,
        };
        if input.any() {
            self.ctx.last_input_ms = now_ms;
        }
        self.ctx.input = input;

        // 2. Mode machine
        self.fsm.tick(&mut self.ctx);
        self.ctx.input = InputSnapshot::default();

        // 3. Requests raised by the handlers
        let requests = core::mem::take(&mut self.ctx.requests);
        if requests.profile_step != 0 {
            self.step_profile(requests.profile_step, profiles, sink);
        }
        if requests.save_settings {
            self.persist_settings(store, sink);
        }

        let mode = self.fsm.current_state();
        if mode != prev {
            sink.emit(&AppEvent::ModeChanged {
                from: prev,
                to: mode,
            });
        }

        // 4. Scheduler and actuators
        if self.sync_outputs(hw, sink) {
            self.persist_flow(store, sink);
        }

        // 5. Display
        self.flush_display(display);

        // 6. One physical press must not act on the page it opened.
        if mode != prev {
            let settle = self.ctx.config.settle_ms;
            if settle > 0 {
                hw.delay_ms(settle);
            }
            hw.discard_pending();
        }
    }

    /// Stop the pumps and persist the flow totals (before a restart).
    pub fn shutdown(
        &mut self,
        now_ms: u32,
        hw: &mut impl ActuatorPort,
        store: &impl FlowLogPort,
        sink: &mut impl EventSink,
    ) {
        let was_running = self.scheduler.is_enabled();
        self.scheduler.disable(now_ms);
        hw.all_off();
        if was_running {
            self.persist_flow(store, sink);
        }
        info!("AppService shut down");
    }

    // ── Remote operations ─────────────────────────────────────

    /// Move one mixer boundary.  Same effect as turning the encoder.
    pub fn adjust_angle(&mut self, liquid: Liquid, degrees: i32) -> Result<(), Rejected> {
        self.remote_allowed()?;
        if degrees.unsigned_abs() > 360 {
            return Err(Rejected::AngleOutOfRange(degrees));
        }
        if liquid.index().is_none() {
            return Err(Rejected::InvalidLiquid);
        }
        if self.ctx.kind() != DeviceKind::Mixer {
            return Err(Rejected::NotMixerDevice);
        }
        let applied = self.ctx.engine.adjust_angle(liquid, degrees);
        debug!("remote: {:?} moved {}° of {}°", liquid, applied, degrees);
        self.ctx.sync_dispense_ratios();
        self.ctx.touch_values();
        self.apply_ratios();
        Ok(())
    }

    /// New duty-cycle length; persisted with the settings.
    pub fn set_cycle_length(&mut self, ms: u32) -> Result<(), Rejected> {
        self.remote_allowed()?;
        self.scheduler.set_cycle_ms(ms)?;
        self.ctx.settings.cycle_ms = ms;
        self.ctx.requests.save_settings = true;
        self.ctx.touch_values();
        Ok(())
    }

    /// Put a bottle into a slot.  An emptied selection moves on.
    pub fn assign_bottle(&mut self, slot: usize, bottle: Bottle) -> Result<(), Rejected> {
        self.remote_allowed()?;
        if self.ctx.kind() != DeviceKind::Pour {
            return Err(Rejected::NotPourDevice);
        }
        self.ctx.settings.bottles.assign(slot, bottle)?;
        if self.ctx.settings.bottles.is_empty_slot(self.ctx.selected) {
            self.ctx.selected = self.ctx.settings.bottles.next_filled(self.ctx.selected);
        }
        self.ctx.sync_dispense_ratios();
        self.ctx.requests.save_settings = true;
        self.ctx.touch_values();
        self.apply_ratios();
        Ok(())
    }

    /// Apply one queued remote command and push the resulting redraws.
    pub fn handle_command(
        &mut self,
        cmd: RemoteCommand,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Rejected> {
        let before = self.scheduler.ratios();
        let result = match cmd {
            RemoteCommand::AdjustAngle { liquid, degrees } => self.adjust_angle(liquid, degrees),
            RemoteCommand::SetCycleLength(ms) => self.set_cycle_length(ms),
            RemoteCommand::AssignBottle { slot, bottle } => self.assign_bottle(slot, bottle),
        };
        match result {
            Ok(()) => {
                let after = self.scheduler.ratios();
                if after != before {
                    sink.emit(&AppEvent::RatiosApplied(after));
                }
            }
            Err(e) => {
                warn!("remote: {:?} rejected: {}", cmd, e);
                sink.emit(&AppEvent::RemoteRejected(e));
            }
        }
        self.flush_display(display);
        result
    }

    /// Apply everything the network side queued since the last tick.
    /// Returns the number of commands processed.
    pub fn drain_remote(
        &mut self,
        queue: &RemoteQueue,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut n = 0;
        while let Ok(cmd) = queue.try_receive() {
            // Rejections are reported through the sink.
            let _ = self.handle_command(cmd, display, sink);
            n += 1;
        }
        n
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.fsm.current_state()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn view(&self) -> DisplayView<'_> {
        DisplayView::new(&self.ctx, &self.scheduler)
    }

    /// `name: p% (angle°), … Sum: s%` for the active set-point.
    pub fn mixture_summary(&self) -> String {
        self.ctx.engine.summary(&self.ctx.config.liquid_names)
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

    pub fn flow(&self) -> FlowTotals {
        self.scheduler.flow()
    }

    pub fn pump_ratios(&self) -> Ratios {
        self.scheduler.ratios()
    }

    pub fn pump_durations_ms(&self) -> [u32; 3] {
        self.scheduler.durations_ms()
    }

    pub fn is_dispensing(&self) -> bool {
        self.scheduler.is_enabled()
    }

    // ── Internal ──────────────────────────────────────────────

    fn remote_allowed(&self) -> Result<(), Rejected> {
        if self.ctx.settings.remote_access {
            Ok(())
        } else {
            Err(Rejected::RemoteDisabled)
        }
    }

    /// Hand changed ratios to the scheduler.  Returns the applied values.
    fn apply_ratios(&mut self) -> Option<Ratios> {
        if self.ctx.ratios == self.scheduler.ratios() {
            return None;
        }
        self.scheduler.set_ratios(self.ctx.ratios);
        Some(self.scheduler.ratios())
    }

    fn apply_cycle(&mut self) {
        let wanted = self.ctx.settings.cycle_ms;
        if wanted == self.scheduler.cycle_ms() {
            return;
        }
        if let Err(e) = self.scheduler.set_cycle_ms(wanted) {
            warn!("settings: {}", e);
            self.ctx.settings.cycle_ms = self.scheduler.cycle_ms();
        }
    }

    /// Translate the context into port calls.  Returns `true` when
    /// dispensing stopped during this call.
    fn sync_outputs(
        &mut self,
        hw: &mut (impl InputPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> bool {
        let now = self.ctx.now_ms;

        let direction = self.ctx.settings.encoder_direction;
        if self.applied_direction != Some(direction) {
            hw.set_encoder_direction(direction);
            self.applied_direction = Some(direction);
        }

        self.apply_cycle();
        if let Some(r) = self.apply_ratios() {
            sink.emit(&AppEvent::RatiosApplied(r));
        }

        // ── Dispense gate: lever held in a dispensing mode ───
        let wanted = hw.dispense_requested() && self.ctx.mode.dispenses();
        let mut stopped = false;
        if wanted && !self.scheduler.is_enabled() {
            self.scheduler.enable(now);
            info!("duty: dispensing in {}", self.ctx.mode.name());
            sink.emit(&AppEvent::DispenseStarted(self.ctx.mode));
        } else if !wanted && self.scheduler.is_enabled() {
            self.scheduler.disable(now);
            info!("duty: stopped");
            stopped = true;
        }

        hw.set_pumps(self.scheduler.tick(now));
        if self.scheduler.is_enabled() {
            // Pouring counts as activity; no screensaver mid-pour.
            self.ctx.last_input_ms = now;
        }

        // ── Status LED ───────────────────────────────────────
        let led = if self.scheduler.is_enabled() {
            self.ctx.settings.led_dispensing
        } else {
            self.ctx.settings.led_idle
        };
        if self.applied_led != Some(led) {
            hw.set_led_mode(led);
            self.applied_led = Some(led);
        }

        if let Some(beep) = self.ctx.beep.take() {
            hw.beep(beep, now);
        }
        hw.update(now);

        stopped
    }

    fn flush_display(&mut self, display: &mut impl DisplayPort) {
        let pending = core::mem::take(&mut self.ctx.redraw);
        if pending.is_empty() {
            return;
        }
        let view = DisplayView::new(&self.ctx, &self.scheduler);
        for what in pending {
            display.render(what, &view);
        }
    }

    fn step_profile(&mut self, dir: i32, profiles: &impl ProfilePort, sink: &mut impl EventSink) {
        let names = profiles.names();
        if names.is_empty() {
            warn!("profile: no profiles available");
            return;
        }
        let len = names.len() as i32;
        let current = names
            .iter()
            .position(|n| *n == self.ctx.settings.profile)
            .map_or(if dir > 0 { -1 } else { len }, |i| i as i32);
        let name = names[(current + dir.signum()).rem_euclid(len) as usize].clone();

        let config = match profiles.load(&name) {
            Ok(c) => {
                info!("profile: switched to '{}'", name);
                sink.emit(&AppEvent::ProfileLoaded(name.clone()));
                c
            }
            Err(e) => {
                warn!("profile '{}': {}, using built-in defaults", name, e);
                sink.emit(&AppEvent::ProfileFallback(name.clone()));
                DeviceConfig::default()
            }
        };
        self.ctx.settings.profile = name;
        self.apply_config(config);
    }

    /// Make `config` the active profile and restart from its defaults.
    fn apply_config(&mut self, config: DeviceConfig) {
        self.scheduler
            .set_bounds(bounds_of(&config), config.default_cycle_ms);
        self.ctx.engine.restore_defaults(&config);
        self.ctx.settings.bottles =
            BottleRack::from_slots(config.default_bottles).unwrap_or_default();
        self.ctx.config = config;
        self.ctx.settings.sanitize(&self.ctx.config);

        if !self.ctx.setting_cursor.available_on(self.ctx.kind()) {
            self.ctx.setting_cursor = SettingItem::CycleTime;
        }
        self.ctx.selected = Liquid::One;
        self.ctx.sync_dispense_ratios();
        self.ctx.request_redraw(Redraw::Page);
        self.ctx.touch_values();
    }

    fn persist_settings(&self, store: &impl SettingsPort, sink: &mut impl EventSink) {
        match store.save_settings(&self.ctx.settings) {
            Ok(()) => {
                info!("settings: saved");
                sink.emit(&AppEvent::SettingsSaved);
            }
            Err(e) => warn!("settings: save failed: {}", e),
        }
    }

    fn persist_flow(&self, store: &impl FlowLogPort, sink: &mut impl EventSink) {
        let flow = self.scheduler.flow();
        if let Err(e) = store.save_flow(&flow) {
            warn!("flow: save failed: {}", e);
        }
        sink.emit(&AppEvent::DispenseStopped(flow));
    }
}
