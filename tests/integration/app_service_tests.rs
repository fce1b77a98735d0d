//! AppService → mode machine → scheduler → actuators, against mocks.

use cocktailcube::adapters::profiles::JsonProfileStore;
use cocktailcube::app::commands::RemoteCommand;
use cocktailcube::app::events::AppEvent;
use cocktailcube::app::service::AppService;
use cocktailcube::config::{
    DeviceConfig, EncoderDirection, LedMode, ScreensaverTimeout, Settings, label,
};
use cocktailcube::error::Rejected;
use cocktailcube::fsm::Mode;
use cocktailcube::fsm::context::Beep;
use cocktailcube::mixing::bottles::Bottle;
use cocktailcube::mixing::{DeviceKind, Liquid};

use crate::mock_hw::{ActuatorCall, MockDisplay, MockHardware, MockStore, RecordingSink};

const TICK_MS: u32 = 10;

struct Rig {
    app: AppService,
    hw: MockHardware,
    display: MockDisplay,
    store: MockStore,
    profiles: JsonProfileStore,
    sink: RecordingSink,
    now: u32,
}

impl Rig {
    fn boot(store: MockStore) -> Self {
        Self::boot_with(store, JsonProfileStore::builtin())
    }

    fn boot_with(store: MockStore, profiles: JsonProfileStore) -> Self {
        let mut app = AppService::load(&store, &profiles);
        let mut hw = MockHardware::new();
        let mut display = MockDisplay::new();
        let mut sink = RecordingSink::new();
        app.start(0, &mut hw, &mut display, &mut sink);
        Self {
            app,
            hw,
            display,
            store,
            profiles,
            sink,
            now: 0,
        }
    }

    fn remote_enabled() -> Self {
        let settings = Settings {
            remote_access: true,
            ..Settings::default()
        };
        Self::boot(MockStore::with_settings(settings))
    }

    fn tick(&mut self) {
        self.now += TICK_MS;
        self.app.tick(
            self.now,
            &mut self.hw,
            &mut self.display,
            &self.store,
            &self.profiles,
            &mut self.sink,
        );
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    fn rotate(&mut self, steps: i32) {
        self.hw.rotate(steps);
        self.tick();
    }

    fn press(&mut self) {
        self.hw.press();
        self.tick();
    }

    fn hold(&mut self) {
        self.hw.hold();
        self.tick();
    }

    fn command(&mut self, cmd: RemoteCommand) -> Result<(), Rejected> {
        self.app
            .handle_command(cmd, &mut self.display, &mut self.sink)
    }

    /// Dashboard → Menu → Settings.
    fn open_settings(&mut self) {
        self.hold();
        // Turning right walks the menu backwards: Dashboard → Settings.
        self.rotate(1);
        self.press();
        assert_eq!(self.app.mode(), Mode::Settings);
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn first_boot_uses_factory_mixer_settings() {
    let rig = Rig::boot(MockStore::new());

    assert_eq!(rig.app.mode(), Mode::Dashboard);
    assert_eq!(rig.sink.events[0], AppEvent::Started(Mode::Dashboard));
    assert_eq!(rig.app.config().kind(), DeviceKind::Mixer);
    assert_eq!(rig.app.settings().profile.as_str(), "cocktailcube");
    assert!(!rig.app.settings().remote_access);

    // Three equal arcs: every pump runs the whole cycle.
    assert_eq!(rig.app.pump_durations_ms(), [500, 500, 500]);
    assert_eq!(rig.hw.pumps, [false; 3]);
    assert_eq!(rig.hw.direction, Some(EncoderDirection::Normal));
    assert_eq!(rig.hw.last_led(), Some(LedMode::FadeSlow));
    assert_eq!(rig.display.pages(), [Mode::Dashboard]);
}

#[test]
fn corrupted_store_falls_back_to_factory_settings() {
    let store = MockStore::new();
    store
        .load_error
        .set(Some(cocktailcube::app::ports::ConfigError::Corrupted));
    let rig = Rig::boot(store);

    let profiles = JsonProfileStore::builtin();
    let config = cocktailcube::app::ports::ProfilePort::load(&profiles, "cocktailcube").unwrap();
    assert_eq!(
        rig.app.settings(),
        &Settings::defaults_for(&config, "cocktailcube")
    );
    assert_eq!(rig.app.flow().on_time_ms(), [0; 3]);
}

#[test]
fn unknown_stored_profile_runs_on_builtin_defaults() {
    let settings = Settings {
        profile: label("ghost"),
        ..Settings::default()
    };
    let rig = Rig::boot(MockStore::with_settings(settings));
    assert_eq!(rig.app.config(), &DeviceConfig::default());
    assert_eq!(rig.app.settings().profile.as_str(), "ghost");
}

#[test]
fn stored_encoder_direction_is_applied_at_start() {
    let settings = Settings {
        encoder_direction: EncoderDirection::Inverted,
        ..Settings::default()
    };
    let rig = Rig::boot(MockStore::with_settings(settings));
    assert_eq!(rig.hw.direction, Some(EncoderDirection::Inverted));
}

// ── Navigation ────────────────────────────────────────────────

#[test]
fn long_press_opens_menu_and_settles_input() {
    let mut rig = Rig::boot(MockStore::new());
    rig.hold();

    assert_eq!(rig.app.mode(), Mode::Menu);
    assert!(rig.sink.events.contains(&AppEvent::ModeChanged {
        from: Mode::Dashboard,
        to: Mode::Menu,
    }));
    assert_eq!(rig.hw.beeps(), [Beep::Confirm]);
    assert_eq!(rig.hw.delayed_ms(), 500);
    assert_eq!(rig.hw.discards, 1);
    assert_eq!(rig.app.view().menu_cursor(), Mode::Dashboard);
}

#[test]
fn plain_ticks_never_pause() {
    let mut rig = Rig::boot(MockStore::new());
    rig.ticks(20);
    assert_eq!(rig.hw.delayed_ns, 0);
    assert_eq!(rig.hw.discards, 0);
    assert_eq!(rig.app.tick_count(), 20);
}

#[test]
fn reset_page_restores_defaults_then_returns() {
    let mut rig = Rig::boot(MockStore::new());
    rig.rotate(5);
    assert_eq!(rig.app.view().angles(), [15, 120, 240]);

    rig.hold();
    rig.rotate(1); // Settings
    rig.rotate(1); // Reset
    rig.press();
    assert_eq!(rig.app.mode(), Mode::Reset);
    assert_eq!(rig.app.view().angles(), [0, 120, 240]);

    // Reset pause is 2 s in the cocktailcube profile.
    rig.ticks(150);
    assert_eq!(rig.app.mode(), Mode::Reset);
    rig.ticks(60);
    assert_eq!(rig.app.mode(), Mode::Dashboard);
}

#[test]
fn screensaver_starts_when_idle_and_wakes_on_input() {
    let settings = Settings {
        screensaver: ScreensaverTimeout::Sec2,
        ..Settings::default()
    };
    let mut rig = Rig::boot(MockStore::with_settings(settings));

    rig.ticks(195);
    assert_eq!(rig.app.mode(), Mode::Dashboard);
    rig.ticks(10);
    assert_eq!(rig.app.mode(), Mode::Screensaver);

    rig.rotate(1);
    assert_eq!(rig.app.mode(), Mode::Dashboard);
    // The waking turn does not move the mixture.
    assert_eq!(rig.app.view().angles(), [0, 120, 240]);
}

// ── Dispensing ────────────────────────────────────────────────

#[test]
fn lever_runs_pumps_and_flow_is_persisted_on_release() {
    let mut rig = Rig::boot(MockStore::new());
    rig.hw.lever = true;
    rig.tick(); // enabled at t = 10
    assert!(rig.app.is_dispensing());
    assert_eq!(rig.hw.pumps, [true; 3]);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::DispenseStarted(Mode::Dashboard)));
    assert_eq!(rig.hw.last_led(), Some(LedMode::BlinkFast));

    rig.ticks(20); // t = 210
    rig.hw.lever = false;
    rig.tick(); // released at t = 220

    assert!(!rig.app.is_dispensing());
    assert_eq!(rig.hw.pumps, [false; 3]);
    assert_eq!(rig.app.flow().on_time_ms(), [210; 3]);
    assert_eq!(rig.store.flow_saves.get(), 1);
    let stored = *rig.store.flow.borrow();
    assert_eq!(stored.map(|f| f.on_time_ms()), Some([210; 3]));
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::DispenseStopped(rig.app.flow())));
    assert_eq!(rig.hw.last_led(), Some(LedMode::FadeSlow));
}

#[test]
fn lever_is_ignored_outside_dispensing_modes() {
    let mut rig = Rig::boot(MockStore::new());
    rig.hold();
    rig.hw.lever = true;
    rig.ticks(5);
    assert_eq!(rig.app.mode(), Mode::Menu);
    assert!(!rig.app.is_dispensing());
    assert_eq!(rig.hw.pumps, [false; 3]);
}

#[test]
fn leaving_dashboard_mid_pour_stops_the_pumps() {
    let mut rig = Rig::boot(MockStore::new());
    rig.hw.lever = true;
    rig.ticks(3);
    assert!(rig.app.is_dispensing());

    rig.hold();
    assert_eq!(rig.app.mode(), Mode::Menu);
    assert!(!rig.app.is_dispensing());
    assert_eq!(rig.hw.pumps, [false; 3]);
    assert_eq!(rig.store.flow_saves.get(), 1);
}

#[test]
fn cleaning_runs_every_pump_by_default() {
    let mut rig = Rig::boot(MockStore::new());
    rig.hold();
    rig.rotate(-1);
    rig.press();
    assert_eq!(rig.app.mode(), Mode::Cleaning);
    assert_eq!(rig.app.view().cleaning(), Liquid::All);

    rig.hw.lever = true;
    rig.tick();
    assert_eq!(rig.hw.pumps, [true; 3]);

    rig.hw.lever = false;
    rig.tick();
    rig.press(); // All → One
    assert_eq!(rig.app.view().cleaning(), Liquid::One);
    assert_eq!(rig.app.pump_durations_ms(), [500, 0, 0]);
}

#[test]
fn shutdown_mid_pour_persists_flow() {
    let mut rig = Rig::boot(MockStore::new());
    rig.hw.lever = true;
    rig.ticks(11); // t = 10..=110
    rig.app
        .shutdown(rig.now + TICK_MS, &mut rig.hw, &rig.store, &mut rig.sink);

    assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!(rig.app.flow().on_time_ms(), [110; 3]);
    assert_eq!(rig.store.flow_saves.get(), 1);
}

// ── Remote operations ─────────────────────────────────────────

#[test]
fn remote_is_refused_while_disabled() {
    let mut rig = Rig::boot(MockStore::new());
    let result = rig.command(RemoteCommand::AdjustAngle {
        liquid: Liquid::One,
        degrees: 30,
    });
    assert_eq!(result, Err(Rejected::RemoteDisabled));
    assert_eq!(
        rig.sink.events.last(),
        Some(&AppEvent::RemoteRejected(Rejected::RemoteDisabled))
    );
    assert_eq!(rig.app.view().angles(), [0, 120, 240]);
}

#[test]
fn remote_angle_moves_one_boundary() {
    let mut rig = Rig::remote_enabled();
    let before = rig.app.change_counter();

    rig.command(RemoteCommand::AdjustAngle {
        liquid: Liquid::Two,
        degrees: 60,
    })
    .unwrap();

    assert_eq!(rig.app.view().angles(), [0, 180, 240]);
    // Arcs 180/60/120 → 50 % / 16.7 % / 33.3 %, scaled to the 500 ms cycle.
    assert_eq!(rig.app.pump_durations_ms(), [500, 167, 333]);
    assert!(rig.app.change_counter() > before);
    assert!(matches!(
        rig.sink.events.last(),
        Some(AppEvent::RatiosApplied(_))
    ));
}

#[test]
fn remote_angle_validation() {
    let mut rig = Rig::remote_enabled();
    assert_eq!(
        rig.app.adjust_angle(Liquid::One, 400),
        Err(Rejected::AngleOutOfRange(400))
    );
    assert_eq!(
        rig.app.adjust_angle(Liquid::All, 10),
        Err(Rejected::InvalidLiquid)
    );
    assert_eq!(rig.app.view().angles(), [0, 120, 240]);
}

#[test]
fn remote_cycle_length_is_bounded_and_saved() {
    let mut rig = Rig::remote_enabled();
    assert_eq!(
        rig.app.set_cycle_length(1200),
        Err(Rejected::CycleOutOfRange {
            ms: 1200,
            min: 200,
            max: 1000,
        })
    );
    assert_eq!(rig.app.settings().cycle_ms, 500);

    rig.app.set_cycle_length(800).unwrap();
    assert_eq!(rig.app.pump_durations_ms(), [800, 800, 800]);
    assert_eq!(rig.store.settings_saves.get(), 0);

    rig.tick();
    assert_eq!(rig.store.settings_saves.get(), 1);
    assert_eq!(
        rig.store.settings.borrow().as_ref().map(|s| s.cycle_ms),
        Some(800)
    );
}

#[test]
fn bottle_assignment_needs_a_pour_device() {
    let mut rig = Rig::remote_enabled();
    assert_eq!(
        rig.app.assign_bottle(0, Bottle::Sparkling),
        Err(Rejected::NotPourDevice)
    );
}

#[test]
fn angle_adjustment_needs_a_mixer_device() {
    let mut rig = Rig::remote_enabled();
    rig.open_settings();
    rig.press();
    rig.press();
    rig.rotate(1); // winebar
    rig.hold();
    assert_eq!(rig.app.config().kind(), DeviceKind::Pour);

    let angles = rig.app.view().angles();
    let percentages = rig.app.view().percentages();
    let changes = rig.app.change_counter();
    assert_eq!(
        rig.command(RemoteCommand::AdjustAngle {
            liquid: Liquid::One,
            degrees: 30,
        }),
        Err(Rejected::NotMixerDevice)
    );
    assert_eq!(rig.app.view().angles(), angles);
    assert_eq!(rig.app.view().percentages(), percentages);
    assert_eq!(rig.app.change_counter(), changes);
}

// ── Settings page and profiles ────────────────────────────────

#[test]
fn leaving_settings_saves_them() {
    let mut rig = Rig::boot(MockStore::new());
    rig.open_settings();

    rig.press(); // CycleTime → RemoteAccess
    rig.rotate(1);
    assert!(rig.app.settings().remote_access);
    assert_eq!(rig.store.settings_saves.get(), 0);

    rig.hold();
    assert_eq!(rig.app.mode(), Mode::Menu);
    assert_eq!(rig.store.settings_saves.get(), 1);
    assert!(rig.sink.events.contains(&AppEvent::SettingsSaved));
    assert_eq!(
        rig.store.settings.borrow().as_ref().map(|s| s.remote_access),
        Some(true)
    );
}

#[test]
fn profile_switch_turns_the_mixer_into_a_pour_device() {
    let mut rig = Rig::boot(MockStore::new());
    rig.open_settings();
    rig.press(); // RemoteAccess
    rig.press(); // Profile
    rig.rotate(1);

    assert!(rig
        .sink
        .events
        .contains(&AppEvent::ProfileLoaded(label("winebar"))));
    assert_eq!(rig.app.config().kind(), DeviceKind::Pour);
    assert_eq!(rig.app.settings().profile.as_str(), "winebar");
    assert_eq!(
        rig.app.settings().bottles.slots(),
        [Bottle::RedWine, Bottle::Sparkling, Bottle::WhiteWine]
    );

    rig.hold();
    assert_eq!(rig.app.view().menu_entries()[2], Mode::Pour);

    // The saved profile is picked up again on the next boot.
    let store = std::mem::take(&mut rig.store);
    let rebooted = Rig::boot(store);
    assert_eq!(rebooted.app.config().kind(), DeviceKind::Pour);
    assert_eq!(rebooted.app.config().mixer_name.as_str(), "WineBar");
}

#[test]
fn broken_profile_falls_back_to_builtin_defaults() {
    let mut profiles = JsonProfileStore::builtin();
    profiles.insert("broken", "{ not json");
    let mut rig = Rig::boot_with(MockStore::new(), profiles);

    rig.open_settings();
    rig.press();
    rig.press();
    // Backwards from the first profile wraps to the last one.
    rig.rotate(-1);

    assert!(rig
        .sink
        .events
        .contains(&AppEvent::ProfileFallback(label("broken"))));
    assert_eq!(rig.app.config(), &DeviceConfig::default());
    assert_eq!(rig.app.settings().profile.as_str(), "broken");
}

#[test]
fn pour_device_mixes_in_the_sparkling_share() {
    let mut rig = Rig::boot(MockStore::new());
    rig.open_settings();
    rig.press();
    rig.press();
    rig.rotate(1); // winebar
    rig.hold(); // Menu, cursor on Settings
    rig.rotate(1); // Pour
    rig.press();
    assert_eq!(rig.app.mode(), Mode::Pour);
    assert_eq!(rig.app.view().selected(), Liquid::One);

    // Red wine neat, then half sparkling.
    assert_eq!(rig.app.pump_ratios().0, [100.0, 0.0, 0.0]);
    rig.rotate(50);
    assert_eq!(rig.app.pump_ratios().0, [50.0, 50.0, 0.0]);
    let cycle = rig.app.settings().cycle_ms;
    assert_eq!(rig.app.pump_durations_ms(), [cycle, cycle, 0]);

    // Next filled slot is the sparkling bottle itself, poured neat.
    rig.press();
    assert_eq!(rig.app.view().selected(), Liquid::Two);
    assert_eq!(rig.app.pump_ratios().0, [0.0, 100.0, 0.0]);
}

#[test]
fn remote_bottle_assignment_on_pour_device() {
    let mut rig = Rig::remote_enabled();
    rig.open_settings();
    rig.press();
    rig.press();
    rig.rotate(1); // winebar
    rig.hold();

    assert_eq!(
        rig.command(RemoteCommand::AssignBottle {
            slot: 0,
            bottle: Bottle::Sparkling,
        }),
        Err(Rejected::SparklingTaken)
    );
    assert_eq!(
        rig.command(RemoteCommand::AssignBottle {
            slot: 3,
            bottle: Bottle::RedWine,
        }),
        Err(Rejected::InvalidSlot(3))
    );

    let saves = rig.store.settings_saves.get();
    rig.command(RemoteCommand::AssignBottle {
        slot: 0,
        bottle: Bottle::Empty,
    })
    .unwrap();
    // The emptied selection moves on to the next filled slot.
    assert_eq!(rig.app.view().selected(), Liquid::Two);
    rig.tick();
    assert_eq!(rig.store.settings_saves.get(), saves + 1);
}
