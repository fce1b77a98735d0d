//! CocktailCube firmware entry point.
//!
//! Hexagonal architecture: a single cooperative control loop drives the
//! application core through port traits; GPIO interrupts only touch the
//! input latch.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   NvsAdapter   Monotonic  │
//! │  (Input+Actuator+Delay) (EventSink)    (Settings+   Clock      │
//! │  LogDisplay             JsonProfile     FlowLog)               │
//! │  (DisplayPort)          Store                                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Mode FSM · Ratio engine · Duty scheduler              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  GPIO ISRs ──▶ InputLatch          network task ──▶ RemoteQueue │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{OutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info};

use cocktailcube::adapters::hardware::HardwareAdapter;
use cocktailcube::adapters::log_display::LogDisplay;
use cocktailcube::adapters::log_sink::LogEventSink;
use cocktailcube::adapters::nvs::NvsAdapter;
use cocktailcube::adapters::profiles::JsonProfileStore;
use cocktailcube::adapters::time::MonotonicClock;
use cocktailcube::app::remote::REMOTE_QUEUE;
use cocktailcube::app::service::AppService;
use cocktailcube::drivers::hw_init;
use cocktailcube::drivers::input::INPUT_LATCH;
use cocktailcube::drivers::pump::PumpBank;

/// Control loop period.  Also the resolution of every pump pulse.
const TICK_MS: u32 = 5;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CocktailCube v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;
    if let Err(e) = hw_init::init_isr_service() {
        // The device still pours via remote commands; the encoder is dead.
        error!("ISR service init failed: {}, continuing without input", e);
    }

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;
    // gpio1..3 are pins::PUMP1_GPIO..PUMP3_GPIO.
    let pumps = PumpBank::new([
        PinDriver::output(pins.gpio1.downgrade_output())?,
        PinDriver::output(pins.gpio2.downgrade_output())?,
        PinDriver::output(pins.gpio3.downgrade_output())?,
    ])?;

    // ── 3. Persistence and profile ────────────────────────────
    let store = NvsAdapter::new()?;
    let profiles = JsonProfileStore::builtin();
    let mut app = AppService::load(&store, &profiles);

    // ── 4. Adapters ───────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut hw = HardwareAdapter::new(&INPUT_LATCH, pumps);
    let mut display = LogDisplay::new();
    let mut sink = LogEventSink::new();

    app.start(clock.now_ms(), &mut hw, &mut display, &mut sink);
    info!("Mixture: {}", app.mixture_summary());

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        app.drain_remote(&REMOTE_QUEUE, &mut display, &mut sink);
        app.tick(
            clock.now_ms(),
            &mut hw,
            &mut display,
            &store,
            &profiles,
            &mut sink,
        );
        FreeRtos::delay_ms(TICK_MS);
    }
}
