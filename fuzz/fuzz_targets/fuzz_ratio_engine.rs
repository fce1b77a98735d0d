//! Fuzz target: `RatioEngine` + `DutyScheduler`
//!
//! Interprets the input as a sequence of set-point edits on a mixer or
//! pour engine and feeds the resulting ratios to the scheduler,
//! verifying after every edit:
//! - Boundary angles stay in 0..360 and mixer ratios sum to 100
//! - Pour percentages never exceed the sparkling maximum
//! - Pulse durations never exceed the cycle length
//!
//! cargo fuzz run fuzz_ratio_engine

#![no_main]

use cocktailcube::config::DeviceConfig;
use cocktailcube::dispense::{CycleBounds, DutyScheduler};
use cocktailcube::mixing::bottles::BottleRack;
use cocktailcube::mixing::engine::MAX_POUR_PERCENT;
use cocktailcube::mixing::{DeviceKind, Liquid, RatioEngine};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&head, ops)) = data.split_first() else {
        return;
    };
    let config = DeviceConfig {
        is_mixer: head & 1 == 0,
        step_angle_deg: i16::from(head >> 1).clamp(1, 45),
        ..DeviceConfig::default()
    };
    if config.validate().is_err() {
        return;
    }

    let mut engine = RatioEngine::new(&config);
    let mut scheduler = DutyScheduler::new(
        CycleBounds {
            min_ms: config.cycle_min_ms,
            max_ms: config.cycle_max_ms,
        },
        config.default_cycle_ms,
    );
    let rack = BottleRack::default();
    let mut now = 0u32;

    for chunk in ops.chunks_exact(2) {
        let selected = Liquid::from_index(usize::from(chunk[0] % 3));
        let amount = i32::from(chunk[1] as i8);
        if chunk[0] & 0x80 == 0 {
            engine.adjust_selected(selected, amount);
        } else {
            engine.adjust_angle(selected, amount * 3);
        }

        assert!(engine.angles().iter().all(|a| (0..360).contains(a)));
        match engine.kind() {
            DeviceKind::Mixer => assert!((engine.normalize().sum() - 100.0).abs() < 0.01),
            DeviceKind::Pour => assert!(engine
                .percentages()
                .iter()
                .all(|p| i32::from(*p) <= MAX_POUR_PERCENT)),
        }

        scheduler.set_ratios(engine.dispense_ratios(selected, &rack));
        assert!(scheduler
            .durations_ms()
            .iter()
            .all(|d| *d <= scheduler.cycle_ms()));

        scheduler.enable(now);
        now = now.wrapping_add(u32::from(chunk[1]) * 7);
        scheduler.tick(now);
    }
});
