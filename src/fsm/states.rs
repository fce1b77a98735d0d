//! Concrete mode handler functions and table builder.
//!
//! ```text
//!                 ┌──────────── short press ────────────┐
//!                 │                                     ▼
//!   DASHBOARD ◀──┤        MENU ──short──▶ CLEANING / RESET / POUR / SETTINGS
//!   (boot)   ──long──▶    ▲                         │
//!                          └──────── long press ────┘
//!
//!   RESET ──[pause elapsed]──▶ DASHBOARD
//!
//!   any mode except RESET ──[idle]──▶ SCREENSAVER ──[any input]──▶ previous mode
//! ```

use super::Mode;
use super::StateDescriptor;
use super::context::{Beep, FsmContext, Redraw};
use crate::config::{CYCLE_STEP_MS, Cyclic, SettingItem};
use crate::mixing::{DeviceKind, Liquid, Ratios};
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static mode table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; Mode::COUNT] {
    [
        // Index 0: Menu
        StateDescriptor {
            id: Mode::Menu,
            name: "Menu",
            on_enter: Some(menu_enter),
            on_exit: None,
            on_update: menu_update,
        },
        // Index 1: Dashboard
        StateDescriptor {
            id: Mode::Dashboard,
            name: "Dashboard",
            on_enter: Some(dashboard_enter),
            on_exit: None,
            on_update: dashboard_update,
        },
        // Index 2: Cleaning
        StateDescriptor {
            id: Mode::Cleaning,
            name: "Cleaning",
            on_enter: Some(cleaning_enter),
            on_exit: None,
            on_update: cleaning_update,
        },
        // Index 3: Reset
        StateDescriptor {
            id: Mode::Reset,
            name: "Reset",
            on_enter: Some(reset_enter),
            on_exit: None,
            on_update: reset_update,
        },
        // Index 4: Settings
        StateDescriptor {
            id: Mode::Settings,
            name: "Settings",
            on_enter: Some(settings_enter),
            on_exit: Some(settings_exit),
            on_update: settings_update,
        },
        // Index 5: Pour
        StateDescriptor {
            id: Mode::Pour,
            name: "Pour",
            on_enter: Some(pour_enter),
            on_exit: None,
            on_update: pour_update,
        },
        // Index 6: Screensaver
        StateDescriptor {
            id: Mode::Screensaver,
            name: "Screensaver",
            on_enter: Some(screensaver_enter),
            on_exit: None,
            on_update: screensaver_update,
        },
    ]
}

// ── Shared helpers ──────────────────────────────────────────────────────────

fn back_to_menu(ctx: &mut FsmContext, from: Mode) -> Option<Mode> {
    ctx.menu_cursor = from;
    ctx.beep = Some(Beep::Confirm);
    Some(Mode::Menu)
}

fn fall_asleep(ctx: &mut FsmContext, from: Mode) -> Option<Mode> {
    info!("{}: idle, starting screensaver", from.name());
    ctx.resume_mode = from;
    Some(Mode::Screensaver)
}

// ═══════════════════════════════════════════════════════════════════════════
//  MENU
// ═══════════════════════════════════════════════════════════════════════════

fn menu_enter(ctx: &mut FsmContext) {
    if !ctx.menu_entries().contains(&ctx.menu_cursor) {
        ctx.menu_cursor = Mode::Dashboard;
    }
    ctx.request_redraw(Redraw::Page);
    info!("MENU: cursor on {}", ctx.menu_cursor.name());
}

fn menu_update(ctx: &mut FsmContext) -> Option<Mode> {
    if ctx.input.rotation != 0 {
        let entries = ctx.menu_entries();
        let idx = entries
            .iter()
            .position(|m| *m == ctx.menu_cursor)
            .unwrap_or(0);
        // One entry per poll; turning left walks forward.
        let step = if ctx.input.rotation < 0 {
            1
        } else {
            entries.len() - 1
        };
        ctx.menu_cursor = entries[(idx + step) % entries.len()];
        ctx.beep = Some(Beep::Click);
        ctx.request_redraw(Redraw::MenuCursor);
        debug!("MENU: cursor -> {}", ctx.menu_cursor.name());
    }

    if ctx.input.short_press {
        ctx.beep = Some(Beep::Confirm);
        return Some(ctx.menu_cursor);
    }

    if ctx.idle_expired() {
        return fall_asleep(ctx, Mode::Menu);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  DASHBOARD / POUR: live dispensing of the set-point
// ═══════════════════════════════════════════════════════════════════════════

fn dispense_enter(ctx: &mut FsmContext) {
    if ctx.selected.index().is_none() {
        ctx.selected = Liquid::One;
    }
    if ctx.kind() == DeviceKind::Pour && ctx.settings.bottles.is_empty_slot(ctx.selected) {
        ctx.selected = ctx.settings.bottles.next_filled(ctx.selected);
    }
    ctx.sync_dispense_ratios();
    ctx.request_redraw(Redraw::Page);
    info!(
        "{}: liquid {:?}, ratios {:?}",
        ctx.mode.name(),
        ctx.selected,
        ctx.ratios.0
    );
}

fn dispense_update(ctx: &mut FsmContext, here: Mode) -> Option<Mode> {
    if ctx.input.rotation != 0 {
        ctx.engine.adjust_selected(ctx.selected, ctx.input.rotation);
        ctx.sync_dispense_ratios();
        ctx.touch_values();
    }

    if ctx.input.short_press {
        ctx.selected = match ctx.kind() {
            DeviceKind::Mixer => ctx.selected.next_slot(),
            DeviceKind::Pour => ctx.settings.bottles.next_filled(ctx.selected),
        };
        ctx.beep = Some(Beep::Click);
        ctx.sync_dispense_ratios();
        ctx.touch_values();
    }

    if ctx.input.long_press {
        return back_to_menu(ctx, here);
    }

    if ctx.idle_expired() {
        return fall_asleep(ctx, here);
    }

    None
}

fn dashboard_enter(ctx: &mut FsmContext) {
    dispense_enter(ctx);
}

fn dashboard_update(ctx: &mut FsmContext) -> Option<Mode> {
    dispense_update(ctx, Mode::Dashboard)
}

fn pour_enter(ctx: &mut FsmContext) {
    dispense_enter(ctx);
}

fn pour_update(ctx: &mut FsmContext) -> Option<Mode> {
    dispense_update(ctx, Mode::Pour)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLEANING: flush lines at full duty
// ═══════════════════════════════════════════════════════════════════════════

fn cleaning_enter(ctx: &mut FsmContext) {
    ctx.ratios = Ratios::solo(ctx.cleaning);
    ctx.request_redraw(Redraw::Page);
    info!("CLEANING: flushing {:?}", ctx.cleaning);
}

fn cleaning_update(ctx: &mut FsmContext) -> Option<Mode> {
    if ctx.input.short_press {
        ctx.cleaning = ctx.cleaning.next_cleaning();
        ctx.ratios = Ratios::solo(ctx.cleaning);
        ctx.beep = Some(Beep::Click);
        ctx.touch_values();
        debug!("CLEANING: now {:?}", ctx.cleaning);
    }

    if ctx.input.long_press {
        return back_to_menu(ctx, Mode::Cleaning);
    }

    if ctx.idle_expired() {
        return fall_asleep(ctx, Mode::Cleaning);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RESET: restore the profile's default set-point
// ═══════════════════════════════════════════════════════════════════════════

fn reset_enter(ctx: &mut FsmContext) {
    ctx.engine.restore_defaults(&ctx.config);
    ctx.selected = Liquid::One;
    ctx.beep = Some(Beep::Long);
    ctx.request_redraw(Redraw::Page);
    ctx.touch_values();
    info!(
        "RESET: defaults restored, back in {} ms",
        ctx.config.reset_pause_ms
    );
}

fn reset_update(ctx: &mut FsmContext) -> Option<Mode> {
    // Input is ignored and the screensaver cannot interrupt the pause.
    if ctx.ms_in_mode() >= ctx.config.reset_pause_ms {
        return Some(Mode::Dashboard);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SETTINGS
// ═══════════════════════════════════════════════════════════════════════════

fn settings_enter(ctx: &mut FsmContext) {
    if !ctx.setting_cursor.available_on(ctx.kind()) {
        ctx.setting_cursor = SettingItem::CycleTime;
    }
    ctx.request_redraw(Redraw::Page);
    info!("SETTINGS: editing {:?}", ctx.setting_cursor);
}

fn settings_exit(ctx: &mut FsmContext) {
    ctx.requests.save_settings = true;
    info!("SETTINGS: leaving, settings will be persisted");
}

fn settings_update(ctx: &mut FsmContext) -> Option<Mode> {
    if ctx.input.rotation != 0 {
        adjust_setting(ctx, ctx.input.rotation);
        ctx.beep = Some(Beep::Click);
        ctx.change_counter = ctx.change_counter.wrapping_add(1);
        ctx.request_redraw(Redraw::Settings);
    }

    if ctx.input.short_press {
        ctx.setting_cursor = ctx.setting_cursor.next(ctx.kind());
        ctx.beep = Some(Beep::Click);
        ctx.request_redraw(Redraw::Settings);
    }

    if ctx.input.long_press {
        return back_to_menu(ctx, Mode::Settings);
    }

    if ctx.idle_expired() {
        return fall_asleep(ctx, Mode::Settings);
    }

    None
}

/// Apply `rotation` to the item under the cursor.  Enumerations move one
/// entry per poll; the cycle time moves by the full rotation.
fn adjust_setting(ctx: &mut FsmContext, rotation: i32) {
    let s = &mut ctx.settings;
    match ctx.setting_cursor {
        SettingItem::CycleTime => {
            let proposed =
                i64::from(s.cycle_ms) + i64::from(rotation) * i64::from(CYCLE_STEP_MS);
            let (min, max) = (ctx.config.cycle_min_ms, ctx.config.cycle_max_ms);
            if (i64::from(min)..=i64::from(max)).contains(&proposed) {
                s.cycle_ms = proposed as u32;
            } else {
                debug!("SETTINGS: cycle {} ms outside {}..={}", proposed, min, max);
            }
        }
        SettingItem::RemoteAccess => s.remote_access = !s.remote_access,
        SettingItem::Profile => ctx.requests.profile_step = rotation.signum(),
        SettingItem::LedIdle => s.led_idle = s.led_idle.step(rotation),
        SettingItem::LedDispensing => s.led_dispensing = s.led_dispensing.step(rotation),
        SettingItem::EncoderDirection => {
            s.encoder_direction = s.encoder_direction.step(rotation);
        }
        SettingItem::Screensaver => s.screensaver = s.screensaver.step(rotation),
        item @ (SettingItem::Bottle1 | SettingItem::Bottle2 | SettingItem::Bottle3) => {
            if let Some(slot) = item.bottle_slot() {
                if let Err(e) = s.bottles.cycle(slot, rotation) {
                    warn!("SETTINGS: bottle slot {}: {}", slot, e);
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  SCREENSAVER
// ═══════════════════════════════════════════════════════════════════════════

fn screensaver_enter(ctx: &mut FsmContext) {
    ctx.request_redraw(Redraw::Page);
    info!(
        "SCREENSAVER: waiting for input, will resume {}",
        ctx.resume_mode.name()
    );
}

fn screensaver_update(ctx: &mut FsmContext) -> Option<Mode> {
    if ctx.input.any() {
        info!("SCREENSAVER: wake");
        return Some(ctx.resume_mode);
    }
    ctx.request_redraw(Redraw::Screensaver);
    None
}
