//! Encoder, push-button and dispense-lever input latch.
//!
//! ## Hardware
//!
//! Quadrature rotary encoder (A/B, pull-ups) with an integrated active-low
//! push-button, plus a dispense lever switch.  GPIO interrupts fire on
//! every edge; the handlers only update the small record below.
//!
//! ## Concurrency
//!
//! ```text
//!   GPIO ISR ──on_*_edge()──▶ ┌──────────────┐ ◀──take_*()── main loop
//!                             │ InputRecord  │
//!                             │ (cs mutex)   │
//!                             └──────────────┘
//! ```
//!
//! Both sides go through the same critical section, so a poll never sees
//! a half-updated record.  `take_*` reads and clears in one lock, so no
//! encoder step is lost or counted twice between polls.
//!
//! ## Gestures
//!
//! | Gesture     | Condition                               |
//! |-------------|-----------------------------------------|
//! | Short press | Released before 500 ms                  |
//! | Long press  | Held >= 500 ms; fires once per hold and |
//! |             | swallows the paired release             |
//!
//! An edge inside the 30 ms debounce window is not applied, but its level
//! is kept.  If nothing follows it for a full window it is taken as the
//! settled level, so a very quick tap still ends as a release.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;

use crate::config::EncoderDirection;

const DEBOUNCE_MS: u32 = 30;
pub const LONG_PRESS_MS: u32 = 500;

#[derive(Debug)]
struct InputRecord {
    increments: i32,
    direction: i32,
    last_a: bool,

    button_down: bool,
    pressed_at_ms: u32,
    last_edge_ms: Option<u32>,
    /// Last level the ISR saw, debounced or not.
    raw_down: bool,
    raw_at_ms: u32,
    short_pending: bool,
    long_pending: bool,
    long_fired: bool,

    dispense_held: bool,
}

impl InputRecord {
    const fn new() -> Self {
        Self {
            increments: 0,
            direction: 1,
            last_a: true,
            button_down: false,
            pressed_at_ms: 0,
            last_edge_ms: None,
            raw_down: false,
            raw_at_ms: 0,
            short_pending: false,
            long_pending: false,
            long_fired: false,
            dispense_held: false,
        }
    }

    /// Debounced level change at `at_ms`.
    fn apply_edge(&mut self, pressed: bool, at_ms: u32) {
        self.last_edge_ms = Some(at_ms);
        self.button_down = pressed;
        if pressed {
            self.pressed_at_ms = at_ms;
            self.long_fired = false;
        } else if self.long_fired {
            self.long_fired = false;
        } else if at_ms.wrapping_sub(self.pressed_at_ms) >= LONG_PRESS_MS {
            self.long_pending = true;
        } else {
            self.short_pending = true;
        }
    }

    /// An edge dropped inside the debounce window may have been the last
    /// one.  Once the raw level has been stable for a full window, it wins.
    fn settle(&mut self, now_ms: u32) {
        if self.raw_down != self.button_down
            && now_ms.wrapping_sub(self.raw_at_ms) >= DEBOUNCE_MS
        {
            self.apply_edge(self.raw_down, self.raw_at_ms);
        }
    }
}

/// ISR-shared input state behind a critical-section mutex.
pub struct InputLatch {
    record: CriticalSectionMutex<RefCell<InputRecord>>,
}

impl Default for InputLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// The latch the GPIO interrupt handlers write into.
pub static INPUT_LATCH: InputLatch = InputLatch::new();

impl InputLatch {
    pub const fn new() -> Self {
        Self {
            record: CriticalSectionMutex::new(RefCell::new(InputRecord::new())),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut InputRecord) -> R) -> R {
        self.record.lock(|cell| f(&mut cell.borrow_mut()))
    }

    // ── Producer side (interrupt context) ─────────────────────────

    /// Encoder channel A changed.  One step per rising edge of A; B's
    /// level gives the direction.
    pub fn on_encoder_edge(&self, a: bool, b: bool) {
        self.with(|r| {
            if a == r.last_a {
                return;
            }
            r.last_a = a;
            if a {
                let step = if b { -1 } else { 1 };
                r.increments = r.increments.saturating_add(step * r.direction);
            }
        });
    }

    /// Button level changed.  `pressed` is the logical level (active-low
    /// already inverted).
    pub fn on_button_edge(&self, pressed: bool, now_ms: u32) {
        self.with(|r| {
            r.settle(now_ms);
            r.raw_down = pressed;
            r.raw_at_ms = now_ms;
            if let Some(last) = r.last_edge_ms {
                if now_ms.wrapping_sub(last) < DEBOUNCE_MS {
                    return;
                }
            }
            if pressed != r.button_down {
                r.apply_edge(pressed, now_ms);
            }
        });
    }

    pub fn on_dispense_switch(&self, held: bool) {
        self.with(|r| r.dispense_held = held);
    }

    /// Polarity applied to subsequent encoder steps.
    pub fn set_direction(&self, direction: EncoderDirection) {
        self.with(|r| r.direction = direction.sign());
    }

    // ── Consumer side (main loop) ─────────────────────────────────

    /// Signed step count since the last call.
    pub fn take_rotation(&self) -> i32 {
        self.with(|r| core::mem::take(&mut r.increments))
    }

    pub fn take_short_press(&self) -> bool {
        self.with(|r| core::mem::take(&mut r.short_pending))
    }

    /// `true` once per qualifying hold, either while still held or on a
    /// release the loop did not catch in time.
    pub fn take_long_press(&self, now_ms: u32) -> bool {
        self.with(|r| {
            r.settle(now_ms);
            if core::mem::take(&mut r.long_pending) {
                return true;
            }
            if r.button_down && !r.long_fired && now_ms.wrapping_sub(r.pressed_at_ms) >= LONG_PRESS_MS
            {
                r.long_fired = true;
                r.short_pending = false;
                return true;
            }
            false
        })
    }

    pub fn dispense_held(&self) -> bool {
        self.with(|r| r.dispense_held)
    }

    /// Throw away everything latched so far.
    pub fn discard(&self) {
        self.with(|r| {
            r.increments = 0;
            r.short_pending = false;
            r.long_pending = false;
            // A button still held across the discard must not turn into a
            // long press afterwards.
            if r.button_down {
                r.long_fired = true;
            }
        });
    }
}

// ── Interrupt handlers ───────────────────────────────────────────

/// Encoder A edge.  Safe from interrupt context.
pub fn encoder_isr_handler(a: bool, b: bool) {
    INPUT_LATCH.on_encoder_edge(a, b);
}

/// Button edge.  Safe from interrupt context.
pub fn button_isr_handler(pressed: bool, now_ms: u32) {
    INPUT_LATCH.on_button_edge(pressed, now_ms);
}

/// Dispense lever edge.  Safe from interrupt context.
pub fn lever_isr_handler(held: bool) {
    INPUT_LATCH.on_dispense_switch(held);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(latch: &InputLatch, steps: i32) {
        let b = steps < 0;
        for _ in 0..steps.abs() {
            latch.on_encoder_edge(false, b);
            latch.on_encoder_edge(true, b);
        }
    }

    #[test]
    fn rotation_is_read_and_reset() {
        let latch = InputLatch::new();
        turn(&latch, 3);
        turn(&latch, -1);
        assert_eq!(latch.take_rotation(), 2);
        assert_eq!(latch.take_rotation(), 0);
    }

    #[test]
    fn repeated_level_is_not_a_step() {
        let latch = InputLatch::new();
        latch.on_encoder_edge(false, false);
        latch.on_encoder_edge(false, false);
        latch.on_encoder_edge(true, false);
        latch.on_encoder_edge(true, false);
        assert_eq!(latch.take_rotation(), 1);
    }

    #[test]
    fn inverted_direction_flips_steps() {
        let latch = InputLatch::new();
        latch.set_direction(EncoderDirection::Inverted);
        turn(&latch, 2);
        assert_eq!(latch.take_rotation(), -2);
    }

    #[test]
    fn short_press_on_quick_release() {
        let latch = InputLatch::new();
        latch.on_button_edge(true, 1000);
        latch.on_button_edge(false, 1100);
        assert!(!latch.take_long_press(1110));
        assert!(latch.take_short_press());
        assert!(!latch.take_short_press());
    }

    #[test]
    fn bounce_inside_debounce_window_is_ignored() {
        let latch = InputLatch::new();
        latch.on_button_edge(true, 1000);
        latch.on_button_edge(false, 1005);
        latch.on_button_edge(true, 1010);
        latch.on_button_edge(false, 1200);
        assert!(latch.take_short_press());
    }

    #[test]
    fn tap_shorter_than_debounce_window_is_a_short_press() {
        let latch = InputLatch::new();
        latch.on_button_edge(true, 1000);
        latch.on_button_edge(false, 1020);
        assert!(!latch.take_long_press(1600));
        assert!(latch.take_short_press());
        assert!(!latch.take_long_press(2000));
    }

    #[test]
    fn dropped_release_is_settled_by_the_next_press() {
        let latch = InputLatch::new();
        latch.on_button_edge(true, 1000);
        latch.on_button_edge(false, 1010);
        latch.on_button_edge(true, 1300);
        assert!(latch.take_short_press());
        latch.on_button_edge(false, 1400);
        assert!(latch.take_short_press());
        assert!(!latch.take_long_press(2500));
    }

    #[test]
    fn long_press_fires_once_and_swallows_release() {
        let latch = InputLatch::new();
        latch.on_button_edge(true, 1000);
        assert!(!latch.take_long_press(1400));
        assert!(latch.take_long_press(1500));
        assert!(!latch.take_long_press(1800));
        latch.on_button_edge(false, 2000);
        assert!(!latch.take_short_press());
        assert!(!latch.take_long_press(2010));
    }

    #[test]
    fn long_hold_released_between_polls_is_long() {
        let latch = InputLatch::new();
        latch.on_button_edge(true, 1000);
        latch.on_button_edge(false, 1700);
        assert!(!latch.take_short_press());
        assert!(latch.take_long_press(1710));
        assert!(!latch.take_long_press(1720));
    }

    #[test]
    fn discard_clears_pending_and_held_button() {
        let latch = InputLatch::new();
        turn(&latch, 4);
        latch.on_button_edge(true, 1000);
        latch.discard();
        assert_eq!(latch.take_rotation(), 0);
        assert!(!latch.take_long_press(2000));
        latch.on_button_edge(false, 2100);
        assert!(!latch.take_short_press());
    }

    #[test]
    fn lever_level_is_reported() {
        let latch = InputLatch::new();
        assert!(!latch.dispense_held());
        latch.on_dispense_switch(true);
        assert!(latch.dispense_held());
    }
}
