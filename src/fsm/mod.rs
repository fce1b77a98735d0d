//! Function-pointer finite state machine engine for the operating modes.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StateTable                                                   │
//! │  ┌─────────────┬───────────┬──────────┬───────────────────┐   │
//! │  │ Mode        │ on_enter  │ on_exit  │ on_update         │   │
//! │  ├─────────────┼───────────┼──────────┼───────────────────┤   │
//! │  │ Menu        │ fn(ctx)   │ —        │ fn(ctx)->Option<> │   │
//! │  │ Dashboard   │ fn(ctx)   │ —        │ fn(ctx)->Option<> │   │
//! │  │ Cleaning    │ fn(ctx)   │ —        │ fn(ctx)->Option<> │   │
//! │  │ Reset       │ fn(ctx)   │ —        │ fn(ctx)->Option<> │   │
//! │  │ Settings    │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  │ Pour        │ fn(ctx)   │ —        │ fn(ctx)->Option<> │   │
//! │  │ Screensaver │ fn(ctx)   │ —        │ fn(ctx)->Option<> │   │
//! │  └─────────────┴───────────┴──────────┴───────────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** mode.  If
//! it returns `Some(next)`, the engine runs `on_exit` for the current
//! mode, zeroes the requested pump ratios, then runs `on_enter` for the
//! next.  Handlers never call each other, so a chain of transitions costs
//! one tick per hop instead of stack depth.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

use crate::mixing::Ratios;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Operating modes.  Must stay in sync with [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
    Menu = 0,
    Dashboard = 1,
    Cleaning = 2,
    Reset = 3,
    Settings = 4,
    Pour = 5,
    Screensaver = 6,
}

impl Mode {
    /// Total number of modes, used to size the table array.
    pub const COUNT: usize = 7;

    /// Convert an index back to `Mode`.  Out-of-range falls back to
    /// `Menu` in release builds.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Menu,
            1 => Self::Dashboard,
            2 => Self::Cleaning,
            3 => Self::Reset,
            4 => Self::Settings,
            5 => Self::Pour,
            6 => Self::Screensaver,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Menu
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Menu => "Menu",
            Self::Dashboard => "Dashboard",
            Self::Cleaning => "Cleaning",
            Self::Reset => "Reset",
            Self::Settings => "Settings",
            Self::Pour => "Pour",
            Self::Screensaver => "Screensaver",
        }
    }

    /// Modes in which the dispense lever runs the pumps.
    pub fn dispenses(self) -> bool {
        matches!(self, Self::Dashboard | Self::Pour | Self::Cleaning)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-tick handler.  `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<Mode>;

/// One row in the table.  Stored in a fixed-size array, no heap or `dyn`.
pub struct StateDescriptor {
    pub id: Mode,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `Mode as usize`.
    table: [StateDescriptor; Mode::COUNT],
    current: usize,
    tick_count: u64,
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; Mode::COUNT], initial: Mode) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter`.  Call once, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in mode: {}", self.table[self.current].name);
        ctx.mode = self.current_state();
        ctx.mode_entered_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Call `on_update` for the current mode and apply any transition.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        self.tick_count += 1;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Immediate transition regardless of what `on_update` would return.
    pub fn force_transition(&mut self, next: Mode, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> Mode {
        Mode::from_index(self.current)
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    fn transition(&mut self, next_id: Mode, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Nothing the old mode asked the pumps for survives into the new one.
        ctx.ratios = Ratios::ZERO;

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.mode = next_id;
        ctx.mode_entered_ms = ctx.now_ms;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
