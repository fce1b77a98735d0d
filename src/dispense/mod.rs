//! Duty-cycle scheduling and flow accounting.
//!
//! The pumps are on/off devices, so a blend is approximated by pulsing
//! them inside a repeating cycle.  The liquid with the largest share runs
//! for the whole cycle, the others for a proportional fraction of it:
//!
//! ```text
//!   ratios (100, 50, 0), cycle 500 ms
//!
//!   pump 1  ████████████████████  500 ms
//!   pump 2  ██████████░░░░░░░░░░  250 ms
//!   pump 3  ░░░░░░░░░░░░░░░░░░░░    0 ms
//!           0        250       500
//! ```

pub mod flow;
pub mod scheduler;

pub use flow::FlowTotals;
pub use scheduler::{CycleBounds, DutyScheduler};
