//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, forward to a remote
//! client, and so on.

use crate::config::ProfileName;
use crate::dispense::FlowTotals;
use crate::error::Rejected;
use crate::fsm::Mode;
use crate::mixing::Ratios;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial mode).
    Started(Mode),

    /// The mode machine moved.
    ModeChanged { from: Mode, to: Mode },

    /// New pump ratios were handed to the scheduler.
    RatiosApplied(Ratios),

    /// The lever engaged the pumps in a dispensing mode.
    DispenseStarted(Mode),

    /// Pumps released; carries the updated cumulative totals.
    DispenseStopped(FlowTotals),

    SettingsSaved,

    /// A profile was switched to and loaded.
    ProfileLoaded(ProfileName),

    /// The named profile failed to load; factory defaults are in use.
    ProfileFallback(ProfileName),

    /// A remote command was refused.
    RemoteRejected(Rejected),
}
