//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production).  A network adapter for the
//! remote-control collaborator would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | mode={}", mode.name());
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE  | {} -> {}", from.name(), to.name());
            }
            AppEvent::RatiosApplied(r) => {
                info!("RATIO | {:.1}% / {:.1}% / {:.1}%", r.0[0], r.0[1], r.0[2]);
            }
            AppEvent::DispenseStarted(mode) => {
                info!("POUR  | started in {}", mode.name());
            }
            AppEvent::DispenseStopped(flow) => {
                let [a, b, c] = flow.on_time_ms();
                info!("FLOW  | on-time {} / {} / {} ms", a, b, c);
            }
            AppEvent::SettingsSaved => {
                info!("STORE | settings saved");
            }
            AppEvent::ProfileLoaded(name) => {
                info!("PROF  | loaded '{}'", name);
            }
            AppEvent::ProfileFallback(name) => {
                warn!("PROF  | '{}' unusable, running built-in defaults", name);
            }
            AppEvent::RemoteRejected(reason) => {
                warn!("REMOTE| rejected: {}", reason);
            }
        }
    }
}
