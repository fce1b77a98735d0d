//! Serial-console display adapter.
//!
//! Implements [`DisplayPort`] by printing each pushed frame as one log
//! line.  Stands in for the TFT renderer, which lives outside this crate.

use log::info;

use crate::app::ports::DisplayPort;
use crate::app::view::DisplayView;
use crate::fsm::Mode;
use crate::fsm::context::Redraw;

#[derive(Default)]
pub struct LogDisplay {
    frames: u32,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered since boot.
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl DisplayPort for LogDisplay {
    fn render(&mut self, what: Redraw, view: &DisplayView<'_>) {
        self.frames = self.frames.wrapping_add(1);
        match what {
            Redraw::Page | Redraw::Values => match view.mode() {
                Mode::Dashboard | Mode::Pour => {
                    let r = view.pump_ratios();
                    info!(
                        "DISP  | {} sel={:?} ratios={:.1}/{:.1}/{:.1} cycle={}ms",
                        view.mode().name(),
                        view.selected(),
                        r.0[0],
                        r.0[1],
                        r.0[2],
                        view.cycle_ms()
                    );
                }
                Mode::Cleaning => info!("DISP  | Cleaning {:?}", view.cleaning()),
                Mode::Reset => info!("DISP  | Reset angles={:?}", view.angles()),
                Mode::Settings => info!("DISP  | Settings {:?}", view.setting_cursor()),
                Mode::Menu => info!("DISP  | Menu on {}", view.menu_cursor().name()),
                Mode::Screensaver => info!("DISP  | Screensaver"),
            },
            Redraw::MenuCursor => info!("DISP  | Menu on {}", view.menu_cursor().name()),
            Redraw::Settings => {
                let s = view.settings();
                info!(
                    "DISP  | Settings {:?} cycle={}ms remote={} profile={}",
                    view.setting_cursor(),
                    s.cycle_ms,
                    s.remote_access,
                    s.profile
                );
            }
            // One frame per tick is too chatty for a serial line.
            Redraw::Screensaver => {}
        }
    }
}
