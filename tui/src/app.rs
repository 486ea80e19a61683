//! Terminal lifecycle and refresh loop for the progress dashboard.
//!
//! `ProgressApp` owns the terminal: it enters the alternate screen, redraws
//! the dashboard from the shared snapshot state on a fixed interval, and
//! leaves the terminal clean on exit. The render itself runs elsewhere —
//! quitting the dashboard never cancels it.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use blendrig_core::monitor::progress::ProgressSnapshot;

use crate::dashboard;


/// Snapshot state shared between the orchestrator's observer callback and
/// the dashboard.
pub type SharedProgress = Arc<Mutex<Vec<ProgressSnapshot>>>;


// ---------------------------------------------------------------------------
// ProgressApp
// ---------------------------------------------------------------------------

pub struct ProgressApp {
    progress: SharedProgress,
    finished: Arc<AtomicBool>,
    refresh: Duration,
}

impl ProgressApp {
    pub fn new(progress: SharedProgress, finished: Arc<AtomicBool>) -> Self {
        ProgressApp {
            progress,
            finished,
            refresh: Duration::from_millis(200),
        }
    }

    /// Run the dashboard until the render finishes or the user quits
    /// (`q`, Esc, or Ctrl-C).
    pub fn run(&mut self) -> Result<(), String> {
        enable_raw_mode().map_err(|e| e.to_string())?;
        io::stdout()
            .execute(EnterAlternateScreen)
            .map_err(|e| e.to_string())?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend).map_err(|e| e.to_string())?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().map_err(|e| e.to_string())?;
        io::stdout()
            .execute(LeaveAlternateScreen)
            .map_err(|e| e.to_string())?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<(), String> {
        loop {
            // Read the finish flag before the snapshot so the last frame
            // drawn is never older than the flag.
            let done = self.finished.load(Ordering::SeqCst);
            let snaps = self
                .progress
                .lock()
                .map(|s| s.clone())
                .unwrap_or_default();

            terminal
                .draw(|frame| dashboard::render_dashboard(frame, frame.area(), &snaps))
                .map_err(|e| e.to_string())?;

            if done {
                break;
            }

            if event::poll(self.refresh).map_err(|e| e.to_string())? {
                if let Event::Key(key) = event::read().map_err(|e| e.to_string())? {
                    let quit = matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                        || (key.code == KeyCode::Char('c')
                            && key.modifiers.contains(KeyModifiers::CONTROL));
                    if quit {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
