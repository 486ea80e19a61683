//! Dashboard view — renders per-device progress gauges using ratatui widgets.
//!
//! Takes the orchestrator's progress snapshots and renders one gauge row per
//! device plus a one-line summary. Pure rendering; no state lives here.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use blendrig_core::monitor::progress::{format_eta, ProgressSnapshot};
use blendrig_core::render::task::TaskStatus;


/// Render the dashboard: one gauge per device, then a summary line.
pub fn render_dashboard(frame: &mut Frame, area: Rect, snaps: &[ProgressSnapshot]) {
    let mut constraints: Vec<Constraint> =
        snaps.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, snap) in snaps.iter().enumerate() {
        render_device_gauge(frame, rows[i], snap);
    }
    render_summary(frame, rows[rows.len() - 1], snaps);
}


/// One bordered gauge row for a device.
fn render_device_gauge(frame: &mut Frame, area: Rect, snap: &ProgressSnapshot) {
    let title = format!(" {} ", snap.label);
    let label = match snap.status {
        TaskStatus::Succeeded => format!("{}/{} done", snap.done, snap.total),
        TaskStatus::Failed => format!("{}/{} failed", snap.done, snap.total),
        TaskStatus::Pending => "waiting".to_string(),
        TaskStatus::Running => match snap.average {
            Some(avg) => format!(
                "{}/{}  {:.1}s/frame  eta {}",
                snap.done,
                snap.total,
                avg,
                format_eta(snap.eta_seconds)
            ),
            None => format!("{}/{}", snap.done, snap.total),
        },
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(status_style(snap.status))
        .ratio(snap.ratio())
        .label(label);
    frame.render_widget(gauge, area);
}


/// Gauge colour by task status.
fn status_style(status: TaskStatus) -> Style {
    match status {
        TaskStatus::Failed => Style::default().fg(Color::Red),
        TaskStatus::Succeeded => Style::default().fg(Color::Green),
        TaskStatus::Running => Style::default().fg(Color::Cyan),
        TaskStatus::Pending => Style::default().fg(Color::DarkGray),
    }
}


/// One-line summary of overall progress.
fn render_summary(frame: &mut Frame, area: Rect, snaps: &[ProgressSnapshot]) {
    let done: usize = snaps.iter().map(|s| s.done).sum();
    let total: i64 = snaps.iter().map(|s| s.total).sum();
    let failed = snaps
        .iter()
        .filter(|s| s.status == TaskStatus::Failed)
        .count();
    let text = if failed > 0 {
        format!(
            "{}/{} frames  \u{2716} {} device(s) failed  q to quit",
            done, total, failed
        )
    } else {
        format!("{}/{} frames  q to quit", done, total)
    };
    frame.render_widget(Paragraph::new(text), area);
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn snap(index: u32, done: usize, total: i64, status: TaskStatus) -> ProgressSnapshot {
        ProgressSnapshot {
            label: format!("gpu{} [1-{}]", index, total),
            device_index: index,
            done,
            total,
            average: if done > 0 { Some(2.0) } else { None },
            eta_seconds: (total as f64 - done as f64) * 2.0,
            status,
        }
    }

    fn draw(snaps: &[ProgressSnapshot]) -> String {
        let backend = TestBackend::new(60, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render_dashboard(frame, frame.area(), snaps))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        let width = buffer.area.width as usize;
        let mut out = String::new();
        for (i, cell) in buffer.content.iter().enumerate() {
            out.push_str(cell.symbol());
            if (i + 1) % width == 0 {
                out.push('\n');
            }
        }
        out
    }

    #[test]
    fn draws_one_gauge_per_device() {
        let text = draw(&[
            snap(0, 5, 25, TaskStatus::Running),
            snap(1, 10, 25, TaskStatus::Running),
        ]);
        assert!(text.contains("gpu0 [1-25]"));
        assert!(text.contains("gpu1 [1-25]"));
        assert!(text.contains("eta"));
    }

    #[test]
    fn summary_counts_frames() {
        let text = draw(&[
            snap(0, 5, 25, TaskStatus::Running),
            snap(1, 10, 25, TaskStatus::Running),
        ]);
        assert!(text.contains("15/50 frames"));
    }

    #[test]
    fn failed_device_shows_in_summary() {
        let text = draw(&[
            snap(0, 5, 25, TaskStatus::Failed),
            snap(1, 25, 25, TaskStatus::Succeeded),
        ]);
        assert!(text.contains("failed"));
        assert!(text.contains("done"));
    }

    #[test]
    fn pending_device_shows_waiting() {
        let text = draw(&[snap(0, 0, 25, TaskStatus::Pending)]);
        assert!(text.contains("waiting"));
    }
}
