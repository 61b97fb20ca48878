//! Live terminal view of a conversion batch.
//!
//! [`TerminalRenderer`] repaints a fixed-height block in place on every
//! tick: one line per worker slot listing the active jobs, a progress bar,
//! and a stats line. It is pure presentation; the scheduler's state comes
//! in as a [`ProgressSnapshot`] and the only state held here is the previous
//! frame's line count, needed to erase the old block.
//!
//! Rendering problems (no tty, unknown size) degrade silently: the width
//! falls back to a default and write errors are ignored. The renderer is
//! not safe for concurrent use; the scheduler calls it from its single
//! coordinating thread only, which `&mut self` enforces.

use console::Term;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::progress::ProgressSnapshot;
use crate::utils::format_clock;

const DEFAULT_WIDTH: usize = 80;

/// Sink for progress snapshots.
pub trait ProgressRender {
    /// Repaints the progress block from a fresh snapshot.
    fn render(&mut self, snapshot: &ProgressSnapshot);

    /// Called once after the last job finishes.
    fn finish(&mut self) {}
}

/// No-op renderer for tests and non-interactive runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl ProgressRender for NullRenderer {
    fn render(&mut self, _snapshot: &ProgressSnapshot) {}
}

/// Renders the block to stderr, erasing the previous frame each time.
pub struct TerminalRenderer {
    term: Term,
    prev_lines: usize,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            prev_lines: 0,
        }
    }

    fn width(&self) -> usize {
        let (_, cols) = self.term.size();
        if cols == 0 { DEFAULT_WIDTH } else { cols as usize }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressRender for TerminalRenderer {
    fn render(&mut self, snapshot: &ProgressSnapshot) {
        let lines = compose(snapshot, self.width());
        // Erase the previous frame, then repaint. Failures here must never
        // interrupt the batch, so every terminal call is best-effort.
        let _ = self.term.clear_last_lines(self.prev_lines);
        for line in &lines {
            let _ = self.term.write_line(line);
        }
        self.prev_lines = lines.len();
    }

    fn finish(&mut self) {
        // Leave the final frame on screen and detach from it.
        self.prev_lines = 0;
    }
}

/// Builds the block: `worker_slots` label lines, a bar, and a stats line.
fn compose(snapshot: &ProgressSnapshot, width: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(snapshot.worker_slots + 2);
    for slot in 0..snapshot.worker_slots {
        match snapshot.active.get(slot) {
            Some(label) => lines.push(truncate_to_width(label, width)),
            None => lines.push(String::new()),
        }
    }
    lines.push(bar_line(snapshot.fraction, width));
    lines.push(truncate_to_width(&stats_line(snapshot), width));
    lines
}

fn bar_line(fraction: f64, width: usize) -> String {
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as usize;
    // Leave room for " 100 %".
    let bar_width = width.saturating_sub(6).max(10);
    let fill = (fraction.clamp(0.0, 1.0) * bar_width as f64) as usize;
    let blank = bar_width - fill.min(bar_width);
    format!("{}{} {percent} %", "█".repeat(fill), "░".repeat(blank))
}

fn stats_line(snapshot: &ProgressSnapshot) -> String {
    let eta = match snapshot.eta {
        Some(eta) => format!("{} (est)", format_clock(eta)),
        None => "--:--".to_string(),
    };
    let mut line = format!(
        "{}/{} done, {} failed, elapsed {}, eta {}",
        snapshot.completed + snapshot.failed,
        snapshot.total,
        snapshot.failed,
        format_clock(snapshot.elapsed),
        eta
    );
    if let Some(latest) = &snapshot.latest_completed {
        line.push_str(&format!(", last: {latest}"));
    }
    line
}

/// Truncates to the display width, ending in an ellipsis when cut.
fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot() -> ProgressSnapshot {
        ProgressSnapshot {
            fraction: 0.5,
            elapsed: Duration::from_secs(65),
            eta: Some(Duration::from_secs(65)),
            total: 8,
            completed: 3,
            failed: 1,
            worker_slots: 4,
            active: vec!["a.flac".to_string(), "b.flac".to_string()],
            latest_completed: Some("c.flac".to_string()),
        }
    }

    #[test]
    fn test_block_height_is_fixed() {
        let snap = snapshot();
        let lines = compose(&snap, 80);
        assert_eq!(lines.len(), snap.worker_slots + 2);
        // Idle slots render as blank lines, keeping the height stable.
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_bar_reflects_fraction() {
        let full = bar_line(1.0, 40);
        assert!(full.contains("100 %"));
        assert!(!full.contains('░'));

        let empty = bar_line(0.0, 40);
        assert!(empty.contains("0 %"));
        assert!(!empty.contains('█'));
    }

    #[test]
    fn test_stats_line_contents() {
        let line = stats_line(&snapshot());
        assert!(line.contains("4/8 done"));
        assert!(line.contains("1 failed"));
        assert!(line.contains("elapsed 01:05"));
        assert!(line.contains("01:05 (est)"));
        assert!(line.contains("last: c.flac"));
    }

    #[test]
    fn test_undefined_eta_renders_placeholder() {
        let mut snap = snapshot();
        snap.eta = None;
        assert!(stats_line(&snap).contains("eta --:--"));
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("exactly-10", 10), "exactly-10");
        assert_eq!(truncate_to_width("longer-than-that", 10), "longer-th…");
    }

    #[test]
    fn test_null_renderer_is_silent() {
        let mut renderer = NullRenderer;
        renderer.render(&snapshot());
        renderer.finish();
    }
}
