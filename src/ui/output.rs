//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Diagnostics are structured `tracing` events on stderr. This module owns
//! what the operator reads on the terminal besides them: clone progress and
//! the end-of-run summary on stdout, and the final error line on stderr.

use std::fmt::Display;
use std::io::Write;

use crate::engine::RunReport;
use crate::git::TransferProgress;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. Quiet wins over debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// A single self-overwriting progress line for a clone.
#[derive(Debug)]
pub struct ProgressLine {
    verbosity: Verbosity,
    last_percent: Option<usize>,
    drawn: bool,
}

impl ProgressLine {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            last_percent: None,
            drawn: false,
        }
    }

    /// Redraw the line if the received percentage changed.
    pub fn update(&mut self, progress: &TransferProgress) {
        if self.verbosity == Verbosity::Quiet || progress.total_objects == 0 {
            return;
        }

        let percent = progress.received_objects * 100 / progress.total_objects;
        if self.last_percent == Some(percent) && !progress.is_complete() {
            return;
        }
        self.last_percent = Some(percent);
        self.drawn = true;

        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r{}", format_progress(progress));
        let _ = out.flush();
    }

    /// Terminate the line, if anything was drawn.
    pub fn finish(&mut self) {
        if self.drawn {
            println!();
            self.drawn = false;
        }
    }
}

/// Format transfer statistics for display.
///
/// # Example
///
/// ```
/// use stablecut::git::TransferProgress;
/// use stablecut::ui::output::format_progress;
///
/// let progress = TransferProgress {
///     received_objects: 50,
///     total_objects: 200,
///     received_bytes: 3 * 1024 * 1024,
///     ..Default::default()
/// };
/// assert_eq!(format_progress(&progress), "Receiving objects:  25% (50/200), 3.0 MiB");
/// ```
pub fn format_progress(progress: &TransferProgress) -> String {
    let percent = if progress.total_objects == 0 {
        0
    } else {
        progress.received_objects * 100 / progress.total_objects
    };

    let mut line = format!(
        "Receiving objects: {:3}% ({}/{}), {}",
        percent,
        progress.received_objects,
        progress.total_objects,
        format_bytes(progress.received_bytes)
    );
    if progress.total_deltas > 0 {
        line.push_str(&format!(
            ", resolving deltas {}/{}",
            progress.indexed_deltas, progress.total_deltas
        ));
    }
    line
}

/// Format a byte count with a binary unit.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Format the end-of-run summary, one line per project.
pub fn format_summary(report: &RunReport) -> String {
    let mut lines = Vec::new();

    for project in &report.provisioned {
        lines.push(format!(
            "{}: {} at {}{} -> {} ({})",
            project.name,
            project.origin_branch,
            project.head.short(7),
            if project.cloned { ", cloned" } else { "" },
            project.stable_branch,
            project.path.display()
        ));
    }
    for (name, err) in &report.failures {
        lines.push(format!("{}: FAILED: {}", name, err));
    }

    lines.join("\n")
}
