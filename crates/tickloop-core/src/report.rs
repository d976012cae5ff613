//! Console reporting for the loop.
//!
//! Each iteration produces one line naming the iteration index, the step
//! just taken, and the cumulative simulated time:
//!
//! ```text
//! Interval - 3 :: 11ms elapsed :: 32ms total time.
//! ```

use std::io::{self, Write};

use tracing::debug;

use crate::clock::TimeSnapshot;
use crate::runner::LoopHooks;

/// Printed once after the clock is configured and before the loop starts.
pub const CONTENT_LOADED_LINE: &str = "Content Loaded...";

/// Printed once after the loop returns.
pub const EXIT_LINE: &str = "Exiting the simulated game loop.";

/// Format the per-iteration report line.
pub fn report_line(snapshot: &TimeSnapshot, iteration: u64) -> String {
    format!(
        "Interval - {iteration} :: {}ms elapsed :: {}ms total time.",
        snapshot.elapsed_ms(),
        snapshot.total_ms()
    )
}

/// Format the startup line announcing the configured multiplier.
pub fn startup_line(multiplier: f64) -> String {
    format!("Simulation Initialized. Clock time variance multiplier set to :: {multiplier}")
}

/// [`LoopHooks`] that writes one report line per iteration.
///
/// The hooks themselves cannot fail, so the first write error is kept and
/// every later write is skipped. Call [`finish`](Self::finish) after the run
/// to recover the writer or that error.
#[derive(Debug)]
pub struct ConsoleReporter<W> {
    out: W,
    updates: u64,
    lines_written: u64,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleReporter<W> {
    /// Report into the given writer.
    pub const fn new(out: W) -> Self {
        Self {
            out,
            updates: 0,
            lines_written: 0,
            error: None,
        }
    }

    /// Number of update calls seen.
    pub const fn updates(&self) -> u64 {
        self.updates
    }

    /// Number of report lines successfully written.
    pub const fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Flush and return the writer, or the first write error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> LoopHooks for ConsoleReporter<W> {
    fn update(&mut self, _snapshot: &TimeSnapshot) {
        self.updates = self.updates.saturating_add(1);
    }

    fn report(&mut self, snapshot: &TimeSnapshot, iteration: u64) {
        if self.error.is_some() {
            return;
        }
        match writeln!(self.out, "{}", report_line(snapshot, iteration)) {
            Ok(()) => self.lines_written = self.lines_written.saturating_add(1),
            Err(err) => {
                debug!(iteration, error = %err, "Report write failed, muting reporter");
                self.error = Some(err);
            }
        }
    }
}
