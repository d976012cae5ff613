//! Simulated clock and time tracking for the tick loop.
//!
//! The clock is the single source of truth for simulated time. Each call to
//! [`SimulatedClock::tick`] advances the cumulative total by an irregular,
//! multiplier-scaled step and records the result as a [`TimeSnapshot`].
//!
//! # Design Principles
//!
//! - Time only moves forward: every tick advances the total by at least
//!   one millisecond, so any loop bounded by a finite budget terminates.
//! - The total uses saturating arithmetic (no silent wraparound).
//! - Inputs are sanitized, never rejected. A multiplier below 1 is clamped
//!   to 1 and the clock has no error path.
//! - Randomness comes from an injected [`JitterSource`], so a seeded or
//!   scripted source yields an exactly reproducible step sequence.

use std::time::Duration;

use tracing::trace;

use crate::jitter::{JitterSource, RngJitter};

/// Multiplier a freshly constructed clock starts with.
pub const DEFAULT_MULTIPLIER: f64 = 2.5;

/// Base simulated milliseconds per step before scaling.
pub const DEFAULT_BASE_STEP_MS: u64 = 5;

/// Smallest multiplier the clock will accept.
pub const MIN_MULTIPLIER: f64 = 1.0;

/// Jitter draws are integers in hundredths of the multiplier.
const DRAW_SCALE: f64 = 100.0;

/// A point in simulated time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TimeSnapshot {
    /// Milliseconds advanced by the tick that produced this snapshot.
    elapsed_ms: u64,

    /// Cumulative simulated milliseconds since the clock was created.
    total_ms: u64,
}

impl TimeSnapshot {
    /// Create a snapshot from raw millisecond values.
    pub const fn new(elapsed_ms: u64, total_ms: u64) -> Self {
        Self {
            elapsed_ms,
            total_ms,
        }
    }

    /// Milliseconds advanced by the most recent tick.
    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Cumulative simulated milliseconds.
    pub const fn total_ms(&self) -> u64 {
        self.total_ms
    }

    /// Elapsed time as a [`Duration`].
    pub const fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Total time as a [`Duration`].
    pub const fn total(&self) -> Duration {
        Duration::from_millis(self.total_ms)
    }
}

/// Clock advancing simulated time in jittered, multiplier-scaled steps.
///
/// The clock is owned by exactly one driver and passed explicitly to
/// whatever needs to read or advance it.
#[derive(Debug, Clone)]
pub struct SimulatedClock<J = RngJitter> {
    /// Cumulative simulated milliseconds.
    total_ms: u64,

    /// Variance multiplier, always `>= MIN_MULTIPLIER`.
    multiplier: f64,

    /// Unscaled milliseconds per step.
    base_step_ms: u64,

    /// Random source for the variance term.
    jitter: J,

    /// Snapshot produced by the most recent tick.
    last: TimeSnapshot,
}

impl SimulatedClock<RngJitter> {
    /// Create a clock whose jitter is reproducible from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(RngJitter::seeded(seed))
    }

    /// Create a clock whose jitter is seeded from OS entropy.
    pub fn from_os_rng() -> Self {
        Self::new(RngJitter::from_os_rng())
    }
}

impl<J: JitterSource> SimulatedClock<J> {
    /// Create a clock at time zero with the default multiplier and step.
    pub const fn new(jitter: J) -> Self {
        Self {
            total_ms: 0,
            multiplier: DEFAULT_MULTIPLIER,
            base_step_ms: DEFAULT_BASE_STEP_MS,
            jitter,
            last: TimeSnapshot::new(0, 0),
        }
    }

    /// Replace the unscaled per-step base.
    ///
    /// A base of 0 is accepted; every tick then advances by the 1ms floor.
    #[must_use]
    pub const fn with_base_step(mut self, base_step_ms: u64) -> Self {
        self.base_step_ms = base_step_ms;
        self
    }

    /// Set the variance multiplier, clamping anything below 1 (and NaN) to 1.
    pub fn set_multiplier(&mut self, value: f64) {
        self.multiplier = value.max(MIN_MULTIPLIER);
    }

    /// Return the effective multiplier.
    pub const fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Return the unscaled per-step base.
    pub const fn base_step_ms(&self) -> u64 {
        self.base_step_ms
    }

    /// Return the cumulative simulated milliseconds.
    pub const fn total_ms(&self) -> u64 {
        self.total_ms
    }

    /// Return the most recent snapshot without advancing time.
    pub const fn time(&self) -> TimeSnapshot {
        self.last
    }

    /// Advance simulated time by one jittered step and return the new
    /// snapshot. The step is always at least 1ms.
    pub fn tick(&mut self) -> TimeSnapshot {
        let upper = draw_upper_bound(self.multiplier);
        let a = from_hundredths(self.jitter.draw(upper));
        let b = from_hundredths(self.jitter.draw(upper));
        let variance = a - b;

        let delta = scaled_step(self.base_step_ms, self.multiplier + variance).max(1);

        self.total_ms = self.total_ms.saturating_add(delta);
        self.last = TimeSnapshot::new(delta, self.total_ms);

        trace!(
            elapsed_ms = delta,
            total_ms = self.total_ms,
            variance,
            "Clock ticked"
        );

        self.last
    }
}

/// Exclusive upper bound for a jitter draw: `trunc(100 * multiplier)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_upper_bound(multiplier: f64) -> u64 {
    // Float-to-int `as` saturates; the multiplier is never below 1.
    (DRAW_SCALE * multiplier) as u64
}

#[allow(clippy::cast_precision_loss)]
fn from_hundredths(draw: u64) -> f64 {
    draw as f64 / DRAW_SCALE
}

/// `round(base * |factor|)` with ties to even, saturating at `u64::MAX`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scaled_step(base_step_ms: u64, factor: f64) -> u64 {
    (base_step_ms as f64 * factor.abs()).round_ties_even() as u64
}
