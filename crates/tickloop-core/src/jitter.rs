//! Random sources that drive tick jitter.
//!
//! The clock never touches a random number generator directly. It asks a
//! [`JitterSource`] for integer draws in `[0, upper)`, which keeps the tick
//! algorithm reproducible: seed an [`RngJitter`] for a repeatable sequence,
//! or script exact draws with [`ScriptedJitter`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform integer draws used by the clock's variance term.
pub trait JitterSource {
    /// Draw a value in the half-open range `[0, upper)`.
    ///
    /// Returns 0 when `upper` is 0.
    fn draw(&mut self, upper: u64) -> u64;
}

/// Jitter backed by a [`rand`] generator.
#[derive(Debug, Clone)]
pub struct RngJitter<R = StdRng> {
    rng: R,
}

impl<R: Rng> RngJitter<R> {
    /// Wrap an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngJitter<StdRng> {
    /// Create a reproducible source from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Create a source seeded from operating system entropy.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> JitterSource for RngJitter<R> {
    fn draw(&mut self, upper: u64) -> u64 {
        if upper == 0 {
            return 0;
        }
        self.rng.random_range(0..upper)
    }
}

/// Replays a fixed list of draws, cycling when it runs out.
///
/// Each value is clamped into `[0, upper)` at draw time. An empty script
/// always draws 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedJitter {
    draws: Vec<u64>,
    cursor: usize,
}

impl ScriptedJitter {
    /// Create a script from the given draws.
    pub const fn new(draws: Vec<u64>) -> Self {
        Self { draws, cursor: 0 }
    }

    /// A script whose every draw is 0, so the variance term is always 0.
    pub const fn zeros() -> Self {
        Self::new(Vec::new())
    }
}

impl JitterSource for ScriptedJitter {
    fn draw(&mut self, upper: u64) -> u64 {
        let Some(&value) = self.draws.get(self.cursor) else {
            return 0;
        };
        self.cursor = self.cursor.saturating_add(1);
        if self.cursor >= self.draws.len() {
            self.cursor = 0;
        }
        value.min(upper.saturating_sub(1))
    }
}
