//! Bounded loop driver.
//!
//! This module provides [`LoopDriver`], which owns a [`SimulatedClock`] and
//! drives the update/report cycle until a simulated-time budget is spent:
//!
//! - **Budget check first**: the exit condition is evaluated against the
//!   clock's total *before* each tick, so a fresh clock always runs at
//!   least one iteration for any positive budget.
//! - **Overshoot, never truncate**: the final tick is kept whole, so the
//!   total on return is greater than or equal to the budget.
//! - **Optional stop**: a [`StopSignal`] ends the run cleanly before the
//!   next tick.
//!
//! Termination follows from the clock's 1ms minimum step: a run performs
//! at most `budget_ms` iterations.

use tracing::{info, trace, warn};

use crate::clock::{SimulatedClock, TimeSnapshot};
use crate::control::StopSignal;
use crate::jitter::{JitterSource, RngJitter};

/// Reason a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// The clock's total reached the budget.
    BudgetReached,
    /// The budget was zero or negative, so no iteration ran.
    EmptyBudget,
    /// A stop was requested through the driver's [`StopSignal`].
    StopRequested,
}

/// Result of a single [`LoopDriver::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// Iterations performed by this run.
    pub iterations: u64,
    /// Clock snapshot at the end of the run.
    pub final_snapshot: TimeSnapshot,
}

/// Per-iteration behavior invoked by the driver.
///
/// `update` runs first with the fresh snapshot, then `report` with the
/// same snapshot and the 1-based iteration index.
pub trait LoopHooks {
    /// Advance simulated state for this iteration.
    fn update(&mut self, snapshot: &TimeSnapshot);

    /// Emit the per-iteration report.
    fn report(&mut self, snapshot: &TimeSnapshot, iteration: u64);
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHooks;

impl LoopHooks for NoOpHooks {
    fn update(&mut self, _snapshot: &TimeSnapshot) {}

    fn report(&mut self, _snapshot: &TimeSnapshot, _iteration: u64) {}
}

/// Adapter turning a pair of closures into [`LoopHooks`].
pub struct FnHooks<U, R> {
    on_update: U,
    on_report: R,
}

impl<U, R> FnHooks<U, R>
where
    U: FnMut(&TimeSnapshot),
    R: FnMut(&TimeSnapshot, u64),
{
    /// Build hooks from an update closure and a report closure.
    pub const fn new(on_update: U, on_report: R) -> Self {
        Self {
            on_update,
            on_report,
        }
    }
}

impl<U, R> LoopHooks for FnHooks<U, R>
where
    U: FnMut(&TimeSnapshot),
    R: FnMut(&TimeSnapshot, u64),
{
    fn update(&mut self, snapshot: &TimeSnapshot) {
        (self.on_update)(snapshot);
    }

    fn report(&mut self, snapshot: &TimeSnapshot, iteration: u64) {
        (self.on_report)(snapshot, iteration);
    }
}

/// Drives a [`SimulatedClock`] through bounded update/report cycles.
#[derive(Debug)]
pub struct LoopDriver<J = RngJitter> {
    /// Exclusively owned clock.
    clock: SimulatedClock<J>,

    /// Iterations run over the driver's lifetime (diagnostic only).
    iterations: u64,

    /// Optional external stop flag.
    stop: Option<StopSignal>,
}

impl<J: JitterSource> LoopDriver<J> {
    /// Take ownership of a configured clock.
    pub const fn new(clock: SimulatedClock<J>) -> Self {
        Self {
            clock,
            iterations: 0,
            stop: None,
        }
    }

    /// Attach a stop signal checked before every iteration.
    #[must_use]
    pub fn with_stop_signal(mut self, signal: StopSignal) -> Self {
        self.stop = Some(signal);
        self
    }

    /// Borrow the owned clock.
    pub const fn clock(&self) -> &SimulatedClock<J> {
        &self.clock
    }

    /// Iterations run over the driver's lifetime.
    pub const fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Give back the clock, ending the driver.
    pub fn into_clock(self) -> SimulatedClock<J> {
        self.clock
    }

    /// Run until the clock's total reaches `budget_ms`.
    ///
    /// A budget of zero or less performs no iterations and leaves the clock
    /// untouched. Otherwise each iteration ticks the clock, then calls
    /// [`LoopHooks::update`] and [`LoopHooks::report`] with the new
    /// snapshot.
    pub fn run(&mut self, budget_ms: i64, hooks: &mut dyn LoopHooks) -> RunSummary {
        let mut run_iterations: u64 = 0;

        let Ok(budget) = u64::try_from(budget_ms) else {
            return self.finish(RunEndReason::EmptyBudget, run_iterations);
        };
        if budget == 0 {
            return self.finish(RunEndReason::EmptyBudget, run_iterations);
        }

        info!(
            budget_ms = budget,
            multiplier = self.clock.multiplier(),
            start_total_ms = self.clock.total_ms(),
            "Loop starting"
        );

        loop {
            if self.stop.as_ref().is_some_and(StopSignal::is_stop_requested) {
                info!(total_ms = self.clock.total_ms(), "Stop requested");
                return self.finish(RunEndReason::StopRequested, run_iterations);
            }

            if self.clock.total_ms() >= budget {
                return self.finish(RunEndReason::BudgetReached, run_iterations);
            }

            let snapshot = self.clock.tick();
            self.iterations = self.iterations.saturating_add(1);
            run_iterations = run_iterations.saturating_add(1);

            hooks.update(&snapshot);
            hooks.report(&snapshot, self.iterations);

            trace!(
                iteration = self.iterations,
                elapsed_ms = snapshot.elapsed_ms(),
                total_ms = snapshot.total_ms(),
                "Iteration complete"
            );
        }
    }

    /// Closure form of [`run`](Self::run).
    pub fn run_with<U, R>(&mut self, budget_ms: i64, on_update: U, on_report: R) -> RunSummary
    where
        U: FnMut(&TimeSnapshot),
        R: FnMut(&TimeSnapshot, u64),
    {
        let mut hooks = FnHooks::new(on_update, on_report);
        self.run(budget_ms, &mut hooks)
    }

    fn finish(&self, end_reason: RunEndReason, iterations: u64) -> RunSummary {
        RunSummary {
            end_reason,
            iterations,
            final_snapshot: self.clock.time(),
        }
    }
}

/// Log the outcome of a run.
pub fn log_run_end(summary: &RunSummary) {
    match summary.end_reason {
        RunEndReason::EmptyBudget => {
            warn!("Loop ended with no iterations: budget was not positive");
        }
        reason => {
            info!(
                reason = ?reason,
                iterations = summary.iterations,
                final_elapsed_ms = summary.final_snapshot.elapsed_ms(),
                final_total_ms = summary.final_snapshot.total_ms(),
                "Loop ended"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::jitter::ScriptedJitter;

    fn steady_driver(multiplier: f64) -> LoopDriver<ScriptedJitter> {
        let mut clock = SimulatedClock::new(ScriptedJitter::zeros());
        clock.set_multiplier(multiplier);
        LoopDriver::new(clock)
    }

    #[test]
    fn runs_until_budget_with_overshoot() {
        let mut driver = steady_driver(1.0);
        let mut totals = Vec::new();
        let summary = driver.run_with(23, |_| {}, |snap, _| totals.push(snap.total_ms()));

        assert_eq!(summary.end_reason, RunEndReason::BudgetReached);
        assert_eq!(summary.iterations, 5);
        assert_eq!(totals, vec![5, 10, 15, 20, 25]);
        assert_eq!(summary.final_snapshot.total_ms(), 25);
    }

    #[test]
    fn exact_budget_stops_on_boundary() {
        let mut driver = steady_driver(1.0);
        let summary = driver.run(20, &mut NoOpHooks);
        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.final_snapshot.total_ms(), 20);
    }

    #[test]
    fn budget_smaller_than_one_step_runs_once() {
        let mut driver = steady_driver(1.0);
        let summary = driver.run(1, &mut NoOpHooks);
        assert_eq!(summary.iterations, 1);
        assert_eq!(summary.final_snapshot.total_ms(), 5);
    }

    #[test]
    fn non_positive_budget_is_a_no_op() {
        for budget in [0, -1, i64::MIN] {
            let mut driver = steady_driver(1.0);
            let mut calls = 0_u32;
            let summary = driver.run_with(budget, |_| calls += 1, |_, _| {});
            assert_eq!(summary.end_reason, RunEndReason::EmptyBudget);
            assert_eq!(summary.iterations, 0);
            assert_eq!(driver.clock().total_ms(), 0);
            assert_eq!(calls, 0);
        }
    }

    #[test]
    fn update_runs_before_report_with_same_snapshot() {
        let mut driver = steady_driver(1.0);
        let seen = std::cell::RefCell::new(Vec::new());
        let summary = driver.run_with(
            10,
            |snap| seen.borrow_mut().push(("update", snap.total_ms(), 0)),
            |snap, i| seen.borrow_mut().push(("report", snap.total_ms(), i)),
        );
        assert_eq!(summary.iterations, 2);
        assert_eq!(
            seen.into_inner(),
            vec![
                ("update", 5, 0),
                ("report", 5, 1),
                ("update", 10, 0),
                ("report", 10, 2),
            ]
        );
    }

    #[test]
    fn iteration_index_is_cumulative_across_runs() {
        let mut driver = steady_driver(1.0);
        assert_eq!(driver.run(10, &mut NoOpHooks).iterations, 2);
        let mut indices = Vec::new();
        let summary = driver.run_with(20, |_| {}, |_, i| indices.push(i));
        assert_eq!(summary.iterations, 2);
        assert_eq!(indices, vec![3, 4]);
        assert_eq!(driver.iterations(), 4);
    }

    #[test]
    fn already_spent_budget_runs_nothing() {
        let mut driver = steady_driver(1.0);
        assert_eq!(driver.run(25, &mut NoOpHooks).iterations, 5);
        let summary = driver.run(25, &mut NoOpHooks);
        assert_eq!(summary.end_reason, RunEndReason::BudgetReached);
        assert_eq!(summary.iterations, 0);
    }

    #[test]
    fn stop_before_run_skips_all_iterations() {
        let signal = StopSignal::new();
        signal.request_stop();
        let mut driver = steady_driver(1.0).with_stop_signal(signal);
        let summary = driver.run(1000, &mut NoOpHooks);
        assert_eq!(summary.end_reason, RunEndReason::StopRequested);
        assert_eq!(summary.iterations, 0);
        assert_eq!(driver.clock().total_ms(), 0);
    }

    #[test]
    fn stop_from_hook_ends_after_current_iteration() {
        let signal = StopSignal::new();
        let handle = signal.clone();
        let mut driver = steady_driver(1.0).with_stop_signal(signal);
        let summary = driver.run_with(
            1000,
            |_| {},
            |_, i| {
                if i == 3 {
                    handle.request_stop();
                }
            },
        );
        assert_eq!(summary.end_reason, RunEndReason::StopRequested);
        assert_eq!(summary.iterations, 3);
        assert_eq!(summary.final_snapshot.total_ms(), 15);
    }

    #[test]
    fn seeded_runs_always_cover_budget() {
        for seed in 0..50 {
            let mut clock = SimulatedClock::seeded(seed);
            clock.set_multiplier(2.1);
            let mut driver = LoopDriver::new(clock);
            let summary = driver.run(1000, &mut NoOpHooks);
            assert_eq!(summary.end_reason, RunEndReason::BudgetReached);
            assert!(summary.iterations >= 1);
            assert!(summary.iterations <= 1000);
            assert!(driver.clock().total_ms() >= 1000);
        }
    }

    #[test]
    fn into_clock_returns_advanced_clock() {
        let mut driver = steady_driver(1.0);
        let summary = driver.run(12, &mut NoOpHooks);
        assert_eq!(summary.final_snapshot.total_ms(), 15);
        let clock = driver.into_clock();
        assert_eq!(clock.total_ms(), 15);
    }
}
