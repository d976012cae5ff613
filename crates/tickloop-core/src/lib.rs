//! Simulated clock, tick jitter, and bounded loop driver for tickloop.
//!
//! This crate owns the simulated time base and the loop it drives: each
//! iteration ticks the clock by a jittered, multiplier-scaled step, then
//! runs the caller's update and report hooks, until the cumulative
//! simulated time reaches a budget.
//!
//! # Modules
//!
//! - [`clock`] -- [`SimulatedClock`] and the [`TimeSnapshot`] it produces.
//! - [`config`] -- Configuration loading from `tickloop-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- [`StopSignal`] for cooperative cancellation.
//! - [`jitter`] -- [`JitterSource`] trait with seeded and scripted sources.
//! - [`report`] -- Interval report formatting and [`ConsoleReporter`].
//! - [`runner`] -- [`LoopDriver`] and the [`LoopHooks`] it invokes.
//!
//! [`SimulatedClock`]: clock::SimulatedClock
//! [`TimeSnapshot`]: clock::TimeSnapshot
//! [`StopSignal`]: control::StopSignal
//! [`JitterSource`]: jitter::JitterSource
//! [`ConsoleReporter`]: report::ConsoleReporter
//! [`LoopDriver`]: runner::LoopDriver
//! [`LoopHooks`]: runner::LoopHooks

pub mod clock;
pub mod config;
pub mod control;
pub mod jitter;
pub mod report;
pub mod runner;
