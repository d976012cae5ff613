//! Cooperative stop control for the loop driver.
//!
//! A [`StopSignal`] is a cheap, cloneable handle around a shared atomic
//! flag. The driver checks it at the top of every iteration, before the
//! clock ticks, so a requested stop never interrupts a tick half way.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared stop flag checked by [`LoopDriver`](crate::runner::LoopDriver).
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stop_requested: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create a signal with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a clean stop. Takes effect before the next iteration.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clear() {
        assert!(!StopSignal::new().is_stop_requested());
    }

    #[test]
    fn clones_share_the_flag() {
        let signal = StopSignal::new();
        let handle = signal.clone();
        handle.request_stop();
        assert!(signal.is_stop_requested());
    }

    #[test]
    fn stop_is_visible_across_threads() {
        let signal = StopSignal::new();
        let handle = signal.clone();
        let _ = std::thread::spawn(move || handle.request_stop()).join();
        assert!(signal.is_stop_requested());
    }
}
