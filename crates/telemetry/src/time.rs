// Path: crates/telemetry/src/time.rs
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

/// Measures the lifetime of a scope and hands the elapsed seconds to `observe`
/// when dropped.
///
/// The observer runs inside `catch_unwind`; a panicking metrics backend is
/// logged and otherwise ignored, so timing never changes the outcome of the
/// code being timed.
pub struct Timer<F: FnOnce(f64)> {
    start: Instant,
    observe: Option<F>,
}

impl<F: FnOnce(f64)> Timer<F> {
    pub fn new(observe: F) -> Self {
        Self {
            start: Instant::now(),
            observe: Some(observe),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Stops the timer now instead of at end of scope.
    pub fn stop(mut self) -> f64 {
        let secs = self.elapsed_secs();
        self.emit(secs);
        secs
    }

    fn emit(&mut self, secs: f64) {
        if let Some(observe) = self.observe.take() {
            if catch_unwind(AssertUnwindSafe(|| observe(secs))).is_err() {
                tracing::warn!(target: "telemetry", "metrics observer panicked; measurement dropped");
            }
        }
    }
}

impl<F: FnOnce(f64)> Drop for Timer<F> {
    fn drop(&mut self) {
        let secs = self.elapsed_secs();
        self.emit(secs);
    }
}
