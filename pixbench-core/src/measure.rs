//! Run Measurement
//!
//! Wall-clock timing plus a best-effort memory snapshot for one compression
//! attempt. The memory figure is the current thread's net allocation between
//! `start` and `stop`; it is 0 when [`TrackingAllocator`](crate::TrackingAllocator)
//! is not installed.

use crate::allocator::{current_allocation, is_tracking, reset_allocation_counter};
use std::time::{Duration, Instant};

/// Measurement captured by [`RunTimer::stop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Elapsed wall-clock time
    pub elapsed: Duration,
    /// Net bytes allocated on this thread during the run (0 if unmeasurable)
    pub memory_delta: i64,
}

impl Measurement {
    /// Elapsed time in whole milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Timer for a single run
pub struct RunTimer {
    start: Instant,
    baseline: i64,
}

impl RunTimer {
    /// Take the "before" snapshot and start the clock
    #[inline]
    pub fn start() -> Self {
        reset_allocation_counter();
        let (baseline, _) = current_allocation();
        Self {
            start: Instant::now(),
            baseline,
        }
    }

    /// Take the "after" snapshot
    ///
    /// Call this while the buffers produced by the run are still alive,
    /// otherwise the delta collapses towards zero.
    #[inline]
    pub fn stop(&self) -> Measurement {
        let elapsed = self.start.elapsed();
        let memory_delta = if is_tracking() {
            let (net, _) = current_allocation();
            net - self.baseline
        } else {
            0
        };
        Measurement {
            elapsed,
            memory_delta,
        }
    }
}
