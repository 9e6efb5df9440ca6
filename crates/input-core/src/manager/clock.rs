//! Manager time.
//!
//! Time only moves when the manager updates.  Each update adds its delta in
//! milliseconds; the fractional part is carried into the next update rather
//! than rounded away, so a long run of 16.67 ms frames does not drift.
//!
//! The millisecond counter is shared through [`Clock`] so recorders and
//! players can stamp and schedule changes without holding the manager.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Read-only handle to the manager's millisecond counter.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    ms: Arc<AtomicU64>,
}

impl Clock {
    /// Milliseconds accumulated over all completed updates.
    pub fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::Acquire)
    }
}

/// Per-frame timing handed to devices and modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous update.
    pub delta_time: f32,
    /// Manager time at the start of this update.
    pub time_ms: u64,
}

/// Owning side of the clock, advanced once per update.
#[derive(Debug, Default)]
pub(crate) struct FrameClock {
    shared: Clock,
    remainder_ms: f64,
}

impl FrameClock {
    pub(crate) fn handle(&self) -> Clock {
        self.shared.clone()
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.shared.now_ms()
    }

    /// Adds `delta_time` seconds.  Negative or non-finite deltas count as zero.
    pub(crate) fn advance(&mut self, delta_time: f32) {
        let delta_ms = if delta_time.is_finite() && delta_time > 0.0 {
            f64::from(delta_time) * 1000.0
        } else {
            0.0
        };
        let total = self.remainder_ms + delta_ms;
        let whole = total.trunc();
        self.remainder_ms = total - whole;
        self.shared.ms.fetch_add(whole as u64, Ordering::Release);
    }
}
