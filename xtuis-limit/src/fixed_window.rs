use std::time::Duration;

use parking_lot::Mutex;
use quanta::Clock;
use quanta::Instant;

use super::Limiter;

/// A simple window-based limiter.
///
/// Counts permitted operations until the window ends. The first call that
/// observes a time strictly after the end of the window starts a fresh window
/// at that instant, so the boundaries follow the callers rather than the wall
/// clock. Like any fixed window it can let through up to twice the capacity
/// in a short period spanning two windows.
///
/// A `capacity` of zero denies everything. A zero `window` ends the moment it
/// starts, so every call observed later than the last reset begins a new
/// window.
#[derive(Debug)]
pub struct FixedWindow {
    capacity: usize,
    window: Duration,
    window_ns: u64,
    state: Mutex<Window>,
    clock: Clock,
    anchor: Instant,
}

#[derive(Debug)]
struct Window {
    count: usize,
    /// Nanoseconds from `anchor` at which this window expires.
    end: u64,
}

impl Limiter for FixedWindow {
    fn limit(&self) -> bool {
        let mut state = self.state.lock();

        let now = self.elapsed();
        if now > state.end {
            state.count = 0;
            state.end = now.saturating_add(self.window_ns);
        }

        if state.count >= self.capacity {
            return false;
        }

        state.count += 1;
        true
    }
}

impl FixedWindow {
    /// Creates a new `FixedWindow` driven by the system's monotonic clock.
    ///
    /// # Arguments
    ///
    /// * `capacity` - The maximum number of operations allowed within a single window.
    /// * `window` - The duration of the window.
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self::with_clock(capacity, window, Clock::new())
    }

    /// Creates a new `FixedWindow` reading time from `clock`.
    ///
    /// Use [`Clock::mock`] to drive the window deterministically.
    pub fn with_clock(capacity: usize, window: Duration, clock: Clock) -> Self {
        let anchor = clock.now();
        let window_ns = u64::try_from(window.as_nanos()).unwrap_or(u64::MAX);
        Self {
            capacity,
            window,
            window_ns,
            state: Mutex::new(Window {
                count: 0,
                end: window_ns,
            }),
            clock,
            anchor,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Quota left in the current window, as of the most recent call.
    ///
    /// An expired window is not reset here; that only happens in `limit()`.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.state.lock().count)
    }

    // Instants before the anchor (a clock stepping backwards) read as zero.
    fn elapsed(&self) -> u64 {
        let nanos = self
            .clock
            .now()
            .saturating_duration_since(self.anchor)
            .as_nanos();
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }
}
