//! Heartbeat scheduling on a wraparound-safe millisecond clock.

/// Single-timer cooperative scheduler for the periodic `pong` heartbeat.
///
/// Elapsed time is computed with wrapping subtraction on a `u32`
/// millisecond counter, so the schedule survives the monotonic clock
/// overflowing (a 32-bit millis counter wraps roughly every 49.7 days).
/// Each firing resets the baseline to the actual current time: the
/// guarantee is "at least `interval` apart," not drift-free periodicity.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatScheduler {
    last_fire: u32,
    interval_ms: u32,
}

impl HeartbeatScheduler {
    /// Heartbeat interval. Keep this aligned with the hub's offline
    /// timeout: the hub marks a device offline after three missed
    /// heartbeats plus a small buffer (3 * 30 s + 5 s = 95 s).
    pub const PONG_INTERVAL_MS: u32 = 30_000;

    /// Create a scheduler whose baseline is `now`, so the first firing
    /// happens one full interval after construction.
    pub fn new(now: u32) -> Self {
        HeartbeatScheduler {
            last_fire: now,
            interval_ms: Self::PONG_INTERVAL_MS,
        }
    }

    #[cfg(test)]
    fn with_interval(now: u32, interval_ms: u32) -> Self {
        HeartbeatScheduler {
            last_fire: now,
            interval_ms,
        }
    }

    /// Reset the baseline without firing, e.g. after the startup pong.
    pub fn rebase(&mut self, now: u32) {
        self.last_fire = now;
    }

    /// Returns true exactly when a full interval has elapsed since the
    /// last firing, and resets the baseline when it does. The caller is
    /// responsible for actually sending the heartbeat.
    pub fn tick(&mut self, now: u32) -> bool {
        if now.wrapping_sub(self.last_fire) >= self.interval_ms {
            self.last_fire = now;
            return true;
        }
        false
    }
}
