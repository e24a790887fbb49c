//! Count-in before the track starts

/// Seconds counted before playback
pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;

/// Result of advancing a [`Countdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStatus {
    /// Still counting; the number to display
    Counting(u32),
    /// Reached zero during this advance
    Elapsed,
    /// Reached zero earlier
    Expired,
}

/// Whole-second countdown driven by frame deltas
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    initial_count: u32,
    remaining: f64,
    elapsed_reported: bool,
}

impl Countdown {
    /// Countdown from `initial_count` seconds
    pub fn new(initial_count: u32) -> Self {
        Countdown {
            initial_count,
            remaining: f64::from(initial_count),
            elapsed_reported: false,
        }
    }

    /// Start over from the initial count
    pub fn reset(&mut self) {
        self.remaining = f64::from(self.initial_count);
        self.elapsed_reported = false;
    }

    /// Number currently shown (3, 2, 1, then 0)
    pub fn display_count(&self) -> u32 {
        self.remaining.max(0.0).ceil() as u32
    }

    /// Whether zero has been reached
    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Advance by `dt` seconds.
    ///
    /// [`CountdownStatus::Elapsed`] is returned exactly once, on the advance
    /// that reaches zero (immediately for a zero-length countdown).
    pub fn advance(&mut self, dt: f64) -> CountdownStatus {
        if self.elapsed_reported {
            return CountdownStatus::Expired;
        }
        self.remaining -= dt.max(0.0);
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.elapsed_reported = true;
            CountdownStatus::Elapsed
        } else {
            CountdownStatus::Counting(self.display_count())
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS)
    }
}
