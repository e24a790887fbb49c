//! Fixed-rate frame pacing for hosts without a display compositor

use std::thread;
use std::time::{Duration, Instant};

/// Default display refresh rate
pub const DEFAULT_FRAME_RATE_HZ: u32 = 60;

/// Sleeps until the next frame deadline and reports the frame delta
#[derive(Debug, Clone)]
pub struct FramePacer {
    frame_interval: Duration,
    last_frame: Instant,
    next_deadline: Instant,
}

impl FramePacer {
    /// Pacer for `frame_rate_hz` frames per second (clamped to at least 1)
    pub fn new(frame_rate_hz: u32) -> Self {
        let frame_interval = Duration::from_secs_f64(1.0 / f64::from(frame_rate_hz.max(1)));
        let now = Instant::now();
        FramePacer {
            frame_interval,
            last_frame: now,
            next_deadline: now + frame_interval,
        }
    }

    /// Duration of one frame
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Block until the next frame is due; returns seconds since the previous frame.
    ///
    /// Deadlines advance on a fixed grid so sleeping jitter does not
    /// accumulate. When the caller falls behind by more than a frame the grid
    /// is re-anchored to now instead of bursting through missed frames.
    pub fn wait_next_frame(&mut self) -> f64 {
        let now = Instant::now();
        if let Some(remaining) = self.next_deadline.checked_duration_since(now) {
            thread::sleep(remaining);
        }

        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f64();
        self.last_frame = now;
        self.next_deadline += self.frame_interval;
        if self.next_deadline < now {
            self.next_deadline = now + self.frame_interval;
        }
        delta
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_RATE_HZ)
    }
}
