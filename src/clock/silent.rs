//! Silent wall-clock track
//!
//! Measures elapsed time with [`Instant`] and reports the end after a fixed
//! duration. Lets the game run where no audio device is available.

use super::{AudioClockSource, EndedCallback, EndedSignal};
use crate::{BeatQuizError, Result};
use std::time::Instant;

/// Track of fixed length that produces no sound
#[derive(Debug)]
pub struct SilentClock {
    duration: f64,
    started_at: Option<Instant>,
    ended: EndedSignal,
}

impl SilentClock {
    /// Create a silent track lasting `duration` seconds
    pub fn new(duration: f64) -> Result<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(BeatQuizError::ConfigError(format!(
                "silent track duration must be positive, got {}",
                duration
            )));
        }
        Ok(SilentClock {
            duration,
            started_at: None,
            ended: EndedSignal::new(),
        })
    }
}

impl AudioClockSource for SilentClock {
    fn play(&mut self) -> Result<()> {
        self.started_at = Some(Instant::now());
        self.ended.arm();
        log::debug!("silent track started ({:.2}s)", self.duration);
        Ok(())
    }

    fn stop(&mut self) {
        self.started_at = None;
    }

    fn current_elapsed(&self) -> f64 {
        self.started_at
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    fn on_ended(&mut self, callback: EndedCallback) {
        self.ended.set_callback(callback);
    }

    fn poll_ended(&mut self) -> bool {
        self.is_playing() && self.current_elapsed() >= self.duration && self.ended.fire()
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }
}
