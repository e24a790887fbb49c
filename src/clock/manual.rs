//! Host-driven clock
//!
//! Elapsed time only moves when the host says so. Used for tests, for
//! headless simulation and by hosts that already own a media clock.

use super::{AudioClockSource, EndedCallback, EndedSignal};
use crate::{BeatQuizError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct ManualState {
    elapsed: f64,
    playing: bool,
    duration: Option<f64>,
    fail_next_play: Option<String>,
    play_count: usize,
    stop_count: usize,
}

/// Clock whose elapsed time is advanced through a [`ManualClockHandle`]
#[derive(Debug)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
    ended: EndedSignal,
}

/// Cloneable handle that moves a [`ManualClock`] while something else owns it
#[derive(Debug, Clone)]
pub struct ManualClockHandle {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    /// Create a clock for a track of `duration` seconds (`None` = never ends)
    pub fn new(duration: Option<f64>) -> Self {
        let state = ManualState {
            duration,
            ..ManualState::default()
        };
        ManualClock {
            state: Arc::new(Mutex::new(state)),
            ended: EndedSignal::new(),
        }
    }

    /// Handle for moving time and injecting failures
    pub fn handle(&self) -> ManualClockHandle {
        ManualClockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ManualClockHandle {
    /// Advance playback by `seconds`; ignored while stopped
    pub fn advance(&self, seconds: f64) {
        let mut state = self.state.lock();
        if state.playing {
            state.elapsed += seconds.max(0.0);
        }
    }

    /// Jump to an absolute position; ignored while stopped
    pub fn set_elapsed(&self, seconds: f64) {
        let mut state = self.state.lock();
        if state.playing {
            state.elapsed = seconds.max(0.0);
        }
    }

    /// Make the next `play` call fail with `reason`
    pub fn fail_next_play(&self, reason: impl Into<String>) {
        self.state.lock().fail_next_play = Some(reason.into());
    }

    /// Move playback to the end of the track
    pub fn finish_track(&self) {
        let mut state = self.state.lock();
        if let (true, Some(duration)) = (state.playing, state.duration) {
            state.elapsed = duration;
        }
    }

    /// Current position in seconds
    pub fn elapsed(&self) -> f64 {
        self.state.lock().elapsed
    }

    /// Whether the clock is playing
    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// Successful `play` calls so far
    pub fn play_count(&self) -> usize {
        self.state.lock().play_count
    }

    /// `stop` calls that actually stopped a running session
    pub fn stop_count(&self) -> usize {
        self.state.lock().stop_count
    }
}

impl AudioClockSource for ManualClock {
    fn play(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(reason) = state.fail_next_play.take() {
            state.playing = false;
            return Err(BeatQuizError::PlaybackStart(reason));
        }
        state.elapsed = 0.0;
        state.playing = true;
        state.play_count += 1;
        drop(state);

        self.ended.arm();
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        if state.playing {
            state.stop_count += 1;
        }
        state.playing = false;
        state.elapsed = 0.0;
    }

    fn current_elapsed(&self) -> f64 {
        let state = self.state.lock();
        if state.playing {
            state.elapsed
        } else {
            0.0
        }
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn on_ended(&mut self, callback: EndedCallback) {
        self.ended.set_callback(callback);
    }

    fn poll_ended(&mut self) -> bool {
        let reached_end = {
            let state = self.state.lock();
            match state.duration {
                Some(duration) => state.playing && state.elapsed >= duration,
                None => false,
            }
        };
        reached_end && self.ended.fire()
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }
}
