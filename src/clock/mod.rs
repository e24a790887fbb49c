//! Playback clocks
//!
//! A clock owns one playable track and reports how far playback has
//! progressed since `play` succeeded. Elapsed time restarts at zero for every
//! session; it is never wall-clock time.
//!
//! Implementations:
//! - [`ManualClock`]: time is moved by the host through a [`ManualClockHandle`]
//! - [`SilentClock`]: wall-clock track of fixed length without an audio device
//! - `RodioClock` (`streaming` feature): decodes a file and plays it through rodio

pub mod manual;
#[cfg(feature = "streaming")]
pub mod rodio_clock;
pub mod silent;

pub use manual::{ManualClock, ManualClockHandle};
#[cfg(feature = "streaming")]
pub use rodio_clock::{CountedSource, PlayPosition, RodioClock};
pub use silent::SilentClock;

use crate::Result;

/// Callback invoked when a track reaches its natural end
pub type EndedCallback = Box<dyn FnMut()>;

/// A playable track with an elapsed-time reading
pub trait AudioClockSource {
    /// Begin playback from position zero.
    ///
    /// # Errors
    /// Returns `PlaybackStart` when the track cannot be started; the clock then
    /// stays not playing and the caller must not assume playback began.
    fn play(&mut self) -> Result<()>;

    /// Pause playback, reset the position to zero and release the output
    /// resource. Calling it while stopped does nothing.
    fn stop(&mut self);

    /// Seconds elapsed since `play` succeeded, zero when not playing
    fn current_elapsed(&self) -> f64;

    /// Whether a session is running
    fn is_playing(&self) -> bool;

    /// Register the end-of-track callback, replacing any previous one
    fn on_ended(&mut self, callback: EndedCallback);

    /// Deliver the end-of-track signal.
    ///
    /// Returns true, after invoking the registered callback, the first time
    /// the natural end of the track is observed in a session. Returns false
    /// on every other call and never reports an end caused by `stop`.
    fn poll_ended(&mut self) -> bool;

    /// Track length in seconds, if known
    fn duration(&self) -> Option<f64> {
        None
    }
}

/// Once-per-session end-of-track latch shared by the clock implementations
#[derive(Default)]
pub struct EndedSignal {
    callback: Option<EndedCallback>,
    fired: bool,
}

impl EndedSignal {
    /// Latch with no callback
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the callback
    pub fn set_callback(&mut self, callback: EndedCallback) {
        self.callback = Some(callback);
    }

    /// Re-arm for a new session
    pub fn arm(&mut self) {
        self.fired = false;
    }

    /// Invoke the callback unless this session already fired.
    /// Returns whether it fired now.
    pub fn fire(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
        true
    }

    /// Whether this session already fired
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl std::fmt::Debug for EndedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndedSignal")
            .field("has_callback", &self.callback.is_some())
            .field("fired", &self.fired)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_ended_signal_fires_once_per_session() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let mut signal = EndedSignal::new();
        signal.set_callback(Box::new(move || seen.set(seen.get() + 1)));

        assert!(signal.fire());
        assert!(!signal.fire());
        assert_eq!(count.get(), 1);

        signal.arm();
        assert!(!signal.has_fired());
        assert!(signal.fire());
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_ended_signal_without_callback() {
        let mut signal = EndedSignal::new();
        assert!(signal.fire());
        assert!(signal.has_fired());
    }
}
