//! Per-frame beat polling
//!
//! The scheduler samples a clock once per display frame and turns the
//! elapsed time into beat events. Each frame is run against a
//! [`FrameRequest`]; `stop` invalidates every outstanding request, so a frame
//! that was already queued when the session was torn down fires nothing.
//!
//! A frame that arrives late enough to span several beat boundaries fires
//! only the newest beat. Intermediate beats are not replayed.

pub mod pacer;

pub use pacer::FramePacer;

use crate::beat::BeatConfig;
use crate::clock::AudioClockSource;
use std::ops::ControlFlow;

/// Receives beat events from a running scheduler
pub trait BeatListener {
    /// Called once per newly entered beat, with strictly increasing indices.
    /// Returning `Break` ends the session: the scheduler stops itself and
    /// then calls [`BeatListener::on_complete`].
    fn on_beat(&mut self, beat: u64) -> ControlFlow<()>;

    /// Called once when the session ends by track end or by `Break`
    fn on_complete(&mut self);
}

/// [`BeatListener`] built from two closures
pub struct FnListener<B, C> {
    on_beat: B,
    on_complete: C,
}

impl<B, C> FnListener<B, C>
where
    B: FnMut(u64) -> ControlFlow<()>,
    C: FnMut(),
{
    /// Wrap the two callbacks
    pub fn new(on_beat: B, on_complete: C) -> Self {
        FnListener {
            on_beat,
            on_complete,
        }
    }
}

impl<B, C> BeatListener for FnListener<B, C>
where
    B: FnMut(u64) -> ControlFlow<()>,
    C: FnMut(),
{
    fn on_beat(&mut self, beat: u64) -> ControlFlow<()> {
        (self.on_beat)(beat)
    }

    fn on_complete(&mut self) {
        (self.on_complete)()
    }
}

/// Token for one pending frame of one scheduler session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest {
    generation: u64,
}

/// Cooperative beat scheduler
#[derive(Debug, Default)]
pub struct BeatScheduler {
    config: Option<BeatConfig>,
    last_fired_beat: Option<u64>,
    generation: u64,
    beats_fired: u64,
}

impl BeatScheduler {
    /// Create an idle scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session and return its first frame request.
    ///
    /// Any request from an earlier session becomes stale.
    pub fn start(&mut self, config: &BeatConfig) -> FrameRequest {
        self.generation = self.generation.wrapping_add(1);
        self.config = Some(*config);
        self.last_fired_beat = None;
        self.beats_fired = 0;
        log::debug!(
            "beat scheduler started (bpm {}, offset {:.3}s)",
            config.bpm,
            config.offset_sec
        );
        FrameRequest {
            generation: self.generation,
        }
    }

    /// Cancel the pending frame request. Safe to call at any time.
    pub fn stop(&mut self) {
        if self.config.take().is_some() {
            self.generation = self.generation.wrapping_add(1);
            log::debug!("beat scheduler stopped after {} beats", self.beats_fired);
        }
    }

    /// Whether a session is running
    pub fn is_running(&self) -> bool {
        self.config.is_some()
    }

    /// Whether `request` belongs to the running session
    pub fn is_current(&self, request: FrameRequest) -> bool {
        self.is_running() && request.generation == self.generation
    }

    /// Highest beat fired in this session
    pub fn last_fired_beat(&self) -> Option<u64> {
        self.last_fired_beat
    }

    /// Beats fired in this session
    pub fn beats_fired(&self) -> u64 {
        self.beats_fired
    }

    /// Run one display frame.
    ///
    /// Returns the request for the next frame, or `None` once the session is
    /// over or `request` was cancelled.
    pub fn run_frame<C, L>(
        &mut self,
        request: FrameRequest,
        clock: &mut C,
        listener: &mut L,
    ) -> Option<FrameRequest>
    where
        C: AudioClockSource + ?Sized,
        L: BeatListener + ?Sized,
    {
        if !self.is_current(request) {
            return None;
        }
        let config = self.config?;

        if clock.poll_ended() {
            self.stop();
            listener.on_complete();
            return None;
        }

        if let Some(beat) = config.beat_at(clock.current_elapsed()) {
            if self.last_fired_beat.map_or(true, |last| beat > last) {
                self.last_fired_beat = Some(beat);
                self.beats_fired += 1;
                log::trace!("beat {}", beat);
                if listener.on_beat(beat).is_break() {
                    self.stop();
                    listener.on_complete();
                    return None;
                }
            }
        }

        Some(request)
    }
}
