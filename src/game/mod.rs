//! Session orchestration
//!
//! [`GameBeatController`] wires a clock, the beat scheduler and the phase
//! machine to one challenge and produces the [`RenderState`] a presentation
//! layer paints every frame.
//!
//! Entering `Playing` starts the clock first and the scheduler only once the
//! clock confirmed playback. Leaving `Playing`, for any reason including
//! drop, stops the scheduler before the clock so no frame can sample a
//! clock that is already gone.

use crate::beat::{BeatConfig, BeatPosition};
use crate::challenge::{Challenge, Slot};
use crate::clock::AudioClockSource;
use crate::config::Settings;
use crate::phase::{
    Countdown, CountdownStatus, GamePhase, GamePhaseController, PhaseTransition, PhaseTrigger,
    SubscriptionId,
};
use crate::scheduler::{BeatListener, BeatScheduler, FrameRequest};
use crate::{BeatQuizError, Result};
use std::fmt;
use std::ops::ControlFlow;

/// Visual state of a playing session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatState {
    /// Highest beat handled, `None` before the first beat
    pub last_fired_beat: Option<u64>,
    /// 1-based round
    pub current_round: u64,
    /// Cued slot, `None` during reveal blocks
    pub focused_slot: Option<usize>,
    /// Whether the current block cues slots
    pub is_active_phase: bool,
}

impl Default for BeatState {
    fn default() -> Self {
        BeatState {
            last_fired_beat: None,
            current_round: 1,
            focused_slot: None,
            is_active_phase: false,
        }
    }
}

/// Beat handling for one playing session
#[derive(Debug)]
struct BeatSession {
    config: BeatConfig,
    total_rounds: usize,
    state: BeatState,
    completed: bool,
}

impl BeatSession {
    fn new(config: BeatConfig, total_rounds: usize) -> Self {
        BeatSession {
            config,
            total_rounds,
            state: BeatState::default(),
            completed: false,
        }
    }
}

impl BeatListener for BeatSession {
    fn on_beat(&mut self, beat: u64) -> ControlFlow<()> {
        self.state.last_fired_beat = Some(beat);
        let position = BeatPosition::locate(beat, &self.config, self.total_rounds);

        if position.is_complete {
            self.state.focused_slot = None;
            self.state.is_active_phase = false;
            log::debug!("beat {} is past round {}", beat, self.total_rounds);
            return ControlFlow::Break(());
        }

        if position.round != self.state.current_round {
            log::debug!("round {}/{}", position.round, self.total_rounds);
        }
        self.state.current_round = position.round;
        self.state.is_active_phase = position.is_active;
        self.state.focused_slot = position.focused_slot;
        ControlFlow::Continue(())
    }

    fn on_complete(&mut self) {
        self.completed = true;
    }
}

/// Everything a presentation layer needs for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState<'a> {
    /// Current phase
    pub phase: GamePhase,
    /// Highlighted slot, `None` outside active blocks
    pub focused_slot: Option<usize>,
    /// 1-based round
    pub current_round: u64,
    /// Slots of the current round
    pub current_slots: &'a [Slot],
    /// Rounds in the challenge
    pub total_rounds: usize,
    /// Whether slot labels are shown
    pub show_names: bool,
    /// Countdown number while counting down
    pub countdown: Option<u32>,
    /// Last beat handled in this session
    pub beat: Option<u64>,
    /// Why playback could not start; cleared by the next `start`
    pub start_failure: Option<&'a str>,
}

/// Orchestrates one challenge's playback
pub struct GameBeatController {
    challenge: Challenge,
    settings: Settings,
    clock: Box<dyn AudioClockSource>,
    scheduler: BeatScheduler,
    phase: GamePhaseController,
    countdown: Countdown,
    session: Option<BeatSession>,
    pending_frame: Option<FrameRequest>,
    start_failure: Option<String>,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl GameBeatController {
    /// Prepare a game.
    ///
    /// # Errors
    /// Refuses before any audio plays when the settings are invalid, the
    /// challenge has no rounds, or a round's slot count differs from
    /// `steps_per_round` (`ConfigMismatch`).
    pub fn new(
        challenge: Challenge,
        settings: Settings,
        mut clock: Box<dyn AudioClockSource>,
    ) -> Result<Self> {
        settings.validate()?;
        if challenge.rounds.is_empty() {
            return Err(BeatQuizError::ConfigError(
                "challenge has no rounds".to_string(),
            ));
        }
        challenge.validate_for(&settings.beat)?;

        let session_secs = settings.beat.session_beats(challenge.total_rounds()) as f64
            * settings.beat.beat_length();
        if let Some(track_secs) = clock.duration() {
            if track_secs < session_secs {
                log::warn!(
                    "track is {:.1}s but {} rounds need {:.1}s; the game will end with the track",
                    track_secs,
                    challenge.total_rounds(),
                    session_secs
                );
            }
        }
        clock.on_ended(Box::new(|| log::info!("backing track reached its end")));

        log::info!(
            "prepared '{}' ({} rounds, {} bpm)",
            challenge.title,
            challenge.total_rounds(),
            settings.beat.bpm
        );

        let countdown = Countdown::new(settings.countdown_secs);
        Ok(GameBeatController {
            challenge,
            settings,
            clock,
            scheduler: BeatScheduler::new(),
            phase: GamePhaseController::new(),
            countdown,
            session: None,
            pending_frame: None,
            start_failure: None,
            on_complete: None,
        })
    }

    /// Register the post-game signal, fired each time `Finished` is reached
    pub fn on_complete(&mut self, callback: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Be told about every phase transition
    pub fn subscribe_phase(
        &mut self,
        subscriber: impl FnMut(PhaseTransition) + 'static,
    ) -> SubscriptionId {
        self.phase.subscribe(subscriber)
    }

    /// Remove a phase subscriber
    pub fn unsubscribe_phase(&mut self, id: SubscriptionId) -> bool {
        self.phase.unsubscribe(id)
    }

    /// Current phase
    pub fn phase(&self) -> GamePhase {
        self.phase.phase()
    }

    /// The challenge being played
    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    /// Session settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Beat state of the running session
    pub fn beat_state(&self) -> Option<&BeatState> {
        self.session.as_ref().map(|session| &session.state)
    }

    /// Seconds of playback in the running session
    pub fn elapsed(&self) -> f64 {
        if self.phase.phase().is_playing() {
            self.clock.current_elapsed()
        } else {
            0.0
        }
    }

    /// Start action: begins the countdown from `Idle`, or re-arms it after a
    /// failed playback start. Returns whether anything happened.
    pub fn start(&mut self) -> bool {
        match self.phase.phase() {
            GamePhase::Idle => self.transition(PhaseTrigger::Start),
            GamePhase::Countdown if self.start_failure.is_some() => {
                log::info!("retrying playback start");
                self.start_failure = None;
                self.countdown.reset();
                true
            }
            _ => false,
        }
    }

    /// Go back to `Idle` after a finished game
    pub fn restart(&mut self) -> bool {
        self.transition(PhaseTrigger::Restart)
    }

    /// Run one display frame; `dt` is the time since the previous frame
    pub fn update(&mut self, dt: f64) {
        match self.phase.phase() {
            GamePhase::Countdown => {
                if self.start_failure.is_none()
                    && self.countdown.advance(dt) == CountdownStatus::Elapsed
                {
                    self.begin_playback();
                }
            }
            GamePhase::Playing => self.run_frame(),
            GamePhase::Idle | GamePhase::Finished => {}
        }
    }

    /// State for the presentation layer
    pub fn render_state(&self) -> RenderState<'_> {
        let state = self.beat_state().copied().unwrap_or_default();
        let phase = self.phase.phase();
        RenderState {
            phase,
            focused_slot: state.focused_slot,
            current_round: state.current_round,
            current_slots: self.challenge.slots_for_round(state.current_round),
            total_rounds: self.challenge.total_rounds(),
            show_names: self.challenge.show_names,
            countdown: phase
                .is_countdown()
                .then(|| self.countdown.display_count()),
            beat: state.last_fired_beat,
            start_failure: self.start_failure.as_deref(),
        }
    }

    fn begin_playback(&mut self) {
        if let Err(err) = self.clock.play() {
            log::warn!("{}", err);
            self.start_failure = Some(err.to_string());
            return;
        }
        self.transition(PhaseTrigger::CountdownElapsed);
    }

    fn run_frame(&mut self) {
        let (Some(request), Some(session)) = (self.pending_frame.take(), self.session.as_mut())
        else {
            return;
        };
        self.pending_frame = self
            .scheduler
            .run_frame(request, self.clock.as_mut(), session);

        if session.completed {
            self.transition(PhaseTrigger::TrackEnded);
        }
    }

    fn transition(&mut self, trigger: PhaseTrigger) -> bool {
        match self.phase.request(trigger) {
            Some(transition) => {
                self.apply(transition);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, transition: PhaseTransition) {
        if transition.leaves(GamePhase::Playing) {
            self.teardown();
        }
        match transition.to {
            GamePhase::Countdown => {
                self.start_failure = None;
                self.countdown.reset();
            }
            GamePhase::Playing => {
                self.session = Some(BeatSession::new(
                    self.settings.beat,
                    self.challenge.total_rounds(),
                ));
                self.pending_frame = Some(self.scheduler.start(&self.settings.beat));
            }
            GamePhase::Finished => {
                if let Some(callback) = self.on_complete.as_mut() {
                    callback();
                }
            }
            GamePhase::Idle => {}
        }
    }

    fn teardown(&mut self) {
        self.pending_frame = None;
        self.scheduler.stop();
        self.clock.stop();
        self.session = None;
    }
}

impl Drop for GameBeatController {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for GameBeatController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameBeatController")
            .field("title", &self.challenge.title)
            .field("phase", &self.phase.phase())
            .field("session", &self.session)
            .field("start_failure", &self.start_failure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::Round;
    use crate::clock::{ManualClock, ManualClockHandle};
    use std::cell::Cell;
    use std::rc::Rc;

    fn challenge(rounds: usize) -> Challenge {
        Challenge::new(
            "test",
            (0..rounds)
                .map(|r| Round::new((0..8).map(|s| Slot::image(format!("{r}-{s}"))).collect()))
                .collect(),
        )
    }

    fn settings() -> Settings {
        Settings {
            countdown_secs: 0,
            ..Settings::default()
        }
    }

    fn game(rounds: usize) -> (GameBeatController, ManualClockHandle) {
        let clock = ManualClock::new(None);
        let handle = clock.handle();
        let game = GameBeatController::new(challenge(rounds), settings(), Box::new(clock)).unwrap();
        (game, handle)
    }

    /// Put the clock in the middle of `beat` and run a frame
    fn play_beat(game: &mut GameBeatController, handle: &ManualClockHandle, beat: u64) {
        let config = game.settings().beat;
        handle.set_elapsed(config.beat_start_time(beat) + config.beat_length() * 0.5);
        game.update(0.0);
    }

    #[test]
    fn test_rejects_mismatched_round() {
        let mut bad = challenge(2);
        bad.rounds[1].slots.truncate(6);
        let clock = ManualClock::new(None);
        let handle = clock.handle();

        let err = GameBeatController::new(bad, settings(), Box::new(clock)).unwrap_err();
        assert!(matches!(err, BeatQuizError::ConfigMismatch { round: 2, .. }));
        assert_eq!(handle.play_count(), 0);
    }

    #[test]
    fn test_rejects_empty_challenge() {
        let clock = ManualClock::new(None);
        let err = GameBeatController::new(challenge(0), settings(), Box::new(clock)).unwrap_err();
        assert!(matches!(err, BeatQuizError::ConfigError(_)));
    }

    #[test]
    fn test_countdown_then_playing() {
        let clock = ManualClock::new(None);
        let handle = clock.handle();
        let mut game = GameBeatController::new(
            challenge(1),
            Settings {
                countdown_secs: 3,
                ..Settings::default()
            },
            Box::new(clock),
        )
        .unwrap();

        assert!(game.start());
        assert_eq!(game.render_state().countdown, Some(3));
        game.update(1.0);
        game.update(1.0);
        assert_eq!(game.render_state().countdown, Some(1));
        assert!(!handle.is_playing());
        game.update(1.0);
        assert!(game.phase().is_playing());
        assert!(handle.is_playing());
        assert_eq!(game.render_state().countdown, None);
    }

    #[test]
    fn test_reveal_then_active_block() {
        let (mut game, handle) = game(5);
        game.start();
        game.update(0.0);
        assert!(game.phase().is_playing());

        for beat in 0..8 {
            play_beat(&mut game, &handle, beat);
            let state = game.render_state();
            assert_eq!(state.current_round, 1);
            assert_eq!(state.focused_slot, None);
        }
        for beat in 8..16 {
            play_beat(&mut game, &handle, beat);
            let state = game.render_state();
            assert_eq!(state.current_round, 1);
            assert_eq!(state.focused_slot, Some((beat - 8) as usize));
            assert_eq!(state.current_slots[0].image.as_deref(), Some("0-0"));
        }
        play_beat(&mut game, &handle, 16);
        let state = game.render_state();
        assert_eq!(state.current_round, 2);
        assert_eq!(state.focused_slot, None);
        assert_eq!(state.current_slots[0].image.as_deref(), Some("1-0"));
        assert_eq!(game.beat_state().map(|s| s.is_active_phase), Some(false));
    }

    #[test]
    fn test_overflow_finishes_and_tears_down() {
        let (mut game, handle) = game(1);
        let completions = Rc::new(Cell::new(0));
        let seen = Rc::clone(&completions);
        game.on_complete(move || seen.set(seen.get() + 1));

        game.start();
        game.update(0.0);
        play_beat(&mut game, &handle, 15);
        assert!(game.phase().is_playing());
        play_beat(&mut game, &handle, 16);

        assert!(game.phase().is_finished());
        assert_eq!(completions.get(), 1);
        assert!(!handle.is_playing());
        assert_eq!(handle.stop_count(), 1);
        assert!(game.beat_state().is_none());
        assert_eq!(game.render_state().focused_slot, None);

        // Frames after the end change nothing
        game.update(1.0);
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn test_track_end_finishes_game() {
        let clock = ManualClock::new(Some(2.0));
        let handle = clock.handle();
        let mut game = GameBeatController::new(challenge(5), settings(), Box::new(clock)).unwrap();

        game.start();
        game.update(0.0);
        handle.finish_track();
        game.update(0.0);
        assert!(game.phase().is_finished());
        assert!(!handle.is_playing());
    }

    #[test]
    fn test_playback_failure_stays_in_countdown() {
        let (mut game, handle) = game(1);
        handle.fail_next_play("autoplay blocked");

        game.start();
        game.update(0.0);
        assert!(game.phase().is_countdown());
        assert_eq!(
            game.render_state().start_failure,
            Some("Playback could not start: autoplay blocked")
        );

        // No automatic retry
        game.update(1.0);
        assert_eq!(handle.play_count(), 0);

        assert!(game.start());
        assert_eq!(game.render_state().start_failure, None);
        game.update(0.0);
        assert!(game.phase().is_playing());
        assert_eq!(handle.play_count(), 1);
    }

    #[test]
    fn test_restart_resets_beat_state() {
        let (mut game, handle) = game(1);
        game.start();
        game.update(0.0);
        play_beat(&mut game, &handle, 10);
        play_beat(&mut game, &handle, 16);
        assert!(game.phase().is_finished());

        assert!(game.restart());
        assert!(game.phase().is_idle());
        game.start();
        game.update(0.0);

        let state = game.beat_state().copied().unwrap();
        assert_eq!(state, BeatState::default());
        play_beat(&mut game, &handle, 0);
        assert_eq!(game.render_state().beat, Some(0));
        assert_eq!(handle.play_count(), 2);
    }

    #[test]
    fn test_start_ignored_while_playing() {
        let (mut game, _handle) = game(1);
        game.start();
        game.update(0.0);
        assert!(!game.start());
        assert!(!game.restart());
        assert!(game.phase().is_playing());
    }

    #[test]
    fn test_drop_stops_clock() {
        let (mut game, handle) = game(2);
        game.start();
        game.update(0.0);
        assert!(handle.is_playing());
        drop(game);
        assert!(!handle.is_playing());
    }
}
