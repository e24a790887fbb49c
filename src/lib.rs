//! Beat-synchronised rhythm quiz engine
//!
//! Plays a "call and response" image quiz against a fixed backing track.
//! Continuous playback time is turned into a discrete beat index, the beat
//! index is mapped to visual state (round, highlighted slot, reveal or active
//! block), and a small phase machine drives the game from idle through the
//! countdown and playback to the finished screen.
//!
//! # Features
//! - Pure beat mapping functions with no audio or timer dependency
//! - Clock abstraction over a playable track (manual, silent, rodio)
//! - Cooperative per-frame beat scheduler with cancellable frame requests
//! - Idle/countdown/playing/finished phase machine with subscribers
//! - Orchestrating controller that produces a render state per frame
//!
//! # Crate feature flags
//! - `visualization` (default): Terminal rendering helpers (`visualization`)
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ```no_run
//! use beatquiz::clock::ManualClock;
//! use beatquiz::{Challenge, GameBeatController, Settings};
//!
//! let challenge = Challenge::load("challenge.json").unwrap();
//! let clock = ManualClock::new(Some(60.0));
//! let handle = clock.handle();
//! let settings = Settings::default();
//! let mut game = GameBeatController::new(challenge, settings, Box::new(clock)).unwrap();
//!
//! game.start();
//! loop {
//!     handle.advance(1.0 / 60.0);
//!     game.update(1.0 / 60.0);
//!     let state = game.render_state();
//!     if state.phase.is_finished() {
//!         break;
//!     }
//! }
//! ```

#![warn(missing_docs)]

pub mod beat; // Beat math and timing tunables
pub mod challenge; // Rounds and slots
pub mod clock; // Playback clocks
pub mod config; // Settings files
pub mod game; // Session orchestration
pub mod phase; // Game phase machine
pub mod scheduler; // Per-frame beat polling
#[cfg(feature = "visualization")]
pub mod visualization; // Terminal UI Helpers

/// Error types for rhythm quiz operations
#[derive(thiserror::Error, Debug)]
pub enum BeatQuizError {
    /// Error while parsing a challenge or settings file
    #[error("Parse error: {0}")]
    ParseError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Playback could not start (device policy, decode or load failure)
    #[error("Playback could not start: {0}")]
    PlaybackStart(String),

    /// A round does not hold exactly one slot per step
    #[error("Round {round} has {actual} slots, expected {expected}")]
    ConfigMismatch {
        /// 1-based round number
        round: usize,
        /// Configured steps per round
        expected: u64,
        /// Slots found in the round
        actual: usize,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for BeatQuizError {
    /// Converts a String into `BeatQuizError::Other`.
    ///
    /// Prefer the specific variants (`ConfigError`, `ParseError`,
    /// `PlaybackStart`) where the failure has a known category.
    fn from(msg: String) -> Self {
        BeatQuizError::Other(msg)
    }
}

impl From<&str> for BeatQuizError {
    /// Converts a string slice into `BeatQuizError::Other`.
    fn from(msg: &str) -> Self {
        BeatQuizError::Other(msg.to_string())
    }
}

impl From<serde_json::Error> for BeatQuizError {
    fn from(err: serde_json::Error) -> Self {
        BeatQuizError::ParseError(err.to_string())
    }
}

/// Result type for rhythm quiz operations
pub type Result<T> = std::result::Result<T, BeatQuizError>;

// Public API exports
pub use beat::{BeatConfig, BeatPosition};
pub use challenge::{Challenge, Round, Slot};
pub use clock::{AudioClockSource, ManualClock, SilentClock};
pub use config::Settings;
pub use game::{GameBeatController, RenderState};
pub use phase::{GamePhase, GamePhaseController, PhaseTransition, PhaseTrigger};
pub use scheduler::{BeatListener, BeatScheduler, FrameRequest};

#[cfg(feature = "streaming")]
pub use clock::RodioClock;
#[cfg(feature = "visualization")]
pub use visualization::{create_progress_bar, create_slot_row, create_status_line};
