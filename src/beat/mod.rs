//! Beat timing
//!
//! Timing tunables for a playback session and the conversion from elapsed
//! playback seconds to a discrete beat index.

pub mod mapper;

pub use mapper::{
    block_index_of, focused_slot_of, is_active_block, is_complete, round_of,
    should_highlight_slot, BeatPosition,
};

use crate::{BeatQuizError, Result};
use serde::{Deserialize, Serialize};

/// Default tempo of the backing track
pub const DEFAULT_BPM: f64 = 182.0;
/// Default beats per reveal/active block
pub const DEFAULT_BLOCK_SIZE: u64 = 8;
/// Default slots cued per active block
pub const DEFAULT_STEPS_PER_ROUND: u64 = 8;
/// Default beats consumed by one round
pub const DEFAULT_BEATS_PER_ROUND: u64 = 16;
/// Default anticipatory offset in seconds
pub const DEFAULT_OFFSET_SEC: f64 = 0.03;

/// Timing tunables, immutable for the duration of a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// Beats per minute
    pub bpm: f64,
    /// Beats per alternating reveal/active block
    pub block_size: u64,
    /// Slots highlighted per active block
    pub steps_per_round: u64,
    /// Beats consumed by one round (reveal block + active block)
    pub beats_per_round: u64,
    /// Shift added to elapsed time so beats are detected earlier
    pub offset_sec: f64,
}

impl Default for BeatConfig {
    fn default() -> Self {
        BeatConfig {
            bpm: DEFAULT_BPM,
            block_size: DEFAULT_BLOCK_SIZE,
            steps_per_round: DEFAULT_STEPS_PER_ROUND,
            beats_per_round: DEFAULT_BEATS_PER_ROUND,
            offset_sec: DEFAULT_OFFSET_SEC,
        }
    }
}

impl BeatConfig {
    /// Same tunables with a different offset
    pub fn with_offset(self, offset_sec: f64) -> Self {
        BeatConfig { offset_sec, ..self }
    }

    /// Length of one beat in seconds
    pub fn beat_length(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Check the tunables before a session starts.
    ///
    /// # Errors
    /// Returns `ConfigError` for a non-positive or non-finite bpm, zero sizes,
    /// a negative offset, or `beats_per_round < 2 * block_size`.
    pub fn validate(&self) -> Result<()> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(BeatQuizError::ConfigError(format!(
                "bpm must be a positive number, got {}",
                self.bpm
            )));
        }
        if self.block_size == 0 {
            return Err(BeatQuizError::ConfigError(
                "block_size must be > 0".to_string(),
            ));
        }
        if self.steps_per_round == 0 {
            return Err(BeatQuizError::ConfigError(
                "steps_per_round must be > 0".to_string(),
            ));
        }
        if self.beats_per_round < self.block_size.saturating_mul(2) {
            return Err(BeatQuizError::ConfigError(format!(
                "beats_per_round ({}) must be at least twice block_size ({})",
                self.beats_per_round, self.block_size
            )));
        }
        if !self.offset_sec.is_finite() || self.offset_sec < 0.0 {
            return Err(BeatQuizError::ConfigError(format!(
                "offset_sec must be zero or positive, got {}",
                self.offset_sec
            )));
        }
        Ok(())
    }

    /// Beat index for an elapsed playback time.
    ///
    /// Computes `floor((elapsed + offset_sec) / beat_length)`. Returns `None`
    /// while the shifted time is still negative or not a number.
    pub fn beat_at(&self, elapsed: f64) -> Option<u64> {
        let shifted = elapsed + self.offset_sec;
        let beat = (shifted / self.beat_length()).floor();
        if beat.is_finite() && beat >= 0.0 {
            Some(beat as u64)
        } else {
            None
        }
    }

    /// Earliest elapsed time at which `beat` is detected
    pub fn beat_start_time(&self, beat: u64) -> f64 {
        beat as f64 * self.beat_length() - self.offset_sec
    }

    /// Number of beats a challenge with `total_rounds` rounds plays before completing
    pub fn session_beats(&self, total_rounds: usize) -> u64 {
        self.beats_per_round.saturating_mul(total_rounds as u64)
    }
}
