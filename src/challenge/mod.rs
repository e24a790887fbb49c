//! Challenge configuration
//!
//! Ordered rounds of slots as handed over by the repository layer. The
//! engine only reads this data; [`Challenge::validate_for`] is the single
//! shape check, run once before a session starts.

use crate::beat::BeatConfig;
use crate::{BeatQuizError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One displayable item within a round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Image reference (path or URL)
    #[serde(default, alias = "imagePath", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Optional display label
    #[serde(default, alias = "displayText", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Slot {
    /// Slot showing an image
    pub fn image(image: impl Into<String>) -> Self {
        Slot {
            image: Some(image.into()),
            label: None,
        }
    }

    /// Attach a display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Slot with neither image nor label
    pub fn is_empty(&self) -> bool {
        self.image.as_deref().map_or(true, str::is_empty)
            && self.label.as_deref().map_or(true, str::is_empty)
    }
}

/// One set of slots played during `beats_per_round` beats
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Slots in display order
    pub slots: Vec<Slot>,
}

impl Round {
    /// Round holding the given slots
    pub fn new(slots: Vec<Slot>) -> Self {
        Round { slots }
    }
}

/// A playable challenge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge title
    #[serde(default)]
    pub title: String,
    /// Whether slot labels are shown under the images
    #[serde(default, alias = "showNames")]
    pub show_names: bool,
    /// Rounds in play order
    #[serde(alias = "gameConfig", alias = "game_config")]
    pub rounds: Vec<Round>,
}

impl Challenge {
    /// Challenge with the given title and rounds
    pub fn new(title: impl Into<String>, rounds: Vec<Round>) -> Self {
        Challenge {
            title: title.into(),
            show_names: false,
            rounds,
        }
    }

    /// Parse a challenge from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a challenge from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(|e| {
            BeatQuizError::ParseError(format!("{}: {}", path.display(), e))
        })
    }

    /// Number of rounds
    pub fn total_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Slots of a 1-based round, empty when out of range
    pub fn slots_for_round(&self, round: u64) -> &[Slot] {
        round
            .checked_sub(1)
            .and_then(|index| self.rounds.get(index as usize))
            .map(|r| r.slots.as_slice())
            .unwrap_or(&[])
    }

    /// Check that every round holds exactly one slot per step.
    ///
    /// # Errors
    /// Returns `ConfigMismatch` naming the first offending round (1-based).
    pub fn validate_for(&self, config: &BeatConfig) -> Result<()> {
        for (index, round) in self.rounds.iter().enumerate() {
            if round.slots.len() as u64 != config.steps_per_round {
                return Err(BeatQuizError::ConfigMismatch {
                    round: index + 1,
                    expected: config.steps_per_round,
                    actual: round.slots.len(),
                });
            }
        }
        Ok(())
    }
}
