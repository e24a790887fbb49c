//! Session settings
//!
//! Settings are read from a JSON file. Every field is optional; missing
//! fields fall back to the defaults of the single configured session.
//!
//! ```json
//! {
//!   "beat": { "bpm": 182, "offset_sec": 0.03 },
//!   "countdown_secs": 3,
//!   "track": "assets/song.mp3"
//! }
//! ```

use crate::beat::BeatConfig;
use crate::phase::DEFAULT_COUNTDOWN_SECS;
use crate::scheduler::pacer::DEFAULT_FRAME_RATE_HZ;
use crate::{BeatQuizError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default backing track path
pub const DEFAULT_TRACK: &str = "song.mp3";

/// Settings for one playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Timing tunables
    pub beat: BeatConfig,
    /// Seconds counted before the track starts
    pub countdown_secs: u32,
    /// Frames per second for hosts that pace their own loop
    pub frame_rate_hz: u32,
    /// Backing track
    pub track: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            beat: BeatConfig::default(),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
            track: PathBuf::from(DEFAULT_TRACK),
        }
    }
}

impl Settings {
    /// Parse settings from JSON text and validate them
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    ///
    /// A relative `track` path is resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut settings: Settings = serde_json::from_str(&text).map_err(|e| {
            BeatQuizError::ParseError(format!("{}: {}", path.display(), e))
        })?;
        settings.validate()?;

        if settings.track.is_relative() {
            if let Some(dir) = path.parent() {
                settings.track = dir.join(&settings.track);
            }
        }
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check every field
    pub fn validate(&self) -> Result<()> {
        self.beat.validate()?;
        if self.frame_rate_hz == 0 {
            return Err(BeatQuizError::ConfigError(
                "frame_rate_hz must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_session() {
        let settings = Settings::default();
        assert_eq!(settings.beat, BeatConfig::default());
        assert_eq!(settings.countdown_secs, 3);
        assert_eq!(settings.frame_rate_hz, 60);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json_str(r#"{ "beat": { "bpm": 120 } }"#).unwrap();
        assert_eq!(settings.beat.bpm, 120.0);
        assert_eq!(settings.beat.block_size, 8);
        assert_eq!(settings.countdown_secs, 3);
        assert_eq!(settings.track, PathBuf::from(DEFAULT_TRACK));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Settings::from_json_str(r#"{ "beat": { "beats_per_round": 4 } }"#).unwrap_err();
        assert!(matches!(err, BeatQuizError::ConfigError(_)));

        let err = Settings::from_json_str(r#"{ "frame_rate_hz": 0 }"#).unwrap_err();
        assert!(matches!(err, BeatQuizError::ConfigError(_)));
    }

    #[test]
    fn test_load_resolves_track_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "track": "audio/loop.wav", "countdown_secs": 1 }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.countdown_secs, 1);
        assert_eq!(settings.track, dir.path().join("audio/loop.wav"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            countdown_secs: 5,
            track: dir.path().join("song.ogg"),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }
}
