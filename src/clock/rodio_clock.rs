//! Audio device playback using rodio
//!
//! Decodes the backing track from memory and plays it on the default output
//! device. The output stream and sink exist only between `play` and `stop`,
//! so nothing stays open across game restarts.
//!
//! Elapsed time is the number of samples the output has pulled from the
//! decoder, not wall-clock time. A stalled or starved device stops the clock.

use super::{AudioClockSource, EndedCallback, EndedSignal};
use crate::{BeatQuizError, Result};
use rodio::{Decoder, OutputStream, Sample, Sink, Source};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared count of samples handed to the output
#[derive(Debug, Clone, Default)]
pub struct PlayPosition {
    samples_played: Arc<AtomicU64>,
    samples_per_sec: f64,
}

impl PlayPosition {
    /// Samples handed to the output so far (all channels)
    pub fn samples_played(&self) -> u64 {
        self.samples_played.load(Ordering::Relaxed)
    }

    /// Seconds of audio handed to the output so far
    pub fn seconds(&self) -> f64 {
        if self.samples_per_sec > 0.0 {
            self.samples_played() as f64 / self.samples_per_sec
        } else {
            0.0
        }
    }
}

/// [`Source`] adapter that counts every sample it yields
pub struct CountedSource<S> {
    inner: S,
    samples_played: Arc<AtomicU64>,
}

impl<S> CountedSource<S>
where
    S: Source,
    S::Item: Sample,
{
    /// Wrap `inner`; the returned position reads `sample_rate * channels`
    /// samples as one second
    pub fn new(inner: S) -> (Self, PlayPosition) {
        let samples_played = Arc::new(AtomicU64::new(0));
        let position = PlayPosition {
            samples_played: Arc::clone(&samples_played),
            samples_per_sec: f64::from(inner.sample_rate()) * f64::from(inner.channels()),
        };
        let source = CountedSource {
            inner,
            samples_played,
        };
        (source, position)
    }
}

impl<S> Iterator for CountedSource<S>
where
    S: Source,
    S::Item: Sample,
{
    type Item = S::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.inner.next()?;
        self.samples_played.fetch_add(1, Ordering::Relaxed);
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S> Source for CountedSource<S>
where
    S: Source,
    S::Item: Sample,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

/// Open output for one playback session
struct Output {
    _stream: OutputStream,
    sink: Sink,
    position: PlayPosition,
}

/// Backing track played through the system audio device
pub struct RodioClock {
    track: Arc<[u8]>,
    label: String,
    duration: Option<f64>,
    output: Option<Output>,
    ended: EndedSignal,
}

impl RodioClock {
    /// Load a track file into memory.
    ///
    /// The file is decoded once up front so format errors surface before the
    /// countdown rather than at the first beat.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            BeatQuizError::AudioDeviceError(format!(
                "Failed to read track '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_bytes(bytes, path.display().to_string())
    }

    /// Use an encoded track that is already in memory
    pub fn from_bytes(bytes: Vec<u8>, label: impl Into<String>) -> Result<Self> {
        let track: Arc<[u8]> = Arc::from(bytes);
        let label = label.into();
        let probe = Decoder::new(Cursor::new(Arc::clone(&track))).map_err(|e| {
            BeatQuizError::AudioDeviceError(format!("Failed to decode track '{}': {}", label, e))
        })?;
        let duration = probe.total_duration().map(|d| d.as_secs_f64());

        Ok(RodioClock {
            track,
            label,
            duration,
            output: None,
            ended: EndedSignal::new(),
        })
    }

    fn open_output(&self) -> Result<Output> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            BeatQuizError::PlaybackStart(format!("Failed to create audio stream: {}", e))
        })?;

        let sink = Sink::try_new(&stream_handle).map_err(|e| {
            BeatQuizError::PlaybackStart(format!("Failed to create audio sink: {}", e))
        })?;

        let decoder = Decoder::new(Cursor::new(Arc::clone(&self.track)))
            .map_err(|e| BeatQuizError::PlaybackStart(format!("Failed to decode track: {}", e)))?;

        let (source, position) = CountedSource::new(decoder);
        sink.append(source);

        Ok(Output {
            _stream: stream,
            sink,
            position,
        })
    }
}

impl AudioClockSource for RodioClock {
    fn play(&mut self) -> Result<()> {
        self.stop();
        let output = self.open_output()?;
        log::info!("playing '{}'", self.label);
        self.output = Some(output);
        self.ended.arm();
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(output) = self.output.take() {
            output.sink.stop();
            log::debug!("released audio output for '{}'", self.label);
        }
    }

    fn current_elapsed(&self) -> f64 {
        self.output
            .as_ref()
            .map(|output| output.position.seconds())
            .unwrap_or(0.0)
    }

    fn is_playing(&self) -> bool {
        self.output.is_some()
    }

    fn on_ended(&mut self, callback: EndedCallback) {
        self.ended.set_callback(callback);
    }

    fn poll_ended(&mut self) -> bool {
        let drained = self
            .output
            .as_ref()
            .map(|output| output.sink.empty())
            .unwrap_or(false);
        drained && self.ended.fire()
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

impl Drop for RodioClock {
    fn drop(&mut self) {
        self.stop();
    }
}
