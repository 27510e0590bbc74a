//! # narrate-rs
//!
//! A Rust library for synchronized narration playback: it turns text plus a
//! finished narration recording into a reading experience where the
//! highlighted word and sentence track the audio's actual playback position,
//! alongside a live waveform display with seek and hover preview.
//!
//! The narration backend only reports a finished audio stream and its total
//! duration, never per-word timestamps. The engine closes that gap with a
//! complexity-weighted timing model over the word list, calibrated online
//! against the real audio duration and early observed drift.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! narrate-rs = "0.1"
//! ```
//!
//! ```ignore
//! use std::time::Instant;
//! use narrate_rs::{clock::ClipClock, playback::NarrationPlayer, sync, NarrationClip};
//! use narrate_rs::waveform::{FftTap, WaveformRenderer};
//!
//! let clip = NarrationClip::read_wav(&std::path::PathBuf::from("narration.wav"))?;
//! let text = sync::segment("Hello world. This is a test.");
//!
//! let clock = ClipClock::for_clip(&clip);
//! let scheduler = sync::SyncScheduler::new(text, sync::TimingWeights::default());
//! let renderer = WaveformRenderer::new(Box::new(FftTap::new(&clip, 1024, 0.8)));
//! let mut player = NarrationPlayer::new(clock, scheduler, renderer);
//!
//! player.play(Instant::now());
//! loop {
//!     let update = player.tick(Instant::now());
//!     if update.finished { break; }
//! }
//! # Ok::<(), narrate_rs::NarrateError>(())
//! ```

pub mod clock;
pub mod playback;
pub mod sanitize;
pub mod sync;
pub mod tui;
pub mod voices;
pub mod waveform;

use std::path::Path;

use crate::voices::NarrationRequest;

/// Errors surfaced by input handling, synthesis, and audio loading.
///
/// Segmentation and timing computations are pure and never fail; only the
/// I/O-bound steps can, and a failure always unwinds to a clean "not
/// playing" state.
#[derive(thiserror::Error, Debug)]
pub enum NarrateError {
    #[error("Input text is empty")]
    EmptyText,
    #[error("Unsupported file type '{0}'. Expected .tex, .latex, or .txt")]
    UnsupportedFile(String),
    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("No readable text remained after markup cleanup")]
    NothingToRead,
    #[error("Rate offset {0}% outside supported range -50..=100")]
    RateOutOfRange(i32),
    #[error("Missing request field: {0}")]
    MissingField(String),
    #[error("Voice '{0}' not found. Call VoiceCatalog::list() to see available voices.")]
    VoiceNotFound(String),
    #[error("Synthesis failed: {0}")]
    Synthesis(String),
    #[error("Audio payload was empty or could not be decoded")]
    EmptyAudio,
    #[error("Invalid voice catalog: {0}")]
    Catalog(String),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A finished narration recording: raw f32 samples plus the sample rate.
///
/// This is all the engine ever learns from a narration backend; per-word
/// timing is reconstructed from it downstream.
#[derive(Debug, Clone)]
pub struct NarrationClip {
    /// Raw mono audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio
    pub sample_rate: u32,
}

impl NarrationClip {
    /// Read a clip from a WAV file, converting integer formats to f32.
    ///
    /// Multi-channel files are reduced to the first channel.
    pub fn read_wav(path: &Path) -> Result<Self, NarrateError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let raw: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Float, _) => {
                reader.samples::<f32>().collect::<Result<_, _>>()?
            }
            (hound::SampleFormat::Int, bits) => {
                let scale = (1u32 << (bits.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let samples: Vec<f32> = raw.iter().copied().step_by(channels).collect();
        if samples.is_empty() {
            return Err(NarrateError::EmptyAudio);
        }

        log::debug!(
            "Read {} samples at {} Hz from {}",
            samples.len(),
            spec.sample_rate,
            path.display()
        );

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), NarrateError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for narration backends.
///
/// A backend turns text into a finished audio clip for a given voice and
/// rate/pitch parameters. It reports no timing beyond the clip itself; the
/// synchronization engine never asks it for more.
pub trait NarrationBackend {
    /// Synthesize narration for the given request.
    ///
    /// Implementations must reject empty text and out-of-range rate offsets
    /// (the request builder already enforces both) and fail with
    /// [`NarrateError::Synthesis`] on transport or encoding errors.
    fn synthesize(&mut self, request: &NarrationRequest) -> Result<NarrationClip, NarrateError>;

    /// Synthesize narration and write it to a WAV file.
    fn synthesize_to_file(
        &mut self,
        request: &NarrationRequest,
        wav_path: &Path,
    ) -> Result<(), NarrateError> {
        self.synthesize(request)?.write_wav(wav_path)
    }
}
