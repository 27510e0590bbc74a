//! Live waveform rendering driven by the playback clock.
//!
//! A [`SpectrumTap`] supplies frequency-domain magnitudes for the current
//! playback position; [`WaveformRenderer`] turns them into a fixed row of
//! bars with a progress marker and past/upcoming dimming. The renderer is
//! a read-only observer of the clock: it never moves the play position
//! itself, it only translates click coordinates into seek fractions for
//! the playback controller to apply.

use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::Arc;

use crate::clock::PlaybackClock;
use crate::NarrationClip;

/// Bins retained as the externally observable amplitude snapshot.
pub const SNAPSHOT_BINS: usize = 100;

/// Bars drawn per frame.
pub const BAR_COUNT: usize = 64;

/// Peak-to-peak height of the cosmetic sinusoidal jitter.
pub const JITTER_AMPLITUDE: f64 = 0.1;

/// Source of frequency-magnitude samples for a playback position.
///
/// Implementations own their analysis state (FFT plans, smoothing
/// buffers); callers only ever borrow the latest magnitude slice.
pub trait SpectrumTap {
    /// Magnitudes for the analysis window at `position_secs`, each in
    /// `[0, 1]`.
    fn magnitudes(&mut self, position_secs: f64) -> &[f32];
}

/// FFT analysis over a decoded clip.
///
/// Windows the samples around the playback position with a Hann window,
/// runs a forward FFT, and exponentially smooths successive frames so the
/// bars move instead of flickering.
pub struct FftTap {
    samples: Vec<f32>,
    sample_rate: u32,
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    window_size: usize,
    smoothing: f32,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl FftTap {
    /// `window_size` must be a power of two; `smoothing` in `[0, 1)` is
    /// the weight of the previous frame.
    pub fn new(clip: &NarrationClip, window_size: usize, smoothing: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);
        Self {
            samples: clip.samples.clone(),
            sample_rate: clip.sample_rate,
            fft,
            window: hann_window(window_size),
            window_size,
            smoothing: smoothing.clamp(0.0, 0.999),
            scratch: vec![Complex::new(0.0, 0.0); window_size],
            magnitudes: vec![0.0; window_size / 2],
        }
    }
}

impl SpectrumTap for FftTap {
    fn magnitudes(&mut self, position_secs: f64) -> &[f32] {
        let start = (position_secs.max(0.0) * self.sample_rate as f64) as usize;
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            // Positions past the end of the clip analyze as silence.
            let sample = self.samples.get(start + i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = self.window_size as f32;
        for (prev, bin) in self.magnitudes.iter_mut().zip(self.scratch.iter()) {
            let magnitude = (bin.norm() / scale * 4.0).clamp(0.0, 1.0);
            *prev = *prev * self.smoothing + magnitude * (1.0 - self.smoothing);
        }
        &self.magnitudes
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()))
        .collect()
}

/// One bar of a rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveBar {
    /// Height in `[0, 1]`, jitter included.
    pub height: f64,
    /// Whether the bar sits before the display progress (already played).
    pub dimmed: bool,
}

/// One frame of waveform output, ready for a presentation layer to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformFrame {
    pub bars: Vec<WaveBar>,
    /// Display progress in `[0, 1]`: hover preview if set, else playback
    /// position over duration.
    pub progress: f64,
}

/// Per-frame renderer over a spectrum tap and the shared playback clock.
pub struct WaveformRenderer {
    tap: Box<dyn SpectrumTap>,
    hover: Option<f64>,
    snapshot: Vec<f32>,
}

impl WaveformRenderer {
    pub fn new(tap: Box<dyn SpectrumTap>) -> Self {
        Self {
            tap,
            hover: None,
            snapshot: vec![0.0; SNAPSHOT_BINS],
        }
    }

    /// Produce one frame. `wall_secs` keys the cosmetic jitter and has no
    /// bearing on sync: two frames at the same playback position but
    /// different wall times differ only in bar wobble.
    pub fn render(&mut self, clock: &impl PlaybackClock, wall_secs: f64) -> WaveformFrame {
        let position = clock.current_time();
        let magnitudes = self.tap.magnitudes(position);

        for (slot, value) in self.snapshot.iter_mut().zip(magnitudes.iter()) {
            *slot = *value;
        }

        let progress = match self.hover {
            Some(fraction) => fraction,
            None => match clock.duration() {
                Some(duration) if duration > 0.0 => (position / duration).clamp(0.0, 1.0),
                _ => 0.0,
            },
        };

        let bars = (0..BAR_COUNT)
            .map(|i| {
                // Sample the low end of the spectrum across the bar row.
                let bin = i * magnitudes.len().max(1) / (BAR_COUNT * 4);
                let base = magnitudes.get(bin).copied().unwrap_or(0.0) as f64;
                let jitter = (i as f64 * 0.1 + wall_secs).sin() * JITTER_AMPLITUDE;
                let height = (base + jitter * base).clamp(0.0, 1.0);
                let bar_pos = (i as f64 + 0.5) / BAR_COUNT as f64;
                WaveBar {
                    height,
                    dimmed: bar_pos < progress,
                }
            })
            .collect();

        WaveformFrame { bars, progress }
    }

    /// Set the hover preview fraction. Overrides display progress without
    /// touching playback time.
    pub fn set_hover(&mut self, fraction: f64) {
        self.hover = Some(fraction.clamp(0.0, 1.0));
    }

    /// Clear the hover preview (pointer left the waveform).
    pub fn clear_hover(&mut self) {
        self.hover = None;
    }

    pub fn hover(&self) -> Option<f64> {
        self.hover
    }

    /// The first [`SNAPSHOT_BINS`] magnitudes of the latest frame.
    pub fn snapshot(&self) -> &[f32] {
        &self.snapshot
    }
}

/// Translate a horizontal click coordinate into a seek fraction.
pub fn seek_fraction(x: f64, width: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    (x / width).clamp(0.0, 1.0)
}
