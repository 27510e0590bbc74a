//! The playback clock: the transport-owned time base the engine observes.
//!
//! The scheduler and the waveform renderer are read-only observers of the
//! clock; the only sanctioned mutation path is the explicit seek, funneled
//! through the playback controller.

use std::time::Instant;

use crate::NarrationClip;

/// Read side plus transport controls of an audio playback position.
///
/// Mirrors the metadata-then-position lifecycle of a media element:
/// `duration()` is `None` until the stream's metadata is known, and the
/// scheduler polls for it before tracking begins.
pub trait PlaybackClock {
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;
    /// Total duration in seconds, once metadata is available.
    fn duration(&self) -> Option<f64>;
    fn paused(&self) -> bool;
    fn ended(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    /// Seek by assignment; the position is clamped to `[0, duration]`.
    fn seek(&mut self, secs: f64);
}

/// Wall-clock driven playback position over a decoded clip.
///
/// Advances in real time while playing, freezes while paused, and reports
/// ended once the position reaches the clip's duration. Duration is known
/// from construction since the clip is already decoded.
#[derive(Debug, Clone)]
pub struct ClipClock {
    duration: f64,
    base_position: f64,
    playing_since: Option<Instant>,
}

impl ClipClock {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration: duration_secs.max(0.0),
            base_position: 0.0,
            playing_since: None,
        }
    }

    pub fn for_clip(clip: &NarrationClip) -> Self {
        Self::new(clip.duration_secs())
    }

    fn position(&self) -> f64 {
        let elapsed = self
            .playing_since
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base_position + elapsed).min(self.duration)
    }
}

impl PlaybackClock for ClipClock {
    fn current_time(&self) -> f64 {
        self.position()
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn paused(&self) -> bool {
        self.playing_since.is_none()
    }

    fn ended(&self) -> bool {
        self.position() >= self.duration
    }

    fn play(&mut self) {
        if self.playing_since.is_none() && !self.ended() {
            self.playing_since = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base_position = self.position();
        self.playing_since = None;
    }

    fn seek(&mut self, secs: f64) {
        self.base_position = secs.clamp(0.0, self.duration);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }
}

/// A hand-driven clock for tests and offline preview rendering.
///
/// Time only moves when told to, so scheduler behavior is deterministic.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: f64,
    duration: Option<f64>,
    paused: bool,
    ended: bool,
}

impl ManualClock {
    /// A clock whose metadata is already loaded.
    pub fn with_duration(duration_secs: f64) -> Self {
        Self {
            time: 0.0,
            duration: Some(duration_secs),
            paused: true,
            ended: false,
        }
    }

    /// A clock still waiting for stream metadata.
    pub fn without_metadata() -> Self {
        Self {
            time: 0.0,
            duration: None,
            paused: true,
            ended: false,
        }
    }

    pub fn set_time(&mut self, secs: f64) {
        self.time = secs;
    }

    pub fn advance(&mut self, secs: f64) {
        self.time += secs;
    }

    pub fn set_duration(&mut self, secs: f64) {
        self.duration = Some(secs);
    }

    pub fn set_ended(&mut self, ended: bool) {
        self.ended = ended;
    }
}

impl PlaybackClock for ManualClock {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn ended(&self) -> bool {
        self.ended
    }

    fn play(&mut self) {
        self.paused = false;
        self.ended = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn seek(&mut self, secs: f64) {
        let max = self.duration.unwrap_or(f64::MAX);
        self.time = secs.clamp(0.0, max);
        self.ended = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_clock_freezes_while_paused() {
        let mut clock = ClipClock::new(10.0);
        assert!(clock.paused());
        clock.seek(4.0);
        assert_eq!(clock.current_time(), 4.0);
        // Never played: position must not drift.
        assert_eq!(clock.current_time(), 4.0);
    }

    #[test]
    fn clip_clock_seek_clamps_to_duration() {
        let mut clock = ClipClock::new(10.0);
        clock.seek(25.0);
        assert_eq!(clock.current_time(), 10.0);
        assert!(clock.ended());
        clock.seek(-3.0);
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn manual_clock_reports_metadata_when_set() {
        let mut clock = ManualClock::without_metadata();
        assert_eq!(clock.duration(), None);
        clock.set_duration(12.5);
        assert_eq!(clock.duration(), Some(12.5));
    }
}
