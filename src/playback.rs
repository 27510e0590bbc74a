//! Playback control: one state machine that owns the clock, the sync
//! scheduler, and the waveform renderer, and funnels every state
//! transition (play, pause, stop, seek) through a single path.

use std::time::Instant;

use crate::clock::PlaybackClock;
use crate::sync::{SyncScheduler, SyncUpdate};
use crate::waveform::{WaveformFrame, WaveformRenderer};

/// User-visible playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
    Finished,
}

/// Owns the clock, scheduler, and renderer for one narration session.
///
/// All timing flows through [`tick`](Self::tick) and
/// [`render_frame`](Self::render_frame); callers drive both from their
/// event loop and treat the returned values as read-only derived state.
pub struct NarrationPlayer<C: PlaybackClock> {
    clock: C,
    scheduler: SyncScheduler,
    renderer: WaveformRenderer,
    state: PlayerState,
    render_active: bool,
}

impl<C: PlaybackClock> NarrationPlayer<C> {
    pub fn new(clock: C, scheduler: SyncScheduler, renderer: WaveformRenderer) -> Self {
        Self {
            clock,
            scheduler,
            renderer,
            state: PlayerState::Stopped,
            render_active: false,
        }
    }

    /// Start or resume playback.
    ///
    /// From Paused this resumes in place: the clock restarts and the
    /// scheduler's tick re-arms against its existing calibration and
    /// cursor. From Stopped or Finished it begins a fresh session at the
    /// top of the clip.
    pub fn play(&mut self, now: Instant) {
        match self.state {
            PlayerState::Playing => {}
            PlayerState::Paused => {
                self.clock.play();
                self.scheduler.resume(now);
                self.render_active = true;
                self.state = PlayerState::Playing;
                log::info!("resumed at {:.2}s", self.clock.current_time());
            }
            PlayerState::Stopped | PlayerState::Finished => {
                self.scheduler.stop();
                self.clock.seek(0.0);
                self.clock.play();
                self.scheduler.start(&self.clock, now);
                self.render_active = true;
                self.state = PlayerState::Playing;
                log::info!("playback started");
            }
        }
    }

    /// Suspend the clock, the scheduler tick, and the render loop.
    /// Calibration and the resolved indices survive for resume.
    pub fn pause(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        self.clock.pause();
        self.scheduler.suspend();
        self.render_active = false;
        self.state = PlayerState::Paused;
        log::info!("paused at {:.2}s", self.clock.current_time());
    }

    /// Tear the session down: cancel the tick, drop calibration, reset
    /// indices, rewind the clock.
    pub fn stop(&mut self) {
        self.clock.pause();
        self.clock.seek(0.0);
        self.scheduler.stop();
        self.render_active = false;
        self.state = PlayerState::Stopped;
        log::info!("stopped");
    }

    /// Seek to a fraction of the clip.
    ///
    /// Clamps to `[0, 1]`, moves the clock, and clears the scheduler's
    /// cursor so the next tick may resolve backwards. When invoked while
    /// paused, stopped, or finished, seeking also resumes playback and
    /// restarts the tick and render loop.
    pub fn seek_to_fraction(&mut self, fraction: f64, now: Instant) {
        let fraction = fraction.clamp(0.0, 1.0);
        let duration = match self.clock.duration() {
            Some(d) if d > 0.0 => d,
            _ => return,
        };
        let target = fraction * duration;

        match self.state {
            PlayerState::Playing => {
                self.clock.seek(target);
                self.scheduler.seeked(now);
            }
            PlayerState::Paused | PlayerState::Finished => {
                self.clock.seek(target);
                self.clock.play();
                self.scheduler.seeked(now);
                self.scheduler.resume(now);
                self.render_active = true;
                self.state = PlayerState::Playing;
            }
            PlayerState::Stopped => {
                self.clock.seek(target);
                self.clock.play();
                self.scheduler.start(&self.clock, now);
                self.scheduler.seeked(now);
                self.render_active = true;
                self.state = PlayerState::Playing;
            }
        }
        self.renderer.clear_hover();
        log::debug!("seek to {:.2}s ({:.0}%)", target, fraction * 100.0);
    }

    /// Run one scheduler poll. Call at least every tick interval while
    /// playing; a no-op otherwise.
    pub fn tick(&mut self, now: Instant) -> SyncUpdate {
        let update = self.scheduler.poll(&self.clock, now);
        if update.finished {
            self.render_active = false;
            self.state = PlayerState::Finished;
        }
        update
    }

    /// Render one waveform frame, or `None` while the render loop is
    /// suspended.
    pub fn render_frame(&mut self, wall_secs: f64) -> Option<WaveformFrame> {
        if !self.render_active {
            return None;
        }
        Some(self.renderer.render(&self.clock, wall_secs))
    }

    pub fn set_hover(&mut self, fraction: f64) {
        self.renderer.set_hover(fraction);
    }

    pub fn clear_hover(&mut self) {
        self.renderer.clear_hover();
    }

    pub fn hover(&self) -> Option<f64> {
        self.renderer.hover()
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    pub fn current_word_index(&self) -> Option<usize> {
        self.scheduler.current_word_index()
    }

    pub fn current_sentence_index(&self) -> Option<usize> {
        self.scheduler.current_sentence_index()
    }
}
