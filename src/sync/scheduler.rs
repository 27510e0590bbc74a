//! The polling scheduler: maps continuous playback time to discrete
//! word and sentence indices.
//!
//! A fixed-interval tick reads the playback clock, feeds calibration, and
//! selects the word whose predicted time window contains the current time.
//! State changes are only emitted when an index actually moves, which is
//! the hysteresis that keeps the highlight from flickering.
//!
//! The tick is not a thread: an external driver calls [`SyncScheduler::poll`]
//! and the scheduler decides whether a tick is due. The armed deadline is
//! the single owned timer handle; every transition out of Tracking clears
//! it through one path.

use std::time::{Duration, Instant};

use crate::clock::PlaybackClock;

use super::calibrate::Calibration;
use super::segment::SegmentedText;
use super::timing::{CostTable, TimingWeights};

/// Resolution cadence while tracking.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Poll cadence while waiting for stream metadata.
pub const METADATA_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Slack applied on both sides of each word's predicted window.
const WORD_WINDOW_BUFFER_SECS: f64 = 0.05;

/// Remaining time under which the last word counts as finished.
const END_EPSILON_SECS: f64 = 0.1;

/// Lifecycle of one synchronization session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Not running; indices unresolved.
    Idle,
    /// Waiting for the clock to report a duration.
    Resolving,
    /// Ticking against live playback time.
    Tracking,
    /// Playback ran out; indices forced to the final word and sentence.
    Finished,
}

/// What changed during one poll. Consumers treat all fields as read-only
/// derived state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncUpdate {
    /// Newly resolved word index, present only when it moved.
    pub word_changed: Option<usize>,
    /// Newly resolved sentence index, present only when it moved.
    pub sentence_changed: Option<usize>,
    /// The session reached its end on this poll.
    pub finished: bool,
}

/// Polling state machine over `{Idle, Resolving, Tracking, Finished}`.
pub struct SyncScheduler {
    state: SyncState,
    text: SegmentedText,
    table: CostTable,
    weights: TimingWeights,
    calibration: Option<Calibration>,
    current_word: Option<usize>,
    current_sentence: Option<usize>,
    last_emitted_word: Option<usize>,
    /// Next tick deadline; `None` means the timer is cancelled.
    next_due: Option<Instant>,
}

impl SyncScheduler {
    pub fn new(text: SegmentedText, weights: TimingWeights) -> Self {
        let table = CostTable::build(&text.words, &weights);
        Self {
            state: SyncState::Idle,
            text,
            table,
            weights,
            calibration: None,
            current_word: None,
            current_sentence: None,
            last_emitted_word: None,
            next_due: None,
        }
    }

    /// Replace the source text, rebuilding the cost table and resetting
    /// the session.
    pub fn set_text(&mut self, text: SegmentedText) {
        self.stop();
        self.table = CostTable::build(&text.words, &self.weights);
        self.text = text;
    }

    /// Begin a session against the given clock.
    ///
    /// A no-op for empty text. If the clock's duration is not yet known
    /// the scheduler enters Resolving and polls for metadata; otherwise it
    /// starts tracking immediately.
    pub fn start(&mut self, clock: &impl PlaybackClock, now: Instant) {
        if self.text.is_empty() {
            log::debug!("start() ignored: no words to track");
            return;
        }
        if self.state != SyncState::Idle {
            return;
        }

        match clock.duration() {
            Some(duration) if duration > 0.0 => self.begin_tracking(duration, now),
            _ => {
                self.state = SyncState::Resolving;
                self.next_due = Some(now);
                log::debug!("waiting for stream metadata");
            }
        }
    }

    fn begin_tracking(&mut self, duration: f64, now: Instant) {
        self.calibration = Some(Calibration::new(self.table.total(), duration));
        self.state = SyncState::Tracking;
        self.next_due = Some(now);
        log::debug!(
            "tracking {} words over {:.2}s ({:.3} cost/s)",
            self.table.len(),
            duration,
            self.calibration.as_ref().map(|c| c.cost_per_second()).unwrap_or(0.0)
        );
    }

    /// Run one poll if a tick is due. Returns what changed.
    pub fn poll(&mut self, clock: &impl PlaybackClock, now: Instant) -> SyncUpdate {
        if !self.due(now) {
            return SyncUpdate::default();
        }

        match self.state {
            SyncState::Idle | SyncState::Finished => SyncUpdate::default(),
            SyncState::Resolving => {
                match clock.duration() {
                    Some(duration) if duration > 0.0 => {
                        self.begin_tracking(duration, now);
                        self.resolve(clock, now)
                    }
                    // No timeout here: acquisition deadlines belong to the
                    // audio transport, not to scheduling.
                    _ => {
                        self.next_due = Some(now + METADATA_POLL_INTERVAL);
                        SyncUpdate::default()
                    }
                }
            }
            SyncState::Tracking => self.resolve(clock, now),
        }
    }

    fn resolve(&mut self, clock: &impl PlaybackClock, now: Instant) -> SyncUpdate {
        let mut update = SyncUpdate::default();

        if clock.paused() && !clock.ended() {
            // The controller suspends the tick on pause; a paused clock
            // reaching this point means the tick fired mid-transition.
            self.next_due = Some(now + TICK_INTERVAL);
            return update;
        }

        let t = clock.current_time();
        let (target, duration) = {
            let cal = match self.calibration.as_mut() {
                Some(cal) => cal,
                None => return update,
            };
            cal.observe(t, self.current_word, &self.table);

            let mut target = None;
            for i in 0..self.table.len() {
                let start = cal.predicted_time(self.table.offset(i)) - WORD_WINDOW_BUFFER_SECS;
                let end = cal.predicted_time(self.table.end_offset(i)) + WORD_WINDOW_BUFFER_SECS;
                if t >= start && t < end {
                    target = Some(i);
                    break;
                }
            }
            // Monotonic fallback: audio outran the model.
            if target.is_none() && t >= cal.predicted_time(self.table.total()) {
                target = Some(self.table.len() - 1);
            }
            (target, cal.audio_duration_secs())
        };

        // Calibration can shift windows backwards; the cursor never follows.
        let target = match (target, self.current_word) {
            (Some(t), Some(cur)) => Some(t.max(cur)),
            (t, _) => t,
        };

        if let Some(word) = target {
            if self.last_emitted_word != Some(word) {
                self.current_word = Some(word);
                self.last_emitted_word = Some(word);
                update.word_changed = Some(word);
            }
            // Sentence resolution piggybacks on the fresh word index.
            let sentence = self.text.sentence_of_word(word);
            if sentence != self.current_sentence {
                self.current_sentence = sentence;
                update.sentence_changed = sentence;
            }
        }

        let last_word = self.table.len() - 1;
        let finished =
            clock.ended() || (self.current_word == Some(last_word) && duration - t <= END_EPSILON_SECS);

        if finished {
            if self.current_word != Some(last_word) {
                self.current_word = Some(last_word);
                self.last_emitted_word = Some(last_word);
                update.word_changed = Some(last_word);
            }
            let last_sentence = self.text.sentences.len().checked_sub(1);
            if self.current_sentence != last_sentence {
                self.current_sentence = last_sentence;
                update.sentence_changed = last_sentence;
            }
            self.state = SyncState::Finished;
            self.next_due = None;
            update.finished = true;
            log::debug!("session finished at {:.2}s", t);
        } else {
            self.next_due = Some(now + TICK_INTERVAL);
        }

        update
    }

    /// Suspend the tick without touching calibration or indices (pause).
    pub fn suspend(&mut self) {
        self.next_due = None;
    }

    /// Re-arm the tick after a pause. Resumes the existing cost table,
    /// calibration, and resolved indices; nothing is resegmented.
    pub fn resume(&mut self, now: Instant) {
        if matches!(self.state, SyncState::Resolving | SyncState::Tracking) {
            self.next_due = Some(now);
        }
    }

    /// Full teardown: cancel the tick, drop calibration, unresolve indices.
    pub fn stop(&mut self) {
        self.state = SyncState::Idle;
        self.next_due = None;
        self.calibration = None;
        self.current_word = None;
        self.current_sentence = None;
        self.last_emitted_word = None;
    }

    /// Clear the cursor after an explicit seek so the next tick can
    /// resolve backwards as well as forwards.
    pub fn seeked(&mut self, now: Instant) {
        if self.state == SyncState::Finished && self.calibration.is_some() {
            self.state = SyncState::Tracking;
        }
        self.current_word = None;
        self.current_sentence = None;
        self.last_emitted_word = None;
        if matches!(self.state, SyncState::Resolving | SyncState::Tracking) {
            self.next_due = Some(now);
        }
    }

    fn due(&self, now: Instant) -> bool {
        self.next_due.map(|d| now >= d).unwrap_or(false)
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn current_word_index(&self) -> Option<usize> {
        self.current_word
    }

    pub fn current_sentence_index(&self) -> Option<usize> {
        self.current_sentence
    }

    pub fn text(&self) -> &SegmentedText {
        &self.text
    }

    pub fn cost_table(&self) -> &CostTable {
        &self.table
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sync::segment::segment;

    fn scheduler_for(text: &str) -> SyncScheduler {
        SyncScheduler::new(segment(text), TimingWeights::default())
    }

    /// Drive polls at the tick cadence until `time` is reached on the clock.
    fn run_until(
        sched: &mut SyncScheduler,
        clock: &mut ManualClock,
        start: Instant,
        time: f64,
    ) -> Instant {
        let mut now = start;
        while clock.current_time() < time {
            clock.advance(TICK_INTERVAL.as_secs_f64());
            now += TICK_INTERVAL;
            sched.poll(clock, now);
        }
        now
    }

    #[test]
    fn start_on_empty_text_is_a_no_op() {
        let mut sched = scheduler_for("");
        let clock = ManualClock::with_duration(10.0);
        sched.start(&clock, Instant::now());
        assert_eq!(sched.state(), SyncState::Idle);
    }

    #[test]
    fn resolving_polls_until_metadata_arrives() {
        let mut sched = scheduler_for("one two three");
        let mut clock = ManualClock::without_metadata();
        let now = Instant::now();

        sched.start(&clock, now);
        assert_eq!(sched.state(), SyncState::Resolving);

        let upd = sched.poll(&clock, now);
        assert_eq!(upd, SyncUpdate::default());
        assert_eq!(sched.state(), SyncState::Resolving);

        clock.set_duration(6.0);
        clock.play();
        let upd = sched.poll(&clock, now + METADATA_POLL_INTERVAL);
        assert_eq!(sched.state(), SyncState::Tracking);
        assert_eq!(upd.word_changed, Some(0));
        assert_eq!(upd.sentence_changed, Some(0));
    }

    #[test]
    fn first_tick_resolves_first_word_and_sentence() {
        let mut sched = scheduler_for("Hello world. This is a test.");
        let mut clock = ManualClock::with_duration(10.0);
        clock.play();
        let now = Instant::now();

        sched.start(&clock, now);
        let upd = sched.poll(&clock, now);
        assert_eq!(upd.word_changed, Some(0));
        assert_eq!(upd.sentence_changed, Some(0));
    }

    #[test]
    fn unchanged_index_is_not_re_emitted() {
        let mut sched = scheduler_for("Hello world. This is a test.");
        let mut clock = ManualClock::with_duration(60.0);
        clock.play();
        let now = Instant::now();

        sched.start(&clock, now);
        let first = sched.poll(&clock, now);
        assert_eq!(first.word_changed, Some(0));

        let second = sched.poll(&clock, now + TICK_INTERVAL);
        assert_eq!(second.word_changed, None);
        assert_eq!(second.sentence_changed, None);
    }

    #[test]
    fn word_index_is_monotonic_within_a_run() {
        let mut sched = scheduler_for("One two three four five six seven eight.");
        let mut clock = ManualClock::with_duration(8.0);
        clock.play();
        let mut now = Instant::now();
        sched.start(&clock, now);

        let mut previous = 0usize;
        for _ in 0..160 {
            clock.advance(TICK_INTERVAL.as_secs_f64());
            now += TICK_INTERVAL;
            sched.poll(&clock, now);
            if let Some(word) = sched.current_word_index() {
                assert!(word >= previous, "cursor moved backwards");
                previous = word;
            }
        }
        assert_eq!(previous, 7);
    }

    #[test]
    fn sentence_advances_with_its_words() {
        let mut sched = scheduler_for("Hello world. This is a test.");
        let mut clock = ManualClock::with_duration(10.0);
        clock.play();
        let now = Instant::now();
        sched.start(&clock, now);
        sched.poll(&clock, now);
        assert_eq!(sched.current_sentence_index(), Some(0));

        run_until(&mut sched, &mut clock, now, 9.0);
        assert_eq!(sched.current_sentence_index(), Some(1));
    }

    #[test]
    fn ended_clock_finishes_and_forces_last_indices() {
        let mut sched = scheduler_for("Hello world. This is a test.");
        let mut clock = ManualClock::with_duration(10.0);
        clock.play();
        let now = Instant::now();
        sched.start(&clock, now);
        sched.poll(&clock, now);

        clock.set_time(10.0);
        clock.set_ended(true);
        let upd = sched.poll(&clock, now + TICK_INTERVAL);
        assert!(upd.finished);
        assert_eq!(sched.state(), SyncState::Finished);
        assert_eq!(sched.current_word_index(), Some(5));
        assert_eq!(sched.current_sentence_index(), Some(1));

        // Timer is cancelled: further polls change nothing.
        let upd = sched.poll(&clock, now + TICK_INTERVAL * 2);
        assert_eq!(upd, SyncUpdate::default());
    }

    #[test]
    fn stop_resets_indices_to_unresolved() {
        let mut sched = scheduler_for("one two three");
        let mut clock = ManualClock::with_duration(3.0);
        clock.play();
        let now = Instant::now();
        sched.start(&clock, now);
        sched.poll(&clock, now);
        assert!(sched.current_word_index().is_some());

        sched.stop();
        assert_eq!(sched.state(), SyncState::Idle);
        assert_eq!(sched.current_word_index(), None);
        assert_eq!(sched.current_sentence_index(), None);
        assert!(sched.calibration().is_none());
    }

    #[test]
    fn pause_preserves_calibration_and_cursor() {
        let mut sched = scheduler_for("one two three four five");
        let mut clock = ManualClock::with_duration(50.0);
        clock.play();
        let mut now = Instant::now();
        sched.start(&clock, now);
        now = run_until(&mut sched, &mut clock, now, 2.0);
        let word = sched.current_word_index();
        assert!(word.is_some());

        clock.pause();
        sched.suspend();
        let upd = sched.poll(&clock, now + TICK_INTERVAL);
        assert_eq!(upd, SyncUpdate::default());
        assert_eq!(sched.current_word_index(), word);

        clock.play();
        sched.resume(now + TICK_INTERVAL);
        assert_eq!(sched.state(), SyncState::Tracking);
        assert_eq!(sched.current_word_index(), word);
    }

    #[test]
    fn seek_resolves_consistently_after_one_tick() {
        let text = "One two three four five six seven eight nine ten.";
        let mut sched = scheduler_for(text);
        let mut clock = ManualClock::with_duration(10.0);
        clock.play();
        let now = Instant::now();
        sched.start(&clock, now);
        sched.poll(&clock, now);

        // Seek to the midpoint; the resolved word should sit near the
        // middle of the word list, within one word of tolerance.
        clock.seek(5.0);
        sched.seeked(now + TICK_INTERVAL);
        sched.poll(&clock, now + TICK_INTERVAL);

        let word = sched.current_word_index().expect("word resolved after seek");
        let expected = 5usize; // 10 words, evenly weighted, at 50%
        assert!(
            word.abs_diff(expected) <= 1,
            "seek landed on word {word}, expected near {expected}"
        );
    }
}
