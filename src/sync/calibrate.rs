//! Online calibration against the real audio duration.
//!
//! Once the clip's true duration is known, cumulative cost converts to a
//! cost-per-second rate. Different voices pace differently and carry
//! different lead-in silence, so a short burst of early-playback samples
//! refines a constant timing offset on top of the global rate.

use super::timing::CostTable;

/// Samples are only collected inside this leading fraction of the clip.
const CALIBRATION_WINDOW_FRACTION: f64 = 0.1;

/// Only the first few resolved words participate in calibration.
const CALIBRATION_MAX_WORD_INDEX: usize = 5;

/// Deltas below this are indistinguishable from tick jitter.
const NOISE_FLOOR_SECS: f64 = 0.1;

/// Samples required before the offset is applied.
const MIN_SAMPLES: usize = 3;

/// Floor for the cost rate; keeps predictions finite on degenerate input.
const MIN_COST_PER_SECOND: f64 = 1e-6;

/// Rate and offset mapping cumulative cost to playback seconds.
///
/// Lives for one playback session: reset on every fresh `play` from a
/// stopped state, never on pause/resume.
#[derive(Debug, Clone)]
pub struct Calibration {
    audio_duration: f64,
    cost_per_second: f64,
    timing_offset: f64,
    samples: Vec<f64>,
    complete: bool,
}

impl Calibration {
    /// Initialize from the table's total cost and the clip's true duration.
    pub fn new(total_cost: f64, audio_duration_secs: f64) -> Self {
        let duration = audio_duration_secs.max(f64::MIN_POSITIVE);
        Self {
            audio_duration: duration,
            cost_per_second: (total_cost / duration).max(MIN_COST_PER_SECOND),
            timing_offset: 0.0,
            samples: Vec::new(),
            complete: false,
        }
    }

    /// Predicted playback time for a cumulative cost offset.
    pub fn predicted_time(&self, cost_offset: f64) -> f64 {
        cost_offset / self.cost_per_second + self.timing_offset
    }

    /// Feed one (observed time, previously resolved word) pair.
    ///
    /// Collects a drift sample when playback is still inside the leading
    /// window, the resolved word is early enough, and the delta clears the
    /// noise floor. Once enough samples exist their mean becomes the
    /// timing offset and collection stops for the session.
    pub fn observe(&mut self, observed_secs: f64, resolved_word: Option<usize>, table: &CostTable) {
        if self.complete {
            return;
        }

        if let Some(word) = resolved_word {
            let in_window = observed_secs < self.audio_duration * CALIBRATION_WINDOW_FRACTION;
            if in_window && word < CALIBRATION_MAX_WORD_INDEX && word < table.len() {
                // Raw model prediction, before any offset correction.
                let expected = table.offset(word) / self.cost_per_second;
                let delta = observed_secs - expected;
                if delta.abs() > NOISE_FLOOR_SECS {
                    self.samples.push(delta);
                }
            }
        }

        if self.samples.len() >= MIN_SAMPLES {
            let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
            self.timing_offset = mean;
            self.complete = true;
            log::debug!(
                "Calibration complete: offset {:+.3}s from {} samples (rate {:.3} cost/s)",
                mean,
                self.samples.len(),
                self.cost_per_second
            );
        }
    }

    pub fn cost_per_second(&self) -> f64 {
        self.cost_per_second
    }

    pub fn timing_offset_secs(&self) -> f64 {
        self.timing_offset
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn audio_duration_secs(&self) -> f64 {
        self.audio_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::segment::segment;
    use crate::sync::timing::{CostTable, TimingWeights};

    fn table_for(text: &str) -> CostTable {
        CostTable::build(&segment(text).words, &TimingWeights::default())
    }

    #[test]
    fn initial_rate_is_total_cost_over_duration() {
        let cal = Calibration::new(50.0, 10.0);
        assert!((cal.cost_per_second() - 5.0).abs() < 1e-9);
        assert_eq!(cal.timing_offset_secs(), 0.0);
        assert!(!cal.is_complete());
    }

    #[test]
    fn rate_never_drops_to_zero() {
        let cal = Calibration::new(0.0, 10.0);
        assert!(cal.cost_per_second() > 0.0);
        let cal = Calibration::new(50.0, 0.0);
        assert!(cal.cost_per_second() > 0.0);
    }

    #[test]
    fn mean_drift_becomes_offset_after_three_samples() {
        let table = table_for("one two three four five six seven eight nine ten");
        // Long clip so the 10% window covers the early observations.
        let mut cal = Calibration::new(table.total(), 1000.0);

        for word in 0..3 {
            let expected = table.offset(word) / cal.cost_per_second();
            cal.observe(expected + 0.2, Some(word), &table);
        }

        assert!(cal.is_complete());
        assert!((cal.timing_offset_secs() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn small_deltas_are_ignored_as_noise() {
        let table = table_for("one two three four five");
        let mut cal = Calibration::new(table.total(), 1000.0);

        for word in 0..3 {
            let expected = table.offset(word) / cal.cost_per_second();
            cal.observe(expected + 0.05, Some(word), &table);
        }

        assert_eq!(cal.sample_count(), 0);
        assert!(!cal.is_complete());
    }

    #[test]
    fn samples_stop_outside_leading_window() {
        let table = table_for("one two three four five");
        let mut cal = Calibration::new(table.total(), 10.0);

        // 2.0s is past 10% of a 10s clip.
        cal.observe(2.0, Some(0), &table);
        assert_eq!(cal.sample_count(), 0);
    }

    #[test]
    fn late_words_never_calibrate() {
        let table = table_for("a b c d e f g h i j");
        let mut cal = Calibration::new(table.total(), 1000.0);

        cal.observe(5.0, Some(7), &table);
        assert_eq!(cal.sample_count(), 0);
    }

    #[test]
    fn collection_freezes_once_complete() {
        let table = table_for("one two three four five six");
        let mut cal = Calibration::new(table.total(), 1000.0);

        for word in 0..3 {
            let expected = table.offset(word) / cal.cost_per_second();
            cal.observe(expected + 0.3, Some(word), &table);
        }
        assert!(cal.is_complete());
        let frozen = cal.timing_offset_secs();

        let expected = table.offset(1) / cal.cost_per_second();
        cal.observe(expected + 5.0, Some(1), &table);
        assert_eq!(cal.timing_offset_secs(), frozen);
        assert_eq!(cal.sample_count(), 3);
    }
}
