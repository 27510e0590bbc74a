//! Complexity-weighted timing model.
//!
//! Per-word heuristic costs stand in for spoken duration: the narration
//! backend never reports word timestamps, so a length-and-shape score per
//! word, accumulated into a cumulative cost table, serves as the proxy
//! timeline. The model only has to be monotonic and stable; calibration
//! downstream corrects scale, not shape.

use super::segment::Word;

/// Heuristic weights for the per-word complexity score.
///
/// The defaults are empirically chosen constants, not derived from any
/// acoustic model. They are exposed so callers can tune per voice or
/// language if the defaults drift too far.
#[derive(Debug, Clone, Copy)]
pub struct TimingWeights {
    /// Added when the word contains any uppercase letter.
    pub uppercase_bonus: f64,
    /// Added when the word contains any digit.
    pub digit_bonus: f64,
    /// Added when the word contains `.,!?;:` punctuation.
    pub punctuation_bonus: f64,
    /// Silent-gap cost accumulated after every word.
    pub inter_word_pause: f64,
}

impl Default for TimingWeights {
    fn default() -> Self {
        Self {
            uppercase_bonus: 0.5,
            digit_bonus: 1.0,
            punctuation_bonus: 0.8,
            inter_word_pause: 0.3,
        }
    }
}

/// Score a single word: character length plus independent shape bonuses,
/// floored at 1.
pub fn complexity_score(word: &str, weights: &TimingWeights) -> f64 {
    let mut score = word.chars().count() as f64;
    if word.chars().any(|c| c.is_uppercase()) {
        score += weights.uppercase_bonus;
    }
    if word.chars().any(|c| c.is_ascii_digit()) {
        score += weights.digit_bonus;
    }
    if word.chars().any(|c| matches!(c, '.' | ',' | '!' | '?' | ';' | ':')) {
        score += weights.punctuation_bonus;
    }
    score.max(1.0)
}

/// Cumulative cost offsets, one entry per word.
///
/// Entry `i` is the summed cost (scores plus inter-word pauses) of
/// everything spoken before word `i`; the total includes the last word and
/// one trailing pause. Recomputed whenever the word list changes.
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    offsets: Vec<f64>,
    scores: Vec<f64>,
    total: f64,
}

impl CostTable {
    pub fn build(words: &[Word], weights: &TimingWeights) -> Self {
        let mut offsets = Vec::with_capacity(words.len());
        let mut scores = Vec::with_capacity(words.len());
        let mut cumulative = 0.0;

        for word in words {
            offsets.push(cumulative);
            let score = complexity_score(&word.text, weights);
            scores.push(score);
            cumulative += score + weights.inter_word_pause;
        }

        Self {
            offsets,
            scores,
            total: cumulative,
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Cost accumulated before word `i` starts.
    pub fn offset(&self, i: usize) -> f64 {
        self.offsets[i]
    }

    /// Cost at which word `i` ends (the next word's offset, or the total
    /// for the last word).
    pub fn end_offset(&self, i: usize) -> f64 {
        match self.offsets.get(i + 1) {
            Some(&next) => next,
            None => self.total,
        }
    }

    /// Complexity score of word `i`.
    pub fn score(&self, i: usize) -> f64 {
        self.scores[i]
    }

    /// Total cost of the full text, trailing pause included.
    pub fn total(&self) -> f64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::segment::segment;

    #[test]
    fn score_applies_bonuses_independently() {
        let w = TimingWeights::default();
        assert_eq!(complexity_score("plain", &w), 5.0);
        assert_eq!(complexity_score("Plain", &w), 5.5);
        assert_eq!(complexity_score("pla1n", &w), 6.0);
        assert_eq!(complexity_score("plain.", &w), 6.8);
        // All three at once: 6 chars + 0.5 + 1.0 + 0.8
        assert_eq!(complexity_score("Pla1n.", &w), 8.3);
    }

    #[test]
    fn score_is_floored_at_one() {
        let zeroed = TimingWeights {
            uppercase_bonus: 0.0,
            digit_bonus: 0.0,
            punctuation_bonus: 0.0,
            inter_word_pause: 0.0,
        };
        assert_eq!(complexity_score("a", &zeroed), 1.0);
    }

    #[test]
    fn table_matches_word_list_and_is_monotonic() {
        let seg = segment("Hello world. This is a test.");
        let table = CostTable::build(&seg.words, &TimingWeights::default());

        assert_eq!(table.len(), seg.word_count());
        for i in 1..table.len() {
            assert!(table.offset(i) > table.offset(i - 1));
        }
        assert!(table.total() > table.offset(table.len() - 1));
    }

    #[test]
    fn end_offset_chains_into_next_word() {
        let seg = segment("one two three");
        let table = CostTable::build(&seg.words, &TimingWeights::default());
        assert_eq!(table.end_offset(0), table.offset(1));
        assert_eq!(table.end_offset(2), table.total());
    }

    #[test]
    fn total_includes_trailing_pause() {
        let seg = segment("word");
        let w = TimingWeights::default();
        let table = CostTable::build(&seg.words, &w);
        let expected = complexity_score("word", &w) + w.inter_word_pause;
        assert!((table.total() - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_word_list_builds_empty_table() {
        let table = CostTable::build(&[], &TimingWeights::default());
        assert!(table.is_empty());
        assert_eq!(table.total(), 0.0);
    }
}
