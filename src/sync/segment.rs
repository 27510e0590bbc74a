//! Text segmentation: words, sentences, and paragraphs.
//!
//! Everything here is a pure transform of the input string. Words are
//! maximal runs of non-whitespace; sentences are runs of words ended by a
//! `[.!?]+` punctuation run followed by whitespace (plus a trailing
//! remainder); paragraphs are blank-line separated blocks used only for the
//! full-text reading view.

/// A single word in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    /// Ordinal position in the word list.
    pub index: usize,
}

/// A sentence spanning an inclusive range of word indices.
///
/// Sentences partition the word list exactly: every word belongs to
/// exactly one sentence, with no gaps and no overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Display text, trimmed, terminal punctuation included.
    pub text: String,
    pub start_word: usize,
    pub end_word: usize,
}

/// A blank-line separated block with its own word list, used for the
/// static full-text view. Independent of the sentence model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub words: Vec<String>,
}

/// The complete segmentation of one source text.
#[derive(Debug, Clone, Default)]
pub struct SegmentedText {
    pub words: Vec<Word>,
    pub sentences: Vec<Sentence>,
    pub paragraphs: Vec<Paragraph>,
}

impl SegmentedText {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Index of the sentence whose word range contains `word_index`.
    pub fn sentence_of_word(&self, word_index: usize) -> Option<usize> {
        self.sentences
            .iter()
            .position(|s| word_index >= s.start_word && word_index <= s.end_word)
    }
}

/// Segment raw text into words, sentences, and paragraphs.
///
/// Empty or whitespace-only input yields empty lists across the board so
/// callers can no-op instead of special-casing.
pub fn segment(text: &str) -> SegmentedText {
    let words: Vec<Word> = text
        .split_whitespace()
        .enumerate()
        .map(|(index, w)| Word {
            text: w.to_string(),
            index,
        })
        .collect();

    if words.is_empty() {
        return SegmentedText::default();
    }

    SegmentedText {
        sentences: split_sentences(text),
        paragraphs: split_paragraphs(text),
        words,
    }
}

/// Split text at `[.!?]+` runs that are followed by whitespace.
///
/// The slice up to and including the punctuation run becomes one sentence;
/// any non-empty remainder after the last match becomes a final sentence.
/// Because every boundary sits right before whitespace, each sentence is
/// made of whole words and the word ranges tile the global word list.
fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut word_cursor = 0usize;
    let mut seg_start = 0usize;

    let mut iter = text.char_indices().peekable();
    while let Some((i, ch)) = iter.next() {
        if !is_terminator(ch) {
            continue;
        }

        // Consume the whole punctuation run.
        let mut run_end = i + ch.len_utf8();
        while let Some(&(j, next)) = iter.peek() {
            if is_terminator(next) {
                run_end = j + next.len_utf8();
                iter.next();
            } else {
                break;
            }
        }

        if matches!(iter.peek(), Some(&(_, next)) if next.is_whitespace()) {
            push_sentence(&mut sentences, &text[seg_start..run_end], &mut word_cursor);
            seg_start = run_end;
        }
    }

    push_sentence(&mut sentences, &text[seg_start..], &mut word_cursor);
    sentences
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

fn push_sentence(out: &mut Vec<Sentence>, slice: &str, word_cursor: &mut usize) {
    let trimmed = slice.trim();
    let count = trimmed.split_whitespace().count();
    if count == 0 {
        return;
    }
    out.push(Sentence {
        text: trimmed.to_string(),
        start_word: *word_cursor,
        end_word: *word_cursor + count - 1,
    });
    *word_cursor += count;
}

/// Split text into blank-line separated paragraphs.
fn split_paragraphs(text: &str) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.is_empty() {
            flush_paragraph(&mut paragraphs, &mut current);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut paragraphs, &mut current);
    paragraphs
}

fn flush_paragraph(out: &mut Vec<Paragraph>, lines: &mut Vec<&str>) {
    let text = lines.join("\n");
    lines.clear();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    out.push(Paragraph {
        text: trimmed.to_string(),
        words: trimmed.split_whitespace().map(str::to_string).collect(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(seg: &SegmentedText) -> Vec<&str> {
        seg.words.iter().map(|w| w.text.as_str()).collect()
    }

    #[test]
    fn splits_words_and_sentences() {
        let seg = segment("Hello world. This is a test.");
        assert_eq!(
            words(&seg),
            vec!["Hello", "world.", "This", "is", "a", "test."]
        );
        assert_eq!(seg.sentences.len(), 2);
        assert_eq!(seg.sentences[0].text, "Hello world.");
        assert_eq!((seg.sentences[0].start_word, seg.sentences[0].end_word), (0, 1));
        assert_eq!(seg.sentences[1].text, "This is a test.");
        assert_eq!((seg.sentences[1].start_word, seg.sentences[1].end_word), (2, 5));
    }

    #[test]
    fn no_terminator_yields_one_sentence() {
        let seg = segment("just some words");
        assert_eq!(seg.sentences.len(), 1);
        assert_eq!(seg.sentences[0].text, "just some words");
        assert_eq!((seg.sentences[0].start_word, seg.sentences[0].end_word), (0, 2));
    }

    #[test]
    fn empty_text_yields_nothing() {
        for text in ["", "   ", "\n\n\t "] {
            let seg = segment(text);
            assert!(seg.words.is_empty());
            assert!(seg.sentences.is_empty());
            assert!(seg.paragraphs.is_empty());
        }
    }

    #[test]
    fn punctuation_runs_stay_in_one_sentence() {
        let seg = segment("Really?! Yes... maybe");
        assert_eq!(seg.sentences.len(), 3);
        assert_eq!(seg.sentences[0].text, "Really?!");
        assert_eq!(seg.sentences[1].text, "Yes...");
        assert_eq!(seg.sentences[2].text, "maybe");
    }

    #[test]
    fn sentences_partition_words_exactly() {
        let samples = [
            "Hello world. This is a test.",
            "One! Two? Three... four five.\nSix seven",
            "no punctuation here at all",
            "Trailing terminator inside e.g. an abbreviation works.",
        ];
        for text in samples {
            let seg = segment(text);
            let mut covered = 0usize;
            for s in &seg.sentences {
                assert_eq!(s.start_word, covered, "gap or overlap in {text:?}");
                assert!(s.end_word >= s.start_word);
                covered = s.end_word + 1;
            }
            assert_eq!(covered, seg.word_count(), "uncovered tail in {text:?}");
        }
    }

    #[test]
    fn sentence_lookup_by_word_index() {
        let seg = segment("Hello world. This is a test.");
        assert_eq!(seg.sentence_of_word(0), Some(0));
        assert_eq!(seg.sentence_of_word(1), Some(0));
        assert_eq!(seg.sentence_of_word(2), Some(1));
        assert_eq!(seg.sentence_of_word(5), Some(1));
        assert_eq!(seg.sentence_of_word(6), None);
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let seg = segment("First block line one.\nStill first.\n\nSecond block.");
        assert_eq!(seg.paragraphs.len(), 2);
        assert_eq!(seg.paragraphs[0].words.len(), 6);
        assert_eq!(seg.paragraphs[1].text, "Second block.");
    }
}
