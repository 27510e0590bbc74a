//! Word-level synchronization between narration audio and its source text.
//!
//! The pipeline has four stages:
//!
//! 1. [`segment`] breaks raw text into words, sentences, and paragraphs.
//!    Word indices are global across the document and sentences are
//!    expressed as inclusive word ranges over that single list.
//! 2. [`timing`] assigns every word a complexity score and accumulates the
//!    scores into a [`timing::CostTable`] of cumulative offsets. Cost is a
//!    unitless stand-in for speaking effort, not a duration.
//! 3. [`calibrate`] converts cost to seconds by dividing total cost over
//!    the real audio duration, then nudges a constant time offset from
//!    early-playback observations to absorb engine lead-in.
//! 4. [`scheduler`] runs the polling state machine that resolves the
//!    current word and sentence on a fixed tick and emits changes only
//!    when an index moves.
//!
//! Stages 1 and 2 are pure and run once per document. Stages 3 and 4 hold
//! per-session state and are torn down by [`scheduler::SyncScheduler::stop`].
//!
//! ```no_run
//! use narrate_rs::clock::{ManualClock, PlaybackClock};
//! use narrate_rs::sync::{segment, SyncScheduler, TimingWeights};
//! use std::time::Instant;
//!
//! let text = segment::segment("Hello world. This is a test.");
//! let mut scheduler = SyncScheduler::new(text, TimingWeights::default());
//! let mut clock = ManualClock::with_duration(4.0);
//! clock.play();
//! scheduler.start(&clock, Instant::now());
//! let update = scheduler.poll(&clock, Instant::now());
//! if let Some(word) = update.word_changed {
//!     println!("now speaking word {word}");
//! }
//! ```

pub mod calibrate;
pub mod scheduler;
pub mod segment;
pub mod timing;

pub use calibrate::Calibration;
pub use scheduler::{SyncScheduler, SyncState, SyncUpdate};
pub use segment::{segment, SegmentedText, Sentence, Word};
pub use timing::{complexity_score, CostTable, TimingWeights};
