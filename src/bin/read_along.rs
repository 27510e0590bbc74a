//! Read-along preview: pair a text (or LaTeX) document with its narration
//! WAV and follow the highlighted words in the terminal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use narrate_rs::clock::ClipClock;
use narrate_rs::playback::NarrationPlayer;
use narrate_rs::sanitize;
use narrate_rs::sync::{segment, SyncScheduler, TimingWeights};
use narrate_rs::tui::ReadAlongUi;
use narrate_rs::voices::VoiceCatalog;
use narrate_rs::waveform::{FftTap, WaveformRenderer};
use narrate_rs::NarrationClip;

#[derive(Parser, Debug)]
#[command(author, version, about = "Synchronized read-along playback of a narrated document")]
struct Cli {
    /// Text, .tex, or .latex document to read along with
    input: PathBuf,

    /// Narration audio for the document (WAV)
    audio: PathBuf,

    /// Voice the narration was synthesized with, for display
    #[arg(short, long, default_value = "en-US-AriaNeural")]
    voice: String,

    /// FFT window size for the waveform analysis tap
    #[arg(long, default_value_t = 1024)]
    window_size: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let catalog = VoiceCatalog::builtin();
    let voice = catalog
        .get(&cli.voice)
        .with_context(|| format!("unknown voice '{}'", cli.voice))?;
    log::info!("narration voice: {} ({})", voice.name, voice.id);

    let text = sanitize::import_file(&cli.input)
        .with_context(|| format!("failed to import {}", cli.input.display()))?;
    let segmented = segment(&text);
    log::info!(
        "{} words in {} sentences",
        segmented.word_count(),
        segmented.sentences.len()
    );

    let clip = NarrationClip::read_wav(&cli.audio)
        .with_context(|| format!("failed to load {}", cli.audio.display()))?;
    log::info!(
        "narration: {:.2}s at {} Hz",
        clip.duration_secs(),
        clip.sample_rate
    );

    let clock = ClipClock::for_clip(&clip);
    let scheduler = SyncScheduler::new(segmented, TimingWeights::default());
    let renderer = WaveformRenderer::new(Box::new(FftTap::new(&clip, cli.window_size, 0.8)));
    let player = NarrationPlayer::new(clock, scheduler, renderer);

    ReadAlongUi::new(player).run()?;
    Ok(())
}
