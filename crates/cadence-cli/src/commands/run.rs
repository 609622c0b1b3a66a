//! Run the audio system with the built-in monitor graph.

use super::common::load_settings;
use crate::monitor::{GAIN_SMOOTHING_SECS, Monitor, Source};
use anyhow::Context;
use cadence_core::db_to_linear;
use cadence_io::AudioSystem;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Control loop poll interval.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct RunArgs {
    /// Settings file (defaults to the user settings file)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend override ("default", "dummy", or a host such as "alsa")
    #[arg(short, long)]
    backend: Option<String>,

    /// Output device override (index, exact or partial name)
    #[arg(short, long)]
    device: Option<String>,

    /// Sample rate override in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Block size override in frames
    #[arg(long)]
    block_size: Option<u32>,

    /// Play a sine tone at this frequency (Hz) instead of the input
    #[arg(long, value_name = "HZ")]
    tone: Option<f64>,

    /// Output gain in dB
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    gain: f64,

    /// Do not capture input
    #[arg(long)]
    no_input: bool,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long, value_name = "SECS")]
    duration: Option<f64>,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let (mut settings, path) = load_settings(args.config.as_deref())?;
    if let Some(backend) = args.backend {
        settings.backend = backend;
    }
    if args.device.is_some() {
        settings.device = args.device;
    }
    if let Some(rate) = args.sample_rate {
        settings.sample_rate = rate;
    }
    if let Some(block) = args.block_size {
        settings.block_size = block;
    }
    if args.no_input {
        settings.enable_input = false;
    }
    settings
        .validate()
        .with_context(|| format!("invalid settings (from {})", path.display()))?;

    if let Some(freq) = args.tone {
        if !(freq.is_finite() && freq > 0.0) {
            anyhow::bail!("tone frequency must be a positive number of Hz, got {freq}");
        }
    }
    if let Some(secs) = args.duration {
        if !(secs.is_finite() && secs >= 0.0) {
            anyhow::bail!("duration must be a non-negative number of seconds, got {secs}");
        }
    }

    let source = args.tone.map_or(Source::Input, Source::Tone);
    let monitor = Monitor::new(source, 0.0);
    let gain = monitor.gain_handle();

    let system = AudioSystem::new();
    system.set_processor(Box::new(monitor));
    let format = system.start(&settings)?;

    let source_label = match source {
        Source::Input if format.input_channels == 0 => "silence (no input)".to_string(),
        Source::Input => "input".to_string(),
        Source::Tone(freq) => format!("{freq} Hz tone"),
    };
    println!("Running {} on {}", source_label, format.device_name);
    println!("  Backend:     {}", settings.backend);
    println!("  Sample rate: {} Hz", format.sample_rate);
    println!(
        "  Block size:  {} frames ({:.2} ms)",
        format.block_size,
        format.block_duration() * 1000.0
    );
    println!("  Channels:    {} in / {} out", format.input_channels, format.output_channels);
    println!("  Gain:        {:.1} dB", args.gain);
    if args.duration.is_none() {
        println!("\nPress Ctrl+C to stop...\n");
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    gain.set_value(db_to_linear(args.gain));

    let deadline = args.duration.map(|secs| Instant::now() + Duration::from_secs_f64(secs));
    let errors = system.error_flag();
    let result = loop {
        if !running.load(Ordering::SeqCst) {
            println!("\nStopping...");
            break Ok(());
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break Ok(());
        }
        if errors.is_set() {
            tracing::warn!("audio device reported a fatal error, restarting");
            if let Err(e) = system.restart(&settings) {
                break Err(anyhow::Error::new(e).context("audio device lost"));
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    // Fade out before closing the stream.
    gain.set_value(0.0);
    std::thread::sleep(Duration::from_secs_f64(GAIN_SMOOTHING_SECS * 2.5));
    system.stop();

    result?;
    println!("Done!");
    Ok(())
}
