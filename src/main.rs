//! voice-compare command line interface
//!
//! Runs the audio proxy and exposes the trim pipeline for local files.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use voice_compare::config::AppConfig;
use voice_compare::core::{AudioSource, BitDepth, TrackRole, extension_hint};
use voice_compare::decoder::decode_bytes;
use voice_compare::encoder::{ResourceRegistry, WavEncoder};
use voice_compare::fetch::{FileFetcher, HttpFetcher, SourceFetcher};
use voice_compare::filter::{SilenceTrimmer, TrimParams};
use voice_compare::player::{DualTrackController, LoadOutcome, TrackPipeline, TrackSnapshot};
use voice_compare::server::{self, ProxyState};

/// Threshold the comparison player trims with
const COMPARE_TOP_DB: f32 = 18.0;

#[derive(Parser)]
#[command(name = "voice-compare")]
#[command(about = "Trim and compare a reference voice with a recording", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the audio proxy server
    Serve {
        /// Address to bind (overrides VOICE_COMPARE_LISTEN)
        #[arg(short, long)]
        listen: Option<String>,

        /// URL prefix the proxy may fetch; repeatable
        #[arg(long = "allow", value_name = "PREFIX")]
        allow: Vec<String>,
    },

    /// Strip leading and trailing silence and write a WAV
    Trim {
        /// Input audio file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output WAV file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Threshold below the loudest frame, in dB
        #[arg(long, default_value_t = 20.0)]
        top_db: f32,

        /// Analysis frame length in samples
        #[arg(long, default_value_t = 2048)]
        frame_length: usize,

        /// Hop between frames in samples
        #[arg(long, default_value_t = 512)]
        hop_length: usize,

        /// Output sample width (16, 24 or 32 for float)
        #[arg(long, default_value_t = 16)]
        bit_depth: u16,
    },

    /// Print stream information and the range trimming would keep
    Probe {
        /// Input audio file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Threshold below the loudest frame, in dB
        #[arg(long, default_value_t = 20.0)]
        top_db: f32,
    },

    /// Load a reference and a recording into the comparison player
    Compare {
        /// Reference audio (URL or path)
        reference: String,

        /// User recording (URL or path)
        user: String,

        /// Label for the reference track
        #[arg(long, default_value = "Reference")]
        reference_label: String,

        /// Label for the user track
        #[arg(long, default_value = "My voice")]
        user_label: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    info!("voice-compare {}", voice_compare::VERSION);

    match cli.command {
        Commands::Serve { listen, allow } => serve(listen, allow).await,
        Commands::Trim {
            input,
            output,
            top_db,
            frame_length,
            hop_length,
            bit_depth,
        } => {
            let params = TrimParams::new(top_db)
                .with_frame_length(frame_length)
                .with_hop_length(hop_length);
            trim(&input, &output, params, bit_depth)
        }
        Commands::Probe { input, top_db } => probe(&input, top_db),
        Commands::Compare {
            reference,
            user,
            reference_label,
            user_label,
        } => {
            compare(
                AudioSource::reference(reference).with_label(reference_label),
                AudioSource::user(user).with_label(user_label),
            )
            .await
        }
    }
}

async fn serve(listen: Option<String>, allow: Vec<String>) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(listen) = listen {
        config.listen = listen;
    }
    if !allow.is_empty() {
        config.allowed_origins = allow;
    }

    let app = server::router(ProxyState::from_config(&config));
    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    info!(
        "Audio proxy listening on {} (allowing {})",
        config.listen,
        config.allowed_origins.join(", ")
    );
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn read_input(input: &Path) -> anyhow::Result<voice_compare::DecodedBuffer> {
    let bytes =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let hint = extension_hint(&input.to_string_lossy());
    decode_bytes(bytes, hint.as_deref())
        .with_context(|| format!("failed to decode {}", input.display()))
}

fn trim(input: &Path, output: &Path, params: TrimParams, bits: u16) -> anyhow::Result<()> {
    let bit_depth = BitDepth::from_bits(bits)?;
    let buffer = read_input(input)?;
    let (trimmed, bounds) = SilenceTrimmer::new(params)?.trim(&buffer)?;

    WavEncoder::new(bit_depth)
        .write_file(output, &trimmed)
        .with_context(|| format!("failed to write {}", output.display()))?;

    let rate = f64::from(buffer.sample_rate());
    println!(
        "{} -> {}: kept {:.3}s..{:.3}s of {:.3}s{}",
        input.display(),
        output.display(),
        bounds.start_sample as f64 / rate,
        bounds.end_sample as f64 / rate,
        buffer.duration().as_secs_f64(),
        if bounds.degenerate { " (no trim)" } else { "" }
    );
    Ok(())
}

fn probe(input: &Path, top_db: f32) -> anyhow::Result<()> {
    let buffer = read_input(input)?;
    let (_, bounds) = SilenceTrimmer::new(TrimParams::new(top_db))?.trim(&buffer)?;

    println!("File:        {}", input.display());
    println!("Sample rate: {} Hz", buffer.sample_rate());
    println!("Channels:    {}", buffer.channel_count());
    println!("Frames:      {}", buffer.frame_count());
    println!("Duration:    {:.3}s", buffer.duration().as_secs_f64());
    println!(
        "Trim range:  {}..{} ({} samples){}",
        bounds.start_sample,
        bounds.end_sample,
        bounds.len(),
        if bounds.degenerate { ", nothing above threshold" } else { "" }
    );
    Ok(())
}

async fn compare(reference: AudioSource, user: AudioSource) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let fetcher = SourceFetcher::new(HttpFetcher::new(config.proxy_rule())?, FileFetcher::new());
    let pipeline = TrackPipeline::new(
        Arc::new(fetcher),
        ResourceRegistry::new(),
        TrimParams::new(COMPARE_TOP_DB),
        BitDepth::I16,
    )?;
    let controller = DualTrackController::headless(pipeline);

    if let LoadOutcome::Superseded = controller.load_pair(reference, user).await {
        bail!("load was superseded");
    }

    let snapshot = controller.snapshot();
    for role in TrackRole::ALL {
        print_track(snapshot.track(role));
    }

    let loaded = TrackRole::ALL
        .iter()
        .any(|role| snapshot.track(*role).state.is_loaded());
    controller.teardown();
    if !loaded {
        bail!("neither track could be loaded");
    }
    Ok(())
}

fn print_track(track: &TrackSnapshot) {
    println!("[{}] {}", track.role, track.label);
    println!("  state:    {:?}", track.state);
    println!("  duration: {:.3}s", track.duration);
    if let Some(bounds) = track.bounds {
        println!(
            "  kept:     samples {}..{}",
            bounds.start_sample, bounds.end_sample
        );
    }
    if let Some(url) = &track.resource_url {
        println!("  resource: {}", url);
    }
    println!("  peaks:    {}", track.peaks.len());
}
