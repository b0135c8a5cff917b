use anyhow::{Context, Result};
use clap::Parser;
use speech_studio::backend::QueryMode;
use speech_studio::integration::StudioConfig;
use speech_studio::speech::Language;
use speech_studio::ui::{self, AppState};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Speech Studio - voice chat with an audio-reactive particle field
#[derive(Parser)]
#[command(name = "speech-studio", version, about)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chat backend endpoint
    #[arg(long, env = "SPEECH_STUDIO_BACKEND_URL")]
    backend_url: Option<String>,

    /// Language tag: en-US, en-GB, hi-IN or bho-IN
    #[arg(short, long)]
    language: Option<Language>,

    /// Query mode: single or multi
    #[arg(short, long)]
    mode: Option<QueryMode>,

    /// Number of particles
    #[arg(long)]
    particles: Option<usize>,

    /// Text only: do not open the microphone or speakers
    #[arg(long)]
    no_audio: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "speech_studio=debug,info",
        1 => "speech_studio=trace,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(cli: &Cli) -> Result<StudioConfig> {
    let mut config = StudioConfig::discover(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(url) = &cli.backend_url {
        config = config.with_backend_url(url.clone());
    }
    if let Some(language) = cli.language {
        config = config.with_language(language);
    }
    if let Some(mode) = cli.mode {
        config = config.with_mode(mode);
    }
    if let Some(count) = cli.particles {
        config = config.with_particle_count(count);
    }
    if cli.no_audio {
        config = config.without_audio();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    info!("Starting Speech Studio");

    let config = load_config(&cli)?;

    // Backend requests run here; the UI stays on the main thread
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let state = AppState::new(&config, runtime.handle().clone()).context("Failed to set up application")?;

    ui::run(&config, state).map_err(|e| anyhow::anyhow!("UI error: {}", e))?;

    info!("Speech Studio exited");
    Ok(())
}
