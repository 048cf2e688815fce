use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use whisper_json_core::audio::AudioError;
use whisper_json_core::config::Config;
use whisper_json_core::models::{ModelManager, ModelName};
use whisper_json_core::output;
use whisper_json_core::transcribe::{TranscribeError, Transcriber, WhisperTranscriber};

/// Application-specific environment variable for log filtering (overrides config).
const LOG_ENV_VAR: &str = "WHISPER_JSON_LOG";

#[derive(Parser)]
#[command(name = "whisper-json")]
#[command(about = "Transcribe an audio file into timestamped JSON segments")]
#[command(version)]
struct Cli {
    /// Path to the audio file to transcribe
    #[arg(long = "audio_path", value_name = "PATH")]
    audio_path: PathBuf,

    /// Model to load: tiny, base, small, medium, large, large-v2 or large-v3
    #[arg(long, value_name = "NAME")]
    model: ModelName,

    /// Spoken language code, e.g. "en" or "zh"
    #[arg(long, value_name = "CODE")]
    language: String,
}

fn main() {
    let cli = Cli::parse();

    // Missing config falls back to defaults; a malformed file is fatal.
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: failed to load configuration: {:#}", anyhow::Error::new(e));
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("error: failed to initialize logging: {e:#}");
        process::exit(1);
    }

    // Route whisper.cpp and GGML logs through tracing
    whisper_json_core::install_logging_hooks();

    if let Err(e) = run(&cli, &config) {
        report(&e);
        process::exit(1);
    }
}

/// WHISPER_JSON_LOG env var overrides the config file level.
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(config.logging.level.as_directive().parse()?)
        .from_env()?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(filter)
        .init();

    Ok(())
}

fn run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    eprintln!("loading model: {}", cli.model);
    let manager = ModelManager::from_config(config).context("failed to locate model directory")?;
    let model_path = manager
        .ensure_model(cli.model)
        .with_context(|| format!("failed to fetch model {}", cli.model))?;
    tracing::info!("Model ready: {}", model_path.display());
    let mut transcriber = WhisperTranscriber::new(&model_path)
        .with_context(|| format!("failed to load model {}", cli.model))?;

    eprintln!("transcribing file: {}", cli.audio_path.display());
    eprintln!("language: {}", cli.language);
    let segments = transcriber.transcribe(&cli.audio_path, &cli.language)?;
    tracing::info!("Transcription produced {} segments", segments.len());

    let json = output::render_json(&segments).context("failed to serialize segments")?;
    println!("{json}");
    eprintln!("done, {} segments produced", segments.len());

    Ok(())
}

/// Missing audio gets a specific message naming the path; everything else is
/// reported with the full error chain. Standard output stays untouched.
fn report(err: &anyhow::Error) {
    let not_found = err.chain().find_map(|cause| {
        match cause.downcast_ref::<TranscribeError>() {
            Some(TranscribeError::Audio(AudioError::NotFound { path })) => Some(path),
            _ => None,
        }
    });

    match not_found {
        Some(path) => eprintln!("error: audio file not found: {}", path.display()),
        None => eprintln!("error: transcription failed: {err:#}"),
    }
}
