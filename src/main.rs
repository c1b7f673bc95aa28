//! `voice-config` — check a `voice.config.json` and print what it configures.
//!
//! # Usage
//!
//! ```text
//! voice-config                       # platform default location
//! voice-config --work-dir /srv/bot   # /srv/bot/voice.config.json
//! voice-config --file ./voices.json  # explicit file
//! voice-config --json                # dump the normalised config
//! ```
//!
//! Exits non-zero with the first validation error when the file is invalid.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use voice_config::{
    config::{RootConfig, VoiceConfigManager},
    request::InferenceParameters,
};

#[derive(Parser)]
#[command(name = "voice-config")]
#[command(about = "Validate a voice.config.json and list its characters", long_about = None)]
struct Cli {
    /// Directory that contains voice.config.json
    #[arg(short, long, conflicts_with = "file")]
    work_dir: Option<PathBuf>,

    /// Explicit path to the config file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Print the normalised configuration as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn print_summary(config: &RootConfig) {
    println!("volume:        {}", config.volume);
    println!("GPT-SoVITS:    {}", config.synthesis_service_url);
    println!("install path:  {}", config.synthesis_service_path.display());
    println!("model version: {}", config.model_version);

    match &config.translation.backend {
        Some(backend) => println!(
            "translation:   {} / {} @ {} (context {})",
            backend.provider,
            backend.model_name,
            backend.base_url,
            backend.context_size()
        ),
        None => println!("translation:   disabled"),
    }

    println!("characters ({}):", config.characters.len());
    let defaults = InferenceParameters::service_defaults();
    for character in &config.characters {
        let params = character
            .inference
            .as_ref()
            .map(|p| p.merged_over(&defaults))
            .unwrap_or_else(|| defaults.clone());
        println!(
            "  - {:<16} lang={}/{} speed={} translate_to={}",
            character.name,
            params.prompt_language.as_deref().unwrap_or("-"),
            params.text_language.as_deref().unwrap_or("-"),
            params.speed.unwrap_or(1.0),
            character.translation_target().unwrap_or("-"),
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut manager = match (cli.file, cli.work_dir) {
        (Some(file), _) => VoiceConfigManager::from_path(file),
        (None, Some(dir)) => VoiceConfigManager::new(dir),
        (None, None) => VoiceConfigManager::default(),
    };
    let path = manager.config_path().display().to_string();
    log::info!("Checking {path}");

    let config = manager
        .load()
        .with_context(|| format!("voice config check failed for {path}"))?;

    if cli.json {
        let text = serde_json::to_string_pretty(config).context("serialising config")?;
        println!("{text}");
    } else {
        print_summary(config);
    }
    Ok(())
}
