use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unispeak::check::CheckReport;
use unispeak::config::AppConfig;
use unispeak::speech::EngineChoice;

/// Desktop text-to-speech with an online and an offline engine
#[derive(Parser, Debug)]
#[command(name = "unispeak", version, about)]
struct Cli {
    /// Print which engines and audio output are usable, then exit
    #[arg(long)]
    check: bool,

    /// Settings file [default: <config dir>/unispeak/config.toml]
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Engine to select at startup (online or offline)
    #[arg(long)]
    engine: Option<EngineChoice>,

    /// Directory holding Piper voices
    #[arg(long, value_name = "DIR")]
    voice_dir: Option<PathBuf>,

    /// Piper voice name, e.g. en_US-norman-medium
    #[arg(long, value_name = "NAME")]
    voice: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unispeak=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // --check always reports, even over a broken settings file
    let (config, config_path) = AppConfig::resolve(cli.config.as_deref(), cli.check)
        .context("Failed to load settings")?;
    let config = config.with_overrides(cli.engine, cli.voice_dir, cli.voice);

    if cli.check {
        print!("{}", CheckReport::gather(&config));
        return Ok(());
    }

    info!("Starting Text to Speech");
    unispeak::ui::run(config, config_path).map_err(|e| anyhow::anyhow!("GUI failed: {}", e))
}
