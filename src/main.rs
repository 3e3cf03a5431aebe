mod app;
mod audio;
mod config;
mod error;
mod scrub;
mod ui;
mod waveform;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{arg, value_parser, Command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::PlayerConfig;
use crate::waveform::AmplitudeBars;

fn cli() -> Command {
    Command::new("stetho-player")
        .about("Waveform player for digital stethoscope recordings")
        .arg(arg!([FILE] "Recording to open").value_parser(value_parser!(PathBuf)))
        .arg(
            arg!(--config <PATH> "JSON configuration file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(--bars <N> "Number of waveform bars").value_parser(value_parser!(usize)))
        .arg(arg!(--"bars-json" "Print the waveform bars of FILE as JSON and exit").requires("FILE"))
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stetho_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let matches = cli().get_matches();

    let mut config = match PlayerConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(&bars) = matches.get_one::<usize>("bars") {
        config.bar_count = bars;
    }
    if let Err(e) = config.validate() {
        tracing::error!("{e}");
        return ExitCode::FAILURE;
    }

    let file = matches.get_one::<PathBuf>("FILE").cloned();

    if matches.get_flag("bars-json") {
        let Some(path) = file else {
            return ExitCode::FAILURE;
        };
        return match AmplitudeBars::extract(&path, config.bar_count) {
            Ok((bars, _)) => match serde_json::to_string(&bars) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!("Failed to serialize bars: {e}");
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                tracing::error!("Failed to read waveform from {:?}: {e}", path);
                ExitCode::FAILURE
            }
        };
    }

    tracing::info!("Starting stetho-player v{}", env!("CARGO_PKG_VERSION"));

    match app::run(config, file) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Player exited with error: {e}");
            ExitCode::FAILURE
        }
    }
}
