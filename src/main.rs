use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use log::LevelFilter;

use snap_engine::{config::EngineConfig, smoke};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    /// Run the built-in smoke tests instead of opening windows
    #[arg(long)]
    test: bool,

    /// JSON object list describing windows, renderers and models
    #[arg(long, default_value = snap_engine::config::DEFAULT_DATA_FILE)]
    data: PathBuf,

    /// Present without waiting for vertical sync
    #[arg(long)]
    no_vsync: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("wgpu_hal", LevelFilter::Warn)
        .filter_module("wgpu_core", LevelFilter::Warn)
        .filter_module("naga", LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = Args::parse();
    log::info!("SnapEngine {}", VERSION);

    if args.test {
        let report = smoke::run_all();
        return if report.all_passed() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let config = EngineConfig::default()
        .with_data_file(args.data)
        .with_vsync(!args.no_vsync);

    match snap_engine::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
