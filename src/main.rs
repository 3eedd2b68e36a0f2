// fraglog - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading
// 3. Logging initialisation (debug mode support)
// 4. Output wiring (stdout + tee file) and signal-driven cancellation
// 5. Running the event loop over stdin

use clap::Parser;
use fraglog::app::driver::{Driver, RunOutcome};
use fraglog::core::classifier::{LineClassifier, SpeakerBlacklist};
use fraglog::core::export::JsonLinesSink;
use fraglog::platform::{config, signal, tee::SplitWriter};
use fraglog::util::{self, error::ConfigError, error::FraglogError};
use std::io;
use std::path::PathBuf;

/// fraglog - game server console to structured match telemetry.
///
/// Reads console output on stdin and writes one JSON record per line to
/// stdout and to the given file.
#[derive(Parser, Debug)]
#[command(name = "fraglog", version, about)]
struct Cli {
    /// File to write on top of stdout (like tee but unbuffered).
    #[arg(short = 'p', long = "path")]
    path: Option<PathBuf>,

    /// Config file (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "fraglog stopped");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> util::error::Result<()> {
    let config_path = cli.config.clone().or_else(config::default_config_path);
    let (app_config, config_warnings) = match config_path {
        Some(ref path) => config::load_config(path),
        None => (config::AppConfig::default(), Vec::new()),
    };

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "fraglog starting"
    );
    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }

    let output_path = cli
        .path
        .or_else(|| app_config.output_file.clone())
        .ok_or(ConfigError::MissingOutputPath)?;

    let writer = SplitWriter::stdout_and_file(&output_path).map_err(|source| FraglogError::Io {
        path: output_path.clone(),
        operation: "open output file",
        source,
    })?;
    let mut sink = JsonLinesSink::new(writer);

    let cancel = signal::install().map_err(|source| FraglogError::Io {
        path: PathBuf::from("<signals>"),
        operation: "install signal handler",
        source,
    })?;

    tracing::debug!(
        output = %output_path.display(),
        extra_blacklist = app_config.extra_blacklist.len(),
        "Ready to read console output"
    );
    let blacklist = SpeakerBlacklist::with_extra(app_config.extra_blacklist);

    let mut driver = Driver::new(LineClassifier::new(blacklist));
    let report = driver.run(io::stdin().lock(), &mut sink, &cancel)?;

    if report.outcome == RunOutcome::ReadFailed {
        eprintln!("Error reading from stdin; processed {} line(s)", report.lines);
    }
    Ok(())
}
