// fraglog - util/logging.rs
//
// Diagnostic logging with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug (sets RUST_LOG=debug)
//   - Config file: [logging] level = "debug"
//
// Output: always stderr. stdout is reserved for the JSON record stream, so
// diagnostics must never be interleaved with it.

use tracing_subscriber::EnvFilter;

/// Build the filter for the diagnostic channel.
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "info".
fn build_filter(debug_flag: bool, config_level: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    }
}

/// Initialise the logging subsystem.
///
/// `debug_flag` is true when the user passed --debug on the CLI.
/// `config_level` is the level from config.toml (if present).
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(debug_flag, config_level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .init();

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        "Logging initialised"
    );
}
