// fraglog - util/constants.rs
//
// Single source of truth for all named constants, console markers, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "fraglog";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "fraglog";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

// =============================================================================
// Logging defaults
// =============================================================================

/// Default diagnostic log level when neither RUST_LOG, --debug, nor the
/// config file specify one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Accepted values for `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// =============================================================================
// Classifier limits
// =============================================================================

/// Hard upper bound on the number of extra blacklist entries accepted from
/// config.toml.
pub const MAX_EXTRA_BLACKLIST_ENTRIES: usize = 256;

// =============================================================================
// Console colour codes
// =============================================================================

/// Terminal reset sequence. Stripped from the end of every input line.
pub const ANSI_RESET: &str = "\u{1b}[0m";

/// Terminal escape sequences understood by the normaliser, with the caret
/// code each one becomes.
pub const ANSI_TO_CARET: &[(&str, &str)] = &[
    ("\u{1b}[30m", "^0"),       // black
    ("\u{1b}[31m", "^1"),       // red
    ("\u{1b}[32m", "^2"),       // green
    ("\u{1b}[33m", "^3"),       // yellow
    ("\u{1b}[34m", "^4"),       // blue
    ("\u{1b}[36m", "^5"),       // cyan
    ("\u{1b}[35m", "^6"),       // purple
    ("\u{1b}[37m", "^7"),       // white
    ("\u{1b}[38;5;208m", "^8"), // orange (approximation)
    ("\u{1b}[90m", "^9"),       // grey
    (ANSI_RESET, "^7"),         // reset renders as white
];

// =============================================================================
// Console markers
// =============================================================================

/// Printed once every player has readied up.
pub const MATCH_START_MARKER: &str = "All players are ready. Match starting!";

/// Horizontal rule printed around the end-of-round scoreboard.
pub const END_OF_ROUND_MARKER: &str = "-------------------------------------";

/// Speaker-like prefixes that belong to server messages rather than chat.
/// Anyone who picks one of these as a nickname is never recognised as
/// speaking.
pub const SPEAKER_BLACKLIST: &[&str] = &[
    "G_LoadGameScript",
    "       ",
    "Opening UDP/IP socket",
    "Opening UDP/IPv6 socket",
    "SpawnServer",
];

// =============================================================================
// Record attribute keys
// =============================================================================

/// Score-group key holding a player's self-kill tally.
pub const SCORE_SUICIDE_KEY: &str = "@@suicide@@";

/// Score-group key holding the sum of all of a player's tallies.
pub const SCORE_TOTAL_KEY: &str = "@@total@@";
