// fraglog - core/color.rs
//
// Colour-code handling for console lines and player names.
// The server prints names with terminal escape sequences; the game itself
// (and every player-facing tool) uses caret notation: `^` followed by a digit.
// Everything downstream of this module works on caret notation only.

use crate::util::constants::{ANSI_RESET, ANSI_TO_CARET};
use regex::Regex;
use std::sync::OnceLock;

fn ansi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1B\[[0-9;]*m").expect("color: invalid ANSI regex"))
}

fn caret_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\^[0-9]").expect("color: invalid caret regex"))
}

/// Remove a single reset sequence from the very end of `line`, if present.
///
/// A trailing reset would otherwise become a redundant `^7`.
pub fn strip_trailing_reset(line: &str) -> &str {
    line.strip_suffix(ANSI_RESET).unwrap_or(line)
}

/// Rewrite terminal colour escapes as caret codes.
///
/// Known sequences map to their caret code (see `ANSI_TO_CARET`); any other
/// SGR sequence is deleted. Text without escapes is returned unchanged, so
/// running this twice is the same as running it once.
pub fn convert_ansi_to_caret(input: &str) -> String {
    ansi_regex()
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let seq = &caps[0];
            ANSI_TO_CARET
                .iter()
                .find(|(ansi, _)| *ansi == seq)
                .map(|(_, caret)| *caret)
                .unwrap_or("")
        })
        .into_owned()
}

/// Clean up a captured player name.
///
/// Trims whitespace, then drops a dangling colour code left at the end of
/// the name: `^4Su^7ta^1t^7` becomes `^4Su^7ta^1t`. A caret further than two
/// characters from the end is part of the name and is kept.
pub fn sanitize_player(name: &str) -> String {
    let trimmed = name.trim();
    match trimmed.rfind('^') {
        Some(i) if i + 2 >= trimmed.len() => trimmed[..i].to_string(),
        _ => trimmed.to_string(),
    }
}

/// Colour-free rendering of a name: every caret+digit pair removed.
pub fn text_name(name: &str) -> String {
    caret_regex().replace_all(name, "").into_owned()
}
