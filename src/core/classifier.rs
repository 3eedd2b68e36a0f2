// fraglog - core/classifier.rs
//
// Line-shape recognition for server console output.
// Core layer: pure functions over &str, no state, no I/O.
//
// Recognisers are evaluated in a fixed priority order and the first match
// wins. Frag phrasings are tried before everything else because victims and
// killers are free-form names that can contain any of the later shapes.

use crate::util::constants::{END_OF_ROUND_MARKER, MATCH_START_MARKER, SPEAKER_BLACKLIST};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

// =============================================================================
// Events
// =============================================================================

/// Weapon label attached to a frag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weapon {
    Instagib,
    Rocket,
    Riotgun,
    Lasergun,
    Plasmagun,
    Grenade,
    /// The victim killed themselves.
    SelfKill,
}

impl Weapon {
    /// Label used in emitted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Weapon::Instagib => "instagib",
            Weapon::Rocket => "rocket",
            Weapon::Riotgun => "riotgun",
            Weapon::Lasergun => "lasergun",
            Weapon::Plasmagun => "plasmagun",
            Weapon::Grenade => "grenade",
            Weapon::SelfKill => "self",
        }
    }
}

impl fmt::Display for Weapon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognised kill: `killer` fragged `victim` with `weapon`.
///
/// Names are the raw captures; callers sanitise them before use as keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frag {
    pub victim: String,
    pub killer: String,
    pub weapon: Weapon,
}

/// What a console line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Frag(Frag),
    MatchStart,
    Enter { name: String },
    Connect { name: String, ip: String },
    JoinTeam { name: String, team: String },
    Disconnect { name: String },
    EndOfRound,
    NewGame { game_type: String },
    Chat { speaker: String, text: String },
}

impl LineEvent {
    /// Short label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            LineEvent::Frag(_) => "frag",
            LineEvent::MatchStart => "match_start",
            LineEvent::Enter { .. } => "enter",
            LineEvent::Connect { .. } => "connect",
            LineEvent::JoinTeam { .. } => "join_team",
            LineEvent::Disconnect { .. } => "disconnect",
            LineEvent::EndOfRound => "end_of_round",
            LineEvent::NewGame { .. } => "new_game",
            LineEvent::Chat { .. } => "chat",
        }
    }
}

// =============================================================================
// Speaker blacklist
// =============================================================================

/// Server messages shaped like `<speaker>: <text>` that are not chat.
///
/// Membership is an exact match on the captured speaker, before any
/// trimming or colour clean-up.
#[derive(Debug, Clone)]
pub struct SpeakerBlacklist {
    entries: HashSet<String>,
}

impl SpeakerBlacklist {
    /// The fixed built-in set plus `extra` entries (e.g. from config.toml).
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        list.entries.extend(extra.into_iter().map(Into::into));
        list
    }

    pub fn contains(&self, speaker: &str) -> bool {
        self.entries.contains(speaker)
    }
}

impl Default for SpeakerBlacklist {
    fn default() -> Self {
        Self {
            entries: SPEAKER_BLACKLIST.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

// =============================================================================
// Frag sub-grammar
// =============================================================================

/// One kill phrasing: the regex captures victim then killer.
struct FragTemplate {
    re: Regex,
    weapon: Weapon,
}

fn re(pat: &str) -> Regex {
    Regex::new(pat).expect("classifier: invalid regex")
}

fn frag_templates() -> &'static [FragTemplate] {
    static TEMPLATES: OnceLock<Vec<FragTemplate>> = OnceLock::new();
    TEMPLATES.get_or_init(|| {
        let t = |pat: &str, weapon| FragTemplate { re: re(pat), weapon };
        vec![
            // %APPDATA%^7 was instagibbed by Sid^7's instabeam
            t(r"^(.+)(?-u:\s)was instagibbed by (.+)'s instabeam", Weapon::Instagib),
            // P.E.#1^7 ate Monada^7's rocket
            t(r"^(.+)(?-u:\s)ate (.+)'s rocket", Weapon::Rocket),
            t(r"^(.+)(?-u:\s)almost dodged (.+)'s rocket", Weapon::Rocket),
            t(r"^(.+)(?-u:\s)was shred by (.+)'s riotgun", Weapon::Riotgun),
            t(r"^(.+)(?-u:\s)was cut by (.+)'s lasergun", Weapon::Lasergun),
            t(r"^(.+)(?-u:\s)was melted by (.+)'s plasmagun", Weapon::Plasmagun),
            t(r"^(.+)(?-u:\s)didn't see (.+)'s grenade", Weapon::Grenade),
            t(r"^(.+)(?-u:\s)was popped by (.+)'s grenade", Weapon::Grenade),
        ]
    })
}

fn self_frag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // P.E.#1 ^7died
    RE.get_or_init(|| re(r"^(.+)(?-u:\s)\^7died"))
}

/// Try every kill phrasing in order, then the self-kill phrasing.
pub fn parse_frag(line: &str) -> Option<Frag> {
    for template in frag_templates() {
        if let Some(caps) = template.re.captures(line) {
            if let (Some(victim), Some(killer)) = (caps.get(1), caps.get(2)) {
                return Some(Frag {
                    victim: victim.as_str().to_string(),
                    killer: killer.as_str().to_string(),
                    weapon: template.weapon,
                });
            }
        }
    }

    let caps = self_frag_regex().captures(line)?;
    let victim = caps.get(1)?.as_str().to_string();
    Some(Frag {
        killer: victim.clone(),
        victim,
        weapon: Weapon::SelfKill,
    })
}

// =============================================================================
// Line shapes
// =============================================================================

/// How one line shape is recognised.
enum Matcher {
    /// Plain substring test, no captures.
    Contains(&'static str),
    /// Regex whose captures are turned into an event by `extract`.
    Pattern(Regex),
}

/// Builds the event from a match. `None` means "not this shape after all".
type Extractor = fn(Option<&Captures<'_>>, &SpeakerBlacklist) -> Option<LineEvent>;

struct Rule {
    matcher: Matcher,
    extract: Extractor,
}

fn cap(caps: Option<&Captures<'_>>, i: usize) -> Option<String> {
    caps?.get(i).map(|m| m.as_str().to_string())
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            Rule {
                matcher: Matcher::Contains(MATCH_START_MARKER),
                extract: |_, _| Some(LineEvent::MatchStart),
            },
            Rule {
                matcher: Matcher::Pattern(re(r"^(.+)(?-u:\s)entered the game")),
                extract: |c, _| Some(LineEvent::Enter { name: cap(c, 1)? }),
            },
            Rule {
                matcher: Matcher::Pattern(re(r"^(.+)(?-u:\s)connected(?-u:\s)from(?-u:\s)([0-9.]+):[0-9]+")),
                extract: |c, _| {
                    Some(LineEvent::Connect {
                        name: cap(c, 1)?,
                        ip: cap(c, 2)?,
                    })
                },
            },
            Rule {
                matcher: Matcher::Pattern(re(r"^(.+)(?-u:\s)joined the ([^\t\n\x0B\f\r ]+) team.")),
                extract: |c, _| {
                    Some(LineEvent::JoinTeam {
                        name: cap(c, 1)?,
                        team: cap(c, 2)?,
                    })
                },
            },
            Rule {
                matcher: Matcher::Pattern(re(r"^(.+)(?-u:\s)disconnected")),
                extract: |c, _| Some(LineEvent::Disconnect { name: cap(c, 1)? }),
            },
            Rule {
                matcher: Matcher::Contains(END_OF_ROUND_MARKER),
                extract: |_, _| Some(LineEvent::EndOfRound),
            },
            Rule {
                matcher: Matcher::Pattern(re(r"^Gametype(?-u:\s)+'([^']+)'(?-u:\s)+initialized")),
                extract: |c, _| Some(LineEvent::NewGame { game_type: cap(c, 1)? }),
            },
            Rule {
                matcher: Matcher::Pattern(re(r"^(.+):(?-u:\s)(.+)")),
                extract: |c, blacklist| {
                    let speaker = cap(c, 1)?;
                    if blacklist.contains(&speaker) {
                        return None;
                    }
                    Some(LineEvent::Chat {
                        speaker,
                        text: cap(c, 2)?,
                    })
                },
            },
        ]
    })
}

/// Ordered first-match-wins classifier for normalised console lines.
#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
    blacklist: SpeakerBlacklist,
}

impl LineClassifier {
    pub fn new(blacklist: SpeakerBlacklist) -> Self {
        Self { blacklist }
    }

    pub fn blacklist(&self) -> &SpeakerBlacklist {
        &self.blacklist
    }

    /// Classify a line whose colour escapes have already been normalised.
    ///
    /// Returns `None` for lines of no known shape; they are still emitted,
    /// just without attributes.
    pub fn classify(&self, line: &str) -> Option<LineEvent> {
        if let Some(frag) = parse_frag(line) {
            return Some(LineEvent::Frag(frag));
        }

        for rule in rules() {
            let event = match &rule.matcher {
                Matcher::Contains(needle) => {
                    if !line.contains(needle) {
                        continue;
                    }
                    (rule.extract)(None, &self.blacklist)
                }
                Matcher::Pattern(re) => match re.captures(line) {
                    Some(caps) => (rule.extract)(Some(&caps), &self.blacklist),
                    None => continue,
                },
            };
            if event.is_some() {
                return event;
            }
        }
        None
    }
}
