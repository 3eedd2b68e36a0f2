// fraglog - core/model.rs
//
// Match and participant state. Pure data with no I/O; the driver owns the
// single current `Game` and replaces it wholesale on every new-game marker.

use crate::core::classifier::Weapon;
use crate::core::color;
use crate::core::record::Attr;
use crate::util::constants::{SCORE_SUICIDE_KEY, SCORE_TOTAL_KEY};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Player
// =============================================================================

/// One participant of the tracked match, keyed by raw (colour-coded) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Raw display name, colour codes included.
    pub name: String,

    /// `name` with every colour code removed. Computed once at creation.
    pub text_name: String,

    /// Last known address. Empty means no connection was ever seen: a bot.
    pub ip: String,

    connected: bool,

    /// Opponent name -> tally. The player's own name holds self-kills as a
    /// negative count.
    scores: HashMap<String, i64>,
}

/// Score totals derived from a player's tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreSummary {
    /// Sum of every tally, self-kills included.
    pub total: i64,
    /// Kills of other players.
    pub frags: i64,
    /// Number of self-kills (never negative).
    pub self_kills: i64,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            text_name: color::text_name(&name),
            name,
            ip: String::new(),
            connected: false,
            scores: HashMap::new(),
        }
    }

    /// Record a kill of `opponent`. Killing yourself costs a point.
    ///
    /// The weapon is carried on the emitted record only.
    pub fn frag(&mut self, opponent: &str, _weapon: Weapon) {
        let tally = self.scores.entry(opponent.to_string()).or_insert(0);
        if opponent == self.name {
            *tally -= 1;
        } else {
            *tally += 1;
        }
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_bot(&self) -> bool {
        self.ip.is_empty()
    }

    pub fn scores(&self) -> &HashMap<String, i64> {
        &self.scores
    }

    pub fn summary(&self) -> ScoreSummary {
        let total: i64 = self.scores.values().sum();
        let frags = total - self.scores.get(&self.name).copied().unwrap_or(0);
        ScoreSummary {
            total,
            frags,
            self_kills: frags - total,
        }
    }

    /// Identity group: name, text_name, ip, connected, is_bot.
    pub fn to_attr(&self, key: impl Into<String>) -> Attr {
        Attr::group(
            key,
            vec![
                Attr::string("name", self.name.clone()),
                Attr::string("text_name", self.text_name.clone()),
                Attr::string("ip", self.ip.clone()),
                Attr::bool("connected", self.connected),
                Attr::bool("is_bot", self.is_bot()),
            ],
        )
    }

    /// Per-opponent tallies sorted by opponent name, the self-kill entry
    /// under `@@suicide@@`, then `@@total@@`.
    pub fn score_attrs(&self) -> Vec<Attr> {
        let mut opponents: Vec<(&String, &i64)> = self.scores.iter().collect();
        opponents.sort_by(|a, b| a.0.cmp(b.0));

        let mut attrs = Vec::with_capacity(opponents.len() + 1);
        let mut total = 0;
        for (opponent, tally) in opponents {
            total += *tally;
            let key = if *opponent == self.name {
                SCORE_SUICIDE_KEY
            } else {
                opponent.as_str()
            };
            attrs.push(Attr::int(key, *tally));
        }
        attrs.push(Attr::int(SCORE_TOTAL_KEY, total));
        attrs
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.text_name.is_empty() {
            write!(f, " ({})", self.text_name)?;
        }
        if !self.ip.is_empty() {
            write!(f, " [{}]", self.ip)?;
        }
        if !self.scores.is_empty() {
            let s = self.summary();
            write!(f, " scores {} with {} frag(s)!", s.total, s.frags)?;
            if s.self_kills > 0 {
                write!(f, " ... and {} self kill(s) ...", s.self_kills)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Game
// =============================================================================

/// The single match currently being tracked.
///
/// A `Game` created with an empty type stands for "attached mid-match":
/// it can accumulate players but will never be clean.
#[derive(Debug, Clone, Default)]
pub struct Game {
    game_type: String,
    started: bool,
    ended: bool,
    started_at: Option<DateTime<Utc>>,
    players: HashMap<String, Player>,
}

impl Game {
    pub fn new(game_type: impl Into<String>) -> Self {
        Self {
            game_type: game_type.into(),
            ..Self::default()
        }
    }

    pub fn game_type(&self) -> &str {
        &self.game_type
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Mark the match as started. A repeated start overwrites the timestamp.
    pub fn start(&mut self) {
        self.started = true;
        self.started_at = Some(Utc::now());
    }

    pub fn end(&mut self) {
        self.ended = true;
    }

    /// Look up `name`, creating the player on first reference.
    ///
    /// The player is (re)marked connected. A non-empty `ip` replaces the
    /// known address; an empty one never clears it.
    pub fn add_player(&mut self, name: &str, ip: &str) -> &mut Player {
        let player = self
            .players
            .entry(name.to_string())
            .or_insert_with(|| Player::new(name));
        player.connected = true;
        if !ip.is_empty() {
            player.ip = ip.to_string();
        }
        player
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    /// All known players, ordered by name.
    pub fn players(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        players
    }

    /// Observed from its start marker with a known type.
    pub fn is_clean(&self) -> bool {
        self.started && !self.game_type.is_empty()
    }

    /// Clean and observed ending: eligible for a summary.
    pub fn is_full_game(&self) -> bool {
        self.is_clean() && self.ended
    }

    /// True when every participant is a bot (vacuously true with nobody).
    pub fn is_full_bot(&self) -> bool {
        self.players.values().all(Player::is_bot)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Game type: {}", self.game_type)?;
        let players = self.players();
        writeln!(f, "Players:")?;
        for p in players.iter().filter(|p| !p.is_bot()) {
            writeln!(f, "\t- {p}")?;
        }
        writeln!(f, "Bots:")?;
        for p in players.iter().filter(|p| p.is_bot()) {
            writeln!(f, "\t- {p}")?;
        }
        Ok(())
    }
}
