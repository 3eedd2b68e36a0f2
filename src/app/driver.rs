// fraglog - app/driver.rs
//
// The event loop: read a console line, normalise it, classify it, fold it
// into the current match, and emit exactly one record for it.
//
// Architecture:
//   - `Driver` owns the single current `Game`. A new-game marker replaces it
//     wholesale, dropping every player and score seen so far. Attaching to a
//     server mid-match therefore produces a game that never becomes clean,
//     and the first proper new-game marker starts tracking from scratch.
//   - Cancellation is cooperative: an `AtomicBool` is polled before every
//     read. A line that has been read is always fully processed and emitted.
//   - Read errors end the loop gracefully (`RunOutcome::ReadFailed`); sink
//     errors are returned to the caller and are fatal.

use crate::core::classifier::{Frag, LineClassifier, LineEvent};
use crate::core::color;
use crate::core::export::RecordSink;
use crate::core::model::Game;
use crate::core::record::{Attr, Level, Record};
use crate::util::error::SinkError;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunOutcome {
    /// End of input.
    #[default]
    Exhausted,
    /// The cancel flag was observed before a read.
    Cancelled,
    /// The input failed; lines read before the failure were emitted.
    ReadFailed,
}

/// Counters for one `Driver::run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Lines read and emitted.
    pub lines: u64,
    /// Full-match summaries emitted.
    pub full_games: u64,
}

/// Per-line state machine over the current match.
#[derive(Debug, Default)]
pub struct Driver {
    classifier: LineClassifier,
    game: Game,
}

impl Driver {
    /// Starts with an untyped game: whatever is in progress when we attach
    /// can never yield a summary.
    pub fn new(classifier: LineClassifier) -> Self {
        Self {
            classifier,
            game: Game::new(""),
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Turn one raw console line into its record, updating match state.
    pub fn process_line(&mut self, raw: &str) -> Record {
        let text = color::convert_ansi_to_caret(color::strip_trailing_reset(raw));

        let mut level = Level::Info;
        let mut attrs = Vec::new();

        let Some(event) = self.classifier.classify(&text) else {
            return Record::new(level, text, attrs);
        };
        tracing::trace!(event = event.kind(), line = %text, "Line classified");

        match event {
            LineEvent::Frag(frag) => attrs = self.apply_frag(frag),
            LineEvent::MatchStart => {
                self.game.start();
                tracing::debug!(game_type = self.game.game_type(), "Match started");
            }
            LineEvent::Enter { name } | LineEvent::JoinTeam { name, .. } => {
                let player = self.game.add_player(&color::sanitize_player(&name), "");
                attrs.push(player.to_attr("player"));
            }
            LineEvent::Connect { name, ip } => {
                let player = self.game.add_player(&color::sanitize_player(&name), &ip);
                tracing::debug!(player = %player.text_name, ip = %player.ip, "Player connected");
                attrs.push(player.to_attr("player"));
            }
            LineEvent::Disconnect { name } => {
                let player = self.game.add_player(&color::sanitize_player(&name), "");
                player.disconnect();
                attrs.push(player.to_attr("player"));
            }
            LineEvent::EndOfRound => {
                self.game.end();
                if self.game.is_full_game() {
                    let full_bot = self.game.is_full_bot();
                    attrs = summary_attrs(&self.game, full_bot);
                    if !full_bot {
                        level = Level::Warn;
                    }
                    tracing::info!(
                        game_type = self.game.game_type(),
                        full_bot,
                        "Full game ended\n{}",
                        self.game
                    );
                }
            }
            LineEvent::NewGame { game_type } => {
                tracing::debug!(
                    game_type = %game_type,
                    dropped_players = self.game.players().len(),
                    "New game; previous match state discarded"
                );
                self.game = Game::new(game_type);
                attrs.push(Attr::string("game_type", self.game.game_type()));
            }
            LineEvent::Chat { speaker, text: said } => {
                let player = self.game.add_player(&color::sanitize_player(&speaker), "");
                attrs.push(player.to_attr("player"));
                attrs.push(Attr::string("text", said));
            }
        }

        Record::new(level, text, attrs)
    }

    fn apply_frag(&mut self, frag: Frag) -> Vec<Attr> {
        let victim = color::sanitize_player(&frag.victim);
        let killer = color::sanitize_player(&frag.killer);

        self.game.add_player(&victim, "");
        self.game.add_player(&killer, "").frag(&victim, frag.weapon);

        let mut attrs = Vec::with_capacity(3);
        if let Some(k) = self.game.player(&killer) {
            attrs.push(k.to_attr("killer"));
        }
        if let Some(v) = self.game.player(&victim) {
            attrs.push(v.to_attr("victim"));
        }
        attrs.push(Attr::string("weapon", frag.weapon.as_str()));
        attrs
    }

    /// Process `input` line by line until it is exhausted, fails, or
    /// `cancel` is set. Every line read is emitted to `sink`.
    pub fn run<R, S>(
        &mut self,
        mut input: R,
        sink: &mut S,
        cancel: &AtomicBool,
    ) -> Result<RunReport, SinkError>
    where
        R: BufRead,
        S: RecordSink + ?Sized,
    {
        let mut report = RunReport::default();
        let mut buf = Vec::new();

        loop {
            if cancel.load(Ordering::SeqCst) {
                report.outcome = RunOutcome::Cancelled;
                break;
            }

            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    report.outcome = RunOutcome::Exhausted;
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, lines = report.lines, "Error reading input");
                    report.outcome = RunOutcome::ReadFailed;
                    break;
                }
            }

            // Console output is not guaranteed to be valid UTF-8.
            let line = String::from_utf8_lossy(trim_line_ending(&buf));
            let record = self.process_line(&line);

            report.lines += 1;
            if record.attr("full_game").is_some() {
                report.full_games += 1;
            }
            sink.emit(record)?;
        }

        tracing::info!(
            outcome = ?report.outcome,
            lines = report.lines,
            full_games = report.full_games,
            "Input processing stopped"
        );
        Ok(report)
    }
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

/// Attributes of a full-match summary record.
fn summary_attrs(game: &Game, full_bot: bool) -> Vec<Attr> {
    let players = game.players();
    let mut attrs = vec![
        Attr::string("game_type", game.game_type()),
        Attr::bool("full_game", true),
        Attr::group(
            "players",
            players.iter().map(|p| p.to_attr(p.name.clone())).collect(),
        ),
        Attr::group(
            "scores",
            players
                .iter()
                .map(|p| Attr::group(p.name.clone(), p.score_attrs()))
                .collect(),
        ),
        Attr::bool("full_bot", full_bot),
    ];
    if let Some(started_at) = game.started_at() {
        attrs.push(Attr::time("start_at", started_at));
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Value;
    use std::io::{self, Cursor, Read};
    use std::time::Duration;

    fn driver() -> Driver {
        Driver::new(LineClassifier::default())
    }

    fn feed(driver: &mut Driver, lines: &[&str]) -> Vec<Record> {
        lines.iter().map(|l| driver.process_line(l)).collect()
    }

    fn group_keys(value: &Value) -> Vec<String> {
        value
            .as_group()
            .unwrap()
            .iter()
            .map(|a| a.key.clone())
            .collect()
    }

    #[test]
    fn test_self_kill_line() {
        let mut d = driver();
        let record = d.process_line("Alice ^7died");
        let alice = d.game().player("Alice").unwrap();
        assert_eq!(alice.scores().get("Alice"), Some(&-1));
        assert_eq!(alice.summary().frags, 0);
        assert_eq!(alice.summary().self_kills, 1);
        assert_eq!(record.attr("weapon").and_then(Value::as_str), Some("self"));
    }

    #[test]
    fn test_rocket_frag_scores_on_killer() {
        let mut d = driver();
        let record = d.process_line("Bob ate Carol's rocket");
        assert_eq!(
            d.game().player("Carol").unwrap().scores().get("Bob"),
            Some(&1)
        );
        assert!(d.game().player("Bob").unwrap().scores().is_empty());

        let keys: Vec<&str> = record.attrs.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["killer", "victim", "weapon"]);
        assert_eq!(record.level, Level::Info);
    }

    #[test]
    fn test_frag_names_are_sanitised() {
        let mut d = driver();
        d.process_line("P.E.#1^7 was popped by ^4Monada^7's grenade");
        let killer = d.game().player("^4Monada").unwrap();
        assert_eq!(killer.text_name, "Monada");
        assert_eq!(killer.scores().get("P.E.#1"), Some(&1));
    }

    #[test]
    fn test_ansi_line_is_normalised_before_classification() {
        let mut d = driver();
        let record =
            d.process_line("\u{1b}[34mSid\u{1b}[37m connected from 10.1.1.1:27950\u{1b}[0m");
        assert_eq!(record.message, "^4Sid^7 connected from 10.1.1.1:27950");
        let sid = d.game().player("^4Sid").unwrap();
        assert_eq!(sid.ip, "10.1.1.1");
        assert!(!sid.is_bot());
    }

    #[test]
    fn test_blacklisted_speaker_is_not_chat() {
        let mut d = driver();
        let record = d.process_line("       : hello");
        assert!(record.attrs.is_empty());
        assert!(d.game().players().is_empty());
    }

    #[test]
    fn test_chat_line() {
        let mut d = driver();
        let record = d.process_line("Sutat^7: gg");
        assert_eq!(record.attr("text").and_then(Value::as_str), Some("gg"));
        assert!(d.game().player("Sutat").is_some());
    }

    #[test]
    fn test_disconnect_keeps_player() {
        let mut d = driver();
        feed(&mut d, &["Sutat connected from 1.2.3.4:1", "Sutat disconnected"]);
        let p = d.game().player("Sutat").unwrap();
        assert!(!p.is_connected());
        assert_eq!(p.ip, "1.2.3.4");
    }

    #[test]
    fn test_full_game_summary_with_real_player() {
        let mut d = driver();
        let records = feed(
            &mut d,
            &[
                "Gametype 'ca' initialized",
                "Human connected from 1.2.3.4:27950",
                "Bot entered the game",
                "All players are ready. Match starting!",
                "Bot ate Human's rocket",
                "-------------------------------------",
            ],
        );
        assert_eq!(
            records[0].attr("game_type").and_then(Value::as_str),
            Some("ca")
        );
        assert!(records[3].attrs.is_empty());

        let summary = records.last().unwrap();
        assert_eq!(summary.level, Level::Warn);
        assert_eq!(summary.attr("full_game").and_then(Value::as_bool), Some(true));
        assert_eq!(summary.attr("full_bot").and_then(Value::as_bool), Some(false));
        assert!(matches!(summary.attr("start_at"), Some(Value::Time(_))));
        assert_eq!(
            group_keys(summary.attr("players").unwrap()),
            vec!["Bot", "Human"]
        );

        let scores = summary.attr("scores").unwrap().as_group().unwrap();
        let human = crate::core::record::find(scores, "Human").unwrap();
        assert_eq!(group_keys(human), vec!["Bot", "@@total@@"]);
    }

    #[test]
    fn test_all_bot_summary_stays_info() {
        let mut d = driver();
        let records = feed(
            &mut d,
            &[
                "Gametype 'ffa' initialized",
                "All players are ready. Match starting!",
                "Bot1 was cut by Bot2's lasergun",
                "-------------------------------------",
            ],
        );
        let summary = records.last().unwrap();
        assert_eq!(summary.level, Level::Info);
        assert_eq!(summary.attr("full_bot").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn test_no_summary_without_new_game_marker() {
        let mut d = driver();
        let records = feed(
            &mut d,
            &[
                "All players are ready. Match starting!",
                "Bob ate Carol's rocket",
                "-------------------------------------",
            ],
        );
        assert!(records.last().unwrap().attrs.is_empty());
    }

    #[test]
    fn test_no_summary_without_match_start() {
        let mut d = driver();
        let records = feed(
            &mut d,
            &["Gametype 'ca' initialized", "-------------------------------------"],
        );
        assert!(records.last().unwrap().attrs.is_empty());
    }

    #[test]
    fn test_new_game_discards_previous_players() {
        let mut d = driver();
        feed(
            &mut d,
            &[
                "Gametype 'ca' initialized",
                "Old connected from 1.2.3.4:1",
                "All players are ready. Match starting!",
                "Bob ate Old's rocket",
                "Gametype 'ffa' initialized",
                "All players are ready. Match starting!",
            ],
        );
        assert!(d.game().players().is_empty());

        let summary = d.process_line("-------------------------------------");
        assert_eq!(summary.attr("game_type").and_then(Value::as_str), Some("ffa"));
        assert!(group_keys(summary.attr("players").unwrap()).is_empty());
        assert!(group_keys(summary.attr("scores").unwrap()).is_empty());
        assert_eq!(summary.level, Level::Info);
    }

    #[test]
    fn test_unmatched_line_has_no_attrs() {
        let mut d = driver();
        let record = d.process_line("Loading map wdm2...");
        assert_eq!(record.message, "Loading map wdm2...");
        assert!(record.attrs.is_empty());
        assert_eq!(record.level, Level::Info);
    }

    #[test]
    fn test_run_emits_one_record_per_line() {
        let input = Cursor::new("Gametype 'ca' initialized\r\nnoise\nSutat: hi\n");
        let mut records: Vec<Record> = Vec::new();
        let cancel = AtomicBool::new(false);

        let report = driver().run(input, &mut records, &cancel).unwrap();
        assert_eq!(report.outcome, RunOutcome::Exhausted);
        assert_eq!(report.lines, 3);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message, "Gametype 'ca' initialized");
        assert_eq!(records[2].message, "Sutat: hi");
    }

    #[test]
    fn test_run_honours_cancel_before_reading() {
        let input = Cursor::new("a\nb\n");
        let mut records: Vec<Record> = Vec::new();
        let cancel = AtomicBool::new(true);

        let report = driver().run(input, &mut records, &cancel).unwrap();
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert!(records.is_empty());
    }

    #[test]
    fn test_repeated_start_overwrites_timestamp() {
        let mut d = driver();
        d.process_line("Gametype 'ca' initialized");
        d.process_line("All players are ready. Match starting!");
        let first = d.game().started_at().unwrap();

        std::thread::sleep(Duration::from_millis(5));
        d.process_line("All players are ready. Match starting!");
        let second = d.game().started_at().unwrap();
        assert!(second > first, "{second} should be later than {first}");
        assert!(d.game().is_clean());
    }

    /// Hands out its whole input on the first read and raises the cancel
    /// flag at the same time.
    struct CancellingReader<'a> {
        data: &'static [u8],
        cancel: &'a AtomicBool,
    }

    impl Read for CancellingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            self.cancel.store(true, Ordering::SeqCst);
            Ok(n)
        }
    }

    #[test]
    fn test_cancel_during_read_finishes_current_line() {
        let cancel = AtomicBool::new(false);
        let input = io::BufReader::new(CancellingReader {
            data: b"Sutat entered the game
Sutat disconnected
",
            cancel: &cancel,
        });
        let mut records: Vec<Record> = Vec::new();

        let mut d = driver();
        let report = d.run(input, &mut records, &cancel).unwrap();
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.lines, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "Sutat entered the game");
        assert!(d.game().player("Sutat").unwrap().is_connected());
    }

    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
            }
            self.sent = true;
            let line = b"first line\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[test]
    fn test_read_failure_stops_gracefully() {
        let input = io::BufReader::new(FailingReader { sent: false });
        let mut records: Vec<Record> = Vec::new();
        let cancel = AtomicBool::new(false);

        let report = driver().run(input, &mut records, &cancel).unwrap();
        assert_eq!(report.outcome, RunOutcome::ReadFailed);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "first line");
    }
}
