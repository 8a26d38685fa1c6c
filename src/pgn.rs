use std::io::{BufRead, Lines};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

//======================================================================================================================
// Error handling
//======================================================================================================================

#[derive(Error, Debug)]
pub enum PgnError {
    #[error("Unable to read the PGN stream: {0}")]
    Io(#[from] std::io::Error),
}

//======================================================================================================================
// Patterns
//======================================================================================================================

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\[(?P<name>[A-Za-z0-9_]+)\s+"(?P<value>(?:[^"\\]|\\.)*)"\s*\]$"#).expect("The regex should be valid")
});

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

//======================================================================================================================
// Games
//======================================================================================================================

/// A game read from a PGN stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameInfo {
    /// The tag pairs in the order they were read.
    pub tags: Vec<(String, String)>,

    /// The movetext on a single line, ending with the result marker.
    pub movetext: String,
}

impl GameInfo {
    /// Returns the value of a tag.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.iter().find(|(tag, _)| tag == name).map(|(_, value)| value.as_str())
    }

    /// Returns the result marker that ends the movetext.
    pub fn result(&self) -> Option<&str> {
        self.movetext.split_whitespace().last().filter(|token| RESULTS.contains(token))
    }
}

//======================================================================================================================
// Reader
//======================================================================================================================

/// Reads the games of a multi-game PGN stream, one at a time.
///
/// A movetext starts on a line beginning with `1.` and ends with the first result marker. Games
/// are split on that marker only, blank lines carry no meaning. Tag pairs read before a movetext
/// belong to its game, other lines outside a movetext are skipped. A movetext still open at the end
/// of the stream is dropped.
pub struct PgnReader<R: BufRead> {
    lines: Lines<R>,
    tags: Vec<(String, String)>,
    movetext: Option<String>,
    failed: bool,
}

impl<R: BufRead> PgnReader<R> {
    pub fn new(reader: R) -> Self {
        PgnReader { lines: reader.lines(), tags: Vec::new(), movetext: None, failed: false }
    }

    /// Appends a line to the open movetext. Returns the finished game when the line holds the
    /// result marker.
    fn push_movetext(&mut self, line: &str) -> Option<GameInfo> {
        let movetext = self.movetext.get_or_insert_with(String::new);
        for token in line.split_whitespace() {
            if !movetext.is_empty() {
                movetext.push(' ');
            }
            movetext.push_str(token);

            if RESULTS.contains(&token) {
                let movetext = std::mem::take(movetext);
                self.movetext = None;
                return Some(GameInfo { tags: std::mem::take(&mut self.tags), movetext });
            }
        }
        None
    }
}

impl<R: BufRead> Iterator for PgnReader<R> {
    type Item = Result<GameInfo, PgnError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error.into()));
                }
            };
            let line = line.trim();

            if self.movetext.is_some() || line.starts_with("1.") {
                if let Some(game) = self.push_movetext(line) {
                    return Some(Ok(game));
                }
            } else if let Some(captures) = TAG.captures(line) {
                self.tags.push((captures["name"].to_string(), captures["value"].to_string()));
            } else if !line.is_empty() {
                warn!(line, "Skipping a line outside of any movetext");
            }
        }
    }
}

impl<R: BufRead> Drop for PgnReader<R> {
    fn drop(&mut self) {
        if let Some(movetext) = &self.movetext {
            warn!(movetext = movetext.as_str(), "Dropping a movetext without a result");
        }
    }
}
