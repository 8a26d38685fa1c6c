use std::fmt::Display;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::{
    board::{Board, BoardError},
    castling::CastlingRule,
    piece::Color,
    san::{self, NotationError},
};

//======================================================================================================================
// Error handling
//======================================================================================================================

/// Errors raised while validating or replaying movetext.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MovetextError {
    /// The move numbers do not run 1, 2, 3, ...
    #[error("The move numbers are not in order")]
    Unordered,

    #[error("Invalid move in movetext: {0}")]
    Notation(#[from] NotationError),

    /// A well-formed move was refused by the board. `ply` counts from 1.
    #[error("Illegal move at ply {ply}: {token}")]
    Illegal { ply: usize, token: String },

    #[error("Board error: {0}")]
    Board(#[from] BoardError),
}

//======================================================================================================================
// Patterns
//======================================================================================================================

/// Game termination markers.
const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").expect("The regex should be valid"));

// Innermost variation only. Nested variations are removed by repeating the replacement.
static VARIATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^()]*\)").expect("The regex should be valid"));

static SPACE_BEFORE_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\.").expect("The regex should be valid"));

static NUMBERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<number>[1-9][0-9]*)(?P<dots>\.+)(?P<rest>.*)$").expect("The regex should be valid")
});

//======================================================================================================================
// Movetext
//======================================================================================================================

/// The moves of a game as written in a PGN movetext section.
///
/// The text is filtered on construction: comments, variations and the result marker are dropped,
/// `0-0` and `0-0-0` are rewritten with letters and move numbers are split from the moves. A number
/// followed by several dots (`7...e5`) continues a move and is not counted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Movetext {
    numbers: Vec<u32>,
    moves: Vec<String>,
}

impl Movetext {
    pub fn new(text: &str) -> Self {
        let mut text = COMMENT.replace_all(text, " ").into_owned();
        while VARIATION.is_match(&text) {
            text = VARIATION.replace_all(&text, " ").into_owned();
        }
        let text = text.replace("0-0-0", "O-O-O").replace("0-0", "O-O");
        let text = SPACE_BEFORE_DOT.replace_all(&text, ".");

        let mut movetext = Movetext::default();
        for token in text.split_whitespace().filter(|token| !RESULTS.contains(token)) {
            match NUMBERED.captures(token) {
                Some(captures) => {
                    if &captures["dots"] == "." {
                        // The regex guarantees digits; only an overflow can fail.
                        movetext.numbers.push(captures["number"].parse().unwrap_or(u32::MAX));
                    }
                    let rest = &captures["rest"];
                    if !rest.is_empty() {
                        movetext.moves.push(rest.to_string());
                    }
                }
                None => movetext.moves.push(token.to_string()),
            }
        }
        movetext
    }

    /// Returns the moves, without numbers.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// Returns the move numbers in the order they were written.
    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    /// Returns whether the move numbers are 1, 2, 3, ...
    pub fn is_ordered(&self) -> bool {
        self.numbers.iter().zip(1..).all(|(number, expected)| *number == expected)
    }

    /// Checks the ordering and the notation of every move, White moving first.
    ///
    /// # Returns
    /// * `Ok(String)` - The normalised movetext, such as "1.e4 e5 2.Nf3"
    /// * `Err(MovetextError)` - If the numbers are out of order or a move is malformed
    pub fn validate(&self) -> Result<String, MovetextError> {
        self.validate_from(Color::White)
    }

    fn validate_from(&self, first: Color) -> Result<String, MovetextError> {
        if !self.is_ordered() {
            return Err(MovetextError::Unordered);
        }

        let rule = CastlingRule::standard();
        let mut color = first;
        for token in &self.moves {
            san::parse(color, token, &rule)?;
            color = color.opposite();
        }

        Ok(self.to_string())
    }

    /// Returns the cumulative prefixes of the game, one per complete pair of moves.
    ///
    /// "1.d4 Nf6 2.Nf3 e6 3.c4" gives `["1.d4 Nf6", "1.d4 Nf6 2.Nf3 e6"]`.
    pub fn sequence(&self) -> Vec<String> {
        let mut sequence: Vec<String> = Vec::new();
        for (number, pair) in self.numbers.iter().zip(self.moves.chunks(2)) {
            let [white, black] = pair else {
                break;
            };
            let item = match sequence.last() {
                Some(previous) => format!("{previous} {number}.{white} {black}"),
                None => format!("{number}.{white} {black}"),
            };
            sequence.push(item);
        }
        sequence
    }

    /// Validates the movetext then plays every move on the board, the side to move first.
    ///
    /// Nothing is played if validation fails. When the board refuses a move, the moves before it
    /// stay on the board and the error names the move.
    pub fn replay(&self, board: &mut Board) -> Result<(), MovetextError> {
        self.validate_from(board.turn())?;

        let mut color = board.turn();
        for (index, token) in self.moves.iter().enumerate() {
            if !board.play(color, token)? {
                debug!(ply = index + 1, token = token.as_str(), "Replay stopped on an illegal move");
                return Err(MovetextError::Illegal { ply: index + 1, token: token.clone() });
            }
            color = color.opposite();
        }

        Ok(())
    }
}

impl Display for Movetext {
    /// Writes the moves with their numbers, starting at 1.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, token) in self.moves.iter().enumerate() {
            match index {
                0 => write!(f, "1.{token}")?,
                _ if index % 2 == 0 => write!(f, " {}.{token}", index / 2 + 1)?,
                _ => write!(f, " {token}")?,
            }
        }
        Ok(())
    }
}
