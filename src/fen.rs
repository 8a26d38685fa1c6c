use thiserror::Error;

use crate::{
    attacks::attacks_from_pawn,
    castling::CastlingRight,
    coordinates::{File, Rank, Square},
    piece::{Color, Piece, PieceType},
    position::Position,
};

/// The FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

//======================================================================================================================
// Error handling
//======================================================================================================================

/// Error type for parsing a FEN (Forsyth-Edwards Notation) string.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FenError {
    #[error("Invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("Invalid active color: {0}")]
    InvalidActiveColor(String),

    #[error("Invalid castling availability: {0}")]
    InvalidCastlingAvailability(String),

    #[error("Invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("Invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("Invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),

    #[error("Missing field in FEN: {0}")]
    MissingField(&'static str),
}

/// The six fields of a FEN string.
#[derive(Debug, Clone, PartialEq)]
pub struct Fen {
    pub position: Position,
    pub turn: Color,
    pub castling: CastlingRight,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

//======================================================================================================================
// Parsing
//======================================================================================================================

fn read_piece_placement(piece_placement: &str) -> Result<Position, FenError> {
    let invalid = || FenError::InvalidPiecePlacement(piece_placement.to_string());

    let mut position = Position::new();
    let mut ranks = 0;
    for (row, text) in piece_placement.split('/').enumerate() {
        let rank = Rank::R8.down(row as i8).map_err(|_| invalid())?;
        let mut file = 0u8;
        for c in text.chars() {
            if let Some(count) = c.to_digit(10).filter(|count| (1..=8).contains(count)) {
                file = file
                    .checked_add(count as u8)
                    .filter(|file| *file <= File::COUNT as u8)
                    .ok_or_else(invalid)?;
            } else {
                let piece = Piece::try_from(c).map_err(|_| invalid())?;
                if file >= File::COUNT as u8 {
                    return Err(invalid());
                }
                position.put_piece(piece, Square::new(File::from(file), rank));
                file += 1;
            }
        }
        if file != File::COUNT as u8 {
            return Err(invalid());
        }
        ranks += 1;
    }

    if ranks != Rank::COUNT {
        return Err(invalid());
    }
    Ok(position)
}

fn read_active_color(active_color: &str) -> Result<Color, FenError> {
    match active_color {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(FenError::InvalidActiveColor(active_color.to_string())),
    }
}

fn read_en_passant_square(en_passant_square: &str) -> Result<Option<Square>, FenError> {
    match en_passant_square {
        "-" => Ok(None),
        _ => Square::try_from(en_passant_square)
            .map(Some)
            .map_err(|_| FenError::InvalidEnPassantSquare(en_passant_square.to_string())),
    }
}

/// Parses a FEN string.
///
/// The piece placement and the active color are required. The other fields default to `-`, `-`,
/// `0` and `1` when missing.
///
/// # See also
/// [The PGN specifications](https://ia902908.us.archive.org/26/items/pgn-standard-1994-03-12/PGN_standard_1994-03-12.txt)
/// that defines the FEN format at section 16.1.
pub fn parse(fen: &str) -> Result<Fen, FenError> {
    let mut fields = fen.split_whitespace();

    let position = read_piece_placement(fields.next().ok_or(FenError::MissingField("piece placement"))?)?;
    let turn = read_active_color(fields.next().ok_or(FenError::MissingField("active color"))?)?;

    let castling_field = fields.next().unwrap_or("-");
    let castling = CastlingRight::try_from(castling_field)
        .map_err(|_| FenError::InvalidCastlingAvailability(castling_field.to_string()))?;

    let en_passant = read_en_passant_square(fields.next().unwrap_or("-"))?;

    let halfmove_field = fields.next().unwrap_or("0");
    let halfmove_clock =
        halfmove_field.parse().map_err(|_| FenError::InvalidHalfmoveClock(halfmove_field.to_string()))?;

    let fullmove_field = fields.next().unwrap_or("1");
    let fullmove_number =
        fullmove_field.parse().map_err(|_| FenError::InvalidFullmoveNumber(fullmove_field.to_string()))?;

    Ok(Fen { position, turn, castling, en_passant, halfmove_clock, fullmove_number })
}

//======================================================================================================================
// Writing
//======================================================================================================================

fn write_piece_placement(position: &Position) -> String {
    let mut result = String::with_capacity(70);
    for rank in Rank::ALL.iter().rev() {
        let mut empty_count = 0;
        for file in File::ALL {
            match position[Square::new(file, *rank)] {
                Some(piece) => {
                    if empty_count > 0 {
                        result.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    result.push(piece.into());
                }
                None => empty_count += 1,
            }
        }
        if empty_count > 0 {
            result.push_str(&empty_count.to_string());
        }
        if *rank != Rank::R1 {
            result.push('/');
        }
    }
    result
}

/// Writes the en passant field, which is only filled when a pawn of the side to move attacks the
/// target square.
fn write_en_passant(fen: &Fen) -> String {
    match fen.en_passant {
        Some(square)
            if !(attacks_from_pawn(fen.turn.opposite(), square)
                & fen.position.occupied((fen.turn, PieceType::Pawn)))
            .is_empty() =>
        {
            square.to_string()
        }
        _ => "-".to_string(),
    }
}

/// Returns the FEN string of a position.
pub fn write(fen: &Fen) -> String {
    format!(
        "{} {} {} {} {} {}",
        write_piece_placement(&fen.position),
        char::from(fen.turn),
        fen.castling,
        write_en_passant(fen),
        fen.halfmove_clock,
        fen.fullmove_number
    )
}
