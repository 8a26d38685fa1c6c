use std::convert::From;
use std::fmt::Display;

use thiserror::Error;

/// Represents the color of a chess piece, and by extension the side to move.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const COUNT: usize = 2;

    /// Represents all colors of chess pieces, White first.
    pub const ALL: [Color; Color::COUNT] = [Color::White, Color::Black];

    /// Returns the opposite color.
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Returns the rank direction pawns of this color advance in (+1 for White, -1 for Black).
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

impl From<Color> for usize {
    fn from(color: Color) -> Self {
        color as usize
    }
}

impl From<Color> for char {
    /// Converts a `Color` to its FEN letter.
    fn from(color: Color) -> Self {
        match color {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl TryFrom<char> for Color {
    type Error = PieceTypeError;

    /// Parses a FEN or PGN color letter (`w`/`b`).
    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'w' | 'W' => Ok(Color::White),
            'b' | 'B' => Ok(Color::Black),
            _ => Err(PieceTypeError::InvalidColor(value)),
        }
    }
}

/// Errors produced when converting characters to colors, piece types or pieces.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PieceTypeError {
    #[error("Invalid piece character: {0}")]
    InvalidCharacter(char),

    #[error("Invalid color character: {0}")]
    InvalidColor(char),
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceType {
    Knight = 0,
    Bishop = 1,
    Rook = 2,
    Queen = 3,
    King = 4,
    Pawn = 5,
}

impl PieceType {
    pub const COUNT: usize = 6;

    /// Represents all piece types.
    pub const ALL: [PieceType; PieceType::COUNT] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Piece types a pawn may promote to.
    pub const PROMOTIONS: [PieceType; 4] = [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight];
}

impl From<PieceType> for usize {
    fn from(piece_type: PieceType) -> Self {
        piece_type as usize
    }
}

impl From<PieceType> for char {
    /// Converts a `PieceType` to its uppercase SAN/FEN letter.
    fn from(piece_type: PieceType) -> Self {
        match piece_type {
            PieceType::Pawn => 'P',
            PieceType::Knight => 'N',
            PieceType::Bishop => 'B',
            PieceType::Rook => 'R',
            PieceType::Queen => 'Q',
            PieceType::King => 'K',
        }
    }
}

impl TryFrom<char> for PieceType {
    type Error = PieceTypeError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase() {
            'p' => Ok(PieceType::Pawn),
            'n' => Ok(PieceType::Knight),
            'b' => Ok(PieceType::Bishop),
            'r' => Ok(PieceType::Rook),
            'q' => Ok(PieceType::Queen),
            'k' => Ok(PieceType::King),
            _ => Err(PieceTypeError::InvalidCharacter(value)),
        }
    }
}

impl Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "Pawn"),
            PieceType::Knight => write!(f, "Knight"),
            PieceType::Bishop => write!(f, "Bishop"),
            PieceType::Rook => write!(f, "Rook"),
            PieceType::Queen => write!(f, "Queen"),
            PieceType::King => write!(f, "King"),
        }
    }
}

/// The castling role of a rook.
///
/// Rooks set up on the castling origins remember which side they castle on for as long as they
/// live, even after moving away. A rook that came from a promotion, or that stands anywhere else
/// when a position is loaded, is `Promoted` and never takes part in castling.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RookType {
    CastleShort,
    CastleLong,
    Promoted,
}

/// Represents a chess piece.
///
/// A piece is a closed set of kinds, each carrying its color. Rooks additionally carry their
/// [`RookType`]. Pieces are plain values: the board never changes a piece in place, it removes it
/// and puts a new value on the destination square.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Piece {
    Pawn(Color),
    Knight(Color),
    Bishop(Color),
    Rook(Color, RookType),
    Queen(Color),
    King(Color),
}

impl Piece {
    /// Creates a new `Piece` with the given `Color` and `PieceType`.
    ///
    /// Rooks built this way have no castling role; use [`Piece::rook`] to build a castling rook.
    pub fn new(color: Color, piece_type: PieceType) -> Self {
        match piece_type {
            PieceType::Pawn => Piece::Pawn(color),
            PieceType::Knight => Piece::Knight(color),
            PieceType::Bishop => Piece::Bishop(color),
            PieceType::Rook => Piece::Rook(color, RookType::Promoted),
            PieceType::Queen => Piece::Queen(color),
            PieceType::King => Piece::King(color),
        }
    }

    pub fn rook(color: Color, rook_type: RookType) -> Self {
        Piece::Rook(color, rook_type)
    }

    /// Returns the Color of the piece.
    pub fn color(&self) -> Color {
        match *self {
            Piece::Pawn(color)
            | Piece::Knight(color)
            | Piece::Bishop(color)
            | Piece::Rook(color, _)
            | Piece::Queen(color)
            | Piece::King(color) => color,
        }
    }

    /// Returns the PieceType of the piece.
    pub fn piece_type(&self) -> PieceType {
        match self {
            Piece::Pawn(_) => PieceType::Pawn,
            Piece::Knight(_) => PieceType::Knight,
            Piece::Bishop(_) => PieceType::Bishop,
            Piece::Rook(_, _) => PieceType::Rook,
            Piece::Queen(_) => PieceType::Queen,
            Piece::King(_) => PieceType::King,
        }
    }

    /// Returns the castling role of a rook, or `None` for every other kind.
    pub fn rook_type(&self) -> Option<RookType> {
        match self {
            Piece::Rook(_, rook_type) => Some(*rook_type),
            _ => None,
        }
    }

    /// Returns whether the piece is of the given color and kind, ignoring the rook subtype.
    pub fn is(&self, color: Color, piece_type: PieceType) -> bool {
        self.color() == color && self.piece_type() == piece_type
    }
}

impl From<Piece> for char {
    /// Converts a `Piece` to its FEN letter, uppercase for White.
    fn from(piece: Piece) -> Self {
        match piece.color() {
            Color::White => char::from(piece.piece_type()).to_ascii_uppercase(),
            Color::Black => char::from(piece.piece_type()).to_ascii_lowercase(),
        }
    }
}

impl TryFrom<char> for Piece {
    type Error = PieceTypeError;

    /// Converts a FEN letter to a `Piece`.
    fn try_from(value: char) -> Result<Self, Self::Error> {
        let color = match value.is_ascii_uppercase() {
            true => Color::White,
            false => Color::Black,
        };
        let piece_type = PieceType::try_from(value)?;
        Ok(Piece::new(color, piece_type))
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.color(), self.piece_type())
    }
}
