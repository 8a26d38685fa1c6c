use std::fmt::Display;

use crate::{
    castling::CastlingSide,
    coordinates::{File, Rank, Square},
    piece::{Color, PieceType},
};

/// The origin hint written in a move, used to tell apart pieces that can reach the same square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disambiguation {
    None,
    File(File),
    Rank(Rank),
    Square(Square),
}

impl Disambiguation {
    /// Returns whether a piece standing on `square` matches the hint.
    pub fn matches(&self, square: Square) -> bool {
        match *self {
            Disambiguation::None => true,
            Disambiguation::File(file) => square.file() == file,
            Disambiguation::Rank(rank) => square.rank() == rank,
            Disambiguation::Square(hint) => square == hint,
        }
    }
}

impl Display for Disambiguation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disambiguation::None => Ok(()),
            Disambiguation::File(file) => write!(f, "{file}"),
            Disambiguation::Rank(rank) => write!(f, "{rank}"),
            Disambiguation::Square(square) => write!(f, "{square}"),
        }
    }
}

// The shape of a move as written in SAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveCategory {
    Piece,
    PieceCaptures,
    King,
    KingCaptures,
    CastleShort,
    CastleLong,
    Pawn,
    PawnCaptures,
    PawnPromotes,
    PawnCapturesAndPromotes,
}

/// The check marker written at the end of a move. It is informational only: the board decides
/// check and mate by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckMarker {
    #[default]
    None,
    Check,
    Mate,
}

impl Display for CheckMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckMarker::None => Ok(()),
            CheckMarker::Check => write!(f, "+"),
            CheckMarker::Mate => write!(f, "#"),
        }
    }
}

/// A move as described by its notation, before the board decides which piece it moves.
///
/// For castling `to` is the destination of the king. En passant is an ordinary pawn capture whose
/// destination is the en passant target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveDescriptor {
    pub color: Color,
    pub piece_type: PieceType,
    pub hint: Disambiguation,
    pub to: Square,
    pub capture: bool,
    pub category: MoveCategory,
    pub promotion: Option<PieceType>,
    pub check: CheckMarker,
}

impl MoveDescriptor {
    /// Returns the castling side for castling moves.
    pub fn castling_side(&self) -> Option<CastlingSide> {
        match self.category {
            MoveCategory::CastleShort => Some(CastlingSide::Kingside),
            MoveCategory::CastleLong => Some(CastlingSide::Queenside),
            _ => None,
        }
    }

    /// Returns the category of a move from its parts.
    pub fn categorize(piece_type: PieceType, capture: bool, promotion: Option<PieceType>) -> MoveCategory {
        match (piece_type, capture, promotion.is_some()) {
            (PieceType::Pawn, false, false) => MoveCategory::Pawn,
            (PieceType::Pawn, true, false) => MoveCategory::PawnCaptures,
            (PieceType::Pawn, false, true) => MoveCategory::PawnPromotes,
            (PieceType::Pawn, true, true) => MoveCategory::PawnCapturesAndPromotes,
            (PieceType::King, false, _) => MoveCategory::King,
            (PieceType::King, true, _) => MoveCategory::KingCaptures,
            (_, false, _) => MoveCategory::Piece,
            (_, true, _) => MoveCategory::PieceCaptures,
        }
    }
}

impl Display for MoveDescriptor {
    /// Formats the descriptor back to SAN.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(side) = self.castling_side() {
            return write!(f, "{side}{}", self.check);
        }

        if self.piece_type != PieceType::Pawn {
            write!(f, "{}", char::from(self.piece_type))?;
        }
        write!(f, "{}", self.hint)?;
        if self.capture {
            write!(f, "x")?;
        }
        write!(f, "{}", self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "={}", char::from(promotion))?;
        }
        write!(f, "{}", self.check)
    }
}
