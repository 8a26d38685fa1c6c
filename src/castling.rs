use std::fmt::Display;

use bitflags::bitflags;

use crate::{
    bitboard::Bitboard,
    coordinates::{File, Rank, Square},
    piece::{Color, RookType},
};

/// The two ways of castling.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum CastlingSide {
    Kingside = 0,
    Queenside = 1,
}

impl CastlingSide {
    pub const COUNT: usize = 2;

    pub const ALL: [CastlingSide; CastlingSide::COUNT] = [CastlingSide::Kingside, CastlingSide::Queenside];

    /// Returns the castling side a rook of the given subtype belongs to, if any.
    pub fn of_rook(rook_type: RookType) -> Option<CastlingSide> {
        match rook_type {
            RookType::CastleShort => Some(CastlingSide::Kingside),
            RookType::CastleLong => Some(CastlingSide::Queenside),
            RookType::Promoted => None,
        }
    }

    /// Returns the rook subtype that castles on this side.
    pub fn rook_type(self) -> RookType {
        match self {
            CastlingSide::Kingside => RookType::CastleShort,
            CastlingSide::Queenside => RookType::CastleLong,
        }
    }
}

impl Display for CastlingSide {
    /// Formats the side the way it is written in SAN.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CastlingSide::Kingside => write!(f, "O-O"),
            CastlingSide::Queenside => write!(f, "O-O-O"),
        }
    }
}

bitflags! {
    /// The castling ability of both sides.
    ///
    /// A flag is only ever cleared while a game is played; `undo` is the only way to get it back.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CastlingRight: u8 {
        const WHITE_KINGSIDE = 0b0001;
        const WHITE_QUEENSIDE = 0b0010;
        const BLACK_KINGSIDE = 0b0100;
        const BLACK_QUEENSIDE = 0b1000;
    }
}

impl CastlingRight {
    /// Returns the single flag for a color and a side.
    pub fn new(color: Color, side: CastlingSide) -> CastlingRight {
        match (color, side) {
            (Color::White, CastlingSide::Kingside) => CastlingRight::WHITE_KINGSIDE,
            (Color::White, CastlingSide::Queenside) => CastlingRight::WHITE_QUEENSIDE,
            (Color::Black, CastlingSide::Kingside) => CastlingRight::BLACK_KINGSIDE,
            (Color::Black, CastlingSide::Queenside) => CastlingRight::BLACK_QUEENSIDE,
        }
    }

    /// Returns whether `color` may still castle on `side`.
    pub fn can_castle(&self, color: Color, side: CastlingSide) -> bool {
        self.contains(CastlingRight::new(color, side))
    }

    /// Clears the flags of `color` for every side listed.
    pub fn revoke(&mut self, color: Color, sides: &[CastlingSide]) {
        for side in sides {
            self.remove(CastlingRight::new(color, *side));
        }
    }
}

impl Display for CastlingRight {
    /// Formats the flags as the castling field of a FEN string (`KQkq`, or `-` when empty).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }

        for (flag, letter) in [
            (CastlingRight::WHITE_KINGSIDE, 'K'),
            (CastlingRight::WHITE_QUEENSIDE, 'Q'),
            (CastlingRight::BLACK_KINGSIDE, 'k'),
            (CastlingRight::BLACK_QUEENSIDE, 'q'),
        ] {
            if self.contains(flag) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

impl TryFrom<&str> for CastlingRight {
    type Error = char;

    /// Parses the castling field of a FEN string. The error is the first unexpected character.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value == "-" {
            return Ok(CastlingRight::empty());
        }

        value.chars().try_fold(CastlingRight::empty(), |rights, c| {
            let flag = match c {
                'K' => CastlingRight::WHITE_KINGSIDE,
                'Q' => CastlingRight::WHITE_QUEENSIDE,
                'k' => CastlingRight::BLACK_KINGSIDE,
                'q' => CastlingRight::BLACK_QUEENSIDE,
                _ => return Err(c),
            };
            Ok(rights | flag)
        })
    }
}

/// The squares involved in castling for one color and one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingSquares {
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
}

/// The castling rule table: where kings and rooks start and where they land, per color and side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRule {
    squares: [[CastlingSquares; CastlingSide::COUNT]; Color::COUNT],
}

impl CastlingRule {
    /// Returns the rule table of standard chess.
    pub fn standard() -> CastlingRule {
        let squares_for = |color: Color, side: CastlingSide| {
            let rank = Rank::R1.relative_to_color(color);
            let (king_to, rook_from, rook_to) = match side {
                CastlingSide::Kingside => (File::G, File::H, File::F),
                CastlingSide::Queenside => (File::C, File::A, File::D),
            };
            CastlingSquares {
                king_from: Square::new(File::E, rank),
                king_to: Square::new(king_to, rank),
                rook_from: Square::new(rook_from, rank),
                rook_to: Square::new(rook_to, rank),
            }
        };

        CastlingRule {
            squares: Color::ALL.map(|color| CastlingSide::ALL.map(|side| squares_for(color, side))),
        }
    }

    pub fn squares(&self, color: Color, side: CastlingSide) -> CastlingSquares {
        self.squares[usize::from(color)][side as usize]
    }

    pub fn king_from(&self, color: Color) -> Square {
        self.squares(color, CastlingSide::Kingside).king_from
    }

    /// Returns the squares that must be empty (apart from the castling king and rook) to castle.
    pub fn path(&self, color: Color, side: CastlingSide) -> Bitboard {
        let sq = self.squares(color, side);
        (Bitboard::between(sq.king_from, sq.rook_from) | sq.king_to | sq.rook_to) & !(sq.king_from | sq.rook_from)
    }

    /// Returns every square the king stands on while castling: origin, transit and destination.
    pub fn king_walk(&self, color: Color, side: CastlingSide) -> Bitboard {
        let sq = self.squares(color, side);
        Bitboard::between(sq.king_from, sq.king_to) | sq.king_from | sq.king_to
    }

    /// Returns the castling side whose rook starts on `square` for `color`, if any.
    pub fn side_of_rook_origin(&self, color: Color, square: Square) -> Option<CastlingSide> {
        CastlingSide::ALL.into_iter().find(|side| self.squares(color, *side).rook_from == square)
    }
}

impl Default for CastlingRule {
    fn default() -> Self {
        CastlingRule::standard()
    }
}
