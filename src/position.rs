use std::ops::Index;

use crate::{
    attacks::{attacks_from, attacks_from_pawn, pawn_pushes},
    bitboard::Bitboard,
    coordinates::Square,
    piece::{Color, Piece, PieceType},
};

//======================================================================================================================
// OccupancyFilter implementation (used as input parameter for the occupied method of the Position struct)
//======================================================================================================================

/// Defines filtering criteria for retrieving occupied squares from a position.
///
/// # Variants
/// * `All` - Selects all occupied squares regardless of the pieces on them
/// * `ByColor(Color)` - Selects only squares occupied by pieces of the specified color
/// * `ByType(PieceType)` - Selects only squares occupied by pieces of the specified type, regardless of color
/// * `ByColorAndType(Color, PieceType)` - Selects squares occupied by pieces of the specified color and type
pub enum OccupancyFilter {
    All,
    ByColor(Color),
    ByType(PieceType),
    ByColorAndType(Color, PieceType),
}

impl From<Color> for OccupancyFilter {
    fn from(color: Color) -> Self {
        Self::ByColor(color)
    }
}

impl From<PieceType> for OccupancyFilter {
    fn from(piece_type: PieceType) -> Self {
        Self::ByType(piece_type)
    }
}

impl From<(Color, PieceType)> for OccupancyFilter {
    fn from((color, piece_type): (Color, PieceType)) -> Self {
        Self::ByColorAndType(color, piece_type)
    }
}

//======================================================================================================================
// Position implementation
//======================================================================================================================

/// The placement of the pieces on the board.
///
/// A square-indexed array answers "what stands here" in constant time while the per-color and
/// per-kind bitboards answer attack queries. The position is `Copy`: legality checks apply a
/// candidate move to a copy and inspect the copy, leaving the original untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    board: [Option<Piece>; Square::COUNT],
    bb_color: [Bitboard; Color::COUNT],
    bb_piece: [[Bitboard; PieceType::COUNT]; Color::COUNT],
}

impl Position {
    /// Creates an empty position.
    pub fn new() -> Self {
        Position {
            board: [None; Square::COUNT],
            bb_color: [Bitboard::EMPTY; Color::COUNT],
            bb_piece: [[Bitboard::EMPTY; PieceType::COUNT]; Color::COUNT],
        }
    }

    /// Returns the piece on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[usize::from(square)]
    }

    /// Puts a piece on an empty square.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the square is already occupied.
    pub fn put_piece(&mut self, piece: Piece, square: Square) {
        debug_assert!(self.board[usize::from(square)].is_none(), "{square} is already occupied");

        self.board[usize::from(square)] = Some(piece);
        self.bb_color[usize::from(piece.color())] |= square;
        self.bb_piece[usize::from(piece.color())][usize::from(piece.piece_type())] |= square;
    }

    /// Removes and returns the piece on `square`, if any.
    pub fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        let piece = self.board[usize::from(square)].take()?;
        self.bb_color[usize::from(piece.color())] ^= square;
        self.bb_piece[usize::from(piece.color())][usize::from(piece.piece_type())] ^= square;
        Some(piece)
    }

    /// Returns the occupied squares matching `filter`.
    pub fn occupied<F: Into<OccupancyFilter>>(&self, filter: F) -> Bitboard {
        match filter.into() {
            OccupancyFilter::All => self.bb_color[0] | self.bb_color[1],
            OccupancyFilter::ByColor(color) => self.bb_color[usize::from(color)],
            OccupancyFilter::ByType(piece_type) => {
                self.bb_piece[0][usize::from(piece_type)] | self.bb_piece[1][usize::from(piece_type)]
            }
            OccupancyFilter::ByColorAndType(color, piece_type) => {
                self.bb_piece[usize::from(color)][usize::from(piece_type)]
            }
        }
    }

    /// Returns the pieces of `color` with their squares, in ascending square order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied(color)
            .into_iter()
            .filter_map(move |square| self.piece_at(square).map(|piece| (square, piece)))
    }

    /// Returns the square of the king of `color`, or `None` if it has no king.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.occupied((color, PieceType::King)).lsb()
    }

    /// Returns the pieces of `color` attacking `sq`.
    ///
    /// # Parameters
    /// * `sq` - The square to test
    /// * `color` - The color of the attacking pieces
    ///
    /// # Returns
    /// A bitboard with the squares of every piece of `color` that attacks `sq`, pawns counting
    /// their diagonals only.
    pub fn attacks_to(&self, sq: Square, color: Color) -> Bitboard {
        let occupied = self.occupied(OccupancyFilter::All);
        let queens = self.occupied((color, PieceType::Queen));

        (attacks_from_pawn(color.opposite(), sq) & self.occupied((color, PieceType::Pawn)))
            | (attacks_from(PieceType::Knight, color, occupied, sq) & self.occupied((color, PieceType::Knight)))
            | (attacks_from(PieceType::King, color, occupied, sq) & self.occupied((color, PieceType::King)))
            | (attacks_from(PieceType::Bishop, color, occupied, sq)
                & (self.occupied((color, PieceType::Bishop)) | queens))
            | (attacks_from(PieceType::Rook, color, occupied, sq) & (self.occupied((color, PieceType::Rook)) | queens))
    }

    /// Returns whether any piece of `color` attacks `sq`.
    pub fn is_attacked(&self, sq: Square, color: Color) -> bool {
        !self.attacks_to(sq, color).is_empty()
    }

    /// Returns the squares attacked by the piece on `square`, or an empty set if there is none.
    pub fn attacks_from(&self, square: Square) -> Bitboard {
        match self.piece_at(square) {
            Some(piece) => {
                attacks_from(piece.piece_type(), piece.color(), self.occupied(OccupancyFilter::All), square)
            }
            None => Bitboard::EMPTY,
        }
    }

    /// Returns every square attacked by at least one piece of `color`.
    pub fn attacked_by(&self, color: Color) -> Bitboard {
        self.occupied(color)
            .into_iter()
            .fold(Bitboard::EMPTY, |attacked, square| attacked | self.attacks_from(square))
    }

    /// Returns the squares the piece on `square` can move to, ignoring the safety of its own king
    /// and castling.
    ///
    /// Pawns push forward to empty squares and capture diagonally onto enemy pieces or onto the en
    /// passant target. Other pieces move to every attacked square not held by their own side.
    pub fn reachable(&self, square: Square, en_passant: Option<Square>) -> Bitboard {
        let Some(piece) = self.piece_at(square) else {
            return Bitboard::EMPTY;
        };
        let color = piece.color();

        match piece.piece_type() {
            PieceType::Pawn => {
                let mut targets = self.occupied(color.opposite());
                if let Some(ep) = en_passant {
                    targets |= ep;
                }
                pawn_pushes(color, self.occupied(OccupancyFilter::All), square)
                    | (attacks_from_pawn(color, square) & targets)
            }
            _ => self.attacks_from(square) & !self.occupied(color),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new()
    }
}

impl Index<Square> for Position {
    type Output = Option<Piece>;

    fn index(&self, index: Square) -> &Self::Output {
        &self.board[usize::from(index)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::RookType;

    fn sample() -> Position {
        let mut position = Position::new();
        position.put_piece(Piece::King(Color::White), Square::E1);
        position.put_piece(Piece::rook(Color::White, RookType::CastleShort), Square::H1);
        position.put_piece(Piece::Pawn(Color::White), Square::E4);
        position.put_piece(Piece::King(Color::Black), Square::E8);
        position.put_piece(Piece::Pawn(Color::Black), Square::D5);
        position.put_piece(Piece::Bishop(Color::Black), Square::B4);
        position
    }

    #[test]
    fn test_put_and_remove_piece() {
        let mut position = sample();
        assert_eq!(position[Square::E4], Some(Piece::Pawn(Color::White)));
        assert!(position.occupied(Color::White).contains(Square::E4));

        assert_eq!(position.remove_piece(Square::E4), Some(Piece::Pawn(Color::White)));
        assert_eq!(position.piece_at(Square::E4), None);
        assert!(!position.occupied(OccupancyFilter::All).contains(Square::E4));
        assert!(position.occupied((Color::White, PieceType::Pawn)).is_empty());
        assert_eq!(position.remove_piece(Square::E4), None);
    }

    #[test]
    fn test_occupied_filters() {
        let position = sample();
        assert_eq!(position.occupied(OccupancyFilter::All).popcnt(), 6);
        assert_eq!(position.occupied(Color::Black), Square::E8 | Square::D5 | Square::B4);
        assert_eq!(position.occupied(PieceType::Pawn), Square::E4 | Square::D5);
        assert_eq!(position.occupied((Color::White, PieceType::Rook)), Bitboard::from(Square::H1));
    }

    #[test]
    fn test_king_square() {
        let position = sample();
        assert_eq!(position.king_square(Color::White), Some(Square::E1));
        assert_eq!(position.king_square(Color::Black), Some(Square::E8));
        assert_eq!(Position::new().king_square(Color::White), None);
    }

    #[test]
    fn test_attacks_to() {
        let position = sample();
        assert_eq!(position.attacks_to(Square::D5, Color::White), Bitboard::from(Square::E4));
        assert_eq!(position.attacks_to(Square::E4, Color::Black), Bitboard::from(Square::D5));
        assert!(position.is_attacked(Square::E1, Color::Black));
        assert!(!position.is_attacked(Square::E8, Color::White));
    }

    #[test]
    fn test_pieces_iterates_one_color() {
        let position = sample();
        let squares: Vec<Square> = position.pieces(Color::White).map(|(square, _)| square).collect();
        assert_eq!(squares, vec![Square::E1, Square::H1, Square::E4]);
    }

    #[test]
    fn test_reachable() {
        let position = sample();
        assert_eq!(position.reachable(Square::E4, None), Square::E5 | Square::D5);
        assert_eq!(position.reachable(Square::D5, Some(Square::E3)), Square::D4 | Square::E4);
        assert!(position.reachable(Square::H1, None).contains(Square::F1));
        assert!(!position.reachable(Square::H1, None).contains(Square::E1));
        assert_eq!(position.reachable(Square::C3, None), Bitboard::EMPTY);
    }

    #[test]
    fn test_en_passant_target_is_reachable() {
        let mut position = Position::new();
        position.put_piece(Piece::Pawn(Color::White), Square::E5);
        position.put_piece(Piece::Pawn(Color::Black), Square::D5);
        assert_eq!(position.reachable(Square::E5, Some(Square::D6)), Square::E6 | Square::D6);
        assert_eq!(position.reachable(Square::E5, None), Bitboard::from(Square::E6));
    }

    #[test]
    fn test_copy_is_independent() {
        let position = sample();
        let mut changed = position;
        changed.remove_piece(Square::B4);
        assert!(position.piece_at(Square::B4).is_some());
        assert_ne!(changed, position);
    }
}
