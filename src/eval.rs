use crate::{
    attacks::attacks_from_pawn,
    bitboard::Bitboard,
    piece::{Color, PieceType},
    position::{OccupancyFilter, Position},
};

//======================================================================================================================
// Square control
//======================================================================================================================

/// Square-control views of a position.
///
/// The views are computed from the placement alone and ignore pins: a pinned piece still presses
/// on the squares it attacks.
///
/// * `free` - squares without a piece.
/// * `used` - squares holding a piece of a given color.
/// * `pressure` - squares a color attacks that are not held by its own pieces, that is the
///   squares it could capture on. Pawns count their diagonals only.
/// * `defense` - squares of its own pieces a color attacks.
/// * `space` - free squares a color could move a piece into: the free diagonals of its pawns, the
///   free reachable squares of its other pieces, and the free squares around its king that the
///   opponent does not press on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SquareControl {
    free: Bitboard,
    used: [Bitboard; Color::COUNT],
    pressure: [Bitboard; Color::COUNT],
    defense: [Bitboard; Color::COUNT],
    space: [Bitboard; Color::COUNT],
}

impl SquareControl {
    /// Computes every view from scratch.
    pub fn evaluate(position: &Position) -> Self {
        let free = !position.occupied(OccupancyFilter::All);
        let used = Color::ALL.map(|color| position.occupied(color));

        let attacked = Color::ALL.map(|color| position.attacked_by(color));
        let pressure = Color::ALL.map(|color| attacked[usize::from(color)] & !used[usize::from(color)]);
        let defense = Color::ALL.map(|color| attacked[usize::from(color)] & used[usize::from(color)]);

        let space = Color::ALL.map(|color| {
            let opponent_pressure = pressure[usize::from(color.opposite())];
            let reach = position.occupied(color).into_iter().fold(Bitboard::EMPTY, |reach, square| {
                let squares = match position.piece_at(square).map(|piece| piece.piece_type()) {
                    Some(PieceType::Pawn) => attacks_from_pawn(color, square),
                    Some(PieceType::King) => position.attacks_from(square) & !opponent_pressure,
                    Some(_) => position.attacks_from(square),
                    None => Bitboard::EMPTY,
                };
                reach | squares
            });
            reach & free
        });

        SquareControl { free, used, pressure, defense, space }
    }

    /// Returns the squares holding no piece.
    pub fn free(&self) -> Bitboard {
        self.free
    }

    pub fn used(&self, color: Color) -> Bitboard {
        self.used[usize::from(color)]
    }

    pub fn pressure(&self, color: Color) -> Bitboard {
        self.pressure[usize::from(color)]
    }

    pub fn defense(&self, color: Color) -> Bitboard {
        self.defense[usize::from(color)]
    }

    pub fn space(&self, color: Color) -> Bitboard {
        self.space[usize::from(color)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        coordinates::{Rank, Square},
        piece::Piece,
    };

    fn start_position() -> Position {
        let mut position = Position::new();
        let back_rank = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        for color in Color::ALL {
            let home = Rank::R1.relative_to_color(color);
            let pawns = Rank::R2.relative_to_color(color);
            for (file, piece_type) in crate::coordinates::File::ALL.into_iter().zip(back_rank) {
                position.put_piece(Piece::new(color, piece_type), Square::new(file, home));
                position.put_piece(Piece::Pawn(color), Square::new(file, pawns));
            }
        }
        position
    }

    #[test]
    fn test_start_position_space() {
        let control = SquareControl::evaluate(&start_position());
        assert_eq!(control.space(Color::White), Bitboard::from(Rank::R3));
        assert_eq!(control.space(Color::Black), Bitboard::from(Rank::R6));
    }

    #[test]
    fn test_start_position_occupancy() {
        let control = SquareControl::evaluate(&start_position());
        assert_eq!(control.free().popcnt(), 32);
        assert_eq!(control.used(Color::White), Bitboard::from(Rank::R1) | Bitboard::from(Rank::R2));
        assert_eq!(control.pressure(Color::White), Bitboard::from(Rank::R3));
        assert!(control.defense(Color::White).contains(Square::E2));
        assert!(!control.defense(Color::White).contains(Square::A1));
    }

    #[test]
    fn test_pressure_includes_enemy_pieces() {
        let mut position = Position::new();
        position.put_piece(Piece::Queen(Color::White), Square::D1);
        position.put_piece(Piece::Knight(Color::White), Square::D2);
        position.put_piece(Piece::Pawn(Color::Black), Square::A4);
        position.put_piece(Piece::King(Color::Black), Square::H5);

        let control = SquareControl::evaluate(&position);
        assert!(control.pressure(Color::White).contains(Square::A4));
        assert!(control.pressure(Color::White).contains(Square::H5));
        assert!(!control.pressure(Color::White).contains(Square::D2));
        assert!(control.defense(Color::White).contains(Square::D2));
        assert!(!control.space(Color::White).contains(Square::A4));
        assert!(control.space(Color::White).contains(Square::B3));
    }

    #[test]
    fn test_king_space_excludes_opponent_pressure() {
        let mut position = Position::new();
        position.put_piece(Piece::King(Color::White), Square::E1);
        position.put_piece(Piece::rook(Color::Black, crate::piece::RookType::Promoted), Square::A2);

        let control = SquareControl::evaluate(&position);
        assert!(!control.space(Color::White).contains(Square::E2));
        assert!(control.space(Color::White).contains(Square::D1));
        assert!(control.pressure(Color::Black).contains(Square::E2));
    }

    #[test]
    fn test_pawn_space_is_diagonal_only() {
        let mut position = Position::new();
        position.put_piece(Piece::Pawn(Color::White), Square::E4);

        let control = SquareControl::evaluate(&position);
        assert_eq!(control.space(Color::White), Square::D5 | Square::F5);
        assert!(!control.space(Color::White).contains(Square::E5));
    }
}
