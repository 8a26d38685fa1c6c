use once_cell::sync::Lazy;

use crate::{
    bitboard::Bitboard,
    coordinates::{CoordinatesResult, Rank, Square},
    piece::{Color, PieceType},
};

type Step = fn(Square) -> CoordinatesResult<Square>;

fn north(sq: Square) -> CoordinatesResult<Square> {
    sq.up(1)
}

fn south(sq: Square) -> CoordinatesResult<Square> {
    sq.down(1)
}

fn west(sq: Square) -> CoordinatesResult<Square> {
    sq.left(1)
}

fn east(sq: Square) -> CoordinatesResult<Square> {
    sq.right(1)
}

fn north_east(sq: Square) -> CoordinatesResult<Square> {
    sq.up(1)?.right(1)
}

fn north_west(sq: Square) -> CoordinatesResult<Square> {
    sq.up(1)?.left(1)
}

fn south_east(sq: Square) -> CoordinatesResult<Square> {
    sq.down(1)?.right(1)
}

fn south_west(sq: Square) -> CoordinatesResult<Square> {
    sq.down(1)?.left(1)
}

const ORTHOGONAL: [Step; 4] = [north, south, west, east];

const DIAGONAL: [Step; 4] = [north_east, north_west, south_east, south_west];

/// Offsets (files, ranks) of the eight knight jumps.
const KNIGHT_JUMPS: [(i8, i8); 8] = [(-1, 2), (1, 2), (-1, -2), (1, -2), (-2, 1), (-2, -1), (2, 1), (2, -1)];

/// Lookup table for all squares attacked by a king on a given square.
static KING_ATTACKS: Lazy<[Bitboard; Square::COUNT]> = Lazy::new(|| {
    let mut attacks = [Bitboard::EMPTY; Square::COUNT];
    for square in Square::ALL {
        attacks[usize::from(square)] =
            ORTHOGONAL.iter().chain(DIAGONAL.iter()).filter_map(|step| step(square).ok()).collect();
    }
    attacks
});

/// Lookup table for all squares attacked by a knight on a given square.
static KNIGHT_ATTACKS: Lazy<[Bitboard; Square::COUNT]> = Lazy::new(|| {
    let mut attacks = [Bitboard::EMPTY; Square::COUNT];
    for square in Square::ALL {
        attacks[usize::from(square)] = KNIGHT_JUMPS
            .iter()
            .filter_map(|(files, ranks)| square.right(*files).and_then(|sq| sq.up(*ranks)).ok())
            .collect();
    }
    attacks
});

/// Walks every ray until it leaves the board or hits an occupied square, which is included.
fn slide(occupied: Bitboard, from_sq: Square, directions: &[Step]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;

    for direction in directions {
        let mut to = from_sq;
        while let Ok(sq) = direction(to) {
            to = sq;
            attacks |= to;
            if occupied.contains(to) {
                break;
            }
        }
    }

    attacks
}

/// Calculates the squares a pawn of the given color attacks from the specified square.
///
/// These are the two forward diagonals, whether or not anything stands on them.
pub fn attacks_from_pawn(color: Color, sq: Square) -> Bitboard {
    [sq.forward(color).and_then(|to| to.left(1)), sq.forward(color).and_then(|to| to.right(1))]
        .into_iter()
        .filter_map(Result::ok)
        .collect()
}

/// Returns a bitboard with all squares attacked by a piece from a given square.
///
/// # Parameters
/// * `piece_type` - The kind of the attacking piece
/// * `color` - The color of the attacking piece, only used for pawns
/// * `occupied` - All occupied squares on the board; they block the rays of sliding pieces
/// * `sq` - The square from which to calculate attacks
///
/// # Returns
/// The attacked squares, including occupied squares at the end of each ray. Pass
/// `Bitboard::EMPTY` as `occupied` to get the geometry of the piece on an empty board.
pub fn attacks_from(piece_type: PieceType, color: Color, occupied: Bitboard, sq: Square) -> Bitboard {
    match piece_type {
        PieceType::King => KING_ATTACKS[usize::from(sq)],
        PieceType::Knight => KNIGHT_ATTACKS[usize::from(sq)],
        PieceType::Rook => slide(occupied, sq, &ORTHOGONAL),
        PieceType::Bishop => slide(occupied, sq, &DIAGONAL),
        PieceType::Queen => slide(occupied, sq, &ORTHOGONAL) | slide(occupied, sq, &DIAGONAL),
        PieceType::Pawn => attacks_from_pawn(color, sq),
    }
}

/// Returns the squares a pawn may advance to without capturing.
///
/// A pawn moves one square forward when it is empty and two squares from its starting rank when
/// both are empty.
pub fn pawn_pushes(color: Color, occupied: Bitboard, sq: Square) -> Bitboard {
    let mut pushes = Bitboard::EMPTY;

    if let Ok(one) = sq.forward(color) {
        if !occupied.contains(one) {
            pushes |= one;
            if sq.rank().relative_to_color(color) == Rank::R2 {
                if let Ok(two) = one.forward(color) {
                    if !occupied.contains(two) {
                        pushes |= two;
                    }
                }
            }
        }
    }

    pushes
}
