use std::fmt::Display;

use once_cell::sync::Lazy;

use crate::coordinates::{File, Rank, Square};

/// A set of squares packed in a 64-bit integer, bit `n` standing for the square with index `n`.
///
/// Bitboards are how the board answers "which squares" questions: occupancy by color, the squares a
/// piece reaches, the squares a side controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitboard(u64);

/// Squares strictly between two squares sharing a line, indexed by `from * 64 + to`.
static BETWEEN: Lazy<Vec<Bitboard>> = Lazy::new(|| {
    const DIRECTIONS: [(i8, i8); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

    let mut between = vec![Bitboard::EMPTY; Square::COUNT * Square::COUNT];
    for from in Square::ALL {
        for (file_step, rank_step) in DIRECTIONS {
            let mut inner = Bitboard::EMPTY;
            let mut next = from.right(file_step).and_then(|square| square.up(rank_step));
            while let Ok(to) = next {
                between[usize::from(from) * Square::COUNT + usize::from(to)] = inner;
                between[usize::from(to) * Square::COUNT + usize::from(from)] = inner;
                inner |= to;
                next = to.right(file_step).and_then(|square| square.up(rank_step));
            }
        }
    }
    between
});

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);

    pub const ALL: Bitboard = Bitboard(u64::MAX);

    /// Returns whether `square` is part of the set.
    pub fn contains(self, square: Square) -> bool {
        self.0 & (1u64 << u8::from(square)) != 0
    }

    /// Returns whether the set shares at least one square with `other`.
    pub fn intersects(self, other: Bitboard) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of squares in the set.
    pub fn popcnt(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns the square with the lowest index, if any.
    pub fn lsb(self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }

        Some((self.0.trailing_zeros() as u8).into())
    }

    /// Returns the squares of the set in ascending index order (a1, b1, ..., h8).
    pub fn squares(self) -> Vec<Square> {
        self.into_iter().collect()
    }

    /// Returns the squares strictly between `from` and `to`.
    ///
    /// # Returns
    ///
    /// The empty set when the squares are adjacent, identical, or do not share a rank, a file or a
    /// diagonal.
    pub fn between(from: Square, to: Square) -> Bitboard {
        BETWEEN[usize::from(from) * Square::COUNT + usize::from(to)]
    }
}

impl From<Square> for Bitboard {
    fn from(square: Square) -> Self {
        Bitboard(1u64 << u8::from(square))
    }
}

impl From<File> for Bitboard {
    fn from(file: File) -> Self {
        Bitboard(0x0101010101010101 << u8::from(file))
    }
}

impl From<Rank> for Bitboard {
    fn from(rank: Rank) -> Self {
        Bitboard(0xff << (8 * u8::from(rank)))
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        iter.into_iter().fold(Bitboard::EMPTY, |bb, square| bb | square)
    }
}

impl std::ops::BitAnd for Bitboard {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 & rhs.0)
    }
}

impl std::ops::BitOr for Bitboard {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 | rhs.0)
    }
}

impl std::ops::BitOr<Square> for Bitboard {
    type Output = Self;
    fn bitor(self, rhs: Square) -> Self::Output {
        self | Bitboard::from(rhs)
    }
}

impl std::ops::BitOr<Square> for Square {
    type Output = Bitboard;
    fn bitor(self, rhs: Square) -> Self::Output {
        Bitboard::from(self) | Bitboard::from(rhs)
    }
}

impl std::ops::BitXor<Square> for Bitboard {
    type Output = Self;
    fn bitxor(self, rhs: Square) -> Self::Output {
        Bitboard(self.0 ^ Bitboard::from(rhs).0)
    }
}

impl std::ops::Not for Bitboard {
    type Output = Self;
    fn not(self) -> Self::Output {
        Bitboard(!self.0)
    }
}

impl std::ops::BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl std::ops::BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitOrAssign<Square> for Bitboard {
    fn bitor_assign(&mut self, rhs: Square) {
        *self |= Bitboard::from(rhs);
    }
}

impl std::ops::BitXorAssign<Square> for Bitboard {
    fn bitxor_assign(&mut self, rhs: Square) {
        self.0 ^= Bitboard::from(rhs).0;
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIterator;

    fn into_iter(self) -> Self::IntoIter {
        BitboardIterator(self.0)
    }
}

/// Iterates the squares of a bitboard from the lowest index to the highest.
pub struct BitboardIterator(u64);

impl Iterator for BitboardIterator {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            return None;
        }

        let square: Square = (self.0.trailing_zeros() as u8).into();
        self.0 &= self.0 - 1;
        Some(square)
    }
}

impl Display for Bitboard {
    /// Formats the set as an 8x8 grid, rank 8 first, `X` marking members.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in Rank::ALL.iter().rev() {
            for file in File::ALL {
                let mark = if self.contains(Square::new(file, *rank)) { 'X' } else { '.' };
                write!(f, "{mark}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
