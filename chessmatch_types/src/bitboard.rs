/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, Not},
};

use super::{Square, BOARD_SIZE};

/// A set of squares, stored as one bit per square in row-major order.
///
/// This is the boolean grid returned by move generation: a set bit marks a square
/// the piece could move to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitboard(u64);

impl Bitboard {
    /// A [`Bitboard`] with no squares set.
    pub const EMPTY_BOARD: Self = Self(0);

    /// Creates a [`Bitboard`] from its raw bits.
    #[inline(always)]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Creates a [`Bitboard`] containing only `square`.
    #[inline(always)]
    pub const fn from_square(square: Square) -> Self {
        Self(1 << square.index())
    }

    /// The raw bits of this [`Bitboard`].
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Sets `square` in this [`Bitboard`].
    #[inline(always)]
    pub fn set(&mut self, square: Square) {
        self.0 |= 1 << square.index();
    }

    /// Clears `square` from this [`Bitboard`].
    #[inline(always)]
    pub fn clear(&mut self, square: Square) {
        self.0 &= !(1 << square.index());
    }

    /// Returns `true` if `square` is set.
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::{Bitboard, Square};
    /// let e4 = Square::from_uci("e4").unwrap();
    /// let bb = Bitboard::from_square(e4);
    /// assert!(bb.contains(e4));
    /// assert!(!bb.contains(Square::from_uci("e5").unwrap()));
    /// ```
    #[inline(always)]
    pub const fn contains(&self, square: Square) -> bool {
        self.0 & (1 << square.index()) != 0
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Number of squares set.
    #[inline(always)]
    pub const fn population(&self) -> u32 {
        self.0.count_ones()
    }

    /// The lowest-indexed square that is set, if any.
    #[inline(always)]
    pub const fn lsb(&self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Square::from_index(self.0.trailing_zeros() as usize)
        }
    }

    /// Removes and returns the lowest-indexed square that is set, if any.
    #[inline(always)]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let square = self.lsb()?;
        self.0 &= self.0 - 1;
        Some(square)
    }

    /// Expands this [`Bitboard`] into a `[row][column]` grid of booleans.
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::{Bitboard, Square};
    /// let grid = Bitboard::from_square(Square::from_uci("b7").unwrap()).to_grid();
    /// assert!(grid[1][1]);
    /// assert_eq!(grid.iter().flatten().filter(|b| **b).count(), 1);
    /// ```
    pub fn to_grid(&self) -> [[bool; BOARD_SIZE]; BOARD_SIZE] {
        let mut grid = [[false; BOARD_SIZE]; BOARD_SIZE];
        for square in *self {
            grid[square.row() as usize][square.col() as usize] = true;
        }
        grid
    }
}

impl Iterator for Bitboard {
    type Item = Square;
    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.pop_lsb()
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.population() as usize;
        (size, Some(size))
    }
}

impl ExactSizeIterator for Bitboard {}

impl FromIterator<Square> for Bitboard {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        let mut bb = Self::EMPTY_BOARD;
        for square in iter {
            bb.set(square);
        }
        bb
    }
}

impl From<Square> for Bitboard {
    #[inline(always)]
    fn from(value: Square) -> Self {
        Self::from_square(value)
    }
}

impl BitOr for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<Square> for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Square) -> Self::Output {
        self | Self::from_square(rhs)
    }
}

impl BitOrAssign for Bitboard {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitOrAssign<Square> for Bitboard {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Square) {
        self.set(rhs);
    }
}

impl BitAnd for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Bitboard {
    #[inline(always)]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitXor for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl fmt::Display for Bitboard {
    /// Renders the grid with the eighth rank on top, `X` for set squares and `.` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.to_grid();
        for (i, row) in grid.iter().enumerate() {
            for (j, set) in row.iter().enumerate() {
                let c = if *set { 'X' } else { '.' };
                if j + 1 < BOARD_SIZE {
                    write!(f, "{c} ")?;
                } else {
                    write!(f, "{c}")?;
                }
            }
            if i + 1 < BOARD_SIZE {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitboard({:#018X})\n{self}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(uci: &str) -> Square {
        Square::from_uci(uci).unwrap()
    }

    #[test]
    fn test_iteration_yields_squares_in_row_major_order() {
        let bb: Bitboard = [sq("h1"), sq("a8"), sq("e4")].into_iter().collect();
        assert_eq!(bb.population(), 3);
        assert_eq!(bb.collect::<Vec<_>>(), vec![sq("a8"), sq("e4"), sq("h1")]);
    }

    #[test]
    fn test_set_and_clear() {
        let mut bb = Bitboard::default();
        assert!(bb.is_empty());
        bb.set(sq("c3"));
        assert!(bb.contains(sq("c3")));
        bb.clear(sq("c3"));
        assert!(bb.is_empty());
    }

    #[test]
    fn test_display_puts_eighth_rank_on_top() {
        let rendered = Bitboard::from_square(sq("a8")).to_string();
        let first_line = rendered.lines().next().unwrap();
        assert_eq!(first_line, "X . . . . . . .");
        assert_eq!(rendered.lines().count(), 8);
    }
}
