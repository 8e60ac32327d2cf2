/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Result};

use super::BOARD_SIZE;

/// A single square on the board, addressed by zero-based row and column.
///
/// Row `0` is the eighth rank (Black's back rank) and row `7` is the first rank.
/// Column `0` is the a-file and column `7` is the h-file.
///
/// In algebraic notation, `column = file - 'a'` and `row = 8 - rank`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Number of squares on the board.
    pub const COUNT: usize = BOARD_SIZE * BOARD_SIZE;

    /// Creates a new [`Square`] from a row and column, if both are on the board.
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::Square;
    /// assert!(Square::new(7, 4).is_some());
    /// assert!(Square::new(8, 0).is_none());
    /// ```
    #[inline(always)]
    pub const fn new(row: u8, col: u8) -> Option<Self> {
        if (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Creates a new [`Square`] without bounds checks.
    ///
    /// Callers must guarantee `row` and `col` are both less than [`BOARD_SIZE`].
    #[inline(always)]
    pub const fn new_unchecked(row: u8, col: u8) -> Self {
        debug_assert!((row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE);
        Self { row, col }
    }

    /// Creates a [`Square`] from a row-major index in `0..64`.
    #[inline(always)]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self::new_unchecked(
                (index / BOARD_SIZE) as u8,
                (index % BOARD_SIZE) as u8,
            ))
        } else {
            None
        }
    }

    /// Row-major index of this square, in `0..64`.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    #[inline(always)]
    pub const fn row(&self) -> u8 {
        self.row
    }

    #[inline(always)]
    pub const fn col(&self) -> u8 {
        self.col
    }

    /// Returns the square `d_row` rows and `d_col` columns away, if it is on the board.
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::Square;
    /// let e4 = Square::from_uci("e4").unwrap();
    /// assert_eq!(e4.offset(-1, 1), Some(Square::from_uci("f5").unwrap()));
    /// assert_eq!(Square::from_uci("a1").unwrap().offset(0, -1), None);
    /// ```
    #[inline(always)]
    pub const fn offset(&self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;

        if row < 0 || col < 0 {
            return None;
        }

        Self::new(row as u8, col as u8)
    }

    /// Parses a square from a file letter and a rank digit.
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::Square;
    /// let sq = Square::from_chars('e', '2').unwrap();
    /// assert_eq!((sq.row(), sq.col()), (6, 4));
    /// assert!(Square::from_chars('i', '2').is_err());
    /// ```
    pub fn from_chars(file: char, rank: char) -> Result<Self> {
        let file = file.to_ascii_lowercase();
        if !('a'..='h').contains(&file) {
            bail!("Invalid file {file:?}: must be a letter between 'a' and 'h'");
        }
        if !('1'..='8').contains(&rank) {
            bail!("Invalid rank {rank:?}: must be a digit between '1' and '8'");
        }

        let col = file as u8 - b'a';
        let row = BOARD_SIZE as u8 - (rank as u8 - b'0');

        Ok(Self::new_unchecked(row, col))
    }

    /// Parses a square from algebraic notation, such as `"e4"`.
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::Square;
    /// let a8 = Square::from_uci("a8").unwrap();
    /// assert_eq!((a8.row(), a8.col()), (0, 0));
    /// let h1 = Square::from_uci("h1").unwrap();
    /// assert_eq!((h1.row(), h1.col()), (7, 7));
    /// assert!(Square::from_uci("e9").is_err());
    /// assert!(Square::from_uci("e44").is_err());
    /// ```
    pub fn from_uci(uci: &str) -> Result<Self> {
        let mut chars = uci.trim().chars();
        let file = chars
            .next()
            .ok_or(anyhow!("Invalid square: empty notation"))?;
        let rank = chars
            .next()
            .ok_or(anyhow!("Invalid square {uci:?}: missing rank"))?;

        if chars.next().is_some() {
            bail!("Invalid square {uci:?}: expected a file letter and a rank digit");
        }

        Self::from_chars(file, rank)
    }

    /// The file letter of this square, `'a'..='h'`.
    #[inline(always)]
    pub const fn file_char(&self) -> char {
        (b'a' + self.col) as char
    }

    /// The rank digit of this square, `'1'..='8'`.
    #[inline(always)]
    pub const fn rank_char(&self) -> char {
        (b'0' + (BOARD_SIZE as u8 - self.row)) as char
    }

    /// Renders this square in algebraic notation.
    pub fn to_uci(&self) -> String {
        format!("{}{}", self.file_char(), self.rank_char())
    }

    /// Iterates over every square on the board, in row-major order.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT).map(|i| Self::new_unchecked((i / BOARD_SIZE) as u8, (i % BOARD_SIZE) as u8))
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notation_maps_to_row_and_column() {
        for (uci, row, col) in [("a1", 7, 0), ("e2", 6, 4), ("d8", 0, 3), ("h5", 3, 7)] {
            let square = Square::from_uci(uci).unwrap();
            assert_eq!(square.row(), row, "{uci}");
            assert_eq!(square.col(), col, "{uci}");
            assert_eq!(square.to_uci(), uci);
        }
    }

    #[test]
    fn test_uppercase_file_is_accepted() {
        assert_eq!(Square::from_uci("E4").unwrap(), Square::from_uci("e4").unwrap());
    }

    #[test]
    fn test_invalid_notation_is_rejected() {
        for bad in ["", "e", "z1", "a0", "a9", "4e", "e4 e5"] {
            assert!(Square::from_uci(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_index_round_trips_through_every_square() {
        for (i, square) in Square::iter().enumerate() {
            assert_eq!(square.index(), i);
            assert_eq!(Square::from_index(i), Some(square));
        }
        assert_eq!(Square::from_index(Square::COUNT), None);
    }

    #[test]
    fn test_offset_stays_on_board() {
        let corner = Square::from_uci("h8").unwrap();
        assert_eq!(corner.offset(-1, 0), None);
        assert_eq!(corner.offset(0, 1), None);
        assert_eq!(corner.offset(1, -1), Some(Square::from_uci("g7").unwrap()));
    }
}
