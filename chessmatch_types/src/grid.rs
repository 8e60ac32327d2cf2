/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ops::Index;

use super::{Square, BOARD_SIZE};

/// A fixed-size 8x8 mailbox of optional occupants.
///
/// The grid knows nothing about chess. Its only mutations are [`Grid::take`], which empties a
/// square, and [`Grid::place`], which fills an empty one.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Grid<T> {
    cells: [Option<T>; Square::COUNT],
}

impl<T> Grid<T> {
    /// Creates a new, empty [`Grid`].
    pub fn new() -> Self {
        Self {
            cells: std::array::from_fn(|_| None),
        }
    }

    /// Returns `true` if there is an occupant at the given [`Square`].
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::{Grid, Square};
    /// let mut grid = Grid::new();
    /// let c4 = Square::from_uci("c4").unwrap();
    /// grid.place('N', c4);
    /// assert!(grid.has(c4));
    /// ```
    #[inline(always)]
    pub fn has(&self, square: Square) -> bool {
        self.cells[square.index()].is_some()
    }

    /// Fetches the occupant at the given [`Square`], if there is one.
    #[inline(always)]
    pub fn get(&self, square: Square) -> Option<&T> {
        self.cells[square.index()].as_ref()
    }

    /// Places `value` on `square`.
    ///
    /// The square must be empty; use [`Grid::take`] first. Placing onto an occupied square
    /// hands the previous occupant back rather than silently dropping it.
    #[inline(always)]
    pub fn place(&mut self, value: T, square: Square) -> Option<T> {
        let previous = self.cells[square.index()].replace(value);
        debug_assert!(previous.is_none(), "{square} was already occupied");
        previous
    }

    /// Takes the occupant from a given [`Square`], if there is one present.
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::{Grid, Square};
    /// let mut grid = Grid::new();
    /// let c4 = Square::from_uci("c4").unwrap();
    /// grid.place(7, c4);
    /// assert_eq!(grid.take(c4), Some(7));
    /// assert_eq!(grid.take(c4), None);
    /// ```
    #[inline(always)]
    pub fn take(&mut self, square: Square) -> Option<T> {
        self.cells[square.index()].take()
    }

    /// Iterates over every occupied square and its occupant, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Square, &T)> {
        Square::iter().filter_map(|square| self.get(square).map(|value| (square, value)))
    }

    /// Number of occupied squares.
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Maps every occupant through `f`, producing a `[row][column]` array.
    pub fn to_rows<U>(&self, mut f: impl FnMut(&T) -> U) -> [[Option<U>; BOARD_SIZE]; BOARD_SIZE] {
        std::array::from_fn(|row| {
            std::array::from_fn(|col| {
                let square = Square::new_unchecked(row as u8, col as u8);
                self.get(square).map(&mut f)
            })
        })
    }
}

impl<T> Default for Grid<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Square> for Grid<T> {
    type Output = Option<T>;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self.cells[index.index()]
    }
}
