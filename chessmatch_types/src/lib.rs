/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![doc = include_str!("../README.md")]

/// A boolean 8x8 grid of squares, used for candidate move destinations.
mod bitboard;
/// Fixed-size storage of optional occupants, addressed by [`Square`].
mod grid;
/// Enums for piece kinds, colors, and a struct for a chess piece.
mod piece;
/// Squares on a chessboard, and conversion to and from algebraic notation.
mod square;
/// Misc constants shared by the engine.
mod utils;

pub use bitboard::*;
pub use grid::*;
pub use piece::*;
pub use square::*;
pub use utils::*;

/// Re-exports all the things you'll need.
pub mod prelude {
    pub use crate::bitboard::*;
    pub use crate::grid::*;
    pub use crate::piece::*;
    pub use crate::square::*;
    pub use crate::utils::*;
}
