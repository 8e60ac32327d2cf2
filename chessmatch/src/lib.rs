/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![doc = include_str!("../README.md")]

pub use chessmatch_types::*;

/// Piece placements, the piece arena, and reversible application of moves.
mod board;
/// Reasons a move or query can be rejected.
mod error;
/// The match controller: turns, check, checkmate, en passant, and promotion.
mod game;
/// Candidate move generation for every kind of piece, plus check and checkmate detection.
mod movegen;
/// Enums and structs for modeling the movement of a piece on a chessboard.
mod moves;
/// Utility function for performance testing.
mod perft;

pub use board::*;
pub use error::*;
pub use game::*;
pub use movegen::*;
pub use moves::*;
pub use perft::*;

/// Re-exports all the things you'll need.
pub mod prelude {
    pub use crate::board::*;
    pub use crate::error::*;
    pub use crate::game::*;
    pub use crate::movegen::*;
    pub use crate::moves::*;
    pub use crate::perft::*;
    pub use chessmatch_types::*;
}
