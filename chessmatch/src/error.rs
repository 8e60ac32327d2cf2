/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use thiserror::Error;

use super::{Color, PieceKind, Square};

/// Reasons a [`ChessMatch`](crate::ChessMatch) operation can be rejected.
///
/// A rejected operation never leaves a partial change behind.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("There is no piece on source position {0}")]
    NoPieceAtSource(Square),

    #[error("The piece on {square} belongs to {owner}, but it is {current}'s turn")]
    WrongOwner {
        square: Square,
        owner: Color,
        current: Color,
    },

    #[error("There are no possible moves for the piece on {0}")]
    NoLegalMoves(Square),

    #[error("The piece on {from} can't move to {to}")]
    IllegalTarget { from: Square, to: Square },

    #[error("You can't put yourself in check")]
    SelfCheckViolation,

    /// The board lost a king. Unreachable from a valid setup.
    #[error("There is no {0} king on the board")]
    KingNotFound(Color),

    #[error("Invalid square {0:?}")]
    InvalidSquare(String),

    #[error("The match is over: {0} won by checkmate")]
    MatchOver(Color),

    #[error("There is no piece awaiting promotion")]
    NoPendingPromotion,

    #[error("A pawn can't be promoted to a {0}")]
    InvalidPromotion(PieceKind),

    /// The position has more legal moves than any real game can reach.
    #[error("There are more than {0} legal moves in this position")]
    MoveListFull(usize),
}

impl MatchError {
    /// Returns `true` if the caller can simply ask for another move.
    ///
    /// Only [`MatchError::KingNotFound`] is not recoverable.
    #[inline(always)]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::KingNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_squares() {
        let from = Square::from_uci("b1").unwrap();
        let to = Square::from_uci("b3").unwrap();
        let err = MatchError::IllegalTarget { from, to };
        assert_eq!(err.to_string(), "The piece on b1 can't move to b3");
        assert!(err.is_recoverable());
        assert!(!MatchError::KingNotFound(Color::White).is_recoverable());
    }
}
