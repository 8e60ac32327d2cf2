/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};

use super::{PieceId, PieceKind, Square};

/// Maximum number of legal moves reachable from any chess position.
pub const MAX_NUM_MOVES: usize = 218;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// Represents the different kinds of moves that can be made during a chess game.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum MoveKind {
    /// Involves only a single piece moving from one location to another, and does not change the quantity or kind of any pieces on the board.
    #[default]
    Quiet,

    /// Involves a piece moving onto a square occupied by an opponent's piece, removing it from the board.
    Capture,

    /// A Pawn capturing an adjacent enemy Pawn that just advanced two squares, landing on the square it skipped.
    EnPassantCapture,

    /// The King moves two squares toward the h-file Rook, which jumps to the King's other side.
    ShortCastle,

    /// The King moves two squares toward the a-file Rook, which jumps to the King's other side.
    LongCastle,
}

/// A move that has been applied to a [`Board`](crate::Board).
///
/// This is everything needed to revert the move exactly: which piece moved, where it came
/// from and went to, what kind of move it was, and which piece (if any) it captured.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub(crate) from: Square,
    pub(crate) to: Square,
    pub(crate) kind: MoveKind,
    pub(crate) piece: PieceId,
    pub(crate) captured: Option<PieceId>,
    pub(crate) promotes: bool,
}

impl Move {
    #[inline(always)]
    pub const fn from(&self) -> Square {
        self.from
    }

    #[inline(always)]
    pub const fn to(&self) -> Square {
        self.to
    }

    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        self.kind
    }

    /// The piece that moved.
    #[inline(always)]
    pub const fn piece(&self) -> PieceId {
        self.piece
    }

    /// The piece removed from the board by this move, if any.
    #[inline(always)]
    pub const fn captured(&self) -> Option<PieceId> {
        self.captured
    }

    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        matches!(self.kind, MoveKind::EnPassantCapture)
    }

    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        matches!(self.kind, MoveKind::ShortCastle | MoveKind::LongCastle)
    }

    #[inline(always)]
    pub const fn is_short_castle(&self) -> bool {
        matches!(self.kind, MoveKind::ShortCastle)
    }

    /// Returns `true` if this move brought a Pawn to its farthest rank.
    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        self.promotes
    }

    /// Returns `true` if the moving piece advanced two rows in one move.
    #[inline(always)]
    pub const fn is_double_step(&self) -> bool {
        self.from.row().abs_diff(self.to.row()) == 2 && self.from.col() == self.to.col()
    }

    /// Renders this move as `<from><to>`, such as `e2e4`.
    pub fn to_uci(&self) -> String {
        format!("{}{}", self.from, self.to)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.to_uci(), self.kind)?;
        if let Some(captured) = self.captured {
            write!(f, " x{captured:?}")?;
        }
        Ok(())
    }
}

/// A move as a player would type it: a source square, a target square, and an optional
/// promotion choice, such as `e2e4` or `a7a8n`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MoveInput {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl MoveInput {
    /// Parses a [`MoveInput`] from long algebraic notation.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::{MoveInput, PieceKind};
    /// let input = MoveInput::from_uci("a7a8n").unwrap();
    /// assert_eq!(input.from.to_uci(), "a7");
    /// assert_eq!(input.to.to_uci(), "a8");
    /// assert_eq!(input.promotion, Some(PieceKind::Knight));
    ///
    /// assert!(MoveInput::from_uci("e2").is_err());
    /// ```
    pub fn from_uci(uci: &str) -> Result<Self> {
        let uci = uci.trim();
        if !uci.is_ascii() || !(4..=5).contains(&uci.len()) {
            bail!("Invalid move {uci:?}: expected <from><to>[promotion], such as \"e2e4\"");
        }

        let from = Square::from_uci(&uci[0..2])?;
        let to = Square::from_uci(&uci[2..4])?;
        let promotion = uci[4..].chars().next().map(PieceKind::from_char).transpose()?;

        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

impl FromStr for MoveInput {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl fmt::Display for MoveInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.char().to_ascii_lowercase())?;
        }
        Ok(())
    }
}
