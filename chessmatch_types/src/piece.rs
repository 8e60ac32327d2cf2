/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};

use super::{Square, BOARD_SIZE};

/// Represents the color of a player, piece, square, etc. within a chess board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// An array of both colors, starting with White.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Creates a new [`Color`] from a boolean, where `false` is White.
    #[inline(always)]
    pub const fn from_bool(is_black: bool) -> Self {
        if is_black {
            Self::Black
        } else {
            Self::White
        }
    }

    /// Returns this [`Color`]'s opposite / inverse / enemy.
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::Color;
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// assert_eq!(Color::Black.opponent(), Color::White);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        matches!(self, Self::White)
    }

    #[inline(always)]
    pub const fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }

    /// Index of this color, for array lookups.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// The row delta of a single pawn step for this color.
    ///
    /// White pawns move toward row 0 (the eighth rank), Black pawns toward row 7.
    #[inline(always)]
    pub const fn pawn_direction(&self) -> i8 {
        match self {
            Self::White => -1,
            Self::Black => 1,
        }
    }

    /// The row this color's pieces start on.
    #[inline(always)]
    pub const fn home_row(&self) -> u8 {
        match self {
            Self::White => BOARD_SIZE as u8 - 1,
            Self::Black => 0,
        }
    }

    /// The row this color's pawns start on.
    #[inline(always)]
    pub const fn pawn_row(&self) -> u8 {
        match self {
            Self::White => BOARD_SIZE as u8 - 2,
            Self::Black => 1,
        }
    }

    /// The farthest row for this color's pawns, where they promote.
    #[inline(always)]
    pub const fn promotion_row(&self) -> u8 {
        self.opponent().home_row()
    }

    /// Returns the FEN character for this color, `'w'` or `'b'`.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    /// Parses a [`Color`] from `'w'` or `'b'`, ignoring case.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'w' | 'W' => Ok(Self::White),
            'b' | 'B' => Ok(Self::Black),
            _ => bail!("Invalid char for Color: {c:?}. Expected 'w' or 'b'"),
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "w" | "W" | "white" | "White" => Ok(Self::White),
            "b" | "B" | "black" | "Black" => Ok(Self::Black),
            _ => bail!("Invalid str for Color: {s:?}"),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Represents the kind (or "role") that a chess piece can be.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Number of piece variants.
    pub const COUNT: usize = 6;

    /// The kinds a pawn may be promoted to.
    pub const PROMOTIONS: [Self; 4] = [Self::Knight, Self::Bishop, Self::Rook, Self::Queen];

    /// An array of all six piece kinds, starting with Pawn.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Pawn,
            Self::Knight,
            Self::Bishop,
            Self::Rook,
            Self::Queen,
            Self::King,
        ]
    }

    /// Index of this piece kind, for array lookups.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Returns `true` if a pawn may be promoted to this kind.
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::PieceKind;
    /// assert!(PieceKind::Knight.is_promotion_choice());
    /// assert!(!PieceKind::King.is_promotion_choice());
    /// assert!(!PieceKind::Pawn.is_promotion_choice());
    /// ```
    #[inline(always)]
    pub const fn is_promotion_choice(&self) -> bool {
        matches!(self, Self::Knight | Self::Bishop | Self::Rook | Self::Queen)
    }

    /// Uppercase character for this kind, as used in FEN.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    /// Parses a [`PieceKind`] from its character, ignoring case.
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            'P' => Ok(Self::Pawn),
            'N' => Ok(Self::Knight),
            'B' => Ok(Self::Bishop),
            'R' => Ok(Self::Rook),
            'Q' => Ok(Self::Queen),
            'K' => Ok(Self::King),
            _ => bail!("Invalid char for PieceKind: {c:?}"),
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pawn => "Pawn",
            Self::Knight => "Knight",
            Self::Bishop => "Bishop",
            Self::Rook => "Rook",
            Self::Queen => "Queen",
            Self::King => "King",
        }
    }
}

impl FromStr for PieceKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Self::from_char(c);
        }

        PieceKind::all()
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or(anyhow::anyhow!("Invalid str for PieceKind: {s:?}"))
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A chess piece on (or captured from) the board.
///
/// Alongside its [`Color`] and [`PieceKind`], a piece remembers the [`Square`] it was last
/// placed on and how many committed moves it has made. The move count drives castling
/// eligibility and is decremented when a move is undone.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
    square: Square,
    move_count: u32,
}

impl Piece {
    /// Creates a new, unmoved [`Piece`] at `square`.
    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind, square: Square) -> Self {
        Self {
            color,
            kind,
            square,
            move_count: 0,
        }
    }

    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// The square this piece was last placed on.
    #[inline(always)]
    pub const fn square(&self) -> Square {
        self.square
    }

    #[inline(always)]
    pub const fn move_count(&self) -> u32 {
        self.move_count
    }

    #[inline(always)]
    pub const fn has_moved(&self) -> bool {
        self.move_count > 0
    }

    #[inline(always)]
    pub const fn is_pawn(&self) -> bool {
        matches!(self.kind, PieceKind::Pawn)
    }

    #[inline(always)]
    pub const fn is_rook(&self) -> bool {
        matches!(self.kind, PieceKind::Rook)
    }

    #[inline(always)]
    pub const fn is_king(&self) -> bool {
        matches!(self.kind, PieceKind::King)
    }

    /// Returns `true` if `other` belongs to the opposing side.
    #[inline(always)]
    pub fn is_opponent_of(&self, other: &Self) -> bool {
        self.color != other.color
    }

    /// Records that this piece now sits on `square`.
    #[inline(always)]
    pub fn set_square(&mut self, square: Square) {
        self.square = square;
    }

    #[inline(always)]
    pub fn increase_move_count(&mut self) {
        self.move_count += 1;
    }

    /// Undoes one [`Piece::increase_move_count`]. The count never drops below zero.
    #[inline(always)]
    pub fn decrease_move_count(&mut self) {
        debug_assert!(self.move_count > 0, "{self:?} has no move to undo");
        self.move_count = self.move_count.saturating_sub(1);
    }

    /// Returns a fresh, unmoved piece of the same color on the same square, with a new kind.
    ///
    /// # Example
    /// ```
    /// # use chessmatch_types::*;
    /// let a8 = Square::from_uci("a8").unwrap();
    /// let mut pawn = Piece::new(Color::White, PieceKind::Pawn, a8);
    /// pawn.increase_move_count();
    /// let queen = pawn.promoted(PieceKind::Queen);
    /// assert_eq!(queen.kind(), PieceKind::Queen);
    /// assert_eq!(queen.square(), a8);
    /// assert_eq!(queen.move_count(), 0);
    /// ```
    #[inline(always)]
    pub const fn promoted(&self, kind: PieceKind) -> Self {
        Self::new(self.color, kind, self.square)
    }

    /// FEN character of this piece: uppercase for White, lowercase for Black.
    #[inline(always)]
    pub const fn char(&self) -> char {
        let c = self.kind.char();
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    /// Creates an unmoved piece from its FEN character, placed on `square`.
    pub fn from_uci(c: char, square: Square) -> Result<Self> {
        let kind = PieceKind::from_char(c)?;
        let color = Color::from_bool(c.is_ascii_lowercase());
        Ok(Self::new(color, kind, square))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} on {} ({} moves)",
            self.color, self.kind, self.square, self.move_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_chars_follow_fen_case() {
        let sq = Square::default();
        let white_knight = Piece::from_uci('N', sq).unwrap();
        assert_eq!(white_knight.color(), Color::White);
        assert_eq!(white_knight.kind(), PieceKind::Knight);

        let black_queen = Piece::from_uci('q', sq).unwrap();
        assert_eq!(black_queen.color(), Color::Black);
        assert_eq!(black_queen.char(), 'q');

        assert!(Piece::from_uci('x', sq).is_err());
    }

    #[test]
    fn test_move_count_never_goes_negative() {
        let mut rook = Piece::new(Color::Black, PieceKind::Rook, Square::default());
        rook.increase_move_count();
        rook.increase_move_count();
        assert_eq!(rook.move_count(), 2);
        rook.decrease_move_count();
        rook.decrease_move_count();
        assert_eq!(rook.move_count(), 0);
        assert!(!rook.has_moved());
    }

    #[test]
    fn test_piece_kind_parses_letters_and_names() {
        assert_eq!("q".parse::<PieceKind>().unwrap(), PieceKind::Queen);
        assert_eq!("Knight".parse::<PieceKind>().unwrap(), PieceKind::Knight);
        assert_eq!("rook".parse::<PieceKind>().unwrap(), PieceKind::Rook);
        assert!("dragon".parse::<PieceKind>().is_err());
    }

    #[test]
    fn test_promotion_rows_are_opposite_home_rows() {
        assert_eq!(Color::White.promotion_row(), 0);
        assert_eq!(Color::Black.promotion_row(), 7);
        assert_eq!(Color::White.pawn_row(), 6);
        assert_eq!(Color::Black.pawn_row(), 1);
    }
}
