/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{collections::BTreeSet, fmt};

use anyhow::{bail, Result};

use super::{
    Color, Grid, MatchError, Move, MoveKind, Piece, PieceKind, Square, BOARD_SIZE, FEN_STARTPOS,
};

/// A handle to a [`Piece`] owned by a [`Board`].
///
/// Handles stay valid for the lifetime of the board, including after the piece is captured.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct PieceId(u8);

impl PieceId {
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Represents all pieces and their locations on a chess board.
///
/// Has no knowledge of turns, check, or en passant. If you need those, see
/// [`ChessMatch`](crate::ChessMatch).
///
/// Every piece ever placed lives in an arena and is referred to by its [`PieceId`]. The
/// [`Grid`] maps squares to handles, and each piece is either on the board or captured.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    /// Square -> piece handle.
    grid: Grid<PieceId>,

    /// Every piece created for this board, indexed by [`PieceId`].
    pieces: Vec<Piece>,

    /// Handles of all pieces currently occupying a square.
    on_board: BTreeSet<PieceId>,

    /// Handles of captured pieces, in the order they were captured.
    captured: Vec<PieceId>,
}

impl Board {
    /// Creates a new, empty [`Board`] containing no pieces.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::Board;
    /// let board = Board::new();
    /// assert_eq!(board.to_fen(), "8/8/8/8/8/8/8/8");
    /// ```
    pub fn new() -> Self {
        Self {
            grid: Grid::new(),
            pieces: Vec::with_capacity(32),
            on_board: BTreeSet::new(),
            captured: Vec::new(),
        }
    }

    /// Constructs a [`Board`] from the placement field of a FEN string.
    ///
    /// Anything after the first space is ignored. Every piece starts with a move count of 0.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut board = Self::new();

        let placements = fen.split_whitespace().next().unwrap_or_default();

        // Check if the placements string is the correct length
        if placements.matches('/').count() != BOARD_SIZE - 1 {
            bail!("Missing placements for all 8 ranks.");
        }

        // FEN lists the eighth rank first, which is also row 0
        for (row, placements) in placements.split('/').enumerate() {
            let mut col = 0;

            for piece_char in placements.chars() {
                if let Some(empty) = piece_char.to_digit(10) {
                    col += empty as usize;
                    continue;
                }

                if col >= BOARD_SIZE {
                    bail!("Rank {} of {fen:?} has more than 8 squares.", BOARD_SIZE - row);
                }

                let square = Square::new_unchecked(row as u8, col as u8);
                board.add(Piece::from_uci(piece_char, square)?)?;
                col += 1;
            }

            if col != BOARD_SIZE {
                bail!("Rank {} of {fen:?} does not describe exactly 8 squares.", BOARD_SIZE - row);
            }
        }

        Ok(board)
    }

    /// Adds a new piece to the board at its own square, returning its handle.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::*;
    /// let mut board = Board::new();
    /// let c4 = Square::from_uci("c4").unwrap();
    /// let id = board.add(Piece::new(Color::White, PieceKind::Knight, c4)).unwrap();
    /// assert_eq!(board.id_at(c4), Some(id));
    /// assert_eq!(board.to_fen(), "8/8/8/8/2N5/8/8/8");
    /// ```
    pub fn add(&mut self, piece: Piece) -> Result<PieceId> {
        let square = piece.square();
        if self.grid.has(square) {
            bail!("Cannot place {piece:?}: {square} is already occupied");
        }
        let Ok(index) = u8::try_from(self.pieces.len()) else {
            bail!("Cannot place {piece:?}: too many pieces");
        };

        let id = PieceId(index);
        self.pieces.push(piece);
        self.grid.place(id, square);
        self.on_board.insert(id);
        Ok(id)
    }

    /// Fetches the piece behind a handle, whether it is on the board or captured.
    #[inline(always)]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.index()]
    }

    #[inline(always)]
    fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.index()]
    }

    /// Returns `true` if there is a piece at the given [`Square`], else `false`.
    #[inline(always)]
    pub fn has(&self, square: Square) -> bool {
        self.grid.has(square)
    }

    /// Fetches the handle of the piece at the given [`Square`], if there is one.
    #[inline(always)]
    pub fn id_at(&self, square: Square) -> Option<PieceId> {
        self.grid[square]
    }

    /// Fetches the [`Piece`] at the given [`Square`], if there is one.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::*;
    /// let board = Board::default();
    /// let a2 = board.piece_at(Square::from_uci("a2").unwrap()).unwrap();
    /// assert_eq!(a2.kind(), PieceKind::Pawn);
    /// assert_eq!(a2.color(), Color::White);
    /// assert!(board.piece_at(Square::from_uci("e4").unwrap()).is_none());
    /// ```
    #[inline(always)]
    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.id_at(square).map(|id| self.piece(id))
    }

    /// Handles of every piece currently on the board.
    #[inline(always)]
    pub fn on_board(&self) -> &BTreeSet<PieceId> {
        &self.on_board
    }

    /// Handles of every captured piece, oldest capture first.
    #[inline(always)]
    pub fn captured(&self) -> &[PieceId] {
        &self.captured
    }

    /// Iterates over the captured pieces, oldest capture first.
    pub fn captured_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.captured.iter().map(|id| self.piece(*id))
    }

    /// Iterates over the on-board pieces of `color` alongside their handles.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (PieceId, &Piece)> {
        self.on_board
            .iter()
            .map(|id| (*id, self.piece(*id)))
            .filter(move |(_, piece)| piece.color() == color)
    }

    /// Fetches the handle of `color`'s King.
    pub fn king(&self, color: Color) -> Result<PieceId, MatchError> {
        self.pieces(color)
            .find(|(_, piece)| piece.is_king())
            .map(|(id, _)| id)
            .ok_or(MatchError::KingNotFound(color))
    }

    /// Number of `color` pieces of `kind` on the board.
    pub fn count(&self, color: Color, kind: PieceKind) -> usize {
        self.pieces(color)
            .filter(|(_, piece)| piece.kind() == kind)
            .count()
    }

    /// Returns a `[row][column]` copy of every occupant, for rendering.
    pub fn snapshot(&self) -> [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE] {
        self.grid.to_rows(|id| *self.piece(*id))
    }

    /// Moves a piece to an empty square.
    fn relocate(&mut self, id: PieceId, to: Square) {
        let from = self.piece(id).square();
        let taken = self.grid.take(from);
        debug_assert_eq!(taken, Some(id), "{id:?} was not on {from}");
        self.grid.place(id, to);
        self.piece_mut(id).set_square(to);
    }

    /// Removes a piece from the board and records it as captured.
    fn capture(&mut self, id: PieceId) {
        let square = self.piece(id).square();
        self.grid.take(square);
        self.on_board.remove(&id);
        self.captured.push(id);
    }

    /// Puts a captured piece back on the square it was captured from.
    fn restore(&mut self, id: PieceId) {
        if let Some(index) = self.captured.iter().rposition(|captured| *captured == id) {
            self.captured.remove(index);
        }
        let square = self.piece(id).square();
        self.grid.place(id, square);
        self.on_board.insert(id);
    }

    /// Marks a piece as having moved without moving it, for positions set up mid-game.
    pub(crate) fn mark_moved(&mut self, id: PieceId) {
        if !self.piece(id).has_moved() {
            self.piece_mut(id).increase_move_count();
        }
    }

    /// Replaces the piece behind `id` with a fresh, unmoved piece of `kind`.
    pub(crate) fn promote(&mut self, id: PieceId, kind: PieceKind) -> Piece {
        let promoted = self.piece(id).promoted(kind);
        *self.piece_mut(id) = promoted;
        promoted
    }

    /// Applies the move of the piece on `from` to `to`. No enforcement of legality.
    ///
    /// Handles the bookkeeping of captures (including en passant, where the captured Pawn
    /// is beside the source square rather than on `to`) and relocates the Rook when a King
    /// moves two columns. Returns the [`Move`] record needed by [`Board::undo_move`].
    ///
    /// # Example
    /// ```
    /// # use chessmatch::*;
    /// let mut board = Board::default();
    /// let before = board.clone();
    /// let mv = board.make_move(Square::from_uci("g1").unwrap(), Square::from_uci("f3").unwrap()).unwrap();
    /// assert_eq!(board.to_fen(), "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R");
    /// board.undo_move(mv);
    /// assert!(board == before);
    /// ```
    pub fn make_move(&mut self, from: Square, to: Square) -> Result<Move, MatchError> {
        let id = self.id_at(from).ok_or(MatchError::NoPieceAtSource(from))?;
        let piece = *self.piece(id);

        let mut kind = MoveKind::Quiet;
        let mut captured = None;

        // First, deal with captures, since the destination must be empty before we move there
        if let Some(victim) = self.id_at(to) {
            self.capture(victim);
            captured = Some(victim);
            kind = MoveKind::Capture;
        } else if piece.is_pawn() && from.col() != to.col() {
            // A Pawn moving diagonally onto an empty square is en passant; the victim is beside us
            let beside = Square::new_unchecked(from.row(), to.col());
            if let Some(victim) = self.id_at(beside) {
                self.capture(victim);
                captured = Some(victim);
                kind = MoveKind::EnPassantCapture;
            }
        }

        self.relocate(id, to);
        self.piece_mut(id).increase_move_count();

        // A King moving two columns is castling, so the Rook comes along
        if piece.is_king() && from.row() == to.row() && from.col().abs_diff(to.col()) == 2 {
            let (rook_from, rook_to) = castling_rook_squares(from, to);
            if let Some(rook) = self.id_at(rook_from) {
                self.relocate(rook, rook_to);
                self.piece_mut(rook).increase_move_count();
                kind = if to.col() > from.col() {
                    MoveKind::ShortCastle
                } else {
                    MoveKind::LongCastle
                };
            }
        }

        let promotes = piece.is_pawn() && to.row() == piece.color().promotion_row();

        Ok(Move {
            from,
            to,
            kind,
            piece: id,
            captured,
            promotes,
        })
    }

    /// Reverts a [`Move`] previously returned by [`Board::make_move`].
    ///
    /// Must be called on the board state immediately following that move; any other use
    /// leaves the board in an unspecified (but memory-safe) state.
    pub fn undo_move(&mut self, mv: Move) {
        self.relocate(mv.piece, mv.from);
        self.piece_mut(mv.piece).decrease_move_count();

        if mv.is_castle() {
            let (rook_from, rook_to) = castling_rook_squares(mv.from, mv.to);
            if let Some(rook) = self.id_at(rook_to) {
                self.relocate(rook, rook_from);
                self.piece_mut(rook).decrease_move_count();
            }
        }

        if let Some(victim) = mv.captured {
            self.restore(victim);
        }
    }

    /// Returns `true` if the on-board set and the grid agree, and no captured piece is on the board.
    pub fn is_consistent(&self) -> bool {
        let grid_matches = self.grid.len() == self.on_board.len()
            && self.grid.iter().all(|(square, id)| {
                self.on_board.contains(id) && self.piece(*id).square() == square
            });

        let captured_are_off_board = self
            .captured
            .iter()
            .all(|id| !self.on_board.contains(id));

        let all_accounted_for = self.on_board.len() + self.captured.len() == self.pieces.len();

        grid_matches && captured_are_off_board && all_accounted_for
    }

    /// Generates the placement field of a FEN string for this [`Board`].
    pub fn to_fen(&self) -> String {
        let mut placements: Vec<String> = Vec::with_capacity(BOARD_SIZE);

        for row in self.snapshot() {
            let mut rank = String::new();
            let mut empty_spaces = 0;
            for occupant in row {
                if let Some(piece) = occupant {
                    if empty_spaces != 0 {
                        rank += &empty_spaces.to_string();
                        empty_spaces = 0;
                    }
                    rank.push(piece.char());
                } else {
                    empty_spaces += 1;
                }
            }

            if empty_spaces != 0 {
                rank += &empty_spaces.to_string();
            }
            placements.push(rank);
        }

        placements.join("/")
    }
}

/// Where the Rook starts and ends when the King castles from `king_from` to `king_to`.
fn castling_rook_squares(king_from: Square, king_to: Square) -> (Square, Square) {
    let row = king_from.row();
    if king_to.col() > king_from.col() {
        (
            Square::new_unchecked(row, BOARD_SIZE as u8 - 1),
            Square::new_unchecked(row, king_to.col() - 1),
        )
    } else {
        (
            Square::new_unchecked(row, 0),
            Square::new_unchecked(row, king_to.col() + 1),
        )
    }
}

impl Default for Board {
    fn default() -> Self {
        // The placements of the start position are always valid
        Self::from_fen(FEN_STARTPOS).unwrap_or_else(|_| Self::new())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, occupants) in self.snapshot().iter().enumerate() {
            write!(f, "{}|", BOARD_SIZE - row)?;
            for occupant in occupants {
                let c = occupant.map(|piece| piece.char()).unwrap_or('.');
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        write!(f, " +")?;
        for _ in 0..BOARD_SIZE {
            write!(f, "--")?;
        }
        write!(f, "\n  ")?;
        for col in 0..BOARD_SIZE as u8 {
            write!(f, " {}", (b'a' + col) as char)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;
        write!(f, "Captured:")?;
        for piece in self.captured_pieces() {
            write!(f, " {piece}")?;
        }
        Ok(())
    }
}
