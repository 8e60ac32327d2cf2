/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use tracing::trace;

use super::{
    Bitboard, Board, Color, MatchError, MoveList, Piece, PieceKind, Square, BOARD_SIZE,
    MAX_NUM_MOVES,
};

/// Orthogonal ray directions, as `(row, column)` deltas.
pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Diagonal ray directions, as `(row, column)` deltas.
pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// All eight ray directions. Also the single steps of a King.
pub const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// The eight L-shaped jumps of a Knight.
pub const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (2, -1),
    (2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
];

/// Match state that move generation needs beyond the board itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct MoveContext {
    /// Square of the Pawn that may be captured en passant this ply, if any.
    pub en_passant: Option<Square>,
}

impl MoveContext {
    #[inline(always)]
    pub const fn new(en_passant: Option<Square>) -> Self {
        Self { en_passant }
    }
}

/// Computes every square `piece` could move to, ignoring whether the move would leave
/// its own King in check.
///
/// # Example
/// ```
/// # use chessmatch::*;
/// let board = Board::default();
/// let knight = board.piece_at(Square::from_uci("g1").unwrap()).unwrap();
/// let mobility = possible_moves(&board, knight, MoveContext::default());
/// assert_eq!(mobility.population(), 2);
/// assert!(mobility.contains(Square::from_uci("f3").unwrap()));
/// assert!(mobility.contains(Square::from_uci("h3").unwrap()));
/// ```
pub fn possible_moves(board: &Board, piece: &Piece, ctx: MoveContext) -> Bitboard {
    match piece.kind() {
        PieceKind::Pawn => pawn_moves(board, piece, ctx),
        PieceKind::Knight => leaper_moves(board, piece, &KNIGHT_JUMPS),
        PieceKind::Bishop => slider_moves(board, piece, &BISHOP_DIRECTIONS),
        PieceKind::Rook => slider_moves(board, piece, &ROOK_DIRECTIONS),
        PieceKind::Queen => slider_moves(board, piece, &QUEEN_DIRECTIONS),
        PieceKind::King => leaper_moves(board, piece, &QUEEN_DIRECTIONS) | castling_moves(board, piece),
    }
}

/// Returns `true` if `piece` could move to `target`. Equivalent to indexing [`possible_moves`].
#[inline(always)]
pub fn possible_move(board: &Board, piece: &Piece, ctx: MoveContext, target: Square) -> bool {
    possible_moves(board, piece, ctx).contains(target)
}

/// Returns `true` if `square` is empty or holds a piece that `piece` may capture.
#[inline(always)]
fn enemy_or_empty(board: &Board, piece: &Piece, square: Square) -> bool {
    board
        .piece_at(square)
        .map_or(true, |occupant| occupant.is_opponent_of(piece))
}

/// Single jumps to each offset, for Knights and the King's one-square steps.
fn leaper_moves(board: &Board, piece: &Piece, offsets: &[(i8, i8)]) -> Bitboard {
    let from = piece.square();

    offsets
        .iter()
        .filter_map(|(d_row, d_col)| from.offset(*d_row, *d_col))
        .filter(|to| enemy_or_empty(board, piece, *to))
        .collect()
}

/// Walks each ray until it leaves the board or hits a piece, which is included only if it is an enemy.
fn slider_moves(board: &Board, piece: &Piece, directions: &[(i8, i8)]) -> Bitboard {
    let mut moves = Bitboard::default();

    for (d_row, d_col) in directions {
        let mut current = piece.square().offset(*d_row, *d_col);

        while let Some(to) = current {
            match board.piece_at(to) {
                None => moves.set(to),
                Some(occupant) => {
                    if occupant.is_opponent_of(piece) {
                        moves.set(to);
                    }
                    break;
                }
            }
            current = to.offset(*d_row, *d_col);
        }
    }

    moves
}

/// Castling destinations for an unmoved King.
///
/// Each side requires an unmoved Rook of the same color in its corner and empty squares
/// between it and the King. Whether the King passes through an attacked square is not checked.
fn castling_moves(board: &Board, king: &Piece) -> Bitboard {
    let mut moves = Bitboard::default();
    if king.has_moved() {
        return moves;
    }

    let from = king.square();
    let row = from.row();

    for (rook_col, step) in [(BOARD_SIZE as u8 - 1, 1), (0, -1)] {
        let Some(destination) = from.offset(0, 2 * step) else {
            continue;
        };

        let rook_square = Square::new_unchecked(row, rook_col);
        let rook_is_ready = board.piece_at(rook_square).is_some_and(|rook| {
            rook.is_rook() && rook.color() == king.color() && !rook.has_moved()
        });
        if !rook_is_ready {
            continue;
        }

        let (low, high) = if rook_col > from.col() {
            (from.col() + 1, rook_col)
        } else {
            (rook_col + 1, from.col())
        };
        let path_is_clear = (low..high).all(|col| !board.has(Square::new_unchecked(row, col)));

        if path_is_clear {
            moves.set(destination);
        }
    }

    moves
}

/// Pushes, double pushes from the starting row, diagonal captures, and en passant.
fn pawn_moves(board: &Board, pawn: &Piece, ctx: MoveContext) -> Bitboard {
    let mut moves = Bitboard::default();
    let color = pawn.color();
    let from = pawn.square();
    let dir = color.pawn_direction();

    // Forward, only onto empty squares
    if let Some(single) = from.offset(dir, 0).filter(|sq| !board.has(*sq)) {
        moves.set(single);

        if from.row() == color.pawn_row() {
            if let Some(double) = from.offset(2 * dir, 0).filter(|sq| !board.has(*sq)) {
                moves.set(double);
            }
        }
    }

    // Diagonally, only onto enemies
    for d_col in [-1, 1] {
        let Some(to) = from.offset(dir, d_col) else {
            continue;
        };
        if board
            .piece_at(to)
            .is_some_and(|occupant| occupant.is_opponent_of(pawn))
        {
            moves.set(to);
        }
    }

    // En passant: the vulnerable Pawn must be directly beside us
    if let Some(ep_square) = ctx.en_passant {
        let is_beside = ep_square.row() == from.row() && ep_square.col().abs_diff(from.col()) == 1;
        let is_enemy_pawn = board
            .piece_at(ep_square)
            .is_some_and(|victim| victim.is_pawn() && victim.is_opponent_of(pawn));

        if is_beside && is_enemy_pawn {
            if let Some(to) = ep_square.offset(dir, 0).filter(|sq| !board.has(*sq)) {
                moves.set(to);
            }
        }
    }

    moves
}

/// Returns `true` if any piece of `color`'s opponent could move onto `color`'s King.
///
/// Fails with [`MatchError::KingNotFound`] if `color` has no King on the board.
pub fn is_in_check(board: &Board, color: Color, ctx: MoveContext) -> Result<bool, MatchError> {
    let king_square = board.piece(board.king(color)?).square();

    Ok(board
        .pieces(color.opponent())
        .any(|(_, attacker)| possible_move(board, attacker, ctx, king_square)))
}

/// Returns `true` if `color` is in check and no candidate move of any of its pieces escapes it.
///
/// Every candidate is applied to `board`, tested, and undone, so `board` is unchanged on return.
pub fn is_checkmate(board: &mut Board, color: Color, ctx: MoveContext) -> Result<bool, MatchError> {
    if !is_in_check(board, color, ctx)? {
        return Ok(false);
    }

    let pieces: Vec<_> = board.pieces(color).map(|(_, piece)| *piece).collect();

    for piece in pieces {
        for to in possible_moves(board, &piece, ctx) {
            let mv = board.make_move(piece.square(), to)?;
            let still_in_check = is_in_check(board, color, ctx);
            board.undo_move(mv);

            if !still_in_check? {
                trace!("{color} escapes check with {mv}");
                return Ok(false);
            }
        }
    }

    Ok(true)
}

/// Appends every move of `color` that does not leave its own King in check.
///
/// Like [`is_checkmate`], each candidate is tried on `board` and undone. Fails with
/// [`MatchError::MoveListFull`] if `moves` runs out of room.
pub fn generate_legal_moves(
    board: &mut Board,
    color: Color,
    ctx: MoveContext,
    moves: &mut MoveList,
) -> Result<(), MatchError> {
    let pieces: Vec<_> = board.pieces(color).map(|(_, piece)| *piece).collect();

    for piece in pieces {
        for to in possible_moves(board, &piece, ctx) {
            let mv = board.make_move(piece.square(), to)?;
            let exposes_king = is_in_check(board, color, ctx);
            board.undo_move(mv);

            if !exposes_king? {
                moves
                    .try_push(mv)
                    .map_err(|_| MatchError::MoveListFull(MAX_NUM_MOVES))?;
            }
        }
    }

    Ok(())
}
