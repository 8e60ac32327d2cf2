/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Result};
use tracing::{debug, info, trace, warn};

use super::{
    generate_legal_moves, is_checkmate, is_in_check, possible_moves, Bitboard, Board, Color,
    MatchError, MoveContext, MoveList, Piece, PieceId, PieceKind, Square, BOARD_SIZE,
};

/// A game of chess between two players, enforcing the rules of movement, check, and checkmate.
///
/// All mutation goes through [`ChessMatch::perform_move`] (and [`ChessMatch::select_promotion`]),
/// which either commits a legal move or returns a [`MatchError`] with the match untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct ChessMatch {
    /// Piece placements, captured pieces, and move counts.
    board: Board,

    /// Starts at 1 and increases after every committed move.
    turn: usize,

    /// The [`Color`] of the player whose move it is.
    current_player: Color,

    /// Whether the King of the side that must answer the last move is attacked.
    check: bool,

    /// The side that delivered checkmate, if any. Ends the match.
    winner: Option<Color>,

    /// The Pawn that advanced two squares on the previous ply, if any.
    en_passant: Option<PieceId>,

    /// The piece that was just promoted and may still have its kind chosen, if any.
    promoted: Option<PieceId>,
}

impl ChessMatch {
    /// Creates a new [`ChessMatch`] from the standard starting position, with White to move.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::*;
    /// let game = ChessMatch::new();
    /// assert_eq!(game.turn(), 1);
    /// assert_eq!(game.current_player(), Color::White);
    /// assert!(!game.check());
    /// ```
    pub fn new() -> Self {
        Self::with_board(Board::default(), Color::White, 1)
    }

    /// Wraps a board whose side to move is not in check and cannot be mated.
    fn with_board(board: Board, current_player: Color, turn: usize) -> Self {
        Self {
            board,
            turn,
            current_player,
            check: false,
            winner: None,
            en_passant: None,
            promoted: None,
        }
    }

    /// Creates a new [`ChessMatch`] from the provided FEN string.
    ///
    /// Castling availability is expressed through move counts: a King or Rook that has lost
    /// its castling right starts as if it had already moved. The halfmove clock is ignored.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::*;
    /// let game = ChessMatch::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1").unwrap();
    /// assert_eq!(game.current_player(), Color::Black);
    /// assert_eq!(game.turn(), 2);
    /// assert_eq!(game.en_passant_vulnerable().unwrap().square().to_uci(), "e4");
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut split = fen.split_whitespace();
        let placements = split.next().ok_or(anyhow!(
            "Invalid FEN string: FEN string must have piece placements."
        ))?;
        let board = Board::from_fen(placements)?;

        for color in Color::all() {
            let kings = board.count(color, PieceKind::King);
            if kings != 1 {
                bail!("Invalid FEN string: expected exactly one {color} King, found {kings}");
            }
            validate_material(&board, color)?;
        }

        let active_color = split.next().unwrap_or("w");
        let current_player = Color::from_str(active_color)?;

        let mut game = Self::with_board(board, current_player, 1);

        let castling = split.next().unwrap_or("KQkq");
        if castling != "-" && !castling.chars().all(|c| "KQkq".contains(c)) {
            warn!("Ignoring unsupported castling field {castling:?}; only KQkq is understood");
        }
        game.apply_castling_field(castling);

        let en_passant_target = split.next().unwrap_or("-");
        if en_passant_target != "-" {
            let ep_square = Square::from_uci(en_passant_target)?;
            game.en_passant = game.vulnerable_pawn_behind(ep_square);
            if game.en_passant.is_none() {
                warn!("Ignoring en passant square {ep_square}: no Pawn just advanced past it");
            }
        }

        let halfmove = split.next().unwrap_or("0");
        halfmove.parse::<usize>().or(Err(anyhow!(
            "Invalid FEN string: FEN string must have valid halfmove counter. Got {halfmove}"
        )))?;

        let fullmove = split.next().unwrap_or("1");
        let fullmove: usize = fullmove.parse().or(Err(anyhow!(
            "Invalid FEN string: FEN string must have valid fullmove counter. Got {fullmove}"
        )))?;
        game.turn = 2 * fullmove.saturating_sub(1) + 1 + current_player.index();

        // The side that just moved can't have left its King in check
        let ctx = game.context();
        if is_in_check(&game.board, current_player.opponent(), ctx)? {
            bail!("Invalid FEN string: {} is in check but it is not their turn", current_player.opponent());
        }

        game.check = is_in_check(&game.board, current_player, ctx)?;
        if game.check && is_checkmate(&mut game.board, current_player, ctx)? {
            game.winner = Some(current_player.opponent());
        }

        Ok(game)
    }

    /// Marks every King and Rook that lacks castling rights in `castling` as having moved.
    fn apply_castling_field(&mut self, castling: &str) {
        for color in Color::all() {
            let (short, long) = match color {
                Color::White => ('K', 'Q'),
                Color::Black => ('k', 'q'),
            };
            let row = color.home_row();
            let corners = [(short, BOARD_SIZE as u8 - 1), (long, 0)];

            let mut any_right = false;
            for (right, col) in corners {
                let corner = Square::new_unchecked(row, col);
                let Some(rook) = self.board.id_at(corner).filter(|id| {
                    let piece = self.board.piece(*id);
                    piece.is_rook() && piece.color() == color
                }) else {
                    continue;
                };

                if castling.contains(right) {
                    any_right = true;
                } else {
                    self.board.mark_moved(rook);
                }
            }

            if !any_right {
                if let Ok(king) = self.board.king(color) {
                    self.board.mark_moved(king);
                }
            }
        }
    }

    /// Finds the opponent's Pawn that skipped over `ep_square` on the previous ply.
    fn vulnerable_pawn_behind(&self, ep_square: Square) -> Option<PieceId> {
        let opponent = self.current_player.opponent();
        let pawn_square = ep_square.offset(opponent.pawn_direction(), 0)?;
        let id = self.board.id_at(pawn_square)?;
        let pawn = self.board.piece(id);

        (pawn.is_pawn() && pawn.color() == opponent).then_some(id)
    }

    /// Generates a FEN string from this [`ChessMatch`].
    ///
    /// The halfmove clock is not tracked and is always written as 0.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::*;
    /// let mut game = ChessMatch::new();
    /// game.perform_move("e2", "e4").unwrap();
    /// assert_eq!(game.to_fen(), "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
    /// ```
    pub fn to_fen(&self) -> String {
        let placements = self.board.to_fen();
        let active_color = self.current_player.char();
        let castling = self.castling_rights_uci();

        let en_passant_target = self
            .en_passant_vulnerable()
            .and_then(|pawn| pawn.square().offset(-pawn.color().pawn_direction(), 0))
            .map(|square| square.to_uci())
            .unwrap_or(String::from("-"));

        let fullmove = (self.turn - 1) / 2 + 1;

        format!("{placements} {active_color} {castling} {en_passant_target} 0 {fullmove}")
    }

    /// Castling rights in FEN form, derived from the move counts of Kings and Rooks.
    pub fn castling_rights_uci(&self) -> String {
        let mut castling = String::with_capacity(4);

        for color in Color::all() {
            let Ok(king) = self.board.king(color) else {
                continue;
            };
            if self.board.piece(king).has_moved() {
                continue;
            }

            let row = color.home_row();
            for (right, col) in [('K', BOARD_SIZE as u8 - 1), ('Q', 0)] {
                let corner = Square::new_unchecked(row, col);
                let unmoved_rook = self.board.piece_at(corner).is_some_and(|rook| {
                    rook.is_rook() && rook.color() == color && !rook.has_moved()
                });

                if unmoved_rook {
                    castling.push(if color.is_white() {
                        right
                    } else {
                        right.to_ascii_lowercase()
                    });
                }
            }
        }

        // If no side can castle, use a hyphen
        if castling.is_empty() {
            castling = String::from("-");
        }
        castling
    }

    /// Match state handed to move generation.
    #[inline(always)]
    fn context(&self) -> MoveContext {
        MoveContext::new(self.en_passant.map(|id| self.board.piece(id).square()))
    }

    /// Fetch the internal [`Board`] of this [`ChessMatch`].
    #[inline(always)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Returns a `[row][column]` copy of every occupant, with row 0 being the eighth rank.
    #[inline(always)]
    pub fn snapshot(&self) -> [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE] {
        self.board.snapshot()
    }

    /// The turn counter, starting at 1 and increasing once per committed move.
    #[inline(always)]
    pub const fn turn(&self) -> usize {
        self.turn
    }

    #[inline(always)]
    pub const fn current_player(&self) -> Color {
        self.current_player
    }

    /// Whether the side that must answer the last move is in check.
    #[inline(always)]
    pub const fn check(&self) -> bool {
        self.check
    }

    /// Whether one side has been checkmated, ending the match.
    #[inline(always)]
    pub const fn checkmate(&self) -> bool {
        self.winner.is_some()
    }

    /// The side that delivered checkmate, if the match is over.
    ///
    /// After a mating move this is also the [`ChessMatch::current_player`], since the turn
    /// does not advance. A match loaded from a FEN string that is already checkmate has the
    /// mated side as its current player.
    #[inline(always)]
    pub const fn winner(&self) -> Option<Color> {
        self.winner
    }

    /// Fails with [`MatchError::MatchOver`] once a side has been checkmated.
    #[inline(always)]
    fn ensure_not_over(&self) -> Result<(), MatchError> {
        match self.winner {
            Some(winner) => Err(MatchError::MatchOver(winner)),
            None => Ok(()),
        }
    }

    /// The Pawn that may be captured en passant on this ply, if any.
    #[inline(always)]
    pub fn en_passant_vulnerable(&self) -> Option<&Piece> {
        self.en_passant.map(|id| self.board.piece(id))
    }

    /// The piece that was just promoted and whose kind can still be chosen, if any.
    #[inline(always)]
    pub fn promoted(&self) -> Option<&Piece> {
        self.promoted.map(|id| self.board.piece(id))
    }

    /// Iterates over every captured piece, oldest capture first.
    pub fn captured_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.board.captured_pieces()
    }

    /// Returns `true` if `color`'s King is attacked by any opposing piece.
    pub fn is_in_check(&self, color: Color) -> Result<bool, MatchError> {
        is_in_check(&self.board, color, self.context())
    }

    /// Returns `true` if `color` is in check and has no move that escapes it.
    ///
    /// The search runs on a scratch copy of the board.
    pub fn is_checkmate(&self, color: Color) -> Result<bool, MatchError> {
        let mut scratch = self.board.clone();
        is_checkmate(&mut scratch, color, self.context())
    }

    /// Computes all squares the piece at `source` could move to.
    ///
    /// The result is not filtered for moves that would leave the King in check;
    /// [`ChessMatch::perform_move`] rejects those.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::*;
    /// let game = ChessMatch::new();
    /// let moves = game.possible_moves("e2").unwrap();
    /// assert_eq!(moves.population(), 2);
    /// assert!(moves.to_grid()[4][4]); // e4
    ///
    /// assert_eq!(
    ///     game.possible_moves("e7"),
    ///     Err(MatchError::WrongOwner {
    ///         square: Square::from_uci("e7").unwrap(),
    ///         owner: Color::Black,
    ///         current: Color::White,
    ///     })
    /// );
    /// ```
    pub fn possible_moves(&self, source: &str) -> Result<Bitboard, MatchError> {
        self.possible_moves_at(parse_square(source)?)
    }

    /// Same as [`ChessMatch::possible_moves`], for an already-parsed [`Square`].
    pub fn possible_moves_at(&self, source: Square) -> Result<Bitboard, MatchError> {
        self.ensure_not_over()?;
        self.validate_source(source)
    }

    /// Checks that `source` holds a piece of the current player that has somewhere to go,
    /// returning its candidate destinations.
    fn validate_source(&self, source: Square) -> Result<Bitboard, MatchError> {
        let piece = self
            .board
            .piece_at(source)
            .ok_or(MatchError::NoPieceAtSource(source))?;

        if piece.color() != self.current_player {
            return Err(MatchError::WrongOwner {
                square: source,
                owner: piece.color(),
                current: self.current_player,
            });
        }

        let mobility = possible_moves(&self.board, piece, self.context());
        if mobility.is_empty() {
            return Err(MatchError::NoLegalMoves(source));
        }

        Ok(mobility)
    }

    /// Moves the current player's piece from `source` to `target`, both in algebraic notation.
    ///
    /// On success, returns the captured piece, if any. On failure, the match is unchanged.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::*;
    /// let mut game = ChessMatch::new();
    /// assert_eq!(game.perform_move("e2", "e4"), Ok(None));
    /// assert_eq!(game.turn(), 2);
    /// assert_eq!(game.current_player(), Color::Black);
    ///
    /// assert!(game.perform_move("e4", "e5").is_err());
    /// assert_eq!(game.turn(), 2);
    /// ```
    pub fn perform_move(&mut self, source: &str, target: &str) -> Result<Option<Piece>, MatchError> {
        let from = parse_square(source)?;
        let to = parse_square(target)?;
        self.perform_move_at(from, to)
    }

    /// Same as [`ChessMatch::perform_move`], for already-parsed [`Square`]s.
    pub fn perform_move_at(&mut self, from: Square, to: Square) -> Result<Option<Piece>, MatchError> {
        self.ensure_not_over()?;

        let mobility = self.validate_source(from)?;
        if !mobility.contains(to) {
            return Err(MatchError::IllegalTarget { from, to });
        }

        let mover = self.current_player;
        let mv = self.board.make_move(from, to)?;

        // Never leave our own King in check; revert before anything else changes
        match is_in_check(&self.board, mover, self.context()) {
            Ok(false) => {}
            outcome => {
                self.board.undo_move(mv);
                trace!("Reverted {mv}: it would leave the {mover} King in check");
                return Err(outcome.err().unwrap_or(MatchError::SelfCheckViolation));
            }
        }

        let moved = *self.board.piece(mv.piece());

        self.promoted = None;
        if mv.is_promotion() {
            self.board.promote(mv.piece(), PieceKind::Queen);
            self.promoted = Some(mv.piece());
        }

        // Set before the mate search, so an en passant capture counts as an escape
        self.en_passant = (moved.is_pawn() && mv.is_double_step()).then_some(mv.piece());

        let opponent = mover.opponent();
        self.evaluate_opponent(mover)?;

        debug!(
            "Turn {}: {mover} played {mv}{}",
            self.turn,
            mv.captured()
                .map(|id| format!(", capturing {:?}", self.board.piece(id)))
                .unwrap_or_default()
        );

        if self.winner.is_some() {
            info!("{opponent} is checkmated after {mv}");
        } else {
            self.next_turn();
        }

        Ok(mv.captured().map(|id| *self.board.piece(id)))
    }

    /// Recomputes whether `mover`'s opponent is in check or checkmated.
    fn evaluate_opponent(&mut self, mover: Color) -> Result<(), MatchError> {
        let opponent = mover.opponent();
        let ctx = self.context();

        self.check = is_in_check(&self.board, opponent, ctx)?;
        let mated = self.check && is_checkmate(&mut self.board, opponent, ctx)?;
        self.winner = mated.then_some(mover);
        Ok(())
    }

    /// Chooses the kind of the piece that was just promoted.
    ///
    /// A promoted Pawn becomes a Queen by default. This replaces it with a fresh piece of
    /// `kind`, which must be a Knight, Bishop, Rook, or Queen, and re-evaluates whether the
    /// opponent is in check or checkmate.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::*;
    /// let mut game = ChessMatch::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    /// game.perform_move("a7", "a8").unwrap();
    /// assert_eq!(game.promoted().unwrap().kind(), PieceKind::Queen);
    ///
    /// assert_eq!(game.select_promotion(PieceKind::King), Err(MatchError::InvalidPromotion(PieceKind::King)));
    /// let knight = game.select_promotion(PieceKind::Knight).unwrap();
    /// assert_eq!(knight.kind(), PieceKind::Knight);
    /// assert!(game.promoted().is_none());
    /// ```
    pub fn select_promotion(&mut self, kind: PieceKind) -> Result<Piece, MatchError> {
        let id = self.promoted.ok_or(MatchError::NoPendingPromotion)?;
        if !kind.is_promotion_choice() {
            return Err(MatchError::InvalidPromotion(kind));
        }

        let piece = self.board.promote(id, kind);
        self.promoted = None;
        info!("{} promoted on {} to a {kind}", piece.color(), piece.square());

        // The new kind may give (or stop giving) check, so re-evaluate as if it was chosen upfront
        let mover = piece.color();
        let was_checkmate = self.checkmate();
        self.evaluate_opponent(mover)?;

        match (was_checkmate, self.checkmate()) {
            (false, true) => {
                self.turn -= 1;
                self.current_player = mover;
                info!("{} is checkmated", mover.opponent());
            }
            (true, false) => self.next_turn(),
            _ => {}
        }

        Ok(piece)
    }

    /// Passes the move to the other player.
    #[inline(always)]
    fn next_turn(&mut self) {
        self.turn += 1;
        self.current_player = self.current_player.opponent();
    }

    /// Generate all legal moves of the current player.
    ///
    /// Each candidate destination is tried on a scratch copy of the board and kept only if
    /// it does not leave the current player's King in check. Empty once the match is over.
    ///
    /// # Example
    /// ```
    /// # use chessmatch::*;
    /// let game = ChessMatch::new();
    /// assert_eq!(game.legal_moves().unwrap().len(), 20);
    /// ```
    pub fn legal_moves(&self) -> Result<MoveList, MatchError> {
        let mut moves = MoveList::default();
        if self.checkmate() {
            return Ok(moves);
        }

        let mut scratch = self.board.clone();
        generate_legal_moves(&mut scratch, self.current_player, self.context(), &mut moves)?;
        Ok(moves)
    }
}

/// Rejects armies that no real game can produce: more than 16 pieces, more than 8 Pawns,
/// or more promoted pieces than there are missing Pawns.
fn validate_material(board: &Board, color: Color) -> Result<()> {
    let total = board.pieces(color).count();
    if total > 16 {
        bail!("Invalid FEN string: {color} has {total} pieces, but at most 16 are allowed");
    }

    let pawns = board.count(color, PieceKind::Pawn);
    let promoted: usize = [
        (PieceKind::Knight, 2),
        (PieceKind::Bishop, 2),
        (PieceKind::Rook, 2),
        (PieceKind::Queen, 1),
    ]
    .into_iter()
    .map(|(kind, initial)| board.count(color, kind).saturating_sub(initial))
    .sum();

    if pawns + promoted > 8 {
        bail!("Invalid FEN string: {color} has {pawns} Pawns and {promoted} promoted pieces, but only 8 Pawns exist");
    }

    Ok(())
}

/// Parses algebraic notation into a [`Square`], reporting failures as [`MatchError::InvalidSquare`].
fn parse_square(notation: &str) -> Result<Square, MatchError> {
    Square::from_uci(notation).map_err(|_| MatchError::InvalidSquare(notation.to_string()))
}

impl Default for ChessMatch {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ChessMatch {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl fmt::Display for ChessMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.board)?;
        writeln!(f)?;
        writeln!(f, "Turn: {}", self.turn)?;

        if let Some(winner) = self.winner {
            writeln!(f, "CHECKMATE!")?;
            write!(f, "Winner: {winner}")
        } else {
            write!(f, "Waiting player: {}", self.current_player)?;
            if self.check {
                write!(f, "\nCHECK!")?;
            }
            Ok(())
        }
    }
}

impl fmt::Debug for ChessMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let board = self.board.to_string();

        for (row, line) in board.lines().enumerate() {
            write!(f, "{line}")?;

            match row {
                0 => write!(f, "           FEN: {}", self.to_fen())?,
                1 => write!(f, "          Side: {}", self.current_player)?,
                2 => write!(f, "          Turn: {}", self.turn)?,
                3 => write!(f, "         Check: {}", self.check)?,
                4 => write!(f, "     Checkmate: {}", self.checkmate())?,
                5 => {
                    let ep = self
                        .en_passant_vulnerable()
                        .map(|pawn| pawn.square().to_uci())
                        .unwrap_or(String::from("-"));
                    write!(f, "            EP: {ep}")?
                }
                6 => {
                    let promoted = self
                        .promoted()
                        .map(|piece| piece.square().to_uci())
                        .unwrap_or(String::from("-"));
                    write!(f, "      Promoted: {promoted}")?
                }
                _ => {}
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(uci: &str) -> Square {
        Square::from_uci(uci).unwrap()
    }

    fn play(game: &mut ChessMatch, moves: &[&str]) {
        for mv in moves {
            let (from, to) = mv.split_at(2);
            game.perform_move(from, to)
                .unwrap_or_else(|e| panic!("{mv} should be legal in {game:?}: {e}"));
        }
    }

    fn assert_consistent(game: &ChessMatch) {
        let board = game.board();
        assert!(board.is_consistent(), "{board:?}");
        for color in Color::all() {
            assert_eq!(board.count(color, PieceKind::King), 1);
        }
    }

    #[test]
    fn test_new_match_state() {
        let game = ChessMatch::new();
        assert_eq!(game.turn(), 1);
        assert_eq!(game.current_player(), Color::White);
        assert!(!game.check());
        assert!(!game.checkmate());
        assert!(game.en_passant_vulnerable().is_none());
        assert!(game.promoted().is_none());
        assert_eq!(game.to_fen(), crate::FEN_STARTPOS);
        assert_consistent(&game);
    }

    #[test]
    fn test_source_validation_errors() {
        let game = ChessMatch::new();
        assert_eq!(game.possible_moves("e4"), Err(MatchError::NoPieceAtSource(sq("e4"))));
        assert_eq!(game.possible_moves("a1"), Err(MatchError::NoLegalMoves(sq("a1"))));
        assert_eq!(game.possible_moves("z9"), Err(MatchError::InvalidSquare(String::from("z9"))));
        assert!(matches!(game.possible_moves("d8"), Err(MatchError::WrongOwner { .. })));
    }

    #[test]
    fn test_illegal_target_leaves_state_unchanged() {
        let mut game = ChessMatch::new();
        let before = game.clone();
        assert_eq!(
            game.perform_move("b1", "b3"),
            Err(MatchError::IllegalTarget { from: sq("b1"), to: sq("b3") })
        );
        assert!(game == before);
    }

    #[test]
    fn test_turn_alternates_only_on_committed_moves() {
        let mut game = ChessMatch::new();
        play(&mut game, &["e2e4"]);
        assert_eq!((game.turn(), game.current_player()), (2, Color::Black));

        assert!(game.perform_move("e4", "e5").is_err());
        assert!(game.perform_move("e7", "e4").is_err());
        assert_eq!((game.turn(), game.current_player()), (2, Color::Black));

        play(&mut game, &["e7e5"]);
        assert_eq!((game.turn(), game.current_player()), (3, Color::White));
    }

    #[test]
    fn test_fools_mate() {
        let mut game = ChessMatch::new();
        play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);

        assert!(game.check());
        assert!(game.checkmate());
        assert_eq!(game.is_checkmate(Color::White), Ok(true));
        // The turn does not advance past a checkmate
        assert_eq!(game.turn(), 4);
        assert_eq!(game.current_player(), Color::Black);
        assert_eq!(game.legal_moves().unwrap().len(), 0);

        let before = game.clone();
        assert_eq!(game.perform_move("a2", "a3"), Err(MatchError::MatchOver(Color::Black)));
        assert!(game == before);
        assert_consistent(&game);
    }

    #[test]
    fn test_mates_and_blockable_checks() {
        let mut game = ChessMatch::new();
        play(&mut game, &["e2e4", "f7f6", "d2d4", "g7g5", "d1h5"]);
        assert!(game.checkmate());

        let mut game = ChessMatch::new();
        play(&mut game, &["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"]);
        assert!(game.check());
        assert!(game.checkmate(), "scholar's mate");

        let mut game = ChessMatch::new();
        play(&mut game, &["e2e4", "f7f6", "d1h5"]);
        assert!(game.check());
        assert!(!game.checkmate());
        assert_eq!(game.current_player(), Color::Black);
        play(&mut game, &["g7g6"]);
        assert!(!game.check());
    }

    #[test]
    fn test_pinned_piece_cannot_leave_the_pin() {
        // The white knight on e2 is pinned by the black rook on e8
        let mut game = ChessMatch::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        let before = game.clone();

        // The knight still shows candidate moves
        assert!(game.possible_moves("e2").unwrap().is_nonempty());

        assert_eq!(game.perform_move("e2", "c3"), Err(MatchError::SelfCheckViolation));
        assert!(game == before);
        assert_consistent(&game);
    }

    #[test]
    fn test_rejected_capture_restores_captured_piece() {
        // Capturing the pawn on d2 with the king would walk into the rook on d8
        let mut game = ChessMatch::from_fen("3rk3/8/8/8/8/8/3p4/4K3 w - - 0 1").unwrap();
        let before = game.clone();

        assert_eq!(game.perform_move("e1", "d2"), Err(MatchError::SelfCheckViolation));
        assert!(game == before);
        assert!(game.captured_pieces().next().is_none());
    }

    #[test]
    fn test_en_passant_window() {
        let mut game = ChessMatch::new();
        play(&mut game, &["e2e4"]);
        assert_eq!(game.en_passant_vulnerable().unwrap().square(), sq("e4"));

        play(&mut game, &["a7a6"]);
        assert!(game.en_passant_vulnerable().is_none());

        play(&mut game, &["e4e5", "d7d5"]);
        assert_eq!(game.en_passant_vulnerable().unwrap().square(), sq("d5"));
        assert!(game.possible_moves("e5").unwrap().contains(sq("d6")));

        let captured = game.perform_move("e5", "d6").unwrap().unwrap();
        assert!(captured.is_pawn());
        assert_eq!(captured.color(), Color::Black);
        assert!(game.board().piece_at(sq("d5")).is_none());
        assert_eq!(game.board().piece_at(sq("d6")).unwrap().color(), Color::White);
        assert!(game.en_passant_vulnerable().is_none());
        assert_consistent(&game);
    }

    #[test]
    fn test_en_passant_expires_after_one_ply() {
        let mut game = ChessMatch::new();
        play(&mut game, &["e2e4", "a7a6", "e4e5", "d7d5", "h2h3", "a6a5"]);
        assert!(!game.possible_moves("e5").unwrap().contains(sq("d6")));
        assert!(matches!(
            game.perform_move("e5", "d6"),
            Err(MatchError::IllegalTarget { .. })
        ));
    }

    #[test]
    fn test_castling_kingside() {
        let mut game = ChessMatch::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert!(game.possible_moves("e1").unwrap().contains(sq("g1")));

        play(&mut game, &["e1g1"]);
        let rook = game.board().piece_at(sq("f1")).unwrap();
        assert!(rook.is_rook());
        assert_eq!(rook.move_count(), 1);
        assert!(game.board().piece_at(sq("g1")).unwrap().is_king());
        assert!(game.board().piece_at(sq("h1")).is_none());
        assert_eq!(game.castling_rights_uci(), "kq");
    }

    #[test]
    fn test_castling_rights_lost_after_rook_moves() {
        let mut game = ChessMatch::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        play(&mut game, &["h1h2", "a8a7", "h2h1", "a7a8"]);

        // Rook is home again, but it has moved
        let before = game.clone();
        assert_eq!(
            game.perform_move("e1", "g1"),
            Err(MatchError::IllegalTarget { from: sq("e1"), to: sq("g1") })
        );
        assert!(game == before);

        // Queenside is still available
        play(&mut game, &["e1c1"]);
        assert!(game.board().piece_at(sq("d1")).unwrap().is_rook());
    }

    #[test]
    fn test_castling_rights_lost_after_king_moves() {
        let mut game = ChessMatch::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        play(&mut game, &["e1f1", "e8f8", "f1e1", "f8e8"]);
        assert!(!game.possible_moves("e1").unwrap().contains(sq("g1")));
        assert!(!game.possible_moves("e1").unwrap().contains(sq("c1")));
        assert_eq!(game.castling_rights_uci(), "-");
    }

    #[test]
    fn test_castling_field_in_fen_sets_eligibility() {
        let game = ChessMatch::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1").unwrap();
        let king_moves = game.possible_moves("e1").unwrap();
        assert!(king_moves.contains(sq("g1")));
        assert!(!king_moves.contains(sq("c1")));
        assert_eq!(game.castling_rights_uci(), "Kq");
    }

    #[test]
    fn test_promotion_defaults_to_queen_and_can_be_changed() {
        let mut game = ChessMatch::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(game.select_promotion(PieceKind::Queen), Err(MatchError::NoPendingPromotion));

        play(&mut game, &["a7a8"]);
        let promoted = *game.promoted().unwrap();
        assert_eq!(promoted.kind(), PieceKind::Queen);
        assert_eq!(promoted.color(), Color::White);
        assert_eq!(promoted.square(), sq("a8"));
        // The default Queen gives check along the eighth rank
        assert!(game.check());

        assert_eq!(
            game.select_promotion(PieceKind::Pawn),
            Err(MatchError::InvalidPromotion(PieceKind::Pawn))
        );
        assert!(game.promoted().is_some());

        let queen = game.select_promotion(PieceKind::Queen).unwrap();
        assert_eq!(queen.kind(), PieceKind::Queen);
        assert_eq!(queen.move_count(), 0);
        assert!(game.promoted().is_none());
        assert_eq!(game.board().piece_at(sq("a8")).unwrap().kind(), PieceKind::Queen);
        assert_consistent(&game);
    }

    #[test]
    fn test_underpromotion_reevaluates_check() {
        let mut game = ChessMatch::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        play(&mut game, &["a7a8"]);
        assert!(game.check());

        game.select_promotion(PieceKind::Knight).unwrap();
        assert!(!game.check());
        assert_eq!(game.current_player(), Color::Black);
        assert_eq!(game.turn(), 2);
    }

    #[test]
    fn test_underpromotion_can_undo_a_mate() {
        // A Queen on c8 mates the cornered King; a Knight on c8 does not even give check
        let mut game = ChessMatch::from_fen("k7/2P5/1K6/8/8/8/8/8 w - - 0 1").unwrap();
        play(&mut game, &["c7c8"]);
        assert!(game.checkmate());
        assert_eq!(game.turn(), 1);

        game.select_promotion(PieceKind::Knight).unwrap();
        assert!(!game.checkmate());
        assert_eq!(game.turn(), 2);
        assert_eq!(game.current_player(), Color::Black);
    }

    #[test]
    fn test_pending_promotion_clears_on_next_move() {
        let mut game = ChessMatch::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        play(&mut game, &["a7a8", "e8d7"]);
        assert!(game.promoted().is_none());
        assert_eq!(game.select_promotion(PieceKind::Rook), Err(MatchError::NoPendingPromotion));
    }

    #[test]
    fn test_from_fen_rejects_impossible_positions() {
        // No black King
        assert!(ChessMatch::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1").is_err());
        // Black is in check, but it is White's turn
        assert!(ChessMatch::from_fen("4k3/8/8/8/8/8/8/4KR2 w - - 0 1").is_ok());
        assert!(ChessMatch::from_fen("4k3/8/8/8/8/8/8/4R1K1 w - - 0 1").is_err());
        // Garbage counters
        assert!(ChessMatch::from_fen("4k3/8/8/8/8/8/8/4K3 w - - x 1").is_err());
    }

    #[test]
    fn test_from_fen_detects_existing_checkmate() {
        let mut game = ChessMatch::from_fen("3R2k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert!(game.check());
        assert!(game.checkmate());
        assert!(game.legal_moves().unwrap().is_empty());

        // Black is to move but mated, so White won
        assert_eq!(game.current_player(), Color::Black);
        assert_eq!(game.winner(), Some(Color::White));
        assert_eq!(game.perform_move("g8", "h8"), Err(MatchError::MatchOver(Color::White)));
        assert!(game.to_string().ends_with("Winner: White"));
    }

    #[test]
    fn test_winner_after_mating_move() {
        let mut game = ChessMatch::new();
        assert_eq!(game.winner(), None);
        play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(game.winner(), Some(Color::Black));
        assert!(game.to_string().ends_with("Winner: Black"));
    }

    #[test]
    fn test_no_candidate_moves_once_match_is_over() {
        let mut game = ChessMatch::new();
        play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(game.possible_moves("h4"), Err(MatchError::MatchOver(Color::Black)));
        assert_eq!(game.possible_moves("a2"), Err(MatchError::MatchOver(Color::Black)));
    }

    #[test]
    fn test_castling_into_check_restores_rook() {
        // The black rook on g8 covers g1
        let mut game = ChessMatch::from_fen("4k1r1/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let before = game.clone();
        assert!(game.possible_moves("e1").unwrap().contains(sq("g1")));

        assert_eq!(game.perform_move("e1", "g1"), Err(MatchError::SelfCheckViolation));
        assert!(game == before);
        assert!(game.board().piece_at(sq("h1")).unwrap().is_rook());
        assert!(!game.board().piece_at(sq("h1")).unwrap().has_moved());
        assert_consistent(&game);
    }

    #[test]
    fn test_overfull_position_reports_error_instead_of_panicking() {
        let placements = "R6R/3Q4/1Q4Q1/4Q3/2Q4Q/Q4Q2/pp1Q4/kBNNQKB1";
        let game = ChessMatch {
            board: Board::from_fen(placements).unwrap(),
            ..ChessMatch::new()
        };

        assert_eq!(game.legal_moves(), Err(MatchError::MoveListFull(crate::MAX_NUM_MOVES)));
        assert_eq!(crate::perft(&game, 1), 0);
    }

    #[test]
    fn test_from_fen_rejects_unreachable_material() {
        // Seventeen white pieces
        let crowded = "R6R/3Q4/1Q4Q1/4Q3/2Q4Q/Q4Q2/pp1Q4/kBNNQKB1 w - - 0 1";
        assert!(ChessMatch::from_fen(crowded).is_err());
        // Nine white Pawns
        assert!(ChessMatch::from_fen("4k3/8/8/8/P7/8/PPPPPPPP/4K3 w - - 0 1").is_err());
        // Eight Pawns plus a second Queen
        assert!(ChessMatch::from_fen("4k3/8/8/8/8/8/PPPPPPPP/QQ2K3 w - - 0 1").is_err());
        // Seven Pawns and one promoted Queen is fine
        assert!(ChessMatch::from_fen("4k3/8/8/8/8/8/PPPPPPP1/QQ2K3 w - - 0 1").is_ok());
    }

    #[test]
    fn test_en_passant_escape_from_check() {
        // The pawn on d5 gives check after d7d5, and capturing it en passant is one way out
        let fen = "8/3p4/8/4P3/2K5/8/8/1r1r3k b - - 0 1";
        let mut game = ChessMatch::from_fen(fen).unwrap();
        play(&mut game, &["d7d5"]);
        assert!(game.check());
        assert!(!game.checkmate());

        let legal = game.legal_moves().unwrap();
        assert!(legal.iter().any(|mv| mv.is_en_passant()));
    }

    #[test]
    fn test_long_game_keeps_invariants() {
        let mut game = ChessMatch::new();
        let moves = [
            "e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5c6", "d7c6", "e1g1", "f7f6",
            "d2d4", "e5d4", "f3d4", "c6c5", "d4b3", "d8d1", "f1d1",
        ];
        for mv in moves {
            play(&mut game, &[mv]);
            assert_consistent(&game);
        }
        assert_eq!(game.turn(), moves.len() + 1);
        assert_eq!(game.captured_pieces().count(), 5);
    }
}
