/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Instant;

use tracing::warn;

use super::{ChessMatch, Move, MoveList, PieceKind};

/// Applies `mv` to a copy of `game`, calling `f` once per resulting position.
///
/// A promoting move yields one position per promotion choice.
fn for_each_child(game: &ChessMatch, mv: &Move, mut f: impl FnMut(&ChessMatch, Option<PieceKind>)) {
    let mut child = game.clone();
    // Moves come from the legal move generator, so this only fails on a corrupt board
    if let Err(e) = child.perform_move_at(mv.from(), mv.to()) {
        warn!("Skipping legal move {mv}, which was rejected: {e}");
        return;
    }

    if !mv.is_promotion() {
        f(&child, None);
        return;
    }

    for kind in PieceKind::PROMOTIONS {
        let mut promoted = child.clone();
        match promoted.select_promotion(kind) {
            Ok(_) => f(&promoted, Some(kind)),
            Err(e) => warn!("Skipping promotion of {mv} to a {kind}: {e}"),
        }
    }
}

/// Legal moves of `game`, or `None` (with a warning) if the board is corrupt.
fn legal_moves_or_warn(game: &ChessMatch) -> Option<MoveList> {
    match game.legal_moves() {
        Ok(moves) => Some(moves),
        Err(e) => {
            warn!("Counting no nodes below {}: {e}", game.to_fen());
            None
        }
    }
}

/// Counts the number of positions reachable from `game` in exactly `depth` moves.
///
/// # Example
/// ```
/// # use chessmatch::*;
/// let game = ChessMatch::new();
/// assert_eq!(perft(&game, 1), 20);
/// assert_eq!(perft(&game, 2), 400);
/// ```
pub fn perft(game: &ChessMatch, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let Some(moves) = legal_moves_or_warn(game) else {
        return 0;
    };

    let mut nodes = 0;
    for mv in &moves {
        if depth == 1 && !mv.is_promotion() {
            nodes += 1;
            continue;
        }
        for_each_child(game, mv, |child, _| nodes += perft(child, depth - 1));
    }

    nodes
}

/// Like [`perft`], but prints the node count below each root move, such as `e2e4: 600`.
pub fn splitperft(game: &ChessMatch, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let Some(moves) = legal_moves_or_warn(game) else {
        return 0;
    };

    let mut total = 0;
    for mv in &moves {
        for_each_child(game, mv, |child, promotion| {
            let nodes = perft(child, depth - 1);
            total += nodes;

            let suffix = promotion
                .map(|kind| kind.char().to_ascii_lowercase().to_string())
                .unwrap_or_default();
            println!("{mv}{suffix}: {nodes}");
        });
    }

    total
}

/// Runs [`perft`] (or [`splitperft`]) on `game` and prints the node count and speed.
pub fn print_perft(game: &ChessMatch, depth: usize, split: bool) -> u64 {
    let now = Instant::now();
    let nodes = if split {
        let nodes = splitperft(game, depth);
        println!();
        nodes
    } else {
        perft(game, depth)
    };
    let elapsed = now.elapsed();

    let nps = nodes as f32 / elapsed.as_secs_f32();
    let m_nps = nps / 1_000_000.0;

    println!("  Total Nodes:\t{nodes}");
    println!(" Elapsed Time:\t{elapsed:.1?}");
    println!("  Nodes / Sec:\t{nps:.0}");
    println!("M Nodes / Sec:\t{m_nps:.1}");

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_perft() {
        let game = ChessMatch::new();
        assert_eq!(perft(&game, 0), 1);
        assert_eq!(perft(&game, 1), 20);
        assert_eq!(perft(&game, 2), 400);
        assert_eq!(perft(&game, 3), 8902);
    }

    #[test]
    fn test_endgame_perft() {
        // Exercises en passant and discovered checks along the fifth rank
        let game = ChessMatch::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
        assert_eq!(perft(&game, 1), 14);
        assert_eq!(perft(&game, 2), 191);
        assert_eq!(perft(&game, 3), 2812);
    }

    #[test]
    fn test_promotions_count_once_per_choice() {
        // Only the a-pawn and the King can move
        let game = ChessMatch::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(perft(&game, 1), 4 + 3);
    }

    #[test]
    fn test_splitperft_matches_perft() {
        let game = ChessMatch::new();
        assert_eq!(splitperft(&game, 2), perft(&game, 2));
    }

    #[test]
    fn test_checkmate_has_no_children() {
        let game = ChessMatch::from_fen("3R2k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert_eq!(perft(&game, 1), 0);
        assert_eq!(perft(&game, 2), 0);
    }
}
