/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::Parser;

use chessmatch::{print_perft, ChessMatch, MoveInput};

/// Compute total number of states reachable from a position, given a depth.
#[derive(Debug, Parser)]
struct Cli {
    /// Depth to run the perft.
    depth: usize,

    /// The FEN string of the position to run the perft.
    #[arg(required = false)]
    fen: Option<String>,

    /// List of moves to apply to the position before running the perft.
    #[arg(required = false)]
    moves: Vec<String>,

    /// If set, perform a splitperft, displaying the number of nodes reachable after each move available from the root.
    #[arg(short, long, default_value = "false")]
    split: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Parse args appropriately
    let mut game = if let Some(fen) = &args.fen {
        ChessMatch::from_fen(fen)?
    } else {
        ChessMatch::default()
    };

    // Apply moves, if any were provided
    for mv_str in args.moves {
        let input = MoveInput::from_uci(&mv_str)?;
        game.perform_move_at(input.from, input.to)?;
        if let Some(kind) = input.promotion {
            game.select_promotion(kind)?;
        }
    }

    println!(
        "Computing PERFT({}) of the following position:\n{}\n",
        args.depth,
        game.to_fen()
    );

    print_perft(&game, args.depth, args.split);

    Ok(())
}
