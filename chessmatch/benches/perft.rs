/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chessmatch::*;

fn perft_benchmark(c: &mut Criterion) {
    let startpos = ChessMatch::default();
    c.bench_function("Startpos Perft 3", |b| {
        b.iter(|| {
            let startpos = black_box(&startpos);
            let depth = black_box(3);
            black_box(perft(startpos, depth))
        });
    });

    let endgame = ChessMatch::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
    c.bench_function("Endgame Perft 3", |b| {
        b.iter(|| black_box(perft(black_box(&endgame), black_box(3))));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20).measurement_time(Duration::from_secs(30));
    targets = perft_benchmark
}
criterion_main!(benches);
