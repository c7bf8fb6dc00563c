use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use slide2048::board::Board;
use slide2048::engine::Move;
use slide2048::tables::{self, Tables};
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut boards = Vec::new();
    // Empty and two-tile starts
    boards.push(Board::EMPTY);
    let mut b = Board::new_game(&mut rng);
    boards.push(b);
    // Derive a variety of densities deterministically
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..20 {
        let dir = seq[i % seq.len()];
        let nb = b.shift(dir);
        if nb != b { b = nb.with_random_tile(&mut rng); }
        boards.push(b);
    }
    boards
}

fn bench_tables(c: &mut Criterion) {
    c.bench_function("tables/build", |bch| bch.iter(|| black_box(Tables::build())));
}

fn bench_shift(c: &mut Criterion) {
    let moves = tables::init().moves();
    let boards = corpus();
    for dir in Move::ALL {
        c.bench_function(&format!("shift/{dir:?}").to_lowercase(), |bch| {
            bch.iter(|| {
                let mut acc = 0u64;
                for &bd in &boards { acc ^= moves.shift(bd, dir).raw(); }
                black_box(acc)
            })
        });
    }
    c.bench_function("board/transpose", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards { acc ^= bd.transpose().raw(); }
            black_box(acc)
        })
    });
}

fn bench_insert(c: &mut Criterion) {
    tables::init();
    c.bench_function("board/with_random_tile", |bch| {
        bch.iter_batched(
            || (Board::EMPTY, StdRng::seed_from_u64(7)),
            |(mut bd, mut rng)| {
                for _ in 0..16 { bd = bd.with_random_tile(&mut rng); }
                black_box(bd)
            },
            BatchSize::SmallInput,
        )
    });
    c.bench_function("board/make_move_left", |bch| {
        bch.iter_batched(
            || {
                let mut rng = StdRng::seed_from_u64(9);
                let bd = Board::new_game(&mut rng);
                (bd, rng)
            },
            |(mut bd, mut rng)| {
                for _ in 0..64 { bd = bd.make_move(Move::Left, &mut rng); }
                black_box(bd)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_score_and_queries(c: &mut Criterion) {
    let heuristics = tables::init().heuristics();
    let boards = corpus();
    c.bench_function("score/score", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards { acc = acc.wrapping_add(heuristics.score(bd)); }
            black_box(acc)
        })
    });
    c.bench_function("query/count_empty", |bch| {
        bch.iter(|| {
            let mut acc = 0u32;
            for &bd in &boards { acc ^= bd.count_empty(); }
            black_box(acc)
        })
    });
    c.bench_function("query/count_distinct_tiles", |bch| {
        bch.iter(|| {
            let mut acc = 0u32;
            for &bd in &boards { acc ^= bd.count_distinct_tiles(); }
            black_box(acc)
        })
    });
}

criterion_group!(engine_ops, bench_tables, bench_shift, bench_insert, bench_score_and_queries);
criterion_main!(engine_ops);
