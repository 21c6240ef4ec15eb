use criterion::{criterion_group, criterion_main, Criterion};

use sable::position::perft::perft;
use sable::{init_lookups, Position};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn bench_movegen(c: &mut Criterion) {
    init_lookups();
    let start = Position::start_pos();
    let kiwi = Position::from_fen(KIWIPETE).unwrap();

    c.bench_function("legal_moves_startpos", |b| {
        b.iter(|| criterion::black_box(start.legal_moves().len()))
    });
    c.bench_function("legal_moves_kiwipete", |b| {
        b.iter(|| criterion::black_box(kiwi.legal_moves().len()))
    });
    c.bench_function("perft_4_startpos", |b| {
        b.iter(|| criterion::black_box(perft(&start, 4)))
    });
    c.bench_function("perft_3_kiwipete", |b| {
        b.iter(|| criterion::black_box(perft(&kiwi, 3)))
    });
}

criterion_group!(benches, bench_movegen);
criterion_main!(benches);
