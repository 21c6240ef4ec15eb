use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use sable::{init_lookups, Position};
use sable_engine::eval::ClassicEval;
use sable_engine::pool::SearchPool;
use sable_engine::tables::SharedTables;
use sable_engine::time::limits::SearchLimits;

fn bench_search(c: &mut Criterion) {
    init_lookups();
    let pos = Position::start_pos();

    c.bench_function("search_depth_6_startpos", |b| {
        b.iter(|| {
            let tables = Arc::new(SharedTables::new(16, 2, 1).unwrap());
            let pool = SearchPool::new(1);
            let mut handle = pool
                .start(&pos, SearchLimits::Depth(6), tables, Arc::new(ClassicEval))
                .unwrap();
            criterion::black_box(handle.best_move())
        })
    });

    let tables = Arc::new(SharedTables::new(16, 2, 1).unwrap());
    c.bench_function("eval_startpos", |b| {
        use sable_engine::eval::Evaluator;
        b.iter(|| criterion::black_box(ClassicEval.evaluate(&pos, &tables)))
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
