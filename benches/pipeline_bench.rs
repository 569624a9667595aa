//! Benchmarks for the annotation pipeline and batch dispatch.
//!
//! Run with: `cargo bench --bench pipeline_bench`

use annotext::{AnnotateConfig, BatchItem, Dispatcher};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const REVIEWS: &[&str] = &[
    "Loved it! Thanks @support_team, details at https://example.com/orders/123 U+1F602",
    "meh. U+1F44E would not buy again",
    "@alice @bob @carol see www.example.org/faq and U+2764",
    "no annotations in this one at all, just a long plain sentence about shoes",
];

fn bench_process(c: &mut Criterion) {
    let config = AnnotateConfig::default();
    let pipeline = config.build_pipeline();

    c.bench_function("process_default_pipeline", |b| {
        b.iter(|| {
            for review in REVIEWS {
                black_box(pipeline.process(black_box(review), &config.base).unwrap());
            }
        });
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let config = AnnotateConfig::default();
    let dispatcher = Dispatcher::with_config(config.build_pipeline(), config.dispatcher_config());
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("dispatch_256_reviews", |b| {
        b.iter(|| {
            let items = REVIEWS
                .iter()
                .cycle()
                .take(256)
                .map(|text| BatchItem::new(*text, config.base.clone()));
            black_box(runtime.block_on(dispatcher.run(items)));
        });
    });
}

criterion_group!(benches, bench_process, bench_dispatch);
criterion_main!(benches);
