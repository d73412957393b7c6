use criterion::{criterion_group, criterion_main, Criterion, black_box};
use tutorbot::search::{SearchCaches, Searcher};
use tutorbot::{CozyOracle, Position};

fn bench_search(c: &mut Criterion) {
    let pos = Position::startpos();
    c.bench_function("search_depth_3_startpos", |ben| {
        ben.iter(|| {
            let mut caches = SearchCaches::with_capacity_mb(4);
            let mut s = Searcher::new(&CozyOracle, &mut caches);
            let r = s.search_depth(black_box(&pos), 3).unwrap();
            black_box(r.stats.nodes)
        })
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
