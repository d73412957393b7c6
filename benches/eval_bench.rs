use criterion::{criterion_group, criterion_main, Criterion, black_box};
use tutorbot::Position;

const MIDDLEGAME: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";

fn bench_eval(c: &mut Criterion) {
    let start = Position::startpos();
    c.bench_function("evaluate_startpos", |ben| {
        ben.iter(|| {
            let v = tutorbot::search::eval::evaluate(black_box(&start));
            black_box(v)
        })
    });

    let mid = Position::from_fen(MIDDLEGAME).unwrap();
    c.bench_function("evaluate_italian", |ben| {
        ben.iter(|| {
            let v = tutorbot::search::eval::evaluate(black_box(&mid));
            black_box(v)
        })
    });
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);
