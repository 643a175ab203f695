use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use crumb_gloss::{ContentStore, FilterState, FilterUpdate, lookup};

fn bench_cold_load(c: &mut Criterion) {
    c.bench_function("cold_load::bundled_store", |b| {
        b.iter(|| {
            let store = ContentStore::bundled().expect("bundled content");
            black_box(store.len());
        });
    });
}

fn bench_visible_records(c: &mut Criterion) {
    let store = ContentStore::bundled().expect("bundled content");
    let cases: &[(&str, &[(&str, &str)])] = &[
        ("unfiltered", &[]),
        ("search", &[("search", "dough")]),
        ("letter", &[("letter", "B")]),
        (
            "path_and_difficulty",
            &[("path", "beginner-basics"), ("difficulty", "Beginner")],
        ),
    ];
    for &(label, fields) in cases {
        let mut state = FilterState::default();
        for &(field, value) in fields {
            if let Some(update) = FilterUpdate::parse(field, value) {
                state.apply(update);
            }
        }
        c.bench_with_input(BenchmarkId::new("visible", label), &state, |b, state| {
            b.iter(|| {
                let visible = store.visible(state);
                black_box(visible.len());
            });
        });
    }
}

fn bench_term_lookup(c: &mut Criterion) {
    let store = ContentStore::bundled().expect("bundled content");
    for slug in ["poolish", "banneton", "poolsh"] {
        c.bench_with_input(BenchmarkId::new("term_lookup", slug), &slug, |b, &slug| {
            b.iter(|| {
                let result = lookup::project(&store, slug);
                black_box(result.is_ok());
            });
        });
    }
}

criterion_group!(
    benches,
    bench_cold_load,
    bench_visible_records,
    bench_term_lookup
);
criterion_main!(benches);
