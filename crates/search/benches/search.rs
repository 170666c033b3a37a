//! Benchmarks for indexing and query passes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use foodshare_search::{levenshtein_distance, SearchConfig, SearchEngine, SearchOptions};
use serde_json::{json, Value};

const WORDS: &[&str] = &[
    "молоко", "хлеб", "сыр", "масло", "кефир", "творог", "йогурт", "сметана", "колбаса", "курица",
    "говядина", "рыба", "картофель", "морковь", "яблоко", "банан", "гречка", "рис", "макароны",
    "шоколад",
];

fn create_records(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let title = format!("{} {} {}", WORDS[i % WORDS.len()], WORDS[(i * 7) % WORDS.len()], i);
            json!({
                "id": i,
                "title": title,
                "content": format!("Свежий продукт номер {i}"),
                "category": WORDS[(i * 3) % WORDS.len()],
                "popularity": i % 100,
            })
        })
        .collect()
}

fn uncached_engine(records: &[Value]) -> SearchEngine {
    let config = SearchConfig { cache_enabled: false, ..SearchConfig::default() };
    let mut engine = SearchEngine::new(config).expect("default config is valid");
    engine.index_data(records);
    engine
}

fn bench_edit_distance(c: &mut Criterion) {
    c.bench_function("levenshtein_word", |b| {
        b.iter(|| levenshtein_distance(black_box("шакаладнай"), black_box("шоколадный")))
    });
}

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_data");

    for size in [100, 1000, 10000].iter() {
        let records = create_records(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| uncached_engine(black_box(&records)))
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let engine = uncached_engine(&create_records(5000));
    let options = SearchOptions::default();

    let mut group = c.benchmark_group("search");
    for (name, query) in [("exact", "кефир"), ("synonym", "батон"), ("typo", "шакалад"), ("phonetic", "зыр")] {
        group.bench_function(name, |b| b.iter(|| engine.search(black_box(query), &options)));
    }
    group.finish();
}

fn bench_suggest(c: &mut Criterion) {
    let engine = uncached_engine(&create_records(5000));

    c.bench_function("suggest_prefix", |b| b.iter(|| engine.suggest(black_box("мо"), 5)));
}

criterion_group!(benches, bench_edit_distance, bench_indexing, bench_search, bench_suggest);
criterion_main!(benches);
