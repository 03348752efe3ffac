use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use koru_aggregate::matchers::{fuzzy_match_by, gte};
use koru_aggregate::{Aggregator, Condition, SortBy, json};
use std::time::Duration;

const NAMES: [&str; 8] = [
    "Adam", "Beat", "Clair", "Delilah", "Esther", "Fabio", "Geraldine", "Harald",
];

fn people(size: usize) -> Aggregator {
    (0..size)
        .map(|i| {
            json!({
                "id": i,
                "name": NAMES[i % NAMES.len()],
                "gender": if i % 2 == 0 { "M" } else { "F" },
                "age": 17 + (i % 13),
                "address": {"city": format!("city{}", i % 7)}
            })
        })
        .collect()
}

/// Benchmark: Keyed filter
fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [100, 1000, 10000] {
        let data = people(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(data.filter(Condition::key("age", gte(21))).unwrap()))
        });
    }
    group.finish();
}

/// Benchmark: Multi-key sort
fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_by");

    for size in [100, 1000, 10000] {
        let data = people(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                black_box(
                    data.sort_by([SortBy::asc("gender"), SortBy::desc("age")])
                        .unwrap(),
                )
            })
        });
    }
    group.finish();
}

/// Benchmark: Nested grouping over deep keys
fn bench_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("group");

    for size in [100, 1000, 10000] {
        let data = people(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(data.group(["gender", "address.city", "age"]).unwrap()))
        });
    }
    group.finish();
}

/// Benchmark: Deduplication and intersection
fn bench_set_operations(c: &mut Criterion) {
    let left = people(1000);
    let right = people(500);

    c.bench_function("remove_duplicates_by", |b| {
        b.iter(|| black_box(left.remove_duplicates_by("name").unwrap()))
    });

    c.bench_function("common_elements_by", |b| {
        b.iter(|| black_box(left.common_elements_by("id", &[&right]).unwrap()))
    });
}

/// Benchmark: Fuzzy search
fn bench_fuzzy(c: &mut Criterion) {
    let data = people(1000);

    c.bench_function("fuzzy_substring", |b| {
        b.iter(|| black_box(data.filter(fuzzy_match_by("name", "ald")).unwrap()))
    });

    c.bench_function("fuzzy_word_distance", |b| {
        b.iter(|| black_box(data.filter(fuzzy_match_by("name", "clare")).unwrap()))
    });
}

// Shorter warm-up and measurement than the defaults
fn configure_criterion() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(3))
        .sample_size(50)
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_filter,
        bench_sort,
        bench_group,
        bench_set_operations,
        bench_fuzzy
}

criterion_main!(benches);
