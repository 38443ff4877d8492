//! Performance benchmarks for event emission and calendar building.
//!
//! Run with: cargo bench
//!
//! These benchmarks establish baseline performance metrics for:
//! - Emitting events with various numbers of subscribers
//! - Building and rendering a month grid
//! - Listing notes in a populated stream folder

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use streams::calendar::MonthGrid;
use streams::crypto::NoEncryption;
use streams::events::{EventBus, EventData, Topic};
use streams::notes::NoteService;
use streams::paths::note_path;
use streams::settings::Stream;
use streams::vault::{FsVault, Vault};
use tempfile::TempDir;

/// Benchmark emit cost as the subscriber count grows.
fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");

    for subscribers in [0usize, 10, 100] {
        let bus = EventBus::new();
        let _subscriptions: Vec<_> = (0..subscribers)
            .map(|_| bus.subscribe(Topic::DateChanged, |_| Ok(())))
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    black_box(bus.emit(
                        Topic::DateChanged,
                        black_box(EventData::None),
                        "bench",
                    ));
                });
            },
        );
    }

    group.finish();
}

/// Benchmark month grid construction with a cheap size lookup.
fn bench_month_grid(c: &mut Criterion) {
    let today = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");

    c.bench_function("month_grid_build_render", |b| {
        b.iter(|| {
            let grid = MonthGrid::build(2024, black_box(1), today, today, |d| {
                Some(u64::from(chrono::Datelike::day(&d)) * 300)
            })
            .expect("valid month");
            black_box(grid.render());
        });
    });
}

/// Benchmark listing a stream folder holding a year of notes.
fn bench_list_notes(c: &mut Criterion) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let vault = FsVault::new(dir.path());
    let stream = Stream::new("Daily", "Daily");
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
    for offset in 0..365 {
        let path = note_path(&stream, start + Duration::days(offset));
        vault.create(&path, b"# note\n").expect("failed to create note");
    }
    let notes = NoteService::new(&vault, &NoEncryption, EventBus::new());

    c.bench_function("list_notes_365", |b| {
        b.iter(|| {
            let listed = notes.list_notes(black_box(&stream)).expect("listing failed");
            black_box(listed);
        });
    });
}

criterion_group!(benches, bench_emit, bench_month_grid, bench_list_notes);
criterion_main!(benches);
