use chrono::Local;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use netprobe::core::config::PersistMode;
use netprobe::core::models::{CommandRecord, Outcome, TestDetails, TestResult};
use netprobe::core::store::ResultStore;
use std::hint::black_box;
use std::time::Duration;
use tempfile::tempdir;

fn result(test: usize) -> TestResult {
    let command_logs = (0..4)
        .map(|i| {
            CommandRecord::new(
                "node1",
                format!("ping -c 3 172.20.0.{i}"),
                0,
                "3 packets transmitted, 3 received, 0% packet loss",
                Local::now(),
                Duration::from_millis(40),
            )
        })
        .collect();
    TestResult {
        module_name: "connectivity".to_string(),
        test_name: format!("test_{test}"),
        outcome: if test % 7 == 0 {
            Outcome::fail("node1 cannot ping node2")
        } else {
            Outcome::Pass
        },
        duration: Duration::from_millis(120),
        timestamp: Local::now(),
        details: TestDetails { command_logs },
    }
}

fn bench_snapshot(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = ResultStore::create(dir.path(), PersistMode::Journal, "en").unwrap();
    for i in 0..200 {
        store.add_result("connectivity", result(i)).unwrap();
    }

    c.bench_function("snapshot_json_200", |b| {
        b.iter(|| black_box(store.snapshot_json().unwrap()))
    });
    c.bench_function("summary_200", |b| b.iter(|| black_box(store.summary())));
}

fn bench_add_result(c: &mut Criterion) {
    for (name, mode) in [
        ("add_result_incremental", PersistMode::Incremental),
        ("add_result_journal", PersistMode::Journal),
    ] {
        c.bench_function(name, |b| {
            b.iter_batched(
                || {
                    let dir = tempdir().unwrap();
                    let store = ResultStore::create(dir.path(), mode, "en").unwrap();
                    (dir, store)
                },
                |(_dir, store)| {
                    for i in 0..20 {
                        store.add_result("connectivity", result(i)).unwrap();
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, bench_snapshot, bench_add_result);
criterion_main!(benches);
