//! # Concurrency Tests / 并发测试
//!
//! Results arrive from modules running in parallel. These tests hammer the
//! shared stores from several threads and check that nothing is lost and
//! every persisted snapshot is complete, parseable JSON.
//!
//! 结果来自并行运行的模块。这些测试从多个线程并发访问共享存储，
//! 检查没有结果丢失，且每次持久化的快照都是完整可解析的 JSON。

mod common;

use std::fs;
use std::sync::Arc;
use std::thread;

use netprobe::core::command_log::CommandLogStore;
use netprobe::core::config::PersistMode;
use netprobe::core::models::{CommandRecord, Outcome};

use common::{make_result, new_store, temp_dir};

const THREADS: usize = 8;
const RESULTS_PER_THREAD: usize = 25;

#[test]
fn test_parallel_add_result_loses_nothing() {
    let dir = temp_dir();
    let store = new_store(&dir, PersistMode::Incremental);

    thread::scope(|scope| {
        for t in 0..THREADS {
            let store = Arc::clone(&store);
            scope.spawn(move || {
                let module = format!("module_{t}");
                for i in 0..RESULTS_PER_THREAD {
                    let outcome = if i % 5 == 0 {
                        Outcome::fail("unreachable")
                    } else {
                        Outcome::Pass
                    };
                    store
                        .add_result(&module, make_result(&module, &format!("test_{i}"), outcome, 1))
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(store.total_tests(), THREADS * RESULTS_PER_THREAD);
    let data = store.summary();
    assert_eq!(data.summary.total_modules, THREADS);
    assert_eq!(data.summary.failed_tests, THREADS * RESULTS_PER_THREAD / 5);

    // Per-module order is the order each thread added them in.
    for results in store.results().values() {
        let names: Vec<_> = results.iter().map(|r| r.test_name.clone()).collect();
        let expected: Vec<_> = (0..RESULTS_PER_THREAD).map(|i| format!("test_{i}")).collect();
        assert_eq!(names, expected);
    }

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.context().snapshot_path()).unwrap()).unwrap();
    let persisted: usize = json["modules"]
        .as_object()
        .unwrap()
        .values()
        .map(|tests| tests.as_array().unwrap().len())
        .sum();
    assert_eq!(persisted, THREADS * RESULTS_PER_THREAD);
}

#[test]
fn test_parallel_journal_appends_whole_lines() {
    let dir = temp_dir();
    let store = new_store(&dir, PersistMode::Journal);

    thread::scope(|scope| {
        for t in 0..THREADS {
            let store = Arc::clone(&store);
            scope.spawn(move || {
                for i in 0..RESULTS_PER_THREAD {
                    store
                        .add_result("shared", make_result("shared", &format!("t{t}_{i}"), Outcome::Pass, 2))
                        .unwrap();
                }
            });
        }
    });

    let journal = fs::read_to_string(store.context().journal_path()).unwrap();
    let lines: Vec<serde_json::Value> = journal
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), THREADS * RESULTS_PER_THREAD);
    assert_eq!(store.results()["shared"].len(), THREADS * RESULTS_PER_THREAD);
}

#[test]
fn test_parallel_captures_stay_separate() {
    let logs = CommandLogStore::new();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let capture = logs.start_capture(&format!("test_{t}"));
            scope.spawn(move || {
                for i in 0..RESULTS_PER_THREAD {
                    capture.record(CommandRecord::new(
                        format!("node{t}"),
                        format!("echo {i}"),
                        0,
                        "",
                        chrono::Local::now(),
                        std::time::Duration::ZERO,
                    ));
                }
            });
        }
    });

    for t in 0..THREADS {
        let drained = logs.drain(&format!("test_{t}"));
        assert_eq!(drained.len(), RESULTS_PER_THREAD);
        assert!(drained.iter().all(|r| r.node == format!("node{t}")));
        assert_eq!(drained.last().unwrap().command, format!("echo {}", RESULTS_PER_THREAD - 1));
    }
}
