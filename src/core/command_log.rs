//! # Command Log Store / 命令日志存储
//!
//! Keeps the ordered command history of in-flight tests, keyed by test name.
//! A log exists from [`CommandLogStore::start_capture`] until
//! [`CommandLogStore::drain`], so one test's history can never leak into the next.
//!
//! Records can be appended in two ways:
//! - through the [`CaptureHandle`] returned by `start_capture`, which always
//!   targets the test it was created for, or
//! - through [`CommandLogStore::record`], which targets the *current* test.
//!
//! A store instance is meant for one worker. Parallel workers each own their
//! own store; the "current test" marker is not meaningful across workers.
//!
//! 按测试名称保存进行中测试的有序命令历史。
//! 每个并行工作者都拥有自己的存储实例。

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

use crate::core::models::CommandRecord;

#[derive(Debug, Default)]
struct LogState {
    current: Option<String>,
    logs: IndexMap<String, Vec<CommandRecord>>,
}

/// Test name -> ordered command records.
#[derive(Debug, Default)]
pub struct CommandLogStore {
    state: Mutex<LogState>,
}

impl CommandLogStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks `test_name` as current and opens an empty log for it.
    /// Any previous current test keeps its log until drained.
    pub fn start_capture(self: &Arc<Self>, test_name: &str) -> CaptureHandle {
        let mut state = self.state.lock();
        state.current = Some(test_name.to_string());
        state.logs.insert(test_name.to_string(), Vec::new());
        CaptureHandle {
            store: Arc::clone(self),
            test_name: test_name.to_string(),
        }
    }

    /// Appends to the current test's log. Without a current test the record is
    /// dropped with a warning.
    pub fn record(&self, record: CommandRecord) {
        let mut state = self.state.lock();
        let Some(current) = state.current.clone() else {
            warn!(
                node = %record.node,
                command = %record.command,
                "no active test, dropping command record"
            );
            return;
        };
        Self::append(&mut state, &current, record);
    }

    /// Removes and returns the log of `test_name`, in recording order.
    /// Clears the current marker if it pointed at `test_name`.
    pub fn drain(&self, test_name: &str) -> Vec<CommandRecord> {
        let mut state = self.state.lock();
        if state.current.as_deref() == Some(test_name) {
            state.current = None;
        }
        state.logs.shift_remove(test_name).unwrap_or_default()
    }

    pub fn current_test(&self) -> Option<String> {
        self.state.lock().current.clone()
    }

    pub fn is_capturing(&self, test_name: &str) -> bool {
        self.state.lock().logs.contains_key(test_name)
    }

    /// Number of records currently held for `test_name`.
    pub fn record_count(&self, test_name: &str) -> usize {
        self.state
            .lock()
            .logs
            .get(test_name)
            .map_or(0, Vec::len)
    }

    fn append(state: &mut LogState, test_name: &str, record: CommandRecord) {
        match state.logs.get_mut(test_name) {
            Some(log) => log.push(record),
            None => warn!(
                test = test_name,
                node = %record.node,
                command = %record.command,
                "test is not capturing, dropping command record"
            ),
        }
    }
}

/// Appends to one specific test's log, regardless of which test is current.
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    store: Arc<CommandLogStore>,
    test_name: String,
}

impl CaptureHandle {
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Appends `record`. After the test has been drained this is a no-op with a warning.
    pub fn record(&self, record: CommandRecord) {
        let mut state = self.store.state.lock();
        CommandLogStore::append(&mut state, &self.test_name, record);
    }
}
