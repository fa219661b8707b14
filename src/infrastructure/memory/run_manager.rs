//! In-Memory Run Manager Implementation

use chrono::Utc;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::ports::{RunError, RunManagerPort, RunSnapshot};
use crate::domain::{BatchResult, RunState};

struct RunEntry {
    snapshot: RunSnapshot,
    cancel: CancellationToken,
}

/// 默认保留的已结束运行数
const DEFAULT_MAX_RETAINED_RUNS: usize = 100;

/// 内存运行管理器
///
/// 已结束的运行超过保留上限时，最早结束的会被移除；进行中的运行不受影响
pub struct InMemoryRunManager {
    /// run_id -> RunEntry
    runs: DashMap<Uuid, RunEntry>,
    max_retained_runs: usize,
}

impl InMemoryRunManager {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_MAX_RETAINED_RUNS)
    }

    pub fn with_retention(max_retained_runs: usize) -> Self {
        Self {
            runs: DashMap::new(),
            max_retained_runs: max_retained_runs.max(1),
        }
    }

    fn with_entry<F>(&self, run_id: Uuid, f: F) -> Result<(), RunError>
    where
        F: FnOnce(&mut RunEntry),
    {
        let mut entry = self.runs.get_mut(&run_id).ok_or(RunError::NotFound(run_id))?;
        f(&mut entry);
        Ok(())
    }

    /// 移除超出保留上限的已结束运行
    fn evict_finished(&self) {
        let mut finished: Vec<(Uuid, chrono::DateTime<Utc>)> = self
            .runs
            .iter()
            .filter(|e| e.snapshot.state.is_terminal())
            .map(|e| (e.snapshot.run_id, e.snapshot.completed_at.unwrap_or(e.snapshot.created_at)))
            .collect();

        if finished.len() <= self.max_retained_runs {
            return;
        }

        finished.sort_by_key(|(_, completed_at)| *completed_at);
        let excess = finished.len() - self.max_retained_runs;
        for (run_id, _) in finished.into_iter().take(excess) {
            self.runs.remove(&run_id);
        }
        tracing::debug!(evicted = excess, "Finished runs evicted");
    }
}

impl Default for InMemoryRunManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RunManagerPort for InMemoryRunManager {
    fn register(&self, run_id: Uuid) -> Result<CancellationToken, RunError> {
        if self.runs.contains_key(&run_id) {
            return Err(RunError::AlreadyExists(run_id));
        }

        let cancel = CancellationToken::new();
        self.runs.insert(
            run_id,
            RunEntry {
                snapshot: RunSnapshot {
                    run_id,
                    state: RunState::Idle,
                    total_segments: 0,
                    finished_segments: 0,
                    error_message: None,
                    result: None,
                    created_at: Utc::now(),
                    completed_at: None,
                },
                cancel: cancel.clone(),
            },
        );

        tracing::debug!(run_id = %run_id, "Run registered");
        Ok(cancel)
    }

    fn set_state(&self, run_id: Uuid, state: RunState) -> Result<(), RunError> {
        self.with_entry(run_id, |entry| {
            let old_state = entry.snapshot.state;
            entry.snapshot.state = state;
            if state.is_terminal() {
                entry.snapshot.completed_at = Some(Utc::now());
            }

            tracing::debug!(
                run_id = %run_id,
                old_state = old_state.as_str(),
                new_state = state.as_str(),
                "Run state changed"
            );
        })?;
        if state.is_terminal() {
            self.evict_finished();
        }
        Ok(())
    }

    fn set_total(&self, run_id: Uuid, total_segments: usize) -> Result<(), RunError> {
        self.with_entry(run_id, |entry| {
            entry.snapshot.total_segments = total_segments;
            entry.snapshot.finished_segments = 0;
        })
    }

    fn record_progress(&self, run_id: Uuid) -> Result<(), RunError> {
        self.with_entry(run_id, |entry| {
            entry.snapshot.finished_segments += 1;
        })
    }

    fn finish(&self, run_id: Uuid, result: BatchResult) -> Result<(), RunError> {
        self.with_entry(run_id, |entry| {
            entry.snapshot.state = result.state;
            entry.snapshot.completed_at = Some(Utc::now());
            entry.snapshot.result = Some(result);
        })?;
        self.evict_finished();
        Ok(())
    }

    fn set_failed(&self, run_id: Uuid, error: String) -> Result<(), RunError> {
        self.with_entry(run_id, |entry| {
            entry.snapshot.state = RunState::Failed;
            entry.snapshot.error_message = Some(error);
            entry.snapshot.completed_at = Some(Utc::now());
        })?;
        self.evict_finished();
        Ok(())
    }

    fn cancel(&self, run_id: Uuid) -> Result<(), RunError> {
        self.with_entry(run_id, |entry| {
            // 已结束的运行保持原状态
            entry.cancel.cancel();
        })
    }

    fn get(&self, run_id: Uuid) -> Option<RunSnapshot> {
        self.runs.get(&run_id).map(|e| e.snapshot.clone())
    }
}
