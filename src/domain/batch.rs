//! Batch Result - 批处理结果

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Segmenting,
    Processing,
    Completed,
    /// 分段或配置错误，未发起任何远程调用
    Failed,
    /// 取消后不再调度新的片段
    Cancelled,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Segmenting => "segmenting",
            RunState::Processing => "processing",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
            RunState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Failed | RunState::Cancelled
        )
    }
}

/// 片段失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Remote,
    Auth,
    RateLimited,
    MalformedResponse,
}

/// 单个片段的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentOutcome {
    Completed { text: String, cached: bool },
    Failed { kind: FailureKind, message: String },
    Cancelled,
}

impl SegmentOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SegmentOutcome::Completed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SegmentOutcome::Failed { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            SegmentOutcome::Completed { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub index: usize,
    pub outcome: SegmentOutcome,
}

/// 批处理结果，按片段序号排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub run_id: Uuid,
    pub state: RunState,
    pub results: Vec<SegmentResult>,
}

impl BatchResult {
    pub fn empty(run_id: Uuid) -> Self {
        Self {
            run_id,
            state: RunState::Completed,
            results: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// 失败片段序号，调用方可据此重跑
    pub fn failed_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| r.outcome.is_failed())
            .map(|r| r.index)
            .collect()
    }

    /// 失败或被取消的片段序号
    pub fn unfinished_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| !r.outcome.is_completed())
            .map(|r| r.index)
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_completed()).count()
    }

    pub fn cache_hits(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, SegmentOutcome::Completed { cached: true, .. }))
            .count()
    }

    /// 拼接所有成功片段的输出
    pub fn joined_output(&self, separator: &str) -> String {
        self.results
            .iter()
            .filter_map(|r| r.outcome.text())
            .collect::<Vec<_>>()
            .join(separator)
    }
}
