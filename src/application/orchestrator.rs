//! Batch Orchestrator - 批处理编排
//!
//! Segmenter → Prompt Builder → Fingerprint → Cache → Completion Client
//!
//! - 片段按序号调度，并发数由 semaphore 控制
//! - 单个片段失败不影响其余片段
//! - 同一次运行中指纹相同的片段只调用一次远程接口
//! - 取消后不再调度新片段，已在途的调用允许完成
//! - 结果始终按片段序号排列

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{CompletionEnginePort, ResponseCachePort, RunManagerPort};
use crate::domain::{
    fingerprint, segment_text, ApiCredentials, BatchResult, CompletionRequest, FailureKind,
    Fingerprint, ProcessingConfig, RunState, SegmentOutcome, SegmentResult,
};

/// 编排器配置
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// 最大并发补全数，1 表示顺序处理
    pub max_concurrent: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_concurrent: 2 }
    }
}

/// 已构建请求的片段
#[derive(Debug, Clone)]
struct PreparedSegment {
    index: usize,
    request: CompletionRequest,
    fingerprint: Fingerprint,
}

/// 片段在结果中的来源
enum Slot {
    /// 自己发起调用，值为任务序号
    Leader(usize),
    /// 复用同指纹片段的结果
    Follower(usize),
}

/// 运行 future 在结束前被丢弃时，停止调度剩余片段并把运行标记为 Cancelled
struct RunGuard {
    run_id: Uuid,
    run_manager: Arc<dyn RunManagerPort>,
    cancel: CancellationToken,
    armed: bool,
}

impl RunGuard {
    fn new(run_id: Uuid, run_manager: Arc<dyn RunManagerPort>, cancel: CancellationToken) -> Self {
        Self {
            run_id,
            run_manager,
            cancel,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.cancel.cancel();
        let _ = self.run_manager.set_state(self.run_id, RunState::Cancelled);
        tracing::warn!(run_id = %self.run_id, "Batch run dropped before finishing, marked cancelled");
    }
}

pub struct BatchOrchestrator {
    config: OrchestratorConfig,
    completion_engine: Arc<dyn CompletionEnginePort>,
    response_cache: Arc<dyn ResponseCachePort>,
    run_manager: Arc<dyn RunManagerPort>,
}

impl BatchOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        completion_engine: Arc<dyn CompletionEnginePort>,
        response_cache: Arc<dyn ResponseCachePort>,
        run_manager: Arc<dyn RunManagerPort>,
    ) -> Self {
        Self {
            config,
            completion_engine,
            response_cache,
            run_manager,
        }
    }

    /// 执行一次批处理
    ///
    /// `only_indices` 为 `Some` 时只处理指定序号的片段（用于重跑失败片段），
    /// 超出范围的序号被忽略。配置错误在任何远程调用之前返回。
    pub async fn run(
        &self,
        run_id: Uuid,
        text: &str,
        config: Arc<ProcessingConfig>,
        only_indices: Option<&[usize]>,
        cancel: CancellationToken,
    ) -> Result<BatchResult, ApplicationError> {
        let guard = RunGuard::new(run_id, self.run_manager.clone(), cancel.clone());
        let _ = self.run_manager.set_state(run_id, RunState::Segmenting);

        let prepared = match Self::prepare(text, &config, only_indices) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!(run_id = %run_id, error = %e, "Batch run rejected");
                let _ = self.run_manager.set_failed(run_id, e.to_string());
                guard.disarm();
                return Err(e);
            }
        };

        let _ = self.run_manager.set_total(run_id, prepared.len());
        let _ = self.run_manager.set_state(run_id, RunState::Processing);

        tracing::info!(
            run_id = %run_id,
            segments = prepared.len(),
            max_concurrent = self.config.max_concurrent,
            model = %config.model,
            "Batch run started"
        );

        let result = self.process_all(run_id, prepared, &config.credentials, cancel).await;

        tracing::info!(
            run_id = %run_id,
            state = result.state.as_str(),
            completed = result.completed_count(),
            failed = result.failed_indices().len(),
            cache_hits = result.cache_hits(),
            "Batch run finished"
        );

        let _ = self.run_manager.finish(run_id, result.clone());
        guard.disarm();
        Ok(result)
    }

    /// 分段并为每个片段构建请求与指纹
    fn prepare(
        text: &str,
        config: &ProcessingConfig,
        only_indices: Option<&[usize]>,
    ) -> Result<Vec<PreparedSegment>, ApplicationError> {
        config.validate()?;

        let segments = segment_text(text, &config.split)?;
        let selected: Option<HashSet<usize>> = only_indices.map(|ids| ids.iter().copied().collect());

        segments
            .iter()
            .filter(|s| selected.as_ref().map_or(true, |ids| ids.contains(&s.index)))
            .map(|segment| -> Result<PreparedSegment, ApplicationError> {
                let request = config.request_for(segment)?;
                Ok(PreparedSegment {
                    index: segment.index,
                    fingerprint: fingerprint(&request),
                    request,
                })
            })
            .collect()
    }

    async fn process_all(
        &self,
        run_id: Uuid,
        prepared: Vec<PreparedSegment>,
        credentials: &ApiCredentials,
        cancel: CancellationToken,
    ) -> BatchResult {
        if prepared.is_empty() {
            return BatchResult::empty(run_id);
        }

        // 同指纹片段只保留第一个发起调用
        let mut leaders: Vec<PreparedSegment> = Vec::new();
        let mut leader_by_fingerprint: HashMap<Fingerprint, usize> = HashMap::new();
        let mut slots: Vec<(usize, Slot)> = Vec::with_capacity(prepared.len());

        for segment in prepared {
            match leader_by_fingerprint.get(&segment.fingerprint) {
                Some(&task) => slots.push((segment.index, Slot::Follower(task))),
                None => {
                    let task = leaders.len();
                    leader_by_fingerprint.insert(segment.fingerprint.clone(), task);
                    slots.push((segment.index, Slot::Leader(task)));
                    leaders.push(segment);
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(leaders.len());

        for segment in leaders {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                tracing::debug!(run_id = %run_id, segment_index = segment.index, "Segment not scheduled");
                handles.push(None);
                continue;
            };

            let completion_engine = self.completion_engine.clone();
            let response_cache = self.response_cache.clone();
            let run_manager = self.run_manager.clone();
            let credentials = credentials.clone();

            handles.push(Some(tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到片段完成

                let outcome = Self::process_segment(
                    run_id,
                    &segment,
                    &credentials,
                    completion_engine,
                    response_cache,
                )
                .await;
                let _ = run_manager.record_progress(run_id);
                outcome
            })));
        }

        let outcomes: Vec<SegmentOutcome> = join_all(handles.into_iter().map(|handle| async move {
            match handle {
                None => SegmentOutcome::Cancelled,
                Some(handle) => handle.await.unwrap_or_else(|e| {
                    tracing::error!(run_id = %run_id, error = %e, "Segment task aborted");
                    SegmentOutcome::Failed {
                        kind: FailureKind::Remote,
                        message: format!("Segment task aborted: {}", e),
                    }
                }),
            }
        }))
        .await;

        let results: Vec<SegmentResult> = slots
            .into_iter()
            .map(|(index, slot)| {
                let outcome = match slot {
                    Slot::Leader(task) => outcomes[task].clone(),
                    Slot::Follower(task) => {
                        if !matches!(outcomes[task], SegmentOutcome::Cancelled) {
                            let _ = self.run_manager.record_progress(run_id);
                        }
                        match &outcomes[task] {
                            SegmentOutcome::Completed { text, .. } => SegmentOutcome::Completed {
                                text: text.clone(),
                                cached: true,
                            },
                            other => other.clone(),
                        }
                    }
                };
                SegmentResult { index, outcome }
            })
            .collect();

        let state = if results
            .iter()
            .any(|r| matches!(r.outcome, SegmentOutcome::Cancelled))
        {
            RunState::Cancelled
        } else {
            RunState::Completed
        };

        BatchResult {
            run_id,
            state,
            results,
        }
    }

    /// 处理单个片段：缓存命中直接返回，否则调用远程接口并写入缓存
    async fn process_segment(
        run_id: Uuid,
        segment: &PreparedSegment,
        credentials: &ApiCredentials,
        completion_engine: Arc<dyn CompletionEnginePort>,
        response_cache: Arc<dyn ResponseCachePort>,
    ) -> SegmentOutcome {
        match response_cache.get(&segment.fingerprint).await {
            Ok(Some(text)) => {
                tracing::debug!(
                    run_id = %run_id,
                    segment_index = segment.index,
                    fingerprint = %segment.fingerprint,
                    "Cache hit"
                );
                return SegmentOutcome::Completed { text, cached: true };
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    run_id = %run_id,
                    segment_index = segment.index,
                    error = %e,
                    "Cache lookup failed, treating as miss"
                );
            }
        }

        match completion_engine.complete(&segment.request, credentials).await {
            Ok(text) => {
                if let Err(e) = response_cache.put(&segment.fingerprint, &text).await {
                    tracing::warn!(
                        run_id = %run_id,
                        segment_index = segment.index,
                        error = %e,
                        "Failed to cache completion"
                    );
                }
                tracing::debug!(
                    run_id = %run_id,
                    segment_index = segment.index,
                    output_len = text.len(),
                    "Segment completed"
                );
                SegmentOutcome::Completed {
                    text,
                    cached: false,
                }
            }
            Err(e) => {
                tracing::warn!(
                    run_id = %run_id,
                    segment_index = segment.index,
                    error = %e,
                    "Segment completion failed"
                );
                SegmentOutcome::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    use crate::application::ports::{CacheError, CacheStats, CompletionError};
    use crate::domain::SplitStrategy;
    use crate::infrastructure::adapters::{
        FakeCompletionClient, FakeCompletionClientConfig, HttpCompletionClient,
        HttpCompletionClientConfig,
    };
    use crate::infrastructure::memory::InMemoryRunManager;
    use crate::infrastructure::persistence::sled::SledResponseCache;

    fn processing_config(user_prompt: &str, system_prompt: &str) -> Arc<ProcessingConfig> {
        Arc::new(ProcessingConfig {
            split: SplitStrategy::default(),
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 1000,
            temperature: 0.1,
            credentials: ApiCredentials::new("sk-test", "http://localhost"),
        })
    }

    fn orchestrator(
        engine: Arc<dyn CompletionEnginePort>,
        cache: Arc<dyn ResponseCachePort>,
        max_concurrent: usize,
    ) -> (BatchOrchestrator, Arc<InMemoryRunManager>) {
        let run_manager = Arc::new(InMemoryRunManager::new());
        let orchestrator = BatchOrchestrator::new(
            OrchestratorConfig { max_concurrent },
            engine,
            cache,
            run_manager.clone(),
        );
        (orchestrator, run_manager)
    }

    async fn start(
        orchestrator: &BatchOrchestrator,
        run_manager: &InMemoryRunManager,
        text: &str,
        config: Arc<ProcessingConfig>,
        only_indices: Option<&[usize]>,
    ) -> Result<BatchResult, ApplicationError> {
        let run_id = Uuid::new_v4();
        let cancel = run_manager.register(run_id).unwrap();
        orchestrator.run(run_id, text, config, only_indices, cancel).await
    }

    /// 总是失败的缓存
    struct BrokenCache;

    #[async_trait]
    impl ResponseCachePort for BrokenCache {
        async fn get(&self, _fingerprint: &Fingerprint) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("disk gone".to_string()))
        }

        async fn put(&self, _fingerprint: &Fingerprint, _text: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("disk gone".to_string()))
        }

        async fn stats(&self) -> CacheStats {
            CacheStats::default()
        }
    }

    /// 第一次调用时取消运行
    struct CancellingEngine {
        token: CancellationToken,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionEnginePort for CancellingEngine {
        async fn complete(
            &self,
            request: &CompletionRequest,
            _credentials: &ApiCredentials,
        ) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.token.cancel();
            Ok(request.user_prompt.clone())
        }
    }

    #[tokio::test]
    async fn test_echo_run_preserves_order() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig::default()));
        let (orchestrator, run_manager) = orchestrator(engine.clone(), cache, 3);

        let result = start(
            &orchestrator,
            &run_manager,
            "a\nb\nc",
            processing_config("Echo: {$content}", ""),
            None,
        )
        .await
        .unwrap();

        assert_eq!(result.state, RunState::Completed);
        let texts: Vec<&str> = result.results.iter().filter_map(|r| r.outcome.text()).collect();
        assert_eq!(texts, vec!["Echo: a", "Echo: b", "Echo: c"]);
        let indices: Vec<usize> = result.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(engine.call_count(), 3);

        let snapshot = run_manager.get(result.run_id).unwrap();
        assert_eq!(snapshot.state, RunState::Completed);
        assert_eq!(snapshot.finished_segments, 3);
    }

    #[tokio::test]
    async fn test_second_run_is_served_from_cache() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig::default()));
        let (orchestrator, run_manager) = orchestrator(engine.clone(), cache, 2);
        let config = processing_config("Summarize: {$content}", "be brief");
        let text = "one\ntwo\nthree\nfour";

        let first = start(&orchestrator, &run_manager, text, config.clone(), None)
            .await
            .unwrap();
        assert_eq!(engine.call_count(), 4);
        assert_eq!(first.cache_hits(), 0);

        let second = start(&orchestrator, &run_manager, text, config, None)
            .await
            .unwrap();
        assert_eq!(engine.call_count(), 4);
        assert_eq!(second.cache_hits(), 4);
        assert_eq!(first.joined_output("\n"), second.joined_output("\n"));
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig {
            fail_texts: vec!["s2".to_string()],
            ..Default::default()
        }));
        let (orchestrator, run_manager) = orchestrator(engine.clone(), cache, 2);

        let result = start(
            &orchestrator,
            &run_manager,
            "s0\ns1\ns2\ns3\ns4",
            processing_config("{$content}", ""),
            None,
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 5);
        assert_eq!(result.failed_indices(), vec![2]);
        assert_eq!(result.completed_count(), 4);
        assert_eq!(result.state, RunState::Completed);
        assert!(matches!(
            result.results[2].outcome,
            SegmentOutcome::Failed {
                kind: FailureKind::Remote,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_retry_failed_subset() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let failing = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig {
            fail_texts: vec!["s1".to_string()],
            ..Default::default()
        }));
        let (first_pass, run_manager) = orchestrator(failing, cache.clone(), 1);
        let config = processing_config("{$content}", "");
        let text = "s0\ns1\ns2";

        let first = start(&first_pass, &run_manager, text, config.clone(), None)
            .await
            .unwrap();
        assert_eq!(first.failed_indices(), vec![1]);

        let healthy = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig::default()));
        let (second_pass, run_manager) = orchestrator(healthy.clone(), cache, 1);
        let retry = start(
            &second_pass,
            &run_manager,
            text,
            config,
            Some(&first.failed_indices()),
        )
        .await
        .unwrap();

        assert_eq!(retry.len(), 1);
        assert_eq!(retry.results[0].index, 1);
        assert_eq!(retry.results[0].outcome.text(), Some("s1"));
        assert_eq!(healthy.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_prompts_rejected_before_any_call() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig::default()));
        let (orchestrator, run_manager) = orchestrator(engine.clone(), cache, 2);

        let run_id = Uuid::new_v4();
        let cancel = run_manager.register(run_id).unwrap();
        let err = orchestrator
            .run(run_id, "a\nb", processing_config("", ""), None, cancel)
            .await
            .unwrap_err();

        assert!(err.is_config());
        assert_eq!(engine.call_count(), 0);
        assert_eq!(run_manager.get(run_id).unwrap().state, RunState::Failed);
    }

    #[tokio::test]
    async fn test_invalid_pattern_fails_run() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig::default()));
        let (orchestrator, run_manager) = orchestrator(engine.clone(), cache, 2);

        let mut config = (*processing_config("{$content}", "")).clone();
        config.split = SplitStrategy::ByPattern {
            pattern: "[unclosed".to_string(),
        };

        let err = start(&orchestrator, &run_manager, "x", Arc::new(config), None)
            .await
            .unwrap_err();
        assert!(err.is_config());
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_is_noop() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig::default()));
        let (orchestrator, run_manager) = orchestrator(engine.clone(), cache, 2);

        let result = start(
            &orchestrator,
            &run_manager,
            "",
            processing_config("{$content}", ""),
            None,
        )
        .await
        .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.state, RunState::Completed);
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_errors_degrade_to_remote_calls() {
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig::default()));
        let (orchestrator, run_manager) = orchestrator(engine.clone(), Arc::new(BrokenCache), 2);

        let result = start(
            &orchestrator,
            &run_manager,
            "x\ny",
            processing_config("{$content}", ""),
            None,
        )
        .await
        .unwrap();

        assert_eq!(result.completed_count(), 2);
        assert_eq!(engine.call_count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_segments_call_once() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig::default()));
        let (orchestrator, run_manager) = orchestrator(engine.clone(), cache, 4);

        let result = start(
            &orchestrator,
            &run_manager,
            "same\nother\nsame",
            processing_config("{$content}", ""),
            None,
        )
        .await
        .unwrap();

        assert_eq!(engine.call_count(), 2);
        assert_eq!(result.results[2].outcome, SegmentOutcome::Completed {
            text: "same".to_string(),
            cached: true,
        });
        assert_eq!(run_manager.get(result.run_id).unwrap().finished_segments, 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_schedules_nothing() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig::default()));
        let (orchestrator, run_manager) = orchestrator(engine.clone(), cache, 2);

        let run_id = Uuid::new_v4();
        let cancel = run_manager.register(run_id).unwrap();
        run_manager.cancel(run_id).unwrap();

        let result = orchestrator
            .run(run_id, "a\nb\nc", processing_config("{$content}", ""), None, cancel)
            .await
            .unwrap();

        assert_eq!(result.state, RunState::Cancelled);
        assert!(result
            .results
            .iter()
            .all(|r| r.outcome == SegmentOutcome::Cancelled));
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_lets_in_flight_finish() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let run_manager = Arc::new(InMemoryRunManager::new());
        let run_id = Uuid::new_v4();
        let cancel = run_manager.register(run_id).unwrap();
        let engine = Arc::new(CancellingEngine {
            token: cancel.clone(),
            calls: AtomicUsize::new(0),
        });
        let orchestrator = BatchOrchestrator::new(
            OrchestratorConfig { max_concurrent: 1 },
            engine.clone(),
            cache,
            run_manager.clone(),
        );

        let result = orchestrator
            .run(run_id, "a\nb\nc", processing_config("{$content}", ""), None, cancel)
            .await
            .unwrap();

        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.results[0].outcome.text(), Some("a"));
        assert_eq!(result.results[1].outcome, SegmentOutcome::Cancelled);
        assert_eq!(result.results[2].outcome, SegmentOutcome::Cancelled);
        assert_eq!(result.state, RunState::Cancelled);
        assert_eq!(result.unfinished_indices(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_dropped_run_ends_cancelled() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let engine = Arc::new(FakeCompletionClient::new(FakeCompletionClientConfig {
            latency_ms: 50,
            ..Default::default()
        }));
        let (orchestrator, run_manager) = orchestrator(engine.clone(), cache, 1);

        let run_id = Uuid::new_v4();
        let cancel = run_manager.register(run_id).unwrap();
        let run = orchestrator.run(
            run_id,
            "a\nb\nc\nd",
            processing_config("{$content}", ""),
            None,
            cancel.clone(),
        );
        assert!(tokio::time::timeout(std::time::Duration::from_millis(70), run)
            .await
            .is_err());

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        let snapshot = run_manager.get(run_id).unwrap();
        assert_eq!(snapshot.state, RunState::Cancelled);
        assert!(snapshot.completed_at.is_some());
        assert!(cancel.is_cancelled());
        assert!(engine.call_count() < 4);
    }

    #[tokio::test]
    async fn test_timed_out_segment_fails_as_remote_and_batch_continues() {
        use mockito::{Matcher, Server};
        use std::io::Write;

        let mut server = Server::new_async().await;
        let _slow = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex(r#""content":"slow""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_chunked_body(|w| {
                w.write_all(br#"{"choices":["#)?;
                w.flush()?;
                std::thread::sleep(std::time::Duration::from_millis(2500));
                w.write_all(br#"{"message":{"content":"late"}}]}"#)
            })
            .create_async()
            .await;
        let _fast = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex(r#""content":"fast""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"quick"}}]}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let cache = Arc::new(SledResponseCache::open(dir.path().join("c.sled")).unwrap());
        let engine = Arc::new(
            HttpCompletionClient::new(HttpCompletionClientConfig::default().with_timeout(1))
                .unwrap(),
        );
        let (orchestrator, run_manager) = orchestrator(engine, cache, 2);

        let mut config = (*processing_config("{$content}", "")).clone();
        config.credentials = ApiCredentials::new("sk-test", server.url());

        let result = start(&orchestrator, &run_manager, "slow\nfast", Arc::new(config), None)
            .await
            .unwrap();

        assert_eq!(result.state, RunState::Completed);
        assert_eq!(result.failed_indices(), vec![0]);
        assert!(matches!(
            result.results[0].outcome,
            SegmentOutcome::Failed {
                kind: FailureKind::Remote,
                ..
            }
        ));
        assert_eq!(result.results[1].outcome.text(), Some("quick"));
    }
}
