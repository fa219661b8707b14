//! Batch Command Handlers

use std::sync::Arc;

use uuid::Uuid;

use crate::application::commands::batch_commands::*;
use crate::application::error::ApplicationError;
use crate::application::orchestrator::BatchOrchestrator;
use crate::application::ports::{RunManagerPort, RunSnapshot};
use crate::application::settings::SettingsProvider;
use crate::domain::{BatchResult, ProcessingConfig, RunState};

fn load_config(settings: &SettingsProvider) -> Result<Arc<ProcessingConfig>, ApplicationError> {
    let settings = settings.current()?;
    Ok(Arc::new(settings.to_processing_config()?))
}

/// RunBatch Handler - 同步执行批处理
pub struct RunBatchHandler {
    orchestrator: Arc<BatchOrchestrator>,
    run_manager: Arc<dyn RunManagerPort>,
    settings: Arc<SettingsProvider>,
}

impl RunBatchHandler {
    pub fn new(
        orchestrator: Arc<BatchOrchestrator>,
        run_manager: Arc<dyn RunManagerPort>,
        settings: Arc<SettingsProvider>,
    ) -> Self {
        Self {
            orchestrator,
            run_manager,
            settings,
        }
    }

    /// 运行在独立任务中执行，调用方断开后仍会完成并写入缓存与运行状态
    pub async fn handle(&self, cmd: RunBatchCommand) -> Result<BatchResult, ApplicationError> {
        let config = load_config(&self.settings)?;
        let run_id = Uuid::new_v4();
        let cancel = self.run_manager.register(run_id)?;

        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .run(run_id, &cmd.content, config, cmd.indices.as_deref(), cancel)
                .await
        })
        .await
        .map_err(|e| ApplicationError::internal(format!("Batch run task failed: {}", e)))?
    }
}

/// SubmitBatch Handler - 后台执行批处理
///
/// 配置错误同步返回；运行结果通过 QueryRunHandler 查询
pub struct SubmitBatchHandler {
    orchestrator: Arc<BatchOrchestrator>,
    run_manager: Arc<dyn RunManagerPort>,
    settings: Arc<SettingsProvider>,
}

impl SubmitBatchHandler {
    pub fn new(
        orchestrator: Arc<BatchOrchestrator>,
        run_manager: Arc<dyn RunManagerPort>,
        settings: Arc<SettingsProvider>,
    ) -> Self {
        Self {
            orchestrator,
            run_manager,
            settings,
        }
    }

    pub fn handle(&self, cmd: SubmitBatchCommand) -> Result<SubmitBatchResponse, ApplicationError> {
        let config = load_config(&self.settings)?;
        let run_id = Uuid::new_v4();
        let cancel = self.run_manager.register(run_id)?;

        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator
                .run(run_id, &cmd.content, config, cmd.indices.as_deref(), cancel)
                .await
            {
                tracing::warn!(run_id = %run_id, error = %e, "Background batch run failed");
            }
        });

        tracing::info!(run_id = %run_id, "Batch run submitted");

        Ok(SubmitBatchResponse {
            run_id,
            state: RunState::Idle,
        })
    }
}

/// CancelRun Handler - 取消运行
pub struct CancelRunHandler {
    run_manager: Arc<dyn RunManagerPort>,
}

impl CancelRunHandler {
    pub fn new(run_manager: Arc<dyn RunManagerPort>) -> Self {
        Self { run_manager }
    }

    pub fn handle(&self, cmd: CancelRunCommand) -> Result<RunSnapshot, ApplicationError> {
        self.run_manager.cancel(cmd.run_id)?;
        tracing::info!(run_id = %cmd.run_id, "Batch run cancellation requested");

        self.run_manager
            .get(cmd.run_id)
            .ok_or_else(|| ApplicationError::not_found("Run", cmd.run_id))
    }
}

/// QueryRun Handler - 查询运行状态
pub struct QueryRunHandler {
    run_manager: Arc<dyn RunManagerPort>,
}

impl QueryRunHandler {
    pub fn new(run_manager: Arc<dyn RunManagerPort>) -> Self {
        Self { run_manager }
    }

    pub fn handle(&self, cmd: QueryRunCommand) -> Result<RunSnapshot, ApplicationError> {
        self.run_manager
            .get(cmd.run_id)
            .ok_or_else(|| ApplicationError::not_found("Run", cmd.run_id))
    }
}
