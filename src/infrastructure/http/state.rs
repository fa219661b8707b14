//! Application State
//!
//! 包含所有 Command Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CancelRunHandler, GetSettingsHandler, PreviewSegmentsHandler, QueryRunHandler,
    RunBatchHandler, SubmitBatchHandler, UpdateSettingsHandler,
    // Orchestration
    BatchOrchestrator, SettingsProvider,
    // Ports
    CompletionEnginePort, ResponseCachePort, RunManagerPort, TokenCounterPort,
};

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub completion_engine: Arc<dyn CompletionEnginePort>,
    pub response_cache: Arc<dyn ResponseCachePort>,
    pub settings: Arc<SettingsProvider>,

    // ========== Command Handlers ==========
    pub run_batch_handler: RunBatchHandler,
    pub submit_batch_handler: SubmitBatchHandler,
    pub cancel_run_handler: CancelRunHandler,
    pub query_run_handler: QueryRunHandler,
    pub preview_segments_handler: PreviewSegmentsHandler,
    pub get_settings_handler: GetSettingsHandler,
    pub update_settings_handler: UpdateSettingsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        orchestrator: Arc<BatchOrchestrator>,
        completion_engine: Arc<dyn CompletionEnginePort>,
        response_cache: Arc<dyn ResponseCachePort>,
        run_manager: Arc<dyn RunManagerPort>,
        settings: Arc<SettingsProvider>,
        token_counter: Arc<dyn TokenCounterPort>,
        token_counter_concurrency: usize,
    ) -> Self {
        Self {
            // Ports
            completion_engine,
            response_cache,
            settings: settings.clone(),

            // Command handlers
            run_batch_handler: RunBatchHandler::new(
                orchestrator.clone(),
                run_manager.clone(),
                settings.clone(),
            ),
            submit_batch_handler: SubmitBatchHandler::new(
                orchestrator,
                run_manager.clone(),
                settings.clone(),
            ),
            cancel_run_handler: CancelRunHandler::new(run_manager.clone()),
            query_run_handler: QueryRunHandler::new(run_manager),
            preview_segments_handler: PreviewSegmentsHandler::new(
                settings.clone(),
                token_counter,
                token_counter_concurrency,
            ),
            get_settings_handler: GetSettingsHandler::new(settings.clone()),
            update_settings_handler: UpdateSettingsHandler::new(settings),
        }
    }
}
