//! Segment Preview Handler

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};

use crate::application::commands::batch_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::TokenCounterPort;
use crate::application::settings::SettingsProvider;
use crate::domain::segment_text;

/// PreviewSegments Handler - 按当前设置分段并估算 token 数
///
/// 对 token 计数服务的并发请求数不超过 `max_concurrent`
pub struct PreviewSegmentsHandler {
    settings: Arc<SettingsProvider>,
    token_counter: Arc<dyn TokenCounterPort>,
    max_concurrent: usize,
}

impl PreviewSegmentsHandler {
    pub fn new(
        settings: Arc<SettingsProvider>,
        token_counter: Arc<dyn TokenCounterPort>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            settings,
            token_counter,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub async fn handle(
        &self,
        cmd: PreviewSegmentsCommand,
    ) -> Result<PreviewSegmentsResponse, ApplicationError> {
        let config = self.settings.current()?.to_processing_config()?;
        let segments = segment_text(&cmd.content, &config.split)?;

        let total_tokens = if cmd.content.is_empty() {
            0
        } else {
            self.token_counter.count(&cmd.content).await
        };
        let count_futures: Vec<_> = segments
            .iter()
            .map(|s| self.token_counter.count(&s.text))
            .collect();
        let token_counts: Vec<u64> = stream::iter(count_futures)
            .buffered(self.max_concurrent)
            .collect()
            .await;

        Ok(PreviewSegmentsResponse {
            total_segments: segments.len(),
            total_tokens,
            segments: segments
                .into_iter()
                .zip(token_counts)
                .map(|(s, token_count)| SegmentPreview {
                    index: s.index,
                    char_count: s.text.chars().count(),
                    token_count,
                    text: s.text,
                })
                .collect(),
        })
    }
}
