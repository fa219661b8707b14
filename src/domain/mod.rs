//! Domain Layer - 领域层
//!
//! 批处理核心：分段、提示词渲染、请求指纹、批处理结果

mod batch;
mod errors;
mod fingerprint;
mod processing;
mod prompt;
mod segmenter;

pub use batch::{BatchResult, FailureKind, RunState, SegmentOutcome, SegmentResult};
pub use errors::{ConfigurationError, PromptError, SegmentError};
pub use fingerprint::{fingerprint, fingerprint_fields, Fingerprint};
pub use processing::{mask_secret, ApiCredentials, CompletionRequest, ProcessingConfig};
pub use prompt::{build_prompts, validate_templates, PromptPair, CONTENT_PLACEHOLDER};
pub use segmenter::{
    segment_text, Segment, SplitStrategy, SplitType, DEFAULT_LINES_PER_SEGMENT,
};
