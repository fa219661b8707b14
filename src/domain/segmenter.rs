//! 文本分割器
//!
//! 将长文本按配置的策略切分为有序片段：按行、按长度、按正则分隔符

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::SegmentError;

/// 默认每段行数
pub const DEFAULT_LINES_PER_SEGMENT: usize = 1;

/// 分割后的文本片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// 片段序号（决定输出顺序）
    pub index: usize,
    /// 片段内容
    pub text: String,
}

/// 分割策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitStrategy {
    /// 按换行分隔，每 `lines_per_segment` 个非空行组成一段
    ByLine { lines_per_segment: usize },
    /// 按字符数分隔（Unicode 标量值），最后一段可以更短
    ByLength { max_chars: usize },
    /// 按正则分隔符分隔，分隔符本身被丢弃
    ByPattern { pattern: String },
}

impl Default for SplitStrategy {
    fn default() -> Self {
        Self::ByLine {
            lines_per_segment: DEFAULT_LINES_PER_SEGMENT,
        }
    }
}

/// 持久化设置中的分隔方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    /// 按换行分隔
    #[default]
    Newline,
    /// 按长度分隔
    Length,
    /// 按特殊字符（正则）分隔
    Char,
}

impl SplitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitType::Newline => "newline",
            SplitType::Length => "length",
            SplitType::Char => "char",
        }
    }
}

impl SplitStrategy {
    /// 由设置字段构造分割策略
    pub fn from_settings(
        split_type: SplitType,
        split_length: usize,
        split_char: &str,
        lines_per_segment: usize,
    ) -> Self {
        match split_type {
            SplitType::Newline => Self::ByLine { lines_per_segment },
            SplitType::Length => Self::ByLength {
                max_chars: split_length,
            },
            SplitType::Char => Self::ByPattern {
                pattern: split_char.to_string(),
            },
        }
    }

    /// 检查策略参数，正则在这里编译一次
    pub fn validate(&self) -> Result<(), SegmentError> {
        match self {
            Self::ByLine { lines_per_segment } if *lines_per_segment == 0 => {
                Err(SegmentError::InvalidLineCount)
            }
            Self::ByLength { max_chars } if *max_chars == 0 => Err(SegmentError::InvalidLength),
            Self::ByPattern { pattern } => compile_pattern(pattern).map(|_| ()),
            _ => Ok(()),
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, SegmentError> {
    if pattern.is_empty() {
        return Err(SegmentError::EmptyPattern);
    }
    Regex::new(pattern).map_err(|e| SegmentError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// 按行分割，空白行被丢弃
fn split_by_lines(text: &str, lines_per_segment: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    lines
        .chunks(lines_per_segment)
        .map(|group| group.join("\n"))
        .collect()
}

/// 按字符数分割，不会切断多字节字符
fn split_by_length(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::with_capacity(text.len() / max_chars + 1);
    let mut current = String::new();
    let mut char_count = 0;

    for ch in text.chars() {
        current.push(ch);
        char_count += 1;

        if char_count == max_chars {
            chunks.push(std::mem::take(&mut current));
            char_count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// 按正则分隔符分割，丢弃只含空白的片段
fn split_by_pattern(text: &str, regex: &Regex) -> Vec<String> {
    regex
        .split(text)
        .filter(|piece| !piece.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// 对文本进行分段
///
/// - 空输入返回空列表
/// - 正则无匹配时整段文本作为唯一片段
/// - 输出顺序与原文顺序一致
pub fn segment_text(text: &str, strategy: &SplitStrategy) -> Result<Vec<Segment>, SegmentError> {
    strategy.validate()?;

    if text.is_empty() {
        return Ok(Vec::new());
    }

    let pieces = match strategy {
        SplitStrategy::ByLine { lines_per_segment } => split_by_lines(text, *lines_per_segment),
        SplitStrategy::ByLength { max_chars } => split_by_length(text, *max_chars),
        SplitStrategy::ByPattern { pattern } => split_by_pattern(text, &compile_pattern(pattern)?),
    };

    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| Segment { index, text })
        .collect())
}
