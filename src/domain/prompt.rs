//! Prompt Builder - 提示词渲染

use serde::Serialize;

use super::errors::PromptError;

/// 用户提示词中的内容占位符
pub const CONTENT_PLACEHOLDER: &str = "{$content}";

/// 渲染后的提示词
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptPair {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// 检查模板：system 与 user 不能同时为空
pub fn validate_templates(user_template: &str, system_template: &str) -> Result<(), PromptError> {
    if user_template.trim().is_empty() && system_template.trim().is_empty() {
        return Err(PromptError::EmptyPrompts);
    }
    Ok(())
}

/// 为片段渲染提示词
///
/// user 模板中的每个 `{$content}` 都被替换为片段内容，system 模板原样传递
pub fn build_prompts(
    segment_text: &str,
    user_template: &str,
    system_template: &str,
) -> Result<PromptPair, PromptError> {
    validate_templates(user_template, system_template)?;

    Ok(PromptPair {
        system_prompt: system_template.to_string(),
        user_prompt: user_template.replace(CONTENT_PLACEHOLDER, segment_text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_template() {
        let rendered: Vec<String> = ["a", "b", "c"]
            .iter()
            .map(|t| build_prompts(t, "Echo: {$content}", "").unwrap().user_prompt)
            .collect();
        assert_eq!(rendered, vec!["Echo: a", "Echo: b", "Echo: c"]);
    }

    #[test]
    fn test_replaces_every_placeholder() {
        let pair = build_prompts("x", "{$content} and {$content}", "sys").unwrap();
        assert_eq!(pair.user_prompt, "x and x");
        assert_eq!(pair.system_prompt, "sys");
    }

    #[test]
    fn test_system_prompt_passed_through() {
        let pair = build_prompts("text", "", "Translate {$content}").unwrap();
        assert_eq!(pair.system_prompt, "Translate {$content}");
        assert_eq!(pair.user_prompt, "");
    }

    #[test]
    fn test_both_empty_is_error() {
        assert_eq!(build_prompts("text", "", ""), Err(PromptError::EmptyPrompts));
        assert_eq!(build_prompts("text", "  ", "\n"), Err(PromptError::EmptyPrompts));
    }
}
