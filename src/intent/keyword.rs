//! Rule-based intent inferer
//!
//! Stands in for an LLM backend: recognises a handful of household commands
//! and falls back to a `general.chat` action.

use async_trait::async_trait;

use super::{Action, InferenceRequest, IntentInferer, IntentResult, TaskType};
use crate::Result;

/// Keyword rule inferer
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordInferer;

impl KeywordInferer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Apply the rules to a query
    #[must_use]
    pub fn parse(&self, query: &str) -> (TaskType, f32, Vec<Action>) {
        // Reading scene with background music
        if query.contains('灯') && query.contains("巴赫") {
            return (
                TaskType::SmartHome,
                0.95,
                vec![
                    Action::new("smart_home.set_scene")
                        .with_param("scene", "reading")
                        .with_param("room", "living_room"),
                    Action::new("music_player.play")
                        .with_param("artist", "Bach")
                        .with_param("genre", "Classical"),
                ],
            );
        }

        if query.contains("几点") || query.contains("时间") {
            return (TaskType::General, 0.9, vec![Action::new("get_time")]);
        }

        if query.contains("音量") {
            let value = last_number(query).unwrap_or("50").to_string();
            return (
                TaskType::SmartHome,
                0.9,
                vec![
                    Action::new("volume_control")
                        .with_param("action", "set")
                        .with_param("value", value),
                ],
            );
        }

        if query.contains('灯') {
            let action = if query.contains('关') { "off" } else { "on" };
            let target = if query.contains("客厅") { "客厅灯" } else { "灯" };
            return (
                TaskType::SmartHome,
                0.9,
                vec![
                    Action::new("light_control")
                        .with_param("action", action)
                        .with_param("target", target),
                ],
            );
        }

        (
            TaskType::General,
            0.8,
            vec![Action::new("general.chat").with_param("message", query)],
        )
    }
}

#[async_trait]
impl IntentInferer for KeywordInferer {
    async fn infer(&self, request: InferenceRequest<'_>) -> Result<IntentResult> {
        let (task_type, confidence, actions) = self.parse(request.query);

        tracing::debug!(
            ?task_type,
            actions = actions.len(),
            backend = %request.routing.backend,
            "intent inferred"
        );

        Ok(IntentResult {
            task_type,
            confidence,
            actions,
            original_query: request.query.to_string(),
            context: Some(request.context.clone()),
        })
    }
}

/// The final run of ASCII digits, so "从30调到50" yields the target level
fn last_number(query: &str) -> Option<&str> {
    let end = query.rfind(|c: char| c.is_ascii_digit())? + 1;
    let head = query[..end].trim_end_matches(|c: char| c.is_ascii_digit());
    Some(&query[head.len()..end])
}
