//! Folding action outcomes into one reply

use serde::{Deserialize, Serialize};

use crate::tools::ActionOutcome;

/// Reply when there was nothing to do
pub const ACKNOWLEDGEMENT: &str = "好的，已经完成了。";

/// Reply when handlers succeeded without saying anything
pub const GENERIC_SUCCESS: &str = "已经帮您处理好了。";

/// Combined result of one dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Outcomes in action order
    pub outputs: Vec<ActionOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    /// Natural-language reply, never empty
    pub message: String,
}

/// Summarize outcomes into an [`Aggregate`]
///
/// Successful handlers' `message` fields are joined in action order. Failures
/// are reported as a count.
#[must_use]
pub fn aggregate(outcomes: Vec<ActionOutcome>) -> Aggregate {
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    let failed = outcomes.len() - succeeded;
    let message = compose_message(&outcomes, failed);

    Aggregate {
        outputs: outcomes,
        succeeded,
        failed,
        message,
    }
}

fn compose_message(outcomes: &[ActionOutcome], failed: usize) -> String {
    if outcomes.is_empty() {
        return ACKNOWLEDGEMENT.to_string();
    }

    let messages: Vec<&str> = outcomes
        .iter()
        .filter_map(ActionOutcome::output)
        .filter_map(|output| output.get("message").and_then(serde_json::Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .collect();

    let mut message = if messages.is_empty() {
        if failed == outcomes.len() {
            String::new()
        } else {
            GENERIC_SUCCESS.to_string()
        }
    } else {
        format!("{}。", messages.join("，"))
    };

    if failed > 0 {
        message.push_str(&format!("有 {failed} 项操作未能完成。"));
    }

    message
}
