use resin_core::classify::nl_to_soql;
use resin_core::soql::Limit;
use serde_json::json;

use super::CommandResult;

pub fn run(question: &str, limit: i64) -> CommandResult {
    let matched = nl_to_soql(question, Limit::clamp(limit));

    CommandResult::success_with(
        "ask",
        matched.explanation.clone(),
        Some(json!({
            "intent": matched.intent,
            "explanation": matched.explanation,
            "soql": matched.soql,
        })),
    )
}
