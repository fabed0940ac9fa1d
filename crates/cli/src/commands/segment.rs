use resin_core::classify::build_soql_from_criteria;
use resin_core::soql::Limit;
use serde_json::json;

use super::CommandResult;

/// Classifies donor criteria offline and prints the segment and its SOQL.
pub fn run(criteria: &str, limit: i64) -> CommandResult {
    let matched = build_soql_from_criteria(criteria, Limit::clamp(limit));
    let message = if matched.meta.defaulted {
        format!("no segment keyword matched; fell back to {}", matched.meta.segment)
    } else {
        format!("classified as {}", matched.meta.segment)
    };

    CommandResult::success_with(
        "segment",
        message,
        Some(json!({ "meta": matched.meta, "soql": matched.soql })),
    )
}
