use resin_core::errors::ValidationError;
use resin_core::session::Session;
use resin_core::soql::Limit;
use serde_json::Value;
use tracing::info;

use super::validation_block;
use crate::format::header;

/// Runs a raw SOQL string. `SELECT COUNT() ...` queries report the count.
pub async fn run_soql(session: &Session, query: &str, limit: Limit) -> String {
    let query = query.trim();
    if query.is_empty() {
        return validation_block(&ValidationError::EmptyQuery);
    }

    let result = match session.query(query).await {
        Ok(result) => result,
        Err(error) => {
            return format!(
                "{}\n- Unable to run SOQL. {error}\n- Query: `{query}`",
                header("Salesforce Error")
            );
        }
    };

    if result.records.is_empty() && is_count_query(query) {
        info!(
            event_name = "tool.run_soql.completed",
            correlation_id = session.correlation_id(),
            total_size = result.total_size,
            "count query completed"
        );
        return format!(
            "{}\n- Count: {}\n- Query: `{query}`",
            header("SOQL Count Result"),
            result.total_size
        );
    }

    let shown: Vec<&Value> = result.records.iter().take(limit.as_usize()).collect();
    let body = serde_json::to_string_pretty(&shown).unwrap_or_else(|_| "[]".to_string());
    info!(
        event_name = "tool.run_soql.completed",
        correlation_id = session.correlation_id(),
        limit = limit.get(),
        total_size = result.total_size,
        shown = shown.len(),
        "query completed"
    );
    format!(
        "{}\n- Records returned: {} of {}\n- Query: `{query}`\n\n{body}",
        header("SOQL Result"),
        shown.len(),
        result.total_size
    )
}

fn is_count_query(query: &str) -> bool {
    query.to_ascii_lowercase().starts_with("select count")
}
