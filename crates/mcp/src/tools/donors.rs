use resin_core::classify::{build_soql_from_criteria, QueryMeta};
use resin_core::session::Session;
use resin_core::soql::Limit;
use serde_json::Value;
use tracing::info;

use crate::format::{fmt_currency, fmt_date, header, number_field, text_field};

const PRIORITY_HINT: &str = "Prioritize donors with higher lifetime giving and recent engagement.";
const NEXT_STEPS: [&str; 2] = [
    "Create follow-up tasks for top 5 donors.",
    "Draft personalized outreach acknowledging specific past gifts.",
];

/// Classifies `criteria` into a donor segment, runs it, and renders the list.
pub async fn query_donors(session: &Session, criteria: &str, limit: Limit) -> String {
    let segment = build_soql_from_criteria(criteria, limit);
    let soql = segment.soql.as_str();

    let result = match session.query(soql).await {
        Ok(result) => result,
        Err(error) => {
            return format!(
                "{}\n- Query: `{soql}`\n- Message: {error}\n- Suggestion: Check field names and ensure NPSP is installed.",
                header("SOQL Error")
            );
        }
    };

    let records: Vec<&Value> = result.records.iter().take(limit.as_usize()).collect();
    info!(
        event_name = "tool.query_donors.completed",
        correlation_id = session.correlation_id(),
        segment = segment.meta.segment.as_str(),
        limit = limit.get(),
        total_size = result.total_size,
        defaulted = segment.meta.defaulted,
        "donor query completed"
    );

    let mut lines = vec![header("Donor Results")];
    lines.extend(records.iter().flat_map(|record| donor_lines(record)));

    lines.push(String::new());
    lines.push(header("AI Insights"));
    lines.push(format!("- Segment: {}", describe(&segment.meta)));
    lines.push(format!("- {PRIORITY_HINT}"));

    lines.push(String::new());
    lines.push(header("Next Steps"));
    lines.extend(NEXT_STEPS.iter().map(|step| format!("- {step}")));

    lines.join("\n")
}

fn donor_lines(record: &Value) -> Vec<String> {
    let name = text_field(record, &["Name"])
        .or_else(|| record.get("Contact").and_then(|contact| text_field(contact, &["Name"])))
        .unwrap_or("Unknown");

    let mut lines = vec![format!("- Name: {name}")];
    if let Some(email) = text_field(record, &["Email"]) {
        lines.push(format!("  - Email: {email}"));
    }
    if let Some(total) = number_field(record, &["LifetimeGiving", "total"]) {
        lines.push(format!("  - Lifetime Giving: {}", fmt_currency(Some(total))));
    }
    if let Some(last_gift) = text_field(record, &["LastGiftDate", "lastGiftDate"]) {
        lines.push(format!("  - Last Gift: {}", fmt_date(last_gift)));
    }
    lines
}

/// `major_donors_over (amount $10,000.00, limit 25)`
fn describe(meta: &QueryMeta) -> String {
    let mut details = Vec::new();
    if let Some(months) = meta.months {
        details.push(format!("{months} months"));
    }
    if let Some(amount) = meta.amount {
        details.push(format!("amount {}", fmt_currency(Some(amount))));
    }
    if let Some(min_amount) = meta.min_amount {
        details.push(format!("min lifetime {}", fmt_currency(Some(min_amount))));
    }
    details.push(format!("limit {}", meta.limit));
    if meta.defaulted {
        details.push("fallback".to_string());
    }
    format!("{} ({})", meta.segment.as_str(), details.join(", "))
}
