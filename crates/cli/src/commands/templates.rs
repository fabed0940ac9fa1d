use std::str::FromStr;

use resin_core::soql::{render, Limit, TemplateName, TemplateParams};
use serde_json::json;

use super::{CommandResult, EXIT_INVALID_ARGUMENTS};

/// Lists every template, or renders one with its defaults.
pub fn run(name: Option<&str>, limit: i64) -> CommandResult {
    let Some(name) = name else {
        let donor: Vec<&str> = TemplateName::donor_segments().map(TemplateName::as_str).collect();
        let analytics: Vec<&str> = TemplateName::analytics().map(TemplateName::as_str).collect();
        return CommandResult::success_with(
            "templates",
            format!("{} templates available", TemplateName::ALL.len()),
            Some(json!({ "donor_segments": donor, "analytics": analytics })),
        );
    };

    let template = match TemplateName::from_str(name) {
        Ok(template) => template,
        Err(error) => {
            return CommandResult::failure(
                "templates",
                "invalid_arguments",
                error.to_string(),
                EXIT_INVALID_ARGUMENTS,
            );
        }
    };

    let limit = Limit::clamp(limit);
    let soql = render(template, &TemplateParams::default(), limit);
    CommandResult::success_with(
        "templates",
        format!("rendered {template} with defaults"),
        Some(json!({
            "name": template,
            "listing": template.is_listing(),
            "limit": template.is_listing().then_some(limit),
            "soql": soql,
        })),
    )
}
