//! Tool handlers behind the MCP surface.
//!
//! Each handler returns the text block shown to the caller. Executor failures
//! are rendered into that block rather than raised, so an agent loop can read
//! and react to them.

pub mod donors;
pub mod records;
pub mod soql;

use resin_core::errors::ValidationError;
use resin_core::soql::Limit;
use tracing::warn;

use crate::format::header;

/// Tool names in registration order.
pub const ALL_TOOL_NAMES: &[&str] = &["run_soql", "create_record", "update_record", "query_donors"];

/// Clamps a caller-supplied limit into range, falling back to `default`.
pub fn resolve_limit(tool: &'static str, requested: Option<i64>, default: Limit) -> Limit {
    let Some(requested) = requested else {
        return default;
    };
    let limit = Limit::clamp(requested);
    if i64::from(limit.get()) != requested {
        warn!(
            event_name = "tool.limit.clamped",
            tool,
            requested,
            limit = limit.get(),
            "limit out of range, clamped"
        );
    }
    limit
}

pub(crate) fn validation_block(error: &ValidationError) -> String {
    format!("{}\n- {error}", header("Validation Error"))
}

#[cfg(test)]
mod tests {
    use resin_core::soql::Limit;

    use super::resolve_limit;

    #[test]
    fn limits_are_clamped_into_range() {
        assert_eq!(resolve_limit("run_soql", None, Limit::DEFAULT).get(), 25);
        assert_eq!(resolve_limit("run_soql", Some(0), Limit::DEFAULT).get(), 1);
        assert_eq!(resolve_limit("run_soql", Some(101), Limit::DEFAULT).get(), 100);
        assert_eq!(resolve_limit("run_soql", Some(-5), Limit::DEFAULT).get(), 1);
        assert_eq!(resolve_limit("run_soql", Some(40), Limit::DEFAULT).get(), 40);
    }
}
