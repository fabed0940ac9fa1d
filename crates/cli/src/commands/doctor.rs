use std::sync::Arc;

use resin_core::cache::{ResultCache, DEFAULT_TTL};
use resin_core::config::{AppConfig, LoadOptions};
use resin_core::executor::{InMemoryExecutor, QueryResult};
use resin_core::session::Session;
use resin_core::soql::{render, Limit, TemplateName, TemplateParams};
use serde::Serialize;

use super::{CommandResult, EXIT_CHECK_FAILED, EXIT_CONFIG, EXIT_OK};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = exit_code_for(&report);

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn exit_code_for(report: &DoctorReport) -> u8 {
    let config_failed = report
        .checks
        .iter()
        .any(|check| check.name == "config_validation" && check.status == CheckStatus::Fail);
    match report.overall_status {
        CheckStatus::Pass => EXIT_OK,
        _ if config_failed => EXIT_CONFIG,
        _ => EXIT_CHECK_FAILED,
    }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_oauth_credentials(&config));
            checks.push(check_instance_url(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["oauth_credentials", "instance_url"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }
    checks.push(check_template_catalog());
    checks.push(check_query_cache());

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_oauth_credentials(config: &AppConfig) -> DoctorCheck {
    let sf = &config.salesforce;
    if sf.has_refresh_credentials() {
        return DoctorCheck {
            name: "oauth_credentials",
            status: CheckStatus::Pass,
            details: format!("refresh-token flow configured against {} domain", sf.domain.as_str()),
        };
    }

    let missing = sf.missing_refresh_credentials();
    let mut details = format!("missing {}", missing.join(", "));
    if sf.has_password_credentials() {
        details.push_str("; username/password flow is not supported");
    }
    DoctorCheck { name: "oauth_credentials", status: CheckStatus::Fail, details }
}

fn check_instance_url(config: &AppConfig) -> DoctorCheck {
    match config.salesforce.instance_url.as_deref() {
        None => DoctorCheck {
            name: "instance_url",
            status: CheckStatus::Pass,
            details: "not set; taken from the OAuth token response".to_string(),
        },
        Some(url) if url.starts_with("https://") => DoctorCheck {
            name: "instance_url",
            status: CheckStatus::Pass,
            details: url.to_string(),
        },
        Some(url) => DoctorCheck {
            name: "instance_url",
            status: CheckStatus::Fail,
            details: format!("`{url}` is not https"),
        },
    }
}

fn check_template_catalog() -> DoctorCheck {
    let limit = Limit::DEFAULT;
    let limit_clause = format!("LIMIT {limit}");
    let broken: Vec<&str> = TemplateName::ALL
        .into_iter()
        .filter(|name| {
            let soql = render(*name, &TemplateParams::default(), limit);
            !soql.starts_with("SELECT") || name.is_listing() != soql.ends_with(&limit_clause)
        })
        .map(TemplateName::as_str)
        .collect();

    if broken.is_empty() {
        DoctorCheck {
            name: "template_catalog",
            status: CheckStatus::Pass,
            details: format!(
                "{} donor segments and {} analytics templates render",
                TemplateName::donor_segments().count(),
                TemplateName::analytics().count()
            ),
        }
    } else {
        DoctorCheck {
            name: "template_catalog",
            status: CheckStatus::Fail,
            details: format!("malformed templates: {}", broken.join(", ")),
        }
    }
}

/// Dry run of the read path against an in-memory executor.
fn check_query_cache() -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "query_cache",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let executor = Arc::new(InMemoryExecutor::new().with_default_response(QueryResult::count_only(0)));
    let session = Session::new(executor.clone(), Arc::new(ResultCache::new(DEFAULT_TTL, 1)));
    let result = runtime.block_on(async {
        for _ in 0..2 {
            session
                .query("SELECT COUNT() FROM Contact")
                .await
                .map_err(|error| format!("dry-run query failed: {error}"))?;
        }
        Ok::<(), String>(())
    });

    match result {
        Ok(()) if executor.query_calls() == 1 => DoctorCheck {
            name: "query_cache",
            status: CheckStatus::Pass,
            details: format!("repeat reads served from cache ({}s ttl)", DEFAULT_TTL.as_secs()),
        },
        Ok(()) => DoctorCheck {
            name: "query_cache",
            status: CheckStatus::Fail,
            details: format!("expected 1 executor call, saw {}", executor.query_calls()),
        },
        Err(error) => DoctorCheck { name: "query_cache", status: CheckStatus::Fail, details: error },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
