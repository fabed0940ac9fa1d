use std::env;
use std::sync::{Mutex, OnceLock};

use resin_cli::commands::{ask, config, doctor, segment, templates};
use serde_json::Value;

#[test]
fn config_reports_env_sources_and_redacts_secrets() {
    with_env(
        &[
            ("SF_CLIENT_ID", "3MVG9connectedapp"),
            ("SF_CLIENT_SECRET", "super-secret"),
            ("RESIN_SALESFORCE_REFRESH_TOKEN", "5Aep861refresh"),
            ("RESIN_QUERY_DEFAULT_LIMIT", "40"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0, "expected config inspection success");

            let output = &result.output;
            assert!(output.contains("- salesforce.client_id = 3MVG9c*** (source: env (SF_CLIENT_ID))"));
            assert!(output.contains(
                "- salesforce.refresh_token = <redacted> (source: env (RESIN_SALESFORCE_REFRESH_TOKEN))"
            ));
            assert!(output.contains("- query.default_limit = 40 (source: env (RESIN_QUERY_DEFAULT_LIMIT))"));
            assert!(!output.contains("super-secret"));
            assert!(!output.contains("5Aep861refresh"));
        },
    );
}

#[test]
fn config_returns_config_failure_for_invalid_limit() {
    with_env(&[("RESIN_QUERY_DEFAULT_LIMIT", "0")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_passes_with_refresh_credentials() {
    with_env(
        &[
            ("SF_CLIENT_ID", "client"),
            ("SF_CLIENT_SECRET", "secret"),
            ("SF_REFRESH_TOKEN", "refresh"),
            ("SF_INSTANCE_URL", "https://example.my.salesforce.com"),
        ],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 0, "expected passing doctor run: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["overall_status"], "pass");
            let names: Vec<&str> = payload["checks"]
                .as_array()
                .expect("checks array")
                .iter()
                .filter_map(|check| check["name"].as_str())
                .collect();
            assert_eq!(
                names,
                ["config_validation", "oauth_credentials", "instance_url", "template_catalog", "query_cache"]
            );
        },
    );
}

#[test]
fn doctor_names_missing_credentials() {
    with_env(&[("SF_CLIENT_ID", "client")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1, "expected failed readiness check");
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result
            .output
            .contains("- [fail] oauth_credentials: missing SF_CLIENT_SECRET, SF_REFRESH_TOKEN"));
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("SF_INSTANCE_URL", "ftp://example.org")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 2, "expected config failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

#[test]
fn segment_reports_meta_and_soql() {
    let result = segment::run("major donors over $10k", 25);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "segment");
    assert_eq!(payload["message"], "classified as major_donors_over");
    assert_eq!(payload["data"]["meta"]["segment"], "major_donors_over");
    assert_eq!(payload["data"]["meta"]["amount"], 10000.0);
    assert!(payload["data"]["soql"].as_str().unwrap_or_default().contains("10000"));
}

#[test]
fn segment_falls_back_and_clamps_limit() {
    let result = segment::run("zzz unmatched input", 500);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["meta"]["segment"], "recent_donors");
    assert_eq!(payload["data"]["meta"]["months"], 6);
    assert_eq!(payload["data"]["meta"]["defaulted"], true);
    assert_eq!(payload["data"]["meta"]["limit"], 100);
    assert!(payload["data"]["soql"].as_str().unwrap_or_default().ends_with("LIMIT 100"));
}

#[test]
fn ask_returns_intent_and_explanation() {
    let result = ask::run("top 5 donors this year", 25);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "ask");
    assert_eq!(payload["data"]["intent"], "top_donors");
    assert!(payload["data"]["soql"].as_str().unwrap_or_default().ends_with("LIMIT 5"));
}

#[test]
fn templates_lists_both_families() {
    let result = templates::run(None, 25);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["donor_segments"].as_array().map(Vec::len), Some(10));
    assert_eq!(payload["data"]["analytics"].as_array().map(Vec::len), Some(11));
}

#[test]
fn templates_renders_named_template() {
    let result = templates::run(Some("lapsed-donors"), 10);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["name"], "lapsed_donors");
    assert!(payload["data"]["soql"].as_str().unwrap_or_default().contains("LAST_N_DAYS:360"));
    assert!(payload["data"]["soql"].as_str().unwrap_or_default().ends_with("LIMIT 10"));
}

#[test]
fn templates_rejects_unknown_name() {
    let result = templates::run(Some("golden_donors"), 25);
    assert_eq!(result.exit_code, 3, "expected invalid arguments code");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "invalid_arguments");
    assert_eq!(payload["message"], "unknown template `golden_donors`");
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "RESIN_SALESFORCE_CLIENT_ID",
        "RESIN_SALESFORCE_CLIENT_SECRET",
        "RESIN_SALESFORCE_REFRESH_TOKEN",
        "RESIN_SALESFORCE_INSTANCE_URL",
        "RESIN_SALESFORCE_DOMAIN",
        "RESIN_SALESFORCE_API_VERSION",
        "RESIN_SALESFORCE_TIMEOUT_SECS",
        "RESIN_SALESFORCE_USERNAME",
        "RESIN_SALESFORCE_PASSWORD",
        "RESIN_SALESFORCE_SECURITY_TOKEN",
        "SF_CLIENT_ID",
        "SF_CLIENT_SECRET",
        "SF_REFRESH_TOKEN",
        "SF_INSTANCE_URL",
        "SF_DOMAIN",
        "SF_USERNAME",
        "SF_PASSWORD",
        "SF_SECURITY_TOKEN",
        "RESIN_QUERY_DEFAULT_LIMIT",
        "RESIN_QUERY_CACHE_TTL_SECS",
        "RESIN_QUERY_CACHE_MAX_ENTRIES",
        "RESIN_LOGGING_LEVEL",
        "RESIN_LOGGING_FORMAT",
        "RESIN_LOG_LEVEL",
        "RESIN_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
