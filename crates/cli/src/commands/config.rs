use std::env;
use std::fs;
use std::path::Path;

use resin_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use super::{CommandResult, EXIT_CONFIG};

struct ConfigFile<'a> {
    path: &'a Path,
    doc: Option<Value>,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let path = resolve_config_path(None);
    let file = path.as_deref().map(|path| ConfigFile { path, doc: load_config_file_doc(path) });
    let source = |key_path: &str, env_keys: &[&str]| field_source(key_path, env_keys, file.as_ref());

    let sf = &config.salesforce;
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "salesforce.client_id",
        &redact_identifier(sf.client_id.as_deref()),
        source("salesforce.client_id", &["RESIN_SALESFORCE_CLIENT_ID", "SF_CLIENT_ID"]),
    ));
    lines.push(render_line(
        "salesforce.client_secret",
        redact_secret(sf.client_secret.as_ref()),
        source("salesforce.client_secret", &["RESIN_SALESFORCE_CLIENT_SECRET", "SF_CLIENT_SECRET"]),
    ));
    lines.push(render_line(
        "salesforce.refresh_token",
        redact_secret(sf.refresh_token.as_ref()),
        source("salesforce.refresh_token", &["RESIN_SALESFORCE_REFRESH_TOKEN", "SF_REFRESH_TOKEN"]),
    ));
    lines.push(render_line(
        "salesforce.instance_url",
        sf.instance_url.as_deref().unwrap_or("<unset>"),
        source("salesforce.instance_url", &["RESIN_SALESFORCE_INSTANCE_URL", "SF_INSTANCE_URL"]),
    ));
    lines.push(render_line(
        "salesforce.domain",
        sf.domain.as_str(),
        source("salesforce.domain", &["RESIN_SALESFORCE_DOMAIN", "SF_DOMAIN"]),
    ));
    lines.push(render_line(
        "salesforce.api_version",
        &sf.api_version,
        source("salesforce.api_version", &["RESIN_SALESFORCE_API_VERSION"]),
    ));
    lines.push(render_line(
        "salesforce.timeout_secs",
        &sf.timeout_secs.to_string(),
        source("salesforce.timeout_secs", &["RESIN_SALESFORCE_TIMEOUT_SECS"]),
    ));
    lines.push(render_line(
        "salesforce.username",
        sf.username.as_deref().unwrap_or("<unset>"),
        source("salesforce.username", &["RESIN_SALESFORCE_USERNAME", "SF_USERNAME"]),
    ));
    lines.push(render_line(
        "salesforce.password",
        redact_secret(sf.password.as_ref()),
        source("salesforce.password", &["RESIN_SALESFORCE_PASSWORD", "SF_PASSWORD"]),
    ));
    lines.push(render_line(
        "salesforce.security_token",
        redact_secret(sf.security_token.as_ref()),
        source("salesforce.security_token", &["RESIN_SALESFORCE_SECURITY_TOKEN", "SF_SECURITY_TOKEN"]),
    ));

    lines.push(render_line(
        "query.default_limit",
        &config.query.default_limit.to_string(),
        source("query.default_limit", &["RESIN_QUERY_DEFAULT_LIMIT"]),
    ));
    lines.push(render_line(
        "query.cache_ttl_secs",
        &config.query.cache_ttl_secs.to_string(),
        source("query.cache_ttl_secs", &["RESIN_QUERY_CACHE_TTL_SECS"]),
    ));
    lines.push(render_line(
        "query.cache_max_entries",
        &config.query.cache_max_entries.to_string(),
        source("query.cache_max_entries", &["RESIN_QUERY_CACHE_MAX_ENTRIES"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["RESIN_LOGGING_LEVEL", "RESIN_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["RESIN_LOGGING_FORMAT", "RESIN_LOG_FORMAT"]),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(key_path: &str, env_keys: &[&str], file: Option<&ConfigFile<'_>>) -> String {
    let set_env = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = set_env {
        return format!("env ({env_key})");
    }

    if let Some(file) = file {
        if file.doc.as_ref().is_some_and(|doc| contains_path(doc, key_path)) {
            return format!("file ({})", file.path.display());
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> &'static str {
    match secret {
        Some(secret) if secret.expose_secret().trim().is_empty() => "<empty>",
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

/// Connected app ids are not secret but are long; keep enough to recognise.
fn redact_identifier(value: Option<&str>) -> String {
    match value.map(str::trim) {
        None => "<unset>".to_string(),
        Some("") => "<empty>".to_string(),
        Some(value) if value.chars().count() <= 8 => "<redacted>".to_string(),
        Some(value) => format!("{}***", value.chars().take(6).collect::<String>()),
    }
}
