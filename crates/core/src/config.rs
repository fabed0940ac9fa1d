use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "resin.toml";
pub const FALLBACK_CONFIG_FILE: &str = "config/resin.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub salesforce: SalesforceConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SalesforceConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub instance_url: Option<String>,
    pub domain: SalesforceDomain,
    pub api_version: String,
    pub timeout_secs: u64,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub security_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct QueryConfig {
    pub default_limit: u32,
    pub cache_ttl_secs: u64,
    /// Zero leaves the cache unbounded.
    pub cache_max_entries: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesforceDomain {
    #[default]
    Login,
    Test,
}

impl SalesforceDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Test => "test",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub instance_url: Option<String>,
    pub domain: Option<SalesforceDomain>,
    pub api_version: Option<String>,
    pub default_limit: Option<u32>,
    pub cache_ttl_secs: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            salesforce: SalesforceConfig {
                client_id: None,
                client_secret: None,
                refresh_token: None,
                instance_url: None,
                domain: SalesforceDomain::Login,
                api_version: "v60.0".to_string(),
                timeout_secs: 30,
                username: None,
                password: None,
                security_token: None,
            },
            query: QueryConfig { default_limit: 25, cache_ttl_secs: 60, cache_max_entries: 1024 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for SalesforceDomain {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "login" => Ok(Self::Login),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::Validation(format!(
                "unsupported salesforce domain `{other}` (expected login|test)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl SalesforceConfig {
    /// Client id, client secret and refresh token are all present and non-blank.
    pub fn has_refresh_credentials(&self) -> bool {
        self.missing_refresh_credentials().is_empty()
    }

    /// Env names of the refresh-flow credentials that are unset or blank.
    pub fn missing_refresh_credentials(&self) -> Vec<&'static str> {
        let present = |value: Option<&str>| value.is_some_and(|value| !value.trim().is_empty());
        [
            ("SF_CLIENT_ID", present(self.client_id.as_deref())),
            ("SF_CLIENT_SECRET", present(self.client_secret.as_ref().map(|s| s.expose_secret()))),
            ("SF_REFRESH_TOKEN", present(self.refresh_token.as_ref().map(|s| s.expose_secret()))),
        ]
        .into_iter()
        .filter_map(|(name, present)| (!present).then_some(name))
        .collect()
    }

    pub fn has_password_credentials(&self) -> bool {
        self.username.as_deref().is_some_and(|value| !value.trim().is_empty())
            && self.password.is_some()
            && self.security_token.is_some()
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(salesforce) = patch.salesforce {
            if let Some(client_id) = salesforce.client_id {
                self.salesforce.client_id = Some(client_id);
            }
            if let Some(client_secret_value) = salesforce.client_secret {
                self.salesforce.client_secret = Some(secret_value(client_secret_value));
            }
            if let Some(refresh_token_value) = salesforce.refresh_token {
                self.salesforce.refresh_token = Some(secret_value(refresh_token_value));
            }
            if let Some(instance_url) = salesforce.instance_url {
                self.salesforce.instance_url = Some(instance_url);
            }
            if let Some(domain) = salesforce.domain {
                self.salesforce.domain = domain;
            }
            if let Some(api_version) = salesforce.api_version {
                self.salesforce.api_version = api_version;
            }
            if let Some(timeout_secs) = salesforce.timeout_secs {
                self.salesforce.timeout_secs = timeout_secs;
            }
            if let Some(username) = salesforce.username {
                self.salesforce.username = Some(username);
            }
            if let Some(password_value) = salesforce.password {
                self.salesforce.password = Some(secret_value(password_value));
            }
            if let Some(security_token_value) = salesforce.security_token {
                self.salesforce.security_token = Some(secret_value(security_token_value));
            }
        }

        if let Some(query) = patch.query {
            if let Some(default_limit) = query.default_limit {
                self.query.default_limit = default_limit;
            }
            if let Some(cache_ttl_secs) = query.cache_ttl_secs {
                self.query.cache_ttl_secs = cache_ttl_secs;
            }
            if let Some(cache_max_entries) = query.cache_max_entries {
                self.query.cache_max_entries = cache_max_entries;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env_any(&["RESIN_SALESFORCE_CLIENT_ID", "SF_CLIENT_ID"]) {
            self.salesforce.client_id = Some(value);
        }
        if let Some(value) = read_env_any(&["RESIN_SALESFORCE_CLIENT_SECRET", "SF_CLIENT_SECRET"])
        {
            self.salesforce.client_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env_any(&["RESIN_SALESFORCE_REFRESH_TOKEN", "SF_REFRESH_TOKEN"])
        {
            self.salesforce.refresh_token = Some(secret_value(value));
        }
        if let Some(value) = read_env_any(&["RESIN_SALESFORCE_INSTANCE_URL", "SF_INSTANCE_URL"]) {
            self.salesforce.instance_url = Some(value);
        }
        if let Some(value) = read_env_any(&["RESIN_SALESFORCE_DOMAIN", "SF_DOMAIN"]) {
            self.salesforce.domain = value.parse()?;
        }
        if let Some(value) = read_env("RESIN_SALESFORCE_API_VERSION") {
            self.salesforce.api_version = value;
        }
        if let Some(value) = read_env("RESIN_SALESFORCE_TIMEOUT_SECS") {
            self.salesforce.timeout_secs = parse_u64("RESIN_SALESFORCE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env_any(&["RESIN_SALESFORCE_USERNAME", "SF_USERNAME"]) {
            self.salesforce.username = Some(value);
        }
        if let Some(value) = read_env_any(&["RESIN_SALESFORCE_PASSWORD", "SF_PASSWORD"]) {
            self.salesforce.password = Some(secret_value(value));
        }
        if let Some(value) =
            read_env_any(&["RESIN_SALESFORCE_SECURITY_TOKEN", "SF_SECURITY_TOKEN"])
        {
            self.salesforce.security_token = Some(secret_value(value));
        }

        if let Some(value) = read_env("RESIN_QUERY_DEFAULT_LIMIT") {
            self.query.default_limit = parse_u32("RESIN_QUERY_DEFAULT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("RESIN_QUERY_CACHE_TTL_SECS") {
            self.query.cache_ttl_secs = parse_u64("RESIN_QUERY_CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("RESIN_QUERY_CACHE_MAX_ENTRIES") {
            self.query.cache_max_entries = parse_usize("RESIN_QUERY_CACHE_MAX_ENTRIES", &value)?;
        }

        if let Some(value) = read_env_any(&["RESIN_LOGGING_LEVEL", "RESIN_LOG_LEVEL"]) {
            self.logging.level = value;
        }
        if let Some(value) = read_env_any(&["RESIN_LOGGING_FORMAT", "RESIN_LOG_FORMAT"]) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(instance_url) = overrides.instance_url {
            self.salesforce.instance_url = Some(instance_url);
        }
        if let Some(domain) = overrides.domain {
            self.salesforce.domain = domain;
        }
        if let Some(api_version) = overrides.api_version {
            self.salesforce.api_version = api_version;
        }
        if let Some(default_limit) = overrides.default_limit {
            self.query.default_limit = default_limit;
        }
        if let Some(cache_ttl_secs) = overrides.cache_ttl_secs {
            self.query.cache_ttl_secs = cache_ttl_secs;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_salesforce(&self.salesforce)?;
        validate_query(&self.query)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read for these options, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(FALLBACK_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

// Missing OAuth credentials are allowed here; they surface on the first call.
fn validate_salesforce(salesforce: &SalesforceConfig) -> Result<(), ConfigError> {
    if let Some(instance_url) = &salesforce.instance_url {
        if !instance_url.starts_with("http://") && !instance_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "salesforce.instance_url must start with http:// or https://".to_string(),
            ));
        }
    }

    let version = salesforce.api_version.trim();
    let well_formed = version
        .strip_prefix('v')
        .is_some_and(|number| number.parse::<f32>().is_ok_and(|value| value > 0.0));
    if !well_formed {
        return Err(ConfigError::Validation(
            "salesforce.api_version must look like `v60.0`".to_string(),
        ));
    }

    if salesforce.timeout_secs == 0 || salesforce.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "salesforce.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_query(query: &QueryConfig) -> Result<(), ConfigError> {
    if !(1..=100).contains(&query.default_limit) {
        return Err(ConfigError::Validation(
            "query.default_limit must be in range 1..=100".to_string(),
        ));
    }

    if query.cache_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "query.cache_ttl_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// First non-empty variable in `keys`; earlier keys win.
fn read_env_any(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| read_env(key))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    salesforce: Option<SalesforcePatch>,
    query: Option<QueryPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SalesforcePatch {
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    instance_url: Option<String>,
    domain: Option<SalesforceDomain>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
    username: Option<String>,
    password: Option<String>,
    security_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryPatch {
    default_limit: Option<u32>,
    cache_ttl_secs: Option<u64>,
    cache_max_entries: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
