use reqwest::Client;
use resin_core::config::{SalesforceConfig, SalesforceDomain};
use resin_core::errors::ExecutorError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::error;

const MISSING_CREDENTIALS: &str =
    "Missing OAuth env vars: SF_CLIENT_ID/SF_CLIENT_SECRET/SF_REFRESH_TOKEN";

pub fn token_endpoint(domain: SalesforceDomain) -> &'static str {
    match domain {
        SalesforceDomain::Login => "https://login.salesforce.com/services/oauth2/token",
        SalesforceDomain::Test => "https://test.salesforce.com/services/oauth2/token",
    }
}

/// Bearer token plus the instance it was issued for.
#[derive(Clone, Debug)]
pub struct AccessToken {
    pub access_token: SecretString,
    pub instance_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    instance_url: Option<String>,
}

pub(crate) async fn refresh_access_token(
    http: &Client,
    config: &SalesforceConfig,
) -> Result<AccessToken, ExecutorError> {
    let (client_id, client_secret, refresh_token) = refresh_credentials(config)?;

    let response = http
        .post(token_endpoint(config.domain))
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await
        .map_err(|error| {
            error!(error = %error, event_name = "salesforce.oauth.request_failed", "oauth refresh request failed");
            ExecutorError::Transport(format!("OAuth refresh request failed: {error}"))
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|error| {
        ExecutorError::Transport(format!("OAuth refresh response could not be read: {error}"))
    })?;
    if !status.is_success() {
        return Err(ExecutorError::Auth(format!("OAuth refresh failed: {} {body}", status.as_u16())));
    }

    token_from_body(&body)
}

fn refresh_credentials(config: &SalesforceConfig) -> Result<(&str, &str, &str), ExecutorError> {
    if !config.has_refresh_credentials() {
        return Err(ExecutorError::Auth(MISSING_CREDENTIALS.to_string()));
    }
    match (&config.client_id, &config.client_secret, &config.refresh_token) {
        (Some(client_id), Some(client_secret), Some(refresh_token)) => {
            Ok((client_id.as_str(), client_secret.expose_secret(), refresh_token.expose_secret()))
        }
        _ => Err(ExecutorError::Auth(MISSING_CREDENTIALS.to_string())),
    }
}

fn token_from_body(body: &str) -> Result<AccessToken, ExecutorError> {
    let missing = || {
        ExecutorError::Auth("OAuth refresh succeeded but missing access_token/instance_url".to_string())
    };
    let parsed: TokenResponse = serde_json::from_str(body).map_err(|_| missing())?;

    match (parsed.access_token, parsed.instance_url) {
        (Some(access_token), Some(instance_url))
            if !access_token.is_empty() && !instance_url.is_empty() =>
        {
            Ok(AccessToken {
                access_token: access_token.into(),
                instance_url: instance_url.trim_end_matches('/').to_string(),
            })
        }
        _ => Err(missing()),
    }
}
