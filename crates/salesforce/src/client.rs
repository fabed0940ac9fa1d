use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use resin_core::config::SalesforceConfig;
use resin_core::errors::{validate_identifier, ExecutorError};
use resin_core::executor::{CreateResponse, Fields, QueryExecutor, QueryResult};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::auth::{refresh_access_token, AccessToken};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    Query,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn failure_prefix(self) -> &'static str {
        match self {
            Self::Query => "SOQL query failed",
            Self::Create => "Salesforce create failed",
            Self::Update => "Salesforce update failed",
            Self::Delete => "Salesforce delete failed",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error_code: Option<String>,
    message: Option<String>,
}

/// REST client that connects lazily on first use and shares one token.
pub struct SalesforceClient {
    http: Client,
    config: SalesforceConfig,
    token: RwLock<Option<AccessToken>>,
}

impl SalesforceClient {
    pub fn new(config: SalesforceConfig) -> Result<Self, ExecutorError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ExecutorError::Transport(format!("http client setup failed: {error}")))?;
        Ok(Self { http, config, token: RwLock::new(None) })
    }

    pub async fn is_connected(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Exchanges the refresh token for a fresh access token.
    pub async fn connect(&self) -> Result<(), ExecutorError> {
        match refresh_access_token(&self.http, &self.config).await {
            Ok(token) => {
                info!(
                    event_name = "salesforce.connected",
                    instance_url = %token.instance_url,
                    "connected to salesforce"
                );
                *self.token.write().await = Some(token);
                Ok(())
            }
            Err(error) => {
                let has_password = self.config.has_password_credentials();
                warn!(
                    event_name = "salesforce.oauth.refresh_failed",
                    has_username_password = has_password,
                    error = %error,
                    "oauth refresh failed"
                );
                if has_password {
                    Err(ExecutorError::Auth("username/password flow is not supported".to_string()))
                } else {
                    Err(error)
                }
            }
        }
    }

    async fn current_token(&self) -> Result<AccessToken, ExecutorError> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }
        self.connect().await?;
        self.token
            .read()
            .await
            .clone()
            .ok_or_else(|| ExecutorError::Auth("salesforce connection was not established".to_string()))
    }

    async fn send(
        &self,
        operation: Operation,
        build: impl FnOnce(&Client, &AccessToken) -> RequestBuilder,
    ) -> Result<Response, ExecutorError> {
        let token = self.current_token().await?;
        let response = build(&self.http, &token)
            .bearer_auth(token.access_token.expose_secret())
            .send()
            .await
            .map_err(|error| {
                ExecutorError::Transport(format!("{}: {error}", operation.failure_prefix()))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            // Next call reconnects.
            *self.token.write().await = None;
        }
        let body = response.text().await.unwrap_or_default();
        Err(api_error(operation, status.as_u16(), &body))
    }

    fn data_url(&self, instance_url: &str, path: &str) -> String {
        data_url(instance_url, &self.config.api_version, path)
    }
}

#[async_trait]
impl QueryExecutor for SalesforceClient {
    async fn execute(&self, soql: &str) -> Result<QueryResult, ExecutorError> {
        let response = self
            .send(Operation::Query, |http, token| {
                http.get(self.data_url(&token.instance_url, "query")).query(&[("q", soql)])
            })
            .await?;
        response
            .json::<QueryResult>()
            .await
            .map_err(|error| ExecutorError::Decode(format!("SOQL response could not be decoded: {error}")))
    }

    async fn create(&self, sobject: &str, fields: &Fields) -> Result<CreateResponse, ExecutorError> {
        let path = sobject_path(sobject, None)?;
        let response = self
            .send(Operation::Create, |http, token| {
                http.post(self.data_url(&token.instance_url, &path)).json(fields)
            })
            .await?;
        response.json::<CreateResponse>().await.map_err(|error| {
            ExecutorError::Decode(format!("create response could not be decoded: {error}"))
        })
    }

    async fn update(&self, sobject: &str, id: &str, fields: &Fields) -> Result<(), ExecutorError> {
        let path = sobject_path(sobject, Some(id))?;
        self.send(Operation::Update, |http, token| {
            http.patch(self.data_url(&token.instance_url, &path)).json(fields)
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, sobject: &str, id: &str) -> Result<(), ExecutorError> {
        let path = sobject_path(sobject, Some(id))?;
        self.send(Operation::Delete, |http, token| {
            http.delete(self.data_url(&token.instance_url, &path))
        })
        .await?;
        Ok(())
    }
}

fn data_url(instance_url: &str, api_version: &str, path: &str) -> String {
    format!("{}/services/data/{api_version}/{path}", instance_url.trim_end_matches('/'))
}

fn sobject_path(sobject: &str, id: Option<&str>) -> Result<String, ExecutorError> {
    let invalid = |error: resin_core::errors::ValidationError| {
        ExecutorError::InvalidRequest(error.to_string())
    };
    validate_identifier("sobject", sobject).map_err(invalid)?;
    match id {
        Some(id) => {
            validate_identifier("record_id", id).map_err(invalid)?;
            Ok(format!("sobjects/{sobject}/{id}"))
        }
        None => Ok(format!("sobjects/{sobject}")),
    }
}

fn api_error(operation: Operation, status: u16, body: &str) -> ExecutorError {
    let parsed = serde_json::from_str::<Vec<ApiErrorBody>>(body)
        .ok()
        .and_then(|errors| errors.into_iter().next());

    let (error_code, detail) = match parsed {
        Some(ApiErrorBody { error_code, message: Some(message) }) => (error_code, message),
        Some(ApiErrorBody { error_code, message: None }) => (error_code, body.to_string()),
        None => (None, body.to_string()),
    };

    ExecutorError::Api {
        status,
        error_code,
        message: format!("{}: {detail}", operation.failure_prefix()),
    }
}

#[cfg(test)]
mod tests {
    use resin_core::config::AppConfig;
    use resin_core::errors::ExecutorError;
    use resin_core::executor::QueryExecutor;

    use super::{api_error, data_url, sobject_path, Operation, SalesforceClient};

    #[test]
    fn data_urls_use_configured_version() {
        assert_eq!(
            data_url("https://acme.my.salesforce.com/", "v60.0", "sobjects/Contact"),
            "https://acme.my.salesforce.com/services/data/v60.0/sobjects/Contact"
        );
    }

    #[test]
    fn sobject_paths_reject_unsafe_segments() {
        assert_eq!(sobject_path("Contact", None).expect("valid"), "sobjects/Contact");
        assert_eq!(
            sobject_path("Contact", Some("003xx000004TmiQAAS")).expect("valid"),
            "sobjects/Contact/003xx000004TmiQAAS"
        );

        let error = sobject_path("Contact", Some("003?x=1")).unwrap_err();
        assert!(matches!(error, ExecutorError::InvalidRequest(ref message) if message.starts_with("record_id")));
    }

    #[test]
    fn api_error_reads_salesforce_error_array() {
        let error = api_error(
            Operation::Query,
            400,
            r#"[{"message":"unexpected token: FORM","errorCode":"MALFORMED_QUERY"}]"#,
        );

        assert_eq!(
            error,
            ExecutorError::Api {
                status: 400,
                error_code: Some("MALFORMED_QUERY".to_string()),
                message: "SOQL query failed: unexpected token: FORM".to_string(),
            }
        );
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let error = api_error(Operation::Update, 503, "Service Unavailable");

        assert_eq!(error.to_string(), "Salesforce update failed: Service Unavailable");
        assert_eq!(error.status(), Some(503));
    }

    #[tokio::test]
    async fn calls_without_credentials_surface_auth_error() {
        let client = SalesforceClient::new(AppConfig::default().salesforce).expect("client builds");

        let error = client.execute("SELECT Id FROM Contact").await.unwrap_err();

        assert!(matches!(error, ExecutorError::Auth(ref message) if message.starts_with("Missing OAuth env vars")));
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn invalid_sobject_is_refused_locally() {
        let client = SalesforceClient::new(AppConfig::default().salesforce).expect("client builds");

        let error = client.delete("Contact/..", "003A").await.unwrap_err();

        assert!(matches!(error, ExecutorError::InvalidRequest(_)));
    }
}
