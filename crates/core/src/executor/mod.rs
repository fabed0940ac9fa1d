//! The query executor boundary: anything that can run SOQL and mutate
//! records. The Salesforce REST client is the production implementation.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ExecutorError;

pub use memory::{InMemoryExecutor, Mutation};

/// Field values for create and update calls.
pub type Fields = serde_json::Map<String, Value>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub total_size: u64,
    #[serde(default = "default_done")]
    pub done: bool,
    #[serde(default)]
    pub records: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
}

fn default_done() -> bool {
    true
}

impl QueryResult {
    pub fn with_records(records: Vec<Value>) -> Self {
        Self { total_size: records.len() as u64, done: true, records, next_records_url: None }
    }

    /// Shape of a `SELECT COUNT() ...` response: a size and no rows.
    pub fn count_only(total_size: u64) -> Self {
        Self { total_size, done: true, records: Vec::new(), next_records_url: None }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<Value>,
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, soql: &str) -> Result<QueryResult, ExecutorError>;

    async fn create(&self, sobject: &str, fields: &Fields) -> Result<CreateResponse, ExecutorError>;

    async fn update(&self, sobject: &str, id: &str, fields: &Fields) -> Result<(), ExecutorError>;

    async fn delete(&self, sobject: &str, id: &str) -> Result<(), ExecutorError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CreateResponse, QueryResult};

    #[test]
    fn query_result_reads_salesforce_payload() {
        let result: QueryResult = serde_json::from_value(json!({
            "totalSize": 2,
            "done": true,
            "records": [{"Id": "003A"}, {"Id": "003B"}]
        }))
        .expect("payload decodes");

        assert_eq!(result.total_size, 2);
        assert_eq!(result.records.len(), 2);
        assert!(result.next_records_url.is_none());
    }

    #[test]
    fn count_payload_without_records_decodes() {
        let result: QueryResult =
            serde_json::from_value(json!({"totalSize": 42, "done": true})).expect("decodes");

        assert_eq!(result, QueryResult::count_only(42));
    }

    #[test]
    fn create_response_tolerates_missing_flags() {
        let response: CreateResponse =
            serde_json::from_value(json!({"id": "003xx000004TmiQAAS"})).expect("decodes");

        assert_eq!(response.id, "003xx000004TmiQAAS");
        assert!(response.errors.is_empty());
    }
}
