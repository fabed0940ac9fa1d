use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CreateResponse, Fields, QueryExecutor, QueryResult};
use crate::errors::ExecutorError;

#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Create { sobject: String, fields: Fields },
    Update { sobject: String, id: String, fields: Fields },
    Delete { sobject: String, id: String },
}

/// Scripted executor. Queries are answered from exact-match responses, then
/// the default response; a configured failure short-circuits every call.
#[derive(Default)]
pub struct InMemoryExecutor {
    responses: RwLock<HashMap<String, QueryResult>>,
    default_response: RwLock<Option<QueryResult>>,
    failure: RwLock<Option<ExecutorError>>,
    mutations: RwLock<Vec<Mutation>>,
    query_calls: AtomicUsize,
    mutation_calls: AtomicUsize,
    next_id: AtomicU64,
}

impl InMemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, soql: impl Into<String>, result: QueryResult) -> Self {
        self.responses.get_mut().insert(soql.into(), result);
        self
    }

    pub fn with_default_response(mut self, result: QueryResult) -> Self {
        *self.default_response.get_mut() = Some(result);
        self
    }

    pub fn with_failure(mut self, error: ExecutorError) -> Self {
        *self.failure.get_mut() = Some(error);
        self
    }

    pub async fn set_failure(&self, error: Option<ExecutorError>) {
        *self.failure.write().await = error;
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn mutation_calls(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.query_calls() + self.mutation_calls()
    }

    pub async fn mutations(&self) -> Vec<Mutation> {
        self.mutations.read().await.clone()
    }

    async fn fail_if_configured(&self) -> Result<(), ExecutorError> {
        match self.failure.read().await.as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn record(&self, mutation: Mutation) -> Result<(), ExecutorError> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        self.fail_if_configured().await?;
        self.mutations.write().await.push(mutation);
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for InMemoryExecutor {
    async fn execute(&self, soql: &str) -> Result<QueryResult, ExecutorError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.fail_if_configured().await?;

        if let Some(result) = self.responses.read().await.get(soql) {
            return Ok(result.clone());
        }
        Ok(self.default_response.read().await.clone().unwrap_or_default())
    }

    async fn create(&self, sobject: &str, fields: &Fields) -> Result<CreateResponse, ExecutorError> {
        self.record(Mutation::Create { sobject: sobject.to_owned(), fields: fields.clone() })
            .await?;
        let sequence = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CreateResponse { id: format!("mem{sequence:015}"), success: true, errors: Vec::new() })
    }

    async fn update(&self, sobject: &str, id: &str, fields: &Fields) -> Result<(), ExecutorError> {
        self.record(Mutation::Update {
            sobject: sobject.to_owned(),
            id: id.to_owned(),
            fields: fields.clone(),
        })
        .await
    }

    async fn delete(&self, sobject: &str, id: &str) -> Result<(), ExecutorError> {
        self.record(Mutation::Delete { sobject: sobject.to_owned(), id: id.to_owned() }).await
    }
}
