//! Per-connection context handed to every tool call.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::ResultCache;
use crate::errors::ExecutorError;
use crate::executor::{CreateResponse, Fields, QueryExecutor, QueryResult};

const READ_NAMESPACE: &str = "soql:";

pub fn cache_key(soql: &str) -> String {
    format!("{READ_NAMESPACE}{soql}")
}

#[derive(Clone)]
pub struct Session {
    executor: Arc<dyn QueryExecutor>,
    cache: Arc<ResultCache<QueryResult>>,
    correlation_id: String,
}

impl Session {
    pub fn new(executor: Arc<dyn QueryExecutor>, cache: Arc<ResultCache<QueryResult>>) -> Self {
        Self::with_correlation_id(executor, cache, Uuid::new_v4().to_string())
    }

    pub fn with_correlation_id(
        executor: Arc<dyn QueryExecutor>,
        cache: Arc<ResultCache<QueryResult>>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self { executor, cache, correlation_id: correlation_id.into() }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn cache(&self) -> &ResultCache<QueryResult> {
        &self.cache
    }

    /// Read path. Identical SOQL within the cache TTL reaches the executor once.
    pub async fn query(&self, soql: &str) -> Result<QueryResult, ExecutorError> {
        let key = cache_key(soql);
        let lookup = self
            .cache
            .get_or_try_fetch(&key, || self.executor.execute(soql))
            .await
            .inspect_err(|error| {
                warn!(
                    event_name = "executor.query.failed",
                    correlation_id = %self.correlation_id,
                    error_class = error.class(),
                    error = %error,
                    "query failed"
                );
            })?;

        let event_name = if lookup.hit { "cache.hit" } else { "cache.miss" };
        debug!(
            event_name,
            correlation_id = %self.correlation_id,
            cache_hit = lookup.hit,
            total_size = lookup.value.total_size,
            "query resolved"
        );
        Ok(lookup.value)
    }

    pub async fn create(
        &self,
        sobject: &str,
        fields: &Fields,
    ) -> Result<CreateResponse, ExecutorError> {
        self.executor.create(sobject, fields).await.inspect_err(|error| {
            self.log_mutation_failure("executor.create.failed", sobject, error)
        })
    }

    pub async fn update(&self, sobject: &str, id: &str, fields: &Fields) -> Result<(), ExecutorError> {
        self.executor.update(sobject, id, fields).await.inspect_err(|error| {
            self.log_mutation_failure("executor.update.failed", sobject, error)
        })
    }

    pub async fn delete(&self, sobject: &str, id: &str) -> Result<(), ExecutorError> {
        self.executor.delete(sobject, id).await.inspect_err(|error| {
            self.log_mutation_failure("executor.delete.failed", sobject, error)
        })
    }

    fn log_mutation_failure(&self, event_name: &'static str, sobject: &str, error: &ExecutorError) {
        warn!(
            event_name,
            correlation_id = %self.correlation_id,
            sobject,
            error_class = error.class(),
            error = %error,
            "mutation failed"
        );
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("correlation_id", &self.correlation_id)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::{cache_key, Session};
    use crate::cache::{ManualClock, ResultCache, DEFAULT_TTL};
    use crate::errors::ExecutorError;
    use crate::executor::{Fields, InMemoryExecutor, QueryResult};

    fn session_with(executor: Arc<InMemoryExecutor>) -> (Session, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(ResultCache::with_clock(DEFAULT_TTL, 0, clock.clone()));
        (Session::with_correlation_id(executor, cache, "test-session"), clock)
    }

    #[tokio::test]
    async fn repeated_query_within_ttl_hits_executor_once() {
        let executor = Arc::new(InMemoryExecutor::new().with_default_response(QueryResult::count_only(3)));
        let (session, clock) = session_with(executor.clone());

        session.query("SELECT COUNT() FROM Contact").await.expect("first");
        clock.advance(Duration::from_secs(60));
        session.query("SELECT COUNT() FROM Contact").await.expect("second");
        assert_eq!(executor.query_calls(), 1);

        clock.advance(Duration::from_secs(1));
        session.query("SELECT COUNT() FROM Contact").await.expect("third");
        assert_eq!(executor.query_calls(), 2);
    }

    #[tokio::test]
    async fn reads_are_namespaced_in_the_cache() {
        let executor = Arc::new(InMemoryExecutor::new());
        let (session, _clock) = session_with(executor);

        session.query("SELECT Id FROM Contact").await.expect("query");

        assert!(session.cache().get(&cache_key("SELECT Id FROM Contact")).is_some());
        assert!(session.cache().get("SELECT Id FROM Contact").is_none());
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let executor = Arc::new(
            InMemoryExecutor::new().with_failure(ExecutorError::Transport("connection reset".to_owned())),
        );
        let (session, _clock) = session_with(executor.clone());

        assert!(session.query("SELECT Id FROM Contact").await.is_err());
        executor.set_failure(None).await;
        assert!(session.query("SELECT Id FROM Contact").await.is_ok());
        assert_eq!(executor.query_calls(), 2);
    }

    #[tokio::test]
    async fn mutations_bypass_the_cache() {
        let executor = Arc::new(InMemoryExecutor::new().with_default_response(QueryResult::with_records(
            vec![json!({"Id": "003A", "Email": "old@example.org"})],
        )));
        let (session, _clock) = session_with(executor.clone());
        let mut fields = Fields::new();
        fields.insert("Email".to_owned(), json!("new@example.org"));

        session.query("SELECT Id, Email FROM Contact").await.expect("prime");
        session.update("Contact", "003A", &fields).await.expect("update");
        session.query("SELECT Id, Email FROM Contact").await.expect("cached read");

        assert_eq!(session.cache().len(), 1);
        assert_eq!(executor.query_calls(), 1);
        assert_eq!(executor.mutation_calls(), 1);
    }
}
