//! Integration tests for the Resin MCP server
//!
//! Drive the tool surface end to end against the in-memory executor:
//! - Tool registration and documentation coverage
//! - Output blocks for each tool
//! - Query caching with a manual clock
//! - Limit clamping

use std::sync::Arc;
use std::time::Duration;

use resin_core::cache::{ManualClock, ResultCache, DEFAULT_TTL};
use resin_core::errors::ExecutorError;
use resin_core::executor::{InMemoryExecutor, QueryResult};
use resin_core::session::Session;
use resin_core::soql::Limit;
use resin_mcp::docs::{CAPABILITIES_DOC, CAPABILITIES_URI};
use resin_mcp::{
    CreateRecordParams, QueryDonorsParams, ResinMcpServer, RunSoqlParams, UpdateRecordParams,
    ALL_TOOL_NAMES,
};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, ResourceContents};
use rmcp::ServerHandler;
use serde_json::json;

struct Harness {
    server: ResinMcpServer,
    executor: Arc<InMemoryExecutor>,
    clock: Arc<ManualClock>,
}

fn harness(executor: InMemoryExecutor) -> Harness {
    let executor = Arc::new(executor);
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(ResultCache::with_clock(DEFAULT_TTL, 1024, clock.clone()));
    let session = Session::with_correlation_id(executor.clone(), cache, "integration");
    Harness { server: ResinMcpServer::with_session(session, Limit::DEFAULT), executor, clock }
}

fn text(result: CallToolResult) -> String {
    result.content[0].as_text().map(|content| content.text.clone()).expect("text content")
}

async fn run_soql(server: &ResinMcpServer, query: &str, limit: Option<i64>) -> String {
    let params = RunSoqlParams { query: query.to_string(), limit };
    text(server.run_soql(Parameters(params)).await.expect("tool result"))
}

async fn query_donors(server: &ResinMcpServer, criteria: &str, limit: Option<i64>) -> String {
    let params = QueryDonorsParams { criteria: criteria.to_string(), limit };
    text(server.query_donors(Parameters(params)).await.expect("tool result"))
}

#[test]
fn test_server_info() {
    let h = harness(InMemoryExecutor::new());
    let info = h.server.get_info();

    assert_eq!(info.server_info.name, "resin-mcp");
    assert!(info.capabilities.tools.is_some());
    assert!(info.capabilities.resources.is_some());
    assert!(info.instructions.expect("instructions").contains(CAPABILITIES_URI));
}

#[test]
fn test_exactly_four_tools_are_registered() {
    let h = harness(InMemoryExecutor::new());
    let mut names = h.server.tool_names();
    names.sort();

    let mut expected: Vec<String> = ALL_TOOL_NAMES.iter().map(|name| name.to_string()).collect();
    expected.sort();
    assert_eq!(names, expected);
}

#[test]
fn test_capabilities_document_names_every_tool() {
    let h = harness(InMemoryExecutor::new());

    for name in h.server.tool_names() {
        assert!(CAPABILITIES_DOC.contains(&name), "capabilities doc is missing {name}");
    }
}

#[test]
fn test_capabilities_resource_read() {
    let result = ResinMcpServer::read_capabilities(CAPABILITIES_URI).expect("known resource");

    match &result.contents[0] {
        ResourceContents::TextResourceContents { uri, mime_type, text, .. } => {
            assert_eq!(uri, CAPABILITIES_URI);
            assert_eq!(mime_type.as_deref(), Some("text/markdown"));
            assert_eq!(text, CAPABILITIES_DOC);
        }
        other => panic!("unexpected contents: {other:?}"),
    }
    assert!(ResinMcpServer::read_capabilities("resin://docs/other").is_err());
}

#[tokio::test]
async fn test_run_soql_count_query() {
    let h = harness(
        InMemoryExecutor::new().with_response("SELECT COUNT() FROM Contact", QueryResult::count_only(42)),
    );

    let output = run_soql(&h.server, "SELECT COUNT() FROM Contact", None).await;

    assert_eq!(
        output,
        "SOQL Count Result\n-----------------\n- Count: 42\n- Query: `SELECT COUNT() FROM Contact`"
    );
}

#[tokio::test]
async fn test_identical_reads_are_cached_for_sixty_seconds() {
    let h = harness(InMemoryExecutor::new().with_default_response(QueryResult::count_only(7)));

    run_soql(&h.server, "SELECT COUNT() FROM Contact", None).await;
    h.clock.advance(Duration::from_secs(60));
    run_soql(&h.server, "SELECT COUNT() FROM Contact", None).await;
    assert_eq!(h.executor.query_calls(), 1);

    h.clock.advance(Duration::from_secs(1));
    run_soql(&h.server, "SELECT COUNT() FROM Contact", None).await;
    assert_eq!(h.executor.query_calls(), 2);
}

#[tokio::test]
async fn test_limit_is_clamped_before_reaching_templates() {
    let h = harness(InMemoryExecutor::new());

    let low = query_donors(&h.server, "first time donors", Some(0)).await;
    let high = query_donors(&h.server, "first time donors", Some(101)).await;

    assert!(low.contains("limit 1"));
    assert!(high.contains("limit 100"));
    assert_eq!(h.executor.query_calls(), 2);
}

#[tokio::test]
async fn test_create_record_with_empty_fields_is_rejected_locally() {
    let h = harness(InMemoryExecutor::new());
    let params = CreateRecordParams { sobject: "Contact".to_string(), fields: json!({}) };

    let output = text(h.server.create_record(Parameters(params)).await.expect("tool result"));

    assert_eq!(
        output,
        "Validation Error\n----------------\n- Provide sobject (string) and fields (non-empty object)."
    );
    assert_eq!(h.executor.total_calls(), 0);
}

#[tokio::test]
async fn test_update_record_bypasses_cache() {
    let h = harness(InMemoryExecutor::new().with_default_response(QueryResult::count_only(1)));
    run_soql(&h.server, "SELECT COUNT() FROM Contact", None).await;

    let params = UpdateRecordParams {
        sobject: "Contact".to_string(),
        record_id: "003xx000004TmiQAAS".to_string(),
        fields: json!({"Email": "donor@example.org"}),
    };
    let output = text(h.server.update_record(Parameters(params)).await.expect("tool result"));

    assert!(output.starts_with("Record Updated\n--------------\n- sObject: Contact\n- Id: 003xx000004TmiQAAS"));
    assert_eq!(h.executor.mutation_calls(), 1);
    assert_eq!(h.server.session().cache().len(), 1);
}

#[tokio::test]
async fn test_query_donors_renders_segment_and_insights() {
    let h = harness(InMemoryExecutor::new().with_default_response(QueryResult::with_records(vec![
        json!({
            "Name": "Ada Lovelace",
            "Email": "ada@example.org",
            "LifetimeGiving": 15250,
            "LastGiftDate": "2024-11-02"
        }),
    ])));

    let output = query_donors(&h.server, "lapsed donors from the last 18 months", None).await;

    assert!(output.starts_with(
        "Donor Results\n-------------\n- Name: Ada Lovelace\n  - Email: ada@example.org\n  - Lifetime Giving: $15,250.00\n  - Last Gift: 2024-11-02"
    ));
    assert!(output.contains("AI Insights\n-----------\n- Segment: lapsed_donors (18 months, limit 25)"));
    assert!(output.contains("- Prioritize donors with higher lifetime giving and recent engagement."));
    assert!(output.ends_with("- Draft personalized outreach acknowledging specific past gifts."));
}

#[tokio::test]
async fn test_query_donors_failure_is_reported_as_text() {
    let h = harness(InMemoryExecutor::new().with_failure(ExecutorError::Auth(
        "Missing OAuth env vars: SF_CLIENT_ID/SF_CLIENT_SECRET/SF_REFRESH_TOKEN".to_string(),
    )));

    let output = query_donors(&h.server, "recurring donors", None).await;

    assert!(output.starts_with("SOQL Error\n----------\n- Query: `SELECT"));
    assert!(output.contains("- Message: Missing OAuth env vars"));
    assert!(output.ends_with("- Suggestion: Check field names and ensure NPSP is installed."));
}

#[tokio::test]
async fn test_unmatched_criteria_falls_back_to_recent_donors() {
    let h = harness(InMemoryExecutor::new());

    let output = query_donors(&h.server, "zzz unmatched input", None).await;

    assert!(output.contains("- Segment: recent_donors (6 months, limit 25, fallback)"));
}
