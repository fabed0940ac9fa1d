//! MCP server implementation for Resin.

use std::sync::Arc;
use std::time::Duration;

use resin_core::cache::ResultCache;
use resin_core::config::AppConfig;
use resin_core::executor::{QueryExecutor, QueryResult};
use resin_core::session::Session;
use resin_core::soql::Limit;
use resin_salesforce::SalesforceClient;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars,
    service::RequestContext,
    tool, tool_handler, tool_router,
    transport::stdio,
    RoleServer, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::docs;
use crate::tools::{self, donors, records, resolve_limit, soql};
use crate::{McpError, McpResult};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RunSoqlParams {
    /// The SOQL query to execute
    pub query: String,
    /// Max records to display (1-100, default 25)
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecordParams {
    /// sObject type, e.g. Contact, Opportunity, Task
    pub sobject: String,
    /// Field names and values; must be a non-empty object
    pub fields: Value,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecordParams {
    /// sObject type
    pub sobject: String,
    /// 15 or 18 character Salesforce record ID
    pub record_id: String,
    /// Fields to update; must be a non-empty object
    pub fields: Value,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct QueryDonorsParams {
    /// Natural language donor segment, e.g. "lapsed donors from last 18 months"
    pub criteria: String,
    /// Max donors to return (1-100, default 25)
    #[serde(default)]
    pub limit: Option<i64>,
}

/// One server per connection; every tool call shares its session.
#[derive(Clone)]
pub struct ResinMcpServer {
    session: Session,
    default_limit: Limit,
    tool_router: ToolRouter<Self>,
}

impl ResinMcpServer {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        cache: Arc<ResultCache<QueryResult>>,
        default_limit: Limit,
    ) -> Self {
        Self::with_session(Session::new(executor, cache), default_limit)
    }

    pub fn with_session(session: Session, default_limit: Limit) -> Self {
        Self { session, default_limit, tool_router: Self::tool_router() }
    }

    /// Builds the Salesforce-backed server from validated configuration.
    pub fn from_config(config: &AppConfig) -> McpResult<Self> {
        config.validate()?;
        let client = SalesforceClient::new(config.salesforce.clone())
            .map_err(|error| McpError::Internal(error.to_string()))?;
        let cache = Arc::new(ResultCache::new(
            Duration::from_secs(config.query.cache_ttl_secs),
            config.query.cache_max_entries,
        ));
        let default_limit = Limit::new(config.query.default_limit).ok_or_else(|| {
            McpError::Internal(format!("default_limit {} out of range", config.query.default_limit))
        })?;
        Ok(Self::new(Arc::new(client), cache, default_limit))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Names of every registered tool.
    pub fn tool_names(&self) -> Vec<String> {
        self.tool_router.list_all().into_iter().map(|tool| tool.name.into_owned()).collect()
    }

    /// Serves MCP over stdin/stdout until the client disconnects.
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        info!(
            event_name = "mcp.server.starting",
            correlation_id = self.session.correlation_id(),
            transport = "stdio",
            "starting resin mcp server"
        );
        let service = self.serve(stdio()).await?;
        service.waiting().await?;
        info!(event_name = "mcp.server.stopped", "resin mcp server shut down");
        Ok(())
    }

    fn capabilities_resource() -> Resource {
        RawResource {
            uri: docs::CAPABILITIES_URI.to_string(),
            name: docs::CAPABILITIES_NAME.to_string(),
            title: Some(docs::CAPABILITIES_TITLE.to_string()),
            description: Some("Tools, donor segments, query patterns and caching behaviour".to_string()),
            mime_type: Some(docs::CAPABILITIES_MIME.to_string()),
            size: Some(docs::CAPABILITIES_DOC.len() as u32),
            icons: None,
        }
        .no_annotation()
    }

    pub fn read_capabilities(uri: &str) -> McpResult<ReadResourceResult> {
        if uri != docs::CAPABILITIES_URI {
            return Err(McpError::ResourceNotFound(uri.to_string()));
        }
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: uri.to_string(),
                mime_type: Some(docs::CAPABILITIES_MIME.to_string()),
                text: docs::CAPABILITIES_DOC.to_string(),
                meta: None,
            }],
        })
    }
}

fn text_result(text: String) -> Result<CallToolResult, ErrorData> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl ResinMcpServer {
    #[tool(
        name = "run_soql",
        description = "Execute a SOQL query against Salesforce. Returns formatted results with record count. Supports all standard SOQL features including COUNT(), aggregations, and subqueries.",
        annotations(title = "Run SOQL Query", read_only_hint = true)
    )]
    pub async fn run_soql(
        &self,
        Parameters(params): Parameters<RunSoqlParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let limit = resolve_limit("run_soql", params.limit, self.default_limit);
        text_result(soql::run_soql(&self.session, &params.query, limit).await)
    }

    #[tool(
        name = "create_record",
        description = "Create any Salesforce sObject record (Contact, Opportunity, Task, etc.). Provide the sObject type and field values. Returns the created record ID.",
        annotations(title = "Create Salesforce Record", read_only_hint = false)
    )]
    pub async fn create_record(
        &self,
        Parameters(params): Parameters<CreateRecordParams>,
    ) -> Result<CallToolResult, ErrorData> {
        text_result(records::create_record(&self.session, &params.sobject, &params.fields).await)
    }

    #[tool(
        name = "update_record",
        description = "Update any Salesforce sObject record by ID. Provide the sObject type, record ID, and fields to update.",
        annotations(title = "Update Salesforce Record", read_only_hint = false, idempotent_hint = true)
    )]
    pub async fn update_record(
        &self,
        Parameters(params): Parameters<UpdateRecordParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let output = records::update_record(
            &self.session,
            &params.sobject,
            &params.record_id,
            &params.fields,
        )
        .await;
        text_result(output)
    }

    #[tool(
        name = "query_donors",
        description = "Query donors using natural language criteria. Supports: lapsed donors, major donors over $X, recent donors, first-time donors, recurring donors, at-risk donors, upgrade candidates, and more.",
        annotations(title = "Query Donors by Criteria", read_only_hint = true)
    )]
    pub async fn query_donors(
        &self,
        Parameters(params): Parameters<QueryDonorsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let limit = resolve_limit("query_donors", params.limit, self.default_limit);
        text_result(donors::query_donors(&self.session, &params.criteria, limit).await)
    }
}

#[tool_handler]
impl ServerHandler for ResinMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().enable_resources().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                title: Some("Resin".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Resin gives access to Salesforce NPSP donor data. Use 'query_donors' for \
                 natural language donor segments, 'run_soql' for direct SOQL, and \
                 'create_record' / 'update_record' for follow-up actions. Read {} for the \
                 full list of segments and query patterns. Tools: {}.",
                docs::CAPABILITIES_URI,
                tools::ALL_TOOL_NAMES.join(", ")
            )),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult::with_all_items(vec![Self::capabilities_resource()]))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        debug!(event_name = "mcp.resource.read", uri = %request.uri, "resource requested");
        Self::read_capabilities(&request.uri).map_err(ErrorData::from)
    }
}
