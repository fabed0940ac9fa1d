//! Resin MCP server.
//!
//! Exposes four Salesforce/NPSP tools (`run_soql`, `create_record`,
//! `update_record`, `query_donors`) and a capabilities document over the
//! Model Context Protocol.
//!
//! ## Architecture
//!
//! - `ResinMcpServer`: the rmcp handler, one per connection
//! - `tools/`: the text-producing tool handlers
//! - `format`: shared rendering helpers
//! - `docs`: the capabilities resource
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use resin_core::cache::ResultCache;
//! use resin_core::executor::InMemoryExecutor;
//! use resin_core::soql::Limit;
//! use resin_mcp::ResinMcpServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = Arc::new(ResultCache::new(std::time::Duration::from_secs(60), 1024));
//!     let server = ResinMcpServer::new(Arc::new(InMemoryExecutor::new()), cache, Limit::DEFAULT);
//!     server.run_stdio().await
//! }
//! ```

pub mod docs;
pub mod format;
mod server;
pub mod tools;

pub use server::{
    CreateRecordParams, QueryDonorsParams, ResinMcpServer, RunSoqlParams, UpdateRecordParams,
};
pub use tools::ALL_TOOL_NAMES;

use rmcp::model::{ErrorCode, ErrorData};
use thiserror::Error;

/// Server-level failures. Tool failures are rendered as text instead.
#[derive(Error, Debug)]
pub enum McpError {
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("configuration error: {0}")]
    Config(#[from] resin_core::config::ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::ResourceNotFound(_) => ErrorCode::RESOURCE_NOT_FOUND.0,
            McpError::Config(_) | McpError::Internal(_) => ErrorCode::INTERNAL_ERROR.0,
        }
    }
}

impl From<McpError> for ErrorData {
    fn from(error: McpError) -> Self {
        ErrorData::new(ErrorCode(error.error_code()), error.to_string(), None)
    }
}

/// Result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use rmcp::model::ErrorData;

    use super::McpError;

    #[test]
    fn errors_map_to_json_rpc_codes() {
        assert_eq!(McpError::ResourceNotFound("resin://x".into()).error_code(), -32002);
        assert_eq!(McpError::Internal("boom".into()).error_code(), -32603);

        let data = ErrorData::from(McpError::ResourceNotFound("resin://x".into()));
        assert_eq!(data.code.0, -32002);
        assert_eq!(data.message, "resource not found: resin://x");
    }
}
