pub mod cache;
pub mod classify;
pub mod config;
pub mod errors;
pub mod executor;
pub mod parse;
pub mod session;
pub mod soql;

pub use cache::{CacheLookup, Clock, ManualClock, ResultCache, SystemClock};
pub use classify::{
    build_soql_from_criteria, nl_to_soql, QueryMeta, QuestionIntent, QuestionMatch, SegmentMatch,
};
pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat, SalesforceDomain};
pub use errors::{validate_identifier, ExecutorError, ValidationError};
pub use executor::{CreateResponse, Fields, InMemoryExecutor, Mutation, QueryExecutor, QueryResult};
pub use parse::{parse_amount, parse_timeframe, parse_timeframe_at, Timeframe};
pub use session::Session;
pub use soql::{render, Limit, Period, TemplateName, TemplateParams, UnknownTemplate};
