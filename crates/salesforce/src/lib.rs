//! Salesforce REST adapter for the resin query executor.

pub mod auth;
pub mod client;

pub use auth::{token_endpoint, AccessToken};
pub use client::SalesforceClient;
