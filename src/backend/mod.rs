//! Chat backend
//!
//! The backend is an HTTP endpoint that takes `{ "mode": 0|1, "query": "..." }`
//! and answers with JSON. [`reply::extract_reply`] turns that JSON into the
//! text shown in the chat.

pub mod client;
pub mod reply;

use crate::{Result, StudioError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use client::{HttpBackend, DEFAULT_BACKEND_URL};
pub use reply::extract_reply;

/// Single- or multi-task answering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Single,
    Multi,
}

impl QueryMode {
    pub fn all() -> &'static [QueryMode] {
        &[QueryMode::Single, QueryMode::Multi]
    }

    /// Value sent in the request body
    pub fn code(&self) -> u8 {
        match self {
            QueryMode::Single => 0,
            QueryMode::Multi => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryMode::Single => "Single task",
            QueryMode::Multi => "Multi task",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QueryMode {
    type Err = StudioError;

    /// Accepts `single`/`multi` or the wire codes `0`/`1`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "0" => Ok(QueryMode::Single),
            "multi" | "1" => Ok(QueryMode::Multi),
            other => Err(StudioError::ConfigError(format!("Unknown mode: {}", other))),
        }
    }
}

/// Request body posted to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub mode: u8,
    pub query: String,
}

impl QueryRequest {
    pub fn new(mode: QueryMode, query: impl Into<String>) -> Self {
        Self {
            mode: mode.code(),
            query: query.into(),
        }
    }
}

/// Anything that can answer a chat query
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send one query and return the raw JSON response
    async fn query(&self, request: &QueryRequest) -> Result<serde_json::Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(QueryRequest::new(QueryMode::Multi, "hello")).unwrap();
        assert_eq!(body, serde_json::json!({ "mode": 1, "query": "hello" }));
    }

    #[test]
    fn test_mode_config_names() {
        let mode: QueryMode = serde_json::from_str("\"multi\"").unwrap();
        assert_eq!(mode, QueryMode::Multi);
        assert_eq!(QueryMode::default().code(), 0);
    }

    #[test]
    fn test_mode_from_cli_text() {
        assert_eq!("Multi".parse::<QueryMode>().unwrap(), QueryMode::Multi);
        assert_eq!("0".parse::<QueryMode>().unwrap(), QueryMode::Single);
        assert!("both".parse::<QueryMode>().is_err());
    }
}
