use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{AdvancedFilterSet, ComposedQuery, FilterToken};
use crate::ranking::ResultRecord;
use crate::timeline::TimeRange;

/// Everything query execution needs, in one owned value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    pub filters: Vec<FilterToken>,
    pub advanced: AdvancedFilterSet,
    pub time_range: TimeRange,
}

impl QueryRequest {
    /// Request for the live filter state: free terms become the query
    /// string, the full token sequence travels as filters.
    pub fn from_composed(composed: &ComposedQuery, time_range: TimeRange) -> Self {
        Self {
            query: composed.free_text(),
            filters: composed.tokens.clone(),
            advanced: composed.advanced.clone(),
            time_range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("query backend unavailable: {0}")]
    Unavailable(String),
    #[error("query rejected: {0}")]
    Rejected(String),
}

/// Runs a query against the corpus. The search algorithm itself lives
/// behind this port.
pub trait QueryExecutor: Send + Sync {
    fn execute(
        &self,
        request: &QueryRequest,
    ) -> impl Future<Output = Result<Vec<ResultRecord>, ExecutionError>> + Send;
}
