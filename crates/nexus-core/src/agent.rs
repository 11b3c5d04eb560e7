use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::{DAY_MS, HOUR_MS};
use crate::filter::{AdvancedFilterSet, ComposedQuery, FilterToken, QueryModel};
use crate::search::QueryRequest;
use crate::time::Timestamp;
use crate::timeline::TimeDomain;

/// How often an agent re-runs its query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Hourly,
    #[default]
    Daily,
    Weekly,
    /// Fixed 30 days, not calendar months.
    Monthly,
}

impl Cadence {
    pub fn interval_ms(&self) -> i64 {
        match self {
            Self::Hourly => HOUR_MS,
            Self::Daily => DAY_MS,
            Self::Weekly => 7 * DAY_MS,
            Self::Monthly => 30 * DAY_MS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("agent name must not be empty")]
    EmptyName,
    #[error("agent needs a query or at least one filter")]
    EmptyQuery,
}

/// Unvalidated agent definition as entered by the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub schedule: Cadence,
    #[serde(default = "default_notify")]
    pub notify_on_results: bool,
    #[serde(default)]
    pub color: Option<String>,
}

fn default_notify() -> bool {
    true
}

impl AgentDraft {
    pub fn new(name: &str, query: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            query: query.to_string(),
            filters: Vec::new(),
            schedule: Cadence::default(),
            notify_on_results: true,
            color: None,
        }
    }

    pub fn with_schedule(mut self, schedule: Cadence) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = filters.into_iter().map(Into::into).collect();
        self
    }
}

/// A persisted, independently scheduled recurring search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub query: String,
    pub filters: Vec<FilterToken>,
    pub schedule: Cadence,
    pub notify_on_results: bool,
    pub active: bool,
    pub color: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result_ids: Option<BTreeSet<Uuid>>,
}

impl Agent {
    /// Validate a draft. Filters are trimmed and deduplicated the same way
    /// the live query model treats tokens.
    pub fn create(
        draft: AgentDraft,
        now: Timestamp,
        fallback_color: &str,
    ) -> Result<Self, ValidationError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let mut filters: Vec<FilterToken> = Vec::new();
        for token in draft.filters.iter().filter_map(|f| FilterToken::parse(f)) {
            if !filters.contains(&token) {
                filters.push(token);
            }
        }

        let query = draft.query.trim();
        if query.is_empty() && filters.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }

        let color = draft
            .color
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| fallback_color.to_string());

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: draft
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            query: query.to_string(),
            filters,
            schedule: draft.schedule,
            notify_on_results: draft.notify_on_results,
            active: true,
            color,
            created_at: now,
            last_run: None,
            last_result_ids: None,
        })
    }

    /// The agent's own query, independent of the live filter state.
    pub fn compose_query(&self) -> ComposedQuery {
        let mut model = QueryModel::new();
        model.add_filter(&self.query);
        for filter in &self.filters {
            model.add_filter(filter.as_str());
        }
        let mut composed = model.compose_query();
        composed.advanced = AdvancedFilterSet::from_tokens(&composed.tokens);
        composed
    }

    /// Execution request covering the default one-year domain ending `now`.
    pub fn query_request(&self, now: Timestamp) -> QueryRequest {
        let composed = self.compose_query();
        QueryRequest {
            query: self.query.clone(),
            filters: self.filters.clone(),
            advanced: composed.advanced,
            time_range: TimeDomain::last_year(now).as_range(),
        }
    }

    /// Instant from which the cadence has elapsed.
    pub fn due_at(&self) -> Timestamp {
        self.last_run.unwrap_or(self.created_at) + self.schedule.interval_ms()
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        now >= self.due_at()
    }

    /// Number of ids not seen by the previous successful run.
    pub fn count_new(&self, ids: &BTreeSet<Uuid>) -> usize {
        match &self.last_result_ids {
            Some(previous) => ids.difference(previous).count(),
            None => ids.len(),
        }
    }
}
