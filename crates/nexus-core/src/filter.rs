use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_GEO_RADIUS_KM, INTENSITY_MAX, INTENSITY_MIN};
use crate::time::{Timestamp, parse_iso8601, to_iso8601};
use crate::timeline::TimeRange;

static FACET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_-]+):(\S.*)$").unwrap());

/// Facet keys owned by the advanced filter set. Applying an advanced set
/// replaces every token with one of these keys.
const ADVANCED_KEYS: [&str; 6] = ["intensity", "mood", "verified", "category", "date", "radius"];

/// Atomic unit of a composed query: a free term or a `key:value` facet.
/// Always trimmed and non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilterToken(String);

impl FilterToken {
    /// Trim and validate. Empty input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    fn facet(key: &str, value: impl fmt::Display) -> Self {
        Self(format!("{key}:{value}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(key, value)` when this token is a facet.
    pub fn as_facet(&self) -> Option<(&str, &str)> {
        let caps = FACET.captures(&self.0)?;
        let key = caps.get(1)?.as_str();
        let value = caps.get(2)?.as_str();
        Some((key, value))
    }

    pub fn is_facet(&self) -> bool {
        self.as_facet().is_some()
    }

    fn is_advanced_facet(&self) -> bool {
        self.as_facet()
            .is_some_and(|(key, _)| ADVANCED_KEYS.contains(&key))
    }
}

impl TryFrom<String> for FilterToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| "filter token must not be empty".to_string())
    }
}

impl From<FilterToken> for String {
    fn from(token: FilterToken) -> Self {
        token.0
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Mixed => "mixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }
}

/// Structured filters from the advanced panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedFilterSet {
    pub intensity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub verified_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<TimeRange>,
    pub geo_radius_km: f64,
}

impl Default for AdvancedFilterSet {
    fn default() -> Self {
        Self {
            intensity: INTENSITY_MIN,
            mood: None,
            verified_only: false,
            category: None,
            date_range: None,
            geo_radius_km: DEFAULT_GEO_RADIUS_KM,
        }
    }
}

impl AdvancedFilterSet {
    /// Clamp intensity into `1..=10`, radius to `>= 0`, drop blank categories.
    pub fn normalized(mut self) -> Self {
        self.intensity = self.intensity.clamp(INTENSITY_MIN, INTENSITY_MAX);
        if !self.geo_radius_km.is_finite() || self.geo_radius_km < 0.0 {
            self.geo_radius_km = 0.0;
        }
        self.category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self
    }

    /// Facet tokens equivalent to this set. Defaults produce no token.
    pub fn to_tokens(&self) -> Vec<FilterToken> {
        let mut tokens = Vec::new();
        if self.intensity > INTENSITY_MIN {
            tokens.push(FilterToken::facet("intensity", self.intensity));
        }
        if let Some(mood) = self.mood {
            tokens.push(FilterToken::facet("mood", mood.as_str()));
        }
        if self.verified_only {
            tokens.push(FilterToken::facet("verified", "true"));
        }
        if let Some(category) = &self.category {
            tokens.push(FilterToken::facet("category", category));
        }
        if let Some(range) = self.date_range {
            tokens.push(FilterToken::facet(
                "date",
                format!("{}..{}", to_iso8601(range.start), to_iso8601(range.end)),
            ));
        }
        if (self.geo_radius_km - DEFAULT_GEO_RADIUS_KM).abs() > f64::EPSILON {
            tokens.push(FilterToken::facet(
                "radius",
                format!("{}km", self.geo_radius_km),
            ));
        }
        tokens
    }

    /// Rebuild a set from materialized facets. Unparseable values keep the
    /// default for that field.
    pub fn from_tokens(tokens: &[FilterToken]) -> Self {
        let mut set = Self::default();
        for (key, value) in tokens.iter().filter_map(|t| t.as_facet()) {
            match key {
                "intensity" => {
                    if let Ok(n) = value.parse::<u8>() {
                        set.intensity = n;
                    }
                }
                "mood" => {
                    if let Some(mood) = Mood::parse(value) {
                        set.mood = Some(mood);
                    }
                }
                "verified" => set.verified_only = value == "true",
                "category" => set.category = Some(value.to_string()),
                "date" => {
                    if let Some((a, b)) = value.split_once("..")
                        && let (Some(a), Some(b)) = (parse_iso8601(a), parse_iso8601(b))
                    {
                        set.date_range = Some(TimeRange::new(a, b));
                    }
                }
                "radius" => {
                    if let Ok(km) = value.trim_end_matches("km").parse::<f64>() {
                        set.geo_radius_km = km;
                    }
                }
                _ => {}
            }
        }
        set.normalized()
    }
}

/// Canonical query description handed to query execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComposedQuery {
    pub tokens: Vec<FilterToken>,
    pub advanced: AdvancedFilterSet,
}

impl ComposedQuery {
    /// Free terms joined by a space.
    pub fn free_text(&self) -> String {
        self.tokens
            .iter()
            .filter(|t| !t.is_facet())
            .map(FilterToken::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn facets(&self) -> Vec<(&str, &str)> {
        self.tokens.iter().filter_map(|t| t.as_facet()).collect()
    }

    /// One-line description, `*` for the empty query.
    pub fn describe(&self) -> String {
        if self.tokens.is_empty() {
            "*".to_string()
        } else {
            self.tokens
                .iter()
                .map(FilterToken::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        }
    }
}

/// Immutable snapshot of a token configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: Uuid,
    pub name: String,
    pub tokens: Vec<FilterToken>,
    pub created_at: Timestamp,
}

impl SavedSearch {
    /// Parse a stored payload. Missing fields, wrong types, empty or
    /// duplicate tokens all reject the payload.
    pub fn from_json_value(value: serde_json::Value) -> Option<Self> {
        let search: Self = serde_json::from_value(value).ok()?;
        let mut seen = std::collections::HashSet::new();
        if !search.tokens.iter().all(|t| seen.insert(t.as_str())) {
            return None;
        }
        Some(search)
    }
}

/// Active filter state: the ordered token sequence plus the advanced set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryModel {
    tokens: Vec<FilterToken>,
    advanced: AdvancedFilterSet,
}

impl QueryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[FilterToken] {
        &self.tokens
    }

    pub fn advanced(&self) -> &AdvancedFilterSet {
        &self.advanced
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Append a token. Empty or already-present input is a silent no-op;
    /// the return value says whether anything changed.
    pub fn add_filter(&mut self, raw: &str) -> bool {
        match FilterToken::parse(raw) {
            Some(token) if !self.tokens.contains(&token) => {
                self.tokens.push(token);
                true
            }
            _ => false,
        }
    }

    /// Remove the first matching token. Absent tokens are ignored.
    pub fn remove_filter(&mut self, raw: &str) -> bool {
        let Some(token) = FilterToken::parse(raw) else {
            return false;
        };
        match self.tokens.iter().position(|t| *t == token) {
            Some(idx) => {
                self.tokens.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Store the set and materialize its facets, replacing facets from any
    /// earlier application.
    pub fn apply_advanced_filters(&mut self, set: AdvancedFilterSet) {
        let set = set.normalized();
        self.tokens.retain(|t| !t.is_advanced_facet());
        for token in set.to_tokens() {
            if !self.tokens.contains(&token) {
                self.tokens.push(token);
            }
        }
        self.advanced = set;
    }

    pub fn compose_query(&self) -> ComposedQuery {
        ComposedQuery {
            tokens: self.tokens.clone(),
            advanced: self.advanced.clone(),
        }
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
        self.advanced = AdvancedFilterSet::default();
    }

    /// Snapshot the current tokens. A blank name falls back to the query
    /// description.
    pub fn save_search(&self, name: &str, now: Timestamp) -> SavedSearch {
        let name = name.trim();
        let name = if name.is_empty() {
            self.compose_query().describe()
        } else {
            name.to_string()
        };
        SavedSearch {
            id: Uuid::new_v4(),
            name,
            tokens: self.tokens.clone(),
            created_at: now,
        }
    }

    /// Replace the live tokens with a snapshot's; the advanced set is
    /// rebuilt from the snapshot's facets.
    pub fn apply_saved_search(&mut self, search: &SavedSearch) {
        let mut tokens: Vec<FilterToken> = Vec::with_capacity(search.tokens.len());
        for token in &search.tokens {
            if !tokens.contains(token) {
                tokens.push(token.clone());
            }
        }
        self.advanced = AdvancedFilterSet::from_tokens(&tokens);
        self.tokens = tokens;
    }
}
