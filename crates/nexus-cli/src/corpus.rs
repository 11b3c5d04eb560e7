//! Query execution against a JSON corpus file.
//!
//! The file holds an array of result records. Matching is deliberately
//! plain: every free term must occur in the summary, author or tags, and
//! each facet narrows the set.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nexus_core::{ExecutionError, FilterToken, QueryExecutor, QueryRequest, ResultRecord};

pub struct CorpusExecutor {
    path: PathBuf,
}

impl CorpusExecutor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueryExecutor for CorpusExecutor {
    async fn execute(&self, request: &QueryRequest) -> Result<Vec<ResultRecord>, ExecutionError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ExecutionError::Unavailable(format!("{}: {e}", self.path.display()))
        })?;
        let records: Vec<ResultRecord> = serde_json::from_str(&raw).map_err(|e| {
            ExecutionError::Unavailable(format!("corpus {} is malformed: {e}", self.path.display()))
        })?;
        let matched: Vec<ResultRecord> = records
            .into_iter()
            .filter(|r| matches(request, r))
            .collect();
        tracing::debug!(
            query = %request.query,
            filters = request.filters.len(),
            matched = matched.len(),
            "corpus query"
        );
        Ok(matched)
    }
}

pub fn matches(request: &QueryRequest, record: &ResultRecord) -> bool {
    if !request.time_range.contains(record.created_at) {
        return false;
    }
    let advanced = &request.advanced;
    if record.intensity < advanced.intensity {
        return false;
    }
    if let Some(range) = advanced.date_range
        && !range.contains(record.created_at)
    {
        return false;
    }
    if advanced.verified_only && record.corroborations == 0 {
        return false;
    }
    if let Some(mood) = advanced.mood
        && !has_tag(record, mood.as_str())
    {
        return false;
    }
    if let Some(category) = &advanced.category
        && !has_tag(record, category)
    {
        return false;
    }

    let haystack = format!(
        "{} {} {}",
        record.summary.to_lowercase(),
        record.author.to_lowercase(),
        record.tags.join(" ").to_lowercase()
    );
    let terms_match = request
        .query
        .split_whitespace()
        .all(|term| haystack.contains(&term.to_lowercase()));

    terms_match && request.filters.iter().all(|t| facet_matches(t, record))
}

/// Facets owned by the advanced set were already checked; other facets
/// must appear as a `key:value` tag or as a plain tag equal to the value.
fn facet_matches(token: &FilterToken, record: &ResultRecord) -> bool {
    match token.as_facet() {
        Some(("intensity" | "mood" | "verified" | "category" | "date" | "radius", _)) => true,
        Some(("author", value)) => record.author.eq_ignore_ascii_case(value),
        Some((_, value)) => has_tag(record, token.as_str()) || has_tag(record, value),
        None => true,
    }
}

fn has_tag(record: &ResultRecord, tag: &str) -> bool {
    record.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

pub fn load(path: &Path) -> Result<Vec<ResultRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read corpus {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("malformed corpus {}", path.display()))
}

pub fn save(path: &Path, records: &[ResultRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).context("failed to encode corpus")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::{AdvancedFilterSet, DAY_MS, Mood, TimeRange};
    use uuid::Uuid;

    const NOW: i64 = 1_771_632_000_000;

    fn record(summary: &str, tags: &[&str]) -> ResultRecord {
        ResultRecord {
            id: Uuid::new_v4(),
            author: "mara".into(),
            created_at: NOW - DAY_MS,
            summary: summary.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            intensity: 6,
            likes: 0,
            corroborations: 0,
            saved: false,
            liked: false,
            corroborated_by_viewer: false,
            location: None,
        }
    }

    fn request(query: &str, filters: &[&str]) -> QueryRequest {
        let filters: Vec<FilterToken> =
            filters.iter().filter_map(|f| FilterToken::parse(f)).collect();
        QueryRequest {
            query: query.into(),
            advanced: AdvancedFilterSet::from_tokens(&filters),
            filters,
            time_range: TimeRange::new(NOW - 30 * DAY_MS, NOW),
        }
    }

    #[test]
    fn test_all_terms_required() {
        let r = record("Lucid dream over the sea", &[]);
        assert!(matches(&request("lucid sea", &[]), &r));
        assert!(!matches(&request("lucid forest", &[]), &r));
    }

    #[test]
    fn test_time_range_applies() {
        let mut r = record("dream", &[]);
        r.created_at = NOW - 90 * DAY_MS;
        assert!(!matches(&request("dream", &[]), &r));
    }

    #[test]
    fn test_advanced_facets() {
        let r = record("dream", &["positive", "dreams"]);
        assert!(matches(&request("", &["mood:positive", "category:dreams"]), &r));
        assert!(!matches(&request("", &["intensity:7"]), &r));
        assert!(!matches(&request("", &["verified:true"]), &r));
        assert_eq!(Mood::parse("positive"), Some(Mood::Positive));
    }

    #[test]
    fn test_other_facets_match_tags_or_author() {
        let r = record("dream", &["place:berlin"]);
        assert!(matches(&request("", &["place:berlin"]), &r));
        assert!(matches(&request("", &["author:MARA"]), &r));
        assert!(!matches(&request("", &["place:paris"]), &r));
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let executor = CorpusExecutor::new("/nonexistent/corpus.json");
        let err = executor.execute(&request("x", &[])).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_executes_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        save(&path, &[record("lucid dream", &[]), record("walk", &[])]).unwrap();
        let found = CorpusExecutor::new(&path)
            .execute(&request("dream", &[]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
