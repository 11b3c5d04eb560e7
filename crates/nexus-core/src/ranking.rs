//! Result ordering and optimistic viewer interactions.
//!
//! Like/corroborate/save flip the viewer flags and adjust the counters
//! locally and synchronously. Persisting the interaction is the caller's
//! concern; toggling again reverts it.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// One experience returned by query execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: Uuid,
    pub author: String,
    pub created_at: Timestamp,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub intensity: u8,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub corroborations: u32,
    #[serde(default)]
    pub saved: bool,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub corroborated_by_viewer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl ResultRecord {
    pub fn relevance(&self) -> u64 {
        self.likes as u64 + 2 * self.corroborations as u64
    }

    pub fn toggle_like(&mut self) {
        self.liked = !self.liked;
        self.likes = bump(self.likes, self.liked);
    }

    pub fn toggle_corroboration(&mut self) {
        self.corroborated_by_viewer = !self.corroborated_by_viewer;
        self.corroborations = bump(self.corroborations, self.corroborated_by_viewer);
    }

    /// Saving has no public counter.
    pub fn toggle_save(&mut self) {
        self.saved = !self.saved;
    }
}

fn bump(count: u32, up: bool) -> u32 {
    if up {
        count.saturating_add(1)
    } else {
        count.saturating_sub(1)
    }
}

/// Sort order of the result list. Wire names match the stored UI setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOption {
    /// Descending `likes + 2 * corroborations`.
    #[default]
    #[serde(rename = "relevanz")]
    Relevance,
    /// Newest first.
    #[serde(rename = "datum")]
    Date,
    /// Descending likes.
    #[serde(rename = "popularitaet")]
    Popularity,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevanz",
            Self::Date => "datum",
            Self::Popularity => "popularitaet",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "relevanz" | "relevance" => Some(Self::Relevance),
            "datum" | "date" => Some(Self::Date),
            "popularitaet" | "popularität" | "popularity" => Some(Self::Popularity),
            _ => None,
        }
    }
}

/// Stable sort: ties keep the executor's order.
pub fn sort_results(results: &mut [ResultRecord], option: SortOption) {
    match option {
        SortOption::Relevance => results.sort_by_key(|r| Reverse(r.relevance())),
        SortOption::Date => results.sort_by_key(|r| Reverse(r.created_at)),
        SortOption::Popularity => results.sort_by_key(|r| Reverse(r.likes)),
    }
}

/// Owned result list with id-addressed interactions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<ResultRecord>,
    sort: SortOption,
}

impl ResultSet {
    pub fn new(records: Vec<ResultRecord>, sort: SortOption) -> Self {
        let mut set = Self { records, sort };
        sort_results(&mut set.records, sort);
        set
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sort_option(&self) -> SortOption {
        self.sort
    }

    pub fn get(&self, id: Uuid) -> Option<&ResultRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Re-sort under a new option.
    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
        sort_results(&mut self.records, sort);
    }

    /// Interactions do not re-sort; the list stays put under the viewer's
    /// cursor until the next explicit sort.
    pub fn toggle_like(&mut self, id: Uuid) -> Option<&ResultRecord> {
        self.with_record(id, ResultRecord::toggle_like)
    }

    pub fn toggle_corroboration(&mut self, id: Uuid) -> Option<&ResultRecord> {
        self.with_record(id, ResultRecord::toggle_corroboration)
    }

    pub fn toggle_save(&mut self, id: Uuid) -> Option<&ResultRecord> {
        self.with_record(id, ResultRecord::toggle_save)
    }

    fn with_record(&mut self, id: Uuid, f: fn(&mut ResultRecord)) -> Option<&ResultRecord> {
        let record = self.records.iter_mut().find(|r| r.id == id)?;
        f(record);
        Some(record)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(likes: u32, corroborations: u32, created_at: Timestamp) -> ResultRecord {
        ResultRecord {
            id: Uuid::new_v4(),
            author: "anon".to_string(),
            created_at,
            summary: String::new(),
            tags: Vec::new(),
            intensity: 5,
            likes,
            corroborations,
            saved: false,
            liked: false,
            corroborated_by_viewer: false,
            location: None,
        }
    }

    #[test]
    fn test_relevance_weights_corroborations_double() {
        let mut results = vec![record(5, 0, 0), record(1, 3, 0), record(6, 0, 0)];
        let ids: Vec<Uuid> = results.iter().map(|r| r.id).collect();
        sort_results(&mut results, SortOption::Relevance);
        // 7, 6, 5
        assert_eq!(
            results.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![ids[1], ids[2], ids[0]]
        );
    }

    #[test]
    fn test_date_sort_newest_first() {
        let mut results = vec![record(0, 0, 10), record(0, 0, 30), record(0, 0, 20)];
        sort_results(&mut results, SortOption::Date);
        let dates: Vec<_> = results.iter().map(|r| r.created_at).collect();
        assert_eq!(dates, vec![30, 20, 10]);
    }

    #[test]
    fn test_popularity_ignores_corroborations() {
        let mut results = vec![record(2, 10, 0), record(3, 0, 0)];
        sort_results(&mut results, SortOption::Popularity);
        assert_eq!(results[0].likes, 3);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let mut results = vec![record(1, 0, 0), record(1, 0, 0), record(1, 0, 0)];
        let ids: Vec<Uuid> = results.iter().map(|r| r.id).collect();
        sort_results(&mut results, SortOption::Popularity);
        assert_eq!(results.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_toggle_like_is_reversible() {
        let mut r = record(4, 0, 0);
        r.toggle_like();
        assert!(r.liked);
        assert_eq!(r.likes, 5);
        r.toggle_like();
        assert!(!r.liked);
        assert_eq!(r.likes, 4);
    }

    #[test]
    fn test_unlike_never_underflows() {
        let mut r = record(0, 0, 0);
        r.liked = true;
        r.toggle_like();
        assert_eq!(r.likes, 0);
    }

    #[test]
    fn test_toggle_corroboration_and_save() {
        let mut r = record(0, 2, 0);
        r.toggle_corroboration();
        assert!(r.corroborated_by_viewer);
        assert_eq!(r.corroborations, 3);
        r.toggle_save();
        assert!(r.saved);
        r.toggle_save();
        assert!(!r.saved);
    }

    #[test]
    fn test_result_set_toggles_by_id() {
        let a = record(1, 0, 0);
        let id = a.id;
        let mut set = ResultSet::new(vec![a, record(0, 0, 0)], SortOption::Relevance);
        assert_eq!(set.toggle_like(id).map(|r| r.likes), Some(2));
        assert!(set.toggle_save(Uuid::new_v4()).is_none());
        assert_eq!(set.get(id).map(|r| r.liked), Some(true));
    }

    #[test]
    fn test_result_set_resorts_on_option_change() {
        let set_records = vec![record(9, 0, 1), record(0, 0, 2)];
        let mut set = ResultSet::new(set_records, SortOption::Popularity);
        assert_eq!(set.records()[0].likes, 9);
        set.set_sort(SortOption::Date);
        assert_eq!(set.records()[0].created_at, 2);
    }

    #[test]
    fn test_sort_option_wire_names() {
        assert_eq!(
            serde_json::to_string(&SortOption::Popularity).unwrap(),
            "\"popularitaet\""
        );
        assert_eq!(SortOption::parse("Datum"), Some(SortOption::Date));
        assert_eq!(SortOption::parse("nope"), None);
    }
}
