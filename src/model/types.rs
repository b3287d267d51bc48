//! Wire-level entity structs exchanged with the search backend.

use serde::{Deserialize, Serialize};

/// A selectable artifact attached to a search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataProductRef {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl DataProductRef {
    /// Label shown next to the product checkbox, e.g. `Lab panel (dataset)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.title, self.kind)
    }
}

/// One result block. Unknown server fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data_products: Option<Vec<DataProductRef>>,
}

impl SearchResult {
    pub fn products(&self) -> &[DataProductRef] {
        self.data_products.as_deref().unwrap_or(&[])
    }
}

/// `GET /api/search` payload. Both fields may be missing on a degraded backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Option<Vec<SearchResult>>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl SearchResponse {
    pub fn results(&self) -> &[SearchResult] {
        self.results.as_deref().unwrap_or(&[])
    }

    pub fn find_product(&self, id: i64) -> Option<&DataProductRef> {
        self.results()
            .iter()
            .flat_map(SearchResult::products)
            .find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collection {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /api/collections`. A missing description is sent as `null`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewCollection {
    pub title: String,
    pub description: Option<String>,
}

/// Body of `POST /api/collections/{id}/items`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CollectionItems {
    pub data_product_ids: Vec<i64>,
}

/// Body of `POST /api/search-history`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SaveSearchRecord {
    pub query: String,
    pub category: String,
    pub results_count: usize,
    pub is_saved: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body shape used by every endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Only plain string details are user-presentable; validation arrays are not.
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoginToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    /// Stored rows may carry `null` here.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub filters: Option<serde_json::Value>,
    #[serde(default)]
    pub results_count: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedSearch {
    pub id: i64,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub filters: Option<serde_json::Value>,
    #[serde(default)]
    pub results_count: Option<i64>,
    #[serde(default)]
    pub last_used: Option<String>,
    #[serde(default)]
    pub use_count: Option<i64>,
}

/// Parameters returned by `POST /api/saved-searches/{id}/execute`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExecutedSearch {
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub filters: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub success: bool,
}

/// Render a backend timestamp (`2024-03-01T10:00:00.123456`, with or without
/// offset) as `2024-03-01 10:00`. Unparseable input is returned unchanged.
pub fn display_timestamp(raw: &str) -> String {
    use chrono::{DateTime, NaiveDateTime};

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_utc().format("%Y-%m-%d %H:%M").to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}
