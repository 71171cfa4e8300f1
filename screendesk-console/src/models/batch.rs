//! Batch screening data contracts
//!
//! Shapes flowing through the pipeline: parsed rows in, scored candidate
//! lists out. Candidate fields are typed and optional; the view renders an
//! absent field as "not applicable" instead of dropping it from the schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rendering rule for absent optional fields
pub const NOT_APPLICABLE: &str = "not applicable";

/// Column names accepted as the query string for a row, checked in order
const NAME_FIELDS: &[&str] = &["name", "full_name", "fullname", "full name"];

/// One parsed line of an uploaded tabular file
///
/// Field names come from the file header; column order is preserved.
/// Consumed once by the batch screener, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord {
    fields: Vec<(String, String)>,
}

impl RowRecord {
    pub fn from_pairs(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Case-insensitive field lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// The name-like field used as the fuzzy query string
    ///
    /// Returns `None` when the row has no recognized name column or the
    /// value is blank.
    pub fn display_name(&self) -> Option<&str> {
        NAME_FIELDS
            .iter()
            .filter_map(|key| self.get(key))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Stored fields of a matched watchlist entity
///
/// Every field the index may return is explicit and optional; engine fields
/// outside this schema are kept in `extra` so nothing is silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CandidateData {
    #[serde(rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(rename = "secondName", skip_serializing_if = "Option::is_none")]
    pub second_name: Option<String>,

    #[serde(rename = "thirdName", skip_serializing_if = "Option::is_none")]
    pub third_name: Option<String>,

    #[serde(rename = "full_name", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Also-known-as entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aka: Vec<String>,

    #[serde(rename = "aliasNames", default, skip_serializing_if = "Vec::is_empty")]
    pub alias_names: Vec<String>,

    /// Source list the entity came from (e.g. a sanctions programme)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(
        rename = "similarityPercentage",
        skip_serializing_if = "Option::is_none"
    )]
    pub similarity_percentage: Option<f64>,

    /// Engine fields outside the known schema
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CandidateData {
    /// Best available display name for the entity
    pub fn display_name(&self) -> String {
        if let Some(full) = self.full_name.as_deref().map(str::trim) {
            if !full.is_empty() {
                return full.to_string();
            }
        }
        let parts: Vec<&str> = [&self.first_name, &self.second_name, &self.third_name]
            .iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            NOT_APPLICABLE.to_string()
        } else {
            parts.join(" ")
        }
    }

    /// Render an optional field per the "not applicable" rule
    pub fn render(field: Option<&str>) -> &str {
        match field.map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => NOT_APPLICABLE,
        }
    }
}

/// One scored hit returned by the search index
///
/// `score` is the engine's relevance number. It is unbounded and is not a
/// percentage, whatever the UI labels may suggest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateMatch {
    pub score: f64,
    pub data: CandidateData,
}

/// Screening outcome for one input row
///
/// One per row, in input order. `matches` holds at most five candidates in
/// descending score order. A failed row carries `error` and an empty match
/// list; it never aborts the rest of the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub name: String,
    pub matches: Vec<CandidateMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResult {
    pub fn errored(&self) -> bool {
        self.error.is_some()
    }
}
