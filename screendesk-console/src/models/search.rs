//! Ad-hoc search result types (backend `/api/search/search` contract)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::batch::NOT_APPLICABLE;

/// One result of a live name search against the compliance backend
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(
        rename = "similarityPercentage",
        skip_serializing_if = "Option::is_none"
    )]
    pub similarity_percentage: Option<f64>,

    #[serde(rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(rename = "secondName", skip_serializing_if = "Option::is_none")]
    pub second_name: Option<String>,

    #[serde(rename = "thirdName", skip_serializing_if = "Option::is_none")]
    pub third_name: Option<String>,

    #[serde(rename = "fullName", alias = "full_name", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    /// Backend fields outside the known schema
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SearchHit {
    /// Best available display name
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

    /// Similarity with absent treated as zero (never flags)
    pub fn similarity(&self) -> f64 {
        self.similarity_percentage.unwrap_or(0.0)
    }
}
