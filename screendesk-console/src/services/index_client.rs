//! Search index client
//!
//! Issues fuzzy `multi_match` queries against the external full-text index.
//! Fuzzy matching and ranking live entirely inside the engine; this client
//! only shapes the request and decodes scored hits.

use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::models::{CandidateData, CandidateMatch};

const USER_AGENT: &str = concat!("ScreenDesk/", env!("CARGO_PKG_VERSION"));

/// Fields the fuzzy query spans, matching the index mapping
const QUERY_FIELDS: [&str; 6] = [
    "firstName",
    "secondName",
    "thirdName",
    "full_name",
    "aka",
    "aliasNames",
];

/// Top-K candidates requested per row
pub const TOP_K: usize = 5;

/// Index client errors, one variant per failure class
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Query timed out")]
    Timeout,

    #[error("Index error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of scored candidates for a name
///
/// Seam between the batch pipeline and the network: production uses
/// `IndexClient`, tests substitute a scripted source.
pub trait MatchSource: Send + Sync {
    fn top_matches(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<CandidateMatch>, IndexError>> + Send;
}

/// Wire shape of an `_search` response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: CandidateData,
}

/// HTTP client for the external search index
pub struct IndexClient {
    http_client: reqwest::Client,
    base_url: String,
    index_name: String,
}

impl IndexClient {
    pub fn new(base_url: &str, index_name: &str, timeout: Duration) -> Result<Self, IndexError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| IndexError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index_name: index_name.to_string(),
        })
    }

    /// Query the index for the top scored candidates for one name
    ///
    /// `fuzziness: AUTO` lets the engine pick edit-distance tolerance by
    /// term length.
    pub async fn search(&self, name: &str) -> Result<Vec<CandidateMatch>, IndexError> {
        let url = format!("{}/{}/_search", self.base_url, self.index_name);
        let body = json!({
            "query": {
                "multi_match": {
                    "query": name,
                    "fields": QUERY_FIELDS,
                    "fuzziness": "AUTO"
                }
            },
            "size": TOP_K
        });

        tracing::debug!(name = %name, url = %url, "Querying search index");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IndexError::Timeout
                } else {
                    IndexError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(IndexError::Api(status.as_u16(), error_text));
        }

        let decoded: SearchResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Parse(e.to_string()))?;

        let candidates = decoded
            .hits
            .hits
            .into_iter()
            .map(|hit| CandidateMatch {
                score: hit.score.unwrap_or(0.0),
                data: hit.source,
            })
            .collect();

        Ok(candidates)
    }
}

impl MatchSource for IndexClient {
    fn top_matches(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<CandidateMatch>, IndexError>> + Send {
        self.search(name)
    }
}
