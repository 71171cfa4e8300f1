//! Flagged-result and clear-history records
//!
//! A search hit crossing the review threshold becomes a `FlaggedResult`.
//! Clearing it requires a human-entered reason and moves it to the
//! append-only clear history. There is no un-clear.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::search::SearchHit;

/// An active flagged result awaiting human disposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedResult {
    /// Stable content key (idempotence under duplicate identical hits)
    pub key: String,
    pub hit: SearchHit,
    pub flagged_at: DateTime<Utc>,
}

/// One entry of the append-only clear-history log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearRecord {
    pub key: String,
    pub hit: SearchHit,
    pub reason: String,
    pub cleared_at: DateTime<Utc>,
}

/// Derive the stable identity key of a search hit
///
/// Two identical results from repeated searches hash to the same key, so
/// re-flagging is a no-op. The raw `extra` map is excluded: backends append
/// volatile bookkeeping fields there.
pub fn flag_key(hit: &SearchHit) -> String {
    let mut hasher = Sha256::new();
    for part in [
        hit.full_name.as_deref(),
        hit.first_name.as_deref(),
        hit.second_name.as_deref(),
        hit.third_name.as_deref(),
        hit.source.as_deref(),
        hit.country.as_deref(),
        hit.entity_type.as_deref(),
    ] {
        hasher.update(part.unwrap_or("").as_bytes());
        hasher.update([0u8]);
    }
    if let Some(similarity) = hit.similarity_percentage {
        hasher.update(similarity.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(name: &str, similarity: f64) -> SearchHit {
        SearchHit {
            full_name: Some(name.to_string()),
            similarity_percentage: Some(similarity),
            source: Some("OFAC".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn identical_hits_share_a_key() {
        assert_eq!(flag_key(&hit("John Smith", 95.0)), flag_key(&hit("John Smith", 95.0)));
    }

    #[test]
    fn different_hits_get_different_keys() {
        assert_ne!(flag_key(&hit("John Smith", 95.0)), flag_key(&hit("Jon Smith", 95.0)));
        assert_ne!(flag_key(&hit("John Smith", 95.0)), flag_key(&hit("John Smith", 96.0)));
    }

    #[test]
    fn volatile_extra_fields_do_not_change_the_key() {
        let mut a = hit("John Smith", 95.0);
        a.extra.insert("fetchedAt".into(), serde_json::json!("2026-01-01"));
        let b = hit("John Smith", 95.0);
        assert_eq!(flag_key(&a), flag_key(&b));
    }
}
