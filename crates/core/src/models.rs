use crate::error::SearchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RESULT_LIMIT: usize = 10;
pub const MAX_RESULT_LIMIT: usize = 50;
pub const DEFAULT_SNIPPET_WINDOW: usize = 240;

/// Okapi BM25 tuning: `k1` controls term-frequency saturation and `b` the
/// strength of document-length normalization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<(), SearchError> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(SearchError::InvalidInput(format!(
                "k1 must be a finite non-negative number, got {}",
                self.k1
            )));
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(SearchError::InvalidInput(format!(
                "b must be within [0, 1], got {}",
                self.b
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub params: Bm25Params,
    pub snippet_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            params: Bm25Params::default(),
            snippet_window: DEFAULT_SNIPPET_WINDOW,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub max_pages: Option<usize>,
    pub skip_empty: bool,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            max_pages: None,
            skip_empty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub doc_id: String,
    pub filename: String,
    pub score: f64,
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStatus {
    pub num_docs: usize,
    pub indexed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub doc_id: String,
    pub filename: String,
    pub text_chars: usize,
    pub token_count: usize,
    pub added_at: DateTime<Utc>,
}

/// Rejects result limits outside `1..=MAX_RESULT_LIMIT`.
pub fn validate_limit(limit: usize) -> Result<usize, SearchError> {
    if limit == 0 || limit > MAX_RESULT_LIMIT {
        return Err(SearchError::InvalidInput(format!(
            "limit must be between 1 and {MAX_RESULT_LIMIT}, got {limit}"
        )));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_standard_okapi() {
        let params = Bm25Params::default();
        assert_eq!(params.k1, 1.5);
        assert_eq!(params.b, 0.75);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn out_of_range_params_are_rejected() {
        assert!(Bm25Params { k1: -0.1, b: 0.5 }.validate().is_err());
        assert!(Bm25Params { k1: 1.2, b: 1.5 }.validate().is_err());
        assert!(Bm25Params { k1: f64::NAN, b: 0.5 }.validate().is_err());
    }

    #[test]
    fn limit_bounds() {
        assert!(validate_limit(0).is_err());
        assert_eq!(validate_limit(1), Ok(1));
        assert_eq!(validate_limit(MAX_RESULT_LIMIT), Ok(MAX_RESULT_LIMIT));
        assert!(validate_limit(MAX_RESULT_LIMIT + 1).is_err());
    }

    #[test]
    fn status_serializes_with_client_field_names() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(IndexStatus {
            num_docs: 3,
            indexed: false,
        })?;
        assert_eq!(json, serde_json::json!({ "num_docs": 3, "indexed": false }));
        Ok(())
    }
}
