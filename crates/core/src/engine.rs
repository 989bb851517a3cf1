use crate::bm25::Bm25Index;
use crate::error::SearchError;
use crate::models::{DocumentSummary, EngineConfig, IndexStatus, SearchHit};
use crate::snippet::snippet;
use crate::store::{Document, DocumentStore};
use crate::tokenizer::tokenize;
use std::sync::Arc;

/// Where the ranking index stands relative to the document store.
#[derive(Debug, Clone)]
pub enum IndexState {
    /// No documents.
    Empty,
    /// Documents present but no index for the current store contents.
    Stale,
    /// The index was built from the current store contents.
    Built(Arc<Bm25Index>),
}

/// Token sequences captured at one store generation, used to build an index
/// outside of any lock.
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    pub generation: u64,
    pub corpus: Vec<Vec<String>>,
}

/// Document store plus ranking index. Every mutation goes through `&mut self`,
/// so the index state moves only by explicit transitions.
#[derive(Debug)]
pub struct SearchEngine {
    config: EngineConfig,
    store: DocumentStore,
    state: IndexState,
    generation: u64,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: DocumentStore::new(),
            state: IndexState::Empty,
            generation: 0,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn state(&self) -> &IndexState {
        &self.state
    }

    /// Adds a document and moves the engine to `Stale`.
    pub fn add(&mut self, id: &str, label: &str, text: &str) -> Result<DocumentSummary, SearchError> {
        let summary = self.store.add(id, label, text)?.summary();
        self.generation += 1;
        self.state = IndexState::Stale;
        Ok(summary)
    }

    /// Rebuilds the index from the whole store. Stays `Empty` when there is
    /// nothing to index.
    pub fn rebuild(&mut self) -> IndexStatus {
        let index = Bm25Index::build(self.store.all(), self.config.params);
        self.state = match index {
            Some(index) => IndexState::Built(Arc::new(index)),
            None => IndexState::Empty,
        };
        tracing::info!(num_docs = self.store.size(), "rebuilt search index");
        self.status()
    }

    /// Rebuilds only when the index is missing for the current documents.
    pub fn ensure_built(&mut self) {
        if matches!(self.state, IndexState::Stale) {
            self.rebuild();
        }
    }

    pub fn snapshot(&self) -> CorpusSnapshot {
        CorpusSnapshot {
            generation: self.generation,
            corpus: self.store.corpus(),
        }
    }

    /// Installs an index built from `snapshot`. Returns `false` and leaves the
    /// state alone when the store changed after the snapshot was taken.
    pub fn install(&mut self, snapshot: &CorpusSnapshot, index: Option<Bm25Index>) -> bool {
        if snapshot.generation != self.generation {
            return false;
        }
        self.state = match index {
            Some(index) => IndexState::Built(Arc::new(index)),
            None => IndexState::Empty,
        };
        true
    }

    /// Runs a query and falls back to an implicit rebuild when stale.
    pub fn search(&mut self, query: &str, limit: usize) -> Vec<SearchHit> {
        if tokenize(query).is_empty() {
            return Vec::new();
        }
        self.ensure_built();
        self.search_built(query, limit).unwrap_or_default()
    }

    /// Runs a query without touching the index state. Returns `None` when the
    /// index is stale and has to be rebuilt first.
    pub fn search_built(&self, query: &str, limit: usize) -> Option<Vec<SearchHit>> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || limit == 0 {
            return Some(Vec::new());
        }

        let index = match &self.state {
            IndexState::Empty => return Some(Vec::new()),
            IndexState::Stale => return None,
            IndexState::Built(index) => index,
        };

        let mut ranked = index.scores(&query_tokens);
        // Stable sort keeps insertion order among equal scores.
        ranked.sort_by(|left, right| right.1.total_cmp(&left.1));

        let documents = self.store.all();
        let hits = ranked
            .into_iter()
            .take(limit)
            .filter_map(|(position, score)| {
                let document = documents.get(position)?;
                Some(SearchHit {
                    doc_id: document.id().to_string(),
                    filename: document.label().to_string(),
                    score,
                    snippet: snippet(document.text(), &query_tokens, self.config.snippet_window),
                })
            })
            .collect();

        Some(hits)
    }

    pub fn status(&self) -> IndexStatus {
        IndexStatus {
            num_docs: self.store.size(),
            indexed: matches!(self.state, IndexState::Built(_)),
        }
    }

    pub fn document(&self, id: &str) -> Result<&Document, SearchError> {
        self.store
            .get(id)
            .ok_or_else(|| SearchError::NotFound(id.to_string()))
    }

    pub fn documents(&self) -> Vec<DocumentSummary> {
        self.store.all().iter().map(Document::summary).collect()
    }

    pub fn reset(&mut self) -> IndexStatus {
        self.store.clear();
        self.generation += 1;
        self.state = IndexState::Empty;
        tracing::info!("search engine reset");
        self.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bm25Params;

    fn engine_with(docs: &[(&str, &str)]) -> SearchEngine {
        let mut engine = SearchEngine::default();
        for (id, text) in docs {
            engine
                .add(id, &format!("{id}.pdf"), text)
                .expect("ids are unique");
        }
        engine
    }

    #[test]
    fn empty_engine_returns_no_results() {
        let mut engine = SearchEngine::default();
        assert!(engine.search("anything", 10).is_empty());
        assert_eq!(
            engine.status(),
            IndexStatus {
                num_docs: 0,
                indexed: false
            }
        );
        assert!(matches!(engine.state(), IndexState::Empty));
    }

    #[test]
    fn two_document_scenario_returns_both_with_positive_scores() {
        let mut engine = engine_with(&[("a", "cats and dogs"), ("b", "dogs and birds")]);
        engine.rebuild();

        let hits = engine.search("dogs", 2);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|hit| hit.score > 0.0));
        // Equal scores keep insertion order.
        assert_eq!(hits[0].doc_id, "a");
        assert_eq!(hits[1].doc_id, "b");
        assert_eq!(hits[0].filename, "a.pdf");
        assert!(hits[0].snippet.contains("dogs"));
    }

    #[test]
    fn unique_term_ranks_its_document_first() {
        let mut engine = engine_with(&[
            ("a", "pressure relief valve"),
            ("b", "hydraulic pump maintenance"),
            ("c", "electrical wiring diagram"),
        ]);

        let hits = engine.search("pump", 3);
        assert_eq!(hits[0].doc_id, "b");
        assert!(hits[0].score > 0.0);
        assert!(hits[1..].iter().all(|hit| hit.score < hits[0].score));
    }

    #[test]
    fn add_marks_stale_and_search_rebuilds_implicitly() {
        let mut engine = engine_with(&[("a", "cats and dogs")]);
        engine.rebuild();
        assert!(engine.status().indexed);

        engine.add("b", "b.pdf", "parrots").expect("unique id");
        assert!(!engine.status().indexed);
        assert!(matches!(engine.state(), IndexState::Stale));

        let hits = engine.search("parrots", 5);
        assert_eq!(hits[0].doc_id, "b");
        assert!(engine.status().indexed);
    }

    #[test]
    fn tokenless_query_returns_nothing_without_rebuilding() {
        let mut engine = engine_with(&[("a", "cats and dogs")]);
        assert!(engine.search("?!...", 10).is_empty());
        assert!(engine.search("   ", 10).is_empty());
        assert!(matches!(engine.state(), IndexState::Stale));
    }

    #[test]
    fn search_built_reports_stale_state() {
        let mut engine = engine_with(&[("a", "cats and dogs")]);
        assert!(engine.search_built("cats", 5).is_none());
        engine.rebuild();
        assert_eq!(engine.search_built("cats", 5).map(|hits| hits.len()), Some(1));
    }

    #[test]
    fn limit_bounds_result_count_and_order_is_descending() {
        let mut engine = engine_with(&[
            ("a", "valve"),
            ("b", "valve valve pump"),
            ("c", "pump"),
            ("d", "valve seal"),
            ("e", "gasket"),
        ]);

        for limit in 1..=6 {
            let hits = engine.search("valve pump", limit);
            assert!(hits.len() <= limit);
            assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
        }
        assert_eq!(engine.search("valve", 0).len(), 0);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut engine = engine_with(&[("z", "gear"), ("y", "gear"), ("x", "gear")]);
        let ids = engine
            .search("gear", 3)
            .into_iter()
            .map(|hit| hit.doc_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["z", "y", "x"]);
    }

    #[test]
    fn reset_returns_to_empty() {
        let mut engine = engine_with(&[("a", "cats"), ("b", "dogs")]);
        engine.rebuild();

        let status = engine.reset();
        assert_eq!(
            status,
            IndexStatus {
                num_docs: 0,
                indexed: false
            }
        );
        assert!(engine.search("cats", 10).is_empty());
    }

    #[test]
    fn rebuild_on_empty_engine_stays_empty() {
        let mut engine = SearchEngine::default();
        let status = engine.rebuild();
        assert!(!status.indexed);
        assert!(matches!(engine.state(), IndexState::Empty));
    }

    #[test]
    fn duplicate_add_keeps_the_built_index() {
        let mut engine = engine_with(&[("a", "cats")]);
        engine.rebuild();

        let error = engine.add("a", "again.pdf", "dogs").unwrap_err();
        assert_eq!(error, SearchError::DuplicateId("a".to_string()));
        assert!(engine.status().indexed);
    }

    #[test]
    fn install_ignores_outdated_snapshots() {
        let mut engine = engine_with(&[("a", "cats")]);
        let snapshot = engine.snapshot();
        let index = Bm25Index::build(&snapshot.corpus, Bm25Params::default());

        engine.add("b", "b.pdf", "dogs").expect("unique id");
        assert!(!engine.install(&snapshot, index.clone()));
        assert!(matches!(engine.state(), IndexState::Stale));

        let fresh = engine.snapshot();
        let index = Bm25Index::build(&fresh.corpus, Bm25Params::default());
        assert!(engine.install(&fresh, index));
        assert!(engine.status().indexed);
    }

    #[test]
    fn document_lookup() {
        let engine = engine_with(&[("a", "cats")]);
        assert_eq!(engine.document("a").map(Document::text), Ok("cats"));
        assert_eq!(
            engine.document("missing").map(Document::text),
            Err(SearchError::NotFound("missing".to_string()))
        );
        assert_eq!(engine.documents().len(), 1);
    }

    #[test]
    fn custom_snippet_window_is_used() {
        let mut engine = SearchEngine::new(EngineConfig {
            params: Bm25Params::default(),
            snippet_window: 4,
        });
        engine.add("a", "a.pdf", "abcdefgh").expect("unique id");
        engine.add("b", "b.pdf", "zzz").expect("unique id");

        let hits = engine.search("zzz", 2);
        assert_eq!(hits[1].snippet, "abcd…");
    }
}
