use crate::bm25::Bm25Index;
use crate::engine::{CorpusSnapshot, SearchEngine};
use crate::error::SearchError;
use crate::models::{validate_limit, DocumentSummary, EngineConfig, IndexStatus, SearchHit};
use crate::tokenizer::tokenize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to a [`SearchEngine`] for concurrent callers.
///
/// Mutations take the write lock. Searches against a built index only take
/// the read lock, and an explicit rebuild builds the new index without
/// holding any lock, so readers keep using the previous index until the swap.
#[derive(Clone, Default)]
pub struct SearchService {
    engine: Arc<RwLock<SearchEngine>>,
}

impl SearchService {
    pub fn new(config: EngineConfig) -> Result<Self, SearchError> {
        config.params.validate()?;
        Ok(Self {
            engine: Arc::new(RwLock::new(SearchEngine::new(config))),
        })
    }

    pub async fn add(&self, id: &str, label: &str, text: &str) -> Result<DocumentSummary, SearchError> {
        self.engine.write().await.add(id, label, text)
    }

    pub async fn rebuild(&self) -> IndexStatus {
        let (snapshot, index) = self.build_from_snapshot().await;
        self.install_or_rebuild(snapshot, index).await
    }

    /// Builds an index from a snapshot taken under the read lock. No lock is
    /// held while the index is built.
    async fn build_from_snapshot(&self) -> (CorpusSnapshot, Option<Bm25Index>) {
        let (snapshot, params) = {
            let engine = self.engine.read().await;
            (engine.snapshot(), engine.config().params)
        };

        let index = Bm25Index::build(&snapshot.corpus, params);
        (snapshot, index)
    }

    async fn install_or_rebuild(&self, snapshot: CorpusSnapshot, index: Option<Bm25Index>) -> IndexStatus {
        let mut engine = self.engine.write().await;
        if !engine.install(&snapshot, index) {
            tracing::debug!("store changed during rebuild, rebuilding under lock");
            return engine.rebuild();
        }
        tracing::info!(num_docs = snapshot.corpus.len(), "rebuilt search index");
        engine.status()
    }

    /// Validates `limit`, then ranks documents for `query`.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let limit = validate_limit(limit)?;
        if tokenize(query).is_empty() {
            return Ok(Vec::new());
        }

        {
            let engine = self.engine.read().await;
            if let Some(hits) = engine.search_built(query, limit) {
                return Ok(hits);
            }
        }

        let mut engine = self.engine.write().await;
        engine.ensure_built();
        let engine = engine.downgrade();
        Ok(engine.search_built(query, limit).unwrap_or_default())
    }

    pub async fn status(&self) -> IndexStatus {
        self.engine.read().await.status()
    }

    pub async fn document(&self, id: &str) -> Result<DocumentSummary, SearchError> {
        self.engine.read().await.document(id).map(|document| document.summary())
    }

    pub async fn documents(&self) -> Vec<DocumentSummary> {
        self.engine.read().await.documents()
    }

    pub async fn reset(&self) -> IndexStatus {
        self.engine.write().await.reset()
    }
}
