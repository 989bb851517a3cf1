use crate::error::SearchError;
use crate::models::DocumentSummary;
use crate::tokenizer::tokenize;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// A stored document. Fields are private so `tokens` can only ever be the
/// tokenization of `text` taken when the document was created.
#[derive(Debug, Clone)]
pub struct Document {
    id: String,
    label: String,
    text: String,
    tokens: Vec<String>,
    added_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: impl Into<String>, label: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = tokenize(&text);
        Self {
            id: id.into(),
            label: label.into(),
            text,
            tokens,
            added_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            doc_id: self.id.clone(),
            filename: self.label.clone(),
            text_chars: self.text.chars().count(),
            token_count: self.tokens.len(),
            added_at: self.added_at,
        }
    }
}

impl AsRef<[String]> for Document {
    fn as_ref(&self) -> &[String] {
        &self.tokens
    }
}

/// Documents in insertion order. A document's position here is the position
/// the ranking index refers to.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    ids: HashSet<String>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: &str, label: &str, text: &str) -> Result<&Document, SearchError> {
        if self.ids.contains(id) {
            return Err(SearchError::DuplicateId(id.to_string()));
        }

        self.ids.insert(id.to_string());
        self.documents.push(Document::new(id, label, text));
        let position = self.documents.len() - 1;
        Ok(&self.documents[position])
    }

    pub fn all(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        if !self.ids.contains(id) {
            return None;
        }
        self.documents.iter().find(|document| document.id == id)
    }

    pub fn size(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.ids.clear();
    }

    /// Token sequences of every document, in store order.
    pub fn corpus(&self) -> Vec<Vec<String>> {
        self.documents
            .iter()
            .map(|document| document.tokens.clone())
            .collect()
    }
}
