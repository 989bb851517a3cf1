use crate::models::Bm25Params;
use crate::tokenizer::unique_terms;
use std::collections::HashMap;

/// Term statistics over one snapshot of the corpus.
///
/// The index is never updated in place: it keeps answering for the corpus it
/// was built from, and a changed corpus needs a new index.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    doc_count: usize,
    avg_doc_len: f64,
    doc_lens: Vec<usize>,
    doc_freqs: HashMap<String, usize>,
    term_freqs: Vec<HashMap<String, u32>>,
}

impl Bm25Index {
    /// Builds an index over `corpus`, or `None` when the corpus is empty.
    pub fn build<S: AsRef<[String]>>(corpus: &[S], params: Bm25Params) -> Option<Self> {
        if corpus.is_empty() {
            return None;
        }

        let mut doc_lens = Vec::with_capacity(corpus.len());
        let mut doc_freqs = HashMap::<String, usize>::new();
        let mut term_freqs = Vec::with_capacity(corpus.len());
        let mut total_len = 0usize;

        for tokens in corpus {
            let tokens = tokens.as_ref();
            total_len += tokens.len();
            doc_lens.push(tokens.len());

            let mut counts = HashMap::<String, u32>::new();
            for token in tokens {
                *counts.entry(token.clone()).or_insert(0) += 1;
            }
            for term in counts.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(counts);
        }

        let doc_count = corpus.len();
        let avg_doc_len = total_len as f64 / doc_count as f64;

        tracing::debug!(
            doc_count,
            avg_doc_len,
            vocabulary = doc_freqs.len(),
            "built bm25 index"
        );

        Some(Self {
            params,
            doc_count,
            avg_doc_len,
            doc_lens,
            doc_freqs,
            term_freqs,
        })
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    pub fn avg_doc_len(&self) -> f64 {
        self.avg_doc_len
    }

    pub fn doc_len(&self, position: usize) -> Option<usize> {
        self.doc_lens.get(position).copied()
    }

    pub fn doc_freq(&self, term: &str) -> usize {
        self.doc_freqs.get(term).copied().unwrap_or(0)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.doc_freqs.len()
    }

    /// `ln((N - n + 0.5) / (n + 0.5) + 1)`; stays positive for every `n`.
    pub fn idf(&self, term: &str) -> f64 {
        let n = self.doc_count as f64;
        let df = self.doc_freq(term) as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Scores every snapshot document against the query, in snapshot order.
    /// Each distinct query term counts once.
    pub fn scores(&self, query_tokens: &[String]) -> Vec<(usize, f64)> {
        let terms = unique_terms(query_tokens)
            .into_iter()
            .map(|term| (term, self.idf(term)))
            .collect::<Vec<_>>();

        let Bm25Params { k1, b } = self.params;

        self.term_freqs
            .iter()
            .enumerate()
            .map(|(position, counts)| {
                let length_norm = if self.avg_doc_len > 0.0 {
                    1.0 - b + b * self.doc_lens[position] as f64 / self.avg_doc_len
                } else {
                    1.0 - b
                };

                let score = terms
                    .iter()
                    .map(|(term, idf)| {
                        let freq = counts.get(*term).copied().unwrap_or(0) as f64;
                        if freq == 0.0 {
                            return 0.0;
                        }
                        idf * (freq * (k1 + 1.0)) / (freq + k1 * length_norm)
                    })
                    .sum::<f64>();

                (position, score)
            })
            .collect()
    }
}
