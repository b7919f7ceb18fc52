//! Ranked keyword index over loaded documents.
//!
//! # Scoring
//!
//! Each document is indexed on two text fields, `filename` and `content`.
//! Per field:
//!
//! 1. Tokenize: lowercase, split on non-alphanumeric characters, drop
//!    single-character tokens and English stop words.
//! 2. Weight terms by TF-IDF with smoothed IDF:
//!    `idf = ln((1 + n) / (1 + df)) + 1`.
//! 3. L2-normalize the document vector.
//!
//! A query is vectorized the same way against each field's vocabulary and
//! scored by cosine similarity. Field scores are combined as a weighted
//! mean ([`FILENAME_BOOST`] for `filename`, `1.0` for `content`), so the
//! final score lies in `[0.0, 1.0]`.
//!
//! Results are ordered by score (desc), then filename and source (asc),
//! and capped at `top_k`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::IndexError;
use crate::models::{Document, SearchHit};

/// Relative weight of a filename match against a content match.
pub const FILENAME_BOOST: f64 = 2.0;
const CONTENT_BOOST: f64 = 1.0;

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "do", "does", "for", "from", "has", "have", "how", "if", "in", "into",
    "is", "it", "its", "may", "more", "no", "not", "of", "on", "or", "other", "our", "should",
    "so", "such", "than", "that", "the", "their", "then", "there", "these", "they", "this", "to",
    "was", "we", "were", "what", "when", "which", "while", "who", "will", "with", "you", "your",
];

/// Split text into lowercase index terms.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Sparse, L2-normalized term vector. Ordered so every sum over it runs
/// in term order and identical inputs give bit-identical scores.
type TermVector = BTreeMap<String, f64>;

/// TF-IDF statistics for a single text field.
#[derive(Debug, Default)]
struct FieldIndex {
    idf: BTreeMap<String, f64>,
    vectors: Vec<TermVector>,
}

impl FieldIndex {
    fn fit(texts: &[&str]) -> Self {
        let n = texts.len() as f64;
        let term_counts: Vec<BTreeMap<String, usize>> = texts
            .iter()
            .map(|text| {
                let mut counts = BTreeMap::new();
                for term in tokenize(text) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut df: BTreeMap<&str, usize> = BTreeMap::new();
        for counts in &term_counts {
            for term in counts.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let idf: BTreeMap<String, f64> = df
            .into_iter()
            .map(|(term, df)| {
                let w = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                (term.to_string(), w)
            })
            .collect();

        let vectors = term_counts
            .iter()
            .map(|counts| {
                let raw: TermVector = counts
                    .iter()
                    .map(|(term, tf)| (term.clone(), *tf as f64 * idf[term]))
                    .collect();
                normalize(raw)
            })
            .collect();

        Self { idf, vectors }
    }

    fn vectorize(&self, terms: &[String]) -> TermVector {
        let mut raw = TermVector::new();
        for term in terms {
            if let Some(w) = self.idf.get(term) {
                *raw.entry(term.clone()).or_insert(0.0) += w;
            }
        }
        normalize(raw)
    }

    fn similarity(&self, doc: usize, query: &TermVector) -> f64 {
        let vector = &self.vectors[doc];
        query
            .iter()
            .filter_map(|(term, qw)| vector.get(term).map(|dw| dw * qw))
            .sum()
    }
}

fn normalize(mut v: TermVector) -> TermVector {
    let norm = v.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for w in v.values_mut() {
            *w /= norm;
        }
    }
    v
}

/// Searchable structure built once from a document collection.
#[derive(Debug)]
pub struct Index {
    documents: Vec<Document>,
    filename_field: FieldIndex,
    content_field: FieldIndex,
}

impl Index {
    /// Build an index. Input order does not matter: documents are sorted
    /// by filename (stable) before indexing so identical input sets always
    /// produce identical indexes.
    pub fn build(mut documents: Vec<Document>) -> Self {
        documents.sort_by(|a, b| a.filename.cmp(&b.filename));

        let filenames: Vec<&str> = documents.iter().map(|d| d.filename.as_str()).collect();
        let contents: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let filename_field = FieldIndex::fit(&filenames);
        let content_field = FieldIndex::fit(&contents);

        Self {
            documents,
            filename_field,
            content_field,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in index order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Rank documents against `query`, best first, at most `top_k`.
    ///
    /// A query with no indexable terms (empty, whitespace, or only stop
    /// words) is not an error: it returns the first `top_k` documents in
    /// index order with score `0.0`. Otherwise only documents with a
    /// positive score are returned.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if top_k == 0 {
            return Err(IndexError::InvalidTopK);
        }

        let terms = tokenize(query);
        if terms.is_empty() {
            return Ok(self
                .documents
                .iter()
                .take(top_k)
                .map(|doc| hit(doc, 0.0))
                .collect());
        }

        let q_filename = self.filename_field.vectorize(&terms);
        let q_content = self.content_field.vectorize(&terms);

        let mut scored: Vec<(usize, f64)> = (0..self.documents.len())
            .map(|i| {
                let s = FILENAME_BOOST * self.filename_field.similarity(i, &q_filename)
                    + CONTENT_BOOST * self.content_field.similarity(i, &q_content);
                (i, s / (FILENAME_BOOST + CONTENT_BOOST))
            })
            .filter(|(_, s)| *s > 0.0)
            .collect();

        scored.sort_by(|(ia, sa), (ib, sb)| {
            let (a, b) = (&self.documents[*ia], &self.documents[*ib]);
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.filename.cmp(&b.filename))
                .then_with(|| a.source.cmp(&b.source))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, s)| hit(&self.documents[i], s.min(1.0)))
            .collect())
    }
}

fn hit(doc: &Document, score: f64) -> SearchHit {
    SearchHit {
        source: doc.source.clone(),
        filename: doc.filename.clone(),
        content: doc.content.clone(),
        score,
    }
}
