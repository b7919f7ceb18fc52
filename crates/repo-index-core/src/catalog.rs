//! Process-lifetime lookup table from `(source, filename)` to content.
//!
//! Keys are unique by construction: a repeated `put` for the same pair
//! overwrites the earlier content. Re-ingesting a source therefore
//! replaces its documents in place instead of failing.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::LookupError;
use crate::models::Document;

/// `(source, filename)`
type Key = (String, String);

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<Key, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a document. Returns the content it replaced, if any.
    pub fn put(
        &mut self,
        source: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<String>,
    ) -> Option<String> {
        self.entries
            .insert((source.into(), filename.into()), content.into())
    }

    /// Merge a batch of documents, in order. Later duplicates win.
    pub fn extend<I>(&mut self, documents: I)
    where
        I: IntoIterator<Item = Document>,
    {
        for doc in documents {
            self.put(doc.source, doc.filename, doc.content);
        }
    }

    pub fn get(&self, source: &str, filename: &str) -> Result<&str, LookupError> {
        self.entries
            .get(&(source.to_string(), filename.to_string()))
            .map(String::as_str)
            .ok_or_else(|| LookupError::NotFound {
                source_name: Some(source.to_string()),
                filename: filename.to_string(),
            })
    }

    /// Resolve a filename across every source.
    ///
    /// Exactly one match resolves; several matches are reported as
    /// [`LookupError::Ambiguous`] with the matching sources so the caller
    /// can retry with [`get`](Self::get).
    pub fn lookup_by_filename(&self, filename: &str) -> Result<&str, LookupError> {
        let matches: Vec<(&str, &str)> = self
            .entries
            .iter()
            .filter(|((_, name), _)| name == filename)
            .map(|((source, _), content)| (source.as_str(), content.as_str()))
            .collect();

        match matches.as_slice() {
            [] => Err(LookupError::NotFound {
                source_name: None,
                filename: filename.to_string(),
            }),
            [(_, content)] => Ok(*content),
            many => {
                let sources: BTreeSet<&str> = many.iter().map(|(source, _)| *source).collect();
                Err(LookupError::Ambiguous {
                    filename: filename.to_string(),
                    sources: sources.into_iter().map(str::to_string).collect(),
                })
            }
        }
    }

    /// `get` when a source is given, `lookup_by_filename` otherwise.
    pub fn resolve(&self, filename: &str, source: Option<&str>) -> Result<&str, LookupError> {
        match source {
            Some(source) => self.get(source, filename),
            None => self.lookup_by_filename(filename),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct source names, sorted.
    pub fn sources(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.entries.keys().map(|(s, _)| s.as_str()).collect();
        set.into_iter().collect()
    }

    /// Number of documents held for `source`.
    pub fn count_for(&self, source: &str) -> usize {
        self.entries.keys().filter(|(s, _)| s == source).count()
    }

    /// Snapshot of every entry as a [`Document`], ordered by key.
    pub fn documents(&self) -> Vec<Document> {
        self.entries
            .iter()
            .map(|((source, filename), content)| Document::new(source, filename, content))
            .collect()
    }
}
