//! # repo-index core
//!
//! I/O-free logic shared by the `repo-index` pipeline: the in-memory
//! document model, the `(source, filename)` catalog, and the ranked
//! keyword index.
//!
//! This crate performs no network or filesystem access. Callers load
//! documents however they like and hand them over as [`Document`]s.

pub mod catalog;
pub mod error;
pub mod index;
pub mod models;

pub use catalog::Catalog;
pub use error::{IndexError, LookupError};
pub use index::Index;
pub use models::{Document, SearchHit};
