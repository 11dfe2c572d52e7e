//! passage-text
//!
//! Keyword side of retrieval: an in-memory tantivy index over a corpus
//! snapshot, scored with BM25, rebuilt wholesale and swapped in atomically.

pub mod index;
pub mod tantivy_utils;

pub use index::LexicalIndex;
pub use tantivy_utils::tokenize;
