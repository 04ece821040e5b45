//! Document corpus storage
//!
//! This module holds the loaded documents (ids, titles, categories and
//! embeddings) and the readers that bring a corpus in from disk.

pub mod corpus;
pub mod store;
pub mod synthetic;

pub use corpus::{join_corpus, load_corpus, read_documents_tsv, read_vectors_tsv, DocumentMetadata};
pub use store::{
    Document, DocumentRef, Documents, VectorError, VectorResult, VectorStore, CATEGORY_DELIMITER,
};
pub use synthetic::SyntheticCorpus;
