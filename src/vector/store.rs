//! In-memory corpus of embedded documents
//!
//! Documents are kept in load order. The position of a document in that order
//! is its dense index, which the graph builder uses to address rows of the
//! embedding matrix.

use indexmap::IndexMap;
use ndarray::ArrayView2;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Separator used when a document's categories are flattened into one field
pub const CATEGORY_DELIMITER: char = ';';

/// Vector store errors
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Dimension mismatch for document {id}: expected {expected}, got {got}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        got: usize,
    },

    #[error("Duplicate document id: {0}")]
    DuplicateId(String),

    #[error("Document {0} not found")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl VectorError {
    /// True for every variant that reports malformed or inconsistent input data
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            VectorError::Schema(_)
                | VectorError::DimensionMismatch { .. }
                | VectorError::DuplicateId(_)
        )
    }
}

pub type VectorResult<T> = Result<T, VectorError>;

/// A document as handed over by the embedding collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Category labels, first occurrence order
    pub categories: Vec<String>,
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        categories: Vec<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            categories,
            embedding,
        }
    }
}

/// Borrowed view of a stored document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentRef<'a> {
    /// Dense load-order index
    pub index: usize,
    pub id: &'a str,
    pub title: &'a str,
    pub categories: &'a [String],
    pub embedding: &'a [f32],
}

#[derive(Debug, Clone)]
struct Entry {
    title: String,
    categories: Vec<String>,
}

/// Read-only (once loaded) container of documents and their embeddings.
///
/// Embeddings live in one row-major buffer so the whole corpus can be viewed as
/// an `n x dimension` matrix without copying.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    entries: IndexMap<String, Entry>,
    data: Vec<f32>,
    dimension: Option<usize>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store and load one batch of documents into it
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> VectorResult<Self> {
        let mut store = Self::new();
        store.load(documents)?;
        Ok(store)
    }

    /// Load a batch of documents.
    ///
    /// The whole batch is validated before anything is committed, so a failing
    /// batch leaves the store untouched. Returns the number of documents added.
    pub fn load(&mut self, documents: impl IntoIterator<Item = Document>) -> VectorResult<usize> {
        let batch: Vec<Document> = documents.into_iter().collect();
        if batch.is_empty() {
            return Ok(0);
        }

        let dimension = match self.dimension {
            Some(dim) => dim,
            None => batch[0].embedding.len(),
        };
        if dimension == 0 {
            return Err(VectorError::Schema(format!(
                "document {} has an empty embedding",
                batch[0].id
            )));
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut cleaned = Vec::with_capacity(batch.len());
        for doc in &batch {
            if doc.id.is_empty() {
                return Err(VectorError::Schema("document id must not be empty".to_string()));
            }
            if self.entries.contains_key(&doc.id) || !seen.insert(doc.id.as_str()) {
                return Err(VectorError::DuplicateId(doc.id.clone()));
            }
            if doc.embedding.len() != dimension {
                return Err(VectorError::DimensionMismatch {
                    id: doc.id.clone(),
                    expected: dimension,
                    got: doc.embedding.len(),
                });
            }
            if let Some(pos) = doc.embedding.iter().position(|x| !x.is_finite()) {
                return Err(VectorError::Schema(format!(
                    "document {} has a non-finite embedding component at position {}",
                    doc.id, pos
                )));
            }
            cleaned.push(normalize_categories(&doc.id, &doc.categories)?);
        }

        let added = batch.len();
        self.data.reserve(added * dimension);
        for (doc, categories) in batch.into_iter().zip(cleaned) {
            self.data.extend_from_slice(&doc.embedding);
            self.entries.insert(
                doc.id,
                Entry {
                    title: doc.title,
                    categories,
                },
            );
        }
        self.dimension = Some(dimension);

        info!(
            "Loaded {} documents (total {}, dimension {})",
            added,
            self.entries.len(),
            dimension
        );
        Ok(added)
    }

    /// Look up a document by id
    pub fn get(&self, id: &str) -> VectorResult<DocumentRef<'_>> {
        self.entries
            .get_index_of(id)
            .and_then(|index| self.document(index))
            .ok_or_else(|| VectorError::NotFound(id.to_string()))
    }

    /// Document at a dense index
    pub fn document(&self, index: usize) -> Option<DocumentRef<'_>> {
        let (id, entry) = self.entries.get_index(index)?;
        let dim = self.dimension.unwrap_or(0);
        Some(DocumentRef {
            index,
            id: id.as_str(),
            title: entry.title.as_str(),
            categories: &entry.categories,
            embedding: &self.data[index * dim..(index + 1) * dim],
        })
    }

    /// Dense index of a document id
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.entries.get_index_of(id)
    }

    /// All documents in load order. Call again to restart.
    pub fn all(&self) -> Documents<'_> {
        Documents {
            store: self,
            next: 0,
        }
    }

    /// Ids in load order
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// The embedding matrix, one row per document in load order
    pub fn matrix(&self) -> VectorResult<ArrayView2<'_, f32>> {
        let dim = self.dimension.unwrap_or(0);
        ArrayView2::from_shape((self.entries.len(), dim), &self.data)
            .map_err(|e| VectorError::Schema(format!("embedding buffer has wrong shape: {}", e)))
    }

    /// Corpus-wide embedding dimension (None until the first load)
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lazy iterator over the documents of a store, in load order
#[derive(Debug, Clone)]
pub struct Documents<'a> {
    store: &'a VectorStore,
    next: usize,
}

impl<'a> Iterator for Documents<'a> {
    type Item = DocumentRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let doc = self.store.document(self.next)?;
        self.next += 1;
        Some(doc)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.store.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Documents<'_> {}

/// Trim, drop empties and de-duplicate labels (first occurrence wins).
fn normalize_categories(id: &str, categories: &[String]) -> VectorResult<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(categories.len());
    for raw in categories {
        let label = raw.trim();
        if label.is_empty() {
            continue;
        }
        if label.contains(CATEGORY_DELIMITER) {
            return Err(VectorError::Schema(format!(
                "category {:?} of document {} contains the reserved delimiter '{}'",
                label, id, CATEGORY_DELIMITER
            )));
        }
        if !out.iter().any(|c| c == label) {
            out.push(label.to_string());
        } else {
            debug!("Dropping repeated category {} on document {}", label, id);
        }
    }
    Ok(out)
}
