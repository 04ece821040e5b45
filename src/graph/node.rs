//! Document node implementation

use crate::vector::{DocumentRef, CATEGORY_DELIMITER};
use serde::{Deserialize, Serialize};

/// A document as it appears in the graph: identity and descriptive fields,
/// without its embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub id: String,
    pub title: String,
    pub categories: Vec<String>,
}

impl DocumentNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            categories,
        }
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// True when the two documents have at least one category label in common
    pub fn shares_category(&self, other: &DocumentNode) -> bool {
        self.categories.iter().any(|c| other.has_category(c))
    }

    /// Categories flattened into one delimiter-joined field
    pub fn category_field(&self) -> String {
        let separator = CATEGORY_DELIMITER.to_string();
        self.categories.join(separator.as_str())
    }
}

impl From<DocumentRef<'_>> for DocumentNode {
    fn from(doc: DocumentRef<'_>) -> Self {
        DocumentNode {
            id: doc.id.to_string(),
            title: doc.title.to_string(),
            categories: doc.categories.to_vec(),
        }
    }
}
