//! Corpus file readers
//!
//! Two tab-separated inputs, both without a header row:
//! - document metadata: `doc_id \t title \t categories [\t abstract ...]`
//! - embeddings: `doc_id \t v1,v2,...,vd`
//!
//! Categories may be separated by `;` or whitespace.

use super::store::{Document, VectorError, VectorResult, CATEGORY_DELIMITER};
use csv::{ReaderBuilder, StringRecord};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// Metadata row of the document table
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub id: String,
    pub title: String,
    pub categories: Vec<String>,
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader)
}

fn field<'r>(record: &'r StringRecord, idx: usize, row: usize, name: &str) -> VectorResult<&'r str> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| VectorError::Schema(format!("row {}: missing {} column", row + 1, name)))
}

/// Split a raw category field into labels
pub fn split_categories(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == CATEGORY_DELIMITER || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read the document metadata table
pub fn read_documents_tsv<R: Read>(reader: R) -> VectorResult<Vec<DocumentMetadata>> {
    let mut rows = Vec::new();
    for (row, result) in tsv_reader(reader).records().enumerate() {
        let record = result?;
        let id = field(&record, 0, row, "doc_id")?;
        if id.is_empty() {
            return Err(VectorError::Schema(format!("row {}: empty doc_id", row + 1)));
        }
        let title = field(&record, 1, row, "title")?;
        let categories = record.get(2).map(split_categories).unwrap_or_default();
        rows.push(DocumentMetadata {
            id: id.to_string(),
            title: title.to_string(),
            categories,
        });
    }
    info!("Read {} document metadata rows", rows.len());
    Ok(rows)
}

/// Read the embedding table
pub fn read_vectors_tsv<R: Read>(reader: R) -> VectorResult<Vec<(String, Vec<f32>)>> {
    let mut rows = Vec::new();
    for (row, result) in tsv_reader(reader).records().enumerate() {
        let record = result?;
        let id = field(&record, 0, row, "doc_id")?;
        let raw = field(&record, 1, row, "vector")?;
        let vector = raw
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| {
                VectorError::Schema(format!("row {}: bad vector component for {}: {}", row + 1, id, e))
            })?;
        rows.push((id.to_string(), vector));
    }
    info!("Read {} embedding rows", rows.len());
    Ok(rows)
}

/// Join metadata and embeddings by id, in metadata order.
///
/// Every document needs exactly one vector and every vector a document.
pub fn join_corpus(
    metadata: Vec<DocumentMetadata>,
    vectors: Vec<(String, Vec<f32>)>,
) -> VectorResult<Vec<Document>> {
    let mut by_id: FxHashMap<String, Vec<f32>> = FxHashMap::default();
    by_id.reserve(vectors.len());
    for (id, vector) in vectors {
        if by_id.insert(id.clone(), vector).is_some() {
            return Err(VectorError::DuplicateId(id));
        }
    }

    let mut documents = Vec::with_capacity(metadata.len());
    for meta in metadata {
        let embedding = by_id
            .remove(&meta.id)
            .ok_or_else(|| VectorError::Schema(format!("document {} has no embedding", meta.id)))?;
        documents.push(Document::new(meta.id, meta.title, meta.categories, embedding));
    }

    if !by_id.is_empty() {
        let mut orphans: Vec<&String> = by_id.keys().collect();
        orphans.sort();
        warn!("{} embeddings have no matching document", orphans.len());
        return Err(VectorError::Schema(format!(
            "embedding for unknown document {}",
            orphans[0]
        )));
    }

    Ok(documents)
}

/// Read and join both corpus files
pub fn load_corpus(
    documents_path: impl AsRef<Path>,
    vectors_path: impl AsRef<Path>,
) -> VectorResult<Vec<Document>> {
    let metadata = read_documents_tsv(BufReader::new(File::open(documents_path)?))?;
    let vectors = read_vectors_tsv(BufReader::new(File::open(vectors_path)?))?;
    join_corpus(metadata, vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCS: &str = "1001.0001\tSparse estimation\tstat.ML cs.LG\tWe study...\n\
                        1001.0002\tBayesian models\tstat.ME\tAn abstract\n";
    const VECS: &str = "1001.0002\t0.5,0.25\n1001.0001\t1.0,0.0\n";

    #[test]
    fn test_read_documents() {
        let rows = read_documents_tsv(DOCS.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "1001.0001");
        assert_eq!(rows[0].categories, vec!["stat.ML", "cs.LG"]);
        assert_eq!(rows[1].title, "Bayesian models");
    }

    #[test]
    fn test_split_categories_accepts_both_separators() {
        assert_eq!(split_categories("a;b c"), vec!["a", "b", "c"]);
        assert!(split_categories("").is_empty());
    }

    #[test]
    fn test_join_in_metadata_order() {
        let docs = join_corpus(
            read_documents_tsv(DOCS.as_bytes()).unwrap(),
            read_vectors_tsv(VECS.as_bytes()).unwrap(),
        )
        .unwrap();
        assert_eq!(docs[0].id, "1001.0001");
        assert_eq!(docs[0].embedding, vec![1.0, 0.0]);
        assert_eq!(docs[1].embedding, vec![0.5, 0.25]);
    }

    #[test]
    fn test_bad_vector_component() {
        let err = read_vectors_tsv("x\t1.0,abc\n".as_bytes()).unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_missing_and_orphan_vectors() {
        let meta = read_documents_tsv(DOCS.as_bytes()).unwrap();
        let only_one = read_vectors_tsv("1001.0001\t1.0,0.0\n".as_bytes()).unwrap();
        assert!(join_corpus(meta.clone(), only_one).unwrap_err().is_schema_error());

        let extra = read_vectors_tsv(format!("{}zzz\t1.0,1.0\n", VECS).as_bytes()).unwrap();
        assert!(join_corpus(meta, extra).unwrap_err().is_schema_error());
    }
}
