//! Seeded synthetic corpora for demos, tests and benchmarks
//!
//! Documents are drawn around one centroid per category, so documents that share
//! a category tend to be more similar than documents that do not.

use super::store::Document;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shape of a synthetic corpus
#[derive(Debug, Clone)]
pub struct SyntheticCorpus {
    pub documents: usize,
    pub dimension: usize,
    pub categories: Vec<String>,
    /// Spread of documents around their centroid (0 = identical vectors)
    pub noise: f32,
    pub seed: u64,
}

impl Default for SyntheticCorpus {
    fn default() -> Self {
        Self {
            documents: 1_000,
            dimension: 32,
            categories: ["stat.ML", "cs.LG", "stat.ME", "math.ST", "stat.AP"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            noise: 0.35,
            seed: 42,
        }
    }
}

impl SyntheticCorpus {
    /// Generate the documents. Embeddings are non-negative, as produced by the
    /// upstream embedding model.
    pub fn generate(&self) -> Vec<Document> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let category_count = self.categories.len().max(1);

        let centroids: Vec<Vec<f32>> = (0..category_count)
            .map(|_| (0..self.dimension).map(|_| rng.gen_range(0.0..1.0)).collect())
            .collect();

        (0..self.documents)
            .map(|i| {
                let primary = rng.gen_range(0..category_count);
                let mut categories = Vec::new();
                if let Some(label) = self.categories.get(primary) {
                    categories.push(label.clone());
                }
                // Roughly one document in four is cross-listed
                if category_count > 1 && rng.gen_bool(0.25) {
                    let secondary = (primary + rng.gen_range(1..category_count)) % category_count;
                    categories.push(self.categories[secondary].clone());
                }

                let embedding = centroids[primary]
                    .iter()
                    .map(|&c| (c + rng.gen_range(-self.noise..=self.noise)).max(0.0))
                    .collect();

                Document::new(
                    format!("doc-{:06}", i),
                    format!("Synthetic paper {}", i),
                    categories,
                    embedding,
                )
            })
            .collect()
    }
}
