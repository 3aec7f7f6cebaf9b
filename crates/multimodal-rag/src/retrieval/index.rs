//! HNSW index over stored chunk embeddings
//!
//! Built from a store snapshot for each search. Vectors are normalized on
//! insert so that cosine distance maps straight to a similarity score.

use hnsw_rs::prelude::*;

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::similarity::normalize;
use super::store::IndexEntry;

/// Graph construction parameters
#[derive(Debug, Clone, Copy)]
pub struct IndexParams {
    /// Max connections per node (M)
    pub max_connections: usize,
    /// Candidate list size while building
    pub ef_construction: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            max_connections: 16,
            ef_construction: 200,
        }
    }
}

/// Upper bound on graph layers supported by hnsw_rs
const MAX_LAYERS: usize = 16;

/// Searchable view of the vector store
pub struct HnswIndex {
    hnsw: Hnsw<'static, f32, DistCosine>,
    chunks: Vec<Chunk>,
    dimensions: usize,
}

impl HnswIndex {
    /// Build an index from persisted entries
    pub fn build(entries: Vec<IndexEntry>, dimensions: usize, params: IndexParams) -> Result<Self> {
        let nb_layer = if entries.len() > 1 {
            ((entries.len() as f32).log2().ceil() as usize).clamp(4, MAX_LAYERS)
        } else {
            4
        };

        let mut hnsw: Hnsw<f32, DistCosine> = Hnsw::new(
            params.max_connections,
            entries.len().max(1),
            nb_layer,
            params.ef_construction,
            DistCosine,
        );

        let mut chunks = Vec::with_capacity(entries.len());

        for (position, entry) in entries.into_iter().enumerate() {
            if entry.embedding.len() != dimensions {
                return Err(Error::vector_db(format!(
                    "Stored vector {} has wrong dimensions: expected {}, got {}",
                    position,
                    dimensions,
                    entry.embedding.len()
                )));
            }

            let mut vector = entry.embedding;
            normalize(&mut vector);

            // DistCosine puts zero vectors at distance 0 from everything
            if vector.iter().all(|v| *v == 0.0) {
                tracing::debug!("Skipping zero embedding for chunk {}", entry.chunk.id);
                continue;
            }

            hnsw.insert_slice((vector.as_slice(), chunks.len()));
            chunks.push(entry.chunk);
        }

        hnsw.set_searching_mode(true);

        Ok(Self {
            hnsw,
            chunks,
            dimensions,
        })
    }

    /// Top-`k` chunks for `query`, highest similarity first
    pub fn similarity_search_with_score(&self, query: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>> {
        if query.len() != self.dimensions {
            return Err(Error::vector_db(format!(
                "Query has wrong dimensions: expected {}, got {}",
                self.dimensions,
                query.len()
            )));
        }

        if query.iter().any(|v| !v.is_finite()) {
            return Err(Error::vector_db("Query contains NaN or Infinity values"));
        }

        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut normalized = query.to_vec();
        normalize(&mut normalized);

        // A zero query has no direction to compare against
        if normalized.iter().all(|v| *v == 0.0) {
            return Ok(Vec::new());
        }

        let ef_search = (k * 2).max(50);
        let neighbours = self.hnsw.search(&normalized, k, ef_search);

        let mut results: Vec<(Chunk, f32)> = neighbours
            .into_iter()
            .filter_map(|n| {
                let chunk = self.chunks.get(n.d_id)?;
                let score = 1.0 - n.distance;
                let score = if score.is_finite() { score } else { 0.0 };
                Some((chunk.clone(), score))
            })
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        Ok(results)
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Vector dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(content: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            chunk: Chunk::new(Uuid::new_v4(), content.to_string(), Some("doc.txt".into()), 0, content.len(), 0),
            embedding,
        }
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let entries = vec![
            entry("east", vec![1.0, 0.0, 0.0]),
            entry("north", vec![0.0, 1.0, 0.0]),
            entry("north-east", vec![0.7, 0.7, 0.0]),
        ];
        let index = HnswIndex::build(entries, 3, IndexParams::default()).unwrap();

        let results = index.similarity_search_with_score(&[0.0, 2.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.content, "north");
        assert!((results[0].1 - 1.0).abs() < 1e-4);
        assert_eq!(results[1].0.content, "north-east");
        assert!(results[0].1 >= results[1].1);
    }

    #[test]
    fn test_k_larger_than_index() {
        let entries = vec![entry("only", vec![1.0, 1.0])];
        let index = HnswIndex::build(entries, 2, IndexParams::default()).unwrap();

        let results = index.similarity_search_with_score(&[1.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_wrong_query_dimensions() {
        let index = HnswIndex::build(vec![entry("a", vec![1.0, 0.0])], 2, IndexParams::default()).unwrap();
        assert!(index.similarity_search_with_score(&[1.0], 1).is_err());
        assert!(index.similarity_search_with_score(&[f32::NAN, 0.0], 1).is_err());
    }

    #[test]
    fn test_zero_embeddings_are_not_indexed() {
        let entries = vec![
            entry("match", vec![1.0, 0.0, 0.0]),
            entry("symbols-only", vec![0.0, 0.0, 0.0]),
            entry("other", vec![0.0, 1.0, 0.0]),
        ];
        let index = HnswIndex::build(entries, 3, IndexParams::default()).unwrap();
        assert_eq!(index.len(), 2);

        let results = index.similarity_search_with_score(&[1.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.content, "match");
        assert!((results[0].1 - 1.0).abs() < 1e-4);
        assert_eq!(results[1].0.content, "other");
        assert!(results.iter().all(|(chunk, _)| chunk.content != "symbols-only"));
    }

    #[test]
    fn test_rejects_mismatched_entries() {
        let entries = vec![entry("a", vec![1.0, 0.0]), entry("b", vec![1.0])];
        assert!(HnswIndex::build(entries, 2, IndexParams::default()).is_err());
    }
}
