//! Vector storage and semantic search

pub mod index;
pub mod search;
pub mod similarity;
pub mod store;

pub use index::{HnswIndex, IndexParams};
pub use search::Retriever;
pub use similarity::{cosine_similarity, normalize};
pub use store::{IndexEntry, VectorStore, INDEX_FILE};
