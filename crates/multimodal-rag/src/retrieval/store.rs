//! On-disk vector store
//!
//! All chunk embeddings live in a single `index.json` under the index
//! directory. Readers always go back to disk, so every query sees the most
//! recently persisted state; writers are serialized and replace the file
//! atomically.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::index::{HnswIndex, IndexParams};

/// File name of the persisted index
pub const INDEX_FILE: &str = "index.json";

/// One stored chunk with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

/// Persistent store of chunk embeddings
pub struct VectorStore {
    dir: PathBuf,
    params: IndexParams,
    write_lock: Mutex<()>,
}

impl VectorStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl AsRef<Path>, params: IndexParams) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            params,
            write_lock: Mutex::new(()),
        })
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Whether an index has been persisted yet
    pub fn exists(&self) -> bool {
        self.index_path().is_file()
    }

    fn read_file(&self) -> Result<Option<IndexFile>> {
        let path = self.index_path();
        if !path.is_file() {
            return Ok(None);
        }

        let reader = BufReader::new(fs::File::open(&path)?);
        let file: IndexFile = serde_json::from_reader(reader).map_err(|e| {
            Error::vector_db(format!("Corrupt index file {}: {}", path.display(), e))
        })?;
        Ok(Some(file))
    }

    fn write_file(&self, file: &IndexFile) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, file)?;
            writer.flush()?;
        }
        tmp.persist(self.index_path())
            .map_err(|e| Error::vector_db(format!("Failed to persist index: {}", e)))?;
        Ok(())
    }

    /// Append chunks with their embeddings and persist
    pub fn add(&self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_db(format!(
                "Got {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        if chunks.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock();
        let mut file = self.read_file()?.unwrap_or_default();

        if file.entries.is_empty() {
            file.dimensions = embeddings[0].len();
        }

        for (i, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != file.dimensions {
                return Err(Error::vector_db(format!(
                    "Embedding {} has wrong dimensions: expected {}, got {}",
                    i,
                    file.dimensions,
                    embedding.len()
                )));
            }
            if embedding.iter().any(|v| !v.is_finite()) {
                return Err(Error::vector_db(format!(
                    "Embedding {} contains NaN or Infinity values",
                    i
                )));
            }
        }

        let added = chunks.len();
        file.entries.extend(
            chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| IndexEntry { chunk, embedding }),
        );
        self.write_file(&file)?;

        tracing::debug!("Added {} vectors, index now holds {}", added, file.entries.len());
        Ok(added)
    }

    /// Remove every chunk of a document; returns how many were removed
    pub fn delete_by_document(&self, document_id: Uuid) -> Result<usize> {
        let _guard = self.write_lock.lock();
        let Some(mut file) = self.read_file()? else {
            return Ok(0);
        };

        let before = file.entries.len();
        file.entries.retain(|e| e.chunk.document_id != document_id);
        let removed = before - file.entries.len();

        if removed > 0 {
            self.write_file(&file)?;
        }

        Ok(removed)
    }

    /// Reload the index from disk; `None` when nothing has been persisted
    pub fn load_snapshot(&self) -> Result<Option<HnswIndex>> {
        match self.read_file()? {
            Some(file) => Ok(Some(HnswIndex::build(
                file.entries,
                file.dimensions,
                self.params,
            )?)),
            None => Ok(None),
        }
    }

    /// Number of stored chunks
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_file()?.map(|f| f.entries.len()).unwrap_or(0))
    }

    /// Whether the store holds no chunks
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(doc: Uuid, content: &str) -> Chunk {
        Chunk::new(doc, content.to_string(), Some("notes.txt".into()), 0, content.len(), 0)
    }

    #[test]
    fn test_missing_index_is_none() {
        let dir = TempDir::new().unwrap();
        let store = VectorStore::open(dir.path().join("vs"), IndexParams::default()).unwrap();

        assert!(!store.exists());
        assert!(store.load_snapshot().unwrap().is_none());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_add_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let doc = Uuid::new_v4();
        {
            let store = VectorStore::open(dir.path(), IndexParams::default()).unwrap();
            store
                .add(
                    vec![chunk(doc, "alpha"), chunk(doc, "beta")],
                    vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                )
                .unwrap();
        }

        let reopened = VectorStore::open(dir.path(), IndexParams::default()).unwrap();
        assert!(reopened.exists());
        assert_eq!(reopened.len().unwrap(), 2);

        let index = reopened.load_snapshot().unwrap().unwrap();
        let hits = index.similarity_search_with_score(&[0.1, 0.9], 1).unwrap();
        assert_eq!(hits[0].0.content, "beta");
    }

    #[test]
    fn test_add_validates_vectors() {
        let dir = TempDir::new().unwrap();
        let store = VectorStore::open(dir.path(), IndexParams::default()).unwrap();
        let doc = Uuid::new_v4();

        store.add(vec![chunk(doc, "a")], vec![vec![1.0, 0.0]]).unwrap();

        assert!(store.add(vec![chunk(doc, "b")], vec![vec![1.0]]).is_err());
        assert!(store.add(vec![chunk(doc, "c")], vec![vec![f32::NAN, 0.0]]).is_err());
        assert!(store.add(vec![chunk(doc, "d")], vec![]).is_err());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_delete_by_document() {
        let dir = TempDir::new().unwrap();
        let store = VectorStore::open(dir.path(), IndexParams::default()).unwrap();
        let keep = Uuid::new_v4();
        let drop = Uuid::new_v4();

        store
            .add(
                vec![chunk(keep, "keep"), chunk(drop, "drop 1"), chunk(drop, "drop 2")],
                vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]],
            )
            .unwrap();

        assert_eq!(store.delete_by_document(drop).unwrap(), 2);
        assert_eq!(store.delete_by_document(drop).unwrap(), 0);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(INDEX_FILE), b"not json").unwrap();
        let store = VectorStore::open(dir.path(), IndexParams::default()).unwrap();

        assert!(matches!(store.load_snapshot(), Err(Error::VectorDb(_))));
    }
}
