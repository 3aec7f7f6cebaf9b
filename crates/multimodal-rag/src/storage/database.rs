//! SQLite registry of uploaded documents

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Document, FileType};

/// File name of the registry database inside the index directory
pub const REGISTRY_FILE: &str = "documents.db";

const SELECT_COLUMNS: &str = "SELECT id, filename, file_type, content_hash, file_size, \
     total_chunks, source_path, uploaded_at FROM documents";

/// SQLite-based document registry
pub struct DocumentRegistry {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentRegistry {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::Internal(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Internal(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL UNIQUE,
                file_type TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                total_chunks INTEGER NOT NULL,
                source_path TEXT NOT NULL,
                uploaded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_content_hash ON documents(content_hash);
            "#,
        )
        .map_err(|e| Error::Internal(format!("Failed to migrate database: {}", e)))?;

        Ok(())
    }

    /// Insert a document, replacing any previous record with the same filename
    pub fn upsert(&self, doc: &Document) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO documents (
                id, filename, file_type, content_hash, file_size,
                total_chunks, source_path, uploaded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(filename) DO UPDATE SET
                id = excluded.id,
                file_type = excluded.file_type,
                content_hash = excluded.content_hash,
                file_size = excluded.file_size,
                total_chunks = excluded.total_chunks,
                source_path = excluded.source_path,
                uploaded_at = excluded.uploaded_at
            "#,
            params![
                doc.id.to_string(),
                doc.filename,
                file_type_to_str(doc.file_type),
                doc.content_hash,
                doc.file_size as i64,
                doc.total_chunks as i64,
                doc.source_path,
                doc.uploaded_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Internal(format!("Failed to upsert document: {}", e)))?;

        Ok(())
    }

    /// Get a document by ID
    pub fn get(&self, id: Uuid) -> Result<Option<Document>> {
        self.query_one(&format!("{} WHERE id = ?1", SELECT_COLUMNS), &id.to_string())
    }

    /// Get a document by its uploaded filename
    pub fn find_by_filename(&self, filename: &str) -> Result<Option<Document>> {
        self.query_one(&format!("{} WHERE filename = ?1", SELECT_COLUMNS), filename)
    }

    fn query_one(&self, sql: &str, key: &str) -> Result<Option<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| Error::Internal(format!("Failed to prepare query: {}", e)))?;

        let doc = stmt
            .query_row(params![key], row_to_document)
            .optional()
            .map_err(|e| Error::Internal(format!("Failed to get document: {}", e)))?;

        Ok(doc)
    }

    /// List all documents, newest first
    pub fn list(&self) -> Result<Vec<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(&format!("{} ORDER BY uploaded_at DESC", SELECT_COLUMNS))
            .map_err(|e| Error::Internal(format!("Failed to prepare query: {}", e)))?;

        let docs = stmt
            .query_map([], row_to_document)
            .map_err(|e| Error::Internal(format!("Failed to list documents: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Internal(format!("Failed to read document row: {}", e)))?;

        Ok(docs)
    }

    /// Delete a document record
    pub fn remove(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id.to_string()])
            .map_err(|e| Error::Internal(format!("Failed to delete document: {}", e)))?;

        Ok(count > 0)
    }

    /// Number of registered documents
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::Internal(format!("Failed to count documents: {}", e)))?;

        Ok(count as usize)
    }
}

fn file_type_to_str(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Txt => "txt",
        FileType::Pdf => "pdf",
        FileType::Image => "image",
        FileType::Unknown => "unknown",
    }
}

fn str_to_file_type(s: &str) -> FileType {
    match s {
        "txt" => FileType::Txt,
        "pdf" => FileType::Pdf,
        "image" => FileType::Image,
        _ => FileType::Unknown,
    }
}

fn row_to_document(row: &Row) -> rusqlite::Result<Document> {
    let id: String = row.get(0)?;
    let file_type: String = row.get(2)?;
    let file_size: i64 = row.get(4)?;
    let total_chunks: i64 = row.get(5)?;
    let uploaded_at: String = row.get(7)?;

    Ok(Document {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
        filename: row.get(1)?,
        file_type: str_to_file_type(&file_type),
        content_hash: row.get(3)?,
        file_size: file_size as u64,
        total_chunks: total_chunks as u32,
        source_path: row.get(6)?,
        uploaded_at: DateTime::parse_from_rfc3339(&uploaded_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(7, e))?,
    })
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}
