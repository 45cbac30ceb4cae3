//! SQLite-backed persistence for the vector index.
//!
//! The in-memory index remains the source of truth at runtime; this store
//! mirrors it so the index can be rebuilt across restarts. Records are
//! `(chunk_id, source_id, offsets, text, embedding)` rows. On load every
//! row is integrity-checked (blob width, offset sanity, id re-derivation);
//! a failed check surfaces as `IndexCorruption`, which is never retried
//! automatically; the caller must re-index from source documents.

use crate::types::{Chunk, IndexEntry, SourceRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use scribe_core::{AppError, AppResult};
use std::path::Path;

/// SQLite store for index entries.
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    /// Open (or create) the store at the given path.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Index(format!("Failed to create index directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

        Self::init_tables(&conn)?;

        tracing::debug!("Opened index store at {:?}", db_path);
        Ok(Self { conn })
    }

    /// Open an in-memory store (used in tests).
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;
        Self::init_tables(&conn)?;
        Ok(Self { conn })
    }

    fn init_tables(conn: &Connection) -> AppResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sources (
                id TEXT PRIMARY KEY,
                indexed_at TEXT NOT NULL,
                chunk_count INTEGER NOT NULL,
                byte_count INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                source_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                start_offset INTEGER NOT NULL,
                end_offset INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                FOREIGN KEY (source_id) REFERENCES sources(id)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_id);
            "#,
        )
        .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))
    }

    /// Replace every record for a source in one transaction
    /// (delete-then-insert, never duplicating).
    pub fn replace_source(
        &mut self,
        record: &SourceRecord,
        entries: &[IndexEntry],
    ) -> AppResult<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to start transaction: {}", e)))?;

        tx.execute("DELETE FROM chunks WHERE source_id = ?1", params![record.source_id])
            .map_err(|e| AppError::Index(format!("Failed to delete chunks: {}", e)))?;
        tx.execute("DELETE FROM sources WHERE id = ?1", params![record.source_id])
            .map_err(|e| AppError::Index(format!("Failed to delete source: {}", e)))?;

        tx.execute(
            "INSERT INTO sources (id, indexed_at, chunk_count, byte_count) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.source_id,
                record.indexed_at.to_rfc3339(),
                record.chunk_count as i64,
                record.byte_count as i64
            ],
        )
        .map_err(|e| AppError::Index(format!("Failed to insert source: {}", e)))?;

        for (seq, entry) in entries.iter().enumerate() {
            tx.execute(
                "INSERT INTO chunks (id, source_id, seq, start_offset, end_offset, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.chunk.id,
                    entry.chunk.source_id,
                    seq as i64,
                    entry.chunk.start_offset as i64,
                    entry.chunk.end_offset as i64,
                    entry.chunk.text,
                    vector_to_blob(&entry.vector),
                ],
            )
            .map_err(|e| AppError::Index(format!("Failed to insert chunk: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit: {}", e)))?;

        Ok(())
    }

    /// Delete every record for a source, chunk rows and bookkeeping in one
    /// transaction so a failure cannot leave an orphaned source row.
    pub fn delete_source(&mut self, source_id: &str) -> AppResult<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to start transaction: {}", e)))?;

        tx.execute("DELETE FROM chunks WHERE source_id = ?1", params![source_id])
            .map_err(|e| AppError::Index(format!("Failed to delete chunks: {}", e)))?;
        tx.execute("DELETE FROM sources WHERE id = ?1", params![source_id])
            .map_err(|e| AppError::Index(format!("Failed to delete source: {}", e)))?;

        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit: {}", e)))?;

        Ok(())
    }

    /// Load all entries, integrity-checking every row.
    ///
    /// Entries are returned in their original insertion order (source
    /// indexing time, then chunk sequence) so tie-breaking behavior
    /// survives a restart.
    pub fn load_entries(&self, dimensions: usize) -> AppResult<Vec<IndexEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT c.id, c.source_id, c.start_offset, c.end_offset, c.text, c.embedding
                 FROM chunks c
                 JOIN sources s ON s.id = c.source_id
                 ORDER BY s.indexed_at, c.source_id, c.seq",
            )
            .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Vec<u8>>(5)?,
                ))
            })
            .map_err(|e| AppError::Index(format!("Failed to query chunks: {}", e)))?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, source_id, start, end, text, blob) =
                row.map_err(|e| AppError::Index(format!("Failed to read row: {}", e)))?;

            if start < 0 || end <= start {
                return Err(AppError::IndexCorruption(format!(
                    "Chunk {} has invalid offsets {}..{}",
                    id, start, end
                )));
            }
            let (start, end) = (start as usize, end as usize);

            if blob.len() != dimensions * 4 {
                return Err(AppError::IndexCorruption(format!(
                    "Chunk {} embedding blob is {} bytes, expected {}",
                    id,
                    blob.len(),
                    dimensions * 4
                )));
            }

            // The id is a digest over identity and text; recomputing it
            // catches silent row tampering or truncation.
            let expected_id = Chunk::derive_id(&source_id, start, end, &text);
            if id != expected_id {
                return Err(AppError::IndexCorruption(format!(
                    "Chunk {} fails id verification (expected {})",
                    id, expected_id
                )));
            }

            entries.push(IndexEntry {
                chunk: Chunk {
                    id,
                    source_id,
                    start_offset: start,
                    end_offset: end,
                    text,
                },
                vector: blob_to_vector(&blob),
            });
        }

        tracing::debug!("Loaded {} entries from index store", entries.len());
        Ok(entries)
    }

    /// List indexed sources, most recent first.
    pub fn list_sources(&self) -> AppResult<Vec<SourceRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, indexed_at, chunk_count, byte_count
                 FROM sources ORDER BY indexed_at DESC",
            )
            .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(|e| AppError::Index(format!("Failed to query sources: {}", e)))?;

        let mut sources = Vec::new();
        for row in rows {
            let (source_id, indexed_at, chunk_count, byte_count) =
                row.map_err(|e| AppError::Index(format!("Failed to read row: {}", e)))?;
            let indexed_at = DateTime::parse_from_rfc3339(&indexed_at)
                .map_err(|e| {
                    AppError::IndexCorruption(format!(
                        "Source {} has invalid timestamp: {}",
                        source_id, e
                    ))
                })?
                .with_timezone(&Utc);
            sources.push(SourceRecord {
                source_id,
                indexed_at,
                chunk_count: chunk_count as usize,
                byte_count: byte_count as usize,
            });
        }

        Ok(sources)
    }

    /// Drop every record.
    pub fn reset(&self) -> AppResult<()> {
        self.conn
            .execute_batch("DELETE FROM chunks; DELETE FROM sources;")
            .map_err(|e| AppError::Index(format!("Failed to reset store: {}", e)))
    }
}

fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for v in vector {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

fn blob_to_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn sample_entries(source_id: &str) -> (SourceRecord, Vec<IndexEntry>) {
        let text = "budget approved for Q3";
        let chunks = vec![
            Chunk::new(source_id, 0, 10, &text[0..10]),
            Chunk::new(source_id, 8, 22, &text[8..22]),
        ];
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .map(|chunk| IndexEntry {
                chunk,
                vector: vec![0.5, -0.25, 1.0],
            })
            .collect();
        let record = SourceRecord {
            source_id: source_id.to_string(),
            indexed_at: Utc::now(),
            chunk_count: entries.len(),
            byte_count: text.len(),
        };
        (record, entries)
    }

    #[test]
    fn test_round_trip() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let (record, entries) = sample_entries("doc1");
        store.replace_source(&record, &entries).unwrap();

        let loaded = store.load_entries(3).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].chunk, entries[0].chunk);
        assert_eq!(loaded[0].vector, entries[0].vector);
        assert_eq!(loaded[1].chunk, entries[1].chunk);
    }

    #[test]
    fn test_replace_does_not_duplicate() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let (record, entries) = sample_entries("doc1");
        store.replace_source(&record, &entries).unwrap();
        store.replace_source(&record, &entries).unwrap();

        let loaded = store.load_entries(3).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(store.list_sources().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_source() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let (record_a, entries_a) = sample_entries("doc1");
        let (record_b, entries_b) = sample_entries("doc2");
        store.replace_source(&record_a, &entries_a).unwrap();
        store.replace_source(&record_b, &entries_b).unwrap();

        store.delete_source("doc1").unwrap();
        let loaded = store.load_entries(3).unwrap();
        assert!(loaded.iter().all(|e| e.chunk.source_id == "doc2"));

        // Both tables reflect the deletion: no orphaned source row remains
        let sources = store.list_sources().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_id, "doc2");
    }

    #[test]
    fn test_wrong_blob_width_is_corruption() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let (record, entries) = sample_entries("doc1");
        store.replace_source(&record, &entries).unwrap();

        // Loading with the wrong dimensionality must fail the blob check
        let err = store.load_entries(4).unwrap_err();
        assert!(matches!(err, AppError::IndexCorruption(_)));
    }

    #[test]
    fn test_tampered_text_is_corruption() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let (record, entries) = sample_entries("doc1");
        store.replace_source(&record, &entries).unwrap();

        store
            .conn
            .execute("UPDATE chunks SET text = 'tampered'", [])
            .unwrap();

        let err = store.load_entries(3).unwrap_err();
        assert!(matches!(err, AppError::IndexCorruption(_)));
    }

    #[test]
    fn test_persist_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        {
            let mut store = IndexStore::open(&path).unwrap();
            let (record, entries) = sample_entries("doc1");
            store.replace_source(&record, &entries).unwrap();
        }

        let store = IndexStore::open(&path).unwrap();
        assert_eq!(store.load_entries(3).unwrap().len(), 2);
    }
}
