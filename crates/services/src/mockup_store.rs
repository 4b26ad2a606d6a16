//! Local persistence for saved mockups.
//!
//! One collection keyed by mockup id. Listing is newest-first, i.e. the
//! reverse of insertion order; an upsert keeps the record's original position.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use shared::mockup::SavedMockup;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("the mockup store is closed")]
    Closed,

    #[error("the mockup store is unavailable: {0}")]
    Unavailable(String),
}

/// Persistence boundary for the gallery
#[async_trait]
pub trait MockupStore: Send + Sync {
    /// All records, most recently inserted first
    async fn get_all(&self) -> Result<Vec<SavedMockup>, StoreError>;

    /// `Ok(None)` when the id is unknown
    async fn get(&self, id: &str) -> Result<Option<SavedMockup>, StoreError>;

    /// Insert, or replace the record with the same id
    async fn put(&self, mockup: &SavedMockup) -> Result<(), StoreError>;

    /// Deleting an unknown id is not an error
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

/// SQLite-backed store, opened once and kept open for the app's lifetime
pub struct SqliteMockupStore {
    conn: Mutex<Option<Connection>>,
    db_path: Option<PathBuf>,
}

impl SqliteMockupStore {
    /// Open `mockups.db` inside `data_dir`, creating it when needed
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("mockups.db");
        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;
        tracing::info!(path = %db_path.display(), "Opened mockup store");

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            db_path: Some(db_path),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            db_path: None,
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        // seq preserves insertion order across upserts
        conn.execute(
            "CREATE TABLE IF NOT EXISTS mockups (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                url TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Release the connection. Later calls fail with `StoreError::Closed`.
    pub fn close(&self) -> Result<(), StoreError> {
        if let Some(conn) = self.conn.lock().take() {
            conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
            tracing::debug!("Closed mockup store");
        }
        Ok(())
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(f(conn)?)
    }
}

#[async_trait]
impl MockupStore for SqliteMockupStore {
    async fn get_all(&self) -> Result<Vec<SavedMockup>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, url, created_at FROM mockups ORDER BY seq DESC")?;
            let rows = stmt.query_map([], |row| {
                Ok(SavedMockup {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?;
            rows.collect()
        })
    }

    async fn get(&self, id: &str) -> Result<Option<SavedMockup>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, url, created_at FROM mockups WHERE id = ?1",
                params![id],
                |row| {
                    Ok(SavedMockup {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    async fn put(&self, mockup: &SavedMockup) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO mockups (id, url, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET url = excluded.url, created_at = excluded.created_at",
                params![mockup.id, mockup.url, mockup.created_at],
            )
        })?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| conn.execute("DELETE FROM mockups WHERE id = ?1", params![id]))?;
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let n: i64 =
            self.with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM mockups", [], |r| r.get(0)))?;
        Ok(n as usize)
    }
}

/// In-memory store with the same contract, for tests and ephemeral sessions.
///
/// `set_unavailable(true)` makes every call fail, to exercise persistence
/// failure paths.
#[derive(Default)]
pub struct MemoryMockupStore {
    items: Mutex<Vec<SavedMockup>>,
    unavailable: AtomicBool,
}

impl MemoryMockupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MockupStore for MemoryMockupStore {
    async fn get_all(&self) -> Result<Vec<SavedMockup>, StoreError> {
        self.check()?;
        Ok(self.items.lock().iter().rev().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<SavedMockup>, StoreError> {
        self.check()?;
        Ok(self.items.lock().iter().find(|m| m.id == id).cloned())
    }

    async fn put(&self, mockup: &SavedMockup) -> Result<(), StoreError> {
        self.check()?;
        let mut items = self.items.lock();
        match items.iter_mut().find(|m| m.id == mockup.id) {
            Some(existing) => *existing = mockup.clone(),
            None => items.push(mockup.clone()),
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.check()?;
        self.items.lock().retain(|m| m.id != id);
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.check()?;
        Ok(self.items.lock().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mockup(id: &str, url: &str) -> SavedMockup {
        SavedMockup::new(id, url)
    }

    async fn exercise_contract(store: &dyn MockupStore) {
        store.put(&mockup("id1", "u1")).await.unwrap();
        store.put(&mockup("id2", "u2")).await.unwrap();
        store.put(&mockup("id3", "u3")).await.unwrap();

        let ids: Vec<String> = store.get_all().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["id3", "id2", "id1"]);

        // Upsert replaces the url and keeps the position
        store.put(&mockup("id1", "u1-new")).await.unwrap();
        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].id, "id1");
        assert_eq!(all[2].url, "u1-new");
        assert_eq!(store.count().await.unwrap(), 3);

        assert!(store.get("missing").await.unwrap().is_none());
        assert_eq!(store.get("id2").await.unwrap().unwrap().url, "u2");

        store.delete("id2").await.unwrap();
        store.delete("id2").await.unwrap();
        assert!(store.get("id2").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sqlite_store_contract() {
        let store = SqliteMockupStore::open_in_memory().unwrap();
        exercise_contract(&store).await;
    }

    #[tokio::test]
    async fn test_memory_store_contract() {
        let store = MemoryMockupStore::new();
        exercise_contract(&store).await;
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteMockupStore::open(dir.path()).unwrap();
            store.put(&mockup("a", "url-a")).await.unwrap();
            store.put(&mockup("b", "url-b")).await.unwrap();
            store.close().unwrap();
        }

        let store = SqliteMockupStore::open(dir.path()).unwrap();
        let ids: Vec<String> = store.get_all().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(store.db_path(), Some(dir.path().join("mockups.db").as_path()));
    }

    #[tokio::test]
    async fn test_closed_store_rejects_calls() {
        let store = SqliteMockupStore::open_in_memory().unwrap();
        store.close().unwrap();
        assert!(matches!(store.get_all().await, Err(StoreError::Closed)));
        assert!(matches!(
            store.put(&mockup("x", "y")).await,
            Err(StoreError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_unavailable_memory_store() {
        let store = MemoryMockupStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.count().await,
            Err(StoreError::Unavailable(_))
        ));
        store.set_unavailable(false);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
