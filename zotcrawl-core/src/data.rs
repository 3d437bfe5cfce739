// Page text persistence

use crate::error::{CoreError, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, RwLock};
use zotcrawl_scanner::PageRecord;

/// Keyed store of URL -> extracted page text.
///
/// Writes to one key are atomic and visible to later reads. Enumeration
/// order is the order in which keys were first written; overwriting a key
/// keeps its position.
pub trait PageStore: Send + Sync {
    fn put(&self, url: &str, text: &str) -> Result<()>;

    fn get(&self, url: &str) -> Result<Option<String>>;

    fn keys(&self) -> Result<Vec<String>>;

    fn values(&self) -> Result<Vec<String>>;

    /// Key/value pairs in enumeration order.
    fn records(&self) -> Result<Vec<PageRecord>> {
        let mut records = Vec::new();
        for url in self.keys()? {
            if let Some(text) = self.get(&url)? {
                records.push(PageRecord { url, text });
            }
        }
        Ok(records)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn put_record(&self, record: &PageRecord) -> Result<()> {
        self.put(&record.url, &record.text)
    }
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// SQLite-backed page store.
pub struct SqlitePageStore {
    conn: Mutex<Connection>,
}

impl SqlitePageStore {
    pub fn drop(path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Open or create the store at `path`.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Several crawl workers write concurrently
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::from_connection(conn)
    }

    /// Open a store that must already exist, as the report does.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !Self::exists(path) {
            return Err(CoreError::missing("page store", path));
        }
        Self::new(path)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = SqlitePageStore {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS pages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    url TEXT NOT NULL UNIQUE,
                    text TEXT NOT NULL,
                    stored_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                ",
            )?;
            Ok(())
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| CoreError::LockPoisoned)?;
        f(&conn)
    }

    fn column(&self, sql: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(rows)
        })
    }
}

impl PageStore for SqlitePageStore {
    fn put(&self, url: &str, text: &str) -> Result<()> {
        let timestamp = current_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO pages (url, text, stored_at, updated_at) VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(url) DO UPDATE SET text = excluded.text, updated_at = excluded.updated_at",
                params![url, text, timestamp],
            )?;
            Ok(())
        })
    }

    fn get(&self, url: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let text = conn
                .query_row("SELECT text FROM pages WHERE url = ?1", params![url], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(text)
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.column("SELECT url FROM pages ORDER BY id")
    }

    fn values(&self) -> Result<Vec<String>> {
        self.column("SELECT text FROM pages ORDER BY id")
    }

    fn records(&self) -> Result<Vec<PageRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT url, text FROM pages ORDER BY id")?;
            let records = stmt
                .query_map([], |row| {
                    Ok(PageRecord {
                        url: row.get(0)?,
                        text: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
    }

    fn len(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }
}

#[derive(Default)]
struct MemoryPages {
    order: Vec<String>,
    texts: HashMap<String, String>,
}

/// In-process store, used by tests and dry runs.
#[derive(Default)]
pub struct MemoryPageStore {
    pages: RwLock<MemoryPages>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageStore for MemoryPageStore {
    fn put(&self, url: &str, text: &str) -> Result<()> {
        let mut pages = self.pages.write().map_err(|_| CoreError::LockPoisoned)?;
        if pages.texts.insert(url.to_string(), text.to_string()).is_none() {
            pages.order.push(url.to_string());
        }
        Ok(())
    }

    fn get(&self, url: &str) -> Result<Option<String>> {
        let pages = self.pages.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(pages.texts.get(url).cloned())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let pages = self.pages.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(pages.order.clone())
    }

    fn values(&self) -> Result<Vec<String>> {
        let pages = self.pages.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(pages
            .order
            .iter()
            .filter_map(|url| pages.texts.get(url).cloned())
            .collect())
    }
}
