// Tests for page store persistence

use std::sync::Arc;
use tempfile::TempDir;
use zotcrawl_core::CoreError;
use zotcrawl_core::data::{PageStore, SqlitePageStore};

fn create_test_store() -> (TempDir, SqlitePageStore) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("pages.db");
    let store = SqlitePageStore::new(&db_path).unwrap();
    (temp_dir, store)
}

// ============================================================================
// Store Creation Tests
// ============================================================================

#[test]
fn test_store_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("pages.db");

    assert!(!SqlitePageStore::exists(&db_path));
    let store = SqlitePageStore::new(&db_path);
    assert!(store.is_ok());
    assert!(SqlitePageStore::exists(&db_path));
}

#[test]
fn test_store_drop() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("pages.db");

    {
        let _store = SqlitePageStore::new(&db_path).unwrap();
    }
    SqlitePageStore::drop(&db_path).unwrap();
    assert!(!db_path.exists());
}

#[test]
fn test_open_existing_requires_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("absent.db");

    let result = SqlitePageStore::open_existing(&db_path);
    assert!(matches!(
        result,
        Err(CoreError::MissingResource { kind: "page store", .. })
    ));
}

// ============================================================================
// Read / Write Tests
// ============================================================================

#[test]
fn test_put_then_get() {
    let (_dir, store) = create_test_store();
    store.put("https://www.ics.uci.edu/", "welcome text").unwrap();

    assert_eq!(
        store.get("https://www.ics.uci.edu/").unwrap().as_deref(),
        Some("welcome text")
    );
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_overwrite_keeps_position() {
    let (_dir, store) = create_test_store();
    store.put("https://a.ics.uci.edu/", "one").unwrap();
    store.put("https://b.ics.uci.edu/", "two").unwrap();
    store.put("https://a.ics.uci.edu/", "one again").unwrap();

    assert_eq!(
        store.keys().unwrap(),
        vec!["https://a.ics.uci.edu/", "https://b.ics.uci.edu/"]
    );
    assert_eq!(store.values().unwrap(), vec!["one again", "two"]);
}

#[test]
fn test_pages_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("pages.db");

    {
        let store = SqlitePageStore::new(&db_path).unwrap();
        store.put("https://www.stat.uci.edu/", "statistics").unwrap();
    }

    let store = SqlitePageStore::open_existing(&db_path).unwrap();
    assert_eq!(
        store.get("https://www.stat.uci.edu/").unwrap().as_deref(),
        Some("statistics")
    );
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[test]
fn test_concurrent_writers() {
    let (_dir, store) = create_test_store();
    let store: Arc<dyn PageStore> = Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = store.clone();
            std::thread::spawn(move || {
                for page in 0..25 {
                    let url = format!("https://www.ics.uci.edu/w{}/p{}", worker, page);
                    store.put(&url, "text").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len().unwrap(), 200);
}
