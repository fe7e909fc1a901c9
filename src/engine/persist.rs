use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::engine::Database;
use crate::error::{DbError, Result};

/// Name of the per-database subdirectory holding copied file-reference
/// payloads.
pub const FILES_DIR: &str = "files";

/// On-disk layout, one directory per database under the storage root:
///
/// ```text
/// <root>/<db>/<db>.json   whole-database document (pretty JSON)
/// <root>/<db>/files/      copied file-reference payloads
/// ```
fn database_dir(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

pub fn document_path(root: &Path, name: &str) -> PathBuf {
    database_dir(root, name).join(format!("{name}.json"))
}

/// Rewrites a database's whole document.
///
/// Every successful mutation calls this before the command reports success;
/// the document is self-contained, so a reload always reconstructs the last
/// successfully written state.
pub fn save_database(root: &Path, name: &str, db: &Database) -> Result<()> {
    let dir = database_dir(root, name);
    fs::create_dir_all(dir.join(FILES_DIR))?;
    let doc = serde_json::to_vec_pretty(db)?;
    fs::write(document_path(root, name), doc)?;
    Ok(())
}

/// Removes a database's directory tree, file store included.
pub fn remove_database(root: &Path, name: &str) -> Result<()> {
    let dir = database_dir(root, name);
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    Ok(())
}

/// Scans the storage root and loads one database per subdirectory.
///
/// A subdirectory without a readable document is skipped with a warning so
/// one corrupt database never prevents the engine from starting.
pub fn load_all(root: &Path) -> Result<HashMap<String, Database>> {
    let mut databases = HashMap::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let loaded = fs::read(document_path(root, &name))
            .map_err(DbError::from)
            .and_then(|bytes| serde_json::from_slice::<Database>(&bytes).map_err(DbError::from));
        match loaded {
            Ok(db) => {
                databases.insert(name, db);
            }
            Err(e) => warn!(database = %name, error = %e, "skipping database with unreadable document"),
        }
    }
    Ok(databases)
}

/// Handle on one database's file store.
///
/// File-typed column values are ingested through this: the referenced file
/// is copied in under its own name and the stored row value becomes the
/// relative path. The original file is never moved.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn for_database(root: &Path, name: &str) -> FileStore {
        FileStore {
            dir: database_dir(root, name).join(FILES_DIR),
        }
    }

    /// Copies the file at `raw` into the store and returns its stored
    /// relative path, or `None` when `raw` does not name an existing
    /// regular file (the caller keeps the literal text in that case).
    pub fn ingest(&self, raw: &str) -> std::io::Result<Option<String>> {
        let src = Path::new(raw.trim());
        if !src.is_file() {
            return Ok(None);
        }
        let Some(file_name) = src.file_name() else {
            return Ok(None);
        };
        fs::create_dir_all(&self.dir)?;
        fs::copy(src, self.dir.join(file_name))?;
        Ok(Some(format!("{FILES_DIR}/{}", file_name.to_string_lossy())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::{ColumnDef, ColumnType, Value};
    use crate::engine::Table;
    use tempfile::tempdir;

    fn sample_database() -> Database {
        let mut db = Database::default();
        let mut table = Table {
            columns: vec![
                ColumnDef::new("id", ColumnType::Int),
                ColumnDef::new("name", ColumnType::Text),
            ],
            rows: Vec::new(),
        };
        let mut row = crate::engine::Row::new();
        row.insert("id".into(), Value::Int(1));
        row.insert("name".into(), Value::Text("Alice".into()));
        table.rows.push(row);
        db.tables.insert("Users".into(), table);
        db
    }

    #[test]
    fn document_round_trip() {
        let dir = tempdir().unwrap();
        let db = sample_database();
        save_database(dir.path(), "TestDB", &db).unwrap();

        let loaded = load_all(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["TestDB"], db);
        // File store directory exists alongside the document
        assert!(dir.path().join("TestDB").join(FILES_DIR).is_dir());
    }

    #[test]
    fn unreadable_document_is_skipped() {
        let dir = tempdir().unwrap();
        save_database(dir.path(), "Good", &sample_database()).unwrap();
        let bad = dir.path().join("Bad");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join("Bad.json"), b"not json").unwrap();

        let loaded = load_all(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("Good"));
    }

    #[test]
    fn remove_database_deletes_the_tree() {
        let dir = tempdir().unwrap();
        save_database(dir.path(), "Gone", &sample_database()).unwrap();
        remove_database(dir.path(), "Gone").unwrap();
        assert!(!dir.path().join("Gone").exists());
        // Removing an absent database is not an error
        remove_database(dir.path(), "Gone").unwrap();
    }
}
