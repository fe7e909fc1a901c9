use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DbError, Result};

mod filter;
mod persist;
mod value;

pub use filter::{CompareOp, Comparison, Condition};
pub use persist::FileStore;
pub use value::{coerce, ColumnDef, ColumnType, Value};

/// One record: a mapping from column name to value. Rows keep their
/// insertion order inside a table; key order within a row is not
/// significant.
pub type Row = HashMap<String, Value>;

/// A named, typed, ordered-column record collection within a database.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Ordered schema; column names are unique and case-sensitive
    pub columns: Vec<ColumnDef>,
    /// Ordered rows
    pub rows: Vec<Row>,
}

impl Table {
    fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A named collection of tables, persisted as one self-contained JSON
/// document. The associated file store lives next to the document on disk
/// and is not part of the serialized state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Database {
    pub tables: BTreeMap<String, Table>,
}

impl Database {
    fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }
}

/// One `column = value` pair of an update or row edit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    pub value: Value,
}

impl Assignment {
    pub fn new(column: impl Into<String>, value: Value) -> Assignment {
        Assignment { column: column.into(), value }
    }
}

/// The (current database, current table) cursor of one connection.
///
/// Every row-level and most table-level operations take the session as
/// explicit context. Each connection owns its session, so selecting a
/// database on one connection is invisible to every other connection; a
/// session pointing at a database another connection dropped simply fails
/// its next command with "does not exist".
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub database: Option<String>,
    pub table: Option<String>,
}

impl Session {
    fn require_database(&self) -> Result<&str> {
        self.database.as_deref().ok_or(DbError::NoDatabase)
    }

    fn require_table(&self) -> Result<&str> {
        self.table.as_deref().ok_or(DbError::NoTable)
    }
}

/// In-memory mirror of everything under the storage root.
struct Store {
    databases: HashMap<String, Database>,
}

impl Store {
    fn database(&self, name: &str) -> Result<&Database> {
        self.databases
            .get(name)
            .ok_or_else(|| DbError::DatabaseNotFound(name.to_string()))
    }

    fn database_mut(&mut self, name: &str) -> Result<&mut Database> {
        self.databases
            .get_mut(name)
            .ok_or_else(|| DbError::DatabaseNotFound(name.to_string()))
    }
}

/// The storage engine: owns the in-memory database map and keeps it
/// consistent with the per-database documents on disk.
///
/// ## Concurrency
///
/// All state sits behind one coarse [Mutex], acquired for the duration of
/// each operation (execution plus persistence). Command parsing happens
/// before any engine call and is lock-free. Operations are bounded by a
/// linear row scan, so nothing holds the lock for long.
///
/// ## Consistency
///
/// Every successful mutation rewrites the owning database's document before
/// the operation reports success. If the write fails, the in-memory
/// database is rolled back to its pre-mutation snapshot and the operation
/// fails, so memory and disk never silently diverge.
pub struct Engine {
    /// Storage root, one subdirectory per database
    root: PathBuf,
    /// All databases, behind the single engine lock
    store: Mutex<Store>,
}

impl Engine {
    /// Opens the engine over a storage root, creating it if absent and
    /// loading every database document found under it. Subdirectories with
    /// an unreadable document are skipped with a warning.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Engine> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let databases = persist::load_all(&root)?;
        info!(root = %root.display(), databases = databases.len(), "engine opened");
        Ok(Engine {
            root,
            store: Mutex::new(Store { databases }),
        })
    }

    /// Creates an empty database and persists it immediately.
    pub fn create_database(&self, name: &str) -> Result<String> {
        let mut store = self.store.lock();
        if store.databases.contains_key(name) {
            return Err(DbError::DatabaseExists(name.to_string()));
        }
        let db = Database::default();
        // Write the document (and the file store directory) before the
        // in-memory map learns about the database
        persist::save_database(&self.root, name, &db)?;
        store.databases.insert(name.to_string(), db);
        Ok(format!("Database '{name}' created."))
    }

    /// Points the session at a database. The table cursor survives only if
    /// the new database has a table of that name.
    pub fn select_database(&self, session: &mut Session, name: &str) -> Result<String> {
        let store = self.store.lock();
        let db = store.database(name)?;
        if let Some(table) = &session.table {
            if !db.tables.contains_key(table) {
                session.table = None;
            }
        }
        session.database = Some(name.to_string());
        Ok(format!("Current database: '{name}'."))
    }

    /// Removes a database and its on-disk tree, file store included. The
    /// session cursor is cleared if it pointed here.
    pub fn drop_database(&self, session: &mut Session, name: &str) -> Result<String> {
        let mut store = self.store.lock();
        if !store.databases.contains_key(name) {
            return Err(DbError::DatabaseNotFound(name.to_string()));
        }
        persist::remove_database(&self.root, name)?;
        store.databases.remove(name);
        if session.database.as_deref() == Some(name) {
            session.database = None;
            session.table = None;
        }
        Ok(format!("Database '{name}' deleted."))
    }

    /// Creates a table with the given ordered schema. Duplicate column
    /// names in the declaration are rejected up front.
    pub fn create_table(
        &self,
        session: &Session,
        name: &str,
        columns: Vec<ColumnDef>,
    ) -> Result<String> {
        let db_name = session.require_database()?.to_string();
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(DbError::ColumnExists(col.name.clone()));
            }
        }

        let mut store = self.store.lock();
        let db = store.database_mut(&db_name)?;
        if db.tables.contains_key(name) {
            return Err(DbError::TableExists(name.to_string()));
        }
        let snapshot = db.clone();
        db.tables.insert(name.to_string(), Table { columns, rows: Vec::new() });
        self.persist_or_rollback(&db_name, db, snapshot)?;
        Ok(format!("Table '{name}' created in '{db_name}'."))
    }

    /// Points the session at a table of the current database.
    pub fn select_table(&self, session: &mut Session, name: &str) -> Result<String> {
        let db_name = session.require_database()?.to_string();
        let store = self.store.lock();
        store.database(&db_name)?.table(name)?;
        session.table = Some(name.to_string());
        Ok(format!("Current table: '{name}'."))
    }

    /// Removes a table. The session's table cursor is cleared if it pointed
    /// here.
    pub fn drop_table(&self, session: &mut Session, name: &str) -> Result<String> {
        let db_name = session.require_database()?.to_string();
        let mut store = self.store.lock();
        let db = store.database_mut(&db_name)?;
        if !db.tables.contains_key(name) {
            return Err(DbError::TableNotFound(name.to_string()));
        }
        let snapshot = db.clone();
        db.tables.remove(name);
        self.persist_or_rollback(&db_name, db, snapshot)?;
        if session.table.as_deref() == Some(name) {
            session.table = None;
        }
        Ok(format!("Table '{name}' deleted from '{db_name}'."))
    }

    /// Appends one row to the current table.
    ///
    /// The value list is positional: exactly one value per declared column,
    /// in schema order. Each value is coerced to its column's declared type;
    /// file-typed values are copied into the database's file store as a side
    /// effect. Nothing is appended if the arity check or any coercion fails.
    pub fn insert(&self, session: &Session, values: Vec<Value>) -> Result<String> {
        let table_name = session.require_table()?.to_string();
        let db_name = session.require_database()?.to_string();
        let files = FileStore::for_database(&self.root, &db_name);

        let mut store = self.store.lock();
        let db = store.database_mut(&db_name)?;
        let row = {
            let table = db.table(&table_name)?;
            if values.len() != table.columns.len() {
                return Err(DbError::Arity {
                    expected: table.columns.len(),
                    got: values.len(),
                });
            }
            let mut row = Row::new();
            for (col, raw) in table.columns.iter().zip(&values) {
                row.insert(col.name.clone(), coerce(raw, col.ty, &files)?);
            }
            row
        };

        let snapshot = db.clone();
        db.table_mut(&table_name)?.rows.push(row);
        self.persist_or_rollback(&db_name, db, snapshot)?;
        Ok(format!("Values inserted into '{table_name}'."))
    }

    /// Merges assignments into every row matching the condition.
    ///
    /// Updates are untyped: assignment values are written as-is, without
    /// declared-type coercion (use row edit for typed writes). Matching
    /// zero rows is a success and skips the document rewrite.
    pub fn update(
        &self,
        session: &Session,
        condition: &Condition,
        assignments: &[Assignment],
    ) -> Result<String> {
        let table_name = session.require_table()?.to_string();
        let db_name = session.require_database()?.to_string();

        let mut store = self.store.lock();
        let db = store.database_mut(&db_name)?;
        let snapshot = db.clone();
        let table = db.table_mut(&table_name)?;

        let mut count = 0;
        for row in &mut table.rows {
            if condition.matches(row) {
                for a in assignments {
                    row.insert(a.column.clone(), a.value.clone());
                }
                count += 1;
            }
        }
        if count > 0 {
            self.persist_or_rollback(&db_name, db, snapshot)?;
        }
        Ok(format!("{count} row(s) updated."))
    }

    /// Removes every row matching the condition and reports the count.
    /// Matching zero rows is a success and skips the document rewrite.
    pub fn delete(&self, session: &Session, condition: &Condition) -> Result<String> {
        let table_name = session.require_table()?.to_string();
        let db_name = session.require_database()?.to_string();

        let mut store = self.store.lock();
        let db = store.database_mut(&db_name)?;
        let snapshot = db.clone();
        let table = db.table_mut(&table_name)?;

        let before = table.rows.len();
        table.rows.retain(|row| !condition.matches(row));
        let deleted = before - table.rows.len();
        if deleted > 0 {
            self.persist_or_rollback(&db_name, db, snapshot)?;
        }
        Ok(format!("{deleted} row(s) deleted."))
    }

    /// Appends a column to the current table's schema and backfills every
    /// existing row with a null value for it. The schema is append-only.
    pub fn add_column(&self, session: &Session, column: ColumnDef) -> Result<String> {
        let table_name = session.require_table()?.to_string();
        let db_name = session.require_database()?.to_string();

        let mut store = self.store.lock();
        let db = store.database_mut(&db_name)?;
        if db.table(&table_name)?.column(&column.name).is_some() {
            return Err(DbError::ColumnExists(column.name));
        }
        let snapshot = db.clone();
        let table = db.table_mut(&table_name)?;
        for row in &mut table.rows {
            row.insert(column.name.clone(), Value::Null);
        }
        let name = column.name.clone();
        table.columns.push(column);
        self.persist_or_rollback(&db_name, db, snapshot)?;
        Ok(format!("Column '{name}' added."))
    }

    /// Applies assignments to the row(s) whose `id` field, compared as
    /// text, equals the given id.
    ///
    /// Unlike [Engine::update] this coerces each assignment to its column's
    /// declared type; assignments naming unknown columns are ignored.
    /// Finding no row is reported as a success message, matching the
    /// command surface.
    pub fn edit_row(
        &self,
        session: &Session,
        id: &str,
        assignments: &[Assignment],
    ) -> Result<String> {
        let table_name = session.require_table()?.to_string();
        let db_name = session.require_database()?.to_string();
        let files = FileStore::for_database(&self.root, &db_name);

        let mut store = self.store.lock();
        let db = store.database_mut(&db_name)?;
        let staged = {
            let table = db.table(&table_name)?;
            if !table
                .rows
                .iter()
                .any(|row| row.get("id").is_some_and(|v| v.to_string() == id))
            {
                return Ok(format!("No row found with id={id}."));
            }
            // Coerce once up front; the same typed values apply to every
            // matching row
            let mut staged = Vec::new();
            for a in assignments {
                let Some(col) = table.column(&a.column) else {
                    continue;
                };
                staged.push((a.column.clone(), coerce(&a.value, col.ty, &files)?));
            }
            staged
        };

        let snapshot = db.clone();
        let table = db.table_mut(&table_name)?;
        for row in &mut table.rows {
            if row.get("id").is_some_and(|v| v.to_string() == id) {
                for (column, value) in &staged {
                    row.insert(column.clone(), value.clone());
                }
            }
        }
        self.persist_or_rollback(&db_name, db, snapshot)?;
        Ok(format!("Row with id={id} updated."))
    }

    /// Returns the current table's schema and full row set as a pretty
    /// JSON string.
    pub fn show(&self, session: &Session) -> Result<String> {
        let table_name = session.require_table()?.to_string();
        let db_name = session.require_database()?.to_string();

        let store = self.store.lock();
        let table = store.database(&db_name)?.table(&table_name)?;
        let doc = serde_json::json!({
            "columns": table.columns,
            "rows": table.rows,
        });
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Filters the current table through the condition, then projects the
    /// requested columns. `*` (or an empty column list) returns full rows;
    /// a projected column absent from a row yields null.
    pub fn select(
        &self,
        session: &Session,
        columns: &[String],
        condition: &Condition,
    ) -> Result<Vec<Row>> {
        let db_name = session.require_database()?.to_string();
        let table_name = session.require_table()?.to_string();

        let store = self.store.lock();
        let table = store.database(&db_name)?.table(&table_name)?;
        let star = columns.is_empty() || (columns.len() == 1 && columns[0] == "*");

        let rows = table
            .rows
            .iter()
            .filter(|row| condition.matches(row))
            .map(|row| {
                if star {
                    row.clone()
                } else {
                    columns
                        .iter()
                        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                        .collect()
                }
            })
            .collect();
        Ok(rows)
    }

    /// Rewrites the database's document, restoring the pre-mutation
    /// snapshot if the write fails.
    fn persist_or_rollback(
        &self,
        name: &str,
        db: &mut Database,
        snapshot: Database,
    ) -> Result<()> {
        if let Err(e) = persist::save_database(&self.root, name, db) {
            *db = snapshot;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn users_schema() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", ColumnType::Int),
            ColumnDef::new("name", ColumnType::Text),
            ColumnDef::new("age", ColumnType::Int),
        ]
    }

    fn open_with_users(root: &Path) -> (Engine, Session) {
        let engine = Engine::open(root).unwrap();
        let mut session = Session::default();
        engine.create_database("TestDB").unwrap();
        engine.select_database(&mut session, "TestDB").unwrap();
        engine
            .create_table(&session, "Users", users_schema())
            .unwrap();
        engine.select_table(&mut session, "Users").unwrap();
        (engine, session)
    }

    fn insert_alice_bob(engine: &Engine, session: &Session) {
        engine
            .insert(session, vec![Value::Int(1), Value::Text("Alice".into()), Value::Int(23)])
            .unwrap();
        engine
            .insert(session, vec![Value::Int(2), Value::Text("Bob".into()), Value::Int(31)])
            .unwrap();
    }

    #[test]
    fn create_database_twice_fails() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(dir.path()).unwrap();
        engine.create_database("A").unwrap();
        assert!(matches!(
            engine.create_database("A"),
            Err(DbError::DatabaseExists(_))
        ));
    }

    #[test]
    fn reload_reconstructs_persisted_state() {
        let dir = tempdir().unwrap();
        let expected;
        {
            let (engine, session) = open_with_users(dir.path());
            insert_alice_bob(&engine, &session);
            expected = engine
                .select(&session, &["*".to_string()], &Condition::all())
                .unwrap();
        }

        // A fresh engine over the same root sees the same table
        let engine = Engine::open(dir.path()).unwrap();
        let mut session = Session::default();
        engine.select_database(&mut session, "TestDB").unwrap();
        engine.select_table(&mut session, "Users").unwrap();
        let reloaded = engine
            .select(&session, &["*".to_string()], &Condition::all())
            .unwrap();
        assert_eq!(reloaded, expected);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[0]["name"], Value::Text("Alice".into()));

        let shown = engine.show(&session).unwrap();
        assert!(shown.contains("\"name\": \"Alice\""));
        assert!(shown.contains("\"type\": \"int\""));
    }

    #[test]
    fn insert_arity_mismatch_appends_nothing() {
        let dir = tempdir().unwrap();
        let (engine, session) = open_with_users(dir.path());
        let err = engine
            .insert(&session, vec![Value::Int(1), Value::Text("Alice".into())])
            .unwrap_err();
        assert!(matches!(err, DbError::Arity { expected: 3, got: 2 }));
        let rows = engine.select(&session, &[], &Condition::all()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn insert_coerces_to_declared_types() {
        let dir = tempdir().unwrap();
        let (engine, session) = open_with_users(dir.path());
        // Text tokens carrying numbers land as integers
        engine
            .insert(
                &session,
                vec![Value::Text("3".into()), Value::Int(42), Value::Text("19".into())],
            )
            .unwrap();
        let rows = engine.select(&session, &[], &Condition::all()).unwrap();
        assert_eq!(rows[0]["id"], Value::Int(3));
        assert_eq!(rows[0]["name"], Value::Text("42".into()));
        assert_eq!(rows[0]["age"], Value::Int(19));

        // A non-numeric token for an int column rejects the whole row
        let err = engine
            .insert(
                &session,
                vec![Value::Text("x".into()), Value::Text("Ada".into()), Value::Int(1)],
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Coerce { .. }));
        assert_eq!(engine.select(&session, &[], &Condition::all()).unwrap().len(), 1);
    }

    #[test]
    fn add_column_backfills_and_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let (engine, session) = open_with_users(dir.path());
        insert_alice_bob(&engine, &session);

        engine
            .add_column(&session, ColumnDef::new("email", ColumnType::Text))
            .unwrap();
        let rows = engine.select(&session, &[], &Condition::all()).unwrap();
        assert_eq!(rows[0]["email"], Value::Null);

        let err = engine
            .add_column(&session, ColumnDef::new("email", ColumnType::Text))
            .unwrap_err();
        assert!(matches!(err, DbError::ColumnExists(_)));
    }

    #[test]
    fn delete_with_no_match_skips_the_rewrite() {
        let dir = tempdir().unwrap();
        let (engine, session) = open_with_users(dir.path());
        insert_alice_bob(&engine, &session);

        // Remove the document out from under the engine; a zero-match
        // delete must not recreate it
        let doc = persist::document_path(dir.path(), "TestDB");
        fs::remove_file(&doc).unwrap();
        let msg = engine
            .delete(&session, &Condition::parse("age>100").unwrap())
            .unwrap();
        assert_eq!(msg, "0 row(s) deleted.");
        assert!(!doc.exists());

        // A matching delete rewrites it
        let msg = engine
            .delete(&session, &Condition::parse("id=1").unwrap())
            .unwrap();
        assert_eq!(msg, "1 row(s) deleted.");
        assert!(doc.exists());
        assert_eq!(engine.select(&session, &[], &Condition::all()).unwrap().len(), 1);
    }

    #[test]
    fn update_merges_raw_values() {
        let dir = tempdir().unwrap();
        let (engine, session) = open_with_users(dir.path());
        insert_alice_bob(&engine, &session);

        let cond = Condition::and_group(vec![Comparison::new(
            "id",
            CompareOp::Eq,
            Value::Int(2),
        )]);
        let msg = engine
            .update(&session, &cond, &[Assignment::new("age", Value::Int(32))])
            .unwrap();
        assert_eq!(msg, "1 row(s) updated.");

        let rows = engine
            .select(&session, &[], &Condition::parse("id=2").unwrap())
            .unwrap();
        assert_eq!(rows[0]["age"], Value::Int(32));

        // Zero matches is still a success
        let cond = Condition::and_group(vec![Comparison::new(
            "id",
            CompareOp::Eq,
            Value::Int(99),
        )]);
        let msg = engine.update(&session, &cond, &[]).unwrap();
        assert_eq!(msg, "0 row(s) updated.");
    }

    #[test]
    fn edit_row_coerces_and_ignores_unknown_columns() {
        let dir = tempdir().unwrap();
        let (engine, session) = open_with_users(dir.path());
        insert_alice_bob(&engine, &session);

        let msg = engine
            .edit_row(
                &session,
                "2",
                &[
                    Assignment::new("age", Value::Text("27".into())),
                    Assignment::new("nickname", Value::Text("Bobby".into())),
                ],
            )
            .unwrap();
        assert_eq!(msg, "Row with id=2 updated.");

        let rows = engine
            .select(&session, &[], &Condition::parse("id=2").unwrap())
            .unwrap();
        assert_eq!(rows[0]["age"], Value::Int(27));
        assert!(!rows[0].contains_key("nickname"));

        let msg = engine.edit_row(&session, "99", &[]).unwrap();
        assert_eq!(msg, "No row found with id=99.");
    }

    #[test]
    fn file_column_copies_payload_into_store() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("cv.pdf");
        fs::write(&src, b"resume bytes").unwrap();

        let engine = Engine::open(dir.path().join("data")).unwrap();
        let mut session = Session::default();
        engine.create_database("Docs").unwrap();
        engine.select_database(&mut session, "Docs").unwrap();
        engine
            .create_table(
                &session,
                "Attachments",
                vec![
                    ColumnDef::new("id", ColumnType::Int),
                    ColumnDef::new("doc", ColumnType::File),
                ],
            )
            .unwrap();
        engine.select_table(&mut session, "Attachments").unwrap();
        engine
            .insert(
                &session,
                vec![Value::Int(1), Value::Text(src.display().to_string())],
            )
            .unwrap();

        let rows = engine.select(&session, &[], &Condition::all()).unwrap();
        assert_eq!(rows[0]["doc"], Value::Text("files/cv.pdf".into()));
        let copied = dir.path().join("data").join("Docs").join("files").join("cv.pdf");
        assert_eq!(fs::read(copied).unwrap(), b"resume bytes");
        // The original stays where it was
        assert!(src.is_file());
    }

    #[test]
    fn create_table_rejects_duplicate_columns() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(dir.path()).unwrap();
        let mut session = Session::default();
        engine.create_database("T").unwrap();
        engine.select_database(&mut session, "T").unwrap();
        let err = engine
            .create_table(
                &session,
                "Bad",
                vec![
                    ColumnDef::new("id", ColumnType::Int),
                    ColumnDef::new("id", ColumnType::Text),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, DbError::ColumnExists(_)));
    }

    #[test]
    fn drop_database_removes_tree_and_clears_cursor() {
        let dir = tempdir().unwrap();
        let (engine, mut session) = open_with_users(dir.path());
        engine.drop_database(&mut session, "TestDB").unwrap();
        assert!(session.database.is_none());
        assert!(session.table.is_none());
        assert!(!dir.path().join("TestDB").exists());
        assert!(matches!(
            engine.select_database(&mut session, "TestDB"),
            Err(DbError::DatabaseNotFound(_))
        ));
    }

    #[test]
    fn drop_table_clears_table_cursor() {
        let dir = tempdir().unwrap();
        let (engine, mut session) = open_with_users(dir.path());
        engine.drop_table(&mut session, "Users").unwrap();
        assert!(session.table.is_none());
        assert!(matches!(engine.show(&session), Err(DbError::NoTable)));
    }

    #[test]
    fn sessions_are_isolated() {
        let dir = tempdir().unwrap();
        let (engine, session) = open_with_users(dir.path());
        insert_alice_bob(&engine, &session);

        // A second connection starts with an empty cursor
        let other = Session::default();
        assert!(matches!(
            engine.select(&other, &[], &Condition::all()),
            Err(DbError::NoDatabase)
        ));
    }

    #[test]
    fn projection_fills_missing_columns_with_null() {
        let dir = tempdir().unwrap();
        let (engine, session) = open_with_users(dir.path());
        insert_alice_bob(&engine, &session);

        let rows = engine
            .select(
                &session,
                &["name".to_string(), "email".to_string()],
                &Condition::parse("id=1").unwrap(),
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], Value::Text("Alice".into()));
        assert_eq!(rows[0]["email"], Value::Null);
        assert!(!rows[0].contains_key("age"));
    }

    #[test]
    fn selecting_a_database_invalidates_a_stale_table_cursor() {
        let dir = tempdir().unwrap();
        let (engine, mut session) = open_with_users(dir.path());
        engine.create_database("Other").unwrap();
        engine.select_database(&mut session, "Other").unwrap();
        // "Users" does not exist in Other
        assert!(session.table.is_none());
    }
}
