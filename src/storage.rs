//! SQLite-backed domain stores.
//!
//! Each domain owns an independent database file. The pipeline only
//! ever reads: the [`DataStore`] trait exposes SELECT execution and
//! schema introspection, nothing else. Rows come back as JSON maps so
//! downstream consumers (dependency resolution, synthesis context) can
//! stay column-agnostic.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::types::ValueRef;

use crate::core::Row;
use crate::error::OrchestratorError;

/// Read-only query capability over one domain's relational store.
pub trait DataStore: Send + Sync {
    /// Executes a complete SELECT statement and returns the rows.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Store`] when the statement fails to
    /// prepare or execute; the message preserves the underlying SQLite
    /// error text (the query agent pattern-matches on it).
    fn select(&self, sql: &str) -> Result<Vec<Row>, OrchestratorError>;

    /// Returns a textual description of the tables and columns,
    /// suitable for embedding in a generation prompt.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Store`] when introspection fails.
    fn schema_text(&self) -> Result<String, OrchestratorError>;
}

/// SQLite implementation of [`DataStore`].
///
/// The connection is wrapped in a `Mutex` because `rusqlite::Connection`
/// is `Send` but not `Sync`; plan execution is strictly sequential so
/// the lock is never contended.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens a store backed by the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Store`] when the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OrchestratorError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory store (used by tests and fixtures).
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Store`] when SQLite refuses the
    /// in-memory database.
    pub fn open_in_memory() -> Result<Self, OrchestratorError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Executes arbitrary statements (DDL, seeding). Intended for
    /// fixtures; the pipeline itself never writes.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Store`] when a statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), OrchestratorError> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, OrchestratorError> {
        self.conn
            .lock()
            .map_err(|e| OrchestratorError::Store {
                message: format!("Connection lock poisoned: {e}"),
            })
    }

    fn value_to_json(value: ValueRef<'_>) -> serde_json::Value {
        match value {
            ValueRef::Null => serde_json::Value::Null,
            ValueRef::Integer(i) => serde_json::Value::from(i),
            ValueRef::Real(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            ValueRef::Text(t) => {
                serde_json::Value::String(String::from_utf8_lossy(t).into_owned())
            }
            ValueRef::Blob(b) => serde_json::Value::String(format!("<blob {} bytes>", b.len())),
        }
    }
}

impl DataStore for SqliteStore {
    fn select(&self, sql: &str) -> Result<Vec<Row>, OrchestratorError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(ToString::to_string).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = Row::new();
            for (idx, name) in column_names.iter().enumerate() {
                let value = row.get_ref(idx)?;
                map.insert(name.clone(), Self::value_to_json(value));
            }
            out.push(map);
        }
        Ok(out)
    }

    fn schema_text(&self) -> Result<String, OrchestratorError> {
        let conn = self.lock()?;
        let mut tables_stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let tables: Vec<String> = tables_stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;

        let mut sections = Vec::with_capacity(tables.len());
        for table in &tables {
            let mut info_stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
            let columns: Vec<(String, String, bool, bool)> = info_stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)? != 0,
                        row.get::<_, i64>(5)? != 0,
                    ))
                })?
                .collect::<Result<_, _>>()?;

            let names: Vec<&str> = columns.iter().map(|c| c.0.as_str()).collect();
            let details: Vec<String> = columns
                .iter()
                .map(|(name, ty, not_null, pk)| {
                    let nullability = if *not_null { "NOT NULL" } else { "NULL" };
                    if *pk {
                        format!("{name} ({ty}, {nullability}, PRIMARY KEY)")
                    } else {
                        format!("{name} ({ty}, {nullability})")
                    }
                })
                .collect();

            sections.push(format!(
                "Table {table}:\n  Columns: {}\n  Details: {}",
                names.join(", "),
                details.join("; ")
            ));
        }

        Ok(sections.join("\n\n"))
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap_or_else(|_| unreachable!());
        store
            .execute_batch(
                "CREATE TABLE Users (
                     UserID INTEGER PRIMARY KEY,
                     Name TEXT NOT NULL,
                     Email TEXT NOT NULL,
                     PremiumStatus INTEGER
                 );
                 INSERT INTO Users VALUES (1, 'Alice', 'alice@example.com', 1);
                 INSERT INTO Users VALUES (2, 'Bob', 'bob@example.com', 0);",
            )
            .unwrap_or_else(|_| unreachable!());
        store
    }

    #[test]
    fn test_select_rows_as_json_maps() {
        let store = seeded_store();
        let rows = store
            .select("SELECT UserID, Name FROM Users WHERE UserID = 1")
            .unwrap_or_default();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("UserID"), Some(&serde_json::json!(1)));
        assert_eq!(rows[0].get("Name"), Some(&serde_json::json!("Alice")));
    }

    #[test]
    fn test_select_invalid_column_preserves_sqlite_message() {
        let store = seeded_store();
        let err = store.select("SELECT Tracking FROM Users");
        let message = match err {
            Err(OrchestratorError::Store { message }) => message,
            _ => String::new(),
        };
        assert!(message.to_lowercase().contains("no such column"));
    }

    #[test]
    fn test_schema_text_lists_tables_and_columns() {
        let store = seeded_store();
        let schema = store.schema_text().unwrap_or_default();
        assert!(schema.contains("Table Users:"));
        assert!(schema.contains("UserID, Name, Email, PremiumStatus"));
        assert!(schema.contains("PRIMARY KEY"));
    }

    #[test]
    fn test_null_values_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap_or_else(|_| unreachable!());
        store
            .execute_batch("CREATE TABLE T (A INTEGER); INSERT INTO T VALUES (NULL);")
            .unwrap_or_else(|_| unreachable!());
        let rows = store.select("SELECT A FROM T").unwrap_or_default();
        assert_eq!(rows[0].get("A"), Some(&serde_json::Value::Null));
    }
}
