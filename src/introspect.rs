//! Schema introspection.
//!
//! Walks the live SQLite catalog and produces a two-level, ordered
//! `{table: {column: declared_type}}` description. The declared type is
//! reported exactly as written in the DDL, so `INTEGER` stays `INTEGER`
//! and an untyped column comes back as an empty string.
//!
//! Nothing is cached: each call reads the catalog as it is at that moment.

use rusqlite::Connection;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::store;

/// One column as recorded in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub has_default: bool,
    pub primary_key: bool,
}

/// A table and its columns in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableDescription {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

impl Serialize for TableDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for col in &self.columns {
            map.serialize_entry(&col.name, &col.declared_type)?;
        }
        map.end()
    }
}

/// Every table in the catalog, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDescription {
    tables: Vec<TableDescription>,
}

impl SchemaDescription {
    pub fn tables(&self) -> &[TableDescription] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableDescription> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// `(column, declared_type)` pairs for one table
    pub fn columns(&self, table: &str) -> Option<Vec<(&str, &str)>> {
        self.table(table).map(|t| {
            t.columns
                .iter()
                .map(|c| (c.name.as_str(), c.declared_type.as_str()))
                .collect()
        })
    }

    /// Pretty JSON, as embedded in the model prompt
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for SchemaDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for table in &self.tables {
            map.serialize_entry(&table.name, table)?;
        }
        map.end()
    }
}

/// Open a fresh connection and describe the whole schema
pub fn describe_schema(config: &Config) -> Result<SchemaDescription> {
    let conn = store::open(config)?;
    describe_connection(&conn)
}

/// Describe the schema visible through an existing connection
pub fn describe_connection(conn: &Connection) -> Result<SchemaDescription> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = table_columns(conn, &name)?;
        debug!(table = %name, columns = columns.len(), "described table");
        tables.push(TableDescription { name, columns });
    }

    Ok(SchemaDescription { tables })
}

/// Column catalog for a single table; empty if the table does not exist
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare_cached(
        "SELECT name, type, \"notnull\", dflt_value IS NOT NULL, pk
         FROM pragma_table_info(?1)
         ORDER BY cid",
    )?;

    let columns = stmt
        .query_map([table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                declared_type: row.get(1)?,
                not_null: row.get(2)?,
                has_default: row.get(3)?,
                primary_key: row.get::<_, i64>(4)? > 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(columns)
}

/// Look up a single table through an existing connection
pub fn describe_table(conn: &Connection, table: &str) -> Result<Option<TableDescription>> {
    let columns = table_columns(conn, table)?;
    if columns.is_empty() {
        return Ok(None);
    }

    Ok(Some(TableDescription {
        name: table.to_string(),
        columns,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE jobs (id INTEGER PRIMARY KEY, title TEXT NOT NULL, note VARCHAR(20) DEFAULT 'x');
             CREATE TABLE loose (anything);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_declared_types_are_verbatim() {
        let conn = memory_db();
        let schema = describe_connection(&conn).unwrap();

        assert_eq!(schema.table_names(), ["jobs", "loose"]);
        assert_eq!(
            schema.columns("jobs").unwrap(),
            [("id", "INTEGER"), ("title", "TEXT"), ("note", "VARCHAR(20)")]
        );
        assert_eq!(schema.columns("loose").unwrap(), [("anything", "")]);
    }

    #[test]
    fn test_column_flags() {
        let conn = memory_db();
        let jobs = describe_table(&conn, "jobs").unwrap().unwrap();

        assert!(jobs.column("id").unwrap().primary_key);
        assert!(jobs.column("title").unwrap().not_null);
        assert!(jobs.column("note").unwrap().has_default);
        assert!(describe_table(&conn, "absent").unwrap().is_none());
    }

    #[test]
    fn test_json_preserves_catalog_order() {
        let conn = memory_db();
        let json = serde_json::to_string(&describe_connection(&conn).unwrap()).unwrap();

        assert_eq!(
            json,
            r#"{"jobs":{"id":"INTEGER","title":"TEXT","note":"VARCHAR(20)"},"loose":{"anything":""}}"#
        );
    }

    #[test]
    fn test_no_caching_between_calls() {
        let conn = memory_db();
        let before = describe_connection(&conn).unwrap();

        conn.execute_batch("ALTER TABLE loose ADD COLUMN extra REAL; CREATE TABLE later (x TEXT);")
            .unwrap();
        let after = describe_connection(&conn).unwrap();

        assert_ne!(before, after);
        assert_eq!(after.table_names(), ["jobs", "loose", "later"]);
        assert_eq!(
            after.columns("loose").unwrap(),
            [("anything", ""), ("extra", "REAL")]
        );
    }
}
