//! Query execution.
//!
//! [`execute`] runs whatever SQL it is handed on a fresh read-write
//! connection. [`execute_untrusted`] is the path for SQL produced by the
//! language model: it opens the store read-only and only accepts a single
//! `SELECT`/`WITH` statement that SQLite itself reports as read-only.
//!
//! Both buffer the full result set before returning.

use rusqlite::{Connection, Statement};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::parser::SqlValue;
use crate::store;

/// A fully materialized query result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, top to bottom
    pub fn column_values(&self, name: &str) -> Option<Vec<&SqlValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

struct RowView<'a> {
    columns: &'a [String],
    values: &'a [SqlValue],
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Serializes as an array of row objects, columns in result order
impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowView {
                columns: &self.columns,
                values: row,
            })?;
        }
        seq.end()
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                cells
                    .iter()
                    .map(|row| row[idx].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        write_padded(f, &header, &widths)?;

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        for row in &cells {
            let values: Vec<&str> = row.iter().map(String::as_str).collect();
            write_padded(f, &values, &widths)?;
        }

        write!(f, "({} rows)", self.rows.len())
    }
}

fn write_padded(f: &mut fmt::Formatter<'_>, values: &[&str], widths: &[usize]) -> fmt::Result {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{:<width$}", v, width = *w))
        .collect();
    writeln!(f, "{}", padded.join(" | ").trim_end())
}

/// Run a trusted SQL string on a fresh connection
pub fn execute(config: &Config, sql: &str) -> Result<ResultSet> {
    let conn = store::open(config)?;
    query_connection(&conn, sql)
}

/// Run SQL from an untrusted source. Writes, multiple statements and
/// anything other than a query are rejected before execution.
pub fn execute_untrusted(config: &Config, sql: &str) -> Result<ResultSet> {
    check_query_keyword(sql)?;
    if has_trailing_statement(sql) {
        return Err(StoreError::RejectedStatement(
            "only a single statement is accepted".to_string(),
        ));
    }

    let conn = store::open_read_only(config)?;
    let mut stmt = prepare_single(&conn, sql)?;
    if !stmt.readonly() {
        return Err(StoreError::RejectedStatement(
            "statement would modify the database".to_string(),
        ));
    }

    collect_rows(&mut stmt)
}

/// Run SQL on an existing connection and buffer every row
pub fn query_connection(conn: &Connection, sql: &str) -> Result<ResultSet> {
    debug!(sql, "executing query");
    let mut stmt = conn.prepare(sql)?;
    collect_rows(&mut stmt)
}

fn prepare_single<'c>(conn: &'c Connection, sql: &str) -> Result<Statement<'c>> {
    match conn.prepare(sql) {
        Ok(stmt) => Ok(stmt),
        Err(rusqlite::Error::MultipleStatement) => Err(StoreError::RejectedStatement(
            "only a single statement is accepted".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

fn collect_rows(stmt: &mut Statement<'_>) -> Result<ResultSet> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(width);
        for idx in 0..width {
            values.push(SqlValue::from(row.get_ref(idx)?));
        }
        rows.push(values);
    }

    debug!(rows = rows.len(), "query complete");
    Ok(ResultSet { columns, rows })
}

/// First keyword after leading whitespace and comments must start a query
fn check_query_keyword(sql: &str) -> Result<()> {
    let keyword: String = strip_leading_comments(sql)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();

    match keyword.as_str() {
        "SELECT" | "WITH" => Ok(()),
        "" => Err(StoreError::RejectedStatement("empty statement".to_string())),
        other => Err(StoreError::RejectedStatement(format!(
            "{} statements are not allowed",
            other
        ))),
    }
}

/// True when something other than comments follows the first top-level `;`
fn has_trailing_statement(sql: &str) -> bool {
    let bytes = sql.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            q @ (b'\'' | b'"' | b'`' | b'[') => {
                let close = if q == b'[' { ']' } else { q as char };
                i = sql[i + 1..]
                    .find(close)
                    .map_or(bytes.len(), |p| i + 1 + p + 1);
            }
            b'-' if sql[i..].starts_with("--") => {
                i = sql[i..].find('\n').map_or(bytes.len(), |p| i + p + 1);
            }
            b'/' if sql[i..].starts_with("/*") => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |p| i + 2 + p + 2);
            }
            b';' => return !only_separators(&sql[i + 1..]),
            _ => i += 1,
        }
    }

    false
}

fn only_separators(mut rest: &str) -> bool {
    loop {
        rest = strip_leading_comments(rest);
        match rest.strip_prefix(';') {
            Some(tail) => rest = tail,
            None => return rest.is_empty(),
        }
    }
}

fn strip_leading_comments(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
        } else if let Some(rest) = sql.strip_prefix("/*") {
            sql = rest.split_once("*/").map(|(_, tail)| tail).unwrap_or("");
        } else {
            return sql;
        }
    }
}
