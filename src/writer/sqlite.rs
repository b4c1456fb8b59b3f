use rusqlite::Connection;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use super::schema_gen::generate_create_table;
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::introspect::{describe_table, TableDescription};
use crate::parser::{Record, SqlValue, Tabular};
use crate::schema::TableSchema;
use crate::store;

/// Run a table definition statement. Statements are expected to use
/// `CREATE TABLE IF NOT EXISTS`, so repeating one is a no-op.
pub fn define_table(conn: &Connection, ddl: &str) -> Result<()> {
    debug!(sql = ddl.trim(), "defining table");
    conn.execute_batch(ddl)?;
    Ok(())
}

/// Setup-script variant of [`define_table`]: logs a failure instead of
/// returning it. Returns whether the statement ran.
pub fn define_table_best_effort(conn: &Connection, ddl: &str) -> bool {
    match define_table(conn, ddl) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "table definition failed");
            false
        }
    }
}

/// Define a known table from its static schema
pub fn define_schema(conn: &Connection, schema: &TableSchema) -> Result<()> {
    define_table(conn, &generate_create_table(schema))
}

/// Insert one row and return its rowid.
///
/// Column names are checked against the live catalog before they reach
/// the statement text; values are always bound positionally. The insert
/// commits on its own.
pub fn insert_row(conn: &Connection, table: &str, record: &Record) -> Result<i64> {
    let description = lookup_table(conn, table)?;

    if record.is_empty() {
        return Err(StoreError::EmptyRecord(table.to_string()));
    }
    let columns: Vec<&str> = record.columns().collect();
    check_columns(&description, &columns)?;

    let sql = build_insert(table, &columns);
    let mut stmt = conn.prepare_cached(&sql)?;
    for (idx, value) in record.values().enumerate() {
        value.bind_to(idx + 1, &mut stmt)?;
    }
    stmt.raw_execute()?;

    let row_id = conn.last_insert_rowid();
    debug!(table, row_id, "inserted row");
    Ok(row_id)
}

/// Define `table_name` with `ddl`, then append every row of the CSV at
/// `source`. All rows land in one transaction: any failure leaves the
/// table without rows from this source.
pub fn load_tabular(config: &Config, source: &Path, table_name: &str, ddl: &str) -> Result<u64> {
    let tabular = Tabular::from_path(source)?;
    let mut conn = store::open(config)?;

    define_table(&conn, ddl)?;
    let count = append_rows(&mut conn, table_name, &tabular)?;

    info!(table = table_name, rows = count, source = ?source, "bulk load complete");
    Ok(count)
}

/// [`load_tabular`] for one of the known tables
pub fn load_table(config: &Config, source: &Path, schema: &TableSchema) -> Result<u64> {
    load_tabular(config, source, schema.name, &generate_create_table(schema))
}

/// Append parsed rows to an existing table inside a single transaction
pub fn append_rows(conn: &mut Connection, table: &str, tabular: &Tabular) -> Result<u64> {
    let description = lookup_table(conn, table)?;

    let columns: Vec<&str> = tabular.headers.iter().map(String::as_str).collect();
    check_columns(&description, &columns)?;

    let missing: Vec<String> = description
        .columns
        .iter()
        .filter(|c| c.not_null && !c.has_default && !c.primary_key)
        .filter(|c| !columns.contains(&c.name.as_str()))
        .map(|c| c.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::MissingColumns {
            table: table.to_string(),
            columns: missing,
        });
    }

    let sql = build_insert(table, &columns);
    let tx = conn.transaction()?;
    insert_batch(&tx, &sql, &tabular.rows)?;
    tx.commit()?;

    Ok(tabular.len() as u64)
}

/// Insert a batch of rows through one prepared statement
fn insert_batch(tx: &rusqlite::Transaction, sql: &str, rows: &[Vec<SqlValue>]) -> Result<()> {
    let mut stmt = tx.prepare_cached(sql)?;

    for row in rows {
        for (idx, value) in row.iter().enumerate() {
            value.bind_to(idx + 1, &mut stmt)?;
        }
        stmt.raw_execute()?;
    }

    Ok(())
}

fn lookup_table(conn: &Connection, table: &str) -> Result<TableDescription> {
    describe_table(conn, table)?.ok_or_else(|| StoreError::UnknownTable(table.to_string()))
}

fn check_columns(description: &TableDescription, columns: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();

    for column in columns {
        if description.column(column).is_none() {
            return Err(StoreError::UnknownColumn {
                table: description.name.clone(),
                column: column.to_string(),
            });
        }
        if !seen.insert(*column) {
            return Err(StoreError::DuplicateColumn {
                table: description.name.clone(),
                column: column.to_string(),
            });
        }
    }

    Ok(())
}

fn build_insert(table: &str, columns: &[&str]) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        quoted.join(", "),
        placeholders.join(", ")
    )
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{JOBLIST, MAKERMODELS};

    fn joblist_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        define_schema(&conn, &JOBLIST).unwrap();
        conn
    }

    fn job(id: i64) -> Record {
        Record::new()
            .with("job_id", id)
            .with("due_date", "13/2/30")
            .with("job_title", "Purifier Service")
            .with("vessel_name", "Hafnia Andrea")
            .with("component", "HFO purifier 1")
            .with("maker", "[MKR]ALFA LAVAL")
            .with("model", "S 937")
    }

    fn row_count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_define_table_twice_is_noop() {
        let conn = joblist_db();
        insert_row(&conn, "joblist", &job(1)).unwrap();

        define_schema(&conn, &JOBLIST).unwrap();
        assert_eq!(row_count(&conn, "joblist"), 1);
    }

    #[test]
    fn test_best_effort_swallows_bad_ddl() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!define_table_best_effort(&conn, "CREATE TABLE ("));
        assert!(define_table_best_effort(
            &conn,
            "CREATE TABLE IF NOT EXISTS t (x TEXT)"
        ));
    }

    #[test]
    fn test_insert_returns_rowid() {
        let conn = joblist_db();
        assert_eq!(insert_row(&conn, "joblist", &job(13)).unwrap(), 13);

        let without_id = Record::new()
            .with("due_date", "5/5/28")
            .with("job_title", "Overhaul")
            .with("vessel_name", "Hafnia Andrea")
            .with("component", "HFO purifier 1")
            .with("maker", "[MKR]ALFA LAVAL")
            .with("model", "S 937");
        assert_eq!(insert_row(&conn, "joblist", &without_id).unwrap(), 14);
    }

    #[test]
    fn test_insert_rejects_unknown_column() {
        let conn = joblist_db();
        let record = job(1).with("job_id) VALUES (1); DROP TABLE joblist; --", 1_i64);

        let err = insert_row(&conn, "joblist", &record).unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));
        assert_eq!(row_count(&conn, "joblist"), 0);
    }

    #[test]
    fn test_insert_rejects_unknown_table_and_duplicates() {
        let conn = joblist_db();
        assert!(matches!(
            insert_row(&conn, "jobs", &job(1)),
            Err(StoreError::UnknownTable(_))
        ));
        assert!(matches!(
            insert_row(&conn, "joblist", &job(1).with("model", "S 815")),
            Err(StoreError::DuplicateColumn { .. })
        ));
        assert!(matches!(
            insert_row(&conn, "joblist", &Record::new()),
            Err(StoreError::EmptyRecord(_))
        ));
    }

    #[test]
    fn test_insert_propagates_constraint_error() {
        let conn = joblist_db();
        insert_row(&conn, "joblist", &job(1)).unwrap();
        assert!(matches!(
            insert_row(&conn, "joblist", &job(1)),
            Err(StoreError::Sqlite(_))
        ));
    }

    #[test]
    fn test_append_rows_missing_required_column() {
        let mut conn = Connection::open_in_memory().unwrap();
        define_schema(&conn, &MAKERMODELS).unwrap();

        let data = "func_no,func_desc,vessel_code,vessel_name,model\n601,HFO purifier 1,HAN,Hafnia Andrea,S 937\n";
        let tabular = Tabular::from_reader(data.as_bytes()).unwrap();

        let err = append_rows(&mut conn, "makermodels", &tabular).unwrap_err();
        match err {
            StoreError::MissingColumns { columns, .. } => assert_eq!(columns, ["maker"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(row_count(&conn, "makermodels"), 0);
    }

    #[test]
    fn test_append_rows_rolls_back_on_failure() {
        let mut conn = Connection::open_in_memory().unwrap();
        define_schema(&conn, &MAKERMODELS).unwrap();

        // Second row violates NOT NULL on maker
        let data = "func_no,func_desc,vessel_code,vessel_name,maker,model\n\
                    601,HFO purifier 1,HAN,Hafnia Andrea,[MKR]ALFA LAVAL,S 937\n\
                    602,HFO purifier 2,HAN,Hafnia Andrea,,S 937\n";
        let tabular = Tabular::from_reader(data.as_bytes()).unwrap();

        assert!(append_rows(&mut conn, "makermodels", &tabular).is_err());
        assert_eq!(row_count(&conn, "makermodels"), 0);
    }

    #[test]
    fn test_build_insert_quotes_identifiers() {
        assert_eq!(
            build_insert("joblist", &["job_id", "model"]),
            r#"INSERT INTO "joblist" ("job_id", "model") VALUES (?, ?)"#
        );
    }
}
