// 🗄️ Store Adapter - canonical tables → SQLite
// Full replace per run: drop, create, bulk insert. One connection per call.

use crate::error::{PipelineError, PipelineResult};
use crate::table::{Table, Value, TIMESTAMP_FORMAT};
use log::{debug, info};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use std::path::Path;

// ============================================================================
// VALUE MAPPING
// ============================================================================

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Timestamp(ts) => ToSqlOutput::Owned(rusqlite::types::Value::Text(
                ts.format(TIMESTAMP_FORMAT).to_string(),
            )),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Value::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

/// Quote an identifier taken from a CSV header.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// ============================================================================
// CONNECTION
// ============================================================================

/// Open (or create) the store file.
pub fn open_store(db_path: &Path) -> PipelineResult<Connection> {
    let conn = Connection::open(db_path)?;
    // WAL mode for crash recovery
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    Ok(conn)
}

pub fn table_exists(conn: &Connection, name: &str) -> PipelineResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn table_row_count(conn: &Connection, name: &str) -> PipelineResult<i64> {
    if !table_exists(conn, name)? {
        return Err(PipelineError::StoreNotReady {
            table: name.to_string(),
        });
    }
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_identifier(name)),
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============================================================================
// WRITES
// ============================================================================

/// Drop, recreate and fill one table. Returns the number of rows inserted.
pub fn replace_table(conn: &Connection, table: &Table) -> PipelineResult<usize> {
    if table.columns.is_empty() {
        return Err(PipelineError::InvalidTable {
            table: table.name.clone(),
            reason: "no columns to store".to_string(),
        });
    }

    let name = quote_identifier(&table.name);
    let column_defs = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), c.column_type.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    let column_list = table
        .columns
        .iter()
        .map(|c| quote_identifier(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    conn.execute(&format!("DROP TABLE IF EXISTS {}", name), [])?;
    conn.execute(&format!("CREATE TABLE {} ({})", name, column_defs), [])?;

    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} ({}) VALUES ({})",
        name, column_list, placeholders
    ))?;

    let mut inserted = 0;
    for row in &table.rows {
        stmt.execute(params_from_iter(row.iter()))?;
        inserted += 1;
    }

    debug!("replaced table {}: {} rows", table.name, inserted);
    Ok(inserted)
}

/// Persist the canonical tables at `db_path`.
///
/// All replacements share one SQLite transaction: either every table is
/// swapped or the previous snapshot stays in place. The connection is
/// dropped before returning, on success and on failure.
pub fn store_tables(db_path: &Path, tables: &[&Table]) -> PipelineResult<()> {
    let mut conn = open_store(db_path)?;
    let tx = conn.transaction()?;

    for table in tables {
        replace_table(&tx, table)?;
    }

    tx.commit()?;
    info!(
        "stored {} tables in {}",
        tables.len(),
        db_path.display()
    );
    Ok(())
}
