// 📋 Tabular model - typed cells, columns and the three source tables
// Raw and canonical tables share one shape; only the cell types differ.

use crate::error::{PipelineError, PipelineResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage and display format for timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// CELL VALUES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell. Text is never coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Label used when a cell is counted or shown on a chart axis.
    /// Missing values have no label.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Key used for cross-table lookups (`card_id` → cards.`id`).
    ///
    /// Integral reals collapse onto their integer form so `5` and `5.0`
    /// meet, the way SQLite compares numeric columns. Null never matches.
    pub fn join_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) if r.fract() == 0.0 && r.abs() < i64::MAX as f64 => {
                Some((*r as i64).to_string())
            }
            other => Some(other.to_string()),
        }
    }

    /// Parse a raw text cell as the given column type. Empty cells are Null.
    pub fn parse_as(raw: &str, column_type: ColumnType) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match column_type {
            ColumnType::Integer => trimmed
                .parse::<i64>()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(raw.to_string())),
            ColumnType::Real => trimmed
                .parse::<f64>()
                .map(Value::Real)
                .unwrap_or_else(|_| Value::Text(raw.to_string())),
            ColumnType::Text | ColumnType::Timestamp => Value::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

// ============================================================================
// COLUMNS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Timestamp,
}

impl ColumnType {
    /// Declared SQLite type for the column
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    /// Dtype name shown in the preview
    pub fn dtype(&self) -> &'static str {
        match self {
            ColumnType::Integer => "int64",
            ColumnType::Real => "float64",
            ColumnType::Text => "object",
            ColumnType::Timestamp => "datetime64",
        }
    }

    /// Infer a source type from raw cells: Integer if every non-empty cell
    /// is an i64, otherwise Real if every one is an f64, otherwise Text.
    pub fn infer<'a, I>(cells: I) -> ColumnType
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = false;
        let mut all_int = true;
        let mut all_real = true;

        for cell in cells.into_iter().map(str::trim).filter(|c| !c.is_empty()) {
            seen = true;
            if all_int && cell.parse::<i64>().is_err() {
                all_int = false;
            }
            if cell.parse::<f64>().is_err() {
                all_real = false;
                break;
            }
        }

        match (seen, all_int, all_real) {
            (false, _, _) => ColumnType::Text,
            (true, true, _) => ColumnType::Integer,
            (true, false, true) => ColumnType::Real,
            _ => ColumnType::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Column {
            name: name.to_string(),
            column_type,
        }
    }
}

// ============================================================================
// TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: &str, columns: Vec<Column>) -> Self {
        Table {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a typed table from raw text, inferring each column's type.
    pub fn from_text(name: &str, headers: &[String], records: &[Vec<String>]) -> PipelineResult<Self> {
        let mut columns = Vec::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            let column_type =
                ColumnType::infer(records.iter().filter_map(|r| r.get(idx).map(String::as_str)));
            columns.push(Column::new(header, column_type));
        }

        let mut table = Table::new(name, columns);
        for record in records {
            let row = table
                .columns
                .iter()
                .enumerate()
                .map(|(idx, col)| {
                    record
                        .get(idx)
                        .map(|raw| Value::parse_as(raw, col.column_type))
                        .unwrap_or(Value::Null)
                })
                .collect();
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> PipelineResult<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::InvalidTable {
                table: self.name.clone(),
                reason: format!(
                    "row {} has {} cells, expected {}",
                    self.rows.len() + 1,
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of a column, or None when the source did not provide it.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All cells of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }
}

// ============================================================================
// TABLE ROLES
// ============================================================================

/// The three source tables and the canonical columns each is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableRole {
    Users,
    Cards,
    Transactions,
}

impl TableRole {
    pub const ALL: [TableRole; 3] = [TableRole::Users, TableRole::Cards, TableRole::Transactions];

    /// Store table name
    pub fn name(&self) -> &'static str {
        match self {
            TableRole::Users => "users",
            TableRole::Cards => "cards",
            TableRole::Transactions => "transactions",
        }
    }

    /// Input file looked up by discovery
    pub fn file_name(&self) -> &'static str {
        match self {
            TableRole::Users => "users_data.csv",
            TableRole::Cards => "cards_data.csv",
            TableRole::Transactions => "transactions_data.csv",
        }
    }

    /// Label used in preview output
    pub fn label(&self) -> &'static str {
        match self {
            TableRole::Users => "USERS",
            TableRole::Cards => "CARDS",
            TableRole::Transactions => "TRANSACTIONS",
        }
    }

    /// Declared canonical schema. Every column here is optional in the
    /// source; derivations check presence before reading.
    pub fn canonical_columns(&self) -> &'static [&'static str] {
        match self {
            TableRole::Users => &["id", "current_age", "gender"],
            TableRole::Cards => &["id", "client_id", "card_brand", "card_type"],
            TableRole::Transactions => &["id", "date", "client_id", "card_id", "amount", "use_chip", "mcc"],
        }
    }

    /// Canonical columns present in `table`, in declared order.
    pub fn present_columns(&self, table: &Table) -> Vec<&'static str> {
        self.canonical_columns()
            .iter()
            .copied()
            .filter(|c| table.has_column(c))
            .collect()
    }
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
