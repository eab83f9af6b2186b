// 🧹 Cleaner - raw table → canonical table
// `date` becomes a timestamp, `amount` becomes a float, nothing else changes.

use crate::error::{PipelineError, PipelineResult};
use crate::table::{ColumnType, Table, TableRole, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;

pub const DATE_COLUMN: &str = "date";
pub const AMOUNT_COLUMN: &str = "amount";

/// Symbols removed from amounts before the numeric parse.
const CURRENCY_SYMBOLS: [char; 2] = ['$', ','];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

// ============================================================================
// COERCION
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// Something other than a number was left after stripping symbols
    NotNumeric { residue: String },
    /// No supported date layout matched
    NotATimestamp,
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoercionError::NotNumeric { residue } => {
                write!(f, "is not a number after stripping currency symbols ({:?})", residue)
            }
            CoercionError::NotATimestamp => write!(f, "is not a recognised date/time"),
        }
    }
}

/// Stage one of amount parsing: drop `$` and digit-group separators.
pub fn strip_currency(raw: &str) -> String {
    raw.chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse a currency-formatted amount such as `"$1,234.56"` or `"$-77.00"`.
pub fn parse_amount(raw: &str) -> Result<f64, CoercionError> {
    let residue = strip_currency(raw);
    residue
        .parse::<f64>()
        .map_err(|_| CoercionError::NotNumeric { residue })
}

/// Parse a timestamp. Date-only values land on midnight; offsets are
/// normalised to UTC.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, CoercionError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
    }

    Err(CoercionError::NotATimestamp)
}

fn clean_amount(cell: &Value) -> Result<Value, CoercionError> {
    match cell {
        Value::Null => Ok(Value::Null),
        Value::Integer(i) => Ok(Value::Real(*i as f64)),
        Value::Real(r) => Ok(Value::Real(*r)),
        other => parse_amount(&other.to_string()).map(Value::Real),
    }
}

fn clean_date(cell: &Value) -> Result<Value, CoercionError> {
    match cell {
        Value::Null => Ok(Value::Null),
        Value::Timestamp(ts) => Ok(Value::Timestamp(*ts)),
        other => parse_timestamp(&other.to_string()).map(Value::Timestamp),
    }
}

// ============================================================================
// TABLE CLEANING
// ============================================================================

/// Produce the canonical form of a raw table. Row count and column set are
/// preserved; the first cell that fails coercion aborts with a ParseError.
pub fn clean_table(raw: &Table, role: TableRole) -> PipelineResult<Table> {
    let mut table = raw.clone();
    table.name = role.name().to_string();

    let targets: [(&str, ColumnType, fn(&Value) -> Result<Value, CoercionError>); 2] = [
        (DATE_COLUMN, ColumnType::Timestamp, clean_date),
        (AMOUNT_COLUMN, ColumnType::Real, clean_amount),
    ];

    for (column, column_type, coerce) in targets {
        let Some(idx) = table.column_index(column) else {
            continue;
        };

        for (row_idx, row) in table.rows.iter_mut().enumerate() {
            row[idx] = coerce(&row[idx]).map_err(|reason| PipelineError::Parse {
                table: role.name().to_string(),
                column: column.to_string(),
                row: row_idx + 1,
                value: row[idx].to_string(),
                reason: reason.to_string(),
            })?;
        }
        table.columns[idx].column_type = column_type;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn raw_transactions(amounts: &[&str]) -> Table {
        let mut table = Table::new(
            "transactions",
            vec![
                Column::new("id", ColumnType::Integer),
                Column::new("date", ColumnType::Text),
                Column::new("amount", ColumnType::Text),
                Column::new("use_chip", ColumnType::Text),
            ],
        );
        for (i, amount) in amounts.iter().enumerate() {
            table
                .push_row(vec![
                    Value::Integer(i as i64 + 1),
                    Value::Text("2010-01-01 00:01:00".to_string()),
                    Value::Text(amount.to_string()),
                    Value::Text("Chip Transaction".to_string()),
                ])
                .unwrap();
        }
        table
    }

    #[test]
    fn test_parse_amount_strips_symbols() {
        assert_eq!(parse_amount("$1,234.56"), Ok(1234.56));
        assert_eq!(parse_amount("$-77.00"), Ok(-77.0));
        assert_eq!(parse_amount("-$5"), Ok(-5.0));
        assert_eq!(parse_amount(" 12 "), Ok(12.0));
    }

    #[test]
    fn test_parse_amount_rejects_residue() {
        assert_eq!(
            parse_amount("$12.3.4"),
            Err(CoercionError::NotNumeric {
                residue: "12.3.4".to_string()
            })
        );
        assert!(parse_amount("USD 10").is_err());
        assert!(parse_amount("$").is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2010, 1, 1)
            .unwrap()
            .and_hms_opt(0, 1, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2010-01-01 00:01:00"), Ok(expected));
        assert_eq!(parse_timestamp("2010-01-01T00:01:00"), Ok(expected));
        assert_eq!(parse_timestamp("01/01/2010 00:01"), Ok(expected));
        assert_eq!(parse_timestamp("2010-01-01T01:01:00+01:00"), Ok(expected));

        let midnight = NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("12/31/2024"), Ok(midnight));
        assert_eq!(parse_timestamp("not a date"), Err(CoercionError::NotATimestamp));
    }

    #[test]
    fn test_clean_table_coerces_date_and_amount() {
        let raw = raw_transactions(&["$1,234.56", "$-77.00"]);
        let clean = clean_table(&raw, TableRole::Transactions).unwrap();

        assert_eq!(clean.row_count(), 2);
        assert_eq!(clean.column_names(), raw.column_names());
        assert_eq!(clean.columns[1].column_type, ColumnType::Timestamp);
        assert_eq!(clean.columns[2].column_type, ColumnType::Real);
        assert_eq!(clean.rows[0][2], Value::Real(1234.56));
        assert_eq!(clean.rows[1][2], Value::Real(-77.0));
        assert!(matches!(clean.rows[0][1], Value::Timestamp(_)));
        // Untouched columns pass through
        assert_eq!(clean.rows[0][3], raw.rows[0][3]);
        assert_eq!(clean.rows[1][0], Value::Integer(2));
    }

    #[test]
    fn test_clean_table_reports_failing_cell() {
        let raw = raw_transactions(&["$10.00", "$1O.00"]);
        let err = clean_table(&raw, TableRole::Transactions).unwrap_err();

        match err {
            PipelineError::Parse { table, column, row, value, .. } => {
                assert_eq!(table, "transactions");
                assert_eq!(column, "amount");
                assert_eq!(row, 2);
                assert_eq!(value, "$1O.00");
            }
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_table_bad_date() {
        let mut raw = raw_transactions(&["$1.00"]);
        raw.rows[0][1] = Value::Text("2010-13-45".to_string());
        let err = clean_table(&raw, TableRole::Transactions).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { ref column, .. } if column == "date"));
    }

    #[test]
    fn test_missing_cells_stay_missing() {
        let mut raw = raw_transactions(&["$1.00"]);
        raw.rows[0][1] = Value::Null;
        raw.rows[0][2] = Value::Null;
        let clean = clean_table(&raw, TableRole::Transactions).unwrap();
        assert_eq!(clean.rows[0][1], Value::Null);
        assert_eq!(clean.rows[0][2], Value::Null);
    }

    #[test]
    fn test_numeric_amount_column_becomes_real() {
        let mut table = Table::new("transactions", vec![Column::new("amount", ColumnType::Integer)]);
        table.push_row(vec![Value::Integer(42)]).unwrap();
        let clean = clean_table(&table, TableRole::Transactions).unwrap();
        assert_eq!(clean.rows[0][0], Value::Real(42.0));
    }

    #[test]
    fn test_tables_without_targets_are_unchanged() {
        let mut users = Table::new(
            "users",
            vec![
                Column::new("id", ColumnType::Integer),
                Column::new("gender", ColumnType::Text),
            ],
        );
        users
            .push_row(vec![Value::Integer(1), Value::Text("Female".to_string())])
            .unwrap();
        let clean = clean_table(&users, TableRole::Users).unwrap();
        assert_eq!(clean, users);
    }
}
