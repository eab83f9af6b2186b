// 📊 Aggregate Engine - fixed read-only reports over the stored tables
//
// Every report declares the tables it reads; a missing table fails with
// StoreNotReady before any SQL runs, so no partial result is returned.

use crate::buckets::AgeBucket;
use crate::db::table_exists;
use crate::error::{PipelineError, PipelineResult};
use crate::table::{Column, ColumnType, Table, Value};
use log::{debug, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Maximum number of rows in the `top_mcc` report.
pub const TOP_MCC_LIMIT: usize = 5;

// ============================================================================
// REPORT CATALOGUE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Report {
    GenderDistribution,
    AgeDistribution,
    CardBrandDistribution,
    CardTypeDistribution,
    TopMcc,
    TransactionMethods,
    AvgTxnAmountByBrand,
}

impl Report {
    pub const ALL: [Report; 7] = [
        Report::GenderDistribution,
        Report::AgeDistribution,
        Report::CardBrandDistribution,
        Report::CardTypeDistribution,
        Report::TopMcc,
        Report::TransactionMethods,
        Report::AvgTxnAmountByBrand,
    ];

    /// Result name, also the output file stem
    pub fn name(&self) -> &'static str {
        match self {
            Report::GenderDistribution => "gender_distribution",
            Report::AgeDistribution => "age_distribution",
            Report::CardBrandDistribution => "card_brand_distribution",
            Report::CardTypeDistribution => "card_type_distribution",
            Report::TopMcc => "top_mcc",
            Report::TransactionMethods => "transaction_methods",
            Report::AvgTxnAmountByBrand => "avg_txn_amount_by_brand",
        }
    }

    pub fn from_name(name: &str) -> Option<Report> {
        Report::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Stored tables the query reads
    pub fn required_tables(&self) -> &'static [&'static str] {
        match self {
            Report::GenderDistribution | Report::AgeDistribution => &["users"],
            Report::CardBrandDistribution | Report::CardTypeDistribution => &["cards"],
            Report::TopMcc | Report::TransactionMethods => &["transactions"],
            Report::AvgTxnAmountByBrand => &["transactions", "cards"],
        }
    }

    pub fn sql(&self) -> String {
        match self {
            // Missing keys are not a group, the same as `charts::value_counts`
            Report::GenderDistribution => "SELECT gender, COUNT(*) AS num_users
                 FROM users
                 WHERE gender IS NOT NULL
                 GROUP BY gender
                 ORDER BY gender"
                .to_string(),
            // Label order is byte order: `30-39` … `70+`, then `<30`
            Report::AgeDistribution => format!(
                "SELECT {} AS age_bucket, COUNT(*) AS num_users
                 FROM users
                 GROUP BY age_bucket
                 ORDER BY age_bucket",
                AgeBucket::sql_label_case("current_age"),
            ),
            Report::CardBrandDistribution => "SELECT card_brand, COUNT(*) AS num_cards
                 FROM cards
                 WHERE card_brand IS NOT NULL
                 GROUP BY card_brand
                 ORDER BY num_cards DESC, card_brand ASC"
                .to_string(),
            Report::CardTypeDistribution => "SELECT card_type, COUNT(*) AS num_cards
                 FROM cards
                 WHERE card_type IS NOT NULL
                 GROUP BY card_type
                 ORDER BY num_cards DESC, card_type ASC"
                .to_string(),
            // Equal counts are ordered lexically by the MCC's text form
            Report::TopMcc => format!(
                "SELECT mcc, COUNT(*) AS txn_count
                 FROM transactions
                 WHERE mcc IS NOT NULL
                 GROUP BY mcc
                 ORDER BY txn_count DESC, CAST(mcc AS TEXT) ASC
                 LIMIT {}",
                TOP_MCC_LIMIT
            ),
            Report::TransactionMethods => "SELECT use_chip, COUNT(*) AS txn_count
                 FROM transactions
                 WHERE use_chip IS NOT NULL
                 GROUP BY use_chip
                 ORDER BY use_chip"
                .to_string(),
            // Inner join: transactions without a matching card drop out
            Report::AvgTxnAmountByBrand => "SELECT c.card_brand AS card_brand, AVG(t.amount) AS avg_amount
                 FROM transactions t
                 JOIN cards c ON t.card_id = c.id
                 WHERE c.card_brand IS NOT NULL
                 GROUP BY c.card_brand
                 HAVING COUNT(t.amount) > 0
                 ORDER BY avg_amount DESC, c.card_brand ASC"
                .to_string(),
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct AggregateEngine {
    conn: Connection,
}

impl AggregateEngine {
    /// Open a query session on an existing store file. Never creates one:
    /// a store file that does not exist yet has no tables, which is
    /// reported as StoreNotReady rather than an I/O failure.
    pub fn open(db_path: &Path) -> PipelineResult<Self> {
        if !db_path.exists() {
            return Err(PipelineError::StoreNotReady {
                table: Report::ALL[0].required_tables()[0].to_string(),
            });
        }
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection (used in tests).
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn ensure_ready(&self, report: Report) -> PipelineResult<()> {
        for table in report.required_tables() {
            if !table_exists(&self.conn, table)? {
                return Err(PipelineError::StoreNotReady {
                    table: table.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Run one report and return its result table.
    pub fn run(&self, report: Report) -> PipelineResult<Table> {
        self.ensure_ready(report)?;

        let mut stmt = self.conn.prepare(&report.sql())?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = names.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(Value::from))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let columns = names
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(name, result_column_type(&rows, i)))
            .collect();

        let mut table = Table::new(report.name(), columns);
        table.rows = rows;

        debug!("{}: {} rows", report.name(), table.row_count());
        Ok(table)
    }

    /// Run every report in catalogue order. Stops at the first failure.
    pub fn run_all(&self) -> PipelineResult<Vec<Table>> {
        let results = Report::ALL
            .iter()
            .map(|report| self.run(*report))
            .collect::<PipelineResult<Vec<_>>>()?;

        info!("ran {} aggregate reports", results.len());
        Ok(results)
    }

    pub fn gender_distribution(&self) -> PipelineResult<Table> {
        self.run(Report::GenderDistribution)
    }

    pub fn age_distribution(&self) -> PipelineResult<Table> {
        self.run(Report::AgeDistribution)
    }

    pub fn card_brand_distribution(&self) -> PipelineResult<Table> {
        self.run(Report::CardBrandDistribution)
    }

    pub fn card_type_distribution(&self) -> PipelineResult<Table> {
        self.run(Report::CardTypeDistribution)
    }

    pub fn top_mcc(&self) -> PipelineResult<Table> {
        self.run(Report::TopMcc)
    }

    pub fn transaction_methods(&self) -> PipelineResult<Table> {
        self.run(Report::TransactionMethods)
    }

    pub fn avg_txn_amount_by_brand(&self) -> PipelineResult<Table> {
        self.run(Report::AvgTxnAmountByBrand)
    }
}

/// Type of a result column, taken from its first non-null cell.
fn result_column_type(rows: &[Vec<Value>], idx: usize) -> ColumnType {
    rows.iter()
        .map(|row| &row[idx])
        .find(|v| !v.is_null())
        .map(|v| match v {
            Value::Integer(_) => ColumnType::Integer,
            Value::Real(_) => ColumnType::Real,
            Value::Timestamp(_) => ColumnType::Timestamp,
            Value::Text(_) | Value::Null => ColumnType::Text,
        })
        .unwrap_or(ColumnType::Text)
}

/// Open the store, run all reports, close the store.
pub fn run_queries(db_path: &Path) -> PipelineResult<Vec<Table>> {
    let engine = AggregateEngine::open(db_path)?;
    engine.run_all()
}
