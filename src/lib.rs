// Behavior Report - Core Library
// Cleans users/cards/transactions CSVs, stores them in SQLite, runs the
// aggregate reports and derives chart series.

pub mod error;
pub mod table;
pub mod loader;
pub mod cleaner;
pub mod buckets;
pub mod db;         // Store Adapter
pub mod queries;    // Aggregate Engine
pub mod charts;     // Chart-Data Builder
pub mod render;
pub mod report;     // Report Writer
pub mod discovery;
pub mod preview;
pub mod manifest;
pub mod settings;
pub mod pipeline;

// Re-export commonly used types
pub use error::{PipelineError, PipelineResult};
pub use table::{Column, ColumnType, Table, TableRole, Value};
pub use loader::{load_table, read_table};
pub use cleaner::{clean_table, parse_amount, parse_timestamp, CoercionError};
pub use buckets::AgeBucket;
pub use db::{open_store, replace_table, store_tables, table_exists, table_row_count};
pub use queries::{run_queries, AggregateEngine, Report, TOP_MCC_LIMIT};
pub use charts::{
    build_chart_data, CardBrandLookup, ChartData, ChartKind, ChartSeries, Lookup, SeriesPoint,
};
pub use render::{render_charts, ChartRenderer, JsonChartRenderer};
pub use report::save_query_results;
pub use discovery::{find_data_file, SearchPaths};
pub use manifest::{file_sha256, RunManifest};
pub use settings::Settings;
pub use pipeline::{run, Dataset, PipelineConfig, RunOutcome, RunSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
