// ⚙️ Settings - command line and environment configuration

use crate::discovery::SearchPaths;
use crate::pipeline::PipelineConfig;
use clap::builder::FalseyValueParser;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_DB_FILE: &str = "user_behavior.db";
pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_CHARTS_DIR: &str = "charts";
pub const PREVIEW_FILE: &str = "data_preview.txt";

/// Batch reports over users, cards and transactions
#[derive(Parser, Debug, Clone)]
#[command(
    name = "behavior-report",
    about = "Clean, store and report on users, cards and transactions",
    version
)]
pub struct Settings {
    /// Directory searched first for the input CSV files
    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Project directory: default home of the store, results and charts
    #[arg(long, env = "REPORT_BASE_DIR", default_value = ".")]
    pub base_dir: PathBuf,

    /// SQLite store file [default: <base-dir>/user_behavior.db]
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Output directory for report CSVs [default: <base-dir>/results]
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Output directory for charts [default: <base-dir>/charts]
    #[arg(long)]
    pub charts_dir: Option<PathBuf>,

    /// Stop after printing the table previews (env accepts 1/0, true/false)
    #[arg(long, env = "PREVIEW_ONLY", value_parser = FalseyValueParser::new())]
    pub preview_only: bool,

    /// Log filter, e.g. "info" or "behavior_report=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Settings {
    /// Resolve defaults against the base directory and the current directory.
    pub fn into_config(self, cwd: PathBuf) -> PipelineConfig {
        let base = self.base_dir;
        PipelineConfig {
            db_path: self.db.unwrap_or_else(|| base.join(DEFAULT_DB_FILE)),
            results_dir: self
                .results_dir
                .unwrap_or_else(|| base.join(DEFAULT_RESULTS_DIR)),
            charts_dir: self.charts_dir.unwrap_or_else(|| base.join(DEFAULT_CHARTS_DIR)),
            preview_path: base.join(PREVIEW_FILE),
            preview_only: self.preview_only,
            search: SearchPaths {
                data_dir: self.data_dir,
                base_dir: base,
                cwd,
            },
        }
    }
}
