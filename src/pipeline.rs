// 🚚 Pipeline - discover → load → clean → preview → store → report → charts
// Sequential and synchronous; each stage is named in the error it returns.

use crate::charts::build_chart_data;
use crate::cleaner::clean_table;
use crate::db::store_tables;
use crate::discovery::{find_data_file, SearchPaths};
use crate::loader::load_table;
use crate::manifest::{file_sha256, InputRecord, RunManifest};
use crate::preview::preview_table;
use crate::queries::run_queries;
use crate::render::{render_charts, ChartRenderer};
use crate::report::save_query_results;
use crate::table::{Table, TableRole};
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub search: SearchPaths,
    pub db_path: PathBuf,
    pub results_dir: PathBuf,
    pub charts_dir: PathBuf,
    pub preview_path: PathBuf,
    pub preview_only: bool,
}

/// The three canonical tables plus where they came from.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub users: Table,
    pub cards: Table,
    pub transactions: Table,
    pub inputs: Vec<InputRecord>,
}

impl Dataset {
    pub fn table(&self, role: TableRole) -> &Table {
        match role {
            TableRole::Users => &self.users,
            TableRole::Cards => &self.cards,
            TableRole::Transactions => &self.transactions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub db_path: PathBuf,
    pub results: Vec<PathBuf>,
    pub charts: Vec<PathBuf>,
    pub manifest: PathBuf,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Preview-only mode stopped before storage
    Previewed { preview_path: PathBuf },
    Completed(RunSummary),
}

/// Locate, load and clean one input.
fn load_input(role: TableRole, search: &SearchPaths) -> Result<(Table, InputRecord)> {
    let path = find_data_file(&[role.file_name()], search)
        .with_context(|| format!("discovering {} input", role))?;
    let raw = load_table(&path, role).with_context(|| format!("loading {}", path.display()))?;
    let table = clean_table(&raw, role).with_context(|| format!("cleaning {}", role))?;
    let sha256 = file_sha256(&path).with_context(|| format!("fingerprinting {}", path.display()))?;

    info!(
        "{}: {} rows × {} cols from {}",
        role,
        table.row_count(),
        table.column_count(),
        path.display()
    );
    let record = InputRecord::new(role, &path, &sha256, &table);
    Ok((table, record))
}

/// Load all three inputs. Any missing file aborts before processing.
pub fn load_dataset(search: &SearchPaths) -> Result<Dataset> {
    let (users, users_input) = load_input(TableRole::Users, search)?;
    let (cards, cards_input) = load_input(TableRole::Cards, search)?;
    let (transactions, transactions_input) = load_input(TableRole::Transactions, search)?;

    Ok(Dataset {
        users,
        cards,
        transactions,
        inputs: vec![users_input, cards_input, transactions_input],
    })
}

/// Print the preview blocks and write them to `config.preview_path`.
fn write_preview(dataset: &Dataset, config: &PipelineConfig) -> Result<()> {
    let blocks: Vec<String> = dataset
        .inputs
        .iter()
        .map(|input| {
            let text = preview_table(input.role, dataset.table(input.role), &input.path, &input.sha256);
            println!("{}\n{}", text, "-".repeat(80));
            text
        })
        .collect();

    fs::write(&config.preview_path, blocks.join("\n\n"))
        .with_context(|| format!("writing preview to {}", config.preview_path.display()))?;
    Ok(())
}

/// Run the whole pipeline.
pub fn run(config: &PipelineConfig, renderer: &dyn ChartRenderer) -> Result<RunOutcome> {
    let dataset = load_dataset(&config.search)?;
    write_preview(&dataset, config)?;

    if config.preview_only {
        info!("preview only: skipping storage, reports and charts");
        return Ok(RunOutcome::Previewed {
            preview_path: config.preview_path.clone(),
        });
    }

    let mut manifest = RunManifest::start(&config.db_path);
    manifest.inputs = dataset.inputs.clone();

    store_tables(
        &config.db_path,
        &[&dataset.users, &dataset.cards, &dataset.transactions],
    )
    .with_context(|| format!("storing tables in {}", config.db_path.display()))?;

    let results = run_queries(&config.db_path).context("running aggregate queries")?;
    let written = save_query_results(&results, &config.results_dir)
        .with_context(|| format!("writing results to {}", config.results_dir.display()))?;
    manifest.record_results(&results);

    let chart_data = build_chart_data(&dataset.users, &dataset.cards, &dataset.transactions);
    let charts = render_charts(renderer, &chart_data, &config.charts_dir)
        .with_context(|| format!("rendering charts to {}", config.charts_dir.display()))?;
    manifest.charts = charts.clone();

    manifest.finish();
    let manifest_path = manifest
        .write(&config.results_dir)
        .context("writing run manifest")?;

    info!(
        "run {} complete: {} reports, {} charts",
        manifest.run_id,
        written.len(),
        charts.len()
    );

    Ok(RunOutcome::Completed(RunSummary {
        db_path: config.db_path.clone(),
        results: written,
        charts,
        manifest: manifest_path,
    }))
}
