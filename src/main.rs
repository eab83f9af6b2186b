use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use std::env;

use behavior_report::{run, JsonChartRenderer, RunOutcome, Settings};

fn main() -> Result<()> {
    let settings = Settings::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log_level.as_str()))
        .init();

    let cwd = env::current_dir().context("resolving current directory")?;
    let config = settings.into_config(cwd);

    println!("📊 Behavior Report v{}", behavior_report::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match run(&config, &JsonChartRenderer)? {
        RunOutcome::Previewed { preview_path } => {
            println!("\n👀 Preview written to: {}", preview_path.display());
            println!("PREVIEW_ONLY set => stopping after preview.");
        }
        RunOutcome::Completed(summary) => {
            println!("\n✅ Done.");
            println!("SQLite : {}", summary.db_path.display());
            println!(
                "Results: {}/ ({} files)",
                config.results_dir.display(),
                summary.results.len()
            );
            println!(
                "Charts : {}/ ({} files)",
                config.charts_dir.display(),
                summary.charts.len()
            );
            println!("Manifest: {}", summary.manifest.display());
        }
    }

    Ok(())
}
