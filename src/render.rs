// 🖼️ Chart rendering seam
// The pipeline only produces series; a renderer turns each into a file.

use crate::charts::{ChartData, ChartSeries};
use crate::error::{PipelineError, PipelineResult};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

pub trait ChartRenderer {
    /// Render one series into `out_dir`, returning the written file.
    fn render(&self, series: &ChartSeries, out_dir: &Path) -> PipelineResult<PathBuf>;
}

/// Writes each series as a JSON chart document (`<name>.json`) for an
/// external plotting tool to draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChartRenderer;

impl ChartRenderer for JsonChartRenderer {
    fn render(&self, series: &ChartSeries, out_dir: &Path) -> PipelineResult<PathBuf> {
        let path = out_dir.join(format!("{}.json", series.name));
        let json = serde_json::to_string_pretty(series)?;
        fs::write(&path, json).map_err(|e| PipelineError::file(&path, e))?;
        Ok(path)
    }
}

/// Render every series, creating `out_dir` first.
pub fn render_charts(
    renderer: &dyn ChartRenderer,
    data: &ChartData,
    out_dir: &Path,
) -> PipelineResult<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| PipelineError::file(out_dir, e))?;

    let mut written = Vec::with_capacity(data.len());
    for series in &data.series {
        let path = renderer.render(series, out_dir)?;
        debug!("chart {} → {}", series.name, path.display());
        written.push(path);
    }
    Ok(written)
}
