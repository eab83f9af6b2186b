// 🧾 Run manifest - provenance for one pipeline run
// Which inputs (by content hash) produced which results and charts.

use crate::error::{PipelineError, PipelineResult};
use crate::table::{Table, TableRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "run_manifest.json";

/// SHA-256 of a file's bytes, hex encoded.
pub fn file_sha256(path: &Path) -> PipelineResult<String> {
    let mut file = File::open(path).map_err(|e| PipelineError::file(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|e| PipelineError::file(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub role: TableRole,
    pub path: PathBuf,
    pub sha256: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

impl InputRecord {
    pub fn new(role: TableRole, path: &Path, sha256: &str, table: &Table) -> Self {
        InputRecord {
            role,
            path: path.to_path_buf(),
            sha256: sha256.to_string(),
            rows: table.row_count(),
            columns: table.column_names().into_iter().map(String::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub name: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub store: PathBuf,
    pub inputs: Vec<InputRecord>,
    pub results: Vec<ResultRecord>,
    pub charts: Vec<PathBuf>,
}

impl RunManifest {
    pub fn start(store: &Path) -> Self {
        RunManifest {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            store: store.to_path_buf(),
            inputs: Vec::new(),
            results: Vec::new(),
            charts: Vec::new(),
        }
    }

    pub fn record_results(&mut self, results: &[Table]) {
        self.results = results
            .iter()
            .map(|t| ResultRecord {
                name: t.name.clone(),
                rows: t.row_count(),
            })
            .collect();
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Write `<dir>/run_manifest.json`.
    pub fn write(&self, dir: &Path) -> PipelineResult<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|e| PipelineError::file(&path, e))?;
        Ok(path)
    }
}
