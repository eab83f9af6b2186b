// 🔎 Input discovery - first matching file across prioritised directories

use crate::error::{PipelineError, PipelineResult};
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories searched, highest priority first.
#[derive(Debug, Clone)]
pub struct SearchPaths {
    /// Explicit data directory (`DATA_DIR`)
    pub data_dir: Option<PathBuf>,
    /// Project directory; also the root of the recursive fallback
    pub base_dir: PathBuf,
    pub cwd: PathBuf,
}

impl SearchPaths {
    /// Candidate paths for one file name, in lookup order.
    ///
    /// For each root: `<root>/<name>` then `<root>/data/<name>`.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut roots: Vec<&Path> = Vec::with_capacity(3);
        if let Some(dir) = &self.data_dir {
            roots.push(dir);
        }
        roots.push(&self.base_dir);
        roots.push(&self.cwd);

        roots
            .into_iter()
            .flat_map(|root| [root.join(name), root.join("data").join(name)])
            .collect()
    }
}

/// Return the first existing file among `names`.
///
/// Direct candidates for every name are tried before falling back to a
/// recursive search under the base directory (sorted, so the hit is stable).
pub fn find_data_file(names: &[&str], paths: &SearchPaths) -> PipelineResult<PathBuf> {
    for name in names {
        for candidate in paths.candidates(name) {
            if candidate.is_file() {
                debug!("found {} at {}", name, candidate.display());
                return Ok(candidate);
            }
        }
    }

    for name in names {
        let hit = WalkDir::new(&paths.base_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .find(|entry| entry.file_type().is_file() && entry.file_name() == *name);
        if let Some(entry) = hit {
            debug!("found {} by recursive search", name);
            return Ok(entry.into_path());
        }
    }

    Err(PipelineError::NotFound {
        names: names.iter().map(|n| n.to_string()).collect(),
    })
}
