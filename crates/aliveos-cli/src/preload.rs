//! Startup registration of concept descriptors from a directory.
//!
//! Every `*.json` file in the directory is read in file-name order and
//! handed to [`Coordinator::register_descriptor_json`].  A file that cannot
//! be read or registered is reported and skipped; it never aborts startup.

use std::fs;
use std::path::{Path, PathBuf};

use aliveos_runtime::Coordinator;
use tracing::{info, warn};

/// What happened to each file.
#[derive(Debug, Default)]
pub struct PreloadReport {
    pub loaded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

pub fn preload_concepts(coordinator: &Coordinator, dir: &Path) -> Result<PreloadReport, String> {
    let entries = fs::read_dir(dir)
        .map_err(|e| format!("Failed to read concepts directory {}: {}", dir.display(), e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut report = PreloadReport::default();
    for path in files {
        match register_file(coordinator, &path) {
            Ok(()) => {
                info!(file = %path.display(), "concept descriptor preloaded");
                report.loaded.push(path);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping concept descriptor");
                report.failed.push((path, e));
            }
        }
    }
    Ok(report)
}

/// Register a single descriptor file.
pub fn register_file(coordinator: &Coordinator, path: &Path) -> Result<(), String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    coordinator
        .register_descriptor_json(&raw)
        .map_err(|e| e.to_string())
}
