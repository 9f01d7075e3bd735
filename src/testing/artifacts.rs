//! Results directory and artifact writing
//!
//! Files are written to a hidden sibling and renamed into place, so an
//! interrupted run never leaves a truncated file at a declared path.

use std::path::{Path, PathBuf};

use crate::common::{paths, Error, Result};

use super::report::SuiteReport;

/// Local directory receiving screenshots and the suite report
#[derive(Debug, Clone)]
pub struct ResultsDir {
    root: PathBuf,
}

impl ResultsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Deterministic location of a named screenshot
    pub fn screenshot_path(&self, file: &str) -> PathBuf {
        paths::screenshots_dir(&self.root).join(file)
    }

    /// Persist a PNG screenshot, returning its path
    pub fn write_screenshot(&self, file: &str, png: &[u8]) -> Result<PathBuf> {
        let path = self.screenshot_path(file);
        write_atomic(&path, png)?;
        tracing::debug!(path = %path.display(), bytes = png.len(), "Saved screenshot");
        Ok(path)
    }

    /// Persist the JSON suite report, returning its path
    pub fn write_report(&self, report: &SuiteReport) -> Result<PathBuf> {
        let path = paths::report_path(&self.root);
        let json = serde_json::to_vec_pretty(report)?;
        write_atomic(&path, &json)?;
        Ok(path)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let err = |e: std::io::Error| Error::ArtifactWrite {
        path: path.display().to_string(),
        error: e.to_string(),
    };

    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).map_err(err)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = dir.join(format!(".{}.partial", name));

    std::fs::write(&partial, bytes).map_err(err)?;
    std::fs::rename(&partial, path).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        err(e)
    })
}
