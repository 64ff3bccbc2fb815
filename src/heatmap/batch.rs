//! Render every measurement set below a directory.
//!
//! A measurement set is a directory holding one or more `ms_data*.txt` logs
//! next to `image*.png` reference renders. `ms_data_st.txt` pairs with
//! `image_st.png`; when no image has the matching suffix and the directory
//! holds exactly one image, that image is used.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::HeatmapConfig;

const LOG_PREFIX: &str = "ms_data";
const IMAGE_PREFIX: &str = "image";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementSet {
    pub log: PathBuf,
    pub image: Option<PathBuf>,
    /// Text after the `ms_data` prefix, e.g. `_st`.
    pub suffix: String,
}

impl MeasurementSet {
    /// Output path for this set, inside `out_dir` or next to the log.
    pub fn output_path(&self, out_dir: Option<&Path>) -> PathBuf {
        let name = match self.suffix.trim_start_matches('_') {
            "" => "heatmap.png".to_string(),
            s => format!("heatmap_{}.png", s),
        };
        match out_dir {
            Some(dir) => dir.join(name),
            None => self
                .log
                .parent()
                .map(|p| p.join(&name))
                .unwrap_or_else(|| PathBuf::from(name)),
        }
    }
}

fn stem_suffix<'a>(path: &'a Path, prefix: &str) -> Option<&'a str> {
    path.file_stem()?.to_str()?.strip_prefix(prefix)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Find measurement sets in `root` and all of its subdirectories.
/// Symbolic links to directories are skipped.
pub fn discover(root: &Path) -> Result<Vec<MeasurementSet>> {
    let mut sets = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut logs = Vec::new();
        let mut images = Vec::new();
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            // symlinked directories are not followed
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if has_extension(&path, "txt") && stem_suffix(&path, LOG_PREFIX).is_some() {
                logs.push(path);
            } else if has_extension(&path, "png") && stem_suffix(&path, IMAGE_PREFIX).is_some() {
                images.push(path);
            }
        }

        for log in logs {
            let suffix = stem_suffix(&log, LOG_PREFIX).unwrap_or_default().to_string();
            let image = images
                .iter()
                .find(|img| stem_suffix(img, IMAGE_PREFIX) == Some(suffix.as_str()))
                .or_else(|| if images.len() == 1 { images.first() } else { None })
                .cloned();
            if image.is_none() {
                debug!("No reference image for {}", log.display());
            }
            sets.push(MeasurementSet { log, image, suffix });
        }
    }

    sets.sort_by(|a, b| a.log.cmp(&b.log));
    Ok(sets)
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub rendered: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Render all sets concurrently on the blocking pool. A failing set is
/// reported and does not stop the others.
pub async fn run(
    sets: Vec<MeasurementSet>,
    config: &HeatmapConfig,
    out_dir: Option<&Path>,
) -> Result<BatchReport> {
    if let Some(dir) = out_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut tasks = JoinSet::new();
    for set in sets {
        let config = config.clone();
        let out = set.output_path(out_dir);
        tasks.spawn_blocking(move || {
            let result = super::render_file(&set.log, set.image.as_deref(), &out, &config);
            (set.log, out, result)
        });
    }

    let mut report = BatchReport::default();
    while let Some(joined) = tasks.join_next().await {
        let (log, out, result) = joined.context("Heatmap task panicked")?;
        match result {
            Ok(_) => report.rendered.push(out),
            Err(e) => {
                warn!("Failed to render {}: {}", log.display(), e);
                report.failed.push((log, e.to_string()));
            }
        }
    }

    report.rendered.sort();
    report.failed.sort();
    info!(
        "Rendered {} heatmaps, {} failed",
        report.rendered.len(),
        report.failed.len()
    );
    Ok(report)
}
