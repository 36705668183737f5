//! Saves the artifacts of a completed job to disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use studio_core::{AppViewModel, ArtifactListView, StatusState};
use studio_engine::{ensure_dir, safe_file_name, AtomicFileWriter, ReqwestJobApi};
use studio_logging::{studio_info, studio_warn, JOB_TARGET};

/// Downloads every listed artifact of a succeeded job into `dir`.
///
/// Individual failures are logged and skipped; the returned paths are the
/// files actually written.
pub async fn download_artifacts(
    api: &ReqwestJobApi,
    view: &AppViewModel,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let (Some(job_id), StatusState::Succeeded) = (view.active_job.as_deref(), view.status) else {
        return Ok(Vec::new());
    };
    let ArtifactListView::Rows(rows) = &view.artifacts else {
        return Ok(Vec::new());
    };

    ensure_dir(dir).with_context(|| format!("download directory {}", dir.display()))?;
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let mut used = HashSet::new();
    let mut written = Vec::new();

    for row in rows {
        let fallback = safe_file_name(&row.artifact_id, "artifact");
        let mut filename = safe_file_name(&row.name, &fallback);
        if !used.insert(filename.clone()) {
            filename = format!("{fallback}-{filename}");
            used.insert(filename.clone());
        }

        let bytes = match api.download_artifact(job_id, &row.artifact_id).await {
            Ok(bytes) => bytes,
            Err(err) => {
                studio_warn!(
                    target: JOB_TARGET,
                    "Skipping artifact {} of job {}: {}",
                    row.artifact_id,
                    job_id,
                    err
                );
                continue;
            }
        };
        let path = writer
            .write(&filename, &bytes)
            .with_context(|| format!("writing artifact {}", row.artifact_id))?;
        studio_info!(target: JOB_TARGET, "Saved {} ({} bytes)", path.display(), bytes.len());
        written.push(path);
    }
    Ok(written)
}
