use crate::{Artifact, JobId};

pub const NO_ARTIFACTS: &str = "No artifacts yet.";
pub const DEFAULT_ARTIFACT_LABEL: &str = "File";
pub const DEFAULT_ARTIFACT_NAME: &str = "artifact";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusState {
    #[default]
    Idle,
    Submitting,
    Accepted,
    Queued,
    Running,
    Succeeded,
    Failed,
    Error,
}

impl StatusState {
    pub fn label(self) -> &'static str {
        match self {
            StatusState::Idle => "Ready",
            StatusState::Submitting => "Submitting…",
            StatusState::Accepted => "Accepted",
            StatusState::Queued => "Queued",
            StatusState::Running => "Running",
            StatusState::Succeeded => "Completed",
            StatusState::Failed => "Failed",
            StatusState::Error => "Error",
        }
    }

    /// State tag used by front ends for styling.
    pub fn tag(self) -> &'static str {
        match self {
            StatusState::Idle => "idle",
            StatusState::Submitting => "submitting",
            StatusState::Accepted => "accepted",
            StatusState::Queued => "queued",
            StatusState::Running => "running",
            StatusState::Succeeded => "succeeded",
            StatusState::Failed => "failed",
            StatusState::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub status: StatusState,
    pub status_detail: Option<String>,
    pub log_text: String,
    pub artifacts: ArtifactListView,
    pub forms_locked: bool,
    pub active_job: Option<JobId>,
    pub active_tool: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactListView {
    Empty(&'static str),
    Rows(Vec<ArtifactRowView>),
}

impl Default for ArtifactListView {
    fn default() -> Self {
        ArtifactListView::Empty(NO_ARTIFACTS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRowView {
    pub artifact_id: String,
    pub label: String,
    pub name: String,
    pub download_path: String,
}

/// Projects an artifact list onto rows; order follows the input.
pub fn render_artifacts(job_id: &str, artifacts: &[Artifact]) -> ArtifactListView {
    if artifacts.is_empty() {
        return ArtifactListView::Empty(NO_ARTIFACTS);
    }
    let rows = artifacts
        .iter()
        .map(|artifact| ArtifactRowView {
            artifact_id: artifact.id.clone(),
            label: non_empty_or(artifact.label.as_deref(), DEFAULT_ARTIFACT_LABEL),
            name: non_empty_or(artifact.name.as_deref(), DEFAULT_ARTIFACT_NAME),
            download_path: artifact_download_path(job_id, &artifact.id),
        })
        .collect();
    ArtifactListView::Rows(rows)
}

pub fn artifact_download_path(job_id: &str, artifact_id: &str) -> String {
    format!(
        "/api/jobs/{}/artifacts/{}",
        encode_path_segment(job_id),
        encode_path_segment(artifact_id)
    )
}

pub fn artifact_download_url(origin: &str, job_id: &str, artifact_id: &str) -> String {
    format!(
        "{}{}",
        crate::strip_trailing_slashes(origin),
        artifact_download_path(job_id, artifact_id)
    )
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn non_empty_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
