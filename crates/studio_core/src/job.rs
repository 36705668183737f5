use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

pub type JobId = String;

/// Form fields forwarded verbatim as the JSON body of a submission.
pub type Payload = BTreeMap<String, String>;

/// Placeholder shown when a job has produced no log lines.
pub const NO_LOG_OUTPUT: &str = "No log output yet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Artifact {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Job logs as reported by the backend: either one blob or a list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum JobLogs {
    Text(String),
    Lines(Vec<String>),
}

impl JobLogs {
    pub fn to_display(&self) -> String {
        match self {
            JobLogs::Text(text) => text.clone(),
            JobLogs::Lines(lines) => lines.join("\n"),
        }
    }
}

/// Display text for an optional log field; empty output collapses to the placeholder.
pub fn normalize_logs(logs: Option<&JobLogs>) -> String {
    let text = logs.map(JobLogs::to_display).unwrap_or_default();
    if text.is_empty() {
        NO_LOG_OUTPUT.to_string()
    } else {
        text
    }
}

/// Body of `GET /api/jobs/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub logs: Option<JobLogs>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub return_code: Option<i64>,
}

#[derive(Debug, Error)]
#[error("malformed job status body: {0}")]
pub struct SnapshotError(#[from] serde_json::Error);

impl JobSnapshot {
    pub fn parse(body: &[u8]) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_slice(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_lines_are_newline_joined() {
        let logs = JobLogs::Lines(vec!["a".into(), "b".into()]);
        assert_eq!(normalize_logs(Some(&logs)), "a\nb");
    }

    #[test]
    fn log_text_is_kept_verbatim() {
        let logs = JobLogs::Text("a\nb".into());
        assert_eq!(normalize_logs(Some(&logs)), "a\nb");
    }

    #[test]
    fn missing_logs_use_placeholder() {
        assert_eq!(normalize_logs(None), NO_LOG_OUTPUT);
        assert_eq!(normalize_logs(Some(&JobLogs::Lines(Vec::new()))), NO_LOG_OUTPUT);
    }

    #[test]
    fn snapshot_rejects_unknown_status() {
        let err = JobSnapshot::parse(br#"{"status":"exploded"}"#).unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn snapshot_parses_backend_shape() {
        let body = br#"{
            "id": "j1", "tool": "protocol-positioning", "status": "succeeded",
            "created_at": "2026-01-01T00:00:00+00:00", "started_at": null,
            "finished_at": null, "return_code": 0, "error": null,
            "logs": ["starting", "done"],
            "artifacts": [{"id": "a1", "label": "Markdown", "name": "report.md"}, {"id": "a2"}]
        }"#;
        let snapshot = JobSnapshot::parse(body).unwrap();
        assert_eq!(snapshot.status, JobStatus::Succeeded);
        assert_eq!(snapshot.artifacts.len(), 2);
        assert_eq!(snapshot.artifacts[1].name, None);
        assert_eq!(snapshot.return_code, Some(0));
    }
}
