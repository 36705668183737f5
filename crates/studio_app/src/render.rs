use std::io::Write;

use studio_core::{artifact_download_url, AppViewModel, ArtifactListView};

/// Receives every changed view of a session.
pub trait Renderer {
    fn render(&mut self, view: &AppViewModel, origin: &str);
}

/// Full textual projection of a view, one entry per output line.
pub fn format_view(view: &AppViewModel, origin: &str) -> Vec<String> {
    let mut lines = vec![status_line(view)];
    lines.extend(view.log_text.lines().map(|line| format!("  | {line}")));
    lines.extend(format_artifacts(view, origin));
    lines
}

pub fn status_line(view: &AppViewModel) -> String {
    match &view.status_detail {
        Some(detail) => format!("[{}] {}: {}", view.status.tag(), view.status.label(), detail),
        None => format!("[{}] {}", view.status.tag(), view.status.label()),
    }
}

pub fn format_artifacts(view: &AppViewModel, origin: &str) -> Vec<String> {
    match (&view.artifacts, view.active_job.as_deref()) {
        (ArtifactListView::Rows(rows), Some(job_id)) => rows
            .iter()
            .map(|row| {
                format!(
                    "  {} {}  {}",
                    row.label,
                    row.name,
                    artifact_download_url(origin, job_id, &row.artifact_id)
                )
            })
            .collect(),
        (ArtifactListView::Empty(message), _) => vec![format!("  {message}")],
        (ArtifactListView::Rows(_), None) => Vec::new(),
    }
}

/// Prints status changes, new log lines and the final artifact list.
pub struct TerminalRenderer<W: Write> {
    out: W,
    last_status: Option<String>,
    printed_lines: Vec<String>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_status: None,
            printed_lines: Vec::new(),
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, view: &AppViewModel, origin: &str) {
        let status = status_line(view);
        if self.last_status.as_deref() != Some(status.as_str()) {
            let _ = writeln!(self.out, "{status}");
            self.last_status = Some(status);
        }

        // Lines already printed unchanged are skipped; everything after the
        // first differing line is printed again in full.
        let lines: Vec<&str> = view.log_text.lines().collect();
        let unchanged = self
            .printed_lines
            .iter()
            .zip(&lines)
            .take_while(|(printed, line)| printed.as_str() == **line)
            .count();
        for line in lines[unchanged..].iter().filter(|line| !line.is_empty()) {
            let _ = writeln!(self.out, "  | {line}");
        }
        self.printed_lines = lines.into_iter().map(str::to_owned).collect();

        if !view.forms_locked {
            for line in format_artifacts(view, origin) {
                let _ = writeln!(self.out, "{line}");
            }
        }
        let _ = self.out.flush();
    }
}
