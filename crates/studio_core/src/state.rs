use std::time::Duration;

use crate::view_model::{render_artifacts, AppViewModel, ArtifactListView, StatusState};
use crate::{Artifact, JobId, NO_LOG_OUTPUT};

/// Fixed delay between two status polls of the same job.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    /// Consecutive 404/425 poll replies tolerated before giving up.
    /// `None` keeps polling indefinitely.
    pub max_not_ready_polls: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            max_not_ready_polls: None,
        }
    }
}

/// Single owned session record. Mutated only through `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    config: SessionConfig,
    /// Bumped on every job start; replies carrying an older value are stale.
    generation: u64,
    active_job: Option<JobId>,
    poll_pending: bool,
    forms_locked: bool,
    active_tool: Option<String>,
    status: StatusState,
    status_detail: Option<String>,
    log_text: String,
    artifacts: Vec<Artifact>,
    not_ready_polls: u32,
    /// Set once the active job has answered a poll with a real snapshot.
    snapshot_seen: bool,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(SessionConfig::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            generation: 0,
            active_job: None,
            poll_pending: false,
            forms_locked: false,
            active_tool: None,
            status: StatusState::Idle,
            status_detail: None,
            log_text: NO_LOG_OUTPUT.to_string(),
            artifacts: Vec::new(),
            not_ready_polls: 0,
            snapshot_seen: false,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        let artifacts = match &self.active_job {
            Some(job_id) => render_artifacts(job_id, &self.artifacts),
            None => ArtifactListView::default(),
        };
        AppViewModel {
            status: self.status,
            status_detail: self.status_detail.clone(),
            log_text: self.log_text.clone(),
            artifacts,
            forms_locked: self.forms_locked,
            active_job: self.active_job.clone(),
            active_tool: self.active_tool.clone(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_job(&self) -> Option<&str> {
        self.active_job.as_deref()
    }

    pub fn poll_pending(&self) -> bool {
        self.poll_pending
    }

    pub fn forms_locked(&self) -> bool {
        self.forms_locked
    }

    /// Returns whether the view changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn select_tool(&mut self, tool: String) {
        if self.active_tool.as_deref() != Some(tool.as_str()) {
            self.active_tool = Some(tool);
            self.dirty = true;
        }
    }

    /// Starts a new generation. Returns whether a poll was pending before.
    pub(crate) fn begin_submission(&mut self, tool: String) -> bool {
        let had_pending = std::mem::take(&mut self.poll_pending);
        self.generation += 1;
        self.active_job = None;
        self.active_tool = Some(tool);
        self.forms_locked = true;
        self.not_ready_polls = 0;
        self.snapshot_seen = false;
        self.log_text = NO_LOG_OUTPUT.to_string();
        self.artifacts.clear();
        self.set_status(StatusState::Submitting, None);
        had_pending
    }

    pub(crate) fn accept_job(&mut self, job_id: JobId, status: StatusState) {
        self.active_job = Some(job_id);
        self.set_status(status, None);
    }

    pub(crate) fn is_current(&self, generation: u64, job_id: Option<&str>) -> bool {
        generation == self.generation
            && job_id.map_or(true, |id| self.active_job.as_deref() == Some(id))
    }

    pub(crate) fn mark_poll_scheduled(&mut self) {
        self.poll_pending = true;
    }

    pub(crate) fn mark_poll_fired(&mut self) {
        self.poll_pending = false;
    }

    /// 404/425 only mean "not yet queryable" before the first snapshot.
    pub(crate) fn in_not_ready_window(&self) -> bool {
        !self.snapshot_seen
    }

    /// Counts one more not-ready reply; returns the running total.
    pub(crate) fn bump_not_ready(&mut self) -> u32 {
        self.not_ready_polls += 1;
        self.not_ready_polls
    }

    pub(crate) fn apply_snapshot(
        &mut self,
        log_text: String,
        artifacts: Vec<Artifact>,
        status: StatusState,
        detail: Option<String>,
    ) {
        self.not_ready_polls = 0;
        self.snapshot_seen = true;
        self.log_text = log_text;
        self.artifacts = artifacts;
        self.set_status(status, detail);
    }

    pub(crate) fn set_status(&mut self, status: StatusState, detail: Option<String>) {
        self.status = status;
        self.status_detail = detail;
        self.dirty = true;
    }

    pub(crate) fn finish(&mut self) {
        self.forms_locked = false;
        self.poll_pending = false;
        self.dirty = true;
    }

    /// Terminal client-side error: surfaced in status and log, forms unlocked.
    pub(crate) fn fail(&mut self, message: String) {
        self.log_text = message.clone();
        self.set_status(StatusState::Error, Some(message));
        self.finish();
    }
}
