use std::time::Duration;

use studio_logging::{studio_debug, studio_info, studio_warn, JOB_TARGET};

use crate::submit::{extract_job_id, parse_lenient, server_message, SubmitFraming};
use crate::view_model::StatusState;
use crate::{
    normalize_logs, AppState, Effect, HttpReply, JobId, JobSnapshot, JobStatus, Msg, Payload,
    TransportError,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ToolSelected(tool) => {
            state.select_tool(tool);
            Vec::new()
        }
        Msg::FormSubmitted { tool, payload } => {
            if state.forms_locked() {
                studio_debug!(target: JOB_TARGET, "form submit for {tool} ignored: job in flight");
                Vec::new()
            } else {
                start_job(&mut state, tool, payload)
            }
        }
        Msg::StartJob { tool, payload } => start_job(&mut state, tool, payload),
        Msg::SubmitReplied { generation, reply } => {
            if !state.is_current(generation, None) {
                studio_debug!(target: JOB_TARGET, "stale submit reply (generation {generation}) dropped");
                return (state, Vec::new());
            }
            on_submit_reply(&mut state, generation, reply)
        }
        Msg::PollReplied {
            generation,
            job_id,
            reply,
        } => {
            if !state.is_current(generation, Some(job_id.as_str())) {
                studio_debug!(target: JOB_TARGET, "stale poll reply for job {job_id} dropped");
                return (state, Vec::new());
            }
            state.mark_poll_fired();
            on_poll_reply(&mut state, generation, job_id, reply)
        }
    };

    (state, effects)
}

fn start_job(state: &mut AppState, tool: String, payload: Payload) -> Vec<Effect> {
    let had_pending = state.begin_submission(tool.clone());
    studio_info!(target: JOB_TARGET, "submitting {tool} (generation {})", state.generation());
    let mut effects = Vec::with_capacity(2);
    if had_pending {
        effects.push(Effect::CancelPendingPoll);
    }
    effects.push(Effect::SubmitJob {
        generation: state.generation(),
        tool,
        payload,
    });
    effects
}

fn on_submit_reply(
    state: &mut AppState,
    generation: u64,
    reply: Result<HttpReply, TransportError>,
) -> Vec<Effect> {
    let reply = match reply {
        Ok(reply) => reply,
        Err(err) => {
            studio_warn!(target: JOB_TARGET, "submit failed: {err}");
            state.fail(err.to_string());
            return Vec::new();
        }
    };

    let body = parse_lenient(&reply.body);
    if !reply.is_success() {
        let message = server_message(&body)
            .unwrap_or_else(|| format!("Request failed (HTTP {})", reply.status));
        studio_warn!(target: JOB_TARGET, "submit rejected: {message}");
        state.fail(message);
        return Vec::new();
    }

    let Some(job_id) = extract_job_id(&body) else {
        studio_warn!(target: JOB_TARGET, "submit reply (HTTP {}) carried no job id", reply.status);
        state.fail("Server accepted the job but returned no job id".to_string());
        return Vec::new();
    };

    let status = match SubmitFraming::from_status(reply.status) {
        SubmitFraming::Accepted => StatusState::Accepted,
        SubmitFraming::Queued => StatusState::Queued,
    };
    studio_info!(target: JOB_TARGET, "job {job_id} {}", status.tag());
    state.accept_job(job_id.clone(), status);
    vec![schedule_poll(state, generation, job_id, Duration::ZERO)]
}

fn on_poll_reply(
    state: &mut AppState,
    generation: u64,
    job_id: JobId,
    reply: Result<HttpReply, TransportError>,
) -> Vec<Effect> {
    let reply = match reply {
        Ok(reply) => reply,
        Err(err) => {
            studio_warn!(target: JOB_TARGET, "poll for job {job_id} failed: {err}");
            state.fail(err.to_string());
            return Vec::new();
        }
    };

    // The job row can lag behind the 202; treat it as still queued until
    // the first snapshot arrives.
    if matches!(reply.status, 404 | 425) && state.in_not_ready_window() {
        let attempts = state.bump_not_ready();
        if let Some(limit) = state.config().max_not_ready_polls {
            if attempts > limit {
                state.fail(format!(
                    "Job {job_id} did not become available after {limit} status checks"
                ));
                return Vec::new();
            }
        }
        state.set_status(StatusState::Queued, None);
        let delay = state.config().poll_interval;
        return vec![schedule_poll(state, generation, job_id, delay)];
    }

    if !reply.is_success() {
        let message = server_message(&parse_lenient(&reply.body))
            .unwrap_or_else(|| format!("Status request failed (HTTP {})", reply.status));
        studio_warn!(target: JOB_TARGET, "poll for job {job_id} rejected: {message}");
        state.fail(message);
        return Vec::new();
    }

    let snapshot = match JobSnapshot::parse(&reply.body) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            studio_warn!(target: JOB_TARGET, "job {job_id}: {err}");
            state.fail(err.to_string());
            return Vec::new();
        }
    };

    let log_text = normalize_logs(snapshot.logs.as_ref());
    if !snapshot.status.is_terminal() {
        let status = if snapshot.status == JobStatus::Queued {
            StatusState::Queued
        } else {
            StatusState::Running
        };
        state.apply_snapshot(log_text, snapshot.artifacts, status, None);
        let delay = state.config().poll_interval;
        return vec![schedule_poll(state, generation, job_id, delay)];
    }

    if snapshot.status == JobStatus::Succeeded {
        studio_info!(target: JOB_TARGET, "job {job_id} succeeded");
        state.apply_snapshot(log_text, snapshot.artifacts, StatusState::Succeeded, None);
    } else {
        let reason = snapshot
            .error
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| "Job failed".to_string());
        studio_info!(target: JOB_TARGET, "job {job_id} failed: {reason}");
        state.apply_snapshot(
            log_text,
            snapshot.artifacts,
            StatusState::Failed,
            Some(reason),
        );
    }
    state.finish();
    Vec::new()
}

fn schedule_poll(state: &mut AppState, generation: u64, job_id: JobId, delay: Duration) -> Effect {
    state.mark_poll_scheduled();
    Effect::SchedulePoll {
        generation,
        job_id,
        delay,
    }
}
