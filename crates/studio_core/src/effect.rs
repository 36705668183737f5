use std::time::Duration;

use crate::{JobId, Payload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drop the scheduled-but-not-yet-fired poll, if any.
    CancelPendingPoll,
    SubmitJob {
        generation: u64,
        tool: String,
        payload: Payload,
    },
    /// Fetch the job status once `delay` has elapsed.
    SchedulePoll {
        generation: u64,
        job_id: JobId,
        delay: Duration,
    },
}
