use crate::{HttpReply, JobId, Payload, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a tool tab, or the page preselected one via `?tool=`.
    ToolSelected(String),
    /// User submitted a tool form. Ignored while forms are locked.
    FormSubmitted { tool: String, payload: Payload },
    /// Programmatic job start; supersedes whatever job is active.
    StartJob { tool: String, payload: Payload },
    /// Engine result for a submission.
    SubmitReplied {
        generation: u64,
        reply: Result<HttpReply, TransportError>,
    },
    /// Engine result for one status poll.
    PollReplied {
        generation: u64,
        job_id: JobId,
        reply: Result<HttpReply, TransportError>,
    },
}
