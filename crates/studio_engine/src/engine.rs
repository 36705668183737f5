use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use studio_core::{HttpReply, JobId, Payload, TransportError};
use studio_logging::{studio_debug, studio_error, JOB_TARGET};
use tokio_util::sync::CancellationToken;

use crate::JobApi;

enum EngineCommand {
    Submit {
        generation: u64,
        tool: String,
        payload: Payload,
    },
    SchedulePoll {
        generation: u64,
        job_id: JobId,
        delay: Duration,
    },
    CancelPendingPoll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SubmitReplied {
        generation: u64,
        reply: Result<HttpReply, TransportError>,
    },
    PollReplied {
        generation: u64,
        job_id: JobId,
        reply: Result<HttpReply, TransportError>,
    },
}

/// Runs API calls on a background tokio runtime and reports results as events.
///
/// At most one poll is waiting on its timer at any time: scheduling a new one
/// cancels the previous timer. Requests already on the wire are never aborted.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn JobApi>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    studio_error!("failed to start engine runtime: {err}");
                    return;
                }
            };
            let mut pending_poll: Option<CancellationToken> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Submit {
                        generation,
                        tool,
                        payload,
                    } => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let reply = api.submit(&tool, &payload).await;
                            let _ = event_tx.send(EngineEvent::SubmitReplied { generation, reply });
                        });
                    }
                    EngineCommand::SchedulePoll {
                        generation,
                        job_id,
                        delay,
                    } => {
                        if let Some(previous) = pending_poll.take() {
                            previous.cancel();
                        }
                        let token = CancellationToken::new();
                        pending_poll = Some(token.clone());
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            tokio::select! {
                                _ = token.cancelled() => {
                                    studio_debug!(target: JOB_TARGET, "poll for job {job_id} cancelled before firing");
                                    return;
                                }
                                _ = tokio::time::sleep(delay) => {}
                            }
                            let reply = api.job_status(&job_id).await;
                            let _ = event_tx.send(EngineEvent::PollReplied {
                                generation,
                                job_id,
                                reply,
                            });
                        });
                    }
                    EngineCommand::CancelPendingPoll => {
                        if let Some(token) = pending_poll.take() {
                            token.cancel();
                        }
                    }
                }
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit(&self, generation: u64, tool: impl Into<String>, payload: Payload) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            generation,
            tool: tool.into(),
            payload,
        });
    }

    pub fn schedule_poll(&self, generation: u64, job_id: impl Into<JobId>, delay: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::SchedulePoll {
            generation,
            job_id: job_id.into(),
            delay,
        });
    }

    /// Idempotent; a no-op when nothing is scheduled.
    pub fn cancel_pending_poll(&self) {
        let _ = self.cmd_tx.send(EngineCommand::CancelPendingPoll);
    }

    /// Blocks for the next event. `None` once the engine thread is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}
