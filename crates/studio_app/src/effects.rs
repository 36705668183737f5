use std::sync::Arc;

use studio_core::{Effect, Msg};
use studio_engine::{EngineEvent, EngineHandle, JobApi};
use studio_logging::{studio_debug, JOB_TARGET};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(api: Arc<dyn JobApi>) -> Self {
        Self {
            engine: EngineHandle::new(api),
        }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CancelPendingPoll => {
                    studio_debug!(target: JOB_TARGET, "cancelling pending poll");
                    self.engine.cancel_pending_poll();
                }
                Effect::SubmitJob {
                    generation,
                    tool,
                    payload,
                } => {
                    studio_debug!(
                        target: JOB_TARGET,
                        "SubmitJob generation={} tool={} fields={}",
                        generation,
                        tool,
                        payload.len()
                    );
                    self.engine.submit(generation, tool, payload);
                }
                Effect::SchedulePoll {
                    generation,
                    job_id,
                    delay,
                } => {
                    studio_debug!(
                        target: JOB_TARGET,
                        "SchedulePoll generation={} job_id={} delay_ms={}",
                        generation,
                        job_id,
                        delay.as_millis()
                    );
                    self.engine.schedule_poll(generation, job_id, delay);
                }
            }
        }
    }

    /// Blocks until the engine reports something. `None` if the engine stopped.
    pub fn next_msg(&self) -> Option<Msg> {
        self.engine.recv().map(map_event)
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SubmitReplied { generation, reply } => Msg::SubmitReplied { generation, reply },
        EngineEvent::PollReplied {
            generation,
            job_id,
            reply,
        } => Msg::PollReplied {
            generation,
            job_id,
            reply,
        },
    }
}
