use std::sync::Arc;

use anyhow::{anyhow, Result};
use studio_core::{update, AppState, AppViewModel, Msg, Payload, SessionConfig};
use studio_engine::{JobApi, OriginPool};
use studio_logging::{studio_info, JOB_TARGET};

use crate::effects::EffectRunner;
use crate::render::Renderer;

/// Drives one client session: core state, engine and renderer.
pub struct Session<R: Renderer> {
    state: AppState,
    runner: EffectRunner,
    renderer: R,
    origins: Arc<OriginPool>,
}

impl<R: Renderer> Session<R> {
    pub fn new(
        api: Arc<dyn JobApi>,
        origins: Arc<OriginPool>,
        config: SessionConfig,
        renderer: R,
    ) -> Self {
        Self {
            state: AppState::with_config(config),
            runner: EffectRunner::new(api),
            renderer,
            origins,
        }
    }

    pub fn select_tool(&mut self, tool: impl Into<String>) {
        self.dispatch_msg(Msg::ToolSelected(tool.into()));
    }

    /// Submits a job and blocks until it reaches a terminal or error state.
    pub fn run_job(&mut self, tool: impl Into<String>, payload: Payload) -> Result<AppViewModel> {
        let tool = tool.into();
        studio_info!(target: JOB_TARGET, "Starting job for tool {}", tool);
        self.dispatch_msg(Msg::FormSubmitted { tool, payload });

        while self.state.forms_locked() {
            let msg = self
                .runner
                .next_msg()
                .ok_or_else(|| anyhow!("job engine stopped unexpectedly"))?;
            self.dispatch_msg(msg);
        }
        Ok(self.state.view())
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    fn dispatch_msg(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;

        self.runner.enqueue(effects);
        if was_dirty {
            let view = self.state.view();
            self.renderer.render(&view, self.origins.active());
        }
    }
}
