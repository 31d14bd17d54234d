use std::sync::Arc;

use crate::agent_engine::event_bus::{Notification, Notifier};
use crate::agent_engine::history::Conversation;
use crate::agent_engine::loop_control::{LoopController, StopHandle};
use crate::agent_engine::state::{Action, LoopConfig, RunOutcome, RunState};
use crate::errors::{GruntyError, GruntyResult};
use crate::executor::capability::{ActionCapability, ActionOutput};
use crate::llm::provider::ModelClient;
use crate::llm::translator::{self, Extraction, Translator};

/// Result of one loop iteration that did not fail.
enum Step {
    Continue,
    Done(RunOutcome),
}

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub conversation: Conversation,
    pub steps: u32,
    pub last_screenshot: Option<Vec<u8>>,
}

/// One run of the agent: owns the conversation and run state from the
/// instructions until a terminal outcome. Build a new session to run again or
/// to change configuration.
pub struct AgentSession {
    state: RunState,
    conversation: Conversation,
    translator: Translator,
    client: Arc<dyn ModelClient>,
    capability: Arc<dyn ActionCapability>,
    notifier: Notifier,
    stop: StopHandle,
    loop_ctrl: LoopController,
    last_screenshot: Option<Vec<u8>>,
}

impl AgentSession {
    pub fn new(
        instructions: &str,
        translator: Translator,
        client: Arc<dyn ModelClient>,
        capability: Arc<dyn ActionCapability>,
    ) -> GruntyResult<Self> {
        let instructions = instructions.trim();
        if instructions.is_empty() {
            return Err(GruntyError::EmptyInstructions);
        }
        Ok(Self {
            state: RunState::Idle,
            conversation: Conversation::new(instructions),
            translator,
            client,
            capability,
            notifier: Notifier::silent(),
            stop: StopHandle::new(),
            loop_ctrl: LoopController::new(LoopConfig::default()),
            last_screenshot: None,
        })
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_loop_config(mut self, config: LoopConfig) -> Self {
        self.loop_ctrl = LoopController::new(config);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    fn set_state(&mut self, state: RunState) {
        tracing::debug!(from = ?self.state, to = ?state, "run state transition");
        self.state = state;
    }

    /// Drives ask model → translate → execute → observe → append until a
    /// terminal outcome. The stop flag and loop limits are only checked once an
    /// iteration has fully completed.
    pub async fn run(mut self) -> RunReport {
        self.loop_ctrl.start();
        self.set_state(RunState::Running);
        tracing::info!(client = self.client.name(), "agent run started");
        self.notifier.status("Starting run");

        let outcome = loop {
            match self.step().await {
                Ok(Step::Continue) => {}
                Ok(Step::Done(outcome)) => break outcome,
                Err(e) => {
                    tracing::error!(error = %e, "run failed");
                    break RunOutcome::Failed(e.to_string());
                }
            }

            self.loop_ctrl.record_step();

            if self.stop.is_stop_requested() {
                self.set_state(RunState::Stopping);
                tracing::info!(steps = self.loop_ctrl.steps(), "stop requested by operator");
                break RunOutcome::Cancelled;
            }
            if let Some(reason) = self.loop_ctrl.limit_reached() {
                tracing::warn!(reason = %reason, "loop limit reached");
                break RunOutcome::Failed(reason);
            }
        };

        self.set_state(RunState::Finished(outcome.clone()));
        tracing::info!(
            success = outcome.is_success(),
            steps = self.loop_ctrl.steps(),
            messages = self.conversation.len(),
            "agent run ended"
        );
        self.notifier.send(Notification::Finished(outcome.clone()));

        RunReport {
            outcome,
            conversation: self.conversation,
            steps: self.loop_ctrl.steps(),
            last_screenshot: self.last_screenshot,
        }
    }

    async fn step(&mut self) -> GruntyResult<Step> {
        let request = self.translator.build_request(&self.conversation);
        let mut response = self.client.create_message(&request).await?;

        // Extraction may append a synthetic finish block, so it runs before the
        // response is stored.
        let extraction = translator::extract_action(&mut response);
        for note in translator::project(&response) {
            self.notifier.send(note);
        }
        self.conversation.push(response.into_message());

        let Extraction {
            action,
            tool_use_id,
        } = extraction?;

        if let Action::Finish { success, error } = action {
            tracing::info!(success, error = error.as_deref().unwrap_or("-"), "finish requested");
            let outcome = if success {
                RunOutcome::Succeeded
            } else {
                RunOutcome::Failed(
                    error.unwrap_or_else(|| "the model reported failure without a reason".into()),
                )
            };
            return Ok(Step::Done(outcome));
        }

        match self.capability.perform(&action).await? {
            ActionOutput::None => {}
            ActionOutput::CursorPosition { x, y } => {
                self.notifier.status(format!("Cursor position: ({x:.0}, {y:.0})"));
            }
            ActionOutput::Screenshot(png) => self.last_screenshot = Some(png),
        }
        tracing::info!(action = action.name(), id = %tool_use_id, "action performed");

        let screenshot = self.capability.capture_screenshot().await?;
        self.conversation
            .push(translator::tool_result_message(&tool_use_id, &screenshot));
        self.last_screenshot = Some(screenshot);
        tracing::debug!(messages = self.conversation.len(), "screenshot added to history");

        Ok(Step::Continue)
    }
}
