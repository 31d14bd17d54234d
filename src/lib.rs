pub mod agent_engine;
pub mod config;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod perception;

use tokio::task::JoinHandle;

use crate::agent_engine::engine::{AgentSession, RunReport};
use crate::agent_engine::loop_control::StopHandle;
use crate::config::AppConfig;
use crate::errors::{GruntyError, GruntyResult};
use crate::llm::translator::Translator;

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .try_init();
}

/// Translator for the configured model, with the built-in tool set and the
/// configured prompt addendum.
pub fn translator_from_config(config: &AppConfig) -> GruntyResult<Translator> {
    let tools = llm::tools::load_builtin_tools()?;
    let system = llm::prompt::system_prompt(&config.prompt.additional_system_prompt);
    Ok(Translator::new(
        config.model.model.clone(),
        config.model.max_tokens,
        system,
        tools,
    ))
}

/// Environment-side handle to a run executing on its own task.
pub struct RunHandle {
    stop: StopHandle,
    task: JoinHandle<RunReport>,
}

impl RunHandle {
    /// Ask the loop to stop after the current iteration.
    pub fn stop(&self) {
        tracing::info!("stop requested");
        self.stop.request_stop();
    }

    /// Drop the run without waiting for the iteration boundary. `join` then
    /// reports a `RunTask` error.
    pub fn abort(&self) {
        tracing::warn!("run aborted");
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> GruntyResult<RunReport> {
        self.task.await.map_err(|e| {
            if e.is_panic() {
                GruntyError::RunTask("the run panicked".into())
            } else {
                GruntyError::RunTask("the run was aborted".into())
            }
        })
    }
}

/// What the environment should do about an operator interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Let the current iteration finish, then stop.
    StopAfterStep,
    /// Abandon the run now.
    Abort,
}

/// Counts Ctrl-C presses. The first asks for a graceful stop, any later one
/// aborts.
#[derive(Debug, Default)]
pub struct InterruptCounter {
    presses: u32,
}

impl InterruptCounter {
    pub fn press(&mut self) -> Interrupt {
        self.presses += 1;
        if self.presses >= 2 {
            Interrupt::Abort
        } else {
            Interrupt::StopAfterStep
        }
    }
}

/// Start `session` in the background. Notifications flow through the notifier
/// the session was built with.
pub fn spawn_run(session: AgentSession) -> RunHandle {
    let stop = session.stop_handle();
    tracing::info!("spawning agent run");
    let task = tokio::spawn(session.run());
    RunHandle { stop, task }
}
