use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::agent_engine::loop_control::StopHandle;
use crate::agent_engine::state::Action;
use crate::errors::{GruntyError, GruntyResult};
use crate::executor::capability::{ActionCapability, ActionOutput};
use crate::perception::screenshot::blank_frame;

#[derive(Debug, Default)]
struct Recorded {
    performed: Vec<Action>,
    captures: usize,
    cursor: (f64, f64),
}

/// Performs nothing, records every action and tracks a virtual cursor in the
/// logical frame. Backs `--dry-run` and the run-loop tests.
#[derive(Debug, Clone)]
pub struct RecordingCapability {
    state: Arc<Mutex<Recorded>>,
    frame: Vec<u8>,
    stop_on_perform: Option<StopHandle>,
    fail_capture: bool,
}

impl RecordingCapability {
    pub fn new() -> GruntyResult<Self> {
        Ok(Self::with_frame(blank_frame()?))
    }

    /// Use `frame` as the bytes of every capture.
    pub fn with_frame(frame: Vec<u8>) -> Self {
        Self {
            state: Arc::default(),
            frame,
            stop_on_perform: None,
            fail_capture: false,
        }
    }

    /// Request a stop on `handle` while each action is being performed.
    pub fn stop_during_actions(mut self, handle: StopHandle) -> Self {
        self.stop_on_perform = Some(handle);
        self
    }

    /// Make every capture fail as the OS would.
    pub fn failing_capture(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    pub fn performed(&self) -> Vec<Action> {
        self.lock().performed.clone()
    }

    pub fn captures(&self) -> usize {
        self.lock().captures
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ActionCapability for RecordingCapability {
    async fn perform(&self, action: &Action) -> GruntyResult<ActionOutput> {
        if let Action::Finish { .. } = action {
            return Err(GruntyError::UnsupportedAction(action.name().to_string()));
        }
        if let Some(handle) = &self.stop_on_perform {
            handle.request_stop();
        }

        let output = {
            let mut state = self.lock();
            state.performed.push(action.clone());
            match action {
                Action::MouseMove { x, y } | Action::Drag { x, y } => {
                    state.cursor = (*x, *y);
                    ActionOutput::None
                }
                Action::CursorPosition => ActionOutput::CursorPosition {
                    x: state.cursor.0,
                    y: state.cursor.1,
                },
                _ => ActionOutput::None,
            }
        };
        tracing::info!(action = action.name(), "recorded action (dry run)");

        if let Action::Screenshot = action {
            return Ok(ActionOutput::Screenshot(self.capture_screenshot().await?));
        }
        Ok(output)
    }

    async fn capture_screenshot(&self) -> GruntyResult<Vec<u8>> {
        if self.fail_capture {
            return Err(GruntyError::Capability("screen capture failed: display unavailable".into()));
        }
        self.lock().captures += 1;
        Ok(self.frame.clone())
    }
}
