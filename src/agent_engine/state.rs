/// Which mouse button (or button gesture) a click uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickKind {
    Left,
    Right,
    Middle,
    Double,
}

/// One physical step the model asked for.
///
/// Coordinates are in the model's 1280×800 logical frame and are not clamped.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    MouseMove { x: f64, y: f64 },
    Click { kind: ClickKind },
    Drag { x: f64, y: f64 },
    TypeText { text: String },
    KeyPress { key: String },
    Screenshot,
    CursorPosition,
    Finish { success: bool, error: Option<String> },
}

impl Action {
    /// Name used in logs and in `UnsupportedAction` errors.
    pub fn name(&self) -> &'static str {
        match self {
            Action::MouseMove { .. } => "mouse_move",
            Action::Click { kind: ClickKind::Left } => "left_click",
            Action::Click { kind: ClickKind::Right } => "right_click",
            Action::Click { kind: ClickKind::Middle } => "middle_click",
            Action::Click { kind: ClickKind::Double } => "double_click",
            Action::Drag { .. } => "left_click_drag",
            Action::TypeText { .. } => "type",
            Action::KeyPress { .. } => "key",
            Action::Screenshot => "screenshot",
            Action::CursorPosition => "cursor_position",
            Action::Finish { .. } => "finish",
        }
    }
}

/// How a finished run ended.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Failed(String),
    /// Operator stop; counts as a failure but is reported on its own.
    Cancelled,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }

    /// Final line shown to the operator.
    pub fn message(&self) -> String {
        match self {
            RunOutcome::Succeeded => "Task completed successfully.".into(),
            RunOutcome::Failed(reason) => format!("Task failed: {reason}"),
            RunOutcome::Cancelled => "Run stopped by operator.".into(),
        }
    }
}

/// Lifecycle of one run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", content = "outcome", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    /// Stop request observed at an iteration boundary.
    Stopping,
    Finished(RunOutcome),
}

impl RunState {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunState::Finished(_))
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct LoopConfig {
    pub max_steps: Option<u32>,
    pub max_duration_minutes: Option<u32>,
}
