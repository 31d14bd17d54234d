use async_trait::async_trait;

use crate::agent_engine::state::Action;
use crate::errors::GruntyResult;

/// What performing an action produced, besides its side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutput {
    None,
    /// Cursor location in the logical frame.
    CursorPosition { x: f64, y: f64 },
    /// PNG bytes, 1280×800, no alpha.
    Screenshot(Vec<u8>),
}

/// OS-facing input and capture. The run loop awaits every call before
/// issuing the next, so implementations never see concurrent calls.
#[async_trait]
pub trait ActionCapability: Send + Sync {
    /// Fails with `UnsupportedAction` for variants that are not physical actions.
    async fn perform(&self, action: &Action) -> GruntyResult<ActionOutput>;

    /// PNG bytes of the target display scaled to the logical frame.
    async fn capture_screenshot(&self) -> GruntyResult<Vec<u8>>;
}
