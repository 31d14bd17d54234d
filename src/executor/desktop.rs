use std::time::Duration;

use async_trait::async_trait;

use crate::agent_engine::state::Action;
use crate::errors::{GruntyError, GruntyResult};
use crate::executor::capability::{ActionCapability, ActionOutput};
use crate::executor::coordinator::CoordinateMapper;
use crate::executor::input;
use crate::perception::screenshot::capture_screen;

/// Drives the real desktop: enigo for input, xcap for capture.
pub struct DesktopCapability {
    mapper: CoordinateMapper,
    screen_index: usize,
    action_delay: Duration,
}

impl DesktopCapability {
    pub fn new(mapper: CoordinateMapper, screen_index: usize, action_delay: Duration) -> Self {
        Self {
            mapper,
            screen_index,
            action_delay,
        }
    }
}

/// Runs blocking OS work off the async executor.
async fn blocking<T, F>(f: F) -> GruntyResult<T>
where
    F: FnOnce() -> GruntyResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GruntyError::Capability(format!("input task failed: {e}")))?
}

#[async_trait]
impl ActionCapability for DesktopCapability {
    async fn perform(&self, action: &Action) -> GruntyResult<ActionOutput> {
        tracing::info!(action = action.name(), "performing action");

        let output = match action.clone() {
            Action::MouseMove { x, y } => {
                let (px, py) = self.mapper.to_physical_pixel(x, y);
                tracing::debug!(x, y, px, py, "mouse move: logical → physical");
                blocking(move || input::move_to(&mut input::connect()?, px, py)).await?;
                ActionOutput::None
            }
            Action::Drag { x, y } => {
                let (px, py) = self.mapper.to_physical_pixel(x, y);
                tracing::debug!(x, y, px, py, "drag: logical → physical");
                blocking(move || input::drag_to(&mut input::connect()?, px, py)).await?;
                ActionOutput::None
            }
            Action::Click { kind } => {
                blocking(move || input::click(&mut input::connect()?, kind)).await?;
                ActionOutput::None
            }
            Action::TypeText { text } => {
                blocking(move || input::type_text(&mut input::connect()?, &text)).await?;
                ActionOutput::None
            }
            Action::KeyPress { key } => {
                blocking(move || input::press_keys(&mut input::connect()?, &key)).await?;
                ActionOutput::None
            }
            Action::Screenshot => {
                return Ok(ActionOutput::Screenshot(self.capture_screenshot().await?));
            }
            Action::CursorPosition => {
                let (px, py) = blocking(|| input::cursor_location(&input::connect()?)).await?;
                let (x, y) = self.mapper.to_logical(f64::from(px), f64::from(py));
                tracing::info!(px, py, x, y, "cursor position");
                return Ok(ActionOutput::CursorPosition { x, y });
            }
            other @ Action::Finish { .. } => {
                return Err(GruntyError::UnsupportedAction(other.name().to_string()));
            }
        };

        if !self.action_delay.is_zero() {
            tokio::time::sleep(self.action_delay).await;
        }
        Ok(output)
    }

    async fn capture_screenshot(&self) -> GruntyResult<Vec<u8>> {
        let screen_index = self.screen_index;
        blocking(move || capture_screen(screen_index)).await
    }
}
