use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use xcap::Monitor;

use crate::errors::{GruntyError, GruntyResult};
use crate::executor::coordinator::{DisplayGeometry, LOGICAL_HEIGHT, LOGICAL_WIDTH};

#[derive(Debug, Clone, serde::Serialize)]
pub struct ScreenInfo {
    pub index: usize,
    pub name: String,
    pub primary: bool,
    pub geometry: DisplayGeometry,
}

fn monitors() -> GruntyResult<Vec<Monitor>> {
    let all = Monitor::all()
        .map_err(|e| GruntyError::Capability(format!("monitor enumeration failed: {e}")))?;
    if all.is_empty() {
        return Err(GruntyError::Capability("no monitor found".into()));
    }
    Ok(all)
}

fn geometry_of(monitor: &Monitor) -> GruntyResult<DisplayGeometry> {
    DisplayGeometry::new(monitor.x(), monitor.y(), monitor.width(), monitor.height())
}

/// Picks monitor `screen_index`, falling back to the primary (or first) one.
fn select(monitors: Vec<Monitor>, screen_index: usize) -> GruntyResult<Monitor> {
    let count = monitors.len();
    let index = if screen_index < count {
        screen_index
    } else {
        tracing::warn!(screen_index, count, "screen index out of range, using primary monitor");
        monitors.iter().position(Monitor::is_primary).unwrap_or(0)
    };
    monitors
        .into_iter()
        .nth(index)
        .ok_or_else(|| GruntyError::Capability("no monitor found".into()))
}

/// Every attached monitor with its geometry.
pub fn list_screens() -> GruntyResult<Vec<ScreenInfo>> {
    monitors()?
        .iter()
        .enumerate()
        .map(|(index, m)| {
            Ok(ScreenInfo {
                index,
                name: m.name().to_string(),
                primary: m.is_primary(),
                geometry: geometry_of(m)?,
            })
        })
        .collect()
}

/// Geometry of the configured screen, resolved once at startup.
pub fn resolve_geometry(screen_index: usize) -> GruntyResult<DisplayGeometry> {
    let monitor = select(monitors()?, screen_index)?;
    let geometry = geometry_of(&monitor)?;
    tracing::info!(
        screen = screen_index,
        name = %monitor.name(),
        x = geometry.offset_x,
        y = geometry.offset_y,
        width = geometry.width,
        height = geometry.height,
        "display resolved"
    );
    Ok(geometry)
}

/// Captures the configured screen and returns it as a logical-frame PNG.
pub fn capture_screen(screen_index: usize) -> GruntyResult<Vec<u8>> {
    let monitor = select(monitors()?, screen_index)?;
    let raw = monitor
        .capture_image()
        .map_err(|e| GruntyError::Capability(format!("screen capture failed: {e}")))?;
    tracing::debug!(width = raw.width(), height = raw.height(), "screen captured");
    encode_logical_png(&raw)
}

/// Lanczos-resize to 1280×800, drop alpha, encode PNG.
pub fn encode_logical_png(raw: &RgbaImage) -> GruntyResult<Vec<u8>> {
    let resized = image::imageops::resize(raw, LOGICAL_WIDTH, LOGICAL_HEIGHT, FilterType::Lanczos3);
    let rgb = DynamicImage::ImageRgba8(resized).to_rgb8();
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| GruntyError::Capability(format!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}

/// A black logical-frame PNG, used when no real display is driven.
pub fn blank_frame() -> GruntyResult<Vec<u8>> {
    encode_logical_png(&RgbaImage::from_pixel(
        LOGICAL_WIDTH,
        LOGICAL_HEIGHT,
        image::Rgba([0, 0, 0, 255]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_normalized_rgb_png() {
        let raw = RgbaImage::from_pixel(2560, 1440, image::Rgba([10, 20, 30, 128]));
        let png = encode_logical_png(&raw).unwrap();

        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1280, 800));
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn blank_frame_is_logical_size() {
        let decoded = image::load_from_memory(&blank_frame().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1280, 800));
    }
}
