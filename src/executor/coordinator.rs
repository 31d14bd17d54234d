// Mapping between the model's fixed 1280×800 frame and the physical display.
use crate::errors::{GruntyError, GruntyResult};

pub const LOGICAL_WIDTH: u32 = 1280;
pub const LOGICAL_HEIGHT: u32 = 800;

/// Target display region in physical pixels. Fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisplayGeometry {
    pub offset_x: i32,
    pub offset_y: i32,
    pub width: u32,
    pub height: u32,
}

impl DisplayGeometry {
    /// Rejects a zero-sized region, which would make the mapping undefined.
    pub fn new(offset_x: i32, offset_y: i32, width: u32, height: u32) -> GruntyResult<Self> {
        if width == 0 || height == 0 {
            return Err(GruntyError::Config(format!(
                "display geometry must be non-empty, got {width}x{height}"
            )));
        }
        Ok(Self {
            offset_x,
            offset_y,
            width,
            height,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    geometry: DisplayGeometry,
}

impl CoordinateMapper {
    pub fn new(geometry: DisplayGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Logical frame → physical pixels. Out-of-frame input is not clamped.
    pub fn to_physical(&self, x: f64, y: f64) -> (f64, f64) {
        let g = &self.geometry;
        (
            x * f64::from(g.width) / f64::from(LOGICAL_WIDTH) + f64::from(g.offset_x),
            y * f64::from(g.height) / f64::from(LOGICAL_HEIGHT) + f64::from(g.offset_y),
        )
    }

    /// Physical pixels → logical frame; inverse of [`Self::to_physical`].
    pub fn to_logical(&self, px: f64, py: f64) -> (f64, f64) {
        let g = &self.geometry;
        (
            (px - f64::from(g.offset_x)) * f64::from(LOGICAL_WIDTH) / f64::from(g.width),
            (py - f64::from(g.offset_y)) * f64::from(LOGICAL_HEIGHT) / f64::from(g.height),
        )
    }

    /// [`Self::to_physical`] rounded to the integer grid input injection uses.
    pub fn to_physical_pixel(&self, x: f64, y: f64) -> (i32, i32) {
        let (px, py) = self.to_physical(x, y);
        (px.round() as i32, py.round() as i32)
    }
}
