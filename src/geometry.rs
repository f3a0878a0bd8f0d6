use serde::{Deserialize, Serialize};

/// A position on screen in pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Pixel size of the window together with the physical properties needed
/// to convert degrees of visual angle into pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenGeometry {
    pub width_px: u32,
    pub height_px: u32,
    /// Physical width of the visible area in millimeters.
    pub width_mm: f32,
    /// Distance between the participant's eyes and the screen in millimeters.
    pub viewing_distance_mm: f32,
}

impl ScreenGeometry {
    pub fn new(width_px: u32, height_px: u32, width_mm: f32, viewing_distance_mm: f32) -> Self {
        Self {
            width_px,
            height_px,
            width_mm,
            viewing_distance_mm,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width_px as f32 / 2.0, self.height_px as f32 / 2.0)
    }

    /// Extent on screen, in millimeters, that subtends `degrees` of visual
    /// angle at the configured viewing distance.
    pub fn deg_to_mm(&self, degrees: f32) -> f32 {
        2.0 * self.viewing_distance_mm * (degrees.to_radians() / 2.0).tan()
    }

    pub fn mm_to_px(&self, mm: f32) -> f32 {
        mm * self.width_px as f32 / self.width_mm
    }

    pub fn deg_to_px(&self, degrees: f32) -> f32 {
        self.mm_to_px(self.deg_to_mm(degrees))
    }

    /// Pixels per degree of visual angle around the line of sight.
    pub fn pixels_per_degree(&self) -> f32 {
        self.deg_to_px(1.0)
    }
}
