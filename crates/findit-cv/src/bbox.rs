//! Bounding box operations
//!
//! Pixel-space rectangles around segmented objects, used to crop frames
//! before feature extraction and to hit-test taps.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BBox {
    /// Create a new bounding box
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box covering a whole frame
    pub fn frame(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Calculate area of the bounding box
    pub fn area(&self) -> f64 {
        (self.width.max(0) as f64) * (self.height.max(0) as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Calculate center point
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, point: (i32, i32)) -> bool {
        point.0 >= self.x && point.0 < self.right() && point.1 >= self.y && point.1 < self.bottom()
    }

    /// Intersection with another box, `None` when they do not overlap
    pub fn intersect(&self, other: &BBox) -> Option<BBox> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(BBox::new(x1, y1, x2 - x1, y2 - y1))
    }

    /// Grow each side by `ratio` of the box size, clipped to the frame
    pub fn expand(&self, ratio: f64, frame_width: u32, frame_height: u32) -> BBox {
        let dx = (self.width as f64 * ratio).round() as i32;
        let dy = (self.height as f64 * ratio).round() as i32;

        let grown = BBox::new(
            self.x - dx,
            self.y - dy,
            self.width + 2 * dx,
            self.height + 2 * dy,
        );
        grown
            .intersect(&BBox::frame(frame_width, frame_height))
            .unwrap_or(BBox::new(0, 0, 0, 0))
    }

    /// Whether the box touches the outer `margin` band of the frame.
    ///
    /// Such objects are usually cut off by the frame edge.
    pub fn near_boundary(&self, margin: f64, frame_width: u32, frame_height: u32) -> bool {
        let mx = (frame_width as f64 * margin).round() as i32;
        let my = (frame_height as f64 * margin).round() as i32;

        self.x < mx
            || self.y < my
            || self.right() > frame_width as i32 - mx
            || self.bottom() > frame_height as i32 - my
    }
}
