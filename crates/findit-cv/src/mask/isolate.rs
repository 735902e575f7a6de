//! Instance selection and foreground isolation before feature extraction

use super::Mask;
use crate::bbox::BBox;
use crate::error::VisionError;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Geometry used when cutting an object out of a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Margin added around the mask's box when cropping
    pub bbox_expand_ratio: f64,
    /// Objects touching this outer band of the frame are ignored
    pub boundary_margin: f64,
    /// Extra hit area around an object's box when selecting by tap
    pub touch_expand_ratio: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            bbox_expand_ratio: 0.15,
            boundary_margin: 0.05,
            touch_expand_ratio: 0.2,
        }
    }
}

/// One segmented object
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub mask: Mask,
    pub bbox: BBox,
    pub confidence: f32,
}

impl Instance {
    /// `None` for a mask without foreground
    pub fn from_mask(mask: Mask, confidence: f32) -> Option<Self> {
        let bbox = mask.bounding_box()?;
        Some(Self {
            mask,
            bbox,
            confidence,
        })
    }
}

pub struct Isolator {
    config: SegmentationConfig,
}

impl Isolator {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Instances fully inside the frame
    pub fn visible<'a>(
        &self,
        instances: &'a [Instance],
        frame_width: u32,
        frame_height: u32,
    ) -> Vec<&'a Instance> {
        instances
            .iter()
            .filter(|instance| {
                !instance
                    .bbox
                    .near_boundary(self.config.boundary_margin, frame_width, frame_height)
            })
            .collect()
    }

    /// Instance under `point`.
    ///
    /// A direct mask hit wins; otherwise the point may land in the expanded
    /// touch area of a box. Among several hits the smallest object wins.
    pub fn select<'a>(
        &self,
        instances: &'a [Instance],
        point: (u32, u32),
        frame_width: u32,
        frame_height: u32,
    ) -> Option<&'a Instance> {
        let smallest = |hits: Vec<&'a Instance>| {
            hits.into_iter()
                .min_by(|a, b| a.bbox.area().total_cmp(&b.bbox.area()))
        };

        let direct: Vec<_> = instances
            .iter()
            .filter(|instance| instance.mask.get(point.0, point.1))
            .collect();
        if !direct.is_empty() {
            return smallest(direct);
        }

        let target = (point.0 as i32, point.1 as i32);
        let touched: Vec<_> = instances
            .iter()
            .filter(|instance| {
                instance
                    .bbox
                    .expand(self.config.touch_expand_ratio, frame_width, frame_height)
                    .contains(target)
            })
            .collect();
        smallest(touched)
    }

    /// Crop the frame around the mask and blank everything outside it
    pub fn isolate(&self, image: &DynamicImage, mask: &Mask) -> Result<DynamicImage, VisionError> {
        let (width, height) = image.dimensions();
        if mask.dimensions() != (width, height) {
            return Err(VisionError::MaskSizeMismatch {
                left: (width, height),
                right: mask.dimensions(),
            });
        }

        let bbox = mask
            .bounding_box()
            .ok_or_else(|| VisionError::invalid_image("mask has no foreground"))?
            .expand(self.config.bbox_expand_ratio, width, height);

        let rgba = image.to_rgba8();
        let cropped = RgbaImage::from_fn(bbox.width as u32, bbox.height as u32, |cx, cy| {
            let x = bbox.x as u32 + cx;
            let y = bbox.y as u32 + cy;
            if mask.get(x, y) {
                *rgba.get_pixel(x, y)
            } else {
                Rgba([0, 0, 0, 0])
            }
        });

        Ok(DynamicImage::ImageRgba8(cropped))
    }
}

impl Default for Isolator {
    fn default() -> Self {
        Self::new(SegmentationConfig::default())
    }
}
