//! Fusion of independently produced foreground masks

use super::Mask;
use crate::error::VisionError;

/// Combines a depth-proximity mask with an instance-segmentation mask.
///
/// A pixel stays foreground only if both masks agree.
pub struct MaskCombiner;

impl MaskCombiner {
    /// Intersect two masks over the same grid
    pub fn intersect(a: &Mask, b: &Mask) -> Result<Mask, VisionError> {
        if a.dimensions() != b.dimensions() {
            return Err(VisionError::MaskSizeMismatch {
                left: a.dimensions(),
                right: b.dimensions(),
            });
        }

        let (width, height) = a.dimensions();
        let mut combined = Mask::new(width, height);
        for (i, (&x, &y)) in a.bits().iter().zip(b.bits()).enumerate() {
            if x && y {
                combined.set(i as u32 % width, i as u32 / width, true);
            }
        }
        Ok(combined)
    }

    /// Combine whichever masks are available.
    ///
    /// With one side missing the other passes through unchanged; with both
    /// missing there is no mask at all.
    pub fn combine(
        depth: Option<&Mask>,
        instance: Option<&Mask>,
    ) -> Result<Option<Mask>, VisionError> {
        match (depth, instance) {
            (Some(depth), Some(instance)) => Self::intersect(depth, instance).map(Some),
            (Some(only), None) | (None, Some(only)) => Ok(Some(only.clone())),
            (None, None) => Ok(None),
        }
    }
}
