//! Feature extractors
//!
//! [`ThumbnailExtractor`] is a small deterministic perceptual embedding that
//! satisfies the extractor contract without a learned model.
//! [`ForegroundExtractor`] cuts the object out of the frame first.

use crate::error::VisionError;
use crate::mask::{Isolator, MaskCombiner};
use crate::traits::{FeatureExtractor, Segmenter};
use findit_core::FeatureVector;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Downscaled, zero-mean, unit-length grayscale thumbnail
#[derive(Debug, Clone)]
pub struct ThumbnailExtractor {
    size: u32,
}

impl ThumbnailExtractor {
    pub const ORACLE_VERSION: u16 = 1;

    pub fn new(size: u32) -> Self {
        Self { size: size.max(1) }
    }

    /// Length of every vector this extractor produces
    pub fn dimension(&self) -> usize {
        (self.size * self.size) as usize
    }
}

impl Default for ThumbnailExtractor {
    fn default() -> Self {
        Self::new(16)
    }
}

impl FeatureExtractor for ThumbnailExtractor {
    fn oracle_version(&self) -> u16 {
        Self::ORACLE_VERSION
    }

    fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, VisionError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(VisionError::invalid_image("image has no pixels"));
        }

        let thumbnail = image
            .resize_exact(self.size, self.size, FilterType::Triangle)
            .to_luma8();

        let mut values: Vec<f32> = thumbnail.pixels().map(|p| p[0] as f32 / 255.0).collect();

        let mean = values.iter().sum::<f32>() / values.len() as f32;
        values.iter_mut().for_each(|v| *v -= mean);

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            values.iter_mut().for_each(|v| *v /= norm);
        }

        FeatureVector::new(Self::ORACLE_VERSION, values)
            .map_err(|e| VisionError::extraction(e.to_string()))
    }
}

/// Isolates the object at the frame center before delegating extraction.
///
/// The instance is the visible detection under the frame center, or failing
/// that the segmenter's mask for the center point. Depth and instance masks
/// are combined with [`MaskCombiner`]; when neither is available the whole
/// frame is used. Masks that disagree completely leave
/// nothing to extract and fail the frame.
pub struct ForegroundExtractor<E, S> {
    inner: E,
    segmenter: S,
    isolator: Isolator,
}

impl<E: FeatureExtractor, S: Segmenter> ForegroundExtractor<E, S> {
    pub fn new(inner: E, segmenter: S, isolator: Isolator) -> Self {
        Self {
            inner,
            segmenter,
            isolator,
        }
    }

    /// The frame region that would be fed to the inner extractor
    pub fn foreground(&self, image: &DynamicImage) -> Result<DynamicImage, VisionError> {
        let (width, height) = image.dimensions();

        let instances = self.segmenter.detect_instances(image)?;
        let visible: Vec<_> = self
            .isolator
            .visible(&instances, width, height)
            .into_iter()
            .cloned()
            .collect();
        let center = (width / 2, height / 2);
        let instance = match self.isolator.select(&visible, center, width, height) {
            Some(instance) => Some(instance.mask.clone()),
            None => self.segmenter.mask_at(center, image)?,
        };

        let depth = self.segmenter.depth_mask(image)?;

        match MaskCombiner::combine(depth.as_ref(), instance.as_ref())? {
            Some(mask) => self
                .isolator
                .isolate(image, &mask)
                .map_err(|e| VisionError::extraction(e.to_string())),
            None => Ok(image.clone()),
        }
    }
}

impl<E: FeatureExtractor, S: Segmenter> FeatureExtractor for ForegroundExtractor<E, S> {
    fn oracle_version(&self) -> u16 {
        self.inner.oracle_version()
    }

    fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, VisionError> {
        let foreground = self.foreground(image)?;
        self.inner.extract(&foreground)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{Instance, Mask};
    use image::{Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            let v = ((x * 7 + y * 3) % 256) as u8;
            Rgba([v, v, v, 255])
        }))
    }

    #[test]
    fn thumbnail_is_deterministic_and_normalized() {
        let extractor = ThumbnailExtractor::new(8);
        let image = gradient(64, 48);

        let a = extractor.extract(&image).unwrap();
        let b = extractor.extract(&image).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), extractor.dimension());
        assert_eq!(a.oracle_version(), ThumbnailExtractor::ORACLE_VERSION);
        assert!((a.norm() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn empty_image_is_rejected() {
        let extractor = ThumbnailExtractor::default();
        assert!(matches!(
            extractor.extract(&DynamicImage::new_rgba8(0, 0)),
            Err(VisionError::InvalidImage { .. })
        ));
    }

    struct CenterSquare {
        depth: Option<Mask>,
    }

    impl Segmenter for CenterSquare {
        fn detect_instances(&self, image: &DynamicImage) -> Result<Vec<Instance>, VisionError> {
            let (w, h) = image.dimensions();
            let mask = Mask::from_fn(w, h, |x, y| x >= 20 && x < 40 && y >= 20 && y < 40);
            Ok(Instance::from_mask(mask, 1.0).into_iter().collect())
        }

        fn mask_at(
            &self,
            _point: (u32, u32),
            _image: &DynamicImage,
        ) -> Result<Option<Mask>, VisionError> {
            Ok(None)
        }

        fn depth_mask(&self, _image: &DynamicImage) -> Result<Option<Mask>, VisionError> {
            Ok(self.depth.clone())
        }
    }

    #[test]
    fn foreground_is_cropped_to_the_center_object() {
        let extractor = ForegroundExtractor::new(
            ThumbnailExtractor::new(4),
            CenterSquare { depth: None },
            Isolator::default(),
        );
        let foreground = extractor.foreground(&gradient(60, 60)).unwrap();
        // 20px square grown by 15% (3px) on each side
        assert_eq!(foreground.dimensions(), (26, 26));
        assert!(extractor.extract(&gradient(60, 60)).is_ok());
    }

    /// Detects nothing, but answers point prompts with the square under the point
    struct PointOnly;

    impl Segmenter for PointOnly {
        fn detect_instances(&self, _image: &DynamicImage) -> Result<Vec<Instance>, VisionError> {
            Ok(Vec::new())
        }

        fn mask_at(
            &self,
            (px, py): (u32, u32),
            image: &DynamicImage,
        ) -> Result<Option<Mask>, VisionError> {
            let (w, h) = image.dimensions();
            let square = |x: u32, y: u32| x >= 20 && x < 40 && y >= 20 && y < 40;
            Ok(square(px, py).then(|| Mask::from_fn(w, h, square)))
        }
    }

    #[test]
    fn center_point_mask_is_used_when_nothing_is_detected() {
        let extractor =
            ForegroundExtractor::new(ThumbnailExtractor::new(4), PointOnly, Isolator::default());
        assert_eq!(extractor.foreground(&gradient(60, 60)).unwrap().dimensions(), (26, 26));

        // Point prompt misses the square: whole frame
        assert_eq!(extractor.foreground(&gradient(90, 90)).unwrap().dimensions(), (90, 90));
    }

    #[test]
    fn disagreeing_masks_fail_the_frame() {
        let depth = Mask::from_fn(60, 60, |x, _| x < 10);
        let extractor = ForegroundExtractor::new(
            ThumbnailExtractor::new(4),
            CenterSquare { depth: Some(depth) },
            Isolator::default(),
        );
        assert!(matches!(
            extractor.extract(&gradient(60, 60)),
            Err(VisionError::ExtractionFailed { .. })
        ));
    }
}
