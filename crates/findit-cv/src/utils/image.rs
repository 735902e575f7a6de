//! Image loading and debug output

use crate::Result;
use crate::error::VisionError;
use crate::mask::Mask;
use anyhow::Context;
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Image helpers shared by the CLI and tests
pub struct ImageUtils;

impl ImageUtils {
    /// Load an image file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        image::open(&path).with_context(|| format!("Failed to open image: {:?}", path.as_ref()))
    }

    /// Decode an encoded image held in memory, e.g. a camera frame
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<DynamicImage, VisionError> {
        image::load_from_memory(bytes).map_err(|e| VisionError::invalid_image(e.to_string()))
    }

    /// Save an image, format picked from the extension
    pub fn save_image<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<()> {
        image
            .save(&path)
            .with_context(|| format!("Failed to save image: {:?}", path.as_ref()))
    }

    /// Write a mask as a black and white image for inspection
    pub fn save_mask<P: AsRef<Path>>(mask: &Mask, path: P) -> Result<()> {
        mask.to_luma()
            .save(&path)
            .with_context(|| format!("Failed to save mask: {:?}", path.as_ref()))
    }

    /// Image files directly inside `dir`, sorted by name
    pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();

        let entries =
            std::fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?;
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "gif" | "webp")
                });
            if path.is_file() && is_image {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }
}
