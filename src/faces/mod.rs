//! Face extraction - detector regions turned into padded PNG crops

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Turns a screenshot into face crops, largest face first.
/// An empty list means no face was found.
pub trait FaceExtractor: Send + Sync {
    fn extract(&self, image: &[u8]) -> Result<Vec<Vec<u8>>>;
}

/// Axis-aligned face bounding box in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Grow by `padding` of the size on every side, clamped to the image.
    /// Returns None when the region lies entirely outside the image.
    pub fn padded(&self, padding: f32, image_width: u32, image_height: u32) -> Option<Region> {
        if self.x >= image_width || self.y >= image_height {
            return None;
        }

        let pad_x = (self.width as f32 * padding.max(0.0)) as u32;
        let pad_y = (self.height as f32 * padding.max(0.0)) as u32;

        let x1 = self.x.saturating_sub(pad_x);
        let y1 = self.y.saturating_sub(pad_y);
        let x2 = self
            .x
            .saturating_add(self.width)
            .saturating_add(pad_x)
            .min(image_width);
        let y2 = self
            .y
            .saturating_add(self.height)
            .saturating_add(pad_y)
            .min(image_height);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Region::new(x1, y1, x2 - x1, y2 - y1))
    }
}

/// Finds face bounding boxes in a decoded image
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Region>>;
}

/// Detector that never finds a face; every upload goes through degraded mode
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaceDetector;

impl FaceDetector for NoFaceDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Region>> {
        Ok(Vec::new())
    }
}

/// Crops detector regions out of the screenshot
pub struct CroppingExtractor<D> {
    detector: D,
    padding: f32,
    max_faces: usize,
}

impl<D: FaceDetector> CroppingExtractor<D> {
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            padding: 0.2,
            max_faces: 4,
        }
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_max_faces(mut self, max_faces: usize) -> Self {
        self.max_faces = max_faces;
        self
    }
}

impl<D: FaceDetector> FaceExtractor for CroppingExtractor<D> {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
        let image = image::load_from_memory(bytes).context("Could not decode image")?;
        let (width, height) = image.dimensions();

        let mut regions: Vec<Region> = self
            .detector
            .detect(&image)?
            .into_iter()
            .filter(|r| r.area() > 0)
            .collect();

        if regions.is_empty() {
            tracing::debug!("No faces detected in {}x{} image", width, height);
            return Ok(Vec::new());
        }

        regions.sort_by(|a, b| b.area().cmp(&a.area()));
        regions.truncate(self.max_faces);

        let mut crops = Vec::with_capacity(regions.len());
        for region in regions {
            let Some(area) = region.padded(self.padding, width, height) else {
                continue;
            };
            let face = image.crop_imm(area.x, area.y, area.width, area.height);
            crops.push(encode_png(&face)?);
        }

        tracing::debug!("Detected and cropped {} faces", crops.len());
        Ok(crops)
    }
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("Failed to encode face crop")?;
    Ok(buffer.into_inner())
}
