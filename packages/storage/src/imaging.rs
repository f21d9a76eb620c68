//! Upload validation and thumbnail generation for gallery images.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_THUMBNAIL_MAX: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("file is empty")]
    Empty,
    #[error("file is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("content type {0} is not allowed")]
    UnsupportedType(String),
    #[error("file could not be decoded as an image: {0}")]
    Undecodable(String),
    #[error("thumbnail could not be encoded: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPolicy {
    pub max_file_size: usize,
    pub allowed_types: Vec<String>,
    pub thumbnail_max: u32,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
            thumbnail_max: DEFAULT_THUMBNAIL_MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub thumbnail: Vec<u8>,
}

impl ProcessedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

impl UploadPolicy {
    /// Checks size and declared type before any decoding happens.
    pub fn check(&self, content_type: &str, size: usize) -> Result<(), UploadRejection> {
        if size == 0 {
            return Err(UploadRejection::Empty);
        }
        if size > self.max_file_size {
            return Err(UploadRejection::TooLarge {
                size,
                max: self.max_file_size,
            });
        }
        let content_type = normalize_type(content_type);
        if !self
            .allowed_types
            .iter()
            .any(|allowed| normalize_type(allowed) == content_type)
        {
            return Err(UploadRejection::UnsupportedType(content_type));
        }
        Ok(())
    }

    /// Validates, decodes and thumbnails one upload. CPU bound; run it on a
    /// blocking thread.
    pub fn process(&self, bytes: &[u8], content_type: &str) -> Result<ProcessedImage, UploadRejection> {
        self.check(content_type, bytes.len())?;

        let format = match ImageFormat::from_mime_type(normalize_type(content_type)) {
            Some(format) => format,
            None => image::guess_format(bytes)
                .map_err(|e| UploadRejection::Undecodable(e.to_string()))?,
        };

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| UploadRejection::Undecodable(e.to_string()))?;
        let (width, height) = decoded.dimensions();

        let thumbnail = if width <= self.thumbnail_max && height <= self.thumbnail_max {
            decoded
        } else {
            decoded.thumbnail(self.thumbnail_max, self.thumbnail_max)
        };

        Ok(ProcessedImage {
            width,
            height,
            format,
            thumbnail: encode(&thumbnail, format)?,
        })
    }
}

fn normalize_type(content_type: &str) -> String {
    let base = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match base.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => base,
    }
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, UploadRejection> {
    let mut out = Cursor::new(Vec::new());
    let result = match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut out, format),
        ImageFormat::WebP => DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut out, format),
        _ => image.write_to(&mut out, format),
    };
    result.map_err(|e| UploadRejection::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn thumbnails_fit_the_bounding_box() {
        let policy = UploadPolicy::default();
        let processed = policy.process(&png(640, 480), "image/png").unwrap();
        assert_eq!((processed.width, processed.height), (640, 480));
        assert_eq!(processed.content_type(), "image/png");

        let thumb = image::load_from_memory(&processed.thumbnail).unwrap();
        assert_eq!(thumb.dimensions(), (300, 225));
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let processed = UploadPolicy::default()
            .process(&png(120, 40), "image/png")
            .unwrap();
        let thumb = image::load_from_memory(&processed.thumbnail).unwrap();
        assert_eq!(thumb.dimensions(), (120, 40));
    }

    #[test]
    fn jpeg_thumbnails_drop_alpha() {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(400, 400))
            .write_to(&mut out, ImageFormat::Jpeg)
            .unwrap();
        let processed = UploadPolicy::default()
            .process(out.get_ref(), "image/jpg")
            .unwrap();
        assert_eq!(processed.format, ImageFormat::Jpeg);
        let thumb = image::load_from_memory(&processed.thumbnail).unwrap();
        assert_eq!(thumb.dimensions(), (300, 300));
    }

    #[test]
    fn rejects_by_policy() {
        let policy = UploadPolicy {
            max_file_size: 16,
            ..UploadPolicy::default()
        };
        assert_eq!(policy.check("image/png", 0), Err(UploadRejection::Empty));
        assert_eq!(
            policy.check("image/png", 17),
            Err(UploadRejection::TooLarge { size: 17, max: 16 })
        );
        assert_eq!(
            policy.check("image/gif", 10),
            Err(UploadRejection::UnsupportedType("image/gif".into()))
        );
        assert_eq!(policy.check("IMAGE/PNG; charset=binary", 10), Ok(()));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let result = UploadPolicy::default().process(b"definitely not a png", "image/png");
        assert!(matches!(result, Err(UploadRejection::Undecodable(_))));
    }
}
