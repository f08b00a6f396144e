//! # Image Processing Module
//!
//! Questo modulo gestisce la ricodifica in-memory di tutti i formati immagine
//! supportati.
//!
//! ## Responsabilità:
//! - Decodifica bytes immagine (JPEG/PNG/WebP)
//! - Ridimensionamento downscale-only con filtro Lanczos3
//! - Ricodifica JPEG alla qualità configurata
//! - Ricodifica PNG a compressione massima, o conversione PNG → JPEG
//! - Ricodifica WebP lossless
//!
//! ## Pipeline:
//! 1. Decodifica i bytes sorgente (errore = file corrotto/illeggibile)
//! 2. Se il lato più lungo supera `max_resolution`, ridimensiona preservando
//!    l'aspect ratio; mai upscaling
//! 3. Ricodifica nel formato di output e ritorna i bytes
//!
//! La conversione PNG → JPEG appiattisce il canale alfa (JPEG non lo
//! supporta) e segnala la nuova estensione al chiamante, che rinomina
//! l'artefatto di output. I tag EXIF vengono re-iniettati a valle dal
//! Metadata Preserver.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageEncoder};

use crate::config::RunConfig;
use crate::error::OptimizeError;

/// Result of an in-memory image optimization
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Set when the output format differs from the source (PNG → JPEG)
    pub renamed_extension: Option<&'static str>,
}

/// Handles image optimization
#[derive(Clone)]
pub struct ImageProcessor {
    config: RunConfig,
}

impl ImageProcessor {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Re-encode raw image bytes according to the run configuration.
    /// Fails for unreadable or corrupt input; never touches the filesystem.
    pub fn optimize(&self, bytes: &[u8], extension: &str) -> Result<OptimizedImage, OptimizeError> {
        let img = image::load_from_memory(bytes)?;
        let img = self.downscale(img);
        let (width, height) = img.dimensions();

        let (encoded, renamed_extension) = match extension {
            "jpg" | "jpeg" => (self.encode_jpeg(&img)?, None),
            "png" if self.config.convert_png_to_jpeg => (self.encode_jpeg(&img)?, Some("jpg")),
            "png" => (self.encode_png(&img)?, None),
            "webp" => (self.encode_webp(&img)?, None),
            other => {
                return Err(OptimizeError::UnsupportedFormat(format!(
                    "not an image extension: {other:?}"
                )))
            }
        };

        Ok(OptimizedImage {
            bytes: encoded,
            width,
            height,
            renamed_extension,
        })
    }

    /// Shrink the image so its longest edge fits `max_resolution`.
    /// Smaller originals pass through untouched.
    fn downscale(&self, img: DynamicImage) -> DynamicImage {
        match self.config.max_resolution {
            Some(max) if img.width().max(img.height()) > max => {
                img.resize(max, max, FilterType::Lanczos3)
            }
            _ => img,
        }
    }

    fn encode_jpeg(&self, img: &DynamicImage) -> Result<Vec<u8>, OptimizeError> {
        // JPEG has no alpha channel
        let rgb = img.to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality).encode_image(&rgb)?;
        Ok(buf)
    }

    fn encode_png(&self, img: &DynamicImage) -> Result<Vec<u8>, OptimizeError> {
        let rgba = img.to_rgba8();
        let mut buf = Vec::new();
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive)
            .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)?;
        Ok(buf)
    }

    fn encode_webp(&self, img: &DynamicImage) -> Result<Vec<u8>, OptimizeError> {
        let rgba = img.to_rgba8();
        let mut buf = Vec::new();
        WebPEncoder::new_lossless(&mut buf).encode(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ColorType::Rgba8,
        )?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    fn config(max_resolution: Option<u32>) -> RunConfig {
        RunConfig {
            max_resolution,
            ..Default::default()
        }
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 80, 40]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Jpeg(90)).unwrap();
        buf.into_inner()
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([10, 200, 90]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_downscale_only_shrinks_large_images() {
        let processor = ImageProcessor::new(config(Some(100)));
        let result = processor.optimize(&jpeg_bytes(300, 200), "jpg").unwrap();

        assert_eq!(result.width.max(result.height), 100);
        // Aspect ratio preserved: 300x200 -> 100x66
        assert!(result.width == 100 && result.height < 100);
        assert!(result.renamed_extension.is_none());
    }

    #[test]
    fn test_downscale_never_upscales() {
        let processor = ImageProcessor::new(config(Some(1920)));
        let result = processor.optimize(&jpeg_bytes(120, 80), "jpg").unwrap();

        assert_eq!((result.width, result.height), (120, 80));
    }

    #[test]
    fn test_no_resize_without_max_resolution() {
        let processor = ImageProcessor::new(config(None));
        let result = processor.optimize(&jpeg_bytes(640, 480), "jpeg").unwrap();

        assert_eq!((result.width, result.height), (640, 480));
    }

    #[test]
    fn test_png_to_jpeg_conversion_renames() {
        let mut cfg = config(None);
        cfg.convert_png_to_jpeg = true;
        let processor = ImageProcessor::new(cfg);

        let result = processor.optimize(&png_bytes(64, 64), "png").unwrap();
        assert_eq!(result.renamed_extension, Some("jpg"));
        // JPEG magic bytes
        assert_eq!(&result.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_png_stays_png_by_default() {
        let processor = ImageProcessor::new(config(None));
        let result = processor.optimize(&png_bytes(64, 64), "png").unwrap();

        assert!(result.renamed_extension.is_none());
        assert_eq!(&result.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_webp_roundtrip() {
        let processor = ImageProcessor::new(config(Some(32)));
        let png = png_bytes(64, 48);
        let webp_src = {
            let img = image::load_from_memory(&png).unwrap();
            let mut buf = Vec::new();
            WebPEncoder::new_lossless(&mut buf)
                .encode(
                    img.to_rgba8().as_raw(),
                    img.width(),
                    img.height(),
                    ColorType::Rgba8,
                )
                .unwrap();
            buf
        };

        let result = processor.optimize(&webp_src, "webp").unwrap();
        assert_eq!(result.width.max(result.height), 32);
    }

    #[test]
    fn test_corrupt_input_is_an_error() {
        let processor = ImageProcessor::new(config(None));
        let err = processor.optimize(b"definitely not an image", "jpg");
        assert!(matches!(err, Err(OptimizeError::Image(_))));
    }

    #[test]
    fn test_non_image_extension_rejected() {
        let processor = ImageProcessor::new(config(None));
        let err = processor.optimize(&jpeg_bytes(8, 8), "mp4");
        assert!(matches!(err, Err(OptimizeError::UnsupportedFormat(_))));
    }
}
