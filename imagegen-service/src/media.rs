//! Raster codec for uploads and transport encoding.
//!
//! Every image entering or leaving the service passes through here: uploads
//! are decoded and normalized to RGB, backend output is decoded the same way,
//! and responses carry lossless PNG as base64 text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use service_core::error::AppError;
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Undecodable image data: {0}")]
    Undecodable(String),

    #[error("Invalid base64 image payload: {0}")]
    Base64(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        AppError::InvalidMedia(anyhow::Error::new(err))
    }
}

/// Decode raw bytes into a normalized RGB image.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, MediaError> {
    let image =
        image::load_from_memory(bytes).map_err(|e| MediaError::Undecodable(e.to_string()))?;
    Ok(normalize(image))
}

/// Normalize any decoded image to RGB. Alpha channels are composited onto an
/// opaque white background at full size; other modes convert directly.
/// Idempotent: normalizing an RGB image returns it unchanged.
pub fn normalize(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other if other.color().has_alpha() => flatten_onto_white(other.to_rgba8()),
        other => other.to_rgb8(),
    }
}

fn flatten_onto_white(rgba: RgbaImage) -> RgbImage {
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u32::from(pixel[3]);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    out
}

/// Serialize to a lossless PNG container.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, MediaError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| MediaError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// PNG bytes, base64-encoded for JSON transport.
pub fn to_base64(image: &RgbImage) -> Result<String, MediaError> {
    Ok(BASE64.encode(encode_png(image)?))
}

pub fn from_base64(data: &str) -> Result<RgbImage, MediaError> {
    let bytes = BASE64
        .decode(data)
        .map_err(|e| MediaError::Base64(e.to_string()))?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checkerboard() -> RgbImage {
        RgbImage::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        })
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, MediaError::Undecodable(_)));
    }

    #[test]
    fn normalize_is_idempotent() {
        let rgba = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 128]));
        let once = normalize(DynamicImage::ImageRgba8(rgba));
        let twice = normalize(DynamicImage::ImageRgb8(once.clone()));
        assert_eq!(once, twice);
    }

    #[test]
    fn alpha_composites_onto_white() {
        // Fully transparent pixels become pure white, opaque ones keep their
        // color.
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 128, 0, 255]));
        rgba.put_pixel(1, 0, Rgba([0, 128, 0, 0]));

        let rgb = normalize(DynamicImage::ImageRgba8(rgba));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([0, 128, 0]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn png_round_trip_is_pixel_identical() {
        let original = checkerboard();
        let decoded = decode(&encode_png(&original).unwrap()).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn base64_round_trip_is_pixel_identical() {
        let original = checkerboard();
        let restored = from_base64(&to_base64(&original).unwrap()).unwrap();
        assert_eq!(original, restored);
    }
}
