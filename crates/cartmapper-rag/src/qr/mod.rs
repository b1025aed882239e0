//! QR code decoding for uploaded or linked images

use base64::Engine;
use image::{DynamicImage, GrayImage};

use crate::error::{Error, Result};

/// Decodes the first readable QR code in an image
pub struct QrDecoder;

impl QrDecoder {
    /// Decode base64-encoded image bytes
    pub fn decode_base64(encoded: &str) -> Result<Option<String>> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidImage(format!("Invalid base64 data: {}", e)))?;
        Self::decode_bytes(&data)
    }

    /// Decode encoded image bytes (PNG, JPEG, ...)
    pub fn decode_bytes(data: &[u8]) -> Result<Option<String>> {
        let image = image::load_from_memory(data).map_err(|e| Error::InvalidImage(e.to_string()))?;
        Self::decode_image(&image)
    }

    /// Decode an in-memory image.
    ///
    /// Returns `Ok(None)` when no QR code is detected or every detected
    /// grid fails to decode.
    pub fn decode_image(image: &DynamicImage) -> Result<Option<String>> {
        let gray = Self::normalize(image);
        let (width, height) = gray.dimensions();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| gray.get_pixel(x as u32, y as u32).0[0],
        );

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            tracing::debug!("No QR grid detected in {}x{} image", width, height);
            return Ok(None);
        }

        for grid in grids {
            match grid.decode() {
                Ok((_, content)) if !content.is_empty() => return Ok(Some(content)),
                Ok(_) => tracing::debug!("Detected QR grid has an empty payload"),
                Err(e) => tracing::debug!("Detected QR grid could not be decoded: {}", e),
            }
        }

        Ok(None)
    }

    /// Convert any color layout to 8-bit grayscale.
    ///
    /// Alpha is dropped before the luminance conversion; deeper sample
    /// types are scaled down to 8 bits.
    pub fn normalize(image: &DynamicImage) -> GrayImage {
        match image {
            DynamicImage::ImageLuma8(gray) => gray.clone(),
            DynamicImage::ImageRgb8(_) => image.to_luma8(),
            other => DynamicImage::ImageRgb8(other.to_rgb8()).to_luma8(),
        }
    }
}

/// Require an http(s) URL, returning it unchanged
pub fn validate_url(payload: &str) -> Result<&str> {
    if payload.starts_with("http://") || payload.starts_with("https://") {
        Ok(payload)
    } else {
        Err(Error::InvalidQrUrl)
    }
}
