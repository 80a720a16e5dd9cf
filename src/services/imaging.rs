use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine};
use image::codecs::jpeg::JpegEncoder;

use crate::models::FoodImage;

pub const MAX_DIMENSION: u32 = 512;
pub const JPEG_QUALITY: u8 = 80;

/// Check that the upload is a picture we can decode. Returns its dimensions.
pub fn check_decodable(image: &FoodImage) -> Result<(u32, u32)> {
    let decoded = image::load_from_memory(&image.bytes).context("Could not decode uploaded image")?;
    Ok((decoded.width(), decoded.height()))
}

/// Decode the upload, bound it to `MAX_DIMENSION` on both sides and re-encode as JPEG.
pub fn normalize_image(image: &FoodImage) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(&image.bytes).context("Could not decode uploaded image")?;
    log::debug!("🖼️ Decoded image: {}x{}", decoded.width(), decoded.height());

    let bounded = if decoded.width() > MAX_DIMENSION || decoded.height() > MAX_DIMENSION {
        decoded.thumbnail(MAX_DIMENSION, MAX_DIMENSION)
    } else {
        decoded
    };

    let rgb = bounded.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .context("Could not re-encode image as JPEG")?;

    log::debug!(
        "📊 Image normalized: {} bytes -> {} bytes ({}x{})",
        image.bytes.len(),
        jpeg.len(),
        rgb.width(),
        rgb.height()
    );

    Ok(jpeg)
}

/// Normalized image as an inline `data:` URL for `image_url` message parts.
pub fn to_data_url(image: &FoodImage) -> Result<String> {
    let jpeg = normalize_image(image)?;
    let encoded = general_purpose::STANDARD.encode(&jpeg);
    Ok(format!("data:image/jpeg;base64,{}", encoded))
}
