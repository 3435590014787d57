use crate::config::ImageTarget;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{imageops::FilterType, DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder};

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image target must allow at least one pixel")]
    EmptyTarget,
}

/// Cover art as a JPEG data URL, downscaled to fit the target.
pub fn encode_cover(bytes: &[u8], target: ImageTarget) -> Result<String, ImageError> {
    let rgb = downscale(decode(bytes)?, target.max_dimension)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, jpeg_quality(target.quality))
        .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(ImageError::Encode)?;
    log::debug!("encoded cover {}x{} into {} bytes", width, height, jpeg.len());
    Ok(data_url("image/jpeg", &jpeg))
}

/// Sticker art as a PNG data URL. Transparency is kept; PNG is lossless so
/// the target quality does not apply.
pub fn encode_sticker(bytes: &[u8], target: ImageTarget) -> Result<String, ImageError> {
    let rgba = downscale(decode(bytes)?, target.max_dimension)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(ImageError::Encode)?;
    log::debug!("encoded sticker {}x{} into {} bytes", width, height, png.len());
    Ok(data_url("image/png", &png))
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes).map_err(ImageError::Decode)
}

/// Never upscales.
fn downscale(image: DynamicImage, max_dimension: u32) -> Result<DynamicImage, ImageError> {
    if max_dimension == 0 {
        return Err(ImageError::EmptyTarget);
    }
    let (width, height) = image.dimensions();
    let (target_width, target_height) = fit_within(width, height, max_dimension);
    if (target_width, target_height) == (width, height) {
        return Ok(image);
    }
    Ok(image.resize_exact(target_width, target_height, FilterType::Triangle))
}

fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    let scale = f64::from(max_dimension) / f64::from(width.max(height));
    let ceiling = max_dimension.max(1);
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, ceiling);
    (scaled(width), scaled(height))
}

fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}
