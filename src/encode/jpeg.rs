use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;

use crate::assets::raster::RasterImage;
use crate::foundation::error::{StageError, StageResult};

/// Map a `(0, 1]` quality to the encoder's 1..=100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode `img` as JPEG, flattening transparency over black.
///
/// Over black the flattened colour equals the premultiplied colour, so channels are copied as is.
pub fn encode_jpeg(img: &RasterImage, quality: f32) -> StageResult<Vec<u8>> {
    let rgb: Vec<u8> = img
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, jpeg_quality(quality))
        .encode(&rgb, img.width(), img.height(), image::ExtendedColorType::Rgb8)
        .context("encode jpeg")
        .map_err(StageError::Compositing)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/jpeg.rs"]
mod tests;
