use anyhow::Context;

use crate::assets::raster::RasterImage;
use crate::foundation::math::premultiply_rgba8_in_place;

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> anyhow::Result<RasterImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    RasterImage::from_premul(width, height, rgba8_premul).map_err(anyhow::Error::from)
}

/// `true` when the encoded image carries any pixel with alpha below 255.
pub(crate) fn has_transparency(img: &RasterImage) -> bool {
    img.data().chunks_exact(4).any(|px| px[3] != 255)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
