//! Seam to the background-removal collaborator.

use anyhow::Context;

use crate::assets::decode::{decode_image, has_transparency};
use crate::assets::loader::AssetSource;
use crate::assets::raster::{AlphaMatte, RasterImage};
use crate::foundation::error::{StageError, StageResult};

/// Produces an alpha matte isolating the subject of an encoded photo.
pub trait MatteExtractor: Send + Sync {
    /// Extract the matte for `image_bytes` (the original encoded product photo).
    fn extract_matte(&self, image_bytes: &[u8]) -> anyhow::Result<AlphaMatte>;
}

/// Uses the photo's own alpha channel, for products that were already cut out.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedAlphaMatte;

impl MatteExtractor for EmbeddedAlphaMatte {
    fn extract_matte(&self, image_bytes: &[u8]) -> anyhow::Result<AlphaMatte> {
        let img = decode_image(image_bytes).context("decode product photo for its alpha")?;
        if !has_transparency(&img) {
            anyhow::bail!("product photo has no transparency to use as a matte");
        }
        Ok(AlphaMatte::new(img))
    }
}

/// A matte produced out of band (e.g. the matting service's output file).
#[derive(Clone, Debug)]
pub struct StaticMatte {
    source: AssetSource,
}

impl StaticMatte {
    /// Matte read from `source` on every extraction.
    pub fn new(source: AssetSource) -> Self {
        Self { source }
    }
}

impl MatteExtractor for StaticMatte {
    fn extract_matte(&self, _image_bytes: &[u8]) -> anyhow::Result<AlphaMatte> {
        let bytes = self
            .source
            .fetch_bytes()
            .with_context(|| format!("fetch matte '{}'", self.source.describe()))?;
        let img = decode_image(&bytes).context("decode matte")?;
        Ok(AlphaMatte::new(img))
    }
}

/// Run the extractor and make its result usable for `photo`.
///
/// A matte of a different size is resampled to the photo; a matte without any coverage is
/// rejected.
pub fn extract_for(
    extractor: &dyn MatteExtractor,
    photo_bytes: &[u8],
    photo: &RasterImage,
) -> StageResult<AlphaMatte> {
    let matte = extractor
        .extract_matte(photo_bytes)
        .map_err(StageError::matte)?;
    let matte = if (matte.width(), matte.height()) != (photo.width(), photo.height()) {
        tracing::warn!(
            matte_w = matte.width(),
            matte_h = matte.height(),
            photo_w = photo.width(),
            photo_h = photo.height(),
            "matte size differs from photo, resampling"
        );
        matte
            .resized(photo.width(), photo.height())
            .map_err(|e| StageError::matte(anyhow::Error::from(e)))?
    } else {
        matte
    };
    if matte.coverage() == 0 {
        return Err(StageError::matte(anyhow::anyhow!(
            "matte has no foreground coverage"
        )));
    }
    Ok(matte)
}

/// Apply the matte to the photo, producing the premultiplied foreground cutout.
///
/// The matte replaces the photo's alpha, so a matte taken from the photo itself is a no-op.
pub fn cut_out(photo: &RasterImage, matte: &AlphaMatte) -> StageResult<RasterImage> {
    let matte = matte.as_raster();
    if photo.canvas() != matte.canvas() {
        return Err(StageError::compositing("matte and photo sizes differ"));
    }
    crate::effects::composite::replace_alpha(photo, matte)
}

#[cfg(test)]
#[path = "../tests/unit/matte/matte.rs"]
mod tests;
