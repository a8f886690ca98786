use crate::foundation::core::Canvas;
use crate::foundation::error::{StageError, StageResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// Owned raster in premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    /// Fully transparent image.
    pub fn transparent(width: u32, height: u32) -> StageResult<Self> {
        let len = Canvas::new(width, height)?.rgba_len()?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Image filled with one premultiplied colour.
    pub fn filled(width: u32, height: u32, premul: [u8; 4]) -> StageResult<Self> {
        let mut img = Self::transparent(width, height)?;
        for px in img.data.chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
        Ok(img)
    }

    /// Wrap premultiplied bytes, checking the length against the dimensions.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> StageResult<Self> {
        let len = Canvas::new(width, height)?.rgba_len()?;
        if data.len() != len {
            return Err(StageError::compositing(format!(
                "raster byte len {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as a [`Canvas`].
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Premultiplied pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume into premultiplied pixel bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Premultiplied pixel at `(x, y)`; transparent outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Straight-alpha copy for encoders and image-crate interop.
    pub fn to_straight_rgba8(&self) -> image::RgbaImage {
        let mut raw = self.data.clone();
        unpremultiply_rgba8_in_place(&mut raw);
        image::RgbaImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }
}

/// Per-pixel transparency mask isolating the subject.
///
/// Only the alpha channel is meaningful; it is zero outside the detected subject.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaMatte(RasterImage);

impl AlphaMatte {
    /// Wrap a raster whose alpha channel is the mask.
    pub fn new(raster: RasterImage) -> Self {
        Self(raster)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.0.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.0.height
    }

    /// Mask value at `(x, y)`.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.0.pixel(x, y)[3]
    }

    /// Number of pixels with non-zero mask.
    pub fn coverage(&self) -> usize {
        self.0.data.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    /// Resample the mask to `width x height`.
    pub fn resized(&self, width: u32, height: u32) -> StageResult<Self> {
        if width == self.0.width && height == self.0.height {
            return Ok(self.clone());
        }
        let alpha: Vec<u8> = self.0.data.chunks_exact(4).map(|px| px[3]).collect();
        let luma = image::GrayImage::from_raw(self.0.width, self.0.height, alpha)
            .ok_or_else(|| StageError::compositing("matte buffer size mismatch"))?;
        let scaled =
            image::imageops::resize(&luma, width, height, image::imageops::FilterType::Triangle);
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for a in scaled.into_raw() {
            data.extend_from_slice(&[0, 0, 0, a]);
        }
        Ok(Self(RasterImage::from_premul(width, height, data)?))
    }

    /// Borrow the underlying raster.
    pub fn as_raster(&self) -> &RasterImage {
        &self.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/raster.rs"]
mod tests;
