use crate::assets::raster::RasterImage;
use crate::foundation::error::{StageError, StageResult};
use crate::foundation::math::{add_sat_u8, mul_div255_u8, opacity_u8};

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Separable blend modes supported by layer compositing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Plain source-over.
    #[default]
    Normal,
    /// Multiply or screen depending on the backdrop, as in the 2-D canvas `overlay` mode.
    Overlay,
}

/// Porter-Duff source-over of one pixel with an extra opacity factor.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = opacity_u8(opacity);
    if op == 0 || src[3] == 0 {
        return dst;
    }

    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Composite `src` over `dst` (same dimensions) with `opacity` and `blend`.
pub fn composite_in_place(
    dst: &mut RasterImage,
    src: &RasterImage,
    opacity: f32,
    blend: BlendMode,
) -> StageResult<()> {
    if dst.canvas() != src.canvas() {
        return Err(StageError::compositing(
            "composite_in_place expects layers of equal dimensions",
        ));
    }
    match blend {
        BlendMode::Normal => {
            for (d, s) in dst.data_mut().chunks_exact_mut(4).zip(src.data().chunks_exact(4)) {
                let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
                d.copy_from_slice(&out);
            }
            Ok(())
        }
        BlendMode::Overlay => {
            composite_blend(dst.data_mut(), src.data(), opacity, |s, d| {
                if d <= 0.5 {
                    2.0 * s * d
                } else {
                    1.0 - 2.0 * (1.0 - s) * (1.0 - d)
                }
            });
            Ok(())
        }
    }
}

/// Keep `src` only where `mask` has coverage (`source-in`), scaling by mask alpha.
pub fn mask_by_alpha(src: &RasterImage, mask: &RasterImage) -> StageResult<RasterImage> {
    if src.canvas() != mask.canvas() {
        return Err(StageError::compositing(
            "mask_by_alpha expects layers of equal dimensions",
        ));
    }
    let mut out = src.clone();
    for (d, m) in out.data_mut().chunks_exact_mut(4).zip(mask.data().chunks_exact(4)) {
        let ma = u16::from(m[3]);
        for c in d.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), ma);
        }
    }
    Ok(out)
}

/// Give `src` the alpha of `mask` while keeping its straight colour.
///
/// Pixels transparent in `src` carry no colour and stay transparent.
pub fn replace_alpha(src: &RasterImage, mask: &RasterImage) -> StageResult<RasterImage> {
    if src.canvas() != mask.canvas() {
        return Err(StageError::compositing(
            "replace_alpha expects layers of equal dimensions",
        ));
    }
    let mut out = src.clone();
    for (d, m) in out.data_mut().chunks_exact_mut(4).zip(mask.data().chunks_exact(4)) {
        let sa = u32::from(d[3]);
        let ma = u32::from(m[3]);
        if sa == 0 || ma == 0 {
            d.copy_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        for c in d[..3].iter_mut() {
            *c = ((u32::from(*c) * ma + sa / 2) / sa).min(ma) as u8;
        }
        d[3] = ma as u8;
    }
    Ok(out)
}

#[inline(always)]
fn composite_blend<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend_fn: F)
where
    F: Fn(f32, f32) -> f32,
{
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        // out_a = sa + da * (1 - sa)
        // out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
        let sa = (f32::from(s[3]) / 255.0) * opacity;
        if sa <= 0.0 {
            continue;
        }
        let da = f32::from(d[3]) / 255.0;
        let out_a = (sa + da * (1.0 - sa)).clamp(0.0, 1.0);

        for c in 0..3 {
            let sp = (f32::from(s[c]) / 255.0) * opacity;
            let dp = f32::from(d[c]) / 255.0;
            let sc = (sp / sa).clamp(0.0, 1.0);
            let dc = if da > 0.0 { (dp / da).clamp(0.0, 1.0) } else { 0.0 };
            let b = blend_fn(sc, dc).clamp(0.0, 1.0);
            let out_p = (sp * (1.0 - da) + dp * (1.0 - sa) + b * sa * da).clamp(0.0, 1.0);
            d[c] = (out_p * 255.0).round() as u8;
        }
        d[3] = (out_a * 255.0).round() as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
