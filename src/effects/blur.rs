use rayon::prelude::*;

use crate::assets::raster::RasterImage;
use crate::foundation::error::{StageError, StageResult};

/// Separable Gaussian blur over premultiplied RGBA8 with edge clamping.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> StageResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| StageError::compositing("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(StageError::compositing(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

/// Blur `img` in place the way a 2-D canvas `blur(px)` shadow does: kernel radius `px`,
/// sigma `px / 2`.
///
/// Only the bounding box of visible pixels (grown by the radius) is processed.
pub fn blur_in_place(img: &mut RasterImage, blur_px: f32) -> StageResult<()> {
    if !blur_px.is_finite() || blur_px < 0.0 {
        return Err(StageError::validation("blur radius must be finite and >= 0"));
    }
    let (w, h) = (img.width(), img.height());
    // Taps past the image edge only repeat clamped pixels.
    let radius = (blur_px.ceil() as u32).min(w.max(h));
    if radius == 0 {
        return Ok(());
    }
    let sigma = (blur_px / 2.0).max(0.5);

    let Some((x0, y0, x1, y1)) = visible_bounds(img) else {
        return Ok(());
    };
    let rx0 = x0.saturating_sub(radius);
    let ry0 = y0.saturating_sub(radius);
    let rx1 = (x1 + radius).min(w - 1);
    let ry1 = (y1 + radius).min(h - 1);
    let rw = rx1 - rx0 + 1;
    let rh = ry1 - ry0 + 1;

    let mut region = Vec::with_capacity((rw as usize) * (rh as usize) * 4);
    for y in ry0..=ry1 {
        let start = ((y as usize) * (w as usize) + rx0 as usize) * 4;
        region.extend_from_slice(&img.data()[start..start + (rw as usize) * 4]);
    }
    let blurred = blur_rgba8_premul(&region, rw, rh, radius, sigma)?;

    let data = img.data_mut();
    for (row, y) in (ry0..=ry1).enumerate() {
        let dst = ((y as usize) * (w as usize) + rx0 as usize) * 4;
        let src = row * (rw as usize) * 4;
        data[dst..dst + (rw as usize) * 4].copy_from_slice(&blurred[src..src + (rw as usize) * 4]);
    }
    Ok(())
}

fn visible_bounds(img: &RasterImage) -> Option<(u32, u32, u32, u32)> {
    let w = img.width() as usize;
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (i, px) in img.data().chunks_exact(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let (x, y) = ((i % w) as u32, (i / w) as u32);
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> StageResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(StageError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(StageError::compositing("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let row_bytes = (width as usize) * 4;
    dst.par_chunks_mut(row_bytes)
        .zip(src.par_chunks(row_bytes))
        .for_each(|(out_row, in_row)| {
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                    let idx = (sx as usize) * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(in_row[idx + c]);
                    }
                }
                let o = (x as usize) * 4;
                for c in 0..4 {
                    out_row[o + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as usize;
    let h = height as i32;
    dst.par_chunks_mut(w * 4)
        .enumerate()
        .for_each(|(y, out_row)| {
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sy = (y as i32 + ki as i32 - radius).clamp(0, h - 1);
                    let idx = ((sy as usize) * w + x) * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                    }
                }
                for c in 0..4 {
                    out_row[x * 4 + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
