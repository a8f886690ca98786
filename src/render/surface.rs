//! Portable drawing primitives over canvas-sized premultiplied layers.
//!
//! Every primitive draws into a fresh transparent layer; callers combine layers with
//! [`crate::effects::composite`] so opacity and blend stay explicit at the call site.

use std::sync::Arc;

use vello_cpu::kurbo::Shape as _;

use crate::assets::raster::RasterImage;
use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgba8};
use crate::foundation::error::{StageError, StageResult};

/// Render one layer with a scratch `vello_cpu` context.
pub(crate) fn render_layer(
    canvas: Canvas,
    draw: impl FnOnce(&mut vello_cpu::RenderContext) -> StageResult<()>,
) -> StageResult<RasterImage> {
    let (w, h) = canvas_u16(canvas)?;
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    draw(&mut ctx)?;
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    RasterImage::from_premul(canvas.width, canvas.height, pixmap.data_as_u8_slice().to_vec())
}

/// Draw `image` through `transform` (image pixel space -> canvas space).
pub fn draw_image(canvas: Canvas, image: &RasterImage, transform: Affine) -> StageResult<RasterImage> {
    let paint = image_paint(image)?;
    render_layer(canvas, |ctx| {
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width()),
            f64::from(image.height()),
        ));
        Ok(())
    })
}

/// Fill an axis-aligned ellipse.
pub fn fill_ellipse(
    canvas: Canvas,
    center: Point,
    radii: (f64, f64),
    color: Rgba8,
) -> StageResult<RasterImage> {
    render_layer(canvas, |ctx| {
        let ellipse = vello_cpu::kurbo::Ellipse::new(
            vello_cpu::kurbo::Point::new(center.x, center.y),
            vello_cpu::kurbo::Vec2::new(radii.0.max(0.0), radii.1.max(0.0)),
            0.0,
        );
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(to_cpu_color(color));
        ctx.fill_path(&ellipse.to_path(0.1));
        Ok(())
    })
}

/// Fill a rounded rectangle.
pub fn fill_rounded_rect(
    canvas: Canvas,
    rect: Rect,
    radius: f64,
    color: Rgba8,
) -> StageResult<RasterImage> {
    render_layer(canvas, |ctx| {
        let rr = vello_cpu::kurbo::RoundedRect::new(rect.x0, rect.y0, rect.x1, rect.y1, radius.max(0.0));
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(to_cpu_color(color));
        ctx.fill_path(&rr.to_path(0.1));
        Ok(())
    })
}

/// Crop `src` to the canvas-space `rect` and place it back at the same position on a
/// transparent layer (everything outside `rect` cleared).
pub fn keep_region(src: &RasterImage, rect: Rect) -> StageResult<RasterImage> {
    let mut out = RasterImage::transparent(src.width(), src.height())?;
    let x0 = rect.x0.floor().clamp(0.0, f64::from(src.width())) as usize;
    let x1 = rect.x1.ceil().clamp(0.0, f64::from(src.width())) as usize;
    let y0 = rect.y0.floor().clamp(0.0, f64::from(src.height())) as u32;
    let y1 = rect.y1.ceil().clamp(0.0, f64::from(src.height())) as u32;
    if x0 >= x1 || y0 >= y1 {
        return Ok(out);
    }
    let w = src.width() as usize;
    for y in y0..y1 {
        let start = ((y as usize) * w + x0) * 4;
        let end = ((y as usize) * w + x1) * 4;
        out.data_mut()[start..end].copy_from_slice(&src.data()[start..end]);
    }
    Ok(out)
}

pub(crate) fn to_cpu_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn canvas_u16(canvas: Canvas) -> StageResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| StageError::compositing("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| StageError::compositing("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn image_paint(image: &RasterImage) -> StageResult<vello_cpu::Image> {
    let (w, h) = canvas_u16(image.canvas())?;
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = image
        .data()
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
