//! Title/detail overlay.
//!
//! Text is shaped with Parley against the provisioned font bytes and rasterized with
//! `vello_cpu` glyph runs into canvas-sized layers that are composited onto the buffer.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::assets::color::ColorDef;
use crate::assets::fonts::ResolvedFont;
use crate::assets::raster::RasterImage;
use crate::config::TextConfig;
use crate::effects::blur::blur_in_place;
use crate::effects::composite::{BlendMode, composite_in_place};
use crate::foundation::core::{Affine, Canvas, Rect, Rgba8, Vec2};
use crate::foundation::error::{StageError, StageResult};
use crate::render::surface::{affine_to_cpu, fill_rounded_rect, render_layer, to_cpu_color};

/// Text overlay request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TextStyle {
    /// Headline; empty to omit.
    pub title: String,
    /// Smaller line under the title; empty to omit.
    pub detail: String,
    /// Font identifier resolved by the font provider.
    pub font_family: String,
    /// CSS-like weight.
    pub weight: FontWeightDef,
    /// Title colour, and detail colour when `sub_color` is unset.
    pub main_color: ColorDef,
    /// Detail colour.
    pub sub_color: Option<ColorDef>,
    /// Title size in percent of canvas width, in `(0, 100]`.
    pub font_size_fraction: f64,
    /// Title drop-shadow blur in px; `0` disables the shadow.
    pub shadow_intensity: f64,
    /// Vertical centre of the title in percent of canvas height, in `[0, 100]`.
    pub position_y_fraction: f64,
    /// Optional plate drawn behind the text.
    pub chip: Option<ChipStyle>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            title: String::new(),
            detail: String::new(),
            font_family: "sans-serif".to_string(),
            weight: FontWeightDef::BOLD,
            main_color: ColorDef(Rgba8::rgb(255, 255, 255)),
            sub_color: None,
            font_size_fraction: 8.0,
            shadow_intensity: 0.0,
            position_y_fraction: 82.0,
            chip: None,
        }
    }
}

impl TextStyle {
    /// `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.detail.is_empty()
    }

    /// Check numeric ranges.
    pub fn validate(&self) -> StageResult<()> {
        if !(self.font_size_fraction > 0.0 && self.font_size_fraction <= 100.0) {
            return Err(StageError::validation("fontSizeFraction must be in (0, 100]"));
        }
        if !(self.shadow_intensity.is_finite() && self.shadow_intensity >= 0.0) {
            return Err(StageError::validation("shadowIntensity must be finite and >= 0"));
        }
        if !(0.0..=100.0).contains(&self.position_y_fraction) {
            return Err(StageError::validation("positionYFraction must be in [0, 100]"));
        }
        if !(1.0..=1000.0).contains(&self.weight.0) {
            return Err(StageError::validation("weight must be in [1, 1000]"));
        }
        if let Some(chip) = &self.chip {
            let ok = |v: f64| v.is_finite() && v >= 0.0;
            if !ok(chip.padding_fraction) || !ok(chip.corner_radius_fraction) {
                return Err(StageError::validation(
                    "chip paddingFraction and cornerRadiusFraction must be finite and >= 0",
                ));
            }
        }
        Ok(())
    }
}

/// Rounded plate behind the text block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChipStyle {
    /// Plate colour.
    pub color: ColorDef,
    /// Padding around the text, as a fraction of the title font size.
    #[serde(default = "default_chip_padding")]
    pub padding_fraction: f64,
    /// Corner radius, as a fraction of the title font size.
    #[serde(default = "default_chip_radius")]
    pub corner_radius_fraction: f64,
}

fn default_chip_padding() -> f64 {
    0.4
}

fn default_chip_radius() -> f64 {
    0.25
}

/// Font weight: a number or `normal` / `bold`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FontWeightDef(pub f32);

impl FontWeightDef {
    /// CSS `normal`.
    pub const NORMAL: Self = Self(400.0);
    /// CSS `bold`.
    pub const BOLD: Self = Self(700.0);
}

impl Default for FontWeightDef {
    fn default() -> Self {
        Self::BOLD
    }
}

impl<'de> Deserialize<'de> for FontWeightDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f32),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Num(v) => Ok(Self(v)),
            Repr::Name(s) => match s.trim().to_ascii_lowercase().as_str() {
                "normal" => Ok(Self::NORMAL),
                "bold" => Ok(Self::BOLD),
                other => other.parse::<f32>().map(Self).map_err(|_| {
                    serde::de::Error::custom(format!("unknown font weight \"{s}\""))
                }),
            },
        }
    }
}

/// Title size in px.
pub fn title_font_px(canvas: Canvas, style: &TextStyle) -> f64 {
    f64::from(canvas.width) * style.font_size_fraction / 100.0
}

/// Vertical centre of the title in px.
pub fn title_center_y(canvas: Canvas, style: &TextStyle) -> f64 {
    f64::from(canvas.height) * style.position_y_fraction / 100.0
}

/// Detail size in px.
pub fn detail_font_px(canvas: Canvas, cfg: &TextConfig) -> f64 {
    f64::from(canvas.width) * cfg.detail_size_fraction / 100.0
}

/// Vertical centre of the detail line, below a title of `title_height` px.
pub fn detail_center_y(title_center_y: f64, title_height: f64, cfg: &TextConfig) -> f64 {
    title_center_y + title_height * cfg.detail_offset_factor
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Parley contexts bound to one registered font.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family: String,
    font: vello_cpu::peniko::FontData,
}

impl TextLayoutEngine {
    /// Register `font_bytes` and keep its family for every layout.
    pub(crate) fn new(font_bytes: &[u8]) -> StageResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| StageError::compositing("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| StageError::compositing("registered font family has no name"))?
            .to_string();
        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes.to_vec()), 0);

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font,
        })
    }

    /// Shape a single unwrapped line.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        weight: f32,
        brush: TextBrushRgba8,
    ) -> StageResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(StageError::validation("text size_px must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(weight),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// A shaped line and its canvas-space bounds.
struct TextBlock {
    layout: parley::Layout<TextBrushRgba8>,
    bounds: Rect,
}

impl TextBlock {
    fn centered(layout: parley::Layout<TextBrushRgba8>, center_x: f64, center_y: f64) -> Self {
        let w = f64::from(layout.width());
        let h = f64::from(layout.height());
        let bounds = Rect::new(
            center_x - w / 2.0,
            center_y - h / 2.0,
            center_x + w / 2.0,
            center_y + h / 2.0,
        );
        Self { layout, bounds }
    }

    fn height(&self) -> f64 {
        self.bounds.height()
    }
}

/// Draw the title, detail and optional chip onto `buffer`.
///
/// Leaves the buffer untouched when both strings are empty or when no font bytes could be
/// provisioned.
#[tracing::instrument(level = "debug", skip_all, fields(font = %font.family))]
pub fn render_text(
    buffer: &mut RasterImage,
    style: &TextStyle,
    font: &ResolvedFont,
    cfg: &TextConfig,
) -> StageResult<()> {
    if style.is_empty() {
        return Ok(());
    }
    let Some(bytes) = font.bytes.as_deref() else {
        tracing::warn!(family = %font.family, "no font bytes available, skipping text");
        return Ok(());
    };

    let canvas = buffer.canvas();
    let mut engine = TextLayoutEngine::new(bytes)?;
    let center_x = f64::from(canvas.width) / 2.0;
    let title_y = title_center_y(canvas, style);
    let main = style.main_color.rgba8();

    let title = if style.title.is_empty() {
        None
    } else {
        let layout = engine.layout_line(
            &style.title,
            title_font_px(canvas, style) as f32,
            style.weight.0,
            main.into(),
        )?;
        Some(TextBlock::centered(layout, center_x, title_y))
    };

    let detail = if style.detail.is_empty() {
        None
    } else {
        let color = style.sub_color.map_or(main, ColorDef::rgba8);
        let layout = engine.layout_line(
            &style.detail,
            detail_font_px(canvas, cfg) as f32,
            style.weight.0,
            color.into(),
        )?;
        let title_h = title.as_ref().map_or(0.0, TextBlock::height);
        let y = detail_center_y(title_y, title_h, cfg);
        Some(TextBlock::centered(layout, center_x, y))
    };

    if let Some(chip) = &style.chip {
        let bounds = title
            .iter()
            .chain(detail.iter())
            .map(|b| b.bounds)
            .reduce(|a, b| a.union(b));
        if let Some(bounds) = bounds {
            let unit = title_font_px(canvas, style);
            let plate = bounds.inflate(chip.padding_fraction * unit, chip.padding_fraction * unit);
            let layer = fill_rounded_rect(
                canvas,
                plate,
                chip.corner_radius_fraction * unit,
                chip.color.rgba8(),
            )?;
            composite_in_place(buffer, &layer, 1.0, BlendMode::Normal)?;
        }
    }

    if let Some(title) = &title {
        if style.shadow_intensity > 0.0 {
            let offset = style.shadow_intensity / 4.0;
            let mut shadow = draw_block(
                canvas,
                &engine.font,
                title,
                Vec2::new(offset, offset),
                Some(cfg.shadow_color.rgba8()),
            )?;
            blur_in_place(&mut shadow, style.shadow_intensity as f32)?;
            composite_in_place(buffer, &shadow, 1.0, BlendMode::Normal)?;
        }
        let layer = draw_block(canvas, &engine.font, title, Vec2::ZERO, None)?;
        composite_in_place(buffer, &layer, 1.0, BlendMode::Normal)?;
    }
    if let Some(detail) = &detail {
        let layer = draw_block(canvas, &engine.font, detail, Vec2::ZERO, None)?;
        composite_in_place(buffer, &layer, 1.0, BlendMode::Normal)?;
    }
    Ok(())
}

/// Rasterize one block; `paint` overrides the layout brush.
fn draw_block(
    canvas: Canvas,
    font: &vello_cpu::peniko::FontData,
    block: &TextBlock,
    offset: Vec2,
    paint: Option<Rgba8>,
) -> StageResult<RasterImage> {
    render_layer(canvas, |ctx| {
        let origin = block.bounds.origin() + offset;
        ctx.set_transform(affine_to_cpu(Affine::translate(origin.to_vec2())));
        for line in block.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let color = paint.unwrap_or_else(|| {
                    let b = run.style().brush;
                    Rgba8::rgba(b.r, b.g, b.b, b.a)
                });
                ctx.set_paint(to_cpu_color(color));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
