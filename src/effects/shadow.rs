//! Physical shadow synthesis.
//!
//! Lighting and perspective arrive as free-text descriptors. They are mapped to a shadow
//! transform by [`SHADOW_RULES`], a table of `if / else if` groups evaluated in order: inside a
//! group the first rule whose keyword matches applies, and later groups overwrite fields set by
//! earlier ones. A lighting descriptor mentioning both "left" and "front" therefore ends with the
//! front value for `skew_x`.

use serde::{Deserialize, Serialize};

use crate::assets::raster::RasterImage;
use crate::config::ShadowConfig;
use crate::effects::blur::blur_in_place;
use crate::foundation::core::{Affine, Canvas, PlacementBox, Point, Rgba8};
use crate::foundation::error::StageResult;
use crate::render::surface::{draw_image, fill_ellipse};

/// Lighting descriptor assumed when the analysis provider supplies none.
pub const DEFAULT_LIGHTING: &str = "soft light from top-left";
/// Perspective descriptor assumed when the analysis provider supplies none.
pub const DEFAULT_PERSPECTIVE: &str = "eye-level";

/// Shadow transform before any rule applies.
pub const DEFAULT_SHADOW: ShadowParams = ShadowParams {
    skew_x: 0.5,
    scale_y: 0.3,
    offset_x: 10.0,
    offset_y: 5.0,
};

/// Semantic hints about the scene, produced by an upstream analysis step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPhysicalSpecs", rename_all = "camelCase")]
pub struct PhysicalSpecs {
    /// e.g. "soft light from top-left".
    pub lighting_direction: String,
    /// e.g. "eye-level straight on".
    pub camera_perspective: String,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawPhysicalSpecs {
    lighting_direction: Option<String>,
    camera_perspective: Option<String>,
}

impl From<RawPhysicalSpecs> for PhysicalSpecs {
    fn from(raw: RawPhysicalSpecs) -> Self {
        Self::new(
            raw.lighting_direction.as_deref(),
            raw.camera_perspective.as_deref(),
        )
    }
}

impl Default for PhysicalSpecs {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl PhysicalSpecs {
    /// Build specs; absent or blank descriptors take the neutral defaults.
    pub fn new(lighting: Option<&str>, perspective: Option<&str>) -> Self {
        fn or_default(v: Option<&str>, default: &str) -> String {
            match v.map(str::trim) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => default.to_string(),
            }
        }
        Self {
            lighting_direction: or_default(lighting, DEFAULT_LIGHTING),
            camera_perspective: or_default(perspective, DEFAULT_PERSPECTIVE),
        }
    }

    /// Shadow transform for these specs.
    pub fn shadow_params(&self) -> ShadowParams {
        derive_params(&self.lighting_direction, &self.camera_perspective)
    }
}

/// Geometry of the cast shadow.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowParams {
    /// Horizontal shear applied per unit of height.
    pub skew_x: f64,
    /// Vertical squash of the silhouette.
    pub scale_y: f64,
    /// Horizontal offset from the placement box, in pixels.
    pub offset_x: f64,
    /// Vertical offset from the placement box base, in pixels.
    pub offset_y: f64,
}

/// Which descriptor a rule group reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Descriptor {
    /// The lighting direction text.
    Lighting,
    /// The camera perspective text.
    Perspective,
}

/// Field assignments made by a matching rule; `None` leaves the field untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamPatch {
    /// New `skew_x`.
    pub skew_x: Option<f64>,
    /// New `scale_y`.
    pub scale_y: Option<f64>,
    /// New `offset_x`.
    pub offset_x: Option<f64>,
    /// New `offset_y`.
    pub offset_y: Option<f64>,
}

impl ParamPatch {
    const NONE: Self = Self {
        skew_x: None,
        scale_y: None,
        offset_x: None,
        offset_y: None,
    };

    fn apply(&self, p: &mut ShadowParams) {
        if let Some(v) = self.skew_x {
            p.skew_x = v;
        }
        if let Some(v) = self.scale_y {
            p.scale_y = v;
        }
        if let Some(v) = self.offset_x {
            p.offset_x = v;
        }
        if let Some(v) = self.offset_y {
            p.offset_y = v;
        }
    }
}

/// Fires when the lower-cased descriptor contains any keyword.
#[derive(Clone, Copy, Debug)]
pub struct ShadowRule {
    /// Substrings to look for.
    pub keywords: &'static [&'static str],
    /// Assignments made on a match.
    pub patch: ParamPatch,
}

/// An `if / else if` chain over one descriptor.
#[derive(Clone, Copy, Debug)]
pub struct RuleGroup {
    /// Descriptor inspected by every rule of the group.
    pub input: Descriptor,
    /// Rules in priority order.
    pub rules: &'static [ShadowRule],
}

/// The descriptor-to-geometry table, applied top to bottom.
pub const SHADOW_RULES: &[RuleGroup] = &[
    RuleGroup {
        input: Descriptor::Lighting,
        rules: &[
            ShadowRule {
                keywords: &["left"],
                patch: ParamPatch {
                    skew_x: Some(0.6),
                    ..ParamPatch::NONE
                },
            },
            ShadowRule {
                keywords: &["right"],
                patch: ParamPatch {
                    skew_x: Some(-0.6),
                    ..ParamPatch::NONE
                },
            },
        ],
    },
    RuleGroup {
        input: Descriptor::Lighting,
        rules: &[
            ShadowRule {
                keywords: &["front"],
                patch: ParamPatch {
                    skew_x: Some(0.1),
                    offset_y: Some(20.0),
                    ..ParamPatch::NONE
                },
            },
            ShadowRule {
                keywords: &["back"],
                patch: ParamPatch {
                    skew_x: Some(0.2),
                    offset_y: Some(-10.0),
                    ..ParamPatch::NONE
                },
            },
        ],
    },
    RuleGroup {
        input: Descriptor::Perspective,
        rules: &[
            ShadowRule {
                keywords: &["top-down", "high"],
                patch: ParamPatch {
                    scale_y: Some(0.6),
                    ..ParamPatch::NONE
                },
            },
            ShadowRule {
                keywords: &["eye-level"],
                patch: ParamPatch {
                    scale_y: Some(0.25),
                    ..ParamPatch::NONE
                },
            },
        ],
    },
];

/// Map lighting/perspective descriptors to a shadow transform. Pure and deterministic.
pub fn derive_params(lighting: &str, perspective: &str) -> ShadowParams {
    let lighting = lighting.to_lowercase();
    let perspective = perspective.to_lowercase();

    let mut params = DEFAULT_SHADOW;
    for group in SHADOW_RULES {
        let text = match group.input {
            Descriptor::Lighting => lighting.as_str(),
            Descriptor::Perspective => perspective.as_str(),
        };
        if let Some(rule) = group
            .rules
            .iter()
            .find(|r| r.keywords.iter().any(|k| text.contains(k)))
        {
            rule.patch.apply(&mut params);
        }
    }
    params
}

/// A rendered shadow layer and the opacity it is composited with.
#[derive(Clone, Debug)]
pub struct ShadowLayer {
    /// Canvas-sized premultiplied layer.
    pub image: RasterImage,
    /// Opacity used when compositing the layer.
    pub opacity: f32,
}

/// Solid black silhouette carrying the cutout's alpha.
pub fn silhouette(cutout: &RasterImage) -> RasterImage {
    let mut out = cutout.clone();
    for px in out.data_mut().chunks_exact_mut(4) {
        px[0] = 0;
        px[1] = 0;
        px[2] = 0;
    }
    out
}

/// Affine taking silhouette pixel space to canvas space.
///
/// The silhouette is laid upright with its base on local `y = 0`, then sheared/squashed by
/// `[1, 0, skew_x, scale_y]` and translated to the box base plus the offsets.
pub fn cast_shadow_transform(
    placement: &PlacementBox,
    params: &ShadowParams,
    src_w: u32,
    src_h: u32,
) -> Affine {
    let shear = Affine::new([
        1.0,
        0.0,
        params.skew_x,
        params.scale_y,
        placement.x + params.offset_x,
        placement.bottom() + params.offset_y,
    ]);
    let fit = Affine::translate((0.0, -placement.h))
        * Affine::scale_non_uniform(
            placement.w / f64::from(src_w.max(1)),
            placement.h / f64::from(src_h.max(1)),
        );
    shear * fit
}

/// Project the silhouette through the shadow transform and soften it.
pub fn render_cast_shadow(
    canvas: Canvas,
    silhouette: &RasterImage,
    placement: &PlacementBox,
    params: &ShadowParams,
    cfg: &ShadowConfig,
) -> StageResult<ShadowLayer> {
    let transform =
        cast_shadow_transform(placement, params, silhouette.width(), silhouette.height());
    let mut image = draw_image(canvas, silhouette, transform)?;
    blur_in_place(&mut image, cfg.cast_blur_px)?;
    Ok(ShadowLayer {
        image,
        opacity: cfg.cast_opacity,
    })
}

/// Soft ellipse at the subject's base, independent of the lighting heuristic.
pub fn render_contact_shadow(
    canvas: Canvas,
    placement: &PlacementBox,
    cfg: &ShadowConfig,
) -> StageResult<ShadowLayer> {
    let center = Point::new(placement.center_x(), placement.bottom());
    let radii = (
        placement.w * cfg.contact_width_fraction / 2.0,
        cfg.contact_height_px / 2.0,
    );
    let mut image = fill_ellipse(canvas, center, radii, Rgba8::rgb(0, 0, 0))?;
    blur_in_place(&mut image, cfg.contact_blur_px)?;
    Ok(ShadowLayer {
        image,
        opacity: cfg.contact_opacity,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/effects/shadow.rs"]
mod tests;
