//! Layer stack for one output image.
//!
//! Bottom to top: background plate, cast shadow, contact shadow, foreground cutout, then the
//! colour-bleed pass that lays the stage back over the subject with an `overlay` blend.

use crate::assets::raster::RasterImage;
use crate::config::PipelineConfig;
use crate::effects::composite::{BlendMode, composite_in_place, mask_by_alpha};
use crate::effects::shadow::{
    ShadowLayer, ShadowParams, render_cast_shadow, render_contact_shadow, silhouette,
};
use crate::foundation::core::PlacementBox;
use crate::foundation::error::StageResult;
use crate::render::surface::{draw_image, keep_region};

/// Canvas-sized layers for a product standing on the stage.
#[derive(Clone, Debug)]
pub struct StagedProduct {
    /// Where the cutout sits on the canvas.
    pub placement: PlacementBox,
    /// Skewed, blurred silhouette.
    pub cast: ShadowLayer,
    /// Ellipse under the base.
    pub contact: ShadowLayer,
    /// Cutout drawn into `placement`.
    pub foreground: RasterImage,
}

/// Render every layer the product contributes on a canvas matching `background`.
///
/// The two shadows only read shared inputs, so they are rendered concurrently.
pub fn stage_product(
    background: &RasterImage,
    cutout: &RasterImage,
    placement: PlacementBox,
    params: &ShadowParams,
    config: &PipelineConfig,
) -> StageResult<StagedProduct> {
    let canvas = background.canvas();
    let shape = silhouette(cutout);

    let (cast, contact) = rayon::join(
        || render_cast_shadow(canvas, &shape, &placement, params, &config.shadow),
        || render_contact_shadow(canvas, &placement, &config.shadow),
    );
    let foreground = draw_image(
        canvas,
        cutout,
        placement.image_transform(cutout.width(), cutout.height()),
    )?;

    Ok(StagedProduct {
        placement,
        cast: cast?,
        contact: contact?,
        foreground,
    })
}

/// Flatten the stage. With no product only the background is drawn.
pub fn compose(
    background: &RasterImage,
    product: Option<&StagedProduct>,
    bleed_opacity: f32,
) -> StageResult<RasterImage> {
    let mut out = background.clone();
    let Some(product) = product else {
        return Ok(out);
    };

    for shadow in [&product.cast, &product.contact] {
        composite_in_place(&mut out, &shadow.image, shadow.opacity, BlendMode::Normal)?;
    }
    composite_in_place(&mut out, &product.foreground, 1.0, BlendMode::Normal)?;

    if bleed_opacity > 0.0 {
        let under = keep_region(background, product.placement.to_rect())?;
        let bleed = mask_by_alpha(&under, &product.foreground)?;
        composite_in_place(&mut out, &bleed, bleed_opacity, BlendMode::Overlay)?;
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
