use std::sync::Arc;

use serde::Serialize;

use crate::assets::fonts::{FontProvider, ResolvedFont};
use crate::assets::loader::{AssetSource, LoadedAsset, load};
use crate::assets::raster::RasterImage;
use crate::config::PipelineConfig;
use crate::effects::shadow::PhysicalSpecs;
use crate::encode::jpeg::encode_jpeg;
use crate::foundation::core::PlacementBox;
use crate::foundation::error::{AssetRole, StageResult};
use crate::layout::fit::fit;
use crate::matte::{MatteExtractor, cut_out, extract_for};
use crate::pipeline::state::{GenerationMode, PipelineState, StateTrace};
use crate::render::compositor::{compose, stage_product};
use crate::render::text::{TextStyle, render_text};

/// Outcome of a successful run.
#[derive(Clone, Debug, Serialize)]
pub struct SynthesisReport {
    /// Encoded JPEG.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Output width (the background plate's width).
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Where the product was placed; `None` in creative mode.
    pub placement: Option<PlacementBox>,
    /// States visited, from `Idle` to `Encoded`.
    pub states: Vec<PipelineState>,
}

/// Product-on-stage synthesis with a long-lived font cache and matting collaborator.
///
/// Each call owns its buffers; a `Pipeline` can serve concurrent requests.
pub struct Pipeline {
    config: PipelineConfig,
    fonts: FontProvider,
    extractor: Arc<dyn MatteExtractor>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Validate `config` and build a pipeline around `extractor`.
    pub fn new(config: PipelineConfig, extractor: Arc<dyn MatteExtractor>) -> StageResult<Self> {
        config.validate()?;
        let fonts = FontProvider::new(config.font_provider_opts());
        Ok(Self {
            config,
            fonts,
            extractor,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Shared font provider.
    pub fn fonts(&self) -> &FontProvider {
        &self.fonts
    }

    /// Produce the encoded final image.
    pub fn synthesize(
        &self,
        background: &AssetSource,
        original: &AssetSource,
        style: &TextStyle,
        specs: &PhysicalSpecs,
        mode: GenerationMode,
    ) -> StageResult<Vec<u8>> {
        self.synthesize_with_report(background, original, style, specs, mode)
            .map(|report| report.bytes)
    }

    /// Like [`Pipeline::synthesize`], also returning the placement and state trajectory.
    #[tracing::instrument(
        skip(self, background, original, style, specs),
        fields(background = %background.describe(), product = %original.describe())
    )]
    pub fn synthesize_with_report(
        &self,
        background: &AssetSource,
        original: &AssetSource,
        style: &TextStyle,
        specs: &PhysicalSpecs,
        mode: GenerationMode,
    ) -> StageResult<SynthesisReport> {
        let mut trace = StateTrace::new();
        match self.run(&mut trace, background, original, style, specs, mode) {
            Ok((bytes, canvas_w, canvas_h, placement)) => {
                trace.advance(PipelineState::Encoded);
                tracing::info!(
                    width = canvas_w,
                    height = canvas_h,
                    bytes = bytes.len(),
                    %mode,
                    "image encoded"
                );
                Ok(SynthesisReport {
                    bytes,
                    width: canvas_w,
                    height: canvas_h,
                    placement,
                    states: trace.into_states(),
                })
            }
            Err(err) => {
                trace.fail(&err);
                Err(err)
            }
        }
    }

    fn run(
        &self,
        trace: &mut StateTrace,
        background: &AssetSource,
        original: &AssetSource,
        style: &TextStyle,
        specs: &PhysicalSpecs,
        mode: GenerationMode,
    ) -> StageResult<(Vec<u8>, u32, u32, Option<PlacementBox>)> {
        style.validate()?;

        trace.advance(PipelineState::LoadingAssets);
        let (bg, (product, font)) = rayon::join(
            || load(background, AssetRole::Background),
            || {
                rayon::join(
                    || {
                        mode.composites_product()
                            .then(|| load(original, AssetRole::Product))
                            .transpose()
                    },
                    || self.provision_font(style),
                )
            },
        );
        let bg = bg?.image;
        let product = product?;

        let (mut out, placement) = match product {
            Some(product) => {
                trace.advance(PipelineState::ExtractingMatte);
                let cutout = self.cut_out_product(&product)?;
                let placement = fit(
                    bg.canvas(),
                    cutout.width(),
                    cutout.height(),
                    self.config.placement.padding_scale,
                    self.config.placement.vertical_bias,
                )?;

                trace.advance(PipelineState::SynthesizingShadow);
                let params = specs.shadow_params();
                tracing::debug!(?params, ?placement, "shadow parameters");
                let staged = stage_product(&bg, &cutout, placement, &params, &self.config)?;

                trace.advance(PipelineState::Compositing);
                let out = compose(&bg, Some(&staged), self.config.bleed.opacity)?;
                (out, Some(placement))
            }
            None => {
                trace.advance(PipelineState::Compositing);
                (compose(&bg, None, self.config.bleed.opacity)?, None)
            }
        };

        trace.advance(PipelineState::RenderingText);
        if let Some(font) = &font {
            render_text(&mut out, style, font, &self.config.text)?;
        }

        let bytes = encode_jpeg(&out, self.config.output.quality)?;
        Ok((bytes, out.width(), out.height(), placement))
    }

    fn provision_font(&self, style: &TextStyle) -> Option<Arc<ResolvedFont>> {
        (!style.is_empty()).then(|| self.fonts.ensure(&style.font_family))
    }

    fn cut_out_product(&self, product: &LoadedAsset) -> StageResult<RasterImage> {
        let matte = extract_for(self.extractor.as_ref(), &product.bytes, &product.image)?;
        tracing::debug!(coverage = matte.coverage(), "matte ready");
        cut_out(&product.image, &matte)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
