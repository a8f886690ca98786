//! Stagecraft composes a product photograph onto a generated stage.
//!
//! One call to [`Pipeline::synthesize`] takes a background plate, the original product photo, a
//! text style and free-text lighting/perspective hints, and returns an encoded image:
//!
//! - fit the cut-out product into the canvas, anchored low
//! - cast a skewed shadow whose geometry follows the lighting descriptor, plus a contact shadow
//! - composite the product with a subtle colour bleed from the stage
//! - lay out title and detail text with the provisioned font
//!
//! In [`GenerationMode::Creative`] the background already contains the product and only text is
//! drawn.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod effects;
mod foundation;
mod layout;
mod render;

/// Pipeline configuration.
pub mod config;
/// Output encoders.
pub mod encode;
/// Matting collaborator seam.
pub mod matte;
/// Request orchestration.
pub mod pipeline;

pub use crate::assets::color::ColorDef;
pub use crate::assets::decode::decode_image;
pub use crate::assets::fonts::{FontProvider, FontProviderOpts, ResolvedFont};
pub use crate::assets::loader::{AssetSource, LoadedAsset, load};
pub use crate::assets::raster::{AlphaMatte, RasterImage};
pub use crate::config::PipelineConfig;
pub use crate::effects::composite::BlendMode;
pub use crate::effects::shadow::{
    DEFAULT_LIGHTING, DEFAULT_PERSPECTIVE, DEFAULT_SHADOW, Descriptor, ParamPatch,
    PhysicalSpecs, RuleGroup, SHADOW_RULES, ShadowLayer, ShadowParams, ShadowRule,
    derive_params,
};
pub use crate::foundation::core::{Affine, Canvas, PlacementBox, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{AssetRole, StageError, StageResult};
pub use crate::layout::fit::fit;
pub use crate::matte::{EmbeddedAlphaMatte, MatteExtractor, StaticMatte};
pub use crate::pipeline::orchestrator::{Pipeline, SynthesisReport};
pub use crate::pipeline::state::{GenerationMode, PipelineState};
pub use crate::render::compositor::{StagedProduct, compose, stage_product};
pub use crate::render::text::{ChipStyle, FontWeightDef, TextStyle, render_text};
