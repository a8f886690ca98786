use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::assets::color::ColorDef;
use crate::assets::fonts::FontProviderOpts;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{StageError, StageResult};

/// Every tunable constant of the synthesis pipeline.
///
/// Deserialises from JSON; absent keys keep their reference defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Foreground placement.
    pub placement: PlacementConfig,
    /// Cast and contact shadow rendering.
    pub shadow: ShadowConfig,
    /// Environment colour bleed.
    pub bleed: BleedConfig,
    /// Text layout.
    pub text: TextConfig,
    /// Font provisioning.
    pub fonts: FontConfig,
    /// Output encoding.
    pub output: OutputConfig,
}

/// Geometry fitter parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementConfig {
    /// Fraction of the constraining canvas dimension the subject occupies.
    pub padding_scale: f64,
    /// Vertical anchor: 0 = top, 0.5 = centred, 1 = bottom.
    pub vertical_bias: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            padding_scale: 0.65,
            vertical_bias: 0.65,
        }
    }
}

/// Shadow layer parameters. The descriptor rule table itself is not configurable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadowConfig {
    /// Blur radius of the cast shadow, in pixels.
    pub cast_blur_px: f32,
    /// Opacity of the cast shadow.
    pub cast_opacity: f32,
    /// Contact ellipse width as a fraction of the placement box width.
    pub contact_width_fraction: f64,
    /// Contact ellipse height in pixels.
    pub contact_height_px: f64,
    /// Blur radius of the contact shadow, in pixels.
    pub contact_blur_px: f32,
    /// Opacity of the contact shadow.
    pub contact_opacity: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            cast_blur_px: 35.0,
            cast_opacity: 0.2,
            contact_width_fraction: 0.4,
            contact_height_px: 15.0,
            contact_blur_px: 10.0,
            contact_opacity: 0.5,
        }
    }
}

/// Colour-bleed parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BleedConfig {
    /// Opacity of the overlay-blended background over the subject.
    pub opacity: f32,
}

impl Default for BleedConfig {
    fn default() -> Self {
        Self { opacity: 0.08 }
    }
}

/// Text layout parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Detail font size, in percent of canvas width.
    pub detail_size_fraction: f64,
    /// Gap between title and detail centres, as a multiple of the title height.
    pub detail_offset_factor: f64,
    /// Colour of the title drop shadow.
    pub shadow_color: ColorDef,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            detail_size_fraction: 4.0,
            detail_offset_factor: 0.85,
            shadow_color: ColorDef(Rgba8::rgba(0, 0, 0, 128)),
        }
    }
}

/// Font provisioning parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontConfig {
    /// Directories searched for font files.
    pub search_dirs: Vec<PathBuf>,
    /// Bounded wait per font, in milliseconds.
    pub timeout_ms: u64,
    /// Generic family reported on fallback.
    pub fallback_family: String,
    /// Fallback font files, tried in order.
    pub fallback_files: Vec<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            search_dirs: vec![PathBuf::from("fonts")],
            timeout_ms: 2000,
            fallback_family: "sans-serif".to_string(),
            fallback_files: default_fallback_font_files(),
        }
    }
}

/// Output encoding parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Lossy quality in `(0, 1]`.
    pub quality: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { quality: 0.95 }
    }
}

/// Common locations of a plain sans-serif font across platforms.
pub fn default_fallback_font_files() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

impl PipelineConfig {
    /// Read and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> StageResult<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(std::io::BufReader::new(f))
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values outside their meaningful ranges.
    pub fn validate(&self) -> StageResult<()> {
        let p = &self.placement;
        if !(p.padding_scale > 0.0 && p.padding_scale <= 1.0) {
            return Err(StageError::validation("placement.padding_scale must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&p.vertical_bias) {
            return Err(StageError::validation("placement.vertical_bias must be in [0, 1]"));
        }

        let s = &self.shadow;
        for (name, v) in [
            ("shadow.cast_opacity", s.cast_opacity),
            ("shadow.contact_opacity", s.contact_opacity),
            ("bleed.opacity", self.bleed.opacity),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(StageError::validation(format!("{name} must be in [0, 1]")));
            }
        }
        for (name, v) in [
            ("shadow.cast_blur_px", s.cast_blur_px),
            ("shadow.contact_blur_px", s.contact_blur_px),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(StageError::validation(format!("{name} must be finite and >= 0")));
            }
        }
        if !(s.contact_width_fraction >= 0.0 && s.contact_height_px >= 0.0) {
            return Err(StageError::validation("contact shadow size must be >= 0"));
        }

        let t = &self.text;
        if !(t.detail_size_fraction > 0.0 && t.detail_size_fraction <= 100.0) {
            return Err(StageError::validation("text.detail_size_fraction must be in (0, 100]"));
        }
        if !t.detail_offset_factor.is_finite() {
            return Err(StageError::validation("text.detail_offset_factor must be finite"));
        }

        if !(self.output.quality > 0.0 && self.output.quality <= 1.0) {
            return Err(StageError::validation("output.quality must be in (0, 1]"));
        }
        Ok(())
    }

    /// Font provider settings derived from this config.
    pub fn font_provider_opts(&self) -> FontProviderOpts {
        FontProviderOpts {
            search_dirs: self.fonts.search_dirs.clone(),
            timeout: Duration::from_millis(self.fonts.timeout_ms),
            fallback_family: self.fonts.fallback_family.clone(),
            fallback_files: self.fonts.fallback_files.clone(),
        }
    }
}
