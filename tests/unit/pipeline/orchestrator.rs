use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::assets::raster::AlphaMatte;
use crate::foundation::error::StageError;
use crate::matte::EmbeddedAlphaMatte;

fn png(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn stage_png() -> AssetSource {
    AssetSource::Bytes(png(image::RgbaImage::from_pixel(
        64,
        64,
        image::Rgba([90, 120, 150, 255]),
    )))
}

fn product_png() -> AssetSource {
    AssetSource::Bytes(png(image::RgbaImage::from_fn(30, 40, |x, y| {
        if (5..25).contains(&x) && (5..35).contains(&y) {
            image::Rgba([220, 40, 40, 255])
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    })))
}

#[derive(Default)]
struct Counting(AtomicUsize);

impl MatteExtractor for Counting {
    fn extract_matte(&self, bytes: &[u8]) -> anyhow::Result<AlphaMatte> {
        self.0.fetch_add(1, Ordering::SeqCst);
        EmbeddedAlphaMatte.extract_matte(bytes)
    }
}

fn pipeline(extractor: Arc<dyn MatteExtractor>) -> Pipeline {
    Pipeline::new(PipelineConfig::default(), extractor).unwrap()
}

#[test]
fn precision_visits_every_state() {
    let p = pipeline(Arc::new(EmbeddedAlphaMatte));
    let report = p
        .synthesize_with_report(
            &stage_png(),
            &product_png(),
            &TextStyle::default(),
            &PhysicalSpecs::default(),
            GenerationMode::Precision,
        )
        .unwrap();
    assert_eq!(
        report.states,
        vec![
            PipelineState::Idle,
            PipelineState::LoadingAssets,
            PipelineState::ExtractingMatte,
            PipelineState::SynthesizingShadow,
            PipelineState::Compositing,
            PipelineState::RenderingText,
            PipelineState::Encoded,
        ]
    );
    assert_eq!((report.width, report.height), (64, 64));
    let placement = report.placement.unwrap();
    assert!(placement.is_within(crate::foundation::core::Canvas::new(64, 64).unwrap()));
}

#[test]
fn creative_skips_matte_and_shadow_states() {
    let counting = Arc::new(Counting::default());
    let p = pipeline(counting.clone());
    let report = p
        .synthesize_with_report(
            &stage_png(),
            &AssetSource::Bytes(b"never decoded".to_vec()),
            &TextStyle::default(),
            &PhysicalSpecs::default(),
            GenerationMode::Creative,
        )
        .unwrap();
    assert_eq!(counting.0.load(Ordering::SeqCst), 0);
    assert_eq!(
        report.states,
        vec![
            PipelineState::Idle,
            PipelineState::LoadingAssets,
            PipelineState::Compositing,
            PipelineState::RenderingText,
            PipelineState::Encoded,
        ]
    );
    assert!(report.placement.is_none());
}

#[test]
fn invalid_style_fails_before_loading() {
    let p = pipeline(Arc::new(EmbeddedAlphaMatte));
    let style = TextStyle {
        font_size_fraction: 0.0,
        ..TextStyle::default()
    };
    let err = p
        .synthesize(
            &stage_png(),
            &product_png(),
            &style,
            &PhysicalSpecs::default(),
            GenerationMode::Precision,
        )
        .unwrap_err();
    assert!(matches!(err, StageError::Validation(_)));
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = PipelineConfig::default();
    config.output.quality = 0.0;
    let err = Pipeline::new(config, Arc::new(EmbeddedAlphaMatte)).unwrap_err();
    assert!(matches!(err, StageError::Validation(_)));
}
