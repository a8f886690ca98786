use super::*;
use crate::effects::shadow::DEFAULT_SHADOW;

fn placement() -> PlacementBox {
    PlacementBox {
        x: 40.0,
        y: 40.0,
        w: 40.0,
        h: 60.0,
    }
}

fn staged(background: &RasterImage, fg: [u8; 4], config: &PipelineConfig) -> StagedProduct {
    let cutout = RasterImage::filled(20, 30, fg).unwrap();
    stage_product(background, &cutout, placement(), &DEFAULT_SHADOW, config).unwrap()
}

#[test]
fn background_only_is_untouched() {
    let bg = RasterImage::filled(16, 16, [10, 20, 30, 255]).unwrap();
    let out = compose(&bg, None, 0.08).unwrap();
    assert_eq!(out.data(), bg.data());
}

#[test]
fn foreground_covers_its_box() {
    let config = PipelineConfig::default();
    let bg = RasterImage::filled(128, 128, [128, 128, 128, 255]).unwrap();
    let product = staged(&bg, [200, 0, 0, 255], &config);
    let out = compose(&bg, Some(&product), 0.0).unwrap();

    let px = out.pixel(60, 70);
    assert!((i32::from(px[0]) - 200).abs() <= 2 && px[1] == 0 && px[3] == 255, "{px:?}");
    assert_eq!(out.pixel(5, 5), [128, 128, 128, 255]);
}

#[test]
fn shadows_darken_the_floor_under_the_subject() {
    let config = PipelineConfig::default();
    let bg = RasterImage::filled(128, 128, [200, 200, 200, 255]).unwrap();
    let product = staged(&bg, [0, 0, 255, 255], &config);
    let out = compose(&bg, Some(&product), 0.0).unwrap();

    let below = out.pixel(60, 103);
    assert!(below[0] < 200, "floor under the base should be shaded: {below:?}");
    assert_eq!(below[3], 255);
}

#[test]
fn bleed_tints_subject_toward_the_stage() {
    let config = PipelineConfig::default();
    let bg = RasterImage::filled(128, 128, [0, 0, 255, 255]).unwrap();
    let product = staged(&bg, [128, 128, 128, 255], &config);

    let plain = compose(&bg, Some(&product), 0.0).unwrap();
    let tinted = compose(&bg, Some(&product), 0.08).unwrap();

    let p = plain.pixel(60, 70);
    let t = tinted.pixel(60, 70);
    assert_eq!(p[0], p[2]);
    assert!(t[2] > p[2], "blue stage should lift the blue channel: {t:?}");
    assert!(t[0] <= p[0]);
    // Outside the subject the bleed pass changes nothing.
    assert_eq!(plain.pixel(5, 5), tinted.pixel(5, 5));
}

#[test]
fn stage_layers_match_the_canvas() {
    let config = PipelineConfig::default();
    let bg = RasterImage::transparent(96, 64).unwrap();
    let product = staged(&bg, [1, 2, 3, 255], &config);
    for layer in [&product.cast.image, &product.contact.image, &product.foreground] {
        assert_eq!(layer.canvas(), bg.canvas());
    }
    assert_eq!(product.cast.opacity, config.shadow.cast_opacity);
    assert_eq!(product.contact.opacity, config.shadow.contact_opacity);
}
