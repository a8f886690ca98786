use super::*;

fn params(l: &str, p: &str) -> ShadowParams {
    derive_params(l, p)
}

#[test]
fn no_keywords_yield_defaults() {
    assert_eq!(params("diffuse overcast", "unknown"), DEFAULT_SHADOW);
    assert_eq!(params("", "").scale_y, 0.3);
}

#[test]
fn left_and_right_set_skew() {
    let p = params("soft light from top-left", "eye-level");
    assert_eq!(p.skew_x, 0.6);
    assert_eq!(p.scale_y, 0.25);
    assert_eq!(p.offset_y, 5.0);

    assert_eq!(params("hard light from the right", "").skew_x, -0.6);
    // "left" wins over "right" inside the same group.
    assert_eq!(params("left and right rims", "").skew_x, 0.6);
}

#[test]
fn front_back_override_side_skew() {
    let p = params("light from the front-left", "");
    assert_eq!(p.skew_x, 0.1);
    assert_eq!(p.offset_y, 20.0);

    let p = params("Backlit from the RIGHT", "");
    assert_eq!(p.skew_x, 0.2);
    assert_eq!(p.offset_y, -10.0);
    assert_eq!(p.offset_x, 10.0);
}

#[test]
fn perspective_rules() {
    assert_eq!(params("", "top-down flat lay").scale_y, 0.6);
    assert_eq!(params("", "High angle").scale_y, 0.6);
    assert_eq!(params("", "eye-level straight on").scale_y, 0.25);
    // Group order: the high-angle rule is checked first.
    assert_eq!(params("", "high, roughly eye-level").scale_y, 0.6);
    assert_eq!(params("", "low angle").scale_y, 0.3);
}

#[test]
fn derivation_is_bit_identical_across_calls() {
    let descriptors = [
        ("soft light from top-left", "eye-level"),
        ("studio light from back right", "top-down"),
        ("", ""),
        ("FRONT", "HIGH"),
    ];
    for (l, p) in descriptors {
        let a = derive_params(l, p);
        let b = derive_params(l, p);
        assert_eq!(a.skew_x.to_bits(), b.skew_x.to_bits());
        assert_eq!(a.scale_y.to_bits(), b.scale_y.to_bits());
        assert_eq!(a.offset_x.to_bits(), b.offset_x.to_bits());
        assert_eq!(a.offset_y.to_bits(), b.offset_y.to_bits());
    }
}

#[test]
fn physical_specs_fill_absent_and_blank_fields() {
    let specs: PhysicalSpecs = serde_json::from_str(r#"{"lightingDirection": "  "}"#).unwrap();
    assert_eq!(specs.lighting_direction, DEFAULT_LIGHTING);
    assert_eq!(specs.camera_perspective, DEFAULT_PERSPECTIVE);

    let specs: PhysicalSpecs =
        serde_json::from_str(r#"{"cameraPerspective": "top-down", "lightingDirection": null}"#)
            .unwrap();
    assert_eq!(specs.camera_perspective, "top-down");
    assert_eq!(specs.shadow_params().scale_y, 0.6);
    assert_eq!(specs.shadow_params().skew_x, 0.6);

    assert_eq!(PhysicalSpecs::default(), PhysicalSpecs::new(Some(""), None));
}

#[test]
fn cast_transform_anchors_base_at_box_bottom() {
    let b = PlacementBox {
        x: 100.0,
        y: 50.0,
        w: 200.0,
        h: 400.0,
    };
    let p = DEFAULT_SHADOW;
    let t = cast_shadow_transform(&b, &p, 100, 200);

    let base_left = t * Point::new(0.0, 200.0);
    assert!((base_left.x - (100.0 + p.offset_x)).abs() < 1e-9);
    assert!((base_left.y - (450.0 + p.offset_y)).abs() < 1e-9);

    let top_left = t * Point::new(0.0, 0.0);
    assert!((top_left.y - (450.0 + p.offset_y - p.scale_y * 400.0)).abs() < 1e-9);
    assert!((top_left.x - (100.0 + p.offset_x - p.skew_x * 400.0)).abs() < 1e-9);
}

#[test]
fn silhouette_is_black_with_same_alpha() {
    let img = RasterImage::from_premul(2, 1, vec![100, 50, 25, 128, 0, 0, 0, 0]).unwrap();
    let s = silhouette(&img);
    assert_eq!(s.pixel(0, 0), [0, 0, 0, 128]);
    assert_eq!(s.pixel(1, 0), [0, 0, 0, 0]);
}

#[test]
fn contact_shadow_sits_at_box_base() {
    let canvas = Canvas::new(200, 200).unwrap();
    let b = PlacementBox {
        x: 50.0,
        y: 40.0,
        w: 100.0,
        h: 120.0,
    };
    let cfg = ShadowConfig::default();
    let layer = render_contact_shadow(canvas, &b, &cfg).unwrap();
    assert_eq!(layer.opacity, 0.5);
    assert!(layer.image.pixel(100, 160)[3] > 0);
    assert_eq!(layer.image.pixel(100, 40)[3], 0);
    assert_eq!(layer.image.pixel(5, 5)[3], 0);
}

#[test]
fn cast_shadow_layer_is_soft_and_low_opacity() {
    let canvas = Canvas::new(160, 160).unwrap();
    let cutout = RasterImage::filled(10, 20, [30, 30, 30, 255]).unwrap();
    let b = PlacementBox {
        x: 60.0,
        y: 40.0,
        w: 40.0,
        h: 80.0,
    };
    let cfg = ShadowConfig {
        cast_blur_px: 6.0,
        ..ShadowConfig::default()
    };
    let layer =
        render_cast_shadow(canvas, &silhouette(&cutout), &b, &DEFAULT_SHADOW, &cfg).unwrap();
    assert_eq!(layer.opacity, 0.2);
    assert!(layer.image.data().chunks_exact(4).all(|px| px[0] == 0));
    // Just above the base, left of the box edge (the shear moves the top left).
    assert!(layer.image.pixel(60, 118)[3] > 0);
    assert_eq!(layer.image.pixel(150, 10)[3], 0);
}
