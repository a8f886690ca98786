use super::*;

#[test]
fn canvas_rejects_empty_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert_eq!(Canvas::new(4, 3).unwrap().rgba_len().unwrap(), 48);
}

#[test]
fn placement_box_edges() {
    let b = PlacementBox {
        x: 10.0,
        y: 20.0,
        w: 100.0,
        h: 50.0,
    };
    assert_eq!(b.center_x(), 60.0);
    assert_eq!(b.bottom(), 70.0);
    assert!(b.is_within(Canvas::new(110, 70).unwrap()));
    assert!(!b.is_within(Canvas::new(109, 70).unwrap()));
}

#[test]
fn image_transform_maps_corners_onto_box() {
    let b = PlacementBox {
        x: 8.0,
        y: 4.0,
        w: 20.0,
        h: 40.0,
    };
    let t = b.image_transform(10, 20);
    let p0 = t * Point::new(0.0, 0.0);
    let p1 = t * Point::new(10.0, 20.0);
    assert_eq!((p0.x, p0.y), (8.0, 4.0));
    assert_eq!((p1.x, p1.y), (28.0, 44.0));
}

#[test]
fn rgba8_premul_rounds() {
    assert_eq!(Rgba8::rgba(255, 128, 0, 128).premul(), [128, 64, 0, 128]);
    assert_eq!(Rgba8::rgb(1, 2, 3).premul(), [1, 2, 3, 255]);
    assert_eq!(Rgba8::rgb(0, 0, 0).with_alpha_scaled(0.5).a, 128);
}
