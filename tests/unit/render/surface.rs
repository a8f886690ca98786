use super::*;

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h).unwrap()
}

fn close(a: [u8; 4], b: [u8; 4], tol: i32) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| (i32::from(*x) - i32::from(*y)).abs() <= tol)
}

#[test]
fn draw_image_places_pixels_through_transform() {
    let img = RasterImage::filled(8, 8, [200, 0, 0, 255]).unwrap();
    let layer = draw_image(canvas(32, 32), &img, Affine::translate((16.0, 4.0))).unwrap();
    assert_eq!(layer.canvas(), canvas(32, 32));
    assert!(close(layer.pixel(20, 8), [200, 0, 0, 255], 2));
    assert_eq!(layer.pixel(2, 2), [0, 0, 0, 0]);
    assert_eq!(layer.pixel(20, 20), [0, 0, 0, 0]);
}

#[test]
fn draw_image_scales_into_box() {
    let img = RasterImage::filled(4, 4, [0, 0, 0, 255]).unwrap();
    let t = Affine::translate((0.0, 0.0)) * Affine::scale(4.0);
    let layer = draw_image(canvas(20, 20), &img, t).unwrap();
    assert!(close(layer.pixel(14, 14), [0, 0, 0, 255], 2));
    assert_eq!(layer.pixel(18, 18), [0, 0, 0, 0]);
}

#[test]
fn fill_ellipse_covers_center_only() {
    let layer = fill_ellipse(
        canvas(40, 20),
        Point::new(20.0, 10.0),
        (10.0, 4.0),
        Rgba8::rgb(0, 0, 0),
    )
    .unwrap();
    assert!(close(layer.pixel(20, 10), [0, 0, 0, 255], 2));
    assert_eq!(layer.pixel(2, 2), [0, 0, 0, 0]);
    assert_eq!(layer.pixel(20, 1), [0, 0, 0, 0]);
}

#[test]
fn rounded_rect_fills_interior() {
    let layer = fill_rounded_rect(
        canvas(30, 30),
        Rect::new(5.0, 5.0, 25.0, 25.0),
        4.0,
        Rgba8::rgba(255, 255, 255, 128),
    )
    .unwrap();
    assert!(close(layer.pixel(15, 15), [128, 128, 128, 128], 2));
    assert_eq!(layer.pixel(1, 1), [0, 0, 0, 0]);
}

#[test]
fn keep_region_clears_outside() {
    let src = RasterImage::filled(6, 6, [9, 9, 9, 9]).unwrap();
    let out = keep_region(&src, Rect::new(2.0, 2.0, 4.0, 4.0)).unwrap();
    assert_eq!(out.pixel(2, 2), [9, 9, 9, 9]);
    assert_eq!(out.pixel(3, 3), [9, 9, 9, 9]);
    assert_eq!(out.pixel(4, 4), [0, 0, 0, 0]);
    assert_eq!(out.pixel(1, 3), [0, 0, 0, 0]);

    let none = keep_region(&src, Rect::new(10.0, 10.0, 12.0, 12.0)).unwrap();
    assert!(none.data().iter().all(|&b| b == 0));
}

#[test]
fn oversized_canvas_is_a_compositing_error() {
    let err = render_layer(canvas(70_000, 1), |_| Ok(())).unwrap_err();
    assert!(matches!(err, StageError::Compositing(_)));
}
