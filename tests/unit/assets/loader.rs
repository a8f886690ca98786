use std::io::Cursor;

use base64::Engine as _;

use super::*;

fn tiny_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn parse_classifies_sources() {
    assert_eq!(
        AssetSource::parse("stage.png"),
        AssetSource::Path(PathBuf::from("stage.png"))
    );
    assert!(matches!(
        AssetSource::parse("https://cdn.example/x.png"),
        AssetSource::Url(_)
    ));
    assert!(matches!(
        AssetSource::parse(" data:image/png;base64,AAAA"),
        AssetSource::DataUrl(_)
    ));
}

#[test]
fn loads_from_bytes_and_data_url() {
    let png = tiny_png();
    let a = load(&AssetSource::Bytes(png.clone()), AssetRole::Background).unwrap();
    assert_eq!((a.image.width(), a.image.height()), (3, 2));

    let url = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png)
    );
    let b = load(&AssetSource::parse(&url), AssetRole::Product).unwrap();
    assert_eq!(b.bytes, png);
    assert_eq!(b.image, a.image);
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("bg.png");
    std::fs::write(&p, tiny_png()).unwrap();
    let a = load(&AssetSource::Path(p), AssetRole::Background).unwrap();
    assert_eq!(a.image.width(), 3);
}

#[test]
fn failures_map_to_asset_load_with_role() {
    let err = load(
        &AssetSource::Path(PathBuf::from("/nonexistent/stage.png")),
        AssetRole::Background,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        StageError::AssetLoad {
            role: AssetRole::Background,
            ..
        }
    ));

    let err = load(&AssetSource::Bytes(vec![1, 2, 3]), AssetRole::Product).unwrap_err();
    assert_eq!(err.to_string(), "the product image could not be loaded");

    let err = load(
        &AssetSource::parse("data:image/png,not-base64"),
        AssetRole::Product,
    )
    .unwrap_err();
    assert!(matches!(err, StageError::AssetLoad { .. }));
}
