use super::*;

#[test]
fn fatal_messages_hide_collaborator_details() {
    let err = StageError::asset_load(
        AssetRole::Background,
        anyhow::anyhow!("connection reset by peer"),
    );
    assert_eq!(err.to_string(), "the background image could not be loaded");

    let err = StageError::matte(anyhow::anyhow!("HTTP 502 from matting service"));
    assert!(!err.to_string().contains("502"));
}

#[test]
fn source_chain_keeps_raw_error() {
    let err = StageError::asset_load(AssetRole::Product, std::io::Error::other("boom"));
    let source = std::error::Error::source(&err).unwrap();
    assert!(source.to_string().contains("boom"));
}

#[test]
fn only_font_timeout_is_non_fatal() {
    let timeout = StageError::FontTimeout {
        font: "Inter".to_string(),
        waited_ms: 2000,
    };
    assert!(!timeout.is_fatal());
    assert!(timeout.to_string().contains("2000 ms"));
    assert!(StageError::compositing("x").is_fatal());
    assert!(StageError::validation("x").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StageError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn compositing_message_is_stable() {
    let err = StageError::compositing("canvas width exceeds u16");
    assert_eq!(err.to_string(), "the image could not be composed");
    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "canvas width exceeds u16");
}
