use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

fn opts(dirs: Vec<PathBuf>, timeout_ms: u64) -> FontProviderOpts {
    FontProviderOpts {
        search_dirs: dirs,
        timeout: Duration::from_millis(timeout_ms),
        fallback_family: "sans-serif".to_string(),
        fallback_files: crate::config::default_fallback_font_files(),
    }
}

fn system_font() -> Option<PathBuf> {
    crate::config::default_fallback_font_files()
        .into_iter()
        .find(|p| std::fs::read(p).is_ok_and(|b| family_name_of(&b).is_ok()))
}

#[test]
fn locate_matches_stem_loosely() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Playfair-Display.ttf"), b"x").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

    let dirs = vec![dir.path().to_path_buf()];
    let found = locate_font("playfair display", &dirs).unwrap();
    assert!(found.ends_with("Playfair-Display.ttf"));
    assert!(locate_font("notes", &dirs).is_none());
    assert!(locate_font("Inter", &dirs).is_none());
}

#[test]
fn missing_font_falls_back_without_failing() {
    let provider = FontProvider::new(opts(vec![], 2000));
    assert!(provider.try_ensure("NoSuchFamily").is_err());

    let font = provider.ensure("NoSuchFamily");
    assert!(font.is_fallback);
    assert_eq!(font.family, "sans-serif");
}

#[test]
fn invalid_font_bytes_fall_back() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Broken.otf"), b"not a font").unwrap();
    let provider = FontProvider::new(opts(vec![dir.path().to_path_buf()], 2000));

    let err = provider.try_ensure("Broken").unwrap_err();
    assert!(matches!(err, StageError::Other(_)));
    assert!(provider.ensure("Broken").is_fallback);
}

#[test]
fn slow_load_times_out_to_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Slow.ttf"), b"x").unwrap();
    let provider = FontProvider::with_reader(
        opts(vec![dir.path().to_path_buf()], 30),
        Arc::new(|p: &Path| {
            if p.ends_with("Slow.ttf") {
                std::thread::sleep(Duration::from_millis(400));
            }
            std::fs::read(p)
        }),
    );

    let err = provider.try_ensure("Slow").unwrap_err();
    assert!(matches!(err, StageError::FontTimeout { waited_ms: 30, .. }));
    assert!(!err.is_fatal());
    assert!(provider.ensure("Slow").is_fallback);
}

#[test]
fn empty_identifier_is_rejected() {
    let provider = FontProvider::new(opts(vec![], 2000));
    assert!(matches!(
        provider.try_ensure("  "),
        Err(StageError::Validation(_))
    ));
}

#[test]
fn second_request_is_served_from_cache() {
    let Some(path) = system_font() else {
        eprintln!("skipping: no system font found in the fallback list");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(&path, dir.path().join("Brand.ttf")).unwrap();

    let reads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reads);
    let provider = FontProvider::with_reader(
        opts(vec![dir.path().to_path_buf()], 5000),
        Arc::new(move |p: &Path| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::fs::read(p)
        }),
    );

    let a = provider.try_ensure("Brand").unwrap();
    assert!(!a.is_fallback);
    assert!(!a.family.is_empty());

    let before = reads.load(Ordering::SeqCst);
    let b = provider.try_ensure("Brand").unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), before);
    assert!(Arc::ptr_eq(&a, &b));
}
