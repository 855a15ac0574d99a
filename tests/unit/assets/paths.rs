use super::*;

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.mp4").unwrap(), "a/b.mp4");
    assert_eq!(normalize_rel_path("a\\b.mp4").unwrap(), "a/b.mp4");
    assert_eq!(normalize_rel_path("./intro.mp4").unwrap(), "intro.mp4");
    assert!(normalize_rel_path("../x.mp4").is_err());
    assert!(normalize_rel_path("/abs.mp4").is_err());
    assert!(normalize_rel_path("  ").is_err());
}

#[test]
fn roots_join_normalized_names() {
    let roots = AssetRoots::under(Path::new("show"));
    assert_eq!(
        roots.video_path("intro.mp4").unwrap(),
        Path::new("show/assets/video/intro.mp4")
    );
    assert_eq!(
        roots.audio_path("sub\\theme.ogg").unwrap(),
        Path::new("show/assets/audio/sub/theme.ogg")
    );
    assert!(roots.image_path("../arrow.svg").is_err());
}
