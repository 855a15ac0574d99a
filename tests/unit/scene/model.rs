use super::*;

const MENU: &str = r#"
name: Main menu
videos:
  - file: menu_loop.mp4
    loop: true
audio:
  - file: theme.mp3
    loop: true
    start: 1500
overlays:
  - type: arrow
    file: arrow.svg
    scale: 0.5
  - file: logo.png
    position: [20, 40]
    active_on_end: true
arrow_positions:
  - { sx: 0.25, sy: 0.5, scene: tour }
  - { x: 300, y: 400, scene: credits }
transitions:
  "1": tour
back_scene: _default
move_sound: move.wav
select_sound: select.wav
"#;

#[test]
fn parses_yaml_with_defaults() {
    let spec = SceneSpec::from_yaml_str(MENU).unwrap();
    assert_eq!(spec.name.as_deref(), Some("Main menu"));

    let v = &spec.videos[0];
    assert!(v.looping);
    assert_eq!((v.x, v.y, v.z, v.opacity), (0.0, 0.0, 0, 1.0));
    assert_eq!(v.delay, Millis::ZERO);

    assert_eq!(spec.audio[0].start, Millis(1_500));
    assert_eq!(spec.audio[0].delay, Millis::ZERO);

    assert_eq!(spec.overlays[0].kind, OverlayKind::Arrow);
    assert_eq!(spec.overlays[0].scale, 0.5);
    assert_eq!(spec.overlays[1].kind, OverlayKind::Image);
    assert_eq!(spec.overlays[1].position, [20.0, 40.0]);
    assert!(spec.overlays[1].active_on_end);
    assert_eq!(spec.arrow_overlay(), Some(0));

    assert_eq!(
        spec.arrow_positions[0].coords(),
        ArrowCoords::Scaled { sx: 0.25, sy: 0.5 }
    );
    assert_eq!(
        spec.arrow_positions[1].coords(),
        ArrowCoords::Absolute { x: 300.0, y: 400.0 }
    );
    assert_eq!(spec.transitions.get("1").map(String::as_str), Some("tour"));
    assert!(!spec.allow_skip);
}

#[test]
fn menu_scenes_never_auto_transition() {
    let mut spec = SceneSpec::from_yaml_str(MENU).unwrap();
    spec.next_scene = Some("elsewhere".to_string());
    assert_eq!(spec.auto_transition(), None);

    spec.arrow_positions.clear();
    assert_eq!(spec.auto_transition(), Some("elsewhere"));
}

#[test]
fn referenced_scenes_are_sorted_and_unique() {
    let spec = SceneSpec::from_yaml_str(MENU).unwrap();
    assert_eq!(spec.referenced_scenes(), vec!["_default", "credits", "tour"]);
}

#[test]
fn empty_documents_are_valid_scenes() {
    assert_eq!(SceneSpec::from_yaml_str("").unwrap(), SceneSpec::default());
    assert_eq!(SceneSpec::from_json_str("{}").unwrap(), SceneSpec::default());
}

#[test]
fn json_documents_use_the_same_fields() {
    let spec = SceneSpec::from_json_str(
        r#"{"videos":[{"file":"a.mp4","delay":250}],"next_scene":"b","allow_skip":true}"#,
    )
    .unwrap();
    assert_eq!(spec.videos[0].delay, Millis(250));
    assert_eq!(spec.auto_transition(), Some("b"));
    assert!(spec.allow_skip);
}

#[test]
fn bad_asset_paths_load_and_are_listed_as_problems() {
    let spec =
        SceneSpec::from_yaml_str("videos: [{ file: /abs/intro.mp4 }]\naudio: [{ file: ../theme.mp3 }]\n")
            .unwrap();
    let problems = spec.asset_problems();
    assert_eq!(problems.len(), 2);
    assert!(problems[0].starts_with("videos[0].file"));
    assert!(problems[1].starts_with("audio[0].file"));
}

#[test]
fn arrow_positions_without_arrow_overlay_still_load() {
    let spec = SceneSpec::from_yaml_str(
        "overlays: [{ file: logo.png }]\narrow_positions:\n  - { x: 1, y: 2, scene: a }\n",
    )
    .unwrap();
    assert_eq!(spec.arrow_overlay(), None);
    assert!(spec.asset_problems().iter().any(|p| p.contains("arrow")));
}

#[test]
fn out_of_range_opacity_and_scale_are_problems_not_errors() {
    let spec = SceneSpec::from_yaml_str(
        "videos:\n  - { file: a.mp4, opacity: 2 }\noverlays:\n  - { file: a.png, scale: 0 }\n",
    )
    .unwrap();
    assert_eq!(spec.asset_problems().len(), 2);
}

#[test]
fn rejects_non_finite_numbers() {
    let err = SceneSpec::from_yaml_str("videos:\n  - { file: a.mp4, x: .nan }\n").unwrap_err();
    assert!(matches!(err, KioskError::Validation(_)));
    assert!(SceneSpec::from_yaml_str("overlays:\n  - { file: a.png, scale: .inf }\n").is_err());
}

#[test]
fn malformed_documents_are_serde_errors() {
    let err = SceneSpec::from_yaml_str("videos: 12").unwrap_err();
    assert!(matches!(err, KioskError::Serde(_)));
}

#[test]
fn doc_format_from_extension() {
    assert_eq!(DocFormat::from_path(Path::new("a.yml")), Some(DocFormat::Yaml));
    assert_eq!(DocFormat::from_path(Path::new("a.json")), Some(DocFormat::Json));
    assert_eq!(DocFormat::from_path(Path::new("a.txt")), None);
}

#[test]
fn preload_document_lists_sounds() {
    let preload: PreloadSpec = DocFormat::Yaml
        .parse("sounds:\n  - file: move.wav\n  - file: select.wav\n")
        .unwrap();
    assert!(preload.asset_problems().is_empty());
    assert_eq!(preload.sounds.len(), 2);
    assert_eq!(preload.sounds[1], AudioSpec::effect("select.wav"));
}
