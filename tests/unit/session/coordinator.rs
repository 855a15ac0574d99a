use super::*;
use crate::foundation::core::Size;
use crate::media::layer::LayerState;
use crate::media::sim::SimulatedBackend;
use crate::render::surface::{LayoutTarget, RecordingSurface};
use crate::scene::model::SceneSpec;
use crate::scene::store::InMemorySource;

const INTRO: &str = "
videos: [{ file: intro.mp4 }]
audio: [{ file: theme.mp3, loop: true }]
next_scene: menu
allow_skip: true
";

const MENU: &str = "
overlays: [{ type: arrow, file: arrow.png }]
arrow_positions:
  - { sx: 0.5, sy: 0.4, scene: tour }
  - { sx: 0.5, sy: 0.6, scene: credits }
back_scene: _default
move_sound: move.wav
select_sound: select.wav
";

const TOUR: &str = "
videos: [{ file: tour.mp4 }]
audio: [{ file: theme.mp3, loop: true, start: 700 }]
back_scene: menu
next_scene: menu
";

const CREDITS: &str = "
back_scene: menu
transitions: { r: _default }
";

struct Harness {
    coord: TransitionCoordinator,
    backend: SimulatedBackend,
    surface: RecordingSurface,
}

fn source(scenes: &[(&str, &str)]) -> InMemorySource {
    scenes.iter().fold(InMemorySource::new(), |src, (name, yaml)| {
        src.with_scene(*name, SceneSpec::from_yaml_str(yaml).unwrap())
    })
}

fn harness_with(scenes: &[(&str, &str)], opts: CoordinatorOpts) -> Harness {
    let backend = SimulatedBackend::new()
        .with_clip("intro.mp4", Millis(1_000), Size::new(1280.0, 720.0))
        .with_clip("tour.mp4", Millis(2_000), Size::new(1920.0, 1080.0))
        .with_clip("lobby.mp4", Millis(3_000), Size::new(1280.0, 720.0))
        .with_clip("theme.mp3", Millis(60_000), Size::ZERO);
    let surface = RecordingSurface::new(Size::new(1920.0, 1080.0));
    let coord = TransitionCoordinator::new(
        Box::new(source(scenes)),
        Box::new(backend.clone()),
        Box::new(surface.clone()),
        opts,
    )
    .unwrap();
    Harness {
        coord,
        backend,
        surface,
    }
}

fn harness() -> Harness {
    harness_with(
        &[
            ("_default", INTRO),
            ("menu", MENU),
            ("tour", TOUR),
            ("credits", CREDITS),
        ],
        CoordinatorOpts::default(),
    )
}

/// Start the entry scene and let it commit.
fn started() -> Harness {
    let mut h = harness();
    assert_eq!(h.coord.start().unwrap(), SwitchStatus::Pending);
    h.coord.update(Millis::ZERO);
    assert_eq!(h.coord.current_name(), Some("_default"));
    h
}

#[test]
fn wait_ends_on_readiness_or_deadline() {
    let w = Wait::new([PlayerId(1)].into(), Millis(10), Millis(50));
    assert!(!w.is_done(Millis(59)));
    assert!(w.is_done(Millis(60)));
    assert!(Wait::new(BTreeSet::new(), Millis(10), Millis(50)).is_done(Millis(10)));
}

#[test]
fn entry_scene_commits_after_first_frame() {
    let mut h = harness();
    h.coord.start().unwrap();
    assert!(h.coord.is_transitioning());
    assert_eq!(h.coord.in_flight(), Some("_default"));
    assert_eq!(h.coord.current_name(), None);

    h.coord.update(Millis::ZERO);
    assert!(!h.coord.is_transitioning());
    let intro = h.coord.scene("_default").unwrap();
    assert_eq!(intro.layers()[0].state(), LayerState::Playing);
    assert_eq!(h.coord.current_audio(), &BTreeSet::from(["theme.mp3".to_string()]));

    let id = intro.layers()[0].player_id().unwrap();
    let placement = h.surface.placement(&LayoutTarget::Video(id)).unwrap();
    assert_eq!(placement.scale, 1.5);
}

#[test]
fn preload_grace_bounds_the_wait() {
    let mut h = harness();
    h.coord.start().unwrap();
    if let Some(wait) = h.coord.phase.wait_mut() {
        wait.waiting.insert(PlayerId(999));
    }

    h.coord.update(Millis::ZERO);
    assert!(h.coord.is_transitioning());
    h.coord.update(Millis(49));
    assert!(h.coord.is_transitioning());
    h.coord.update(Millis(50));
    assert_eq!(h.coord.current_name(), Some("_default"));
}

#[test]
fn forward_inheritance_seeks_source_to_end_before_capture() {
    let mut h = started();
    h.coord.update(Millis(10));

    let status = h.coord.switch("menu", Direction::Forward).unwrap();
    assert_eq!(status, SwitchStatus::Pending);
    assert!(matches!(h.coord.phase, Phase::SettlingSeek { .. }));

    h.coord.update(Millis(20));
    assert_eq!(h.coord.current_name(), Some("menu"));
    let last = h.coord.history().last().unwrap();
    assert_eq!(last.background_from.as_deref(), Some("_default"));
    assert_eq!(last.direction, Direction::Forward);

    // parked off screen, then primed again as the menu's back target
    let intro = h.coord.scene("_default").unwrap();
    assert_eq!(intro.layers()[0].state(), LayerState::Preloaded);
    assert!(!intro.layers()[0].is_visible());

    let menu = h.coord.scene("menu").unwrap();
    assert_eq!(menu.background().unwrap().native_size(), Size::new(1280.0, 720.0));
    assert!(h.surface.placement(&LayoutTarget::Background("menu".into())).is_some());
    // the end-of-media raised by the forced seek belongs to a scene that is no longer current
    assert!(h.coord.pending_requests().is_empty());
    assert_eq!(h.coord.history().len(), 2);
    // theme keeps playing through a scene without audio of its own
    assert!(h.coord.current_audio().contains("theme.mp3"));
    assert_eq!(h.backend.playing_audio("theme.mp3").len(), 1);
}

#[test]
fn source_near_its_end_is_captured_without_seeking() {
    let mut h = started();
    h.coord.update(Millis(950));
    let status = h.coord.switch("menu", Direction::Forward).unwrap();
    assert_eq!(status, SwitchStatus::Committed);
    assert_eq!(h.coord.current_name(), Some("menu"));
}

#[test]
fn switches_during_a_flight_are_queued_and_keys_ignored() {
    let mut h = started();
    h.coord.update(Millis(10));
    h.coord.switch("menu", Direction::Forward).unwrap();

    assert_eq!(
        h.coord.switch("tour", Direction::Forward).unwrap(),
        SwitchStatus::Queued
    );
    h.coord.handle_key(&Key::Escape).unwrap();
    h.coord.handle_key(&Key::Digit(4)).unwrap();
    assert_eq!(h.coord.pending_requests().len(), 1);
    assert_eq!(h.coord.in_flight(), Some("menu"));

    h.coord.update(Millis(20));
    let names: Vec<&str> = h.coord.history().iter().map(|t| t.to.as_str()).collect();
    assert_eq!(names, vec!["_default", "menu", "tour"]);
    assert_eq!(h.coord.current_name(), Some("tour"));
}

#[test]
fn stale_scene_requests_are_dropped() {
    let mut h = started();
    h.coord.requests.push("tour", Direction::Forward, "credits");
    h.coord.update(Millis(5));
    assert_eq!(h.coord.current_name(), Some("_default"));
    assert!(h.coord.pending_requests().is_empty());
}

#[test]
fn video_end_auto_transitions() {
    let mut h = started();
    h.coord.update(Millis(1_000));
    assert_eq!(h.coord.current_name(), Some("menu"));
    let last = h.coord.history().last().unwrap();
    assert_eq!(last.from.as_deref(), Some("_default"));
    assert_eq!(last.background_from.as_deref(), Some("_default"));
}

#[test]
fn menu_selection_carries_background_forward() {
    let mut h = started();
    h.coord.update(Millis(1_000));
    assert_eq!(h.coord.current_name(), Some("menu"));

    h.coord.handle_key(&Key::Down).unwrap();
    assert_eq!(h.coord.current_scene().unwrap().menu().index(), 1);
    assert_eq!(h.backend.playing_audio("move.wav").len(), 1);

    h.coord.handle_key(&Key::Enter).unwrap();
    assert_eq!(h.coord.current_name(), Some("credits"));
    assert_eq!(h.backend.playing_audio("select.wav").len(), 1);

    let last = h.coord.history().last().unwrap();
    assert_eq!(last.background_from.as_deref(), Some("menu"));
    assert!(h.coord.scene("menu").unwrap().background().is_none());
    assert!(h.coord.scene("credits").unwrap().background().is_some());
    assert!(h.surface.placement(&LayoutTarget::Background("menu".into())).is_none());
}

#[test]
fn transition_table_keys_switch_forward() {
    let mut h = started();
    h.coord.update(Millis(1_000));
    h.coord.handle_key(&Key::Down).unwrap();
    h.coord.handle_key(&Key::Enter).unwrap();
    assert_eq!(h.coord.current_name(), Some("credits"));

    assert_eq!(h.coord.get_transition("nothing").unwrap(), None);
    h.coord.handle_key(&Key::Other("r".to_string())).unwrap();
    h.coord.update(Millis(1_010));
    assert_eq!(h.coord.current_name(), Some("_default"));
    assert_eq!(
        h.coord.history().last().unwrap().direction,
        Direction::Forward
    );
}

#[test]
fn select_without_menu_skips_when_allowed() {
    let mut h = started();
    h.coord.update(Millis(200));
    h.coord.handle_key(&Key::Enter).unwrap();
    assert_eq!(h.coord.current_name(), Some("_default"));

    h.coord.update(Millis(220));
    assert_eq!(h.coord.current_name(), Some("menu"));
}

#[test]
fn unknown_scene_leaves_state_untouched() {
    let mut h = started();
    let before = h.coord.history().len();
    assert!(h.coord.switch("nowhere", Direction::Forward).is_err());
    assert_eq!(h.coord.current_name(), Some("_default"));
    assert!(!h.coord.is_transitioning());
    assert_eq!(h.coord.history().len(), before);
    assert!(!h.coord.store().contains("nowhere"));
}

#[test]
fn backward_source_is_primed_then_seeked() {
    let lobby = "videos: [{ file: lobby.mp4 }]\n";
    let hub = "
overlays: [{ type: arrow, file: arrow.png }]
arrow_positions: [{ x: 10, y: 10, scene: tour }]
back_scene: lobby
";
    let tour = "videos: [{ file: tour.mp4 }]\nback_scene: hub\n";
    let opts = CoordinatorOpts {
        entry_scene: "tour".to_string(),
        ..CoordinatorOpts::default()
    };
    let mut h = harness_with(&[("lobby", lobby), ("hub", hub), ("tour", tour)], opts);
    h.coord.start().unwrap();
    h.coord.update(Millis::ZERO);
    assert_eq!(h.coord.current_name(), Some("tour"));
    assert!(!h.coord.store().contains("lobby"));

    h.coord.handle_key(&Key::Escape).unwrap();
    assert!(matches!(h.coord.phase, Phase::PrimingSource { .. }));
    let lobby_layer = &h.coord.scene("lobby").unwrap().layers()[0];
    assert!(!lobby_layer.is_visible());

    h.coord.update(Millis(5));
    assert!(matches!(h.coord.phase, Phase::SettlingSeek { .. }));
    h.coord.update(Millis(10));

    assert_eq!(h.coord.current_name(), Some("hub"));
    let last = h.coord.history().last().unwrap();
    assert_eq!(last.direction, Direction::Back);
    assert_eq!(last.background_from.as_deref(), Some("lobby"));
    let lobby_layer = &h.coord.scene("lobby").unwrap().layers()[0];
    assert!(!lobby_layer.is_visible());
    let tour_layer = &h.coord.scene("tour").unwrap().layers()[0];
    assert!(!tour_layer.is_visible());
}

#[test]
fn backward_switch_stops_previous_when_back_scene_is_the_source() {
    let lobby = "videos: [{ file: lobby.mp4 }]\n";
    let hub = "
overlays: [{ type: arrow, file: arrow.png }]
arrow_positions: [{ x: 10, y: 10, scene: lobby }]
back_scene: lobby
";
    let tour = "videos: [{ file: tour.mp4 }]\nback_scene: hub\n";
    let opts = CoordinatorOpts {
        entry_scene: "tour".to_string(),
        ..CoordinatorOpts::default()
    };
    let mut h = harness_with(&[("lobby", lobby), ("hub", hub), ("tour", tour)], opts);
    h.coord.start().unwrap();
    h.coord.update(Millis::ZERO);
    h.coord.update(Millis(800));

    h.coord.handle_key(&Key::Escape).unwrap();
    h.coord.update(Millis(805));
    h.coord.update(Millis(810));
    assert_eq!(h.coord.current_name(), Some("hub"));
    assert_eq!(
        h.coord.history().last().unwrap().background_from.as_deref(),
        Some("lobby")
    );

    let tour_layer = &h.coord.scene("tour").unwrap().layers()[0];
    assert_eq!(tour_layer.state(), LayerState::Stopped);
    assert_eq!(tour_layer.position(), Millis::ZERO);
    assert!(!tour_layer.is_visible());
}

#[test]
fn scene_with_one_broken_asset_still_commits() {
    let mut broken = SceneSpec::from_yaml_str(
        "videos: [{ file: tour.mp4 }, { file: bad.mp4 }]\naudio: [{ file: theme.mp3 }]\n",
    )
    .unwrap();
    broken.videos[1].file = "/abs/bad.mp4".to_string();
    let source = source(&[("_default", INTRO)]).with_scene("broken", broken);
    let backend = SimulatedBackend::new()
        .with_clip("intro.mp4", Millis(1_000), Size::new(1280.0, 720.0))
        .with_clip("tour.mp4", Millis(2_000), Size::new(1920.0, 1080.0));
    let mut coord = TransitionCoordinator::new(
        Box::new(source),
        Box::new(backend.clone()),
        Box::new(RecordingSurface::new(Size::new(1920.0, 1080.0))),
        CoordinatorOpts::default(),
    )
    .unwrap();
    coord.start().unwrap();
    coord.update(Millis::ZERO);

    coord.switch("broken", Direction::Forward).unwrap();
    coord.update(Millis(300));
    assert_eq!(coord.current_name(), Some("broken"));
    let layers = coord.scene("broken").unwrap().layers();
    assert!(!layers[0].is_inert());
    assert!(layers[1].is_inert());
}

#[test]
fn resize_refits_current_scene() {
    let mut h = started();
    let id = h.coord.current_scene().unwrap().layers()[0]
        .player_id()
        .unwrap();
    h.surface.set_viewport(Size::new(640.0, 360.0));
    h.coord.resize();
    assert_eq!(
        h.surface.placement(&LayoutTarget::Video(id)).unwrap().scale,
        0.5
    );
}
