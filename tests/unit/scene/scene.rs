use super::*;
use crate::media::sim::SimulatedBackend;
use crate::render::surface::RecordingSurface;

fn spec(yaml: &str) -> SceneSpec {
    SceneSpec::from_yaml_str(yaml).unwrap()
}

struct Rig {
    backend: SimulatedBackend,
    requests: TransitionRequests,
    registry: AudioRegistry,
    roots: AssetRoots,
}

impl Rig {
    fn new() -> Self {
        Self {
            backend: SimulatedBackend::new()
                .with_clip("intro.mp4", Millis(1_000), Size::new(1280.0, 720.0))
                .with_clip("short.mp4", Millis(50), Size::new(1280.0, 720.0))
                .with_clip("loop.mp4", Millis(400), Size::new(1920.0, 1080.0)),
            requests: TransitionRequests::new(),
            registry: AudioRegistry::new(),
            roots: AssetRoots::default(),
        }
    }

    fn build(&mut self, name: &str, yaml: &str) -> Scene {
        Scene::new(
            name,
            spec(yaml),
            &mut self.backend,
            &self.roots,
            self.requests.clone(),
            SceneTuning::default(),
        )
    }

    fn start(&mut self, scene: &mut Scene, direction: Direction, now: u64) -> BTreeSet<String> {
        scene.start(
            &mut self.registry,
            &mut self.backend,
            &self.roots,
            direction,
            false,
            Millis(now),
        )
    }

    fn pump(&mut self, scene: &mut Scene, now: u64) {
        for e in self.backend.poll_events(Millis(now)) {
            self.registry.handle_event(e.player, &e.kind);
            scene.handle_media_event(e.player, &e.kind);
        }
    }
}

const AUTO: &str = "
videos: [{ file: intro.mp4 }]
overlays: [{ file: hint.png, active_on_end: true }]
next_scene: menu
allow_skip: true
";

const MENU: &str = "
videos: [{ file: loop.mp4, loop: true }]
overlays: [{ type: arrow, file: arrow.svg, scale: 0.5 }]
arrow_positions:
  - { sx: 0.5, sy: 0.25, scene: a }
  - { sx: 0.5, sy: 0.50, scene: b }
  - { x: 10, y: 20, scene: c }
move_sound: move.wav
";

#[test]
fn video_end_activates_overlays_and_requests_next_scene() {
    let mut rig = Rig::new();
    let mut scene = rig.build("intro", AUTO);
    rig.start(&mut scene, Direction::Forward, 0);
    assert!(!scene.overlays()[0].is_visible());

    rig.pump(&mut scene, 1_000);
    assert!(scene.overlays()[0].is_visible());
    let req = rig.requests.pop().unwrap();
    assert_eq!(req.target, "menu");
    assert_eq!(req.direction, Direction::Forward);
    assert_eq!(req.origin.as_deref(), Some("intro"));
}

#[test]
fn end_below_played_threshold_does_not_auto_transition() {
    let mut rig = Rig::new();
    let mut scene = rig.build("blip", "videos: [{ file: short.mp4 }]\nnext_scene: menu\n");
    rig.start(&mut scene, Direction::Forward, 0);
    rig.pump(&mut scene, 60);
    assert!(rig.requests.is_empty());
}

#[test]
fn looping_scene_defers_transition_until_loop_completes() {
    let mut rig = Rig::new();
    let mut scene = rig.build("menu", MENU);
    rig.start(&mut scene, Direction::Forward, 0);

    scene.request_scene_transition("a");
    assert_eq!(scene.pending_transition(), Some("a"));
    assert!(rig.requests.is_empty());

    rig.pump(&mut scene, 400);
    assert_eq!(scene.pending_transition(), None);
    assert_eq!(rig.requests.pop().map(|r| r.target), Some("a".to_string()));

    // held on the last frame, no restart
    rig.pump(&mut scene, 900);
    assert!(rig.requests.is_empty());
    assert_eq!(scene.layers()[0].position(), Millis(400));
}

#[test]
fn non_looping_scene_transitions_immediately() {
    let mut rig = Rig::new();
    let mut scene = rig.build("intro", AUTO);
    rig.start(&mut scene, Direction::Forward, 0);
    scene.request_scene_transition("x");
    assert_eq!(rig.requests.pop().map(|r| r.target), Some("x".to_string()));
}

#[test]
fn skip_is_refused_unless_allowed() {
    let mut rig = Rig::new();
    let mut scene = rig.build("s", "videos: [{ file: intro.mp4 }]\nnext_scene: n\n");
    rig.start(&mut scene, Direction::Forward, 0);
    assert!(!scene.skip_to_next());
    assert_eq!(scene.layers()[0].position(), Millis::ZERO);
}

#[test]
fn skip_forces_end_of_media_path() {
    let mut rig = Rig::new();
    let mut scene = rig.build("intro", AUTO);
    rig.start(&mut scene, Direction::Forward, 0);
    assert!(scene.skip_to_next());
    assert!(rig.requests.is_empty());

    rig.pump(&mut scene, 20);
    assert_eq!(rig.requests.pop().map(|r| r.target), Some("menu".to_string()));
}

#[test]
fn skip_without_video_fires_auto_transition() {
    let mut rig = Rig::new();
    let mut scene = rig.build("card", "next_scene: after\nallow_skip: true\n");
    rig.start(&mut scene, Direction::Forward, 0);
    assert!(scene.skip_to_next());
    assert_eq!(rig.requests.pop().map(|r| r.target), Some("after".to_string()));
}

#[test]
fn arrow_moves_only_while_visible() {
    let mut rig = Rig::new();
    let mut sounds = SoundBank::new();
    sounds.ensure("move.wav", &mut rig.backend, &rig.roots);
    let mut scene = rig.build("menu", MENU);

    assert!(!scene.move_down(&mut sounds));
    assert_eq!(scene.selected(), None);

    rig.start(&mut scene, Direction::Forward, 0);
    assert!(scene.has_active_selection());
    assert_eq!(scene.selected(), Some("a"));
    assert!(scene.move_up(&mut sounds));
    assert_eq!(scene.selected(), Some("c"));
    assert_eq!(scene.arrow_overlay().unwrap().position(), Point::new(10.0, 20.0));
    assert_eq!(rig.backend.playing_audio("move.wav").len(), 1);

    assert!(scene.move_down(&mut sounds));
    assert!(scene.move_down(&mut sounds));
    assert_eq!(scene.menu().index(), 1);
    assert_eq!(rig.backend.playing_audio("move.wav").len(), 1);
}

#[test]
fn start_resets_menu_and_shows_arrow() {
    let mut rig = Rig::new();
    let mut sounds = SoundBank::new();
    let mut scene = rig.build("menu", MENU);
    rig.start(&mut scene, Direction::Forward, 0);
    scene.move_down(&mut sounds);
    assert_eq!(scene.menu().index(), 1);

    let mut surface = RecordingSurface::new(Size::new(1920.0, 1080.0));
    scene.stop(&mut surface);
    assert!(!scene.has_active_selection());
    rig.start(&mut scene, Direction::Forward, 10);
    assert_eq!(scene.menu().index(), 0);
    assert!(scene.arrow_overlay().unwrap().is_visible());
}

#[test]
fn scaled_arrow_follows_primary_video_placement() {
    let mut rig = Rig::new();
    let mut sounds = SoundBank::new();
    let mut scene = rig.build("menu", MENU);
    rig.start(&mut scene, Direction::Forward, 0);

    // before any layout the fallback canvas is used
    assert_eq!(
        scene.arrow_overlay().unwrap().position(),
        Point::new(960.0, 270.0)
    );

    let mut surface = RecordingSurface::new(Size::new(960.0, 1080.0));
    scene.relayout(&mut surface);
    // 1920x1080 fitted into 960x1080: scale 0.5, content 960x540 at y=270
    let arrow = scene.arrow_overlay().unwrap();
    assert_eq!(arrow.position(), Point::new(480.0, 270.0 + 135.0));
    assert_eq!(arrow.scale(), 0.25);

    scene.move_down(&mut sounds);
    assert_eq!(
        scene.arrow_overlay().unwrap().position(),
        Point::new(480.0, 270.0 + 270.0)
    );
}

#[test]
fn forward_audio_continues_and_back_audio_rewinds() {
    let mut rig = Rig::new();
    let mut a = rig.build("a", "audio: [{ file: theme.mp3, start: 700 }]\n");
    let files = rig.start(&mut a, Direction::Forward, 0);
    assert_eq!(files, BTreeSet::from(["theme.mp3".to_string()]));
    assert_eq!(rig.registry.get("theme.mp3").unwrap().position(), Millis::ZERO);

    rig.pump(&mut a, 1_000);
    let id = rig.registry.get("theme.mp3").unwrap().player_id();

    let mut b = rig.build("b", "audio: [{ file: theme.mp3, start: 300 }]\n");
    rig.start(&mut b, Direction::Forward, 1_000);
    let track = rig.registry.get("theme.mp3").unwrap();
    assert_eq!(track.player_id(), id);
    assert_eq!(track.position(), Millis(1_000));

    rig.start(&mut b, Direction::Back, 1_000);
    let track = rig.registry.get("theme.mp3").unwrap();
    assert_eq!(track.player_id(), id);
    assert_eq!(track.position(), Millis(300));
    assert_eq!(rig.backend.playing_audio("theme.mp3").len(), 1);
}

#[test]
fn new_tracks_honour_start_only_going_back() {
    let mut rig = Rig::new();
    let mut s = rig.build("s", "audio: [{ file: vo.mp3, start: 500 }]\n");
    rig.start(&mut s, Direction::Back, 0);
    assert_eq!(rig.registry.get("vo.mp3").unwrap().position(), Millis(500));

    rig.registry.deregister("vo.mp3");
    rig.start(&mut s, Direction::Forward, 0);
    assert_eq!(rig.registry.get("vo.mp3").unwrap().position(), Millis::ZERO);
}

#[test]
fn unnamed_tracks_are_stopped_and_silent_scenes_inherit() {
    let mut rig = Rig::new();
    let mut a = rig.build("a", "audio: [{ file: one.mp3 }, { file: two.mp3 }]\n");
    rig.start(&mut a, Direction::Forward, 0);
    rig.pump(&mut a, 200);

    let mut silent = rig.build("silent", "");
    let inherited = rig.start(&mut silent, Direction::Forward, 200);
    assert_eq!(inherited.len(), 2);
    assert_eq!(rig.registry.get("one.mp3").unwrap().position(), Millis(200));

    rig.start(&mut silent, Direction::Back, 200);
    assert_eq!(rig.registry.get("one.mp3").unwrap().position(), Millis::ZERO);

    let mut b = rig.build("b", "audio: [{ file: two.mp3 }]\n");
    rig.start(&mut b, Direction::Forward, 300);
    assert!(!rig.registry.contains("one.mp3"));
    assert!(rig.backend.playing_audio("one.mp3").is_empty());
    assert_eq!(rig.backend.playing_audio("two.mp3").len(), 1);
}

#[test]
fn broken_assets_do_not_block_the_scene() {
    let mut rig = Rig::new();
    rig.backend.mark_missing("broken.mp4");
    rig.backend.mark_missing("broken.mp3");
    let mut scene = rig.build(
        "s",
        "videos: [{ file: broken.mp4 }, { file: intro.mp4 }]\naudio: [{ file: broken.mp3 }]\n",
    );
    assert!(scene.layers()[0].is_inert());
    rig.start(&mut scene, Direction::Forward, 0);
    assert!(scene.layers()[1].is_visible());
    assert!(rig.registry.get("broken.mp3").unwrap().is_inert());
}

#[test]
fn leave_cancels_deferred_transition_and_drops_background() {
    let mut rig = Rig::new();
    let mut scene = rig.build("menu", MENU);
    rig.start(&mut scene, Direction::Forward, 0);
    scene.request_scene_transition("b");

    let mut surface = RecordingSurface::new(Size::new(1920.0, 1080.0));
    let bg = InheritedBackground::new(image::RgbaImage::new(4, 4), "prev").unwrap();
    scene.set_background(bg);
    scene.relayout(&mut surface);
    assert!(surface.placement(&LayoutTarget::Background("menu".into())).is_some());

    scene.leave(&mut surface);
    assert_eq!(scene.pending_transition(), None);
    assert!(scene.background().is_none());
    assert!(surface.placement(&LayoutTarget::Background("menu".into())).is_none());
    // the layer keeps running until stopped
    assert!(scene.layers()[0].is_visible());
}

#[test]
fn leave_cancels_requests_the_scene_queued() {
    let mut rig = Rig::new();
    let mut scene = rig.build("intro", AUTO);
    rig.start(&mut scene, Direction::Forward, 0);
    rig.pump(&mut scene, 1_000);
    rig.requests.push("elsewhere", Direction::Forward, "other");
    rig.requests.push_external("outside", Direction::Forward);
    assert_eq!(rig.requests.len(), 3);

    scene.leave(&mut RecordingSurface::new(Size::new(1920.0, 1080.0)));
    let left: Vec<String> = rig.requests.pending().into_iter().map(|r| r.target).collect();
    assert_eq!(left, vec!["elsewhere", "outside"]);
}

#[test]
fn relayout_hands_document_attributes_to_the_surface() {
    let mut rig = Rig::new();
    let mut scene = rig.build(
        "layered",
        "videos:\n  - { file: intro.mp4 }\n  - { file: loop.mp4, x: 40, y: -12, z: 3, opacity: 1.5 }\n",
    );
    rig.start(&mut scene, Direction::Forward, 0);
    let bg = InheritedBackground::new(image::RgbaImage::new(4, 4), "prev").unwrap();
    scene.set_background(bg);

    let mut surface = RecordingSurface::new(Size::new(1920.0, 1080.0));
    scene.relayout(&mut surface);

    let base = scene.layers()[0].player_id().unwrap();
    let top = scene.layers()[1].player_id().unwrap();
    let base_props = surface.props(&LayoutTarget::Video(base)).unwrap();
    assert_eq!((base_props.z, base_props.opacity), (0, 1.0));
    let top_props = surface.props(&LayoutTarget::Video(top)).unwrap();
    assert_eq!(top_props.position, Point::new(40.0, -12.0));
    assert_eq!(top_props.z, 3);
    assert_eq!(top_props.opacity, 1.0);

    let bg_props = surface
        .props(&LayoutTarget::Background("layered".into()))
        .unwrap();
    assert!(bg_props.z < base_props.z);
    assert!(bg_props.z < crate::scene::overlay::OVERLAY_Z);

    scene.leave(&mut surface);
    assert!(surface.props(&LayoutTarget::Background("layered".into())).is_none());
}

#[test]
fn next_candidates_cover_menu_auto_and_back() {
    let mut rig = Rig::new();
    let scene = rig.build("menu", &format!("{MENU}back_scene: home\n"));
    let names: Vec<String> = scene.next_candidates().into_iter().collect();
    assert_eq!(names, vec!["a", "b", "c", "home"]);
}
