use std::collections::BTreeSet;

use crate::assets::paths::AssetRoots;
use crate::foundation::core::{Direction, Millis, Point, Size};
use crate::media::audio::AudioTrack;
use crate::media::backend::{MediaBackend, MediaEventKind, PlayerId};
use crate::media::layer::{LayerEvent, MediaLayer};
use crate::media::registry::AudioRegistry;
use crate::media::sounds::SoundBank;
use crate::render::background::InheritedBackground;
use crate::render::placement::{Placement, fit_to_viewport};
use crate::render::surface::{LayoutTarget, Surface};
use crate::scene::menu::ArrowMenu;
use crate::scene::model::{ArrowCoords, SceneSpec};
use crate::scene::overlay::Overlay;
use crate::session::requests::TransitionRequests;

/// Per-scene timing and layout knobs, taken from the coordinator options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneTuning {
    /// Minimum position a video must have reached before its end may auto-transition.
    pub played_threshold: Millis,
    /// How far before the end a skip lands.
    pub skip_epsilon: Millis,
    /// Content size assumed for scaled arrow positions when nothing is displayed.
    pub fallback_canvas: Size,
}

impl Default for SceneTuning {
    fn default() -> Self {
        Self {
            played_threshold: Millis(100),
            skip_epsilon: Millis(10),
            fallback_canvas: Size::new(1920.0, 1080.0),
        }
    }
}

/// Runtime instance of one scene.
///
/// Owns its video layers and overlays for the life of the process. Audio is only described here;
/// live tracks belong to the coordinator's [`AudioRegistry`] and are reconciled in
/// [`Scene::start_audio`]. Transitions are never performed directly: the scene pushes them onto the
/// [`TransitionRequests`] handle it was built with.
#[derive(Debug)]
pub struct Scene {
    name: String,
    spec: SceneSpec,
    layers: Vec<MediaLayer>,
    overlays: Vec<Overlay>,
    arrow: Option<usize>,
    menu: ArrowMenu,
    pending_transition: Option<String>,
    background: Option<InheritedBackground>,
    primary_placement: Option<Placement>,
    requests: TransitionRequests,
    tuning: SceneTuning,
}

impl Scene {
    /// Instantiate `spec`, opening one handle per video layer.
    ///
    /// Layers whose source cannot be opened are kept inert; the scene itself always builds.
    pub fn new(
        name: impl Into<String>,
        spec: SceneSpec,
        backend: &mut dyn MediaBackend,
        roots: &AssetRoots,
        requests: TransitionRequests,
        tuning: SceneTuning,
    ) -> Self {
        let name = name.into();
        let layers = spec
            .videos
            .iter()
            .map(|v| MediaLayer::open(v, backend, roots))
            .collect();
        let overlays: Vec<Overlay> = spec.overlays.iter().map(Overlay::new).collect();
        let arrow = overlays.iter().position(Overlay::is_arrow);
        let menu = ArrowMenu::new(spec.arrow_positions.len());
        tracing::debug!(
            scene = %name,
            videos = spec.videos.len(),
            audio = spec.audio.len(),
            overlays = overlays.len(),
            "scene built"
        );

        Self {
            name,
            spec,
            layers,
            overlays,
            arrow,
            menu,
            pending_transition: None,
            background: None,
            primary_placement: None,
            requests,
            tuning,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &SceneSpec {
        &self.spec
    }

    pub fn layers(&self) -> &[MediaLayer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [MediaLayer] {
        &mut self.layers
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn arrow_overlay(&self) -> Option<&Overlay> {
        self.arrow.map(|i| &self.overlays[i])
    }

    pub fn menu(&self) -> ArrowMenu {
        self.menu
    }

    pub fn has_own_video(&self) -> bool {
        !self.layers.is_empty()
    }

    pub fn back_scene(&self) -> Option<&str> {
        self.spec.back_scene.as_deref()
    }

    pub fn auto_transition(&self) -> Option<&str> {
        self.spec.auto_transition()
    }

    pub fn pending_transition(&self) -> Option<&str> {
        self.pending_transition.as_deref()
    }

    pub fn background(&self) -> Option<&InheritedBackground> {
        self.background.as_ref()
    }

    /// Scenes a viewer can reach from here in one step: auto-transition, menu entries, back.
    pub fn next_candidates(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        out.extend(self.auto_transition().map(str::to_string));
        out.extend(
            self.spec
                .arrow_positions
                .iter()
                .filter_map(|p| p.scene.clone()),
        );
        out.extend(self.spec.back_scene.clone());
        out
    }

    /// Transition-table lookup for a named key.
    pub fn transition_for(&self, key: &str) -> Option<&str> {
        self.spec.transitions.get(key).map(String::as_str)
    }

    pub fn owns_player(&self, player: PlayerId) -> bool {
        self.layers.iter().any(|l| l.player_id() == Some(player))
    }

    /// Whether any layer has not decoded anything yet.
    pub fn needs_preload(&self) -> bool {
        self.layers.iter().any(MediaLayer::needs_preload)
    }

    /// Show every layer paused on its first frame.
    pub fn preload(&mut self) {
        for layer in &mut self.layers {
            layer.preload();
        }
    }

    /// Prime every layer without showing it.
    pub fn preload_hidden(&mut self) {
        for layer in &mut self.layers {
            layer.preload_hidden();
        }
    }

    /// Route a backend notification to the owning layer; returns whether this scene owns `player`.
    pub fn handle_media_event(&mut self, player: PlayerId, kind: &MediaEventKind) -> bool {
        let Some(idx) = self
            .layers
            .iter()
            .position(|l| l.player_id() == Some(player))
        else {
            return false;
        };
        match kind {
            MediaEventKind::EndOfMedia => {
                if let Some(event) = self.layers[idx].handle_end_of_media() {
                    self.on_layer_event(event);
                }
            }
            MediaEventKind::Error(msg) => self.layers[idx].handle_error(msg),
            MediaEventKind::FrameReady
            | MediaEventKind::SeekSettled
            | MediaEventKind::SizeChanged => {}
        }
        true
    }

    /// React to a layer finishing a run or a loop.
    pub fn on_layer_event(&mut self, event: LayerEvent) {
        match event {
            LayerEvent::Ended => {
                for overlay in self.overlays.iter_mut().filter(|o| o.active_on_end()) {
                    overlay.activate();
                }
                let Some(next) = self.spec.auto_transition() else {
                    return;
                };
                let threshold = self.tuning.played_threshold;
                if self.layers.iter().any(|l| l.played_past(threshold)) {
                    self.requests.push(next, Direction::Forward, &self.name);
                } else {
                    tracing::debug!(scene = %self.name, "stale end-of-media; auto-transition skipped");
                }
            }
            LayerEvent::LoopCompleted => {
                if let Some(target) = self.pending_transition.take() {
                    tracing::debug!(scene = %self.name, %target, "loop completed; firing deferred transition");
                    self.requests.push(target, Direction::Forward, &self.name);
                }
            }
        }
    }

    /// Transition forward to `target`, after the current loop if any layer is looping.
    pub fn request_scene_transition(&mut self, target: &str) {
        let looping = self
            .layers
            .iter()
            .any(|l| l.is_looping() && !l.is_inert());
        if !looping {
            self.requests.push(target, Direction::Forward, &self.name);
            return;
        }

        tracing::debug!(scene = %self.name, %target, "deferring transition until loop completes");
        self.pending_transition = Some(target.to_string());
        for layer in &mut self.layers {
            layer.request_transition();
        }
    }

    /// Force every non-looping layer to its end; returns whether skipping is allowed here.
    ///
    /// When no layer could be skipped (none running, or the scene has no video), the
    /// auto-transition fires directly.
    pub fn skip_to_next(&mut self) -> bool {
        if !self.spec.allow_skip {
            tracing::debug!(scene = %self.name, "skip not allowed");
            return false;
        }
        let epsilon = self.tuning.skip_epsilon;
        let mut skipped = false;
        for layer in self.layers.iter_mut().filter(|l| !l.is_looping()) {
            skipped |= layer.skip_to_end(epsilon);
        }
        if !skipped && let Some(next) = self.spec.auto_transition() {
            self.requests.push(next, Direction::Forward, &self.name);
        }
        true
    }

    pub fn has_active_selection(&self) -> bool {
        !self.menu.is_empty() && self.arrow_overlay().is_some_and(Overlay::is_visible)
    }

    /// Scene bound to the current arrow position, while the menu is active.
    pub fn selected(&self) -> Option<&str> {
        if !self.has_active_selection() {
            return None;
        }
        self.spec.arrow_positions[self.menu.index()].scene.as_deref()
    }

    pub fn move_up(&mut self, sounds: &mut SoundBank) -> bool {
        self.move_arrow(sounds, ArrowMenu::move_up)
    }

    pub fn move_down(&mut self, sounds: &mut SoundBank) -> bool {
        self.move_arrow(sounds, ArrowMenu::move_down)
    }

    fn move_arrow(
        &mut self,
        sounds: &mut SoundBank,
        step: fn(&mut ArrowMenu) -> Option<usize>,
    ) -> bool {
        if !self.has_active_selection() || step(&mut self.menu).is_none() {
            return false;
        }
        self.update_arrow_position();
        if let Some(file) = self.spec.move_sound.as_deref() {
            sounds.restart(file);
        }
        true
    }

    /// Stop-reset-replay the select sound, if the scene names one.
    pub fn play_select_sound(&self, sounds: &mut SoundBank) {
        if let Some(file) = self.spec.select_sound.as_deref() {
            sounds.restart(file);
        }
    }

    /// Place the arrow on the current menu entry.
    ///
    /// Scaled entries are resolved against the displayed content: the inherited background when
    /// present, else the primary video, else the fallback canvas.
    pub fn update_arrow_position(&mut self) {
        let Some(arrow) = self.arrow else {
            return;
        };
        if self.menu.is_empty() {
            return;
        }
        let entry = &self.spec.arrow_positions[self.menu.index()];
        let content = self
            .background
            .as_ref()
            .and_then(InheritedBackground::placement)
            .or(self.primary_placement);

        let overlay = &mut self.overlays[arrow];
        match (entry.coords(), content) {
            (ArrowCoords::Scaled { sx, sy }, Some(content)) => {
                overlay.move_to(content.scaled_point(sx, sy));
                overlay.set_content_scale(content.scale);
            }
            (ArrowCoords::Scaled { sx, sy }, None) => {
                let canvas = self.tuning.fallback_canvas;
                overlay.move_to(Point::new(sx * canvas.width, sy * canvas.height));
            }
            (ArrowCoords::Absolute { x, y }, _) => overlay.move_to(Point::new(x, y)),
        }
    }

    /// Reconcile the shared registry with this scene's audio and return the files now live.
    ///
    /// Forward: continuing tracks are untouched, new tracks start at zero. Back: continuing tracks
    /// move to their configured start, new tracks start there. Tracks not named here are stopped.
    /// A scene naming no audio keeps everything (rewound to zero when going back).
    pub fn start_audio(
        &self,
        registry: &mut AudioRegistry,
        backend: &mut dyn MediaBackend,
        roots: &AssetRoots,
        direction: Direction,
        now: Millis,
    ) -> BTreeSet<String> {
        if self.spec.audio.is_empty() {
            if direction.is_back() {
                registry.reposition_all(Millis::ZERO);
            }
            tracing::debug!(scene = %self.name, tracks = registry.len(), "no audio of its own; inheriting");
            return registry.files();
        }

        let wanted = self.spec.audio_files();
        registry.retain_files(&wanted);

        for spec in &self.spec.audio {
            let offset = if direction.is_back() {
                spec.start
            } else {
                Millis::ZERO
            };
            if let Some(track) = registry.get_mut(&spec.file) {
                if direction.is_back() {
                    tracing::debug!(file = %spec.file, %offset, "repositioning continuing audio");
                    track.reposition(offset);
                }
                continue;
            }

            tracing::debug!(file = %spec.file, %offset, "starting audio");
            let mut track = AudioTrack::open(spec, backend, roots);
            track.play(now, offset);
            registry.register(track);
        }
        wanted
    }

    /// Begin presenting this scene; returns the audio files live afterwards.
    pub fn start(
        &mut self,
        registry: &mut AudioRegistry,
        backend: &mut dyn MediaBackend,
        roots: &AssetRoots,
        direction: Direction,
        inherit_video: bool,
        now: Millis,
    ) -> BTreeSet<String> {
        let menu_scene = !self.menu.is_empty();
        for overlay in &mut self.overlays {
            if menu_scene && overlay.is_arrow() {
                overlay.activate();
            } else {
                overlay.deactivate();
            }
        }
        self.pending_transition = None;
        self.menu.reset();
        self.update_arrow_position();

        let audio = self.start_audio(registry, backend, roots, direction, now);

        if !inherit_video {
            for layer in &mut self.layers {
                layer.play(now);
            }
        }
        audio
    }

    /// Fire due delayed starts.
    pub fn tick(&mut self, now: Millis) {
        for layer in &mut self.layers {
            layer.tick(now);
        }
    }

    /// Stop presenting this scene without touching its layers.
    ///
    /// Hides overlays, cancels a deferred transition along with any request this scene queued, and
    /// drops the inherited background.
    pub fn leave(&mut self, surface: &mut dyn Surface) {
        for overlay in &mut self.overlays {
            overlay.deactivate();
        }
        self.pending_transition = None;
        let dropped = self.requests.discard_from(&self.name);
        if dropped > 0 {
            tracing::debug!(scene = %self.name, dropped, "queued requests cancelled on leave");
        }
        self.clear_background(surface);
    }

    /// [`Scene::leave`] plus halting every layer. Audio is left to the coordinator.
    pub fn stop(&mut self, surface: &mut dyn Surface) {
        for layer in &mut self.layers {
            layer.stop();
        }
        self.leave(surface);
    }

    pub fn set_background(&mut self, background: InheritedBackground) {
        self.background = Some(background);
    }

    pub fn clear_background(&mut self, surface: &mut dyn Surface) {
        if self.background.take().is_some() {
            surface.remove(&LayoutTarget::Background(self.name.clone()));
        }
    }

    /// Fit every video layer and the background to the surface viewport, hand over their document
    /// attributes, then re-place the arrow.
    pub fn relayout(&mut self, surface: &mut dyn Surface) {
        let viewport = surface.viewport();
        for (i, layer) in self.layers.iter().enumerate() {
            let (Some(id), Some(native)) = (layer.player_id(), layer.native_size()) else {
                continue;
            };
            let Some(placement) = fit_to_viewport(native, viewport) else {
                continue;
            };
            if i == 0 {
                self.primary_placement = Some(placement);
            }
            surface.apply_layout(LayoutTarget::Video(id), placement);
            surface.apply_props(LayoutTarget::Video(id), layer.props());
        }
        if let Some(background) = self.background.as_mut() {
            let target = LayoutTarget::Background(self.name.clone());
            let placement = background.fit(viewport);
            surface.apply_layout(target.clone(), placement);
            surface.apply_props(target, background.props());
        }
        self.update_arrow_position();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/scene.rs"]
mod tests;
