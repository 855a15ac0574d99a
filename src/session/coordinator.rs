use std::collections::BTreeSet;

use crate::foundation::core::{Direction, Millis};
use crate::foundation::error::KioskResult;
use crate::media::backend::{MediaBackend, MediaEvent, MediaEventKind, PlayerId};
use crate::media::registry::AudioRegistry;
use crate::media::sounds::SoundBank;
use crate::render::background::InheritedBackground;
use crate::render::surface::Surface;
use crate::scene::scene::Scene;
use crate::scene::store::{SceneSource, SceneStore};
use crate::session::input::{Command, Key};
use crate::session::opts::CoordinatorOpts;
use crate::session::requests::{TransitionRequest, TransitionRequests};

/// Outcome of [`TransitionCoordinator::switch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum SwitchStatus {
    /// The target is now the current scene.
    Committed,
    /// The switch is waiting on the media backend; it completes in a later `update`.
    Pending,
    /// Another transition is in flight; this one runs after it commits.
    Queued,
}

/// Record of one committed scene change.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CommittedTransition {
    pub from: Option<String>,
    pub to: String,
    pub direction: Direction,
    pub at: Millis,
    /// Scene whose last frame became the target's background.
    pub background_from: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct InFlight {
    target: String,
    direction: Direction,
}

/// A bounded wait: resumes once every listed handle reported, or at `deadline`.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Wait {
    waiting: BTreeSet<PlayerId>,
    deadline: Millis,
}

impl Wait {
    fn new(waiting: BTreeSet<PlayerId>, now: Millis, bound: Millis) -> Self {
        Self {
            waiting,
            deadline: now + bound,
        }
    }

    fn is_done(&self, now: Millis) -> bool {
        self.waiting.is_empty() || now >= self.deadline
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Target layers were preloaded; waiting for first frames.
    Preloading { flight: InFlight, wait: Wait },
    /// Backward source was never decoded; waiting for it to load before seeking.
    PrimingSource {
        flight: InFlight,
        source: String,
        wait: Wait,
    },
    /// Source was forced to its end; waiting for the seek to settle before capture.
    SettlingSeek {
        flight: InFlight,
        source: String,
        wait: Wait,
    },
}

impl Phase {
    fn wait_mut(&mut self) -> Option<&mut Wait> {
        match self {
            Phase::Idle => None,
            Phase::Preloading { wait, .. }
            | Phase::PrimingSource { wait, .. }
            | Phase::SettlingSeek { wait, .. } => Some(wait),
        }
    }

    /// Event kind that releases a handle from this phase's wait.
    fn releases(&self, kind: &MediaEventKind) -> bool {
        match self {
            Phase::Idle => false,
            Phase::Preloading { .. } | Phase::PrimingSource { .. } => matches!(
                kind,
                MediaEventKind::FrameReady | MediaEventKind::Error(_)
            ),
            Phase::SettlingSeek { .. } => matches!(
                kind,
                MediaEventKind::SeekSettled | MediaEventKind::Error(_)
            ),
        }
    }
}

/// Top-level orchestrator of scene changes.
///
/// Owns every scene (through its [`SceneStore`]), the shared [`AudioRegistry`], the sound effects
/// and the external collaborators. All work happens on the caller's thread: the host feeds key
/// presses into [`TransitionCoordinator::handle_key`] and the current monotonic time into
/// [`TransitionCoordinator::update`], which polls the backend, fires timers and resumes any
/// transition waiting on the backend.
///
/// One transition is in flight at a time. Keys pressed meanwhile are ignored; transition requests
/// raised by scenes or by [`TransitionCoordinator::switch`] are queued and run in order once the
/// in-flight transition commits.
pub struct TransitionCoordinator {
    store: SceneStore,
    backend: Box<dyn MediaBackend>,
    surface: Box<dyn Surface>,
    registry: AudioRegistry,
    sounds: SoundBank,
    requests: TransitionRequests,
    opts: CoordinatorOpts,
    current: Option<String>,
    current_audio: BTreeSet<String>,
    phase: Phase,
    now: Millis,
    history: Vec<CommittedTransition>,
}

impl std::fmt::Debug for TransitionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionCoordinator")
            .field("current", &self.current)
            .field("phase", &self.phase)
            .field("now", &self.now)
            .field("store", &self.store)
            .field("registry", &self.registry)
            .finish()
    }
}

impl TransitionCoordinator {
    /// Build a coordinator and open the sound effects from the preload document.
    ///
    /// A missing preload document is fine; an unreadable one is logged and skipped.
    pub fn new(
        source: Box<dyn SceneSource>,
        mut backend: Box<dyn MediaBackend>,
        surface: Box<dyn Surface>,
        opts: CoordinatorOpts,
    ) -> KioskResult<Self> {
        opts.validate()?;

        let mut sounds = SoundBank::new();
        match source.load_preload(&opts.preload_doc) {
            Ok(Some(preload)) => sounds.preload(&preload.sounds, backend.as_mut(), &opts.assets),
            Ok(None) => tracing::debug!(doc = %opts.preload_doc, "no preload document"),
            Err(e) => {
                tracing::error!(doc = %opts.preload_doc, error = %e, "preload document skipped")
            }
        }

        let requests = TransitionRequests::new();
        let store = SceneStore::new(source, requests.clone(), opts.scene_tuning());
        Ok(Self {
            store,
            backend,
            surface,
            registry: AudioRegistry::new(),
            sounds,
            requests,
            opts,
            current: None,
            current_audio: BTreeSet::new(),
            phase: Phase::Idle,
            now: Millis::ZERO,
            history: Vec::new(),
        })
    }

    /// Enter the entry scene.
    pub fn start(&mut self) -> KioskResult<SwitchStatus> {
        let entry = self.opts.entry_scene.clone();
        self.switch(&entry, Direction::Forward)
    }

    pub fn opts(&self) -> &CoordinatorOpts {
        &self.opts
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.store.get(self.current.as_deref()?)
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.store.get(name)
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn registry(&self) -> &AudioRegistry {
        &self.registry
    }

    pub fn sounds(&self) -> &SoundBank {
        &self.sounds
    }

    /// Audio files the current scene considers live.
    pub fn current_audio(&self) -> &BTreeSet<String> {
        &self.current_audio
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Target of the in-flight transition.
    pub fn in_flight(&self) -> Option<&str> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Preloading { flight, .. }
            | Phase::PrimingSource { flight, .. }
            | Phase::SettlingSeek { flight, .. } => Some(&flight.target),
        }
    }

    pub fn pending_requests(&self) -> Vec<TransitionRequest> {
        self.requests.pending()
    }

    /// Every committed transition, oldest first.
    pub fn history(&self) -> &[CommittedTransition] {
        &self.history
    }

    /// Switch to `name`.
    ///
    /// Loads the target (an unknown or invalid scene is an error and leaves every piece of state
    /// untouched), preloads its video if needed and commits once the backend is ready. While
    /// another transition is in flight the request is queued instead.
    #[tracing::instrument(level = "info", skip(self), fields(now = %self.now))]
    pub fn switch(&mut self, name: &str, direction: Direction) -> KioskResult<SwitchStatus> {
        if self.phase != Phase::Idle {
            tracing::debug!(target_scene = %name, "transition in flight; queued");
            self.requests.push_external(name, direction);
            return Ok(SwitchStatus::Queued);
        }

        let target = match self.store.load(
            name,
            self.backend.as_mut(),
            &self.opts.assets,
            &mut self.sounds,
        ) {
            Ok(scene) => scene,
            Err(e) => {
                tracing::error!(target_scene = %name, error = %e, "transition aborted");
                return Err(e);
            }
        };

        let flight = InFlight {
            target: name.to_string(),
            direction,
        };
        if !target.needs_preload() {
            return Ok(self.begin_inheritance(flight));
        }

        target.preload();
        let waiting = video_ids(target);
        tracing::debug!(target_scene = %name, layers = waiting.len(), "preloading target");
        self.phase = Phase::Preloading {
            flight,
            wait: Wait::new(waiting, self.now, self.opts.preload_grace),
        };
        Ok(SwitchStatus::Pending)
    }

    /// Resolve a command key to a scene change.
    ///
    /// - `select`: with an active menu, play the select sound and request the selected scene
    ///   (deferred until a running loop completes); without one, try to skip the current video.
    /// - `back`: switch backward to the current scene's back target.
    /// - anything else: the current scene's transition table.
    ///
    /// Returns the scene to switch to, or `None` when nothing applies or the transition was
    /// already started or queued.
    pub fn get_transition(&mut self, key: &str) -> KioskResult<Option<String>> {
        let Some(current) = self.current.clone() else {
            return Ok(None);
        };

        match key {
            "select" => {
                let Some(scene) = self.store.get_mut(&current) else {
                    return Ok(None);
                };
                if !scene.has_active_selection() {
                    scene.skip_to_next();
                    return Ok(None);
                }
                if let Some(selected) = scene.selected().map(str::to_string) {
                    scene.play_select_sound(&mut self.sounds);
                    scene.request_scene_transition(&selected);
                    return Ok(None);
                }
            }
            "back" => {
                let back = self
                    .store
                    .get(&current)
                    .and_then(Scene::back_scene)
                    .map(str::to_string);
                if let Some(back) = back {
                    self.switch(&back, Direction::Back)?;
                }
                return Ok(None);
            }
            _ => {}
        }

        Ok(self
            .store
            .get(&current)
            .and_then(|s| s.transition_for(key))
            .map(str::to_string))
    }

    /// Apply one key press. Ignored while a transition is in flight.
    pub fn handle_key(&mut self, key: &Key) -> KioskResult<()> {
        if self.phase != Phase::Idle {
            tracing::debug!(?key, "transition in flight; key ignored");
            return Ok(());
        }

        match key.command() {
            Command::MoveUp => {
                if let Some(scene) = self.current.as_deref().and_then(|n| self.store.get_mut(n)) {
                    scene.move_up(&mut self.sounds);
                }
            }
            Command::MoveDown => {
                if let Some(scene) = self.current.as_deref().and_then(|n| self.store.get_mut(n)) {
                    scene.move_down(&mut self.sounds);
                }
            }
            Command::Transition(name) => {
                if let Some(target) = self.get_transition(&name)? {
                    self.switch(&target, Direction::Forward)?;
                }
            }
            Command::Jump(name) => {
                self.switch(&name, Direction::Forward)?;
            }
        }
        self.drain_requests();
        Ok(())
    }

    /// Advance to `now`: dispatch backend events, fire timers, resume a waiting transition and
    /// run queued transition requests.
    pub fn update(&mut self, now: Millis) {
        self.now = self.now.max(now);

        let events = self.backend.poll_events(self.now);
        for event in events {
            self.dispatch(event);
        }

        if let Some(scene) = self.current.as_deref().and_then(|n| self.store.get_mut(n)) {
            scene.tick(self.now);
        }
        self.registry.tick(self.now);
        self.sounds.tick(self.now);

        self.resume();
        self.drain_requests();
    }

    /// Re-fit the current scene after the surface viewport changed.
    pub fn resize(&mut self) {
        let Some(scene) = self.current.as_deref().and_then(|n| self.store.get_mut(n)) else {
            return;
        };
        scene.relayout(self.surface.as_mut());
    }

    fn dispatch(&mut self, event: MediaEvent) {
        let MediaEvent { player, kind } = event;

        if self.phase.releases(&kind)
            && let Some(wait) = self.phase.wait_mut()
        {
            wait.waiting.remove(&player);
        }

        if self.sounds.handle_event(player, &kind) || self.registry.handle_event(player, &kind) {
            return;
        }

        let Some(owner) = self.store.dispatch(player, &kind) else {
            tracing::trace!(?player, ?kind, "event for unknown handle");
            return;
        };
        if kind == MediaEventKind::SizeChanged && self.current.as_deref() == Some(owner.as_str()) {
            self.resize();
        }
    }

    /// Continue the in-flight transition once its wait is over.
    fn resume(&mut self) {
        let done = self
            .phase
            .wait_mut()
            .is_some_and(|wait| wait.is_done(self.now));
        if !done {
            return;
        }

        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {}
            Phase::Preloading { flight, wait } => {
                if !wait.waiting.is_empty() {
                    tracing::debug!(target_scene = %flight.target, "preload grace elapsed");
                }
                self.begin_inheritance(flight);
            }
            Phase::PrimingSource { flight, source, .. } => {
                self.settle_source(flight, source);
            }
            Phase::SettlingSeek { flight, source, wait } => {
                if !wait.waiting.is_empty() {
                    tracing::warn!(%source, "seek did not settle in time; capturing anyway");
                }
                self.commit(flight, Some(source));
            }
        }
    }

    /// Pick the scene whose last frame the target inherits and get it ready for capture.
    fn begin_inheritance(&mut self, flight: InFlight) -> SwitchStatus {
        let Some(source) = self.inheritance_source(&flight) else {
            self.commit(flight, None);
            return SwitchStatus::Committed;
        };

        if flight.direction.is_back() {
            let Some(scene) = self.store.get_mut(&source) else {
                self.commit(flight, None);
                return SwitchStatus::Committed;
            };
            if scene.needs_preload() {
                tracing::debug!(%source, "priming backward source before capture");
                scene.preload_hidden();
                let waiting = video_ids(scene);
                self.phase = Phase::PrimingSource {
                    flight,
                    source,
                    wait: Wait::new(waiting, self.now, self.opts.back_seek_settle),
                };
                return SwitchStatus::Pending;
            }
        }
        self.settle_source(flight, source)
    }

    /// Scene to capture from, if the target inherits a background at all.
    fn inheritance_source(&mut self, flight: &InFlight) -> Option<String> {
        let target = self.store.get(&flight.target)?;
        if target.has_own_video() {
            return None;
        }
        let back_ref = target.back_scene().map(str::to_string);
        let current = self.current.clone()?;

        let source = match (flight.direction, back_ref) {
            (Direction::Back, Some(back)) => {
                match self.store.load(
                    &back,
                    self.backend.as_mut(),
                    &self.opts.assets,
                    &mut self.sounds,
                ) {
                    Ok(_) => back,
                    Err(e) => {
                        tracing::warn!(%back, error = %e, "back-scene source unavailable; using current scene");
                        current
                    }
                }
            }
            _ => current,
        };

        let scene = self.store.get(&source)?;
        (scene.has_own_video() || scene.background().is_some()).then_some(source)
    }

    /// Force the source video to its true end, waiting for the seek when one was needed.
    fn settle_source(&mut self, flight: InFlight, source: String) -> SwitchStatus {
        let tolerance = self.opts.end_tolerance;
        let mut waiting = BTreeSet::new();
        if let Some(scene) = self.store.get_mut(&source) {
            for layer in scene.layers_mut() {
                if layer.seek_to_end(tolerance)
                    && let Some(id) = layer.player_id()
                {
                    waiting.insert(id);
                }
            }
        }

        if waiting.is_empty() {
            self.commit(flight, Some(source));
            return SwitchStatus::Committed;
        }

        let bound = if flight.direction.is_back() {
            self.opts.back_seek_settle
        } else {
            self.opts.forward_seek_settle
        };
        self.phase = Phase::SettlingSeek {
            flight,
            source,
            wait: Wait::new(waiting, self.now, bound),
        };
        SwitchStatus::Pending
    }

    /// Latest frame of the source's video, or its own inherited background.
    fn capture(&self, source: &str) -> Option<InheritedBackground> {
        let scene = self.store.get(source)?;
        let frame = scene
            .layers()
            .iter()
            .find_map(|l| l.capture_frame())
            .or_else(|| scene.background().map(|bg| bg.image().clone()))?;
        InheritedBackground::new(frame, source)
    }

    /// Swap scenes: install the background, park the old video, start the target, lay it out and
    /// preload what may come next.
    fn commit(&mut self, flight: InFlight, source: Option<String>) {
        let InFlight { target, direction } = flight;
        let previous = self.current.clone();
        let inherit = source.is_some();

        let background = source.as_deref().and_then(|src| {
            let bg = self.capture(src);
            if bg.is_none() {
                tracing::warn!(%src, target_scene = %target, "no frame to capture; scene left without background");
            }
            bg
        });
        let background_from = background.as_ref().map(|bg| bg.source().to_string());

        if let Some(scene) = self.store.get_mut(&target) {
            scene.clear_background(self.surface.as_mut());
            if let Some(bg) = background {
                scene.set_background(bg);
            }
        }

        let mut parked: Vec<&str> = previous.iter().map(String::as_str).collect();
        if let Some(src) = source.as_deref()
            && !parked.contains(&src)
        {
            parked.push(src);
        }
        for name in parked {
            let held = source.as_deref() == Some(name);
            let Some(scene) = self.store.get_mut(name) else {
                continue;
            };
            for layer in scene.layers_mut() {
                if held {
                    layer.hold_hidden();
                } else {
                    layer.stop();
                }
            }
        }

        if let Some(scene) = self.store.get_mut(&target) {
            self.current_audio = scene.start(
                &mut self.registry,
                self.backend.as_mut(),
                &self.opts.assets,
                direction,
                inherit,
                self.now,
            );
            scene.relayout(self.surface.as_mut());
        }

        if let Some(prev) = previous.as_deref()
            && prev != target
            && let Some(scene) = self.store.get_mut(prev)
        {
            scene.leave(self.surface.as_mut());
        }

        tracing::info!(
            from = previous.as_deref().unwrap_or("-"),
            to = %target,
            ?direction,
            background = background_from.as_deref().unwrap_or("-"),
            audio = ?self.current_audio,
            "transition committed"
        );
        self.history.push(CommittedTransition {
            from: previous,
            to: target.clone(),
            direction,
            at: self.now,
            background_from,
        });
        self.current = Some(target);
        self.preload_next();
    }

    /// Load every scene reachable in one step and prime its video off screen.
    fn preload_next(&mut self) {
        let Some(current) = self.current.clone() else {
            return;
        };
        let candidates = self
            .store
            .get(&current)
            .map(Scene::next_candidates)
            .unwrap_or_default();

        for name in candidates.iter().filter(|n| **n != current) {
            match self.store.load(
                name,
                self.backend.as_mut(),
                &self.opts.assets,
                &mut self.sounds,
            ) {
                Ok(scene) => scene.preload_hidden(),
                Err(e) => tracing::warn!(scene = %name, error = %e, "predictive preload skipped"),
            }
        }
        tracing::debug!(?candidates, "next scenes preloaded");
    }

    /// Run queued requests until one has to wait on the backend.
    fn drain_requests(&mut self) {
        while self.phase == Phase::Idle {
            let Some(req) = self.requests.pop() else {
                return;
            };
            if let Some(origin) = req.origin.as_deref()
                && self.current.as_deref() != Some(origin)
            {
                tracing::debug!(target_scene = %req.target, %origin, "stale request dropped");
                continue;
            }
            if let Err(e) = self.switch(&req.target, req.direction) {
                tracing::error!(target_scene = %req.target, error = %e, "queued transition failed");
            }
        }
    }
}

fn video_ids(scene: &Scene) -> BTreeSet<PlayerId> {
    scene.layers().iter().filter_map(|l| l.player_id()).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/session/coordinator.rs"]
mod tests;
