use crate::assets::paths::AssetRoots;
use crate::foundation::core::{Millis, Point, Size};
use crate::media::backend::{MediaBackend, MediaStatus, PlayerId, VideoPlayer};
use crate::scene::model::VideoSpec;

/// Lifecycle of a [`MediaLayer`].
///
/// `Idle -> Preloaded -> (Scheduled) -> Playing <-> Looping -> (PendingExit) -> Ended | Stopped`
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum LayerState {
    Idle,
    /// Shown and paused on its first frame.
    Preloaded,
    /// Reset to zero, waiting out its start delay.
    Scheduled,
    Playing,
    /// A looping layer that restarted at least once.
    Looping,
    /// A looping layer that must finish its current cycle and then hold.
    PendingExit,
    /// Holding the last frame after a completed run or loop.
    Ended,
    Stopped,
}

/// Events a layer emits from its end-of-media handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerEvent {
    /// A non-looping layer played to completion.
    Ended,
    /// A looping layer finished the cycle during which an exit was requested.
    LoopCompleted,
}

/// Static presentation attributes from the scene document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerProps {
    pub position: Point,
    pub z: i32,
    pub opacity: f64,
}

/// One video layer of a scene, wrapping exactly one playback handle.
///
/// A layer whose source failed to open has no handle; every operation on it is a no-op so the rest
/// of the scene keeps working.
pub struct MediaLayer {
    file: String,
    props: LayerProps,
    looping: bool,
    delay: Millis,
    player: Option<Box<dyn VideoPlayer>>,
    state: LayerState,
    pending_exit: bool,
    start_at: Option<Millis>,
}

impl std::fmt::Debug for MediaLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLayer")
            .field("file", &self.file)
            .field("player", &self.player_id())
            .field("looping", &self.looping)
            .field("state", &self.state)
            .field("pending_exit", &self.pending_exit)
            .finish()
    }
}

impl MediaLayer {
    pub fn new(spec: &VideoSpec, player: Option<Box<dyn VideoPlayer>>) -> Self {
        Self {
            file: spec.file.clone(),
            props: LayerProps {
                position: Point::new(spec.x, spec.y),
                z: spec.z,
                opacity: spec.opacity.clamp(0.0, 1.0),
            },
            looping: spec.looping,
            delay: spec.delay,
            player,
            state: LayerState::Idle,
            pending_exit: false,
            start_at: None,
        }
    }

    /// Open `spec.file` below the video root; a failed open yields an inert layer.
    pub fn open(spec: &VideoSpec, backend: &mut dyn MediaBackend, roots: &AssetRoots) -> Self {
        let player = roots
            .video_path(&spec.file)
            .and_then(|path| backend.open_video(&path));
        match player {
            Ok(player) => Self::new(spec, Some(player)),
            Err(e) => {
                tracing::error!(file = %spec.file, error = %e, "video layer unavailable");
                Self::new(spec, None)
            }
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn props(&self) -> LayerProps {
        self.props
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn state(&self) -> LayerState {
        self.state
    }

    pub fn is_inert(&self) -> bool {
        self.player.is_none()
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player.as_ref().map(|p| p.id())
    }

    pub fn has_pending_exit(&self) -> bool {
        self.pending_exit
    }

    pub fn native_size(&self) -> Option<Size> {
        self.player.as_ref().and_then(|p| p.native_size())
    }

    pub fn is_visible(&self) -> bool {
        self.player.as_ref().is_some_and(|p| p.is_visible())
    }

    pub fn position(&self) -> Millis {
        self.player.as_ref().map_or(Millis::ZERO, |p| p.position())
    }

    /// Whether the backend has not decoded anything for this layer yet.
    pub fn needs_preload(&self) -> bool {
        self.player
            .as_ref()
            .is_some_and(|p| p.status() == MediaStatus::NoMedia)
    }

    /// Show the layer paused on its first frame.
    pub fn preload(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.set_visible(true);
            player.set_position(Millis::ZERO);
            player.pause();
        }
        self.state = LayerState::Preloaded;
    }

    /// Prime decoding without putting the layer on screen.
    pub fn preload_hidden(&mut self) {
        self.preload();
        if let Some(player) = self.player.as_mut() {
            player.set_visible(false);
        }
    }

    /// Restart from zero, honouring the configured start delay.
    pub fn play(&mut self, now: Millis) {
        self.pending_exit = false;
        self.start_at = None;
        let Some(player) = self.player.as_mut() else {
            return;
        };

        player.set_position(Millis::ZERO);
        player.set_visible(true);
        if self.delay.is_zero() {
            player.play();
            self.state = LayerState::Playing;
        } else {
            player.pause();
            self.start_at = Some(now + self.delay);
            self.state = LayerState::Scheduled;
        }
    }

    /// Fire a deferred start once its deadline has passed.
    pub fn tick(&mut self, now: Millis) {
        let Some(at) = self.start_at else {
            return;
        };
        if now < at {
            return;
        }
        self.start_at = None;
        if let Some(player) = self.player.as_mut() {
            player.play();
            self.state = LayerState::Playing;
        }
    }

    /// Arm the loop exit; consulted only at end-of-media.
    pub fn request_transition(&mut self) {
        self.pending_exit = true;
        if self.looping && matches!(self.state, LayerState::Playing | LayerState::Looping) {
            self.state = LayerState::PendingExit;
        }
    }

    /// Jump to just before the end so end-of-media fires imminently.
    ///
    /// Returns whether the jump was issued; a layer that is not running or has no known duration
    /// is left alone.
    pub fn skip_to_end(&mut self, epsilon: Millis) -> bool {
        if !matches!(self.state, LayerState::Playing | LayerState::Scheduled) {
            return false;
        }
        let Some(player) = self.player.as_mut() else {
            return false;
        };
        let Some(duration) = player.duration() else {
            tracing::debug!(file = %self.file, "skip ignored: duration unknown");
            return false;
        };

        player.set_position(duration.saturating_sub(epsilon));
        if self.start_at.take().is_some() {
            player.play();
            self.state = LayerState::Playing;
        }
        true
    }

    /// Halt, rewind, hide and forget any pending exit.
    pub fn stop(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.stop();
            player.set_position(Millis::ZERO);
            player.set_visible(false);
        }
        self.pending_exit = false;
        self.start_at = None;
        self.state = LayerState::Stopped;
    }

    /// Hide the layer but keep it logically ended on its current (last) frame.
    pub fn hold_hidden(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.pause();
            player.set_visible(false);
        }
        self.pending_exit = false;
        self.start_at = None;
        self.state = LayerState::Ended;
    }

    /// Seek to the true end when the position is more than `tolerance` short of it.
    ///
    /// Returns whether a seek was issued (and a [`crate::MediaEventKind::SeekSettled`] is due).
    pub fn seek_to_end(&mut self, tolerance: Millis) -> bool {
        let Some(player) = self.player.as_mut() else {
            return false;
        };
        let Some(duration) = player.duration() else {
            return false;
        };
        if duration.is_zero() || player.position() + tolerance >= duration {
            return false;
        }

        tracing::debug!(
            file = %self.file,
            from = %player.position(),
            to = %duration,
            "seeking to true end before capture"
        );
        player.set_position(duration);
        true
    }

    pub fn capture_frame(&self) -> Option<image::RgbaImage> {
        self.player.as_ref()?.latest_frame()
    }

    pub fn played_past(&self, threshold: Millis) -> bool {
        self.position() > threshold
    }

    /// Apply the end-of-media rule and report what the owning scene must react to.
    ///
    /// - looping, no pending exit: restart from zero, no event
    /// - looping, pending exit: hold on the last frame, [`LayerEvent::LoopCompleted`]
    /// - not looping: hold, [`LayerEvent::Ended`]
    ///
    /// End notifications for a layer that is not running are stale and ignored.
    pub fn handle_end_of_media(&mut self) -> Option<LayerEvent> {
        if !matches!(
            self.state,
            LayerState::Playing | LayerState::Looping | LayerState::PendingExit
        ) {
            return None;
        }
        let player = self.player.as_mut()?;

        if self.looping {
            if !self.pending_exit {
                player.set_position(Millis::ZERO);
                player.play();
                self.state = LayerState::Looping;
                return None;
            }
            self.pending_exit = false;
            self.state = LayerState::Ended;
            return Some(LayerEvent::LoopCompleted);
        }

        self.state = LayerState::Ended;
        Some(LayerEvent::Ended)
    }

    /// Log a playback failure; the layer stays stalled where it is.
    pub fn handle_error(&mut self, msg: &str) {
        tracing::error!(file = %self.file, error = %msg, "video playback failed; layer stalled");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/layer.rs"]
mod tests;
