use crate::assets::paths::AssetRoots;
use crate::foundation::core::Millis;
use crate::media::backend::{AudioPlayer, MediaBackend, PlayerId};
use crate::scene::model::AudioSpec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingStart {
    at: Millis,
    offset: Millis,
}

/// One audio track, wrapping exactly one playback handle.
///
/// A delayed start is a cancellable deadline: a second [`AudioTrack::play`] replaces it and
/// [`AudioTrack::stop`] drops it, so a track never double-starts.
pub struct AudioTrack {
    file: String,
    looping: bool,
    delay: Millis,
    start_offset: Millis,
    player: Option<Box<dyn AudioPlayer>>,
    pending_start: Option<PendingStart>,
}

impl std::fmt::Debug for AudioTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioTrack")
            .field("file", &self.file)
            .field("player", &self.player_id())
            .field("looping", &self.looping)
            .field("pending_start", &self.pending_start)
            .finish()
    }
}

impl AudioTrack {
    pub fn new(spec: &AudioSpec, player: Option<Box<dyn AudioPlayer>>) -> Self {
        Self {
            file: spec.file.clone(),
            looping: spec.looping,
            delay: spec.delay,
            start_offset: spec.start,
            player,
            pending_start: None,
        }
    }

    /// Open `spec.file` below the audio root; a failed open yields an inert track.
    pub fn open(spec: &AudioSpec, backend: &mut dyn MediaBackend, roots: &AssetRoots) -> Self {
        let player = roots
            .audio_path(&spec.file)
            .and_then(|path| backend.open_audio(&path));
        match player {
            Ok(player) => Self::new(spec, Some(player)),
            Err(e) => {
                tracing::error!(file = %spec.file, error = %e, "audio track unavailable");
                Self::new(spec, None)
            }
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn start_offset(&self) -> Millis {
        self.start_offset
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player.as_ref().map(|p| p.id())
    }

    pub fn is_inert(&self) -> bool {
        self.player.is_none()
    }

    pub fn is_playing(&self) -> bool {
        self.player.as_ref().is_some_and(|p| p.is_playing())
    }

    pub fn has_pending_start(&self) -> bool {
        self.pending_start.is_some()
    }

    pub fn position(&self) -> Millis {
        self.player.as_ref().map_or(Millis::ZERO, |p| p.position())
    }

    /// Start at `offset` once the configured delay has elapsed.
    pub fn play(&mut self, now: Millis, offset: Millis) {
        self.pending_start = None;
        if self.player.is_none() {
            return;
        }
        if self.delay.is_zero() {
            self.start_now(offset);
        } else {
            self.pending_start = Some(PendingStart {
                at: now + self.delay,
                offset,
            });
        }
    }

    fn start_now(&mut self, offset: Millis) {
        if let Some(player) = self.player.as_mut() {
            player.set_position(offset);
            player.play();
        }
    }

    /// Fire a pending delayed start once due.
    pub fn tick(&mut self, now: Millis) {
        let Some(pending) = self.pending_start else {
            return;
        };
        if now < pending.at {
            return;
        }
        self.pending_start = None;
        self.start_now(pending.offset);
    }

    /// Halt playback and cancel any pending start. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.pending_start = None;
        if let Some(player) = self.player.as_mut() {
            player.stop();
        }
    }

    /// Move a running track; a track still waiting on its delay starts at `offset` instead.
    pub fn reposition(&mut self, offset: Millis) {
        if let Some(pending) = self.pending_start.as_mut() {
            pending.offset = offset;
            return;
        }
        if let Some(player) = self.player.as_mut() {
            player.set_position(offset);
        }
    }

    /// Stop, rewind and replay immediately; an in-flight play is restarted, never layered.
    pub fn restart(&mut self) {
        self.pending_start = None;
        if let Some(player) = self.player.as_mut() {
            player.stop();
            player.set_position(Millis::ZERO);
            player.play();
        }
    }

    pub fn handle_end_of_media(&mut self) {
        if !self.looping {
            return;
        }
        if let Some(player) = self.player.as_mut() {
            player.set_position(Millis::ZERO);
            player.play();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/audio.rs"]
mod tests;
