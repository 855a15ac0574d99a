use std::collections::HashMap;

use crate::assets::paths::AssetRoots;
use crate::foundation::core::Millis;
use crate::media::audio::AudioTrack;
use crate::media::backend::{MediaBackend, MediaEventKind, PlayerId};
use crate::scene::model::AudioSpec;

/// Sound effects (menu move/select) indexed by filename.
///
/// Effects named in the preload document are opened once at startup; any other effect is opened the
/// first time a scene naming it is loaded and reused afterwards.
#[derive(Debug, Default)]
pub struct SoundBank {
    sounds: HashMap<String, AudioTrack>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    pub fn contains(&self, file: &str) -> bool {
        self.sounds.contains_key(file)
    }

    pub fn get(&self, file: &str) -> Option<&AudioTrack> {
        self.sounds.get(file)
    }

    /// Open every effect from the preload document.
    pub fn preload(
        &mut self,
        specs: &[AudioSpec],
        backend: &mut dyn MediaBackend,
        roots: &AssetRoots,
    ) {
        for spec in specs {
            tracing::debug!(file = %spec.file, "preloading sound effect");
            let track = AudioTrack::open(spec, backend, roots);
            self.sounds.insert(spec.file.clone(), track);
        }
        tracing::info!(count = self.sounds.len(), "sound effects preloaded");
    }

    /// Make sure `file` is available, opening it if no preloaded instance exists.
    pub fn ensure(&mut self, file: &str, backend: &mut dyn MediaBackend, roots: &AssetRoots) {
        if self.sounds.contains_key(file) {
            return;
        }
        let spec = AudioSpec::effect(file);
        let track = AudioTrack::open(&spec, backend, roots);
        self.sounds.insert(file.to_string(), track);
    }

    /// Stop-reset-replay `file`; returns whether the effect is known.
    pub fn restart(&mut self, file: &str) -> bool {
        match self.sounds.get_mut(file) {
            Some(track) => {
                track.restart();
                true
            }
            None => {
                tracing::debug!(%file, "sound effect not loaded; skipped");
                false
            }
        }
    }

    pub fn tick(&mut self, now: Millis) {
        for track in self.sounds.values_mut() {
            track.tick(now);
        }
    }

    pub fn handle_event(&mut self, player: PlayerId, kind: &MediaEventKind) -> bool {
        let Some(track) = self
            .sounds
            .values_mut()
            .find(|t| t.player_id() == Some(player))
        else {
            return false;
        };
        if *kind == MediaEventKind::EndOfMedia {
            track.handle_end_of_media();
        }
        true
    }
}
