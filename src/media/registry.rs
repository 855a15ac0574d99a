use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::Millis;
use crate::media::audio::AudioTrack;
use crate::media::backend::{MediaEventKind, PlayerId};

/// Filename-keyed set of live audio tracks shared by all scenes.
///
/// At most one live instance exists per filename: registering a second instance for a file stops
/// and drops the first. Scenes that name the same file therefore continue one track instead of
/// starting another.
#[derive(Debug, Default)]
pub struct AudioRegistry {
    tracks: BTreeMap<String, AudioTrack>,
}

impl AudioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn contains(&self, file: &str) -> bool {
        self.tracks.contains_key(file)
    }

    pub fn get(&self, file: &str) -> Option<&AudioTrack> {
        self.tracks.get(file)
    }

    pub fn get_mut(&mut self, file: &str) -> Option<&mut AudioTrack> {
        self.tracks.get_mut(file)
    }

    pub fn files(&self) -> BTreeSet<String> {
        self.tracks.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AudioTrack)> {
        self.tracks.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Make `track` the live instance for its file.
    pub fn register(&mut self, track: AudioTrack) {
        let file = track.file().to_string();
        if let Some(mut previous) = self.tracks.insert(file.clone(), track) {
            tracing::warn!(%file, "replacing live audio instance");
            previous.stop();
        }
    }

    /// Stop and forget the track for `file`.
    pub fn deregister(&mut self, file: &str) -> bool {
        match self.tracks.remove(file) {
            Some(mut track) => {
                track.stop();
                true
            }
            None => false,
        }
    }

    /// Stop and deregister every track whose file is not in `keep`; returns the dropped files.
    pub fn retain_files(&mut self, keep: &BTreeSet<String>) -> Vec<String> {
        let dropped: Vec<String> = self
            .tracks
            .keys()
            .filter(|f| !keep.contains(*f))
            .cloned()
            .collect();
        for file in &dropped {
            tracing::debug!(%file, "stopping audio not named by the next scene");
            self.deregister(file);
        }
        dropped
    }

    pub fn reposition_all(&mut self, offset: Millis) {
        for track in self.tracks.values_mut() {
            track.reposition(offset);
        }
    }

    pub fn tick(&mut self, now: Millis) {
        for track in self.tracks.values_mut() {
            track.tick(now);
        }
    }

    /// Route a backend notification to the owning track; returns whether one owned `player`.
    pub fn handle_event(&mut self, player: PlayerId, kind: &MediaEventKind) -> bool {
        let Some(track) = self
            .tracks
            .values_mut()
            .find(|t| t.player_id() == Some(player))
        else {
            return false;
        };
        match kind {
            MediaEventKind::EndOfMedia => track.handle_end_of_media(),
            MediaEventKind::Error(msg) => {
                tracing::error!(file = %track.file(), error = %msg, "audio playback failed");
            }
            _ => {}
        }
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/registry.rs"]
mod tests;
