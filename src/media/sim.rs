//! Deterministic in-process media backend.
//!
//! Time only moves when the host calls [`MediaBackend::poll_events`] with a later `now`; playing
//! handles advance by the elapsed time and report end-of-media when they reach their clip
//! duration. Used by tests and by the headless `kiosk simulate` command.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::foundation::core::{Millis, Size};
use crate::foundation::error::{KioskError, KioskResult};
use crate::media::backend::{
    AudioPlayer, MediaBackend, MediaEvent, MediaEventKind, MediaStatus, PlayerId, VideoPlayer,
};
use crate::media::probe;

/// Duration and frame size a simulated file reports once loaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimClip {
    pub duration: Millis,
    pub size: Size,
}

impl Default for SimClip {
    fn default() -> Self {
        Self {
            duration: Millis(5_000),
            size: Size::new(1280.0, 720.0),
        }
    }
}

/// Point-in-time view of a simulated video handle.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SimVideoSnapshot {
    pub id: PlayerId,
    pub path: PathBuf,
    pub status: MediaStatus,
    pub playing: bool,
    pub position: Millis,
    pub visible: bool,
}

/// Point-in-time view of a simulated audio handle.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SimAudioSnapshot {
    pub id: PlayerId,
    pub path: PathBuf,
    pub playing: bool,
    pub position: Millis,
}

#[derive(Debug)]
struct VideoState {
    path: PathBuf,
    clip: SimClip,
    status: MediaStatus,
    playing: bool,
    position: Millis,
    visible: bool,
    frame_due: bool,
    seek_due: bool,
    size_due: bool,
}

impl VideoState {
    fn ensure_loaded(&mut self) {
        if self.status == MediaStatus::NoMedia {
            self.status = MediaStatus::Loaded;
            self.size_due = true;
            self.frame_due = true;
        }
    }
}

#[derive(Debug)]
struct AudioState {
    path: PathBuf,
    duration: Millis,
    status: MediaStatus,
    playing: bool,
    position: Millis,
}

#[derive(Debug, Default)]
struct SimState {
    next_id: u64,
    now: Millis,
    default_clip: SimClip,
    clips: Vec<(PathBuf, SimClip)>,
    missing: Vec<PathBuf>,
    videos: BTreeMap<PlayerId, VideoState>,
    audios: BTreeMap<PlayerId, AudioState>,
}

impl SimState {
    fn allocate_id(&mut self) -> PlayerId {
        self.next_id += 1;
        PlayerId(self.next_id)
    }

    fn clip_for(&self, path: &Path) -> SimClip {
        self.clips
            .iter()
            .rev()
            .find(|(suffix, _)| path.ends_with(suffix))
            .map(|(_, clip)| *clip)
            .or_else(|| {
                probe::probe_video(path).ok().map(|info| SimClip {
                    duration: info.duration,
                    size: info.native_size(),
                })
            })
            .unwrap_or(self.default_clip)
    }

    fn is_missing(&self, path: &Path) -> bool {
        self.missing.iter().any(|suffix| path.ends_with(suffix))
    }

    fn advance(&mut self, now: Millis) -> Vec<MediaEvent> {
        let dt = now.saturating_sub(self.now);
        self.now = self.now.max(now);

        let mut events = Vec::new();
        for (&player, v) in self.videos.iter_mut() {
            let mut emit = |kind| events.push(MediaEvent { player, kind });
            if std::mem::take(&mut v.size_due) {
                emit(MediaEventKind::SizeChanged);
            }
            if std::mem::take(&mut v.frame_due) {
                emit(MediaEventKind::FrameReady);
            }
            if std::mem::take(&mut v.seek_due) {
                emit(MediaEventKind::SeekSettled);
            }
            if v.playing {
                v.position = v.position + dt;
                if v.position >= v.clip.duration {
                    v.position = v.clip.duration;
                    v.playing = false;
                    v.status = MediaStatus::EndOfMedia;
                    emit(MediaEventKind::EndOfMedia);
                }
            }
        }
        for (&player, a) in self.audios.iter_mut() {
            if a.playing {
                a.position = a.position + dt;
                if a.position >= a.duration {
                    a.position = a.duration;
                    a.playing = false;
                    a.status = MediaStatus::EndOfMedia;
                    events.push(MediaEvent {
                        player,
                        kind: MediaEventKind::EndOfMedia,
                    });
                }
            }
        }
        events
    }
}

/// Cloneable handle to one simulated media world; clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct SimulatedBackend {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure files whose path ends with `file`.
    pub fn with_clip(self, file: &str, duration: Millis, size: Size) -> Self {
        self.set_clip(file, SimClip { duration, size });
        self
    }

    pub fn set_clip(&self, file: &str, clip: SimClip) {
        self.state
            .borrow_mut()
            .clips
            .push((PathBuf::from(file), clip));
    }

    pub fn set_default_clip(&self, clip: SimClip) {
        self.state.borrow_mut().default_clip = clip;
    }

    /// Make opening any file whose path ends with `file` fail.
    pub fn mark_missing(&self, file: &str) {
        self.state.borrow_mut().missing.push(PathBuf::from(file));
    }

    pub fn now(&self) -> Millis {
        self.state.borrow().now
    }

    pub fn videos(&self) -> Vec<SimVideoSnapshot> {
        self.state
            .borrow()
            .videos
            .iter()
            .map(|(&id, v)| SimVideoSnapshot {
                id,
                path: v.path.clone(),
                status: v.status,
                playing: v.playing,
                position: v.position,
                visible: v.visible,
            })
            .collect()
    }

    pub fn video(&self, id: PlayerId) -> Option<SimVideoSnapshot> {
        self.videos().into_iter().find(|v| v.id == id)
    }

    pub fn audios(&self) -> Vec<SimAudioSnapshot> {
        self.state
            .borrow()
            .audios
            .iter()
            .map(|(&id, a)| SimAudioSnapshot {
                id,
                path: a.path.clone(),
                playing: a.playing,
                position: a.position,
            })
            .collect()
    }

    /// Audible handles whose path ends with `file`.
    pub fn playing_audio(&self, file: &str) -> Vec<SimAudioSnapshot> {
        self.audios()
            .into_iter()
            .filter(|a| a.playing && a.path.ends_with(file))
            .collect()
    }
}

impl MediaBackend for SimulatedBackend {
    fn open_video(&mut self, path: &Path) -> KioskResult<Box<dyn VideoPlayer>> {
        let mut st = self.state.borrow_mut();
        if st.is_missing(path) {
            return Err(KioskError::media(format!(
                "video source '{}' not found",
                path.display()
            )));
        }
        let clip = st.clip_for(path);
        let id = st.allocate_id();
        st.videos.insert(
            id,
            VideoState {
                path: path.to_path_buf(),
                clip,
                status: MediaStatus::NoMedia,
                playing: false,
                position: Millis::ZERO,
                visible: false,
                frame_due: false,
                seek_due: false,
                size_due: false,
            },
        );
        Ok(Box::new(SimVideo {
            id,
            state: Rc::clone(&self.state),
        }))
    }

    fn open_audio(&mut self, path: &Path) -> KioskResult<Box<dyn AudioPlayer>> {
        let mut st = self.state.borrow_mut();
        if st.is_missing(path) {
            return Err(KioskError::media(format!(
                "audio source '{}' not found",
                path.display()
            )));
        }
        let duration = st.clip_for(path).duration;
        let id = st.allocate_id();
        st.audios.insert(
            id,
            AudioState {
                path: path.to_path_buf(),
                duration,
                status: MediaStatus::NoMedia,
                playing: false,
                position: Millis::ZERO,
            },
        );
        Ok(Box::new(SimAudio {
            id,
            state: Rc::clone(&self.state),
        }))
    }

    fn poll_events(&mut self, now: Millis) -> Vec<MediaEvent> {
        self.state.borrow_mut().advance(now)
    }
}

struct SimVideo {
    id: PlayerId,
    state: Rc<RefCell<SimState>>,
}

impl SimVideo {
    fn with<R>(&self, f: impl FnOnce(&mut VideoState) -> R) -> Option<R> {
        self.state.borrow_mut().videos.get_mut(&self.id).map(f)
    }
}

impl VideoPlayer for SimVideo {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn status(&self) -> MediaStatus {
        self.with(|v| v.status).unwrap_or(MediaStatus::Invalid)
    }

    fn play(&mut self) {
        self.with(|v| {
            v.ensure_loaded();
            if v.position >= v.clip.duration {
                v.position = Millis::ZERO;
            }
            v.status = MediaStatus::Loaded;
            v.playing = true;
        });
    }

    fn pause(&mut self) {
        self.with(|v| {
            v.ensure_loaded();
            v.playing = false;
        });
    }

    fn stop(&mut self) {
        self.with(|v| {
            v.playing = false;
            v.position = Millis::ZERO;
            if v.status == MediaStatus::EndOfMedia {
                v.status = MediaStatus::Loaded;
            }
        });
    }

    fn set_position(&mut self, pos: Millis) {
        self.with(|v| {
            v.position = pos.min(v.clip.duration);
            v.seek_due = true;
            if v.status == MediaStatus::EndOfMedia && v.position < v.clip.duration {
                v.status = MediaStatus::Loaded;
            }
        });
    }

    fn position(&self) -> Millis {
        self.with(|v| v.position).unwrap_or(Millis::ZERO)
    }

    fn duration(&self) -> Option<Millis> {
        self.with(|v| (v.status != MediaStatus::NoMedia).then_some(v.clip.duration))
            .flatten()
    }

    fn set_visible(&mut self, visible: bool) {
        self.with(|v| v.visible = visible);
    }

    fn is_visible(&self) -> bool {
        self.with(|v| v.visible).unwrap_or(false)
    }

    fn native_size(&self) -> Option<Size> {
        self.with(|v| (v.status != MediaStatus::NoMedia).then_some(v.clip.size))
            .flatten()
    }

    fn latest_frame(&self) -> Option<image::RgbaImage> {
        self.with(|v| {
            if matches!(v.status, MediaStatus::NoMedia | MediaStatus::Invalid) {
                return None;
            }
            let shade = v
                .path
                .to_string_lossy()
                .bytes()
                .fold(0u8, |acc, b| acc.wrapping_add(b));
            Some(image::RgbaImage::from_pixel(
                v.clip.size.width.max(1.0) as u32,
                v.clip.size.height.max(1.0) as u32,
                image::Rgba([shade, shade.wrapping_mul(3), shade.wrapping_mul(7), 255]),
            ))
        })
        .flatten()
    }
}

struct SimAudio {
    id: PlayerId,
    state: Rc<RefCell<SimState>>,
}

impl SimAudio {
    fn with<R>(&self, f: impl FnOnce(&mut AudioState) -> R) -> Option<R> {
        self.state.borrow_mut().audios.get_mut(&self.id).map(f)
    }
}

impl AudioPlayer for SimAudio {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn status(&self) -> MediaStatus {
        self.with(|a| a.status).unwrap_or(MediaStatus::Invalid)
    }

    fn play(&mut self) {
        self.with(|a| {
            if a.position >= a.duration {
                a.position = Millis::ZERO;
            }
            a.status = MediaStatus::Loaded;
            a.playing = true;
        });
    }

    fn stop(&mut self) {
        self.with(|a| {
            a.playing = false;
            a.position = Millis::ZERO;
        });
    }

    fn set_position(&mut self, pos: Millis) {
        self.with(|a| a.position = pos.min(a.duration));
    }

    fn position(&self) -> Millis {
        self.with(|a| a.position).unwrap_or(Millis::ZERO)
    }

    fn is_playing(&self) -> bool {
        self.with(|a| a.playing).unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/sim.rs"]
mod tests;
