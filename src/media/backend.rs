use std::path::Path;

use crate::foundation::core::{Millis, Size};
use crate::foundation::error::KioskResult;

/// Backend-assigned identity of one playback handle.
///
/// Every handle opened through a [`MediaBackend`] gets a distinct id; events are routed back to the
/// owning layer or track by this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct PlayerId(pub u64);

/// Load state of a playback handle, as reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum MediaStatus {
    /// Nothing has been decoded yet.
    NoMedia,
    /// The backend is opening/decoding the source.
    Loading,
    /// A first frame (or the first audio buffer) is available.
    Loaded,
    /// Playback reached the end of the source.
    EndOfMedia,
    /// The source could not be decoded.
    Invalid,
}

/// Notification delivered by the backend on its own schedule.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaEvent {
    /// Handle the event refers to.
    pub player: PlayerId,
    /// What happened.
    pub kind: MediaEventKind,
}

/// Kinds of backend notifications consumed by the coordinator.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaEventKind {
    /// Playback reached the end of the source.
    EndOfMedia,
    /// A decoded frame is available for display/capture.
    FrameReady,
    /// A previously requested seek completed.
    SeekSettled,
    /// The native frame size became known or changed.
    SizeChanged,
    /// Playback/decode failure; the handle is left stalled.
    Error(String),
}

/// One video playback handle plus the graphics item it renders into.
pub trait VideoPlayer {
    /// Stable identity of this handle.
    fn id(&self) -> PlayerId;
    /// Current load state.
    fn status(&self) -> MediaStatus;
    /// Start or resume playback.
    fn play(&mut self);
    /// Pause, holding the current frame (primes decoding when nothing is loaded yet).
    fn pause(&mut self);
    /// Halt playback.
    fn stop(&mut self);
    /// Request a seek; completion is signalled with [`MediaEventKind::SeekSettled`].
    fn set_position(&mut self, pos: Millis);
    /// Current playback position.
    fn position(&self) -> Millis;
    /// Source duration once known.
    fn duration(&self) -> Option<Millis>;
    /// Show or hide the graphics item.
    fn set_visible(&mut self, visible: bool);
    /// Whether the graphics item is shown.
    fn is_visible(&self) -> bool;
    /// Native frame size once known.
    fn native_size(&self) -> Option<Size>;
    /// Most recently decoded frame, if any.
    fn latest_frame(&self) -> Option<image::RgbaImage>;
}

/// One audio playback handle.
pub trait AudioPlayer {
    /// Stable identity of this handle.
    fn id(&self) -> PlayerId;
    /// Current load state.
    fn status(&self) -> MediaStatus;
    /// Start or resume playback.
    fn play(&mut self);
    /// Halt playback.
    fn stop(&mut self);
    /// Move the playback position.
    fn set_position(&mut self, pos: Millis);
    /// Current playback position.
    fn position(&self) -> Millis;
    /// Whether audio is currently audible.
    fn is_playing(&self) -> bool;
}

/// Platform media-decode backend.
///
/// The coordinator opens handles through this trait and pulls notifications with
/// [`MediaBackend::poll_events`] once per host loop iteration; backends that receive
/// notifications on other threads queue them until polled.
pub trait MediaBackend {
    /// Open a video source; the returned handle starts hidden and idle.
    fn open_video(&mut self, path: &Path) -> KioskResult<Box<dyn VideoPlayer>>;
    /// Open an audio source; the returned handle starts stopped at position zero.
    fn open_audio(&mut self, path: &Path) -> KioskResult<Box<dyn AudioPlayer>>;
    /// Drain notifications produced up to `now`.
    fn poll_events(&mut self, now: Millis) -> Vec<MediaEvent>;
}
