//! kiosk drives a branching video presentation: scenes made of video layers, audio tracks and
//! overlays, connected by a transition graph the viewer steers with a handful of keys.
//!
//! The crate is the orchestration core. Decoding and drawing stay with the host, behind two seams:
//!
//! - a [`MediaBackend`] that opens [`VideoPlayer`]/[`AudioPlayer`] handles and reports
//!   [`MediaEvent`]s
//! - a [`Surface`] that applies the [`Placement`] computed for each video and background
//!
//! The host builds a [`TransitionCoordinator`] over a [`SceneSource`], calls
//! [`TransitionCoordinator::start`], then forwards key presses to
//! [`TransitionCoordinator::handle_key`] and the current time to
//! [`TransitionCoordinator::update`]. [`SimulatedBackend`] and [`RecordingSurface`] stand in for
//! real collaborators in tests and headless runs.
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod media;
pub(crate) mod render;
pub(crate) mod scene;
pub(crate) mod session;

pub use crate::assets::paths::{AssetRoots, normalize_rel_path};
pub use crate::foundation::core::{Affine, Direction, Millis, Point, Rect, Size, Vec2};
pub use crate::foundation::error::{KioskError, KioskResult};

pub use crate::media::audio::AudioTrack;
pub use crate::media::backend::{
    AudioPlayer, MediaBackend, MediaEvent, MediaEventKind, MediaStatus, PlayerId, VideoPlayer,
};
pub use crate::media::layer::{LayerEvent, LayerProps, LayerState, MediaLayer};
pub use crate::media::probe::{VideoSourceInfo, probe_video};
pub use crate::media::registry::AudioRegistry;
pub use crate::media::sim::{SimAudioSnapshot, SimClip, SimVideoSnapshot, SimulatedBackend};
pub use crate::media::sounds::SoundBank;
pub use crate::render::background::InheritedBackground;
pub use crate::render::placement::{Placement, fit_to_viewport};
pub use crate::render::surface::{LayoutTarget, NullSurface, RecordingSurface, Surface};
pub use crate::scene::menu::ArrowMenu;
pub use crate::scene::model::{
    ArrowCoords, ArrowPositionSpec, AudioSpec, DocFormat, OverlayKind, OverlaySpec, PreloadSpec,
    SceneSpec, VideoSpec,
};
pub use crate::scene::overlay::{OVERLAY_Z, Overlay};
pub use crate::scene::scene::{Scene, SceneTuning};
pub use crate::scene::store::{DirectorySource, InMemorySource, SceneSource, SceneStore};
pub use crate::session::coordinator::{CommittedTransition, SwitchStatus, TransitionCoordinator};
pub use crate::session::input::{Command, Key};
pub use crate::session::opts::CoordinatorOpts;
pub use crate::session::requests::{TransitionRequest, TransitionRequests};
