use std::path::Path;

use crate::assets::paths::AssetRoots;
use crate::foundation::core::{Millis, Size};
use crate::foundation::error::{KioskError, KioskResult};
use crate::scene::model::DocFormat;
use crate::scene::scene::SceneTuning;

/// Options controlling [`crate::TransitionCoordinator`] timing and asset lookup.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CoordinatorOpts {
    /// Scene started by `TransitionCoordinator::start`.
    pub entry_scene: String,
    /// Document declaring sound effects to open at startup.
    pub preload_doc: String,
    /// Wait after preloading a target scene before committing the switch.
    pub preload_grace: Millis,
    /// Bound on waiting for a forced seek-to-end when going forward.
    pub forward_seek_settle: Millis,
    /// Bound on priming and seeking the back-scene source when going back.
    pub back_seek_settle: Millis,
    /// A source video closer than this to its end is captured without seeking.
    pub end_tolerance: Millis,
    /// Minimum playback before an end-of-media may auto-transition.
    pub played_threshold: Millis,
    /// Distance from the end a skip lands at.
    pub skip_epsilon: Millis,
    /// Content size for scaled arrow positions when no video or background is shown.
    pub fallback_canvas: Size,
    /// Asset folders.
    pub assets: AssetRoots,
}

impl Default for CoordinatorOpts {
    fn default() -> Self {
        Self {
            entry_scene: "_default".to_string(),
            preload_doc: "preload".to_string(),
            preload_grace: Millis(50),
            forward_seek_settle: Millis(200),
            back_seek_settle: Millis(300),
            end_tolerance: Millis(100),
            played_threshold: Millis(100),
            skip_epsilon: Millis(10),
            fallback_canvas: Size::new(1920.0, 1080.0),
            assets: AssetRoots::default(),
        }
    }
}

impl CoordinatorOpts {
    /// Load options from a YAML or JSON file; missing fields keep their defaults.
    pub fn from_path(path: &Path) -> KioskResult<Self> {
        let format = DocFormat::from_path(path).ok_or_else(|| {
            KioskError::validation(format!(
                "unsupported config '{}' (expected .yaml, .yml or .json)",
                path.display()
            ))
        })?;
        let text = std::fs::read_to_string(path)
            .map_err(|e| KioskError::validation(format!("read '{}': {e}", path.display())))?;
        let opts: Self = format.parse(&text)?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> KioskResult<()> {
        if self.entry_scene.trim().is_empty() {
            return Err(KioskError::validation("entry_scene must be non-empty"));
        }
        let canvas = self.fallback_canvas;
        if !(canvas.width.is_finite() && canvas.height.is_finite())
            || canvas.width <= 0.0
            || canvas.height <= 0.0
        {
            return Err(KioskError::validation(
                "fallback_canvas width/height must be finite and > 0",
            ));
        }
        Ok(())
    }

    pub fn scene_tuning(&self) -> SceneTuning {
        SceneTuning {
            played_threshold: self.played_threshold,
            skip_epsilon: self.skip_epsilon,
            fallback_canvas: self.fallback_canvas,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
