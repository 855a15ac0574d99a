use std::collections::BTreeMap;
use std::path::Path;

use crate::assets::paths::normalize_rel_path;
use crate::foundation::core::Millis;
use crate::foundation::error::{KioskError, KioskResult};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Declarative definition of one scene, parsed once and never mutated.
///
/// Every field is optional in the document; an empty document is a valid (if silent) scene.
pub struct SceneSpec {
    /// Display name; informational only, scenes are addressed by document name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Video layers in declaration order; the first one is the primary layer.
    pub videos: Vec<VideoSpec>,
    /// Audio tracks this scene wants live while it is current.
    pub audio: Vec<AudioSpec>,
    /// Image and arrow overlays.
    pub overlays: Vec<OverlaySpec>,
    /// Menu entries the arrow overlay cycles through.
    pub arrow_positions: Vec<ArrowPositionSpec>,
    /// Key name to target scene.
    pub transitions: BTreeMap<String, String>,
    /// Auto-transition target once the video ends; ignored for menu scenes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_scene: Option<String>,
    /// Target of the back command; also this scene's predecessor for background inheritance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_scene: Option<String>,
    /// Whether select may skip the running video.
    pub allow_skip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_sound: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One video layer.
pub struct VideoSpec {
    /// File below the video asset root.
    pub file: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: i32,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Restart at end-of-media until a transition is requested.
    #[serde(default, rename = "loop")]
    pub looping: bool,
    /// Deferred start after the scene starts.
    #[serde(default)]
    pub delay: Millis,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// One audio track.
pub struct AudioSpec {
    /// File below the audio asset root; also the continuity key.
    pub file: String,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub delay: Millis,
    /// Offset used when navigating back into the scene.
    #[serde(default)]
    pub start: Millis,
}

impl AudioSpec {
    /// Spec for a one-shot sound effect.
    pub fn effect(file: &str) -> Self {
        Self {
            file: file.to_string(),
            looping: false,
            delay: Millis::ZERO,
            start: Millis::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Overlay flavour.
pub enum OverlayKind {
    /// Static picture.
    #[default]
    Image,
    /// Menu selection cursor.
    Arrow,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One graphical overlay.
pub struct OverlaySpec {
    #[serde(default, rename = "type")]
    pub kind: OverlayKind,
    /// File below the image asset root.
    pub file: String,
    #[serde(default)]
    pub position: [f64; 2],
    /// Base scale; arrows are additionally scaled with the displayed content.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Stay hidden until the scene's video ends.
    #[serde(default)]
    pub active_on_end: bool,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// One arrow-menu entry.
///
/// `sx`/`sy` are fractions of the displayed content rectangle and win over absolute `x`/`y` when
/// both are present.
pub struct ArrowPositionSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Scene selected by this entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
}

/// Resolved coordinates of an arrow entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ArrowCoords {
    /// Fractions of the content rectangle.
    Scaled { sx: f64, sy: f64 },
    /// Viewport coordinates.
    Absolute { x: f64, y: f64 },
}

impl ArrowPositionSpec {
    pub fn coords(&self) -> ArrowCoords {
        match (self.sx, self.sy) {
            (Some(sx), Some(sy)) => ArrowCoords::Scaled { sx, sy },
            _ => ArrowCoords::Absolute {
                x: self.x.unwrap_or(0.0),
                y: self.y.unwrap_or(0.0),
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Sound effects opened once at startup.
pub struct PreloadSpec {
    pub sounds: Vec<AudioSpec>,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_scale() -> f64 {
    1.0
}

/// Document formats accepted for scene and preload files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocFormat {
    Yaml,
    Json,
}

impl DocFormat {
    /// Pick a format from a file extension (`yaml`, `yml`, `json`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Deserialize a document; an empty YAML document yields `T::default()`.
    pub fn parse<T>(self, text: &str) -> KioskResult<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self {
            Self::Yaml if text.trim().is_empty() => Ok(T::default()),
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| KioskError::serde(e.to_string())),
            Self::Json => serde_json::from_str(text).map_err(|e| KioskError::serde(e.to_string())),
        }
    }
}

impl SceneSpec {
    pub fn from_yaml_str(text: &str) -> KioskResult<Self> {
        let spec: Self = DocFormat::Yaml.parse(text)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_json_str(text: &str) -> KioskResult<Self> {
        let spec: Self = DocFormat::Json.parse(text)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Read and validate a scene document, choosing the parser by extension.
    pub fn from_path(path: &Path) -> KioskResult<Self> {
        let format = DocFormat::from_path(path).ok_or_else(|| {
            KioskError::validation(format!(
                "unsupported scene document '{}' (expected .yaml, .yml or .json)",
                path.display()
            ))
        })?;
        let text = std::fs::read_to_string(path).map_err(|e| {
            KioskError::scene_load(format!("read '{}': {e}", path.display()))
        })?;
        let spec: Self = format.parse(&text)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Reject documents whose numbers cannot be laid out at all.
    ///
    /// Per-asset problems never fail a load: a bad file name leaves that layer or track inert, and
    /// a menu without an arrow overlay simply has no cursor. [`SceneSpec::asset_problems`] lists
    /// them.
    pub fn validate(&self) -> KioskResult<()> {
        for (i, v) in self.videos.iter().enumerate() {
            if ![v.x, v.y, v.opacity].iter().all(|n| n.is_finite()) {
                return Err(KioskError::validation(format!(
                    "videos[{i}] position and opacity must be finite"
                )));
            }
        }
        for (i, o) in self.overlays.iter().enumerate() {
            if ![o.position[0], o.position[1], o.scale].iter().all(|n| n.is_finite()) {
                return Err(KioskError::validation(format!(
                    "overlays[{i}] position and scale must be finite"
                )));
            }
        }
        for (i, p) in self.arrow_positions.iter().enumerate() {
            let finite = [p.sx, p.sy, p.x, p.y]
                .into_iter()
                .flatten()
                .all(f64::is_finite);
            if !finite {
                return Err(KioskError::validation(format!(
                    "arrow_positions[{i}] coordinates must be finite"
                )));
            }
        }
        Ok(())
    }

    /// Problems that degrade single assets without blocking the scene.
    pub fn asset_problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (i, v) in self.videos.iter().enumerate() {
            check_file(&mut out, &v.file, &format!("videos[{i}].file"));
            if !(0.0..=1.0).contains(&v.opacity) {
                out.push(format!("videos[{i}].opacity {} is clamped to [0, 1]", v.opacity));
            }
        }
        for (i, a) in self.audio.iter().enumerate() {
            check_file(&mut out, &a.file, &format!("audio[{i}].file"));
        }
        for (i, o) in self.overlays.iter().enumerate() {
            check_file(&mut out, &o.file, &format!("overlays[{i}].file"));
            if o.scale <= 0.0 {
                out.push(format!("overlays[{i}].scale {} falls back to 1", o.scale));
            }
        }
        if !self.arrow_positions.is_empty() && self.arrow_overlay().is_none() {
            out.push("arrow_positions without an overlay of type 'arrow' stay inactive".into());
        }
        for (field, file) in [
            ("move_sound", &self.move_sound),
            ("select_sound", &self.select_sound),
        ] {
            if let Some(file) = file {
                check_file(&mut out, file, field);
            }
        }
        out
    }

    /// Index of the first arrow overlay.
    pub fn arrow_overlay(&self) -> Option<usize> {
        self.overlays
            .iter()
            .position(|o| o.kind == OverlayKind::Arrow)
    }

    /// Auto-transition target; menu scenes never auto-transition.
    pub fn auto_transition(&self) -> Option<&str> {
        if self.arrow_positions.is_empty() {
            self.next_scene.as_deref()
        } else {
            None
        }
    }

    /// Every scene name this document refers to.
    pub fn referenced_scenes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        out.extend(self.next_scene.as_deref());
        out.extend(self.back_scene.as_deref());
        out.extend(
            self.arrow_positions
                .iter()
                .filter_map(|p| p.scene.as_deref()),
        );
        out.extend(self.transitions.values().map(String::as_str));
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Filenames named in `audio`.
    pub fn audio_files(&self) -> std::collections::BTreeSet<String> {
        self.audio.iter().map(|a| a.file.clone()).collect()
    }
}

impl PreloadSpec {
    /// Sound files that cannot be resolved; those effects stay silent.
    pub fn asset_problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (i, s) in self.sounds.iter().enumerate() {
            check_file(&mut out, &s.file, &format!("sounds[{i}].file"));
        }
        out
    }
}

fn check_file(out: &mut Vec<String>, file: &str, field: &str) {
    if let Err(e) = normalize_rel_path(file) {
        match e {
            KioskError::Validation(msg) => out.push(format!("{field}: {msg}")),
            other => out.push(format!("{field}: {other}")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
