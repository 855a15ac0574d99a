use std::path::{Path, PathBuf};

use crate::foundation::error::{KioskError, KioskResult};

/// Normalize and validate scene-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> KioskResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(KioskError::validation(format!(
            "asset path '{source}' must be relative"
        )));
    }
    if s.trim().is_empty() {
        return Err(KioskError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(KioskError::validation(format!(
                "asset path '{source}' must not contain '..'"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(KioskError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Folders that scene documents resolve their media file names against.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssetRoots {
    /// Folder holding video layer files.
    pub video: PathBuf,
    /// Folder holding audio track and sound-effect files.
    pub audio: PathBuf,
    /// Folder holding overlay graphics.
    pub image: PathBuf,
}

impl Default for AssetRoots {
    fn default() -> Self {
        Self::under(Path::new("."))
    }
}

impl AssetRoots {
    /// Conventional `assets/{video,audio,image}` layout below `base`.
    pub fn under(base: &Path) -> Self {
        let assets = base.join("assets");
        Self {
            video: assets.join("video"),
            audio: assets.join("audio"),
            image: assets.join("image"),
        }
    }

    pub fn video_path(&self, file: &str) -> KioskResult<PathBuf> {
        Ok(self.video.join(normalize_rel_path(file)?))
    }

    pub fn audio_path(&self, file: &str) -> KioskResult<PathBuf> {
        Ok(self.audio.join(normalize_rel_path(file)?))
    }

    pub fn image_path(&self, file: &str) -> KioskResult<PathBuf> {
        Ok(self.image.join(normalize_rel_path(file)?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/paths.rs"]
mod tests;
