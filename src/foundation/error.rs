/// Convenience result type used across kiosk.
pub type KioskResult<T> = Result<T, KioskError>;

/// Top-level error taxonomy used by the presentation APIs.
#[derive(thiserror::Error, Debug)]
pub enum KioskError {
    /// Invalid user-provided scene or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A scene definition could not be found or built.
    #[error("scene load error: {0}")]
    SceneLoad(String),

    /// Errors reported by the media backend (open, decode, playback).
    #[error("media error: {0}")]
    Media(String),

    /// Errors when serializing or deserializing documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KioskError {
    /// Build a [`KioskError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KioskError::SceneLoad`] value.
    pub fn scene_load(msg: impl Into<String>) -> Self {
        Self::SceneLoad(msg.into())
    }

    /// Build a [`KioskError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`KioskError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
