use std::path::{Path, PathBuf};

#[cfg(feature = "media-ffmpeg")]
use crate::foundation::error::KioskError;
use crate::foundation::core::{Millis, Size};
use crate::foundation::error::KioskResult;

/// Metadata of a media file on disk.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration: Millis,
}

impl VideoSourceInfo {
    pub fn native_size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> KioskResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| KioskError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(KioskError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| KioskError::media(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| KioskError::media("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| KioskError::media("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| KioskError::media("missing video height from ffprobe"))?;

    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration: Millis((duration_sec.max(0.0) * 1000.0).round() as u64),
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> KioskResult<VideoSourceInfo> {
    Err(crate::foundation::error::KioskError::media(
        "probing media files requires the 'media-ffmpeg' feature",
    ))
}
