//! Media probing through ffprobe.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use reelcap_common::error::{ReelcapError, ReelcapResult};
use reelcap_common::process::command_exists;
use reelcap_project_model::audio::AudioRef;
use reelcap_project_model::timeline::VideoSource;

/// Properties of one media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub duration_secs: f64,
    /// First video stream, if the file has one.
    pub video: Option<VideoInfo>,
    pub has_audio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

impl MediaInfo {
    /// View this file as the pipeline's source video.
    pub fn video_source(&self) -> ReelcapResult<VideoSource> {
        let video = self.video.ok_or_else(|| {
            ReelcapError::probe(format!("{} has no video stream", self.path.display()))
        })?;
        Ok(VideoSource {
            path: self.path.clone(),
            width: video.width,
            height: video.height,
            duration_secs: self.duration_secs,
            frame_rate: video.frame_rate,
        })
    }

    /// View this file as an audio source labelled `id`.
    pub fn audio_ref(&self, id: impl Into<String>) -> AudioRef {
        AudioRef::new(id, self.path.clone(), self.duration_secs)
    }
}

/// Reads duration, dimensions and frame rate of media files.
pub trait MediaProbe {
    fn probe(&self, path: &Path) -> ReelcapResult<MediaInfo>;
}

/// [`MediaProbe`] backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: String,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeProbe {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }
}

impl MediaProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> ReelcapResult<MediaInfo> {
        if !path.exists() {
            return Err(ReelcapError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .map_err(|e| ReelcapError::probe(format!("Failed to start {}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(ReelcapError::probe(format!(
                "{} failed on {} (status {}): {}",
                self.binary,
                path.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        let info = parse_ffprobe_json(path, &json)?;
        tracing::debug!(
            path = %path.display(),
            duration_secs = info.duration_secs,
            video = ?info.video,
            has_audio = info.has_audio,
            "Probed media"
        );
        Ok(info)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_ffprobe_json(path: &Path, json: &str) -> ReelcapResult<MediaInfo> {
    let parsed: FfprobeOutput = serde_json::from_str(json)?;

    let format_duration = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_seconds);
    let stream_duration = parsed
        .streams
        .iter()
        .filter_map(|s| s.duration.as_deref().and_then(parse_seconds))
        .reduce(f64::max);
    let duration_secs = format_duration.or(stream_duration).ok_or_else(|| {
        ReelcapError::probe(format!("No duration reported for {}", path.display()))
    })?;

    let video = match parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
    {
        Some(stream) => {
            let (width, height) = match (stream.width, stream.height) {
                (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
                _ => {
                    return Err(ReelcapError::probe(format!(
                        "Video stream in {} has no dimensions",
                        path.display()
                    )))
                }
            };
            let frame_rate = stream
                .r_frame_rate
                .as_deref()
                .and_then(parse_rational)
                .or_else(|| stream.avg_frame_rate.as_deref().and_then(parse_rational))
                .ok_or_else(|| {
                    ReelcapError::probe(format!("No frame rate reported for {}", path.display()))
                })?;
            Some(VideoInfo {
                width,
                height,
                frame_rate,
            })
        }
        None => None,
    };

    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(MediaInfo {
        path: path.to_path_buf(),
        duration_secs,
        video,
        has_audio,
    })
}

fn parse_seconds(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
}

/// `"30000/1001"` or `"25"`; zero denominators are rejected.
fn parse_rational(raw: &str) -> Option<f64> {
    let value = match raw.trim().split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f64>().ok()?;
            let den = den.parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDSCAPE: &str = r#"{
        "streams": [
            {"codec_type": "video", "width": 1920, "height": 1080,
             "r_frame_rate": "30000/1001", "avg_frame_rate": "30000/1001", "duration": "1.401"},
            {"codec_type": "audio", "duration": "1.400"}
        ],
        "format": {"duration": "1.400000"}
    }"#;

    #[test]
    fn test_parse_video_with_audio() {
        let info = parse_ffprobe_json(Path::new("in.mp4"), LANDSCAPE).unwrap();
        assert_eq!(info.duration_secs, 1.4);
        assert!(info.has_audio);
        let video = info.video.unwrap();
        assert_eq!((video.width, video.height), (1920, 1080));
        assert!((video.frame_rate - 29.97).abs() < 0.01);

        let source = info.video_source().unwrap();
        assert_eq!(source.path, PathBuf::from("in.mp4"));
        assert_eq!(source.duration_secs, 1.4);
    }

    #[test]
    fn test_audio_only_file() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "93.5"}}"#;
        let info = parse_ffprobe_json(Path::new("bed.mp3"), json).unwrap();
        assert!(info.video.is_none());
        assert!(info.video_source().is_err());
        assert_eq!(info.audio_ref("bed").duration_secs, 93.5);
    }

    #[test]
    fn test_stream_duration_fallback() {
        let json = r#"{"streams": [
            {"codec_type": "audio", "duration": "2.5"},
            {"codec_type": "audio", "duration": "3.0"}
        ]}"#;
        let info = parse_ffprobe_json(Path::new("a.wav"), json).unwrap();
        assert_eq!(info.duration_secs, 3.0);
    }

    #[test]
    fn test_missing_duration_is_probe_error() {
        let json = r#"{"streams": [], "format": {}}"#;
        assert!(matches!(
            parse_ffprobe_json(Path::new("x"), json),
            Err(ReelcapError::Probe { .. })
        ));
    }

    #[test]
    fn test_rational_parsing() {
        assert_eq!(parse_rational("25"), Some(25.0));
        assert_eq!(parse_rational("50/2"), Some(25.0));
        assert_eq!(parse_rational("0/0"), None);
        assert_eq!(parse_rational("garbage"), None);
    }

    #[test]
    fn test_avg_frame_rate_used_when_r_frame_rate_invalid() {
        let json = r#"{"streams": [
            {"codec_type": "video", "width": 640, "height": 360,
             "r_frame_rate": "0/0", "avg_frame_rate": "24/1"}
        ], "format": {"duration": "4"}}"#;
        let info = parse_ffprobe_json(Path::new("v.mp4"), json).unwrap();
        assert_eq!(info.video.unwrap().frame_rate, 24.0);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let probe = FfprobeProbe::default();
        assert!(matches!(
            probe.probe(Path::new("/nonexistent/clip.mp4")),
            Err(ReelcapError::FileNotFound { .. })
        ));
    }
}
