//! Pipeline configuration.
//!
//! One configurable pipeline covers every variant of a short: target
//! resolution, which audio layers are present, and how captions look are all
//! data here rather than separate code paths.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::caption::{CaptionMode, CaptionStyle};
use crate::frame::FrameSize;

/// Size every source is resized to before cropping.
pub const DEFAULT_SOURCE_RESOLUTION: FrameSize = FrameSize::new(1920, 1920);

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Output width in pixels (crop width).
    pub target_width: u32,

    /// Output height in pixels (crop height).
    pub target_height: u32,

    /// Size the source is resized to before cropping. `None` crops the
    /// source at its native size.
    #[serde(default = "default_source_resolution")]
    pub source_resolution: Option<FrameSize>,

    /// Whether the source video's own audio is mixed in.
    #[serde(default = "default_true")]
    pub include_original_audio: bool,

    /// Identifier in the known background-track table.
    #[serde(default)]
    pub background_track_id: Option<String>,

    /// Intro stinger audio file.
    #[serde(default)]
    pub intro: Option<PathBuf>,

    /// Outro stinger audio file.
    #[serde(default)]
    pub outro: Option<PathBuf>,

    /// Caption grouping, or `Off` for a composition-only render.
    #[serde(default)]
    pub captions: CaptionMode,

    #[serde(default)]
    pub caption_style: CaptionStyle,

    #[serde(default)]
    pub render: RenderSettings,
}

fn default_true() -> bool {
    true
}

fn default_source_resolution() -> Option<FrameSize> {
    Some(DEFAULT_SOURCE_RESOLUTION)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_width: 900,
            target_height: 1600,
            source_resolution: default_source_resolution(),
            include_original_audio: true,
            background_track_id: None,
            intro: None,
            outro: None,
            captions: CaptionMode::Words,
            caption_style: CaptionStyle::default(),
            render: RenderSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn has_intro(&self) -> bool {
        self.intro.is_some()
    }

    pub fn has_outro(&self) -> bool {
        self.outro.is_some()
    }

    /// Load a pipeline preset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| PipelineConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self =
            serde_json::from_str(&json).map_err(|e| PipelineConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save this configuration as a JSON preset.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PipelineConfigError> {
        let path = path.as_ref();
        let json =
            serde_json::to_string_pretty(self).map_err(|e| PipelineConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        std::fs::write(path, json).map_err(|e| PipelineConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Basic sanity checks that do not need any media.
    pub fn validate(&self) -> Result<(), PipelineConfigError> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(PipelineConfigError::ValidationError {
                message: format!(
                    "Target size must be non-zero, got {}x{}",
                    self.target_width, self.target_height
                ),
            });
        }
        if let Some(size) = self.source_resolution {
            if size.is_empty() {
                return Err(PipelineConfigError::ValidationError {
                    message: format!("Source resolution must be non-zero, got {size}"),
                });
            }
        }
        if self.caption_style.font_size == 0 {
            return Err(PipelineConfigError::ValidationError {
                message: "Caption font size must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Encoder settings for the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub format: ExportFormat,

    /// Video bitrate in kbps.
    pub video_bitrate_kbps: u32,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Mp4H264,
            video_bitrate_kbps: 8000,
            audio_bitrate_kbps: 192,
        }
    }
}

/// Output video format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[serde(rename = "mp4-h264")]
    Mp4H264,
    #[serde(rename = "mp4-h265")]
    Mp4H265,
    Webm,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Mp4H264 | ExportFormat::Mp4H265 => "mp4",
            ExportFormat::Webm => "webm",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp4-h264" => Ok(ExportFormat::Mp4H264),
            "mp4-h265" => Ok(ExportFormat::Mp4H265),
            "webm" => Ok(ExportFormat::Webm),
            other => Err(format!(
                "Unknown format: {other}. Use: mp4-h264, mp4-h265, webm"
            )),
        }
    }
}

/// Errors loading or validating a pipeline preset.
#[derive(Debug, thiserror::Error)]
pub enum PipelineConfigError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error at {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid pipeline config: {message}")]
    ValidationError { message: String },
}
