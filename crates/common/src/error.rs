//! Error types shared across Reelcap crates.
//!
//! Every failure is fatal to the current run. Domain variants carry the
//! offending parameter so the operator can see what to change.

use std::path::PathBuf;

/// Top-level error type for Reelcap operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelcapError {
    #[error("Transcript contains no words to caption")]
    EmptyTranscript,

    #[error("Word {index} has invalid timing ({start_secs}s -> {end_secs}s)")]
    InvalidWordTiming {
        index: usize,
        start_secs: f64,
        end_secs: f64,
    },

    #[error("Background track '{track_id}' is not registered in the known-track table")]
    UnknownBackgroundTrack { track_id: String },

    #[error("Gain {gain} for '{layer}' is outside (0, 1]")]
    InvalidGain { layer: String, gain: f64 },

    #[error(
        "Background track '{track_id}' is too short: needs {required_secs:.3}s, has {available_secs:.3}s"
    )]
    BackgroundTrackTooShort {
        track_id: String,
        required_secs: f64,
        available_secs: f64,
    },

    #[error("Outro ({outro_secs:.3}s) is longer than the timeline ({timeline_secs:.3}s)")]
    InvalidOutroPlacement { outro_secs: f64, timeline_secs: f64 },

    #[error("Audio mix has no layers; refusing to render silence")]
    EmptyMix,

    #[error(
        "Cannot crop {target_width}x{target_height} out of a {native_width}x{native_height} source"
    )]
    UnsupportedAspect {
        native_width: u32,
        native_height: u32,
        target_width: u32,
        target_height: u32,
    },

    #[error("Timeline has no caption layers but captions were required")]
    EmptyTimeline,

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Transcription error: {message}")]
    Transcription { message: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelcapError.
pub type ReelcapResult<T> = Result<T, ReelcapError>;

impl ReelcapError {
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn transcription(msg: impl Into<String>) -> Self {
        Self::Transcription {
            message: msg.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}
