//! Application configuration.
//!
//! The configuration is loaded once at process start and passed by
//! reference into each pipeline run. Nothing here is global or mutable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReelcapError, ReelcapResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where rendered shorts are written by default.
    pub output_dir: PathBuf,

    /// Known background tracks, keyed by identifier.
    #[serde(default)]
    pub background_tracks: BackgroundTrackTable,

    /// Renderer defaults.
    #[serde(default)]
    pub render: RenderDefaults,

    /// Speech-to-text defaults.
    #[serde(default)]
    pub transcription: TranscriptionDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A pre-declared background track: where it lives, how loud it plays,
/// and where playback starts inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundTrack {
    /// Path to the audio file.
    pub path: PathBuf,

    /// Linear gain in (0, 1].
    pub gain: f64,

    /// Seconds into the track where playback begins.
    pub seek_offset_secs: f64,
}

/// Mapping from background-track identifier to its declared settings.
///
/// An identifier that is not in the table is a hard failure, never a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackgroundTrackTable {
    tracks: BTreeMap<String, BackgroundTrack>,
}

impl BackgroundTrackTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a track.
    pub fn insert(&mut self, id: impl Into<String>, track: BackgroundTrack) {
        self.tracks.insert(id.into(), track);
    }

    /// Look up a track, validating its declared gain and seek offset.
    pub fn lookup(&self, id: &str) -> ReelcapResult<&BackgroundTrack> {
        let track = self
            .tracks
            .get(id)
            .ok_or_else(|| ReelcapError::UnknownBackgroundTrack {
                track_id: id.to_string(),
            })?;
        validate_track(id, track)?;
        Ok(track)
    }

    /// Validate every entry.
    pub fn validate(&self) -> ReelcapResult<()> {
        for (id, track) in &self.tracks {
            validate_track(id, track)?;
        }
        Ok(())
    }

    /// Iterate over entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BackgroundTrack)> {
        self.tracks.iter().map(|(id, track)| (id.as_str(), track))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The stock tracks shipped in `resources/`.
    pub fn stock() -> Self {
        let mut table = Self::new();
        table.insert(
            "tiktok-gym-phonk",
            BackgroundTrack {
                path: PathBuf::from("resources/tiktokGymPhonk.mp3"),
                gain: 0.1,
                seek_offset_secs: 25.0,
            },
        );
        table.insert(
            "memory-reboot",
            BackgroundTrack {
                path: PathBuf::from("resources/memoryReboot.mp3"),
                gain: 0.1,
                seek_offset_secs: 35.0,
            },
        );
        table
    }
}

fn validate_track(id: &str, track: &BackgroundTrack) -> ReelcapResult<()> {
    if !(track.gain > 0.0 && track.gain <= 1.0) {
        return Err(ReelcapError::InvalidGain {
            layer: id.to_string(),
            gain: track.gain,
        });
    }
    if !track.seek_offset_secs.is_finite() || track.seek_offset_secs < 0.0 {
        return Err(ReelcapError::config(format!(
            "Background track '{id}' has negative or non-finite seek offset {}",
            track.seek_offset_secs
        )));
    }
    Ok(())
}

/// Renderer defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderDefaults {
    /// ffmpeg executable.
    pub ffmpeg: String,

    /// ffprobe executable.
    pub ffprobe: String,

    /// Video bitrate in kbps.
    pub video_bitrate_kbps: u32,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,
}

/// Speech-to-text defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionDefaults {
    /// whisper_timestamped executable.
    pub command: String,

    /// Whisper model name (tiny, base, small, medium, large).
    pub model: String,

    /// Language hint (ISO 639-1 code, e.g., "en").
    pub language: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelcap=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("content"),
            background_tracks: BackgroundTrackTable::stock(),
            render: RenderDefaults::default(),
            transcription: TranscriptionDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            video_bitrate_kbps: 8000,
            audio_bitrate_kbps: 192,
        }
    }
}

impl Default for TranscriptionDefaults {
    fn default() -> Self {
        Self {
            command: "whisper_timestamped".to_string(),
            model: "base".to_string(),
            language: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Errors are returned, not swallowed.
    pub fn load_from(path: &Path) -> ReelcapResult<Self> {
        if !path.exists() {
            return Err(ReelcapError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.background_tracks.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> ReelcapResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> ReelcapResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelcap").join("config.json")
}
