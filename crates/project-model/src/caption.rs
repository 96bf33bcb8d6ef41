//! Transcript and caption types.
//!
//! The transcription collaborator produces segments of timed words. The
//! cue builder flattens them and turns each word into an on-screen cue.

use serde::{Deserialize, Serialize};

/// A single recognized word with its timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedWord {
    /// The word as recognized.
    pub text: String,
    /// Start time in seconds.
    pub start_secs: f64,
    /// End time in seconds.
    pub end_secs: f64,
}

impl TimedWord {
    pub fn new(text: impl Into<String>, start_secs: f64, end_secs: f64) -> Self {
        Self {
            text: text.into(),
            start_secs,
            end_secs,
        }
    }

    /// Word duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// One utterance as returned by the transcription collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_secs: f64,
    /// End time in seconds.
    pub end_secs: f64,
    /// Full segment text.
    pub text: String,
    /// Words in chronological order.
    #[serde(default)]
    pub words: Vec<TimedWord>,
}

/// A complete transcription result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Detected or requested language, if known.
    pub language: Option<String>,
    /// Segments in chronological order.
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// All words across all segments, in order.
    pub fn words(&self) -> impl Iterator<Item = &TimedWord> {
        self.segments.iter().flat_map(|segment| segment.words.iter())
    }

    /// Total number of words.
    pub fn word_count(&self) -> usize {
        self.segments.iter().map(|s| s.words.len()).sum()
    }
}

/// A timed caption entry to be overlaid on the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// On-screen from (seconds).
    pub start_secs: f64,
    /// Off-screen at (seconds).
    pub end_secs: f64,
    /// Caption text.
    pub text: String,
}

impl Cue {
    /// Whether the cue is on screen at time `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// How transcript timing becomes captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionMode {
    /// One cue per word.
    #[default]
    Words,
    /// One cue per transcript segment.
    Segments,
    /// No captions; composition-only render.
    Off,
}

impl CaptionMode {
    /// Whether this mode needs a transcript and at least one cue.
    pub fn requires_captions(self) -> bool {
        !matches!(self, CaptionMode::Off)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaptionMode::Words => "words",
            CaptionMode::Segments => "segments",
            CaptionMode::Off => "off",
        }
    }
}

impl std::str::FromStr for CaptionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "words" | "word" => Ok(CaptionMode::Words),
            "segments" | "segment" => Ok(CaptionMode::Segments),
            "off" | "none" => Ok(CaptionMode::Off),
            other => Err(format!(
                "Unknown caption mode: {other}. Use: words, segments, off"
            )),
        }
    }
}

/// Horizontal placement of a caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

/// Vertical placement of a caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Center,
    Bottom,
}

/// Fixed screen anchor for an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenAnchor {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
}

impl ScreenAnchor {
    pub const CENTER: ScreenAnchor = ScreenAnchor {
        horizontal: HorizontalAlign::Center,
        vertical: VerticalAlign::Center,
    };

    pub const TOP: ScreenAnchor = ScreenAnchor {
        horizontal: HorizontalAlign::Center,
        vertical: VerticalAlign::Top,
    };

    pub const BOTTOM: ScreenAnchor = ScreenAnchor {
        horizontal: HorizontalAlign::Center,
        vertical: VerticalAlign::Bottom,
    };
}

impl Default for ScreenAnchor {
    fn default() -> Self {
        Self::CENTER
    }
}

impl std::str::FromStr for ScreenAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => Ok(ScreenAnchor::CENTER),
            "top" => Ok(ScreenAnchor::TOP),
            "bottom" => Ok(ScreenAnchor::BOTTOM),
            other => Err(format!("Unknown anchor: {other}. Use: center, top, bottom")),
        }
    }
}

/// Caption text styling passed to the text-to-image collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionStyle {
    /// Font family name, or a path to a font file.
    pub font: String,
    /// Font size in pixels.
    pub font_size: u32,
    /// Text color (name or `#rrggbb`).
    pub color: String,
    /// Anchor used for cues outside the intro/outro windows.
    #[serde(default)]
    pub anchor: ScreenAnchor,
    /// Anchor for cues starting while the intro plays.
    #[serde(default)]
    pub intro_anchor: Option<ScreenAnchor>,
    /// Anchor for cues starting while the outro plays.
    #[serde(default)]
    pub outro_anchor: Option<ScreenAnchor>,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font: "Arial".to_string(),
            font_size: 40,
            color: "white".to_string(),
            anchor: ScreenAnchor::CENTER,
            intro_anchor: None,
            outro_anchor: None,
        }
    }
}

impl CaptionStyle {
    /// Whether `font` names a font file rather than a family.
    pub fn font_is_file(&self) -> bool {
        let lower = self.font.to_ascii_lowercase();
        self.font.contains('/') || lower.ends_with(".ttf") || lower.ends_with(".otf")
    }
}
