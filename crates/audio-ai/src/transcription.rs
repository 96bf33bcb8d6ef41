//! Local transcription using Whisper.
//!
//! Runs speech-to-text inference locally (no cloud APIs) through the
//! `whisper_timestamped` command, which adds word-level timestamps to
//! Whisper's segments. Saved transcripts in the same JSON layout can be
//! loaded instead of re-running inference.

use std::path::{Path, PathBuf};
use std::process::Command;

use reelcap_common::config::TranscriptionDefaults;
use reelcap_common::error::{ReelcapError, ReelcapResult};
use reelcap_common::process::command_exists;
use reelcap_project_model::caption::{TimedWord, Transcript, TranscriptSegment};
use serde::{Deserialize, Serialize};

/// Whisper model size selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    /// Fastest, least accurate (~39 MB).
    Tiny,
    /// Good balance of speed and accuracy (~142 MB).
    Base,
    /// Better accuracy, slower (~466 MB).
    Small,
    /// High accuracy (~1.5 GB).
    Medium,
    /// Best accuracy, slowest (~2.9 GB).
    Large,
}

impl WhisperModel {
    /// Model name as the whisper CLI expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::Base => "base",
            WhisperModel::Small => "small",
            WhisperModel::Medium => "medium",
            WhisperModel::Large => "large",
        }
    }
}

impl std::str::FromStr for WhisperModel {
    type Err = ReelcapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiny" => Ok(WhisperModel::Tiny),
            "base" => Ok(WhisperModel::Base),
            "small" => Ok(WhisperModel::Small),
            "medium" => Ok(WhisperModel::Medium),
            "large" => Ok(WhisperModel::Large),
            other => Err(ReelcapError::config(format!(
                "Unknown whisper model: {other}. Use: tiny, base, small, medium, large"
            ))),
        }
    }
}

/// Configuration for transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Executable to run.
    pub command: String,

    /// Model to use.
    pub model: WhisperModel,

    /// Language hint (ISO 639-1 code, e.g., "en"). `None` auto-detects.
    pub language: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            command: "whisper_timestamped".to_string(),
            model: WhisperModel::Base,
            language: None,
        }
    }
}

impl TranscriptionConfig {
    /// Build from the application-level defaults.
    pub fn from_defaults(defaults: &TranscriptionDefaults) -> ReelcapResult<Self> {
        Ok(Self {
            command: defaults.command.clone(),
            model: defaults.model.parse()?,
            language: defaults.language.clone(),
        })
    }
}

/// The speech-to-text collaborator.
pub trait Transcriber {
    /// Produce word-timed segments for the audio in `media`.
    fn transcribe(&self, media: &Path) -> ReelcapResult<Transcript>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

/// Runs the `whisper_timestamped` command-line tool.
#[derive(Debug, Clone)]
pub struct WhisperTimestampedCli {
    config: TranscriptionConfig,
}

impl WhisperTimestampedCli {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self { config }
    }

    /// Whether the configured executable can be found.
    pub fn is_available(&self) -> bool {
        command_exists(&self.config.command)
    }

    fn build_args(&self, media: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = vec![
            media.display().to_string(),
            "--model".to_string(),
            self.config.model.as_str().to_string(),
            "--output_dir".to_string(),
            output_dir.display().to_string(),
            "--output_format".to_string(),
            "json".to_string(),
        ];
        if let Some(language) = &self.config.language {
            args.push("--language".to_string());
            args.push(language.clone());
        }
        args
    }
}

impl Transcriber for WhisperTimestampedCli {
    fn transcribe(&self, media: &Path) -> ReelcapResult<Transcript> {
        tracing::info!(
            path = %media.display(),
            model = self.config.model.as_str(),
            "Starting transcription"
        );

        if !media.exists() {
            return Err(ReelcapError::FileNotFound {
                path: media.to_path_buf(),
            });
        }

        let scratch = tempfile::Builder::new()
            .prefix("reelcap-whisper-")
            .tempdir()?;
        let args = self.build_args(media, scratch.path());
        tracing::debug!(command = %self.config.command, args = ?args, "Running whisper");

        let started = std::time::Instant::now();
        let output = Command::new(&self.config.command)
            .args(&args)
            .output()
            .map_err(|e| {
                ReelcapError::transcription(format!(
                    "Failed to start {}: {e}",
                    self.config.command
                ))
            })?;

        if !output.status.success() {
            return Err(ReelcapError::transcription(format!(
                "{} failed (status {}): {}",
                self.config.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let json_path = find_json_output(scratch.path())?;
        let transcript = parse_whisper_json(&std::fs::read_to_string(&json_path)?)?;

        tracing::info!(
            segments = transcript.segments.len(),
            words = transcript.word_count(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Transcription finished"
        );
        Ok(transcript)
    }

    fn name(&self) -> &str {
        "whisper_timestamped"
    }
}

/// A transcript saved earlier in whisper JSON layout.
#[derive(Debug, Clone)]
pub struct TranscriptFile {
    path: PathBuf,
}

impl TranscriptFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Transcriber for TranscriptFile {
    fn transcribe(&self, media: &Path) -> ReelcapResult<Transcript> {
        tracing::info!(
            transcript = %self.path.display(),
            media = %media.display(),
            "Loading saved transcript"
        );
        if !self.path.exists() {
            return Err(ReelcapError::FileNotFound {
                path: self.path.clone(),
            });
        }
        parse_whisper_json(&std::fs::read_to_string(&self.path)?)
    }

    fn name(&self) -> &str {
        "transcript-file"
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    language: Option<String>,
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WhisperWord {
    text: String,
    start: f64,
    end: f64,
}

/// Parse whisper_timestamped JSON output.
///
/// Word text is trimmed; words that are blank after trimming are dropped.
pub fn parse_whisper_json(json: &str) -> ReelcapResult<Transcript> {
    let output: WhisperOutput = serde_json::from_str(json)?;

    let segments = output
        .segments
        .into_iter()
        .map(|segment| TranscriptSegment {
            start_secs: segment.start,
            end_secs: segment.end,
            text: segment.text.trim().to_string(),
            words: segment
                .words
                .into_iter()
                .filter_map(|word| {
                    let text = word.text.trim();
                    (!text.is_empty()).then(|| TimedWord::new(text, word.start, word.end))
                })
                .collect(),
        })
        .collect();

    Ok(Transcript {
        language: output.language,
        segments,
    })
}

/// Serialize a transcript in the whisper JSON layout `parse_whisper_json` reads.
pub fn to_whisper_json(transcript: &Transcript) -> ReelcapResult<String> {
    let output = WhisperOutput {
        language: transcript.language.clone(),
        segments: transcript
            .segments
            .iter()
            .map(|segment| WhisperSegment {
                start: segment.start_secs,
                end: segment.end_secs,
                text: segment.text.clone(),
                words: segment
                    .words
                    .iter()
                    .map(|word| WhisperWord {
                        text: word.text.clone(),
                        start: word.start_secs,
                        end: word.end_secs,
                    })
                    .collect(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Save a transcript for later reuse with [`TranscriptFile`].
pub fn save_transcript(transcript: &Transcript, path: &Path) -> ReelcapResult<()> {
    std::fs::write(path, to_whisper_json(transcript)?)?;
    Ok(())
}

fn find_json_output(dir: &Path) -> ReelcapResult<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ReelcapError::transcription("whisper produced no JSON output"))
}
