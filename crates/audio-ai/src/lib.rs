//! Reelcap Audio Intelligence
//!
//! Local-first speech processing:
//! - **Transcription:** Word-timestamped Whisper output, from the CLI or a saved file
//! - **Subtitle Export:** SRT/VTT output from caption cues

pub mod subtitles;
pub mod transcription;

pub use subtitles::*;
pub use transcription::*;
