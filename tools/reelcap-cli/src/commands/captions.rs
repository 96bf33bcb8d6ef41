//! Transcribe a video and export its caption cues.

use std::path::PathBuf;

use reelcap_audio_ai::subtitles::save_subtitles;
use reelcap_audio_ai::transcription::save_transcript;
use reelcap_common::config::AppConfig;
use reelcap_processing_core::build_cues_for_mode;
use reelcap_project_model::caption::CaptionMode;

use super::transcriber;

pub fn run(
    app: &AppConfig,
    input: PathBuf,
    output: PathBuf,
    mode: CaptionMode,
    transcript: Option<PathBuf>,
    save_transcript_to: Option<PathBuf>,
) -> anyhow::Result<()> {
    if !mode.requires_captions() {
        anyhow::bail!("Caption mode 'off' produces no captions; use words or segments");
    }

    let transcriber = transcriber(app, transcript.as_deref())?;
    println!(
        "Transcribing {} with {}",
        input.display(),
        transcriber.name()
    );
    let transcript = transcriber.transcribe(&input)?;

    if let Some(path) = &save_transcript_to {
        save_transcript(&transcript, path)?;
        println!("  Transcript: {}", path.display());
    }

    let cues = build_cues_for_mode(mode, &transcript)?;
    save_subtitles(&cues, &output)?;
    println!("  Cues: {}", cues.len());
    println!("  Captions: {}", output.display());
    Ok(())
}
