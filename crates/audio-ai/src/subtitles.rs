//! Subtitle export in SRT and VTT formats.
//!
//! Lets the cues that get burned into a short also ship as a sidecar file.

use reelcap_common::error::ReelcapResult;
use reelcap_project_model::caption::Cue;

/// Generate SRT subtitle content from caption cues.
pub fn generate_srt(cues: &[Cue]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(cue.start_secs),
            format_srt_time(cue.end_secs),
        ));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT subtitle content from caption cues.
pub fn generate_vtt(cues: &[Cue]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for cue in cues {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(cue.start_secs),
            format_vtt_time(cue.end_secs),
        ));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output
}

fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Save subtitles to a file, picking the format from the extension.
pub fn save_subtitles(cues: &[Cue], path: &std::path::Path) -> ReelcapResult<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("vtt") => generate_vtt(cues),
        _ => generate_srt(cues), // default to SRT
    };
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), cues = cues.len(), "Wrote subtitles");
    Ok(())
}
