//! Caption cue building.
//!
//! Captions are word-level: every recognized word becomes exactly one cue
//! with identical timing and text. Words are never merged. Segment-level
//! captions exist only as the separately named [`build_segment_cues`].

use reelcap_common::error::{ReelcapError, ReelcapResult};
use reelcap_project_model::caption::{CaptionMode, Cue, TimedWord, Transcript};

/// Flatten a transcript into its words, preserving order.
pub fn flatten_words(transcript: &Transcript) -> Vec<TimedWord> {
    transcript.words().cloned().collect()
}

/// Build one cue per word.
///
/// Fails with `EmptyTranscript` when there are no words, and with
/// `InvalidWordTiming` when a word cannot be shown (negative start,
/// non-finite times, or `end <= start`).
pub fn build_cues(words: &[TimedWord]) -> ReelcapResult<Vec<Cue>> {
    if words.is_empty() {
        return Err(ReelcapError::EmptyTranscript);
    }

    let cues = words
        .iter()
        .enumerate()
        .map(|(index, word)| {
            check_timing(index, word.start_secs, word.end_secs)?;
            Ok(Cue {
                start_secs: word.start_secs,
                end_secs: word.end_secs,
                text: word.text.clone(),
            })
        })
        .collect::<ReelcapResult<Vec<_>>>()?;

    tracing::debug!(cues = cues.len(), "Built word-level cues");
    Ok(cues)
}

/// Build one cue per transcript segment.
pub fn build_segment_cues(transcript: &Transcript) -> ReelcapResult<Vec<Cue>> {
    let cues = transcript
        .segments
        .iter()
        .filter(|segment| !segment.text.trim().is_empty())
        .enumerate()
        .map(|(index, segment)| {
            check_timing(index, segment.start_secs, segment.end_secs)?;
            Ok(Cue {
                start_secs: segment.start_secs,
                end_secs: segment.end_secs,
                text: segment.text.trim().to_string(),
            })
        })
        .collect::<ReelcapResult<Vec<_>>>()?;

    if cues.is_empty() {
        return Err(ReelcapError::EmptyTranscript);
    }

    tracing::debug!(cues = cues.len(), "Built segment-level cues");
    Ok(cues)
}

/// Build cues according to `mode`. `Off` yields no cues.
pub fn build_cues_for_mode(mode: CaptionMode, transcript: &Transcript) -> ReelcapResult<Vec<Cue>> {
    match mode {
        CaptionMode::Words => build_cues(&flatten_words(transcript)),
        CaptionMode::Segments => build_segment_cues(transcript),
        CaptionMode::Off => Ok(Vec::new()),
    }
}

fn check_timing(index: usize, start_secs: f64, end_secs: f64) -> ReelcapResult<()> {
    let valid = start_secs.is_finite()
        && end_secs.is_finite()
        && start_secs >= 0.0
        && end_secs > start_secs;
    if valid {
        Ok(())
    } else {
        Err(ReelcapError::InvalidWordTiming {
            index,
            start_secs,
            end_secs,
        })
    }
}
