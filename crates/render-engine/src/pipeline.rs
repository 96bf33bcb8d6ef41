//! End-to-end preparation of a short, from source file to timeline.

use std::path::Path;

use reelcap_audio_ai::transcription::Transcriber;
use reelcap_common::config::BackgroundTrackTable;
use reelcap_common::error::{ReelcapError, ReelcapResult};
use reelcap_processing_core::{build_cues_for_mode, compute_transform, plan_audio, AudioPlanRequest};
use reelcap_project_model::audio::AudioRef;
use reelcap_project_model::caption::{Cue, Transcript};
use reelcap_project_model::frame::FrameSize;
use reelcap_project_model::pipeline::PipelineConfig;
use reelcap_project_model::timeline::CompositionTimeline;

use crate::compositor::{compose, ComposeOptions, TextRasterizer};
use crate::probe::MediaProbe;

/// Everything the pipeline worked out for one source, before rendering.
#[derive(Debug, Clone)]
pub struct PreparedShort {
    pub timeline: CompositionTimeline,
    pub cues: Vec<Cue>,
    /// `None` when captions are off and transcription was skipped.
    pub transcript: Option<Transcript>,
}

/// Wires the external collaborators into one configurable pipeline.
pub struct ShortPipeline<'a> {
    probe: &'a dyn MediaProbe,
    transcriber: &'a dyn Transcriber,
    rasterizer: &'a dyn TextRasterizer,
}

impl<'a> ShortPipeline<'a> {
    pub fn new(
        probe: &'a dyn MediaProbe,
        transcriber: &'a dyn Transcriber,
        rasterizer: &'a dyn TextRasterizer,
    ) -> Self {
        Self {
            probe,
            transcriber,
            rasterizer,
        }
    }

    /// Probe, transcribe, build cues, plan audio, resize and crop, compose.
    pub fn prepare(
        &self,
        input: &Path,
        config: &PipelineConfig,
        tracks: &BackgroundTrackTable,
    ) -> ReelcapResult<PreparedShort> {
        config
            .validate()
            .map_err(|e| ReelcapError::config(e.to_string()))?;

        let media = self.probe.probe(input)?;
        let video = media.video_source()?;
        tracing::info!(
            input = %input.display(),
            width = video.width,
            height = video.height,
            duration_secs = video.duration_secs,
            frame_rate = video.frame_rate,
            "Source probed"
        );

        let (cues, transcript) = if config.captions.requires_captions() {
            tracing::info!(transcriber = self.transcriber.name(), "Transcribing");
            let transcript = self.transcriber.transcribe(input)?;
            let cues = build_cues_for_mode(config.captions, &transcript)?;
            (cues, Some(transcript))
        } else {
            (Vec::new(), None)
        };

        let request = AudioPlanRequest {
            original: media.has_audio.then(|| media.audio_ref("original")),
            include_original: config.include_original_audio,
            background: match &config.background_track_id {
                Some(id) => Some(self.probe_background(id, tracks)?),
                None => None,
            },
            intro: self.probe_stinger("intro", config.intro.as_deref())?,
            outro: self.probe_stinger("outro", config.outro.as_deref())?,
            timeline_duration_secs: video.duration_secs,
        };
        let audio_plan = plan_audio(&request, tracks)?;

        let working = config
            .source_resolution
            .unwrap_or(FrameSize::new(video.width, video.height));
        if config.source_resolution.is_some() {
            tracing::debug!(
                native = %format!("{}x{}", video.width, video.height),
                resized = %working,
                "Resizing source before crop"
            );
        }
        let transform = compute_transform(
            working.width,
            working.height,
            config.target_width,
            config.target_height,
        )?;

        let options = ComposeOptions {
            style: config.caption_style.clone(),
            require_captions: config.captions.requires_captions(),
            source_resolution: config.source_resolution,
        };
        let timeline = compose(
            &video,
            &cues,
            audio_plan,
            &transform,
            self.rasterizer,
            &options,
        )?;

        Ok(PreparedShort {
            timeline,
            cues,
            transcript,
        })
    }

    fn probe_background(&self, id: &str, tracks: &BackgroundTrackTable) -> ReelcapResult<AudioRef> {
        let track = tracks.lookup(id)?;
        let info = self.probe.probe(&track.path)?;
        Ok(info.audio_ref(id))
    }

    fn probe_stinger(&self, label: &str, path: Option<&Path>) -> ReelcapResult<Option<AudioRef>> {
        match path {
            Some(path) => Ok(Some(self.probe.probe(path)?.audio_ref(label))),
            None => Ok(None),
        }
    }
}
