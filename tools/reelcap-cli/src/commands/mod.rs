pub mod captions;
pub mod check;
pub mod init_config;
pub mod plan;
pub mod render;
pub mod tracks;

use std::path::{Path, PathBuf};

use clap::Args;

use reelcap_audio_ai::transcription::{
    Transcriber, TranscriptFile, TranscriptionConfig, WhisperTimestampedCli,
};
use reelcap_common::config::AppConfig;
use reelcap_project_model::caption::{CaptionMode, ScreenAnchor};
use reelcap_project_model::frame::FrameSize;
use reelcap_project_model::pipeline::{ExportFormat, PipelineConfig};
use reelcap_render_engine::{DrawTextRasterizer, FfprobeProbe, PreparedShort, ShortPipeline};

/// Pipeline options shared by `render` and `plan`.
///
/// Flags override the preset, which overrides the built-in defaults.
#[derive(Args, Debug, Clone)]
pub struct ShortArgs {
    /// Pipeline preset (JSON) to start from
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// Output width
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height
    #[arg(long)]
    pub height: Option<u32>,

    /// Resize the source to WIDTHxHEIGHT before cropping
    #[arg(long, conflicts_with = "native_size")]
    pub source_size: Option<FrameSize>,

    /// Crop the source at its native size
    #[arg(long)]
    pub native_size: bool,

    /// Background track id (see `reelcap tracks`)
    #[arg(long)]
    pub background: Option<String>,

    /// Leave the source video's own audio out of the mix
    #[arg(long)]
    pub no_original_audio: bool,

    /// Intro stinger audio file
    #[arg(long)]
    pub intro: Option<PathBuf>,

    /// Outro stinger audio file
    #[arg(long)]
    pub outro: Option<PathBuf>,

    /// Caption grouping: words|segments|off
    #[arg(long)]
    pub captions: Option<CaptionMode>,

    /// Font family name or font file
    #[arg(long)]
    pub font: Option<String>,

    #[arg(long)]
    pub font_size: Option<u32>,

    /// Caption color (ffmpeg color syntax)
    #[arg(long)]
    pub color: Option<String>,

    /// Caption position: center|top|bottom
    #[arg(long)]
    pub anchor: Option<ScreenAnchor>,

    /// Caption position while the intro plays
    #[arg(long)]
    pub intro_anchor: Option<ScreenAnchor>,

    /// Caption position while the outro plays
    #[arg(long)]
    pub outro_anchor: Option<ScreenAnchor>,

    /// Output format: mp4-h264|mp4-h265|webm
    #[arg(long)]
    pub format: Option<ExportFormat>,

    /// Use a saved whisper JSON transcript instead of transcribing
    #[arg(long)]
    pub transcript: Option<PathBuf>,
}

impl ShortArgs {
    pub fn pipeline_config(&self, app: &AppConfig) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.preset {
            Some(path) => PipelineConfig::load(path)?,
            None => {
                let mut config = PipelineConfig::default();
                config.render.video_bitrate_kbps = app.render.video_bitrate_kbps;
                config.render.audio_bitrate_kbps = app.render.audio_bitrate_kbps;
                config
            }
        };

        if let Some(width) = self.width {
            config.target_width = width;
        }
        if let Some(height) = self.height {
            config.target_height = height;
        }
        if self.source_size.is_some() {
            config.source_resolution = self.source_size;
        }
        if self.native_size {
            config.source_resolution = None;
        }
        if self.background.is_some() {
            config.background_track_id = self.background.clone();
        }
        if self.no_original_audio {
            config.include_original_audio = false;
        }
        if self.intro.is_some() {
            config.intro = self.intro.clone();
        }
        if self.outro.is_some() {
            config.outro = self.outro.clone();
        }
        if let Some(mode) = self.captions {
            config.captions = mode;
        }

        let style = &mut config.caption_style;
        if let Some(font) = &self.font {
            style.font = font.clone();
        }
        if let Some(size) = self.font_size {
            style.font_size = size;
        }
        if let Some(color) = &self.color {
            style.color = color.clone();
        }
        if let Some(anchor) = self.anchor {
            style.anchor = anchor;
        }
        if self.intro_anchor.is_some() {
            style.intro_anchor = self.intro_anchor;
        }
        if self.outro_anchor.is_some() {
            style.outro_anchor = self.outro_anchor;
        }
        if let Some(format) = self.format {
            config.render.format = format;
        }

        config.validate()?;
        Ok(config)
    }
}

/// The saved transcript if one was given, otherwise whisper_timestamped.
pub fn transcriber(app: &AppConfig, transcript: Option<&Path>) -> anyhow::Result<Box<dyn Transcriber>> {
    match transcript {
        Some(path) => Ok(Box::new(TranscriptFile::new(path))),
        None => {
            let config = TranscriptionConfig::from_defaults(&app.transcription)?;
            let whisper = WhisperTimestampedCli::new(config);
            if !whisper.is_available() {
                tracing::warn!(
                    command = %app.transcription.command,
                    "Transcriber not found in PATH"
                );
            }
            Ok(Box::new(whisper))
        }
    }
}

/// Run the pipeline up to the composed timeline.
pub fn prepare_short(
    app: &AppConfig,
    input: &Path,
    short: &ShortArgs,
) -> anyhow::Result<(PipelineConfig, PreparedShort)> {
    let config = short.pipeline_config(app)?;
    let probe = FfprobeProbe::new(app.render.ffprobe.clone());
    let transcriber = transcriber(app, short.transcript.as_deref())?;
    let pipeline = ShortPipeline::new(&probe, transcriber.as_ref(), &DrawTextRasterizer);
    let prepared = pipeline.prepare(input, &config, &app.background_tracks)?;
    Ok((config, prepared))
}
