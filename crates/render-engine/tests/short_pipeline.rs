use std::collections::HashMap;
use std::path::{Path, PathBuf};

use reelcap_audio_ai::transcription::Transcriber;
use reelcap_common::config::BackgroundTrackTable;
use reelcap_common::error::{ReelcapError, ReelcapResult};
use reelcap_project_model::audio::LayerRole;
use reelcap_project_model::caption::{CaptionMode, TimedWord, Transcript, TranscriptSegment};
use reelcap_project_model::frame::FrameSize;
use reelcap_project_model::pipeline::{PipelineConfig, RenderSettings};
use reelcap_project_model::timeline::CompositionTimeline;
use reelcap_render_engine::{
    render_to_path, DrawTextRasterizer, ExportJob, MediaInfo, MediaProbe, ProgressCallback,
    RenderBackend, ShortPipeline, VideoInfo,
};

struct FakeProbe {
    media: HashMap<PathBuf, MediaInfo>,
}

impl FakeProbe {
    fn new() -> Self {
        let mut media = HashMap::new();
        media.insert(
            PathBuf::from("in.mp4"),
            MediaInfo {
                path: PathBuf::from("in.mp4"),
                duration_secs: 1.4,
                video: Some(VideoInfo {
                    width: 1920,
                    height: 1080,
                    frame_rate: 30.0,
                }),
                has_audio: true,
            },
        );
        media.insert(
            PathBuf::from("resources/tiktokGymPhonk.mp3"),
            MediaInfo {
                path: PathBuf::from("resources/tiktokGymPhonk.mp3"),
                duration_secs: 120.0,
                video: None,
                has_audio: true,
            },
        );
        Self { media }
    }
}

impl MediaProbe for FakeProbe {
    fn probe(&self, path: &Path) -> ReelcapResult<MediaInfo> {
        self.media
            .get(path)
            .cloned()
            .ok_or_else(|| ReelcapError::FileNotFound {
                path: path.to_path_buf(),
            })
    }
}

struct FakeTranscriber;

impl Transcriber for FakeTranscriber {
    fn transcribe(&self, _media: &Path) -> ReelcapResult<Transcript> {
        Ok(Transcript {
            language: Some("en".to_string()),
            segments: vec![TranscriptSegment {
                start_secs: 0.0,
                end_secs: 1.4,
                text: "hi there friend".to_string(),
                words: vec![
                    TimedWord::new("hi", 0.0, 0.3),
                    TimedWord::new("there", 0.3, 0.8),
                    TimedWord::new("friend", 0.8, 1.4),
                ],
            }],
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Writes a marker file, or fails after leaving a partial one behind.
struct FakeBackend {
    fail: bool,
}

impl RenderBackend for FakeBackend {
    fn render(
        &mut self,
        _timeline: &CompositionTimeline,
        _settings: &RenderSettings,
        destination: &Path,
        _progress: Option<ProgressCallback>,
    ) -> ReelcapResult<()> {
        if self.fail {
            std::fs::write(destination, b"partial")?;
            return Err(ReelcapError::render("encoder exploded"));
        }
        std::fs::write(destination, b"rendered")?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// 900x800 crop of the native 1920x1080 frame, original audio plus the
/// gym phonk background.
fn scenario_config() -> PipelineConfig {
    PipelineConfig {
        target_width: 900,
        target_height: 800,
        source_resolution: None,
        include_original_audio: true,
        background_track_id: Some("tiktok-gym-phonk".to_string()),
        ..PipelineConfig::default()
    }
}

fn prepare(config: &PipelineConfig) -> ReelcapResult<CompositionTimeline> {
    let probe = FakeProbe::new();
    let pipeline = ShortPipeline::new(&probe, &FakeTranscriber, &DrawTextRasterizer);
    pipeline
        .prepare(Path::new("in.mp4"), config, &BackgroundTrackTable::stock())
        .map(|prepared| prepared.timeline)
}

#[test]
fn three_words_with_background_track() {
    let timeline = prepare(&scenario_config()).unwrap();

    assert_eq!(timeline.duration_secs, 1.4);
    assert_eq!(timeline.frame_rate, 30.0);
    assert_eq!(timeline.visual_layers.len(), 4);
    assert_eq!(timeline.caption_count(), 3);

    let starts: Vec<f64> = timeline.caption_layers().map(|l| l.start_secs).collect();
    assert_eq!(starts, vec![0.0, 0.3, 0.8]);

    let plan = &timeline.audio_plan;
    assert_eq!(plan.len(), 2);
    let roles: Vec<LayerRole> = plan.layers().iter().map(|l| l.role).collect();
    assert_eq!(roles, vec![LayerRole::Original, LayerRole::Background]);

    let original = plan.layer(LayerRole::Original).unwrap();
    assert_eq!(original.gain, 1.0);
    assert!(original.trim.is_none());

    let background = plan.layer(LayerRole::Background).unwrap();
    assert_eq!(background.gain, 0.1);
    let trim = background.trim.unwrap();
    assert_eq!(trim.start_secs, 25.0);
    assert!((trim.end_secs - 26.4).abs() < 1e-9);

    let (_, transform) = timeline.base_video().unwrap();
    assert_eq!((transform.crop_center_x, transform.crop_center_y), (540, 960));
    assert_eq!(transform.crop_origin(), (510, 140));
    assert_eq!(timeline.source_resize(), None);
}

#[test]
fn background_only_mix_without_original_audio() {
    let config = PipelineConfig {
        include_original_audio: false,
        ..scenario_config()
    };
    let timeline = prepare(&config).unwrap();
    let roles: Vec<LayerRole> = timeline.audio_plan.layers().iter().map(|l| l.role).collect();
    assert_eq!(roles, vec![LayerRole::Background]);
}

#[test]
fn captions_off_skips_transcription() {
    let config = PipelineConfig {
        captions: CaptionMode::Off,
        ..scenario_config()
    };
    let timeline = prepare(&config).unwrap();
    assert_eq!(timeline.caption_count(), 0);
    assert_eq!(timeline.visual_layers.len(), 1);
}

#[test]
fn default_config_resizes_landscape_source_to_square() {
    let timeline = prepare(&PipelineConfig::default()).unwrap();

    assert_eq!(timeline.source_resize(), Some(FrameSize::new(1920, 1920)));
    let (_, transform) = timeline.base_video().unwrap();
    assert_eq!((transform.native_width, transform.native_height), (1920, 1920));
    assert_eq!(transform.output_size(), (900, 1600));
    assert_eq!((transform.crop_center_x, transform.crop_center_y), (960, 960));
    assert_eq!(transform.crop_origin(), (510, 160));
}

#[test]
fn vertical_target_rejected_for_landscape_source_at_native_size() {
    let config = PipelineConfig {
        source_resolution: None,
        ..PipelineConfig::default()
    };
    assert!(matches!(
        prepare(&config),
        Err(ReelcapError::UnsupportedAspect { .. })
    ));
}

#[test]
fn unknown_track_is_reported() {
    let config = PipelineConfig {
        background_track_id: Some("elevator".to_string()),
        ..scenario_config()
    };
    assert!(matches!(
        prepare(&config),
        Err(ReelcapError::UnknownBackgroundTrack { .. })
    ));
}

fn job(output_path: PathBuf) -> ExportJob {
    ExportJob {
        timeline: prepare(&scenario_config()).unwrap(),
        output_path,
        settings: RenderSettings::default(),
        write_report: false,
    }
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn successful_render_is_published_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("content").join("short.mp4");

    let published = render_to_path(&job(output.clone()), &mut FakeBackend { fail: false }, None)
        .unwrap();

    assert_eq!(published, output);
    assert_eq!(std::fs::read(&output).unwrap(), b"rendered");
    assert_eq!(dir_entries(&dir.path().join("content")), vec!["short.mp4"]);
}

#[test]
fn failed_render_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("short.mp4");

    let result = render_to_path(&job(output.clone()), &mut FakeBackend { fail: true }, None);

    assert!(matches!(result, Err(ReelcapError::Render { .. })));
    assert!(!output.exists());
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn failed_render_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("short.mp4");
    std::fs::write(&output, b"previous").unwrap();

    let result = render_to_path(&job(output.clone()), &mut FakeBackend { fail: true }, None);

    assert!(result.is_err());
    assert_eq!(std::fs::read(&output).unwrap(), b"previous");
    assert_eq!(dir_entries(dir.path()), vec!["short.mp4"]);
}

#[test]
fn render_report_is_written_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("short.mp4");
    let mut job = job(output.clone());
    job.write_report = true;

    render_to_path(&job, &mut FakeBackend { fail: false }, None).unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("short.render.json")).unwrap())
            .unwrap();
    assert_eq!(report["captions"], 3);
    assert_eq!(report["backend"], "fake");
    assert!(report["rendered_at"].is_string());
}
