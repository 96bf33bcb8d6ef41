//! Rendering a composed timeline to a single output file.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use reelcap_common::error::{ReelcapError, ReelcapResult};
use reelcap_common::process::command_exists;
use reelcap_project_model::audio::{AudioLayerSpec, LayerRole};
use reelcap_project_model::caption::{HorizontalAlign, ScreenAnchor, VerticalAlign};
use reelcap_project_model::pipeline::{ExportFormat, RenderSettings};
use reelcap_project_model::timeline::{CaptionImage, CompositionTimeline, LayerContent};

/// Caption margin from the frame edge, as a fraction of the output height.
const CAPTION_MARGIN_FRACTION: f64 = 0.06;

/// A composed timeline ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub timeline: CompositionTimeline,

    /// Final output file path.
    pub output_path: PathBuf,

    pub settings: RenderSettings,

    /// Write a `<output>.render.json` summary next to the output.
    pub write_report: bool,
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
}

/// A renderer that turns a timeline into a media file.
pub trait RenderBackend: Send {
    /// Render `timeline` into `destination`, which the caller then publishes.
    fn render(
        &mut self,
        timeline: &CompositionTimeline,
        settings: &RenderSettings,
        destination: &Path,
        progress: Option<ProgressCallback>,
    ) -> ReelcapResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Render the job and publish the result at `job.output_path`.
///
/// The backend writes to a hidden staging file in the output directory; the
/// output path only ever holds a complete render. If rendering fails the
/// staging file is removed and any existing output is left untouched.
pub fn render_to_path(
    job: &ExportJob,
    backend: &mut dyn RenderBackend,
    progress: Option<ProgressCallback>,
) -> ReelcapResult<PathBuf> {
    if job.timeline.base_video().is_none() {
        return Err(ReelcapError::EmptyTimeline);
    }

    let parent = match job.output_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".reelcap-")
        .suffix(&format!(".{}", job.settings.format.extension()))
        .tempfile_in(&parent)?
        .into_temp_path();

    let started = std::time::Instant::now();
    tracing::info!(
        backend = backend.name(),
        staging = %staging.display(),
        output = %job.output_path.display(),
        "Rendering"
    );

    backend.render(&job.timeline, &job.settings, &staging, progress)?;

    staging.persist(&job.output_path).map_err(|e| {
        ReelcapError::render(format!(
            "Failed to publish {}: {}",
            job.output_path.display(),
            e.error
        ))
    })?;

    if job.write_report {
        write_render_report(job, backend.name(), started.elapsed().as_secs_f64())?;
    }

    tracing::info!(
        output = %job.output_path.display(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Export finished"
    );
    Ok(job.output_path.clone())
}

/// Render a short with ffmpeg.
///
/// This is the main entry point for rendering.
pub async fn export_short(
    job: ExportJob,
    ffmpeg_binary: impl Into<String>,
    progress: Option<ProgressCallback>,
) -> ReelcapResult<PathBuf> {
    tracing::info!(
        output = %job.output_path.display(),
        format = ?job.settings.format,
        "Starting export"
    );

    if let Some(cb) = &progress {
        cb(ExportProgress {
            progress: 0.0,
            frames_rendered: 0,
            total_frames: job.timeline.total_frames(),
            eta_secs: 0.0,
            stage: ExportStage::Preparing,
        });
    }

    let mut backend = FfmpegBackend::new(ffmpeg_binary);
    if !backend.is_available() {
        return Err(ReelcapError::unsupported(format!(
            "No supported render backend found (expected {} in PATH)",
            backend.binary
        )));
    }

    tokio::task::spawn_blocking(move || render_to_path(&job, &mut backend, progress))
        .await
        .map_err(|e| ReelcapError::render(format!("Render task failed: {e}")))?
}

fn write_render_report(job: &ExportJob, backend: &str, elapsed_secs: f64) -> ReelcapResult<()> {
    let report_path = job.output_path.with_extension("render.json");
    let audio_layers: Vec<&str> = job
        .timeline
        .audio_plan
        .layers()
        .iter()
        .map(|layer| layer.role.as_str())
        .collect();
    let report = serde_json::json!({
        "output": job.output_path,
        "rendered_at": chrono::Utc::now().to_rfc3339(),
        "backend": backend,
        "format": job.settings.format,
        "duration_secs": job.timeline.duration_secs,
        "frame_rate": job.timeline.frame_rate,
        "captions": job.timeline.caption_count(),
        "audio_layers": audio_layers,
        "elapsed_secs": elapsed_secs,
    });
    std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
    tracing::info!(report = %report_path.display(), "Wrote render report");
    Ok(())
}

/// Renders through the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: String,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[derive(Debug, Clone)]
struct FfmpegPlan {
    args: Vec<String>,
    total_frames: u64,
    duration_secs: f64,
}

impl FfmpegBackend {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run_ffmpeg(&self, plan: &FfmpegPlan, progress: Option<ProgressCallback>) -> ReelcapResult<()> {
        tracing::debug!(args = ?plan.args, "Running ffmpeg");
        let mut cmd = Command::new(&self.binary);
        cmd.args(&plan.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| ReelcapError::render(format!("Failed to start {}: {e}", self.binary)))?;

        tracing::info!(
            pid = child.id(),
            args_len = plan.args.len(),
            total_frames = plan.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelcapError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelcapError::render("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks on a full stderr pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut latest_progress = ProgressState::default();
        loop {
            line.clear();
            let bytes = reader.read_line(&mut line).map_err(|e| {
                ReelcapError::render(format!("Failed reading ffmpeg progress: {e}"))
            })?;
            if bytes == 0 {
                break;
            }

            if let Some((key, value)) = line.trim().split_once('=') {
                latest_progress.update(key, value);
                if key == "progress" {
                    if let Some(cb) = &progress {
                        cb(progress_report(
                            &latest_progress,
                            plan.total_frames,
                            plan.duration_secs,
                            start.elapsed().as_secs_f64(),
                        ));
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| ReelcapError::render(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ReelcapError::render(format!(
                "ffmpeg render failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        if let Some(cb) = &progress {
            cb(ExportProgress {
                progress: 1.0,
                frames_rendered: plan.total_frames,
                total_frames: plan.total_frames,
                eta_secs: 0.0,
                stage: ExportStage::Complete,
            });
        }

        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &mut self,
        timeline: &CompositionTimeline,
        settings: &RenderSettings,
        destination: &Path,
        progress: Option<ProgressCallback>,
    ) -> ReelcapResult<()> {
        // Caption textfiles live here until ffmpeg exits, success or not.
        let scratch = tempfile::Builder::new().prefix("reelcap-captions-").tempdir()?;
        let plan = build_ffmpeg_plan(timeline, settings, destination, scratch.path())?;
        self.run_ffmpeg(&plan, progress)
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Build the ffmpeg invocation for `timeline`.
///
/// Input 0 is the source video. Each audio layer that is not the source's
/// own track gets its own input, followed by one looped input per bitmap
/// caption. Caption text is written to files under `scratch_dir`.
fn build_ffmpeg_plan(
    timeline: &CompositionTimeline,
    settings: &RenderSettings,
    destination: &Path,
    scratch_dir: &Path,
) -> ReelcapResult<FfmpegPlan> {
    let (video_path, transform) = timeline.base_video().ok_or(ReelcapError::EmptyTimeline)?;
    if timeline.audio_plan.is_empty() {
        return Err(ReelcapError::EmptyMix);
    }

    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-nostats".to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-i".to_string(),
        video_path.display().to_string(),
    ];
    let mut next_input = 1usize;

    let mut audio_sources = Vec::with_capacity(timeline.audio_plan.len());
    for layer in timeline.audio_plan.layers() {
        if layer.role == LayerRole::Original && layer.source.path == *video_path {
            audio_sources.push("0:a".to_string());
        } else {
            args.push("-i".to_string());
            args.push(layer.source.path.display().to_string());
            audio_sources.push(format!("{next_input}:a"));
            next_input += 1;
        }
    }

    let (crop_x, crop_y) = transform.crop_origin();
    let resize = timeline
        .source_resize()
        .map(|size| format!("scale={}:{},", size.width, size.height))
        .unwrap_or_default();
    let mut graph = vec![format!(
        "[0:v]{resize}crop={}:{}:{crop_x}:{crop_y},setsar=1[v0]",
        transform.target_width, transform.target_height
    )];
    let margin = (transform.target_height as f64 * CAPTION_MARGIN_FRACTION).round() as u32;

    let mut current = 0usize;
    for layer in timeline.caption_layers() {
        let LayerContent::Caption { cue_index, image } = &layer.content else {
            continue;
        };
        let end_secs = layer.end_secs.unwrap_or(timeline.duration_secs);
        let enable = format!("enable='gte(t,{:.6})*lt(t,{:.6})'", layer.start_secs, end_secs);

        let step = match image {
            CaptionImage::Text { text, style } => {
                let text_path = scratch_dir.join(format!("cue-{cue_index:04}.txt"));
                std::fs::write(&text_path, text)?;
                let font = if style.font_is_file() {
                    format!("fontfile={}", filter_escape(&style.font))
                } else {
                    format!("font={}", filter_escape(&style.font))
                };
                let (x, y) = anchor_exprs(layer.position, "w", "h", "text_w", "text_h", margin);
                format!(
                    "[v{current}]drawtext=textfile={}:expansion=none:{font}:fontsize={}:fontcolor={}:x={x}:y={y}:{enable}[v{}]",
                    filter_escape(&text_path.display().to_string()),
                    style.font_size,
                    filter_escape(&style.color),
                    current + 1,
                )
            }
            CaptionImage::Bitmap { path, .. } => {
                args.push("-loop".to_string());
                args.push("1".to_string());
                args.push("-i".to_string());
                args.push(path.display().to_string());
                let input = next_input;
                next_input += 1;
                let (x, y) = anchor_exprs(layer.position, "W", "H", "w", "h", margin);
                format!(
                    "[v{current}][{input}:v]overlay=x={x}:y={y}:shortest=0:{enable}[v{}]",
                    current + 1,
                )
            }
        };
        graph.push(step);
        current += 1;
    }
    graph.push(format!("[v{current}]format=yuv420p[vout]"));

    let mut mix_inputs = String::new();
    for (i, (layer, source)) in timeline
        .audio_plan
        .layers()
        .iter()
        .zip(&audio_sources)
        .enumerate()
    {
        graph.push(format!("[{source}]{}[a{i}]", audio_layer_filter(layer)));
        mix_inputs.push_str(&format!("[a{i}]"));
    }
    if audio_sources.len() == 1 {
        graph.push("[a0]anull,apad[aout]".to_string());
    } else {
        graph.push(format!(
            "{mix_inputs}amix=inputs={}:duration=longest:dropout_transition=0:normalize=0,apad[aout]",
            audio_sources.len()
        ));
    }

    let filter = graph.join(";");
    tracing::debug!(filter_len = filter.len(), "Filter graph built");

    args.push("-filter_complex".to_string());
    args.push(filter);
    args.push("-map".to_string());
    args.push("[vout]".to_string());
    args.push("-map".to_string());
    args.push("[aout]".to_string());
    args.push("-r".to_string());
    args.push(format!("{}", timeline.frame_rate));
    args.push("-t".to_string());
    args.push(format!("{:.6}", timeline.duration_secs));
    args.append(&mut codec_args_for_settings(settings));
    args.push(destination.display().to_string());

    tracing::info!(
        duration_secs = timeline.duration_secs,
        frames = timeline.total_frames(),
        captions = current,
        audio_layers = audio_sources.len(),
        "Export plan built"
    );

    Ok(FfmpegPlan {
        args,
        total_frames: timeline.total_frames(),
        duration_secs: timeline.duration_secs,
    })
}

/// `atrim`/`volume`/`adelay` chain for one audio layer.
fn audio_layer_filter(layer: &AudioLayerSpec) -> String {
    let mut chain = Vec::new();
    match layer.trim {
        Some(window) => chain.push(format!(
            "atrim=start={:.6}:end={:.6},asetpts=PTS-STARTPTS",
            window.start_secs, window.end_secs
        )),
        None if layer.seek_offset_secs > 0.0 => chain.push(format!(
            "atrim=start={:.6},asetpts=PTS-STARTPTS",
            layer.seek_offset_secs
        )),
        None => {}
    }
    chain.push(format!("volume={:.6}", layer.gain));
    let delay_ms = (layer.placement.start_secs * 1000.0).round() as u64;
    if delay_ms > 0 {
        chain.push(format!("adelay={delay_ms}:all=1"));
    }
    chain.join(",")
}

/// Position expressions for an overlay of size `(ow, oh)` on a frame of
/// size `(fw, fh)`.
fn anchor_exprs(
    anchor: ScreenAnchor,
    fw: &str,
    fh: &str,
    ow: &str,
    oh: &str,
    margin: u32,
) -> (String, String) {
    let x = match anchor.horizontal {
        HorizontalAlign::Left => format!("{margin}"),
        HorizontalAlign::Center => format!("({fw}-{ow})/2"),
        HorizontalAlign::Right => format!("{fw}-{ow}-{margin}"),
    };
    let y = match anchor.vertical {
        VerticalAlign::Top => format!("{margin}"),
        VerticalAlign::Center => format!("({fh}-{oh})/2"),
        VerticalAlign::Bottom => format!("{fh}-{oh}-{margin}"),
    };
    (x, y)
}

/// Escape a filter option value for `-filter_complex`.
///
/// ffmpeg unescapes the value twice: once when splitting the option list on
/// `:` and once when splitting the graph on `[],;`. The value is escaped for
/// the option level first, then the result for the graph level.
fn filter_escape(value: &str) -> String {
    let option_level = backslash_escape(value, &['\\', '\'', ':']);
    backslash_escape(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn backslash_escape(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        if special.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn codec_args_for_settings(settings: &RenderSettings) -> Vec<String> {
    let video_bitrate = format!("{}k", settings.video_bitrate_kbps.max(1000));
    let audio_bitrate = format!("{}k", settings.audio_bitrate_kbps.max(64));

    match settings.format {
        ExportFormat::Mp4H264 => vec![
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "medium".to_string(),
            "-profile:v".to_string(),
            "high".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-b:v".to_string(),
            video_bitrate,
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            audio_bitrate,
            "-movflags".to_string(),
            "+faststart".to_string(),
        ],
        ExportFormat::Mp4H265 => vec![
            "-c:v".to_string(),
            "libx265".to_string(),
            "-preset".to_string(),
            "medium".to_string(),
            "-tag:v".to_string(),
            "hvc1".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-b:v".to_string(),
            video_bitrate,
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            audio_bitrate,
            "-movflags".to_string(),
            "+faststart".to_string(),
        ],
        ExportFormat::Webm => vec![
            "-c:v".to_string(),
            "libvpx-vp9".to_string(),
            "-b:v".to_string(),
            video_bitrate,
            "-c:a".to_string(),
            "libopus".to_string(),
            "-b:a".to_string(),
            audio_bitrate,
        ],
    }
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both names.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> ExportProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let frames_rendered = (progress * total_frames as f64).round() as u64;
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    ExportProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            ExportStage::Finalizing
        } else {
            ExportStage::Rendering
        },
    }
}
