//! Render a short to a video file.

use std::path::PathBuf;

use reelcap_audio_ai::subtitles::save_subtitles;
use reelcap_common::config::AppConfig;
use reelcap_render_engine::export::{export_short, ExportJob, ExportProgress};

use super::{prepare_short, ShortArgs};

pub async fn run(
    app: &AppConfig,
    input: PathBuf,
    output: Option<PathBuf>,
    subtitles: Option<PathBuf>,
    report: bool,
    short: ShortArgs,
) -> anyhow::Result<()> {
    println!("Preparing short from: {}", input.display());

    let (config, prepared) = prepare_short(app, &input, &short)?;

    let output_path = output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "short".to_string());
        app.output_dir
            .join(format!("{stem}-short.{}", config.render.format.extension()))
    });

    println!("  Output: {}", output_path.display());
    println!(
        "  Resolution: {}x{}",
        config.target_width, config.target_height
    );
    println!(
        "  Duration: {:.2}s @ {:.3} fps",
        prepared.timeline.duration_secs, prepared.timeline.frame_rate
    );
    println!("  Captions: {}", prepared.timeline.caption_count());
    println!("  Audio layers: {}", prepared.timeline.audio_plan.len());

    if let Some(path) = &subtitles {
        save_subtitles(&prepared.cues, path)?;
        println!("  Subtitles: {}", path.display());
    }

    // Ctrl-C reaches ffmpeg directly; keep this process alive so the
    // staging file is cleaned up once ffmpeg exits.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, waiting for ffmpeg to stop");
        }
    });

    let job = ExportJob {
        timeline: prepared.timeline,
        output_path: output_path.clone(),
        settings: config.render.clone(),
        write_report: report,
    };

    let progress_cb: Box<dyn Fn(ExportProgress) + Send> = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
    });

    match export_short(job, app.render.ffmpeg.clone(), Some(progress_cb)).await {
        Ok(path) => {
            println!("\nExport complete: {}", path.display());
            Ok(())
        }
        Err(e) => {
            println!("\nExport failed: {e}");
            Err(e.into())
        }
    }
}
