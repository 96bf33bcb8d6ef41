//! Timeline composition: combines the cropped video, caption overlays, and
//! the audio plan into the single description the renderer consumes.

use reelcap_common::error::{ReelcapError, ReelcapResult};
use reelcap_project_model::audio::{AudioMixPlan, LayerRole};
use reelcap_project_model::caption::{CaptionStyle, Cue, ScreenAnchor};
use reelcap_project_model::frame::{FrameSize, FrameTransformSpec};
use reelcap_project_model::timeline::{
    CaptionImage, CompositionTimeline, LayerContent, VideoSource, VisualLayer,
};

/// Allowed difference between the audio plan's duration and the video's.
const DURATION_MATCH_TOLERANCE_SECS: f64 = 1e-6;

/// The text-to-image collaborator.
pub trait TextRasterizer {
    /// Turn caption text into something the renderer can draw.
    fn rasterize(&self, text: &str, style: &CaptionStyle) -> ReelcapResult<CaptionImage>;
}

/// Leaves rasterization to ffmpeg's `drawtext` filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawTextRasterizer;

impl TextRasterizer for DrawTextRasterizer {
    fn rasterize(&self, text: &str, style: &CaptionStyle) -> ReelcapResult<CaptionImage> {
        Ok(CaptionImage::Text {
            text: text.to_string(),
            style: style.clone(),
        })
    }
}

/// Caption policy for one composition.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub style: CaptionStyle,
    /// When set, a timeline without caption layers is an error.
    pub require_captions: bool,
    /// Size the video is resized to before cropping.
    pub source_resolution: Option<FrameSize>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            style: CaptionStyle::default(),
            require_captions: true,
            source_resolution: None,
        }
    }
}

/// Assemble the composition timeline.
///
/// The base video comes first, followed by one overlay per cue in cue order.
/// Duration and frame rate are taken from the video; the frame rate is
/// never changed. The audio plan is passed through untouched. With a
/// `source_resolution` the transform must be computed for that size.
pub fn compose(
    video: &VideoSource,
    cues: &[Cue],
    audio_plan: AudioMixPlan,
    transform: &FrameTransformSpec,
    rasterizer: &dyn TextRasterizer,
    options: &ComposeOptions,
) -> ReelcapResult<CompositionTimeline> {
    let native = FrameSize::new(video.width, video.height);
    let working = options.source_resolution.unwrap_or(native);
    if transform.native_width != working.width || transform.native_height != working.height {
        return Err(ReelcapError::config(format!(
            "Frame transform was computed for {}x{}, video is {working}",
            transform.native_width, transform.native_height
        )));
    }
    let resize = (working != native).then_some(working);

    let duration_secs = video.duration_secs;
    if (audio_plan.timeline_duration_secs - duration_secs).abs() > DURATION_MATCH_TOLERANCE_SECS {
        return Err(ReelcapError::config(format!(
            "Audio plan covers {:.3}s but the video is {:.3}s",
            audio_plan.timeline_duration_secs, duration_secs
        )));
    }

    if options.require_captions && cues.is_empty() {
        return Err(ReelcapError::EmptyTimeline);
    }

    let windows = StingerWindows::from_plan(&audio_plan, duration_secs);

    let mut visual_layers = Vec::with_capacity(cues.len() + 1);
    visual_layers.push(VisualLayer {
        content: LayerContent::Video {
            path: video.path.clone(),
            resize,
            transform: *transform,
        },
        position: ScreenAnchor::CENTER,
        start_secs: 0.0,
        end_secs: None,
    });

    for (cue_index, cue) in cues.iter().enumerate() {
        let image = rasterizer.rasterize(&cue.text, &options.style)?;
        visual_layers.push(VisualLayer {
            content: LayerContent::Caption { cue_index, image },
            position: windows.anchor_for(cue, &options.style),
            start_secs: cue.start_secs,
            end_secs: Some(cue.end_secs),
        });
    }

    tracing::info!(
        duration_secs,
        frame_rate = video.frame_rate,
        captions = cues.len(),
        audio_layers = audio_plan.len(),
        "Timeline composed"
    );

    Ok(CompositionTimeline {
        visual_layers,
        audio_plan,
        duration_secs,
        frame_rate: video.frame_rate,
    })
}

/// Spans during which the intro or outro stinger plays.
#[derive(Debug, Clone, Copy)]
struct StingerWindows {
    intro: Option<(f64, f64)>,
    outro: Option<(f64, f64)>,
}

impl StingerWindows {
    fn from_plan(plan: &AudioMixPlan, duration_secs: f64) -> Self {
        let span = |role| {
            plan.layer(role).map(|layer| {
                (
                    layer.placement.start_secs,
                    layer.end_secs().min(duration_secs),
                )
            })
        };
        Self {
            intro: span(LayerRole::Intro),
            outro: span(LayerRole::Outro),
        }
    }

    fn anchor_for(&self, cue: &Cue, style: &CaptionStyle) -> ScreenAnchor {
        let inside = |window: Option<(f64, f64)>| {
            window.is_some_and(|(start, end)| cue.start_secs >= start && cue.start_secs < end)
        };
        match (style.intro_anchor, style.outro_anchor) {
            (Some(anchor), _) if inside(self.intro) => anchor,
            (_, Some(anchor)) if inside(self.outro) => anchor,
            _ => style.anchor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcap_project_model::audio::{AudioLayerSpec, AudioRef, LayerAnchor, Placement};
    use std::path::PathBuf;

    fn video(duration: f64) -> VideoSource {
        VideoSource {
            path: PathBuf::from("in.mp4"),
            width: 1920,
            height: 1080,
            duration_secs: duration,
            frame_rate: 29.97,
        }
    }

    fn transform() -> FrameTransformSpec {
        FrameTransformSpec {
            native_width: 1920,
            native_height: 1080,
            target_width: 900,
            target_height: 800,
            crop_center_x: 540,
            crop_center_y: 960,
        }
    }

    fn cues() -> Vec<Cue> {
        [("hi", 0.0, 0.3), ("there", 0.3, 0.8), ("friend", 0.8, 1.4)]
            .into_iter()
            .map(|(text, start, end)| Cue {
                start_secs: start,
                end_secs: end,
                text: text.to_string(),
            })
            .collect()
    }

    fn plan_with(duration: f64, layers: Vec<AudioLayerSpec>) -> AudioMixPlan {
        let mut plan = AudioMixPlan::new(duration);
        for layer in layers {
            plan.push(layer);
        }
        plan
    }

    fn stinger(role: LayerRole, start: f64, len: f64) -> AudioLayerSpec {
        AudioLayerSpec {
            role,
            source: AudioRef::new(role.as_str(), "s.mp3", len),
            gain: 1.0,
            seek_offset_secs: 0.0,
            trim: None,
            placement: Placement {
                anchor: if role == LayerRole::Outro {
                    LayerAnchor::End
                } else {
                    LayerAnchor::Start
                },
                start_secs: start,
            },
        }
    }

    #[test]
    fn test_video_first_then_cues_in_order() {
        let timeline = compose(
            &video(1.4),
            &cues(),
            plan_with(1.4, vec![]),
            &transform(),
            &DrawTextRasterizer,
            &ComposeOptions::default(),
        )
        .unwrap();

        assert_eq!(timeline.visual_layers.len(), 4);
        assert!(!timeline.visual_layers[0].is_caption());
        assert_eq!(timeline.caption_count(), 3);
        assert_eq!(timeline.duration_secs, 1.4);
        assert_eq!(timeline.frame_rate, 29.97);

        let starts: Vec<f64> = timeline.caption_layers().map(|l| l.start_secs).collect();
        assert_eq!(starts, vec![0.0, 0.3, 0.8]);
        assert_eq!(timeline.visual_layers[3].end_secs, Some(1.4));
        assert!(timeline
            .caption_layers()
            .all(|l| l.position == ScreenAnchor::CENTER));
    }

    #[test]
    fn test_required_captions_missing_is_empty_timeline() {
        let result = compose(
            &video(1.4),
            &[],
            plan_with(1.4, vec![]),
            &transform(),
            &DrawTextRasterizer,
            &ComposeOptions::default(),
        );
        assert!(matches!(result, Err(ReelcapError::EmptyTimeline)));
    }

    #[test]
    fn test_composition_only_mode_allows_no_cues() {
        let options = ComposeOptions {
            require_captions: false,
            ..ComposeOptions::default()
        };
        let timeline = compose(
            &video(1.4),
            &[],
            plan_with(1.4, vec![]),
            &transform(),
            &DrawTextRasterizer,
            &options,
        )
        .unwrap();
        assert_eq!(timeline.visual_layers.len(), 1);
    }

    #[test]
    fn test_mismatched_plan_duration_rejected() {
        let result = compose(
            &video(1.4),
            &cues(),
            plan_with(2.0, vec![]),
            &transform(),
            &DrawTextRasterizer,
            &ComposeOptions::default(),
        );
        assert!(matches!(result, Err(ReelcapError::Config { .. })));
    }

    #[test]
    fn test_resized_source_carries_resize_on_video_layer() {
        let square = FrameTransformSpec {
            native_width: 1920,
            native_height: 1920,
            target_width: 900,
            target_height: 1600,
            crop_center_x: 960,
            crop_center_y: 960,
        };
        let options = ComposeOptions {
            source_resolution: Some(FrameSize::new(1920, 1920)),
            ..ComposeOptions::default()
        };
        let timeline = compose(
            &video(1.4),
            &cues(),
            plan_with(1.4, vec![]),
            &square,
            &DrawTextRasterizer,
            &options,
        )
        .unwrap();
        assert_eq!(timeline.source_resize(), Some(FrameSize::new(1920, 1920)));

        // a native-size transform no longer matches the resized frame
        let result = compose(
            &video(1.4),
            &cues(),
            plan_with(1.4, vec![]),
            &transform(),
            &DrawTextRasterizer,
            &options,
        );
        assert!(matches!(result, Err(ReelcapError::Config { .. })));
    }

    #[test]
    fn test_resize_to_native_size_is_omitted() {
        let options = ComposeOptions {
            source_resolution: Some(FrameSize::new(1920, 1080)),
            ..ComposeOptions::default()
        };
        let timeline = compose(
            &video(1.4),
            &cues(),
            plan_with(1.4, vec![]),
            &transform(),
            &DrawTextRasterizer,
            &options,
        )
        .unwrap();
        assert_eq!(timeline.source_resize(), None);
    }

    #[test]
    fn test_stinger_anchors() {
        let style = CaptionStyle {
            intro_anchor: Some(ScreenAnchor::TOP),
            outro_anchor: Some(ScreenAnchor::BOTTOM),
            ..CaptionStyle::default()
        };
        let options = ComposeOptions {
            style,
            require_captions: true,
            source_resolution: None,
        };
        let plan = plan_with(
            1.4,
            vec![
                stinger(LayerRole::Intro, 0.0, 0.3),
                stinger(LayerRole::Outro, 0.8, 0.6),
            ],
        );

        let timeline = compose(
            &video(1.4),
            &cues(),
            plan,
            &transform(),
            &DrawTextRasterizer,
            &options,
        )
        .unwrap();

        let anchors: Vec<ScreenAnchor> = timeline.caption_layers().map(|l| l.position).collect();
        assert_eq!(
            anchors,
            vec![ScreenAnchor::TOP, ScreenAnchor::CENTER, ScreenAnchor::BOTTOM]
        );
    }

    #[test]
    fn test_rasterizer_output_is_attached() {
        let timeline = compose(
            &video(1.4),
            &cues()[..1],
            plan_with(1.4, vec![]),
            &transform(),
            &DrawTextRasterizer,
            &ComposeOptions::default(),
        )
        .unwrap();

        match &timeline.visual_layers[1].content {
            LayerContent::Caption { cue_index, image } => {
                assert_eq!(*cue_index, 0);
                assert!(matches!(image, CaptionImage::Text { text, .. } if text == "hi"));
            }
            other => panic!("expected caption layer, got {other:?}"),
        }
    }
}
