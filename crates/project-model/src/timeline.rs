//! The composed timeline handed to the renderer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::audio::AudioMixPlan;
use crate::caption::{CaptionStyle, ScreenAnchor};
use crate::frame::{FrameSize, FrameTransformSpec};

/// A probed source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
    /// Native frame rate; never altered by the pipeline.
    pub frame_rate: f64,
}

/// A renderable caption image produced by the text-to-image collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptionImage {
    /// Text the renderer rasterizes itself with the given style.
    Text { text: String, style: CaptionStyle },
    /// A pre-rasterized image file.
    Bitmap {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// What a visual layer shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerContent {
    /// The source video, resized to `resize` when set, then cropped.
    Video {
        path: PathBuf,
        #[serde(default)]
        resize: Option<FrameSize>,
        transform: FrameTransformSpec,
    },
    /// A caption overlay built from cue number `cue_index`.
    Caption {
        cue_index: usize,
        image: CaptionImage,
    },
}

/// One timed visual element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualLayer {
    pub content: LayerContent,
    pub position: ScreenAnchor,
    pub start_secs: f64,
    /// `None` means until the end of the timeline.
    pub end_secs: Option<f64>,
}

impl VisualLayer {
    pub fn is_caption(&self) -> bool {
        matches!(self.content, LayerContent::Caption { .. })
    }
}

/// The fully assembled description of one output render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionTimeline {
    /// Base video first, then caption overlays in cue order.
    pub visual_layers: Vec<VisualLayer>,
    pub audio_plan: AudioMixPlan,
    pub duration_secs: f64,
    pub frame_rate: f64,
}

impl CompositionTimeline {
    /// The base video layer's path and transform, if present.
    pub fn base_video(&self) -> Option<(&PathBuf, &FrameTransformSpec)> {
        self.visual_layers
            .first()
            .and_then(|layer| match &layer.content {
                LayerContent::Video {
                    path, transform, ..
                } => Some((path, transform)),
                LayerContent::Caption { .. } => None,
            })
    }

    /// Size the base video is resized to before cropping, if any.
    pub fn source_resize(&self) -> Option<FrameSize> {
        match self.visual_layers.first().map(|layer| &layer.content) {
            Some(LayerContent::Video { resize, .. }) => *resize,
            _ => None,
        }
    }

    /// Caption overlays in order.
    pub fn caption_layers(&self) -> impl Iterator<Item = &VisualLayer> {
        self.visual_layers.iter().filter(|layer| layer.is_caption())
    }

    pub fn caption_count(&self) -> usize {
        self.caption_layers().count()
    }

    /// Number of frames the renderer will produce.
    pub fn total_frames(&self) -> u64 {
        (self.duration_secs * self.frame_rate).ceil() as u64
    }
}
