//! Audio layer types.
//!
//! Each audio source that contributes to the final soundtrack becomes one
//! [`AudioLayerSpec`]. Mixing is commutative, but the plan keeps insertion
//! order so diagnostics and tests are deterministic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A probed audio source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRef {
    /// Identifier (track id, or a label such as "original").
    pub id: String,
    /// Path to the media file carrying the audio.
    pub path: PathBuf,
    /// Native duration of the source in seconds.
    pub duration_secs: f64,
}

impl AudioRef {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            duration_secs,
        }
    }
}

/// What a layer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerRole {
    /// The source video's own audio.
    Original,
    /// Music bed under the whole timeline.
    Background,
    /// Stinger at the start.
    Intro,
    /// Stinger ending exactly at the end of the timeline.
    Outro,
}

impl LayerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerRole::Original => "original",
            LayerRole::Background => "background",
            LayerRole::Intro => "intro",
            LayerRole::Outro => "outro",
        }
    }
}

/// Reference point a layer's placement is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerAnchor {
    Start,
    End,
}

/// Where a layer sits on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub anchor: LayerAnchor,
    /// Timeline time at which the layer starts playing.
    pub start_secs: f64,
}

impl Placement {
    /// Placed at the very start of the timeline.
    pub const AT_START: Placement = Placement {
        anchor: LayerAnchor::Start,
        start_secs: 0.0,
    };
}

/// Portion of the source that is played, `[start_secs, end_secs)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl TrimWindow {
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// One audio track to be mixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioLayerSpec {
    pub role: LayerRole,
    pub source: AudioRef,
    /// Linear gain in (0, 1].
    pub gain: f64,
    /// Seconds skipped at the start of the source.
    pub seek_offset_secs: f64,
    /// Played window of the source; `None` plays it untrimmed.
    pub trim: Option<TrimWindow>,
    pub placement: Placement,
}

impl AudioLayerSpec {
    /// Seconds of timeline this layer occupies.
    pub fn rendered_duration_secs(&self) -> f64 {
        match self.trim {
            Some(window) => window.duration_secs(),
            None => self.source.duration_secs - self.seek_offset_secs,
        }
    }

    /// Timeline time at which the layer stops playing.
    pub fn end_secs(&self) -> f64 {
        self.placement.start_secs + self.rendered_duration_secs()
    }
}

/// The ordered set of audio layers for one render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioMixPlan {
    /// Timeline duration the plan was computed for.
    pub timeline_duration_secs: f64,
    layers: Vec<AudioLayerSpec>,
}

impl AudioMixPlan {
    pub fn new(timeline_duration_secs: f64) -> Self {
        Self {
            timeline_duration_secs,
            layers: Vec::new(),
        }
    }

    /// Append a layer, preserving insertion order.
    pub fn push(&mut self, layer: AudioLayerSpec) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[AudioLayerSpec] {
        &self.layers
    }

    /// First layer with the given role.
    pub fn layer(&self, role: LayerRole) -> Option<&AudioLayerSpec> {
        self.layers.iter().find(|layer| layer.role == role)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(role: LayerRole, trim: Option<TrimWindow>, start: f64) -> AudioLayerSpec {
        AudioLayerSpec {
            role,
            source: AudioRef::new(role.as_str(), "a.mp3", 10.0),
            gain: 1.0,
            seek_offset_secs: trim.map(|t| t.start_secs).unwrap_or(0.0),
            trim,
            placement: Placement {
                anchor: LayerAnchor::Start,
                start_secs: start,
            },
        }
    }

    #[test]
    fn test_rendered_duration_prefers_trim() {
        let trimmed = layer(
            LayerRole::Background,
            Some(TrimWindow {
                start_secs: 2.0,
                end_secs: 5.0,
            }),
            0.0,
        );
        assert!((trimmed.rendered_duration_secs() - 3.0).abs() < 1e-9);

        let untrimmed = layer(LayerRole::Intro, None, 1.0);
        assert!((untrimmed.rendered_duration_secs() - 10.0).abs() < 1e-9);
        assert!((untrimmed.end_secs() - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_plan_preserves_insertion_order() {
        let mut plan = AudioMixPlan::new(5.0);
        plan.push(layer(LayerRole::Outro, None, 0.0));
        plan.push(layer(LayerRole::Original, None, 0.0));

        let roles: Vec<LayerRole> = plan.layers().iter().map(|l| l.role).collect();
        assert_eq!(roles, vec![LayerRole::Outro, LayerRole::Original]);
        assert!(plan.layer(LayerRole::Original).is_some());
        assert!(plan.layer(LayerRole::Background).is_none());
    }
}
