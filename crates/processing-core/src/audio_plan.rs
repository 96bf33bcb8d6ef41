//! Audio layer planning.
//!
//! Decides, for every audio source present, when it starts on the timeline,
//! which part of the source plays, and how loud it is. The four layers are
//! independent; any subset may be absent, but never all of them.

use reelcap_common::config::BackgroundTrackTable;
use reelcap_common::error::{ReelcapError, ReelcapResult};
use reelcap_project_model::audio::{
    AudioLayerSpec, AudioMixPlan, AudioRef, LayerAnchor, LayerRole, Placement, TrimWindow,
};

/// Slack allowed when comparing a probed native duration with a trim end.
/// Container durations are reported with millisecond-ish precision.
const DURATION_TOLERANCE_SECS: f64 = 1e-3;

/// Audio sources available to one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioPlanRequest {
    /// The source video's own audio, if it has any.
    pub original: Option<AudioRef>,

    /// Whether `original` is mixed in.
    pub include_original: bool,

    /// Background track; `id` must be registered in the track table.
    pub background: Option<AudioRef>,

    pub intro: Option<AudioRef>,

    pub outro: Option<AudioRef>,

    /// Length of the output timeline in seconds.
    pub timeline_duration_secs: f64,
}

/// Compute the audio mix plan.
///
/// Layers are inserted in the order original, background, intro, outro.
pub fn plan_audio(
    request: &AudioPlanRequest,
    tracks: &BackgroundTrackTable,
) -> ReelcapResult<AudioMixPlan> {
    let duration = request.timeline_duration_secs;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ReelcapError::config(format!(
            "Timeline duration must be positive, got {duration}"
        )));
    }

    let background = match &request.background {
        Some(source) => Some(plan_background(source, tracks, duration)?),
        None => None,
    };

    let mut plan = AudioMixPlan::new(duration);

    if let Some(original) = request.original.as_ref().filter(|_| request.include_original) {
        plan.push(AudioLayerSpec {
            role: LayerRole::Original,
            source: original.clone(),
            gain: 1.0,
            seek_offset_secs: 0.0,
            trim: None,
            placement: Placement::AT_START,
        });
    }

    if let Some(layer) = background {
        plan.push(layer);
    }

    if let Some(intro) = &request.intro {
        plan.push(AudioLayerSpec {
            role: LayerRole::Intro,
            source: intro.clone(),
            gain: 1.0,
            seek_offset_secs: 0.0,
            trim: None,
            placement: Placement::AT_START,
        });
    }

    if let Some(outro) = &request.outro {
        plan.push(plan_outro(outro, duration)?);
    }

    if plan.is_empty() {
        return Err(ReelcapError::EmptyMix);
    }

    tracing::info!(
        layers = plan.len(),
        timeline_secs = duration,
        roles = ?plan.layers().iter().map(|l| l.role.as_str()).collect::<Vec<_>>(),
        "Audio mix planned"
    );

    Ok(plan)
}

fn plan_background(
    source: &AudioRef,
    tracks: &BackgroundTrackTable,
    duration: f64,
) -> ReelcapResult<AudioLayerSpec> {
    let track = tracks.lookup(&source.id)?;
    let seek = track.seek_offset_secs;
    let end = seek + duration;

    if end > source.duration_secs + DURATION_TOLERANCE_SECS {
        return Err(ReelcapError::BackgroundTrackTooShort {
            track_id: source.id.clone(),
            required_secs: end,
            available_secs: source.duration_secs,
        });
    }

    tracing::debug!(
        track = %source.id,
        gain = track.gain,
        trim_start = seek,
        trim_end = end,
        "Background layer"
    );

    Ok(AudioLayerSpec {
        role: LayerRole::Background,
        source: source.clone(),
        gain: track.gain,
        seek_offset_secs: seek,
        trim: Some(TrimWindow {
            start_secs: seek,
            end_secs: end,
        }),
        placement: Placement::AT_START,
    })
}

fn plan_outro(outro: &AudioRef, duration: f64) -> ReelcapResult<AudioLayerSpec> {
    let start_secs = duration - outro.duration_secs;
    if start_secs < 0.0 {
        return Err(ReelcapError::InvalidOutroPlacement {
            outro_secs: outro.duration_secs,
            timeline_secs: duration,
        });
    }

    Ok(AudioLayerSpec {
        role: LayerRole::Outro,
        source: outro.clone(),
        gain: 1.0,
        seek_offset_secs: 0.0,
        trim: None,
        placement: Placement {
            anchor: LayerAnchor::End,
            start_secs,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcap_common::config::BackgroundTrack;
    use std::path::PathBuf;

    fn tracks() -> BackgroundTrackTable {
        let mut table = BackgroundTrackTable::new();
        table.insert(
            "phonk",
            BackgroundTrack {
                path: PathBuf::from("resources/phonk.mp3"),
                gain: 0.1,
                seek_offset_secs: 25.0,
            },
        );
        table
    }

    fn request(duration: f64) -> AudioPlanRequest {
        AudioPlanRequest {
            original: Some(AudioRef::new("original", "in.mp4", duration)),
            include_original: true,
            timeline_duration_secs: duration,
            ..AudioPlanRequest::default()
        }
    }

    #[test]
    fn test_original_only() {
        let plan = plan_audio(&request(10.0), &tracks()).unwrap();
        assert_eq!(plan.len(), 1);
        let original = plan.layer(LayerRole::Original).unwrap();
        assert_eq!(original.gain, 1.0);
        assert_eq!(original.placement, Placement::AT_START);
        assert!(original.trim.is_none());
    }

    #[test]
    fn test_background_trim_and_gain() {
        let mut req = request(1.4);
        req.background = Some(AudioRef::new("phonk", "resources/phonk.mp3", 180.0));

        let plan = plan_audio(&req, &tracks()).unwrap();
        let bg = plan.layer(LayerRole::Background).unwrap();
        assert_eq!(bg.gain, 0.1);
        assert_eq!(bg.seek_offset_secs, 25.0);
        let trim = bg.trim.unwrap();
        assert_eq!(trim.start_secs, 25.0);
        assert!((trim.end_secs - 26.4).abs() < 1e-9);
        assert_eq!(bg.placement.start_secs, 0.0);
    }

    #[test]
    fn test_unknown_background_fails() {
        let mut req = request(5.0);
        req.background = Some(AudioRef::new("polka", "polka.mp3", 60.0));
        assert!(matches!(
            plan_audio(&req, &tracks()),
            Err(ReelcapError::UnknownBackgroundTrack { ref track_id }) if track_id == "polka"
        ));
    }

    #[test]
    fn test_background_too_short_fails() {
        let mut req = request(10.0);
        req.background = Some(AudioRef::new("phonk", "resources/phonk.mp3", 30.0));
        assert!(matches!(
            plan_audio(&req, &tracks()),
            Err(ReelcapError::BackgroundTrackTooShort { .. })
        ));
    }

    #[test]
    fn test_outro_anchored_to_end() {
        let mut req = request(12.0);
        req.outro = Some(AudioRef::new("outro", "outro.mp3", 2.5));

        let plan = plan_audio(&req, &tracks()).unwrap();
        let outro = plan.layer(LayerRole::Outro).unwrap();
        assert_eq!(outro.placement.anchor, LayerAnchor::End);
        assert_eq!(outro.placement.start_secs, 9.5);
        assert!((outro.end_secs() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_outro_longer_than_timeline_fails() {
        let mut req = request(2.0);
        req.outro = Some(AudioRef::new("outro", "outro.mp3", 3.0));
        assert!(matches!(
            plan_audio(&req, &tracks()),
            Err(ReelcapError::InvalidOutroPlacement { .. })
        ));
    }

    #[test]
    fn test_intro_at_start_untrimmed() {
        let mut req = request(8.0);
        req.intro = Some(AudioRef::new("intro", "intro.mp3", 1.5));

        let plan = plan_audio(&req, &tracks()).unwrap();
        let intro = plan.layer(LayerRole::Intro).unwrap();
        assert_eq!(intro.placement, Placement::AT_START);
        assert!(intro.trim.is_none());
        assert_eq!(intro.gain, 1.0);
    }

    #[test]
    fn test_all_absent_is_empty_mix() {
        let req = AudioPlanRequest {
            timeline_duration_secs: 5.0,
            ..AudioPlanRequest::default()
        };
        assert!(matches!(
            plan_audio(&req, &tracks()),
            Err(ReelcapError::EmptyMix)
        ));
    }

    #[test]
    fn test_excluded_original_counts_as_absent() {
        let mut req = request(5.0);
        req.include_original = false;
        assert!(matches!(
            plan_audio(&req, &tracks()),
            Err(ReelcapError::EmptyMix)
        ));
    }

    #[test]
    fn test_insertion_order_is_fixed() {
        let mut req = request(20.0);
        req.outro = Some(AudioRef::new("outro", "outro.mp3", 2.0));
        req.intro = Some(AudioRef::new("intro", "intro.mp3", 2.0));
        req.background = Some(AudioRef::new("phonk", "resources/phonk.mp3", 100.0));

        let plan = plan_audio(&req, &tracks()).unwrap();
        let roles: Vec<LayerRole> = plan.layers().iter().map(|l| l.role).collect();
        assert_eq!(
            roles,
            vec![
                LayerRole::Original,
                LayerRole::Background,
                LayerRole::Intro,
                LayerRole::Outro
            ]
        );
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        assert!(matches!(
            plan_audio(&request(0.0), &tracks()),
            Err(ReelcapError::Config { .. })
        ));
    }
}
