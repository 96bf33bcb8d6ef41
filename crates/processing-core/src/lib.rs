//! Reelcap Processing Core
//!
//! Turns collaborator output into render decisions:
//! - **Cue Builder:** Flatten timed words into caption cues
//! - **Audio Planner:** Place, trim, and weight each audio layer
//! - **Frame Transform:** Crop geometry for the target aspect ratio
//!
//! This crate is pure computation: no I/O, no external tools.
//! All inputs are data; all outputs are data. Calling any operation twice
//! with the same inputs yields the same output.

pub mod audio_plan;
pub mod cues;
pub mod frame_transform;

pub use audio_plan::{plan_audio, AudioPlanRequest};
pub use cues::{build_cues, build_cues_for_mode, build_segment_cues, flatten_words};
pub use frame_transform::compute_transform;
