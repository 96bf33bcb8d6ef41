//! Reelcap Render Engine
//!
//! Composes caption cues, the re-framed source video, and the planned audio
//! layers into one timeline, then renders it to a single output file.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source.mp4 ──┬── probe ── Frame Transform (crop) ──────────┐
//!              │                                             │
//!              └── transcribe ── Cue Builder ── rasterize ───┤
//!                                                            ├── CompositionTimeline
//! background / intro / outro ── probe ── Audio Planner ──────┘          │
//!                                                                       ▼
//!                                                          ffmpeg (crop, drawtext, amix)
//!                                                                       │
//!                                                                       ▼
//!                                                          staging file ── rename ── output.mp4
//! ```

pub mod compositor;
pub mod export;
pub mod pipeline;
pub mod probe;

pub use compositor::*;
pub use export::*;
pub use pipeline::*;
pub use probe::*;
