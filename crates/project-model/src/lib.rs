//! Reelcap Project Model
//!
//! Defines the core data contracts for a short-form render:
//! - **Captions:** Timed words from transcription and the cues built from them
//! - **Audio:** Audio sources, per-layer placement/gain, and the mix plan
//! - **Frame:** Crop geometry for re-framing to the target aspect ratio
//! - **Timeline:** The assembled visual and audio layers handed to the renderer
//! - **Pipeline:** The single configuration that drives one run
//!
//! All times are in seconds from the start of the source video. Every value
//! here is created once per run and never mutated afterwards.

pub mod audio;
pub mod caption;
pub mod frame;
pub mod pipeline;
pub mod timeline;

pub use audio::*;
pub use caption::*;
pub use frame::*;
pub use pipeline::*;
pub use timeline::*;
