//! Crop geometry for re-framing a source video.
//!
//! Coordinates are in source pixels: `(0, 0)` is the top-left corner.

use serde::{Deserialize, Serialize};

/// A frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for FrameSize {
    type Err = String;

    /// Parses `WIDTHxHEIGHT`, e.g. `1920x1920`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("Expected WIDTHxHEIGHT, got {s}"))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("Invalid width {w:?}: {e}"))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("Invalid height {h:?}: {e}"))?;
        Ok(Self { width, height })
    }
}

/// How a source frame is cropped down to the target size.
///
/// `crop_center_x` / `crop_center_y` are the values handed to the renderer's
/// crop. They are axis-swapped relative to the source: `crop_center_x` is
/// half the native *height* and `crop_center_y` half the native *width*.
/// The renderer reads them back swapped, so `crop_center_y` is the
/// horizontal center and `crop_center_x` the vertical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameTransformSpec {
    pub native_width: u32,
    pub native_height: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub crop_center_x: u32,
    pub crop_center_y: u32,
}

impl FrameTransformSpec {
    /// Top-left corner of the crop window.
    ///
    /// The window is centered on the swapped center and clamped to stay
    /// inside the native frame.
    pub fn crop_origin(&self) -> (u32, u32) {
        let max_x = self.native_width.saturating_sub(self.target_width);
        let max_y = self.native_height.saturating_sub(self.target_height);
        let x = self
            .crop_center_y
            .saturating_sub(self.target_width / 2)
            .min(max_x);
        let y = self
            .crop_center_x
            .saturating_sub(self.target_height / 2)
            .min(max_y);
        (x, y)
    }

    /// Output frame size.
    pub fn output_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Width / height of the output.
    pub fn target_aspect(&self) -> f64 {
        self.target_width as f64 / self.target_height.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(nw: u32, nh: u32, tw: u32, th: u32) -> FrameTransformSpec {
        FrameTransformSpec {
            native_width: nw,
            native_height: nh,
            target_width: tw,
            target_height: th,
            crop_center_x: nh / 2,
            crop_center_y: nw / 2,
        }
    }

    #[test]
    fn test_crop_origin_from_swapped_center() {
        // crop_center (540, 960) is read as y = 540, x = 960
        let s = spec(1920, 1080, 900, 800);
        assert_eq!(s.crop_origin(), (510, 140));
    }

    #[test]
    fn test_crop_origin_is_centered_on_non_square_sources() {
        for (nw, nh, tw, th) in [
            (1920, 1080, 900, 800),
            (1080, 1920, 900, 1600),
            (1280, 720, 404, 720),
            (3840, 2160, 1080, 1920),
        ] {
            let s = spec(nw, nh, tw, th);
            let (x, y) = s.crop_origin();
            assert_eq!(x, nw / 2 - tw / 2, "{nw}x{nh} -> {tw}x{th}");
            assert_eq!(y, nh / 2 - th / 2, "{nw}x{nh} -> {tw}x{th}");
        }
        assert_eq!(spec(1080, 1920, 900, 1600).crop_origin(), (90, 160));
    }

    #[test]
    fn test_crop_origin_clamped_for_odd_sizes() {
        let s = spec(901, 1601, 900, 1600);
        assert_eq!(s.crop_origin(), (0, 0));
        let s = spec(1001, 1001, 1, 1);
        assert_eq!(s.crop_origin(), (500, 500));
    }

    #[test]
    fn test_crop_origin_stays_inside_frame() {
        let s = spec(1920, 1920, 900, 1600);
        let (x, y) = s.crop_origin();
        assert!(x + s.target_width <= s.native_width);
        assert!(y + s.target_height <= s.native_height);
        assert_eq!((x, y), (510, 160));
    }

    #[test]
    fn test_frame_size_parsing() {
        assert_eq!("1920x1920".parse::<FrameSize>(), Ok(FrameSize::new(1920, 1920)));
        assert_eq!("1280X720".parse::<FrameSize>(), Ok(FrameSize::new(1280, 720)));
        assert!("1920".parse::<FrameSize>().is_err());
        assert!("axb".parse::<FrameSize>().is_err());
        assert_eq!(FrameSize::new(900, 1600).to_string(), "900x1600");
        assert!(FrameSize::new(0, 10).is_empty());
    }

    #[test]
    fn test_target_aspect() {
        let s = spec(1920, 1920, 900, 1600);
        assert!((s.target_aspect() - 0.5625).abs() < 1e-9);
        assert_eq!(s.output_size(), (900, 1600));
    }
}
