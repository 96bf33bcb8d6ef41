//! Re-framing to the target aspect ratio.
//!
//! The crop is taken around the middle of the source frame. The center
//! handed to the renderer is axis-swapped: x gets half the native height and
//! y half the native width, matching the renderer's coordinate convention.
//! `FrameTransformSpec::crop_origin` reads them back swapped.

use reelcap_common::error::{ReelcapError, ReelcapResult};
use reelcap_project_model::frame::FrameTransformSpec;

/// Compute the crop for a `target_width x target_height` output.
///
/// Crop never upscales: a target larger than the source in either dimension
/// fails with `UnsupportedAspect`.
pub fn compute_transform(
    native_width: u32,
    native_height: u32,
    target_width: u32,
    target_height: u32,
) -> ReelcapResult<FrameTransformSpec> {
    let unsupported = target_width == 0
        || target_height == 0
        || target_width > native_width
        || target_height > native_height;
    if unsupported {
        return Err(ReelcapError::UnsupportedAspect {
            native_width,
            native_height,
            target_width,
            target_height,
        });
    }

    let x_center = native_width / 2;
    let y_center = native_height / 2;

    let spec = FrameTransformSpec {
        native_width,
        native_height,
        target_width,
        target_height,
        crop_center_x: y_center,
        crop_center_y: x_center,
    };

    tracing::debug!(
        native = %format!("{native_width}x{native_height}"),
        target = %format!("{target_width}x{target_height}"),
        crop_center_x = spec.crop_center_x,
        crop_center_y = spec.crop_center_y,
        "Frame transform computed"
    );

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tall_target_on_landscape_source_rejected() {
        let err = compute_transform(1920, 1080, 900, 1600).unwrap_err();
        assert!(matches!(
            err,
            ReelcapError::UnsupportedAspect {
                target_height: 1600,
                native_height: 1080,
                ..
            }
        ));
    }

    #[test]
    fn test_center_is_axis_swapped() {
        let spec = compute_transform(1920, 1080, 900, 800).unwrap();
        assert_eq!((spec.crop_center_x, spec.crop_center_y), (540, 960));
        assert_eq!(spec.output_size(), (900, 800));
    }

    #[test]
    fn test_square_source_to_vertical() {
        let spec = compute_transform(1920, 1920, 900, 1600).unwrap();
        assert_eq!((spec.crop_center_x, spec.crop_center_y), (960, 960));
    }

    #[test]
    fn test_wider_target_rejected() {
        assert!(compute_transform(720, 1280, 1080, 1280).is_err());
    }

    #[test]
    fn test_same_size_is_identity_crop() {
        let spec = compute_transform(1080, 1920, 1080, 1920).unwrap();
        assert_eq!(spec.crop_origin(), (0, 0));
    }
}
