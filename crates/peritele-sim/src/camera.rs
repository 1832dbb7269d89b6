use peritele_core::Scalar;
use peritele_restrictor::{CameraIntrinsics, off_axis_lh};

const NEAR: Scalar = 0.05;
const FAR: Scalar = 1000.0;

/// Headset-like stereo intrinsics: each eye's frustum is wider toward its own side.
pub fn headset_camera(width: u32, height: u32, ipd: Scalar) -> CameraIntrinsics {
    let fov_y: Scalar = 100f32.to_radians();
    let aspect = width as Scalar / height.max(1) as Scalar;
    let t = NEAR * (fov_y * 0.5).tan();
    let (inner, outer) = (t * aspect * 0.85, t * aspect * 1.15);
    CameraIntrinsics {
        eye_projection: [
            off_axis_lh(-outer, inner, -t, t, NEAR, FAR),
            off_axis_lh(-inner, outer, -t, t, NEAR, FAR),
        ],
        fov_y,
        aspect,
        near: NEAR,
        far: FAR,
        stereo_separation: ipd,
        pixel_width: width,
        pixel_height: height,
    }
}
