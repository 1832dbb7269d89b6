use glam::{Mat4, Vec4};
use peritele_core::{Eye, GraphicsApi, Scalar};

/// Intrinsics of the real render camera as the display reports them.
///
/// Projections map +Z-forward view space to 0..1 depth clip space.
#[derive(Copy, Clone, Debug)]
pub struct CameraIntrinsics {
    pub eye_projection: [Mat4; 2],
    pub fov_y: Scalar,
    pub aspect: Scalar,
    pub near: Scalar,
    pub far: Scalar,
    /// Interpupillary distance, metres.
    pub stereo_separation: Scalar,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl CameraIntrinsics {
    #[inline] pub fn projection(&self, eye: Eye) -> Mat4 { self.eye_projection[eye.index()] }

    /// Projection a camera computes for itself before any device override.
    pub fn symmetric_projection(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, self.aspect.max(0.01), self.near, self.far)
    }
}

/// Off-axis frustum from near-plane extents (left-handed, 0..1 depth).
pub fn off_axis_lh(l: Scalar, r: Scalar, b: Scalar, t: Scalar, n: Scalar, f: Scalar) -> Mat4 {
    let depth = f / (f - n);
    Mat4::from_cols(
        Vec4::new(2.0 * n / (r - l), 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * n / (t - b), 0.0, 0.0),
        Vec4::new(-(r + l) / (r - l), -(t + b) / (t - b), depth, 1.0),
        Vec4::new(0.0, 0.0, -n * depth, 0.0),
    )
}

/// Per-eye matrices uploaded once per session.
#[derive(Copy, Clone, Debug)]
pub struct EyeProjections {
    /// clip -> view, Y-corrected for the active API. This is what the kernel sees.
    pub reconstruct: [Mat4; 2],
    /// Inverse of `reconstruct`.
    pub reproject: [Mat4; 2],
}

impl EyeProjections {
    pub fn capture(cam: &CameraIntrinsics, api: GraphicsApi) -> Self {
        let mut reconstruct = cam.eye_projection.map(|p| p.inverse());
        if api.needs_y_flip() {
            for m in &mut reconstruct { m.y_axis.y *= -1.0; }
        }
        let reproject = reconstruct.map(|m| m.inverse());
        Self { reconstruct, reproject }
    }
}
