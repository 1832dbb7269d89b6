use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Work-group tile edge of the compositing kernel.
pub const KERNEL_GROUP_SIZE: u32 = 8;
/// Z extent of every dispatch; one slice per eye.
pub const STEREO_EYES: u32 = 2;

/// Uniform block of the compositing kernel. Field order is the WGSL layout.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct KernelParams {
    /// Per-eye clip -> view reconstruction matrices.
    pub eye_projection: [[[f32; 4]; 4]; 2],
    pub radius: f32,
    pub shift: f32,
    pub transition: f32,
    pub sqlr_pow: f32,
    pub x_scale: f32,
    /// 0 = current rig only, 1 = predicted rig only.
    pub lerp: f32,
    pub reverse_y: u32,
    pub force_black: u32,
    pub dither_space: u32,
    pub dither_time: u32,
    pub eye_index: u32,
    /// Frame counter, seeds temporal dither.
    pub frame: u32,
}

impl Default for KernelParams {
    fn default() -> Self {
        let id = Mat4::IDENTITY.to_cols_array_2d();
        Self { eye_projection: [id, id], ..Zeroable::zeroed() }
    }
}

impl KernelParams {
    pub fn set_eye_projection(&mut self, m: [Mat4; 2]) {
        self.eye_projection = [m[0].to_cols_array_2d(), m[1].to_cols_array_2d()];
    }
    #[inline] pub fn force_black(&self) -> bool { self.force_black != 0 }
    #[inline] pub fn dither_space(&self) -> bool { self.dither_space != 0 }
    #[inline] pub fn dither_time(&self) -> bool { self.dither_time != 0 }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DispatchGrid { pub x: u32, pub y: u32, pub z: u32 }

impl DispatchGrid {
    /// Tiles covering a `width` x `height` eye target.
    pub fn for_target(width: u32, height: u32) -> Self {
        Self { x: width.div_ceil(KERNEL_GROUP_SIZE), y: height.div_ceil(KERNEL_GROUP_SIZE), z: STEREO_EYES }
    }
    #[inline] pub fn is_empty(&self) -> bool { self.x == 0 || self.y == 0 }
}
