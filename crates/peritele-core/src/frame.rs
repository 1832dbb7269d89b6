use crate::{Pose, Scalar};

/// Tracked input for one render frame.
#[derive(Copy, Clone, Debug)]
pub struct FrameInput {
    pub dt: Scalar,
    /// Locomoting entity (the XR rig) in world space.
    pub rig: Pose,
    /// Render camera relative to the rig (head tracking).
    pub head: Pose,
    /// Display reports XR rendering enabled and a device active.
    pub xr_active: bool,
}

impl FrameInput {
    /// Render camera in world space.
    #[inline]
    pub fn camera(&self) -> Pose { self.rig.compose(&self.head) }
}
