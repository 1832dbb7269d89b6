use glam::{Mat4, Quat, Vec3};
use peritele_core::{Eye, Pose, RigSlot, Scalar};
use peritele_restrictor::{CameraIntrinsics, OffscreenView};

/// One eye of an auxiliary rig. Renders off-screen only.
#[derive(Clone, Debug)]
pub struct AuxEyeCamera<T> {
    pub eye: Eye,
    /// Pose in the rig's frame: head pose plus sway bias.
    pub local: Pose,
    /// World pose after the lateral eye offset.
    pub world: Pose,
    pub projection: Mat4,
    pub target: Option<T>,
    pub depth: i32,
    /// Sub-pixel projection jitter; kept off so consecutive frames stay coherent.
    pub jitter: bool,
}

impl<T> AuxEyeCamera<T> {
    fn new(eye: Eye, depth: i32) -> Self {
        Self {
            eye,
            local: Pose::default(),
            world: Pose::default(),
            projection: Mat4::IDENTITY,
            target: None,
            depth,
            jitter: false,
        }
    }
}

/// Virtual viewpoint with a stereo pair of cameras.
#[derive(Clone, Debug)]
pub struct AuxRig<T> {
    pub slot: RigSlot,
    pub pose: Pose,
    pub sway_bias: Vec3,
    pub sway_rot_bias: Quat,
    pub cams: [AuxEyeCamera<T>; 2],
}

impl<T> AuxRig<T> {
    /// The predicted rig renders first (depth 0), the current rig after it.
    pub fn new(slot: RigSlot) -> Self {
        let depth = match slot { RigSlot::Predicted => 0, RigSlot::Current => 1 };
        Self {
            slot,
            pose: Pose::default(),
            sway_bias: Vec3::ZERO,
            sway_rot_bias: Quat::IDENTITY,
            cams: [AuxEyeCamera::new(Eye::Left, depth), AuxEyeCamera::new(Eye::Right, depth)],
        }
    }

    #[inline] pub fn cam(&self, eye: Eye) -> &AuxEyeCamera<T> { &self.cams[eye.index()] }
    #[inline] pub fn target(&self, eye: Eye) -> Option<&T> { self.cams[eye.index()].target.as_ref() }

    pub fn reset_bias(&mut self) {
        self.sway_bias = Vec3::ZERO;
        self.sway_rot_bias = Quat::IDENTITY;
    }

    /// Take over `from`'s bias and clear `from`'s.
    pub fn inherit_bias(&mut self, from: &mut AuxRig<T>) {
        self.sway_bias = from.sway_bias;
        self.sway_rot_bias = from.sway_rot_bias;
        from.reset_bias();
    }

    /// Bind the targets and take the device's projection for the matching eye.
    /// A projection recomputed from the copied intrinsics is skewed the wrong way.
    pub fn configure(&mut self, camera: &CameraIntrinsics, targets: [T; 2]) {
        for (cam, target) in self.cams.iter_mut().zip(targets) {
            cam.projection = camera.projection(cam.eye);
            cam.target = Some(target);
            cam.jitter = false;
        }
    }

    /// Track the real head, offset each eye by `half_spread` along its own right.
    pub fn update_cameras(&mut self, head: &Pose, half_spread: Scalar) {
        let local = Pose { pos: head.pos + self.sway_bias, rot: head.rot * self.sway_rot_bias };
        for cam in &mut self.cams {
            cam.local = local;
            let mut world = self.pose.compose(&local);
            world.pos += cam.eye.side() * half_spread * world.right();
            cam.world = world;
        }
    }

    pub fn views(&self) -> impl Iterator<Item = OffscreenView<'_, T>> + '_ {
        self.cams.iter().filter_map(move |c| {
            c.target.as_ref().map(|target| OffscreenView {
                slot: self.slot,
                eye: c.eye,
                pose: c.world,
                projection: c.projection,
                target,
                depth: c.depth,
            })
        })
    }

    pub fn take_targets(&mut self) -> impl Iterator<Item = T> + '_ {
        self.cams.iter_mut().filter_map(|c| c.target.take())
    }
}
