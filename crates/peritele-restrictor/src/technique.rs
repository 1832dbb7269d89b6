use peritele_core::{FrameInput, SetupError};

use crate::{CameraIntrinsics, KernelBindings, MotionSample, OffscreenView, RenderBackend, RestrictorCore};

/// Handed to [`Technique::on_moving`] each frame the rig moves.
#[derive(Copy, Clone, Debug)]
pub struct MovingUpdate {
    /// First moving frame after being stationary.
    pub started: bool,
    pub motion: MotionSample,
}

/// Locomotion-technique extension points, selected at compile time.
///
/// `core` is the controller's shared state; hooks may update kernel params
/// through it but never the previous-frame pose.
#[allow(unused_variables)]
pub trait Technique<B: RenderBackend> {
    fn start(&mut self, core: &mut RestrictorCore) {}

    /// Called from the moving branch after restrictor params are pushed.
    fn on_moving(&mut self, core: &mut RestrictorCore, frame: &FrameInput, update: MovingUpdate) {}

    /// Called every frame after the restrictor update, before the previous pose is recorded.
    fn late_update(&mut self, core: &mut RestrictorCore, frame: &FrameInput) {}

    /// First frame XR rendering is active. Allocate targets here.
    fn first_xr_enabled(&mut self, core: &mut RestrictorCore, backend: &mut B, camera: &CameraIntrinsics) -> Result<(), SetupError> {
        Ok(())
    }

    fn after_first_frame(&mut self, core: &mut RestrictorCore) {}

    /// Per-eye, before the dispatch. Pick the eye and set eye-dependent params.
    fn before_composite(&mut self, core: &mut RestrictorCore) {}

    /// Bind technique textures for the eye chosen in `before_composite`.
    fn bind_inputs<'a>(&'a self, bindings: &mut KernelBindings<'a, B::Target>) {}

    fn after_composite(&mut self, core: &mut RestrictorCore) {}

    /// Off-screen cameras to render after pre-render, any order; the driver sorts by depth.
    fn offscreen_views(&self) -> Vec<OffscreenView<'_, B::Target>> { Vec::new() }

    /// Release persistent targets.
    fn teardown(&mut self, backend: &mut B) {}
}
