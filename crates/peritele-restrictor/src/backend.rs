use glam::Mat4;
use peritele_core::{Eye, Pose, RigSlot};

use crate::{DispatchGrid, KernelParams};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TargetDesc {
    pub width: u32,
    pub height: u32,
    pub srgb: bool,
    /// Writable from the compute kernel.
    pub storage: bool,
}

impl TargetDesc {
    pub fn new(width: u32, height: u32) -> Self { Self { width, height, srgb: true, storage: false } }
    /// The eye source is linear even when the display descriptor says sRGB.
    pub fn linear(self) -> Self { Self { srgb: false, ..self } }
    pub fn writable(self) -> Self { Self { storage: true, ..self } }
}

/// Textures bound to one kernel dispatch.
pub struct KernelBindings<'a, T> {
    pub result: &'a T,
    pub moving_cam: &'a T,
    /// Image from the rig holding the previous forecast.
    pub current: Option<&'a T>,
    /// Image from the rig holding the new forecast.
    pub predicted: Option<&'a T>,
}

impl<'a, T> KernelBindings<'a, T> {
    pub fn new(result: &'a T, moving_cam: &'a T) -> Self {
        Self { result, moving_cam, current: None, predicted: None }
    }

    /// A peripheral input is left unbound.
    #[inline] pub fn is_partial(&self) -> bool { self.current.is_none() || self.predicted.is_none() }
}

/// GPU side of the compositor. Implemented by the wgpu backend and by the
/// headless recorder used in tests.
pub trait RenderBackend {
    type Target;

    /// Descriptor of one eye's render target as the display reports it.
    fn eye_target_desc(&self) -> TargetDesc;
    /// Persistent off-screen target.
    fn create_target(&mut self, desc: &TargetDesc, label: &str) -> Self::Target;
    /// Temporary target, returned with [`RenderBackend::release`] within the same call.
    fn acquire_scratch(&mut self, desc: &TargetDesc) -> Self::Target;
    /// Give back a scratch or persistent target.
    fn release(&mut self, target: Self::Target);
    fn dispatch(&mut self, params: &KernelParams, bindings: &KernelBindings<'_, Self::Target>, grid: DispatchGrid);
    fn blit(&mut self, src: &Self::Target, dst: &Self::Target);
}

/// One auxiliary eye camera to render off-screen this frame.
pub struct OffscreenView<'a, T> {
    pub slot: RigSlot,
    pub eye: Eye,
    /// World pose of the eye camera.
    pub pose: Pose,
    pub projection: Mat4,
    pub target: &'a T,
    /// Lower renders first.
    pub depth: i32,
}

impl<'a, T> OffscreenView<'a, T> {
    #[inline]
    pub fn view_proj(&self) -> Mat4 { self.projection * self.pose.view_matrix() }
}

/// Draws scene content into an off-screen target. Scene content itself lives outside this crate.
pub trait SceneRenderer<B: RenderBackend> {
    fn render(&mut self, backend: &mut B, view: &OffscreenView<'_, B::Target>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn partial_until_both_peripheral_inputs_bound() {
        let (result, cam, cur, pred) = (0u8, 1u8, 2u8, 3u8);
        let mut b = KernelBindings::new(&result, &cam);
        assert!(b.is_partial());
        b.current = Some(&cur);
        assert!(b.is_partial());
        b.predicted = Some(&pred);
        assert!(!b.is_partial());
    }
}
