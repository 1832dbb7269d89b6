use peritele_core::{Eye, FrameInput, FrameStage, SetupError, is_ordered};

use crate::{CameraIntrinsics, RenderBackend, RestrictorController, SceneRenderer, Technique};

/// Engine-owned per-eye images: the rendered eye (kernel input) and the display output.
pub struct EyeImages<'a, T> {
    pub source: [&'a T; 2],
    pub output: [&'a T; 2],
}

/// Explicit stage order for one frame:
/// late update, pre-render, off-screen renders, left resolve, right resolve.
pub struct FramePipeline {
    pub camera: CameraIntrinsics,
    stages: Vec<FrameStage>,
}

impl FramePipeline {
    pub fn new(camera: CameraIntrinsics) -> Self { Self { camera, stages: Vec::with_capacity(5) } }

    /// Stages executed by the last [`FramePipeline::run_frame`].
    #[inline] pub fn stages(&self) -> &[FrameStage] { &self.stages }

    pub fn run_frame<B, T, R>(
        &mut self,
        ctl: &mut RestrictorController<B, T>,
        backend: &mut B,
        renderer: &mut R,
        frame: &FrameInput,
        eyes: &EyeImages<'_, B::Target>,
    ) -> Result<&[FrameStage], SetupError>
    where
        B: RenderBackend,
        T: Technique<B>,
        R: SceneRenderer<B>,
    {
        self.stages.clear();

        ctl.late_update(frame);
        self.stages.push(FrameStage::LateUpdate);

        ctl.pre_render(backend, &self.camera, frame.xr_active)?;
        self.stages.push(FrameStage::PreRender);

        {
            let mut views = ctl.offscreen_views();
            // stable: equal depths keep technique order
            views.sort_by_key(|v| v.depth);
            for v in &views { renderer.render(backend, v); }
        }
        self.stages.push(FrameStage::OffscreenRender);

        for eye in Eye::BOTH {
            ctl.resolve_eye(backend, eyes.source[eye.index()], eyes.output[eye.index()], frame.xr_active);
            self.stages.push(FrameStage::resolve(eye));
        }

        debug_assert!(is_ordered(&self.stages));
        Ok(&self.stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackendEvent, KernelBindings, OffscreenView, RecordingBackend, RestrictorCore, TargetId, ViewLog, off_axis_lh};
    use glam::{Mat4, Quat, Vec3};
    use peritele_core::{Pose, RigSlot, SessionConfig, pose};

    /// Exposes two views out of depth order.
    #[derive(Default)]
    struct TwoViews { targets: Vec<TargetId> }
    impl Technique<RecordingBackend> for TwoViews {
        fn first_xr_enabled(&mut self, _: &mut RestrictorCore, b: &mut RecordingBackend, _: &CameraIntrinsics) -> Result<(), SetupError> {
            let desc = b.eye_target_desc();
            self.targets = vec![b.create_target(&desc, "late"), b.create_target(&desc, "early")];
            Ok(())
        }
        fn bind_inputs<'a>(&'a self, b: &mut KernelBindings<'a, TargetId>) { b.predicted = self.targets.first(); }
        fn offscreen_views(&self) -> Vec<OffscreenView<'_, TargetId>> {
            self.targets.iter().zip([5, 1]).map(|(t, depth)| OffscreenView {
                slot: if depth == 1 { RigSlot::Current } else { RigSlot::Predicted },
                eye: Eye::Left,
                pose: Pose::default(),
                projection: Mat4::IDENTITY,
                target: t,
                depth,
            }).collect()
        }
    }

    fn camera() -> CameraIntrinsics {
        let p = off_axis_lh(-0.1, 0.1, -0.1, 0.1, 0.1, 50.0);
        CameraIntrinsics {
            eye_projection: [p, p], fov_y: 1.5, aspect: 1.0, near: 0.1, far: 50.0,
            stereo_separation: 0.064, pixel_width: 64, pixel_height: 64,
        }
    }

    fn frame(z: f32, xr_active: bool) -> FrameInput {
        FrameInput { dt: 1.0 / 90.0, rig: pose(Vec3::new(0.0, 0.0, z), Quat::IDENTITY), head: Pose::default(), xr_active }
    }

    #[test] fn stages_run_in_order_and_views_sorted() {
        let mut ctl = RestrictorController::new(&SessionConfig::default(), TwoViews::default()).unwrap();
        let mut be = RecordingBackend::new(64, 64);
        let (l, r, ol, or) = (be.target("l"), be.target("r"), be.target("ol"), be.target("or"));
        let eyes = EyeImages { source: [&l, &r], output: [&ol, &or] };
        let mut log = ViewLog::default();
        let mut pipe = FramePipeline::new(camera());

        let stages = pipe.run_frame(&mut ctl, &mut be, &mut log, &frame(0.0, true), &eyes).unwrap().to_vec();
        assert_eq!(stages, vec![
            FrameStage::LateUpdate, FrameStage::PreRender, FrameStage::OffscreenRender,
            FrameStage::ResolveLeft, FrameStage::ResolveRight,
        ]);
        assert_eq!(log.views.iter().map(|v| v.depth).collect::<Vec<_>>(), vec![1, 5]);
        assert_eq!(log.views[0].slot, RigSlot::Current);

        let outputs: Vec<_> = be.events.iter().filter_map(|e| match e {
            BackendEvent::Blit { dst, .. } if *dst == ol || *dst == or => Some(*dst),
            _ => None,
        }).collect();
        assert_eq!(outputs, vec![ol, or]);
        assert_eq!(be.dispatches().count(), 2);
        assert_eq!(be.live_scratch(), 0);
    }

    #[test] fn inactive_frames_pass_through() {
        let mut ctl = RestrictorController::new(&SessionConfig::default(), TwoViews::default()).unwrap();
        let mut be = RecordingBackend::new(64, 64);
        let (l, r, ol, or) = (be.target("l"), be.target("r"), be.target("ol"), be.target("or"));
        let eyes = EyeImages { source: [&l, &r], output: [&ol, &or] };
        let mut log = ViewLog::default();
        let mut pipe = FramePipeline::new(camera());
        be.events.clear();

        pipe.run_frame(&mut ctl, &mut be, &mut log, &frame(0.5, false), &eyes).unwrap();
        assert_eq!(be.events, vec![BackendEvent::Blit { src: l, dst: ol }, BackendEvent::Blit { src: r, dst: or }]);
        assert!(log.views.is_empty());
        assert_eq!(pipe.stages().len(), 5);
    }
}
