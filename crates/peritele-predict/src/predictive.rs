use glam::{Quat, Vec3};
use peritele_core::{
    Eye, FrameInput, LocomotionSource, Pose, PredictionConfig, RigSlot, Scalar, SetupError, ground_dir,
};
use peritele_restrictor::{
    CameraIntrinsics, KernelBindings, MotionClass, MotionSample, MovingUpdate, OffscreenView, RenderBackend,
    RestrictorCore, Technique,
};
use tracing::{debug, info, warn};

use crate::{AuxRig, BlendOverride, Forecast, PredictionVectors, SwayDetector, TeleportCycle};

/// Peripheral teleportation. `T` is the backend's render target type.
pub struct PredictiveRestrictor<T> {
    pub cfg: PredictionConfig,
    vectors: PredictionVectors,
    cycle: TeleportCycle,
    current: AuxRig<T>,
    predicted: AuxRig<T>,
    sway: SwayDetector,
    half_ipd: Scalar,
    rendering_left: bool,
    eye: Eye,
    last_forecast: Forecast,
}

impl<T> PredictiveRestrictor<T> {
    /// Speeds are sampled from `loco` once; later changes to the provider are not seen.
    pub fn new(cfg: &PredictionConfig, loco: &impl LocomotionSource) -> Result<Self, SetupError> {
        cfg.validate()?;
        for (field, v) in [("locomotion.move_speed", loco.move_speed()), ("locomotion.turn_speed", loco.turn_speed())] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(SetupError::Invalid { field, reason: format!("must be >= 0, got {v}") });
            }
        }
        Ok(Self {
            vectors: PredictionVectors::new(loco, cfg.teleport_interval),
            cycle: TeleportCycle::new(cfg.teleport_interval),
            current: AuxRig::new(RigSlot::Current),
            predicted: AuxRig::new(RigSlot::Predicted),
            sway: SwayDetector::new(cfg.sway_threshold),
            half_ipd: 0.0,
            rendering_left: false,
            eye: Eye::Left,
            last_forecast: Forecast::NONE,
            cfg: cfg.clone(),
        })
    }

    #[inline] pub fn vectors(&self) -> &PredictionVectors { &self.vectors }
    #[inline] pub fn cycle(&self) -> &TeleportCycle { &self.cycle }
    #[inline] pub fn sway(&self) -> &SwayDetector { &self.sway }
    #[inline] pub fn last_forecast(&self) -> Forecast { self.last_forecast }
    /// Eye bound by the last per-eye composite.
    #[inline] pub fn eye(&self) -> Eye { self.eye }

    pub fn rig(&self, slot: RigSlot) -> &AuxRig<T> {
        match slot {
            RigSlot::Current => &self.current,
            RigSlot::Predicted => &self.predicted,
        }
    }

    pub fn set_dither_space(&mut self, core: &mut RestrictorCore, on: bool) {
        self.cfg.dither_space = on;
        self.push_dither(core);
    }
    pub fn set_dither_time(&mut self, core: &mut RestrictorCore, on: bool) {
        self.cfg.dither_time = on;
        self.push_dither(core);
    }

    fn push_dither(&self, core: &mut RestrictorCore) {
        core.params.dither_space = self.cfg.dither_space as u32;
        core.params.dither_time = self.cfg.dither_time as u32;
    }

    /// Hand the predicted pose to the current rig and forecast a new one.
    fn predict(&mut self, frame: &FrameInput, motion: MotionSample) {
        if self.cycle.is_first() {
            self.current.pose = frame.rig;
            self.current.reset_bias();
            self.predicted.reset_bias();
        } else {
            self.current.pose = self.predicted.pose;
        }

        let xz_fwd = ground_dir(frame.camera().forward());
        let forecast = self.vectors.select(motion.trans_dir, motion.rot_dir, xz_fwd);

        self.current.inherit_bias(&mut self.predicted);
        self.predicted.pose = Pose { pos: frame.rig.pos + forecast.offset, rot: frame.rig.rot };
        if forecast.yaw_deg != 0.0 {
            // pivot on the predicted rig's head position
            let pivot = self.predicted.pose.transform_point(frame.head.pos);
            self.predicted.pose.rotate_around(pivot, Vec3::Y, forecast.yaw_deg);
        }
        self.last_forecast = forecast;
        self.cycle.wrap();

        debug!(
            cycle = self.cycle.cycles,
            class = ?MotionClass::from_dirs(motion.trans_dir, motion.rot_dir),
            offset = ?forecast.offset,
            yaw = forecast.yaw_deg,
            "prediction cycle"
        );
    }

    fn update_aux_cameras(&mut self, prev_head: &Pose, head: &Pose) {
        let delta = (head.pos - prev_head.pos) * (self.cfg.peri_scale - 1.0);
        self.current.sway_bias += delta;
        self.predicted.sway_bias += delta;

        if self.cfg.peri_rot_scale != 1.0 {
            let (axis, angle) = (head.rot * prev_head.rot.inverse()).to_axis_angle();
            if angle != 0.0 {
                let amp = Quat::from_axis_angle(axis, angle * (self.cfg.peri_rot_scale - 1.0));
                self.current.sway_rot_bias = (self.current.sway_rot_bias * amp).normalize();
                self.predicted.sway_rot_bias = (self.predicted.sway_rot_bias * amp).normalize();
            }
        }

        let spread = self.half_ipd * self.cfg.peri_scale;
        self.current.update_cameras(head, spread);
        self.predicted.update_cameras(head, spread);
    }
}

impl<B: RenderBackend> Technique<B> for PredictiveRestrictor<B::Target> {
    fn start(&mut self, core: &mut RestrictorCore) {
        if core.cfg.force_black_periphery {
            core.set_black_periphery(true);
            self.cfg.dither_space = false;
        }
        self.push_dither(core);
    }

    fn on_moving(&mut self, core: &mut RestrictorCore, frame: &FrameInput, update: MovingUpdate) {
        if update.started { self.cycle.restart(); }
        if self.cycle.due() { self.predict(frame, update.motion); }
        self.cycle.tick(frame.dt, self.cfg.pause);
        let pin = BlendOverride::from_flags(self.cfg.show_current_only, self.cfg.show_predicted_only);
        core.params.lerp = self.cycle.blend(pin);
    }

    fn late_update(&mut self, core: &mut RestrictorCore, frame: &FrameInput) {
        let prev_head = core.previous_head().unwrap_or(frame.head);
        self.update_aux_cameras(&prev_head, &frame.head);
        self.sway.update(prev_head.pos, frame.head.pos, frame.dt, core.session.frame);
        self.rendering_left = true;
    }

    fn first_xr_enabled(&mut self, _core: &mut RestrictorCore, backend: &mut B, camera: &CameraIntrinsics) -> Result<(), SetupError> {
        let desc = backend.eye_target_desc();
        for rig in [&mut self.current, &mut self.predicted] {
            let slot = rig.slot;
            let targets = Eye::BOTH.map(|eye| backend.create_target(&desc, &format!("aux-{slot}-{eye}")));
            rig.configure(camera, targets);
        }
        if camera.stereo_separation <= 0.0 {
            warn!(ipd = camera.stereo_separation, "no stereo separation reported; aux eyes coincide");
        }
        self.half_ipd = camera.stereo_separation.max(0.0) * 0.5;
        info!(width = desc.width, height = desc.height, "aux rig targets allocated");
        Ok(())
    }

    fn before_composite(&mut self, core: &mut RestrictorCore) {
        self.eye = if self.rendering_left { Eye::Left } else { Eye::Right };
        core.params.eye_index = self.eye.index() as u32;
        self.rendering_left = !self.rendering_left;
    }

    fn bind_inputs<'a>(&'a self, bindings: &mut KernelBindings<'a, B::Target>) {
        bindings.current = self.current.target(self.eye);
        bindings.predicted = self.predicted.target(self.eye);
    }

    fn offscreen_views(&self) -> Vec<OffscreenView<'_, B::Target>> {
        self.current.views().chain(self.predicted.views()).collect()
    }

    fn teardown(&mut self, backend: &mut B) {
        for t in self.current.take_targets().chain(self.predicted.take_targets()) {
            backend.release(t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peritele_core::{LocomotionConfig, SessionConfig, pose};
    use peritele_restrictor::{BackendEvent, RecordingBackend, RestrictorController, TargetId, off_axis_lh};

    type Ctl = RestrictorController<RecordingBackend, PredictiveRestrictor<TargetId>>;

    fn ctl_with(f: impl FnOnce(&mut SessionConfig)) -> Ctl {
        let mut cfg = SessionConfig::default();
        f(&mut cfg);
        let pt = PredictiveRestrictor::new(&cfg.prediction, &cfg.locomotion).unwrap();
        RestrictorController::new(&cfg, pt).unwrap()
    }

    fn camera() -> CameraIntrinsics {
        let l = off_axis_lh(-0.06, 0.05, -0.05, 0.05, 0.05, 100.0);
        let r = off_axis_lh(-0.05, 0.06, -0.05, 0.05, 0.05, 100.0);
        CameraIntrinsics {
            eye_projection: [l, r], fov_y: 1.6, aspect: 0.9, near: 0.05, far: 100.0,
            stereo_separation: 0.064, pixel_width: 64, pixel_height: 64,
        }
    }

    fn frame(dt: f32, rig: Pose) -> FrameInput {
        FrameInput { dt, rig, head: pose(Vec3::new(0.0, 1.6, 0.0), Quat::IDENTITY), xr_active: true }
    }

    #[test] fn rejects_negative_speed() {
        let loco = LocomotionConfig { move_speed: -1.0, turn_speed: 90.0 };
        assert!(PredictiveRestrictor::<TargetId>::new(&PredictionConfig::default(), &loco).is_err());
    }

    #[test] fn start_pushes_dither_flags() {
        let ctl = ctl_with(|_| {});
        assert!(ctl.params().dither_space());
        assert!(!ctl.params().dither_time());
        assert!(!ctl.params().force_black());
    }

    #[test] fn forced_black_disables_spatial_dither() {
        let ctl = ctl_with(|c| c.restrictor.force_black_periphery = true);
        assert!(ctl.params().force_black());
        assert!(!ctl.params().dither_space());
        assert!(!ctl.technique().cfg.dither_space);
    }

    #[test] fn dither_toggles_push_immediately() {
        let mut ctl = ctl_with(|_| {});
        let (core, pt) = ctl.split_mut();
        pt.set_dither_space(core, false);
        pt.set_dither_time(core, true);
        assert!(!ctl.params().dither_space());
        assert!(ctl.params().dither_time());
    }

    /// 2 m/s straight ahead for 3 s at 10 Hz, after one stationary frame.
    #[test] fn three_cycles_in_three_seconds() {
        let mut ctl = ctl_with(|_| {});
        let dt = 0.1;
        let fwd = Vec3::Z;
        ctl.late_update(&frame(dt, Pose::default()));
        let mut predicted_before: Option<Vec3> = None;
        let mut triggers = Vec::new();
        for i in 1..=30 {
            let rig = pose(fwd * (0.2 * i as f32), Quat::IDENTITY);
            let before = ctl.technique().cycle().cycles;
            ctl.late_update(&frame(dt, rig));
            let pt = ctl.technique();
            if pt.cycle().cycles != before {
                triggers.push(i);
                let p = pt.rig(RigSlot::Predicted).pose;
                assert!((p.pos - rig.pos).abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-4));
                assert_eq!(p.rot, rig.rot);
                if let Some(prev) = predicted_before {
                    assert_eq!(pt.rig(RigSlot::Current).pose.pos, prev);
                } else {
                    assert_eq!(pt.rig(RigSlot::Current).pose, rig);
                }
                predicted_before = Some(p.pos);
            }
        }
        assert_eq!(triggers.len(), 3, "triggers at frames {triggers:?}");
        assert_eq!(triggers[0], 1);
        assert!((10..=12).contains(&(triggers[1] - triggers[0])));
        assert!((10..=12).contains(&(triggers[2] - triggers[1])));
    }

    #[test] fn blend_follows_timer_and_pins() {
        let mut ctl = ctl_with(|c| c.prediction.teleport_interval = 1.0);
        ctl.late_update(&frame(0.25, Pose::default()));
        ctl.late_update(&frame(0.25, pose(Vec3::Z, Quat::IDENTITY)));
        assert!((ctl.params().lerp - 0.25).abs() < 1e-6);
        ctl.late_update(&frame(0.25, pose(Vec3::Z * 2.0, Quat::IDENTITY)));
        assert!((ctl.params().lerp - 0.5).abs() < 1e-6);

        ctl.technique_mut().cfg.show_predicted_only = true;
        ctl.late_update(&frame(0.25, pose(Vec3::Z * 3.0, Quat::IDENTITY)));
        assert_eq!(ctl.params().lerp, 1.0);
        ctl.technique_mut().cfg.show_current_only = true;
        ctl.late_update(&frame(0.25, pose(Vec3::Z * 4.0, Quat::IDENTITY)));
        assert_eq!(ctl.params().lerp, 0.0);
    }

    #[test] fn pause_holds_timer() {
        let mut ctl = ctl_with(|c| c.prediction.pause = true);
        ctl.late_update(&frame(0.1, Pose::default()));
        for i in 1..5 {
            ctl.late_update(&frame(0.1, pose(Vec3::Z * i as f32, Quat::IDENTITY)));
        }
        assert_eq!(ctl.technique().cycle().timer, 0.0);
        assert_eq!(ctl.params().lerp, 0.0);
    }

    #[test] fn turning_in_place_rotates_predicted_about_head() {
        let mut ctl = ctl_with(|_| {});
        ctl.late_update(&frame(0.1, Pose::default()));
        let rig = pose(Vec3::ZERO, Quat::from_rotation_y(5f32.to_radians()));
        ctl.late_update(&frame(0.1, rig));
        let pt = ctl.technique();
        assert_eq!(pt.last_forecast(), Forecast { offset: Vec3::ZERO, yaw_deg: 90.0 });
        let p = pt.rig(RigSlot::Predicted).pose;
        // head sits on the vertical axis through the rig, so only the heading changes
        assert!(p.pos.abs_diff_eq(Vec3::ZERO, 1e-5));
        let yaw = Quat::from_rotation_y(95f32.to_radians());
        assert!(p.rot.abs_diff_eq(yaw, 1e-5));
    }

    #[test] fn restart_after_stop_snaps_current_to_live() {
        let mut ctl = ctl_with(|_| {});
        ctl.late_update(&frame(0.1, Pose::default()));
        for i in 1..4 { ctl.late_update(&frame(0.1, pose(Vec3::Z * i as f32, Quat::IDENTITY))); }
        let still = pose(Vec3::Z * 3.0, Quat::IDENTITY);
        ctl.late_update(&frame(0.1, still));
        let live = pose(Vec3::new(0.0, 0.0, 3.5), Quat::IDENTITY);
        ctl.late_update(&frame(0.1, live));
        assert_eq!(ctl.technique().rig(RigSlot::Current).pose, live);
    }

    #[test] fn eye_binding_toggles_per_composite() {
        let mut ctl = ctl_with(|_| {});
        let mut be = RecordingBackend::new(64, 64);
        let (src, dst) = (be.target("src"), be.target("dst"));
        ctl.late_update(&frame(0.011, Pose::default()));
        ctl.pre_render(&mut be, &camera(), true).unwrap();
        be.events.clear();
        ctl.resolve_eye(&mut be, &src, &dst, true);
        ctl.resolve_eye(&mut be, &src, &dst, true);

        let pt = ctl.technique();
        let expect = [Eye::Left, Eye::Right].map(|e| {
            (pt.rig(RigSlot::Current).target(e).copied(), pt.rig(RigSlot::Predicted).target(e).copied(), e.index() as u32)
        });
        let got: Vec<_> = be.events.iter().filter_map(|ev| match ev {
            BackendEvent::Dispatched { params, current, predicted, .. } => Some((*current, *predicted, params.eye_index)),
            _ => None,
        }).collect();
        assert_eq!(got, expect.to_vec());
        assert!(got.iter().all(|(c, p, _)| c.is_some() && p.is_some() && c != p));

        // the next frame starts on the left again
        ctl.late_update(&frame(0.011, Pose::default()));
        be.events.clear();
        ctl.resolve_eye(&mut be, &src, &dst, true);
        assert_eq!(be.dispatches().next().map(|p| p.eye_index), Some(0));
    }

    #[test] fn setup_allocates_four_targets_and_views() {
        let mut ctl = ctl_with(|_| {});
        let mut be = RecordingBackend::new(64, 64);
        ctl.pre_render(&mut be, &camera(), true).unwrap();
        let created = be.events.iter().filter(|e| matches!(e, BackendEvent::Created { .. })).count();
        assert_eq!(created, 4);

        ctl.late_update(&frame(0.011, Pose::default()));
        let views = ctl.offscreen_views();
        assert_eq!(views.len(), 4);
        let right = views.iter().find(|v| v.slot == RigSlot::Current && v.eye == Eye::Right).unwrap();
        assert_eq!(right.projection, camera().projection(Eye::Right));
        assert!((right.pose.pos - Vec3::new(0.032, 1.6, 0.0)).length() < 1e-5);
        assert!(views.iter().all(|v| v.depth == if v.slot == RigSlot::Predicted { 0 } else { 1 }));
        drop(views);

        ctl.teardown(&mut be);
        let released = be.events.iter().filter(|e| matches!(e, BackendEvent::Released(_))).count();
        assert_eq!(released, 4);
        assert!(ctl.offscreen_views().is_empty());
    }

    #[test] fn sway_bias_amplifies_head_motion() {
        let mut ctl = ctl_with(|c| c.prediction.peri_scale = 3.0);
        let mut f = frame(0.011, Pose::default());
        ctl.late_update(&f);
        f.head.pos += Vec3::new(0.01, 0.0, 0.0);
        ctl.late_update(&f);
        let pt = ctl.technique();
        for slot in RigSlot::BOTH {
            assert!(pt.rig(slot).sway_bias.abs_diff_eq(Vec3::new(0.02, 0.0, 0.0), 1e-6));
        }
        assert!(pt.sway().stops >= 1);
    }
}
