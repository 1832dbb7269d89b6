//! Restrictor state machine and compositing hook.
use std::marker::PhantomData;

use glam::Vec3;
use peritele_core::{
    FrameInput, GraphicsApi, Pose, RestrictorConfig, Scalar, Session, SessionConfig, SetupError, ground_dir,
    sign_or_one,
};
use tracing::{debug, info, warn};

use crate::{
    CameraIntrinsics, DispatchGrid, EyeProjections, KernelBindings, KernelParams, MotionSample, MotionThresholds,
    MovingUpdate, OffscreenView, RenderBackend, Technique, is_stationary,
};

/// Overshoot used to terminate an ease; the value parks just past its bound.
pub const EASE_GUARD: Scalar = 1.0e-4;
/// `fov_lerp` after a discontinuous rig jump; parks past fully open.
const RESET_OPEN_GUARD: Scalar = 1.0e-3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RestrictorState {
    /// Restrictor radius in tan(theta/2), eased between the active size and `fov_max`.
    pub fov_lerp: Scalar,
    /// Horizontal shift toward the turn, within +-`fov_restrictor_shift`.
    pub fov_shift_lerp: Scalar,
    pub is_moving: bool,
    pub is_turning: bool,
    /// This frame's motion; never carried over.
    pub motion: MotionSample,
}

#[derive(Copy, Clone, Debug)]
struct Previous { rig: Pose, head: Pose, fwd: Vec3 }

impl Previous {
    fn of(frame: &FrameInput) -> Self { Self { rig: frame.rig, head: frame.head, fwd: frame.rig.forward() } }
}

#[inline]
fn lerp(a: Scalar, b: Scalar, t: Scalar) -> Scalar {
    let t = t.clamp(0.0, 1.0);
    a * (1.0 - t) + b * t
}

/// Where `v` sits between `a` and `b`, in `[0, 1]`.
#[inline]
fn inverse_lerp(a: Scalar, b: Scalar, v: Scalar) -> Scalar {
    if a == b { return 1.0; }
    ((v - a) / (b - a)).clamp(0.0, 1.0)
}

/// Shared controller state; techniques read and update it through their hooks.
pub struct RestrictorCore {
    pub cfg: RestrictorConfig,
    pub params: KernelParams,
    pub session: Session,
    pub thresholds: MotionThresholds,
    pub grid: DispatchGrid,
    state: RestrictorState,
    prev: Option<Previous>,
    projections: Option<EyeProjections>,
    api: GraphicsApi,
    fov_size: Scalar,
    fov_outer: Scalar,
    fov_timer: Scalar,
    warned_unready: bool,
}

impl RestrictorCore {
    pub fn new(cfg: &SessionConfig) -> Self {
        let r = cfg.restrictor.clone();
        let session = Session::new(cfg.display.refresh_rate);
        let params = KernelParams {
            radius: r.fov_max,
            transition: r.fov_outer_size - r.fov_restrictor_size,
            x_scale: r.fov_restrictor_x_scale - 1.0,
            sqlr_pow: r.trans_sqlr_pow,
            reverse_y: r.reverse_y as u32,
            force_black: 0,
            ..KernelParams::default()
        };
        Self {
            thresholds: MotionThresholds::new(&r, session.refresh_hz()),
            state: RestrictorState {
                // parked open so the first stationary frame holds instead of easing from the inner size
                fov_lerp: r.fov_max + EASE_GUARD,
                fov_shift_lerp: 0.0,
                is_moving: false,
                is_turning: false,
                motion: MotionSample::STILL,
            },
            fov_size: r.fov_restrictor_size,
            fov_outer: r.fov_outer_size,
            fov_timer: 0.0,
            warned_unready: false,
            grid: DispatchGrid::default(),
            prev: None,
            projections: None,
            api: cfg.display.graphics_api,
            session,
            params,
            cfg: r,
        }
    }

    #[inline] pub fn state(&self) -> &RestrictorState { &self.state }
    #[inline] pub fn projections(&self) -> Option<&EyeProjections> { self.projections.as_ref() }
    #[inline] pub fn previous_rig(&self) -> Option<Pose> { self.prev.map(|p| p.rig) }
    #[inline] pub fn previous_head(&self) -> Option<Pose> { self.prev.map(|p| p.head) }
    /// Active (inner, outer) restrictor sizes.
    #[inline] pub fn active_sizes(&self) -> (Scalar, Scalar) { (self.fov_size, self.fov_outer) }
    /// An eye was passed through because XR came up before stereo setup.
    #[inline] pub fn warned_unready(&self) -> bool { self.warned_unready }

    pub fn set_black_periphery(&mut self, on: bool) {
        self.cfg.force_black_periphery = on;
        self.params.force_black = on as u32;
    }

    fn set_trans_params(&mut self) {
        self.fov_size = self.cfg.trans_fov_restrictor_size;
        self.fov_outer = self.cfg.trans_fov_outer_size;
        self.params.transition = self.fov_outer - self.fov_size;
        self.params.sqlr_pow = self.cfg.trans_sqlr_pow;
        self.state.is_turning = false;
    }

    fn set_turn_params(&mut self) {
        self.fov_size = self.cfg.turn_fov_restrictor_size;
        self.fov_outer = self.cfg.turn_fov_outer_size;
        self.params.transition = self.fov_outer - self.fov_size;
        self.params.sqlr_pow = self.cfg.turn_sqlr_pow;
        self.state.is_turning = true;
    }

    fn push_radius(&mut self) {
        let whole_screen = if self.cfg.force_whole_screen { 0.0 } else { 1.0 };
        self.params.radius = self.state.fov_lerp.min(self.cfg.fov_max) * whole_screen;
    }

    /// Restart the ease timer at `fov_lerp`'s position on the `from..to` ramp, so
    /// a reversal mid-ease continues from the current radius.
    fn reseed_timer(&mut self, from: Scalar, to: Scalar) {
        self.fov_timer = inverse_lerp(from, to, self.state.fov_lerp) * self.cfg.transition_interval;
    }

    fn ease_open(&mut self, dt: Scalar) {
        let hi = self.cfg.fov_max;
        if self.state.fov_lerp <= hi {
            let next = lerp(self.fov_size, hi, self.fov_timer / self.cfg.transition_interval);
            self.state.fov_lerp = next.max(self.state.fov_lerp);
            if self.state.fov_lerp >= hi {
                self.state.fov_lerp = hi + EASE_GUARD;
                self.fov_timer = 0.0;
            }
            self.fov_timer += dt;
        } else {
            self.fov_timer = 0.0;
        }
    }

    fn ease_restricted(&mut self, dt: Scalar) {
        let lo = self.fov_size;
        if self.state.fov_lerp >= lo {
            let next = lerp(self.cfg.fov_max, lo, self.fov_timer / self.cfg.transition_interval);
            self.state.fov_lerp = next.min(self.state.fov_lerp);
            if self.state.fov_lerp <= lo {
                self.state.fov_lerp = lo - EASE_GUARD;
                self.fov_timer = 0.0;
            }
            self.fov_timer += dt;
        } else {
            self.fov_timer = 0.0;
        }
    }

    fn update_shift(&mut self, rot_dir: Scalar, dt: Scalar) {
        let max = self.cfg.fov_restrictor_shift;
        let step = dt * max / self.cfg.shift_interval;
        let shift = &mut self.state.fov_shift_lerp;
        if rot_dir != 0.0 {
            if shift.abs() <= max {
                *shift += rot_dir * step;
                if shift.abs() >= max { *shift = max * rot_dir; }
            }
        } else if *shift != 0.0 {
            let before = *shift;
            *shift -= sign_or_one(*shift) * step;
            // crossing zero snaps instead of oscillating
            if before * *shift <= 0.0 { *shift = 0.0; }
        }
    }

    /// Classify, ease, push params. Returns the moving-hook payload when the moving branch ran.
    fn update_restrictor(&mut self, frame: &FrameInput) -> Option<MovingUpdate> {
        let prev = *self.prev.get_or_insert_with(|| Previous::of(frame));
        let still = is_stationary(&prev.rig, &frame.rig);
        self.state.motion = if still {
            MotionSample::STILL
        } else {
            let ground_fwd = ground_dir(frame.camera().forward());
            MotionSample::measure(&prev.rig, prev.fwd, &frame.rig, ground_fwd, &self.thresholds)
        };

        if still && !self.cfg.force_turn_on {
            if self.state.is_moving { self.reseed_timer(self.fov_size, self.cfg.fov_max); }
            self.state.is_moving = false;
            self.ease_open(frame.dt);
            self.push_radius();
            self.params.shift = 0.0;
            self.state.fov_shift_lerp = 0.0;
            None
        } else if !self.cfg.force_turn_off {
            if !self.state.is_moving { self.reseed_timer(self.cfg.fov_max, self.fov_size); }
            self.ease_restricted(frame.dt);
            self.push_radius();

            let rot_dir = self.state.motion.rot_dir;
            self.update_shift(rot_dir, frame.dt);
            self.params.shift = self.state.fov_shift_lerp;
            if rot_dir != 0.0 { self.set_turn_params(); } else { self.set_trans_params(); }

            let started = !self.state.is_moving;
            self.state.is_moving = true;
            if started {
                self.params.x_scale = self.cfg.fov_restrictor_x_scale - 1.0;
                debug!(frame = self.session.frame, "motion started");
            }
            Some(MovingUpdate { started, motion: self.state.motion })
        } else {
            None
        }
    }

    fn record_previous(&mut self, frame: &FrameInput) {
        self.prev = Some(Previous::of(frame));
    }
}

/// Base controller, specialised by one [`Technique`] at compile time.
pub struct RestrictorController<B: RenderBackend, T: Technique<B>> {
    core: RestrictorCore,
    technique: T,
    _backend: PhantomData<fn(&mut B)>,
}

impl<B: RenderBackend, T: Technique<B>> RestrictorController<B, T> {
    pub fn new(cfg: &SessionConfig, mut technique: T) -> Result<Self, SetupError> {
        cfg.validate()?;
        let mut core = RestrictorCore::new(cfg);
        technique.start(&mut core);
        info!(
            refresh_hz = core.session.refresh_hz(),
            fov_max = core.cfg.fov_max,
            api = ?core.api,
            "restrictor started"
        );
        Ok(Self { core, technique, _backend: PhantomData })
    }

    #[inline] pub fn core(&self) -> &RestrictorCore { &self.core }
    #[inline] pub fn core_mut(&mut self) -> &mut RestrictorCore { &mut self.core }
    #[inline] pub fn state(&self) -> &RestrictorState { self.core.state() }
    #[inline] pub fn params(&self) -> &KernelParams { &self.core.params }
    #[inline] pub fn technique(&self) -> &T { &self.technique }
    #[inline] pub fn technique_mut(&mut self) -> &mut T { &mut self.technique }
    /// Both halves at once, for technique toggles that push straight to the kernel.
    #[inline] pub fn split_mut(&mut self) -> (&mut RestrictorCore, &mut T) { (&mut self.core, &mut self.technique) }

    /// Late-frame update. The previous pose is recorded last.
    pub fn late_update(&mut self, frame: &FrameInput) {
        self.core.session.advance(frame.dt);
        self.core.params.frame = self.core.session.frame as u32;
        if let Some(update) = self.core.update_restrictor(frame) {
            self.technique.on_moving(&mut self.core, frame, update);
        }
        self.technique.late_update(&mut self.core, frame);
        self.core.record_previous(frame);
    }

    /// One-shot stereo setup on the first XR frame, otherwise the after-first-frame hook.
    pub fn pre_render(&mut self, backend: &mut B, camera: &CameraIntrinsics, xr_active: bool) -> Result<(), SetupError> {
        if xr_active && self.core.projections.is_none() {
            let desc = backend.eye_target_desc();
            if desc.width == 0 || desc.height == 0 {
                return Err(SetupError::EmptyEyeTarget { width: desc.width, height: desc.height });
            }
            if camera.pixel_width == 0 || camera.pixel_height == 0 {
                return Err(SetupError::EmptyEyeTarget { width: camera.pixel_width, height: camera.pixel_height });
            }
            let proj = EyeProjections::capture(camera, self.core.api);
            self.core.params.set_eye_projection(proj.reconstruct);
            self.core.grid = DispatchGrid::for_target(camera.pixel_width, camera.pixel_height);
            self.technique.first_xr_enabled(&mut self.core, backend, camera)?;
            self.core.projections = Some(proj);
            info!(
                grid_x = self.core.grid.x,
                grid_y = self.core.grid.y,
                y_flip = self.core.api.needs_y_flip(),
                "xr compositing ready"
            );
        } else {
            self.technique.after_first_frame(&mut self.core);
        }
        Ok(())
    }

    /// Resolve one eye. Outside XR the source passes through untouched.
    pub fn resolve_eye(&mut self, backend: &mut B, source: &B::Target, destination: &B::Target, xr_active: bool) {
        if !xr_active || self.core.projections.is_none() {
            if xr_active && !self.core.warned_unready {
                self.core.warned_unready = true;
                warn!(frame = self.core.session.frame, "xr active before stereo setup; eye passed through unrestricted");
            }
            backend.blit(source, destination);
            return;
        }
        let desc = backend.eye_target_desc().linear().writable();
        let scratch = backend.acquire_scratch(&desc);

        self.technique.before_composite(&mut self.core);
        {
            let mut bindings = KernelBindings::new(&scratch, source);
            self.technique.bind_inputs(&mut bindings);
            backend.dispatch(&self.core.params, &bindings, self.core.grid);
        }
        backend.blit(&scratch, destination);
        backend.release(scratch);

        self.technique.after_composite(&mut self.core);
    }

    pub fn offscreen_views(&self) -> Vec<OffscreenView<'_, B::Target>> { self.technique.offscreen_views() }

    pub fn set_black_periphery(&mut self, on: bool) { self.core.set_black_periphery(on); }

    /// After a discontinuous jump (teleport to waypoint): take the current pose as
    /// previous and park the restrictor fully open.
    pub fn reset_previous_pose(&mut self, frame: &FrameInput) {
        self.core.record_previous(frame);
        self.core.state.fov_lerp = self.core.cfg.fov_max + RESET_OPEN_GUARD;
    }

    pub fn teardown(&mut self, backend: &mut B) { self.technique.teardown(backend); }
}
