use glam::Vec3;
use peritele_core::{Pose, RestrictorConfig, Scalar, sign_or_one};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MotionClass { Stationary, TranslatingOnly, RotatingInPlaceOnly, TranslatingAndRotating }

impl MotionClass {
    pub fn from_dirs(trans_dir: Scalar, rot_dir: Scalar) -> Self {
        match (trans_dir != 0.0, rot_dir != 0.0) {
            (false, false) => MotionClass::Stationary,
            (true, false) => MotionClass::TranslatingOnly,
            (false, true) => MotionClass::RotatingInPlaceOnly,
            (true, true) => MotionClass::TranslatingAndRotating,
        }
    }
}

/// Noise floors per frame, derived from per-second thresholds and the refresh rate.
#[derive(Copy, Clone, Debug)]
pub struct MotionThresholds {
    /// metres per frame
    pub min_trans_per_frame: Scalar,
    /// forward-vector chord per frame (~radians for small angles)
    pub min_rot_per_frame: Scalar,
}

impl MotionThresholds {
    pub fn new(cfg: &RestrictorConfig, refresh_hz: Scalar) -> Self {
        Self {
            min_trans_per_frame: cfg.min_trans_threshold / refresh_hz,
            min_rot_per_frame: cfg.min_rot_threshold.to_radians() / refresh_hz,
        }
    }
}

/// One frame's motion, recomputed from fresh deltas every frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MotionSample {
    pub class: MotionClass,
    /// +1 forward, -1 backward, 0 none (against the camera's ground forward)
    pub trans_dir: Scalar,
    /// +1 right, -1 left, 0 none
    pub rot_dir: Scalar,
}

impl MotionSample {
    pub const STILL: MotionSample = MotionSample { class: MotionClass::Stationary, trans_dir: 0.0, rot_dir: 0.0 };

    pub fn measure(prev: &Pose, prev_fwd: Vec3, curr: &Pose, ground_fwd: Vec3, th: &MotionThresholds) -> Self {
        let trans_dir = translate_direction(prev.pos, curr.pos, ground_fwd, th.min_trans_per_frame);
        let rot_dir = rotate_direction(prev, prev_fwd, curr, th.min_rot_per_frame);
        Self { class: MotionClass::from_dirs(trans_dir, rot_dir), trans_dir, rot_dir }
    }
}

/// Exact comparison; any bit of drift counts as motion.
#[inline]
pub fn is_stationary(prev: &Pose, curr: &Pose) -> bool {
    prev.pos == curr.pos && prev.rot == curr.rot
}

/// Sign of cross(prev_fwd, curr_fwd).y when the forward vector moved more than `min_rot`.
pub fn rotate_direction(prev: &Pose, prev_fwd: Vec3, curr: &Pose, min_rot: Scalar) -> Scalar {
    if curr.rot == prev.rot { return 0.0; }
    let fwd = curr.forward();
    if (fwd - prev_fwd).length() > min_rot {
        sign_or_one(prev_fwd.cross(fwd).y)
    } else {
        0.0
    }
}

/// Sign of the displacement along `ground_fwd` when it exceeds `min_trans`.
pub fn translate_direction(prev: Vec3, curr: Vec3, ground_fwd: Vec3, min_trans: Scalar) -> Scalar {
    if curr == prev { return 0.0; }
    let delta = curr - prev;
    if delta.length() > min_trans {
        sign_or_one(delta.normalize().dot(ground_fwd))
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use peritele_core::pose;
    use proptest::prelude::*;

    fn yawed(deg: f32) -> Pose { pose(Vec3::ZERO, Quat::from_rotation_y(deg.to_radians())) }

    #[test] fn thresholds_scale_with_refresh() {
        let cfg = RestrictorConfig::default();
        let t = MotionThresholds::new(&cfg, 90.0);
        assert!((t.min_trans_per_frame - 1.0 / 90.0).abs() < 1e-9);
        assert!((t.min_rot_per_frame - std::f32::consts::PI / (180.0 * 90.0)).abs() < 1e-9);
    }
    #[test] fn stationary_is_exact() {
        let a = pose(Vec3::new(1.0, 0.0, 2.0), Quat::IDENTITY);
        let mut b = a;
        assert!(is_stationary(&a, &b));
        b.pos.x += 1e-6;
        assert!(!is_stationary(&a, &b));
    }
    #[test] fn turning_right_and_left() {
        let prev = yawed(0.0);
        let fwd = prev.forward();
        assert_eq!(rotate_direction(&prev, fwd, &yawed(5.0), 1e-3), 1.0);
        assert_eq!(rotate_direction(&prev, fwd, &yawed(-5.0), 1e-3), -1.0);
        assert_eq!(rotate_direction(&prev, fwd, &prev, 1e-3), 0.0);
        // below the floor
        assert_eq!(rotate_direction(&prev, fwd, &yawed(0.01), 1e-3), 0.0);
    }
    #[test] fn backward_translation_is_negative() {
        let d = translate_direction(Vec3::ZERO, Vec3::new(0.0, 0.0, -0.1), Vec3::Z, 0.01);
        assert_eq!(d, -1.0);
        assert_eq!(translate_direction(Vec3::ZERO, Vec3::new(0.0, 0.0, 0.001), Vec3::Z, 0.01), 0.0);
    }
    #[test] fn classes() {
        assert_eq!(MotionClass::from_dirs(0.0, 0.0), MotionClass::Stationary);
        assert_eq!(MotionClass::from_dirs(1.0, 0.0), MotionClass::TranslatingOnly);
        assert_eq!(MotionClass::from_dirs(0.0, -1.0), MotionClass::RotatingInPlaceOnly);
        assert_eq!(MotionClass::from_dirs(-1.0, 1.0), MotionClass::TranslatingAndRotating);
    }

    proptest! {
        #[test]
        fn rotation_sign_matches_cross(a in -180.0f32..180.0, d in -30.0f32..30.0) {
            let min_rot = 1.0f32.to_radians() / 90.0;
            let prev = yawed(a);
            let curr = yawed(a + d);
            let prev_fwd = prev.forward();
            let dir = rotate_direction(&prev, prev_fwd, &curr, min_rot);
            if (curr.forward() - prev_fwd).length() > min_rot && curr.rot != prev.rot {
                prop_assert_eq!(dir, sign_or_one(prev_fwd.cross(curr.forward()).y));
            } else {
                prop_assert_eq!(dir, 0.0);
            }
        }
    }
}
