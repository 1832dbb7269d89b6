use glam::Vec3;
use peritele_core::{LocomotionSource, Scalar};
use peritele_restrictor::MotionClass;

/// Rig-local displacement per motion class, fixed at session start.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PredictionVectors {
    pub still: Vec3,
    pub turn_in_place: Vec3,
    /// +Z by `move_speed * interval`.
    pub forward: Vec3,
    /// Arc chord for simultaneous move + turn: y = lateral offset, z = forward.
    pub arc: Vec3,
    /// degrees/s
    pub turn_speed: Scalar,
    pub interval: Scalar,
}

/// Displacement and yaw selected for one cycle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Forecast {
    /// World-space offset from the live rig.
    pub offset: Vec3,
    /// Degrees about +Y, positive turns right.
    pub yaw_deg: Scalar,
}

impl Forecast {
    pub const NONE: Forecast = Forecast { offset: Vec3::ZERO, yaw_deg: 0.0 };
}

impl PredictionVectors {
    pub fn new(loco: &impl LocomotionSource, interval: Scalar) -> Self {
        let (speed, turn) = (loco.move_speed(), loco.turn_speed());
        let w = turn.to_radians();
        let arc = if w != 0.0 {
            let r = speed / w;
            Vec3::new(0.0, (1.0 - (w * interval).cos()) * r, (w * interval).sin() * r)
        } else {
            Vec3::new(0.0, 0.0, speed * interval)
        };
        Self {
            still: Vec3::ZERO,
            turn_in_place: Vec3::ZERO,
            forward: Vec3::new(0.0, 0.0, speed * interval),
            arc,
            turn_speed: turn,
            interval,
        }
    }

    #[inline] fn cycle_yaw(&self, rot_dir: Scalar) -> Scalar { rot_dir * self.turn_speed * self.interval }

    /// Pick the displacement for this cycle. `xz_fwd` is the camera forward on the ground plane.
    ///
    /// Moving while turning forecasts the turn only; the arc is not used.
    pub fn select(&self, trans_dir: Scalar, rot_dir: Scalar, xz_fwd: Vec3) -> Forecast {
        match MotionClass::from_dirs(trans_dir, rot_dir) {
            MotionClass::Stationary => Forecast { offset: self.still, yaw_deg: 0.0 },
            MotionClass::RotatingInPlaceOnly => Forecast { offset: self.turn_in_place, yaw_deg: self.cycle_yaw(rot_dir) },
            MotionClass::TranslatingOnly => Forecast { offset: self.forward.z * trans_dir * xz_fwd, yaw_deg: 0.0 },
            MotionClass::TranslatingAndRotating => Forecast { offset: self.still, yaw_deg: self.cycle_yaw(rot_dir) },
        }
    }
}
