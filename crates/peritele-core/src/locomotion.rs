use crate::Scalar;

/// Continuous move/turn provider speeds, sampled once at startup.
pub trait LocomotionSource {
    /// Translation speed, m/s.
    fn move_speed(&self) -> Scalar;
    /// Yaw speed, degrees/s.
    fn turn_speed(&self) -> Scalar;
}

impl LocomotionSource for crate::LocomotionConfig {
    fn move_speed(&self) -> Scalar { self.move_speed }
    fn turn_speed(&self) -> Scalar { self.turn_speed }
}
