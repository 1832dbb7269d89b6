use glam::Vec3;
use peritele_core::{Scalar, sign_or_one};
use tracing::debug;

/// One axis of head velocity is at a stop: either sample is below `threshold`
/// or the direction flipped between samples.
#[inline]
pub fn axis_stationary(prev: Scalar, curr: Scalar, threshold: Scalar) -> bool {
    prev.abs() < threshold || curr.abs() < threshold || sign_or_one(prev) != sign_or_one(curr)
}

/// Postural sway stop detection on the head's local velocity. Diagnostic only.
#[derive(Copy, Clone, Debug)]
pub struct SwayDetector {
    /// m/s
    pub threshold: Scalar,
    prev_velocity: Vec3,
    pub stops: u64,
}

impl SwayDetector {
    pub fn new(threshold: Scalar) -> Self { Self { threshold, prev_velocity: Vec3::ZERO, stops: 0 } }

    #[inline] pub fn prev_velocity(&self) -> Vec3 { self.prev_velocity }

    /// Feed one frame of head-local positions. Returns true on a sway stop.
    pub fn update(&mut self, prev_pos: Vec3, curr_pos: Vec3, dt: Scalar, frame: u64) -> bool {
        if dt <= 0.0 { return false; }
        let v = (curr_pos - prev_pos) / dt;
        let p = self.prev_velocity;
        let th = self.threshold;
        let stop = axis_stationary(p.x, v.x, th) && axis_stationary(p.y, v.y, th) && axis_stationary(p.z, v.z, th);
        if stop {
            self.stops += 1;
            debug!(frame, "postural sway stop");
        }
        self.prev_velocity = v;
        stop
    }
}
