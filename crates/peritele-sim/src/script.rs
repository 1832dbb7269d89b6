use clap::ValueEnum;
use glam::{Quat, Vec3};
use peritele_core::{FrameInput, LocomotionConfig, LocomotionSource, Pose, Scalar, ground_dir, pose};
use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Stand still the whole session.
    Still,
    /// Continuous forward move.
    Walk,
    /// Continuous right turn in place.
    Turn,
    /// Move and turn together.
    WalkTurn,
    /// One second walking, one second standing, repeated.
    StopGo,
}

/// Head height above the rig origin, metres.
const HEAD_HEIGHT: Scalar = 1.6;

/// Scripted continuous move/turn provider with synthetic postural sway.
pub struct ScriptedLocomotion {
    pub scenario: Scenario,
    pub speeds: LocomotionConfig,
    /// Sway amplitude, metres.
    pub sway: Scalar,
    rig: Pose,
    t: Scalar,
}

impl LocomotionSource for ScriptedLocomotion {
    fn move_speed(&self) -> Scalar { self.speeds.move_speed }
    fn turn_speed(&self) -> Scalar { self.speeds.turn_speed }
}

impl ScriptedLocomotion {
    pub fn new(scenario: Scenario, speeds: LocomotionConfig, sway: Scalar) -> Self {
        Self { scenario, speeds, sway, rig: Pose::default(), t: 0.0 }
    }

    #[inline] pub fn rig(&self) -> Pose { self.rig }

    fn drive(&self) -> (bool, bool) {
        match self.scenario {
            Scenario::Still => (false, false),
            Scenario::Walk => (true, false),
            Scenario::Turn => (false, true),
            Scenario::WalkTurn => (true, true),
            Scenario::StopGo => ((self.t as u32) % 2 == 0, false),
        }
    }

    fn head(&self) -> Pose {
        let s = self.sway;
        let off = Vec3::new(
            s * (std::f32::consts::TAU * 0.3 * self.t).sin(),
            0.0,
            s * (std::f32::consts::TAU * 0.2 * self.t).sin(),
        );
        pose(Vec3::new(0.0, HEAD_HEIGHT, 0.0) + off, Quat::IDENTITY)
    }

    /// Advance by `dt` and return the frame the engine would report.
    pub fn step(&mut self, dt: Scalar, xr_active: bool) -> FrameInput {
        let (moving, turning) = self.drive();
        if turning {
            let yaw = Quat::from_rotation_y((self.speeds.turn_speed * dt).to_radians());
            self.rig.rot = (yaw * self.rig.rot).normalize();
        }
        if moving {
            self.rig.pos += ground_dir(self.rig.forward()) * self.speeds.move_speed * dt;
        }
        self.t += dt;
        FrameInput { dt, rig: self.rig, head: self.head(), xr_active }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(s: Scenario) -> ScriptedLocomotion { ScriptedLocomotion::new(s, LocomotionConfig::default(), 0.0) }

    #[test] fn still_rig_is_bitwise_constant() {
        let mut s = script(Scenario::Still);
        let a = s.step(0.011, true);
        let b = s.step(0.011, true);
        assert_eq!(a.rig, b.rig);
    }

    #[test] fn walk_covers_speed_times_time() {
        let mut s = script(Scenario::Walk);
        for _ in 0..10 { s.step(0.1, true); }
        assert!((s.rig().pos - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-4);
    }

    #[test] fn turn_yaws_right() {
        let mut s = script(Scenario::Turn);
        for _ in 0..10 { s.step(0.1, true); }
        assert!(s.rig().forward().abs_diff_eq(Vec3::X, 1e-4));
        assert_eq!(s.rig().pos, Vec3::ZERO);
    }

    #[test] fn stop_go_alternates() {
        let mut s = script(Scenario::StopGo);
        for _ in 0..10 { s.step(0.1, true); }
        let after_walk = s.rig().pos;
        for _ in 0..9 { s.step(0.1, true); }
        assert!((s.rig().pos - after_walk).length() < 0.25, "second second is mostly still");
    }

    #[test] fn sway_moves_head_only() {
        let mut s = ScriptedLocomotion::new(Scenario::Still, LocomotionConfig::default(), 0.01);
        let a = s.step(0.25, true);
        let b = s.step(0.25, true);
        assert_eq!(a.rig, b.rig);
        assert_ne!(a.head.pos, b.head.pos);
        assert!((b.head.pos.y - HEAD_HEIGHT).abs() < 1e-6);
    }
}
