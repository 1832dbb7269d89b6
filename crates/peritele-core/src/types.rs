use glam::{Mat4, Quat, Vec3};
use crate::Scalar;

#[inline] pub fn vec3(x: Scalar, y: Scalar, z: Scalar) -> Vec3 { Vec3::new(x, y, z) }
#[inline] pub fn pose(pos: Vec3, rot: Quat) -> Pose { Pose { pos, rot } }

/// Position + orientation snapshot.
///
/// Axis convention: +Y up, +Z forward, +X right. A positive rotation about +Y
/// turns forward toward right.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pose { pub pos: Vec3, pub rot: Quat }

impl Default for Pose {
    fn default() -> Self { Self { pos: Vec3::ZERO, rot: Quat::IDENTITY } }
}

impl Pose {
    #[inline] pub fn forward(&self) -> Vec3 { self.rot * Vec3::Z }
    #[inline] pub fn right(&self) -> Vec3 { self.rot * Vec3::X }
    #[inline] pub fn up(&self) -> Vec3 { self.rot * Vec3::Y }

    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 { self.pos + self.rot * local }

    /// World pose of a child given in this pose's local frame.
    #[inline]
    pub fn compose(&self, local: &Pose) -> Pose {
        Pose { pos: self.transform_point(local.pos), rot: self.rot * local.rot }
    }

    /// Rotate the pose about a world-space pivot and axis, in degrees.
    pub fn rotate_around(&mut self, pivot: Vec3, axis: Vec3, degrees: Scalar) {
        let q = Quat::from_axis_angle(axis, degrees.to_radians());
        self.pos = pivot + q * (self.pos - pivot);
        self.rot = (q * self.rot).normalize();
    }

    /// Camera-to-world matrix.
    #[inline]
    pub fn to_mat4(&self) -> Mat4 { Mat4::from_rotation_translation(self.rot, self.pos) }

    /// World-to-camera matrix.
    #[inline]
    pub fn view_matrix(&self) -> Mat4 { self.to_mat4().inverse() }
}

/// Remove the component of `v` along unit `normal`.
#[inline]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 { v - normal * v.dot(normal) }

/// Direction projected onto the ground (XZ) plane, unit length or zero.
#[inline]
pub fn ground_dir(v: Vec3) -> Vec3 { project_on_plane(v, Vec3::Y).normalize_or_zero() }

/// Sign where zero counts as positive.
#[inline]
pub fn sign_or_one(x: Scalar) -> Scalar { if x >= 0.0 { 1.0 } else { -1.0 } }

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn yaw_right_turns_forward_toward_right() {
        let p = pose(Vec3::ZERO, Quat::from_rotation_y(90f32.to_radians()));
        assert!((p.forward() - Vec3::X).length() < 1e-6);
    }
    #[test] fn rotate_around_keeps_pivot_distance() {
        let mut p = pose(vec3(1.0, 0.0, 0.0), Quat::IDENTITY);
        let pivot = vec3(0.0, 0.0, 0.0);
        p.rotate_around(pivot, Vec3::Y, 90.0);
        assert!((p.pos.length() - 1.0).abs() < 1e-6);
        assert!((p.pos - vec3(0.0, 0.0, -1.0)).length() < 1e-6);
        assert!((p.forward() - Vec3::X).length() < 1e-6);
    }
    #[test] fn ground_dir_drops_pitch() {
        let d = ground_dir(vec3(0.0, 1.0, 1.0));
        assert!((d - Vec3::Z).length() < 1e-6);
        assert_eq!(ground_dir(Vec3::Y), Vec3::ZERO);
    }
    #[test] fn sign_of_zero_is_positive() {
        assert_eq!(sign_or_one(0.0), 1.0);
        assert_eq!(sign_or_one(-0.5), -1.0);
    }
}
