//! Mathematical types shared by every registry module.
//!
//! These are the canonical representations stored in object records,
//! hierarchy nodes and snapshots. All of them are `Pod` so they can be
//! copied straight into a snapshot buffer.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Tolerance used by the `approx_eq` helpers.
pub const EPSILON: f32 = 1e-4;

/// 3D Vector - position, direction, offset
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Component-wise comparison within `epsilon`.
    #[must_use]
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Quaternion for rotations
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Rotation of `angle` radians around `axis`.
    ///
    /// The axis is normalized here; a zero axis yields the identity.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let len = axis.length();
        if len <= f32::EPSILON {
            return Self::IDENTITY;
        }
        let axis = axis * (1.0 / len);
        let (sin, cos) = (angle * 0.5).sin_cos();
        Self::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }

    /// Conjugate. Equal to the inverse for unit quaternions.
    #[must_use]
    pub const fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Length squared
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Returns the unit quaternion pointing the same way.
    ///
    /// Degenerate input collapses to the identity.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length_squared().sqrt();
        if len <= f32::EPSILON {
            return Self::IDENTITY;
        }
        let inv = 1.0 / len;
        Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
    }

    /// Rotates a vector by this (unit) quaternion.
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        // v' = v + 2w(q x v) + 2(q x (q x v))
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    /// Compares two rotations, treating `q` and `-q` as equal.
    #[must_use]
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        let dot = self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w;
        (dot.abs() - 1.0).abs() <= epsilon
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Self;
    /// Hamilton product: `self * rhs` applies `rhs` first.
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

/// Transform - position + rotation + uniform scale
///
/// Composition `a * b` applies `b` in `a`'s local space: scale first,
/// then rotate, then translate.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Transform {
    /// Position
    pub position: Vec3,
    /// Scale (uniform)
    pub scale: f32,
    /// Rotation
    pub rotation: Quaternion,
}

impl Transform {
    /// Creates a new transform
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quaternion, scale: f32) -> Self {
        Self { position, scale, rotation }
    }

    /// Identity transform
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Quaternion::IDENTITY, 1.0);

    /// Pure translation.
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self::new(position, Quaternion::IDENTITY, 1.0)
    }

    /// Inverse transform, such that `t.inverse() * t` is the identity.
    ///
    /// A zero scale has no inverse; it is treated as scale 1.
    #[must_use]
    pub fn inverse(self) -> Self {
        let inv_scale = if self.scale.abs() <= f32::EPSILON {
            1.0
        } else {
            1.0 / self.scale
        };
        let inv_rotation = self.rotation.conjugate();
        let inv_position = inv_rotation.rotate(-self.position) * inv_scale;
        Self::new(inv_position, inv_rotation, inv_scale)
    }

    /// Applies this transform to a point.
    #[must_use]
    pub fn transform_point(self, point: Vec3) -> Vec3 {
        self.position + self.rotation.rotate(point * self.scale)
    }

    /// Compares all three channels within `epsilon`.
    #[must_use]
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        self.position.approx_eq(other.position, epsilon)
            && self.rotation.approx_eq(other.rotation, epsilon)
            && (self.scale - other.scale).abs() <= epsilon
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Transform {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.transform_point(rhs.position),
            (self.rotation * rhs.rotation).normalize(),
            self.scale * rhs.scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum.x, 5.0);
        assert_eq!(sum.y, 7.0);
        assert_eq!(sum.z, 9.0);

        let dot = a.dot(b);
        assert_eq!(dot, 32.0); // 1*4 + 2*5 + 3*6

        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
    }

    #[test]
    fn test_vec3_bytemuck() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 12); // 3 * 4 bytes
    }

    #[test]
    fn test_quaternion_rotate() {
        let q = Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2);
        let rotated = q.rotate(Vec3::X);
        assert!(rotated.approx_eq(Vec3::Y, EPSILON));

        let back = q.conjugate().rotate(rotated);
        assert!(back.approx_eq(Vec3::X, EPSILON));
    }

    #[test]
    fn test_quaternion_product_order() {
        let yaw = Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2);
        let roll = Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2);

        // (yaw * roll) applies roll first.
        let v = (yaw * roll).rotate(Vec3::X);
        let expected = yaw.rotate(roll.rotate(Vec3::X));
        assert!(v.approx_eq(expected, EPSILON));
    }

    #[test]
    fn test_transform_compose() {
        let parent = Transform::new(
            Vec3::new(5.0, 0.0, 0.0),
            Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2),
            2.0,
        );
        let local = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));

        let world = parent * local;
        // +X rotated 90 degrees about Y points to -Z, scaled by 2.
        assert!(world.position.approx_eq(Vec3::new(5.0, 0.0, -2.0), EPSILON));
        assert!((world.scale - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_inverse_cancels() {
        let samples = [
            Transform::IDENTITY,
            Transform::from_position(Vec3::new(-3.0, 7.5, 0.25)),
            Transform::new(
                Vec3::new(1.0, 2.0, 3.0),
                Quaternion::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.7),
                0.5,
            ),
            Transform::new(
                Vec3::new(-10.0, 0.0, 4.0),
                Quaternion::from_axis_angle(Vec3::new(0.2, -1.0, 0.4), 2.9),
                3.0,
            ),
        ];

        for t in samples {
            assert!((t.inverse() * t).approx_eq(Transform::IDENTITY, EPSILON), "{t:?}");
            assert!((t * t.inverse()).approx_eq(Transform::IDENTITY, EPSILON), "{t:?}");
        }
    }

    #[test]
    fn test_transform_bytemuck() {
        assert_eq!(std::mem::size_of::<Transform>(), 32);
    }
}
