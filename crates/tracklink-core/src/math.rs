//! Geometric value types used by the tracking handles.
//!
//! This module provides:
//! - [`Vector`]: a three component `f32` vector with the tracking axis conventions
//! - [`Matrix`]: a rigid transform stored as three basis vectors plus an origin
//! - [`Quaternion`]: orientation as delivered by the service
//!
//! The tracking coordinate system is right handed with +y pointing up out of
//! the device and -z pointing away from the user.

use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

// ============================================================================
// Vector
// ============================================================================

/// A three component vector in device space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vector {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Unit vector along +x.
    #[must_use]
    pub const fn x_axis() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Unit vector along +y.
    #[must_use]
    pub const fn y_axis() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Unit vector along +z.
    #[must_use]
    pub const fn z_axis() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// Unit vector pointing left (-x).
    #[must_use]
    pub const fn left() -> Self {
        Self::new(-1.0, 0.0, 0.0)
    }

    /// Unit vector pointing right (+x).
    #[must_use]
    pub const fn right() -> Self {
        Self::x_axis()
    }

    /// Unit vector pointing down (-y).
    #[must_use]
    pub const fn down() -> Self {
        Self::new(0.0, -1.0, 0.0)
    }

    /// Unit vector pointing up (+y).
    #[must_use]
    pub const fn up() -> Self {
        Self::y_axis()
    }

    /// Unit vector pointing away from the user (-z).
    #[must_use]
    pub const fn forward() -> Self {
        Self::new(0.0, 0.0, -1.0)
    }

    /// Unit vector pointing towards the user (+z).
    #[must_use]
    pub const fn backward() -> Self {
        Self::z_axis()
    }

    /// Euclidean length.
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    /// Squared Euclidean length.
    #[must_use]
    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f32 {
        (*self - *other).magnitude()
    }

    /// Angle between two vectors in radians, 0 when either is degenerate.
    #[must_use]
    pub fn angle_to(&self, other: &Self) -> f32 {
        let denom = self.magnitude_squared() * other.magnitude_squared();
        if denom <= f32::EPSILON {
            return 0.0;
        }
        let cos = self.dot(other) / denom.sqrt();
        cos.clamp(-1.0, 1.0).acos()
    }

    /// Angle around the x axis, measured from -z towards +y.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.y.atan2(-self.z)
    }

    /// Angle around the y axis, measured from -z towards +x.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.x.atan2(-self.z)
    }

    /// Angle around the z axis, measured from -y towards +x.
    #[must_use]
    pub fn roll(&self) -> f32 {
        self.x.atan2(-self.y)
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Unit vector in the same direction.
    ///
    /// Returns the zero vector when the squared length is at or below
    /// `f32::EPSILON`.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let denom = self.magnitude_squared();
        if denom <= f32::EPSILON {
            return Self::zero();
        }
        *self * (1.0 / denom.sqrt())
    }

    /// True if every component is finite.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Components as an array.
    #[must_use]
    pub const fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Convert to nalgebra Vector3.
    #[must_use]
    pub fn to_vector3(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Create from nalgebra Vector3.
    #[must_use]
    pub fn from_vector3(v: &Vector3<f32>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<[f32; 3]> for Vector {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Vector3<f32>> for Vector {
    fn from(v: Vector3<f32>) -> Self {
        Self::from_vector3(&v)
    }
}

impl core::fmt::Display for Vector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add for Vector {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vector {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Mul<Vector> for f32 {
    type Output = Vector;
    fn mul(self, v: Vector) -> Vector {
        v * self
    }
}

impl Div<f32> for Vector {
    type Output = Self;
    fn div(self, scalar: f32) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign<f32> for Vector {
    fn mul_assign(&mut self, scalar: f32) {
        *self = *self * scalar;
    }
}

impl DivAssign<f32> for Vector {
    fn div_assign(&mut self, scalar: f32) {
        *self = *self / scalar;
    }
}

// ============================================================================
// Quaternion
// ============================================================================

/// Orientation quaternion in `(x, y, z, w)` order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// Scalar component
    pub w: f32,
}

impl Quaternion {
    /// Create a new quaternion.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// True if every component is finite and the norm is non-zero.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let finite = self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite();
        finite && (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w) > f32::EPSILON
    }

    /// Rotation matrix for this orientation; identity for degenerate input.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix {
        Matrix::from_quaternion(self)
    }

    fn to_unit(self) -> Option<UnitQuaternion<f32>> {
        if !self.is_valid() {
            return None;
        }
        Some(UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(
            self.w, self.x, self.y, self.z,
        )))
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

// ============================================================================
// Matrix
// ============================================================================

/// Rigid transform: three basis vectors and a translation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    /// Image of the x axis
    pub x_basis: Vector,
    /// Image of the y axis
    pub y_basis: Vector,
    /// Image of the z axis
    pub z_basis: Vector,
    /// Translation
    pub origin: Vector,
}

impl Matrix {
    /// Create a matrix from basis vectors and an origin.
    #[must_use]
    pub const fn new(x_basis: Vector, y_basis: Vector, z_basis: Vector, origin: Vector) -> Self {
        Self {
            x_basis,
            y_basis,
            z_basis,
            origin,
        }
    }

    /// The identity transform.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(Vector::x_axis(), Vector::y_axis(), Vector::z_axis(), Vector::zero())
    }

    /// Rotation of `angle_radians` around `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: &Vector, angle_radians: f32) -> Self {
        let n = axis.normalized();
        let (s, c) = angle_radians.sin_cos();
        let t = 1.0 - c;
        Self::new(
            Vector::new(n.x * n.x * t + c, n.y * n.x * t + n.z * s, n.z * n.x * t - n.y * s),
            Vector::new(n.x * n.y * t - n.z * s, n.y * n.y * t + c, n.z * n.y * t + n.x * s),
            Vector::new(n.x * n.z * t + n.y * s, n.y * n.z * t - n.x * s, n.z * n.z * t + c),
            Vector::zero(),
        )
    }

    /// Rotation matrix of a quaternion; identity when the quaternion is degenerate.
    #[must_use]
    pub fn from_quaternion(q: &Quaternion) -> Self {
        let Some(unit) = q.to_unit() else {
            return Self::identity();
        };
        let rot = unit.to_rotation_matrix();
        let m = rot.matrix();
        Self::new(
            Vector::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]),
            Vector::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]),
            Vector::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]),
            Vector::zero(),
        )
    }

    /// Transform a point (rotation plus translation).
    #[must_use]
    pub fn transform_point(&self, p: &Vector) -> Vector {
        self.transform_direction(p) + self.origin
    }

    /// Transform a direction (rotation only).
    #[must_use]
    pub fn transform_direction(&self, d: &Vector) -> Vector {
        self.x_basis * d.x + self.y_basis * d.y + self.z_basis * d.z
    }

    /// Inverse of a rigid transform (orthonormal basis assumed).
    #[must_use]
    pub fn rigid_inverse(&self) -> Self {
        let rot = Self::new(
            Vector::new(self.x_basis.x, self.y_basis.x, self.z_basis.x),
            Vector::new(self.x_basis.y, self.y_basis.y, self.z_basis.y),
            Vector::new(self.x_basis.z, self.y_basis.z, self.z_basis.z),
            Vector::zero(),
        );
        let origin = -rot.transform_direction(&self.origin);
        Self { origin, ..rot }
    }

    /// Row-major 3x3 rotation part.
    #[must_use]
    pub fn to_array_3x3(&self) -> [f32; 9] {
        [
            self.x_basis.x, self.x_basis.y, self.x_basis.z,
            self.y_basis.x, self.y_basis.y, self.y_basis.z,
            self.z_basis.x, self.z_basis.y, self.z_basis.z,
        ]
    }

    /// Row-major 4x4 homogeneous form, basis vectors as rows.
    #[must_use]
    pub fn to_array_4x4(&self) -> [f32; 16] {
        [
            self.x_basis.x, self.x_basis.y, self.x_basis.z, 0.0,
            self.y_basis.x, self.y_basis.y, self.y_basis.z, 0.0,
            self.z_basis.x, self.z_basis.y, self.z_basis.z, 0.0,
            self.origin.x, self.origin.y, self.origin.z, 1.0,
        ]
    }

    /// Convert to a column-vector nalgebra homogeneous matrix.
    #[must_use]
    pub fn to_matrix4(&self) -> Matrix4<f32> {
        Matrix4::new(
            self.x_basis.x, self.y_basis.x, self.z_basis.x, self.origin.x,
            self.x_basis.y, self.y_basis.y, self.z_basis.y, self.origin.y,
            self.x_basis.z, self.y_basis.z, self.z_basis.z, self.origin.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Matrix {
    type Output = Self;

    /// Compose transforms: `(a * b).transform_point(p) == a.transform_point(&b.transform_point(p))`.
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.transform_direction(&rhs.x_basis),
            self.transform_direction(&rhs.y_basis),
            self.transform_direction(&rhs.z_basis),
            self.transform_point(&rhs.origin),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &Vector, b: &Vector) -> bool {
        (*a - *b).magnitude() < 1e-5
    }

    #[test]
    fn test_axis_constants() {
        assert_eq!(Vector::right().to_array(), [1.0, 0.0, 0.0]);
        assert_eq!(Vector::up().to_array(), [0.0, 1.0, 0.0]);
        assert_eq!(Vector::backward().to_array(), [0.0, 0.0, 1.0]);
        assert_eq!(Vector::new(1.0, 0.0, 0.0), Vector::x_axis());
        assert_eq!(Vector::new(0.0, 1.0, 0.0), Vector::y_axis());
        assert_eq!(Vector::new(0.0, 0.0, 1.0), Vector::z_axis());
        assert_eq!(Vector::new(0.0, 0.0, 0.0), Vector::zero());
        assert_eq!(Vector::forward(), -Vector::backward());
    }

    #[test]
    fn test_normalized_degenerate_is_zero() {
        assert_eq!(Vector::zero().normalized(), Vector::zero());
        assert_eq!(Vector::new(1e-5, 0.0, 0.0).normalized(), Vector::zero());
        let n = Vector::new(3.0, 4.0, 0.0).normalized();
        assert!((n.magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cross_and_angle() {
        assert!(approx(&Vector::x_axis().cross(&Vector::y_axis()), &Vector::z_axis()));
        let angle = Vector::x_axis().angle_to(&Vector::y_axis());
        assert!((angle - core::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(Vector::zero().angle_to(&Vector::x_axis()), 0.0);
    }

    #[test]
    fn test_identity_matrix() {
        let identity = Matrix::identity();
        assert_eq!(Matrix::identity(), identity);
        assert_eq!(Matrix::default(), identity);
        let p = Vector::new(1.0, 2.0, 3.0);
        assert_eq!(identity.transform_point(&p), p);
    }

    #[test]
    fn test_quaternion_matrix_matches_axis_angle() {
        let half = core::f32::consts::FRAC_PI_4;
        let q = Quaternion::new(0.0, half.sin(), 0.0, half.cos());
        let from_q = q.to_matrix();
        let from_axis = Matrix::from_axis_angle(&Vector::y_axis(), core::f32::consts::FRAC_PI_2);
        assert!(approx(&from_q.x_basis, &from_axis.x_basis));
        assert!(approx(&from_q.z_basis, &from_axis.z_basis));
        assert!(approx(&from_q.x_basis, &Vector::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_degenerate_quaternion_gives_identity() {
        assert_eq!(Quaternion::new(0.0, 0.0, 0.0, 0.0).to_matrix(), Matrix::identity());
    }

    #[test]
    fn test_rigid_inverse_round_trip() {
        let mut m = Matrix::from_axis_angle(&Vector::new(1.0, 1.0, 0.0), 0.7);
        m.origin = Vector::new(5.0, -2.0, 1.0);
        let p = Vector::new(0.3, 0.2, -4.0);
        let back = m.rigid_inverse().transform_point(&m.transform_point(&p));
        assert!(approx(&back, &p));
        let composed = m * m.rigid_inverse();
        assert!(approx(&composed.transform_point(&p), &p));
    }

    #[test]
    fn test_nalgebra_interop() {
        let v = Vector::new(1.0, 2.0, 3.0);
        assert_eq!(Vector::from(v.to_vector3()), v);
        let mut m = Matrix::identity();
        m.origin = v;
        let h = m.to_matrix4() * nalgebra::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(Vector::new(h.x, h.y, h.z), v);
    }
}
