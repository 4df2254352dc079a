//! Rotation vector to azimuth conversion
//!
//! The platform's fused rotation vector is the vector part of a unit
//! quaternion (optionally followed by the scalar part). It is turned into a
//! rotation matrix, remapped for the current display rotation, decomposed into
//! azimuth/pitch/roll, and the azimuth is reported in degrees within `[0, 360)`.

use crate::axes::{AxisRemap, remap_axes};
use crate::math::{RAD_TO_DEG, normalize_degrees};
use crate::types::DisplayRotation;
use nalgebra::{Matrix3, Vector3, Vector4};

/// Raw rotation vector reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationVector {
    /// Vector part only; the scalar part is derived assuming a unit quaternion
    Xyz(Vector3<f32>),
    /// Vector part followed by the scalar part
    Xyzw(Vector4<f32>),
}

impl RotationVector {
    /// Vector (x, y, z) part of the quaternion
    pub fn xyz(&self) -> Vector3<f32> {
        match self {
            RotationVector::Xyz(xyz) => *xyz,
            RotationVector::Xyzw(xyzw) => xyzw.xyz(),
        }
    }

    /// Vector part of the equivalent quaternion whose scalar part is non-negative
    ///
    /// `q` and `-q` are the same rotation. A 3-component reading always
    /// implies the non-negative scalar, so a 4-component reading with `w < 0`
    /// is negated before its scalar part is dropped.
    pub fn canonical_xyz(&self) -> Vector3<f32> {
        match self {
            RotationVector::Xyzw(v) if v.w < 0.0 => -v.xyz(),
            _ => self.xyz(),
        }
    }

    /// Quaternion components `(w, x, y, z)`
    ///
    /// For `Xyz` the scalar part is `sqrt(1 - |xyz|²)`, clamped at zero when
    /// sensor noise pushes the vector part past unit length.
    pub fn quaternion(&self) -> (f32, f32, f32, f32) {
        match self {
            RotationVector::Xyz(v) => {
                let w_squared = 1.0 - v.norm_squared();
                let w = if w_squared > 0.0 { w_squared.sqrt() } else { 0.0 };
                (w, v.x, v.y, v.z)
            }
            RotationVector::Xyzw(v) => (v.w, v.x, v.y, v.z),
        }
    }

    /// True when no meaningful orientation can be derived
    ///
    /// Non-finite components come from uncalibrated sensors; an all-zero
    /// 4-component reading cannot be a unit quaternion.
    pub fn is_degenerate(&self) -> bool {
        match self {
            RotationVector::Xyz(v) => v.iter().any(|c| !c.is_finite()),
            RotationVector::Xyzw(v) => {
                v.iter().any(|c| !c.is_finite()) || v.norm_squared() == 0.0
            }
        }
    }
}

impl From<Vector3<f32>> for RotationVector {
    fn from(value: Vector3<f32>) -> Self {
        RotationVector::Xyz(value)
    }
}

impl From<Vector4<f32>> for RotationVector {
    fn from(value: Vector4<f32>) -> Self {
        RotationVector::Xyzw(value)
    }
}

impl From<[f32; 3]> for RotationVector {
    fn from(value: [f32; 3]) -> Self {
        RotationVector::Xyz(Vector3::from(value))
    }
}

impl From<[f32; 4]> for RotationVector {
    fn from(value: [f32; 4]) -> Self {
        RotationVector::Xyzw(Vector4::from(value))
    }
}

/// Rotation matrix for a rotation vector
///
/// Standard quaternion to matrix conversion; the result maps device
/// coordinates to world (east, north, up) coordinates.
pub fn rotation_matrix(rotation_vector: &RotationVector) -> Matrix3<f32> {
    let (q0, q1, q2, q3) = rotation_vector.quaternion();

    let sq_q1 = 2.0 * q1 * q1;
    let sq_q2 = 2.0 * q2 * q2;
    let sq_q3 = 2.0 * q3 * q3;
    let q1_q2 = 2.0 * q1 * q2;
    let q3_q0 = 2.0 * q3 * q0;
    let q1_q3 = 2.0 * q1 * q3;
    let q2_q0 = 2.0 * q2 * q0;
    let q2_q3 = 2.0 * q2 * q3;
    let q1_q0 = 2.0 * q1 * q0;

    Matrix3::new(
        1.0 - sq_q2 - sq_q3,
        q1_q2 - q3_q0,
        q1_q3 + q2_q0,
        q1_q2 + q3_q0,
        1.0 - sq_q1 - sq_q3,
        q2_q3 - q1_q0,
        q1_q3 - q2_q0,
        q2_q3 + q1_q0,
        1.0 - sq_q1 - sq_q2,
    )
}

/// Azimuth, pitch and roll in radians from a rotation matrix
///
/// Azimuth is the rotation about -Z (clockwise from north, in `[-π, π]`),
/// pitch about -X and roll about Y. Pitch is NaN when the matrix is not
/// orthonormal enough for `asin` to be defined.
pub fn orientation_angles(rotation: &Matrix3<f32>) -> Vector3<f32> {
    Vector3::new(
        rotation[(0, 1)].atan2(rotation[(1, 1)]),
        (-rotation[(2, 1)]).asin(),
        (-rotation[(2, 0)]).atan2(rotation[(2, 2)]),
    )
}

/// Magnetic azimuth in degrees for a rotation vector and display rotation
///
/// Returns a value in `[0, 360)` or NaN for degenerate input.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_heading::{DisplayRotation, azimuth};
///
/// // Device lying flat, top pointing at magnetic north
/// let level = Vector3::<f32>::zeros();
/// assert_eq!(azimuth(&level.into(), DisplayRotation::Rotation0), 0.0);
/// assert_eq!(azimuth(&level.into(), DisplayRotation::Rotation90), 90.0);
/// ```
pub fn azimuth(rotation_vector: &RotationVector, display_rotation: DisplayRotation) -> f32 {
    azimuth_with_remap(rotation_vector, display_rotation.axis_remap())
}

/// Magnetic azimuth in degrees using an explicit axis remap
pub fn azimuth_with_remap(rotation_vector: &RotationVector, remap: AxisRemap) -> f32 {
    if rotation_vector.is_degenerate() {
        return f32::NAN;
    }

    let rotation = remap_axes(&rotation_matrix(rotation_vector), remap);
    let azimuth_degrees = orientation_angles(&rotation).x * RAD_TO_DEG;

    normalize_degrees(azimuth_degrees)
}
