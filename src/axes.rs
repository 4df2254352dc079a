//! Display-rotation dependent remapping of the device coordinate system
//!
//! A rotation matrix produced from the rotation vector is expressed in the
//! device's natural axes. When the screen is rotated, azimuth must be taken
//! relative to the top of the *screen*, so the matrix basis is remapped: the
//! new X and Y axes are chosen from the old ones (with sign) and the new Z
//! axis is derived so the basis stays right-handed.
//!
//! # Example
//! ```
//! use nalgebra::Matrix3;
//! use compass_heading::{Axis, AxisRemap, DisplayRotation, remap_axes};
//!
//! let remap = DisplayRotation::Rotation90.axis_remap();
//! assert_eq!((remap.x(), remap.y(), remap.z()), (Axis::Y, Axis::MinusX, Axis::Z));
//!
//! let identity = Matrix3::<f32>::identity();
//! assert_eq!(remap_axes(&identity, AxisRemap::IDENTITY), identity);
//! ```

use crate::types::DisplayRotation;
use nalgebra::Matrix3;

/// A signed device axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// +X
    X,
    /// +Y
    Y,
    /// +Z
    Z,
    /// -X
    MinusX,
    /// -Y
    MinusY,
    /// -Z
    MinusZ,
}

impl Axis {
    /// Column index of the unsigned axis (X = 0, Y = 1, Z = 2)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X | Axis::MinusX => 0,
            Axis::Y | Axis::MinusY => 1,
            Axis::Z | Axis::MinusZ => 2,
        }
    }

    /// True for the negated axes
    #[inline]
    pub fn is_negative(self) -> bool {
        matches!(self, Axis::MinusX | Axis::MinusY | Axis::MinusZ)
    }

    #[inline]
    fn sign(self) -> f32 {
        if self.is_negative() { -1.0 } else { 1.0 }
    }

    fn from_parts(index: usize, negative: bool) -> Self {
        match (index, negative) {
            (0, false) => Axis::X,
            (1, false) => Axis::Y,
            (2, false) => Axis::Z,
            (0, true) => Axis::MinusX,
            (1, true) => Axis::MinusY,
            _ => Axis::MinusZ,
        }
    }
}

/// Choice of new X and Y axes for a coordinate remap
///
/// X and Y must name different unsigned axes; Z is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisRemap {
    x: Axis,
    y: Axis,
}

impl AxisRemap {
    /// Leaves the matrix unchanged
    pub const IDENTITY: AxisRemap = AxisRemap {
        x: Axis::X,
        y: Axis::Y,
    };

    /// Create a remap, returning `None` if both axes are collinear
    ///
    /// # Example
    /// ```
    /// use compass_heading::{Axis, AxisRemap};
    ///
    /// assert!(AxisRemap::new(Axis::Y, Axis::MinusX).is_some());
    /// assert!(AxisRemap::new(Axis::X, Axis::MinusX).is_none());
    /// ```
    pub fn new(x: Axis, y: Axis) -> Option<Self> {
        if x.index() == y.index() {
            None
        } else {
            Some(Self { x, y })
        }
    }

    /// New X axis
    pub fn x(self) -> Axis {
        self.x
    }

    /// New Y axis
    pub fn y(self) -> Axis {
        self.y
    }

    /// Derived new Z axis keeping the basis right-handed
    pub fn z(self) -> Axis {
        let index = 3 - self.x.index() - self.y.index();
        // (x, y, z) is an even permutation exactly when y follows x cyclically
        let even = (self.x.index() + 1) % 3 == self.y.index();
        let negative = self.x.is_negative() ^ self.y.is_negative() ^ !even;
        Axis::from_parts(index, negative)
    }

    /// Signed permutation matrix `P` such that the remapped matrix is `R * P`
    pub fn matrix(self) -> Matrix3<f32> {
        let mut permutation = Matrix3::zeros();
        for (row, axis) in [self.x, self.y, self.z()].into_iter().enumerate() {
            permutation[(row, axis.index())] = axis.sign();
        }
        permutation
    }
}

impl Default for AxisRemap {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl DisplayRotation {
    /// Axis pair that compensates for this display rotation
    pub fn axis_remap(self) -> AxisRemap {
        let (x, y) = match self {
            DisplayRotation::Rotation0 => (Axis::X, Axis::Y),
            DisplayRotation::Rotation90 => (Axis::Y, Axis::MinusX),
            DisplayRotation::Rotation180 => (Axis::MinusX, Axis::MinusY),
            DisplayRotation::Rotation270 => (Axis::MinusY, Axis::X),
        };
        AxisRemap { x, y }
    }
}

/// Remap the basis of a rotation matrix
///
/// Column `x.index()` of the result is the sign-adjusted first column of the
/// input, column `y.index()` the second and column `z.index()` the third.
#[inline]
pub fn remap_axes(rotation: &Matrix3<f32>, remap: AxisRemap) -> Matrix3<f32> {
    rotation * remap.matrix()
}
