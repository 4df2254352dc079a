//! Angle helpers shared by the resolver, the geomagnetic model and the pipeline

use nalgebra::Vector3;

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Wrap an angle in degrees into `[0, 360)`.
///
/// `rem_euclid` can round a tiny negative input up to exactly `360.0`; that
/// case is folded back to `0.0`. NaN passes through unchanged so callers can
/// still detect degenerate input.
///
/// # Example
/// ```
/// use compass_heading::normalize_degrees;
///
/// assert_eq!(normalize_degrees(370.0), 10.0);
/// assert_eq!(normalize_degrees(-10.0), 350.0);
/// assert!(normalize_degrees(f32::NAN).is_nan());
/// ```
#[inline]
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Extension trait for sensor vectors
pub trait Vector3Ext {
    /// True when every component is finite
    fn is_finite(&self) -> bool;

    /// Normalize the vector, returning `None` if its magnitude is zero or not finite
    fn try_normalize_finite(&self) -> Option<Vector3<f32>>;
}

impl Vector3Ext for Vector3<f32> {
    fn is_finite(&self) -> bool {
        self.iter().all(|component| component.is_finite())
    }

    fn try_normalize_finite(&self) -> Option<Vector3<f32>> {
        let magnitude = self.norm();
        if magnitude > 0.0 && magnitude.is_finite() {
            Some(*self / magnitude)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees_range() {
        for degrees in [-720.0, -360.0, -180.5, -0.0, 0.0, 45.0, 359.999, 360.0, 725.0] {
            let wrapped = normalize_degrees(degrees);
            assert!(
                (0.0..360.0).contains(&wrapped),
                "{} wrapped to {}",
                degrees,
                wrapped
            );
        }
    }

    #[test]
    fn test_normalize_degrees_tiny_negative() {
        // -1e-6 + 360 rounds to 360.0 in f32
        assert_eq!(normalize_degrees(-1e-6), 0.0);
    }

    #[test]
    fn test_vector_extensions() {
        let v = Vector3::new(3.0f32, 4.0, 0.0);
        let normalized = v.try_normalize_finite().unwrap();
        assert!((normalized.norm() - 1.0).abs() < 1e-6);

        assert!(Vector3::<f32>::zeros().try_normalize_finite().is_none());
        assert!(!Vector3::new(f32::NAN, 0.0, 1.0).is_finite());
        assert!(Vector3::new(0.1f32, 0.0, 1.0).is_finite());
    }
}
