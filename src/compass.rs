//! Tilt-compensated magnetic azimuth from raw accelerometer and magnetometer readings
//!
//! Used on devices without a fused rotation vector sensor. Both vectors are in
//! the device frame (X right, Y toward the top of the screen, Z out of the
//! screen); the accelerometer reading points away from the ground when the
//! device is at rest.

use crate::math::{RAD_TO_DEG, Vector3Ext, normalize_degrees};
use nalgebra::Vector3;

/// Calculate tilt-compensated magnetic azimuth
///
/// Builds a horizontal east vector from `magnetometer × accelerometer` and a
/// horizontal north vector from `accelerometer × east`; the azimuth of the
/// device's Y axis is `atan2(east.y, north.y)`.
///
/// # Arguments
/// * `accelerometer` - Gravity reading (any unit)
/// * `magnetometer` - Calibrated magnetic field reading (any unit)
///
/// # Returns
/// Azimuth in degrees within `[0, 360)` (0° = magnetic north), or NaN when
/// either vector is zero, non-finite, or the two are parallel.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_heading::compass::tilt_compensated_azimuth;
///
/// let gravity = Vector3::new(0.0, 0.0, 9.81);      // lying flat
/// let field = Vector3::new(0.0, 20.0, -40.0);      // north ahead of the top edge
/// let azimuth = tilt_compensated_azimuth(gravity, field);
/// assert!(azimuth.abs() < 1e-3);
/// ```
pub fn tilt_compensated_azimuth(accelerometer: Vector3<f32>, magnetometer: Vector3<f32>) -> f32 {
    let Some(east) = magnetometer.cross(&accelerometer).try_normalize_finite() else {
        return f32::NAN;
    };
    let Some(up) = accelerometer.try_normalize_finite() else {
        return f32::NAN;
    };
    let north = up.cross(&east);

    normalize_degrees(east.y.atan2(north.y) * RAD_TO_DEG)
}
