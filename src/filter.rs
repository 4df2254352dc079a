//! Exponential low-pass smoothing of sensor vectors

use nalgebra::Vector3;

/// Exponential low-pass filter over a 3-component sensor vector
///
/// The first sample seeds the state unchanged. Every later sample moves the
/// state a fraction `alpha` of the way toward the new reading:
/// `state += alpha * (raw - state)`.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_heading::VectorFilter;
///
/// let mut filter = VectorFilter::new(0.5);
/// assert_eq!(*filter.update(Vector3::new(2.0, 0.0, 0.0)), Vector3::new(2.0, 0.0, 0.0));
/// assert_eq!(*filter.update(Vector3::new(4.0, 0.0, 0.0)), Vector3::new(3.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorFilter {
    /// Smoothing constant in (0, 1]
    alpha: f32,
    /// Running state, `None` until the first sample
    state: Option<Vector3<f32>>,
}

impl VectorFilter {
    /// Create a filter with the given smoothing constant
    ///
    /// `alpha` is clamped into (0, 1]; a non-positive or NaN alpha would
    /// freeze the state at the first sample forever.
    pub fn new(alpha: f32) -> Self {
        let alpha = if alpha.is_nan() {
            crate::HeadingSettings::DEFAULT_SMOOTHING
        } else {
            alpha.clamp(f32::EPSILON, 1.0)
        };

        Self { alpha, state: None }
    }

    /// Feed one sample and return the smoothed state
    ///
    /// The returned reference is owned by the filter and valid until the
    /// next update.
    pub fn update(&mut self, raw: Vector3<f32>) -> &Vector3<f32> {
        let alpha = self.alpha;
        match &mut self.state {
            Some(state) => {
                *state += (raw - *state) * alpha;
                state
            }
            empty => empty.insert(raw),
        }
    }

    /// Current smoothed state, if any sample has been seen
    pub fn state(&self) -> Option<&Vector3<f32>> {
        self.state.as_ref()
    }

    /// Discard the running state; the next sample seeds the filter again
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Smoothing constant
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Default for VectorFilter {
    fn default() -> Self {
        Self::new(crate::HeadingSettings::DEFAULT_SMOOTHING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_passes_through() {
        let mut filter = VectorFilter::new(0.25);
        assert!(filter.state().is_none());

        let raw = Vector3::new(0.1, -0.2, 0.3);
        assert_eq!(*filter.update(raw), raw);
        assert_eq!(filter.state(), Some(&raw));
    }

    #[test]
    fn test_update_moves_alpha_fraction() {
        let mut filter = VectorFilter::new(0.25);
        filter.update(Vector3::zeros());

        let smoothed = *filter.update(Vector3::new(4.0, -8.0, 1.0));
        assert!((smoothed - Vector3::new(1.0, -2.0, 0.25)).norm() < 1e-6);
    }

    #[test]
    fn test_converges_monotonically_to_constant_input() {
        let mut filter = VectorFilter::new(0.3);
        filter.update(Vector3::new(-1.0, 5.0, 0.0));

        let target = Vector3::new(1.0, 1.0, 1.0);
        let mut previous_error = Vector3::new(2.0f32, 4.0, 1.0);
        for _ in 0..60 {
            let error = (target - *filter.update(target)).abs();
            for axis in 0..3 {
                assert!(error[axis] <= previous_error[axis]);
            }
            previous_error = error;
        }
        assert!(previous_error.max() < 1e-6);
    }

    #[test]
    fn test_fixed_point_is_stable() {
        let mut filter = VectorFilter::new(0.96);
        let input = Vector3::new(0.3, 0.4, 0.5);
        filter.update(input);
        for _ in 0..10 {
            assert_eq!(*filter.update(input), input);
        }
    }

    #[test]
    fn test_reset_reseeds() {
        let mut filter = VectorFilter::new(0.5);
        filter.update(Vector3::new(1.0, 1.0, 1.0));
        filter.reset();
        assert!(filter.state().is_none());

        let raw = Vector3::new(-3.0, 0.0, 2.0);
        assert_eq!(*filter.update(raw), raw);
    }

    #[test]
    fn test_alpha_clamped() {
        assert_eq!(VectorFilter::new(1.5).alpha(), 1.0);
        assert!(VectorFilter::new(-1.0).alpha() > 0.0);
        assert_eq!(VectorFilter::new(f32::NAN).alpha(), 0.96);
        assert_eq!(VectorFilter::default().alpha(), 0.96);
    }
}
