//! Schmidt quasi-normalization factors and recursion constants
//!
//! Computed once per coefficient table and immutable afterwards.

use super::coefficients::{CoefficientTable, MAX_DEGREE};
use nalgebra::{SMatrix, SVector};

/// Grid size for degree/order indices `0..=MAX_DEGREE`
pub(crate) const GRID: usize = MAX_DEGREE + 1;

/// `(n, m)` indexed work grid
pub(crate) type Grid = SMatrix<f64, GRID, GRID>;

/// Per-degree factor vector
pub(crate) type Factors = SVector<f64, GRID>;

/// Normalization data derived from a coefficient table
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizationCache {
    /// Schmidt quasi-normalization factors `snorm[n, m]`
    pub snorm: Grid,
    /// Legendre recursion constants `((n-1)² - m²) / ((2n-1)(2n-3))`
    pub k: Grid,
    /// `n + 1`, weighting the radial component
    pub degree_factor: Factors,
    /// `m`, weighting the longitude component
    pub order_factor: Factors,
    /// Normalized main field coefficients
    pub g: Grid,
    pub h: Grid,
    /// Normalized secular variation
    pub dg: Grid,
    pub dh: Grid,
}

impl NormalizationCache {
    pub fn new(table: &CoefficientTable) -> Self {
        let mut snorm = Grid::zeros();
        let mut k = Grid::zeros();
        snorm[(0, 0)] = 1.0;

        for n in 1..GRID {
            snorm[(n, 0)] = snorm[(n - 1, 0)] * (2 * n - 1) as f64 / n as f64;
            // the first order doubles the factor (j = 2), later orders do not
            let mut j = 2.0;
            for m in 0..=n {
                let (nf, mf) = (n as f64, m as f64);
                k[(n, m)] = ((nf - 1.0).powi(2) - mf * mf) / ((2.0 * nf - 1.0) * (2.0 * nf - 3.0));
                if m > 0 {
                    let flnmj = ((n - m + 1) as f64 * j) / (n + m) as f64;
                    snorm[(n, m)] = snorm[(n, m - 1)] * flnmj.sqrt();
                    j = 1.0;
                }
            }
        }
        k[(1, 1)] = 0.0;

        let degree_factor = Factors::from_fn(|n, _| (n + 1) as f64);
        let order_factor = Factors::from_fn(|n, _| n as f64);

        let mut g = Grid::zeros();
        let mut h = Grid::zeros();
        let mut dg = Grid::zeros();
        let mut dh = Grid::zeros();
        for c in table.coefficients() {
            let scale = snorm[(c.n, c.m)];
            g[(c.n, c.m)] = c.g * scale;
            dg[(c.n, c.m)] = c.dg * scale;
            // h(n, 0) is identically zero in the expansion
            if c.m > 0 {
                h[(c.n, c.m)] = c.h * scale;
                dh[(c.n, c.m)] = c.dh * scale;
            }
        }

        Self {
            snorm,
            k,
            degree_factor,
            order_factor,
            g,
            h,
            dg,
            dh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_schmidt_factors() {
        let cache = NormalizationCache::new(&CoefficientTable::embedded());
        assert_eq!(cache.snorm[(0, 0)], 1.0);
        assert_eq!(cache.snorm[(1, 0)], 1.0);
        assert_relative_eq!(cache.snorm[(1, 1)], 1.0, epsilon = 1e-15);
        assert_relative_eq!(cache.snorm[(2, 0)], 1.5, epsilon = 1e-15);
        assert_relative_eq!(cache.snorm[(2, 1)], 3.0f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(cache.snorm[(2, 2)], 3.0f64.sqrt() / 2.0, epsilon = 1e-12);
        assert_relative_eq!(cache.snorm[(3, 0)], 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_recursion_constants() {
        let cache = NormalizationCache::new(&CoefficientTable::embedded());
        assert_eq!(cache.k[(1, 1)], 0.0);
        assert_relative_eq!(cache.k[(2, 0)], 1.0 / 3.0, epsilon = 1e-15);
        assert_relative_eq!(cache.k[(2, 1)], 0.0, epsilon = 1e-15);
        assert_relative_eq!(cache.k[(3, 1)], 3.0 / 15.0, epsilon = 1e-15);
        assert_relative_eq!(cache.k[(12, 5)], (121.0 - 25.0) / (23.0 * 21.0), epsilon = 1e-15);
    }

    #[test]
    fn test_degree_and_order_factors() {
        let cache = NormalizationCache::new(&CoefficientTable::embedded());
        assert_eq!(cache.degree_factor[1], 2.0);
        assert_eq!(cache.degree_factor[12], 13.0);
        assert_eq!(cache.order_factor[0], 0.0);
        assert_eq!(cache.order_factor[7], 7.0);
    }

    #[test]
    fn test_coefficients_are_normalized() {
        let cache = NormalizationCache::new(&CoefficientTable::embedded());
        // g(1,0) has unit normalization
        assert_eq!(cache.g[(1, 0)], -29404.5);
        assert_eq!(cache.dg[(1, 0)], 6.7);
        assert_eq!(cache.h[(1, 0)], 0.0);
        assert_relative_eq!(cache.g[(2, 0)], -2500.0 * 1.5, epsilon = 1e-9);
    }
}
