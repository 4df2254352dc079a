//! Memoized per-query terms
//!
//! Each group of intermediate terms is keyed on the exact bit pattern of the
//! inputs it depends on and is only recomputed when one of those inputs
//! changes. Reuse is bit-for-bit, so cached and uncached queries agree exactly.

use super::normalization::{Factors, GRID, Grid, NormalizationCache};

/// WGS-84 semi-major axis in km
pub const WGS84_SEMI_MAJOR_KM: f64 = 6378.137;
/// WGS-84 semi-minor axis in km
pub const WGS84_SEMI_MINOR_KM: f64 = 6356.7523142;
/// Mean geomagnetic reference radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.2;

/// Spherical coordinates and Legendre functions for one latitude/altitude
#[derive(Debug, Clone)]
pub(crate) struct PositionTerms {
    latitude: u64,
    altitude: u64,
    /// Geocentric radius in km
    pub r: f64,
    /// Cosine and sine of the geodetic-to-geocentric rotation angle
    pub ca: f64,
    pub sa: f64,
    /// Sine of geocentric colatitude
    pub st: f64,
    /// Unnormalized associated Legendre functions and their colatitude derivatives
    pub p: Grid,
    pub dp: Grid,
    /// Order-one recursion used when `st == 0`
    pub pp: Factors,
}

impl PositionTerms {
    fn compute(latitude: f64, altitude_km: f64, normalization: &NormalizationCache) -> Self {
        let a2 = WGS84_SEMI_MAJOR_KM * WGS84_SEMI_MAJOR_KM;
        let b2 = WGS84_SEMI_MINOR_KM * WGS84_SEMI_MINOR_KM;
        let c2 = a2 - b2;
        let a4 = a2 * a2;
        let b4 = b2 * b2;
        let c4 = a4 - b4;

        let (srlat, crlat) = latitude.to_radians().sin_cos();
        let srlat2 = srlat * srlat;
        let crlat2 = crlat * crlat;

        let q = (a2 - c2 * srlat2).sqrt();
        let q1 = altitude_km * q;
        let q2 = ((q1 + a2) / (q1 + b2)).powi(2);
        let ct = srlat / (q2 * crlat2 + srlat2).sqrt();
        let st = (1.0 - ct * ct).max(0.0).sqrt();
        let r = (altitude_km * altitude_km + 2.0 * q1 + (a4 - c4 * srlat2) / (q * q)).sqrt();
        let d = (a2 * crlat2 + b2 * srlat2).sqrt();
        let ca = (altitude_km + d) / r;
        let sa = c2 * crlat * srlat / (r * d);

        let k = &normalization.k;
        let mut p = Grid::zeros();
        let mut dp = Grid::zeros();
        p[(0, 0)] = 1.0;
        for n in 1..GRID {
            for m in 0..=n {
                if n == m {
                    p[(n, m)] = st * p[(n - 1, m - 1)];
                    dp[(n, m)] = st * dp[(n - 1, m - 1)] + ct * p[(n - 1, m - 1)];
                } else if n == 1 {
                    p[(n, m)] = ct * p[(n - 1, m)];
                    dp[(n, m)] = ct * dp[(n - 1, m)] - st * p[(n - 1, m)];
                } else {
                    // p(n-2, m) is zero for m > n-2
                    p[(n, m)] = ct * p[(n - 1, m)] - k[(n, m)] * p[(n - 2, m)];
                    dp[(n, m)] = ct * dp[(n - 1, m)] - st * p[(n - 1, m)] - k[(n, m)] * dp[(n - 2, m)];
                }
            }
        }

        let mut pp = Factors::zeros();
        pp[0] = 1.0;
        pp[1] = 1.0;
        for n in 2..GRID {
            pp[n] = ct * pp[n - 1] - k[(n, 1)] * pp[n - 2];
        }

        Self {
            latitude: latitude.to_bits(),
            altitude: altitude_km.to_bits(),
            r,
            ca,
            sa,
            st,
            p,
            dp,
            pp,
        }
    }

    fn is_for(&self, latitude: f64, altitude_km: f64) -> bool {
        self.latitude == latitude.to_bits() && self.altitude == altitude_km.to_bits()
    }
}

/// `sin(m·λ)` and `cos(m·λ)` for one longitude
#[derive(Debug, Clone)]
pub(crate) struct LongitudeTerms {
    longitude: u64,
    pub sp: Factors,
    pub cp: Factors,
}

impl LongitudeTerms {
    fn compute(longitude: f64) -> Self {
        let mut sp = Factors::zeros();
        let mut cp = Factors::zeros();
        cp[0] = 1.0;
        (sp[1], cp[1]) = longitude.to_radians().sin_cos();
        for m in 2..GRID {
            sp[m] = sp[1] * cp[m - 1] + cp[1] * sp[m - 1];
            cp[m] = cp[1] * cp[m - 1] - sp[1] * sp[m - 1];
        }

        Self {
            longitude: longitude.to_bits(),
            sp,
            cp,
        }
    }

    fn is_for(&self, longitude: f64) -> bool {
        self.longitude == longitude.to_bits()
    }
}

/// Normalized coefficients advanced to one decimal year
#[derive(Debug, Clone)]
pub(crate) struct TimeTerms {
    year: u64,
    pub g: Grid,
    pub h: Grid,
}

impl TimeTerms {
    fn compute(year: f64, epoch: f64, normalization: &NormalizationCache) -> Self {
        let dt = year - epoch;
        Self {
            year: year.to_bits(),
            g: normalization.g + normalization.dg * dt,
            h: normalization.h + normalization.dh * dt,
        }
    }

    fn is_for(&self, year: f64) -> bool {
        self.year == year.to_bits()
    }
}

/// Replace `slot` with a fresh value unless it already holds a current one
fn reuse_or_compute<'a, T>(
    slot: &'a mut Option<T>,
    is_current: impl FnOnce(&T) -> bool,
    compute: impl FnOnce() -> T,
    recomputations: &mut u64,
) -> &'a T {
    if !slot.as_ref().is_some_and(is_current) {
        *slot = None;
        *recomputations += 1;
    }
    slot.get_or_insert_with(compute)
}

/// Query cache owned by one model instance
#[derive(Debug, Clone, Default)]
pub(crate) struct QueryCache {
    position: Option<PositionTerms>,
    longitude: Option<LongitudeTerms>,
    time: Option<TimeTerms>,
    #[cfg_attr(not(test), allow(dead_code))]
    recomputations: u64,
}

impl QueryCache {
    /// Terms for the given query, recomputing only the groups whose inputs changed
    pub fn terms(
        &mut self,
        latitude: f64,
        longitude: f64,
        year: f64,
        altitude_km: f64,
        epoch: f64,
        normalization: &NormalizationCache,
    ) -> (&PositionTerms, &LongitudeTerms, &TimeTerms) {
        let position = reuse_or_compute(
            &mut self.position,
            |terms| terms.is_for(latitude, altitude_km),
            || PositionTerms::compute(latitude, altitude_km, normalization),
            &mut self.recomputations,
        );
        let longitude = reuse_or_compute(
            &mut self.longitude,
            |terms| terms.is_for(longitude),
            || LongitudeTerms::compute(longitude),
            &mut self.recomputations,
        );
        let time = reuse_or_compute(
            &mut self.time,
            |terms| terms.is_for(year),
            || TimeTerms::compute(year, epoch, normalization),
            &mut self.recomputations,
        );
        (position, longitude, time)
    }

    /// Number of term groups computed so far
    #[cfg(test)]
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
