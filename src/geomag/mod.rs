//! World Magnetic Model evaluation
//!
//! Spherical harmonic synthesis of the main geomagnetic field to degree and
//! order 12, with secular variation applied linearly from the table epoch.
//! The model is accurate to roughly half a degree of declination within its
//! five year validity window and degrades outside it.
//!
//! # Example
//! ```
//! use compass_heading::GeomagneticModel;
//!
//! let mut model = GeomagneticModel::new();
//! let field = model.field(40.0, -105.0, 2022.5, 0.0);
//! assert!((field.declination - 7.84).abs() < 0.05);
//! assert!(field.dip > 60.0);
//! ```

mod cache;
pub mod coefficients;
mod normalization;

pub use cache::{EARTH_RADIUS_KM, WGS84_SEMI_MAJOR_KM, WGS84_SEMI_MINOR_KM};
pub use coefficients::{
    CofFile, CofText, CoefficientSource, CoefficientTable, EmbeddedCoefficients, GaussCoefficient,
    MAX_DEGREE,
};

use cache::QueryCache;
use chrono::{Datelike, NaiveDate, Utc};
use log::{debug, warn};
use normalization::{GRID, NormalizationCache};

/// Length of a model's validity window in years
pub const VALIDITY_YEARS: f64 = 5.0;

/// Geomagnetic field elements at one point
///
/// Angles are in degrees, intensities in nanotesla. `north`, `east` and
/// `vertical` are geodetic components; `vertical` is positive downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeomagneticField {
    /// Declination, east positive
    pub declination: f64,
    /// Inclination, positive below the horizontal
    pub dip: f64,
    pub total_intensity: f64,
    pub horizontal_intensity: f64,
    pub north: f64,
    pub east: f64,
    pub vertical: f64,
}

/// WMM evaluator
///
/// Queries memoize their intermediate terms, so they take `&mut self`;
/// share a model between threads behind a `Mutex`.
#[derive(Debug, Clone)]
pub struct GeomagneticModel {
    table: CoefficientTable,
    normalization: NormalizationCache,
    cache: QueryCache,
}

impl GeomagneticModel {
    /// Model backed by the embedded WMM-2020 coefficients
    pub fn new() -> Self {
        Self::from_table(CoefficientTable::embedded())
    }

    /// Model loaded from `source`, falling back to the embedded table if it fails
    ///
    /// # Example
    /// ```
    /// use compass_heading::{CofText, GeomagneticModel};
    ///
    /// let model = GeomagneticModel::from_source(&CofText("not a coefficient file"));
    /// assert_eq!(model.epoch(), 2020.0);
    /// ```
    pub fn from_source(source: &dyn CoefficientSource) -> Self {
        match source.load() {
            Ok(table) => Self::from_table(table),
            Err(error) => {
                warn!(
                    "Failed to load geomagnetic coefficients ({}), using embedded WMM-2020",
                    error
                );
                Self::new()
            }
        }
    }

    /// Model for an already loaded table
    pub fn from_table(table: CoefficientTable) -> Self {
        let normalization = NormalizationCache::new(&table);
        debug!(
            "Geomagnetic model {} (epoch {}) with {} coefficients",
            table.model_name(),
            table.epoch(),
            table.coefficients().len()
        );

        Self {
            table,
            normalization,
            cache: QueryCache::default(),
        }
    }

    /// Coefficient table in use
    pub fn table(&self) -> &CoefficientTable {
        &self.table
    }

    /// Epoch of the coefficient table
    pub fn epoch(&self) -> f64 {
        self.table.epoch()
    }

    /// Mid-point of the validity window
    pub fn default_date(&self) -> f64 {
        self.epoch() + VALIDITY_YEARS / 2.0
    }

    /// End of the validity window
    pub fn valid_until(&self) -> f64 {
        self.epoch() + VALIDITY_YEARS
    }

    /// Field elements at a geodetic position
    ///
    /// # Arguments
    /// * `latitude` - Geodetic latitude in degrees, north positive
    /// * `longitude` - Longitude in degrees, east positive
    /// * `year` - Decimal year, e.g. 2022.5
    /// * `altitude_km` - Height above the WGS-84 ellipsoid in km
    pub fn field(&mut self, latitude: f64, longitude: f64, year: f64, altitude_km: f64) -> GeomagneticField {
        if !(self.epoch()..=self.valid_until()).contains(&year) {
            debug!(
                "Year {} outside {} validity window {}..={}",
                year,
                self.table.model_name(),
                self.epoch(),
                self.valid_until()
            );
        }

        let normalization = &self.normalization;
        let (position, longitude_terms, time) =
            self.cache
                .terms(latitude, longitude, year, altitude_km, self.table.epoch(), normalization);

        let aor = EARTH_RADIUS_KM / position.r;
        let mut ar = aor * aor;
        let mut br = 0.0;
        let mut bt = 0.0;
        let mut bp = 0.0;
        let mut bpp = 0.0;

        for n in 1..GRID {
            ar *= aor;
            for m in 0..=n {
                let g = time.g[(n, m)];
                let h = time.h[(n, m)];
                let t1 = g * longitude_terms.cp[m] + h * longitude_terms.sp[m];
                let t2 = g * longitude_terms.sp[m] - h * longitude_terms.cp[m];
                let par = ar * position.p[(n, m)];

                bt -= ar * t1 * position.dp[(n, m)];
                bp += normalization.order_factor[m] * t2 * par;
                br += normalization.degree_factor[n] * t1 * par;

                // at the poles the longitude derivative needs its own recursion
                if position.st == 0.0 && m == 1 {
                    bpp += normalization.order_factor[m] * t2 * ar * position.pp[n];
                }
            }
        }

        let bp = if position.st == 0.0 { bpp } else { bp / position.st };

        let north = -bt * position.ca - br * position.sa;
        let east = bp;
        let vertical = bt * position.sa - br * position.ca;
        let horizontal = north.hypot(east);

        GeomagneticField {
            declination: east.atan2(north).to_degrees(),
            dip: vertical.atan2(horizontal).to_degrees(),
            total_intensity: horizontal.hypot(vertical),
            horizontal_intensity: horizontal,
            north,
            east,
            vertical,
        }
    }

    /// Declination in degrees, east positive
    pub fn declination(&mut self, latitude: f64, longitude: f64, year: f64, altitude_km: f64) -> f64 {
        self.field(latitude, longitude, year, altitude_km).declination
    }

    /// Dip (inclination) in degrees, positive downward
    pub fn dip(&mut self, latitude: f64, longitude: f64, year: f64, altitude_km: f64) -> f64 {
        self.field(latitude, longitude, year, altitude_km).dip
    }

    /// Total intensity in nT
    pub fn intensity(&mut self, latitude: f64, longitude: f64, year: f64, altitude_km: f64) -> f64 {
        self.field(latitude, longitude, year, altitude_km).total_intensity
    }

    /// Horizontal intensity in nT
    pub fn horizontal_intensity(&mut self, latitude: f64, longitude: f64, year: f64, altitude_km: f64) -> f64 {
        self.field(latitude, longitude, year, altitude_km).horizontal_intensity
    }

    /// Northward component in nT
    pub fn north_intensity(&mut self, latitude: f64, longitude: f64, year: f64, altitude_km: f64) -> f64 {
        self.field(latitude, longitude, year, altitude_km).north
    }

    /// Eastward component in nT
    pub fn east_intensity(&mut self, latitude: f64, longitude: f64, year: f64, altitude_km: f64) -> f64 {
        self.field(latitude, longitude, year, altitude_km).east
    }

    /// Downward component in nT
    pub fn vertical_intensity(&mut self, latitude: f64, longitude: f64, year: f64, altitude_km: f64) -> f64 {
        self.field(latitude, longitude, year, altitude_km).vertical
    }

    /// Declination at sea level on the model's default date
    pub fn declination_at_default_date(&mut self, latitude: f64, longitude: f64) -> f64 {
        let year = self.default_date();
        self.declination(latitude, longitude, year, 0.0)
    }
}

impl Default for GeomagneticModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Decimal year for a calendar date
///
/// The day of year is 1-based, so January 1st is slightly past the integer
/// year, matching the convention of the host's date handling.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use compass_heading::decimal_year;
///
/// let date = NaiveDate::from_ymd_opt(2022, 7, 2).unwrap();
/// assert!((decimal_year(date) - 2022.5).abs() < 0.01);
/// ```
pub fn decimal_year(date: NaiveDate) -> f64 {
    let year = date.year();
    let days_in_year = if is_leap_year(year) { 366.0 } else { 365.0 };
    f64::from(year) + f64::from(date.ordinal()) / days_in_year
}

/// Decimal year of the current UTC date
pub fn current_decimal_year() -> f64 {
    decimal_year(Utc::now().date_naive())
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
