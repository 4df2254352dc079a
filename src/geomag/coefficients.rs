//! Gauss coefficient tables and the sources they are loaded from
//!
//! A table is either the compiled-in WMM-2020 set or parsed from the
//! row-oriented `WMM.COF` text format:
//!
//! ```text
//!     2020.0            WMM-2020        12/10/2019
//!   1  0  -29404.5       0.0        6.7        0.0
//!   1  1   -1450.7    4652.9        7.7      -25.1
//!   ...
//! 999999999999999999999999999999999999999999999999
//! ```
//!
//! The header carries the epoch, model name and release date; each row is
//! `n m g h dg dh`; the first row whose leading value is `>= 9999` ends the
//! table. Parsing is token based, so line layout does not matter.

use crate::error::{CoefficientError, CoefficientResult};
use log::warn;
use std::path::PathBuf;

/// Highest degree and order of the spherical harmonic expansion
pub const MAX_DEGREE: usize = 12;

/// Leading values at or above this mark the end of a `WMM.COF` table
pub const END_MARKER: f64 = 9999.0;

/// Epoch of the embedded coefficient table
pub const EMBEDDED_EPOCH: f64 = 2020.0;

/// One Gauss coefficient row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussCoefficient {
    /// Degree
    pub n: usize,
    /// Order
    pub m: usize,
    /// Main field g(n,m) in nT
    pub g: f64,
    /// Main field h(n,m) in nT
    pub h: f64,
    /// Secular variation of g in nT/year
    pub dg: f64,
    /// Secular variation of h in nT/year
    pub dh: f64,
}

impl GaussCoefficient {
    /// Create a coefficient row
    pub const fn new(n: usize, m: usize, g: f64, h: f64, dg: f64, dh: f64) -> Self {
        Self { n, m, g, h, dg, dh }
    }
}

/// A complete set of Gauss coefficients for one model epoch
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    epoch: f64,
    model_name: String,
    release_date: String,
    coefficients: Vec<GaussCoefficient>,
}

impl CoefficientTable {
    /// Build a table, checking every row is within degree/order bounds
    pub fn new(
        epoch: f64,
        model_name: impl Into<String>,
        release_date: impl Into<String>,
        coefficients: Vec<GaussCoefficient>,
    ) -> CoefficientResult<Self> {
        if !epoch.is_finite() {
            return Err(CoefficientError::InvalidNumber {
                token: epoch.to_string(),
                position: 0,
            });
        }
        if coefficients.is_empty() {
            return Err(CoefficientError::NoCoefficients);
        }
        if let Some(bad) = coefficients
            .iter()
            .find(|c| c.n == 0 || c.n > MAX_DEGREE || c.m > c.n)
        {
            return Err(CoefficientError::DegreeOutOfRange {
                n: bad.n as i64,
                m: bad.m as i64,
                max: MAX_DEGREE,
            });
        }

        Ok(Self {
            epoch,
            model_name: model_name.into(),
            release_date: release_date.into(),
            coefficients,
        })
    }

    /// The compiled-in WMM-2020 table
    pub fn embedded() -> Self {
        Self {
            epoch: EMBEDDED_EPOCH,
            model_name: "WMM-2020".to_string(),
            release_date: "12/10/2019".to_string(),
            coefficients: WMM2020.to_vec(),
        }
    }

    /// Parse `WMM.COF` formatted text
    ///
    /// # Example
    /// ```
    /// use compass_heading::CoefficientTable;
    ///
    /// let text = "2025.0 WMM-2025 11/13/2024\n 1 0 -29351.8 0.0 12.0 0.0\n9999\n";
    /// let table = CoefficientTable::parse(text).unwrap();
    /// assert_eq!(table.epoch(), 2025.0);
    /// assert_eq!(table.coefficients().len(), 1);
    /// ```
    pub fn parse(text: &str) -> CoefficientResult<Self> {
        let mut tokens = text.split_whitespace().enumerate();

        let (position, epoch_token) = tokens.next().ok_or(CoefficientError::Empty)?;
        let epoch = parse_number(epoch_token, position)?;
        let (_, model_name) = tokens
            .next()
            .ok_or(CoefficientError::MissingHeader("model name"))?;
        let (_, release_date) = tokens
            .next()
            .ok_or(CoefficientError::MissingHeader("release date"))?;

        let mut coefficients = Vec::new();
        loop {
            let (row, lead) = tokens.next().ok_or(CoefficientError::MissingTerminator)?;
            let lead_value = parse_number(lead, row)?;
            if lead_value >= END_MARKER {
                break;
            }

            let n = parse_index(lead_value, lead, row)?;
            let (m_position, m_token) = next_token(&mut tokens, row)?;
            let m = parse_index(parse_number(m_token, m_position)?, m_token, m_position)?;
            let g = next_number(&mut tokens, row)?;
            let h = next_number(&mut tokens, row)?;
            let dg = next_number(&mut tokens, row)?;
            let dh = next_number(&mut tokens, row)?;

            if n < 1 || n > MAX_DEGREE as i64 || m < 0 {
                return Err(CoefficientError::DegreeOutOfRange {
                    n,
                    m,
                    max: MAX_DEGREE,
                });
            }
            if m > n {
                warn!("skipping coefficient row with order {} above degree {}", m, n);
                continue;
            }

            coefficients.push(GaussCoefficient::new(n as usize, m as usize, g, h, dg, dh));
        }

        Self::new(epoch, model_name, release_date, coefficients)
    }

    /// Epoch (decimal year) the coefficients are referenced to
    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    /// Model name from the header, e.g. `WMM-2020`
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Release date from the header
    pub fn release_date(&self) -> &str {
        &self.release_date
    }

    /// Coefficient rows in load order
    pub fn coefficients(&self) -> &[GaussCoefficient] {
        &self.coefficients
    }
}

impl Default for CoefficientTable {
    fn default() -> Self {
        Self::embedded()
    }
}

fn parse_number(token: &str, position: usize) -> CoefficientResult<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CoefficientError::InvalidNumber {
            token: token.to_string(),
            position,
        })
}

fn parse_index(value: f64, token: &str, position: usize) -> CoefficientResult<i64> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(CoefficientError::InvalidNumber {
            token: token.to_string(),
            position,
        })
    }
}

fn next_token<'a>(
    tokens: &mut impl Iterator<Item = (usize, &'a str)>,
    row: usize,
) -> CoefficientResult<(usize, &'a str)> {
    tokens
        .next()
        .ok_or(CoefficientError::TruncatedRow { position: row })
}

fn next_number<'a>(
    tokens: &mut impl Iterator<Item = (usize, &'a str)>,
    row: usize,
) -> CoefficientResult<f64> {
    let (position, token) = next_token(tokens, row)?;
    parse_number(token, position)
}

/// Fallible provider of a coefficient table
pub trait CoefficientSource {
    /// Load the table
    fn load(&self) -> CoefficientResult<CoefficientTable>;
}

/// The compiled-in WMM-2020 coefficients; never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCoefficients;

impl CoefficientSource for EmbeddedCoefficients {
    fn load(&self) -> CoefficientResult<CoefficientTable> {
        Ok(CoefficientTable::embedded())
    }
}

/// `WMM.COF` text already held in memory
#[derive(Debug, Clone, Copy)]
pub struct CofText<'a>(pub &'a str);

impl CoefficientSource for CofText<'_> {
    fn load(&self) -> CoefficientResult<CoefficientTable> {
        CoefficientTable::parse(self.0)
    }
}

/// `WMM.COF` file on disk
#[derive(Debug, Clone)]
pub struct CofFile {
    path: PathBuf,
}

impl CofFile {
    /// Source reading the given path at load time
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path the table is read from
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl CoefficientSource for CofFile {
    fn load(&self) -> CoefficientResult<CoefficientTable> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| CoefficientError::Io {
            path: self.path.clone(),
            source,
        })?;
        CoefficientTable::parse(&text)
    }
}

/// WMM-2020 (epoch 2020.0, released 12/10/2019)
const WMM2020: [GaussCoefficient; 90] = [
    GaussCoefficient::new(1, 0, -29404.5, 0.0, 6.7, 0.0),
    GaussCoefficient::new(1, 1, -1450.7, 4652.9, 7.7, -25.1),
    GaussCoefficient::new(2, 0, -2500.0, 0.0, -11.5, 0.0),
    GaussCoefficient::new(2, 1, 2982.0, -2991.6, -7.1, -30.2),
    GaussCoefficient::new(2, 2, 1676.8, -734.8, -2.2, -23.9),
    GaussCoefficient::new(3, 0, 1363.9, 0.0, 2.8, 0.0),
    GaussCoefficient::new(3, 1, -2381.0, -82.2, -6.2, 5.7),
    GaussCoefficient::new(3, 2, 1236.2, 241.8, 3.4, -1.0),
    GaussCoefficient::new(3, 3, 525.7, -542.9, -12.2, 1.1),
    GaussCoefficient::new(4, 0, 903.1, 0.0, -1.1, 0.0),
    GaussCoefficient::new(4, 1, 809.4, 282.0, -1.6, 0.2),
    GaussCoefficient::new(4, 2, 86.2, -158.4, -6.0, 6.9),
    GaussCoefficient::new(4, 3, -309.4, 199.8, 5.4, 3.7),
    GaussCoefficient::new(4, 4, 47.9, -350.1, -5.5, -5.6),
    GaussCoefficient::new(5, 0, -234.4, 0.0, -0.3, 0.0),
    GaussCoefficient::new(5, 1, 363.1, 47.7, 0.6, 0.1),
    GaussCoefficient::new(5, 2, 187.8, 208.4, -0.7, 2.5),
    GaussCoefficient::new(5, 3, -140.7, -121.3, 0.1, -0.9),
    GaussCoefficient::new(5, 4, -151.2, 32.2, 1.2, 3.0),
    GaussCoefficient::new(5, 5, 13.7, 99.1, 1.0, 0.5),
    GaussCoefficient::new(6, 0, 65.9, 0.0, -0.6, 0.0),
    GaussCoefficient::new(6, 1, 65.6, -19.1, -0.4, 0.1),
    GaussCoefficient::new(6, 2, 73.0, 25.0, 0.5, -1.8),
    GaussCoefficient::new(6, 3, -121.5, 52.7, 1.4, -1.4),
    GaussCoefficient::new(6, 4, -36.2, -64.4, -1.4, 0.9),
    GaussCoefficient::new(6, 5, 13.5, 9.0, 0.0, 0.1),
    GaussCoefficient::new(6, 6, -64.7, 68.1, 0.8, 1.0),
    GaussCoefficient::new(7, 0, 80.6, 0.0, -0.1, 0.0),
    GaussCoefficient::new(7, 1, -76.8, -51.4, -0.3, 0.5),
    GaussCoefficient::new(7, 2, -8.3, -16.8, -0.1, 0.6),
    GaussCoefficient::new(7, 3, 56.5, 2.3, 0.7, -0.7),
    GaussCoefficient::new(7, 4, 15.8, 23.5, 0.2, -0.2),
    GaussCoefficient::new(7, 5, 6.4, -2.2, -0.5, -1.2),
    GaussCoefficient::new(7, 6, -7.2, -27.2, -0.8, 0.2),
    GaussCoefficient::new(7, 7, 9.8, -1.9, 1.0, 0.3),
    GaussCoefficient::new(8, 0, 23.6, 0.0, -0.1, 0.0),
    GaussCoefficient::new(8, 1, 9.8, 8.4, 0.1, -0.3),
    GaussCoefficient::new(8, 2, -17.5, -15.3, -0.1, 0.7),
    GaussCoefficient::new(8, 3, -0.4, 12.8, 0.5, -0.2),
    GaussCoefficient::new(8, 4, -21.1, -11.8, -0.1, 0.5),
    GaussCoefficient::new(8, 5, 15.3, 14.9, 0.4, -0.3),
    GaussCoefficient::new(8, 6, 13.7, 3.6, 0.5, -0.5),
    GaussCoefficient::new(8, 7, -16.5, -6.9, 0.0, 0.4),
    GaussCoefficient::new(8, 8, -0.3, 2.8, 0.4, 0.1),
    GaussCoefficient::new(9, 0, 5.0, 0.0, -0.1, 0.0),
    GaussCoefficient::new(9, 1, 8.2, -23.3, -0.2, -0.3),
    GaussCoefficient::new(9, 2, 2.9, 11.1, 0.0, 0.2),
    GaussCoefficient::new(9, 3, -1.4, 9.8, 0.4, -0.4),
    GaussCoefficient::new(9, 4, -1.1, -5.1, -0.3, 0.4),
    GaussCoefficient::new(9, 5, -13.3, -6.2, 0.0, 0.1),
    GaussCoefficient::new(9, 6, 1.1, 7.8, 0.3, 0.0),
    GaussCoefficient::new(9, 7, 8.9, 0.4, 0.0, -0.2),
    GaussCoefficient::new(9, 8, -9.3, -1.5, 0.0, 0.5),
    GaussCoefficient::new(9, 9, -11.9, 9.7, -0.4, 0.2),
    GaussCoefficient::new(10, 0, -1.9, 0.0, 0.0, 0.0),
    GaussCoefficient::new(10, 1, -6.2, 3.4, 0.0, 0.0),
    GaussCoefficient::new(10, 2, -0.1, -0.2, 0.0, 0.1),
    GaussCoefficient::new(10, 3, 1.7, 3.5, 0.2, -0.3),
    GaussCoefficient::new(10, 4, -0.9, 4.8, -0.1, 0.1),
    GaussCoefficient::new(10, 5, 0.6, -8.6, -0.2, -0.2),
    GaussCoefficient::new(10, 6, -0.9, -0.1, 0.0, 0.1),
    GaussCoefficient::new(10, 7, 1.9, -4.2, -0.1, 0.0),
    GaussCoefficient::new(10, 8, 1.4, -3.4, -0.2, -0.1),
    GaussCoefficient::new(10, 9, -2.4, -0.1, -0.1, 0.2),
    GaussCoefficient::new(10, 10, -3.9, -8.8, 0.0, 0.0),
    GaussCoefficient::new(11, 0, 3.0, 0.0, 0.0, 0.0),
    GaussCoefficient::new(11, 1, -1.4, 0.0, -0.1, 0.0),
    GaussCoefficient::new(11, 2, -2.5, 2.6, 0.0, 0.1),
    GaussCoefficient::new(11, 3, 2.4, -0.5, 0.0, 0.0),
    GaussCoefficient::new(11, 4, -0.9, -0.4, 0.0, 0.2),
    GaussCoefficient::new(11, 5, 0.3, 0.6, -0.1, 0.0),
    GaussCoefficient::new(11, 6, -0.7, -0.2, 0.0, 0.0),
    GaussCoefficient::new(11, 7, -0.1, -1.7, 0.0, 0.1),
    GaussCoefficient::new(11, 8, 1.4, -1.6, -0.1, 0.0),
    GaussCoefficient::new(11, 9, -0.6, -3.0, -0.1, -0.1),
    GaussCoefficient::new(11, 10, 0.2, -2.0, -0.1, 0.0),
    GaussCoefficient::new(11, 11, 3.1, -2.6, -0.1, 0.0),
    GaussCoefficient::new(12, 0, -2.0, 0.0, 0.0, 0.0),
    GaussCoefficient::new(12, 1, -0.1, -1.2, 0.0, 0.0),
    GaussCoefficient::new(12, 2, 0.5, 0.5, 0.0, 0.0),
    GaussCoefficient::new(12, 3, 1.3, 1.3, 0.0, -0.1),
    GaussCoefficient::new(12, 4, -1.2, -1.8, 0.0, 0.1),
    GaussCoefficient::new(12, 5, 0.7, 0.1, 0.0, 0.0),
    GaussCoefficient::new(12, 6, 0.3, 0.7, 0.0, 0.0),
    GaussCoefficient::new(12, 7, 0.5, -0.1, 0.0, 0.0),
    GaussCoefficient::new(12, 8, -0.2, 0.6, 0.0, 0.1),
    GaussCoefficient::new(12, 9, -0.5, 0.2, 0.0, 0.0),
    GaussCoefficient::new(12, 10, 0.1, -0.9, 0.0, 0.0),
    GaussCoefficient::new(12, 11, -1.1, 0.0, 0.0, 0.0),
    GaussCoefficient::new(12, 12, -0.3, 0.5, -0.1, -0.1),
];

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_TABLE: &str = "
    2025.0            WMM-2025        11/13/2024
  1  0  -29351.8       0.0       12.0        0.0
  1  1   -1410.8    4545.4        9.7      -21.5
  2  0   -2556.6       0.0      -11.6        0.0
999999999999999999999999999999999999999999999999
999999999999999999999999999999999999999999999999
";

    #[test]
    fn test_embedded_table_shape() {
        let table = CoefficientTable::embedded();
        assert_eq!(table.epoch(), 2020.0);
        assert_eq!(table.model_name(), "WMM-2020");

        // every (n, m) with 1 <= n <= 12, 0 <= m <= n exactly once
        let rows = table.coefficients();
        assert_eq!(rows.len(), (2..=MAX_DEGREE + 1).sum::<usize>());
        for n in 1..=MAX_DEGREE {
            for m in 0..=n {
                assert_eq!(rows.iter().filter(|c| c.n == n && c.m == m).count(), 1);
            }
        }
        assert!(rows.iter().filter(|c| c.m == 0).all(|c| c.h == 0.0 && c.dh == 0.0));
    }

    #[test]
    fn test_parse_small_table() {
        let table = CoefficientTable::parse(SMALL_TABLE).unwrap();
        assert_eq!(table.epoch(), 2025.0);
        assert_eq!(table.model_name(), "WMM-2025");
        assert_eq!(table.release_date(), "11/13/2024");
        assert_eq!(table.coefficients().len(), 3);
        assert_eq!(
            table.coefficients()[1],
            GaussCoefficient::new(1, 1, -1410.8, 4545.4, 9.7, -21.5)
        );
    }

    #[test]
    fn test_parse_ignores_line_layout() {
        let flat = "2025.0 WMM-2025 11/13/2024 1 0 -29351.8 0.0 12.0 0.0 9999";
        let table = CoefficientTable::parse(flat).unwrap();
        assert_eq!(table.coefficients().len(), 1);
    }

    #[test]
    fn test_parse_skips_order_above_degree() {
        let text = "2020.0 X 1/1/2020 1 0 1.0 0.0 0.0 0.0 1 2 5.0 5.0 0.0 0.0 9999";
        let table = CoefficientTable::parse(text).unwrap();
        assert_eq!(table.coefficients().len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(CoefficientTable::parse("   \n"), Err(CoefficientError::Empty)));
        assert!(matches!(
            CoefficientTable::parse("2020.0"),
            Err(CoefficientError::MissingHeader("model name"))
        ));
        assert!(matches!(
            CoefficientTable::parse("2020.0 WMM-2020 12/10/2019 1 0 -29404.5 0.0 6.7 0.0"),
            Err(CoefficientError::MissingTerminator)
        ));
        assert!(matches!(
            CoefficientTable::parse("2020.0 WMM-2020 12/10/2019 1 0 -29404.5 0.0"),
            Err(CoefficientError::TruncatedRow { .. })
        ));
        assert!(matches!(
            CoefficientTable::parse("2020.0 WMM-2020 12/10/2019 1 0 abc 0.0 6.7 0.0 9999"),
            Err(CoefficientError::InvalidNumber { position: 5, .. })
        ));
        assert!(matches!(
            CoefficientTable::parse("2020.0 WMM-2020 12/10/2019 13 0 1.0 0.0 0.0 0.0 9999"),
            Err(CoefficientError::DegreeOutOfRange { n: 13, .. })
        ));
        assert!(matches!(
            CoefficientTable::parse("2020.0 WMM-2020 12/10/2019 1.5 0 1.0 0.0 0.0 0.0 9999"),
            Err(CoefficientError::InvalidNumber { .. })
        ));
        assert!(matches!(
            CoefficientTable::parse("2020.0 WMM-2020 12/10/2019 9999"),
            Err(CoefficientError::NoCoefficients)
        ));
        assert!(matches!(
            CoefficientTable::parse("NaN WMM-2020 12/10/2019 1 0 1.0 0.0 0.0 0.0 9999"),
            Err(CoefficientError::InvalidNumber { position: 0, .. })
        ));
    }

    #[test]
    fn test_sources() {
        assert_eq!(EmbeddedCoefficients.load().unwrap(), CoefficientTable::embedded());
        assert_eq!(CofText(SMALL_TABLE).load().unwrap().epoch(), 2025.0);

        let missing = CofFile::new("/nonexistent/WMM.COF").load();
        assert!(matches!(missing, Err(CoefficientError::Io { .. })));
    }

    #[test]
    fn test_table_validation() {
        let bad = vec![GaussCoefficient::new(3, 4, 0.0, 0.0, 0.0, 0.0)];
        assert!(CoefficientTable::new(2020.0, "x", "y", bad).is_err());
        assert!(CoefficientTable::new(2020.0, "x", "y", Vec::new()).is_err());
        assert!(CoefficientTable::new(f64::INFINITY, "x", "y", WMM2020.to_vec()).is_err());
    }
}
