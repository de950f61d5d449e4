//! Descriptive statistics of a catalog table.
//!
//! The statistics reported next to a wedge plot: sample size, redshift mean and standard
//! deviation (population, `ddof = 0`), redshift range, and the RA/Dec extent of the sample.
use std::fmt;

use itertools::{Itertools, MinMaxResult};

use super::CatalogTable;
use crate::constants::{Degree, Redshift};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogSummary {
    pub count: usize,
    pub redshift_mean: Redshift,
    pub redshift_std: Redshift,
    pub redshift_range: (Redshift, Redshift),
    pub ra_range: (Degree, Degree),
    pub dec_range: (Degree, Degree),
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    match values.minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
    }
}

impl CatalogTable {
    /// Summarize the table, `None` when it is empty.
    pub fn summary(&self) -> Option<CatalogSummary> {
        let count = self.len();
        if count == 0 {
            return None;
        }

        let n = count as f64;
        let redshift_mean = self.iter().map(|r| r.redshift).sum::<f64>() / n;
        let variance = self
            .iter()
            .map(|r| (r.redshift - redshift_mean).powi(2))
            .sum::<f64>()
            / n;

        Some(CatalogSummary {
            count,
            redshift_mean,
            redshift_std: variance.sqrt(),
            redshift_range: range(self.iter().map(|r| r.redshift))?,
            ra_range: range(self.iter().map(|r| r.ra))?,
            dec_range: range(self.iter().map(|r| r.dec))?,
        })
    }
}

impl fmt::Display for CatalogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Galaxy sample statistics")?;
            writeln!(f, "------------------------")?;
            writeln!(f, "  Total galaxies : {}", self.count)?;
            writeln!(
                f,
                "  Redshift range : {:.3} - {:.3}",
                self.redshift_range.0, self.redshift_range.1
            )?;
            writeln!(
                f,
                "  Mean redshift  : {:.3} ± {:.3}",
                self.redshift_mean, self.redshift_std
            )?;
            writeln!(
                f,
                "  RA range       : {:.1}° - {:.1}°",
                self.ra_range.0, self.ra_range.1
            )?;
            write!(
                f,
                "  Dec range      : {:.1}° - {:.1}°",
                self.dec_range.0, self.dec_range.1
            )
        } else {
            write!(
                f,
                "{} galaxies, z ∈ [{:.3}, {:.3}] (mean {:.3} ± {:.3}), RA ∈ [{:.1}°, {:.1}°], Dec ∈ [{:.1}°, {:.1}°]",
                self.count,
                self.redshift_range.0,
                self.redshift_range.1,
                self.redshift_mean,
                self.redshift_std,
                self.ra_range.0,
                self.ra_range.1,
                self.dec_range.0,
                self.dec_range.1,
            )
        }
    }
}
