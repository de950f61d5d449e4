//! # SFR versus line-flux density analysis
//!
//! Numeric side of the star-formation-rate / emission-flux density scatter plots: log-space
//! pairs, their Pearson correlation, and a 2-D occupancy grid that a plotting collaborator can
//! draw as a heat map.
//!
//! Only rows with a finite, positive SFR and flux enter the log-space sample.
use std::fmt;

use nalgebra::DMatrix;

use crate::emission::EmissionLine;
use crate::quality::JoinedTable;

/// Number of cells per axis of [`DensityGrid::from_pairs`] when none is given.
pub const DEFAULT_GRID_SIZE: usize = 50;

/// `(log10 SFR, log10 flux)` of every joined row with a calibrated SFR.
///
/// The SFR used is the one calibrated on the table's line ([`EmissionLine::sfr_of`]); lines
/// without a calibration yield an empty sample.
pub fn log_sfr_flux_pairs(joined: &JoinedTable) -> Vec<(f64, f64)> {
    let line: &EmissionLine = joined.line();
    joined
        .iter()
        .filter_map(|r| {
            let sfr = line.sfr_of(&r.emission)?;
            let pair = (sfr.log10(), r.emission.flux.log10());
            (pair.0.is_finite() && pair.1.is_finite()).then_some(pair)
        })
        .collect()
}

/// Pearson correlation coefficient of finite pairs.
///
/// Non-finite pairs are skipped. Returns `None` with fewer than two usable pairs or when one
/// coordinate has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let finite = || pairs.iter().filter(|(x, y)| x.is_finite() && y.is_finite());
    let n = finite().count();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let (mx, my) = finite().fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (mx, my) = (mx / nf, my / nf);

    let (sxy, sxx, syy) = finite().fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (x, y)| {
        let (dx, dy) = (x - mx, y - my);
        (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
    });
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}

/// Sample size and correlation of a density plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityStats {
    pub sample: usize,
    pub correlation: Option<f64>,
}

impl DensityStats {
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self {
            sample: pairs
                .iter()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .count(),
            correlation: pearson(pairs),
        }
    }
}

impl fmt::Display for DensityStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.correlation {
            Some(r) => write!(f, "Sample: {} galaxies, correlation r = {r:.3}", self.sample),
            None => write!(f, "Sample: {} galaxies, correlation undefined", self.sample),
        }
    }
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Counts of pairs on a regular grid.
///
/// `counts[(i, j)]` holds the pairs with `x` in the `i`-th column band and `y` in the `j`-th
/// row band. The upper edge of each extent is included in the last cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    pub x_extent: (f64, f64),
    pub y_extent: (f64, f64),
    pub counts: DMatrix<u32>,
}

impl DensityGrid {
    /// Bin finite pairs on a `size × size` grid spanning their own extent.
    ///
    /// Returns `None` when no pair is finite or `size` is zero.
    pub fn from_pairs(pairs: &[(f64, f64)], size: usize) -> Option<Self> {
        let finite: Vec<(f64, f64)> = pairs
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        if finite.is_empty() || size == 0 {
            return None;
        }

        let x_extent = extent(finite.iter().map(|p| p.0));
        let y_extent = extent(finite.iter().map(|p| p.1));
        Some(Self::bin(&finite, size, x_extent, y_extent))
    }

    /// Bin pairs on a `size × size` grid over a fixed extent, so that grids built from
    /// different samples share their axes.
    ///
    /// Arguments
    /// -----------------
    /// * `pairs` – `(x, y)` values, non-finite ones are skipped.
    /// * `size` – number of cells per axis.
    /// * `x_extent`, `y_extent` – inclusive `(min, max)` bounds; pairs outside are ignored.
    ///
    /// Return
    /// ----------
    /// * `None` when `size` is zero or an extent is not finite with `min ≤ max`.
    /// * Otherwise the grid, possibly with no count at all.
    pub fn from_pairs_in(
        pairs: &[(f64, f64)],
        size: usize,
        x_extent: (f64, f64),
        y_extent: (f64, f64),
    ) -> Option<Self> {
        let valid = |(lo, hi): (f64, f64)| lo.is_finite() && hi.is_finite() && lo <= hi;
        if size == 0 || !valid(x_extent) || !valid(y_extent) {
            return None;
        }

        let inside: Vec<(f64, f64)> = pairs
            .iter()
            .copied()
            .filter(|&(x, y)| {
                (x_extent.0..=x_extent.1).contains(&x) && (y_extent.0..=y_extent.1).contains(&y)
            })
            .collect();
        Some(Self::bin(&inside, size, x_extent, y_extent))
    }

    fn bin(pairs: &[(f64, f64)], size: usize, x_extent: (f64, f64), y_extent: (f64, f64)) -> Self {
        let cell = |v: f64, (lo, hi): (f64, f64)| -> usize {
            let width = hi - lo;
            if width <= 0.0 {
                return 0;
            }
            (((v - lo) / width * size as f64) as usize).min(size - 1)
        };

        let mut counts = DMatrix::<u32>::zeros(size, size);
        for &(x, y) in pairs {
            counts[(cell(x, x_extent), cell(y, y_extent))] += 1;
        }

        Self {
            x_extent,
            y_extent,
            counts,
        }
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}
