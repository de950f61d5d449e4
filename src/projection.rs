//! # Wedge projection
//!
//! Maps sky position and redshift onto the plane of a "pie" diagram:
//!
//! ```text
//! θ = ra · π / 180
//! x = z · cos θ
//! y = z · sin θ
//! ```
//!
//! Redshift is the radial coordinate and right ascension the polar angle. Declination plays no
//! role, the plot is a projection of the whole declination range onto the equatorial plane.
//!
//! The projection is pure and element-wise: `n` rows in, `n` points out, in the same order, and
//! the same input always yields bit-identical output (`project_par` included).
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogRecord;
use crate::constants::{Degree, Radian, Redshift};
use crate::quality::JoinedRecord;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Anything that has a right ascension and a redshift.
pub trait SkyPosition {
    fn ra(&self) -> Degree;
    fn redshift(&self) -> Redshift;
}

impl SkyPosition for CatalogRecord {
    #[inline]
    fn ra(&self) -> Degree {
        self.ra
    }
    #[inline]
    fn redshift(&self) -> Redshift {
        self.redshift
    }
}

impl SkyPosition for JoinedRecord {
    #[inline]
    fn ra(&self) -> Degree {
        self.galaxy.ra
    }
    #[inline]
    fn redshift(&self) -> Redshift {
        self.galaxy.redshift
    }
}

/// Project a single `(ra, z)` pair.
#[inline]
pub fn wedge_point(ra: Degree, redshift: Redshift) -> Point2<f64> {
    let theta: Radian = ra.to_radians();
    let (sin, cos) = theta.sin_cos();
    Point2::new(redshift * cos, redshift * sin)
}

/// Project every row, preserving order.
///
/// # Example
///
/// ```rust
/// use desi_wedge::catalog::{CatalogRecord, CatalogTable};
/// use desi_wedge::projection::project;
///
/// let row = CatalogRecord { id: 1, ra: 0.0, dec: 0.0, redshift: 1.5, weight: None };
/// let table = CatalogTable::new("LRG", None, vec![row]).unwrap();
/// let points = project(&table);
/// assert_eq!((points[0].x, points[0].y), (1.5, 0.0));
/// ```
pub fn project<'a, T, I>(rows: I) -> Vec<Point2<f64>>
where
    T: SkyPosition + 'a,
    I: IntoIterator<Item = &'a T>,
{
    rows.into_iter()
        .map(|r| wedge_point(r.ra(), r.redshift()))
        .collect()
}

/// Parallel version of [`project`] over a slice, same output order.
#[cfg(feature = "parallel")]
pub fn project_par<T>(rows: &[T]) -> Vec<Point2<f64>>
where
    T: SkyPosition + Sync,
{
    rows.par_iter()
        .map(|r| wedge_point(r.ra(), r.redshift()))
        .collect()
}

/// A projected point with the scalar used to colour it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WedgeSample {
    pub x: f64,
    pub y: f64,
    pub color: f64,
}

/// Project the rows and colour each point by its redshift.
pub fn wedge_samples<'a, T, I>(rows: I) -> Vec<WedgeSample>
where
    T: SkyPosition + 'a,
    I: IntoIterator<Item = &'a T>,
{
    wedge_samples_by(rows, |r| r.redshift())
}

/// Project the rows and colour each point with `color`.
///
/// ```rust,no_run
/// # use desi_wedge::quality::{JoinedRecord, JoinedTable};
/// # use desi_wedge::projection::wedge_samples_by;
/// # let joined: JoinedTable = unimplemented!();
/// // colour a joined sample by detection significance
/// let samples = wedge_samples_by(&joined, |r: &JoinedRecord| r.snr);
/// ```
pub fn wedge_samples_by<'a, T, I, F>(rows: I, color: F) -> Vec<WedgeSample>
where
    T: SkyPosition + 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> f64,
{
    rows.into_iter()
        .map(|r| {
            let p = wedge_point(r.ra(), r.redshift());
            WedgeSample {
                x: p.x,
                y: p.y,
                color: color(r),
            }
        })
        .collect()
}

#[cfg(test)]
mod projection_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn record(id: i64, ra: f64, redshift: f64) -> CatalogRecord {
        CatalogRecord {
            id,
            ra,
            dec: 45.0,
            redshift,
            weight: None,
        }
    }

    #[test]
    fn test_cardinal_points() {
        let rows = [0.0, 90.0, 180.0, 270.0]
            .iter()
            .enumerate()
            .map(|(i, &ra)| record(i as i64, ra, 1.0))
            .collect::<Vec<_>>();
        let expected = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];
        for (p, (x, y)) in project(&rows).iter().zip(expected) {
            assert_abs_diff_eq!(p.x, x, epsilon = 1e-9);
            assert_abs_diff_eq!(p.y, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_radius_is_redshift() {
        for z in [0.5, 1.0, 1.5, 3.2] {
            let p = wedge_point(0.0, z);
            assert_eq!((p.x, p.y), (z, 0.0));
            let q = wedge_point(123.4, z);
            assert_abs_diff_eq!(q.coords.norm(), z, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_declination_is_ignored() {
        let mut a = record(1, 33.0, 0.8);
        let b = a;
        a.dec = -60.0;
        assert_eq!(project(&[a]), project(&[b]));
    }

    #[test]
    fn test_samples_color() {
        let rows = vec![record(1, 10.0, 0.3), record(2, 20.0, 0.6)];
        let samples = wedge_samples(&rows);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].color, 0.6);

        let by_id = wedge_samples_by(&rows, |r: &CatalogRecord| r.id as f64);
        assert_eq!(by_id[0].color, 1.0);
        assert_eq!((by_id[0].x, by_id[0].y), (samples[0].x, samples[0].y));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let rows = (0..10_000)
            .map(|i| record(i, (i as f64 * 0.037) % 360.0, 0.001 * i as f64))
            .collect::<Vec<_>>();
        assert_eq!(project_par(&rows), project(&rows));
    }
}
