//! # Emission-line quality cuts and the galaxy/emission join
//!
//! A measurement is **admissible** when it is a positive, finite detection above a
//! signal-to-noise threshold:
//!
//! ```text
//! snr = flux · √ivar
//! admissible ⇔ snr > min_snr ∧ flux > 0 ∧ ivar > 0 ∧ flux, ivar finite
//! ```
//!
//! [`join`] applies this cut and performs an inner join with a galaxy table on the target
//! identifier. The output follows the galaxy table order; when an id has several admissible
//! measurements, the first one in emission-table order is used.
//!
//! Empty inputs and joins without any match are ordinary outcomes and produce an empty
//! [`JoinedTable`].
use std::cmp::Ordering::{Equal, Greater};
use std::collections::HashMap;
use std::fmt;

use ahash::RandomState;
use log::info;

use crate::catalog::{CatalogRecord, CatalogTable};
use crate::catalog_errors::CatalogError;
use crate::constants::{TargetId, DEFAULT_MIN_SNR};
use crate::emission::{EmissionLine, EmissionRecord, EmissionTable};

/// Parameters of the quality cut.
///
/// * `min_snr` – strict lower bound on `flux · √ivar` (default 3.0, finite and ≥ 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityParams {
    pub min_snr: f64,
}

impl QualityParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QualityParamsBuilder {
        QualityParamsBuilder::new()
    }
}

impl Default for QualityParams {
    fn default() -> Self {
        QualityParams {
            min_snr: DEFAULT_MIN_SNR,
        }
    }
}

/// Builder for [`QualityParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct QualityParamsBuilder {
    params: QualityParams,
}

impl QualityParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: QualityParams::default(),
        }
    }

    pub fn min_snr(mut self, v: f64) -> Self {
        self.params.min_snr = v;
        self
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Finalize the builder.
    ///
    /// Returns
    /// -----------------
    /// * `Err(CatalogError::InvalidParameter)` unless `min_snr` is finite and non-negative.
    pub fn build(self) -> Result<QualityParams, CatalogError> {
        let min_snr = self.params.min_snr;
        if !min_snr.is_finite() || !Self::ge0(min_snr) {
            return Err(CatalogError::InvalidParameter(format!(
                "min_snr must be finite and >= 0, got {min_snr}"
            )));
        }
        Ok(self.params)
    }
}

impl fmt::Display for QualityParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Quality Cut Parameters")?;
            writeln!(f, "----------------------")?;
            writeln!(
                f,
                "  min_snr = {:.3}                 # Minimum flux·√ivar of a detection",
                self.min_snr
            )
        } else {
            write!(f, "QualityParams(min_snr={:.2})", self.min_snr)
        }
    }
}

/// Signal-to-noise ratio of a flux measurement, `flux · √ivar`.
#[inline]
pub fn signal_to_noise(flux: f64, inverse_variance: f64) -> f64 {
    flux * inverse_variance.sqrt()
}

/// Admissibility of one measurement against a threshold.
///
/// NaN or infinite inputs are never admissible, whatever the threshold.
#[inline]
pub fn is_admissible(flux: f64, inverse_variance: f64, min_snr: f64) -> bool {
    flux.is_finite()
        && inverse_variance.is_finite()
        && flux > 0.0
        && inverse_variance > 0.0
        && signal_to_noise(flux, inverse_variance) > min_snr
}

/// Keep the admissible measurements of a table, in order.
pub fn quality_filter(emissions: &EmissionTable, params: &QualityParams) -> EmissionTable {
    let rows: Vec<EmissionRecord> = emissions
        .iter()
        .filter(|r| is_admissible(r.flux, r.inverse_variance, params.min_snr))
        .copied()
        .collect();
    info!(
        "{}: {} of {} measurements pass snr > {}",
        emissions.line(),
        rows.len(),
        emissions.len(),
        params.min_snr
    );
    EmissionTable::new(emissions.line().clone(), rows)
}

/// A galaxy with its admissible emission-line measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRecord {
    pub galaxy: CatalogRecord,
    pub emission: EmissionRecord,
    /// `emission.flux · √emission.inverse_variance`
    pub snr: f64,
}

impl JoinedRecord {
    pub fn id(&self) -> TargetId {
        self.galaxy.id
    }
}

/// Result of [`join`]: galaxies with a detection, in galaxy-table order.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTable {
    category: String,
    region: Option<String>,
    line: EmissionLine,
    rows: Vec<JoinedRecord>,
}

impl JoinedTable {
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Sky-region tag carried over from the galaxy table.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn line(&self) -> &EmissionLine {
        &self.line
    }

    pub fn rows(&self) -> &[JoinedRecord] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JoinedRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> IntoIterator for &'a JoinedTable {
    type Item = &'a JoinedRecord;
    type IntoIter = std::slice::Iter<'a, JoinedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Quality-cut the emissions and inner-join them with the galaxies on `id`.
///
/// Arguments
/// -----------------
/// * `galaxies` – output of [`load_catalog`](crate::loader::load_catalog).
/// * `emissions` – measurements of one line, possibly several per id.
/// * `params` – the signal-to-noise threshold.
///
/// Return
/// ----------
/// * A [`JoinedTable`] whose ids are present in both inputs, each row carrying a measurement
///   that passes [`is_admissible`]. Possibly empty.
///
/// See also
/// ------------
/// * [`quality_filter`] – The cut alone.
/// * [`crate::projection::project`] – Accepts the joined rows directly.
pub fn join(
    galaxies: &CatalogTable,
    emissions: &EmissionTable,
    params: &QualityParams,
) -> JoinedTable {
    let mut best: HashMap<TargetId, (EmissionRecord, f64), RandomState> =
        HashMap::with_capacity_and_hasher(emissions.len(), RandomState::default());
    for record in emissions {
        if is_admissible(record.flux, record.inverse_variance, params.min_snr) {
            best.entry(record.id).or_insert((
                *record,
                signal_to_noise(record.flux, record.inverse_variance),
            ));
        }
    }

    let rows: Vec<JoinedRecord> = galaxies
        .iter()
        .filter_map(|galaxy| {
            best.get(&galaxy.id).map(|&(emission, snr)| JoinedRecord {
                galaxy: *galaxy,
                emission,
                snr,
            })
        })
        .collect();

    info!(
        "joined {} {} galaxies with {} admissible {} measurements: {} matches",
        galaxies.len(),
        galaxies.category(),
        best.len(),
        emissions.line(),
        rows.len()
    );

    JoinedTable {
        category: galaxies.category().to_string(),
        region: galaxies.region().map(str::to_string),
        line: emissions.line().clone(),
        rows,
    }
}

#[cfg(test)]
mod quality_test {
    use super::*;
    use approx::assert_relative_eq;

    fn galaxy(id: TargetId) -> CatalogRecord {
        CatalogRecord {
            id,
            ra: 150.0,
            dec: 2.0,
            redshift: 0.1 * id as f64,
            weight: None,
        }
    }

    fn emission(id: TargetId, flux: f64, inverse_variance: f64) -> EmissionRecord {
        EmissionRecord {
            id,
            flux,
            inverse_variance,
            sfr_halpha: None,
            sfr_oii: None,
            stellar_mass: None,
        }
    }

    #[test]
    fn test_signal_to_noise() {
        assert_relative_eq!(signal_to_noise(10.0, 4.0), 20.0);
        assert_relative_eq!(signal_to_noise(3.0, 1.0), 3.0);
    }

    #[test]
    fn test_admissibility_edges() {
        // strict threshold
        assert!(!is_admissible(3.0, 1.0, 3.0));
        assert!(is_admissible(3.0001, 1.0, 3.0));
        assert!(!is_admissible(-10.0, 1.0, 0.0));
        assert!(!is_admissible(10.0, 0.0, 0.0));
        assert!(!is_admissible(f64::NAN, 1.0, 0.0));
        assert!(!is_admissible(10.0, f64::INFINITY, 0.0));
    }

    #[test]
    fn test_params_validation() {
        assert_eq!(QualityParams::default().min_snr, 3.0);
        assert!(QualityParams::builder().min_snr(-1.0).build().is_err());
        assert!(QualityParams::builder().min_snr(f64::NAN).build().is_err());
        assert!(QualityParams::builder().min_snr(f64::INFINITY).build().is_err());
        assert_eq!(
            QualityParams::builder().min_snr(0.0).build().unwrap().min_snr,
            0.0
        );
        assert_eq!(QualityParams::default().to_string(), "QualityParams(min_snr=3.00)");
        assert!(format!("{:#}", QualityParams::default()).contains("min_snr = 3.000"));
    }

    #[test]
    fn test_join_order_and_first_admissible() {
        let galaxies =
            CatalogTable::new("ELG", None, vec![galaxy(3), galaxy(1), galaxy(2)]).unwrap();
        let emissions = EmissionTable::new(
            EmissionLine::Oii3727,
            vec![
                emission(1, 1.0, 1.0),  // below threshold
                emission(1, 10.0, 1.0), // first admissible for id 1
                emission(1, 20.0, 1.0),
                emission(3, 5.0, 4.0),
                emission(7, 50.0, 1.0), // no galaxy
            ],
        );

        let joined = join(&galaxies, &emissions, &QualityParams::default());
        assert_eq!(joined.iter().map(|r| r.id()).collect::<Vec<_>>(), [3, 1]);
        assert_relative_eq!(joined.rows()[0].snr, 10.0);
        assert_eq!(joined.rows()[1].emission.flux, 10.0);
        assert_eq!(joined.category(), "ELG");
        assert_eq!(joined.line(), &EmissionLine::Oii3727);
        assert_eq!(joined.region(), None);
    }

    #[test]
    fn test_join_keeps_region() {
        let galaxies =
            CatalogTable::new("LRG", Some("SGC".into()), vec![galaxy(1), galaxy(2)]).unwrap();
        let emissions = EmissionTable::new(EmissionLine::Halpha, vec![emission(2, 9.0, 1.0)]);
        let joined = join(&galaxies, &emissions, &QualityParams::default());
        assert_eq!(joined.region(), Some("SGC"));
        assert_eq!(joined.len(), 1);
    }

    #[test]
    fn test_join_empty_inputs() {
        let galaxies = CatalogTable::new("LRG", None, vec![galaxy(1)]).unwrap();
        let none = EmissionTable::empty(EmissionLine::Halpha);
        assert!(join(&galaxies, &none, &QualityParams::default()).is_empty());

        let emissions = EmissionTable::new(EmissionLine::Halpha, vec![emission(1, 9.0, 1.0)]);
        assert!(join(&CatalogTable::empty("LRG"), &emissions, &QualityParams::default()).is_empty());
    }

    #[test]
    fn test_quality_filter() {
        let emissions = EmissionTable::new(
            EmissionLine::Halpha,
            vec![emission(1, 1.0, 1.0), emission(2, 4.0, 1.0), emission(3, 0.0, 9.0)],
        );
        let kept = quality_filter(&emissions, &QualityParams::default());
        assert_eq!(kept.iter().map(|r| r.id).collect::<Vec<_>>(), [2]);
        assert_eq!(kept.line(), &EmissionLine::Halpha);
    }
}
