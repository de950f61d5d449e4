//! # Emission-line measurements
//!
//! FastSpecFit value-added catalogs carry, for every fitted target, one flux and one inverse
//! variance per emission line (`{LINE}_FLUX`, `{LINE}_FLUX_IVAR`) plus a handful of derived
//! physical quantities. This module maps those raw columns onto [`EmissionRecord`]s.
//!
//! FastSpecFit catalogs are split by HEALPix pixel; a sample is usually assembled by reading
//! several files, keeping the targets of interest with [`EmissionTable::select_targets`], and
//! merging the pieces with [`EmissionTable::concat`].
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use ahash::RandomState;
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog_errors::CatalogError;
use crate::constants::{TargetId, ID_ALIASES, SFR_HALPHA_COLUMN, SFR_OII_COLUMN, STELLAR_MASS_COLUMN};
use crate::sources::{RawTable, RecordSource};

/// An emission line as named by the FastSpecFit column prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmissionLine {
    /// Hα 6563 Å (`HALPHA_*`)
    Halpha,
    /// [OII] 3726,29 Å doublet (`OII_3727_*`)
    Oii3727,
    /// Any other FastSpecFit prefix, e.g. `"HBETA"` or `"OIII_5007"`.
    Other(String),
}

impl EmissionLine {
    /// Column prefix of the line.
    pub fn prefix(&self) -> &str {
        match self {
            EmissionLine::Halpha => "HALPHA",
            EmissionLine::Oii3727 => "OII_3727",
            EmissionLine::Other(prefix) => prefix,
        }
    }

    pub fn flux_column(&self) -> String {
        format!("{}_FLUX", self.prefix())
    }

    pub fn ivar_column(&self) -> String {
        format!("{}_FLUX_IVAR", self.prefix())
    }

    /// Star-formation rate calibrated on this line, if FastSpecFit provides one.
    pub fn sfr_of(&self, record: &EmissionRecord) -> Option<f64> {
        match self {
            EmissionLine::Halpha => record.sfr_halpha,
            EmissionLine::Oii3727 => record.sfr_oii,
            EmissionLine::Other(_) => None,
        }
    }
}

impl fmt::Display for EmissionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for EmissionLine {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CatalogError::InvalidParameter(
                "emission line name cannot be empty".into(),
            ));
        }
        Ok(match s.to_ascii_uppercase().as_str() {
            "HALPHA" => EmissionLine::Halpha,
            "OII_3727" | "OII" => EmissionLine::Oii3727,
            other => EmissionLine::Other(other.to_string()),
        })
    }
}

/// One emission-line measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub id: TargetId,
    /// Line flux (10⁻¹⁷ erg s⁻¹ cm⁻²)
    pub flux: f64,
    /// Inverse variance of `flux`
    pub inverse_variance: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sfr_halpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sfr_oii: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stellar_mass: Option<f64>,
}

/// Ordered emission-line measurements of a single line.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionTable {
    line: EmissionLine,
    rows: Vec<EmissionRecord>,
}

impl EmissionTable {
    pub fn new(line: EmissionLine, rows: Vec<EmissionRecord>) -> Self {
        Self { line, rows }
    }

    pub fn empty(line: EmissionLine) -> Self {
        Self::new(line, Vec::new())
    }

    pub fn line(&self) -> &EmissionLine {
        &self.line
    }

    pub fn rows(&self) -> &[EmissionRecord] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmissionRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep the rows whose id belongs to `ids`, in table order.
    pub fn select_targets<I>(&self, ids: I) -> EmissionTable
    where
        I: IntoIterator<Item = TargetId>,
    {
        let keep: HashSet<TargetId, RandomState> = ids.into_iter().collect();
        EmissionTable {
            line: self.line.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep.contains(&r.id))
                .copied()
                .collect(),
        }
    }

    /// Concatenate tables of the same line, preserving the order of `parts` and of their rows.
    ///
    /// Return
    /// ----------
    /// * `Err(CatalogError::InvalidParameter)` if one of the parts was read for another line.
    pub fn concat<I>(line: EmissionLine, parts: I) -> Result<EmissionTable, CatalogError>
    where
        I: IntoIterator<Item = EmissionTable>,
    {
        let mut rows = Vec::new();
        for part in parts {
            if part.line != line {
                return Err(CatalogError::InvalidParameter(format!(
                    "cannot concatenate {} measurements into a {line} table",
                    part.line
                )));
            }
            rows.extend(part.rows);
        }
        Ok(EmissionTable { line, rows })
    }
}

impl<'a> IntoIterator for &'a EmissionTable {
    type Item = &'a EmissionRecord;
    type IntoIter = std::slice::Iter<'a, EmissionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn optional_column(raw: &RawTable, name: &str) -> Result<Option<Vec<Option<f64>>>, CatalogError> {
    let Some((raw_name, column)) = raw.resolve(&[name]) else {
        return Ok(None);
    };
    let values = column.as_f64(raw_name)?;
    Ok(Some(
        values.iter().map(|&v| Some(v).filter(|v| !v.is_nan())).collect(),
    ))
}

/// Read the measurements of one emission line from a record source.
///
/// Arguments
/// -----------------
/// * `source` – a FastSpecFit-like table.
/// * `line` – which line's flux and inverse variance to read.
///
/// Return
/// ----------
/// * `Err(CatalogError::MissingJoinKey)` if no identifier column is present.
/// * `Err(CatalogError::MissingColumn)` if the flux or inverse-variance column is absent.
/// * Otherwise the table in source order. Rows with a null id are dropped. The derived
///   quantities (`SFR_HALPHA`, `SFR_OII`, `STELLAR_MASS`) are `None` when the column is absent or
///   the cell is `NaN`. No quality cut is applied here, see [`crate::quality::quality_filter`].
pub fn load_emissions<S: RecordSource + ?Sized>(
    source: &S,
    line: EmissionLine,
) -> Result<EmissionTable, CatalogError> {
    let flux_name = line.flux_column();
    let ivar_name = line.ivar_column();
    let wanted = ID_ALIASES
        .iter()
        .copied()
        .chain([
            flux_name.as_str(),
            ivar_name.as_str(),
            SFR_HALPHA_COLUMN,
            SFR_OII_COLUMN,
            STELLAR_MASS_COLUMN,
        ])
        .collect_vec();

    let raw = source.fetch(&wanted)?;

    let (id_name, id_column) = raw
        .resolve(ID_ALIASES)
        .ok_or_else(|| CatalogError::MissingJoinKey(source.describe()))?;
    let ids = id_column.as_i64(id_name)?;

    let (raw_flux, flux_column) = raw
        .resolve(&[flux_name.as_str()])
        .ok_or_else(|| CatalogError::MissingColumn(flux_name.clone()))?;
    let flux = flux_column.as_f64(raw_flux)?;

    let (raw_ivar, ivar_column) = raw
        .resolve(&[ivar_name.as_str()])
        .ok_or_else(|| CatalogError::MissingColumn(ivar_name.clone()))?;
    let ivar = ivar_column.as_f64(raw_ivar)?;

    let sfr_halpha = optional_column(&raw, SFR_HALPHA_COLUMN)?;
    let sfr_oii = optional_column(&raw, SFR_OII_COLUMN)?;
    let stellar_mass = optional_column(&raw, STELLAR_MASS_COLUMN)?;
    let cell = |column: &Option<Vec<Option<f64>>>, i: usize| column.as_ref().and_then(|c| c[i]);

    let rows = (0..raw.num_rows())
        .filter_map(|i| {
            Some(EmissionRecord {
                id: ids[i]?,
                flux: flux[i],
                inverse_variance: ivar[i],
                sfr_halpha: cell(&sfr_halpha, i),
                sfr_oii: cell(&sfr_oii, i),
                stellar_mass: cell(&stellar_mass, i),
            })
        })
        .collect_vec();

    let dropped = raw.num_rows() - rows.len();
    if dropped > 0 {
        warn!("{line}: dropped {dropped} measurements with a null '{id_name}'");
    }
    info!(
        "read {} {line} measurements from {}",
        rows.len(),
        source.describe()
    );

    Ok(EmissionTable::new(line, rows))
}
