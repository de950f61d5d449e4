//! # Catalog records and tables
//!
//! A [`CatalogTable`] is the normalized, analysis-ready form of one galaxy sample: an ordered
//! sequence of [`CatalogRecord`]s sharing one tracer category. Tables are **write-once**: they
//! are produced by [`load_catalog`](crate::loader::load_catalog) or by the validating
//! constructor [`CatalogTable::new`], expose only shared views, and every transformation in the
//! crate allocates a new table.
//!
//! ## Invariants
//!
//! - `id` is unique within a table.
//! - `redshift` is finite for every row.
//! - The set of present optional fields is uniform: either every row carries a `weight` or none
//!   does.
//!
//! ## See also
//!
//! * [`summary`](crate::catalog::summary) – Redshift and sky-coverage statistics of a table.
use std::collections::HashSet;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use crate::catalog_errors::CatalogError;
use crate::constants::{Degree, Redshift, TargetId};

pub mod summary;

/// One galaxy of a catalog table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Survey target identifier.
    pub id: TargetId,
    /// Right ascension (degrees).
    pub ra: Degree,
    /// Declination (degrees).
    pub dec: Degree,
    /// Spectroscopic redshift, always finite.
    pub redshift: Redshift,
    /// Systematic correction weight, `None` when the source carries no weight column.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub weight: Option<f64>,
}

/// An immutable, ordered galaxy sample.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTable {
    category: String,
    region: Option<String>,
    rows: Vec<CatalogRecord>,
}

impl CatalogTable {
    /// Build a table from already-normalized rows, enforcing the table invariants.
    ///
    /// Arguments
    /// -----------------
    /// * `category` – tracer tag shared by every row (e.g. `"ELG_LOPnotqso"`).
    /// * `region` – optional sky-region tag (e.g. `"NGC"`).
    /// * `rows` – records in their final order.
    ///
    /// Return
    /// ----------
    /// * `Err(CatalogError::InvalidParameter)` on a duplicated id, a negative or non-finite
    ///   redshift, or a mix of rows with and without `weight`.
    pub fn new(
        category: impl Into<String>,
        region: Option<String>,
        rows: Vec<CatalogRecord>,
    ) -> Result<Self, CatalogError> {
        let mut seen: HashSet<TargetId, RandomState> =
            HashSet::with_capacity_and_hasher(rows.len(), RandomState::default());
        let with_weight = rows.first().is_some_and(|r| r.weight.is_some());

        for row in &rows {
            if !seen.insert(row.id) {
                return Err(CatalogError::InvalidParameter(format!(
                    "duplicate id {} in catalog table",
                    row.id
                )));
            }
            if !(row.redshift.is_finite() && row.redshift >= 0.0) {
                return Err(CatalogError::InvalidParameter(format!(
                    "redshift {} of id {} is not finite and non-negative",
                    row.redshift, row.id
                )));
            }
            if row.weight.is_some() != with_weight {
                return Err(CatalogError::InvalidParameter(
                    "weight must be present on every row or on none".into(),
                ));
            }
        }

        Ok(Self::from_checked_rows(category.into(), region, rows))
    }

    /// Crate-internal constructor for callers that already enforce the invariants.
    pub(crate) fn from_checked_rows(
        category: String,
        region: Option<String>,
        rows: Vec<CatalogRecord>,
    ) -> Self {
        Self {
            category,
            region,
            rows,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn rows(&self) -> &[CatalogRecord] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `true` when the rows carry a systematic weight.
    pub fn has_weight(&self) -> bool {
        self.rows.first().is_some_and(|r| r.weight.is_some())
    }

    pub fn ids(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.rows.iter().map(|r| r.id)
    }

    /// An empty table of the given category, the neutral input of the joiner.
    pub fn empty(category: impl Into<String>) -> Self {
        Self::from_checked_rows(category.into(), None, Vec::new())
    }
}

impl<'a> IntoIterator for &'a CatalogTable {
    type Item = &'a CatalogRecord;
    type IntoIter = std::slice::Iter<'a, CatalogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
