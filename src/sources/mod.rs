//! # Record sources: raw column tables and their readers
//!
//! The loader never talks to files or services directly. It asks a [`RecordSource`] for a
//! [`RawTable`], a column-oriented bag of **named, untyped-at-compile-time** columns, and then
//! maps those raw names onto the canonical catalog schema.
//!
//! Modules
//! -----------------
//! * [`parquet_reader`](crate::sources::parquet_reader) – Arrow/Parquet ingestion with a projection mask.
//! * [`csv_reader`](crate::sources::csv_reader) – Header-driven CSV ingestion with per-column type inference.
//! * `fits_reader` – FITS binary-table ingestion (`fits` feature, requires cfitsio).
//! * *(crate-private)* `progress_bar` – Optional progress UI when the `progress` feature is enabled.
//!
//! Column model
//! -----------------
//! * [`RawColumn::Float`] – `f64` values; nulls are stored as `NaN`.
//! * [`RawColumn::Int`] – `i64` values; nulls are kept as `None` so that identifier columns can
//!   drop incomplete rows instead of inventing keys.
//! * [`RawColumn::Text`] – UTF-8 values; nulls become empty strings.
//!
//! Narrower source types (`f32`, `i16`, `u32`, …) are widened once at read time, so that every
//! downstream comparison and join works on a single width.
//!
//! Name resolution
//! -----------------
//! [`RawTable::resolve`] walks an ordered alias list (see [`crate::constants`]) and returns the
//! first column present. Exact names win over ASCII case-insensitive matches, so `Z` is preferred
//! to `z` when a file carries both.
use std::borrow::Cow;

use log::debug;

use crate::catalog_errors::CatalogError;

pub mod csv_reader;
#[cfg(feature = "fits")]
pub mod fits_reader;
pub mod parquet_reader;

#[cfg(feature = "progress")]
pub(crate) mod progress_bar;

/// One named column of a [`RawTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawColumn {
    Float(Vec<f64>),
    Int(Vec<Option<i64>>),
    Text(Vec<String>),
}

impl RawColumn {
    pub fn len(&self) -> usize {
        match self {
            RawColumn::Float(v) => v.len(),
            RawColumn::Int(v) => v.len(),
            RawColumn::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View the column as double precision values.
    ///
    /// Integer columns are widened (nulls become `NaN`); text columns are rejected.
    ///
    /// Arguments
    /// -----------------
    /// * `name` – column name, only used to build the error message.
    ///
    /// Return
    /// ----------
    /// * A borrowed slice for float columns, an owned buffer for integer columns.
    pub fn as_f64(&self, name: &str) -> Result<Cow<'_, [f64]>, CatalogError> {
        match self {
            RawColumn::Float(v) => Ok(Cow::Borrowed(v)),
            RawColumn::Int(v) => Ok(Cow::Owned(
                v.iter().map(|x| x.map_or(f64::NAN, |x| x as f64)).collect(),
            )),
            RawColumn::Text(_) => Err(CatalogError::ColumnType {
                column: name.to_string(),
                expected: "a floating point column",
            }),
        }
    }

    /// View the column as 64-bit integer identifiers.
    ///
    /// Float columns are accepted only cell by cell: a finite, integral value in `i64` range
    /// becomes `Some`, anything else becomes `None`. Text columns are rejected.
    pub fn as_i64(&self, name: &str) -> Result<Cow<'_, [Option<i64>]>, CatalogError> {
        match self {
            RawColumn::Int(v) => Ok(Cow::Borrowed(v)),
            RawColumn::Float(v) => Ok(Cow::Owned(
                v.iter()
                    .map(|&x| {
                        let integral = x.is_finite() && x.fract() == 0.0;
                        let in_range = x >= i64::MIN as f64 && x < i64::MAX as f64;
                        (integral && in_range).then_some(x as i64)
                    })
                    .collect(),
            )),
            RawColumn::Text(_) => Err(CatalogError::ColumnType {
                column: name.to_string(),
                expected: "an integer column",
            }),
        }
    }

    /// Append the values of `other` (same variant) at the end of `self`.
    pub(crate) fn extend_from(&mut self, other: RawColumn, name: &str) -> Result<(), CatalogError> {
        match (self, other) {
            (RawColumn::Float(a), RawColumn::Float(b)) => a.extend(b),
            (RawColumn::Int(a), RawColumn::Int(b)) => a.extend(b),
            (RawColumn::Text(a), RawColumn::Text(b)) => a.extend(b),
            _ => {
                return Err(CatalogError::ColumnType {
                    column: name.to_string(),
                    expected: "a single type across all batches",
                })
            }
        }
        Ok(())
    }
}

/// Column-oriented raw table as delivered by a [`RecordSource`].
///
/// Invariants
/// -----------------
/// * Every column holds exactly [`RawTable::num_rows`] values.
/// * Column names are unique (exact comparison).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    names: Vec<String>,
    columns: Vec<RawColumn>,
    num_rows: usize,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column insertion.
    ///
    /// Return
    /// ----------
    /// * `Err(CatalogError::InvalidParameter)` if the column length disagrees with the columns
    ///   already present, or if the name is already taken.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column: RawColumn,
    ) -> Result<Self, CatalogError> {
        self.push_column(name, column)?;
        Ok(self)
    }

    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        column: RawColumn,
    ) -> Result<(), CatalogError> {
        let name = name.into();
        if self.names.iter().any(|n| *n == name) {
            return Err(CatalogError::InvalidParameter(format!(
                "duplicate column '{name}'"
            )));
        }
        if !self.columns.is_empty() && column.len() != self.num_rows {
            return Err(CatalogError::InvalidParameter(format!(
                "column '{name}' has {} rows, expected {}",
                column.len(),
                self.num_rows
            )));
        }
        self.num_rows = column.len();
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Exact-name lookup.
    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Resolve the first present column of an ordered alias list.
    ///
    /// Each alias is tried first with an exact match over all columns, then with an ASCII
    /// case-insensitive match, before moving to the next alias.
    ///
    /// Return
    /// ----------
    /// * `Some((raw_name, column))` for the first alias found, `None` if none is present.
    pub fn resolve(&self, aliases: &[&str]) -> Option<(&str, &RawColumn)> {
        let found = aliases.iter().find_map(|alias| {
            self.names
                .iter()
                .position(|n| n == alias)
                .or_else(|| self.names.iter().position(|n| n.eq_ignore_ascii_case(alias)))
        })?;
        debug!("resolved {:?} to raw column '{}'", aliases, self.names[found]);
        Some((self.names[found].as_str(), &self.columns[found]))
    }

    /// Keep only the columns whose name matches one of `wanted` (case-insensitive).
    ///
    /// An empty `wanted` list keeps every column.
    pub fn select(self, wanted: &[&str]) -> Self {
        if wanted.is_empty() {
            return self;
        }
        let num_rows = self.num_rows;
        let (names, columns): (Vec<_>, Vec<_>) = self
            .names
            .into_iter()
            .zip(self.columns)
            .filter(|(n, _)| name_is_wanted(n, wanted))
            .unzip();
        let num_rows = if columns.is_empty() { 0 } else { num_rows };
        Self {
            names,
            columns,
            num_rows,
        }
    }
}

/// `true` when `name` matches one entry of `wanted`, ignoring ASCII case.
/// An empty `wanted` list matches everything.
pub(crate) fn name_is_wanted(name: &str, wanted: &[&str]) -> bool {
    wanted.is_empty() || wanted.iter().any(|w| w.eq_ignore_ascii_case(name))
}

/// A provider of raw catalog rows.
///
/// Implementations decide how rows are obtained (memory, file, service). The loader only
/// requires that a failure to obtain them is reported as
/// [`CatalogError::SourceUnavailable`], never as an empty table.
pub trait RecordSource {
    /// Short human-readable description used in log lines and error messages.
    fn describe(&self) -> String;

    /// Fetch the raw rows.
    ///
    /// Arguments
    /// -----------------
    /// * `wanted` – raw column names the caller may use (case-insensitive). Sources are free to
    ///   read only those columns; an empty list means "every column".
    fn fetch(&self, wanted: &[&str]) -> Result<Cow<'_, RawTable>, CatalogError>;
}

impl RecordSource for RawTable {
    fn describe(&self) -> String {
        format!(
            "in-memory table ({} rows, {} columns)",
            self.num_rows,
            self.columns.len()
        )
    }

    fn fetch(&self, _wanted: &[&str]) -> Result<Cow<'_, RawTable>, CatalogError> {
        Ok(Cow::Borrowed(self))
    }
}

#[cfg(test)]
mod sources_test {
    use super::*;

    fn sample() -> RawTable {
        RawTable::new()
            .with_column("TARGETID", RawColumn::Int(vec![Some(1), None, Some(3)]))
            .unwrap()
            .with_column("z", RawColumn::Float(vec![0.1, 0.2, 0.3]))
            .unwrap()
            .with_column("Z_not4clus", RawColumn::Float(vec![1.1, 1.2, 1.3]))
            .unwrap()
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = sample()
            .with_column("RA", RawColumn::Float(vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidParameter(_)));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = sample()
            .with_column("z", RawColumn::Float(vec![0.0; 3]))
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidParameter(_)));
    }

    #[test]
    fn test_resolve_priority() {
        let table = sample();
        // "Z" is matched case-insensitively by "z" before "Z_not4clus" is even considered
        let (name, _) = table.resolve(&["Z", "Z_not4clus"]).unwrap();
        assert_eq!(name, "z");

        let (name, _) = table.resolve(&["REDSHIFT", "Z_not4clus"]).unwrap();
        assert_eq!(name, "Z_not4clus");

        assert!(table.resolve(&["RA"]).is_none());
    }

    #[test]
    fn test_exact_match_wins_over_case_insensitive() {
        let table = RawTable::new()
            .with_column("z", RawColumn::Float(vec![0.5]))
            .unwrap()
            .with_column("Z", RawColumn::Float(vec![0.7]))
            .unwrap();
        let (name, _) = table.resolve(&["Z"]).unwrap();
        assert_eq!(name, "Z");
    }

    #[test]
    fn test_coercions() {
        let ints = RawColumn::Int(vec![Some(2), None]);
        let as_float = ints.as_f64("x").unwrap();
        assert_eq!(as_float[0], 2.0);
        assert!(as_float[1].is_nan());

        let floats = RawColumn::Float(vec![7.0, 7.5, f64::NAN]);
        let ids = floats.as_i64("id").unwrap();
        assert_eq!(&ids[..], &[Some(7), None, None]);

        let text = RawColumn::Text(vec!["a".into()]);
        assert!(matches!(
            text.as_f64("name"),
            Err(CatalogError::ColumnType { .. })
        ));
    }

    #[test]
    fn test_select_keeps_wanted_columns() {
        let table = sample().select(&["targetid", "Z"]);
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["TARGETID", "z"]);
        assert_eq!(table.num_rows(), 3);
    }
}
