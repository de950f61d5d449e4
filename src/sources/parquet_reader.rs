//! # Parquet reader for survey catalogs
//!
//! Column-projected ingestion of catalog rows from **Apache Parquet** into a [`RawTable`].
//! Clustering catalogs and FastSpecFit tables are frequently converted from FITS to Parquet;
//! this reader keeps the on-disk column names so that the alias chains of
//! [`crate::constants`] still apply.
//!
//! ## Overview
//! -----------------
//! - **Projection-first**: only top-level leaf columns whose name is requested by the caller
//!   (case-insensitive) are decoded. An empty request decodes every top-level column.
//! - **Typed downcast once per batch**: each Arrow array is downcast once and converted with a
//!   tight loop; a no-null fast path iterates over the raw value slice.
//! - **Widening**: `Float32` → `f64`, every signed/unsigned integer up to 64 bits → `i64`.
//!   `UInt64` values above `i64::MAX` are rejected with [`CatalogError::ColumnType`].
//!
//! ## Null Handling Policy
//! -----------------
//! - Float nulls become `NaN` (the loader rejects non-finite redshifts, and range filters never
//!   admit `NaN`).
//! - Integer nulls stay `None`; identifier columns drop those rows downstream.
//! - String nulls become empty strings.
//!
//! ## Error Handling
//! -----------------
//! Every failure to open or decode the file surfaces as [`CatalogError::SourceUnavailable`],
//! so callers can tell "the file is broken" apart from "nothing matched".
use std::borrow::Cow;
use std::fs::File;

use arrow_array::array::{
    Array, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array, Int8Array,
    LargeStringArray, StringArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow_array::RecordBatchReader;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use parquet::arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ProjectionMask};
use parquet::errors::ParquetError;

use super::{name_is_wanted, RawColumn, RawTable, RecordSource};
use crate::catalog_errors::CatalogError;
use crate::constants::DEFAULT_BATCH_SIZE;

/// A Parquet file on local storage.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: Utf8PathBuf,
    batch_size: usize,
}

impl ParquetSource {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the Arrow reader batch size (default: 8192 rows). Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl RecordSource for ParquetSource {
    fn describe(&self) -> String {
        format!("parquet file {}", self.path)
    }

    fn fetch(&self, wanted: &[&str]) -> Result<Cow<'_, RawTable>, CatalogError> {
        parquet_to_raw_table(&self.path, wanted, self.batch_size).map(Cow::Owned)
    }
}

/// Read the requested columns of a Parquet file into a [`RawTable`].
///
/// Arguments
/// -----------------
/// * `parquet` – path of the file.
/// * `wanted` – raw column names to decode (case-insensitive); empty means all top-level columns.
/// * `batch_size` – Arrow reader batch size.
///
/// Return
/// ----------
/// * The decoded table. Columns keep their on-disk names and order. A file with a schema but no
///   rows yields empty columns (not missing ones), so the loader reports an empty result rather
///   than a schema problem.
pub(crate) fn parquet_to_raw_table(
    parquet: &Utf8Path,
    wanted: &[&str],
    batch_size: usize,
) -> Result<RawTable, CatalogError> {
    let file = File::open(parquet)
        .map_err(|e| CatalogError::SourceUnavailable(format!("{parquet}: {e}")))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let parquet_metadata = builder.metadata();
    let total_rows = parquet_metadata.file_metadata().num_rows();
    let schema_descr = parquet_metadata.file_metadata().schema_descr();

    // Nested leaves are never catalog columns; keep top-level primitives only.
    let projection_indices: Vec<usize> = schema_descr
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.path().parts().len() == 1 && name_is_wanted(c.name(), wanted))
        .map(|(i, _)| i)
        .collect();
    let mask = ProjectionMask::leaves(schema_descr, projection_indices);

    let reader = builder
        .with_projection(mask)
        .with_batch_size(batch_size)
        .build()?;

    let field_names: Vec<String> = reader
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let mut columns: Vec<Option<RawColumn>> = vec![None; field_names.len()];

    #[cfg(feature = "progress")]
    let mut progress = super::progress_bar::ReadProgress::new(total_rows.max(0) as u64);

    for maybe_batch in reader {
        let batch = maybe_batch.map_err(ParquetError::from)?;

        // Projected columns come back in schema order, aligned with `field_names`.
        for (slot, (name, array)) in columns
            .iter_mut()
            .zip(field_names.iter().zip(batch.columns()))
        {
            let decoded = decode_array(array.as_ref(), name)?;
            match slot {
                Some(column) => column.extend_from(decoded, name)?,
                None => *slot = Some(decoded),
            }
        }

        #[cfg(feature = "progress")]
        progress.advance(batch.num_rows() as u64);
    }

    #[cfg(feature = "progress")]
    progress.finish();

    let mut table = RawTable::new();
    for (name, column) in field_names.into_iter().zip(columns) {
        table.push_column(name, column.unwrap_or(RawColumn::Float(Vec::new())))?;
    }

    info!(
        "read {} of {} rows ({} columns) from {}",
        table.num_rows(),
        total_rows,
        table.num_columns(),
        parquet
    );
    Ok(table)
}

/// Convert one Arrow array into a [`RawColumn`], widening numeric types.
fn decode_array(array: &dyn Array, name: &str) -> Result<RawColumn, CatalogError> {
    let any = array.as_any();

    macro_rules! widen {
        ($arr:ty, $variant:ident, $null:expr, $conv:expr) => {
            if let Some(a) = any.downcast_ref::<$arr>() {
                let values = if a.null_count() == 0 {
                    // Fast path: raw slice, no per-row validity check.
                    a.values().iter().map(|&v| $conv(v)).collect()
                } else {
                    a.iter().map(|v| v.map_or($null, $conv)).collect()
                };
                return Ok(RawColumn::$variant(values));
            }
        };
    }

    widen!(Float64Array, Float, f64::NAN, |v: f64| v);
    widen!(Float32Array, Float, f64::NAN, f64::from);
    widen!(Int64Array, Int, None, |v: i64| Some(v));
    widen!(Int32Array, Int, None, |v: i32| Some(i64::from(v)));
    widen!(Int16Array, Int, None, |v: i16| Some(i64::from(v)));
    widen!(Int8Array, Int, None, |v: i8| Some(i64::from(v)));
    widen!(UInt32Array, Int, None, |v: u32| Some(i64::from(v)));
    widen!(UInt16Array, Int, None, |v: u16| Some(i64::from(v)));
    widen!(UInt8Array, Int, None, |v: u8| Some(i64::from(v)));

    if let Some(a) = any.downcast_ref::<UInt64Array>() {
        let mut values = Vec::with_capacity(a.len());
        for v in a.iter() {
            let v = v
                .map(i64::try_from)
                .transpose()
                .map_err(|_| CatalogError::ColumnType {
                    column: name.to_string(),
                    expected: "integers within the i64 range",
                })?;
            values.push(v);
        }
        return Ok(RawColumn::Int(values));
    }

    if let Some(a) = any.downcast_ref::<StringArray>() {
        return Ok(RawColumn::Text(
            a.iter().map(|v| v.unwrap_or_default().to_string()).collect(),
        ));
    }
    if let Some(a) = any.downcast_ref::<LargeStringArray>() {
        return Ok(RawColumn::Text(
            a.iter().map(|v| v.unwrap_or_default().to_string()).collect(),
        ));
    }

    Err(CatalogError::ColumnType {
        column: name.to_string(),
        expected: "a numeric or string column",
    })
}
