//! # CSV reader for catalog exports
//!
//! Small catalog extracts (TAP query results, hand-made subsets) are commonly exchanged as CSV.
//! This reader turns a headed CSV stream into a [`RawTable`], inferring one type per column:
//!
//! 1. every non-empty cell parses as `i64` → [`RawColumn::Int`] (empty cells → `None`),
//! 2. otherwise every non-empty cell parses as `f64` → [`RawColumn::Float`] (empty → `NaN`),
//! 3. otherwise → [`RawColumn::Text`].
//!
//! Lines starting with `#` are comments, which lets the files written by
//! [`CsvPointWriter`](crate::render::CsvPointWriter) be read back.
use std::borrow::Cow;
use std::fs::File;
use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use csv::{ReaderBuilder, Trim};
use log::info;

use super::{name_is_wanted, RawColumn, RawTable, RecordSource};
use crate::catalog_errors::CatalogError;

/// A delimited text file on local storage.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: Utf8PathBuf,
    delimiter: u8,
}

impl CsvSource {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl RecordSource for CsvSource {
    fn describe(&self) -> String {
        format!("csv file {}", self.path)
    }

    fn fetch(&self, wanted: &[&str]) -> Result<Cow<'_, RawTable>, CatalogError> {
        let file = File::open(&self.path)
            .map_err(|e| CatalogError::SourceUnavailable(format!("{}: {e}", self.path)))?;
        let table = read_csv(file, wanted, self.delimiter)?;
        info!(
            "read {} rows ({} columns) from {}",
            table.num_rows(),
            table.num_columns(),
            self.path
        );
        Ok(Cow::Owned(table))
    }
}

/// Parse a headed CSV stream into a [`RawTable`].
///
/// Arguments
/// -----------------
/// * `input` – any byte stream.
/// * `wanted` – column names to keep (case-insensitive); empty keeps all of them.
/// * `delimiter` – field separator.
///
/// Return
/// ----------
/// * The typed table, or [`CatalogError::SourceUnavailable`] if the stream is not valid CSV
///   (ragged rows, invalid UTF-8, I/O failure).
pub fn read_csv<R: Read>(
    input: R,
    wanted: &[&str],
    delimiter: u8,
) -> Result<RawTable, CatalogError> {
    let unreadable = |e: csv::Error| CatalogError::SourceUnavailable(format!("csv: {e}"));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .map_err(unreadable)?
        .iter()
        .map(str::to_string)
        .collect();
    let keep: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| name_is_wanted(h, wanted))
        .map(|(i, _)| i)
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); keep.len()];
    for record in reader.records() {
        let record = record.map_err(unreadable)?;
        for (column, &i) in cells.iter_mut().zip(&keep) {
            column.push(record.get(i).unwrap_or_default().to_string());
        }
    }

    let mut table = RawTable::new();
    for (column, &i) in cells.into_iter().zip(&keep) {
        table.push_column(headers[i].clone(), infer_column(column))?;
    }
    Ok(table)
}

fn infer_column(cells: Vec<String>) -> RawColumn {
    let present = || cells.iter().filter(|c| !c.is_empty());

    if present().all(|c| c.parse::<i64>().is_ok()) {
        return RawColumn::Int(cells.iter().map(|c| c.parse().ok()).collect());
    }
    if present().all(|c| c.parse::<f64>().is_ok()) {
        return RawColumn::Float(
            cells
                .iter()
                .map(|c| c.parse().unwrap_or(f64::NAN))
                .collect(),
        );
    }
    RawColumn::Text(cells)
}
