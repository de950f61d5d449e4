//! FITS binary-table reader (`fits` feature).
//!
//! DESI publishes its clustering and FastSpecFit catalogs as FITS files whose first extension
//! (HDU 1) is a binary table. Scalar columns are read through cfitsio with type conversion done
//! by the library: floating columns as `f64`, integer columns as `i64`, string columns as text.
//! Vector (repeat > 1) columns are skipped.
use std::borrow::Cow;

use camino::{Utf8Path, Utf8PathBuf};
use fitsio::hdu::HduInfo;
use fitsio::tables::ColumnDataType;
use fitsio::FitsFile;
use log::{debug, info};

use super::{name_is_wanted, RawColumn, RawTable, RecordSource};
use crate::catalog_errors::CatalogError;

/// A FITS file whose catalog lives in a binary-table extension.
#[derive(Debug, Clone)]
pub struct FitsSource {
    path: Utf8PathBuf,
    hdu: usize,
}

impl FitsSource {
    /// Read the table in HDU 1, the usual location of survey catalogs.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            hdu: 1,
        }
    }

    pub fn with_hdu(mut self, hdu: usize) -> Self {
        self.hdu = hdu;
        self
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl RecordSource for FitsSource {
    fn describe(&self) -> String {
        format!("fits file {} (hdu {})", self.path, self.hdu)
    }

    fn fetch(&self, wanted: &[&str]) -> Result<Cow<'_, RawTable>, CatalogError> {
        let unreadable =
            |e: fitsio::errors::Error| CatalogError::SourceUnavailable(format!("{}: {e}", self.path));

        let mut fptr = FitsFile::open(self.path.as_std_path()).map_err(unreadable)?;
        let hdu = fptr.hdu(self.hdu).map_err(unreadable)?;

        let descriptions = match &hdu.info {
            HduInfo::TableInfo {
                column_descriptions,
                ..
            } => column_descriptions.clone(),
            _ => {
                return Err(CatalogError::SourceUnavailable(format!(
                    "{}: hdu {} is not a table",
                    self.path, self.hdu
                )))
            }
        };

        let mut table = RawTable::new();
        for description in descriptions
            .iter()
            .filter(|d| name_is_wanted(&d.name, wanted))
        {
            if description.data_type.repeat > 1
                && !matches!(description.data_type.typ, ColumnDataType::String)
            {
                debug!("skipping vector column '{}'", description.name);
                continue;
            }

            let name = description.name.as_str();
            let column = match description.data_type.typ {
                ColumnDataType::Float | ColumnDataType::Double => {
                    RawColumn::Float(hdu.read_col::<f64>(&mut fptr, name).map_err(unreadable)?)
                }
                ColumnDataType::String => {
                    RawColumn::Text(hdu.read_col::<String>(&mut fptr, name).map_err(unreadable)?)
                }
                _ => RawColumn::Int(
                    hdu.read_col::<i64>(&mut fptr, name)
                        .map_err(unreadable)?
                        .into_iter()
                        .map(Some)
                        .collect(),
                ),
            };
            table.push_column(name, column)?;
        }

        info!(
            "read {} rows ({} columns) from {}",
            table.num_rows(),
            table.num_columns(),
            self.describe()
        );
        Ok(Cow::Owned(table))
    }
}
