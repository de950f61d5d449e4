use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Record source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("No {category} rows left after admissibility filtering")]
    EmptyResult { category: String },

    #[error("Missing join key: no identifier column in {0}")]
    MissingJoinKey(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}' cannot be read as {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl CatalogError {
    /// `true` when the source was read but nothing matched the requested cuts.
    ///
    /// Callers usually react by widening their filters rather than by retrying.
    pub fn is_no_data(&self) -> bool {
        matches!(self, CatalogError::EmptyResult { .. })
    }

    /// `true` when the data could not be obtained at all.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            CatalogError::SourceUnavailable(_) | CatalogError::IoError(_)
        )
    }
}

impl From<parquet::errors::ParquetError> for CatalogError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        CatalogError::SourceUnavailable(format!("parquet: {err}"))
    }
}

impl PartialEq for CatalogError {
    fn eq(&self, other: &Self) -> bool {
        use CatalogError::*;
        match (self, other) {
            (SourceUnavailable(a), SourceUnavailable(b)) => a == b,
            (EmptyResult { category: a }, EmptyResult { category: b }) => a == b,
            (MissingJoinKey(a), MissingJoinKey(b)) => a == b,
            (MissingColumn(a), MissingColumn(b)) => a == b,
            (
                ColumnType {
                    column: a,
                    expected: ea,
                },
                ColumnType {
                    column: b,
                    expected: eb,
                },
            ) => a == b && ea == eb,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,

            // Not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            _ => false,
        }
    }
}
