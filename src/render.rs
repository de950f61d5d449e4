//! Output of projected samples.
//!
//! Drawing the wedge plot itself is left to an external collaborator implementing
//! [`Renderer`]. The crate ships [`CsvPointWriter`], which exports the samples as
//! `x,y,color` rows behind a `# <title>` comment line, a format any plotting tool can load.
use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use log::info;

use crate::catalog_errors::CatalogError;
use crate::projection::WedgeSample;

/// Consumer of projected samples.
pub trait Renderer {
    /// Render `samples` under `title` into `output`.
    fn render(&self, samples: &[WedgeSample], title: &str, output: &Utf8Path)
        -> Result<(), CatalogError>;
}

/// Writes the samples as CSV.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvPointWriter;

impl CsvPointWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write the title comment, the header and one row per sample to any writer.
    pub fn write_to<W: Write>(
        &self,
        mut writer: W,
        samples: &[WedgeSample],
        title: &str,
    ) -> Result<(), CatalogError> {
        for line in title.lines() {
            writeln!(writer, "# {line}")?;
        }
        let mut csv = csv::Writer::from_writer(writer);
        for sample in samples {
            csv.serialize(sample)?;
        }
        // no samples: still emit the header
        if samples.is_empty() {
            csv.write_record(["x", "y", "color"])?;
        }
        csv.flush()?;
        Ok(())
    }
}

impl Renderer for CsvPointWriter {
    fn render(
        &self,
        samples: &[WedgeSample],
        title: &str,
        output: &Utf8Path,
    ) -> Result<(), CatalogError> {
        let file = File::create(output)?;
        self.write_to(BufWriter::new(file), samples, title)?;
        info!("wrote {} wedge samples to {output}", samples.len());
        Ok(())
    }
}

#[cfg(test)]
mod render_test {
    use super::*;

    #[test]
    fn test_write_to_buffer() {
        let samples = [
            WedgeSample {
                x: 1.0,
                y: 0.0,
                color: 1.0,
            },
            WedgeSample {
                x: -0.5,
                y: 0.25,
                color: 0.6,
            },
        ];
        let mut buffer = Vec::new();
        CsvPointWriter::new()
            .write_to(&mut buffer, &samples, "LRG NGC wedge")
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "# LRG NGC wedge\nx,y,color\n1.0,0.0,1.0\n-0.5,0.25,0.6\n");
    }

    #[test]
    fn test_empty_samples_keep_header() {
        let mut buffer = Vec::new();
        CsvPointWriter::new().write_to(&mut buffer, &[], "empty").unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "# empty\nx,y,color\n");
    }
}
