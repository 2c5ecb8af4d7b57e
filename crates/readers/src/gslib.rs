//! GSLib tables
//!
//! The format is a free title line, the number of columns, one title per
//! line, then whitespace separated rows. Reading is handled by
//! [DelimitedTextReader::gslib()](crate::DelimitedTextReader::gslib) and
//! [DelimitedPointsReader::gslib()](crate::DelimitedPointsReader::gslib).

// standard library
use std::io::Write;
use std::path::Path;

// crate modules
use crate::writer::{ValueFormat, WriteOut};

// geokit modules
use geokit_core::{init_writer, Dataset, DatasetKind, Error, Result};

// external crates
use serde::{Deserialize, Serialize};

/// Write the columns of a table in the GSLib format
///
/// ```rust
/// # use geokit_readers::GslibWriter;
/// let writer = GslibWriter::default();
/// assert_eq!(writer.header, "Data saved by geokit");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GslibWriter {
    /// Free title written as the first line
    pub header: String,
    /// Number format for every value
    pub format: ValueFormat,
}

impl Default for GslibWriter {
    fn default() -> Self {
        Self {
            header: "Data saved by geokit".into(),
            format: ValueFormat::default(),
        }
    }
}

impl GslibWriter {
    /// Set the free title line
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Set the number format
    pub fn format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }
}

impl WriteOut for GslibWriter {
    fn accepts(&self, kind: DatasetKind) -> bool {
        kind == DatasetKind::Table
    }

    fn perform_write_out(&self, dataset: &Dataset, path: &Path, _: Option<&str>) -> Result<()> {
        let table = dataset.as_table()?;
        let columns = table
            .columns()
            .iter()
            .map(|c| c.values())
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let rows = table.number_of_rows();
        if columns.iter().any(|c| c.len() != rows) {
            return Err(Error::InvalidArgument(
                "GSLib output needs single component columns.".into(),
            ));
        }

        let mut writer = init_writer(path)?;
        writeln!(writer, "{}", self.header)?;
        writeln!(writer, "{}", columns.len())?;
        for column in table.columns() {
            writeln!(writer, "{}", column.name)?;
        }
        for r in 0..rows {
            let line = columns
                .iter()
                .map(|c| self.format.format(c[r]))
                .collect::<Vec<String>>()
                .join(" ");
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
        Ok(())
    }
}
