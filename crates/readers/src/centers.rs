//! Delimited text of cell centers and their cell data

// standard library
use std::path::Path;

// crate modules
use crate::writer::{ValueFormat, WriteOut};

// geokit modules
use geokit_core::{init_writer, ArrayData, Dataset, DatasetKind, Error, Result};
use geokit_utils::f;

// external crates
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

/// Write the XYZ cell centers of a dataset followed by every cell array
///
/// Array names have the delimiter replaced so the header stays parseable.
/// Arrays with several components are written one column per component and
/// string arrays are written as they are. The delimiter must be a single
/// ASCII character.
///
/// ```rust
/// # use geokit_core::{Association, DataArray, RectilinearGrid};
/// # use geokit_readers::{CellCentersWriter, WriteOut};
/// let mut grid = RectilinearGrid::new(vec![0.0, 2.0], vec![0.0, 2.0], vec![0.0, 1.0, 2.0]);
/// grid.attributes.add(Association::Cell, DataArray::new("a,b", vec![1.0, 2.0]));
///
/// let path = std::env::temp_dir().join("geokit_centers_doc.csv");
/// CellCentersWriter::default().write(&grid.into(), &path).unwrap();
///
/// let text = std::fs::read_to_string(&path).unwrap();
/// assert_eq!(text.lines().next(), Some("X,Y,Z,a_b"));
/// assert_eq!(text.lines().count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellCentersWriter {
    /// Column separator
    pub delimiter: String,
    /// Number format for every value
    pub format: ValueFormat,
}

impl Default for CellCentersWriter {
    fn default() -> Self {
        Self {
            delimiter: ",".into(),
            format: ValueFormat::default(),
        }
    }
}

impl CellCentersWriter {
    /// Writer with a custom delimiter
    pub fn with_delimiter(delimiter: &str) -> Self {
        Self {
            delimiter: delimiter.to_string(),
            ..Default::default()
        }
    }

    /// Array name with the delimiter replaced
    pub fn clean_name(&self, name: &str) -> String {
        if self.delimiter.is_empty() {
            return name.to_string();
        }
        let replacement = match self.delimiter.as_str() {
            "_" => "-",
            _ => "_",
        };
        name.replace(&self.delimiter, replacement)
    }

    fn delimiter_byte(&self) -> Result<u8> {
        let d = &self.delimiter;
        match d.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(Error::InvalidArgument(f!(
                "Delimiter \"{d}\" must be a single ASCII character."
            ))),
        }
    }
}

impl WriteOut for CellCentersWriter {
    fn accepts(&self, kind: DatasetKind) -> bool {
        !matches!(kind, DatasetKind::Table | DatasetKind::MultiBlock)
    }

    fn perform_write_out(&self, dataset: &Dataset, path: &Path, _: Option<&str>) -> Result<()> {
        let centers = dataset.cell_centers();

        let mut titles = vec!["X".to_string(), "Y".to_string(), "Z".to_string()];
        let mut columns: Vec<Vec<String>> = Vec::new();
        for array in &dataset.attributes().cell {
            let name = self.clean_name(&array.name);
            let values = match &array.data {
                ArrayData::Str(strings) => strings.clone(),
                numeric => numeric
                    .to_f64()?
                    .into_iter()
                    .map(|v| self.format.format(v))
                    .collect(),
            };
            let n = array.components.max(1);
            for c in 0..n {
                titles.push(match n {
                    1 => name.clone(),
                    _ => f!("{name}_{c}"),
                });
                columns.push(values.iter().skip(c).step_by(n).cloned().collect());
            }
        }

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter_byte()?)
            .from_writer(init_writer(path)?);
        writer.write_record(&titles)?;

        let missing = self.format.format(f64::NAN);
        for (i, center) in centers.iter().enumerate() {
            let row = center
                .iter()
                .map(|v| self.format.format(*v))
                .chain(columns.iter().map(|c| c.get(i).unwrap_or(&missing).clone()));
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_cleaned() {
        assert_eq!(CellCentersWriter::default().clean_name("a,b"), "a_b");
        assert_eq!(CellCentersWriter::with_delimiter("_").clean_name("a_b"), "a-b");
        assert_eq!(CellCentersWriter::with_delimiter(" ").clean_name("a b"), "a_b");
    }

    #[test]
    fn delimiter_is_one_character() {
        assert_eq!(CellCentersWriter::with_delimiter(";").delimiter_byte().unwrap(), b';');
        assert!(CellCentersWriter::with_delimiter("::").delimiter_byte().is_err());
        assert!(CellCentersWriter::with_delimiter("").delimiter_byte().is_err());
    }
}
