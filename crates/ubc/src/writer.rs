//! UBC tensor mesh writer

// standard library
use std::io::Write;
use std::path::{Path, PathBuf};

// crate modules
use crate::mesh::grid_to_ubc_order;

// geokit modules
use geokit_core::{
    init_writer, Association, DataArray, Dataset, DatasetKind, Error, RectilinearGrid, Result,
};
use geokit_readers::{ValueFormat, WriteOut};
use geokit_utils::sequence::{diff, round_to};
use geokit_utils::{f, StringExt};

// external crates
use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Collapse runs of equal widths into the `n*w` shorthand
///
/// ```rust
/// # use geokit_ubc::{compress_widths, parse_widths};
/// let widths = [200.0, 50.0, 50.0, 50.0, 200.0];
/// assert_eq!(compress_widths(&widths), "200 3*50 200");
/// assert_eq!(parse_widths(&compress_widths(&widths)).unwrap(), widths);
/// ```
pub fn compress_widths(widths: &[f64]) -> String {
    widths
        .iter()
        .dedup_with_count()
        .map(|(n, w)| match n {
            1 => f!("{w}"),
            _ => f!("{n}*{w}"),
        })
        .join(" ")
}

/// Write rectilinear and image grids as a UBC 3D tensor mesh
///
/// The mesh goes to the requested path and every cell array to its own
/// `.mod` file in the same directory, named after the array with spaces
/// replaced by underscores.
///
/// ```rust, no_run
/// # use geokit_core::{Association, DataArray, RectilinearGrid};
/// # use geokit_readers::WriteOut;
/// # use geokit_ubc::UbcTensorWriter;
/// let mut grid = RectilinearGrid::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]);
/// grid.attributes.add(Association::Cell, DataArray::new("Rock Type", vec![3.0]));
///
/// // writes out/mesh.msh and out/Rock_Type.mod
/// UbcTensorWriter::default().write(&grid.into(), "out/mesh.msh").unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UbcTensorWriter {
    /// Number format for model values
    pub format: ValueFormat,
}

impl UbcTensorWriter {
    /// Set the number format of the model files
    pub fn format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }

    /// Path of the model file for an array written next to `mesh`
    pub fn model_file_name(mesh: &Path, array_name: &str) -> PathBuf {
        mesh.with_file_name(f!("{}.mod", array_name.underscored()))
    }

    fn write_mesh(&self, path: &Path, axes: &[Vec<f64>; 3]) -> Result<()> {
        let [x, y, z] = axes;
        let dims = axes.clone().map(|a| a.len().saturating_sub(1));
        if dims.contains(&0) {
            return Err(Error::InvalidSize(
                "A UBC mesh needs at least one cell along each axis.".into(),
            ));
        }

        // cumulative node sums leave noise that would break up runs
        let widths = |nodes: &[f64]| {
            diff(nodes)
                .into_iter()
                .map(|w| round_to(w, 6))
                .collect::<Vec<f64>>()
        };
        let mut z_widths = widths(z);
        z_widths.reverse();

        let mut writer = init_writer(path)?;
        writeln!(writer, "{} {} {}", dims[0], dims[1], dims[2])?;
        writeln!(writer, "{} {} {}", x[0], y[0], z[dims[2]])?;
        writeln!(writer, "{}", compress_widths(&widths(x)))?;
        writeln!(writer, "{}", compress_widths(&widths(y)))?;
        writeln!(writer, "{}", compress_widths(&z_widths))?;
        writer.flush()?;
        Ok(())
    }

    fn write_model(&self, path: &Path, mesh: &Path, array: &DataArray, cells: [usize; 3]) -> Result<()> {
        let values = grid_to_ubc_order(&array.values()?, array.components, cells)?;

        let mut writer = init_writer(path)?;
        writeln!(
            writer,
            "! Mesh File: {}",
            mesh.file_name().unwrap_or_default().to_string_lossy()
        )?;
        for cell in values.chunks(array.components.max(1)) {
            let line = cell.iter().map(|v| self.format.format(*v)).join(" ");
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Node coordinates of an image as a rectilinear grid
fn image_axes(dataset: &Dataset) -> Result<([Vec<f64>; 3], &[DataArray])> {
    match dataset {
        Dataset::Image(image) => Ok((
            [0, 1, 2].map(|a| image.axis_coordinates(a)),
            image.attributes.arrays(Association::Cell),
        )),
        other => {
            let RectilinearGrid { x, y, z, attributes } = other.as_rectilinear()?;
            Ok((
                [x.clone(), y.clone(), z.clone()],
                attributes.arrays(Association::Cell),
            ))
        }
    }
}

impl WriteOut for UbcTensorWriter {
    fn accepts(&self, kind: DatasetKind) -> bool {
        matches!(kind, DatasetKind::RectilinearGrid | DatasetKind::ImageData)
    }

    fn perform_write_out(&self, dataset: &Dataset, path: &Path, _: Option<&str>) -> Result<()> {
        let (axes, arrays) = image_axes(dataset)?;
        self.write_mesh(path, &axes)?;

        let cells = axes.clone().map(|a| a.len().saturating_sub(1));
        let expected = cells.iter().product::<usize>();
        for array in arrays {
            if array.number_of_tuples() != expected || array.data.to_f64().is_err() {
                warn!("Skipping cell array `{}`, not a numeric model", array.name);
                continue;
            }
            let model = Self::model_file_name(path, &array.name);
            debug!("Writing model {}", model.display());
            self.write_model(&model, path, array, cells)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_widths_are_not_run_length_encoded() {
        assert_eq!(compress_widths(&[1.0, 2.0, 3.0]), "1 2 3");
        assert_eq!(compress_widths(&[25.0; 20]), "20*25");
    }

    #[test]
    fn model_names_are_underscored() {
        let path = UbcTensorWriter::model_file_name(Path::new("out/mesh.msh"), "Rock Type");
        assert_eq!(path, PathBuf::from("out/Rock_Type.mod"));
    }

    #[test]
    fn grid_needs_cells() {
        let grid = RectilinearGrid::new(vec![0.0], vec![0.0, 1.0], vec![0.0, 1.0]);
        let path = std::env::temp_dir().join("geokit_ubc_empty.msh");
        assert!(UbcTensorWriter::default()
            .perform_write_out(&grid.into(), &path, None)
            .is_err());
    }
}
