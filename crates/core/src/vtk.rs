//! Conversion of datasets into vtkio types for writing
//!
//! Structured grids are written as rectilinear grids so node coordinates are
//! kept exactly, and anything with explicit cells is written as an
//! unstructured grid. Tables and collections have no VTK geometry and are
//! rejected.
//!
//! ```rust, no_run
//! # use geokit_core::vtk::{write_vtk, DatasetToVtk, VtkFormat};
//! # use geokit_core::{Dataset, ImageData};
//! # use vtkio::model::ByteOrder;
//! let grid = Dataset::from(ImageData::new([3, 3, 3], [0.0; 3], [10.0; 3]));
//!
//! let converter = DatasetToVtk::builder()
//!     .byte_order(ByteOrder::LittleEndian)
//!     .title("model")
//!     .build();
//!
//! let vtk = converter.convert(&grid).unwrap();
//! write_vtk(vtk, "model.vtk", VtkFormat::LegacyAscii).unwrap();
//! ```

// standard library
use std::ops::RangeInclusive;
use std::path::Path;

// crate modules
use crate::array::{ArrayData, DataArray};
use crate::cell::{CellArray, CellType};
use crate::dataset::{Attributes, Dataset};
use crate::error::{Error, Result};

// geokit modules
use geokit_utils::f;

// external crates
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use vtkio::model::{
    Attribute, Attributes as VtkAttributes, ByteOrder, CellType as VtkCellType, Cells,
    Coordinates, DataArray as VtkDataArray, DataSet, ElementType, Extent, IOBuffer, RangeExtent,
    RectilinearGridPiece, UnstructuredGridPiece, Version, VertexNumbers, Vtk,
};

/// Output file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VtkFormat {
    /// Modern XML format, extension chosen from the dataset type
    Xml,
    /// Legacy ASCII `.vtk`
    LegacyAscii,
    /// Legacy binary `.vtk` in the byte order of the [Vtk]
    LegacyBinary,
}

/// Convert datasets to [Vtk] objects
///
/// The fields remain public for direct use, but a builder is also provided.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetToVtk {
    /// Byte ordering for legacy binary output
    pub byte_order: ByteOrder,
    /// Title written to the file header
    pub title: String,
}

impl Default for DatasetToVtk {
    fn default() -> Self {
        DatasetToVtkBuilder::default().build()
    }
}

impl DatasetToVtk {
    /// Start with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an instance of the [DatasetToVtkBuilder]
    pub fn builder() -> DatasetToVtkBuilder {
        DatasetToVtkBuilder::default()
    }

    /// Convert a dataset into a [Vtk] ready for writing
    pub fn convert(&self, dataset: &Dataset) -> Result<Vtk> {
        let data = match dataset {
            Dataset::Image(_) | Dataset::Rectilinear(_) => self.rectilinear(dataset)?,
            Dataset::Unstructured(grid) => {
                Self::unstructured(&grid.points, &grid.cells, &grid.attributes)
            }
            Dataset::Poly(poly) => Self::unstructured(&poly.points, &poly.cells, &poly.attributes),
            other => {
                return Err(Error::InvalidArgument(f!(
                    "{:?} can not be written as VTK",
                    other.kind()
                )))
            }
        };

        Ok(Vtk {
            version: Version::Auto,
            title: self.title.clone(),
            byte_order: self.byte_order,
            file_path: None,
            data,
        })
    }

    fn rectilinear(&self, dataset: &Dataset) -> Result<DataSet> {
        let [x, y, z] = dataset
            .axes()
            .ok_or_else(|| Error::InvalidArgument("dataset has no axes".into()))?;

        let range = |n: usize| RangeInclusive::new(0, n.saturating_sub(1) as i32);
        let extent: RangeExtent = [range(x.len()), range(y.len()), range(z.len())];

        Ok(DataSet::inline(RectilinearGridPiece {
            extent: Extent::Ranges(extent),
            coords: Coordinates {
                x: IOBuffer::F64(x),
                y: IOBuffer::F64(y),
                z: IOBuffer::F64(z),
            },
            data: Self::attributes(dataset.attributes()),
        }))
    }

    fn unstructured(points: &[[f64; 3]], cells: &CellArray, attributes: &Attributes) -> DataSet {
        let points = points.iter().flatten().copied().collect::<Vec<f64>>();
        let connectivity = cells.connectivity().iter().map(|c| *c as u64).collect();
        let offsets = cells.offsets().iter().map(|c| *c as u64).collect();

        DataSet::inline(UnstructuredGridPiece {
            points: points.into(),
            cells: Cells {
                cell_verts: VertexNumbers::XML {
                    connectivity,
                    offsets,
                },
                types: cells.types().iter().map(vtk_cell_type).collect(),
            },
            data: Self::attributes(attributes),
        })
    }

    fn attributes(attributes: &Attributes) -> VtkAttributes {
        let mut vtk = VtkAttributes::new();
        vtk.point = attributes.point.iter().filter_map(vtk_array).collect();
        vtk.cell = attributes.cell.iter().filter_map(vtk_array).collect();
        if !attributes.field.is_empty() {
            debug!("Field arrays are not written to VTK output");
        }
        vtk
    }
}

/// Builder implementation for [DatasetToVtk] configuration
///
/// ```rust
/// # use geokit_core::vtk::DatasetToVtk;
/// # use vtkio::model::ByteOrder;
/// let converter = DatasetToVtk::builder()
///     .byte_order(ByteOrder::LittleEndian)
///     .build();
/// assert_eq!(converter.byte_order, ByteOrder::LittleEndian);
/// ```
#[derive(Debug, Clone)]
pub struct DatasetToVtkBuilder {
    byte_order: ByteOrder,
    title: String,
}

impl Default for DatasetToVtkBuilder {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::BigEndian,
            title: "geokit".into(),
        }
    }
}

impl DatasetToVtkBuilder {
    /// Build the [DatasetToVtk] type
    pub fn build(self) -> DatasetToVtk {
        DatasetToVtk {
            byte_order: self.byte_order,
            title: self.title,
        }
    }

    /// Set the byte ordering
    ///
    /// Defaults to big endian, which every VTK reader accepts for legacy
    /// binary files.
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Set the file title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Convert a dataset with the default configuration
pub fn dataset_to_vtk(dataset: &Dataset) -> Result<Vtk> {
    DatasetToVtk::default().convert(dataset)
}

/// Write a [Vtk] to disk in one of the supported formats
///
/// For [VtkFormat::Xml] the extension is replaced by the one matching the
/// dataset type, e.g. `.vtr` for rectilinear grids.
pub fn write_vtk(vtk: Vtk, path: impl AsRef<Path>, format: VtkFormat) -> Result<()> {
    let mut path = path.as_ref().to_path_buf();
    match format {
        VtkFormat::Xml => {
            path.set_extension(xml_extension(&vtk.data));
            vtk.export(&path)?;
        }
        VtkFormat::LegacyAscii => vtk.export_ascii(&path)?,
        VtkFormat::LegacyBinary => match vtk.byte_order {
            ByteOrder::LittleEndian => vtk.export_le(&path)?,
            _ => vtk.export_be(&path)?,
        },
    }
    debug!("Wrote {}", path.display());
    Ok(())
}

fn xml_extension(data: &DataSet) -> &'static str {
    match data {
        DataSet::RectilinearGrid { .. } => "vtr",
        DataSet::UnstructuredGrid { .. } => "vtu",
        DataSet::PolyData { .. } => "vtp",
        DataSet::ImageData { .. } => "vti",
        _ => "vtk",
    }
}

fn vtk_cell_type(cell_type: &CellType) -> VtkCellType {
    match cell_type {
        CellType::Vertex => VtkCellType::Vertex,
        CellType::Line => VtkCellType::Line,
        CellType::PolyLine => VtkCellType::PolyLine,
        CellType::Polygon => VtkCellType::Polygon,
        CellType::Pixel => VtkCellType::Pixel,
        CellType::Voxel => VtkCellType::Voxel,
    }
}

fn vtk_array(array: &DataArray) -> Option<Attribute> {
    let data = match &array.data {
        ArrayData::Int32(v) => IOBuffer::I32(v.clone()),
        ArrayData::Int64(v) => IOBuffer::I64(v.clone()),
        ArrayData::Float32(v) => IOBuffer::F32(v.clone()),
        ArrayData::Float64(v) => IOBuffer::F64(v.clone()),
        ArrayData::Str(_) => {
            warn!("String array \"{}\" skipped for VTK output", array.name);
            return None;
        }
    };

    Some(Attribute::DataArray(VtkDataArray {
        name: array.name.clone(),
        elem: ElementType::Scalars {
            num_comp: array.components as u32,
            lookup_table: None,
        },
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Association, ImageData, PolyData, Table};

    #[test]
    fn image_becomes_rectilinear() {
        let mut image = ImageData::new([3, 2, 1], [0.0; 3], [5.0; 3]);
        image
            .attributes
            .add(Association::Point, DataArray::new("v", vec![0.0; 6]));
        let vtk = dataset_to_vtk(&image.into()).unwrap();
        assert_eq!(xml_extension(&vtk.data), "vtr");
    }

    #[test]
    fn points_become_unstructured() {
        let poly = PolyData::from_points(vec![[0.0; 3], [1.0; 3]]);
        let vtk = dataset_to_vtk(&poly.into()).unwrap();
        assert_eq!(xml_extension(&vtk.data), "vtu");
    }

    #[test]
    fn tables_are_rejected() {
        assert!(dataset_to_vtk(&Table::default().into()).is_err());
    }

    #[test]
    fn string_arrays_are_skipped() {
        let strings = DataArray::new("names", vec!["a".to_string()]);
        assert!(vtk_array(&strings).is_none());
    }
}
