//! Point cloud readers built on the delimited text reader

// standard library
use std::path::Path;

// crate modules
use crate::delimited::DelimitedTextReader;

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Association, DataArray, Dataset, DatasetKind, Error, Information,
    OutputKind, PolyData, Result, Table,
};

// external crates
use itertools::izip;

/// Turn a table into a point cloud
///
/// The first three columns are the X, Y and Z coordinates and every other
/// column becomes point data. With `copy_z` the Z coordinate is also kept as
/// an `Elevation` point array.
///
/// ```rust
/// # use geokit_core::{DataArray, Table};
/// # use geokit_readers::table_to_points;
/// let mut table = Table::default();
/// table.add_column(DataArray::new("X", vec![0.0, 1.0]));
/// table.add_column(DataArray::new("Y", vec![0.0, 1.0]));
/// table.add_column(DataArray::new("Z", vec![5.0, 6.0]));
/// table.add_column(DataArray::new("rho", vec![2.5, 2.7]));
///
/// let points = table_to_points(&table, true).unwrap();
/// assert_eq!(points.points[1], [1.0, 1.0, 6.0]);
/// assert_eq!(points.attributes.point.len(), 2);
/// ```
pub fn table_to_points(table: &Table, copy_z: bool) -> Result<PolyData> {
    let columns = table.columns();
    if columns.len() < 3 {
        return Err(Error::InvalidArgument(
            "Points must be 3D. Try adding a third dimension of zeros.".into(),
        ));
    }

    let x = columns[0].values()?;
    let y = columns[1].values()?;
    let z = columns[2].values()?;
    let points = izip!(&x, &y, &z)
        .map(|(x, y, z)| [*x, *y, *z])
        .collect::<Vec<[f64; 3]>>();

    let mut poly = PolyData::from_points(points);
    for column in &columns[3..] {
        poly.attributes.add(Association::Point, column.clone());
    }
    if copy_z {
        poly.attributes
            .add(Association::Point, DataArray::new("Elevation", z));
    }
    Ok(poly)
}

/// Read delimited files of points into [PolyData]
///
/// ```rust, no_run
/// # use geokit_core::Algorithm;
/// # use geokit_readers::DelimitedPointsReader;
/// let mut reader = DelimitedPointsReader::gslib();
/// reader.add_file_name("samples.gslib");
/// let points = reader.apply(&[]).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct DelimitedPointsReader {
    reader: DelimitedTextReader,
    copy_z: bool,
}

impl DelimitedPointsReader {
    /// Wrap a configured delimited reader
    pub fn new(reader: DelimitedTextReader) -> Self {
        Self {
            reader,
            copy_z: false,
        }
    }

    /// Points from XYZ files with `! ` prefixed titles
    pub fn xyz() -> Self {
        Self::new(DelimitedTextReader::xyz())
    }

    /// Points from a GSLib point set
    pub fn gslib() -> Self {
        Self::new(DelimitedTextReader::gslib())
    }

    /// The underlying text reader for changing parse options
    pub fn text_reader(&mut self) -> &mut DelimitedTextReader {
        &mut self.reader
    }

    /// Add an input file, one per timestep
    pub fn add_file_name(&mut self, path: impl AsRef<Path>) {
        self.reader.add_file_name(path)
    }

    /// Whether to keep Z as a point array
    pub fn copy_z(&self) -> bool {
        self.copy_z
    }

    /// Set whether to keep Z as a point array
    pub fn set_copy_z(&mut self, flag: bool) {
        if self.copy_z != flag {
            self.copy_z = flag;
            self.modified(false);
        }
    }
}

impl Algorithm for DelimitedPointsReader {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::PolyData)
    }

    fn state(&self) -> &AlgorithmState {
        &self.reader.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.reader.state
    }

    fn modified(&mut self, read_again: bool) {
        self.reader.modified(read_again);
    }

    fn request_information(&mut self, inputs: &[&Dataset]) -> Result<Information> {
        self.reader.request_information(inputs)
    }

    fn request_data(&mut self, _inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        let table = self.reader.read_table(time)?;
        Ok(table_to_points(&table, self.copy_z)?.into())
    }
}
