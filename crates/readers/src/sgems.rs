//! SGeMS uniform grids
//!
//! An SGeMS grid is a GSLib table whose free header line carries the cell
//! counts, either as `name (nxXnyXnz)` or as three plain integers. Every
//! column is cell data in `x` fastest order.

// standard library
use std::io::Write;
use std::path::Path;

// crate modules
use crate::delimited::DelimitedTextReader;
use crate::writer::{ValueFormat, WriteOut};

// geokit modules
use geokit_core::{
    init_writer, Algorithm, AlgorithmState, ArrayData, Association, DataArray, Dataset,
    DatasetKind, Error, ImageData, Information, OutputKind, Result, ScalarKind,
};

// external crates
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1};
use nom::combinator::map_res;
use nom::sequence::{delimited, preceded, tuple};
use nom::IResult;
use serde::{Deserialize, Serialize};

/// Value used by SGeMS to mark missing data
pub const SGEMS_MASK: f64 = -9966699.0;

fn count(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>)(input)
}

fn bracketed_dims(input: &str) -> IResult<&str, (usize, usize, usize)> {
    delimited(
        char('('),
        tuple((count, preceded(char('x'), count), preceded(char('x'), count))),
        char(')'),
    )(input)
}

fn spaced_dims(input: &str) -> IResult<&str, (usize, usize, usize)> {
    tuple((count, preceded(tag(" "), count), preceded(tag(" "), count)))(input)
}

/// Cell counts from an SGeMS header line
///
/// ```rust
/// # use geokit_readers::parse_sgems_dims;
/// assert_eq!(parse_sgems_dims("grid (10x20x5)").unwrap(), [10, 20, 5]);
/// assert_eq!(parse_sgems_dims("10 20 5").unwrap(), [10, 20, 5]);
/// assert!(parse_sgems_dims("no dimensions here").is_err());
/// ```
pub fn parse_sgems_dims(header: &str) -> Result<[usize; 3]> {
    let chars = header.char_indices().collect::<Vec<(usize, char)>>();

    // `name (nxXnyXnz)` must follow a non-space then a space
    for w in chars.windows(3) {
        let [(_, a), (_, b), (i, _)] = [w[0], w[1], w[2]];
        if !a.is_whitespace() && b.is_whitespace() {
            if let Ok((_, (x, y, z))) = bracketed_dims(&header[i..]) {
                return Ok([x, y, z]);
            }
        }
    }

    for (i, _) in &chars {
        if let Ok((_, (x, y, z))) = spaced_dims(&header[*i..]) {
            return Ok([x, y, z]);
        }
    }

    Err(Error::ParseError("File not in proper SGeMS Grid format.".into()))
}

/// Read SGeMS grids into [ImageData]
///
/// Origin and spacing are not part of the format and are set by the user.
/// Values equal to the mask are replaced with NaN.
///
/// ```rust, no_run
/// # use geokit_core::Algorithm;
/// # use geokit_readers::SgemsGridReader;
/// let mut reader = SgemsGridReader::new();
/// reader.add_file_name("model.sgems");
/// reader.set_spacing([10.0, 10.0, 5.0]);
/// let grid = reader.apply(&[]).unwrap();
/// ```
#[derive(Debug)]
pub struct SgemsGridReader {
    reader: DelimitedTextReader,
    origin: [f64; 3],
    spacing: [f64; 3],
    mask: f64,
    extent: Option<[usize; 3]>,
}

impl Default for SgemsGridReader {
    fn default() -> Self {
        Self {
            reader: DelimitedTextReader::gslib(),
            origin: [0.0; 3],
            spacing: [1.0; 3],
            mask: SGEMS_MASK,
            extent: None,
        }
    }
}

impl SgemsGridReader {
    /// Reader with zero origin and unit spacing
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input file, one per timestep
    pub fn add_file_name(&mut self, path: impl AsRef<Path>) {
        self.reader.add_file_name(path)
    }

    /// The underlying text reader for changing parse options
    pub fn text_reader(&mut self) -> &mut DelimitedTextReader {
        &mut self.reader
    }

    /// Set the origin corner of the grid
    pub fn set_origin(&mut self, origin: [f64; 3]) {
        if self.origin != origin {
            self.origin = origin;
            self.modified(false);
        }
    }

    /// Set the cell size along each axis
    pub fn set_spacing(&mut self, spacing: [f64; 3]) {
        if self.spacing != spacing {
            self.spacing = spacing;
            self.modified(false);
        }
    }

    /// Set the value treated as missing data
    pub fn set_mask(&mut self, mask: f64) {
        if self.mask != mask {
            self.mask = mask;
            self.modified(false);
        }
    }

    /// Cell counts of the grid, read from the file headers
    pub fn read_extent(&mut self) -> Result<[usize; 3]> {
        if let (Some(extent), false) = (self.extent, self.reader.base.need_to_read()) {
            return Ok(extent);
        }

        let headers = self.reader.read_headers()?;
        let mut extent: Option<[usize; 3]> = None;
        for header in &headers {
            let line = header.file_header.as_deref().unwrap_or_default();
            let dims = parse_sgems_dims(line)?;
            match extent {
                Some(e) if e != dims => {
                    return Err(Error::size_mismatch(
                        "Grid dimensions change in file time series.",
                        e.iter().product(),
                        dims.iter().product(),
                    ))
                }
                _ => extent = Some(dims),
            }
        }

        let extent =
            extent.ok_or_else(|| Error::InvalidArgument("No file name has been set.".into()))?;
        self.extent = Some(extent);
        Ok(extent)
    }

    fn masked(&self, array: &DataArray) -> Result<DataArray> {
        let data = match &array.data {
            ArrayData::Str(_) => return Ok(array.clone()),
            ArrayData::Float32(v) => ArrayData::Float32(
                v.iter()
                    .map(|x| if *x as f64 == self.mask { f32::NAN } else { *x })
                    .collect(),
            ),
            _ => {
                let values = array.values()?;
                let float = array.kind() == ScalarKind::Float64;
                match float || values.contains(&self.mask) {
                    true => ArrayData::Float64(
                        values
                            .into_iter()
                            .map(|v| if v == self.mask { f64::NAN } else { v })
                            .collect(),
                    ),
                    false => array.data.clone(),
                }
            }
        };
        DataArray::with_components(array.name.clone(), array.components, data)
    }
}

impl Algorithm for SgemsGridReader {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::ImageData)
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

    fn request_information(&mut self, _inputs: &[&Dataset]) -> Result<Information> {
        let [nx, ny, nz] = self.read_extent()?;
        Ok(Information {
            whole_extent: Some([0, nx, 0, ny, 0, nz]),
            timesteps: self.reader.base.timesteps(),
        })
    }

    fn request_data(&mut self, _inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        let [nx, ny, nz] = self.read_extent()?;
        let table = self.reader.read_table(time)?;

        let mut grid = ImageData::new([nx + 1, ny + 1, nz + 1], self.origin, self.spacing);
        for column in table.columns() {
            if column.number_of_tuples() != nx * ny * nz {
                return Err(Error::size_mismatch(
                    format!("Column \"{}\" does not match the grid cells", column.name),
                    nx * ny * nz,
                    column.number_of_tuples(),
                ));
            }
            grid.attributes.add(Association::Cell, self.masked(column)?);
        }
        Ok(grid.into())
    }
}

/// Write the cell data of an image grid in the SGeMS format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgemsWriter {
    /// Number format for every value
    pub format: ValueFormat,
}

impl WriteOut for SgemsWriter {
    fn accepts(&self, kind: DatasetKind) -> bool {
        kind == DatasetKind::ImageData
    }

    fn perform_write_out(&self, dataset: &Dataset, path: &Path, _: Option<&str>) -> Result<()> {
        let grid = dataset.as_image()?;
        let [nx, ny, nz] = grid.dimensions.map(|n| n.saturating_sub(1));

        let arrays = &grid.attributes.cell;
        let columns = arrays
            .iter()
            .map(|a| a.values())
            .collect::<Result<Vec<Vec<f64>>>>()?;
        let rows = columns.first().map(|c| c.len()).unwrap_or(0);

        let mut writer = init_writer(path)?;
        writeln!(writer, "{nx} {ny} {nz}")?;
        writeln!(writer, "{}", arrays.len())?;
        for array in arrays {
            writeln!(writer, "{}", array.name)?;
        }
        for r in 0..rows {
            let line = columns
                .iter()
                .map(|c| c.get(r).map(|v| self.format.format(*v)).unwrap_or_default())
                .collect::<Vec<String>>()
                .join(" ");
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracketed_needs_a_name() {
        assert_eq!(parse_sgems_dims("my_grid (2x3x4)").unwrap(), [2, 3, 4]);
        // no leading name, falls through to plain integers and fails
        assert!(parse_sgems_dims("(2x3x4)").is_err());
    }

    #[test]
    fn plain_integers_anywhere() {
        assert_eq!(parse_sgems_dims("grid of 4 5 6 cells").unwrap(), [4, 5, 6]);
    }
}
