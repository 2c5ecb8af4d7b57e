//! Golden Software Surfer ASCII grids (`DSAA`)

// standard library
use std::io::Write;
use std::path::Path;

// crate modules
use crate::delimited::{content_lines, numeric_tokens};
use crate::writer::{ValueFormat, WriteOut};

// geokit modules
use geokit_core::{
    init_writer, Algorithm, AlgorithmState, Association, DataArray, Dataset, DatasetKind, Error,
    ImageData, Information, OutputKind, ReaderBase, Result,
};
use geokit_utils::{f, SliceExt};

// external crates
use log::debug;
use serde::{Deserialize, Serialize};

/// Values at or above this are Surfer's blanked nodes
pub const SURFER_NO_DATA: f64 = 1.70141e+38;

/// Header of a Surfer grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurferHeader {
    /// Number of nodes along X
    pub nx: usize,
    /// Number of nodes along Y
    pub ny: usize,
    /// Declared X range
    pub x_range: (f64, f64),
    /// Declared Y range
    pub y_range: (f64, f64),
    /// Declared data range
    pub data_range: (f64, f64),
}

impl SurferHeader {
    /// Parse the five header lines
    pub fn parse(lines: &[String]) -> Result<Self> {
        let bad_format = || Error::ParseError("This file is not in proper Surfer format.".into());

        let pair = |i: usize| -> Result<(f64, f64)> {
            let line = lines.get(i).ok_or_else(bad_format)?;
            let mut values = line.split_whitespace().map(|v| v.parse::<f64>());
            match (values.next(), values.next()) {
                (Some(Ok(a)), Some(Ok(b))) => Ok((a, b)),
                _ => Err(bad_format()),
            }
        };

        let dims = lines.get(1).ok_or_else(bad_format)?;
        let mut counts = dims.split_whitespace().map(|v| v.parse::<usize>());
        let (ny, nx) = match (counts.next(), counts.next()) {
            (Some(Ok(ny)), Some(Ok(nx))) => (ny, nx),
            _ => return Err(bad_format()),
        };

        Ok(Self {
            nx,
            ny,
            x_range: pair(2)?,
            y_range: pair(3)?,
            data_range: pair(4)?,
        })
    }
}

fn allclose(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

/// Read Surfer ASCII grids into [ImageData] with a single point array
///
/// Blanked nodes become NaN and the remaining values must agree with the
/// range declared in the header.
#[derive(Debug)]
pub struct SurferGridReader {
    state: AlgorithmState,
    base: ReaderBase,
    data_name: String,
    grids: Vec<(SurferHeader, Vec<f64>)>,
}

impl Default for SurferGridReader {
    fn default() -> Self {
        Self {
            state: AlgorithmState::default(),
            base: ReaderBase::default(),
            data_name: "Data".into(),
            grids: Vec::new(),
        }
    }
}

impl SurferGridReader {
    /// Reader with the default `Data` array name
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input file, one per timestep
    pub fn add_file_name(&mut self, path: impl AsRef<Path>) {
        if self.base.add_file_name(path) {
            self.state.touch();
        }
    }

    /// Set the time between files
    pub fn set_time_delta(&mut self, dt: f64) {
        if self.base.set_time_delta(dt) {
            self.modified(false);
        }
    }

    /// Name of the output array
    pub fn data_name(&self) -> &str {
        &self.data_name
    }

    /// Rename the output array without reading again
    pub fn set_data_name(&mut self, name: &str) {
        if self.data_name != name {
            self.data_name = name.to_string();
            self.modified(false);
        }
    }

    fn read_file(path: &Path) -> Result<(SurferHeader, Vec<f64>)> {
        debug!("Reading {}", path.display());
        let lines = content_lines(path, "!", 0)?;
        let header = SurferHeader::parse(&lines)?;
        let values = numeric_tokens(&lines[5.min(lines.len())..])?;

        if values.len() != header.nx * header.ny {
            return Err(Error::size_mismatch(
                "Surfer grid body does not match the header",
                header.nx * header.ny,
                values.len(),
            ));
        }

        let values = values
            .into_iter()
            .map(|v| if v >= SURFER_NO_DATA { f64::NAN } else { v })
            .collect::<Vec<f64>>();

        let (dmin, dmax) = header.data_range;
        let (min, max) = values.finite_range().unwrap_or((f64::NAN, f64::NAN));
        if !allclose(dmin, min) {
            return Err(Error::InvalidArgument(f!(
                "Min of data ({min}) doesn't match that set by file ({dmin})."
            )));
        }
        if !allclose(dmax, max) {
            return Err(Error::InvalidArgument(f!(
                "Max of data ({max}) doesn't match that set by file ({dmax})."
            )));
        }
        Ok((header, values))
    }

    /// Read every file up front
    pub fn read_up_front(&mut self) -> Result<()> {
        if self.base.file_names().is_empty() {
            return Err(Error::InvalidArgument("No file name has been set.".into()));
        }
        self.grids = self
            .base
            .file_names()
            .iter()
            .map(|p| Self::read_file(p))
            .collect::<Result<Vec<_>>>()?;
        self.base.mark_read();
        Ok(())
    }
}

impl Algorithm for SurferGridReader {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::ImageData)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn modified(&mut self, read_again: bool) {
        self.base.modified(read_again);
        self.state.touch();
    }

    fn request_information(&mut self, _inputs: &[&Dataset]) -> Result<Information> {
        if self.base.need_to_read() {
            self.read_up_front()?;
        }
        let extent = self
            .grids
            .first()
            .map(|(h, _)| [0, h.nx.saturating_sub(1), 0, h.ny.saturating_sub(1), 0, 0]);
        Ok(Information {
            whole_extent: extent,
            timesteps: self.base.timesteps(),
        })
    }

    fn request_data(&mut self, _inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        if self.base.need_to_read() {
            self.read_up_front()?;
        }
        let index = self.base.index_for(time);
        let (header, values) = self
            .grids
            .get(index)
            .ok_or_else(|| Error::InvalidArgument(f!("No data for timestep index {index}.")))?;

        let SurferHeader {
            nx,
            ny,
            x_range,
            y_range,
            ..
        } = *header;
        let spacing = [
            (x_range.1 - x_range.0) / nx as f64,
            (y_range.1 - y_range.0) / ny as f64,
            100.0,
        ];
        let mut grid = ImageData::new([nx, ny, 1], [x_range.0, y_range.0, 0.0], spacing);

        // file rows run along Y, output is X fastest
        let mut data = Vec::with_capacity(values.len());
        for j in 0..ny {
            for i in 0..nx {
                data.push(values[i * ny + j]);
            }
        }
        grid.attributes
            .add(Association::Point, DataArray::new(self.data_name.clone(), data));
        Ok(grid.into())
    }
}

/// Write one array of a 2-D image grid on the XY plane to a Surfer grid
///
/// The array is found by name among the point then cell data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurferWriter {
    /// Name of the array to write
    pub array_name: String,
    /// Number format for the body
    pub format: ValueFormat,
}

impl Default for SurferWriter {
    fn default() -> Self {
        Self {
            array_name: "Data".into(),
            format: ValueFormat::default(),
        }
    }
}

impl SurferWriter {
    /// Writer for a named array
    pub fn new(array_name: &str) -> Self {
        Self {
            array_name: array_name.to_string(),
            ..Default::default()
        }
    }
}

impl WriteOut for SurferWriter {
    fn accepts(&self, kind: DatasetKind) -> bool {
        kind == DatasetKind::ImageData
    }

    fn perform_write_out(&self, dataset: &Dataset, path: &Path, _: Option<&str>) -> Result<()> {
        let grid = dataset.as_image()?;
        let [nx, ny, nz] = grid.dimensions;
        if nx == 1 && ny == 1 && nz != 1 {
            return Err(Error::InvalidArgument(
                "Only 2D data on the XY plane is supported at this time.".into(),
            ));
        }

        let [ox, oy, _] = grid.origin;
        let [dx, dy, _] = grid.spacing;
        let (xmin, xmax) = (ox, ox + dx * nx as f64);
        let (ymin, ymax) = (oy, oy + dy * ny as f64);

        let (array, _) = dataset.search_by_name(&self.array_name)?;
        let values = array.values()?;
        if values.len() < nx * ny {
            return Err(Error::size_mismatch(
                f!("Array \"{}\" is too short for the grid", self.array_name),
                nx * ny,
                values.len(),
            ));
        }
        let (dmin, dmax) = values.finite_range().unwrap_or((f64::NAN, f64::NAN));

        let mut writer = init_writer(path)?;
        writeln!(writer, "DSAA")?;
        writeln!(writer, "{ny} {nx}")?;
        writeln!(writer, "{xmin:.6} {xmax:.6}")?;
        writeln!(writer, "{ymin:.6} {ymax:.6}")?;
        writeln!(writer, "{dmin:.6} {dmax:.6}")?;
        for i in 0..nx {
            let row = (0..ny)
                .map(|j| self.format.format(values[i + nx * j]))
                .collect::<Vec<String>>()
                .join(" ");
            writeln!(writer, "{row}")?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.to_string()).collect()
    }

    #[test]
    fn header_counts_are_y_then_x() {
        let header = SurferHeader::parse(&lines("DSAA\n3 2\n0 10\n5 20\n-1 1")).unwrap();
        assert_eq!((header.nx, header.ny), (2, 3));
        assert_eq!(header.y_range, (5.0, 20.0));
    }

    #[test]
    fn header_rejects_text() {
        let err = SurferHeader::parse(&lines("DSAA\nthree 2\n0 10\n5 20\n-1 1")).unwrap_err();
        assert_eq!(err.to_string(), "This file is not in proper Surfer format.");
    }
}
