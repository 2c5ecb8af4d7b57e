//! Esri ASCII raster grids

// standard library
use std::path::Path;

// crate modules
use crate::delimited::{content_lines, numeric_tokens};

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Association, DataArray, Dataset, DatasetKind, Error, ImageData,
    Information, OutputKind, ReaderBase, Result,
};
use geokit_utils::f;

// external crates
use log::debug;

/// The six key/value lines at the top of an Esri grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EsriHeader {
    /// `ncols`
    pub ncols: usize,
    /// `nrows`
    pub nrows: usize,
    /// `xllcorner`
    pub xll: f64,
    /// `yllcorner`
    pub yll: f64,
    /// `cellsize`
    pub cell_size: f64,
    /// `NODATA_value`
    pub no_data: f64,
}

impl EsriHeader {
    /// Parse the header from the second token of the first six lines
    ///
    /// ```rust
    /// # use geokit_readers::EsriHeader;
    /// let lines = ["ncols 4", "nrows 6", "xllcorner 100", "yllcorner 50", "cellsize 50", "NODATA_value -9999"]
    ///     .map(String::from);
    /// let header = EsriHeader::parse(&lines).unwrap();
    /// assert_eq!((header.ncols, header.nrows), (4, 6));
    /// assert_eq!(header.no_data, -9999.0);
    /// ```
    pub fn parse(lines: &[String]) -> Result<Self> {
        let bad_format =
            || Error::ParseError("This file is not in proper Esri ASCII Grid format.".into());

        let token = |i: usize| -> Result<&str> {
            lines
                .get(i)
                .and_then(|l| l.split_whitespace().nth(1))
                .ok_or_else(bad_format)
        };
        let count = |i: usize| token(i)?.parse::<usize>().map_err(|_| bad_format());
        let value = |i: usize| token(i)?.parse::<f64>().map_err(|_| bad_format());

        Ok(Self {
            ncols: count(0)?,
            nrows: count(1)?,
            xll: value(2)?,
            yll: value(3)?,
            cell_size: value(4)?,
            no_data: value(5)?,
        })
    }
}

/// Read Esri ASCII grids into [ImageData]
///
/// Rows in the file run north to south, so they are flipped to place the
/// origin at the lower left corner. Values equal to `NODATA_value` become
/// NaN.
#[derive(Debug)]
pub struct EsriGridReader {
    state: AlgorithmState,
    base: ReaderBase,
    data_name: String,
    grids: Vec<(EsriHeader, Vec<f64>)>,
}

impl Default for EsriGridReader {
    fn default() -> Self {
        Self {
            state: AlgorithmState::default(),
            base: ReaderBase::default(),
            data_name: "Data".into(),
            grids: Vec::new(),
        }
    }
}

impl EsriGridReader {
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

    fn read_file(path: &Path) -> Result<(EsriHeader, Vec<f64>)> {
        debug!("Reading {}", path.display());
        let lines = content_lines(path, "!", 0)?;
        let header = EsriHeader::parse(&lines)?;
        let values = numeric_tokens(&lines[6.min(lines.len())..])?;

        let (nx, ny) = (header.ncols, header.nrows);
        if values.len() != nx * ny {
            return Err(Error::size_mismatch(
                "Esri grid body does not match the header",
                nx * ny,
                values.len(),
            ));
        }

        // flip rows so the first output row is the southern one
        let mut data = Vec::with_capacity(values.len());
        for j in 0..ny {
            let row = &values[(ny - 1 - j) * nx..(ny - j) * nx];
            data.extend(
                row.iter()
                    .map(|v| if *v == header.no_data { f64::NAN } else { *v }),
            );
        }
        Ok((header, data))
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

impl Algorithm for EsriGridReader {
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
        let extent = self.grids.first().map(|(h, _)| {
            [0, h.ncols.saturating_sub(1), 0, h.nrows.saturating_sub(1), 0, 0]
        });
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
        let (header, data) = self
            .grids
            .get(index)
            .ok_or_else(|| Error::InvalidArgument(f!("No data for timestep index {index}.")))?;

        let mut grid = ImageData::new(
            [header.ncols, header.nrows, 1],
            [header.xll, header.yll, 0.0],
            [header.cell_size; 3],
        );
        grid.attributes.add(
            Association::Point,
            DataArray::new(self.data_name.clone(), data.clone()),
        );
        Ok(grid.into())
    }
}
