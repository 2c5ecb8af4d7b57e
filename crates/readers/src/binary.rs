//! Packed binary and Madagascar single stream files

// standard library
use std::io::Read;
use std::path::Path;

// geokit modules
use geokit_core::{
    decode_packed, init_reader, Algorithm, AlgorithmState, ArrayData, DataArray, DataType,
    Dataset, DatasetKind, Endian, Error, Information, OutputKind, ReaderBase, Result, Table,
};
use geokit_utils::f;

// external crates
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Control sequence separating the header from the data of an RSF stream
pub const RSF_CONTROL_SEQUENCE: &[u8] = b"\x0c\x0c\x04";

/// How the raw bytes of each file are interpreted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackedOptions {
    /// Name of the single output column
    pub data_name: String,
    /// Type of every value in the stream
    pub dtype: DataType,
    /// Byte order of the stream
    pub endian: Endian,
}

impl Default for PackedOptions {
    fn default() -> Self {
        Self {
            data_name: "Data".into(),
            dtype: DataType::Float,
            endian: Endian::Native,
        }
    }
}

/// Read raw packed binary files into a single column [Table]
///
/// Every file is one timestep. The Madagascar variant drops everything up to
/// and including the RSF control sequence before decoding.
///
/// ```rust
/// # use geokit_core::{Algorithm, DataType, Endian};
/// # use geokit_readers::PackedBinariesReader;
/// # let dir = std::env::temp_dir().join("geokit_packed_doc");
/// # std::fs::create_dir_all(&dir).unwrap();
/// # let path = dir.join("values.bin");
/// let bytes = [1.0f64, 2.0, 3.0].map(f64::to_le_bytes).concat();
/// std::fs::write(&path, bytes).unwrap();
///
/// let mut reader = PackedBinariesReader::new();
/// reader.add_file_name(&path);
/// reader.set_data_type(DataType::Double);
/// reader.set_endian(Endian::Little);
///
/// let table = reader.apply(&[]).unwrap();
/// let column = table.as_table().unwrap().column("Data").unwrap();
/// assert_eq!(column.values().unwrap(), vec![1.0, 2.0, 3.0]);
/// ```
#[derive(Debug, Default)]
pub struct PackedBinariesReader {
    state: AlgorithmState,
    base: ReaderBase,
    options: PackedOptions,
    madagascar: bool,
    data: Vec<ArrayData>,
}

impl PackedBinariesReader {
    /// Reader for plain packed binary files
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader for Madagascar single stream RSF files
    pub fn madagascar() -> Self {
        Self {
            madagascar: true,
            ..Default::default()
        }
    }

    /// Reader with a full set of options
    pub fn with_options(options: PackedOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Current options
    pub fn options(&self) -> &PackedOptions {
        &self.options
    }

    /// Add an input file, one per timestep
    pub fn add_file_name(&mut self, path: impl AsRef<Path>) {
        if self.base.add_file_name(path) {
            self.state.touch();
        }
    }

    /// Remove all input files
    pub fn clear_file_names(&mut self) {
        self.base.clear_file_names();
        self.state.touch();
    }

    /// Set the time between files
    pub fn set_time_delta(&mut self, dt: f64) {
        if self.base.set_time_delta(dt) {
            self.modified(false);
        }
    }

    /// Rename the output column without reading again
    pub fn set_data_name(&mut self, name: &str) {
        if self.options.data_name != name {
            self.options.data_name = name.to_string();
            self.modified(false);
        }
    }

    /// Set the type of the packed values
    pub fn set_data_type(&mut self, dtype: DataType) {
        if self.options.dtype != dtype {
            self.options.dtype = dtype;
            self.modified(true);
        }
    }

    /// Set the byte order of the packed values
    pub fn set_endian(&mut self, endian: Endian) {
        if self.options.endian != endian {
            self.options.endian = endian;
            self.modified(true);
        }
    }

    fn read_file(&self, path: &Path) -> Result<ArrayData> {
        debug!("Reading {}", path.display());
        let mut bytes = Vec::new();
        init_reader(path)?.read_to_end(&mut bytes)?;

        let payload = match self.madagascar {
            true => strip_rsf_header(&bytes),
            false => &bytes[..],
        };
        decode_packed(payload, self.options.dtype, self.options.endian)
    }

    /// Read every file up front
    pub fn read_up_front(&mut self) -> Result<()> {
        if self.base.file_names().is_empty() {
            return Err(Error::InvalidArgument("No file name has been set.".into()));
        }
        self.data = self
            .base
            .file_names()
            .iter()
            .map(|p| self.read_file(p))
            .collect::<Result<Vec<ArrayData>>>()?;
        self.base.mark_read();
        Ok(())
    }
}

/// Bytes after the first RSF control sequence
///
/// Without a control sequence the whole stream is treated as data.
///
/// ```rust
/// # use geokit_readers::strip_rsf_header;
/// let stream = b"in=\"stdin\"\n\x0c\x0c\x04DATA";
/// assert_eq!(strip_rsf_header(stream), b"DATA");
/// assert_eq!(strip_rsf_header(b"DATA"), b"DATA");
/// ```
pub fn strip_rsf_header(bytes: &[u8]) -> &[u8] {
    let n = RSF_CONTROL_SEQUENCE.len();
    match bytes.windows(n).position(|w| w == RSF_CONTROL_SEQUENCE) {
        Some(i) => &bytes[i + n..],
        None => {
            warn!("This is not a single stream RSF format file. Treating entire file as packed binary data.");
            bytes
        }
    }
}

impl Algorithm for PackedBinariesReader {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::Table)
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
        Ok(Information {
            whole_extent: None,
            timesteps: self.base.timesteps(),
        })
    }

    fn request_data(&mut self, _inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        if self.base.need_to_read() {
            self.read_up_front()?;
        }
        let index = self.base.index_for(time);
        let data = self
            .data
            .get(index)
            .cloned()
            .ok_or_else(|| Error::InvalidArgument(f!("No data for timestep index {index}.")))?;

        let mut table = Table::default();
        table.add_column(DataArray::new(self.options.data_name.clone(), data));
        Ok(table.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_control_sequence_is_removed() {
        let stream = b"header\x0c\x0c\x04ab\x0c\x0c\x04cd";
        assert_eq!(strip_rsf_header(stream), b"ab\x0c\x0c\x04cd");
    }

    #[test]
    fn options_default() {
        let options = PackedOptions::default();
        assert_eq!(options.data_name, "Data");
        assert_eq!(options.dtype, DataType::Float);
        assert_eq!(options.endian, Endian::Native);
    }
}
