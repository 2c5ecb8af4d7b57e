//! Shared machinery for file writers
//!
//! A format implements [WriteOut] for a single dataset. Collections are
//! handled once for every format: each block is written to its own numbered
//! file next to the requested one, and blocks the format can not hold are
//! skipped with a warning.

// standard library
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Dataset, DatasetKind, Error, OutputKind, PortKind, Result,
};
use geokit_utils::{f, ValueExt};

// external crates
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// printf style number formats accepted by the writers
///
/// ```rust
/// # use geokit_readers::ValueFormat;
/// let fmt: ValueFormat = "%.9e".parse().unwrap();
/// assert_eq!(fmt.format(1250.0), "1.250000000e+03");
///
/// let fmt: ValueFormat = "%.2f".parse().unwrap();
/// assert_eq!(fmt.format(3.14159), "3.14");
///
/// assert_eq!(ValueFormat::Integer.format(2.0), "2");
/// assert!("%q".parse::<ValueFormat>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueFormat {
    /// `%.{n}e`
    Scientific(usize),
    /// `%.{n}f`
    Fixed(usize),
    /// `%d`
    Integer,
    /// `%g`, shortest round-trip representation
    General,
}

impl Default for ValueFormat {
    fn default() -> Self {
        Self::Scientific(9)
    }
}

impl ValueFormat {
    /// Format a single value
    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return f!("{value}").to_lowercase();
        }
        match self {
            Self::Scientific(p) => value.sci(*p, 2),
            Self::Fixed(p) => f!("{value:.p$}", p = *p),
            Self::Integer => f!("{}", value.round() as i64),
            Self::General => f!("{value}"),
        }
    }
}

impl FromStr for ValueFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::InvalidArgument(f!("Unsupported number format \"{s}\"."));
        let spec = s.trim().strip_prefix('%').ok_or_else(bad)?;
        let conversion = spec.chars().last().ok_or_else(bad)?;
        let body = &spec[..spec.len() - conversion.len_utf8()];

        let precision = match body.split_once('.') {
            Some((_, p)) if p.is_empty() => Some(0),
            Some((_, p)) => Some(p.parse::<usize>().map_err(|_| bad())?),
            None => None,
        };

        match conversion {
            'e' | 'E' => Ok(Self::Scientific(precision.unwrap_or(6))),
            'f' | 'F' => Ok(Self::Fixed(precision.unwrap_or(6))),
            'd' | 'i' => Ok(Self::Integer),
            'g' | 'G' => Ok(Self::General),
            _ => Err(bad()),
        }
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scientific(p) => write!(f, "%.{p}e"),
            Self::Fixed(p) => write!(f, "%.{p}f"),
            Self::Integer => write!(f, "%d"),
            Self::General => write!(f, "%g"),
        }
    }
}

/// A file format that can write a single dataset
pub trait WriteOut {
    /// Kinds of dataset this format can hold
    fn accepts(&self, kind: DatasetKind) -> bool;

    /// Write one dataset, `block_name` is set for members of a collection
    fn perform_write_out(
        &self,
        dataset: &Dataset,
        path: &Path,
        block_name: Option<&str>,
    ) -> Result<()>;

    /// Write a dataset or every acceptable block of a collection
    fn write(&self, dataset: &Dataset, path: impl AsRef<Path>) -> Result<()>
    where
        Self: Sized,
    {
        let path = path.as_ref();
        match dataset {
            Dataset::MultiBlock(blocks) => {
                let names = block_file_names(path, blocks.blocks.len());
                for (i, ((name, block), file)) in blocks.blocks.iter().zip(names).enumerate() {
                    match self.accepts(block.kind()) {
                        true => self.perform_write_out(block, &file, Some(name))?,
                        false => warn!(
                            "Input block {i} of type {:?} not saveable by writer.",
                            block.kind()
                        ),
                    }
                }
                Ok(())
            }
            single if self.accepts(single.kind()) => {
                debug!("Writing {}", path.display());
                self.perform_write_out(single, path, None)
            }
            other => Err(Error::InvalidArgument(f!(
                "{:?} can not be written in this format.",
                other.kind()
            ))),
        }
    }
}

/// Numbered file names for the blocks of a collection
///
/// The block number is zero padded to the number of digits in the count and
/// inserted before the extension.
///
/// ```rust
/// # use geokit_readers::block_file_names;
/// # use std::path::PathBuf;
/// let names = block_file_names("out/model.mod", 12);
/// assert_eq!(names[0], PathBuf::from("out/model_00.mod"));
/// assert_eq!(names[11], PathBuf::from("out/model_11.mod"));
/// ```
pub fn block_file_names(path: impl AsRef<Path>, count: usize) -> Vec<PathBuf> {
    let path = path.as_ref();
    let digits = count.to_string().len();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().to_string());

    (0..count)
        .map(|i| {
            let name = match &extension {
                Some(ext) => f!("{stem}_{i:0digits$}.{ext}"),
                None => f!("{stem}_{i:0digits$}"),
            };
            path.with_file_name(name)
        })
        .collect()
}

/// Algorithm wrapper that runs a [WriteOut] format on its single input
///
/// The input is passed through unchanged as the output.
///
/// ```rust, no_run
/// # use geokit_core::{Algorithm, DataArray, Table};
/// # use geokit_readers::{GslibWriter, Writer};
/// let mut table = Table::default();
/// table.add_column(DataArray::new("rho", vec![2.5, 2.7]));
///
/// let mut writer = Writer::new(GslibWriter::default(), "table.gslib");
/// writer.apply(&[&table.into()]).unwrap();
/// ```
#[derive(Debug)]
pub struct Writer<W> {
    state: AlgorithmState,
    file_name: PathBuf,
    format: W,
}

impl<W: WriteOut> Writer<W> {
    /// Write with `format` to `file_name`
    pub fn new(format: W, file_name: impl AsRef<Path>) -> Self {
        Self {
            state: AlgorithmState::default(),
            file_name: file_name.as_ref().to_path_buf(),
            format,
        }
    }

    /// Target file
    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    /// Change the target file
    pub fn set_file_name(&mut self, path: impl AsRef<Path>) {
        if self.file_name != path.as_ref() {
            self.file_name = path.as_ref().to_path_buf();
            self.state.touch();
        }
    }

    /// The wrapped format
    pub fn format(&self) -> &W {
        &self.format
    }

    /// Mutable access to the wrapped format, marks the writer modified
    pub fn format_mut(&mut self) -> &mut W {
        self.state.touch();
        &mut self.format
    }
}

impl<W: WriteOut> Algorithm for Writer<W> {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Any]
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::SameAsInput
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn request_data(&mut self, inputs: &[&Dataset], _time: Option<f64>) -> Result<Dataset> {
        self.format.write(inputs[0], &self.file_name)?;
        Ok(inputs[0].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_formats() {
        assert_eq!("%.9e".parse::<ValueFormat>().unwrap(), ValueFormat::Scientific(9));
        assert_eq!("%f".parse::<ValueFormat>().unwrap(), ValueFormat::Fixed(6));
        assert_eq!("%10.3f".parse::<ValueFormat>().unwrap(), ValueFormat::Fixed(3));
        assert_eq!("%d".parse::<ValueFormat>().unwrap(), ValueFormat::Integer);
        assert!("9e".parse::<ValueFormat>().is_err());
        assert!("%".parse::<ValueFormat>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for fmt in [ValueFormat::Scientific(4), ValueFormat::Fixed(2), ValueFormat::Integer] {
            assert_eq!(fmt.to_string().parse::<ValueFormat>().unwrap(), fmt);
        }
    }

    #[test]
    fn non_finite_values() {
        assert_eq!(ValueFormat::default().format(f64::NAN), "nan");
        assert_eq!(ValueFormat::Fixed(2).format(f64::INFINITY), "inf");
    }

    #[test]
    fn block_names_without_extension() {
        let names = block_file_names("slices", 3);
        assert_eq!(names[2], PathBuf::from("slices_2"));
    }
}
