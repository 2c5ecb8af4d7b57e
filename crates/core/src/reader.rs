//! Bookkeeping shared by all file readers

// standard library
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

// crate modules
use crate::error::{Error, Result};
use crate::timeseries::Timeline;

// geokit modules
use geokit_utils::f;

// external crates
use log::debug;

/// File list, time step and dirty flags for a reader
///
/// File names are kept in insertion order and never duplicated. The
/// `need_to_read` flag is raised by any change that requires going back to
/// disk and cleared once a reader has consumed its files.
///
/// ```rust
/// # use geokit_core::ReaderBase;
/// let mut base = ReaderBase::default();
/// base.add_file_name("model0.mod");
/// base.add_file_name("model1.mod");
/// base.add_file_name("model0.mod");
///
/// assert_eq!(base.file_names().len(), 2);
/// assert_eq!(base.timesteps(), vec![0.0, 1.0]);
/// assert!(base.need_to_read());
/// ```
#[derive(Debug, Clone)]
pub struct ReaderBase {
    file_names: Vec<PathBuf>,
    dt: f64,
    need_to_read: bool,
}

impl Default for ReaderBase {
    fn default() -> Self {
        Self {
            file_names: Vec::new(),
            dt: 1.0,
            need_to_read: true,
        }
    }
}

impl ReaderBase {
    /// Add a file name, ignoring duplicates
    ///
    /// Returns true if the list changed.
    pub fn add_file_name(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref().to_path_buf();
        if self.file_names.contains(&path) {
            return false;
        }
        self.file_names.push(path);
        self.need_to_read = true;
        true
    }

    /// Remove every file name
    pub fn clear_file_names(&mut self) {
        self.file_names.clear();
        self.need_to_read = true;
    }

    /// File names in insertion order
    pub fn file_names(&self) -> &[PathBuf] {
        &self.file_names
    }

    /// The only file name, failing if there is not exactly one
    pub fn single_file_name(&self) -> Result<&Path> {
        match self.file_names.as_slice() {
            [only] => Ok(only.as_path()),
            [] => Err(Error::InvalidArgument("No file name has been set.".into())),
            _ => Err(Error::InvalidArgument(f!(
                "Expected a single file, found {}.",
                self.file_names.len()
            ))),
        }
    }

    /// Time between consecutive files
    pub fn time_delta(&self) -> f64 {
        self.dt
    }

    /// Set the time between consecutive files
    pub fn set_time_delta(&mut self, dt: f64) -> bool {
        if self.dt == dt {
            return false;
        }
        self.dt = dt;
        true
    }

    /// The timeline over the current files
    pub fn timeline(&self) -> Timeline {
        Timeline::new(self.file_names.len(), self.dt)
    }

    /// Published timesteps, empty for a single file
    pub fn timesteps(&self) -> Vec<f64> {
        self.timeline().timesteps()
    }

    /// File index for a requested time
    pub fn index_for(&self, time: Option<f64>) -> usize {
        self.timeline().index_for(time)
    }

    /// True if the files must be read again
    pub fn need_to_read(&self) -> bool {
        self.need_to_read
    }

    /// Record a modification, optionally requiring a fresh read
    pub fn modified(&mut self, read_again: bool) {
        if read_again {
            self.need_to_read = true;
        }
    }

    /// Record that the files have been read
    pub fn mark_read(&mut self) {
        debug!("Read {} file(s)", self.file_names.len());
        self.need_to_read = false;
    }
}

/// Open a file for buffered reading
pub fn init_reader(path: impl AsRef<Path>) -> Result<BufReader<File>> {
    let file = File::open(path.as_ref())?;
    Ok(BufReader::new(file))
}

/// Create or truncate a file for buffered writing
pub fn init_writer(path: impl AsRef<Path>) -> Result<BufWriter<File>> {
    let file = File::create(path.as_ref())?;
    Ok(BufWriter::new(file))
}

/// Every line of a text file
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    use std::io::BufRead;
    let reader = init_reader(path)?;
    Ok(reader.lines().collect::<std::io::Result<Vec<String>>>()?)
}

/// Base name of a path as a string, used for array naming
pub fn base_name(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
