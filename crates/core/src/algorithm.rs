//! The contract shared by every reader, filter, source and writer
//!
//! An [Algorithm] declares its input ports and output kind, publishes
//! [Information] (whole extent and timesteps) in a pre-pass, and produces a
//! [Dataset] on request. Two entry points are provided:
//!
//! - [Algorithm::update] never fails. Errors are wrapped in the sentinel pair
//!   hosts look for in their log stream, stored on the algorithm and an empty
//!   dataset of the declared kind is returned instead.
//! - [Algorithm::apply] runs the same pass but returns errors directly.
//!
//! ```rust
//! # use geokit_core::{Algorithm, AlgorithmState, Dataset, DatasetKind, OutputKind, Table};
//! # use geokit_core::{DataArray, Error, Result};
//! #[derive(Debug, Default)]
//! struct Constant {
//!     state: AlgorithmState,
//!     fail: bool,
//! }
//!
//! impl Algorithm for Constant {
//!     fn output_kind(&self) -> OutputKind {
//!         OutputKind::Fixed(DatasetKind::Table)
//!     }
//!     fn state(&self) -> &AlgorithmState {
//!         &self.state
//!     }
//!     fn state_mut(&mut self) -> &mut AlgorithmState {
//!         &mut self.state
//!     }
//!     fn request_data(&mut self, _: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
//!         if self.fail {
//!             return Err(Error::InvalidArgument("bad parameter".into()));
//!         }
//!         let mut table = Table::default();
//!         table.add_column(DataArray::new("one", vec![1.0]));
//!         Ok(table.into())
//!     }
//! }
//!
//! let mut source = Constant { fail: true, ..Default::default() };
//! let output = source.update(&[], None);
//! assert!(output.is_empty());
//! assert!(source.error_occurred());
//! assert!(source.error_message().unwrap().starts_with("@@@@PVGeoError --->"));
//! ```

// crate modules
use crate::dataset::{Dataset, DatasetKind};
use crate::error::{Error, Result};

// geokit modules
use geokit_utils::f;

// external crates
use log::{debug, error};

/// Leading half of the sentinel pair wrapping captured error messages
pub const ERROR_PREFIX: &str = "@@@@PVGeoError ---> ";

/// Trailing half of the sentinel pair wrapping captured error messages
pub const ERROR_SUFFIX: &str = " <--- PVGeoError@@@@";

/// Wrap a message in the error sentinels
///
/// ```rust
/// # use geokit_core::wrap_error_message;
/// assert_eq!(
///     wrap_error_message("No angle found."),
///     "@@@@PVGeoError ---> No angle found. <--- PVGeoError@@@@"
/// );
/// ```
pub fn wrap_error_message(message: &str) -> String {
    f!("{ERROR_PREFIX}{message}{ERROR_SUFFIX}")
}

/// Pull the message back out of a sentinel-wrapped line
///
/// ```rust
/// # use geokit_core::{strip_error_message, wrap_error_message};
/// let line = format!("ERROR: {}", wrap_error_message("bad"));
/// assert_eq!(strip_error_message(&line), Some("bad"));
/// assert_eq!(strip_error_message("nothing to see"), None);
/// ```
pub fn strip_error_message(line: &str) -> Option<&str> {
    let start = line.find(ERROR_PREFIX)? + ERROR_PREFIX.len();
    let end = start + line[start..].find(ERROR_SUFFIX)?;
    Some(&line[start..end])
}

/// Values published by the information pre-pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Information {
    /// Index range `(i0, i1, j0, j1, k0, k1)` of structured outputs
    pub whole_extent: Option<[usize; 6]>,
    /// Timestep values, empty when the output is not time varying
    pub timesteps: Vec<f64>,
}

/// What an input port will accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Any dataset
    Any,
    /// Anything with explicit points (poly data or unstructured grids)
    PointSet,
    /// One specific kind
    Kind(DatasetKind),
}

impl PortKind {
    /// True if a dataset of `kind` may be connected to this port
    pub fn accepts(&self, kind: DatasetKind) -> bool {
        match self {
            Self::Any => true,
            Self::PointSet => matches!(
                kind,
                DatasetKind::PolyData | DatasetKind::UnstructuredGrid
            ),
            Self::Kind(k) => *k == kind,
        }
    }
}

/// Declared kind of the primary output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Always this kind
    Fixed(DatasetKind),
    /// The kind of whatever is connected to input 0
    SameAsInput,
}

/// Cache and bookkeeping owned by every algorithm
///
/// The `epoch` is bumped by every modification so callers can tell whether a
/// cached output is stale.
#[derive(Debug, Clone)]
pub struct AlgorithmState {
    dirty: bool,
    epoch: u64,
    last_time: Option<f64>,
    output: Option<Dataset>,
    error: Option<String>,
    information: Information,
}

impl Default for AlgorithmState {
    fn default() -> Self {
        Self {
            dirty: true,
            epoch: 0,
            last_time: None,
            output: None,
            error: None,
            information: Information::default(),
        }
    }
}

impl AlgorithmState {
    /// Fresh state, dirty until the first update
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the cached output as stale
    pub fn touch(&mut self) {
        self.dirty = true;
        self.epoch += 1;
    }

    /// True when the next update must re-execute
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of modifications so far
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The cached output of the last update
    pub fn output(&self) -> Option<&Dataset> {
        self.output.as_ref()
    }

    /// The information published by the last pre-pass
    pub fn information(&self) -> &Information {
        &self.information
    }

    /// Message captured by the last failed update
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn store(&mut self, output: Dataset, time: Option<f64>) {
        self.output = Some(output);
        self.dirty = false;
        self.last_time = time;
    }
}

/// Uniform interface of every reader, filter, source and writer
pub trait Algorithm {
    /// Accepted kinds for each input port, empty for readers and sources
    fn input_ports(&self) -> Vec<PortKind> {
        Vec::new()
    }

    /// Declared kind of the primary output
    fn output_kind(&self) -> OutputKind;

    /// Shared bookkeeping
    fn state(&self) -> &AlgorithmState;

    /// Mutable shared bookkeeping
    fn state_mut(&mut self) -> &mut AlgorithmState;

    /// Publish whole extent and timesteps ahead of a data request
    fn request_information(&mut self, _inputs: &[&Dataset]) -> Result<Information> {
        Ok(Information::default())
    }

    /// Produce the output for an optional requested time
    fn request_data(&mut self, inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset>;

    /// Mark the algorithm as modified
    ///
    /// Readers also use `read_again` to decide whether files need to be read
    /// from disk again, as opposed to only rebuilding the output.
    fn modified(&mut self, _read_again: bool) {
        self.state_mut().touch();
    }

    /// Resolve the output kind against the connected inputs
    fn resolved_output_kind(&self, inputs: &[&Dataset]) -> DatasetKind {
        match self.output_kind() {
            OutputKind::Fixed(kind) => kind,
            OutputKind::SameAsInput => inputs
                .first()
                .map(|d| d.kind())
                .unwrap_or(DatasetKind::PolyData),
        }
    }

    /// Run the information pre-pass and keep the result
    fn update_information(&mut self, inputs: &[&Dataset]) -> Result<Information> {
        let info = self.request_information(inputs)?;
        self.state_mut().information = info.clone();
        Ok(info)
    }

    /// Timestep values published by the last information pass
    fn timesteps(&self) -> &[f64] {
        &self.state().information.timesteps
    }

    /// Bring the output up to date without ever failing
    ///
    /// Nothing is re-executed when the algorithm is clean and the requested
    /// time is unchanged. Errors are logged and captured on the error
    /// channel, with an empty dataset of the declared kind as the output.
    fn update(&mut self, inputs: &[&Dataset], time: Option<f64>) -> &Dataset {
        let kind = self.resolved_output_kind(inputs);
        let needs_run = {
            let state = self.state();
            state.dirty || state.last_time != time || state.output.is_none()
        };

        if needs_run {
            let output = match self.execute(inputs, time) {
                Ok(output) => {
                    self.state_mut().error = None;
                    output
                }
                Err(e) => {
                    let message = wrap_error_message(&e.to_string());
                    error!("{message}");
                    self.state_mut().error = Some(message);
                    Dataset::empty(kind)
                }
            };
            self.state_mut().store(output, time);
        }

        self.state_mut()
            .output
            .get_or_insert_with(|| Dataset::empty(kind))
    }

    /// Run a full pass and return the output, re-raising any error
    fn apply(&mut self, inputs: &[&Dataset]) -> Result<Dataset> {
        self.apply_at(inputs, None)
    }

    /// Run a full pass for a requested time, re-raising any error
    fn apply_at(&mut self, inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        match self.execute(inputs, time) {
            Ok(output) => {
                self.state_mut().error = None;
                self.state_mut().store(output.clone(), time);
                Ok(output)
            }
            Err(e) => {
                self.state_mut().error = Some(wrap_error_message(&e.to_string()));
                Err(e)
            }
        }
    }

    /// True if the last update captured an error
    fn error_occurred(&self) -> bool {
        self.state().error.is_some()
    }

    /// The sentinel-wrapped message of the last captured error
    fn error_message(&self) -> Option<&str> {
        self.state().error_message()
    }

    /// Validate inputs, run the information pass then the data pass
    fn execute(&mut self, inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        let ports = self.input_ports();
        if inputs.len() != ports.len() {
            return Err(Error::InvalidArgument(f!(
                "expected {} input(s), found {}",
                ports.len(),
                inputs.len()
            )));
        }

        for (i, (port, input)) in ports.iter().zip(inputs).enumerate() {
            if !port.accepts(input.kind()) {
                return Err(Error::InvalidArgument(f!(
                    "input {i} of kind {:?} is not accepted by this algorithm",
                    input.kind()
                )));
            }
        }

        if inputs.iter().any(|d| d.is_empty()) {
            debug!("Empty input, skipping execution");
            return Ok(Dataset::empty(self.resolved_output_kind(inputs)));
        }

        self.update_information(inputs)?;
        self.request_data(inputs, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataArray, PolyData, Table};

    #[derive(Debug, Default)]
    struct Counter {
        state: AlgorithmState,
        runs: usize,
    }

    impl Algorithm for Counter {
        fn input_ports(&self) -> Vec<PortKind> {
            vec![PortKind::PointSet]
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

        fn request_information(&mut self, _: &[&Dataset]) -> Result<Information> {
            Ok(Information {
                whole_extent: None,
                timesteps: vec![0.0, 1.0],
            })
        }

        fn request_data(&mut self, inputs: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
            self.runs += 1;
            Ok(inputs[0].clone())
        }
    }

    fn cloud() -> Dataset {
        PolyData::from_points(vec![[0.0; 3], [1.0; 3]]).into()
    }

    #[test]
    fn update_is_idempotent() {
        let input = cloud();
        let mut counter = Counter::default();
        counter.update(&[&input], None);
        counter.update(&[&input], None);
        assert_eq!(counter.runs, 1);
        assert_eq!(counter.timesteps(), &[0.0, 1.0]);

        // a new time re-executes
        counter.update(&[&input], Some(1.0));
        assert_eq!(counter.runs, 2);

        // so does a modification
        counter.modified(false);
        counter.update(&[&input], Some(1.0));
        assert_eq!(counter.runs, 3);
        assert_eq!(counter.state().epoch(), 1);
    }

    #[test]
    fn empty_input_short_circuits() {
        let input = Dataset::empty(DatasetKind::PolyData);
        let mut counter = Counter::default();
        let output = counter.update(&[&input], None).clone();
        assert!(output.is_empty());
        assert_eq!(counter.runs, 0);
        assert!(!counter.error_occurred());
    }

    #[test]
    fn wrong_kind_is_captured() {
        let mut table = Table::default();
        table.add_column(DataArray::new("a", vec![1.0]));
        let input = Dataset::from(table);

        let mut counter = Counter::default();
        let output = counter.update(&[&input], None);
        assert_eq!(output.kind(), DatasetKind::Table);
        assert!(counter.error_occurred());

        assert!(matches!(
            counter.apply(&[&input]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(counter.apply(&[&cloud()]).is_ok());
        assert!(!counter.error_occurred());
    }

    #[test]
    fn sentinel_round_trip() {
        let wrapped = wrap_error_message("Invalid solution");
        assert!(wrapped.ends_with(ERROR_SUFFIX));
        assert_eq!(strip_error_message(&wrapped), Some("Invalid solution"));
    }
}
