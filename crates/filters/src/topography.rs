//! Flag the cells of a volume against a topographic surface

// standard library
use std::str::FromStr;

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Association, DataArray, Dataset, DatasetKind, Error, KdTree,
    OutputKind, PortKind, Result,
};
use geokit_utils::f;

// external crates
use log::debug;
use serde::{Deserialize, Serialize};

/// How a cell center is compared against the nearest surface point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Active below the surface, by more than the tolerance
    #[default]
    Underneath,
    /// Active within the tolerance of the surface
    Intersection,
}

impl Operation {
    /// Names accepted by [Operation::from_str]
    pub fn names() -> [&'static str; 2] {
        ["underneath", "intersection"]
    }

    /// Compare a cell center elevation with the surface elevation
    pub fn is_active(&self, center_z: f64, surface_z: f64, tolerance: f64) -> bool {
        match self {
            Self::Underneath => center_z < surface_z - tolerance,
            Self::Intersection => (center_z - surface_z).abs() < tolerance,
        }
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "underneath" => Ok(Self::Underneath),
            "intersection" => Ok(Self::Intersection),
            _ => Err(Error::InvalidArgument(f!(
                "Unknown extraction operation \"{s}\", expected one of {:?}",
                Self::names()
            ))),
        }
    }
}

/// Parameters of [ExtractTopography]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopographyOptions {
    /// Comparison against the surface
    pub operation: Operation,
    /// Tolerance of the comparison
    pub tolerance: f64,
    /// Shift applied to the surface elevation
    pub offset: f64,
    /// Flip active and inactive cells
    pub invert: bool,
    /// Drop inactive cells, giving an unstructured grid
    pub remove: bool,
    /// Match surface points on X and Y only rather than in 3D
    pub horizontal_only: bool,
}

impl Default for TopographyOptions {
    fn default() -> Self {
        Self {
            operation: Operation::Underneath,
            tolerance: 0.001,
            offset: 0.0,
            invert: false,
            remove: false,
            horizontal_only: false,
        }
    }
}

impl TopographyOptions {
    /// Load options from a json string, missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise the options to pretty json
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Add an `Extracted` cell array marking cells against a surface
///
/// Input 0 is any dataset with cells, input 1 a point cloud sampling the
/// topographic surface. Every cell center is matched to its nearest surface
/// point and flagged 1 or 0 by the chosen [Operation]. The surface is static,
/// so time on the volume passes straight through.
///
/// ```rust
/// # use geokit_core::{Algorithm, Association, Dataset, ImageData, PolyData};
/// # use geokit_filters::ExtractTopography;
/// let grid = Dataset::from(ImageData::new([3, 3, 4], [0.0; 3], [1.0; 3]));
/// let surface = Dataset::from(PolyData::from_points(vec![[1.0, 1.0, 2.0]]));
///
/// let mut filter = ExtractTopography::new();
/// let output = filter.apply(&[&grid, &surface]).unwrap();
/// let active = output.get_array(Association::Cell, "Extracted").unwrap();
///
/// // the lower two layers of cells sit below the surface
/// assert_eq!(active.values().unwrap().iter().sum::<f64>(), 8.0);
/// ```
#[derive(Debug, Default)]
pub struct ExtractTopography {
    state: AlgorithmState,
    options: TopographyOptions,
}

impl ExtractTopography {
    /// Flag cells underneath the surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an instance of the [ExtractTopographyBuilder]
    pub fn builder() -> ExtractTopographyBuilder {
        ExtractTopographyBuilder::default()
    }

    /// Current options
    pub fn options(&self) -> &TopographyOptions {
        &self.options
    }

    /// Comparison against the surface
    pub fn set_operation(&mut self, operation: Operation) {
        if self.options.operation != operation {
            self.options.operation = operation;
            self.modified(false);
        }
    }

    /// Tolerance of the comparison
    pub fn set_tolerance(&mut self, tolerance: f64) {
        if self.options.tolerance != tolerance {
            self.options.tolerance = tolerance;
            self.modified(false);
        }
    }

    /// Shift applied to the surface elevation
    pub fn set_offset(&mut self, offset: f64) {
        if self.options.offset != offset {
            self.options.offset = offset;
            self.modified(false);
        }
    }

    /// Flip active and inactive cells
    pub fn set_invert(&mut self, flag: bool) {
        if self.options.invert != flag {
            self.options.invert = flag;
            self.modified(false);
        }
    }

    /// Drop inactive cells from the output
    pub fn set_remove(&mut self, flag: bool) {
        if self.options.remove != flag {
            self.options.remove = flag;
            self.modified(false);
        }
    }

    /// 1 for every active cell of `volume`, 0 otherwise
    pub fn active_cells(&self, volume: &Dataset, surface: &[[f64; 3]]) -> Result<Vec<i32>> {
        if surface.is_empty() {
            return Err(Error::InvalidArgument(
                "The topography surface has no points.".into(),
            ));
        }

        let TopographyOptions {
            operation,
            tolerance,
            offset,
            invert,
            horizontal_only,
            ..
        } = self.options;

        let surface = surface
            .iter()
            .map(|p| [p[0], p[1], p[2] + offset])
            .collect::<Vec<[f64; 3]>>();
        let centers = volume.cell_centers();

        let nearest = match horizontal_only {
            true => {
                let xy = |p: &[f64; 3]| [p[0], p[1]];
                let tree = KdTree::new(surface.iter().map(xy).collect());
                tree.nearest_many(&centers.iter().map(xy).collect::<Vec<_>>())
            }
            false => KdTree::new(surface.clone()).nearest_many(&centers),
        };

        Ok(centers
            .iter()
            .zip(nearest)
            .map(|(center, hit)| {
                let surface_z = hit.map(|(i, _)| surface[i][2]).unwrap_or(f64::NAN);
                let active = operation.is_active(center[2], surface_z, tolerance);
                (active != invert) as i32
            })
            .collect())
    }
}

impl Algorithm for ExtractTopography {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Any, PortKind::Kind(DatasetKind::PolyData)]
    }

    fn output_kind(&self) -> OutputKind {
        match self.options.remove {
            true => OutputKind::Fixed(DatasetKind::UnstructuredGrid),
            false => OutputKind::SameAsInput,
        }
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn request_data(&mut self, inputs: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let (volume, surface) = (inputs[0], inputs[1]);
        let active = self.active_cells(volume, &surface.points())?;
        debug!(
            "{} of {} cells extracted",
            active.iter().filter(|a| **a == 1).count(),
            active.len()
        );

        let mut output = volume.clone();
        output.add_array(Association::Cell, DataArray::new("Extracted", active.clone()));

        match self.options.remove {
            true => {
                let kept = (0..active.len())
                    .filter(|i| active[*i] as f64 >= 0.5)
                    .collect::<Vec<usize>>();
                Ok(output.extract_cells(&kept)?.into())
            }
            false => Ok(output),
        }
    }
}

/// Builder implementation for [ExtractTopography] configuration
///
/// ```rust
/// # use geokit_filters::{ExtractTopography, Operation};
/// let filter = ExtractTopography::builder()
///     .operation(Operation::Intersection)
///     .tolerance(0.5)
///     .invert(true)
///     .build();
///
/// assert_eq!(filter.options().operation, Operation::Intersection);
/// assert_eq!(filter.options().offset, 0.0);
/// ```
#[derive(Debug, Default)]
pub struct ExtractTopographyBuilder {
    options: TopographyOptions,
}

impl ExtractTopographyBuilder {
    /// Create a new instance of the builder with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the [ExtractTopography] filter
    pub fn build(self) -> ExtractTopography {
        ExtractTopography {
            options: self.options,
            ..Default::default()
        }
    }

    /// Start from a full set of options
    pub fn options(mut self, options: TopographyOptions) -> Self {
        self.options = options;
        self
    }

    /// Comparison against the surface
    pub fn operation(mut self, operation: Operation) -> Self {
        self.options.operation = operation;
        self
    }

    /// Tolerance of the comparison
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.options.tolerance = tolerance;
        self
    }

    /// Shift applied to the surface elevation
    pub fn offset(mut self, offset: f64) -> Self {
        self.options.offset = offset;
        self
    }

    /// Flip active and inactive cells
    pub fn invert(mut self, flag: bool) -> Self {
        self.options.invert = flag;
        self
    }

    /// Drop inactive cells
    pub fn remove(mut self, flag: bool) -> Self {
        self.options.remove = flag;
        self
    }

    /// Match surface points on X and Y only
    pub fn horizontal_only(mut self, flag: bool) -> Self {
        self.options.horizontal_only = flag;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_by_name() {
        assert_eq!("Underneath".parse::<Operation>().unwrap(), Operation::Underneath);
        assert_eq!("intersection".parse::<Operation>().unwrap(), Operation::Intersection);
        assert!("above".parse::<Operation>().is_err());
    }

    #[test]
    fn tolerance_is_strict() {
        assert!(!Operation::Underneath.is_active(1.0, 1.0, 0.001));
        assert!(Operation::Underneath.is_active(0.998, 1.0, 0.001));
        assert!(Operation::Intersection.is_active(1.0005, 1.0, 0.001));
        assert!(!Operation::Intersection.is_active(1.5, 1.0, 0.001));
    }

    #[test]
    fn options_round_trip_json() {
        let options = TopographyOptions::from_json(r#"{"operation": "intersection", "offset": -2.0}"#).unwrap();
        assert_eq!(options.operation, Operation::Intersection);
        assert_eq!(options.tolerance, 0.001);
        assert_eq!(TopographyOptions::from_json(&options.to_json().unwrap()).unwrap(), options);
    }
}
