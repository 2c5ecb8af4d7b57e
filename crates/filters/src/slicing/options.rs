// crate modules
use crate::slicing::{
    ManySlicesAlongAxis, ManySlicesAlongPoints, SliceThroughTime, SlideSliceAlongPoints,
};

// geokit modules
use geokit_core::{Error, Result};
use geokit_utils::f;

// external crates
use serde::{Deserialize, Serialize};

/// Parameters shared by the slicing filters
///
/// ```rust
/// # use geokit_filters::SliceOptions;
/// let options = SliceOptions::from_json(r#"{"count": 10, "axis": 2}"#).unwrap();
/// assert_eq!(options.count, 10);
/// assert_eq!(options.axis, 2);
/// assert!(options.nearest_neighbour);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceOptions {
    /// Number of slices
    pub count: usize,
    /// Axis index for axial slicing, 0, 1 or 2 for x, y or z
    pub axis: usize,
    /// Order path points by proximity to the first point
    pub nearest_neighbour: bool,
    /// Percentage along the path for a sliding slice, in `[0, 99]`
    pub location: f64,
    /// Time between slices when they are exposed as timesteps
    pub time_delta: f64,
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self {
            count: 5,
            axis: 0,
            nearest_neighbour: true,
            location: 50.0,
            time_delta: 1.0,
        }
    }
}

impl SliceOptions {
    /// Load options from a json string, missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise the options to pretty json
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub(crate) fn check_axis(axis: usize) -> Result<()> {
        match axis {
            0..=2 => Ok(()),
            _ => Err(Error::InvalidArgument(
                "Axis choice must be 0, 1, or 2 (x, y, or z)".into(),
            )),
        }
    }

    pub(crate) fn check_location(location: f64) -> Result<()> {
        match (0.0..=99.0).contains(&location) {
            true => Ok(()),
            false => Err(Error::InvalidArgument(f!(
                "Location must be given as a percentage along input path, found {location}."
            ))),
        }
    }
}

/// Builder implementation for the slicing filters
///
/// The same options configure every slicer, so finish with the constructor
/// of the slicer you need.
///
/// ```rust
/// # use geokit_filters::SliceBuilder;
/// let slicer = SliceBuilder::new().count(10).axis(1).along_axis().unwrap();
/// assert_eq!(slicer.options().count, 10);
///
/// assert!(SliceBuilder::new().axis(3).along_axis().is_err());
/// assert!(SliceBuilder::new().location(100.0).slide_along_points().is_err());
/// ```
#[derive(Debug, Default)]
pub struct SliceBuilder {
    options: SliceOptions,
}

impl SliceBuilder {
    /// Create a new instance of the builder with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a full set of options
    pub fn options(mut self, options: SliceOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of slices
    pub fn count(mut self, count: usize) -> Self {
        self.options.count = count;
        self
    }

    /// Axis for axial slicing
    pub fn axis(mut self, axis: usize) -> Self {
        self.options.axis = axis;
        self
    }

    /// Order path points by proximity to the first point
    pub fn nearest_neighbour(mut self, flag: bool) -> Self {
        self.options.nearest_neighbour = flag;
        self
    }

    /// Percentage along the path for a sliding slice
    pub fn location(mut self, location: f64) -> Self {
        self.options.location = location;
        self
    }

    /// Time between slices exposed as timesteps
    pub fn time_delta(mut self, dt: f64) -> Self {
        self.options.time_delta = dt;
        self
    }

    /// Build a [ManySlicesAlongAxis]
    pub fn along_axis(self) -> Result<ManySlicesAlongAxis> {
        SliceOptions::check_axis(self.options.axis)?;
        Ok(ManySlicesAlongAxis::with_options(self.options))
    }

    /// Build a [SliceThroughTime]
    pub fn through_time(self) -> Result<SliceThroughTime> {
        SliceOptions::check_axis(self.options.axis)?;
        Ok(SliceThroughTime::with_options(self.options))
    }

    /// Build a [ManySlicesAlongPoints]
    pub fn along_points(self) -> ManySlicesAlongPoints {
        ManySlicesAlongPoints::with_options(self.options)
    }

    /// Build a [SlideSliceAlongPoints]
    pub fn slide_along_points(self) -> Result<SlideSliceAlongPoints> {
        SliceOptions::check_location(self.options.location)?;
        Ok(SlideSliceAlongPoints::with_options(self.options))
    }
}
