// crate modules
use crate::slicing::{slice_blocks, Plane, SliceOptions};

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Dataset, DatasetKind, Error, Information, OutputKind, PortKind,
    Result, Timeline,
};
use geokit_utils::f;
use geokit_utils::sequence::linspace;

// external crates
use log::debug;

/// Offset of the first and last slice from the bounds of the input
const EDGE_OFFSET: f64 = 0.001;

/// Slice positions along an axis and the planes placed there
fn axial_planes(input: &Dataset, axis: usize, count: usize) -> Result<(Vec<f64>, Vec<Plane>)> {
    SliceOptions::check_axis(axis)?;
    if count == 0 {
        return Err(Error::InvalidArgument(
            "Number of slices must be at least one.".into(),
        ));
    }

    let bounds = input.bounds().ok_or_else(|| {
        Error::InvalidArgument(f!("{:?} input has no spatial bounds", input.kind()))
    })?;

    let range = linspace(
        bounds[2 * axis] + EDGE_OFFSET,
        bounds[2 * axis + 1] - EDGE_OFFSET,
        count,
    );
    let center = [0, 1, 2].map(|a| (bounds[2 * a] + bounds[2 * a + 1]) / 2.0);
    let mut normal = [0.0; 3];
    normal[axis] = 1.0;

    let planes = range
        .iter()
        .map(|position| {
            let mut origin = center;
            origin[axis] = *position;
            Plane::new(origin, normal)
        })
        .collect();
    Ok((range, planes))
}

/// Many parallel slices spaced uniformly along an axis
///
/// Slices are placed from just inside the lower bound to just inside the
/// upper bound of the input on the chosen axis, and each becomes a block
/// named `SliceNN`.
///
/// ```rust
/// # use geokit_core::{Algorithm, Dataset, ImageData};
/// # use geokit_filters::SliceBuilder;
/// let grid = Dataset::from(ImageData::new([11, 11, 11], [0.0; 3], [1.0; 3]));
///
/// let mut slicer = SliceBuilder::new().count(10).axis(0).along_axis().unwrap();
/// let output = slicer.apply(&[&grid]).unwrap();
/// let blocks = &output.as_multiblock().unwrap().blocks;
///
/// assert_eq!(blocks.len(), 10);
/// assert_eq!(blocks[0].0, "Slice00");
/// assert_eq!(slicer.range()[9], 9.999);
/// ```
#[derive(Debug, Default)]
pub struct ManySlicesAlongAxis {
    state: AlgorithmState,
    options: SliceOptions,
    range: Vec<f64>,
}

impl ManySlicesAlongAxis {
    /// Five slices along X
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_options(options: SliceOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Current options
    pub fn options(&self) -> &SliceOptions {
        &self.options
    }

    /// Axis index, 0, 1 or 2 for x, y or z
    pub fn set_axis(&mut self, axis: usize) -> Result<()> {
        SliceOptions::check_axis(axis)?;
        if self.options.axis != axis {
            self.options.axis = axis;
            self.modified(false);
        }
        Ok(())
    }

    /// Number of slices
    pub fn set_number_of_slices(&mut self, count: usize) {
        if self.options.count != count {
            self.options.count = count;
            self.modified(false);
        }
    }

    /// Positions of the slices along the axis from the last execution
    pub fn range(&self) -> &[f64] {
        &self.range
    }

    /// Unit normal shared by every slice
    pub fn normal(&self) -> [f64; 3] {
        let mut normal = [0.0; 3];
        normal[self.options.axis.min(2)] = 1.0;
        normal
    }
}

impl Algorithm for ManySlicesAlongAxis {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Any]
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::MultiBlock)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn request_data(&mut self, inputs: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let (range, planes) = axial_planes(inputs[0], self.options.axis, self.options.count)?;
        debug!("Slicing along axis {} at {range:?}", self.options.axis);
        self.range = range;
        Ok(slice_blocks(inputs[0], &planes)?.into())
    }
}

/// Axial slices exposed one per timestep
///
/// The same planes as [ManySlicesAlongAxis], but the output is a single
/// slice chosen by the requested time, so playing through time sweeps the
/// slice across the input.
#[derive(Debug, Default)]
pub struct SliceThroughTime {
    state: AlgorithmState,
    options: SliceOptions,
}

impl SliceThroughTime {
    /// Five slices along X, one time unit apart
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_options(options: SliceOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Current options
    pub fn options(&self) -> &SliceOptions {
        &self.options
    }

    /// Axis index, 0, 1 or 2 for x, y or z
    pub fn set_axis(&mut self, axis: usize) -> Result<()> {
        SliceOptions::check_axis(axis)?;
        if self.options.axis != axis {
            self.options.axis = axis;
            self.modified(false);
        }
        Ok(())
    }

    /// Number of slices, and so of timesteps
    pub fn set_number_of_slices(&mut self, count: usize) {
        if self.options.count != count {
            self.options.count = count;
            self.modified(false);
        }
    }

    /// Time between consecutive slices
    pub fn set_time_delta(&mut self, dt: f64) {
        if self.options.time_delta != dt {
            self.options.time_delta = dt;
            self.modified(false);
        }
    }

    fn timeline(&self) -> Timeline {
        Timeline::new(self.options.count, self.options.time_delta)
    }
}

impl Algorithm for SliceThroughTime {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Any]
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::PolyData)
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
            timesteps: self.timeline().timesteps(),
        })
    }

    fn request_data(&mut self, inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        let (_, planes) = axial_planes(inputs[0], self.options.axis, self.options.count)?;
        let index = self.timeline().index_for(time);
        Ok(planes[index].cut(inputs[0])?.into())
    }
}
