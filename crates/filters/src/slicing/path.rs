// crate modules
use crate::slicing::{slice_blocks, Plane, SliceOptions};

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Dataset, DatasetKind, Error, Information, KdTree, OutputKind,
    PortKind, Result,
};

// external crates
use log::{debug, warn};

/// Planes through points of a path, each facing the next point
///
/// With `nearest_neighbour` the path visits points by increasing distance
/// from the first point instead of in input order.
pub(crate) fn path_planes(
    points: &[[f64; 3]],
    count: usize,
    nearest_neighbour: bool,
) -> Result<Vec<Plane>> {
    let n = points.len();
    if n < 2 {
        return Err(Error::InvalidArgument(
            "At least two points are needed to place slices along a path.".into(),
        ));
    }
    if count == 0 {
        return Ok(Vec::new());
    }

    let order = match nearest_neighbour {
        true => KdTree::new(points.to_vec())
            .k_nearest(&points[0], n)
            .into_iter()
            .map(|(i, _)| i)
            .collect::<Vec<usize>>(),
        false => (0..n).collect(),
    };

    let step = (n / count).max(1);
    Ok((0..n - 1)
        .step_by(step)
        .take(count)
        .map(|i| {
            let (p1, p2) = (points[order[i]], points[order[i + 1]]);
            Plane::new(p1, [0, 1, 2].map(|a| p2[a] - p1[a]))
        })
        .collect())
}

/// Slices across a path of points through a volumetric dataset
///
/// Input 0 is the path as poly data, input 1 the dataset to slice. Each
/// slice passes through a path point with its normal towards the next point,
/// giving cross sections along something like a borehole or a survey line.
///
/// ```rust
/// # use geokit_core::{Algorithm, Dataset, ImageData, PolyData};
/// # use geokit_filters::SliceBuilder;
/// let grid = Dataset::from(ImageData::new([11, 3, 3], [0.0; 3], [1.0; 3]));
/// let path = Dataset::from(PolyData::from_points(
///     (0..10).map(|i| [i as f64 + 0.5, 1.0, 1.0]).collect(),
/// ));
///
/// let mut slicer = SliceBuilder::new().count(5).along_points();
/// let output = slicer.apply(&[&path, &grid]).unwrap();
/// assert_eq!(output.as_multiblock().unwrap().blocks.len(), 5);
/// ```
#[derive(Debug, Default)]
pub struct ManySlicesAlongPoints {
    state: AlgorithmState,
    options: SliceOptions,
}

impl ManySlicesAlongPoints {
    /// Five slices, nearest neighbour path ordering
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

    /// Number of slices
    pub fn set_number_of_slices(&mut self, count: usize) {
        if self.options.count != count {
            self.options.count = count;
            self.modified(false);
        }
    }

    /// Order path points by proximity to the first point
    pub fn set_use_nearest_neighbour(&mut self, flag: bool) {
        if self.options.nearest_neighbour != flag {
            self.options.nearest_neighbour = flag;
            self.modified(false);
        }
    }
}

impl Algorithm for ManySlicesAlongPoints {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Kind(DatasetKind::PolyData), PortKind::Any]
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
        let points = inputs[0].points();
        let planes = path_planes(&points, self.options.count, self.options.nearest_neighbour)?;
        if planes.len() < self.options.count {
            warn!(
                "Only {} slices fit along a path of {} points",
                planes.len(),
                points.len()
            );
        }
        Ok(slice_blocks(inputs[1], &planes)?.into())
    }
}

/// A single slice that slides along a path of points
///
/// Planes are placed at every path point during the information pass and
/// the location, a percentage along the path, picks which one is cut.
///
/// ```rust
/// # use geokit_core::{Algorithm, Dataset, ImageData, PolyData};
/// # use geokit_filters::SliceBuilder;
/// let grid = Dataset::from(ImageData::new([11, 3, 3], [0.0; 3], [1.0; 3]));
/// let path = Dataset::from(PolyData::from_points(
///     (0..10).map(|i| [i as f64 + 0.5, 1.0, 1.0]).collect(),
/// ));
///
/// let mut slicer = SliceBuilder::new().location(30.0).slide_along_points().unwrap();
/// let slice = slicer.apply(&[&path, &grid]).unwrap();
/// assert_eq!(slice.as_poly().unwrap().points[0][0], 3.5);
/// ```
#[derive(Debug, Default)]
pub struct SlideSliceAlongPoints {
    state: AlgorithmState,
    options: SliceOptions,
    planes: Vec<Plane>,
}

impl SlideSliceAlongPoints {
    /// Slice halfway along the path
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

    /// Percentage along the path, in `[0, 99]`
    pub fn set_location(&mut self, location: f64) -> Result<()> {
        SliceOptions::check_location(location)?;
        if self.options.location != location {
            self.options.location = location;
            self.modified(false);
        }
        Ok(())
    }

    /// Percentage along the path
    pub fn location(&self) -> f64 {
        self.options.location
    }

    /// Order path points by proximity to the first point
    pub fn set_use_nearest_neighbour(&mut self, flag: bool) {
        if self.options.nearest_neighbour != flag {
            self.options.nearest_neighbour = flag;
            self.modified(false);
        }
    }
}

impl Algorithm for SlideSliceAlongPoints {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Kind(DatasetKind::PolyData), PortKind::Any]
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

    fn request_information(&mut self, inputs: &[&Dataset]) -> Result<Information> {
        let points = inputs[0].points();
        self.planes = path_planes(&points, points.len(), self.options.nearest_neighbour)?;
        Ok(Information::default())
    }

    fn request_data(&mut self, inputs: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let n = inputs[0].number_of_points();
        let index = ((n as f64 * self.options.location / 100.0).floor() as usize)
            .min(self.planes.len().saturating_sub(1));
        debug!("Sliding slice at plane {index} of {}", self.planes.len());

        let plane = self.planes.get(index).ok_or_else(|| {
            Error::InvalidArgument("No slice planes along the input path.".into())
        })?;
        Ok(plane.cut(inputs[1])?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planes_follow_the_path() {
        let points = [[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];

        let ordered = path_planes(&points, 3, true).unwrap();
        let origins = ordered.iter().map(|p| p.origin[0]).collect::<Vec<_>>();
        assert_eq!(origins, vec![0.0, 1.0, 2.0]);
        assert!(ordered.iter().all(|p| p.normal == [1.0, 0.0, 0.0]));

        let raw = path_planes(&points, 3, false).unwrap();
        assert_eq!(raw[0].normal, [3.0, 0.0, 0.0]);
        assert_eq!(raw[1].normal, [-2.0, 0.0, 0.0]);
    }

    #[test]
    fn step_follows_the_count() {
        let points = (0..10).map(|i| [i as f64, 0.0, 0.0]).collect::<Vec<_>>();
        let planes = path_planes(&points, 3, false).unwrap();
        let origins = planes.iter().map(|p| p.origin[0]).collect::<Vec<_>>();
        assert_eq!(origins, vec![0.0, 3.0, 6.0]);

        assert!(path_planes(&points, 0, false).unwrap().is_empty());
        assert!(path_planes(&points[..1], 2, false).is_err());
    }
}
