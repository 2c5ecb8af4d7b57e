//! Filters acting on the points of a dataset

// crate modules
use crate::rotation::RotationTool;

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Association, CellArray, CellType, DataArray, Dataset, DatasetKind,
    Error, Information, KdTree, OutputKind, PolyData, PortKind, Result, Timeline,
};
use geokit_utils::sequence::linspace;

// external crates
use itertools::Itertools;
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Turn a point cloud about a vertical axis
///
/// The origin is either set explicitly or, with `use_corner`, taken as the
/// point with the smallest X coordinate. Positive angles turn the points
/// counter-clockwise and Z is left alone.
///
/// ```rust
/// # use geokit_core::{Algorithm, Dataset, PolyData};
/// # use geokit_filters::RotatePoints;
/// let points = Dataset::from(PolyData::from_points(vec![[0.0, 0.0, 5.0], [1.0, 0.0, 5.0]]));
///
/// let mut filter = RotatePoints::new();
/// filter.set_rotation_degrees(90.0);
/// let output = filter.apply(&[&points]).unwrap().points();
///
/// assert!(output[1][0].abs() < 1e-12);
/// assert!((output[1][1] - 1.0).abs() < 1e-12);
/// assert_eq!(output[1][2], 5.0);
/// ```
#[derive(Debug)]
pub struct RotatePoints {
    state: AlgorithmState,
    angle: f64,
    origin: [f64; 2],
    use_corner: bool,
}

impl Default for RotatePoints {
    fn default() -> Self {
        Self {
            state: AlgorithmState::default(),
            angle: 45.0,
            origin: [0.0, 0.0],
            use_corner: true,
        }
    }
}

impl RotatePoints {
    /// 45 degrees about the westmost point
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotation angle in degrees
    pub fn rotation_degrees(&self) -> f64 {
        self.angle
    }

    /// Set the rotation angle in degrees
    pub fn set_rotation_degrees(&mut self, angle: f64) {
        if self.angle != angle {
            self.angle = angle;
            self.modified(false);
        }
    }

    /// Set the XY origin of the rotation, only used without `use_corner`
    pub fn set_origin(&mut self, origin: [f64; 2]) {
        if self.origin != origin {
            self.origin = origin;
            self.modified(false);
        }
    }

    /// Rotate about the point with minimum X instead of the origin
    pub fn set_use_corner(&mut self, flag: bool) {
        if self.use_corner != flag {
            self.use_corner = flag;
            self.modified(false);
        }
    }

    fn pivot(&self, points: &[[f64; 3]]) -> [f64; 2] {
        match self.use_corner {
            true => points
                .iter()
                .min_by(|a, b| a[0].total_cmp(&b[0]))
                .map(|p| [p[0], p[1]])
                .unwrap_or(self.origin),
            false => self.origin,
        }
    }
}

impl Algorithm for RotatePoints {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Kind(DatasetKind::PolyData)]
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

    fn request_data(&mut self, inputs: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let mut output = inputs[0].as_poly()?.clone();
        let origin = self.pivot(&output.points);
        let xy = output.points.iter().map(|p| [p[0], p[1]]).collect::<Vec<_>>();

        let turned = RotationTool::rotate_around(&xy, self.angle.to_radians(), origin);
        for (point, q) in output.points.iter_mut().zip(turned) {
            point[0] = q[0];
            point[1] = q[1];
        }
        Ok(output.into())
    }
}

/// Vertex cloud of cell centers with cell data moved onto the points
///
/// ```rust
/// # use geokit_core::{Algorithm, Dataset, ImageData};
/// # use geokit_filters::ExtractCellCenters;
/// let grid = Dataset::from(ImageData::new([3, 2, 2], [0.0; 3], [1.0; 3]));
/// let centers = ExtractCellCenters::default().apply(&[&grid]).unwrap();
///
/// assert_eq!(centers.points(), vec![[0.5, 0.5, 0.5], [1.5, 0.5, 0.5]]);
/// ```
#[derive(Debug, Default)]
pub struct ExtractCellCenters {
    state: AlgorithmState,
}

impl Algorithm for ExtractCellCenters {
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

    fn request_data(&mut self, inputs: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let input = inputs[0];
        let mut output = PolyData::from_points(input.cell_centers());

        let attributes = input.attributes();
        for array in attributes.arrays(Association::Cell) {
            output.attributes.add(Association::Point, array.clone());
        }
        for array in attributes.arrays(Association::Field) {
            output.attributes.add(Association::Field, array.clone());
        }
        Ok(output.into())
    }
}

/// Add the cell centers of a dataset as the `Cell Centers` cell array
#[derive(Debug, Default)]
pub struct AppendCellCenters {
    state: AlgorithmState,
}

impl Algorithm for AppendCellCenters {
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

    fn request_data(&mut self, inputs: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let mut output = inputs[0].clone();
        let flat = output
            .cell_centers()
            .into_iter()
            .flatten()
            .collect::<Vec<f64>>();
        output.add_array(
            Association::Cell,
            DataArray::with_components("Cell Centers", 3, flat)?,
        );
        Ok(output)
    }
}

/// Cell type used to join points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connection {
    /// One two-point line per consecutive pair
    Line,
    /// A single poly-line through every point
    #[default]
    PolyLine,
}

impl From<Connection> for CellType {
    fn from(value: Connection) -> Self {
        match value {
            Connection::Line => CellType::Line,
            Connection::PolyLine => CellType::PolyLine,
        }
    }
}

/// Parameters of [AddCellConnToPoints]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Cell type of the connectivity
    pub cell_type: Connection,
    /// Order the points by the shortest nearest neighbour path
    pub nearest_neighbour: bool,
    /// Join the last point back to the first
    pub close_loop: bool,
    /// Drop repeated points, keeping the first occurrence
    pub unique: bool,
    /// Keep a vertex cell for every point alongside the lines
    pub keep_vertices: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            cell_type: Connection::PolyLine,
            nearest_neighbour: false,
            close_loop: false,
            unique: true,
            keep_vertices: false,
        }
    }
}

impl ConnectionOptions {
    /// Load options from a json string, missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise the options to pretty json
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Point order of the shortest nearest neighbour walk
///
/// Every point is tried as the start of a walk that visits the remaining
/// points by increasing distance from it. The walk with the smallest total
/// length wins, the earliest start on ties.
pub fn shortest_path_order(points: &[[f64; 3]]) -> Vec<usize> {
    let n = points.len();
    if n < 2 {
        return (0..n).collect();
    }

    let tree = KdTree::new(points.to_vec());
    let length = |order: &[usize]| {
        order
            .iter()
            .tuple_windows()
            .map(|(a, b)| {
                let (p, q) = (points[*a], points[*b]);
                ((q[0] - p[0]).powi(2) + (q[1] - p[1]).powi(2) + (q[2] - p[2]).powi(2)).sqrt()
            })
            .sum::<f64>()
    };

    let walks = tree
        .k_nearest_many(points, n)
        .into_iter()
        .map(|hits| hits.into_iter().map(|(i, _)| i).collect::<Vec<usize>>())
        .collect::<Vec<_>>();

    walks
        .par_iter()
        .enumerate()
        .map(|(start, order)| (length(order), start))
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, start)| walks[start].clone())
        .unwrap_or_default()
}

/// Join the points of a poly data with line or poly-line cells
///
/// ```rust
/// # use geokit_core::{Algorithm, Dataset, PolyData};
/// # use geokit_filters::AddCellConnToPoints;
/// let points = Dataset::from(PolyData::from_points(vec![
///     [0.0, 0.0, 0.0],
///     [2.0, 0.0, 0.0],
///     [1.0, 0.0, 0.0],
/// ]));
///
/// let mut filter = AddCellConnToPoints::new();
/// filter.set_use_nearest_neighbour(true);
/// let output = filter.apply(&[&points]).unwrap();
/// let line = output.as_poly().unwrap();
///
/// assert_eq!(line.cells.len(), 1);
/// assert_eq!(line.cells.cell(0).unwrap().1, &[0, 2, 1]);
/// ```
#[derive(Debug, Default)]
pub struct AddCellConnToPoints {
    state: AlgorithmState,
    options: ConnectionOptions,
}

impl AddCellConnToPoints {
    /// One poly-line in input order
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a full set of options
    pub fn with_options(options: ConnectionOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Current options
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Cell type of the connectivity
    pub fn set_cell_type(&mut self, cell_type: Connection) {
        if self.options.cell_type != cell_type {
            self.options.cell_type = cell_type;
            self.modified(false);
        }
    }

    /// Order the points by the shortest nearest neighbour path
    pub fn set_use_nearest_neighbour(&mut self, flag: bool) {
        if self.options.nearest_neighbour != flag {
            self.options.nearest_neighbour = flag;
            self.modified(false);
        }
    }

    /// Join the last point back to the first
    pub fn set_close_loop(&mut self, flag: bool) {
        if self.options.close_loop != flag {
            self.options.close_loop = flag;
            self.modified(false);
        }
    }

    /// Drop repeated points
    pub fn set_use_unique_points(&mut self, flag: bool) {
        if self.options.unique != flag {
            self.options.unique = flag;
            self.modified(false);
        }
    }

    /// Keep vertex cells alongside the lines
    pub fn set_keep_vertices(&mut self, flag: bool) {
        if self.options.keep_vertices != flag {
            self.options.keep_vertices = flag;
            self.modified(false);
        }
    }

    /// Connectivity over `n` points in the path order `order`
    fn connect(&self, n: usize, order: &[usize]) -> CellArray {
        let mut cells = CellArray::new();
        if self.options.keep_vertices {
            for i in 0..n {
                cells.push(CellType::Vertex, &[i]);
            }
        }

        let close = self.options.close_loop && order.len() > 2;
        match self.options.cell_type {
            Connection::Line => {
                for (a, b) in order.iter().tuple_windows() {
                    cells.push(CellType::Line, &[*a, *b]);
                }
                if let (true, Some(first), Some(last)) = (close, order.first(), order.last()) {
                    cells.push(CellType::Line, &[*last, *first]);
                }
            }
            Connection::PolyLine => {
                let mut ids = order.to_vec();
                if let (true, Some(first)) = (close, order.first()) {
                    ids.push(*first);
                }
                cells.push(CellType::PolyLine, &ids);
            }
        }
        cells
    }
}

impl Algorithm for AddCellConnToPoints {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Kind(DatasetKind::PolyData)]
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

    fn request_data(&mut self, inputs: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let input = inputs[0].as_poly()?;
        if input.points.len() < 2 {
            return Err(Error::InvalidArgument(
                "At least two points are needed to add connectivity.".into(),
            ));
        }

        let kept = match self.options.unique {
            true => (0..input.points.len())
                .unique_by(|i| input.points[*i].map(f64::to_bits))
                .collect::<Vec<usize>>(),
            false => (0..input.points.len()).collect(),
        };
        if kept.len() < input.points.len() {
            debug!("Dropped {} repeated points", input.points.len() - kept.len());
        }

        let points = kept.iter().map(|i| input.points[*i]).collect::<Vec<_>>();
        let order = match self.options.nearest_neighbour {
            true => shortest_path_order(&points),
            false => (0..points.len()).collect(),
        };

        let mut output = PolyData {
            cells: self.connect(points.len(), &order),
            points,
            ..Default::default()
        };
        for array in input.attributes.arrays(Association::Point) {
            output.attributes.add(Association::Point, array.take_tuples(&kept));
        }
        for array in input.attributes.arrays(Association::Field) {
            output.attributes.add(Association::Field, array.clone());
        }
        Ok(output.into())
    }
}

/// Step through the points of a poly data one timestep at a time
///
/// Each timestep outputs a single point. With decimation only a percentage
/// of the points, evenly spread along the input, become timesteps. The
/// normal is the step from the previous output point to the current one.
///
/// ```rust
/// # use geokit_core::{Algorithm, Dataset, PolyData};
/// # use geokit_filters::IterateOverPoints;
/// let path = Dataset::from(PolyData::from_points(
///     (0..10).map(|i| [i as f64, 0.0, 0.0]).collect(),
/// ));
///
/// let mut filter = IterateOverPoints::new();
/// filter.set_decimate(50.0);
/// let output = filter.apply_at(&[&path], Some(4.0)).unwrap();
///
/// assert_eq!(filter.timesteps().len(), 5);
/// assert_eq!(output.points(), vec![[9.0, 0.0, 0.0]]);
/// ```
#[derive(Debug)]
pub struct IterateOverPoints {
    state: AlgorithmState,
    dt: f64,
    decimate: Option<f64>,
    indices: Vec<usize>,
    point: [f64; 3],
    normal: [f64; 3],
}

impl Default for IterateOverPoints {
    fn default() -> Self {
        Self {
            state: AlgorithmState::default(),
            dt: 1.0,
            decimate: None,
            indices: Vec::new(),
            point: [0.0; 3],
            normal: [0.0; 3],
        }
    }
}

impl IterateOverPoints {
    /// Every point, one unit of time apart
    pub fn new() -> Self {
        Self::default()
    }

    /// Time between consecutive points
    pub fn set_time_delta(&mut self, dt: f64) {
        if self.dt != dt {
            self.dt = dt;
            self.modified(false);
        }
    }

    /// Keep only a percentage of the points, clamped to 1..=99
    pub fn set_decimate(&mut self, percent: f64) {
        let clamped = percent.clamp(1.0, 99.0);
        if clamped != percent {
            warn!("Decimation of {percent}% clamped to {clamped}%");
        }
        if self.decimate != Some(clamped) {
            self.decimate = Some(clamped);
            self.modified(false);
        }
    }

    /// Go back to iterating over every point
    pub fn clear_decimate(&mut self) {
        if self.decimate.take().is_some() {
            self.modified(false);
        }
    }

    /// The last point put out
    pub fn point(&self) -> [f64; 3] {
        self.point
    }

    /// Step from the previous point to the last one put out
    pub fn normal(&self) -> [f64; 3] {
        self.normal
    }

    /// Indices of the input points used as timesteps
    pub fn time_indices(&self) -> &[usize] {
        &self.indices
    }

    fn select_indices(&mut self, original: usize) {
        let count = match self.decimate {
            Some(percent) => (original as f64 * percent / 100.0) as usize,
            None => original,
        };
        let last = original.saturating_sub(1) as f64;
        self.indices = linspace(0.0, last, count)
            .into_iter()
            .map(|i| i as usize)
            .collect();
    }
}

impl Algorithm for IterateOverPoints {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Kind(DatasetKind::PolyData)]
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
        self.select_indices(inputs[0].number_of_points());
        Ok(Information {
            timesteps: Timeline::new(self.indices.len(), self.dt).timesteps(),
            ..Default::default()
        })
    }

    fn request_data(&mut self, inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        let points = inputs[0].points();
        let step = Timeline::new(self.indices.len(), self.dt).index_for(time);
        let point = self
            .indices
            .get(step)
            .and_then(|i| points.get(*i))
            .copied()
            .ok_or_else(|| Error::InvalidArgument("There are no points to iterate over.".into()))?;

        self.normal = [0, 1, 2].map(|a| point[a] - self.point[a]);
        self.point = point;
        Ok(PolyData::from_points(vec![point]).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud(points: Vec<[f64; 3]>) -> Dataset {
        PolyData::from_points(points).into()
    }

    #[test]
    fn corner_is_the_westmost_point() {
        let input = cloud(vec![[2.0, 0.0, 0.0], [1.0, 1.0, 0.0], [3.0, 1.0, 0.0]]);
        let mut filter = RotatePoints::new();
        filter.set_rotation_degrees(180.0);
        let output = filter.apply(&[&input]).unwrap().points();

        // the pivot stays put
        assert!((output[1][0] - 1.0).abs() < 1e-12);
        assert!((output[1][1] - 1.0).abs() < 1e-12);
        assert!((output[0][0] - 0.0).abs() < 1e-12);
        assert!((output[0][1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn cell_centers_are_appended() {
        let grid = Dataset::from(geokit_core::ImageData::new([2, 2, 3], [0.0; 3], [2.0; 3]));
        let output = AppendCellCenters::default().apply(&[&grid]).unwrap();
        let centers = output.get_array(Association::Cell, "Cell Centers").unwrap();

        assert_eq!(centers.components, 3);
        assert_eq!(centers.values().unwrap(), vec![1.0, 1.0, 1.0, 1.0, 1.0, 3.0]);
    }

    #[test]
    fn lines_close_the_loop() {
        let input = cloud(vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]);
        let mut filter = AddCellConnToPoints::new();
        filter.set_cell_type(Connection::Line);
        filter.set_close_loop(true);
        let output = filter.apply(&[&input]).unwrap();
        let cells = &output.as_poly().unwrap().cells;

        assert_eq!(cells.len(), 3);
        assert_eq!(cells.cell(2).unwrap(), (CellType::Line, &[2usize, 0][..]));
    }

    #[test]
    fn repeated_points_are_dropped() {
        let mut input = PolyData::from_points(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0; 3]]);
        input
            .attributes
            .add(Association::Point, DataArray::new("id", vec![0.0, 1.0, 2.0]));

        let output = AddCellConnToPoints::new().apply(&[&input.into()]).unwrap();
        let poly = output.as_poly().unwrap();

        assert_eq!(poly.points.len(), 2);
        assert_eq!(
            poly.attributes.get(Association::Point, "id").unwrap().values().unwrap(),
            vec![0.0, 1.0]
        );
    }

    #[test]
    fn shortest_walk_starts_at_an_end() {
        let points = [3.0, 0.0, 1.0, 4.0, 2.0].map(|x| [x, 0.0, 0.0]);
        assert_eq!(shortest_path_order(&points), vec![1, 2, 4, 0, 3]);
    }

    #[test]
    fn decimation_is_clamped() {
        let input = cloud((0..200).map(|i| [i as f64, 0.0, 0.0]).collect());
        let mut filter = IterateOverPoints::new();
        filter.set_decimate(150.0);
        filter.update_information(&[&input]).unwrap();
        assert_eq!(filter.time_indices().len(), 198);

        filter.set_decimate(0.0);
        filter.update_information(&[&input]).unwrap();
        assert_eq!(filter.time_indices(), &[0, 199]);
    }

    #[test]
    fn normal_follows_the_walk() {
        let input = cloud((0..4).map(|i| [i as f64, 2.0 * i as f64, 0.0]).collect());
        let mut filter = IterateOverPoints::new();
        filter.apply_at(&[&input], Some(1.0)).unwrap();
        filter.apply_at(&[&input], Some(2.0)).unwrap();

        assert_eq!(filter.point(), [2.0, 4.0, 0.0]);
        assert_eq!(filter.normal(), [1.0, 2.0, 0.0]);
    }
}
