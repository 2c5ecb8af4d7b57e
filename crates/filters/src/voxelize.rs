//! Turn regularly gridded points into voxel cells

// standard library
use std::cmp::Ordering;

// crate modules
use crate::rotation::{Estimate, RotationTool};

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Association, CellArray, CellType, DataArray, Dataset, DatasetKind,
    Error, OutputKind, PortKind, Result, UnstructuredGrid,
};
use geokit_utils::f;

// external crates
use log::debug;
use serde::{Deserialize, Serialize};

/// Cell size along one axis, shared by every point or given per point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Spacing {
    /// One size for every cell
    Uniform(f64),
    /// One size per input point
    PerPoint(Vec<f64>),
}

impl Spacing {
    fn at(&self, index: usize) -> f64 {
        match self {
            Self::Uniform(size) => *size,
            Self::PerPoint(sizes) => sizes[index],
        }
    }

    fn min(&self) -> f64 {
        match self {
            Self::Uniform(size) => *size,
            Self::PerPoint(sizes) => sizes.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }

    fn check(&self, axis: &str, count: usize) -> Result<()> {
        match self {
            Self::PerPoint(sizes) if sizes.len() != count => Err(Error::size_mismatch(
                f!("{axis}-Cell spacings are not properly defined for all points."),
                count,
                sizes.len(),
            )),
            _ => Ok(()),
        }
    }
}

impl From<f64> for Spacing {
    fn from(size: f64) -> Self {
        Self::Uniform(size)
    }
}

impl From<Vec<f64>> for Spacing {
    fn from(sizes: Vec<f64>) -> Self {
        Self::PerPoint(sizes)
    }
}

/// Parameters of [VoxelizePoints]
///
/// ```rust
/// # use geokit_filters::{Spacing, VoxelOptions};
/// let options = VoxelOptions::from_json(r#"{"dx": 2.0, "dy": [1.0, 3.0], "estimate_grid": false}"#).unwrap();
/// assert_eq!(options.dx, Some(Spacing::Uniform(2.0)));
/// assert_eq!(options.dy, Some(Spacing::PerPoint(vec![1.0, 3.0])));
/// assert_eq!(options.safe, 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelOptions {
    /// Cell size along X, the safe size when missing
    pub dx: Option<Spacing>,
    /// Cell size along Y, the safe size when missing
    pub dy: Option<Spacing>,
    /// Cell size along Z, the safe size when missing
    pub dz: Option<Spacing>,
    /// Recover rotation and cell sizes from the points themselves
    pub estimate_grid: bool,
    /// Size used wherever a spacing cannot be determined
    pub safe: f64,
    /// Seed for the estimator sub-sample
    pub seed: Option<u64>,
}

impl Default for VoxelOptions {
    fn default() -> Self {
        Self {
            dx: None,
            dy: None,
            dz: None,
            estimate_grid: true,
            safe: 10.0,
            seed: None,
        }
    }
}

impl VoxelOptions {
    /// Load options from a json string, missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise the options to pretty json
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build a voxel around every point of a gridded point set
///
/// Corners shared by neighbouring voxels are welded into a single node. When
/// the grid is estimated the points are rotated onto the world axes first,
/// the voxels are built there and the nodes are rotated back, so rotated
/// surveys produce rotated voxels. Point arrays of the input become cell
/// arrays of the output.
///
/// ```rust
/// # use geokit_core::{Algorithm, PolyData};
/// # use geokit_filters::VoxelizePoints;
/// let points = PolyData::from_points(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
///
/// let mut filter = VoxelizePoints::builder().safe(5.0).seed(0).build();
/// let grid = filter.apply(&[&points.into()]).unwrap();
///
/// assert_eq!(grid.number_of_cells(), 3);
/// assert_eq!(grid.number_of_points(), 16);
/// assert_eq!(grid.bounds(), Some([-0.5, 1.5, -0.5, 1.5, -2.5, 2.5]));
/// ```
#[derive(Debug, Default)]
pub struct VoxelizePoints {
    state: AlgorithmState,
    options: VoxelOptions,
    estimate: Option<Estimate>,
}

impl VoxelizePoints {
    /// Filter with default options, estimating the grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an instance of the [VoxelizePointsBuilder]
    pub fn builder() -> VoxelizePointsBuilder {
        VoxelizePointsBuilder::default()
    }

    /// Current options
    pub fn options(&self) -> &VoxelOptions {
        &self.options
    }

    /// Replace every option at once
    pub fn set_options(&mut self, options: VoxelOptions) {
        if self.options != options {
            self.options = options;
            self.modified(false);
        }
    }

    /// Cell size along X
    pub fn set_delta_x(&mut self, dx: impl Into<Spacing>) {
        self.options.dx = Some(dx.into());
        self.modified(false);
    }

    /// Cell size along Y
    pub fn set_delta_y(&mut self, dy: impl Into<Spacing>) {
        self.options.dy = Some(dy.into());
        self.modified(false);
    }

    /// Cell size along Z
    pub fn set_delta_z(&mut self, dz: impl Into<Spacing>) {
        self.options.dz = Some(dz.into());
        self.modified(false);
    }

    /// Cell sizes along every axis
    pub fn set_deltas(
        &mut self,
        dx: impl Into<Spacing>,
        dy: impl Into<Spacing>,
        dz: impl Into<Spacing>,
    ) {
        self.set_delta_x(dx);
        self.set_delta_y(dy);
        self.set_delta_z(dz);
    }

    /// Toggle estimation of rotation and cell sizes
    pub fn set_estimate_grid(&mut self, flag: bool) {
        if self.options.estimate_grid != flag {
            self.options.estimate_grid = flag;
            self.modified(false);
        }
    }

    /// Size used wherever a spacing cannot be determined
    pub fn set_safe_size(&mut self, safe: f64) {
        if self.options.safe != safe {
            self.options.safe = safe;
            self.modified(false);
        }
    }

    /// Lattice parameters recovered by the last execution
    pub fn estimate(&self) -> Option<&Estimate> {
        self.estimate.as_ref()
    }

    /// Recovered rotation, zero unless the grid was estimated
    pub fn recovered_angle(&self, degrees: bool) -> f64 {
        let angle = self.estimate.map(|e| e.angle).unwrap_or(0.0);
        match degrees {
            true => angle.to_degrees(),
            false => angle,
        }
    }

    /// Voxels around every point
    pub fn points_to_grid(&mut self, points: &[[f64; 3]]) -> Result<UnstructuredGrid> {
        let safe = Spacing::Uniform(self.options.safe);
        let (points, estimate, [dx, dy, dz]) = match self.options.estimate_grid {
            true => {
                let mut tool = RotationTool::default().safe(self.options.safe);
                tool.seed = self.options.seed;
                let (rotated, estimate) = tool.estimate_and_rotate(points)?;
                let spacing = estimate.spacing().map(Spacing::Uniform);
                (rotated, Some(estimate), spacing)
            }
            false => {
                let pick = |s: &Option<Spacing>| s.clone().unwrap_or_else(|| safe.clone());
                let spacing = [
                    pick(&self.options.dx),
                    pick(&self.options.dy),
                    pick(&self.options.dz),
                ];
                (points.to_vec(), None, spacing)
            }
        };
        self.estimate = estimate;

        let n = points.len();
        dx.check("X", n)?;
        dy.check("Y", n)?;
        dz.check("Z", n)?;

        // corner c of every point, x fastest then y then z
        let tolerance = dx.min().min(dy.min()) / 2.0;
        let mut corners = Vec::with_capacity(8 * n);
        for c in 0..8 {
            let sign = |bit: usize| match (c >> bit) & 1 {
                0 => -0.5,
                _ => 0.5,
            };
            for (i, p) in points.iter().enumerate() {
                let x = p[0] + sign(0) * dx.at(i);
                let y = p[1] + sign(1) * dy.at(i);
                let z = p[2] + sign(2) * dz.at(i);
                corners.push([(x / tolerance).round(), (y / tolerance).round(), z]);
            }
        }

        let (mut nodes, inverse) = unique_rows(&corners);
        for node in nodes.iter_mut() {
            node[0] *= tolerance;
            node[1] *= tolerance;
        }

        if let Some(estimate) = estimate {
            let xy = nodes.iter().map(|p| [p[0], p[1]]).collect::<Vec<_>>();
            for (node, q) in nodes.iter_mut().zip(RotationTool::rotate(&xy, -estimate.angle)) {
                node[0] = q[0];
                node[1] = q[1];
            }
        }

        let mut cells = CellArray::new();
        for i in 0..n {
            let ids = (0..8).map(|c| inverse[c * n + i]).collect::<Vec<usize>>();
            cells.push(CellType::Voxel, &ids);
        }
        debug!("Voxelized {n} points onto {} nodes", nodes.len());

        let mut grid = UnstructuredGrid {
            points: nodes,
            cells,
            ..Default::default()
        };
        if let Some(estimate) = estimate {
            let field = &mut grid.attributes.field;
            field.push(DataArray::new("Recovered Angle (Deg.)", vec![estimate.angle_degrees()]));
            field.push(DataArray::with_components(
                "Recovered Cell Sizes",
                3,
                estimate.spacing().to_vec(),
            )?);
        }
        Ok(grid)
    }
}

/// Sorted distinct rows and the index of every input row among them
fn unique_rows(rows: &[[f64; 3]]) -> (Vec<[f64; 3]>, Vec<usize>) {
    let compare = |a: &[f64; 3], b: &[f64; 3]| -> Ordering {
        a[0].total_cmp(&b[0])
            .then(a[1].total_cmp(&b[1]))
            .then(a[2].total_cmp(&b[2]))
    };

    let mut order = (0..rows.len()).collect::<Vec<usize>>();
    order.sort_by(|a, b| compare(&rows[*a], &rows[*b]));

    let mut unique: Vec<[f64; 3]> = Vec::new();
    let mut inverse = vec![0; rows.len()];
    for i in order {
        match unique.last() {
            Some(last) if compare(last, &rows[i]) == Ordering::Equal => (),
            _ => unique.push(rows[i]),
        }
        inverse[i] = unique.len() - 1;
    }
    (unique, inverse)
}

impl Algorithm for VoxelizePoints {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::PointSet]
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::UnstructuredGrid)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn request_data(&mut self, inputs: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let input = inputs[0];
        let mut grid = self.points_to_grid(&input.points())?;
        for array in input.attributes().arrays(Association::Point) {
            grid.attributes.add(Association::Cell, array.clone());
        }
        Ok(grid.into())
    }
}

/// Builder implementation for [VoxelizePoints] configuration
///
/// ```rust
/// # use geokit_filters::{Spacing, VoxelizePoints};
/// let filter = VoxelizePoints::builder()
///     .deltas(1.0, 2.0, vec![0.5, 0.5])
///     .estimate_grid(false)
///     .build();
///
/// assert_eq!(filter.options().dz, Some(Spacing::PerPoint(vec![0.5, 0.5])));
/// ```
#[derive(Debug, Default)]
pub struct VoxelizePointsBuilder {
    options: VoxelOptions,
}

impl VoxelizePointsBuilder {
    /// Create a new instance of the builder with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the [VoxelizePoints] filter
    pub fn build(self) -> VoxelizePoints {
        VoxelizePoints {
            options: self.options,
            ..Default::default()
        }
    }

    /// Start from a full set of options
    pub fn options(mut self, options: VoxelOptions) -> Self {
        self.options = options;
        self
    }

    /// Cell sizes along every axis, disabling estimation
    pub fn deltas(
        mut self,
        dx: impl Into<Spacing>,
        dy: impl Into<Spacing>,
        dz: impl Into<Spacing>,
    ) -> Self {
        self.options.dx = Some(dx.into());
        self.options.dy = Some(dy.into());
        self.options.dz = Some(dz.into());
        self.options.estimate_grid = false;
        self
    }

    /// Recover rotation and cell sizes from the points
    pub fn estimate_grid(mut self, flag: bool) -> Self {
        self.options.estimate_grid = flag;
        self
    }

    /// Size used wherever a spacing cannot be determined
    pub fn safe(mut self, safe: f64) -> Self {
        self.options.safe = safe;
        self
    }

    /// Seed for the estimator sub-sample
    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welds_shared_corners() {
        let (unique, inverse) = unique_rows(&[[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(unique, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(inverse, vec![1, 0, 1]);
    }

    #[test]
    fn voxel_corner_order() {
        let mut filter = VoxelizePoints::builder().deltas(2.0, 2.0, 2.0).build();
        let grid = filter.points_to_grid(&[[0.0, 0.0, 0.0]]).unwrap();
        let (cell_type, ids) = grid.cells.cell(0).unwrap();
        assert_eq!(cell_type, CellType::Voxel);

        let corners = ids.iter().map(|i| grid.points[*i]).collect::<Vec<_>>();
        assert_eq!(corners[0], [-1.0, -1.0, -1.0]);
        assert_eq!(corners[1], [1.0, -1.0, -1.0]);
        assert_eq!(corners[2], [-1.0, 1.0, -1.0]);
        assert_eq!(corners[7], [1.0, 1.0, 1.0]);
        assert!(grid.attributes.field.is_empty());
    }

    #[test]
    fn per_point_spacing_must_match() {
        let mut filter = VoxelizePoints::builder()
            .deltas(vec![1.0, 1.0, 1.0], 1.0, 1.0)
            .build();
        let error = filter.points_to_grid(&[[0.0; 3], [1.0, 0.0, 0.0]]).unwrap_err();
        assert!(matches!(error, Error::SizeMismatch { expected: 2, found: 3, .. }));
    }

    #[test]
    fn full_grid_node_count() {
        // 3 x 3 x 2 points, unit spacing
        let points = itertools::iproduct!(0..2, 0..3, 0..3)
            .map(|(k, j, i)| [i as f64, j as f64, k as f64])
            .collect::<Vec<_>>();
        let mut filter = VoxelizePoints::builder().deltas(1.0, 1.0, 1.0).build();
        let grid = filter.points_to_grid(&points).unwrap();
        assert_eq!(grid.cells.len(), 18);
        assert_eq!(grid.points.len(), 4 * 4 * 3);
    }
}
