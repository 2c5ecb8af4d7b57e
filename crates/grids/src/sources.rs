//! Parametric grid sources for building models from scratch

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Association, DataArray, Dataset, DatasetKind, Error, ImageData,
    Information, OutputKind, RectilinearGrid, Result,
};
use geokit_ubc::parse_widths;
use geokit_utils::sequence::{cumulative, linspace};

// external crates
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Product of the `(i, j, k)` indices of every sample, x fastest
///
/// ```rust
/// # use geokit_grids::spatial_data;
/// assert_eq!(spatial_data([2, 2, 2]), vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
/// ```
pub fn spatial_data(shape: [usize; 3]) -> Vec<f64> {
    let [nx, ny, nz] = shape;
    let mut values = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                values.push((i * j * k) as f64);
            }
        }
    }
    values
}

/// An image grid carrying `Spatial Point Data` and `Spatial Cell Data`
///
/// ```rust
/// # use geokit_core::{Algorithm, Association};
/// # use geokit_grids::CreateUniformGrid;
/// let mut source = CreateUniformGrid::new();
/// source.set_extent([5, 4, 3]);
/// let grid = source.apply(&[]).unwrap();
///
/// assert_eq!(grid.number_of_points(), 60);
/// assert_eq!(grid.number_of_cells(), 24);
/// assert!(grid.get_array(Association::Cell, "Spatial Cell Data").is_some());
/// ```
#[derive(Debug)]
pub struct CreateUniformGrid {
    state: AlgorithmState,
    extent: [usize; 3],
    spacing: [f64; 3],
    origin: [f64; 3],
}

impl Default for CreateUniformGrid {
    fn default() -> Self {
        Self {
            state: AlgorithmState::default(),
            extent: [10, 10, 10],
            spacing: [1.0; 3],
            origin: [0.0; 3],
        }
    }
}

impl CreateUniformGrid {
    /// 10 x 10 x 10 nodes at unit spacing
    pub fn new() -> Self {
        Self::default()
    }

    /// Node counts along each axis
    pub fn set_extent(&mut self, extent: [usize; 3]) {
        if self.extent != extent {
            self.extent = extent;
            self.modified(false);
        }
    }

    /// Node spacing along each axis
    pub fn set_spacing(&mut self, spacing: [f64; 3]) {
        if self.spacing != spacing {
            self.spacing = spacing;
            self.modified(false);
        }
    }

    /// Position of the first node
    pub fn set_origin(&mut self, origin: [f64; 3]) {
        if self.origin != origin {
            self.origin = origin;
            self.modified(false);
        }
    }
}

impl Algorithm for CreateUniformGrid {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::ImageData)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn request_information(&mut self, _: &[&Dataset]) -> Result<Information> {
        let [nx, ny, nz] = self.extent.map(|n| n.saturating_sub(1));
        Ok(Information {
            whole_extent: Some([0, nx, 0, ny, 0, nz]),
            ..Default::default()
        })
    }

    fn request_data(&mut self, _: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let mut image = ImageData::new(self.extent, self.origin, self.spacing);
        let cells = self.extent.map(|n| n.saturating_sub(1));
        image.attributes.add(
            Association::Cell,
            DataArray::new("Spatial Cell Data", spatial_data(cells)),
        );
        image.attributes.add(
            Association::Point,
            DataArray::new("Spatial Point Data", spatial_data(self.extent)),
        );
        Ok(image.into())
    }
}

/// A rectilinear grid with evenly spread nodes over a range on each axis
///
/// The extent counts cells, so a range is split into `n` equal cells.
#[derive(Debug)]
pub struct CreateEvenRectilinearGrid {
    state: AlgorithmState,
    extent: [usize; 3],
    ranges: [[f64; 2]; 3],
}

impl Default for CreateEvenRectilinearGrid {
    fn default() -> Self {
        Self {
            state: AlgorithmState::default(),
            extent: [10, 10, 10],
            ranges: [[-1.0, 1.0]; 3],
        }
    }
}

impl CreateEvenRectilinearGrid {
    /// 10 x 10 x 10 cells over `[-1, 1]` on every axis
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell counts along each axis
    pub fn set_extent(&mut self, extent: [usize; 3]) {
        if self.extent != extent {
            self.extent = extent;
            self.modified(false);
        }
    }

    fn set_range(&mut self, axis: usize, start: f64, stop: f64) {
        if self.ranges[axis] != [start, stop] {
            self.ranges[axis] = [start, stop];
            self.modified(false);
        }
    }

    /// Range of the X nodes
    pub fn set_x_range(&mut self, start: f64, stop: f64) {
        self.set_range(0, start, stop);
    }

    /// Range of the Y nodes
    pub fn set_y_range(&mut self, start: f64, stop: f64) {
        self.set_range(1, start, stop);
    }

    /// Range of the Z nodes
    pub fn set_z_range(&mut self, start: f64, stop: f64) {
        self.set_range(2, start, stop);
    }
}

impl Algorithm for CreateEvenRectilinearGrid {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::RectilinearGrid)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn request_information(&mut self, _: &[&Dataset]) -> Result<Information> {
        let [nx, ny, nz] = self.extent;
        Ok(Information {
            whole_extent: Some([0, nx, 0, ny, 0, nz]),
            ..Default::default()
        })
    }

    fn request_data(&mut self, _: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let [x, y, z] = [0, 1, 2].map(|a| {
            let [start, stop] = self.ranges[a];
            linspace(start, stop, self.extent[a] + 1)
        });
        let mut grid = RectilinearGrid::new(x, y, z);
        grid.attributes.add(
            Association::Cell,
            DataArray::new("Spatial Data", spatial_data(self.extent)),
        );
        Ok(grid.into())
    }
}

/// Parameters of [CreateTensorMesh]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TensorMeshOptions {
    /// Top south-west corner of the mesh
    pub origin: [f64; 3],
    /// Cell widths along X, west to east
    pub x_cells: Vec<f64>,
    /// Cell widths along Y, south to north
    pub y_cells: Vec<f64>,
    /// Cell widths along Z, top to bottom
    pub z_cells: Vec<f64>,
    /// Seed for the random model, random each run when unset
    pub seed: Option<u64>,
}

impl Default for TensorMeshOptions {
    fn default() -> Self {
        let widths = |line: &str| parse_widths(line).unwrap_or_default();
        Self {
            origin: [-350.0, -400.0, 0.0],
            x_cells: widths("200 100 50 20*50.0 50 100 200"),
            y_cells: widths("200 100 50 21*50.0 50 100 200"),
            z_cells: widths("20*25.0 50 100 200"),
            seed: None,
        }
    }
}

impl TensorMeshOptions {
    /// Load options from a json string, missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise the options to pretty json
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A rectilinear grid laid out like a UBC tensor mesh, with a random model
///
/// Cell widths are given in the same `n*w` shorthand as a UBC mesh file and
/// the origin is the top of the mesh, so the grid extends downward from it.
/// A `Random Data` cell array with values in `[0, 1)` is attached.
///
/// ```rust
/// # use geokit_core::Algorithm;
/// # use geokit_grids::CreateTensorMesh;
/// let mut source = CreateTensorMesh::builder()
///     .origin([0.0, 0.0, 100.0])
///     .x_cells("4*25")
///     .y_cells("10 2*20 10")
///     .z_cells("3*10 2*20")
///     .seed(42)
///     .build()
///     .unwrap();
///
/// let grid = source.apply(&[]).unwrap();
/// assert_eq!(grid.bounds(), Some([0.0, 100.0, 0.0, 60.0, 30.0, 100.0]));
/// assert_eq!(grid.number_of_cells(), 4 * 4 * 5);
/// ```
#[derive(Debug, Default)]
pub struct CreateTensorMesh {
    state: AlgorithmState,
    options: TensorMeshOptions,
}

impl CreateTensorMesh {
    /// The default 26 x 27 x 23 demonstration mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an instance of the [CreateTensorMeshBuilder]
    pub fn builder() -> CreateTensorMeshBuilder {
        CreateTensorMeshBuilder::default()
    }

    /// Current options
    pub fn options(&self) -> &TensorMeshOptions {
        &self.options
    }

    /// Top south-west corner of the mesh
    pub fn set_origin(&mut self, origin: [f64; 3]) {
        if self.options.origin != origin {
            self.options.origin = origin;
            self.modified(false);
        }
    }

    /// Cell widths along X from a UBC width line
    pub fn set_x_cells_str(&mut self, line: &str) -> Result<()> {
        self.set_cells(0, parse_widths(line)?);
        Ok(())
    }

    /// Cell widths along Y from a UBC width line
    pub fn set_y_cells_str(&mut self, line: &str) -> Result<()> {
        self.set_cells(1, parse_widths(line)?);
        Ok(())
    }

    /// Cell widths along Z, top down, from a UBC width line
    pub fn set_z_cells_str(&mut self, line: &str) -> Result<()> {
        self.set_cells(2, parse_widths(line)?);
        Ok(())
    }

    /// Set explicit cell widths along one axis
    pub fn set_cells(&mut self, axis: usize, widths: Vec<f64>) {
        let cells = match axis {
            0 => &mut self.options.x_cells,
            1 => &mut self.options.y_cells,
            _ => &mut self.options.z_cells,
        };
        if *cells != widths {
            *cells = widths;
            self.modified(false);
        }
    }

    /// Whole extent `(0, nx, 0, ny, 0, nz)` in cells
    pub fn extent(&self) -> [usize; 6] {
        let o = &self.options;
        [0, o.x_cells.len(), 0, o.y_cells.len(), 0, o.z_cells.len()]
    }

    /// The mesh without any model
    pub fn mesh(&self) -> Result<RectilinearGrid> {
        let o = &self.options;
        if o.x_cells.is_empty() || o.y_cells.is_empty() || o.z_cells.is_empty() {
            return Err(Error::InvalidSize(
                "A tensor mesh needs at least one cell along each axis.".into(),
            ));
        }

        let [ox, oy, oz] = o.origin;
        let cz = o.z_cells.iter().rev().copied().collect::<Vec<f64>>();
        let bottom = oz - cz.iter().sum::<f64>();

        Ok(RectilinearGrid::new(
            cumulative(ox, &o.x_cells),
            cumulative(oy, &o.y_cells),
            cumulative(bottom, &cz),
        ))
    }

    fn random_model(&self, n: usize) -> Vec<f64> {
        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        (0..n).map(|_| rng.gen::<f64>()).collect()
    }
}

impl Algorithm for CreateTensorMesh {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::RectilinearGrid)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn request_information(&mut self, _: &[&Dataset]) -> Result<Information> {
        Ok(Information {
            whole_extent: Some(self.extent()),
            ..Default::default()
        })
    }

    fn request_data(&mut self, _: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        let mut grid = self.mesh()?;
        let n = grid.dimensions().iter().map(|d| d - 1).product::<usize>();
        debug!("Filling {n} tensor mesh cells with random data");
        grid.attributes.add(
            Association::Cell,
            DataArray::new("Random Data", self.random_model(n)),
        );
        Ok(grid.into())
    }
}

/// Builder implementation for [CreateTensorMesh] configuration
///
/// Width lines are only parsed on [CreateTensorMeshBuilder::build].
#[derive(Debug, Default)]
pub struct CreateTensorMeshBuilder {
    origin: Option<[f64; 3]>,
    lines: [Option<String>; 3],
    seed: Option<u64>,
}

impl CreateTensorMeshBuilder {
    /// Create a new instance of the builder with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the [CreateTensorMesh] source
    pub fn build(self) -> Result<CreateTensorMesh> {
        let mut options = TensorMeshOptions::default();
        if let Some(origin) = self.origin {
            options.origin = origin;
        }
        let [x, y, z] = self.lines;
        for (line, cells) in [
            (x, &mut options.x_cells),
            (y, &mut options.y_cells),
            (z, &mut options.z_cells),
        ] {
            if let Some(line) = line {
                *cells = parse_widths(&line)?;
            }
        }
        options.seed = self.seed;

        Ok(CreateTensorMesh {
            options,
            ..Default::default()
        })
    }

    /// Top south-west corner of the mesh
    pub fn origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Cell widths along X, e.g. `"200 100 20*50.0"`
    pub fn x_cells(mut self, line: &str) -> Self {
        self.lines[0] = Some(line.to_string());
        self
    }

    /// Cell widths along Y
    pub fn y_cells(mut self, line: &str) -> Self {
        self.lines[1] = Some(line.to_string());
        self
    }

    /// Cell widths along Z, top down
    pub fn z_cells(mut self, line: &str) -> Self {
        self.lines[2] = Some(line.to_string());
        self
    }

    /// Fix the seed of the random model
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tensor_mesh() {
        let mut source = CreateTensorMesh::new();
        let info = source.update_information(&[]).unwrap();
        assert_eq!(info.whole_extent, Some([0, 26, 0, 27, 0, 23]));

        let grid = source.apply(&[]).unwrap();
        assert_eq!(
            grid.bounds(),
            Some([-350.0, 1350.0, -400.0, 1350.0, -850.0, 0.0])
        );
        let data = grid.get_array(Association::Cell, "Random Data").unwrap();
        assert_eq!(data.number_of_tuples(), 26 * 27 * 23);
        assert!(data.values().unwrap().iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn seeded_models_repeat() {
        let build = || CreateTensorMesh::builder().seed(9).build().unwrap();
        let a = build().apply(&[]).unwrap();
        let b = build().apply(&[]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bad_widths_fail_to_build() {
        assert!(CreateTensorMesh::builder().x_cells("0*50").build().is_err());

        let mut source = CreateTensorMesh::new();
        assert!(source.set_z_cells_str("ten").is_err());
        assert_eq!(source.extent()[5], 23);
    }

    #[test]
    fn even_grid_spans_the_ranges() {
        let mut source = CreateEvenRectilinearGrid::new();
        source.set_extent([4, 2, 1]);
        source.set_z_range(-10.0, 0.0);
        let grid = source.apply(&[]).unwrap();

        let rect = grid.as_rectilinear().unwrap();
        assert_eq!(rect.x, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(rect.z, vec![-10.0, 0.0]);
        let data = grid.get_array(Association::Cell, "Spatial Data").unwrap();
        assert_eq!(data.number_of_tuples(), 8);
    }

    #[test]
    fn uniform_grid_extent() {
        let mut source = CreateUniformGrid::new();
        let info = source.update_information(&[]).unwrap();
        assert_eq!(info.whole_extent, Some([0, 9, 0, 9, 0, 9]));

        let grid = source.apply(&[]).unwrap();
        let points = grid.get_array(Association::Point, "Spatial Point Data").unwrap();
        assert_eq!(points.values().unwrap()[999], 729.0);
    }
}
