//! UBC OcTree meshes
//!
//! The mesh file describes a uniform base mesh and the list of octants
//! covering it:
//!
//! ```text
//! 16 16 16          base cell counts
//! 0.0 0.0 48.0      top south-west corner
//! 1.0 2.0 3.0       base cell widths
//! 29                number of octants
//! 1 1 1 8           i j k size, 1-indexed from the top
//! ...
//! ```
//!
//! Octants become voxel cells sorted by their lowest corner, with the
//! original file order kept in the `index_cell_corner` cell array so that
//! models can be placed in the same order.

// standard library
use std::path::{Path, PathBuf};

// crate modules
use crate::mesh::{MeshKind, Model};
use crate::parsers::{content_lines, counts, n_floats};
use crate::two_file::{AppenderBase, TwoFileBase};

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, ArrayData, Association, CellArray, CellType, DataArray, Dataset,
    DatasetKind, Error, Information, OutputKind, PortKind, Result, UnstructuredGrid,
};
use geokit_utils::f;

// external crates
use itertools::iproduct;
use log::{debug, trace};

/// Name of the cell array holding the file order of each octant
pub const INDEX_CELL_CORNER: &str = "index_cell_corner";

/// One octant in base mesh indices, `k` counted up from the bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Octant {
    /// Lowest X index
    pub i: usize,
    /// Lowest Y index
    pub j: usize,
    /// Lowest Z index from the bottom
    pub k: usize,
    /// Edge length in base cells
    pub size: usize,
}

/// Header and octants of an OcTree mesh file
#[derive(Debug, Clone, PartialEq)]
pub struct OcTreeMesh {
    /// Base cell counts
    pub base_cells: [usize; 3],
    /// Top south-west corner
    pub origin: [f64; 3],
    /// Base cell widths
    pub widths: [f64; 3],
    /// Octants in file order
    pub octants: Vec<Octant>,
}

impl OcTreeMesh {
    /// Parse an OcTree mesh file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading OcTree mesh {}", path.display());
        Self::parse(&content_lines(path)?)
    }

    /// Parse the content lines of an OcTree mesh file
    pub fn parse(lines: &[String]) -> Result<Self> {
        let bad = |what: &str| Error::ParseError(f!("OcTree mesh {what} is improperly formatted."));
        if lines.len() < 4 {
            return Err(bad("header"));
        }

        let base_cells = match counts(&lines[0])?.as_slice() {
            [nx, ny, nz, ..] => [*nx, *ny, *nz],
            _ => return Err(bad("header")),
        };
        let origin = n_floats::<3>(&lines[1], "OcTree origin")?;
        let widths = n_floats::<3>(&lines[2], "OcTree base widths")?;
        let count = *counts(&lines[3])?.first().ok_or_else(|| bad("header"))?;

        let rows = &lines[4..];
        if rows.len() != count {
            return Err(Error::size_mismatch(
                "Number of octants does not match the OcTree header",
                count,
                rows.len(),
            ));
        }

        let nz = base_cells[2];
        let octants = rows
            .iter()
            .map(|row| match counts(row)?.as_slice() {
                [i, j, k, size]
                    if *i > 0
                        && *j > 0
                        && *k > 0
                        && *size > 0
                        && i + size <= base_cells[0] + 1
                        && j + size <= base_cells[1] + 1 =>
                {
                    // k is 1-indexed from the top
                    let k = (nz + 1)
                        .checked_sub(k + size)
                        .ok_or_else(|| bad("octant"))?;
                    Ok(Octant {
                        i: i - 1,
                        j: j - 1,
                        k,
                        size: *size,
                    })
                }
                _ => Err(bad("octant")),
            })
            .collect::<Result<Vec<Octant>>>()?;

        Ok(Self {
            base_cells,
            origin,
            widths,
            octants,
        })
    }

    /// Whole extent of the base mesh
    pub fn extent(&self) -> [usize; 6] {
        let [nx, ny, nz] = self.base_cells;
        [0, nx, 0, ny, 0, nz]
    }

    /// Build the unstructured grid of voxels
    ///
    /// Shared corners are welded so every node appears once.
    pub fn to_grid(&self) -> UnstructuredGrid {
        let [nx, ny, nz] = self.base_cells;
        let node_key = |i: usize, j: usize, k: usize| i + (nx + 1) * (j + (ny + 1) * k);

        // octants sorted by their south-west-bottom corner
        let mut order = (0..self.octants.len()).collect::<Vec<usize>>();
        order.sort_by_key(|&n| {
            let o = &self.octants[n];
            node_key(o.i, o.j, o.k)
        });

        let corners = |o: &Octant| {
            iproduct!([0, o.size], [0, o.size], [0, o.size])
                .map(|(dk, dj, di)| node_key(o.i + di, o.j + dj, o.k + dk))
                .collect::<Vec<usize>>()
        };

        let mut keys = self.octants.iter().flat_map(corners).collect::<Vec<usize>>();
        keys.sort_unstable();
        keys.dedup();
        trace!("Welded {} OcTree nodes", keys.len());

        let [ox, oy, top] = self.origin;
        let [wx, wy, wz] = self.widths;
        let bottom = top - wz * nz as f64;
        let points = keys
            .iter()
            .map(|key| {
                let i = key % (nx + 1);
                let j = (key / (nx + 1)) % (ny + 1);
                let k = key / ((nx + 1) * (ny + 1));
                [
                    ox + i as f64 * wx,
                    oy + j as f64 * wy,
                    bottom + k as f64 * wz,
                ]
            })
            .collect::<Vec<[f64; 3]>>();

        let mut cells = CellArray::new();
        for &n in &order {
            let ids = corners(&self.octants[n])
                .iter()
                .map(|key| match keys.binary_search(key) {
                    Ok(n) | Err(n) => n,
                })
                .collect::<Vec<usize>>();
            cells.push(CellType::Voxel, &ids);
        }

        let mut grid = UnstructuredGrid {
            points,
            cells,
            ..Default::default()
        };
        let index = order.iter().map(|&n| n as i64).collect::<Vec<i64>>();
        grid.attributes
            .add(Association::Cell, DataArray::new(INDEX_CELL_CORNER, index));
        grid
    }
}

/// Place a model in file order onto an OcTree grid
///
/// The grid must carry the `index_cell_corner` array made by
/// [OcTreeMesh::to_grid].
pub fn place_model_on_octree(grid: &mut UnstructuredGrid, model: &Model, name: &str) -> Result<()> {
    let cells = grid.cells.len();
    let found = model.number_of_cells();
    if found > cells {
        return Err(Error::size_mismatch(
            "This model file has more data than the given mesh has cells to hold.",
            cells,
            found,
        ));
    }
    if found < cells {
        return Err(Error::size_mismatch(
            "This model file does not have enough data to fill the given mesh's cells.",
            cells,
            found,
        ));
    }

    let order = grid
        .attributes
        .get(Association::Cell, INDEX_CELL_CORNER)
        .ok_or_else(|| Error::NotFound(f!("Cell array `{INDEX_CELL_CORNER}` not found.")))?
        .values()?;

    let c = model.components.max(1);
    let mut values = Vec::with_capacity(model.values.len());
    for n in order {
        let n = n as usize;
        let tuple = model
            .values
            .get(n * c..(n + 1) * c)
            .ok_or_else(|| Error::InvalidArgument(f!("Octant index {n} is out of range.")))?;
        values.extend_from_slice(tuple);
    }
    let array = DataArray::with_components(name, c, ArrayData::Float64(values))?;
    grid.attributes.add(Association::Cell, array);
    Ok(())
}

/// Read a UBC OcTree mesh with any number of model files
///
/// ```rust, no_run
/// # use geokit_core::Algorithm;
/// # use geokit_ubc::OcTreeReader;
/// let mut reader = OcTreeReader::new();
/// reader.set_mesh_file_name("octree.msh");
/// reader.add_model_file_name("model.sus");
/// let tree = reader.apply(&[]).unwrap();
/// println!("{} cells", tree.number_of_cells());
/// ```
#[derive(Debug, Default)]
pub struct OcTreeReader {
    state: AlgorithmState,
    files: TwoFileBase,
    mesh: Option<OcTreeMesh>,
    grid: Option<UnstructuredGrid>,
    models: Vec<Model>,
}

impl OcTreeReader {
    /// Reader with no files set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mesh file
    pub fn set_mesh_file_name(&mut self, path: impl AsRef<Path>) {
        if self.files.set_mesh_file_name(path) {
            self.modified(true);
        }
    }

    /// Add a model file, one per timestep
    pub fn add_model_file_name(&mut self, path: impl AsRef<Path>) {
        if self.files.models.add_file_name(path) {
            self.state.touch();
        }
    }

    /// Model file names in timestep order
    pub fn model_file_names(&self) -> &[PathBuf] {
        self.files.models.file_names()
    }

    /// Remove every model file
    pub fn clear_models(&mut self) {
        self.files.models.clear_file_names();
        self.models.clear();
        self.state.touch();
    }

    /// Set the time between model files
    pub fn set_time_delta(&mut self, dt: f64) {
        if self.files.models.set_time_delta(dt) {
            self.modified(false);
        }
    }

    /// Name the placed array, an empty name uses the model file name
    pub fn set_data_name(&mut self, name: &str) {
        if self.files.data_name.set(name) {
            self.modified(false);
        }
    }

    /// Name placed arrays after their model file
    pub fn set_use_filename(&mut self, flag: bool) {
        if self.files.data_name.set_use_filename(flag) {
            self.modified(false);
        }
    }

    /// Name the placed array will have
    pub fn data_name(&self) -> String {
        self.files.array_name()
    }

    /// Read the mesh and every model file
    pub fn read_up_front(&mut self) -> Result<()> {
        if self.files.need_to_read_mesh() {
            let mesh = OcTreeMesh::from_file(self.files.mesh_file_name()?)?;
            self.grid = Some(mesh.to_grid());
            self.mesh = Some(mesh);
            self.files.mark_mesh_read();
        }
        if self.files.models.need_to_read() {
            self.models = self.files.read_models(MeshKind::ThreeD)?;
        }
        Ok(())
    }
}

impl Algorithm for OcTreeReader {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::UnstructuredGrid)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn modified(&mut self, read_again: bool) {
        self.files.modified(read_again);
        self.state.touch();
    }

    fn request_information(&mut self, _inputs: &[&Dataset]) -> Result<Information> {
        if self.files.need_to_read_mesh() {
            self.read_up_front()?;
        }
        Ok(Information {
            whole_extent: self.mesh.as_ref().map(OcTreeMesh::extent),
            timesteps: self.files.models.timesteps(),
        })
    }

    fn request_data(&mut self, _inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        self.read_up_front()?;
        let mut output = self
            .grid
            .clone()
            .ok_or_else(|| Error::InvalidArgument("No mesh has been read.".into()))?;

        let index = self.files.models.index_for(time);
        if let Some(model) = self.models.get(index) {
            place_model_on_octree(&mut output, model, &self.files.array_name())?;
        }
        Ok(output.into())
    }
}

/// Append a time series of models to an upstream OcTree grid
#[derive(Debug, Default)]
pub struct OcTreeAppender {
    state: AlgorithmState,
    base: AppenderBase,
}

impl OcTreeAppender {
    /// Appender with no model files
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model file, one per timestep
    pub fn add_model_file_name(&mut self, path: impl AsRef<Path>) {
        if self.base.files.add_file_name(path) {
            self.state.touch();
        }
    }

    /// Remove every model file
    pub fn clear_models(&mut self) {
        self.base.files.clear_file_names();
        self.base.models.clear();
        self.state.touch();
    }

    /// Set the time between model files
    pub fn set_time_delta(&mut self, dt: f64) {
        if self.base.files.set_time_delta(dt) {
            self.modified(false);
        }
    }

    /// Timesteps of the upstream source, merged with those of the models
    pub fn set_input_timesteps(&mut self, timesteps: &[f64]) {
        if self.base.set_input_timesteps(timesteps) {
            self.modified(false);
        }
    }

    /// Name the appended array, an empty name uses the model file name
    pub fn set_data_name(&mut self, name: &str) {
        if self.base.data_name.set(name) {
            self.modified(false);
        }
    }

    /// Name the appended array will have
    pub fn data_name(&self) -> String {
        self.base.array_name()
    }
}

impl Algorithm for OcTreeAppender {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Kind(DatasetKind::UnstructuredGrid)]
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

    fn modified(&mut self, read_again: bool) {
        self.base.files.modified(read_again);
        self.state.touch();
    }

    fn request_information(&mut self, _inputs: &[&Dataset]) -> Result<Information> {
        Ok(Information {
            whole_extent: None,
            timesteps: self.base.timesteps(),
        })
    }

    fn request_data(&mut self, inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        let mut output = inputs[0].as_unstructured()?.clone();
        if self.base.files.need_to_read() {
            self.base.read_up_front(MeshKind::ThreeD)?;
        }

        let name = self.base.array_name();
        if let Some(model) = self.base.model_for(time) {
            place_model_on_octree(&mut output, model, &name)?;
        }
        Ok(output.into())
    }
}
