//! Tensor mesh reader and the filters appending models onto tensor meshes

// standard library
use std::path::{Path, PathBuf};

// crate modules
use crate::mesh::{
    cell_counts, mesh_kind, place_model_on_grid, read_mesh_extent, read_tensor_mesh, MeshKind,
    Model,
};
use crate::parsers::{content_lines, counts};
use crate::two_file::{AppenderBase, TwoFileBase};

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Dataset, DatasetKind, Error, Information, OutputKind, PortKind,
    RectilinearGrid, Result,
};
use geokit_utils::f;

// external crates
use log::{debug, trace};

/// Read a UBC 2D or 3D tensor mesh with any number of model files
///
/// Each model file is one timestep. The mesh is read once and the models
/// are read up front, so changing the requested time only swaps the placed
/// cell array.
///
/// ```rust, no_run
/// # use geokit_core::Algorithm;
/// # use geokit_ubc::TensorMeshReader;
/// let mut reader = TensorMeshReader::new();
/// reader.set_mesh_file_name("mesh.msh");
/// reader.add_model_file_name("density.den");
/// reader.set_data_name("Density");
///
/// let grid = reader.apply(&[]).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct TensorMeshReader {
    state: AlgorithmState,
    files: TwoFileBase,
    kind: Option<MeshKind>,
    mesh: Option<RectilinearGrid>,
    models: Vec<Model>,
}

impl TensorMeshReader {
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

    /// Dimensionality of the mesh, once read
    pub fn mesh_kind(&self) -> Option<MeshKind> {
        self.kind
    }

    /// Read the mesh and every model file
    pub fn read_up_front(&mut self) -> Result<()> {
        if self.files.need_to_read_mesh() {
            let path = self.files.mesh_file_name()?;
            self.kind = Some(mesh_kind(path)?);
            self.mesh = Some(read_tensor_mesh(path)?);
            self.files.mark_mesh_read();
        }
        if self.files.models.need_to_read() {
            let kind = self.kind.unwrap_or(MeshKind::ThreeD);
            self.models = self.files.read_models(kind)?;
        }
        Ok(())
    }
}

impl Algorithm for TensorMeshReader {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::RectilinearGrid)
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
        let extent = match &self.mesh {
            Some(mesh) if !self.files.need_to_read_mesh() => mesh.extent(),
            _ => read_mesh_extent(self.files.mesh_file_name()?)?,
        };
        Ok(Information {
            whole_extent: Some(extent),
            timesteps: self.files.models.timesteps(),
        })
    }

    fn request_data(&mut self, _inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        self.read_up_front()?;
        let mut output = self
            .mesh
            .clone()
            .ok_or_else(|| Error::InvalidArgument("No mesh has been read.".into()))?;

        let index = self.files.models.index_for(time);
        if let Some(model) = self.models.get(index) {
            place_model_on_grid(&mut output, model, &self.files.array_name())?;
        }
        Ok(output.into())
    }
}

/// Append a time series of models to an upstream tensor mesh
///
/// The input decides which model reader is used: a grid one cell thick in
/// Y is treated as a 2D mesh.
#[derive(Debug, Default)]
pub struct TensorMeshAppender {
    state: AlgorithmState,
    base: AppenderBase,
}

impl TensorMeshAppender {
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

    /// Name appended arrays after their model file
    pub fn set_use_filename(&mut self, flag: bool) {
        if self.base.data_name.set_use_filename(flag) {
            self.modified(false);
        }
    }

    /// Name the appended array will have
    pub fn data_name(&self) -> String {
        self.base.array_name()
    }
}

impl Algorithm for TensorMeshAppender {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Kind(DatasetKind::RectilinearGrid)]
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::RectilinearGrid)
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
        let mut output = inputs[0].as_rectilinear()?.clone();

        if self.base.files.need_to_read() {
            // UBC 2D meshes lie on the XZ plane
            let kind = match output.dimensions()[1] == 2 {
                true => MeshKind::TwoD,
                false => MeshKind::ThreeD,
            };
            debug!("Reading appended models as {kind:?}");
            self.base.read_up_front(kind)?;
        }

        let name = self.base.array_name();
        if let Some(model) = self.base.model_for(time) {
            place_model_on_grid(&mut output, model, &name)?;
        }
        Ok(output.into())
    }
}

/// Append the discrete topography of a UBC topo file as cell data
///
/// The file holds `ne nn` followed by one `i j k` row per column of cells.
/// Cells of a column at or below layer `k`, counted from the bottom, are
/// active (1) and those above are inactive (0). Columns missing from the
/// file are NaN. The result is added as `Active Topography`.
#[derive(Debug)]
pub struct TopoMeshAppender {
    state: AlgorithmState,
    topo_file: Option<PathBuf>,
    need_to_read: bool,
    header: (usize, usize),
    indices: Vec<[usize; 3]>,
}

impl Default for TopoMeshAppender {
    fn default() -> Self {
        Self {
            state: AlgorithmState::default(),
            topo_file: None,
            need_to_read: true,
            header: (0, 0),
            indices: Vec::new(),
        }
    }
}

impl TopoMeshAppender {
    /// Appender with no topography file
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the topography file
    pub fn set_topo_file_name(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        if self.topo_file.as_ref() != Some(&path) {
            self.topo_file = Some(path);
            self.modified(true);
        }
    }

    /// Remove the topography file
    pub fn clear_topo_file(&mut self) {
        self.topo_file = None;
        self.modified(true);
    }

    fn read_up_front(&mut self) -> Result<()> {
        let path = self
            .topo_file
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("No topography file name has been set.".into()))?;
        debug!("Reading discrete topography {}", path.display());

        let lines = content_lines(path)?;
        let bad = || Error::ParseError("Discrete topography file improperly formatted.".into());
        self.header = match lines.first().map(|l| counts(l)).transpose()?.as_deref() {
            Some([ne, nn, ..]) => (*ne, *nn),
            _ => return Err(bad()),
        };
        self.indices = lines[1..]
            .iter()
            .map(|l| match counts(l)?.as_slice() {
                [i, j, k] => Ok([*i, *j, *k]),
                _ => Err(bad()),
            })
            .collect::<Result<Vec<[usize; 3]>>>()?;
        self.need_to_read = false;
        Ok(())
    }

    /// The topography model in UBC order for a mesh of `cells`
    fn topo_model(&self, cells: [usize; 3]) -> Result<Model> {
        let [nx, ny, nz] = cells;
        let (ne, nn) = self.header;
        let top = self.indices.iter().map(|[_, _, k]| k + 1).max().unwrap_or(0);
        if nx != nn || ny != ne || top > nz {
            return Err(Error::InvalidSize(
                "Dimension mismatch between input grid and topo file.".into(),
            ));
        }

        // laid out as (ny, nx, nz) with depth fastest, top down
        let mut values = vec![f64::NAN; ny * nx * nz];
        for &[i, j, k] in &self.indices {
            if i >= ny || j >= nx {
                return Err(Error::InvalidArgument(f!(
                    "Topography column ({i}, {j}) is outside the mesh."
                )));
            }
            let column = &mut values[(i * nx + j) * nz..(i * nx + j + 1) * nz];
            for (depth, v) in column.iter_mut().enumerate() {
                let layer = nz - 1 - depth;
                *v = if layer <= k { 1.0 } else { 0.0 };
            }
        }
        trace!("Built topography for {} columns", self.indices.len());
        Ok(Model::new(values))
    }
}

impl Algorithm for TopoMeshAppender {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Kind(DatasetKind::RectilinearGrid)]
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::RectilinearGrid)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn modified(&mut self, read_again: bool) {
        if read_again {
            self.need_to_read = true;
        }
        self.state.touch();
    }

    fn request_data(&mut self, inputs: &[&Dataset], _time: Option<f64>) -> Result<Dataset> {
        let mut output = inputs[0].as_rectilinear()?.clone();
        if self.need_to_read {
            self.read_up_front()?;
        }
        let model = self.topo_model(cell_counts(&output))?;
        place_model_on_grid(&mut output, &model, "Active Topography")?;
        Ok(output.into())
    }
}
