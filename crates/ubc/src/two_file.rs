//! Bookkeeping shared by the mesh readers and the model appenders
//!
//! UBC meshes are a two-file format: one mesh file and any number of model
//! files, each model being one timestep of cell data on the mesh.

// standard library
use std::path::{Path, PathBuf};

// crate modules
use crate::mesh::{MeshKind, Model};
use crate::model::{read_model, DataName};

// geokit modules
use geokit_core::{merge_timesteps, nearest_index, Error, ReaderBase, Result};

// external crates
use log::{debug, warn};

/// A mesh file name plus the model files read onto it
#[derive(Debug, Clone)]
pub(crate) struct TwoFileBase {
    mesh_file: Option<PathBuf>,
    need_to_read_mesh: bool,
    pub(crate) models: ReaderBase,
    pub(crate) data_name: DataName,
}

impl Default for TwoFileBase {
    fn default() -> Self {
        Self {
            mesh_file: None,
            need_to_read_mesh: true,
            models: ReaderBase::default(),
            data_name: DataName::new("Data"),
        }
    }
}

impl TwoFileBase {
    /// Set the mesh file, returning true if it changed
    pub(crate) fn set_mesh_file_name(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref().to_path_buf();
        if self.mesh_file.as_ref() == Some(&path) {
            return false;
        }
        self.mesh_file = Some(path);
        self.need_to_read_mesh = true;
        true
    }

    pub(crate) fn mesh_file_name(&self) -> Result<&Path> {
        self.mesh_file
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("No mesh file name has been set.".into()))
    }

    pub(crate) fn need_to_read_mesh(&self) -> bool {
        self.need_to_read_mesh
    }

    pub(crate) fn mark_mesh_read(&mut self) {
        self.need_to_read_mesh = false;
    }

    /// Flag files for reading again
    pub(crate) fn modified(&mut self, read_again: bool) {
        if read_again {
            self.need_to_read_mesh = true;
        }
        self.models.modified(read_again);
    }

    /// Read every model file with the reader matching the mesh
    pub(crate) fn read_models(&mut self, kind: MeshKind) -> Result<Vec<Model>> {
        let models = self
            .models
            .file_names()
            .iter()
            .map(|p| read_model(p, kind))
            .collect::<Result<Vec<Model>>>()?;
        self.models.mark_read();
        Ok(models)
    }

    /// Name for placed models
    pub(crate) fn array_name(&self) -> String {
        self.data_name.resolve(self.models.file_names())
    }
}

/// Model files appended to an upstream mesh over time
///
/// Timesteps are the union of the upstream timesteps and those of the model
/// files. A requested time past the last model falls back to the last model
/// that was placed successfully.
#[derive(Debug, Clone)]
pub(crate) struct AppenderBase {
    pub(crate) files: ReaderBase,
    pub(crate) data_name: DataName,
    pub(crate) models: Vec<Model>,
    input_timesteps: Vec<f64>,
    last_index: usize,
}

impl Default for AppenderBase {
    fn default() -> Self {
        Self {
            files: ReaderBase::default(),
            data_name: DataName::new("Appended Data"),
            models: Vec::new(),
            input_timesteps: Vec::new(),
            last_index: 0,
        }
    }
}

impl AppenderBase {
    pub(crate) fn set_input_timesteps(&mut self, timesteps: &[f64]) -> bool {
        if self.input_timesteps == timesteps {
            return false;
        }
        self.input_timesteps = timesteps.to_vec();
        true
    }

    /// Merged timesteps of the input and the model files
    pub(crate) fn timesteps(&self) -> Vec<f64> {
        merge_timesteps(&self.input_timesteps, &self.files.timesteps())
    }

    pub(crate) fn read_up_front(&mut self, kind: MeshKind) -> Result<()> {
        self.models = self
            .files
            .file_names()
            .iter()
            .map(|p| read_model(p, kind))
            .collect::<Result<Vec<Model>>>()?;
        self.files.mark_read();
        Ok(())
    }

    /// Model to place for a requested time
    pub(crate) fn model_for(&mut self, time: Option<f64>) -> Option<&Model> {
        let index = match time {
            Some(t) => nearest_index(&self.timesteps(), t),
            None => 0,
        };

        if index < self.models.len() {
            self.last_index = index;
        } else if !self.models.is_empty() {
            warn!(
                "No model for timestep index {index}, using index {}",
                self.last_index
            );
        }
        debug!("Appending model {}", self.last_index);
        self.models.get(self.last_index)
    }

    pub(crate) fn array_name(&self) -> String {
        self.data_name.resolve(self.files.file_names())
    }
}
