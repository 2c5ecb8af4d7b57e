//! Model files and how their arrays are named

// standard library
use std::path::{Path, PathBuf};

// crate modules
use crate::mesh::{MeshKind, Model};
use crate::parsers::{content_lines, counts, floats};

// geokit modules
use geokit_core::{base_name, Error, Result};
use geokit_utils::f;

// external crates
use log::debug;
use serde::{Deserialize, Serialize};

/// Read a 3D model, one cell per line
///
/// Rows with several columns make a multi-component model. Every row must
/// have the same number of columns.
pub fn read_model_3d(path: impl AsRef<Path>) -> Result<Model> {
    let path = path.as_ref();
    debug!("Reading 3D model {}", path.display());

    let mut values = Vec::new();
    let mut components = None;
    for line in content_lines(path)? {
        let row = floats(&line)?;
        match components {
            None => components = Some(row.len()),
            Some(c) if c != row.len() => {
                return Err(Error::ParseError(f!(
                    "Model file `{}` has rows of {c} and {} values",
                    base_name(path),
                    row.len()
                )))
            }
            _ => (),
        }
        values.extend(row);
    }

    Ok(Model {
        values,
        components: components.unwrap_or(1),
    })
}

/// Read a 2D model, `nx nz` followed by `nz` rows of `nx` values
///
/// The rows run from the top down. Values are returned in UBC order with
/// depth fastest, ready for placement on a 2D mesh.
///
/// ```rust
/// # use geokit_ubc::read_model_2d;
/// let path = std::env::temp_dir().join("geokit_model_2d_doc.con");
/// std::fs::write(&path, "3 2\n1 2 3\n4 5 6\n").unwrap();
///
/// let model = read_model_2d(&path).unwrap();
/// assert_eq!(model.values, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
/// ```
pub fn read_model_2d(path: impl AsRef<Path>) -> Result<Model> {
    let path = path.as_ref();
    debug!("Reading 2D model {}", path.display());

    let lines = content_lines(path)?;
    let bad = || Error::ParseError(f!("Model file `{}` improperly formatted.", base_name(path)));

    let (nx, nz) = match lines.first().map(|l| counts(l)).transpose()?.as_deref() {
        Some([nx, nz, ..]) => (*nx, *nz),
        _ => return Err(bad()),
    };

    let mut rows = Vec::with_capacity(nz);
    for line in &lines[1..] {
        let row = floats(line)?;
        if row.len() != nx {
            return Err(bad());
        }
        rows.push(row);
    }
    if rows.len() != nz {
        return Err(bad());
    }

    // column-major flatten so depth runs fastest
    let values = (0..nx)
        .flat_map(|i| rows.iter().map(move |row| row[i]))
        .collect();
    Ok(Model::new(values))
}

/// Read a model with the reader matching the mesh
pub fn read_model(path: impl AsRef<Path>, kind: MeshKind) -> Result<Model> {
    match kind {
        MeshKind::ThreeD => read_model_3d(path),
        MeshKind::TwoD => read_model_2d(path),
    }
}

/// Name given to placed models
///
/// With `use_filename` set the array takes the base name of the first model
/// file instead of `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataName {
    /// Explicit name
    pub name: String,
    /// Use the base name of the first model file
    pub use_filename: bool,
}

impl DataName {
    /// Explicit name that defers to the file name until set
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            use_filename: true,
        }
    }

    /// Set the name, returning true if anything changed
    ///
    /// An empty name switches back to using the file name.
    ///
    /// ```rust
    /// # use geokit_ubc::DataName;
    /// let mut name = DataName::new("Data");
    /// assert_eq!(name.resolve(&["models/rho.mod".into()]), "rho.mod");
    ///
    /// assert!(name.set("density"));
    /// assert_eq!(name.resolve(&["models/rho.mod".into()]), "density");
    ///
    /// assert!(name.set(""));
    /// assert!(name.use_filename);
    /// ```
    pub fn set(&mut self, name: &str) -> bool {
        if name.is_empty() {
            let changed = !self.use_filename;
            self.use_filename = true;
            return changed;
        }
        if self.name != name || self.use_filename {
            self.name = name.to_string();
            self.use_filename = false;
            return true;
        }
        false
    }

    /// Toggle the use of file names, returning true if anything changed
    pub fn set_use_filename(&mut self, flag: bool) -> bool {
        let changed = self.use_filename != flag;
        self.use_filename = flag;
        changed
    }

    /// The array name for a set of model files
    pub fn resolve(&self, files: &[PathBuf]) -> String {
        match (self.use_filename, files.first()) {
            (true, Some(first)) => base_name(first),
            _ => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, text: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("geokit_ubc_model_tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn model_3d_with_comments() {
        let path = temp_file("plain.mod", "! header\n1.0\n2.5 ! inline\n\n3.0\n");
        let model = read_model_3d(path).unwrap();
        assert_eq!(model, Model::new(vec![1.0, 2.5, 3.0]));
    }

    #[test]
    fn model_3d_components() {
        let path = temp_file("vector.fld", "1 2 3\n4 5 6\n");
        let model = read_model_3d(path).unwrap();
        assert_eq!(model.components, 3);
        assert_eq!(model.number_of_cells(), 2);
    }

    #[test]
    fn model_3d_ragged_rows() {
        let path = temp_file("ragged.fld", "1 2 3\n4 5\n");
        assert!(matches!(read_model_3d(path), Err(Error::ParseError(_))));
    }

    #[test]
    fn model_2d_row_count() {
        let path = temp_file("short.con", "2 3\n1 2\n3 4\n");
        let err = read_model_2d(path).unwrap_err();
        assert_eq!(err.to_string(), "Model file `short.con` improperly formatted.");
    }

    #[test]
    fn explicit_name_wins() {
        let mut name = DataName::new("Data");
        assert!(!name.set_use_filename(true));
        name.set("foo");
        assert_eq!(name.resolve(&[]), "foo");
        assert!(!name.set("foo"));
        // no files to name after
        let fallback = DataName::new("Appended Data");
        assert_eq!(fallback.resolve(&[]), "Appended Data");
    }
}
