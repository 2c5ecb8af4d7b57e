//! Tensor mesh files and the placement of models onto them
//!
//! A UBC tensor mesh is either 3D, with the cell widths of every axis
//! listed from the top south-west corner, or 2D on the XZ plane with
//! piecewise uniform segments. Both are read into a [RectilinearGrid] with
//! Z increasing upward.

// standard library
use std::path::Path;

// crate modules
use crate::parsers::{content_lines, counts, floats, n_floats, parse_widths};

// geokit modules
use geokit_core::{Association, DataArray, Error, RectilinearGrid, Result};
use geokit_utils::f;
use geokit_utils::sequence::cumulative;

// external crates
use log::{debug, trace};
use ndarray::{Array4, Axis};

/// Dimensionality of a tensor mesh file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    /// XZ section with a single unit slab along Y
    TwoD,
    /// Full tensor mesh
    ThreeD,
}

impl MeshKind {
    /// Decide from the counts on the first content line
    ///
    /// One count is a 2D mesh, three or more (OcTree and padded headers)
    /// are 3D.
    pub fn from_first_line(line: &str) -> Result<Self> {
        match counts(line)?.len() {
            1 => Ok(Self::TwoD),
            n if n >= 3 => Ok(Self::ThreeD),
            _ => Err(Error::ParseError("File format not recognized".into())),
        }
    }
}

/// Kind of mesh held in a file, from its first content line
pub fn mesh_kind(path: impl AsRef<Path>) -> Result<MeshKind> {
    let lines = content_lines(path.as_ref())?;
    let first = lines
        .first()
        .ok_or_else(|| Error::ParseError("Mesh file is empty".into()))?;
    MeshKind::from_first_line(first)
}

/// Read a 2D or 3D tensor mesh into an empty rectilinear grid
///
/// ```rust, no_run
/// # use geokit_ubc::read_tensor_mesh;
/// let grid = read_tensor_mesh("mesh.msh").unwrap();
/// println!("{:?}", grid.extent());
/// ```
pub fn read_tensor_mesh(path: impl AsRef<Path>) -> Result<RectilinearGrid> {
    let path = path.as_ref();
    debug!("Reading tensor mesh {}", path.display());
    let lines = content_lines(path)?;
    let first = lines
        .first()
        .ok_or_else(|| Error::ParseError("Mesh file is empty".into()))?;

    match MeshKind::from_first_line(first)? {
        MeshKind::ThreeD => parse_mesh_3d(&lines),
        MeshKind::TwoD => parse_mesh_2d(&lines),
    }
}

/// Build a 3D mesh from its content lines
pub(crate) fn parse_mesh_3d(lines: &[String]) -> Result<RectilinearGrid> {
    if lines.len() < 5 {
        return Err(Error::ParseError(
            "A 3D mesh needs cell counts, an origin and three lines of widths".into(),
        ));
    }

    let (ne, nn, nz) = match counts(&lines[0])?.as_slice() {
        [ne, nn, nz, ..] => (*ne, *nn, *nz),
        _ => return Err(Error::ParseError("File format not recognized".into())),
    };
    let [ox, oy, oz] = n_floats::<3>(&lines[1], "mesh origin")?;

    let cx = parse_widths(&lines[2])?;
    let cy = parse_widths(&lines[3])?;
    let mut cz = parse_widths(&lines[4])?;

    for (axis, expected, widths) in [("X", ne, &cx), ("Y", nn, &cy), ("Z", nz, &cz)] {
        if widths.len() != expected {
            return Err(Error::size_mismatch(
                f!("Number of {axis} cell widths does not match the mesh header"),
                expected,
                widths.len(),
            ));
        }
    }

    // widths are listed from the top down
    cz.reverse();
    let bottom = oz - cz.iter().sum::<f64>();
    trace!("Mesh bottom at {bottom}");

    Ok(RectilinearGrid::new(
        cumulative(ox, &cx),
        cumulative(oy, &cy),
        cumulative(bottom, &cz),
    ))
}

/// Nodes of one axis of a 2D mesh, starting at `start` in `lines`
///
/// The first segment line is `origin end cells`, every other one is
/// `end cells`. Cells are spread evenly over each segment.
fn segment_nodes(lines: &[String], start: usize) -> Result<(Vec<f64>, usize)> {
    let bad = || Error::ParseError("2D mesh segments are improperly formatted".into());
    let count = *counts(lines.get(start).ok_or_else(bad)?)?
        .first()
        .ok_or_else(bad)?;
    if count == 0 {
        return Err(bad());
    }

    let mut nodes = Vec::new();
    for s in 0..count {
        let values = floats(lines.get(start + 1 + s).ok_or_else(bad)?)?;
        let (end, cells) = match (s, values.as_slice()) {
            (0, [origin, end, cells, ..]) => {
                nodes.push(*origin);
                (*end, *cells)
            }
            (_, [end, cells, ..]) if s > 0 => (*end, *cells),
            _ => return Err(bad()),
        };

        if cells < 1.0 || cells.fract() != 0.0 {
            return Err(bad());
        }
        let begin = *nodes.last().ok_or_else(bad)?;
        let width = (end - begin) / cells;
        for j in 1..cells as usize {
            nodes.push(begin + j as f64 * width);
        }
        nodes.push(end);
    }
    Ok((nodes, start + 1 + count))
}

/// Build a 2D mesh from its content lines
pub(crate) fn parse_mesh_2d(lines: &[String]) -> Result<RectilinearGrid> {
    let (x, next) = segment_nodes(lines, 0)?;
    let (depths, _) = segment_nodes(lines, next)?;

    // depths are positive down
    let z = depths.iter().rev().map(|d| -d).collect();
    Ok(RectilinearGrid::new(x, vec![0.0, 1.0], z))
}

/// Whole extent of a tensor mesh without building the grid
pub fn read_mesh_extent(path: impl AsRef<Path>) -> Result<[usize; 6]> {
    let lines = content_lines(path.as_ref())?;
    let first = lines
        .first()
        .ok_or_else(|| Error::ParseError("Mesh file is empty".into()))?;

    match MeshKind::from_first_line(first)? {
        MeshKind::ThreeD => {
            let n = counts(first)?;
            Ok([0, n[0], 0, n[1], 0, n[2]])
        }
        MeshKind::TwoD => {
            let grid = parse_mesh_2d(&lines)?;
            Ok([0, grid.x.len() - 1, 0, 1, 0, grid.z.len() - 1])
        }
    }
}

/// Values of a model with one or more components per cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    /// Values, components of a cell are contiguous
    pub values: Vec<f64>,
    /// Number of components per cell
    pub components: usize,
}

impl Model {
    /// Single component model
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            components: 1,
        }
    }

    /// Number of cells covered
    pub fn number_of_cells(&self) -> usize {
        self.values.len() / self.components.max(1)
    }
}

fn check_model_size(model: &Model, cells: usize, name: &str) -> Result<()> {
    let found = model.number_of_cells();
    if found > cells {
        return Err(Error::size_mismatch(
            f!("Model `{name}` has more data than the given mesh has cells to hold."),
            cells,
            found,
        ));
    }
    if found < cells {
        return Err(Error::size_mismatch(
            f!("Model `{name}` does not have enough data to fill the given mesh's cells."),
            cells,
            found,
        ));
    }
    Ok(())
}

/// Reorder a model from UBC order to the grid's cell order
///
/// UBC lists cells with Z fastest from the top down, then X, then Y. Grid
/// cells run X fastest, then Y, then Z from the bottom up.
///
/// ```rust
/// # use geokit_ubc::{ubc_to_grid_order, Model};
/// // two columns of two cells, listed top to bottom
/// let model = Model::new(vec![1.0, 2.0, 3.0, 4.0]);
/// let values = ubc_to_grid_order(&model, [2, 1, 2], "m").unwrap();
/// assert_eq!(values, vec![2.0, 4.0, 1.0, 3.0]);
/// ```
pub fn ubc_to_grid_order(model: &Model, cells: [usize; 3], name: &str) -> Result<Vec<f64>> {
    let [nx, ny, nz] = cells;
    check_model_size(model, nx * ny * nz, name)?;

    let c = model.components.max(1);
    let array = Array4::from_shape_vec((ny, nx, nz, c), model.values.clone())?;
    let mut array = array.permuted_axes([2, 0, 1, 3]);
    array.invert_axis(Axis(0));
    Ok(array.iter().copied().collect())
}

/// Reorder values in grid cell order back to UBC order
///
/// ```rust
/// # use geokit_ubc::{grid_to_ubc_order, ubc_to_grid_order, Model};
/// let model = Model::new((0..24).map(f64::from).collect());
/// let grid = ubc_to_grid_order(&model, [2, 3, 4], "m").unwrap();
/// assert_eq!(grid_to_ubc_order(&grid, 1, [2, 3, 4]).unwrap(), model.values);
/// ```
pub fn grid_to_ubc_order(values: &[f64], components: usize, cells: [usize; 3]) -> Result<Vec<f64>> {
    let [nx, ny, nz] = cells;
    let c = components.max(1);
    let mut array = Array4::from_shape_vec((nz, ny, nx, c), values.to_vec())?;
    array.invert_axis(Axis(0));
    let array = array.permuted_axes([1, 2, 0, 3]);
    Ok(array.iter().copied().collect())
}

/// Place a model in UBC order onto a tensor mesh as cell data
pub fn place_model_on_grid(grid: &mut RectilinearGrid, model: &Model, name: &str) -> Result<()> {
    let cells = cell_counts(grid);
    let values = ubc_to_grid_order(model, cells, name)?;
    let array = DataArray::with_components(name, model.components.max(1), values)?;
    grid.attributes.add(Association::Cell, array);
    Ok(())
}

/// Cell counts along each axis of a rectilinear grid
pub(crate) fn cell_counts(grid: &RectilinearGrid) -> [usize; 3] {
    grid.dimensions().map(|n| n.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    #[test]
    fn mesh_kind_from_counts() {
        assert_eq!(MeshKind::from_first_line("9").unwrap(), MeshKind::TwoD);
        assert_eq!(MeshKind::from_first_line("4 4 4").unwrap(), MeshKind::ThreeD);
        assert_eq!(
            MeshKind::from_first_line("4 4 4 1 1 1").unwrap(),
            MeshKind::ThreeD
        );
        assert!(MeshKind::from_first_line("4 4").is_err());
    }

    #[test]
    fn mesh_3d_z_runs_upward() {
        let grid = parse_mesh_3d(&lines("2 1 3\n10 20 100\n1 2\n5\n10 20 30")).unwrap();
        assert_eq!(grid.x, vec![10.0, 11.0, 13.0]);
        assert_eq!(grid.y, vec![20.0, 25.0]);
        assert_eq!(grid.z, vec![40.0, 70.0, 90.0, 100.0]);
    }

    #[test]
    fn mesh_3d_width_count_is_checked() {
        let err = parse_mesh_3d(&lines("3 1 1\n0 0 0\n1 2\n5\n10")).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { expected: 3, found: 2, .. }));
    }

    #[test]
    fn mesh_2d_segments() {
        let grid = parse_mesh_2d(&lines("2\n0 10 2\n16 3\n1\n0 4 2")).unwrap();
        assert_eq!(grid.x, vec![0.0, 5.0, 10.0, 12.0, 14.0, 16.0]);
        assert_eq!(grid.y, vec![0.0, 1.0]);
        assert_eq!(grid.z, vec![-4.0, -2.0, -0.0]);
    }

    #[test]
    fn placement_flips_depth() {
        // one column of three cells, top to bottom
        let mut grid = RectilinearGrid::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0, 2.0, 3.0]);
        place_model_on_grid(&mut grid, &Model::new(vec![1.0, 2.0, 3.0]), "rho").unwrap();
        let placed = grid.attributes.get(Association::Cell, "rho").unwrap();
        assert_eq!(placed.values().unwrap(), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn placement_checks_size() {
        let mut grid = RectilinearGrid::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0, 2.0]);
        let err = place_model_on_grid(&mut grid, &Model::new(vec![1.0; 3]), "rho").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Model `rho` has more data than the given mesh has cells to hold."));

        let err = place_model_on_grid(&mut grid, &Model::new(vec![1.0]), "rho").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Model `rho` does not have enough data"));
    }

    #[test]
    fn non_square_placement() {
        // nx=3, ny=2, nz=1: UBC runs x then y for a single layer
        let model = Model::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let values = ubc_to_grid_order(&model, [3, 2, 1], "m").unwrap();
        assert_eq!(values, model.values);
    }

    #[test]
    fn multi_component_placement() {
        let model = Model {
            values: vec![1.0, 10.0, 2.0, 20.0],
            components: 2,
        };
        let values = ubc_to_grid_order(&model, [1, 1, 2], "m").unwrap();
        assert_eq!(values, vec![2.0, 20.0, 1.0, 10.0]);
        assert_eq!(grid_to_ubc_order(&values, 2, [1, 1, 2]).unwrap(), model.values);
    }
}
