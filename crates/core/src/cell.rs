//! Cell types and the flat connectivity table for explicit cells

// external crates
use serde::{Deserialize, Serialize};

/// Cell types used by the toolkit, numbered as in VTK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    /// A single point
    Vertex = 1,
    /// Two point segment
    Line = 3,
    /// Ordered chain of segments
    PolyLine = 4,
    /// Closed planar polygon
    Polygon = 7,
    /// Axis-aligned rectangle, 4 points
    Pixel = 8,
    /// Axis-aligned hexahedron, 8 points in `i` fastest order
    Voxel = 11,
}

impl CellType {
    /// Numeric VTK identifier
    pub fn id(&self) -> u8 {
        *self as u8
    }
}

/// Connectivity of explicit cells
///
/// Point ids for every cell are stored back to back in `connectivity`, with
/// `offsets` holding the end of each cell (the VTK XML convention).
///
/// ```rust
/// # use geokit_core::{CellArray, CellType};
/// let mut cells = CellArray::new();
/// cells.push(CellType::Line, &[0, 1]);
/// cells.push(CellType::PolyLine, &[1, 2, 3]);
///
/// assert_eq!(cells.len(), 2);
/// assert_eq!(cells.offsets(), &[2, 5]);
/// assert_eq!(cells.cell(1), Some((CellType::PolyLine, &[1usize, 2, 3][..])));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellArray {
    connectivity: Vec<usize>,
    offsets: Vec<usize>,
    types: Vec<CellType>,
}

impl CellArray {
    /// An empty cell table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell made of `ids`
    pub fn push(&mut self, cell_type: CellType, ids: &[usize]) {
        self.connectivity.extend_from_slice(ids);
        self.offsets.push(self.connectivity.len());
        self.types.push(cell_type);
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when there are no cells
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Type and point ids of a single cell
    pub fn cell(&self, index: usize) -> Option<(CellType, &[usize])> {
        let end = *self.offsets.get(index)?;
        let start = match index {
            0 => 0,
            _ => self.offsets[index - 1],
        };
        Some((self.types[index], &self.connectivity[start..end]))
    }

    /// Iterate over every (type, point ids) pair
    pub fn iter(&self) -> impl Iterator<Item = (CellType, &[usize])> + '_ {
        (0..self.len()).filter_map(|i| self.cell(i))
    }

    /// Flat point ids of all cells
    pub fn connectivity(&self) -> &[usize] {
        &self.connectivity
    }

    /// End offset of each cell into the connectivity
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Type of every cell
    pub fn types(&self) -> &[CellType] {
        &self.types
    }
}
