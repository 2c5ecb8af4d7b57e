//! The dataset variants passed between readers, filters and writers
//!
//! Every variant owns an [Attributes] collection of named arrays grouped by
//! [Association]. Structured grids (image and rectilinear) use the usual VTK
//! ordering where the point index is `i + nx*(j + ny*k)` and cells follow the
//! same `i` fastest convention over the cell dimensions.

// crate modules
use crate::array::{Association, DataArray};
use crate::cell::{CellArray, CellType};
use crate::error::{Error, Result};

// geokit modules
use geokit_utils::f;

// external crates
use itertools::iproduct;
use serde::{Deserialize, Serialize};

/// Named arrays of a dataset grouped by association
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    /// Per-point arrays
    pub point: Vec<DataArray>,
    /// Per-cell arrays
    pub cell: Vec<DataArray>,
    /// Free metadata arrays
    pub field: Vec<DataArray>,
    /// Table columns
    pub row: Vec<DataArray>,
}

impl Attributes {
    /// Arrays for a single association
    pub fn arrays(&self, association: Association) -> &[DataArray] {
        match association {
            Association::Point => &self.point,
            Association::Cell => &self.cell,
            Association::Field => &self.field,
            Association::Row => &self.row,
        }
    }

    /// Mutable arrays for a single association
    pub fn arrays_mut(&mut self, association: Association) -> &mut Vec<DataArray> {
        match association {
            Association::Point => &mut self.point,
            Association::Cell => &mut self.cell,
            Association::Field => &mut self.field,
            Association::Row => &mut self.row,
        }
    }

    /// Add an array, replacing any existing array of the same name
    pub fn add(&mut self, association: Association, array: DataArray) {
        let arrays = self.arrays_mut(association);
        match arrays.iter_mut().find(|a| a.name == array.name) {
            Some(existing) => *existing = array,
            None => arrays.push(array),
        }
    }

    /// Get an array by name from a single association
    pub fn get(&self, association: Association, name: &str) -> Option<&DataArray> {
        self.arrays(association).iter().find(|a| a.name == name)
    }

    /// Remove an array by name from a single association
    pub fn remove(&mut self, association: Association, name: &str) -> Option<DataArray> {
        let arrays = self.arrays_mut(association);
        let idx = arrays.iter().position(|a| a.name == name)?;
        Some(arrays.remove(idx))
    }

    /// Find an array by name, searching point, cell, field then row data
    pub fn search(&self, name: &str) -> Result<(&DataArray, Association)> {
        Association::SEARCH_ORDER
            .iter()
            .find_map(|assoc| self.get(*assoc, name).map(|a| (a, *assoc)))
            .ok_or_else(|| Error::NotFound(f!("Array \"{name}\" not found in input data.")))
    }

    /// True when no association holds any array
    pub fn is_empty(&self) -> bool {
        self.point.is_empty() && self.cell.is_empty() && self.field.is_empty() && self.row.is_empty()
    }
}

/// Tag for each dataset variant, used to declare algorithm ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    /// Named columns only
    Table,
    /// Regular axis-aligned grid
    ImageData,
    /// Grid with separable coordinates
    RectilinearGrid,
    /// Explicit points and cells
    UnstructuredGrid,
    /// Points with optional vertex/line/polygon cells
    PolyData,
    /// Ordered collection of named datasets
    MultiBlock,
}

/// Table of named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Columns are held as row data
    pub attributes: Attributes,
}

impl Table {
    /// Common length of the columns
    pub fn number_of_rows(&self) -> usize {
        self.attributes
            .row
            .first()
            .map(|a| a.number_of_tuples())
            .unwrap_or(0)
    }

    /// Add a column, replacing any of the same name
    pub fn add_column(&mut self, column: DataArray) {
        self.attributes.add(Association::Row, column);
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Option<&DataArray> {
        self.attributes.get(Association::Row, name)
    }

    /// All columns in order
    pub fn columns(&self) -> &[DataArray] {
        &self.attributes.row
    }
}

/// Regular axis-aligned grid
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Node counts along each axis
    pub dimensions: [usize; 3],
    /// Position of the first node
    pub origin: [f64; 3],
    /// Node spacing along each axis
    pub spacing: [f64; 3],
    /// Attribute arrays
    pub attributes: Attributes,
}

impl Default for ImageData {
    fn default() -> Self {
        Self {
            dimensions: [0; 3],
            origin: [0.0; 3],
            spacing: [1.0; 3],
            attributes: Attributes::default(),
        }
    }
}

impl ImageData {
    /// Grid with the given node counts, origin and spacing
    pub fn new(dimensions: [usize; 3], origin: [f64; 3], spacing: [f64; 3]) -> Self {
        Self {
            dimensions,
            origin,
            spacing,
            attributes: Attributes::default(),
        }
    }

    /// Node coordinates along one axis
    pub fn axis_coordinates(&self, axis: usize) -> Vec<f64> {
        (0..self.dimensions[axis])
            .map(|i| self.origin[axis] + i as f64 * self.spacing[axis])
            .collect()
    }

    /// Whole extent `(0, nx-1, 0, ny-1, 0, nz-1)`
    pub fn extent(&self) -> [usize; 6] {
        point_extent(self.dimensions)
    }
}

/// Grid with independent node coordinates along each axis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RectilinearGrid {
    /// X node coordinates
    pub x: Vec<f64>,
    /// Y node coordinates
    pub y: Vec<f64>,
    /// Z node coordinates
    pub z: Vec<f64>,
    /// Attribute arrays
    pub attributes: Attributes,
}

impl RectilinearGrid {
    /// Grid from three node vectors
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        Self {
            x,
            y,
            z,
            attributes: Attributes::default(),
        }
    }

    /// Node counts along each axis
    pub fn dimensions(&self) -> [usize; 3] {
        [self.x.len(), self.y.len(), self.z.len()]
    }

    /// Whole extent `(0, nx-1, 0, ny-1, 0, nz-1)`
    pub fn extent(&self) -> [usize; 6] {
        point_extent(self.dimensions())
    }
}

/// Explicit points and cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnstructuredGrid {
    /// Point coordinates
    pub points: Vec<[f64; 3]>,
    /// Cell connectivity
    pub cells: CellArray,
    /// Attribute arrays
    pub attributes: Attributes,
}

/// Points with optional vertex, line and polygon cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyData {
    /// Point coordinates
    pub points: Vec<[f64; 3]>,
    /// Cell connectivity
    pub cells: CellArray,
    /// Attribute arrays
    pub attributes: Attributes,
}

impl PolyData {
    /// A point cloud with one vertex cell per point
    pub fn from_points(points: Vec<[f64; 3]>) -> Self {
        let mut cells = CellArray::new();
        for i in 0..points.len() {
            cells.push(CellType::Vertex, &[i]);
        }
        Self {
            points,
            cells,
            attributes: Attributes::default(),
        }
    }
}

/// Ordered collection of named datasets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiBlock {
    /// (name, dataset) pairs
    pub blocks: Vec<(String, Dataset)>,
    /// Field arrays of the collection itself
    pub attributes: Attributes,
}

impl MultiBlock {
    /// Block by name
    pub fn block(&self, name: &str) -> Option<&Dataset> {
        self.blocks.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }
}

/// Any of the dataset variants
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    /// Named columns
    Table(Table),
    /// Regular grid
    Image(ImageData),
    /// Rectilinear grid
    Rectilinear(RectilinearGrid),
    /// Unstructured grid
    Unstructured(UnstructuredGrid),
    /// Poly data
    Poly(PolyData),
    /// Collection of datasets
    MultiBlock(MultiBlock),
}

macro_rules! variant_access {
    ($as_ref:ident, $as_mut:ident, $variant:ident, $ty:ty, $kind:expr) => {
        /// Borrow the inner variant, failing for any other kind
        pub fn $as_ref(&self) -> Result<&$ty> {
            match self {
                Self::$variant(inner) => Ok(inner),
                other => Err(Error::InvalidArgument(f!(
                    "expected {:?}, found {:?}",
                    $kind,
                    other.kind()
                ))),
            }
        }

        /// Mutably borrow the inner variant, failing for any other kind
        pub fn $as_mut(&mut self) -> Result<&mut $ty> {
            let kind = self.kind();
            match self {
                Self::$variant(inner) => Ok(inner),
                _ => Err(Error::InvalidArgument(f!(
                    "expected {:?}, found {:?}",
                    $kind,
                    kind
                ))),
            }
        }
    };
}

macro_rules! variant_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Dataset {
            fn from(inner: $ty) -> Self {
                Self::$variant(inner)
            }
        }
    };
}

variant_from!(Table, Table);
variant_from!(Image, ImageData);
variant_from!(Rectilinear, RectilinearGrid);
variant_from!(Unstructured, UnstructuredGrid);
variant_from!(Poly, PolyData);
variant_from!(MultiBlock, MultiBlock);

impl Dataset {
    variant_access!(as_table, as_table_mut, Table, Table, DatasetKind::Table);
    variant_access!(as_image, as_image_mut, Image, ImageData, DatasetKind::ImageData);
    variant_access!(
        as_rectilinear,
        as_rectilinear_mut,
        Rectilinear,
        RectilinearGrid,
        DatasetKind::RectilinearGrid
    );
    variant_access!(
        as_unstructured,
        as_unstructured_mut,
        Unstructured,
        UnstructuredGrid,
        DatasetKind::UnstructuredGrid
    );
    variant_access!(as_poly, as_poly_mut, Poly, PolyData, DatasetKind::PolyData);
    variant_access!(
        as_multiblock,
        as_multiblock_mut,
        MultiBlock,
        MultiBlock,
        DatasetKind::MultiBlock
    );

    /// The empty dataset of a given kind
    pub fn empty(kind: DatasetKind) -> Self {
        match kind {
            DatasetKind::Table => Table::default().into(),
            DatasetKind::ImageData => ImageData::default().into(),
            DatasetKind::RectilinearGrid => RectilinearGrid::default().into(),
            DatasetKind::UnstructuredGrid => UnstructuredGrid::default().into(),
            DatasetKind::PolyData => PolyData::default().into(),
            DatasetKind::MultiBlock => MultiBlock::default().into(),
        }
    }

    /// Variant tag
    pub fn kind(&self) -> DatasetKind {
        match self {
            Self::Table(_) => DatasetKind::Table,
            Self::Image(_) => DatasetKind::ImageData,
            Self::Rectilinear(_) => DatasetKind::RectilinearGrid,
            Self::Unstructured(_) => DatasetKind::UnstructuredGrid,
            Self::Poly(_) => DatasetKind::PolyData,
            Self::MultiBlock(_) => DatasetKind::MultiBlock,
        }
    }

    /// Attribute arrays
    pub fn attributes(&self) -> &Attributes {
        match self {
            Self::Table(d) => &d.attributes,
            Self::Image(d) => &d.attributes,
            Self::Rectilinear(d) => &d.attributes,
            Self::Unstructured(d) => &d.attributes,
            Self::Poly(d) => &d.attributes,
            Self::MultiBlock(d) => &d.attributes,
        }
    }

    /// Mutable attribute arrays
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        match self {
            Self::Table(d) => &mut d.attributes,
            Self::Image(d) => &mut d.attributes,
            Self::Rectilinear(d) => &mut d.attributes,
            Self::Unstructured(d) => &mut d.attributes,
            Self::Poly(d) => &mut d.attributes,
            Self::MultiBlock(d) => &mut d.attributes,
        }
    }

    /// Add an array to an association, replacing any of the same name
    pub fn add_array(&mut self, association: Association, array: DataArray) {
        self.attributes_mut().add(association, array)
    }

    /// Get an array from an association by name
    pub fn get_array(&self, association: Association, name: &str) -> Option<&DataArray> {
        self.attributes().get(association, name)
    }

    /// Find an array by name in the fixed association search order
    ///
    /// ```rust
    /// # use geokit_core::{Association, DataArray, Dataset, ImageData};
    /// let mut grid = Dataset::from(ImageData::new([2, 2, 2], [0.0; 3], [1.0; 3]));
    /// grid.add_array(Association::Cell, DataArray::new("rho", vec![2.7]));
    ///
    /// let (array, association) = grid.search_by_name("rho").unwrap();
    /// assert_eq!(association, Association::Cell);
    /// assert_eq!(array.number_of_tuples(), 1);
    ///
    /// assert!(grid.search_by_name("missing").is_err());
    /// ```
    pub fn search_by_name(&self, name: &str) -> Result<(&DataArray, Association)> {
        self.attributes().search(name)
    }

    /// Node coordinates per axis for the structured variants
    pub fn axes(&self) -> Option<[Vec<f64>; 3]> {
        match self {
            Self::Image(d) => Some([
                d.axis_coordinates(0),
                d.axis_coordinates(1),
                d.axis_coordinates(2),
            ]),
            Self::Rectilinear(d) => Some([d.x.clone(), d.y.clone(), d.z.clone()]),
            _ => None,
        }
    }

    /// Node counts for the structured variants
    pub fn dimensions(&self) -> Option<[usize; 3]> {
        match self {
            Self::Image(d) => Some(d.dimensions),
            Self::Rectilinear(d) => Some(d.dimensions()),
            _ => None,
        }
    }

    /// Number of points, zero for tables and collections
    pub fn number_of_points(&self) -> usize {
        match self {
            Self::Image(_) | Self::Rectilinear(_) => self
                .dimensions()
                .map(|d| d.iter().product())
                .unwrap_or(0),
            Self::Unstructured(d) => d.points.len(),
            Self::Poly(d) => d.points.len(),
            Self::Table(_) => 0,
            Self::MultiBlock(d) => d.blocks.iter().map(|(_, b)| b.number_of_points()).sum(),
        }
    }

    /// Number of cells, zero for tables
    pub fn number_of_cells(&self) -> usize {
        match self {
            Self::Image(_) | Self::Rectilinear(_) => self
                .dimensions()
                .map(|d| cell_dimensions(d).iter().product())
                .unwrap_or(0),
            Self::Unstructured(d) => d.cells.len(),
            Self::Poly(d) => d.cells.len(),
            Self::Table(_) => 0,
            Self::MultiBlock(d) => d.blocks.iter().map(|(_, b)| b.number_of_cells()).sum(),
        }
    }

    /// True when there is nothing to process
    ///
    /// Tables are empty without rows, collections without blocks, and all
    /// other variants without points.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Table(t) => t.number_of_rows() == 0,
            Self::MultiBlock(m) => m.blocks.is_empty(),
            _ => self.number_of_points() == 0,
        }
    }

    /// Explicit coordinates of every point
    pub fn points(&self) -> Vec<[f64; 3]> {
        match self {
            Self::Image(_) | Self::Rectilinear(_) => match self.axes() {
                Some([x, y, z]) => iproduct!(z.iter(), y.iter(), x.iter())
                    .map(|(z, y, x)| [*x, *y, *z])
                    .collect(),
                None => Vec::new(),
            },
            Self::Unstructured(d) => d.points.clone(),
            Self::Poly(d) => d.points.clone(),
            Self::Table(_) => Vec::new(),
            Self::MultiBlock(d) => d.blocks.iter().flat_map(|(_, b)| b.points()).collect(),
        }
    }

    /// `(xmin, xmax, ymin, ymax, zmin, zmax)`, or `None` without points
    pub fn bounds(&self) -> Option<[f64; 6]> {
        if let Some([x, y, z]) = self.axes() {
            let range = |v: &[f64]| -> Option<(f64, f64)> {
                let lo = v.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (lo <= hi).then_some((lo, hi))
            };
            let (x, y, z) = (range(&x)?, range(&y)?, range(&z)?);
            return Some([x.0, x.1, y.0, y.1, z.0, z.1]);
        }
        bounds_of(&self.points())
    }

    /// Type and point ids of a single cell
    pub fn cell(&self, index: usize) -> Option<(CellType, Vec<usize>)> {
        match self {
            Self::Image(_) | Self::Rectilinear(_) => {
                let dims = self.dimensions()?;
                structured_cell(dims, index)
            }
            Self::Unstructured(d) => d.cells.cell(index).map(|(t, ids)| (t, ids.to_vec())),
            Self::Poly(d) => d.cells.cell(index).map(|(t, ids)| (t, ids.to_vec())),
            _ => None,
        }
    }

    /// Center of every cell as the mean of its points
    ///
    /// For structured grids this is the midpoint between nodes along each
    /// axis, for explicit cells the average of the cell's points.
    pub fn cell_centers(&self) -> Vec<[f64; 3]> {
        match self {
            Self::Image(_) | Self::Rectilinear(_) => match self.axes() {
                Some([x, y, z]) => {
                    let (cx, cy, cz) = (midpoints(&x), midpoints(&y), midpoints(&z));
                    iproduct!(cz.iter(), cy.iter(), cx.iter())
                        .map(|(z, y, x)| [*x, *y, *z])
                        .collect()
                }
                None => Vec::new(),
            },
            Self::Unstructured(d) => explicit_centers(&d.points, &d.cells),
            Self::Poly(d) => explicit_centers(&d.points, &d.cells),
            _ => Vec::new(),
        }
    }

    /// Convert any point/cell dataset into explicit points and cells
    ///
    /// Structured cells become VOXEL (or PIXEL/LINE/VERTEX for degenerate
    /// axes) cells in the same order. Point, cell and field arrays are kept.
    pub fn to_unstructured(&self) -> Result<UnstructuredGrid> {
        match self {
            Self::Unstructured(d) => Ok(d.clone()),
            Self::Poly(d) => Ok(UnstructuredGrid {
                points: d.points.clone(),
                cells: d.cells.clone(),
                attributes: without_rows(&d.attributes),
            }),
            Self::Image(_) | Self::Rectilinear(_) => {
                let mut cells = CellArray::new();
                for i in 0..self.number_of_cells() {
                    if let Some((cell_type, ids)) = self.cell(i) {
                        cells.push(cell_type, &ids);
                    }
                }
                Ok(UnstructuredGrid {
                    points: self.points(),
                    cells,
                    attributes: without_rows(self.attributes()),
                })
            }
            other => Err(Error::InvalidArgument(f!(
                "{:?} has no cells to convert",
                other.kind()
            ))),
        }
    }

    /// Keep only the listed cells and the points they use
    ///
    /// Point ids are renumbered in order of first use and the point and cell
    /// arrays are subset to match.
    pub fn extract_cells(&self, cell_ids: &[usize]) -> Result<UnstructuredGrid> {
        let full = self.to_unstructured()?;

        let mut point_map = vec![usize::MAX; full.points.len()];
        let mut kept_points = Vec::new();
        let mut cells = CellArray::new();

        for &c in cell_ids {
            let (cell_type, ids) = full.cells.cell(c).ok_or_else(|| {
                Error::InvalidArgument(f!("cell {c} is out of range for extraction"))
            })?;
            let mapped = ids
                .iter()
                .map(|&p| {
                    if point_map[p] == usize::MAX {
                        point_map[p] = kept_points.len();
                        kept_points.push(p);
                    }
                    point_map[p]
                })
                .collect::<Vec<usize>>();
            cells.push(cell_type, &mapped);
        }

        let mut attributes = Attributes {
            field: full.attributes.field.clone(),
            ..Default::default()
        };
        for array in &full.attributes.point {
            attributes.point.push(array.take_tuples(&kept_points));
        }
        for array in &full.attributes.cell {
            attributes.cell.push(array.take_tuples(cell_ids));
        }

        Ok(UnstructuredGrid {
            points: kept_points.iter().map(|p| full.points[*p]).collect(),
            cells,
            attributes,
        })
    }
}

/// Cell counts along each axis, treating a single node as one flat cell
///
/// ```rust
/// # use geokit_core::cell_dimensions;
/// assert_eq!(cell_dimensions([4, 6, 1]), [3, 5, 1]);
/// assert_eq!(cell_dimensions([0, 6, 1]), [0, 5, 1]);
/// ```
pub fn cell_dimensions(dimensions: [usize; 3]) -> [usize; 3] {
    dimensions.map(|n| match n {
        0 => 0,
        1 => 1,
        n => n - 1,
    })
}

/// Whole extent of a grid with the given node counts
pub fn point_extent(dimensions: [usize; 3]) -> [usize; 6] {
    let [nx, ny, nz] = dimensions.map(|n| n.saturating_sub(1));
    [0, nx, 0, ny, 0, nz]
}

/// Bounding box of a set of points
pub fn bounds_of(points: &[[f64; 3]]) -> Option<[f64; 6]> {
    if points.is_empty() {
        return None;
    }
    let mut b = [
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
    ];
    for p in points {
        for axis in 0..3 {
            b[2 * axis] = b[2 * axis].min(p[axis]);
            b[2 * axis + 1] = b[2 * axis + 1].max(p[axis]);
        }
    }
    Some(b)
}

fn structured_cell(dims: [usize; 3], index: usize) -> Option<(CellType, Vec<usize>)> {
    let [cx, cy, cz] = cell_dimensions(dims);
    if index >= cx * cy * cz {
        return None;
    }
    let i = index % cx;
    let j = (index / cx) % cy;
    let k = index / (cx * cy);

    let span = |start: usize, n: usize| -> Vec<usize> {
        match n > 1 {
            true => vec![start, start + 1],
            false => vec![0],
        }
    };
    let (is, js, ks) = (span(i, dims[0]), span(j, dims[1]), span(k, dims[2]));

    let ids = iproduct!(ks.iter(), js.iter(), is.iter())
        .map(|(k, j, i)| i + dims[0] * (j + dims[1] * k))
        .collect::<Vec<usize>>();

    let cell_type = match dims.iter().filter(|n| **n > 1).count() {
        3 => CellType::Voxel,
        2 => CellType::Pixel,
        1 => CellType::Line,
        _ => CellType::Vertex,
    };
    Some((cell_type, ids))
}

fn midpoints(nodes: &[f64]) -> Vec<f64> {
    match nodes.len() {
        0 => Vec::new(),
        1 => nodes.to_vec(),
        _ => nodes.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect(),
    }
}

fn explicit_centers(points: &[[f64; 3]], cells: &CellArray) -> Vec<[f64; 3]> {
    cells
        .iter()
        .map(|(_, ids)| {
            let n = ids.len().max(1) as f64;
            let mut c = [0.0; 3];
            for id in ids {
                for axis in 0..3 {
                    c[axis] += points[*id][axis];
                }
            }
            c.map(|v| v / n)
        })
        .collect()
}

fn without_rows(attributes: &Attributes) -> Attributes {
    Attributes {
        point: attributes.point.clone(),
        cell: attributes.cell.clone(),
        field: attributes.field.clone(),
        row: Vec::new(),
    }
}
