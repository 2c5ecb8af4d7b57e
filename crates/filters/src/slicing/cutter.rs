//! Cut any dataset with cells by an infinite plane

// standard library
use std::collections::HashMap;

// geokit modules
use geokit_core::{
    Association, Attributes, CellArray, CellType, DataArray, Dataset, Error, PolyData, Result,
};
use geokit_utils::f;

// external crates
use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Edges of a voxel as local point ids, `i` fastest corner order
const VOXEL_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Edges of a pixel as local point ids
const PIXEL_EDGES: [(usize, usize); 4] = [(0, 1), (2, 3), (0, 2), (1, 3)];

/// Infinite plane through an origin
///
/// Volumetric cells are cut into polygons, surface cells into lines and line
/// cells into vertices. Point arrays are interpolated linearly along the cut
/// edges and cell arrays are copied from the cell that produced each piece.
///
/// ```rust
/// # use geokit_core::{Dataset, ImageData};
/// # use geokit_filters::Plane;
/// let grid = Dataset::from(ImageData::new([3, 3, 3], [0.0; 3], [1.0; 3]));
///
/// let slice = Plane::new([0.5, 0.0, 0.0], [1.0, 0.0, 0.0]).cut(&grid).unwrap();
/// assert_eq!(slice.cells.len(), 4);
/// assert_eq!(slice.points.len(), 9);
/// assert!(slice.points.iter().all(|p| p[0] == 0.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Any point on the plane
    pub origin: [f64; 3],
    /// Normal vector, need not be unit length
    pub normal: [f64; 3],
}

/// Where a cut edge was crossed
#[derive(Debug, Clone, Copy)]
struct Sample {
    a: usize,
    b: usize,
    t: f64,
}

impl Plane {
    /// Plane through `origin` facing `normal`
    pub fn new(origin: [f64; 3], normal: [f64; 3]) -> Self {
        Self { origin, normal }
    }

    fn unit_normal(&self) -> Result<Vector3<f64>> {
        Vector3::from(self.normal)
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| {
                Error::InvalidArgument(f!("Plane normal {:?} has no direction", self.normal))
            })
    }

    /// Signed distance of a point from the plane, positive on the normal side
    pub fn signed_distance(&self, point: &[f64; 3]) -> Result<f64> {
        let n = self.unit_normal()?;
        Ok(n.dot(&(Vector3::from(*point) - Vector3::from(self.origin))))
    }

    /// The intersection of the plane with every cell of a dataset
    pub fn cut(&self, dataset: &Dataset) -> Result<PolyData> {
        let normal = self.unit_normal()?;
        let origin = Vector3::from(self.origin);
        let grid = dataset.to_unstructured()?;

        let distances = grid
            .points
            .iter()
            .map(|p| normal.dot(&(Vector3::from(*p) - origin)))
            .collect::<Vec<f64>>();

        let (u, v) = in_plane_basis(&normal);
        let mut welded: HashMap<(usize, usize), usize> = HashMap::new();
        let mut samples: Vec<Sample> = Vec::new();
        let mut points: Vec<[f64; 3]> = Vec::new();
        let mut cells = CellArray::new();
        let mut sources = Vec::new();

        for (c, (cell_type, ids)) in grid.cells.iter().enumerate() {
            let edges: Vec<(usize, usize)> = match cell_type {
                CellType::Voxel => VOXEL_EDGES.iter().map(|(a, b)| (ids[*a], ids[*b])).collect(),
                CellType::Pixel => PIXEL_EDGES.iter().map(|(a, b)| (ids[*a], ids[*b])).collect(),
                CellType::Polygon => ids
                    .iter()
                    .zip(ids.iter().cycle().skip(1))
                    .map(|(a, b)| (*a, *b))
                    .collect(),
                CellType::Line | CellType::PolyLine => {
                    ids.windows(2).map(|w| (w[0], w[1])).collect()
                }
                CellType::Vertex => Vec::new(),
            };

            let mut hits: Vec<usize> = Vec::new();
            for (a, b) in edges {
                let Some(sample) = crossing(a, b, &distances) else {
                    continue;
                };
                let index = *welded.entry((sample.a, sample.b)).or_insert_with(|| {
                    let (pa, pb) = (&grid.points[sample.a], &grid.points[sample.b]);
                    points.push(interpolate(pa, pb, sample.t));
                    samples.push(sample);
                    points.len() - 1
                });
                if !hits.contains(&index) {
                    hits.push(index);
                }
            }

            match cell_type {
                CellType::Voxel if hits.len() >= 3 => {
                    order_around_centroid(&mut hits, &points, &u, &v);
                    cells.push(CellType::Polygon, &hits);
                    sources.push(c);
                }
                CellType::Pixel | CellType::Polygon if hits.len() >= 2 => {
                    cells.push(CellType::Line, &hits[..2]);
                    sources.push(c);
                }
                CellType::Line | CellType::PolyLine => {
                    for hit in hits {
                        cells.push(CellType::Vertex, &[hit]);
                        sources.push(c);
                    }
                }
                _ => (),
            }
        }
        debug!("Plane cut {} cells into {} pieces", grid.cells.len(), cells.len());

        let mut attributes = Attributes {
            field: grid.attributes.field.clone(),
            ..Default::default()
        };
        for array in &grid.attributes.point {
            match interpolate_array(array, &samples) {
                Ok(array) => attributes.add(Association::Point, array),
                Err(_) => debug!("Point array `{}` is not numeric, not interpolated", array.name),
            }
        }
        for array in &grid.attributes.cell {
            attributes.add(Association::Cell, array.take_tuples(&sources));
        }

        Ok(PolyData {
            points,
            cells,
            attributes,
        })
    }
}

/// Where the plane crosses the edge `a-b`, keyed so shared edges weld
///
/// Points on the plane count as being on the positive side, and a crossing
/// exactly at a point is keyed by that point alone.
fn crossing(a: usize, b: usize, distances: &[f64]) -> Option<Sample> {
    let (da, db) = (distances[a], distances[b]);
    if (da >= 0.0) == (db >= 0.0) {
        return None;
    }

    let t = da / (da - db);
    let sample = match t {
        t if t <= 0.0 => Sample { a, b: a, t: 0.0 },
        t if t >= 1.0 => Sample { a: b, b, t: 0.0 },
        t if a < b => Sample { a, b, t },
        t => Sample { a: b, b: a, t: 1.0 - t },
    };
    Some(sample)
}

fn interpolate(a: &[f64; 3], b: &[f64; 3], t: f64) -> [f64; 3] {
    [0, 1, 2].map(|i| a[i] + t * (b[i] - a[i]))
}

fn interpolate_array(array: &DataArray, samples: &[Sample]) -> Result<DataArray> {
    let values = array.values()?;
    let nc = array.components.max(1);
    let data = samples
        .iter()
        .flat_map(|s| {
            let values = &values;
            (0..nc).map(move |k| {
                let (va, vb) = (values[s.a * nc + k], values[s.b * nc + k]);
                va + s.t * (vb - va)
            })
        })
        .collect::<Vec<f64>>();
    DataArray::with_components(array.name.clone(), nc, data)
}

/// Two unit vectors spanning the plane
fn in_plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = match normal.x.abs() < 0.9 {
        true => Vector3::x(),
        false => Vector3::y(),
    };
    let u = normal.cross(&helper).normalize();
    let v = normal.cross(&u);
    (u, v)
}

/// Sort polygon points by angle about their centroid
fn order_around_centroid(
    hits: &mut [usize],
    points: &[[f64; 3]],
    u: &Vector3<f64>,
    v: &Vector3<f64>,
) {
    let centroid = hits
        .iter()
        .map(|i| Vector3::from(points[*i]))
        .sum::<Vector3<f64>>()
        / hits.len() as f64;

    let angle = |i: &usize| {
        let d = Vector3::from(points[*i]) - centroid;
        d.dot(v).atan2(d.dot(u))
    };
    hits.sort_by(|a, b| angle(a).total_cmp(&angle(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use geokit_core::{ImageData, RectilinearGrid};

    #[test]
    fn shared_edges_are_welded() {
        let grid = Dataset::from(ImageData::new([3, 2, 2], [0.0; 3], [1.0; 3]));
        let slice = Plane::new([0.0, 0.0, 0.5], [0.0, 0.0, 1.0]).cut(&grid).unwrap();
        assert_eq!(slice.cells.len(), 2);
        assert_eq!(slice.points.len(), 6);
        assert!(slice
            .cells
            .iter()
            .all(|(t, ids)| t == CellType::Polygon && ids.len() == 4));
    }

    #[test]
    fn point_data_is_interpolated() {
        let mut grid = RectilinearGrid::new(vec![0.0, 2.0], vec![0.0, 1.0], vec![0.0, 1.0]);
        let x = [0.0, 2.0, 0.0, 2.0, 0.0, 2.0, 0.0, 2.0];
        grid.attributes.add(Association::Point, DataArray::new("x", x.to_vec()));
        grid.attributes.add(Association::Cell, DataArray::new("id", vec![7]));

        let slice = Plane::new([0.5, 0.0, 0.0], [-3.0, 0.0, 0.0]).cut(&grid.into()).unwrap();
        let values = slice.attributes.get(Association::Point, "x").unwrap().values().unwrap();
        assert!(values.iter().all(|v| (v - 0.5).abs() < 1e-12));
        assert_eq!(
            slice.attributes.get(Association::Cell, "id").unwrap().values().unwrap(),
            vec![7.0]
        );
    }

    #[test]
    fn polygons_are_ordered() {
        let grid = Dataset::from(ImageData::new([2, 2, 2], [0.0; 3], [1.0; 3]));
        let slice = Plane::new([0.5, 0.5, 0.5], [0.0, 1.0, 0.0]).cut(&grid).unwrap();
        let (_, ids) = slice.cells.cell(0).unwrap();

        // consecutive corners of a unit square are always a unit apart
        for k in 0..4 {
            let (a, b) = (slice.points[ids[k]], slice.points[ids[(k + 1) % 4]]);
            let d = ((a[0] - b[0]).powi(2) + (a[2] - b[2]).powi(2)).sqrt();
            assert!((d - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn missing_plane_is_empty() {
        let grid = Dataset::from(ImageData::new([2, 2, 2], [0.0; 3], [1.0; 3]));
        let slice = Plane::new([5.0, 0.0, 0.0], [1.0, 0.0, 0.0]).cut(&grid).unwrap();
        assert!(slice.points.is_empty());
        assert!(Plane::new([0.0; 3], [0.0; 3]).cut(&grid).is_err());
    }
}
