//! Integration tests for the shared data model

use geokit_core::{
    cell_dimensions, Association, CellType, DataArray, Dataset, ImageData, PolyData,
    RectilinearGrid, ReaderBase,
};
use rstest::{fixture, rstest};

#[fixture]
fn grid() -> Dataset {
    let mut grid = RectilinearGrid::new(
        vec![0.0, 1.0, 3.0],
        vec![0.0, 2.0],
        vec![-1.0, 0.0, 4.0],
    );
    let cells = (0..4).map(|i| i as f64).collect::<Vec<f64>>();
    grid.attributes
        .add(Association::Cell, DataArray::new("index", cells));
    grid.into()
}

#[rstest]
fn structured_counts(grid: Dataset) {
    assert_eq!(grid.number_of_points(), 18);
    assert_eq!(grid.number_of_cells(), 4);
    assert_eq!(grid.bounds(), Some([0.0, 3.0, 0.0, 2.0, -1.0, 4.0]));
}

#[rstest]
fn point_order_is_x_fastest(grid: Dataset) {
    let points = grid.points();
    assert_eq!(points[0], [0.0, 0.0, -1.0]);
    assert_eq!(points[1], [1.0, 0.0, -1.0]);
    assert_eq!(points[3], [0.0, 2.0, -1.0]);
    assert_eq!(points[6], [0.0, 0.0, 0.0]);
}

#[rstest]
fn structured_cells_are_voxels(grid: Dataset) {
    let (cell_type, ids) = grid.cell(0).unwrap();
    assert_eq!(cell_type, CellType::Voxel);
    assert_eq!(ids, vec![0, 1, 3, 4, 6, 7, 9, 10]);

    let centers = grid.cell_centers();
    assert_eq!(centers[0], [0.5, 1.0, -0.5]);
    assert_eq!(centers[3], [2.0, 1.0, 2.0]);
}

#[rstest]
#[case([2, 2, 1], CellType::Pixel, 4)]
#[case([2, 1, 1], CellType::Line, 2)]
#[case([1, 1, 1], CellType::Vertex, 1)]
fn degenerate_axes(#[case] dims: [usize; 3], #[case] expected: CellType, #[case] n: usize) {
    let image = Dataset::from(ImageData::new(dims, [0.0; 3], [1.0; 3]));
    let (cell_type, ids) = image.cell(0).unwrap();
    assert_eq!(cell_type, expected);
    assert_eq!(ids.len(), n);
    assert_eq!(cell_dimensions(dims).iter().product::<usize>(), 1);
}

#[rstest]
fn extracting_cells_renumbers_points(grid: Dataset) {
    let subset = grid.extract_cells(&[3]).unwrap();
    assert_eq!(subset.cells.len(), 1);
    assert_eq!(subset.points.len(), 8);
    assert_eq!(subset.cells.cell(0).unwrap().1, &[0, 1, 2, 3, 4, 5, 6, 7]);

    let index = &subset.attributes.cell[0];
    assert_eq!(index.values().unwrap(), vec![3.0]);
}

#[rstest]
fn search_order_prefers_points() {
    let mut cloud = Dataset::from(PolyData::from_points(vec![[0.0; 3]]));
    cloud.add_array(Association::Field, DataArray::new("v", vec![1.0, 2.0]));
    cloud.add_array(Association::Point, DataArray::new("v", vec![5.0]));

    let (array, association) = cloud.search_by_name("v").unwrap();
    assert_eq!(association, Association::Point);
    assert_eq!(array.values().unwrap(), vec![5.0]);

    let err = cloud.search_by_name("rho").unwrap_err();
    assert_eq!(err.to_string(), "Array \"rho\" not found in input data.");
}

#[rstest]
#[case(None, 0)]
#[case(Some(-5.0), 0)]
#[case(Some(1.4), 1)]
#[case(Some(1.6), 2)]
#[case(Some(100.0), 2)]
fn reader_time_lookup(#[case] time: Option<f64>, #[case] expected: usize) {
    let mut base = ReaderBase::default();
    for name in ["a.mod", "b.mod", "c.mod"] {
        base.add_file_name(name);
    }
    assert_eq!(base.index_for(time), expected);
}

#[test]
fn reader_time_delta() {
    let mut base = ReaderBase::default();
    base.add_file_name("a.mod");
    assert!(base.timesteps().is_empty());

    base.add_file_name("b.mod");
    assert!(base.set_time_delta(0.5));
    assert!(!base.set_time_delta(0.5));
    assert_eq!(base.timesteps(), vec![0.0, 0.5]);
    assert!(base.single_file_name().is_err());
}
