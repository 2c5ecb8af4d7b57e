//! Integration tests for the filters

use geokit_core::{
    Algorithm, Association, CellType, DataArray, Dataset, DatasetKind, ImageData, PolyData,
};
use geokit_filters::{
    AddCellConnToPoints, Connection, ExtractCellCenters, ExtractTopography, RotationTool,
    SliceBuilder, VoxelizePoints,
};
use rstest::{fixture, rstest};

/// Axis aligned 2 x 3 lattice with unit spacing
#[fixture]
fn lattice() -> Vec<[f64; 2]> {
    itertools::iproduct!([1.0, 2.0, 3.0], [1.1, 2.1])
        .map(|(y, x)| [x, y])
        .collect()
}

/// The lattice turned by 33.3 degrees
#[fixture]
fn rotated(lattice: Vec<[f64; 2]>) -> Vec<[f64; 3]> {
    RotationTool::rotate(&lattice, -33.3f64.to_radians())
        .into_iter()
        .map(|p| [p[0], p[1], 0.0])
        .collect()
}

#[fixture]
fn cube() -> Dataset {
    let mut image = ImageData::new([11, 11, 11], [0.0; 3], [1.0; 3]);
    let values = (0..1331).map(|i| i as f64).collect::<Vec<f64>>();
    image
        .attributes
        .add(Association::Point, DataArray::new("Index", values));
    image.into()
}

#[fixture]
fn layered() -> (Dataset, Dataset) {
    let grid = ImageData::new([3, 3, 4], [0.0; 3], [1.0; 3]);
    let surface = PolyData::from_points(vec![[1.0, 1.0, 2.0]]);
    (grid.into(), surface.into())
}

#[rstest]
fn rotation_is_recovered(lattice: Vec<[f64; 2]>, rotated: Vec<[f64; 3]>) {
    let tool = RotationTool::default().seed(7);
    let (aligned, estimate) = tool.estimate_and_rotate(&rotated).unwrap();

    assert!((estimate.angle_degrees() - 33.3).abs() < 1e-5);
    assert!((estimate.dx - 1.0).abs() < 1e-6);
    assert!((estimate.dy - 1.0).abs() < 1e-6);

    for (a, b) in aligned.iter().zip(&lattice) {
        assert!((a[0] - b[0]).abs() < 1e-6);
        assert!((a[1] - b[1]).abs() < 1e-6);
    }
}

#[rstest]
fn rotated_points_are_voxelized(rotated: Vec<[f64; 3]>) {
    let mut points = PolyData::from_points(rotated);
    points.attributes.add(
        Association::Point,
        DataArray::new("Grade", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
    );

    let mut filter = VoxelizePoints::builder().seed(7).build();
    let output = filter.apply(&[&points.into()]).unwrap();

    assert_eq!(output.kind(), DatasetKind::UnstructuredGrid);
    assert_eq!(output.number_of_cells(), 6);
    assert_eq!(output.number_of_points(), 24);
    assert!((filter.recovered_angle(true) - 33.3).abs() < 1e-5);

    let angle = output
        .get_array(Association::Field, "Recovered Angle (Deg.)")
        .unwrap();
    assert!((angle.values().unwrap()[0] - 33.3).abs() < 1e-5);
    let grade = output.get_array(Association::Cell, "Grade").unwrap();
    assert_eq!(grade.number_of_tuples(), 6);
}

#[rstest]
fn slices_along_x(cube: Dataset) {
    let mut slicer = SliceBuilder::new().count(10).axis(0).along_axis().unwrap();
    let output = slicer.apply(&[&cube]).unwrap();
    let blocks = &output.as_multiblock().unwrap().blocks;
    assert_eq!(blocks.len(), 10);

    let mut previous = f64::NEG_INFINITY;
    for (name, block) in blocks {
        let slice = block.as_poly().unwrap();
        assert!(!slice.points.is_empty(), "{name}");
        assert_eq!(slice.cells.len(), 100);
        assert!(slice.cells.iter().all(|(t, _)| t == CellType::Polygon));

        let x = slice.points[0][0];
        assert!(slice.points.iter().all(|p| (p[0] - x).abs() < 1e-9));
        assert!(x > previous);
        previous = x;
    }
    assert!((previous - 9.999).abs() < 1e-9);
}

#[rstest]
#[case(0.0, 0.5)]
#[case(50.0, 5.5)]
#[case(99.0, 8.5)]
fn slide_along_a_path(cube: Dataset, #[case] location: f64, #[case] expected: f64) {
    let path = Dataset::from(PolyData::from_points(
        (0..10).map(|i| [i as f64 + 0.5, 5.0, 5.0]).collect(),
    ));

    let mut slicer = SliceBuilder::new().slide_along_points().unwrap();
    slicer.set_location(location).unwrap();
    let slice = slicer.apply(&[&path, &cube]).unwrap();

    let poly = slice.as_poly().unwrap();
    assert_eq!(poly.cells.len(), 100);
    assert!(poly.points.iter().all(|p| (p[0] - expected).abs() < 1e-9));

    // interpolated halfway between nodes along x
    let index = slice.get_array(Association::Point, "Index").unwrap();
    assert_eq!(index.number_of_tuples(), poly.points.len());
}

#[rstest]
fn topography_removes_cells(layered: (Dataset, Dataset)) {
    let (grid, surface) = layered;

    let mut filter = ExtractTopography::builder().remove(true).build();
    let below = filter.apply(&[&grid, &surface]).unwrap();
    assert_eq!(below.kind(), DatasetKind::UnstructuredGrid);
    assert_eq!(below.number_of_cells(), 8);
    assert!(below.bounds().unwrap()[5] <= 2.0);

    filter.set_invert(true);
    let above = filter.apply(&[&grid, &surface]).unwrap();
    assert_eq!(above.number_of_cells(), 4);
    let flags = above.get_array(Association::Cell, "Extracted").unwrap();
    assert!(flags.values().unwrap().iter().all(|f| *f == 1.0));
}

#[rstest]
fn topography_failure_is_captured(layered: (Dataset, Dataset)) {
    let (grid, _) = layered;
    let mut filter = ExtractTopography::new();

    // a table is not a surface
    let table = Dataset::empty(DatasetKind::Table);
    let output = filter.update(&[&grid, &table], None);
    assert_eq!(output.kind(), DatasetKind::ImageData);
    assert!(filter.error_occurred());
    assert!(filter
        .error_message()
        .unwrap()
        .starts_with("@@@@PVGeoError ---> "));
}

#[rstest]
#[case(Connection::Line, false, 3)]
#[case(Connection::Line, true, 4)]
#[case(Connection::PolyLine, true, 1)]
fn centers_are_connected(#[case] cell_type: Connection, #[case] close: bool, #[case] cells: usize) {
    let grid = Dataset::from(ImageData::new([3, 3, 2], [0.0; 3], [1.0; 3]));
    let centers = ExtractCellCenters::default().apply(&[&grid]).unwrap();
    assert_eq!(centers.number_of_points(), 4);

    let mut filter = AddCellConnToPoints::new();
    filter.set_cell_type(cell_type);
    filter.set_close_loop(close);
    filter.set_use_nearest_neighbour(true);
    let output = filter.apply(&[&centers]).unwrap();

    assert_eq!(output.number_of_cells(), cells);
    assert_eq!(output.number_of_points(), 4);
}
