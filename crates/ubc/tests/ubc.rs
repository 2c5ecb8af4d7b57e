//! Integration tests for the UBC readers, appenders and writer

use geokit_core::{Algorithm, Association, Dataset, RectilinearGrid};
use geokit_readers::WriteOut;
use geokit_ubc::{
    read_tensor_mesh, MeshKind, OcTreeAppender, OcTreeReader, ObservationReader,
    TensorMeshAppender, TensorMeshReader, TopoMeshAppender, UbcTensorWriter, INDEX_CELL_CORNER,
};
use rstest::{fixture, rstest};

fn cell_values(dataset: &Dataset, name: &str) -> Vec<f64> {
    dataset
        .get_array(Association::Cell, name)
        .unwrap()
        .values()
        .unwrap()
}

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("geokit_ubc_tests").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[fixture]
fn tensor() -> TensorMeshReader {
    let mut reader = TensorMeshReader::new();
    reader.set_mesh_file_name("./data/tensor.msh");
    reader.add_model_file_name("./data/tensor.mod");
    reader.set_data_name("foo");
    reader
}

#[fixture]
fn octree() -> OcTreeReader {
    let mut reader = OcTreeReader::new();
    reader.set_mesh_file_name("./data/octree.msh");
    reader
}

#[rstest]
fn tensor_mesh_shape(mut tensor: TensorMeshReader) {
    let info = tensor.update_information(&[]).unwrap();
    assert_eq!(info.whole_extent, Some([0, 26, 0, 27, 0, 23]));

    let output = tensor.apply(&[]).unwrap();
    assert_eq!(output.number_of_cells(), 26 * 27 * 23);
    assert_eq!(
        output.bounds(),
        Some([-350.0, 1350.0, -400.0, 1350.0, -850.0, 0.0])
    );
    assert_eq!(tensor.mesh_kind(), Some(MeshKind::ThreeD));
}

#[rstest]
fn tensor_model_placement(mut tensor: TensorMeshReader) {
    let output = tensor.apply(&[]).unwrap();
    let data = cell_values(&output, "foo");
    let (nx, ny, nz) = (26, 27, 23);

    // the model holds its own UBC index
    for (ix, iy, iz) in [(0, 0, 0), (3, 0, 0), (0, 5, 0), (0, 0, 7), (25, 26, 22), (11, 4, 19)] {
        let cell = ix + nx * (iy + ny * iz);
        let ubc = iy * nx * nz + ix * nz + (nz - 1 - iz);
        assert_eq!(data[cell], ubc as f64);
    }
}

#[rstest]
fn tensor_data_name_from_file() {
    let mut reader = TensorMeshReader::new();
    reader.set_mesh_file_name("./data/tensor.msh");
    reader.add_model_file_name("./data/tensor.mod");
    assert_eq!(reader.data_name(), "tensor.mod");

    let output = reader.apply(&[]).unwrap();
    assert!(output.get_array(Association::Cell, "tensor.mod").is_some());
}

#[rstest]
fn tensor_mesh_only() {
    let mut reader = TensorMeshReader::new();
    reader.set_mesh_file_name("./data/tensor.msh");
    let output = reader.apply(&[]).unwrap();
    assert!(output.attributes().cell.is_empty());
}

#[rstest]
fn tensor_model_appender(mut tensor: TensorMeshReader) {
    let grid = tensor.apply(&[]).unwrap();

    let mut appender = TensorMeshAppender::new();
    appender.add_model_file_name("./data/tensor.mod");
    appender.set_data_name("appended");
    let output = appender.apply(&[&grid]).unwrap();

    let arrays = output.attributes().arrays(Association::Cell);
    assert_eq!(arrays.len(), 2);
    assert_eq!(arrays[1].name, "appended");
    assert_eq!(cell_values(&output, "appended"), cell_values(&output, "foo"));
}

#[rstest]
fn tensor_writer_round_trip(mut tensor: TensorMeshReader) {
    let grid = tensor.apply(&[]).unwrap();
    let dir = temp_dir("round_trip");
    let mesh = dir.join("written.msh");
    UbcTensorWriter::default().write(&grid, &mesh).unwrap();

    let text = std::fs::read_to_string(&mesh).unwrap();
    let lines = text.lines().collect::<Vec<&str>>();
    assert_eq!(lines[0], "26 27 23");
    assert_eq!(lines[1], "-350 -400 0");
    assert_eq!(lines[4], "20*25 50 100 200");

    let mut reader = TensorMeshReader::new();
    reader.set_mesh_file_name(&mesh);
    reader.add_model_file_name(dir.join("foo.mod"));
    reader.set_data_name("foo");
    let read_back = reader.apply(&[]).unwrap();

    assert_eq!(read_back.bounds(), grid.bounds());
    assert_eq!(cell_values(&read_back, "foo"), cell_values(&grid, "foo"));
}

#[rstest]
fn tensor_writer_image() {
    let mut image = geokit_core::ImageData::new([3, 2, 3], [10.0, 20.0, -4.0], [5.0, 5.0, 2.0]);
    image.attributes.add(
        Association::Cell,
        geokit_core::DataArray::new("Rock Type", vec![1.0, 2.0, 3.0, 4.0]),
    );
    let dir = temp_dir("image");
    let mesh = dir.join("image.msh");
    UbcTensorWriter::default().write(&image.into(), &mesh).unwrap();

    let grid: RectilinearGrid = read_tensor_mesh(&mesh).unwrap();
    assert_eq!(grid.x, vec![10.0, 15.0, 20.0]);
    assert_eq!(grid.y, vec![20.0, 25.0]);
    assert_eq!(grid.z, vec![-4.0, -2.0, 0.0]);
    assert!(dir.join("Rock_Type.mod").exists());
}

#[rstest]
fn tensor_2d_mesh() {
    let mut reader = TensorMeshReader::new();
    reader.set_mesh_file_name("./data/tensor_2d.msh");
    reader.add_model_file_name("./data/tensor_2d.con");
    reader.set_data_name("foo");

    let info = reader.update_information(&[]).unwrap();
    assert_eq!(info.whole_extent, Some([0, 48, 0, 1, 0, 27]));

    let output = reader.apply(&[]).unwrap();
    assert_eq!(reader.mesh_kind(), Some(MeshKind::TwoD));
    let bounds = output.bounds().unwrap();
    assert_eq!((bounds[0], bounds[2], bounds[5]), (-300.0, 0.0, 10.0));

    // rows are written top down as 100 * row + column
    let data = cell_values(&output, "foo");
    assert_eq!(data.len(), 48 * 27);
    assert_eq!(data[0], 2600.0);
    assert_eq!(data[48 * 26 + 5], 5.0);
}

#[rstest]
fn tensor_2d_appender() {
    let mut reader = TensorMeshReader::new();
    reader.set_mesh_file_name("./data/tensor_2d.msh");
    let grid = reader.apply(&[]).unwrap();

    let mut appender = TensorMeshAppender::new();
    appender.add_model_file_name("./data/tensor_2d.con");
    let output = appender.apply(&[&grid]).unwrap();
    let data = cell_values(&output, "tensor_2d.con");
    assert_eq!(data[48 * 26 + 47], 47.0);
}

#[rstest]
fn octree_mesh(mut octree: OcTreeReader) {
    let info = octree.update_information(&[]).unwrap();
    assert_eq!(info.whole_extent, Some([0, 16, 0, 16, 0, 16]));

    let output = octree.apply(&[]).unwrap();
    assert_eq!(output.number_of_cells(), 29);
    assert_eq!(output.number_of_points(), 84);
    assert_eq!(
        output.bounds(),
        Some([0.0, 16.0, 0.0, 32.0, 0.0, 48.0])
    );
}

#[rstest]
fn octree_models_over_time(mut octree: OcTreeReader) {
    for t in 0..5 {
        octree.add_model_file_name(format!("./data/octree_{t}.mod"));
    }
    octree.set_data_name("foo");

    let info = octree.update_information(&[]).unwrap();
    assert_eq!(info.timesteps, vec![0.0, 1.0, 2.0, 3.0, 4.0]);

    for t in 0..5 {
        let output = octree.apply_at(&[], Some(t as f64)).unwrap();
        let order = cell_values(&output, INDEX_CELL_CORNER);
        let data = cell_values(&output, "foo");
        for (value, n) in data.iter().zip(&order) {
            // models hold 100 * step + octant number
            assert_eq!(*value, 100.0 * t as f64 + n);
        }
    }
}

#[rstest]
fn octree_appender(mut octree: OcTreeReader) {
    octree.add_model_file_name("./data/octree_0.mod");
    octree.set_data_name("Initial Data");
    let tree = octree.apply(&[]).unwrap();

    let mut appender = OcTreeAppender::new();
    for t in 1..5 {
        appender.add_model_file_name(format!("./data/octree_{t}.mod"));
    }
    let info = appender.update_information(&[&tree]).unwrap();
    assert_eq!(info.timesteps.len(), 4);

    let output = appender.apply(&[&tree]).unwrap();
    let arrays = output.attributes().arrays(Association::Cell);
    assert_eq!(arrays.len(), 3);
    assert_eq!(arrays[2].name, "octree_1.mod");

    // a time past the end maps to the last model
    let output = appender.apply_at(&[&tree], Some(10.0)).unwrap();
    let order = cell_values(&output, INDEX_CELL_CORNER);
    assert_eq!(cell_values(&output, "octree_1.mod")[0], 400.0 + order[0]);
}

#[rstest]
fn topography_appender() {
    let grid = read_tensor_mesh("./data/unit.msh").unwrap();
    let mut appender = TopoMeshAppender::new();
    appender.set_topo_file_name("./data/unit.topo");

    let output = appender.apply(&[&grid.into()]).unwrap();
    let active = cell_values(&output, "Active Topography");
    assert_eq!(active.len(), 27);
    assert!(active[..18].iter().all(|v| *v == 1.0));
    assert!(active[18..26].iter().all(|v| *v == 0.0));
    assert_eq!(active[26], 1.0);
}

#[rstest]
fn topography_size_mismatch(mut tensor: TensorMeshReader) {
    let grid = tensor.apply(&[]).unwrap();
    let mut appender = TopoMeshAppender::new();
    appender.set_topo_file_name("./data/unit.topo");
    let err = appender.apply(&[&grid]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Dimension mismatch between input grid and topo file."
    );
}

#[rstest]
#[case::topo(ObservationReader::topo(), 4, &["Elevation"])]
#[case::gravity(ObservationReader::gravity(), 3, &["Grav", "Err"])]
#[case::gradient(ObservationReader::gravity_gradient(), 2, &["G_xx", "G_yy", "G_zz"])]
#[case::magnetic(ObservationReader::magnetic(), 3, &["Mag", "Err"])]
fn observations(#[case] mut reader: ObservationReader, #[case] n: usize, #[case] arrays: &[&str]) {
    let file = match reader.kind() {
        geokit_ubc::ObservationKind::Topo => "./data/stations.topo",
        geokit_ubc::ObservationKind::Gravity => "./data/survey.grv",
        geokit_ubc::ObservationKind::GravityGradient => "./data/survey.gg",
        geokit_ubc::ObservationKind::Magnetic => "./data/survey.mag",
    };
    reader.add_file_name(file);
    let output = reader.apply(&[]).unwrap();

    assert_eq!(output.number_of_points(), n);
    let names = output
        .attributes()
        .arrays(Association::Point)
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(names, arrays);
}

#[test]
fn magnetic_field_vectors() {
    let mut reader = ObservationReader::magnetic();
    reader.add_file_name("./data/survey.mag");
    let output = reader.apply(&[]).unwrap();

    let survey = reader.magnetic_survey().unwrap();
    assert_eq!(survey.geomagnetic, 55000.0);

    let field = output
        .get_array(Association::Field, "Inducing Magnetic Field")
        .unwrap();
    assert_eq!(field.components, 3);
    let field = field.values().unwrap();
    let magnitude = field.iter().map(|v| v * v).sum::<f64>().sqrt();
    assert!((magnitude - 55000.0).abs() < 1e-6);
    assert!((field[2] - 55000.0 * 72f64.to_radians().sin()).abs() < 1e-6);

    let projection = output
        .get_array(Association::Field, "Anomaly Projection")
        .unwrap()
        .values()
        .unwrap();
    let norm = projection.iter().map(|v| v * v).sum::<f64>().sqrt();
    assert!((norm - 1.0).abs() < 1e-12);
}

#[test]
fn observation_timesteps() {
    let mut reader = ObservationReader::gravity();
    reader.add_file_name("./data/survey.grv");
    reader.add_file_name("./data/survey.grv");
    reader.set_time_delta(5.0);
    let info = reader.update_information(&[]).unwrap();
    // the same file is only added once
    assert!(info.timesteps.is_empty());
}
