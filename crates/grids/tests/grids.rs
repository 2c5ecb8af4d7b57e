//! Integration tests for the grid utilities and model sources

use geokit_core::{Algorithm, Association, DataArray, Dataset, ImageData, Table};
use geokit_grids::{
    Corner, CreateTensorMesh, CreateUniformGrid, ReverseImageDataAxes, TableToTimeGrid,
    TimeGridOptions, TranslateGridOrigin,
};
use geokit_readers::WriteOut;
use geokit_ubc::{TensorMeshReader, UbcTensorWriter};
use rstest::{fixture, rstest};

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("geokit_grids_tests").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn values(dataset: &Dataset, association: Association, name: &str) -> Vec<f64> {
    dataset
        .get_array(association, name)
        .unwrap()
        .values()
        .unwrap()
}

#[fixture]
fn uniform() -> Dataset {
    let mut source = CreateUniformGrid::new();
    source.set_extent([5, 4, 3]);
    source.set_origin([10.0, 20.0, -5.0]);
    source.set_spacing([2.0, 1.0, 0.5]);
    source.apply(&[]).unwrap()
}

#[rstest]
fn tensor_mesh_round_trip() {
    let mut source = CreateTensorMesh::builder().seed(11).build().unwrap();
    let mesh = source.apply(&[]).unwrap();

    let dir = temp_dir("tensor");
    let path = dir.join("mesh.msh");
    UbcTensorWriter::default().write(&mesh, &path).unwrap();

    let mut reader = TensorMeshReader::new();
    reader.set_mesh_file_name(&path);
    reader.add_model_file_name(dir.join("Random_Data.mod"));
    reader.set_data_name("Random Data");

    let info = reader.update_information(&[]).unwrap();
    assert_eq!(info.whole_extent, Some([0, 26, 0, 27, 0, 23]));

    let read_back = reader.apply(&[]).unwrap();
    assert_eq!(
        read_back.bounds(),
        Some([-350.0, 1350.0, -400.0, 1350.0, -850.0, 0.0])
    );

    let written = values(&mesh, Association::Cell, "Random Data");
    let read = values(&read_back, Association::Cell, "Random Data");
    assert_eq!(written.len(), 26 * 27 * 23);
    for (a, b) in written.iter().zip(&read) {
        assert!((a - b).abs() <= 1e-6 * b.abs() + 1e-12);
    }
}

#[rstest]
#[case([true, false, false])]
#[case([false, true, false])]
#[case([false, false, true])]
#[case([true, true, true])]
fn reverse_is_an_involution(uniform: Dataset, #[case] flip: [bool; 3]) {
    let mut filter = ReverseImageDataAxes::with_axes(flip);
    let once = filter.apply(&[&uniform]).unwrap();
    let twice = filter.apply(&[&once]).unwrap();

    assert_ne!(once, uniform);
    assert_eq!(twice, uniform);
}

#[rstest]
fn reverse_along_x_mirrors_rows(uniform: Dataset) {
    let mut filter = ReverseImageDataAxes::with_axes([true, false, false]);
    let output = filter.apply(&[&uniform]).unwrap();

    let before = values(&uniform, Association::Point, "Spatial Point Data");
    let after = values(&output, Association::Point, "Spatial Point Data");
    for row in 0..12 {
        let mut expected = before[row * 5..row * 5 + 5].to_vec();
        expected.reverse();
        assert_eq!(after[row * 5..row * 5 + 5], expected[..]);
    }
}

#[rstest]
fn translate_to_every_corner(uniform: Dataset) {
    let image = uniform.as_image().unwrap();
    let far = [10.0 + 8.0, 20.0 + 3.0, -5.0 + 1.0];

    for corner in Corner::ALL {
        let mut filter = TranslateGridOrigin::new(corner);
        let output = filter.apply(&[&uniform]).unwrap();
        let moved = output.as_image().unwrap();

        let sides = corner.far_sides();
        for axis in 0..3 {
            let expected = match sides[axis] {
                true => 2.0 * image.origin[axis] - far[axis],
                false => image.origin[axis],
            };
            assert_eq!(moved.origin[axis], expected, "{corner:?}");
        }
        assert_eq!(moved.attributes, image.attributes);
    }
}

#[rstest]
#[case([0, 1, 2, 3])]
#[case([3, 2, 1, 0])]
#[case([1, 3, 0, 2])]
fn table_rows_land_on_the_grid(#[case] dims: [usize; 4]) {
    let extent = [2, 3, 4, 5];
    let n = extent.iter().product::<usize>();
    let mut table = Table::default();
    table.add_column(DataArray::new("v", (0..n).map(|i| i as f64).collect::<Vec<f64>>()));
    let table = Dataset::from(table);

    let mut filter = TableToTimeGrid::with_options(TimeGridOptions {
        extent,
        dims,
        time_delta: 2.0,
        ..Default::default()
    });
    let info = filter.update_information(&[&table]).unwrap();
    let nt = extent[dims[3]];
    assert_eq!(info.timesteps.len(), nt);

    let [nx, ny, nz] = [0, 1, 2].map(|a| extent[dims[a]]);
    for t in 0..nt {
        let output = filter.apply_at(&[&table], Some(2.0 * t as f64)).unwrap();
        assert_eq!(output.as_image().unwrap().dimensions, [nx, ny, nz]);
        let v = values(&output, Association::Point, "v");

        for (index, value) in v.iter().enumerate() {
            let (x, y, z) = (index % nx, (index / nx) % ny, index / (nx * ny));
            let mut packed = [0; 4];
            for (axis, position) in [x, y, z, t].into_iter().enumerate() {
                packed[dims[axis]] = position;
            }
            let expected = ((packed[0] * extent[1] + packed[1]) * extent[2] + packed[2])
                * extent[3]
                + packed[3];
            assert_eq!(*value, expected as f64);
        }
    }
}

#[rstest]
fn translated_bounds() {
    let image = ImageData::new([3, 3, 3], [0.0; 3], [1.0; 3]);
    let mut filter = TranslateGridOrigin::new(Corner::NorthEastTop);
    let output = filter.apply(&[&image.into()]).unwrap();
    assert_eq!(output.bounds(), Some([-2.0, 0.0, -2.0, 0.0, -2.0, 0.0]));
}
