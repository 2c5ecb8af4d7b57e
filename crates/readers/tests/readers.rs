//! Integration tests for the file readers

use geokit_core::{Algorithm, Association, DataType, Dataset, Endian, Error};
use geokit_readers::{
    DelimitedPointsReader, DelimitedTextReader, EsriGridReader, PackedBinariesReader,
    SgemsGridReader, SurferGridReader,
};
use rstest::rstest;

fn temp_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("geokit_readers_tests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn point_values(dataset: &Dataset, name: &str) -> Vec<f64> {
    dataset
        .get_array(Association::Point, name)
        .unwrap()
        .values()
        .unwrap()
}

fn cell_values(dataset: &Dataset, name: &str) -> Vec<f64> {
    dataset
        .get_array(Association::Cell, name)
        .unwrap()
        .values()
        .unwrap()
}

#[test]
fn esri_grid() {
    let mut reader = EsriGridReader::new();
    reader.add_file_name("./data/esri.asc");

    let info = reader.update_information(&[]).unwrap();
    assert_eq!(info.whole_extent, Some([0, 3, 0, 5, 0, 0]));

    let output = reader.apply(&[]).unwrap();
    let image = output.as_image().unwrap();
    assert_eq!(image.dimensions, [4, 6, 1]);
    assert_eq!(image.spacing, [50.0, 50.0, 50.0]);
    assert_eq!(image.origin, [100.0, 50.0, 0.0]);

    let data = point_values(&output, "Data");
    assert_eq!(data.len(), 24);
    // southern row first
    assert_eq!(&data[0..4], &[5.0, 7.0, 3.0, 2.0]);
    // the two sentinels sit on the northern row
    assert!(data[20].is_nan());
    assert!(data[21].is_nan());
    assert_eq!(data.iter().filter(|v| v.is_nan()).count(), 2);
}

#[test]
fn esri_renamed_array() {
    let mut reader = EsriGridReader::new();
    reader.add_file_name("./data/esri.asc");
    reader.set_data_name("Elevation");
    let output = reader.apply(&[]).unwrap();
    assert!(output.get_array(Association::Point, "Elevation").is_some());
}

#[test]
fn surfer_grid() {
    let mut reader = SurferGridReader::new();
    reader.add_file_name("./data/surfer.grd");

    let info = reader.update_information(&[]).unwrap();
    assert_eq!(info.whole_extent, Some([0, 1, 0, 2, 0, 0]));

    let output = reader.apply(&[]).unwrap();
    let image = output.as_image().unwrap();
    assert_eq!(image.dimensions, [2, 3, 1]);
    assert_eq!(image.origin, [0.0, 10.0, 0.0]);
    assert_eq!(image.spacing, [10.0, 10.0, 100.0]);
    assert_eq!(
        point_values(&output, "Data"),
        vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]
    );
}

#[test]
fn surfer_blanked_nodes() {
    let mut reader = SurferGridReader::new();
    reader.add_file_name("./data/surfer_blanked.grd");
    let output = reader.apply(&[]).unwrap();
    let data = point_values(&output, "Data");
    assert!(data[2].is_nan());
    assert_eq!(data.iter().filter(|v| v.is_nan()).count(), 1);
}

#[test]
fn surfer_range_is_checked() {
    let mut reader = SurferGridReader::new();
    reader.add_file_name("./data/surfer_bad_range.grd");
    let err = reader.apply(&[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Min of data (1) doesn't match that set by file (0)."
    );
}

#[test]
fn delimited_time_series() {
    let mut reader = DelimitedTextReader::builder()
        .delimiter(",")
        .file_name("./data/points.csv")
        .file_name("./data/points_step1.csv")
        .time_delta(5.0)
        .build();

    let info = reader.update_information(&[]).unwrap();
    assert_eq!(info.timesteps, vec![0.0, 5.0]);

    let first = reader.apply_at(&[], Some(0.0)).unwrap();
    let second = reader.apply_at(&[], Some(4.0)).unwrap();
    let rho = |d: &Dataset| d.as_table().unwrap().column("rho").unwrap().values().unwrap();
    assert_eq!(rho(&first), vec![2.5, 2.6, 2.7]);
    assert_eq!(rho(&second), vec![2.4, 2.5, 2.6]);
    assert_eq!(reader.titles(), &["X", "Y", "Z", "rho", "name"]);
}

#[test]
fn delimited_titles_must_agree() {
    let mut reader = DelimitedTextReader::builder()
        .delimiter(",")
        .file_name("./data/points.csv")
        .file_name("./data/points_renamed.csv")
        .build();

    let err = reader.apply(&[]).unwrap_err();
    assert!(matches!(err, Error::ParseError(_)));
    assert!(err.to_string().starts_with("Data array titles varied"));
}

#[test]
fn errors_are_captured_by_update() {
    let mut reader = DelimitedTextReader::new();
    reader.add_file_name("./data/does_not_exist.csv");
    let output = reader.update(&[], None);
    assert!(output.is_empty());
    assert!(reader.error_occurred());
    assert!(reader
        .error_message()
        .unwrap()
        .starts_with("@@@@PVGeoError ---> "));
}

#[rstest]
#[case(DelimitedPointsReader::xyz(), "./data/samples.xyz", 2)]
#[case(DelimitedPointsReader::gslib(), "./data/samples.gslib", 3)]
fn point_sets(#[case] mut reader: DelimitedPointsReader, #[case] path: &str, #[case] n: usize) {
    reader.add_file_name(path);
    reader.set_copy_z(true);

    let output = reader.apply(&[]).unwrap();
    let poly = output.as_poly().unwrap();
    assert_eq!(poly.points.len(), n);
    assert_eq!(poly.points[0], [100.0, 200.0, -5.0]);
    assert_eq!(point_values(&output, "grade")[1], 0.41);
    assert_eq!(point_values(&output, "Elevation")[1], -7.5);
}

#[test]
fn points_need_three_columns() {
    let path = temp_file("two_columns.csv", b"X,Y\n1,2\n");
    let text = DelimitedTextReader::builder()
        .delimiter(",")
        .file_name(path)
        .build();
    let mut reader = DelimitedPointsReader::new(text);
    assert!(reader.apply(&[]).is_err());
}

#[test]
fn sgems_grid() {
    let mut reader = SgemsGridReader::new();
    reader.add_file_name("./data/model.sgems");
    reader.set_origin([10.0, 20.0, 0.0]);
    reader.set_spacing([5.0, 5.0, 2.0]);

    let info = reader.update_information(&[]).unwrap();
    assert_eq!(info.whole_extent, Some([0, 2, 0, 2, 0, 1]));

    let output = reader.apply(&[]).unwrap();
    let image = output.as_image().unwrap();
    assert_eq!(image.dimensions, [3, 3, 2]);
    assert_eq!(image.origin, [10.0, 20.0, 0.0]);
    assert_eq!(image.spacing, [5.0, 5.0, 2.0]);

    let rho = cell_values(&output, "rho");
    assert_eq!(rho[0], 2.5);
    assert!(rho[2].is_nan());
    let flag = cell_values(&output, "flag");
    assert!(flag[1].is_nan());
    assert_eq!(flag[3], 0.0);
}

#[test]
fn sgems_plain_dimensions() {
    let mut reader = SgemsGridReader::new();
    reader.add_file_name("./data/model_plain.sgems");
    let output = reader.apply(&[]).unwrap();
    assert_eq!(output.number_of_cells(), 4);
    assert_eq!(cell_values(&output, "rho"), vec![2.5, 2.6, 2.7, 2.8]);
}

#[test]
fn sgems_dimensions_must_agree() {
    let mut reader = SgemsGridReader::new();
    reader.add_file_name("./data/model.sgems");
    reader.add_file_name("./data/model_resized.sgems");
    let err = reader.apply(&[]).unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { .. }));
}

#[test]
fn packed_binary() {
    let bytes = [3.5f32, -1.0, 0.25].map(f32::to_be_bytes).concat();
    let path = temp_file("values_be.bin", &bytes);

    let mut reader = PackedBinariesReader::new();
    reader.add_file_name(&path);
    reader.set_endian(Endian::Big);
    reader.set_data_name("Amplitude");

    let output = reader.apply(&[]).unwrap();
    let table = output.as_table().unwrap();
    assert_eq!(table.columns().len(), 1);
    assert_eq!(
        table.column("Amplitude").unwrap().values().unwrap(),
        vec![3.5, -1.0, 0.25]
    );
}

#[test]
fn packed_binary_partial_value() {
    let path = temp_file("values_short.bin", &[0u8; 7]);
    let mut reader = PackedBinariesReader::new();
    reader.add_file_name(&path);
    reader.set_data_type(DataType::Int);
    assert!(matches!(
        reader.apply(&[]).unwrap_err(),
        Error::SizeMismatch { .. }
    ));
}

#[rstest]
#[case(true)]
#[case(false)]
fn madagascar(#[case] with_header: bool) {
    let values = [1i32, 2, 3].map(i32::to_le_bytes).concat();
    let stream = match with_header {
        true => [b"n1=3 data_format=\"native_int\"\n\x0c\x0c\x04".as_slice(), &values].concat(),
        false => values,
    };
    let path = temp_file(&format!("stream_{with_header}.rsf"), &stream);

    let mut reader = PackedBinariesReader::madagascar();
    reader.add_file_name(&path);
    reader.set_data_type(DataType::Int);
    reader.set_endian(Endian::Little);

    let output = reader.apply(&[]).unwrap();
    let column = output.as_table().unwrap().column("Data").unwrap();
    assert_eq!(column.values().unwrap(), vec![1.0, 2.0, 3.0]);
}
