//! Integration tests for the file writers

use geokit_core::{
    Algorithm, Association, DataArray, Dataset, ImageData, MultiBlock, PolyData, Table,
};
use geokit_readers::{
    CellCentersWriter, DelimitedTextReader, GslibWriter, SgemsGridReader, SgemsWriter,
    SurferGridReader, SurferWriter, ValueFormat, WriteOut, Writer,
};
use rstest::{fixture, rstest};

use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("geokit_writers_tests");
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

#[fixture]
fn table() -> Table {
    let mut table = Table::default();
    table.add_column(DataArray::new("X", vec![0.0, 1.0, 2.0]));
    table.add_column(DataArray::new("rho", vec![2.5, 2.65, 2.7]));
    table
}

#[fixture]
fn image() -> ImageData {
    let mut image = ImageData::new([3, 2, 2], [100.0, 50.0, 0.0], [10.0, 10.0, 5.0]);
    image
        .attributes
        .add(Association::Cell, DataArray::new("rho", vec![1.5, 2.5]));
    image
}

#[rstest]
fn gslib_round_trip(table: Table) {
    let path = temp_path("table.gslib");
    GslibWriter::default().write(&table.clone().into(), &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines = text.lines().collect::<Vec<&str>>();
    assert_eq!(lines[0], "Data saved by geokit");
    assert_eq!(lines[1], "2");
    assert_eq!(lines[2..4], ["X", "rho"]);
    assert_eq!(lines[4], "0.000000000e+00 2.500000000e+00");

    let mut reader = DelimitedTextReader::gslib();
    reader.add_file_name(&path);
    let output = reader.apply(&[]).unwrap();
    let rho = output.as_table().unwrap().column("rho").unwrap();
    assert_eq!(rho.values().unwrap(), vec![2.5, 2.65, 2.7]);
}

#[rstest]
fn sgems_round_trip(image: ImageData) {
    let path = temp_path("model.sgems");
    SgemsWriter::default().write(&image.into(), &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().next(), Some("2 1 1"));

    let mut reader = SgemsGridReader::new();
    reader.add_file_name(&path);
    let output = reader.apply(&[]).unwrap();
    assert_eq!(output.as_image().unwrap().dimensions, [3, 2, 2]);
    let rho = output.get_array(Association::Cell, "rho").unwrap();
    assert_eq!(rho.values().unwrap(), vec![1.5, 2.5]);
}

#[test]
fn surfer_round_trip() {
    let mut reader = SurferGridReader::new();
    reader.add_file_name("./data/surfer.grd");
    let original = reader.apply(&[]).unwrap();

    let path = temp_path("copy.grd");
    SurferWriter::new("Data").write(&original, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines = text.lines().collect::<Vec<&str>>();
    assert_eq!(lines[0..5], ["DSAA", "3 2", "0.000000 20.000000", "10.000000 40.000000", "1.000000 6.000000"]);

    let mut reader = SurferGridReader::new();
    reader.add_file_name(&path);
    let copy = reader.apply(&[]).unwrap();
    assert_eq!(
        copy.get_array(Association::Point, "Data"),
        original.get_array(Association::Point, "Data")
    );
}

#[test]
fn surfer_needs_xy_plane() {
    let mut column = ImageData::new([1, 1, 4], [0.0; 3], [1.0; 3]);
    column
        .attributes
        .add(Association::Point, DataArray::new("Data", vec![1.0; 4]));
    let err = SurferWriter::default()
        .write(&column.into(), temp_path("column.grd"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Only 2D data on the XY plane is supported at this time."
    );
}

#[rstest]
fn cell_centers(image: ImageData) {
    let path = temp_path("centers.txt");
    let writer = CellCentersWriter {
        delimiter: " ".into(),
        format: ValueFormat::Fixed(1),
    };
    writer.write(&image.into(), &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines = text.lines().collect::<Vec<&str>>();
    assert_eq!(lines[0], "X Y Z rho");
    assert_eq!(lines[1], "105.0 55.0 2.5 1.5");
    assert_eq!(lines[2], "115.0 55.0 2.5 2.5");
}

#[rstest]
fn cell_centers_keep_string_columns(mut image: ImageData) {
    image.attributes.add(
        Association::Cell,
        DataArray::new("rock;type", vec!["granite".to_string(), "basalt".to_string()]),
    );
    let path = temp_path("centers_strings.txt");
    let writer = CellCentersWriter {
        delimiter: ";".into(),
        format: ValueFormat::Fixed(1),
    };
    writer.write(&image.into(), &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines = text.lines().collect::<Vec<&str>>();
    assert_eq!(lines[0], "X;Y;Z;rho;rock_type");
    assert_eq!(lines[1], "105.0;55.0;2.5;1.5;granite");
    assert_eq!(lines[2], "115.0;55.0;2.5;2.5;basalt");
    assert_eq!(lines.len(), 3);
}

#[rstest]
fn collections_write_one_file_per_block(table: Table) {
    let blocks = MultiBlock {
        blocks: vec![
            ("first".into(), table.clone().into()),
            ("points".into(), PolyData::from_points(vec![[0.0; 3]]).into()),
            ("second".into(), table.into()),
        ],
        ..Default::default()
    };

    let path = temp_path("blocks.gslib");
    GslibWriter::default().write(&blocks.into(), &path).unwrap();

    assert!(temp_path("blocks_0.gslib").exists());
    assert!(temp_path("blocks_2.gslib").exists());
    // point sets are skipped with a warning
    assert!(!temp_path("blocks_1.gslib").exists());
}

#[rstest]
fn writer_passes_input_through(table: Table) {
    let input: Dataset = table.into();
    let mut writer = Writer::new(GslibWriter::default(), temp_path("pass.gslib"));
    let output = writer.apply(&[&input]).unwrap();
    assert_eq!(output, input);
    assert!(writer.file_name().exists());
}
