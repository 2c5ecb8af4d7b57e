//! UBC-GIF observation and topography point files
//!
//! All of these are whitespace delimited without column titles. A short
//! header gives the number of stations and, depending on the format, the
//! survey parameters.

// standard library
use std::path::{Path, PathBuf};

// crate modules
use crate::parsers::{content_lines, counts, floats, n_floats};

// geokit modules
use geokit_core::{
    base_name, Algorithm, AlgorithmState, Association, DataArray, Dataset, DatasetKind, Error,
    Information, OutputKind, PolyData, ReaderBase, Result, Table,
};
use geokit_readers::table_to_points;
use geokit_utils::f;

// external crates
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// The flavours of UBC point file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationKind {
    /// `X Y Z` topography
    Topo,
    /// `X Y Z Grav Err` gravity observations
    Gravity,
    /// Gravity gradiometry with the components named in the header
    GravityGradient,
    /// Magnetic observations with inducing field parameters
    Magnetic,
}

/// Unit vector, scaled by `magnitude`, for an inclination and declination
///
/// ```rust
/// # use geokit_ubc::direction_vector;
/// let [x, y, z] = direction_vector(90.0, 0.0, 2.0);
/// assert!(x.abs() < 1e-12 && y.abs() < 1e-12);
/// assert!((z - 2.0).abs() < 1e-12);
/// ```
pub fn direction_vector(inclination: f64, declination: f64, magnitude: f64) -> [f64; 3] {
    let (incl, decl) = (inclination.to_radians(), declination.to_radians());
    [
        magnitude * incl.cos() * decl.cos(),
        magnitude * incl.cos() * decl.sin(),
        magnitude * incl.sin(),
    ]
}

/// Survey parameters from the two header lines of a magnetic file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagneticSurvey {
    /// Inclination of the inducing field
    pub inclination: f64,
    /// Declination of the inducing field
    pub declination: f64,
    /// Strength of the inducing field
    pub geomagnetic: f64,
    /// Inclination of the anomaly projection
    pub anomaly_inclination: f64,
    /// Declination of the anomaly projection
    pub anomaly_declination: f64,
    /// Direction parameter
    pub direction: f64,
}

/// One parsed observation file
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Observations {
    pub(crate) titles: Vec<String>,
    pub(crate) rows: Vec<Vec<f64>>,
    pub(crate) copy_z: bool,
    pub(crate) survey: Option<MagneticSurvey>,
}

impl Observations {
    fn table(&self) -> Table {
        let mut table = Table::default();
        for (c, title) in self.titles.iter().enumerate() {
            let column = self.rows.iter().map(|row| row[c]).collect::<Vec<f64>>();
            table.add_column(DataArray::new(title.as_str(), column));
        }
        table
    }
}

fn improperly_formatted() -> Error {
    Error::ParseError("Data improperly formatted".into())
}

fn station_count(line: Option<&String>) -> Result<usize> {
    let line = line.ok_or_else(improperly_formatted)?;
    counts(line)?.first().copied().ok_or_else(improperly_formatted)
}

/// Parse rows that must all have `width` columns
fn station_rows(lines: &[String], width: usize, expected: usize) -> Result<Vec<Vec<f64>>> {
    let rows = lines
        .iter()
        .map(|l| floats(l))
        .collect::<Result<Vec<Vec<f64>>>>()?;
    if rows.iter().any(|r| r.len() != width) {
        return Err(improperly_formatted());
    }
    if rows.len() != expected {
        warn!(
            "Header gives {expected} stations but {} were found",
            rows.len()
        );
    }
    Ok(rows)
}

fn titles(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl ObservationKind {
    /// Parse the content lines of a file of this kind
    pub(crate) fn parse(&self, lines: &[String]) -> Result<Observations> {
        match self {
            Self::Topo => {
                let n = station_count(lines.first())?;
                let rows = station_rows(&lines[1..], 3, n)?;
                Ok(Observations {
                    titles: titles(&["X", "Y", "Z"]),
                    rows,
                    copy_z: true,
                    survey: None,
                })
            }
            Self::Gravity => {
                let n = station_count(lines.first())?;
                let rows = station_rows(&lines[1..], 5, n)?;
                Ok(Observations {
                    titles: titles(&["X", "Y", "Z", "Grav", "Err"]),
                    rows,
                    copy_z: false,
                    survey: None,
                })
            }
            Self::GravityGradient => Self::parse_gradient(lines),
            Self::Magnetic => Self::parse_magnetic(lines),
        }
    }

    fn parse_gradient(lines: &[String]) -> Result<Observations> {
        // e.g. `datacomp=6, G_xx,G_xy,G_xz,G_yy,G_yz,G_zz`
        let header = lines.first().ok_or_else(improperly_formatted)?;
        let (_, fields) = header.split_once('=').ok_or_else(improperly_formatted)?;
        let (count, components) = fields.split_once(',').ok_or_else(improperly_formatted)?;
        let count = count.trim();
        let count = count
            .parse::<usize>()
            .map_err(|_| Error::ParseError(f!("Bad gradient component count \"{count}\"")))?;
        let components = components
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect::<Vec<String>>();
        if components.len() != count {
            return Err(Error::size_mismatch(
                "Gradient header component count",
                count,
                components.len(),
            ));
        }

        let n = station_count(lines.get(1))?;
        let body = lines.get(2..).unwrap_or_default();
        let width = body.first().map(|l| floats(l)).transpose()?.map_or(0, |r| r.len());

        let mut titles = titles(&["X", "Y", "Z"]);
        titles.extend(components.iter().cloned());
        if width != titles.len() {
            if width != titles.len() + components.len() {
                return Err(improperly_formatted());
            }
            titles.extend(components.iter().map(|c| f!("Stn_{c}")));
        }

        Ok(Observations {
            rows: station_rows(body, titles.len(), n)?,
            titles,
            copy_z: false,
            survey: None,
        })
    }

    fn parse_magnetic(lines: &[String]) -> Result<Observations> {
        let [inclination, declination, geomagnetic] =
            n_floats::<3>(lines.first().ok_or_else(improperly_formatted)?, "inducing field")?;
        let [anomaly_inclination, anomaly_declination, direction] =
            n_floats::<3>(lines.get(1).ok_or_else(improperly_formatted)?, "anomaly projection")?;
        let survey = MagneticSurvey {
            inclination,
            declination,
            geomagnetic,
            anomaly_inclination,
            anomaly_declination,
            direction,
        };

        let n = station_count(lines.get(2))?;
        let body = lines.get(3..).unwrap_or_default();
        let width = body.first().map(|l| floats(l)).transpose()?.map_or(0, |r| r.len());

        let (names, copy_z): (&[&str], bool) = match width {
            3 => (&["X", "Y", "Z"], true),
            4 => (&["X", "Y", "Z", "Mag"], false),
            5 => (&["X", "Y", "Z", "Mag", "Err"], false),
            7 => (&["X", "Y", "Z", "ainc_1", "ainc_2", "Mag", "Err"], false),
            _ => return Err(Error::ParseError("Data improperly formatted.".into())),
        };

        Ok(Observations {
            titles: titles(names),
            rows: station_rows(body, width, n)?,
            copy_z,
            survey: Some(survey),
        })
    }
}

/// Read UBC topography and observation files into point clouds
///
/// Each file is one timestep. The first three columns are the station
/// locations and the rest become point data. Magnetic files also carry the
/// `Inducing Magnetic Field` and `Anomaly Projection` vectors as field data.
///
/// ```rust, no_run
/// # use geokit_core::Algorithm;
/// # use geokit_ubc::ObservationReader;
/// let mut reader = ObservationReader::gravity();
/// reader.add_file_name("survey.grv");
/// let stations = reader.apply(&[]).unwrap();
/// ```
#[derive(Debug)]
pub struct ObservationReader {
    state: AlgorithmState,
    base: ReaderBase,
    kind: ObservationKind,
    copy_z: Option<bool>,
    data: Vec<Observations>,
}

impl ObservationReader {
    /// Reader for a kind of observation file
    pub fn new(kind: ObservationKind) -> Self {
        Self {
            state: AlgorithmState::default(),
            base: ReaderBase::default(),
            kind,
            copy_z: None,
            data: Vec::new(),
        }
    }

    /// Topography, `Elevation` is kept as point data by default
    pub fn topo() -> Self {
        Self::new(ObservationKind::Topo)
    }

    /// Gravity observations
    pub fn gravity() -> Self {
        Self::new(ObservationKind::Gravity)
    }

    /// Gravity gradiometry observations
    pub fn gravity_gradient() -> Self {
        Self::new(ObservationKind::GravityGradient)
    }

    /// Magnetic observations
    pub fn magnetic() -> Self {
        Self::new(ObservationKind::Magnetic)
    }

    /// Kind of file read
    pub fn kind(&self) -> ObservationKind {
        self.kind
    }

    /// Add an input file, one per timestep
    pub fn add_file_name(&mut self, path: impl AsRef<Path>) {
        if self.base.add_file_name(path) {
            self.state.touch();
        }
    }

    /// Input files in timestep order
    pub fn file_names(&self) -> &[PathBuf] {
        self.base.file_names()
    }

    /// Set the time between files
    pub fn set_time_delta(&mut self, dt: f64) {
        if self.base.set_time_delta(dt) {
            self.modified(false);
        }
    }

    /// Keep the Z coordinate as an `Elevation` point array
    ///
    /// Overrides the default of the file kind.
    pub fn set_copy_z(&mut self, flag: bool) {
        if self.copy_z != Some(flag) {
            self.copy_z = Some(flag);
            self.modified(false);
        }
    }

    /// Magnetic survey parameters of the first file, once read
    pub fn magnetic_survey(&self) -> Option<MagneticSurvey> {
        self.data.first().and_then(|d| d.survey)
    }

    /// Read every file up front
    pub fn read_up_front(&mut self) -> Result<()> {
        if self.base.file_names().is_empty() {
            return Err(Error::InvalidArgument("No file name has been set.".into()));
        }
        let kind = self.kind;
        self.data = self
            .base
            .file_names()
            .iter()
            .map(|path| {
                debug!("Reading {:?} observations {}", kind, path.display());
                kind.parse(&content_lines(path)?).map_err(|e| match e {
                    Error::ParseError(m) => Error::ParseError(f!("{m} in `{}`", base_name(path))),
                    other => other,
                })
            })
            .collect::<Result<Vec<Observations>>>()?;
        self.base.mark_read();
        Ok(())
    }

    fn points(&self, observations: &Observations) -> Result<PolyData> {
        let copy_z = self.copy_z.unwrap_or(observations.copy_z);
        let mut poly = table_to_points(&observations.table(), copy_z)?;

        if let Some(survey) = observations.survey {
            let inducing = direction_vector(
                survey.inclination,
                survey.declination,
                survey.geomagnetic,
            );
            let anomaly =
                direction_vector(survey.anomaly_inclination, survey.anomaly_declination, 1.0);
            poly.attributes.add(
                Association::Field,
                DataArray::with_components("Inducing Magnetic Field", 3, inducing.to_vec())?,
            );
            poly.attributes.add(
                Association::Field,
                DataArray::with_components("Anomaly Projection", 3, anomaly.to_vec())?,
            );
        }
        Ok(poly)
    }
}

impl Algorithm for ObservationReader {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::PolyData)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn modified(&mut self, read_again: bool) {
        self.base.modified(read_again);
        self.state.touch();
    }

    fn request_information(&mut self, _inputs: &[&Dataset]) -> Result<Information> {
        Ok(Information {
            whole_extent: None,
            timesteps: self.base.timesteps(),
        })
    }

    fn request_data(&mut self, _inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        if self.base.need_to_read() {
            self.read_up_front()?;
        }
        let index = self.base.index_for(time);
        let observations = self
            .data
            .get(index)
            .ok_or_else(|| Error::InvalidArgument(f!("No data for timestep index {index}.")))?;
        Ok(self.points(observations)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.trim().to_string()).collect()
    }

    #[test]
    fn topo_needs_three_columns() {
        let err = ObservationKind::Topo
            .parse(&lines("2\n0 0 1 5\n1 1 2 5"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Data improperly formatted");
    }

    #[test]
    fn gradient_with_station_errors() {
        let obs = ObservationKind::GravityGradient
            .parse(&lines("datacomp=2, G_xx,G_zz\n1\n0 0 1 0.1 0.2 0.01 0.02"))
            .unwrap();
        assert_eq!(
            obs.titles,
            vec!["X", "Y", "Z", "G_xx", "G_zz", "Stn_G_xx", "Stn_G_zz"]
        );
    }

    #[test]
    fn gradient_without_errors() {
        let obs = ObservationKind::GravityGradient
            .parse(&lines("datacomp=2, G_xx,G_zz\n1\n0 0 1 0.1 0.2"))
            .unwrap();
        assert_eq!(obs.titles.len(), 5);
        assert!(ObservationKind::GravityGradient
            .parse(&lines("datacomp=2, G_xx,G_zz\n1\n0 0 1 0.1"))
            .is_err());
    }

    #[test]
    fn gradient_count_is_not_a_component() {
        let obs = ObservationKind::GravityGradient
            .parse(&lines("datacomp=3, G_xx,G_yy,G_zz\n2\n0 0 5 1 2 -3\n10 0 5 1.5 2.5 -4"))
            .unwrap();
        assert_eq!(obs.titles, vec!["X", "Y", "Z", "G_xx", "G_yy", "G_zz"]);
        assert_eq!(obs.rows.len(), 2);

        let err = ObservationKind::GravityGradient
            .parse(&lines("datacomp=4, G_xx,G_yy,G_zz\n1\n0 0 5 1 2 -3"))
            .unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { expected: 4, found: 3, .. }));
    }

    #[test]
    fn magnetic_column_forms() {
        let header = "72.0 11.0 55000\n72.0 11.0 1\n1\n";
        let forms = [(3, 3, true), (4, 4, false), (5, 5, false), (7, 7, false)];
        for (width, n_titles, copy_z) in forms {
            let row = vec!["1.0"; width].join(" ");
            let obs = ObservationKind::Magnetic
                .parse(&lines(&f!("{header}{row}")))
                .unwrap();
            assert_eq!(obs.titles.len(), n_titles);
            assert_eq!(obs.copy_z, copy_z);
        }
        let row = vec!["1.0"; 6].join(" ");
        assert!(ObservationKind::Magnetic
            .parse(&lines(&f!("{header}{row}")))
            .is_err());
    }
}
