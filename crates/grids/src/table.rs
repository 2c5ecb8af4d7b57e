//! Reshape the columns of a table into a time varying image grid

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Association, DataArray, Dataset, DatasetKind, Error, ImageData,
    Information, OutputKind, PortKind, Result, Timeline,
};
use geokit_utils::f;

// external crates
use log::{debug, trace};
use ndarray::{Array4, Axis, ShapeBuilder};
use serde::{Deserialize, Serialize};

/// Memory order of the rows of a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    /// Last axis varies fastest
    #[default]
    C,
    /// First axis varies fastest
    F,
}

/// Parameters of [TableToTimeGrid]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeGridOptions {
    /// Sizes of the four axes of the packed rows
    pub extent: [usize; 4],
    /// Packed axis holding x, y, z and time
    pub dims: [usize; 4],
    /// Packing order of the rows
    pub order: Order,
    /// Grid spacing
    pub spacing: [f64; 3],
    /// Grid origin
    pub origin: [f64; 3],
    /// Place values on the nodes rather than on the cells
    pub points: bool,
    /// Time between consecutive slices along the time axis
    pub time_delta: f64,
}

impl Default for TimeGridOptions {
    fn default() -> Self {
        Self {
            extent: [10, 10, 10, 1],
            dims: [0, 1, 2, 3],
            order: Order::C,
            spacing: [1.0; 3],
            origin: [0.0; 3],
            points: true,
            time_delta: 1.0,
        }
    }
}

impl TimeGridOptions {
    /// Load options from a json string, missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise the options to pretty json
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fail unless `dims` is a permutation of `0..4`
    pub fn check_dims(&self) -> Result<()> {
        let mut sorted = self.dims;
        sorted.sort_unstable();
        match sorted == [0, 1, 2, 3] {
            true => Ok(()),
            false => Err(Error::InvalidArgument(f!(
                "Dimension indices {:?} are not a permutation of 0, 1, 2, 3",
                self.dims
            ))),
        }
    }

    /// Number of samples along x, y, z and time
    pub fn shape(&self) -> [usize; 4] {
        self.dims.map(|d| self.extent[d])
    }

    /// Whole extent of the output grid
    pub fn whole_extent(&self) -> [usize; 6] {
        let [nx, ny, nz, _] = self.shape();
        let n = |c: usize| match self.points {
            true => c.saturating_sub(1),
            false => c,
        };
        [0, n(nx), 0, n(ny), 0, n(nz)]
    }
}

/// Reshape a packed column into `(x, y, z, t)` order
///
/// ```rust
/// # use geokit_grids::{packed_to_xyzt, Order};
/// // rows packed as (t, x) with x fastest
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let array = packed_to_xyzt(&values, [2, 3, 1, 1], [1, 2, 3, 0], Order::C).unwrap();
///
/// assert_eq!(array.shape(), &[3, 1, 1, 2]);
/// assert_eq!(array[[2, 0, 0, 1]], 6.0);
/// ```
pub fn packed_to_xyzt(
    values: &[f64],
    extent: [usize; 4],
    dims: [usize; 4],
    order: Order,
) -> Result<Array4<f64>> {
    let [a, b, c, d] = extent;
    let packed = match order {
        Order::C => Array4::from_shape_vec((a, b, c, d), values.to_vec())?,
        Order::F => Array4::from_shape_vec((a, b, c, d).f(), values.to_vec())?,
    };
    Ok(packed.permuted_axes(dims))
}

/// Lay the rows of a table onto a 4D grid, the last axis being time
///
/// Each column becomes an array of the output image. Rows are unpacked with
/// the chosen extent and order, then the axes are moved so that the packed
/// axes named in `dims` become x, y, z and time. Every slice along the time
/// axis is a timestep of the output.
///
/// ```rust
/// # use geokit_core::{Algorithm, Association, DataArray, Table};
/// # use geokit_grids::{TableToTimeGrid, TimeGridOptions};
/// let mut table = Table::default();
/// table.add_column(DataArray::new("v", (0..24).map(f64::from).collect::<Vec<f64>>()));
///
/// let mut filter = TableToTimeGrid::with_options(TimeGridOptions {
///     extent: [2, 3, 2, 2],
///     ..Default::default()
/// });
/// let output = filter.apply_at(&[&table.into()], Some(1.0)).unwrap();
///
/// assert_eq!(filter.timesteps(), &[0.0, 1.0]);
/// assert_eq!(output.as_image().unwrap().dimensions, [2, 3, 2]);
/// let v = output.get_array(Association::Point, "v").unwrap();
/// assert_eq!(v.values().unwrap()[..3], [1.0, 13.0, 5.0]);
/// ```
#[derive(Debug, Default)]
pub struct TableToTimeGrid {
    state: AlgorithmState,
    options: TimeGridOptions,
    data: Vec<(String, Array4<f64>)>,
    need_to_run: bool,
}

impl TableToTimeGrid {
    /// Default options, a single 10 x 10 x 10 grid
    pub fn new() -> Self {
        Self::with_options(TimeGridOptions::default())
    }

    /// Start from a full set of options
    pub fn with_options(options: TimeGridOptions) -> Self {
        Self {
            options,
            need_to_run: true,
            ..Default::default()
        }
    }

    /// Current options
    pub fn options(&self) -> &TimeGridOptions {
        &self.options
    }

    /// Replace every option at once
    pub fn set_options(&mut self, options: TimeGridOptions) {
        if self.options != options {
            self.options = options;
            self.modified(true);
        }
    }

    /// Sizes of the four packed axes
    pub fn set_extent(&mut self, extent: [usize; 4]) {
        if self.options.extent != extent {
            self.options.extent = extent;
            self.modified(true);
        }
    }

    /// Packed axis holding x, y, z and time
    pub fn set_dimensions(&mut self, dims: [usize; 4]) {
        if self.options.dims != dims {
            self.options.dims = dims;
            self.modified(true);
        }
    }

    /// Packing order of the rows
    pub fn set_order(&mut self, order: Order) {
        if self.options.order != order {
            self.options.order = order;
            self.modified(true);
        }
    }

    /// Grid spacing
    pub fn set_spacing(&mut self, spacing: [f64; 3]) {
        if self.options.spacing != spacing {
            self.options.spacing = spacing;
            self.modified(false);
        }
    }

    /// Grid origin
    pub fn set_origin(&mut self, origin: [f64; 3]) {
        if self.options.origin != origin {
            self.options.origin = origin;
            self.modified(false);
        }
    }

    /// Place values on the nodes rather than on the cells
    pub fn set_use_points(&mut self, flag: bool) {
        if self.options.points != flag {
            self.options.points = flag;
            self.modified(false);
        }
    }

    /// Time between consecutive slices
    pub fn set_time_delta(&mut self, dt: f64) {
        if self.options.time_delta != dt {
            self.options.time_delta = dt;
            self.modified(false);
        }
    }

    fn timeline(&self) -> Timeline {
        Timeline::new(self.options.shape()[3], self.options.time_delta)
    }

    fn unpack(&mut self, table: &geokit_core::Table) -> Result<()> {
        let TimeGridOptions {
            extent,
            dims,
            order,
            ..
        } = self.options;

        let rows = table.number_of_rows();
        let expected = extent.iter().product::<usize>();
        if rows != expected {
            return Err(Error::size_mismatch(
                f!("Total number of elements must remain {rows}. Check reshape dimensions."),
                expected,
                rows,
            ));
        }

        self.data = table
            .columns()
            .iter()
            .map(|column| {
                trace!("Unpacking column `{}`", column.name);
                let array = packed_to_xyzt(&column.values()?, extent, dims, order)?;
                Ok((column.name.clone(), array))
            })
            .collect::<Result<Vec<_>>>()?;
        self.need_to_run = false;
        Ok(())
    }

    fn build_image(&self, step: usize) -> ImageData {
        let [nx, ny, nz, _] = self.options.shape();
        let (dimensions, association) = match self.options.points {
            true => ([nx, ny, nz], Association::Point),
            false => ([nx + 1, ny + 1, nz + 1], Association::Cell),
        };

        let mut image = ImageData::new(dimensions, self.options.origin, self.options.spacing);
        for (name, array) in &self.data {
            // x fastest
            let slice = array.index_axis(Axis(3), step);
            let values = slice.t().iter().copied().collect::<Vec<f64>>();
            image.attributes.add(association, DataArray::new(name.clone(), values));
        }
        image
    }
}

impl Algorithm for TableToTimeGrid {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Kind(DatasetKind::Table)]
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::ImageData)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    /// Reshaping only happens again when the unpacking changes
    fn modified(&mut self, run_again: bool) {
        if run_again {
            self.need_to_run = true;
        }
        self.state.touch();
    }

    fn request_information(&mut self, _: &[&Dataset]) -> Result<Information> {
        self.options.check_dims()?;
        Ok(Information {
            whole_extent: Some(self.options.whole_extent()),
            timesteps: self.timeline().timesteps(),
        })
    }

    fn request_data(&mut self, inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        if self.need_to_run || self.data.is_empty() {
            debug!("Reshaping table onto a {:?} grid", self.options.shape());
            self.unpack(inputs[0].as_table()?)?;
        }
        let step = self.timeline().index_for(time);
        Ok(self.build_image(step).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geokit_core::Table;

    fn table(n: usize) -> Dataset {
        let mut table = Table::default();
        table.add_column(DataArray::new("a", (0..n).map(|i| i as f64).collect::<Vec<f64>>()));
        table.into()
    }

    #[test]
    fn fortran_order_keeps_x_fastest() {
        let mut filter = TableToTimeGrid::with_options(TimeGridOptions {
            extent: [3, 2, 2, 1],
            order: Order::F,
            ..Default::default()
        });
        let output = filter.apply(&[&table(12)]).unwrap();
        let a = output.get_array(Association::Point, "a").unwrap();
        assert_eq!(a.values().unwrap(), (0..12).map(|i| i as f64).collect::<Vec<f64>>());
    }

    #[test]
    fn time_axis_can_come_first() {
        let mut filter = TableToTimeGrid::with_options(TimeGridOptions {
            extent: [3, 2, 1, 1],
            dims: [1, 2, 3, 0],
            ..Default::default()
        });
        let info = filter.update_information(&[&table(6)]).unwrap();
        assert_eq!(info.timesteps, vec![0.0, 1.0, 2.0]);
        assert_eq!(info.whole_extent, Some([0, 1, 0, 0, 0, 0]));

        let output = filter.apply_at(&[&table(6)], Some(2.0)).unwrap();
        let a = output.get_array(Association::Point, "a").unwrap();
        assert_eq!(a.values().unwrap(), vec![4.0, 5.0]);
    }

    #[test]
    fn cells_grow_the_grid() {
        let mut filter = TableToTimeGrid::with_options(TimeGridOptions {
            extent: [2, 2, 2, 1],
            points: false,
            ..Default::default()
        });
        let output = filter.apply(&[&table(8)]).unwrap();
        assert_eq!(output.as_image().unwrap().dimensions, [3, 3, 3]);
        assert_eq!(output.attributes().cell.len(), 1);
    }

    #[test]
    fn row_count_must_match() {
        let mut filter = TableToTimeGrid::new();
        assert!(matches!(
            filter.apply(&[&table(999)]),
            Err(Error::SizeMismatch { expected: 1000, found: 999, .. })
        ));
    }

    #[test]
    fn dims_must_be_a_permutation() {
        let mut filter = TableToTimeGrid::with_options(TimeGridOptions {
            dims: [0, 0, 2, 3],
            ..Default::default()
        });
        assert!(filter.apply(&[&table(1000)]).is_err());
    }
}
