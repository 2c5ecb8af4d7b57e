//! Flip the data of an image grid along any of its axes

// geokit modules
use geokit_core::{
    cell_dimensions, Algorithm, AlgorithmState, Association, Dataset, DatasetKind, ImageData,
    OutputKind, PortKind, Result,
};

// external crates
use log::debug;
use ndarray::{Array3, Axis};

/// Tuple order of a `(nx, ny, nz)` block after flipping the chosen axes
///
/// ```rust
/// # use geokit_grids::flipped_order;
/// // 3 x 2 x 1 block flipped along x
/// let order = flipped_order([3, 2, 1], [true, false, false]).unwrap();
/// assert_eq!(order, vec![2, 1, 0, 5, 4, 3]);
/// ```
pub fn flipped_order(shape: [usize; 3], flip: [bool; 3]) -> Result<Vec<usize>> {
    let [nx, ny, nz] = shape;
    let mut indices = Array3::from_shape_vec((nz, ny, nx), (0..nx * ny * nz).collect())?;

    // array axes run (z, y, x)
    for (axis, flag) in flip.iter().enumerate() {
        if *flag {
            indices.invert_axis(Axis(2 - axis));
        }
    }
    Ok(indices.iter().copied().collect())
}

/// Reverse the point and cell data of an image grid along chosen axes
///
/// Geometry is untouched, only the arrays are reordered, so flipping twice
/// along the same axes gives back the input.
///
/// ```rust
/// # use geokit_core::{Algorithm, Association, DataArray, ImageData};
/// # use geokit_grids::ReverseImageDataAxes;
/// let mut image = ImageData::new([2, 2, 1], [0.0; 3], [1.0; 3]);
/// image
///     .attributes
///     .add(Association::Point, DataArray::new("v", vec![1.0, 2.0, 3.0, 4.0]));
///
/// let mut filter = ReverseImageDataAxes::new();
/// filter.set_flip_z(false);
/// let output = filter.apply(&[&image.into()]).unwrap();
///
/// let v = output.get_array(Association::Point, "v").unwrap();
/// assert_eq!(v.values().unwrap(), vec![4.0, 3.0, 2.0, 1.0]);
/// ```
#[derive(Debug)]
pub struct ReverseImageDataAxes {
    state: AlgorithmState,
    flip: [bool; 3],
}

impl Default for ReverseImageDataAxes {
    fn default() -> Self {
        Self {
            state: AlgorithmState::default(),
            flip: [true; 3],
        }
    }
}

impl ReverseImageDataAxes {
    /// Flip along all three axes
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip along the chosen `[x, y, z]` axes
    pub fn with_axes(flip: [bool; 3]) -> Self {
        Self {
            flip,
            ..Default::default()
        }
    }

    /// Axes currently flipped, as `[x, y, z]`
    pub fn axes(&self) -> [bool; 3] {
        self.flip
    }

    fn set_flip(&mut self, axis: usize, flag: bool) {
        if self.flip[axis] != flag {
            self.flip[axis] = flag;
            self.modified(false);
        }
    }

    /// Flip along X
    pub fn set_flip_x(&mut self, flag: bool) {
        self.set_flip(0, flag);
    }

    /// Flip along Y
    pub fn set_flip_y(&mut self, flag: bool) {
        self.set_flip(1, flag);
    }

    /// Flip along Z
    pub fn set_flip_z(&mut self, flag: bool) {
        self.set_flip(2, flag);
    }

    /// Reorder every point and cell array of an image
    pub fn reverse(&self, image: &ImageData) -> Result<ImageData> {
        let mut output = ImageData::new(image.dimensions, image.origin, image.spacing);

        let points = flipped_order(image.dimensions, self.flip)?;
        let cells = flipped_order(cell_dimensions(image.dimensions), self.flip)?;

        for (association, order) in [(Association::Point, &points), (Association::Cell, &cells)] {
            for array in image.attributes.arrays(association) {
                debug!("Reversing {association:?} array `{}`", array.name);
                output.attributes.add(association, array.take_tuples(order));
            }
        }
        for array in image.attributes.arrays(Association::Field) {
            output.attributes.add(Association::Field, array.clone());
        }
        Ok(output)
    }
}

impl Algorithm for ReverseImageDataAxes {
    fn input_ports(&self) -> Vec<PortKind> {
        vec![PortKind::Kind(DatasetKind::ImageData)]
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

    fn request_data(&mut self, inputs: &[&Dataset], _: Option<f64>) -> Result<Dataset> {
        Ok(self.reverse(inputs[0].as_image()?)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geokit_core::DataArray;

    fn image() -> ImageData {
        let mut image = ImageData::new([4, 3, 2], [1.0, 2.0, 3.0], [0.5, 1.0, 2.0]);
        let points = (0..24).map(|i| i as f64 * 1.5).collect::<Vec<f64>>();
        let cells = (0..6).map(|i| 10 - i).collect::<Vec<i32>>();
        image
            .attributes
            .add(Association::Point, DataArray::new("p", points));
        image.attributes.add(Association::Cell, DataArray::new("c", cells));
        image
    }

    #[test]
    fn flip_twice_is_identity() {
        let image = image();
        for flip in [[true, false, false], [false, true, true], [true; 3]] {
            let filter = ReverseImageDataAxes::with_axes(flip);
            let back = filter.reverse(&filter.reverse(&image).unwrap()).unwrap();
            assert_eq!(back, image, "{flip:?}");
        }
    }

    #[test]
    fn cells_flip_with_cell_shape() {
        let filter = ReverseImageDataAxes::with_axes([false, false, true]);
        let output = filter.reverse(&image()).unwrap();

        // a single layer of cells has nothing to flip along z
        let c = output.attributes.get(Association::Cell, "c").unwrap();
        assert_eq!(c.values().unwrap(), vec![10.0, 9.0, 8.0, 7.0, 6.0, 5.0]);

        let p = output.attributes.get(Association::Point, "p").unwrap();
        assert_eq!(p.values().unwrap()[0], 12.0 * 1.5);
    }

    #[test]
    fn geometry_is_kept() {
        let output = ReverseImageDataAxes::new().reverse(&image()).unwrap();
        assert_eq!(output.origin, [1.0, 2.0, 3.0]);
        assert_eq!(output.spacing, [0.5, 1.0, 2.0]);
        assert_eq!(output.dimensions, [4, 3, 2]);
    }
}
