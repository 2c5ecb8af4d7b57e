//! Move the origin of an image grid to another of its corners

// standard library
use std::str::FromStr;

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Dataset, DatasetKind, Error, ImageData, OutputKind, PortKind,
    Result,
};
use geokit_utils::f;

// external crates
use serde::{Deserialize, Serialize};

/// Corner of a grid, named by compass side and height
///
/// The grid origin is normally the south-west bottom corner. Translating to
/// any other corner places that corner of the grid at the current origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    SouthWestBottom,
    #[default]
    SouthEastBottom,
    NorthWestBottom,
    NorthEastBottom,
    SouthWestTop,
    SouthEastTop,
    NorthWestTop,
    NorthEastTop,
}

impl Corner {
    /// Every corner, south-west bottom first
    pub const ALL: [Corner; 8] = [
        Self::SouthWestBottom,
        Self::SouthEastBottom,
        Self::NorthWestBottom,
        Self::NorthEastBottom,
        Self::SouthWestTop,
        Self::SouthEastTop,
        Self::NorthWestTop,
        Self::NorthEastTop,
    ];

    /// Corner from its index in [Corner::ALL]
    ///
    /// ```rust
    /// # use geokit_grids::Corner;
    /// assert_eq!(Corner::from_index(3).unwrap(), Corner::NorthEastBottom);
    /// assert!(Corner::from_index(8).is_err());
    /// ```
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL.get(index).copied().ok_or_else(|| {
            Error::InvalidArgument(f!("Corner index {index} is not in 0..8"))
        })
    }

    /// Kebab-case name, as used in json options
    pub fn name(&self) -> &'static str {
        match self {
            Self::SouthWestBottom => "south-west-bottom",
            Self::SouthEastBottom => "south-east-bottom",
            Self::NorthWestBottom => "north-west-bottom",
            Self::NorthEastBottom => "north-east-bottom",
            Self::SouthWestTop => "south-west-top",
            Self::SouthEastTop => "south-east-top",
            Self::NorthWestTop => "north-west-top",
            Self::NorthEastTop => "north-east-top",
        }
    }

    /// Whether the corner sits at the far end of the x, y and z axes
    pub fn far_sides(&self) -> [bool; 3] {
        match self {
            Self::SouthWestBottom => [false, false, false],
            Self::SouthEastBottom => [true, false, false],
            Self::NorthWestBottom => [false, true, false],
            Self::NorthEastBottom => [true, true, false],
            Self::SouthWestTop => [false, false, true],
            Self::SouthEastTop => [true, false, true],
            Self::NorthWestTop => [false, true, true],
            Self::NorthEastTop => [true, true, true],
        }
    }

    /// Shift from the south-west bottom corner to this corner
    pub fn offset(&self, dimensions: [usize; 3], spacing: [f64; 3]) -> [f64; 3] {
        let far = self.far_sides();
        [0, 1, 2].map(|a| match far[a] {
            true => dimensions[a].saturating_sub(1) as f64 * spacing[a],
            false => 0.0,
        })
    }
}

impl FromStr for Corner {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.to_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|c| c.name() == key)
            .ok_or_else(|| Error::InvalidArgument(f!("Unknown grid corner \"{s}\"")))
    }
}

/// Translate an image grid so that a chosen corner lands on its origin
///
/// Data arrays are untouched and only the origin moves, by the full grid
/// length along each axis where the corner is on the far side.
///
/// ```rust
/// # use geokit_core::{Algorithm, ImageData};
/// # use geokit_grids::{Corner, TranslateGridOrigin};
/// let image = ImageData::new([11, 6, 3], [0.0; 3], [1.0, 2.0, 5.0]);
///
/// let mut filter = TranslateGridOrigin::new(Corner::NorthEastTop);
/// let output = filter.apply(&[&image.into()]).unwrap();
/// assert_eq!(output.as_image().unwrap().origin, [-10.0, -10.0, -10.0]);
/// ```
#[derive(Debug, Default)]
pub struct TranslateGridOrigin {
    state: AlgorithmState,
    corner: Corner,
}

impl TranslateGridOrigin {
    /// Translate to the given corner
    pub fn new(corner: Corner) -> Self {
        Self {
            corner,
            ..Default::default()
        }
    }

    /// Current corner
    pub fn corner(&self) -> Corner {
        self.corner
    }

    /// Set the corner placed on the origin
    pub fn set_corner(&mut self, corner: Corner) {
        if self.corner != corner {
            self.corner = corner;
            self.modified(false);
        }
    }

    /// Copy of an image with the translated origin
    pub fn translate(&self, image: &ImageData) -> ImageData {
        let offset = self.corner.offset(image.dimensions, image.spacing);
        let mut output = image.clone();
        output.origin = [0, 1, 2].map(|a| image.origin[a] - offset[a]);
        output
    }
}

impl Algorithm for TranslateGridOrigin {
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
        Ok(self.translate(inputs[0].as_image()?).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_by_name() {
        assert_eq!("north-east-top".parse::<Corner>().unwrap(), Corner::NorthEastTop);
        assert_eq!("South_West bottom".parse::<Corner>().unwrap(), Corner::SouthWestBottom);
        assert!("middle".parse::<Corner>().is_err());
    }

    #[test]
    fn round_trip_through_every_corner() {
        let image = ImageData::new([5, 4, 3], [100.0, -20.0, 7.5], [2.5, 10.0, 0.5]);
        for corner in Corner::ALL {
            let moved = TranslateGridOrigin::new(corner).translate(&image);
            let offset = corner.offset(image.dimensions, image.spacing);
            let back = [0, 1, 2].map(|a| moved.origin[a] + offset[a]);

            assert_eq!(back, image.origin, "{corner:?}");
            assert_eq!(moved.spacing, image.spacing);
        }
    }

    #[test]
    fn default_is_south_east_bottom() {
        let image = ImageData::new([3, 3, 3], [0.0; 3], [1.0; 3]);
        let moved = TranslateGridOrigin::default().translate(&image);
        assert_eq!(moved.origin, [-2.0, 0.0, 0.0]);
    }
}
