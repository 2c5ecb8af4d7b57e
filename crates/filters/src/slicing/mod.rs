//! Planar slicing of volumetric datasets
//!
//! Every slicer cuts with a [Plane] and differs only in how the planes are
//! placed: uniformly along an axis, along a path of points, or one at a
//! time driven by a timestep or a location along the path.

mod axis;
mod cutter;
mod options;
mod path;

pub use axis::{ManySlicesAlongAxis, SliceThroughTime};
pub use cutter::Plane;
pub use options::{SliceBuilder, SliceOptions};
pub use path::{ManySlicesAlongPoints, SlideSliceAlongPoints};

// geokit modules
use geokit_core::{Dataset, MultiBlock, Result};
use geokit_utils::f;

// external crates
use rayon::prelude::*;

/// Cut a dataset with every plane, in parallel, into named blocks
pub(crate) fn slice_blocks(input: &Dataset, planes: &[Plane]) -> Result<MultiBlock> {
    let slices = planes
        .par_iter()
        .map(|plane| plane.cut(input))
        .collect::<Result<Vec<_>>>()?;

    Ok(MultiBlock {
        blocks: slices
            .into_iter()
            .enumerate()
            .map(|(i, slice)| (f!("Slice{i:02}"), slice.into()))
            .collect(),
        ..Default::default()
    })
}
