//! Filters for gridded point clouds, slicing and topography
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod points;
mod rotation;
mod slicing;
mod topography;
mod voxelize;

#[doc(inline)]
pub use rotation::{Estimate, RotationTool, ANGLE_STEPS, RESOLUTION};

#[doc(inline)]
pub use voxelize::{Spacing, VoxelOptions, VoxelizePoints, VoxelizePointsBuilder};

#[doc(inline)]
pub use slicing::{
    ManySlicesAlongAxis, ManySlicesAlongPoints, Plane, SliceBuilder, SliceOptions,
    SliceThroughTime, SlideSliceAlongPoints,
};

#[doc(inline)]
pub use topography::{ExtractTopography, ExtractTopographyBuilder, Operation, TopographyOptions};

#[doc(inline)]
pub use points::{
    shortest_path_order, AddCellConnToPoints, AppendCellCenters, Connection, ConnectionOptions,
    ExtractCellCenters, IterateOverPoints, RotatePoints,
};
