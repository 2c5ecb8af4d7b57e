//! Regular grid utilities and parametric model sources
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod reverse;
mod sources;
mod table;
mod translate;

#[doc(inline)]
pub use reverse::{flipped_order, ReverseImageDataAxes};

#[doc(inline)]
pub use translate::{Corner, TranslateGridOrigin};

#[doc(inline)]
pub use table::{packed_to_xyzt, Order, TableToTimeGrid, TimeGridOptions};

#[doc(inline)]
pub use sources::{
    spatial_data, CreateEvenRectilinearGrid, CreateTensorMesh, CreateTensorMeshBuilder,
    CreateUniformGrid, TensorMeshOptions,
};
