//! UBC-GIF tensor and OcTree meshes, models and observation files
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod mesh;
mod model;
mod observations;
mod octree;
mod parsers;
mod tensor;
mod two_file;
mod writer;

#[doc(inline)]
pub use parsers::parse_widths;

#[doc(inline)]
pub use mesh::{
    grid_to_ubc_order, mesh_kind, place_model_on_grid, read_mesh_extent, read_tensor_mesh,
    ubc_to_grid_order, MeshKind, Model,
};

#[doc(inline)]
pub use model::{read_model, read_model_2d, read_model_3d, DataName};

#[doc(inline)]
pub use tensor::{TensorMeshAppender, TensorMeshReader, TopoMeshAppender};

#[doc(inline)]
pub use octree::{
    place_model_on_octree, OcTreeAppender, OcTreeMesh, OcTreeReader, Octant, INDEX_CELL_CORNER,
};

#[doc(inline)]
pub use observations::{direction_vector, MagneticSurvey, ObservationKind, ObservationReader};

#[doc(inline)]
pub use writer::{compress_widths, UbcTensorWriter};
