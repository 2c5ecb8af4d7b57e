//! Datasets, named arrays and the algorithm contract
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod algorithm;
mod array;
mod cell;
mod dataset;
mod error;
mod kdtree;
mod reader;
mod timeseries;

pub mod vtk;

#[doc(inline)]
pub use algorithm::{
    strip_error_message, wrap_error_message, Algorithm, AlgorithmState, Information, OutputKind,
    PortKind, ERROR_PREFIX, ERROR_SUFFIX,
};

#[doc(inline)]
pub use array::{
    decode_packed, to_dataframe, to_dataset_array, to_host_array, ArrayData, Association,
    DataArray, DataType, Endian, HostElement, ScalarKind,
};

#[doc(inline)]
pub use cell::{CellArray, CellType};

#[doc(inline)]
pub use dataset::{
    bounds_of, cell_dimensions, point_extent, Attributes, Dataset, DatasetKind, ImageData,
    MultiBlock, PolyData, RectilinearGrid, Table, UnstructuredGrid,
};

#[doc(inline)]
pub use kdtree::KdTree;

#[doc(inline)]
pub use reader::{base_name, init_reader, init_writer, read_lines, ReaderBase};

#[doc(inline)]
pub use timeseries::{merge_timesteps, nearest_index, Timeline};

#[doc(inline)]
pub use vtk::{dataset_to_vtk, write_vtk, VtkFormat};

#[doc(inline)]
pub use error::{Error, Result};
