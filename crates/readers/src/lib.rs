//! Readers and writers for delimited text and gridded file formats
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod binary;
mod centers;
mod delimited;
mod esri;
mod gslib;
mod points;
mod sgems;
mod surfer;
mod writer;

#[doc(inline)]
pub use delimited::{DelimitedOptions, DelimitedTextReader, DelimitedTextReaderBuilder, HeaderStyle};

#[doc(inline)]
pub use points::{table_to_points, DelimitedPointsReader};

#[doc(inline)]
pub use binary::{strip_rsf_header, PackedBinariesReader, PackedOptions, RSF_CONTROL_SEQUENCE};

#[doc(inline)]
pub use sgems::{parse_sgems_dims, SgemsGridReader, SgemsWriter, SGEMS_MASK};

#[doc(inline)]
pub use surfer::{SurferGridReader, SurferHeader, SurferWriter, SURFER_NO_DATA};

#[doc(inline)]
pub use esri::{EsriGridReader, EsriHeader};

#[doc(inline)]
pub use gslib::GslibWriter;

#[doc(inline)]
pub use centers::CellCentersWriter;

#[doc(inline)]
pub use writer::{block_file_names, ValueFormat, WriteOut, Writer};
