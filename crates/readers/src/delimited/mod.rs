//! Delimited text readers
//!
//! Files are read line by line, comments stripped, then split into a header
//! and a body according to a [HeaderStyle]. The body is parsed with `csv`
//! for single character delimiters or split on whitespace.

mod builder;
mod parse;
mod reader;

pub use builder::DelimitedTextReaderBuilder;
pub use parse::HeaderStyle;
pub use reader::{DelimitedOptions, DelimitedTextReader};

pub(crate) use parse::{content_lines, numeric_tokens};
