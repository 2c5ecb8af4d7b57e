// standard library
use std::path::{Path, PathBuf};

// crate modules
use crate::delimited::parse::HeaderStyle;
use crate::delimited::reader::{DelimitedOptions, DelimitedTextReader};

// geokit modules
use geokit_core::ReaderBase;

/// Builder implementation for [DelimitedTextReader] configuration
///
/// Any number of parameters can be set with chained calls, including none.
/// To get the final reader call [build()](DelimitedTextReaderBuilder::build).
///
/// ```rust
/// # use geokit_readers::{DelimitedTextReader, HeaderStyle};
/// let reader = DelimitedTextReader::builder()
///     .delimiter(",")
///     .skip_rows(1)
///     .comments("#")
///     .has_titles(false)
///     .build();
///
/// assert_eq!(reader.options().delimiter, ",");
/// assert_eq!(reader.header_style(), HeaderStyle::Titles);
/// ```
#[derive(Debug, Default)]
pub struct DelimitedTextReaderBuilder {
    options: DelimitedOptions,
    style: HeaderStyle,
    file_names: Vec<PathBuf>,
    time_delta: Option<f64>,
}

impl DelimitedTextReaderBuilder {
    /// Create a new instance of the builder with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the [DelimitedTextReader]
    pub fn build(self) -> DelimitedTextReader {
        let mut base = ReaderBase::default();
        for name in &self.file_names {
            base.add_file_name(name);
        }
        if let Some(dt) = self.time_delta {
            base.set_time_delta(dt);
        }
        DelimitedTextReader::from_parts(base, self.options, self.style)
    }

    /// Start from a full set of options
    pub fn options(mut self, options: DelimitedOptions) -> Self {
        self.options = options;
        self
    }

    /// Single character column separator
    pub fn delimiter(mut self, delimiter: &str) -> Self {
        self.options.delimiter = delimiter.to_string();
        self
    }

    /// Split on any run of whitespace instead of the delimiter
    pub fn split_on_whitespace(mut self, flag: bool) -> Self {
        self.options.split_on_whitespace = flag;
        self
    }

    /// Rows to skip at the top of each file
    pub fn skip_rows(mut self, skip: usize) -> Self {
        self.options.skip_rows = skip;
        self
    }

    /// Comment character
    pub fn comments(mut self, identifier: &str) -> Self {
        self.options.comments = identifier.to_string();
        self
    }

    /// Whether the first line holds titles
    pub fn has_titles(mut self, flag: bool) -> Self {
        self.options.has_titles = flag;
        self
    }

    /// How titles are found in the leading lines
    pub fn header_style(mut self, style: HeaderStyle) -> Self {
        self.style = style;
        self
    }

    /// Add an input file
    pub fn file_name(mut self, path: impl AsRef<Path>) -> Self {
        self.file_names.push(path.as_ref().to_path_buf());
        self
    }

    /// Time between consecutive files
    pub fn time_delta(mut self, dt: f64) -> Self {
        self.time_delta = Some(dt);
        self
    }
}
