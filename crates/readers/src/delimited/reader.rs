// standard library
use std::path::Path;

// crate modules
use crate::delimited::builder::DelimitedTextReaderBuilder;
use crate::delimited::parse::{
    build_table, content_lines, extract_header, parse_columns, Header, HeaderStyle,
};

// geokit modules
use geokit_core::{
    Algorithm, AlgorithmState, Dataset, DatasetKind, Error, Information, OutputKind, ReaderBase,
    Result, Table,
};
use geokit_utils::f;

// external crates
use log::debug;
use serde::{Deserialize, Serialize};

/// Parameters controlling how delimited text is split
///
/// Changing any of these requires the files to be read again.
///
/// ```rust
/// # use geokit_readers::DelimitedOptions;
/// let options = DelimitedOptions::from_json(r#"{"delimiter": ",", "skip_rows": 2}"#).unwrap();
/// assert_eq!(options.delimiter, ",");
/// assert_eq!(options.skip_rows, 2);
/// assert!(options.has_titles);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelimitedOptions {
    /// Single character column separator
    pub delimiter: String,
    /// Split on any run of whitespace instead of the delimiter
    pub split_on_whitespace: bool,
    /// Rows to skip after comments are removed
    pub skip_rows: usize,
    /// Comment character, empty for none
    pub comments: String,
    /// First line holds column titles
    pub has_titles: bool,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: " ".into(),
            split_on_whitespace: false,
            skip_rows: 0,
            comments: "!".into(),
            has_titles: true,
        }
    }
}

impl DelimitedOptions {
    /// Load options from a json string, missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise the options to pretty json
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Delimiter to split on, `None` meaning whitespace
    pub(crate) fn split_char(&self) -> Result<Option<char>> {
        if self.split_on_whitespace {
            return Ok(None);
        }
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Some(c)),
            _ => Err(Error::InvalidArgument(f!(
                "Delimiter \"{}\" must be a single character.",
                self.delimiter
            ))),
        }
    }
}

/// Read delimited text files into a [Table]
///
/// Every file is one timestep. Files are read up front on the first request
/// and cached until a parameter that affects parsing changes.
///
/// ```rust, no_run
/// # use geokit_core::Algorithm;
/// # use geokit_readers::DelimitedTextReader;
/// let mut reader = DelimitedTextReader::builder()
///     .delimiter(",")
///     .file_name("data.csv")
///     .build();
///
/// let table = reader.apply(&[]).unwrap();
/// println!("{} rows", table.as_table().unwrap().number_of_rows());
/// ```
#[derive(Debug, Default)]
pub struct DelimitedTextReader {
    pub(crate) state: AlgorithmState,
    pub(crate) base: ReaderBase,
    pub(crate) options: DelimitedOptions,
    pub(crate) style: HeaderStyle,
    titles: Vec<String>,
    file_header: Option<String>,
    tables: Vec<Table>,
}

impl DelimitedTextReader {
    /// Reader with the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an instance of the [DelimitedTextReaderBuilder]
    pub fn builder() -> DelimitedTextReaderBuilder {
        DelimitedTextReaderBuilder::default()
    }

    /// Reader for XYZ files with `! ` prefixed, comma separated titles
    pub fn xyz() -> Self {
        Self::builder()
            .comments("#")
            .header_style(HeaderStyle::Xyz)
            .build()
    }

    /// Reader for GSLib tables, split on whitespace
    pub fn gslib() -> Self {
        Self::builder()
            .split_on_whitespace(true)
            .header_style(HeaderStyle::Gslib)
            .build()
    }

    pub(crate) fn from_parts(base: ReaderBase, options: DelimitedOptions, style: HeaderStyle) -> Self {
        Self {
            base,
            options,
            style,
            ..Default::default()
        }
    }

    /// Current options
    pub fn options(&self) -> &DelimitedOptions {
        &self.options
    }

    /// Replace every option at once
    pub fn set_options(&mut self, options: DelimitedOptions) {
        if self.options != options {
            self.options = options;
            self.modified(true);
        }
    }

    /// Header style used to find titles
    pub fn header_style(&self) -> HeaderStyle {
        self.style
    }

    /// Add an input file, one per timestep
    pub fn add_file_name(&mut self, path: impl AsRef<Path>) {
        if self.base.add_file_name(path) {
            self.state.touch();
        }
    }

    /// Remove all input files
    pub fn clear_file_names(&mut self) {
        self.base.clear_file_names();
        self.state.touch();
    }

    /// Reader bookkeeping
    pub fn reader_base(&self) -> &ReaderBase {
        &self.base
    }

    /// Set the time between files
    pub fn set_time_delta(&mut self, dt: f64) {
        if self.base.set_time_delta(dt) {
            self.modified(false);
        }
    }

    /// Set the column delimiter, see also [set_split_on_whitespace()](Self::set_split_on_whitespace)
    pub fn set_delimiter(&mut self, delimiter: &str) {
        if self.options.delimiter != delimiter {
            self.options.delimiter = delimiter.to_string();
            self.modified(true);
        }
    }

    /// Split on any whitespace, overriding the delimiter
    pub fn set_split_on_whitespace(&mut self, flag: bool) {
        if self.options.split_on_whitespace != flag {
            self.options.split_on_whitespace = flag;
            self.modified(true);
        }
    }

    /// Set the number of rows to skip at the top of each file
    pub fn set_skip_rows(&mut self, skip: usize) {
        if self.options.skip_rows != skip {
            self.options.skip_rows = skip;
            self.modified(true);
        }
    }

    /// Set the comment character
    pub fn set_comments(&mut self, identifier: &str) {
        if self.options.comments != identifier {
            self.options.comments = identifier.to_string();
            self.modified(true);
        }
    }

    /// Set whether the files carry a title line
    pub fn set_has_titles(&mut self, flag: bool) {
        if self.options.has_titles != flag {
            self.options.has_titles = flag;
            self.modified(true);
        }
    }

    /// Column titles found by the last read
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Free header line of GSLib style files, `None` until read
    pub fn file_header(&self) -> Option<&str> {
        self.file_header.as_deref()
    }

    /// Header lines of every file, titles checked for consistency
    pub(crate) fn read_headers(&self) -> Result<Vec<Header>> {
        let delimiter = self.options.split_char()?;
        let mut headers = Vec::with_capacity(self.base.file_names().len());

        for path in self.base.file_names() {
            debug!("Reading {}", path.display());
            let lines = content_lines(path, &self.options.comments, self.options.skip_rows)?;
            headers.push(extract_header(
                lines,
                self.style,
                self.options.has_titles,
                delimiter,
            )?);
        }

        if headers.windows(2).any(|w| w[0].titles != w[1].titles) {
            return Err(Error::ParseError(
                "Data array titles varied across file timesteps. This data is invalid as a timeseries."
                    .into(),
            ));
        }
        Ok(headers)
    }

    /// Read every file into a table
    pub fn read_up_front(&mut self) -> Result<()> {
        if self.base.file_names().is_empty() {
            return Err(Error::InvalidArgument("No file name has been set.".into()));
        }

        let delimiter = self.options.split_char()?;
        let headers = self.read_headers()?;

        self.tables = headers
            .iter()
            .map(|h| Ok(build_table(&h.titles, parse_columns(&h.body, &h.titles, delimiter)?)))
            .collect::<Result<Vec<Table>>>()?;

        self.titles = headers.first().map(|h| h.titles.clone()).unwrap_or_default();
        self.file_header = headers.first().and_then(|h| h.file_header.clone());
        self.base.mark_read();
        Ok(())
    }

    /// Table for a requested time, reading the files if needed
    pub fn read_table(&mut self, time: Option<f64>) -> Result<Table> {
        if self.base.need_to_read() {
            self.read_up_front()?;
        }
        let index = self.base.index_for(time);
        self.tables
            .get(index)
            .cloned()
            .ok_or_else(|| Error::InvalidArgument(f!("No data for timestep index {index}.")))
    }
}

impl Algorithm for DelimitedTextReader {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Fixed(DatasetKind::Table)
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn modified(&mut self, read_again: bool) {
        self.base.modified(read_again);
        self.state.touch();
    }

    fn request_information(&mut self, _inputs: &[&Dataset]) -> Result<Information> {
        Ok(Information {
            whole_extent: None,
            timesteps: self.base.timesteps(),
        })
    }

    fn request_data(&mut self, _inputs: &[&Dataset], time: Option<f64>) -> Result<Dataset> {
        Ok(self.read_table(time)?.into())
    }
}
