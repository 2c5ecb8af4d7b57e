//! Line handling and column parsing shared by every text reader

// standard library
use std::path::Path;

// geokit modules
use geokit_core::{read_lines, DataArray, Error, Result, Table};
use geokit_utils::{f, StringExt};

// external crates
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};

/// How the leading lines of a file are turned into column titles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderStyle {
    /// First line holds delimited titles, or `Field i` without titles
    #[default]
    Titles,
    /// First line is `! ` followed by `, ` separated titles
    Xyz,
    /// Free header line, column count, then one title per line
    Gslib,
}

/// Titles and body split from a single file
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Header {
    /// Free-form first line, GSLib style only
    pub file_header: Option<String>,
    /// Column titles
    pub titles: Vec<String>,
    /// Remaining data lines
    pub body: Vec<String>,
}

/// Non-empty lines of a file with comments removed and leading rows skipped
///
/// Anything after the first comment character on a line is dropped, then
/// lines left empty are removed before `skip_rows` is applied.
pub(crate) fn content_lines(
    path: impl AsRef<Path>,
    comments: &str,
    skip_rows: usize,
) -> Result<Vec<String>> {
    let marker = comments.chars().next();
    let lines = read_lines(path)?
        .into_iter()
        .map(|line| match marker {
            Some(m) => line.strip_comment(m).to_string(),
            None => line.trim().to_string(),
        })
        .filter(|line| !line.is_empty())
        .skip(skip_rows)
        .collect();
    Ok(lines)
}

/// Split a single line into trimmed fields
pub(crate) fn split_fields(line: &str, delimiter: Option<char>) -> Vec<String> {
    match delimiter {
        Some(d) => line.split(d).map(|s| s.trim().to_string()).collect(),
        None => line.split_whitespace().map(|s| s.to_string()).collect(),
    }
}

/// Separate titles from data according to a header style
pub(crate) fn extract_header(
    mut lines: Vec<String>,
    style: HeaderStyle,
    has_titles: bool,
    delimiter: Option<char>,
) -> Result<Header> {
    if lines.is_empty() {
        return Err(Error::ParseError("File contains no data.".into()));
    }

    match style {
        HeaderStyle::Titles => {
            let titles = match has_titles {
                true => split_fields(&lines.remove(0), delimiter),
                false => (0..split_fields(&lines[0], delimiter).len())
                    .map(|i| f!("Field {i}"))
                    .collect(),
            };
            Ok(Header {
                file_header: None,
                titles,
                body: lines,
            })
        }
        HeaderStyle::Xyz => {
            let first = lines.remove(0);
            let titles = first
                .get(2..)
                .unwrap_or_default()
                .split(", ")
                .map(|s| s.trim().to_string())
                .collect();
            Ok(Header {
                file_header: None,
                titles,
                body: lines,
            })
        }
        HeaderStyle::Gslib => {
            let bad_format = || Error::ParseError("This file is not in proper GSLIB format.".into());
            let count = lines
                .get(1)
                .and_then(|l| l.trim().parse::<usize>().ok())
                .ok_or_else(bad_format)?;
            if lines.len() < 2 + count {
                return Err(bad_format());
            }
            let body = lines.split_off(2 + count);
            let titles = lines[2..].iter().map(|t| t.trim().to_string()).collect();
            Ok(Header {
                file_header: Some(lines[0].clone()),
                titles,
                body,
            })
        }
    }
}

/// Parse data lines into one string column per title
pub(crate) fn parse_columns(
    body: &[String],
    titles: &[String],
    delimiter: Option<char>,
) -> Result<Vec<Vec<String>>> {
    let rows = match delimiter {
        None => body
            .iter()
            .map(|line| split_fields(line, None))
            .collect::<Vec<Vec<String>>>(),
        Some(d) => {
            let byte = u8::try_from(d)
                .ok()
                .filter(|b| b.is_ascii())
                .ok_or_else(|| {
                    Error::InvalidArgument(f!("Delimiter \"{d}\" must be a single ASCII character."))
                })?;
            let joined = body.join("\n");
            let mut reader = ReaderBuilder::new()
                .delimiter(byte)
                .has_headers(false)
                .flexible(true)
                .trim(Trim::All)
                .from_reader(joined.as_bytes());
            reader
                .records()
                .map(|r| r.map(|rec| rec.iter().map(|s| s.to_string()).collect()))
                .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?
        }
    };

    let mut columns = vec![Vec::with_capacity(rows.len()); titles.len()];
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != titles.len() {
            return Err(Error::ParseError(f!(
                "Row {i} has {} values, expected {}.",
                row.len(),
                titles.len()
            )));
        }
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }
    Ok(columns)
}

/// Build a typed array from string values
///
/// Columns that are all integers become `Int64`, all numbers `Float64`, and
/// anything else is kept as strings.
pub(crate) fn infer_column(name: &str, values: Vec<String>) -> DataArray {
    if let Ok(ints) = values.iter().map(|v| v.parse::<i64>()).collect::<std::result::Result<Vec<_>, _>>() {
        if !values.is_empty() {
            return DataArray::new(name, ints);
        }
    }
    match values.iter().map(|v| v.parse::<f64>()).collect::<std::result::Result<Vec<_>, _>>() {
        Ok(floats) => DataArray::new(name, floats),
        Err(_) => DataArray::new(name, values),
    }
}

/// Assemble a table from titles and string columns
pub(crate) fn build_table(titles: &[String], columns: Vec<Vec<String>>) -> Table {
    let mut table = Table::default();
    for (title, column) in titles.iter().zip(columns) {
        table.add_column(infer_column(title, column));
    }
    table
}

/// Every whitespace separated token of the body as a float
pub(crate) fn numeric_tokens(body: &[String]) -> Result<Vec<f64>> {
    body.iter()
        .flat_map(|line| line.split_whitespace())
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| Error::ParseError(f!("Could not parse \"{token}\" as a number.")))
        })
        .collect()
}
