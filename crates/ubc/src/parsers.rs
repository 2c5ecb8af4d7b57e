//! Parser combinators for the numeric lines of UBC files

// geokit modules
use geokit_core::{Error, Result};
use geokit_utils::{f, StringExt};

// nom parser combinators
use nom::branch::alt;
use nom::character::complete::{char, digit1, space0};
use nom::combinator::{map, map_res, verify};
use nom::multi::many1;
use nom::number::complete::double;
use nom::sequence::{preceded, separated_pair};
use nom::IResult;

/// Positive repeat count in front of a `*`
fn repeat_count(i: &str) -> IResult<&str, usize> {
    verify(map_res(digit1, str::parse::<usize>), |k: &usize| *k > 0)(i)
}

/// `k*v`, expanding to k copies of v
fn repeated(i: &str) -> IResult<&str, Vec<f64>> {
    map(separated_pair(repeat_count, char('*'), double), |(k, v)| {
        vec![v; k]
    })(i)
}

/// A single width, either plain or run-length encoded
fn width(i: &str) -> IResult<&str, Vec<f64>> {
    alt((repeated, map(double, |v| vec![v])))(i)
}

/// Consecutive widths separated by whitespace
fn widths(i: &str) -> IResult<&str, Vec<f64>> {
    map(many1(preceded(space0, width)), |runs| runs.concat())(i)
}

/// Expand a line of cell widths, allowing the `k*v` shorthand
///
/// ```rust
/// # use geokit_ubc::parse_widths;
/// assert_eq!(parse_widths("200 3*50.0 100").unwrap(), vec![200.0, 50.0, 50.0, 50.0, 100.0]);
/// assert_eq!(parse_widths("2*1.5 ! comment").unwrap(), vec![1.5, 1.5]);
/// assert!(parse_widths("0*50.0").is_err());
/// assert!(parse_widths("").is_err());
/// ```
pub fn parse_widths(line: &str) -> Result<Vec<f64>> {
    let content = line.strip_comment('!').replace('\t', " ");
    match widths(&content) {
        Ok((rest, values)) if rest.trim().is_empty() => Ok(values),
        _ => Err(Error::ParseError(f!(
            "Unable to read cell widths from \"{}\"",
            line.trim()
        ))),
    }
}

/// Every whitespace separated float on a line
pub(crate) fn floats(line: &str) -> Result<Vec<f64>> {
    line.strip_comment('!')
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| Error::ParseError(f!("Expected a number, found \"{v}\"")))
        })
        .collect()
}

/// Every whitespace separated unsigned integer on a line
pub(crate) fn counts(line: &str) -> Result<Vec<usize>> {
    line.strip_comment('!')
        .split_whitespace()
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| Error::ParseError(f!("Expected a count, found \"{v}\"")))
        })
        .collect()
}

/// Exactly `n` floats from a line
pub(crate) fn n_floats<const N: usize>(line: &str, what: &str) -> Result<[f64; N]> {
    let values = floats(line)?;
    values
        .get(..N)
        .and_then(|v| <[f64; N]>::try_from(v).ok())
        .ok_or_else(|| Error::ParseError(f!("Expected {N} values for the {what}")))
}

/// Lines of a file with comments and blank lines removed
pub(crate) fn content_lines(path: &std::path::Path) -> Result<Vec<String>> {
    Ok(geokit_core::read_lines(path)?
        .into_iter()
        .map(|l| l.strip_comment('!').to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_expand_runs() {
        let values = parse_widths("200 100 50 20*50.0 50 100 200").unwrap();
        assert_eq!(values.len(), 26);
        assert_eq!(values.iter().sum::<f64>(), 1700.0);
    }

    #[test]
    fn widths_reject_trailing_junk() {
        assert!(parse_widths("1.0 2.0 *3").is_err());
        assert!(parse_widths("-2*3.0").is_err());
    }

    #[test]
    fn fixed_counts() {
        assert_eq!(n_floats::<3>("1 2 3 4", "origin").unwrap(), [1.0, 2.0, 3.0]);
        assert!(n_floats::<3>("1 2", "origin").is_err());
        assert_eq!(counts("16 16 16 ! base mesh").unwrap(), vec![16, 16, 16]);
    }
}
