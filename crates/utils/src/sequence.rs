//! Helpers for generating and summarising 1D coordinate sequences
//!
//! Node vectors for rectilinear grids are built from an origin and a list of
//! cell widths, and many filters need evenly spaced ranges. These mirror the
//! behaviour of the usual `linspace`/`arange`/`cumsum` functions.

use crate::error::{Error, Result};

/// Evenly spaced values over `[start, stop]`, including both end points
///
/// ```rust
/// # use geokit_utils::sequence::linspace;
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
/// assert!(linspace(0.0, 1.0, 0).is_empty());
/// ```
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| match i == n - 1 {
                    true => stop,
                    false => start + step * i as f64,
                })
                .collect()
        }
    }
}

/// Values from `start` up to but excluding `stop` in increments of `step`
///
/// ```rust
/// # use geokit_utils::sequence::arange;
/// assert_eq!(arange(0.0, 3.0, 1.0).unwrap(), vec![0.0, 1.0, 2.0]);
/// assert!(arange(0.0, 3.0, 0.0).is_err());
/// ```
pub fn arange(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if step == 0.0 || !step.is_finite() || !start.is_finite() || !stop.is_finite() {
        return Err(Error::InvalidSequence { start, stop, step });
    }

    let n = ((stop - start) / step).ceil();
    if n <= 0.0 {
        return Ok(Vec::new());
    }

    Ok((0..n as usize).map(|i| start + step * i as f64).collect())
}

/// Node positions from an origin followed by consecutive cell widths
///
/// ```rust
/// # use geokit_utils::sequence::cumulative;
/// assert_eq!(cumulative(-1.0, &[1.0, 2.0]), vec![-1.0, 0.0, 2.0]);
/// ```
pub fn cumulative(origin: f64, widths: &[f64]) -> Vec<f64> {
    let mut nodes = Vec::with_capacity(widths.len() + 1);
    let mut position = origin;
    nodes.push(position);
    for w in widths {
        position += w;
        nodes.push(position);
    }
    nodes
}

/// Sorted distinct values, compared exactly
///
/// ```rust
/// # use geokit_utils::sequence::unique_sorted;
/// assert_eq!(unique_sorted(&[3.0, 1.0, 3.0, 2.0]), vec![1.0, 2.0, 3.0]);
/// ```
pub fn unique_sorted(values: &[f64]) -> Vec<f64> {
    let mut values = values.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();
    values
}

/// Differences between consecutive values
///
/// ```rust
/// # use geokit_utils::sequence::diff;
/// assert_eq!(diff(&[1.0, 2.0, 4.0]), vec![1.0, 2.0]);
/// ```
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Round half away from zero to a number of decimal places
///
/// ```rust
/// # use geokit_utils::sequence::round_to;
/// assert_eq!(round_to(1.23456, 2), 1.23);
/// ```
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_stop_exactly() {
        let values = linspace(0.001, 9.999, 10);
        assert_eq!(values.len(), 10);
        assert_eq!(values[0], 0.001);
        assert_eq!(values[9], 9.999);
    }

    #[test]
    fn arange_counts_like_numpy() {
        let angles = arange(0.0, std::f64::consts::FRAC_PI_2, std::f64::consts::PI / 3200.0)
            .unwrap();
        assert_eq!(angles.len(), 1600);
        assert!(arange(1.0, 0.0, 1.0).unwrap().is_empty());
    }
}
