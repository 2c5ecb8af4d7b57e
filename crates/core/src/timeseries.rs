//! Timestep publication for multi-file inputs

// geokit modules
use geokit_utils::SliceExt;

// external crates
use serde::{Deserialize, Serialize};

/// Evenly spaced timesteps over an ordered list of inputs
///
/// Input `i` is published at time `i * dt`. A requested time is resolved to
/// the input with the nearest timestep, so any time before the first step maps
/// to index 0 and anything past the last step maps to the final index.
///
/// ```rust
/// # use geokit_core::Timeline;
/// let timeline = Timeline::new(4, 0.5);
/// assert_eq!(timeline.timesteps(), vec![0.0, 0.5, 1.0, 1.5]);
/// assert_eq!(timeline.index_for(Some(1.2)), 2);
/// assert_eq!(timeline.index_for(Some(99.0)), 3);
/// assert_eq!(timeline.index_for(None), 0);
///
/// // a single input publishes no timesteps at all
/// assert!(Timeline::new(1, 1.0).timesteps().is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Number of inputs
    pub count: usize,
    /// Time between consecutive inputs
    pub dt: f64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self { count: 0, dt: 1.0 }
    }
}

impl Timeline {
    /// A timeline over `count` inputs spaced by `dt`
    pub fn new(count: usize, dt: f64) -> Self {
        Self { count, dt }
    }

    /// Published timestep values, empty for fewer than two inputs
    pub fn timesteps(&self) -> Vec<f64> {
        match self.count > 1 {
            true => (0..self.count).map(|i| i as f64 * self.dt).collect(),
            false => Vec::new(),
        }
    }

    /// Index of the input to use for a requested time
    pub fn index_for(&self, time: Option<f64>) -> usize {
        match time {
            Some(t) => nearest_index(&self.timesteps(), t),
            None => 0,
        }
    }
}

/// Index of the nearest value in a list of timesteps, 0 when there are none
pub fn nearest_index(timesteps: &[f64], time: f64) -> usize {
    timesteps.find_nearest(time).unwrap_or(0)
}

/// Sorted union of two lists of timesteps
///
/// ```rust
/// # use geokit_core::merge_timesteps;
/// assert_eq!(merge_timesteps(&[0.0, 2.0], &[0.0, 1.0]), vec![0.0, 1.0, 2.0]);
/// ```
pub fn merge_timesteps(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut merged = [a, b].concat();
    merged.sort_by(|x, y| x.total_cmp(y));
    merged.dedup();
    merged
}
