//! Estimate the rotation and cell sizes of gridded point clouds
//!
//! Survey data is often collected on a regular lattice that is rotated on the
//! XY plane. Neighbouring points on the lattice are either aligned with the
//! rotated X axis or the rotated Y axis, so sweeping candidate angles over a
//! quarter turn and checking when a neighbour pair lines up with an axis
//! recovers both the angle and the spacing.

// standard library
use std::f64::consts::PI;

// geokit modules
use geokit_core::{Error, KdTree, Result};
use geokit_utils::sequence::{diff, round_to, unique_sorted};
use geokit_utils::{f, SliceExt};

// external crates
use itertools::Itertools;
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, warn};
use nalgebra::{Point2, Rotation2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Angular step between candidate rotations
pub const RESOLUTION: f64 = PI / 3200.0;

/// Number of candidate rotations, covering `[0, π/2)`
pub const ANGLE_STEPS: usize = 1600;

/// Recovered lattice parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Rotation of the lattice in radians, in `[0, π/2)`
    pub angle: f64,
    /// Spacing along the rotated X axis
    pub dx: f64,
    /// Spacing along the rotated Y axis
    pub dy: f64,
    /// Mean spacing between distinct elevations
    pub dz: f64,
}

impl Estimate {
    /// The recovered angle in degrees
    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }

    /// Cell sizes as `[dx, dy, dz]`
    pub fn spacing(&self) -> [f64; 3] {
        [self.dx, self.dy, self.dz]
    }
}

/// Which rotated axis a neighbour pair lines up with
///
/// The pair angle φ is measured from world X after the clockwise sweep, so
/// φ ≈ 0 is a pair along the lattice X axis and φ ≈ π/2 one along Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Rotation helpers and the lattice estimator
///
/// ```rust
/// # use geokit_filters::RotationTool;
/// // a 2x3 lattice with unit spacing rotated by 45 degrees
/// let lattice = [[1.1, 1.0], [2.1, 1.0], [1.1, 2.0], [2.1, 2.0], [1.1, 3.0], [2.1, 3.0]];
/// let rotated = RotationTool::rotate(&lattice, -45f64.to_radians());
/// let points = rotated.iter().map(|p| [p[0], p[1], 0.0]).collect::<Vec<_>>();
///
/// let tool = RotationTool::default().seed(7);
/// let (back, estimate) = tool.estimate_and_rotate(&points).unwrap();
///
/// assert!((estimate.angle_degrees() - 45.0).abs() < 1e-5);
/// assert!((estimate.dx - 1.0).abs() < 1e-5);
/// assert!((back[5][0] - 2.1).abs() < 1e-5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationTool {
    /// Starting precision of the alignment test, as decimal places
    pub decimals: i32,
    /// Fraction of the first elevation slice to sample
    pub sample: f64,
    /// Seed for the random sub-sample, entropy when `None`
    pub seed: Option<u64>,
    /// Fallback spacing where nothing can be estimated
    pub safe: f64,
    /// Show a progress bar while sweeping the sampled pairs
    pub progress: bool,
}

impl Default for RotationTool {
    fn default() -> Self {
        Self {
            decimals: 6,
            sample: 0.5,
            seed: None,
            safe: 10.0,
            progress: false,
        }
    }
}

impl RotationTool {
    /// Estimator starting at a given precision
    pub fn new(decimals: i32) -> Self {
        Self {
            decimals,
            ..Default::default()
        }
    }

    /// Load options from a json string, missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise the options to pretty json
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fix the seed of the random sub-sample
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fallback spacing for degenerate inputs
    pub fn safe(mut self, safe: f64) -> Self {
        self.safe = safe;
        self
    }

    /// Show a progress bar
    pub fn progress(mut self, flag: bool) -> Self {
        self.progress = flag;
        self
    }

    /// Apply `p·R(θ)` to every point, a clockwise turn by `θ`
    ///
    /// ```rust
    /// # use geokit_filters::RotationTool;
    /// let p = RotationTool::rotate(&[[0.0, 1.0]], 90f64.to_radians());
    /// assert!((p[0][0] - 1.0).abs() < 1e-12);
    /// assert!(p[0][1].abs() < 1e-12);
    /// ```
    pub fn rotate(points: &[[f64; 2]], theta: f64) -> Vec<[f64; 2]> {
        let rotation = Rotation2::new(-theta);
        points
            .iter()
            .map(|p| {
                let q = rotation * Point2::new(p[0], p[1]);
                [q.x, q.y]
            })
            .collect()
    }

    /// Counter-clockwise turn by `θ` about an origin on the XY plane
    ///
    /// ```rust
    /// # use geokit_filters::RotationTool;
    /// let p = RotationTool::rotate_around(&[[2.0, 1.0]], 90f64.to_radians(), [1.0, 1.0]);
    /// assert!((p[0][0] - 1.0).abs() < 1e-12);
    /// assert!((p[0][1] - 2.0).abs() < 1e-12);
    /// ```
    pub fn rotate_around(points: &[[f64; 2]], theta: f64, origin: [f64; 2]) -> Vec<[f64; 2]> {
        let rotation = Rotation2::new(theta);
        let o = Point2::new(origin[0], origin[1]);
        points
            .iter()
            .map(|p| {
                let q = o + rotation * (Point2::new(p[0], p[1]) - o);
                [q.x, q.y]
            })
            .collect()
    }

    /// Estimate the lattice of a point cloud and rotate it onto the world axes
    ///
    /// The returned points are the input turned by `-angle` with Z untouched.
    pub fn estimate_and_rotate(&self, points: &[[f64; 3]]) -> Result<(Vec<[f64; 3]>, Estimate)> {
        let estimate = self.estimate(points)?;
        let xy = points.iter().map(|p| [p[0], p[1]]).collect::<Vec<_>>();
        let rotated = Self::rotate(&xy, estimate.angle)
            .into_iter()
            .zip(points)
            .map(|(q, p)| [q[0], q[1], p[2]])
            .collect();
        Ok((rotated, estimate))
    }

    /// Estimate the rotation angle and cell sizes of a gridded point cloud
    ///
    /// Only the points sharing the elevation of the first point are used for
    /// the angle and horizontal spacing.
    pub fn estimate(&self, points: &[[f64; 3]]) -> Result<Estimate> {
        let dz = self.vertical_spacing(points);

        let Some(first) = points.first() else {
            return Err(Error::InvalidArgument(
                "Cannot estimate a grid without points.".into(),
            ));
        };

        let slice = points
            .iter()
            .filter(|p| p[2] == first[2])
            .map(|p| [p[0], p[1]])
            .collect::<Vec<[f64; 2]>>();

        if slice.len() < 2 {
            debug!("Single point slice, using the safe spacing");
            return Ok(Estimate {
                angle: 0.0,
                dx: self.safe,
                dy: self.safe,
                dz,
            });
        }

        let (angle, dx, dy) = self.angle_and_spacing(&slice)?;
        debug!("Recovered angle {:.6} deg, dx {dx}, dy {dy}, dz {dz}", angle.to_degrees());
        Ok(Estimate { angle, dx, dy, dz })
    }

    /// Mean gap between distinct elevations, or the safe value
    fn vertical_spacing(&self, points: &[[f64; 3]]) -> f64 {
        let z = points.iter().map(|p| p[2]).collect::<Vec<f64>>();
        diff(&unique_sorted(&z)).try_mean().unwrap_or(self.safe)
    }

    fn angle_and_spacing(&self, slice: &[[f64; 2]]) -> Result<(f64, f64, f64)> {
        let tree = KdTree::new(slice.to_vec());
        let n = slice.len();
        let count = (n as f64 * self.sample) as usize + 1;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let samples = (0..count).map(|_| rng.gen_range(0..n)).collect::<Vec<usize>>();

        let mut progress = self.init_progress_bar(samples.len())?;
        let mut decimals = self.decimals;
        let mut angles = Vec::with_capacity(samples.len());
        let mut x_distances = Vec::new();
        let mut y_distances = Vec::new();

        for i in samples {
            progress.update(1)?;
            let neighbours = tree.k_nearest(&slice[i], 2);
            let Some(&(j, distance)) = neighbours.get(1) else {
                continue;
            };
            if distance == 0.0 {
                warn!("Skipping coincident points {i} and {j}");
                continue;
            }

            let (axis, angle, distance) = converge_angle(slice[i], slice[j], &mut decimals)?;
            angles.push(angle);
            match axis {
                Axis::X => x_distances.push(distance),
                Axis::Y => y_distances.push(distance),
            }
        }

        if angles.is_empty() {
            return Err(Error::Precision("No angle found.".into()));
        }

        if x_distances.is_empty() {
            x_distances = y_distances.clone();
        } else if y_distances.is_empty() {
            y_distances = x_distances.clone();
        }

        let tolerance = x_distances
            .iter()
            .chain(&y_distances)
            .copied()
            .fold(f64::INFINITY, f64::min)
            / 2.0;
        let angle = unique_sorted(&angles).try_mean()?;
        let dx = spacing_mode(&x_distances, tolerance, decimals);
        let dy = spacing_mode(&y_distances, tolerance, decimals);
        Ok((angle, dx, dy))
    }

    fn init_progress_bar(&self, total: usize) -> Result<Bar> {
        BarBuilder::default()
            .total(total)
            .unit(" pairs")
            .disable(!self.progress)
            .bar_format("Estimating rotation: {count}/{total} [{rate:.2} pairs/s]  ")
            .build()
            .map_err(|e| Error::InvalidArgument(f!("Failed to initialise progress bar: {e}")))
    }
}

/// Sweep candidate rotations until the pair lines up with an axis
///
/// Precision is relaxed one decimal place at a time when nothing lines up,
/// and stays relaxed for every pair that follows.
fn converge_angle(p1: [f64; 2], p2: [f64; 2], decimals: &mut i32) -> Result<(Axis, f64, f64)> {
    let sweep = (0..ANGLE_STEPS)
        .map(|k| {
            let theta = k as f64 * RESOLUTION;
            let rotated = RotationTool::rotate(&[p1, p2], theta);
            let dx = (rotated[0][0] - rotated[1][0]).abs();
            let dy = (rotated[0][1] - rotated[1][1]).abs();
            let distance = dx.hypot(dy);
            ((dx / distance).min(1.0).acos(), distance)
        })
        .collect::<Vec<(f64, f64)>>();

    loop {
        let tolerance = 10f64.powi(-*decimals);
        let along_x = (0..ANGLE_STEPS)
            .filter(|k| sweep[*k].0.abs() < tolerance)
            .collect::<Vec<usize>>();
        let along_y = (0..ANGLE_STEPS)
            .filter(|k| (sweep[*k].0 - PI / 2.0).abs() < tolerance)
            .collect::<Vec<usize>>();

        let (axis, hits) = match (along_x.is_empty(), along_y.is_empty()) {
            (true, true) => {
                *decimals -= 1;
                if *decimals < 0 {
                    *decimals = 0;
                    return Err(Error::Precision("No angle found.".into()));
                }
                warn!("No alignment found, relaxing precision to {} decimals", *decimals);
                continue;
            }
            (false, false) => return Err(Error::Precision("Invalid solution".into())),
            (false, true) => (Axis::X, along_x),
            (true, false) => (Axis::Y, along_y),
        };

        let k = hits.iter().sum::<usize>() / hits.len();
        return Ok((axis, k as f64 * RESOLUTION, sweep[k].1));
    }
}

/// Most common spacing after snapping to the tolerance, ties to the smallest
fn spacing_mode(distances: &[f64], tolerance: f64, decimals: i32) -> f64 {
    distances
        .iter()
        .map(|d| round_to((d / tolerance).round() * tolerance, decimals))
        .sorted_by(|a, b| a.total_cmp(b))
        .dedup_with_count()
        .fold((0, f64::NAN), |best, (count, value)| match count > best.0 {
            true => (count, value),
            false => best,
        })
        .1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(theta_degrees: f64) -> Vec<[f64; 3]> {
        let grid = itertools::iproduct!([1.0, 2.0, 3.0], [1.1, 2.1])
            .map(|(y, x)| [x, y])
            .collect::<Vec<_>>();
        RotationTool::rotate(&grid, -theta_degrees.to_radians())
            .into_iter()
            .map(|p| [p[0], p[1], 0.0])
            .collect()
    }

    #[test]
    fn rotate_inverts_rotate() {
        let points = [[1.0, 2.0], [-3.0, 0.5]];
        let there = RotationTool::rotate(&points, 0.3);
        let back = RotationTool::rotate(&there, -0.3);
        for (a, b) in points.iter().zip(&back) {
            assert!((a[0] - b[0]).abs() < 1e-12);
            assert!((a[1] - b[1]).abs() < 1e-12);
        }
    }

    #[test]
    fn converges_on_aligned_pairs() {
        let mut decimals = 6;
        let (axis, angle, distance) = converge_angle([0.0, 0.0], [2.0, 0.0], &mut decimals).unwrap();
        assert_eq!(axis, Axis::X);
        assert_eq!(angle, 0.0);
        assert!((distance - 2.0).abs() < 1e-12);

        let (axis, _, _) = converge_angle([0.0, 0.0], [0.0, 3.0], &mut decimals).unwrap();
        assert_eq!(axis, Axis::Y);
        assert_eq!(decimals, 6);
    }

    #[test]
    fn precision_is_relaxed() {
        // 60 degrees is not a multiple of the resolution
        let p2 = RotationTool::rotate(&[[1.0, 0.0]], -60f64.to_radians())[0];
        let mut decimals = 6;
        let (_, angle, _) = converge_angle([0.0, 0.0], p2, &mut decimals).unwrap();
        assert!(decimals < 6);
        assert!((angle.to_degrees() - 60.0).abs() < 0.1);
    }

    #[test]
    fn recovers_lattice() {
        let tool = RotationTool::default().seed(3);
        for theta in [0.0, 33.3, 45.0] {
            let estimate = tool.estimate(&lattice(theta)).unwrap();
            assert!((estimate.angle_degrees() - theta).abs() < 1e-5, "{theta}");
            assert!((estimate.dx - 1.0).abs() < 1e-5);
            assert!((estimate.dy - 1.0).abs() < 1e-5);
            assert_eq!(estimate.dz, tool.safe);
        }
    }

    #[test]
    fn single_point_is_safe() {
        let estimate = RotationTool::default().safe(5.0).estimate(&[[1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(estimate.angle, 0.0);
        assert_eq!(estimate.spacing(), [5.0, 5.0, 5.0]);
        assert!(RotationTool::default().estimate(&[]).is_err());
    }

    #[test]
    fn vertical_spacing_from_unique_levels() {
        let points = [[0.0, 0.0, 0.0], [0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [0.0, 0.0, 4.0]];
        assert_eq!(RotationTool::default().vertical_spacing(&points), 2.0);
    }

    #[test]
    fn spacing_snaps_to_tolerance() {
        let mode = spacing_mode(&[1.0, 1.0000001, 2.0, 0.9999999], 0.5, 6);
        assert_eq!(mode, 1.0);
    }

    #[test]
    fn options_from_json() {
        let tool = RotationTool::from_json(r#"{"decimals": 4, "seed": 11}"#).unwrap();
        assert_eq!(tool.decimals, 4);
        assert_eq!(tool.seed, Some(11));
        assert_eq!(tool.safe, 10.0);
    }
}
