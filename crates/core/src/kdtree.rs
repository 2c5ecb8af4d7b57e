//! A small k-d tree for Euclidean nearest neighbour queries
//!
//! Only what the filters need: build once over a fixed point set, then ask
//! for the nearest or `k` nearest points to arbitrary queries. Results come
//! back ordered by distance with ties broken by the lower point index, which
//! keeps every filter built on top of it deterministic.

// external crates
use rayon::prelude::*;

#[derive(Debug, Clone)]
struct Node {
    point: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Balanced k-d tree over `K` dimensional points
///
/// ```rust
/// # use geokit_core::KdTree;
/// let tree = KdTree::new(vec![[0.0, 0.0], [1.0, 0.0], [5.0, 5.0]]);
///
/// let (index, distance) = tree.nearest(&[0.9, 0.2]).unwrap();
/// assert_eq!(index, 1);
/// assert!((distance - 0.2236).abs() < 1e-4);
///
/// let neighbours = tree.k_nearest(&[0.0, 0.0], 2);
/// assert_eq!(neighbours[0], (0, 0.0));
/// assert_eq!(neighbours[1], (1, 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct KdTree<const K: usize> {
    points: Vec<[f64; K]>,
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl<const K: usize> KdTree<K> {
    /// Build a tree over a set of points
    pub fn new(points: Vec<[f64; K]>) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(points.len()),
            points,
            root: None,
        };
        let mut indices = (0..tree.points.len()).collect::<Vec<usize>>();
        tree.root = tree.build(&mut indices, 0);
        tree
    }

    /// Number of points in the tree
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the tree holds no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The indexed points
    pub fn points(&self) -> &[[f64; K]] {
        &self.points
    }

    /// Index of, and distance to, the closest point
    pub fn nearest(&self, query: &[f64; K]) -> Option<(usize, f64)> {
        self.k_nearest(query, 1).into_iter().next()
    }

    /// Up to `k` closest points as (index, distance), nearest first
    pub fn k_nearest(&self, query: &[f64; K], k: usize) -> Vec<(usize, f64)> {
        let mut best: Vec<(f64, usize)> = Vec::with_capacity(k + 1);
        if k > 0 {
            self.search(self.root, query, k, &mut best);
        }
        best.into_iter().map(|(d2, i)| (i, d2.sqrt())).collect()
    }

    /// Nearest point for many queries at once, in parallel
    pub fn nearest_many(&self, queries: &[[f64; K]]) -> Vec<Option<(usize, f64)>> {
        queries.par_iter().map(|q| self.nearest(q)).collect()
    }

    /// `k` nearest points for many queries at once, in parallel
    pub fn k_nearest_many(&self, queries: &[[f64; K]], k: usize) -> Vec<Vec<(usize, f64)>> {
        queries.par_iter().map(|q| self.k_nearest(q, k)).collect()
    }

    fn build(&mut self, indices: &mut [usize], depth: usize) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let axis = depth % K;
        let mid = indices.len() / 2;
        let points = &self.points;
        indices.select_nth_unstable_by(mid, |a, b| points[*a][axis].total_cmp(&points[*b][axis]));

        let node = self.nodes.len();
        self.nodes.push(Node {
            point: indices[mid],
            axis,
            left: None,
            right: None,
        });

        let (lower, upper) = indices.split_at_mut(mid);
        let left = self.build(lower, depth + 1);
        let right = self.build(&mut upper[1..], depth + 1);
        self.nodes[node].left = left;
        self.nodes[node].right = right;
        Some(node)
    }

    fn search(&self, node: Option<usize>, query: &[f64; K], k: usize, best: &mut Vec<(f64, usize)>) {
        let Some(node) = node.map(|n| &self.nodes[n]) else {
            return;
        };

        let point = &self.points[node.point];
        let d2 = point
            .iter()
            .zip(query.iter())
            .map(|(p, q)| (p - q) * (p - q))
            .sum::<f64>();
        insert_candidate(best, k, (d2, node.point));

        let diff = query[node.axis] - point[node.axis];
        let (near, far) = match diff < 0.0 {
            true => (node.left, node.right),
            false => (node.right, node.left),
        };

        self.search(near, query, k, best);

        // equal distances must still be visited for the index tie-break
        let worst = best.last().map(|b| b.0).unwrap_or(f64::INFINITY);
        if best.len() < k || diff * diff <= worst {
            self.search(far, query, k, best);
        }
    }
}

fn insert_candidate(best: &mut Vec<(f64, usize)>, k: usize, candidate: (f64, usize)) {
    let position = best
        .iter()
        .position(|b| candidate.0 < b.0 || (candidate.0 == b.0 && candidate.1 < b.1))
        .unwrap_or(best.len());
    if position < k {
        best.insert(position, candidate);
        best.truncate(k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(points: &[[f64; 3]], query: &[f64; 3], k: usize) -> Vec<usize> {
        let mut all = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let d2: f64 = (0..3).map(|a| (p[a] - query[a]).powi(2)).sum();
                (d2, i)
            })
            .collect::<Vec<_>>();
        all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        all.into_iter().take(k).map(|(_, i)| i).collect()
    }

    #[test]
    fn matches_brute_force() {
        // deterministic scatter
        let points = (0..200)
            .map(|i| {
                let t = i as f64;
                [(t * 0.37).sin() * 10.0, (t * 0.11).cos() * 7.0, (t * 0.05) % 3.0]
            })
            .collect::<Vec<_>>();
        let tree = KdTree::new(points.clone());

        for q in [[0.0, 0.0, 0.0], [5.0, -3.0, 1.0], [-9.0, 6.5, 2.9]] {
            let found = tree.k_nearest(&q, 7).iter().map(|r| r.0).collect::<Vec<_>>();
            assert_eq!(found, brute_force(&points, &q, 7));
        }
    }

    #[test]
    fn ties_prefer_lower_index() {
        let tree = KdTree::new(vec![[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]]);
        let found = tree.k_nearest(&[0.0, 0.0], 4);
        assert_eq!(found.iter().map(|r| r.0).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_and_oversized_queries() {
        let tree: KdTree<2> = KdTree::new(Vec::new());
        assert!(tree.nearest(&[0.0, 0.0]).is_none());

        let tree = KdTree::new(vec![[0.0, 0.0], [1.0, 1.0]]);
        assert_eq!(tree.k_nearest(&[0.0, 0.0], 10).len(), 2);
        assert_eq!(tree.nearest_many(&[[1.1, 1.0]])[0].map(|r| r.0), Some(1));
    }
}
