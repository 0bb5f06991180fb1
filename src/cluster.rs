//! Splitting an arbitrary number of pointers into two clusters.
//!
//! When more than two pointers take part in a two-point transform, each
//! cluster's centroid stands in for one "virtual" pointer. The split is an
//! iterative two-means with deterministic seeding: the first two pointers seed
//! the clusters, then each round re-seeds from the points farthest from the
//! opposite centroid and reassigns every pointer to the nearer seed, until the
//! membership stops changing.
//!
//! Convergence of that loop is not proven for every configuration. Iterations
//! are capped at twice the number of points and the last assignment is kept
//! when the cap is hit.

use glam::Vec2;
use log::{debug, trace};

use crate::pointer::{self, PointSet, Pointer, PointerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterId {
    First,
    Second,
}

impl ClusterId {
    /// Maps a representative index (0 or 1) to a cluster.
    pub fn from_index(index: usize) -> Self {
        if index == 0 {
            ClusterId::First
        } else {
            ClusterId::Second
        }
    }
}

/// Two disjoint, non-empty groups of pointers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterPair {
    first: Vec<Pointer>,
    second: Vec<Pointer>,
}

impl ClusterPair {
    pub fn get(&self, id: ClusterId) -> &[Pointer] {
        match id {
            ClusterId::First => &self.first,
            ClusterId::Second => &self.second,
        }
    }

    pub fn first(&self) -> &[Pointer] {
        &self.first
    }

    pub fn second(&self) -> &[Pointer] {
        &self.second
    }

    pub fn center_position(&self, id: ClusterId) -> Option<Vec2> {
        pointer::center_position(self.get(id))
    }

    pub fn previous_center_position(&self, id: ClusterId) -> Option<Vec2> {
        pointer::previous_center_position(self.get(id))
    }

}

/// Lazily computed [`ClusterPair`] for a [`PointSet`].
///
/// The pair is cached against the set's revision, which is unique per set
/// content, and rebuilt on the next read after any change to the set, a
/// different set, or a new separation setting.
#[derive(Debug, Clone)]
pub struct Clusters {
    min_separation: f32,
    min_separation_squared: f32,
    pair: Option<ClusterPair>,
    computed_for: Option<u64>,
}

impl Default for Clusters {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clusters {
    /// `min_separation` is in screen pixels.
    pub fn new(min_separation: f32) -> Self {
        Self {
            min_separation,
            min_separation_squared: min_separation * min_separation,
            pair: None,
            computed_for: None,
        }
    }

    pub fn min_separation(&self) -> f32 {
        self.min_separation
    }

    pub fn set_min_separation(&mut self, pixels: f32) {
        self.min_separation = pixels;
        self.min_separation_squared = pixels * pixels;
        self.invalidate();
    }

    /// Forces a recompute on the next read.
    pub fn invalidate(&mut self) {
        self.computed_for = None;
    }

    /// Whether `points` currently splits into two valid clusters.
    pub fn has_clusters(&mut self, points: &PointSet) -> bool {
        self.clusters(points).is_some()
    }

    /// The current split, or `None` when callers must fall back to one point.
    pub fn clusters(&mut self, points: &PointSet) -> Option<&ClusterPair> {
        if self.computed_for != Some(points.revision()) {
            self.pair = partition(points.as_slice(), self.min_separation_squared);
            self.computed_for = Some(points.revision());
        }
        self.pair.as_ref()
    }

    pub fn center_position(&mut self, points: &PointSet, id: ClusterId) -> Option<Vec2> {
        self.clusters(points)?.center_position(id)
    }

    pub fn previous_center_position(&mut self, points: &PointSet, id: ClusterId) -> Option<Vec2> {
        self.clusters(points)?.previous_center_position(id)
    }
}

/// Splits `points` into two clusters.
///
/// Returns `None` for fewer than two points, when no pair of points is at
/// least `min_separation_squared` apart (squared pixels), or when the final
/// assignment leaves a cluster empty.
pub fn partition(points: &[Pointer], min_separation_squared: f32) -> Option<ClusterPair> {
    partition_with_cap(points, min_separation_squared, 2 * points.len())
}

/// [`partition`] with an explicit iteration cap (at least one round).
///
/// When the cap is hit before membership settles, the last assignment is
/// returned as is.
pub fn partition_with_cap(
    points: &[Pointer],
    min_separation_squared: f32,
    max_iterations: usize,
) -> Option<ClusterPair> {
    if !check_separation(points, min_separation_squared) {
        return None;
    }

    let mut pair = ClusterPair {
        first: vec![points[0]],
        second: vec![points[1]],
    };
    if points.len() == 2 {
        return Some(pair);
    }

    let mut seed_first = points[0].position;
    let mut seed_second = points[1].position;
    let mut fingerprint: Option<(Vec<PointerId>, Vec<PointerId>)> = None;
    let max_iterations = max_iterations.max(1);
    let mut converged = false;

    for iteration in 0..max_iterations {
        // an emptied cluster keeps last round's seed as its representative
        let center_first = pointer::center_position(&pair.first).unwrap_or(seed_first);
        let center_second = pointer::center_position(&pair.second).unwrap_or(seed_second);

        let (far_from_first, far_from_second) = farthest(points, center_first, center_second);

        if far_from_first.id == far_from_second.id {
            // one outlier is far from everything: give it its own cluster
            seed_first = (center_first + center_second) * 0.5;
            seed_second = far_from_first.position;
        } else {
            seed_first = far_from_second.position;
            seed_second = far_from_first.position;
        }

        pair.first.clear();
        pair.second.clear();
        // equidistant points stay in the first cluster
        for p in points {
            if p.position.distance_squared(seed_second) < p.position.distance_squared(seed_first) {
                pair.second.push(*p);
            } else {
                pair.first.push(*p);
            }
        }

        let current = (ids(&pair.first), ids(&pair.second));
        trace!(
            "clusters: iteration {iteration} first={:?} second={:?}",
            current.0,
            current.1
        );
        if fingerprint.as_ref() == Some(&current) {
            converged = true;
            break;
        }
        fingerprint = Some(current);
    }

    if !converged {
        debug!(
            "clusters: no fixed point after {max_iterations} iterations for {} points; keeping last split",
            points.len()
        );
    }

    if pair.first.is_empty() || pair.second.is_empty() {
        debug!("clusters: split left a cluster empty; falling back to one point");
        return None;
    }
    Some(pair)
}

/// True if at least one pair of points is `min_separation_squared` apart.
fn check_separation(points: &[Pointer], min_separation_squared: f32) -> bool {
    if points.len() < 2 {
        return false;
    }
    points.iter().enumerate().any(|(i, a)| {
        points[i + 1..]
            .iter()
            .any(|b| a.position.distance_squared(b.position) >= min_separation_squared)
    })
}

/// Points farthest from `center_first` and from `center_second`.
/// Ties keep the earliest point.
fn farthest(points: &[Pointer], center_first: Vec2, center_second: Vec2) -> (Pointer, Pointer) {
    let mut from_first = (f32::MIN, points[0]);
    let mut from_second = (f32::MIN, points[0]);
    for p in points {
        let d = center_first.distance_squared(p.position);
        if d > from_first.0 {
            from_first = (d, *p);
        }
        let d = center_second.distance_squared(p.position);
        if d > from_second.0 {
            from_second = (d, *p);
        }
    }
    (from_first.1, from_second.1)
}

fn ids(points: &[Pointer]) -> Vec<PointerId> {
    points.iter().map(|p| p.id).collect()
}
