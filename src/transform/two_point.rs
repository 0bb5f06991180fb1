use glam::Vec2;

use super::{TransformDelta, TransformType, translate_one_point, translate_two_points};
use crate::accumulator::{DeltaAccumulator, ScreenDistance};
use crate::cluster::{ClusterId, Clusters};
use crate::geometry;
use crate::pointer::{self, PointSet};
use crate::projection::TransformMath;

/// Translation, rotation and scaling from two representative points.
///
/// Without clustering the representatives are the first two pointers. With
/// clustering they are the centroids of the two [`Clusters`]; when the
/// pointers do not split into two clusters the centroid of all pointers acts
/// as the single representative.
#[derive(Debug, Clone)]
pub struct TwoPointTransform {
    clusters: Option<Clusters>,
    min_points_distance: ScreenDistance,
}

impl TwoPointTransform {
    /// Uses the first two pointers.
    pub fn pair(min_points_distance: ScreenDistance) -> Self {
        Self {
            clusters: None,
            min_points_distance,
        }
    }

    /// Uses two clusters separated by at least `min_separation` pixels.
    pub fn clustered(min_points_distance: ScreenDistance, min_separation: f32) -> Self {
        Self {
            clusters: Some(Clusters::new(min_separation)),
            min_points_distance,
        }
    }

    pub fn min_points_distance_mut(&mut self) -> &mut ScreenDistance {
        &mut self.min_points_distance
    }

    pub fn clusters_mut(&mut self) -> Option<&mut Clusters> {
        self.clusters.as_mut()
    }

    /// Number of representative points: 0, 1 or 2 when clustered.
    pub fn num_points(&mut self, points: &PointSet) -> usize {
        match self.clusters.as_mut() {
            Some(clusters) => {
                if clusters.has_clusters(points) {
                    2
                } else {
                    points.len().min(1)
                }
            }
            None => points.len(),
        }
    }

    /// Previous and current screen position of representative `index`.
    pub fn point(&mut self, points: &PointSet, index: usize) -> Option<(Vec2, Vec2)> {
        match self.clusters.as_mut() {
            Some(clusters) => {
                if let Some(pair) = clusters.clusters(points) {
                    let id = ClusterId::from_index(index);
                    Some((pair.previous_center_position(id)?, pair.center_position(id)?))
                } else {
                    Some((
                        pointer::previous_center_position(points.as_slice())?,
                        pointer::center_position(points.as_slice())?,
                    ))
                }
            }
            None => points.get(index).map(|p| (p.previous_position, p.position)),
        }
    }

    /// Screen position of the gesture: the midpoint of the representatives,
    /// or the single representative.
    pub fn screen_position(&mut self, points: &PointSet) -> Option<Vec2> {
        match self.num_points(points) {
            0 => None,
            1 => self.point(points, 0).map(|(_, new)| new),
            _ => {
                let (_, a) = self.point(points, 0)?;
                let (_, b) = self.point(points, 1)?;
                Some((a + b) * 0.5)
            }
        }
    }

    pub fn compute(
        &mut self,
        points: &PointSet,
        types: TransformType,
        accumulator: &mut DeltaAccumulator,
        math: &dyn TransformMath,
    ) -> TransformDelta {
        let translation_enabled = types.contains(TransformType::TRANSLATION);
        let rotation_enabled = types.contains(TransformType::ROTATION);
        let scaling_enabled = types.contains(TransformType::SCALING);
        let mut delta = TransformDelta::IDENTITY;

        let count = self.num_points(points);
        if count == 0 {
            return delta;
        }

        // one pointer or one cluster
        if count == 1 || (!rotation_enabled && !scaling_enabled) {
            if !translation_enabled {
                return delta;
            }
            if let Some((old, new)) = self.point(points, 0) {
                delta.position = translate_one_point(accumulator, math, old, new);
            }
            return delta;
        }

        // representatives are re-read every frame: the first two can change
        // when a pointer lifts off
        let (Some((old1, new1)), Some((old2, new2))) =
            (self.point(points, 0), self.point(points, 1))
        else {
            return delta;
        };

        let new_delta = new2 - new1;
        if new_delta.length_squared() > self.min_points_distance.pixels_squared() {
            if rotation_enabled {
                // how far both points moved across the old line between them
                let (d1, d2) = geometry::point_to_line_distance2(old1, old2, new1, new2);
                delta.rotation = accumulator
                    .rotation(d1 - d2, math.two_point_rotation(old1, old2, new1, new2));
            }

            if scaling_enabled {
                let displacement = new_delta.length() - old1.distance(old2);
                delta.scale = accumulator
                    .scaling(displacement, math.two_point_scaling(old1, old2, new1, new2));
            }

            if translation_enabled {
                delta.position = if delta.rotation == 0.0 && delta.scale == 1.0 {
                    translate_one_point(accumulator, math, old1, new1)
                } else {
                    translate_two_points(
                        &*accumulator,
                        math,
                        (old1, old2, new1),
                        delta.rotation,
                        delta.scale,
                    )
                };
            }
        } else if translation_enabled {
            // points too close to tell rotation from noise
            delta.position = translate_one_point(accumulator, math, old1, new1);
        }

        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::Pointer;
    use crate::projection::ScreenSpace;
    use glam::Vec3;

    fn frame(moves: &[((f32, f32), (f32, f32))]) -> PointSet {
        let mut set = PointSet::new();
        for (i, &((ox, oy), (nx, ny))) in moves.iter().enumerate() {
            set.add(Pointer::new(i as u32 + 1, Vec2::new(ox, oy)).moved_to(Vec2::new(nx, ny)));
        }
        set
    }

    fn accumulator(threshold: f32) -> DeltaAccumulator {
        DeltaAccumulator::new(ScreenDistance::from_pixels(threshold))
    }

    #[test]
    fn single_pointer_translation_snaps_and_goes_live() {
        let mut t = TwoPointTransform::pair(ScreenDistance::from_pixels(0.0));
        let mut acc = accumulator(1.0);

        let mut step = |from: (f32, f32), to: (f32, f32)| {
            t.compute(&frame(&[(from, to)]), TransformType::ALL, &mut acc, &ScreenSpace)
        };

        let d = step((0.0, 0.0), (0.0, 0.5));
        assert!(d.is_identity());

        let d = step((0.0, 0.5), (0.0, 1.2));
        assert!((d.position - Vec3::new(0.0, 1.2, 0.0)).length() < 1e-5);

        let d = step((0.0, 1.2), (0.0, 1.5));
        assert!((d.position - Vec3::new(0.0, 0.3, 0.0)).length() < 1e-5);
        assert!(acc.is_transforming());
    }

    #[test]
    fn spreading_two_pointers_scales() {
        let mut t = TwoPointTransform::pair(ScreenDistance::from_pixels(1.0));
        let mut acc = accumulator(5.0);
        let points = frame(&[((0.0, 0.0), (-5.0, 0.0)), ((100.0, 0.0), (105.0, 0.0))]);
        let d = t.compute(&points, TransformType::SCALING, &mut acc, &ScreenSpace);
        assert!((d.scale - 1.1).abs() < 1e-5);
        assert_eq!(d.rotation, 0.0);
        assert_eq!(d.position, Vec3::ZERO);
    }

    #[test]
    fn twisting_two_pointers_rotates() {
        let mut t = TwoPointTransform::pair(ScreenDistance::from_pixels(1.0));
        let mut acc = accumulator(5.0);
        let points = frame(&[((-50.0, 0.0), (0.0, -50.0)), ((50.0, 0.0), (0.0, 50.0))]);
        let types = TransformType::ROTATION | TransformType::TRANSLATION;
        let d = t.compute(&points, types, &mut acc, &ScreenSpace);
        assert!((d.rotation - 90.0).abs() < 1e-3);
        // pure rotation around the midpoint leaves no translation
        assert!(d.position.length() < 1e-3);
    }

    #[test]
    fn pointers_too_close_fall_back_to_translation() {
        let mut t = TwoPointTransform::pair(ScreenDistance::from_pixels(20.0));
        let mut acc = accumulator(1.0);
        let points = frame(&[((0.0, 0.0), (5.0, 0.0)), ((10.0, 0.0), (25.0, 0.0))]);
        let d = t.compute(&points, TransformType::ALL, &mut acc, &ScreenSpace);
        assert_eq!(d.rotation, 0.0);
        assert_eq!(d.scale, 1.0);
        assert!((d.position - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn clustered_uses_cluster_centroids() {
        let mut t = TwoPointTransform::clustered(ScreenDistance::from_pixels(1.0), 10.0);
        let mut acc = accumulator(5.0);
        // two fingers on the left, one on the right, all spreading apart
        let points = frame(&[
            ((0.0, 0.0), (-10.0, 0.0)),
            ((0.0, 10.0), (-10.0, 10.0)),
            ((100.0, 5.0), (110.0, 5.0)),
        ]);
        assert_eq!(t.num_points(&points), 2);
        let d = t.compute(&points, TransformType::SCALING, &mut acc, &ScreenSpace);
        assert!((d.scale - 1.2).abs() < 1e-4);
    }

    #[test]
    fn clustered_follows_rebuilt_frames() {
        let mut t = TwoPointTransform::clustered(ScreenDistance::from_pixels(1.0), 10.0);
        let mut acc = accumulator(5.0);
        let first = frame(&[
            ((0.0, 0.0), (-10.0, 0.0)),
            ((0.0, 10.0), (-10.0, 10.0)),
            ((100.0, 5.0), (110.0, 5.0)),
        ]);
        let d = t.compute(&first, TransformType::SCALING, &mut acc, &ScreenSpace);
        assert!((d.scale - 1.2).abs() < 1e-4);

        // same ids and mutation count, new positions
        let second = frame(&[
            ((-10.0, 0.0), (-20.0, 0.0)),
            ((-10.0, 10.0), (-20.0, 10.0)),
            ((110.0, 5.0), (120.0, 5.0)),
        ]);
        let d = t.compute(&second, TransformType::SCALING, &mut acc, &ScreenSpace);
        assert!((d.scale - 140.0 / 120.0).abs() < 1e-4);
    }

    #[test]
    fn clustered_without_clusters_uses_overall_centroid() {
        let mut t = TwoPointTransform::clustered(ScreenDistance::from_pixels(1.0), 50.0);
        let mut acc = accumulator(1.0);
        let points = frame(&[((0.0, 0.0), (4.0, 0.0)), ((2.0, 0.0), (6.0, 0.0))]);
        assert_eq!(t.num_points(&points), 1);
        assert_eq!(t.screen_position(&points), Some(Vec2::new(5.0, 0.0)));
        let d = t.compute(&points, TransformType::ALL, &mut acc, &ScreenSpace);
        assert!((d.position - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn nothing_enabled_yields_identity() {
        let mut t = TwoPointTransform::pair(ScreenDistance::from_pixels(1.0));
        let mut acc = accumulator(1.0);
        let points = frame(&[((0.0, 0.0), (40.0, 0.0))]);
        let d = t.compute(&points, TransformType::NONE, &mut acc, &ScreenSpace);
        assert!(d.is_identity());
        let d = t.compute(&PointSet::new(), TransformType::ALL, &mut acc, &ScreenSpace);
        assert!(d.is_identity());
    }
}
