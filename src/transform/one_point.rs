use glam::{Vec2, Vec3};

use super::{TransformDelta, TransformType};
use crate::accumulator::DeltaAccumulator;
use crate::geometry;
use crate::pointer::{self, PointSet};
use crate::projection::TransformMath;

/// Which screen point a pinned transform follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinnedSource {
    #[default]
    FirstPointer,
    /// Centroid of every active pointer.
    Centroid,
}

/// Rotation and scaling of one screen point around a fixed pivot.
///
/// Translation is never produced; the pivot stays where it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnePointTransform {
    pub pivot: Vec3,
    pub source: PinnedSource,
}

impl OnePointTransform {
    /// Follows the first pointer.
    pub fn new(pivot: Vec3) -> Self {
        Self {
            pivot,
            source: PinnedSource::FirstPointer,
        }
    }

    /// Follows the centroid of all pointers.
    pub fn centroid(pivot: Vec3) -> Self {
        Self {
            pivot,
            source: PinnedSource::Centroid,
        }
    }

    /// Previous and current screen position of the followed point.
    pub fn point(&self, points: &PointSet) -> Option<(Vec2, Vec2)> {
        match self.source {
            PinnedSource::FirstPointer => points.first().map(|p| (p.previous_position, p.position)),
            PinnedSource::Centroid => Some((
                pointer::previous_center_position(points.as_slice())?,
                pointer::center_position(points.as_slice())?,
            )),
        }
    }

    /// Transform types this strategy can produce out of `types`.
    pub fn supported(types: TransformType) -> TransformType {
        types.without(TransformType::TRANSLATION)
    }

    pub fn compute(
        &self,
        points: &PointSet,
        types: TransformType,
        accumulator: &mut DeltaAccumulator,
        math: &dyn TransformMath,
    ) -> TransformDelta {
        let rotation_enabled = types.contains(TransformType::ROTATION);
        let scaling_enabled = types.contains(TransformType::SCALING);
        if !rotation_enabled && !scaling_enabled {
            return TransformDelta::IDENTITY;
        }
        // not cached from last frame: the followed point can change between frames
        let Some((old, new)) = self.point(points) else {
            return TransformDelta::IDENTITY;
        };

        let center = math.pivot_to_screen(self.pivot);
        let mut delta = TransformDelta::IDENTITY;

        if rotation_enabled {
            // movement across the line (center, old)
            let displacement = geometry::point_to_line_distance(center, old, new);
            delta.rotation =
                accumulator.rotation(displacement, math.pinned_rotation(self.pivot, old, new));
        }

        if scaling_enabled {
            let displacement = new.distance(center) - old.distance(center);
            delta.scale =
                accumulator.scaling(displacement, math.pinned_scaling(self.pivot, old, new));
        }

        delta
    }
}
