//! Per-frame transform computation.
//!
//! [`OnePointTransform`] rotates and scales around a fixed pivot using the
//! first pointer or the centroid of all pointers. [`TwoPointTransform`] uses
//! two pointers, or the centroids of two pointer clusters, and falls back to
//! one-point translation when only one representative point is available.

mod one_point;
mod two_point;

pub use one_point::{OnePointTransform, PinnedSource};
pub use two_point::TwoPointTransform;

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use glam::{Vec2, Vec3};
use serde::{Serialize, Serializer};

use crate::accumulator::{DeltaAccumulator, TranslationStep};
use crate::projection::TransformMath;

/// Set of transform kinds: translation, rotation, scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransformType(u8);

impl TransformType {
    pub const NONE: TransformType = TransformType(0);
    pub const TRANSLATION: TransformType = TransformType(1 << 0);
    pub const SCALING: TransformType = TransformType(1 << 1);
    pub const ROTATION: TransformType = TransformType(1 << 2);
    pub const ALL: TransformType = TransformType(0b111);

    const NAMES: [(TransformType, &'static str); 3] = [
        (TransformType::TRANSLATION, "translation"),
        (TransformType::ROTATION, "rotation"),
        (TransformType::SCALING, "scaling"),
    ];

    pub fn from_bits_truncate(bits: u8) -> Self {
        TransformType(bits & Self::ALL.0)
    }

    /// Parses one name: `translation`, `rotation` or `scaling`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(t, _)| *t)
    }

    pub fn contains(self, other: TransformType) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn without(self, other: TransformType) -> Self {
        TransformType(self.0 & !other.0)
    }

    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(t, _)| self.contains(*t))
            .map(|(_, n)| *n)
            .collect()
    }
}

impl BitOr for TransformType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        TransformType(self.0 | rhs.0)
    }
}

impl BitOrAssign for TransformType {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for TransformType {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        TransformType(self.0 & rhs.0)
    }
}

impl fmt::Display for TransformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

impl Serialize for TransformType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

/// One frame's transform: translation, rotation in degrees, scale ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransformDelta {
    pub position: Vec3,
    pub rotation: f32,
    pub scale: f32,
}

impl TransformDelta {
    pub const IDENTITY: TransformDelta = TransformDelta {
        position: Vec3::ZERO,
        rotation: 0.0,
        scale: 1.0,
    };

    /// Which parts differ from identity.
    pub fn mask(&self) -> TransformType {
        let mut mask = TransformType::NONE;
        if self.position != Vec3::ZERO {
            mask |= TransformType::TRANSLATION;
        }
        if self.rotation != 0.0 {
            mask |= TransformType::ROTATION;
        }
        if self.scale != 1.0 {
            mask |= TransformType::SCALING;
        }
        mask
    }

    pub fn is_identity(&self) -> bool {
        self.mask().is_empty()
    }
}

impl Default for TransformDelta {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Buffered translation of a single point.
pub(crate) fn translate_one_point(
    accumulator: &mut DeltaAccumulator,
    math: &dyn TransformMath,
    old: Vec2,
    new: Vec2,
) -> Vec3 {
    match accumulator.translation(new - old) {
        TranslationStep::Buffered => Vec3::ZERO,
        TranslationStep::Live => math.one_point_translation(old, new),
        TranslationStep::Snapped(total) => math.one_point_translation(new - total, new),
    }
}

/// Translation of the first of two points, net of rotation and scale.
///
/// Only reached once rotation or scaling reported a change this frame, so the
/// shared latch is already set and nothing is buffered.
pub(crate) fn translate_two_points(
    accumulator: &DeltaAccumulator,
    math: &dyn TransformMath,
    (old1, old2, new1): (Vec2, Vec2, Vec2),
    rotation: f32,
    scale: f32,
) -> Vec3 {
    debug_assert!(accumulator.is_transforming());
    math.two_point_translation(old1, old2, new1, rotation, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_and_test() {
        let t = TransformType::TRANSLATION | TransformType::SCALING;
        assert!(t.contains(TransformType::TRANSLATION));
        assert!(!t.contains(TransformType::ROTATION));
        assert!(TransformType::ALL.contains(t));
        assert_eq!(t.without(TransformType::TRANSLATION), TransformType::SCALING);
        assert_eq!(TransformType::from_bits_truncate(0xff), TransformType::ALL);
        assert_eq!(t.to_string(), "translation|scaling");
        assert_eq!(TransformType::NONE.to_string(), "none");
    }

    #[test]
    fn names_parse() {
        assert_eq!(TransformType::from_name(" Rotation "), Some(TransformType::ROTATION));
        assert_eq!(TransformType::from_name("shear"), None);
    }

    #[test]
    fn delta_mask_tracks_non_identity_parts() {
        assert!(TransformDelta::IDENTITY.is_identity());
        let d = TransformDelta {
            rotation: 3.0,
            ..TransformDelta::IDENTITY
        };
        assert_eq!(d.mask(), TransformType::ROTATION);
        let d = TransformDelta {
            position: Vec3::X,
            scale: 2.0,
            ..TransformDelta::IDENTITY
        };
        assert_eq!(d.mask(), TransformType::TRANSLATION | TransformType::SCALING);
    }

    #[test]
    fn mask_serializes_as_names() {
        let json = serde_json::to_string(&(TransformType::ROTATION | TransformType::TRANSLATION))
            .expect("serialize");
        assert_eq!(json, r#"["translation","rotation"]"#);
    }
}
