//! Active pointers and the ordered set a gesture works on.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Source of [`PointSet`] revisions, shared by every set in the process.
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

pub type PointerId = u32;

/// Snapshot of one contact for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub id: PointerId,
    pub position: Vec2,
    pub previous_position: Vec2,
}

impl Pointer {
    /// A pointer that has not moved yet.
    pub fn new(id: PointerId, position: Vec2) -> Self {
        Self {
            id,
            position,
            previous_position: position,
        }
    }

    /// The same pointer one frame later.
    pub fn moved_to(self, position: Vec2) -> Self {
        Self {
            id: self.id,
            position,
            previous_position: self.position,
        }
    }

    pub fn delta(&self) -> Vec2 {
        self.position - self.previous_position
    }

    pub fn has_moved(&self) -> bool {
        self.position != self.previous_position
    }
}

/// Ordered set of pointers with unique ids.
///
/// Every mutation gives the set a fresh [`PointSet::revision`], unique across
/// all sets, so derived data such as [`crate::cluster::Clusters`] can tell both
/// a changed set and a different set apart by revision alone. Only empty sets
/// share revision 0.
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    points: Vec<Pointer>,
    revision: u64,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `pointer` unless its id is already present. Returns whether it was added.
    pub fn add(&mut self, pointer: Pointer) -> bool {
        if self.contains(pointer.id) {
            return false;
        }
        self.points.push(pointer);
        self.touch();
        true
    }

    pub fn remove(&mut self, id: PointerId) -> Option<Pointer> {
        let index = self.points.iter().position(|p| p.id == id)?;
        let removed = self.points.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn remove_all(&mut self) {
        self.points.clear();
        self.touch();
    }

    /// Replaces the positions of an already present pointer.
    pub fn update(&mut self, pointer: Pointer) -> bool {
        let Some(slot) = self.points.iter_mut().find(|p| p.id == pointer.id) else {
            return false;
        };
        if *slot != pointer {
            *slot = pointer;
            self.touch();
        }
        true
    }

    pub fn contains(&self, id: PointerId) -> bool {
        self.points.iter().any(|p| p.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Pointer> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&Pointer> {
        self.points.first()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pointer> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Pointer] {
        &self.points
    }

    pub fn ids(&self) -> Vec<PointerId> {
        self.points.iter().map(|p| p.id).collect()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = NEXT_REVISION.fetch_add(1, Ordering::Relaxed);
    }
}

/// Centroid of current positions, `None` for an empty slice.
pub fn center_position(points: &[Pointer]) -> Option<Vec2> {
    mean(points.iter().map(|p| p.position), points.len())
}

/// Centroid of previous positions, `None` for an empty slice.
pub fn previous_center_position(points: &[Pointer]) -> Option<Vec2> {
    mean(points.iter().map(|p| p.previous_position), points.len())
}

fn mean(positions: impl Iterator<Item = Vec2>, count: usize) -> Option<Vec2> {
    if count == 0 {
        return None;
    }
    Some(positions.sum::<Vec2>() / count as f32)
}

/// Debug check that a frame's pointer list carries no duplicate ids.
pub(crate) fn has_unique_ids(pointers: &[Pointer]) -> bool {
    pointers
        .iter()
        .enumerate()
        .all(|(i, p)| pointers[i + 1..].iter().all(|q| q.id != p.id))
}
