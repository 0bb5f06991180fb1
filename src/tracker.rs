//! Per-contact tracking and frame snapshots.
//!
//! Raw contact samples only carry an id and a position. The tracker keeps
//! the last position of every live contact so each frame can hand the
//! gesture a [`Pointer`] with both current and previous positions.

use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::pointer::{Pointer, PointerId};

/// One contact as reported by the input source for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactSample {
    pub id: PointerId,
    pub x: f32,
    pub y: f32,
}

/// Linear mapping from raw device units to screen pixels on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMapping {
    x_min: f32,
    x_max: f32,
    y_min: f32,
    y_max: f32,
    size: Vec2,
}

impl RawMapping {
    /// Raw `[x_min, x_max]` × `[y_min, y_max]` maps onto `size` pixels.
    pub fn new(x_min: f32, x_max: f32, y_min: f32, y_max: f32, size: Vec2) -> Self {
        Self {
            x_min,
            x_max: x_max.max(x_min + 1.0),
            y_min,
            y_max: y_max.max(y_min + 1.0),
            size,
        }
    }

    pub fn to_pixels(&self, x: f32, y: f32) -> Vec2 {
        let nx = ((x - self.x_min) / (self.x_max - self.x_min)).clamp(0.0, 1.0);
        let ny = ((y - self.y_min) / (self.y_max - self.y_min)).clamp(0.0, 1.0);
        Vec2::new(nx, ny) * self.size
    }
}

#[derive(Debug, Clone)]
struct ContactState {
    id: PointerId,
    position: Vec2,
    previous_position: Vec2,
    t_first_ms: u64,
    travelled: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactSnapshot {
    pub id: PointerId,
    /// Path length since the contact went down, in pixels.
    pub travelled: f32,
    pub age_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameSummary {
    pub timestamp_ms: u64,
    pub active_count: usize,
    pub centroid: Vec2,
    /// Average distance of the contacts from their centroid.
    pub span: f32,
    #[serde(skip)]
    pub pointers: Vec<Pointer>,
    pub contacts: Vec<ContactSnapshot>,
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    contacts: Vec<ContactState>,
    mapping: Option<RawMapping>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples are pixels unless a mapping is set.
    pub fn set_raw_mapping(&mut self, mapping: Option<RawMapping>) {
        self.mapping = mapping;
    }

    /// Advances to the next frame. Contacts missing from `samples` are
    /// released, unknown ids are new contacts.
    pub fn frame(&mut self, timestamp_ms: u64, samples: &[ContactSample]) -> FrameSummary {
        self.contacts.retain(|c| samples.iter().any(|s| s.id == c.id));

        let mut seen: Vec<PointerId> = Vec::with_capacity(samples.len());
        for sample in samples {
            if seen.contains(&sample.id) {
                warn!("contact {} reported twice in one frame; keeping the first", sample.id);
                continue;
            }
            seen.push(sample.id);

            let position = match &self.mapping {
                Some(m) => m.to_pixels(sample.x, sample.y),
                None => Vec2::new(sample.x, sample.y),
            };
            match self.contacts.iter_mut().find(|c| c.id == sample.id) {
                Some(c) => {
                    c.previous_position = c.position;
                    c.travelled += position.distance(c.position);
                    c.position = position;
                }
                None => self.contacts.push(ContactState {
                    id: sample.id,
                    position,
                    previous_position: position,
                    t_first_ms: timestamp_ms,
                    travelled: 0.0,
                }),
            }
        }

        let active_count = self.contacts.len();
        let (centroid, span) = if active_count > 0 {
            let centroid =
                self.contacts.iter().map(|c| c.position).sum::<Vec2>() / active_count as f32;
            let span = self
                .contacts
                .iter()
                .map(|c| c.position.distance(centroid))
                .sum::<f32>()
                / active_count as f32;
            (centroid, span)
        } else {
            (Vec2::ZERO, 0.0)
        };

        FrameSummary {
            timestamp_ms,
            active_count,
            centroid,
            span,
            pointers: self
                .contacts
                .iter()
                .map(|c| Pointer {
                    id: c.id,
                    position: c.position,
                    previous_position: c.previous_position,
                })
                .collect(),
            contacts: self
                .contacts
                .iter()
                .map(|c| ContactSnapshot {
                    id: c.id,
                    travelled: c.travelled,
                    age_ms: timestamp_ms.saturating_sub(c.t_first_ms),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: PointerId, x: f32, y: f32) -> ContactSample {
        ContactSample { id, x, y }
    }

    #[test]
    fn previous_positions_follow_frames() {
        let mut tracker = PointerTracker::new();
        let f = tracker.frame(0, &[sample(1, 10.0, 10.0)]);
        assert_eq!(f.pointers[0].previous_position, Vec2::new(10.0, 10.0));

        let f = tracker.frame(16, &[sample(1, 13.0, 14.0), sample(2, 0.0, 0.0)]);
        assert_eq!(f.active_count, 2);
        assert_eq!(f.pointers[0].previous_position, Vec2::new(10.0, 10.0));
        assert_eq!(f.pointers[0].position, Vec2::new(13.0, 14.0));
        assert_eq!(f.contacts[0].travelled, 5.0);
        assert_eq!(f.contacts[0].age_ms, 16);
        assert!(!f.pointers[1].has_moved());
    }

    #[test]
    fn missing_contacts_are_released() {
        let mut tracker = PointerTracker::new();
        tracker.frame(0, &[sample(1, 0.0, 0.0), sample(2, 4.0, 0.0)]);
        let f = tracker.frame(10, &[sample(2, 4.0, 0.0)]);
        assert_eq!(f.active_count, 1);
        assert_eq!(f.pointers[0].id, 2);

        // same id coming back is a new contact
        let f = tracker.frame(20, &[sample(2, 4.0, 0.0), sample(1, 50.0, 0.0)]);
        assert_eq!(f.pointers[1].id, 1);
        assert!(!f.pointers[1].has_moved());
        assert_eq!(f.contacts[1].age_ms, 0);
    }

    #[test]
    fn centroid_and_span() {
        let mut tracker = PointerTracker::new();
        let f = tracker.frame(0, &[sample(1, 0.0, 0.0), sample(2, 10.0, 0.0)]);
        assert_eq!(f.centroid, Vec2::new(5.0, 0.0));
        assert_eq!(f.span, 5.0);
        let f = tracker.frame(1, &[]);
        assert_eq!(f.active_count, 0);
        assert_eq!(f.span, 0.0);
    }

    #[test]
    fn raw_units_map_to_pixels() {
        let mut tracker = PointerTracker::new();
        let screen = Vec2::new(1920.0, 1080.0);
        tracker.set_raw_mapping(Some(RawMapping::new(0.0, 4096.0, 0.0, 4096.0, screen)));
        let f = tracker.frame(0, &[sample(1, 2048.0, 4096.0), sample(2, -20.0, 0.0)]);
        assert_eq!(f.pointers[0].position, Vec2::new(960.0, 1080.0));
        assert_eq!(f.pointers[1].position, Vec2::ZERO);
    }

    #[test]
    fn duplicate_ids_keep_first_sample() {
        let mut tracker = PointerTracker::new();
        let f = tracker.frame(0, &[sample(3, 1.0, 1.0), sample(3, 9.0, 9.0)]);
        assert_eq!(f.active_count, 1);
        assert_eq!(f.pointers[0].position, Vec2::ONE);
    }
}
