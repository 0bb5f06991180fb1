//! Drives a recorded trace through the tracker and a gesture.

use glam::{Vec2, Vec3};
use log::debug;
use serde::Serialize;

use crate::config::Profile;
use crate::gesture::TransformGesture;
use crate::state::{GestureEvent, GestureState};
use crate::trace::TraceFrame;
use crate::tracker::PointerTracker;
use crate::transform::{TransformDelta, TransformType};

/// What the gesture did on one frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub t: u64,
    pub pointers: usize,
    pub state: GestureState,
    pub delta: TransformDelta,
    pub mask: TransformType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<GestureEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_position: Option<Vec2>,
}

/// Totals over a whole replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaySummary {
    pub frames: usize,
    pub started: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub failed: usize,
    pub translation: Vec3,
    pub rotation: f32,
    pub scale: f32,
}

pub struct Replay {
    tracker: PointerTracker,
    gesture: TransformGesture,
    summary: ReplaySummary,
}

impl Replay {
    pub fn new(profile: &Profile) -> Self {
        let mut tracker = PointerTracker::new();
        tracker.set_raw_mapping(profile.raw_mapping());
        Self::with_gesture(tracker, profile.build_gesture())
    }

    pub fn with_gesture(tracker: PointerTracker, gesture: TransformGesture) -> Self {
        Self {
            tracker,
            gesture,
            summary: ReplaySummary {
                scale: 1.0,
                ..ReplaySummary::default()
            },
        }
    }

    pub fn gesture(&self) -> &TransformGesture {
        &self.gesture
    }

    pub fn step(&mut self, frame: &TraceFrame) -> FrameReport {
        let summary = self.tracker.frame(frame.t, &frame.contacts);
        let events = self.gesture.update(&summary.pointers);
        let delta = self.gesture.delta();

        let totals = &mut self.summary;
        totals.frames += 1;
        totals.translation += delta.position;
        totals.rotation += delta.rotation;
        totals.scale *= delta.scale;
        for event in &events {
            match event {
                GestureEvent::TransformStarted => totals.started += 1,
                GestureEvent::TransformCompleted => totals.completed += 1,
                GestureEvent::StateChanged { to: GestureState::Cancelled, .. } => {
                    totals.cancelled += 1
                }
                GestureEvent::StateChanged { to: GestureState::Failed, .. } => totals.failed += 1,
                _ => {}
            }
        }
        if !events.is_empty() {
            debug!("t={} {:?}", frame.t, events);
        }

        FrameReport {
            t: frame.t,
            pointers: summary.active_count,
            state: self.gesture.state(),
            delta,
            mask: self.gesture.transform_mask(),
            events,
            screen_position: self.gesture.screen_position(),
        }
    }

    pub fn summary(&self) -> &ReplaySummary {
        &self.summary
    }
}

/// Replays every frame and returns the reports with the totals.
pub fn replay(profile: &Profile, frames: &[TraceFrame]) -> (Vec<FrameReport>, ReplaySummary) {
    let mut replay = Replay::new(profile);
    let reports = frames.iter().map(|f| replay.step(f)).collect();
    (reports, replay.summary().clone())
}
