//! The transform gesture: pointer bookkeeping, the state machine and the
//! per-frame delta computation tied together.
//!
//! Each frame the caller hands [`TransformGesture::update`] the full list of
//! active pointers. The gesture diffs it against what it already tracks and
//! handles releases, then presses, then movement, the same order a pointer
//! manager dispatches them in.

use std::fmt;

use glam::{Vec2, Vec3};
use log::{debug, trace};

use crate::accumulator::{self, DeltaAccumulator, ScreenDistance};
use crate::pointer::{self, PointSet, Pointer, PointerId};
use crate::projection::{ScreenSpace, TransformMath};
use crate::state::{GestureEvent, GestureState, PointerCount, PointerCountState};
use crate::transform::{OnePointTransform, TransformDelta, TransformType, TwoPointTransform};

pub const DEFAULT_SCREEN_TRANSFORM_THRESHOLD_CM: f32 = 0.1;
pub const DEFAULT_MIN_POINTS_DISTANCE_CM: f32 = 0.5;
pub const DEFAULT_MIN_CLUSTER_SEPARATION_CM: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureKind {
    /// Two pointers, or one for translation.
    #[default]
    Screen,
    /// Any number of pointers split into two clusters.
    Clustered,
    /// One pointer rotating and scaling around a fixed pivot.
    Pinned { pivot: Vec3 },
    /// The centroid of all pointers rotating and scaling around a fixed pivot.
    ClusteredPinned { pivot: Vec3 },
}

impl GestureKind {
    pub fn name(&self) -> &'static str {
        match self {
            GestureKind::Screen => "screen",
            GestureKind::Clustered => "clustered",
            GestureKind::Pinned { .. } => "pinned",
            GestureKind::ClusteredPinned { .. } => "clustered_pinned",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    pub kind: GestureKind,
    pub types: TransformType,
    /// Zero leaves the bound unset.
    pub min_pointers: usize,
    pub max_pointers: usize,
    pub dpi: f32,
    pub screen_transform_threshold_cm: f32,
    pub min_points_distance_cm: f32,
    pub min_cluster_separation_cm: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            kind: GestureKind::Screen,
            types: TransformType::ALL,
            min_pointers: 0,
            max_pointers: 0,
            dpi: accumulator::DEFAULT_DPI,
            screen_transform_threshold_cm: DEFAULT_SCREEN_TRANSFORM_THRESHOLD_CM,
            min_points_distance_cm: DEFAULT_MIN_POINTS_DISTANCE_CM,
            min_cluster_separation_cm: DEFAULT_MIN_CLUSTER_SEPARATION_CM,
        }
    }
}

enum Strategy {
    OnePoint(OnePointTransform),
    TwoPoint(TwoPointTransform),
}

pub struct TransformGesture {
    config: GestureConfig,
    points: PointSet,
    /// Pointers held across a terminal state; skipped until released.
    ignored: Vec<PointerId>,
    strategy: Strategy,
    math: Box<dyn TransformMath>,
    accumulator: DeltaAccumulator,
    pointer_count: PointerCount,
    count_state: PointerCountState,
    state: GestureState,
    delta: TransformDelta,
    transform_mask: TransformType,
    events: Vec<GestureEvent>,
}

impl fmt::Debug for TransformGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformGesture")
            .field("kind", &self.config.kind)
            .field("state", &self.state)
            .field("pointers", &self.points.ids())
            .field("ignored", &self.ignored)
            .field("delta", &self.delta)
            .finish_non_exhaustive()
    }
}

impl TransformGesture {
    /// A gesture measuring in screen pixels.
    pub fn new(config: GestureConfig) -> Self {
        Self::with_math(config, Box::new(ScreenSpace))
    }

    pub fn with_math(config: GestureConfig, math: Box<dyn TransformMath>) -> Self {
        let dots_per_cm = accumulator::dots_per_centimeter(config.dpi);
        let min_points_distance = ScreenDistance::new(config.min_points_distance_cm, dots_per_cm);
        let strategy = match config.kind {
            GestureKind::Screen => Strategy::TwoPoint(TwoPointTransform::pair(min_points_distance)),
            GestureKind::Clustered => Strategy::TwoPoint(TwoPointTransform::clustered(
                min_points_distance,
                config.min_cluster_separation_cm * dots_per_cm,
            )),
            GestureKind::Pinned { pivot } => Strategy::OnePoint(OnePointTransform::new(pivot)),
            GestureKind::ClusteredPinned { pivot } => {
                Strategy::OnePoint(OnePointTransform::centroid(pivot))
            }
        };
        let threshold = ScreenDistance::new(config.screen_transform_threshold_cm, dots_per_cm);

        Self {
            pointer_count: PointerCount::new(config.min_pointers, config.max_pointers),
            config,
            points: PointSet::new(),
            ignored: Vec::new(),
            strategy,
            math,
            accumulator: DeltaAccumulator::new(threshold),
            count_state: PointerCountState::InRange,
            state: GestureState::Idle,
            delta: TransformDelta::IDENTITY,
            transform_mask: TransformType::NONE,
            events: Vec::new(),
        }
    }

    /// Feeds one frame of active pointers and returns the events it raised.
    ///
    /// Pointer ids must be unique within the frame.
    pub fn update(&mut self, pointers: &[Pointer]) -> Vec<GestureEvent> {
        debug_assert!(
            pointer::has_unique_ids(pointers),
            "duplicate pointer ids in frame"
        );

        if self.state.is_terminal() {
            self.finish_episode();
            self.set_state(GestureState::Idle);
        }
        self.delta = TransformDelta::IDENTITY;
        self.transform_mask = TransformType::NONE;

        self.ignored.retain(|id| pointers.iter().any(|p| p.id == *id));

        let released: Vec<PointerId> = self
            .points
            .iter()
            .filter(|p| !pointers.iter().any(|q| q.id == p.id))
            .map(|p| p.id)
            .collect();
        if !released.is_empty() {
            self.pointers_released(&released);
        }

        let mut moved = false;
        let mut pressed = Vec::new();
        for p in pointers {
            if self.ignored.contains(&p.id) {
                continue;
            }
            if self.points.contains(p.id) {
                moved |= p.has_moved();
                self.points.update(*p);
            } else {
                pressed.push(Pointer::new(p.id, p.position));
            }
        }
        if !pressed.is_empty() {
            self.pointers_pressed(&pressed);
        }
        if moved {
            self.pointers_updated();
        }

        std::mem::take(&mut self.events)
    }

    /// Another gesture took over: Began or Changed become Cancelled.
    pub fn cancel(&mut self) -> Vec<GestureEvent> {
        if self.state.is_active() {
            self.set_state(GestureState::Cancelled);
        }
        std::mem::take(&mut self.events)
    }

    /// Gives up before starting: Possible becomes Failed.
    pub fn fail(&mut self) -> Vec<GestureEvent> {
        if self.state == GestureState::Possible {
            self.set_state(GestureState::Failed);
        }
        std::mem::take(&mut self.events)
    }

    /// Drops every pointer and returns to Idle without raising events.
    /// Pointers still held are ignored until released.
    pub fn reset(&mut self) {
        self.finish_episode();
        self.state = GestureState::Idle;
        self.delta = TransformDelta::IDENTITY;
        self.transform_mask = TransformType::NONE;
        self.events.clear();
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn pointer_count_state(&self) -> PointerCountState {
        self.count_state
    }

    /// This frame's delta. Identity unless the frame changed something.
    pub fn delta(&self) -> TransformDelta {
        self.delta
    }

    pub fn delta_position(&self) -> Vec3 {
        self.delta.position
    }

    pub fn delta_rotation(&self) -> f32 {
        self.delta.rotation
    }

    pub fn delta_scale(&self) -> f32 {
        self.delta.scale
    }

    /// Which parts of [`Self::delta`] changed this frame.
    pub fn transform_mask(&self) -> TransformType {
        self.transform_mask
    }

    pub fn rotation_axis(&self) -> Vec3 {
        self.math.rotation_axis()
    }

    pub fn is_transforming(&self) -> bool {
        self.accumulator.is_transforming()
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Enabled transform types this gesture can actually produce.
    pub fn types(&self) -> TransformType {
        match self.strategy {
            Strategy::OnePoint(_) => OnePointTransform::supported(self.config.types),
            Strategy::TwoPoint(_) => self.config.types,
        }
    }

    /// Screen position the gesture is acting at, `None` with no pointers.
    pub fn screen_position(&mut self) -> Option<Vec2> {
        match &mut self.strategy {
            Strategy::OnePoint(t) => t.point(&self.points).map(|(_, new)| new),
            Strategy::TwoPoint(t) => t.screen_position(&self.points),
        }
    }

    pub fn set_types(&mut self, types: TransformType) {
        self.config.types = types;
    }

    pub fn set_pointer_range(&mut self, min: usize, max: usize) {
        self.config.min_pointers = min;
        self.config.max_pointers = max;
        self.pointer_count = PointerCount::new(min, max);
    }

    pub fn set_dpi(&mut self, dpi: f32) {
        self.config.dpi = dpi;
        self.update_thresholds();
    }

    pub fn set_screen_transform_threshold(&mut self, centimeters: f32) {
        self.config.screen_transform_threshold_cm = centimeters;
        self.update_thresholds();
    }

    pub fn set_min_points_distance(&mut self, centimeters: f32) {
        self.config.min_points_distance_cm = centimeters;
        self.update_thresholds();
    }

    pub fn set_min_cluster_separation(&mut self, centimeters: f32) {
        self.config.min_cluster_separation_cm = centimeters;
        self.update_thresholds();
    }

    /// Screen threshold in pixels at the current DPI.
    pub fn screen_transform_pixels(&self) -> f32 {
        self.accumulator.threshold().pixels()
    }

    fn update_thresholds(&mut self) {
        let dots_per_cm = accumulator::dots_per_centimeter(self.config.dpi);
        *self.accumulator.threshold_mut() =
            ScreenDistance::new(self.config.screen_transform_threshold_cm, dots_per_cm);
        if let Strategy::TwoPoint(t) = &mut self.strategy {
            *t.min_points_distance_mut() =
                ScreenDistance::new(self.config.min_points_distance_cm, dots_per_cm);
            if let Some(clusters) = t.clusters_mut() {
                clusters.set_min_separation(self.config.min_cluster_separation_cm * dots_per_cm);
            }
        }
    }

    fn pointers_pressed(&mut self, pressed: &[Pointer]) {
        let before = self.points.len();
        for p in pressed {
            self.points.add(*p);
        }
        self.count_state = self.pointer_count.pressed(before, pressed.len());
        trace!(
            "pressed {:?}: {} -> {} pointers, {:?}",
            pressed.iter().map(|p| p.id).collect::<Vec<_>>(),
            before,
            self.points.len(),
            self.count_state
        );

        match self.count_state {
            PointerCountState::PassedMaxThreshold | PointerCountState::PassedMinMaxThreshold => {
                match self.state {
                    GestureState::Began | GestureState::Changed => {
                        self.set_state(GestureState::Ended)
                    }
                    GestureState::Idle | GestureState::Possible => {
                        self.set_state(GestureState::Failed)
                    }
                    _ => {}
                }
            }
            PointerCountState::PassedMinThreshold if self.state == GestureState::Idle => {
                self.set_state(GestureState::Possible);
            }
            _ => {}
        }
    }

    fn pointers_released(&mut self, released: &[PointerId]) {
        let before = self.points.len();
        for id in released {
            self.points.remove(*id);
        }
        self.count_state = self.pointer_count.released(before, released.len());
        trace!(
            "released {released:?}: {before} -> {} pointers, {:?}",
            self.points.len(),
            self.count_state
        );

        let crossed_min = matches!(
            self.count_state,
            PointerCountState::PassedMinThreshold | PointerCountState::PassedMinMaxThreshold
        );
        let finished = crossed_min || self.points.is_empty();
        match self.state {
            GestureState::Began | GestureState::Changed if finished => {
                self.set_state(GestureState::Ended);
            }
            GestureState::Possible if finished => {
                self.set_state(GestureState::Idle);
            }
            _ => {}
        }
    }

    fn pointers_updated(&mut self) {
        self.count_state = self.pointer_count.updated(self.points.len());
        if self.count_state != PointerCountState::InRange {
            return;
        }
        if !matches!(
            self.state,
            GestureState::Possible | GestureState::Began | GestureState::Changed
        ) {
            return;
        }

        let types = self.types();
        let delta = match &mut self.strategy {
            Strategy::OnePoint(t) => {
                t.compute(&self.points, types, &mut self.accumulator, self.math.as_ref())
            }
            Strategy::TwoPoint(t) => {
                t.compute(&self.points, types, &mut self.accumulator, self.math.as_ref())
            }
        };

        let mask = delta.mask();
        if mask.is_empty() {
            return;
        }
        self.delta = delta;
        self.transform_mask = mask;

        match self.state {
            GestureState::Possible => self.set_state(GestureState::Began),
            _ => self.set_state(GestureState::Changed),
        }
    }

    fn set_state(&mut self, to: GestureState) {
        let from = self.state;
        // Changed repeats every frame; everything else fires once
        if from == to && to != GestureState::Changed {
            return;
        }
        self.state = to;

        if from != to {
            debug!("{} gesture: {from} -> {to}", self.config.kind.name());
            self.events.push(GestureEvent::StateChanged { from, to });
        }
        match to {
            GestureState::Possible => self.accumulator.reset(),
            GestureState::Began => self.events.push(GestureEvent::TransformStarted),
            GestureState::Changed => self.events.push(GestureEvent::Transformed),
            GestureState::Ended => self.events.push(GestureEvent::TransformCompleted),
            _ => {}
        }
    }

    /// Forgets the episode's pointers and buffers.
    fn finish_episode(&mut self) {
        for id in self.points.ids() {
            if !self.ignored.contains(&id) {
                self.ignored.push(id);
            }
        }
        self.points.remove_all();
        self.accumulator.reset();
        self.count_state = PointerCountState::InRange;
    }
}
