//! Gesture states, pointer-count thresholds and the events a gesture emits.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureState {
    /// No pointers, or only pointers the gesture is ignoring.
    #[default]
    Idle,
    /// Pointers are down but nothing has moved past the threshold yet.
    Possible,
    Began,
    Changed,
    Ended,
    Cancelled,
    Failed,
}

impl GestureState {
    /// Continuous gestures finish in `Ended`; discrete ones call it recognized.
    pub const RECOGNIZED: GestureState = GestureState::Ended;

    /// Began or Changed.
    pub fn is_active(self) -> bool {
        matches!(self, GestureState::Began | GestureState::Changed)
    }

    /// States that reset to Idle on the next frame.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GestureState::Ended | GestureState::Cancelled | GestureState::Failed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GestureState::Idle => "idle",
            GestureState::Possible => "possible",
            GestureState::Began => "began",
            GestureState::Changed => "changed",
            GestureState::Ended => "ended",
            GestureState::Cancelled => "cancelled",
            GestureState::Failed => "failed",
        }
    }
}

impl fmt::Display for GestureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the pointer count sits relative to the configured range, and
/// whether the last change crossed one of its ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerCountState {
    #[default]
    InRange,
    TooFew,
    TooMany,
    /// Crossed the minimum in either direction.
    PassedMinThreshold,
    /// Crossed the maximum in either direction.
    PassedMaxThreshold,
    /// Crossed both ends in one change.
    PassedMinMaxThreshold,
}

/// Configured pointer range. Zero means the bound is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerCount {
    pub min: usize,
    pub max: usize,
}

impl PointerCount {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// `before` pointers were down and `added` more were pressed.
    pub fn pressed(&self, before: usize, added: usize) -> PointerCountState {
        let total = before + added;
        let mut state = PointerCountState::InRange;

        if self.min == 0 {
            if before == 0 {
                state = PointerCountState::PassedMinThreshold;
            }
        } else if before < self.min {
            state = if total >= self.min {
                PointerCountState::PassedMinThreshold
            } else {
                PointerCountState::TooFew
            };
        }

        if self.max > 0 {
            if before <= self.max {
                if total > self.max {
                    state = if state == PointerCountState::PassedMinThreshold {
                        PointerCountState::PassedMinMaxThreshold
                    } else {
                        PointerCountState::PassedMaxThreshold
                    };
                }
            } else {
                state = PointerCountState::TooMany;
            }
        }
        state
    }

    /// `count` pointers are down and some of them moved.
    pub fn updated(&self, count: usize) -> PointerCountState {
        if self.min > 0 && count < self.min {
            PointerCountState::TooFew
        } else if self.max > 0 && count > self.max {
            PointerCountState::TooMany
        } else {
            PointerCountState::InRange
        }
    }

    /// `before` pointers were down and `removed` of them were released.
    pub fn released(&self, before: usize, removed: usize) -> PointerCountState {
        let total = before.saturating_sub(removed);
        let mut state = PointerCountState::InRange;

        if self.min == 0 {
            if total == 0 {
                state = PointerCountState::PassedMinThreshold;
            }
        } else if before >= self.min {
            if total < self.min {
                state = PointerCountState::PassedMinThreshold;
            }
        } else {
            state = PointerCountState::TooFew;
        }

        if self.max > 0 && before > self.max {
            state = if total <= self.max {
                if state == PointerCountState::PassedMinThreshold {
                    PointerCountState::PassedMinMaxThreshold
                } else {
                    PointerCountState::PassedMaxThreshold
                }
            } else {
                PointerCountState::TooMany
            };
        }
        state
    }
}

/// Notifications returned from a gesture update, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GestureEvent {
    StateChanged {
        from: GestureState,
        to: GestureState,
    },
    /// The gesture entered Began. Read the delta for this frame.
    TransformStarted,
    /// The gesture entered or stayed in Changed.
    Transformed,
    /// The gesture entered Ended.
    TransformCompleted,
}
