//! Multi-pointer transform gestures.
//!
//! A [`TransformGesture`] receives every active pointer once per frame and
//! turns their movement into translation, rotation and scale deltas. Small
//! movements are buffered until they cross a physical distance threshold so
//! a gesture does not start on jitter; more than two pointers can be split
//! into two clusters that act as two virtual pointers.

pub mod accumulator;
pub mod cluster;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod logging;
pub mod pointer;
pub mod projection;
pub mod replay;
pub mod state;
pub mod trace;
pub mod tracker;
pub mod transform;

pub use error::{ProfileError, TraceError};
pub use gesture::{GestureConfig, GestureKind, TransformGesture};
pub use pointer::{PointSet, Pointer, PointerId};
pub use state::{GestureEvent, GestureState};
pub use transform::{TransformDelta, TransformType};
