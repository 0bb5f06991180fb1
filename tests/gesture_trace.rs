use glam::{Vec2, Vec3};

use touchxform::projection::{OrthographicProjector, Plane, PlaneSpace};
use touchxform::tracker::{ContactSample, PointerTracker};
use touchxform::{
    GestureConfig, GestureEvent, GestureKind, GestureState, TransformGesture, TransformType,
};

/// Feeds absolute contact positions through a tracker into a gesture.
struct Driver {
    tracker: PointerTracker,
    gesture: TransformGesture,
    t: u64,
}

impl Driver {
    fn new(gesture: TransformGesture) -> Self {
        Self {
            tracker: PointerTracker::new(),
            gesture,
            t: 0,
        }
    }

    fn frame(&mut self, contacts: &[(u32, f32, f32)]) -> Vec<GestureEvent> {
        let samples: Vec<ContactSample> = contacts
            .iter()
            .map(|&(id, x, y)| ContactSample { id, x, y })
            .collect();
        let summary = self.tracker.frame(self.t, &samples);
        self.t += 16;
        self.gesture.update(&summary.pointers)
    }
}

/// 254 dpi is 100 pixels per centimetre, so centimetre settings read as
/// hundredths of pixels.
fn config(kind: GestureKind, threshold_px: f32) -> GestureConfig {
    GestureConfig {
        kind,
        dpi: 254.0,
        screen_transform_threshold_cm: threshold_px / 100.0,
        min_points_distance_cm: 0.1,
        min_cluster_separation_cm: 0.5,
        ..GestureConfig::default()
    }
}

fn close(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-3
}

#[test]
fn single_pointer_snaps_to_buffered_translation() {
    let mut d = Driver::new(TransformGesture::new(config(GestureKind::Screen, 1.0)));

    d.frame(&[(1, 0.0, 0.0)]);
    d.frame(&[(1, 0.0, 0.5)]);
    assert_eq!(d.gesture.state(), GestureState::Possible);
    assert!(d.gesture.delta().is_identity());
    assert!(!d.gesture.is_transforming());

    d.frame(&[(1, 0.0, 1.2)]);
    assert_eq!(d.gesture.state(), GestureState::Began);
    assert!(d.gesture.is_transforming());
    assert!(close(d.gesture.delta_position(), Vec3::new(0.0, 1.2, 0.0)));

    d.frame(&[(1, 0.0, 1.5)]);
    assert_eq!(d.gesture.state(), GestureState::Changed);
    assert!(close(d.gesture.delta_position(), Vec3::new(0.0, 0.3, 0.0)));
}

#[test]
fn two_finger_twist_rotates_in_place() {
    let mut d = Driver::new(TransformGesture::new(config(GestureKind::Screen, 5.0)));
    d.frame(&[(1, -50.0, 0.0), (2, 50.0, 0.0)]);
    let events = d.frame(&[(1, 0.0, -50.0), (2, 0.0, 50.0)]);

    assert!(events.contains(&GestureEvent::TransformStarted));
    assert!((d.gesture.delta_rotation() - 90.0).abs() < 1e-3);
    assert!(d.gesture.delta_position().length() < 1e-3);
    assert!(d.gesture.transform_mask().contains(TransformType::ROTATION));
    assert_eq!(d.gesture.rotation_axis(), Vec3::Z);
    assert_eq!(d.gesture.screen_position(), Some(Vec2::ZERO));
}

#[test]
fn clustered_hands_scale_by_cluster_centroids() {
    let mut d = Driver::new(TransformGesture::new(config(GestureKind::Clustered, 5.0)));

    // two fingers on the left, one on the right
    d.frame(&[(1, 0.0, 0.0), (2, 0.0, 20.0), (3, 200.0, 10.0)]);
    assert_eq!(d.gesture.state(), GestureState::Possible);

    d.frame(&[(1, -10.0, 0.0), (2, -10.0, 20.0), (3, 210.0, 10.0)]);
    assert_eq!(d.gesture.state(), GestureState::Began);
    assert!((d.gesture.delta_scale() - 1.1).abs() < 1e-4);
    assert!(d.gesture.delta_rotation().abs() < 1e-4);
    assert_eq!(d.gesture.screen_position(), Some(Vec2::new(100.0, 10.0)));

    // a fourth finger joining does not restart the gesture
    let events = d.frame(&[(1, -10.0, 0.0), (2, -10.0, 20.0), (3, 210.0, 10.0), (4, -5.0, 10.0)]);
    assert!(events.is_empty());
    assert_eq!(d.gesture.state(), GestureState::Began);

    let events = d.frame(&[]);
    assert_eq!(
        events,
        vec![
            GestureEvent::StateChanged {
                from: GestureState::Began,
                to: GestureState::Ended
            },
            GestureEvent::TransformCompleted
        ]
    );
}

#[test]
fn clustered_fingers_too_close_pan_together() {
    let mut d = Driver::new(TransformGesture::new(config(GestureKind::Clustered, 5.0)));
    d.frame(&[(1, 0.0, 0.0), (2, 10.0, 0.0), (3, 5.0, 8.0)]);
    d.frame(&[(1, 20.0, 0.0), (2, 30.0, 0.0), (3, 25.0, 8.0)]);
    assert_eq!(d.gesture.state(), GestureState::Began);
    assert_eq!(d.gesture.transform_mask(), TransformType::TRANSLATION);
    assert!(close(d.gesture.delta_position(), Vec3::new(20.0, 0.0, 0.0)));
}

#[test]
fn plane_math_reports_world_translation() {
    let math = PlaneSpace::new(
        OrthographicProjector {
            screen_origin: Vec2::ZERO,
            units_per_pixel: 0.01,
        },
        Plane::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z),
    );
    let gesture = TransformGesture::with_math(config(GestureKind::Screen, 5.0), Box::new(math));
    let mut d = Driver::new(gesture);

    d.frame(&[(1, 0.0, 0.0)]);
    d.frame(&[(1, 100.0, 0.0)]);
    assert_eq!(d.gesture.state(), GestureState::Began);
    assert!(close(d.gesture.delta_position(), Vec3::new(1.0, 0.0, 0.0)));
}

#[test]
fn pointers_held_after_completion_are_ignored() {
    let mut cfg = config(GestureKind::Screen, 5.0);
    cfg.min_pointers = 2;
    let mut d = Driver::new(TransformGesture::new(cfg));

    d.frame(&[(1, 0.0, 0.0), (2, 100.0, 0.0)]);
    d.frame(&[(1, 0.0, 30.0), (2, 100.0, 30.0)]);
    assert_eq!(d.gesture.state(), GestureState::Began);

    // lifting one finger drops below the minimum
    d.frame(&[(2, 100.0, 30.0)]);
    assert_eq!(d.gesture.state(), GestureState::Ended);

    // the remaining finger plus a new one do not form a gesture
    d.frame(&[(2, 100.0, 40.0)]);
    assert_eq!(d.gesture.state(), GestureState::Idle);
    d.frame(&[(2, 100.0, 50.0), (3, 0.0, 0.0)]);
    assert_eq!(d.gesture.state(), GestureState::Idle);
    assert_eq!(d.gesture.points().len(), 1);

    // once it lifts, two fresh fingers start a new episode
    d.frame(&[(3, 0.0, 0.0), (4, 100.0, 0.0)]);
    assert_eq!(d.gesture.state(), GestureState::Possible);
}
