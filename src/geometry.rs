//! 2D helpers shared by the transform strategies.

use glam::Vec2;

/// Lengths below this are treated as zero.
pub const EPSILON: f32 = 1e-5;

/// Signed distance from `point` to the infinite line through `start` and `end`.
///
/// The sign tells which side of the line the point is on. A degenerate line
/// (both ends at the same spot) yields 0.
pub fn point_to_line_distance(start: Vec2, end: Vec2, point: Vec2) -> f32 {
    point_to_line_distance2(start, end, point, point).0
}

/// Same as [`point_to_line_distance`] for two points against one line.
pub fn point_to_line_distance2(start: Vec2, end: Vec2, point1: Vec2, point2: Vec2) -> (f32, f32) {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length < EPSILON {
        return (0.0, 0.0);
    }
    let c = end.x * start.y - end.y * start.x;
    (
        (dy * point1.x - dx * point1.y + c) / length,
        (dy * point2.x - dx * point2.y + c) / length,
    )
}

/// Rotates `v` counter-clockwise by `degrees`.
pub fn rotate(v: Vec2, degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Signed angle in degrees turning `from` onto `to`, in `(-180, 180]`.
pub fn signed_angle(from: Vec2, to: Vec2) -> f32 {
    if from.length_squared() < EPSILON * EPSILON || to.length_squared() < EPSILON * EPSILON {
        return 0.0;
    }
    from.perp_dot(to).atan2(from.dot(to)).to_degrees()
}

/// `new_length / old_length`, or exactly 1 when the old length is ~0.
pub fn scale_ratio(new_length: f32, old_length: f32) -> f32 {
    if old_length < EPSILON {
        return 1.0;
    }
    new_length / old_length
}

/// Rotates and scales `point` around `center`.
pub fn scale_and_rotate(point: Vec2, center: Vec2, degrees: f32, scale: f32) -> Vec2 {
    let mut delta = point - center;
    if degrees != 0.0 {
        delta = rotate(delta, degrees);
    }
    if scale != 0.0 {
        delta *= scale;
    }
    center + delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn distance_sign_follows_side_of_line() {
        let start = Vec2::new(0.0, 0.0);
        let end = Vec2::new(10.0, 0.0);
        let above = point_to_line_distance(start, end, Vec2::new(3.0, 2.0));
        let below = point_to_line_distance(start, end, Vec2::new(3.0, -2.0));
        assert!(close(above.abs(), 2.0));
        assert!(close(below.abs(), 2.0));
        assert!(above.signum() != below.signum());
    }

    #[test]
    fn degenerate_line_has_zero_distance() {
        let p = Vec2::new(4.0, 4.0);
        assert_eq!(point_to_line_distance(p, p, Vec2::new(10.0, 0.0)), 0.0);
    }

    #[test]
    fn signed_angle_is_counter_clockwise_positive() {
        assert!(close(signed_angle(Vec2::X, Vec2::Y), 90.0));
        assert!(close(signed_angle(Vec2::Y, Vec2::X), -90.0));
        // crossing the negative x axis must not wrap to ~360
        let a = Vec2::new(-1.0, 0.01);
        let b = Vec2::new(-1.0, -0.01);
        assert!(signed_angle(a, b).abs() < 2.0);
    }

    #[test]
    fn scale_ratio_guards_zero_length() {
        assert_eq!(scale_ratio(5.0, 0.0), 1.0);
        assert!(close(scale_ratio(5.0, 2.5), 2.0));
    }

    #[test]
    fn rotate_quarter_turn() {
        let r = rotate(Vec2::new(1.0, 0.0), 90.0);
        assert!(close(r.x, 0.0) && close(r.y, 1.0));
    }
}
