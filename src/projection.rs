//! How screen movement turns into transform deltas.
//!
//! [`TransformMath`] is picked once when a gesture is built:
//! [`ScreenSpace`] works directly in pixels, [`PlaneSpace`] casts every screen
//! position onto a working plane through a [`ScreenProjector`] and measures
//! there.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::{self, EPSILON};

/// An infinite plane through `origin` facing `normal` (unit length).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Vec3,
    pub normal: Vec3,
}

impl Plane {
    /// A zero `normal` falls back to +Z.
    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            origin,
            normal: if normal == Vec3::ZERO { Vec3::Z } else { normal },
        }
    }

    /// Closest point on the plane to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * (point - self.origin).dot(self.normal)
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }
}

/// Maps between screen pixels and world space. Supplied by whatever owns the
/// camera; the engine only calls it.
pub trait ScreenProjector {
    /// World position where the view ray through `screen` meets `plane`.
    fn project_to(&self, screen: Vec2, plane: &Plane) -> Vec3;

    /// Screen position of a world point.
    fn project_from(&self, world: Vec3) -> Vec2;
}

/// Camera looking down -Z with a fixed pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicProjector {
    /// Screen pixel that sits over the world origin.
    pub screen_origin: Vec2,
    pub units_per_pixel: f32,
}

impl Default for OrthographicProjector {
    fn default() -> Self {
        Self {
            screen_origin: Vec2::ZERO,
            units_per_pixel: 1.0,
        }
    }
}

impl ScreenProjector for OrthographicProjector {
    fn project_to(&self, screen: Vec2, plane: &Plane) -> Vec3 {
        let start = ((screen - self.screen_origin) * self.units_per_pixel).extend(0.0);
        let direction = Vec3::NEG_Z;
        let facing = direction.dot(plane.normal);
        if facing.abs() < EPSILON {
            // plane seen edge-on
            return plane.closest_point(start);
        }
        let t = (plane.origin - start).dot(plane.normal) / facing;
        start + direction * t
    }

    fn project_from(&self, world: Vec3) -> Vec2 {
        if self.units_per_pixel.abs() < EPSILON {
            return self.screen_origin;
        }
        world.truncate() / self.units_per_pixel + self.screen_origin
    }
}

/// Per-frame transform math. Rotations are in degrees, scales are ratios,
/// translations are in the strategy's output space.
pub trait TransformMath {
    /// Axis that rotation deltas turn around.
    fn rotation_axis(&self) -> Vec3;

    /// Screen position of a pivot given in output space.
    fn pivot_to_screen(&self, pivot: Vec3) -> Vec2;

    /// Rotation of the line through two points between frames.
    fn two_point_rotation(&self, old1: Vec2, old2: Vec2, new1: Vec2, new2: Vec2) -> f32;

    /// Change in distance between two points, as a ratio.
    fn two_point_scaling(&self, old1: Vec2, old2: Vec2, new1: Vec2, new2: Vec2) -> f32;

    /// Rotation of one point around a fixed pivot.
    fn pinned_rotation(&self, pivot: Vec3, old: Vec2, new: Vec2) -> f32;

    /// Change in one point's distance from a fixed pivot, as a ratio.
    fn pinned_scaling(&self, pivot: Vec3, old: Vec2, new: Vec2) -> f32;

    fn one_point_translation(&self, old: Vec2, new: Vec2) -> Vec3;

    /// Translation left over once `rotation` and `scale` are applied to the
    /// first point.
    fn two_point_translation(
        &self,
        old1: Vec2,
        old2: Vec2,
        new1: Vec2,
        rotation: f32,
        scale: f32,
    ) -> Vec3;
}

/// Math in screen pixels. Translations come out as `(dx, dy, 0)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenSpace;

impl TransformMath for ScreenSpace {
    fn rotation_axis(&self) -> Vec3 {
        Vec3::Z
    }

    fn pivot_to_screen(&self, pivot: Vec3) -> Vec2 {
        pivot.truncate()
    }

    fn two_point_rotation(&self, old1: Vec2, old2: Vec2, new1: Vec2, new2: Vec2) -> f32 {
        geometry::signed_angle(old2 - old1, new2 - new1)
    }

    fn two_point_scaling(&self, old1: Vec2, old2: Vec2, new1: Vec2, new2: Vec2) -> f32 {
        geometry::scale_ratio(new1.distance(new2), old1.distance(old2))
    }

    fn pinned_rotation(&self, pivot: Vec3, old: Vec2, new: Vec2) -> f32 {
        let center = pivot.truncate();
        geometry::signed_angle(old - center, new - center)
    }

    fn pinned_scaling(&self, pivot: Vec3, old: Vec2, new: Vec2) -> f32 {
        let center = pivot.truncate();
        geometry::scale_ratio(new.distance(center), old.distance(center))
    }

    fn one_point_translation(&self, old: Vec2, new: Vec2) -> Vec3 {
        (new - old).extend(0.0)
    }

    fn two_point_translation(
        &self,
        old1: Vec2,
        old2: Vec2,
        new1: Vec2,
        rotation: f32,
        scale: f32,
    ) -> Vec3 {
        let moved = geometry::scale_and_rotate(old1, (old1 + old2) * 0.5, rotation, scale);
        (new1 - moved).extend(0.0)
    }
}

/// Math on a world plane. The plane origin is the pivot two-point
/// translations rotate and scale around.
#[derive(Debug, Clone)]
pub struct PlaneSpace<P> {
    projector: P,
    plane: Plane,
}

impl<P: ScreenProjector> PlaneSpace<P> {
    pub fn new(projector: P, plane: Plane) -> Self {
        Self { projector, plane }
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    fn project(&self, screen: Vec2) -> Vec3 {
        self.projector.project_to(screen, &self.plane)
    }

    fn signed_angle(&self, from: Vec3, to: Vec3) -> f32 {
        if from.length_squared() < EPSILON * EPSILON || to.length_squared() < EPSILON * EPSILON {
            return 0.0;
        }
        let angle = from.angle_between(to).to_degrees();
        if from.cross(to).dot(self.plane.normal) < 0.0 {
            -angle
        } else {
            angle
        }
    }

    fn scaled_rotated(&self, point: Vec2, rotation: f32, scale: f32) -> Vec3 {
        let mut delta = self.project(point) - self.plane.origin;
        if rotation != 0.0 {
            delta = Quat::from_axis_angle(self.plane.normal, rotation.to_radians()) * delta;
        }
        if scale != 0.0 {
            delta *= scale;
        }
        self.plane.origin + delta
    }
}

impl<P: ScreenProjector> TransformMath for PlaneSpace<P> {
    fn rotation_axis(&self) -> Vec3 {
        self.plane.normal
    }

    fn pivot_to_screen(&self, pivot: Vec3) -> Vec2 {
        self.projector.project_from(pivot)
    }

    fn two_point_rotation(&self, old1: Vec2, old2: Vec2, new1: Vec2, new2: Vec2) -> f32 {
        let old = self.project(old2) - self.project(old1);
        let new = self.project(new2) - self.project(new1);
        self.signed_angle(old, new)
    }

    fn two_point_scaling(&self, old1: Vec2, old2: Vec2, new1: Vec2, new2: Vec2) -> f32 {
        let old = self.project(old2) - self.project(old1);
        let new = self.project(new2) - self.project(new1);
        geometry::scale_ratio(new.length(), old.length())
    }

    fn pinned_rotation(&self, pivot: Vec3, old: Vec2, new: Vec2) -> f32 {
        self.signed_angle(self.project(old) - pivot, self.project(new) - pivot)
    }

    fn pinned_scaling(&self, pivot: Vec3, old: Vec2, new: Vec2) -> f32 {
        let old = self.project(old) - pivot;
        let new = self.project(new) - pivot;
        geometry::scale_ratio(new.length(), old.length())
    }

    fn one_point_translation(&self, old: Vec2, new: Vec2) -> Vec3 {
        self.project(new) - self.project(old)
    }

    fn two_point_translation(
        &self,
        old1: Vec2,
        _old2: Vec2,
        new1: Vec2,
        rotation: f32,
        scale: f32,
    ) -> Vec3 {
        self.project(new1) - self.scaled_rotated(old1, rotation, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn plane_space(units_per_pixel: f32) -> PlaneSpace<OrthographicProjector> {
        PlaneSpace::new(
            OrthographicProjector {
                screen_origin: Vec2::ZERO,
                units_per_pixel,
            },
            Plane::default(),
        )
    }

    #[test]
    fn orthographic_projection_round_trips_on_ground_plane() {
        let projector = OrthographicProjector {
            screen_origin: Vec2::new(100.0, 50.0),
            units_per_pixel: 0.5,
        };
        let plane = Plane::new(Vec3::new(0.0, 0.0, 3.0), Vec3::Z);
        let world = projector.project_to(Vec2::new(120.0, 70.0), &plane);
        assert!(close(world.x, 10.0) && close(world.y, 10.0) && close(world.z, 3.0));
        let back = projector.project_from(world);
        assert!(close(back.x, 120.0) && close(back.y, 70.0));
    }

    #[test]
    fn edge_on_plane_uses_closest_point() {
        let projector = OrthographicProjector::default();
        let plane = Plane::new(Vec3::ZERO, Vec3::X);
        let world = projector.project_to(Vec2::new(5.0, 2.0), &plane);
        assert!(close(world.x, 0.0) && close(world.y, 2.0));
    }

    #[test]
    fn screen_two_point_rotation_and_scale() {
        let math = ScreenSpace;
        let old1 = Vec2::new(0.0, 0.0);
        let old2 = Vec2::new(10.0, 0.0);
        let new1 = Vec2::new(0.0, 0.0);
        let new2 = Vec2::new(0.0, 20.0);
        assert!(close(math.two_point_rotation(old1, old2, new1, new2), 90.0));
        assert!(close(math.two_point_scaling(old1, old2, new1, new2), 2.0));
    }

    #[test]
    fn scaling_from_coincident_points_is_neutral() {
        let p = Vec2::new(3.0, 3.0);
        assert_eq!(ScreenSpace.two_point_scaling(p, p, p, Vec2::new(9.0, 9.0)), 1.0);
        assert_eq!(ScreenSpace.pinned_scaling(p.extend(0.0), p, Vec2::ONE), 1.0);
        assert_eq!(plane_space(1.0).two_point_scaling(p, p, p, Vec2::ONE), 1.0);
    }

    #[test]
    fn plane_math_matches_screen_math_on_ground_plane() {
        let plane = plane_space(1.0);
        let old1 = Vec2::new(0.0, 0.0);
        let old2 = Vec2::new(10.0, 0.0);
        let new1 = Vec2::new(1.0, 1.0);
        let new2 = Vec2::new(8.0, 9.0);
        assert!(close(
            plane.two_point_rotation(old1, old2, new1, new2),
            ScreenSpace.two_point_rotation(old1, old2, new1, new2)
        ));
        assert!(close(
            plane.two_point_scaling(old1, old2, new1, new2),
            ScreenSpace.two_point_scaling(old1, old2, new1, new2)
        ));
        assert!(close(
            plane.pinned_rotation(Vec3::ZERO, old2, new2),
            ScreenSpace.pinned_rotation(Vec3::ZERO, old2, new2)
        ));
    }

    #[test]
    fn plane_translation_is_scaled_by_pixel_size() {
        let plane = plane_space(0.1);
        let t = plane.one_point_translation(Vec2::ZERO, Vec2::new(10.0, -20.0));
        assert!(close(t.x, 1.0) && close(t.y, -2.0) && close(t.z, 0.0));
    }

    #[test]
    fn screen_two_point_translation_removes_rotation() {
        let math = ScreenSpace;
        let old1 = Vec2::new(-10.0, 0.0);
        let old2 = Vec2::new(10.0, 0.0);
        // quarter turn around the midpoint moves old1 to (0, -10)
        let t = math.two_point_translation(old1, old2, Vec2::new(0.0, -10.0), 90.0, 1.0);
        assert!(t.length() < 1e-3);
        let t = math.two_point_translation(old1, old2, Vec2::new(5.0, -10.0), 90.0, 1.0);
        assert!(close(t.x, 5.0) && close(t.y, 0.0));
    }

    #[test]
    fn plane_rotation_axis_is_plane_normal() {
        let math = PlaneSpace::new(
            OrthographicProjector::default(),
            Plane::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0)),
        );
        assert_eq!(math.rotation_axis(), Vec3::Z);
        assert_eq!(ScreenSpace.rotation_axis(), Vec3::Z);
    }
}
