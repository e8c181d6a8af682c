//! Hit-test bound shapes and the calculators that produce them.
//!
//! Calculators take local geometry plus a [`ManipulatorState`] and return a
//! world-space bound. They never validate their inputs: a zero-length axis
//! simply yields a degenerate bound that no ray will hit.

use std::fmt;
use std::sync::{Arc, Weak};

use bevy::math::Ray3d;
use bevy::prelude::*;

use crate::math::{
    closest_point_ray_segment, ray_cone_intersection, ray_cylinder_intersection,
    ray_hollow_cylinder_intersection, ray_obb_intersection, ray_quad_intersection,
    ray_sphere_intersection, transform_direction_no_scaling, transform_point,
};
use crate::types::{CameraState, ManipulatorState};

/// Samples taken along each spline segment when picking.
const SPLINE_STEPS_PER_SEGMENT: usize = 16;

/// A curve owned outside the manipulator system, sampled lazily for picking.
pub trait Spline: Send + Sync {
    /// Number of segments making up the curve.
    fn segment_count(&self) -> usize;

    /// Local-space position at `fraction` (0..=1) along `segment`.
    fn position(&self, segment: usize, fraction: f32) -> Vec3;

    /// Whether the last vertex connects back to the first.
    fn is_closed(&self) -> bool;
}

/// Piecewise-linear spline through a list of vertices.
#[derive(Debug, Clone, Default)]
pub struct LinearSpline {
    vertices: Vec<Vec3>,
    closed: bool,
}

impl LinearSpline {
    /// Open spline through `vertices`.
    pub fn new(vertices: Vec<Vec3>) -> Self {
        Self {
            vertices,
            closed: false,
        }
    }

    /// Closed loop through `vertices`.
    pub fn closed(vertices: Vec<Vec3>) -> Self {
        Self {
            vertices,
            closed: true,
        }
    }

    /// Vertices in local space.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }
}

impl Spline for LinearSpline {
    fn segment_count(&self) -> usize {
        match self.vertices.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    fn position(&self, segment: usize, fraction: f32) -> Vec3 {
        let n = self.vertices.len();
        if n == 0 {
            return Vec3::ZERO;
        }
        let start = self.vertices[segment % n];
        let end = self.vertices[(segment + 1) % n];
        start.lerp(end, fraction.clamp(0.0, 1.0))
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Where a ray passes closest to a spline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineHit {
    /// Closest point on the spline in world space.
    pub position: Vec3,
    /// Distance along the ray to the closest approach.
    pub distance: f32,
    /// Separation between the ray and the spline at that point.
    pub separation: f32,
}

/// Closest approach of `ray` to `spline` placed in the world by `transform`.
///
/// Returns `None` for curves without segments.
pub fn closest_spline_hit(spline: &dyn Spline, transform: &Transform, ray: &Ray3d) -> Option<SplineHit> {
    let mut best: Option<SplineHit> = None;
    for segment in 0..spline.segment_count() {
        let mut previous = transform.transform_point(spline.position(segment, 0.0));
        for step in 1..=SPLINE_STEPS_PER_SEGMENT {
            let fraction = step as f32 / SPLINE_STEPS_PER_SEGMENT as f32;
            let next = transform.transform_point(spline.position(segment, fraction));
            let (distance, position, separation) = closest_point_ray_segment(ray, previous, next);
            if best.is_none_or(|b| separation < b.separation) {
                best = Some(SplineHit {
                    position,
                    distance,
                    separation,
                });
            }
            previous = next;
        }
    }
    best
}

/// Four world-space corners in winding order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundShapeQuad {
    /// Anchor corner.
    pub corner1: Vec3,
    /// Anchor plus the first edge.
    pub corner2: Vec3,
    /// Corner opposite the anchor.
    pub corner3: Vec3,
    /// Anchor plus the second edge.
    pub corner4: Vec3,
}

impl BoundShapeQuad {
    /// Corners in winding order.
    pub fn corners(&self) -> [Vec3; 4] {
        [self.corner1, self.corner2, self.corner3, self.corner4]
    }
}

/// Line segment picked within `width` of its centre line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundShapeLineSegment {
    /// Start point.
    pub start: Vec3,
    /// End point.
    pub end: Vec3,
    /// Pick tolerance around the segment.
    pub width: f32,
}

/// Solid cone with its base disc at `base`, apex `height` along `axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundShapeCone {
    /// Centre of the base disc.
    pub base: Vec3,
    /// Direction from base to apex.
    pub axis: Vec3,
    /// Distance from base to apex.
    pub height: f32,
    /// Radius of the base disc.
    pub radius: f32,
}

/// Oriented box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundShapeBox {
    /// Box centre.
    pub center: Vec3,
    /// Box orientation.
    pub orientation: Quat,
    /// Half size along each local axis.
    pub half_extents: Vec3,
}

/// Capped cylinder starting at `base`, extending `height` along `axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundShapeCylinder {
    /// Centre of the bottom cap.
    pub base: Vec3,
    /// Direction from the bottom cap to the top cap.
    pub axis: Vec3,
    /// Distance between the caps.
    pub height: f32,
    /// Cylinder radius.
    pub radius: f32,
}

/// Sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundShapeSphere {
    /// Sphere centre.
    pub center: Vec3,
    /// Sphere radius.
    pub radius: f32,
}

/// Ring of `major_radius` around `axis` with tube thickness `minor_radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundShapeTorus {
    /// Ring centre.
    pub center: Vec3,
    /// Axis the ring is wrapped around.
    pub axis: Vec3,
    /// Ring radius.
    pub major_radius: f32,
    /// Tube thickness.
    pub minor_radius: f32,
}

/// Reference to an externally owned curve. The curve is only sampled when
/// the bound is tested.
#[derive(Clone)]
pub struct BoundShapeSpline {
    /// The curve, which may already have been dropped by its owner.
    pub spline: Weak<dyn Spline>,
    /// Places the curve in the world.
    pub transform: Transform,
    /// Pick tolerance around the curve.
    pub width: f32,
}

impl fmt::Debug for BoundShapeSpline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundShapeSpline")
            .field("alive", &(self.spline.strong_count() > 0))
            .field("transform", &self.transform)
            .field("width", &self.width)
            .finish()
    }
}

/// A world-space hit-test volume registered for pointer picking.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum BoundShape {
    Quad(BoundShapeQuad),
    LineSegment(BoundShapeLineSegment),
    Cone(BoundShapeCone),
    Box(BoundShapeBox),
    Cylinder(BoundShapeCylinder),
    Sphere(BoundShapeSphere),
    Torus(BoundShapeTorus),
    Spline(BoundShapeSpline),
}

impl BoundShape {
    /// Distance along `ray` to the first hit, if any.
    pub fn intersect_ray(&self, ray: &Ray3d) -> Option<f32> {
        match self {
            BoundShape::Quad(quad) => ray_quad_intersection(ray, quad.corners()),
            BoundShape::LineSegment(line) => {
                let (distance, _, separation) = closest_point_ray_segment(ray, line.start, line.end);
                (separation <= line.width).then_some(distance)
            }
            BoundShape::Cone(cone) => {
                ray_cone_intersection(ray, cone.base, cone.axis, cone.height, cone.radius)
            }
            BoundShape::Box(cuboid) => {
                ray_obb_intersection(ray, cuboid.center, cuboid.orientation, cuboid.half_extents)
            }
            BoundShape::Cylinder(cylinder) => ray_cylinder_intersection(
                ray,
                cylinder.base,
                cylinder.axis,
                cylinder.height,
                cylinder.radius,
            ),
            BoundShape::Sphere(sphere) => ray_sphere_intersection(ray, sphere.center, sphere.radius),
            BoundShape::Torus(torus) => ray_hollow_cylinder_intersection(
                ray,
                torus.center,
                torus.axis,
                torus.major_radius - torus.minor_radius,
                torus.major_radius + torus.minor_radius,
                torus.minor_radius,
            ),
            BoundShape::Spline(spline) => {
                let curve = spline.spline.upgrade()?;
                let hit = closest_spline_hit(curve.as_ref(), &spline.transform, ray)?;
                (hit.separation <= spline.width).then_some(hit.distance)
            }
        }
    }
}

/// Quad spanned by `axis1` and `axis2` from the anchor.
pub fn calculate_quad_bound(
    local_position: Vec3,
    state: &ManipulatorState,
    axis1: Vec3,
    axis2: Vec3,
    size: f32,
) -> BoundShapeQuad {
    let world_position = transform_point(state, local_position);
    let axis1 = transform_direction_no_scaling(&state.world_from_local, axis1);
    let axis2 = transform_direction_no_scaling(&state.world_from_local, axis2);
    quad_from(world_position, axis1 * size, axis2 * size)
}

/// Clickable quad `scale_factor` times larger than the visual quad, with the
/// extra border split evenly on both sides of each axis.
pub fn calculate_quad_hit_bound(
    local_position: Vec3,
    state: &ManipulatorState,
    axis1: Vec3,
    axis2: Vec3,
    size: f32,
    scale_factor: f32,
) -> BoundShapeQuad {
    let world_position = transform_point(state, local_position);
    let axis1 = transform_direction_no_scaling(&state.world_from_local, axis1);
    let axis2 = transform_direction_no_scaling(&state.world_from_local, axis2);
    let hit_size = size * scale_factor;
    let border = (hit_size - size) * 0.5;
    quad_from(
        world_position - (axis1 + axis2) * border,
        axis1 * hit_size,
        axis2 * hit_size,
    )
}

fn quad_from(origin: Vec3, edge1: Vec3, edge2: Vec3) -> BoundShapeQuad {
    BoundShapeQuad {
        corner1: origin,
        corner2: origin + edge1,
        corner3: origin + edge1 + edge2,
        corner4: origin + edge2,
    }
}

/// Camera-facing quad of side `size` centred on the anchor.
pub fn calculate_quad_bound_billboard(
    local_position: Vec3,
    state: &ManipulatorState,
    size: f32,
    camera: &CameraState,
) -> BoundShapeQuad {
    let center = transform_point(state, local_position);
    let half = size * 0.5;
    let side = camera.side * half;
    let up = camera.up * half;
    BoundShapeQuad {
        corner1: center - side - up,
        corner2: center + side - up,
        corner3: center + side + up,
        corner4: center - side + up,
    }
}

/// Line from the anchor along `axis`. Only the anchor is scaled.
pub fn calculate_line_bound(
    local_position: Vec3,
    state: &ManipulatorState,
    axis: Vec3,
    length: f32,
    width: f32,
) -> BoundShapeLineSegment {
    let start = transform_point(state, local_position);
    let end = start + transform_direction_no_scaling(&state.world_from_local, axis) * length;
    BoundShapeLineSegment { start, end, width }
}

/// Cone whose base sits at the anchor plus `offset`.
pub fn calculate_cone_bound(
    local_position: Vec3,
    state: &ManipulatorState,
    axis: Vec3,
    offset: Vec3,
    height: f32,
    radius: f32,
) -> BoundShapeCone {
    BoundShapeCone {
        base: transform_point(state, local_position + offset),
        axis: transform_direction_no_scaling(&state.world_from_local, axis),
        height,
        radius,
    }
}

/// Oriented box whose orientation composes the manipulator rotation with
/// `orientation`.
pub fn calculate_box_bound(
    local_position: Vec3,
    state: &ManipulatorState,
    orientation: Quat,
    offset: Vec3,
    half_extents: Vec3,
) -> BoundShapeBox {
    BoundShapeBox {
        center: transform_point(state, local_position + offset),
        orientation: (state.world_from_local.rotation * orientation).normalize(),
        half_extents,
    }
}

/// Cylinder whose base sits at the anchor plus `offset`.
pub fn calculate_cylinder_bound(
    local_position: Vec3,
    state: &ManipulatorState,
    axis: Vec3,
    offset: Vec3,
    height: f32,
    radius: f32,
) -> BoundShapeCylinder {
    BoundShapeCylinder {
        base: transform_point(state, local_position + offset),
        axis: transform_direction_no_scaling(&state.world_from_local, axis),
        height,
        radius,
    }
}

/// Sphere centred on the anchor.
pub fn calculate_sphere_bound(
    local_position: Vec3,
    state: &ManipulatorState,
    radius: f32,
) -> BoundShapeSphere {
    BoundShapeSphere {
        center: transform_point(state, local_position),
        radius,
    }
}

/// Torus centred on the anchor, wrapped around `axis`.
pub fn calculate_torus_bound(
    local_position: Vec3,
    state: &ManipulatorState,
    axis: Vec3,
    major_radius: f32,
    minor_radius: f32,
) -> BoundShapeTorus {
    BoundShapeTorus {
        center: transform_point(state, local_position),
        axis: transform_direction_no_scaling(&state.world_from_local, axis),
        major_radius,
        minor_radius,
    }
}

/// Package a spline reference for lazy sampling by the registry.
pub fn calculate_spline_bound(
    spline: &Arc<dyn Spline>,
    state: &ManipulatorState,
    width: f32,
) -> BoundShapeSpline {
    BoundShapeSpline {
        spline: Arc::downgrade(spline),
        transform: state.world_from_local,
        width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn contains(outer: &BoundShapeQuad, point: Vec3, axis1: Vec3, axis2: Vec3) -> bool {
        // Outer quad is axis-aligned in (axis1, axis2) after rotation.
        let d = point - outer.corner1;
        let e1 = outer.corner2 - outer.corner1;
        let e2 = outer.corner4 - outer.corner1;
        let u = d.dot(axis1) / e1.dot(axis1);
        let v = d.dot(axis2) / e2.dot(axis2);
        (-1e-5..=1.0 + 1e-5).contains(&u) && (-1e-5..=1.0 + 1e-5).contains(&v)
    }

    #[test]
    fn quad_corners_walk_the_axes() {
        let state = ManipulatorState::new(Transform::from_xyz(1.0, 0.0, 0.0));
        let quad = calculate_quad_bound(Vec3::ZERO, &state, Vec3::X, Vec3::Y, 2.0);
        assert!(quad.corner1.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
        assert!(quad.corner2.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-5));
        assert!(quad.corner3.abs_diff_eq(Vec3::new(3.0, 2.0, 0.0), 1e-5));
        assert!(quad.corner4.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn hit_quad_contains_visual_quad() {
        let rotation = Quat::from_euler(EulerRot::XYZ, 0.4, 1.2, -0.3);
        let state = ManipulatorState {
            non_uniform_scale: Vec3::new(2.0, 0.5, 1.5),
            local_position: Vec3::new(0.3, 0.1, -0.2),
            ..ManipulatorState::new(Transform::from_xyz(5.0, -1.0, 2.0).with_rotation(rotation))
        };
        let world_axis1 = rotation * Vec3::X;
        let world_axis2 = rotation * Vec3::Z;
        for size in [0.01, 0.3, 1.0, 7.5] {
            let visual = calculate_quad_bound(state.local_position, &state, Vec3::X, Vec3::Z, size);
            let hit = calculate_quad_hit_bound(state.local_position, &state, Vec3::X, Vec3::Z, size, 1.75);
            for corner in visual.corners() {
                assert!(contains(&hit, corner, world_axis1, world_axis2));
            }
            assert_relative_eq!(
                hit.corner1.distance(hit.corner2),
                size * 1.75,
                max_relative = 1e-4
            );
        }
    }

    #[test]
    fn hit_quad_border_is_even() {
        let state = ManipulatorState::default();
        let hit = calculate_quad_hit_bound(Vec3::ZERO, &state, Vec3::X, Vec3::Y, 1.0, 2.0);
        assert!(hit.corner1.abs_diff_eq(Vec3::new(-0.5, -0.5, 0.0), 1e-5));
        assert!(hit.corner3.abs_diff_eq(Vec3::new(1.5, 1.5, 0.0), 1e-5));
    }

    #[test]
    fn billboard_faces_camera() {
        let camera = CameraState::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let quad = calculate_quad_bound_billboard(Vec3::ZERO, &ManipulatorState::default(), 2.0, &camera);
        for corner in quad.corners() {
            assert_relative_eq!(corner.z, 0.0, epsilon = 1e-5);
        }
        assert!(quad.corner1.abs_diff_eq(Vec3::new(-1.0, -1.0, 0.0), 1e-5));
        assert!(quad.corner3.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn line_end_is_not_scaled() {
        let state = ManipulatorState {
            non_uniform_scale: Vec3::splat(3.0),
            ..ManipulatorState::default()
        };
        let line = calculate_line_bound(Vec3::X, &state, Vec3::Y, 2.0, 0.1);
        assert!(line.start.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-5));
        assert!(line.end.abs_diff_eq(Vec3::new(3.0, 2.0, 0.0), 1e-5));
        assert_relative_eq!(line.width, 0.1);
    }

    #[test]
    fn box_composes_orientation() {
        let state = ManipulatorState::new(
            Transform::from_xyz(10.0, 0.0, 0.0).with_rotation(Quat::from_rotation_z(0.5)),
        );
        let local = Quat::from_rotation_z(0.25);
        let bound = calculate_box_bound(Vec3::ZERO, &state, local, Vec3::ZERO, Vec3::splat(0.5));
        assert!(bound.orientation.abs_diff_eq(Quat::from_rotation_z(0.75), 1e-5));
        assert!(bound.center.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn cone_axis_is_rotated_only() {
        let state = ManipulatorState {
            non_uniform_scale: Vec3::splat(4.0),
            ..ManipulatorState::new(Transform::from_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)))
        };
        let cone = calculate_cone_bound(Vec3::ZERO, &state, Vec3::X, Vec3::X, 0.3, 0.1);
        assert!(cone.axis.abs_diff_eq(Vec3::Y, 1e-5));
        assert!(cone.base.abs_diff_eq(Vec3::new(0.0, 4.0, 0.0), 1e-5));
    }

    #[test]
    fn torus_picking_hits_ring_only() {
        let torus = BoundShape::Torus(calculate_torus_bound(
            Vec3::ZERO,
            &ManipulatorState::default(),
            Vec3::Z,
            2.0,
            0.1,
        ));
        let ring = Ray3d {
            origin: Vec3::new(2.0, 0.0, 5.0),
            direction: Dir3::NEG_Z,
        };
        assert_relative_eq!(torus.intersect_ray(&ring).unwrap(), 4.9, epsilon = 1e-4);

        let centre = Ray3d {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Dir3::NEG_Z,
        };
        assert!(torus.intersect_ray(&centre).is_none());
    }

    #[test]
    fn line_picking_uses_width() {
        let line = BoundShape::LineSegment(BoundShapeLineSegment {
            start: Vec3::ZERO,
            end: Vec3::X * 2.0,
            width: 0.1,
        });
        let near = Ray3d {
            origin: Vec3::new(1.0, 0.05, 5.0),
            direction: Dir3::NEG_Z,
        };
        assert_relative_eq!(line.intersect_ray(&near).unwrap(), 5.0, epsilon = 1e-4);

        let far = Ray3d {
            origin: Vec3::new(1.0, 0.5, 5.0),
            direction: Dir3::NEG_Z,
        };
        assert!(line.intersect_ray(&far).is_none());
    }

    #[test]
    fn spline_bound_is_lazy_and_weak() {
        let spline: Arc<dyn Spline> = Arc::new(LinearSpline::new(vec![
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ]));
        let state = ManipulatorState::new(Transform::from_xyz(0.0, 0.0, -1.0));
        let bound = BoundShape::Spline(calculate_spline_bound(&spline, &state, 0.05));
        let ray = Ray3d {
            origin: Vec3::new(1.0, 0.5, 5.0),
            direction: Dir3::NEG_Z,
        };
        assert_relative_eq!(bound.intersect_ray(&ray).unwrap(), 6.0, epsilon = 1e-4);

        drop(spline);
        assert!(bound.intersect_ray(&ray).is_none());
    }

    #[test]
    fn closed_linear_spline_wraps() {
        let spline = LinearSpline::closed(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(spline.segment_count(), 3);
        assert!(spline.position(2, 1.0).abs_diff_eq(Vec3::ZERO, 1e-6));
        assert_eq!(LinearSpline::new(vec![Vec3::ZERO]).segment_count(), 0);
    }
}
