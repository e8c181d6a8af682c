//! Math utilities for manipulator geometry and hit testing.
//!
//! Points and directions are transformed differently: points pick up the
//! manipulator's non-uniform scale and full transform, directions are only
//! rotated so lengths stay stable regardless of manipulator scale.

use bevy::math::Ray3d;
use bevy::prelude::*;

use crate::types::ManipulatorState;

/// Threshold for considering vectors as parallel or zero-length.
const EPSILON: f32 = 1e-6;

/// Threshold for parallel plane/ray detection.
const PLANE_EPSILON: f32 = 1e-5;

/// Threshold for choosing perpendicular helper vector.
const AXIS_PARALLEL_THRESHOLD: f32 = 0.9;

/// Transform a local point into world space, applying the manipulator's
/// non-uniform scale before its world-from-local transform.
pub fn transform_point(state: &ManipulatorState, local_point: Vec3) -> Vec3 {
    state
        .world_from_local
        .transform_point(state.non_uniform_scale * local_point)
}

/// Rotate `direction` by the rotational part of `transform` only.
///
/// Translation and scale (both the transform's own and any non-uniform
/// manipulator scale) are ignored.
pub fn transform_direction_no_scaling(transform: &Transform, direction: Vec3) -> Vec3 {
    transform.rotation * direction
}

/// Shortest-arc rotation taking `from` onto `to`.
///
/// Zero-length inputs produce the identity rotation.
pub fn shortest_arc(from: Vec3, to: Vec3) -> Quat {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from == Vec3::ZERO || to == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(from, to)
}

/// Build an orthonormal basis (t1, t2) in the plane perpendicular to `axis`.
pub fn axis_basis(axis: Vec3) -> (Vec3, Vec3) {
    let axis = axis.normalize_or_zero();
    if axis.length_squared() < EPSILON {
        return (Vec3::X, Vec3::Y);
    }

    // Pick a helper vector that is not parallel to axis.
    let helper = if axis.abs().dot(Vec3::Y) < AXIS_PARALLEL_THRESHOLD {
        Vec3::Y
    } else {
        Vec3::X
    };

    let t1 = axis.cross(helper).normalize_or_zero();
    let t2 = axis.cross(t1).normalize_or_zero();
    (t1, t2)
}

/// Solve intersection between a ray and a sphere. Returns distance along the
/// ray if there is an intersection, otherwise `None`.
pub fn ray_sphere_intersection(ray: &Ray3d, center: Vec3, radius: f32) -> Option<f32> {
    let m = ray.origin - center;
    let b = m.dot(*ray.direction);
    let c = m.length_squared() - radius * radius;

    // Exit if ray origin is outside sphere (c > 0) and ray is pointing away
    // from sphere (b > 0).
    if c > 0.0 && b > 0.0 {
        return None;
    }

    let discr = b * b - c;
    if discr < 0.0 {
        return None;
    }

    let t = -b - discr.sqrt();
    if t < 0.0 {
        Some(0.0)
    } else {
        Some(t)
    }
}

/// Distance along the ray to a plane, if the ray hits it in front of its origin.
pub fn ray_plane_distance(ray: &Ray3d, plane_origin: Vec3, plane_normal: Vec3) -> Option<f32> {
    let denom = plane_normal.dot(*ray.direction);
    if denom.abs() < PLANE_EPSILON {
        return None;
    }
    let t = (plane_origin - ray.origin).dot(plane_normal) / denom;
    (t >= 0.0).then_some(t)
}

/// Intersect a ray with a planar convex quad given by its corners in winding
/// order.
pub fn ray_quad_intersection(ray: &Ray3d, corners: [Vec3; 4]) -> Option<f32> {
    let normal = (corners[1] - corners[0]).cross(corners[3] - corners[0]);
    if normal.length_squared() < EPSILON * EPSILON {
        return None;
    }
    let t = ray_plane_distance(ray, corners[0], normal)?;
    let point = ray.get_point(t);

    // Inside when the point is on the same side of every edge.
    let inside = (0..4).all(|i| {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        (b - a).cross(point - a).dot(normal) >= 0.0
    });
    inside.then_some(t)
}

/// Intersect a ray with an oriented box. Returns the entry distance, or zero
/// when the ray starts inside the box.
pub fn ray_obb_intersection(
    ray: &Ray3d,
    center: Vec3,
    orientation: Quat,
    half_extents: Vec3,
) -> Option<f32> {
    let inverse = orientation.inverse();
    let origin = inverse * (ray.origin - center);
    let direction = inverse * *ray.direction;

    let mut t_min = 0.0_f32;
    let mut t_max = f32::MAX;
    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let h = half_extents[axis].abs();
        if d.abs() < EPSILON {
            if o.abs() > h {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (t0, t1) = {
            let a = (-h - o) * inv;
            let b = (h - o) * inv;
            if a < b {
                (a, b)
            } else {
                (b, a)
            }
        };
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

/// Roots of `a·t² + b·t + c = 0` in ascending order.
fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a.abs() < EPSILON {
        if b.abs() < EPSILON {
            return None;
        }
        let t = -c / b;
        return Some((t, t));
    }
    let discr = b * b - 4.0 * a * c;
    if discr < 0.0 {
        return None;
    }
    let sqrt = discr.sqrt();
    let t0 = (-b - sqrt) / (2.0 * a);
    let t1 = (-b + sqrt) / (2.0 * a);
    Some(if t0 < t1 { (t0, t1) } else { (t1, t0) })
}

/// Roots of a ray against the infinite cylinder around `axis` (unit length)
/// through `center`.
fn ray_infinite_cylinder_roots(
    ray: &Ray3d,
    center: Vec3,
    axis: Vec3,
    radius: f32,
) -> Option<(f32, f32)> {
    let d = *ray.direction - axis * axis.dot(*ray.direction);
    let m = ray.origin - center;
    let o = m - axis * axis.dot(m);
    solve_quadratic(d.length_squared(), 2.0 * o.dot(d), o.length_squared() - radius * radius)
}

/// Distance from `point` to the line through `center` along `axis`, and the
/// signed height of the point along that axis.
fn radial_and_height(point: Vec3, center: Vec3, axis: Vec3) -> (f32, f32) {
    let v = point - center;
    let height = v.dot(axis);
    ((v - axis * height).length(), height)
}

/// Intersect a ray with a capped cylinder starting at `base` and extending
/// `height` along `axis`.
pub fn ray_cylinder_intersection(
    ray: &Ray3d,
    base: Vec3,
    axis: Vec3,
    height: f32,
    radius: f32,
) -> Option<f32> {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO || height <= 0.0 || radius <= 0.0 {
        return None;
    }

    let mut best: Option<f32> = None;
    let mut consider = |t: f32| {
        if t >= 0.0 && best.is_none_or(|b| t < b) {
            best = Some(t);
        }
    };

    if let Some((t0, t1)) = ray_infinite_cylinder_roots(ray, base, axis, radius) {
        for t in [t0, t1] {
            let (_, h) = radial_and_height(ray.get_point(t), base, axis);
            if (0.0..=height).contains(&h) {
                consider(t);
            }
        }
    }

    for cap in [base, base + axis * height] {
        if let Some(t) = ray_plane_distance(ray, cap, axis) {
            let (r, _) = radial_and_height(ray.get_point(t), base, axis);
            if r <= radius {
                consider(t);
            }
        }
    }

    best
}

/// Intersect a ray with a solid cone whose base disc is centred on `base`
/// and whose apex lies `height` along `axis`.
pub fn ray_cone_intersection(
    ray: &Ray3d,
    base: Vec3,
    axis: Vec3,
    height: f32,
    radius: f32,
) -> Option<f32> {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO || height <= 0.0 || radius <= 0.0 {
        return None;
    }

    let apex = base + axis * height;
    // Cone opens from the apex back towards the base.
    let w = -axis;
    let cos2 = (height * height) / (height * height + radius * radius);
    let d = *ray.direction;
    let co = ray.origin - apex;

    let dw = d.dot(w);
    let cow = co.dot(w);
    let a = dw * dw - cos2 * d.length_squared();
    let b = 2.0 * (dw * cow - cos2 * d.dot(co));
    let c = cow * cow - cos2 * co.length_squared();

    let mut best: Option<f32> = None;
    let mut consider = |t: f32| {
        if t >= 0.0 && best.is_none_or(|b| t < b) {
            best = Some(t);
        }
    };

    if let Some((t0, t1)) = solve_quadratic(a, b, c) {
        for t in [t0, t1] {
            let along = (ray.get_point(t) - apex).dot(w);
            if (0.0..=height).contains(&along) {
                consider(t);
            }
        }
    }

    if let Some(t) = ray_plane_distance(ray, base, axis) {
        let (r, _) = radial_and_height(ray.get_point(t), base, axis);
        if r <= radius {
            consider(t);
        }
    }

    best
}

/// Intersect a ray with a hollow cylinder (an annulus extruded `half_height`
/// either side of `center`), used as the pick volume for a torus.
pub fn ray_hollow_cylinder_intersection(
    ray: &Ray3d,
    center: Vec3,
    axis: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    half_height: f32,
) -> Option<f32> {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO || outer_radius <= 0.0 || half_height <= 0.0 {
        return None;
    }
    let inner_radius = inner_radius.max(0.0);

    // Slack for points landing exactly on a boundary surface.
    let tolerance = 1e-4 * outer_radius.max(1.0);
    let inside = |point: Vec3| {
        let (r, h) = radial_and_height(point, center, axis);
        h.abs() <= half_height + tolerance
            && r >= inner_radius - tolerance
            && r <= outer_radius + tolerance
    };

    if inside(ray.origin) {
        return Some(0.0);
    }

    let mut candidates = Vec::with_capacity(6);
    for radius in [inner_radius, outer_radius] {
        if radius > 0.0 {
            if let Some((t0, t1)) = ray_infinite_cylinder_roots(ray, center, axis, radius) {
                candidates.extend([t0, t1]);
            }
        }
    }
    for cap in [center + axis * half_height, center - axis * half_height] {
        if let Some(t) = ray_plane_distance(ray, cap, axis) {
            candidates.push(t);
        }
    }

    candidates
        .into_iter()
        .filter(|t| *t >= 0.0 && inside(ray.get_point(*t)))
        .min_by(f32::total_cmp)
}

/// Closest approach between a ray and the segment `start..end`.
///
/// Returns the distance along the ray, the closest point on the segment and
/// the separation between the two.
pub fn closest_point_ray_segment(ray: &Ray3d, start: Vec3, end: Vec3) -> (f32, Vec3, f32) {
    let d1 = *ray.direction;
    let d2 = end - start;
    let r = ray.origin - start;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    let (s, t) = if e < EPSILON {
        ((-d1.dot(r) / a).max(0.0), 0.0)
    } else {
        let c = d1.dot(r);
        let b = d1.dot(d2);
        let denom = a * e - b * b;
        let mut s = if denom.abs() > EPSILON {
            (b * f - c * e) / denom
        } else {
            0.0
        }
        .max(0.0);
        let mut t = (b * s + f) / e;
        if t < 0.0 {
            t = 0.0;
            s = (-c / a).max(0.0);
        } else if t > 1.0 {
            t = 1.0;
            s = ((b - c) / a).max(0.0);
        }
        (s, t)
    };

    let on_ray = ray.origin + d1 * s;
    let on_segment = start + d2 * t;
    (s, on_segment, on_ray.distance(on_segment))
}
