//! The drawing surface views render through.
//!
//! [`DebugDisplay`] is stateful: colour, line width, depth testing, culling
//! and the local-to-world matrix stack apply to every draw call that follows.
//! [`GizmoDisplay`](crate::GizmoDisplay) implements it over Bevy gizmos.

use bevy::prelude::*;

use crate::bounds::BoundShape;

/// Immediate-mode drawing surface for manipulator views.
///
/// Geometry passed to the draw calls is in the space of the matrix on top of
/// the stack (world space when the stack is empty).
pub trait DebugDisplay {
    /// Colour for subsequent draw calls.
    fn set_color(&mut self, color: Color);
    /// Line width for subsequent draw calls (in pixels).
    fn set_line_width(&mut self, width: f32);
    /// Enable or disable depth testing.
    fn set_depth_test(&mut self, enabled: bool);
    /// Enable or disable back-face culling.
    fn set_culling(&mut self, enabled: bool);
    /// Push `matrix`, composed with the current top of the stack.
    fn push_matrix(&mut self, matrix: Mat4);
    /// Pop the most recently pushed matrix.
    fn pop_matrix(&mut self);

    /// Line between two points.
    fn draw_line(&mut self, start: Vec3, end: Vec3);
    /// Filled quad.
    fn draw_quad(&mut self, corners: [Vec3; 4]);
    /// Solid cone with its base centred on `base`, apex `height` along `direction`.
    fn draw_solid_cone(&mut self, base: Vec3, direction: Vec3, radius: f32, height: f32);
    /// Solid oriented box.
    fn draw_solid_obb(&mut self, center: Vec3, orientation: Quat, half_extents: Vec3);
    /// Solid cylinder centred on `center`.
    fn draw_solid_cylinder(&mut self, center: Vec3, direction: Vec3, radius: f32, height: f32);
    /// Solid sphere.
    fn draw_ball(&mut self, center: Vec3, radius: f32);
    /// Circle around `axis`.
    fn draw_circle(&mut self, center: Vec3, radius: f32, axis: Vec3);
    /// Circle around `axis` whose half facing away from `view_position` is dotted.
    fn draw_half_dotted_circle(&mut self, center: Vec3, radius: f32, axis: Vec3, view_position: Vec3);
}

/// Draw `shape` as a wireframe in the current colour.
pub fn draw_bound_shape(display: &mut dyn DebugDisplay, shape: &BoundShape) {
    match shape {
        BoundShape::Quad(quad) => {
            let corners = quad.corners();
            for i in 0..4 {
                display.draw_line(corners[i], corners[(i + 1) % 4]);
            }
        }
        BoundShape::LineSegment(line) => display.draw_line(line.start, line.end),
        BoundShape::Cone(cone) => {
            display.draw_solid_cone(cone.base, cone.axis, cone.radius, cone.height);
        }
        BoundShape::Box(cuboid) => {
            display.draw_solid_obb(cuboid.center, cuboid.orientation, cuboid.half_extents);
        }
        BoundShape::Cylinder(cylinder) => {
            let axis = cylinder.axis.normalize_or_zero();
            display.draw_solid_cylinder(
                cylinder.base + axis * cylinder.height * 0.5,
                axis,
                cylinder.radius,
                cylinder.height,
            );
        }
        BoundShape::Sphere(sphere) => display.draw_ball(sphere.center, sphere.radius),
        BoundShape::Torus(torus) => {
            display.draw_circle(torus.center, torus.major_radius - torus.minor_radius, torus.axis);
            display.draw_circle(torus.center, torus.major_radius + torus.minor_radius, torus.axis);
        }
        // Curves are drawn by their owner.
        BoundShape::Spline(_) => {}
    }
}


#[cfg(test)]
mod tests {
    use super::recording::{DrawCall, RecordingDisplay};
    use super::*;
    use crate::bounds::{BoundShapeCylinder, BoundShapeQuad};

    #[test]
    fn quad_bound_is_outlined() {
        let mut display = RecordingDisplay::default();
        let quad = BoundShape::Quad(BoundShapeQuad {
            corner1: Vec3::ZERO,
            corner2: Vec3::X,
            corner3: Vec3::new(1.0, 1.0, 0.0),
            corner4: Vec3::Y,
        });
        draw_bound_shape(&mut display, &quad);
        let lines = display.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], (Vec3::Y, Vec3::ZERO));
    }

    #[test]
    fn cylinder_bound_is_drawn_from_its_middle() {
        let mut display = RecordingDisplay::default();
        let cylinder = BoundShape::Cylinder(BoundShapeCylinder {
            base: Vec3::ZERO,
            axis: Vec3::Z,
            height: 2.0,
            radius: 0.5,
        });
        draw_bound_shape(&mut display, &cylinder);
        assert_eq!(
            display.calls,
            vec![DrawCall::Cylinder {
                center: Vec3::Z,
                direction: Vec3::Z,
                radius: 0.5,
                height: 2.0,
            }]
        );
    }
}
