//! Standard view sets for the common manipulator shapes.
//!
//! Dimensions match the editor defaults and are in screen-stable units: every
//! preset view is screen-size-fixed.

use bevy::prelude::*;

use crate::views::{CircleStyle, ManipulatorView};

/// Total length of a translation or scale arrow.
pub const ARROW_LENGTH: f32 = 2.0;
/// Length of a translation arrow's cone head.
pub const CONE_LENGTH: f32 = 0.28;
/// Base radius of a translation arrow's cone head.
pub const CONE_RADIUS: f32 = 0.1;
/// Pick width of arrow shafts.
pub const LINE_WIDTH: f32 = 0.05;
/// Side length of a planar translation quad.
pub const PLANAR_SIZE: f32 = 0.6;
/// Half extent of a scale handle's box.
pub const SCALE_BOX_HALF_EXTENT: f32 = 0.1;
/// Radius of an angular manipulator ring.
pub const ANGULAR_RADIUS: f32 = 2.0;
/// Pick width of an angular manipulator ring.
pub const ANGULAR_WIDTH: f32 = 0.05;
/// Radius of a surface manipulator ball.
pub const SURFACE_RADIUS: f32 = 0.1;

/// Arrow along `axis`: a shaft capped by a cone.
pub fn linear_translation_views(axis: Vec3, color: Color) -> Vec<ManipulatorView> {
    let shaft = ARROW_LENGTH - CONE_LENGTH;
    vec![
        ManipulatorView::line(axis, shaft, LINE_WIDTH, color),
        ManipulatorView::cone(axis, axis * shaft, CONE_LENGTH, CONE_RADIUS, color, true),
    ]
}

/// Scale handle along `axis`: a shaft capped by a box that ends at the arrow
/// length.
pub fn linear_scale_views(axis: Vec3, color: Color) -> Vec<ManipulatorView> {
    let shaft = ARROW_LENGTH - 2.0 * SCALE_BOX_HALF_EXTENT;
    vec![
        ManipulatorView::line(axis, shaft, LINE_WIDTH, color),
        ManipulatorView::cuboid(
            Quat::IDENTITY,
            axis * (shaft + SCALE_BOX_HALF_EXTENT),
            Vec3::splat(SCALE_BOX_HALF_EXTENT),
            color,
        ),
    ]
}

/// Square in the plane spanned by `axis1` and `axis2`.
pub fn planar_translation_views(
    axis1: Vec3,
    axis2: Vec3,
    axis1_color: Color,
    axis2_color: Color,
) -> Vec<ManipulatorView> {
    vec![ManipulatorView::quad(
        axis1,
        axis2,
        axis1_color,
        axis2_color,
        PLANAR_SIZE,
    )]
}

/// Rotation ring around `axis`.
pub fn angular_views(axis: Vec3, color: Color) -> Vec<ManipulatorView> {
    vec![ManipulatorView::circle(
        axis,
        ANGULAR_RADIUS,
        ANGULAR_WIDTH,
        color,
        CircleStyle::HalfDotted,
    )]
}

/// Ball for dragging along a surface. Drawn on top of the scene.
pub fn surface_views(color: Color) -> Vec<ManipulatorView> {
    vec![ManipulatorView::sphere(color, SURFACE_RADIUS, false)]
}
