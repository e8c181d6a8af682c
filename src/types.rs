//! Core types for manipulator views.
//!
//! This module contains the per-frame state handed to views, the camera and
//! pointer snapshots, and the Bevy components and resources used to configure
//! and drive manipulators inside an app.

use bevy::math::Ray3d;
use bevy::prelude::*;
use std::fmt;

use crate::interaction::release_manipulator_bounds;
use crate::math::transform_point;
use crate::views::ManipulatorView;

/// Identifies a manipulator within a [`ManipulatorBoundRegistry`](crate::ManipulatorBoundRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManipulatorId(pub u64);

impl From<Entity> for ManipulatorId {
    fn from(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

impl fmt::Display for ManipulatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manipulator#{}", self.0)
    }
}

/// Identifies the manager that owns a bound registry.
///
/// A view is tied to the manager it first registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManipulatorManagerId(pub u32);

impl ManipulatorManagerId {
    /// The manager used by [`ManipulatorViewPlugin`](crate::ManipulatorViewPlugin).
    pub const MAIN: Self = Self(1);
}

impl Default for ManipulatorManagerId {
    fn default() -> Self {
        Self::MAIN
    }
}

impl fmt::Display for ManipulatorManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manager#{}", self.0)
    }
}

/// Per-frame state of the manipulator that owns a set of views.
///
/// The non-uniform scale is applied component-wise to local points before
/// `world_from_local`. Directions are only rotated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManipulatorState {
    /// Rigid transform from manipulator space to world space.
    pub world_from_local: Transform,
    /// Scale applied to local points before `world_from_local`.
    pub non_uniform_scale: Vec3,
    /// Anchor of the manipulator in local space.
    pub local_position: Vec3,
    /// Whether the pointer is currently over this manipulator.
    pub mouse_over: bool,
}

impl ManipulatorState {
    /// State at `world_from_local` with unit scale and a local anchor at the origin.
    pub fn new(world_from_local: Transform) -> Self {
        Self {
            world_from_local,
            non_uniform_scale: Vec3::ONE,
            local_position: Vec3::ZERO,
            mouse_over: false,
        }
    }

    /// World-space position of the local anchor.
    pub fn world_position(&self) -> Vec3 {
        transform_point(self, self.local_position)
    }
}

impl Default for ManipulatorState {
    fn default() -> Self {
        Self::new(Transform::IDENTITY)
    }
}

/// Camera information supplied once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Camera position in world space.
    pub position: Vec3,
    /// Direction the camera looks along.
    pub forward: Vec3,
    /// Camera up vector.
    pub up: Vec3,
    /// Camera right vector.
    pub side: Vec3,
    /// Near clip distance.
    pub near_clip: f32,
    /// Far clip distance.
    pub far_clip: f32,
    /// Vertical field of view in radians (perspective only).
    pub fov_y: f32,
    /// Viewport size in logical pixels.
    pub viewport_size: Vec2,
    /// Whether the camera uses an orthographic projection.
    pub orthographic: bool,
    /// Orthographic zoom factor (orthographic only).
    pub ortho_zoom: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            side: Vec3::X,
            near_clip: 0.1,
            far_clip: 1000.0,
            fov_y: std::f32::consts::FRAC_PI_4,
            viewport_size: Vec2::new(1280.0, 720.0),
            orthographic: false,
            ortho_zoom: 1.0,
        }
    }
}

impl CameraState {
    /// Perspective camera at `position` looking towards `target`.
    pub fn looking_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let transform = Transform::from_translation(position).looking_at(target, up);
        Self {
            position,
            forward: *transform.forward(),
            up: *transform.up(),
            side: *transform.right(),
            ..default()
        }
    }

    /// Camera state for a Bevy camera.
    pub fn from_camera(transform: &GlobalTransform, projection: &Projection, viewport_size: Vec2) -> Self {
        let mut state = Self {
            position: transform.translation(),
            forward: *transform.forward(),
            up: *transform.up(),
            side: *transform.right(),
            viewport_size,
            ..default()
        };

        match projection {
            Projection::Perspective(perspective) => {
                state.near_clip = perspective.near;
                state.far_clip = perspective.far;
                state.fov_y = perspective.fov;
            }
            Projection::Orthographic(orthographic) => {
                state.orthographic = true;
                state.near_clip = orthographic.near;
                state.far_clip = orthographic.far;
                state.ortho_zoom = if orthographic.scale > 0.0 {
                    1.0 / orthographic.scale
                } else {
                    1.0
                };
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }

        state
    }
}

/// Snapshot of the mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseButtons {
    /// Left button held.
    pub left: bool,
    /// Right button held.
    pub right: bool,
    /// Middle button held.
    pub middle: bool,
}

impl MouseButtons {
    /// Whether any button is held.
    pub fn any(&self) -> bool {
        self.left || self.right || self.middle
    }
}

/// Pointer state for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouseInteraction {
    /// Buttons currently held.
    pub buttons: MouseButtons,
    /// World-space pick ray under the cursor, if the cursor is in the viewport.
    pub ray: Option<Ray3d>,
}

/// State reported by the manipulator manager for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManipulatorManagerState {
    /// Whether any manipulator is being dragged.
    pub interacting: bool,
}

/// Tunables for drawing views and sizing their hit regions.
///
/// Passed explicitly into every draw call, so views never read global state.
#[derive(Resource, Clone, Debug)]
pub struct ManipulatorViewConfig {
    /// Draw every view's hit bound on top of its visual.
    pub debug_bounds_visible: bool,
    /// How much larger a quad's clickable region is than the drawn quad.
    pub hit_region_scale_factor: f32,
    /// Line width for views the pointer is not over (in pixels).
    pub default_line_width: f32,
    /// Line width for views under the pointer (in pixels).
    pub mouse_over_line_width: f32,
    /// Base scale applied to every view.
    pub manipulator_scale: f32,
    /// Colour used when drawing debug bounds.
    pub debug_bound_color: Color,
    /// Depth bias to draw manipulators on top of regular geometry.
    /// Negative values bring the manipulator closer to the camera.
    pub depth_bias: f32,
}

impl Default for ManipulatorViewConfig {
    fn default() -> Self {
        Self {
            debug_bounds_visible: false,
            hit_region_scale_factor: 1.75,
            default_line_width: 4.0,
            mouse_over_line_width: 5.0,
            manipulator_scale: 1.0,
            debug_bound_color: Color::srgb(1.0, 0.0, 1.0),
            depth_bias: -1.0,
        }
    }
}

/// Marker component for the camera used to draw and pick manipulators.
///
/// # Example
///
/// ```ignore
/// commands.spawn((
///     Camera3d::default(),
///     Transform::from_xyz(0.0, 5.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
///     ManipulatorCamera,
/// ));
/// ```
#[derive(Component)]
pub struct ManipulatorCamera;

/// An interactive handle made of one or more views.
///
/// The entity's `GlobalTransform` supplies the rigid world-from-local
/// transform. Its scale is folded into `non_uniform_scale`. Replacing,
/// removing or despawning the component deletes all of its bounds.
///
/// # Example
///
/// ```ignore
/// commands.spawn((
///     Transform::from_xyz(0.0, 1.0, 0.0),
///     Manipulator::new(linear_translation_views(Vec3::X, Color::srgb(1.0, 0.0, 0.0))),
/// ));
/// ```
#[derive(Component)]
#[component(on_replace = release_manipulator_bounds)]
pub struct Manipulator {
    /// Anchor of the manipulator in local space.
    pub local_position: Vec3,
    /// Scale applied to local points before the entity transform.
    pub non_uniform_scale: Vec3,
    /// Views drawn for this manipulator.
    pub views: Vec<ManipulatorView>,
}

impl Manipulator {
    /// Manipulator at the local origin with the given views.
    pub fn new(views: Vec<ManipulatorView>) -> Self {
        Self {
            local_position: Vec3::ZERO,
            non_uniform_scale: Vec3::ONE,
            views,
        }
    }

    /// Builder-style setter for the local anchor.
    pub fn with_local_position(mut self, local_position: Vec3) -> Self {
        self.local_position = local_position;
        self
    }
}

impl Default for Manipulator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Hover and drag state shared by the interaction systems.
#[derive(Resource, Clone, Debug, Default)]
pub struct ManipulatorInteraction {
    /// Manipulator under the cursor, if any.
    pub hovered: Option<ManipulatorId>,
    /// Manipulator being dragged, if any.
    pub active: Option<ManipulatorId>,
}

impl ManipulatorInteraction {
    /// Manager state derived from the current drag.
    pub fn manager_state(&self) -> ManipulatorManagerState {
        ManipulatorManagerState {
            interacting: self.active.is_some(),
        }
    }
}
