//! Manipulator views for Bevy 0.18.
//!
//! This crate provides the geometry and interaction state behind editor
//! manipulators: the arrows, planes, rings and balls a user grabs to move,
//! rotate and scale things. Each manipulator is made of views. Every frame a
//! view corrects its axes to face the camera, sizes itself to stay constant on
//! screen, draws itself and refreshes a hit-test bound that pointer picking
//! runs against.
//!
//! # Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_manipulator_views::{
//!     linear_translation_views, Manipulator, ManipulatorCamera, ManipulatorViewPlugin,
//! };
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(ManipulatorViewPlugin)
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(mut commands: Commands) {
//!     // Camera used for drawing and picking
//!     commands.spawn((
//!         Camera3d::default(),
//!         Transform::from_xyz(0.0, 5.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
//!         ManipulatorCamera,
//!     ));
//!
//!     // A translation arrow along X
//!     commands.spawn((
//!         Transform::from_xyz(0.0, 1.0, 0.0),
//!         Manipulator::new(linear_translation_views(Vec3::X, Color::srgb(1.0, 0.0, 0.0))),
//!     ));
//! }
//! ```
//!
//! # Without Bevy's scheduler
//!
//! [`ManipulatorView::draw`] only needs a [`ViewDrawContext`], a
//! [`ManipulatorState`], a [`DebugDisplay`] and a [`ManipulatorBoundRegistry`],
//! so views can be driven by any host that implements the display trait.
//!
//! # Configuration
//!
//! - [`ManipulatorViewConfig`]: line widths, hit region scale, debug bounds
//! - [`ManipulatorInteraction`]: hovered and active manipulator

#![warn(missing_docs)]

use bevy::prelude::*;

pub mod axis_correction;
pub mod bound_registry;
pub mod bounds;
pub mod debug_display;
mod draw;
mod interaction;
pub mod math;
pub mod presets;
mod types;
pub mod view_scale;
pub mod views;

pub use bound_registry::{BoundError, BoundHit, BoundId, ManipulatorBoundRegistry};
pub use bounds::{BoundShape, LinearSpline, Spline};
pub use debug_display::DebugDisplay;
pub use draw::{draw_manipulators, GizmoDisplay};
pub use interaction::{
    begin_interaction, configure_gizmos, end_interaction, forget_removed_manipulators,
    mouse_interaction, update_hovered_manipulator,
};
pub use presets::{
    angular_views, linear_scale_views, linear_translation_views, planar_translation_views,
    surface_views,
};
pub use types::{
    CameraState, Manipulator, ManipulatorCamera, ManipulatorId, ManipulatorInteraction,
    ManipulatorManagerId, ManipulatorManagerState, ManipulatorState, ManipulatorViewConfig,
    MouseButtons, MouseInteraction,
};
pub use view_scale::{screen_to_world_multiplier, view_scale_multiplier};
pub use views::{CircleStyle, ManipulatorView, ManipulatorViewKind, ViewDrawContext};

/// Plugin that draws manipulators and tracks pointer interaction with them.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_manipulator_views::ManipulatorViewPlugin;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(ManipulatorViewPlugin)
///     .run();
/// ```
pub struct ManipulatorViewPlugin;

impl Plugin for ManipulatorViewPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ManipulatorViewConfig>()
            .init_resource::<ManipulatorBoundRegistry>()
            .init_resource::<ManipulatorInteraction>()
            .add_systems(Startup, configure_gizmos)
            .add_systems(
                Update,
                (
                    forget_removed_manipulators,
                    update_hovered_manipulator,
                    begin_interaction,
                    end_interaction,
                    draw_manipulators,
                )
                    .chain(),
            );
    }
}
