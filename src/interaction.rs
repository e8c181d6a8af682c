//! Manipulator interaction and input handling.
//!
//! This module contains systems that build the per-frame pointer snapshot,
//! pick the hovered manipulator through the bound registry, start and end
//! interactions, and release bounds of manipulators that no longer exist.

use bevy::ecs::lifecycle::HookContext;
use bevy::ecs::world::DeferredWorld;
use bevy::gizmos::config::{DefaultGizmoConfigGroup, GizmoConfigStore};
use bevy::input::mouse::MouseButton;
use bevy::input::ButtonInput;
use bevy::log::debug;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::bound_registry::ManipulatorBoundRegistry;
use crate::types::{
    Manipulator, ManipulatorCamera, ManipulatorId, ManipulatorInteraction, ManipulatorViewConfig,
    MouseButtons, MouseInteraction,
};

/// Configure Bevy's built-in gizmo renderer from the view config.
pub fn configure_gizmos(
    mut config_store: ResMut<GizmoConfigStore>,
    config: Res<ManipulatorViewConfig>,
) {
    let (gizmo_config, _) = config_store.config_mut::<DefaultGizmoConfigGroup>();
    gizmo_config.line.width = config.default_line_width;
    gizmo_config.depth_bias = config.depth_bias;
}

/// Snapshot of the held mouse buttons.
pub fn mouse_buttons(buttons: &ButtonInput<MouseButton>) -> MouseButtons {
    MouseButtons {
        left: buttons.pressed(MouseButton::Left),
        right: buttons.pressed(MouseButton::Right),
        middle: buttons.pressed(MouseButton::Middle),
    }
}

/// Pointer state for `camera`. The ray is `None` while the cursor is outside
/// the window.
pub fn mouse_interaction(
    buttons: &ButtonInput<MouseButton>,
    camera: &Camera,
    camera_transform: &GlobalTransform,
    window: Option<&Window>,
) -> MouseInteraction {
    let ray = window
        .and_then(Window::cursor_position)
        .and_then(|cursor| camera.viewport_to_world(camera_transform, cursor).ok());
    MouseInteraction {
        buttons: mouse_buttons(buttons),
        ray,
    }
}

/// Component hook that deletes a manipulator's bounds when its
/// [`Manipulator`] is replaced, removed or despawned.
pub(crate) fn release_manipulator_bounds(mut world: DeferredWorld, context: HookContext) {
    let manipulator_id = ManipulatorId::from(context.entity);
    let Some(mut registry) = world.get_resource_mut::<ManipulatorBoundRegistry>() else {
        return;
    };
    let released = registry.delete_manipulator_bounds(manipulator_id);
    if released > 0 {
        debug!("released {released} bounds of {manipulator_id}");
    }
}

/// Forget hover and drag state of manipulators that were despawned or lost
/// their [`Manipulator`] component.
pub fn forget_removed_manipulators(
    mut removed: RemovedComponents<Manipulator>,
    mut interaction: ResMut<ManipulatorInteraction>,
) {
    for entity in removed.read() {
        let manipulator_id = ManipulatorId::from(entity);
        if interaction.hovered == Some(manipulator_id) {
            interaction.hovered = None;
        }
        if interaction.active == Some(manipulator_id) {
            debug!("active {manipulator_id} was removed");
            interaction.active = None;
        }
    }
}

/// Determine which manipulator (if any) is under the cursor.
pub fn update_hovered_manipulator(
    mut interaction: ResMut<ManipulatorInteraction>,
    registry: Res<ManipulatorBoundRegistry>,
    buttons: Res<ButtonInput<MouseButton>>,
    cameras: Query<(&Camera, &GlobalTransform), With<ManipulatorCamera>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    // Hover is frozen while dragging.
    if interaction.active.is_some() {
        return;
    }

    let hovered = cameras
        .iter()
        .next()
        .and_then(|(camera, camera_transform)| {
            mouse_interaction(&buttons, camera, camera_transform, windows.iter().next()).ray
        })
        .and_then(|ray| registry.raycast(&ray))
        .map(|hit| hit.manipulator_id);

    if interaction.hovered != hovered {
        debug!("hovered manipulator changed to {hovered:?}");
        interaction.hovered = hovered;
    }
}

/// Start interacting with the hovered manipulator on a left click.
pub fn begin_interaction(
    buttons: Res<ButtonInput<MouseButton>>,
    mut interaction: ResMut<ManipulatorInteraction>,
) {
    if !buttons.just_pressed(MouseButton::Left) || interaction.active.is_some() {
        return;
    }
    let Some(hovered) = interaction.hovered else {
        return;
    };
    debug!("began interacting with {hovered}");
    interaction.active = Some(hovered);
}

/// End the interaction when the left button is released.
pub fn end_interaction(
    buttons: Res<ButtonInput<MouseButton>>,
    mut interaction: ResMut<ManipulatorInteraction>,
) {
    if !buttons.just_released(MouseButton::Left) {
        return;
    }
    if let Some(active) = interaction.active.take() {
        debug!("ended interacting with {active}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bound_registry::BoundId;
    use crate::bounds::{BoundShape, BoundShapeSphere};
    use crate::types::ManipulatorManagerId;
    use bevy::ecs::system::RunSystemOnce;

    fn world() -> World {
        let mut world = World::new();
        world.init_resource::<ButtonInput<MouseButton>>();
        world.init_resource::<ManipulatorInteraction>();
        world.init_resource::<ManipulatorBoundRegistry>();
        world
    }

    fn press_left(world: &mut World) {
        world.resource_mut::<ButtonInput<MouseButton>>().press(MouseButton::Left);
    }

    #[test]
    fn click_on_hovered_manipulator_starts_interaction() {
        let mut world = world();
        let id = ManipulatorId(3);
        world.resource_mut::<ManipulatorInteraction>().hovered = Some(id);
        press_left(&mut world);

        world.run_system_once(begin_interaction).unwrap();
        assert_eq!(world.resource::<ManipulatorInteraction>().active, Some(id));
        assert!(world.resource::<ManipulatorInteraction>().manager_state().interacting);

        let mut buttons = world.resource_mut::<ButtonInput<MouseButton>>();
        buttons.clear();
        buttons.release(MouseButton::Left);
        world.run_system_once(end_interaction).unwrap();
        assert_eq!(world.resource::<ManipulatorInteraction>().active, None);
    }

    #[test]
    fn click_on_empty_space_does_nothing() {
        let mut world = world();
        press_left(&mut world);
        world.run_system_once(begin_interaction).unwrap();
        assert_eq!(world.resource::<ManipulatorInteraction>().active, None);
    }

    #[test]
    fn hover_clears_without_camera_but_freezes_mid_drag() {
        let mut world = world();
        let id = ManipulatorId(5);
        world.resource_mut::<ManipulatorInteraction>().hovered = Some(id);
        world.resource_mut::<ManipulatorInteraction>().active = Some(id);

        world.run_system_once(update_hovered_manipulator).unwrap();
        assert_eq!(world.resource::<ManipulatorInteraction>().hovered, Some(id));

        world.resource_mut::<ManipulatorInteraction>().active = None;
        world.run_system_once(update_hovered_manipulator).unwrap();
        assert_eq!(world.resource::<ManipulatorInteraction>().hovered, None);
    }

    fn register_sphere(world: &mut World, entity: Entity) -> BoundId {
        world
            .resource_mut::<ManipulatorBoundRegistry>()
            .update_bound(
                ManipulatorManagerId::MAIN,
                ManipulatorId::from(entity),
                None,
                BoundShape::Sphere(BoundShapeSphere {
                    center: Vec3::ZERO,
                    radius: 1.0,
                }),
            )
            .unwrap()
    }

    #[test]
    fn removed_manipulators_lose_their_bounds() {
        let mut world = world();
        let kept = world.spawn(Manipulator::default()).id();
        let removed = world.spawn(Manipulator::default()).id();
        let removed_id = ManipulatorId::from(removed);
        register_sphere(&mut world, kept);
        register_sphere(&mut world, removed);
        world.resource_mut::<ManipulatorInteraction>().hovered = Some(removed_id);
        world.resource_mut::<ManipulatorInteraction>().active = Some(removed_id);

        world.despawn(removed);
        assert_eq!(world.resource::<ManipulatorBoundRegistry>().len(), 1);

        world.run_system_once(forget_removed_manipulators).unwrap();
        let interaction = world.resource::<ManipulatorInteraction>();
        assert_eq!(interaction.hovered, None);
        assert_eq!(interaction.active, None);
    }

    #[test]
    fn replacing_manipulator_releases_old_bounds() {
        let mut world = world();
        let entity = world.spawn(Manipulator::default()).id();
        let old = register_sphere(&mut world, entity);

        world.entity_mut(entity).insert(Manipulator::default());

        let registry = world.resource::<ManipulatorBoundRegistry>();
        assert!(!registry.contains(old));
        assert!(registry.is_empty());
    }

    #[test]
    fn removing_manipulator_component_releases_bounds() {
        let mut world = world();
        let entity = world.spawn(Manipulator::default()).id();
        register_sphere(&mut world, entity);

        world.entity_mut(entity).remove::<Manipulator>();
        assert!(world.resource::<ManipulatorBoundRegistry>().is_empty());
    }

    #[test]
    fn button_snapshot_reflects_held_buttons() {
        let mut buttons = ButtonInput::<MouseButton>::default();
        assert!(!mouse_buttons(&buttons).any());
        buttons.press(MouseButton::Middle);
        let snapshot = mouse_buttons(&buttons);
        assert!(snapshot.middle);
        assert!(!snapshot.left);
    }
}
