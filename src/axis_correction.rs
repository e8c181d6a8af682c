//! Camera-facing axis correction.
//!
//! Directional handles (arrows, quads, box offsets) are flipped so they point
//! towards the viewer. The flip is frozen while the user is dragging, so a
//! handle never jumps away from under the cursor mid-drag.

use bevy::prelude::*;

use crate::math::transform_direction_no_scaling;
use crate::types::{ManipulatorManagerState, MouseInteraction};

/// Whether `axis`, anchored at `local_position`, points away from the camera.
pub fn should_flip_camera_axis(
    world_from_local: &Transform,
    local_position: Vec3,
    axis: Vec3,
    camera_position: Vec3,
) -> bool {
    let world_position = world_from_local.transform_point(local_position);
    let world_axis = transform_direction_no_scaling(world_from_local, axis);
    (world_position - camera_position).dot(world_axis) > 0.0
}

/// Corrected axis for the given camera, and whether it was flipped.
pub fn camera_correct_axis(
    axis: Vec3,
    camera_position: Vec3,
    world_from_local: &Transform,
    local_position: Vec3,
) -> (Vec3, bool) {
    if should_flip_camera_axis(world_from_local, local_position, axis, camera_position) {
        (-axis, true)
    } else {
        (axis, false)
    }
}

/// Whether a drag is in progress: the manager reports an interaction and a
/// mouse button is held.
pub fn is_interacting(manager_state: &ManipulatorManagerState, mouse: &MouseInteraction) -> bool {
    manager_state.interacting && mouse.buttons.any()
}

/// Camera-corrected axis stored by a view between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraCorrectedAxis {
    axis: Vec3,
    flipped: bool,
}

impl CameraCorrectedAxis {
    /// Starts out uncorrected.
    pub fn new(axis: Vec3) -> Self {
        Self {
            axis,
            flipped: false,
        }
    }

    /// Current corrected axis.
    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    /// Whether the current axis is the negation of the authored one.
    pub fn flipped(&self) -> bool {
        self.flipped
    }

    /// Recompute the correction for `axis`. Does nothing while `interacting`.
    pub fn update(
        &mut self,
        axis: Vec3,
        interacting: bool,
        camera_position: Vec3,
        world_from_local: &Transform,
        local_position: Vec3,
    ) {
        if interacting {
            return;
        }
        let (corrected, flipped) =
            camera_correct_axis(axis, camera_position, world_from_local, local_position);
        self.axis = corrected;
        self.flipped = flipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MouseButtons;

    #[test]
    fn flips_axis_pointing_away_from_camera() {
        let camera = Vec3::new(0.0, 0.0, 5.0);
        let (axis, flipped) = camera_correct_axis(Vec3::NEG_Z, camera, &Transform::IDENTITY, Vec3::ZERO);
        assert!(flipped);
        assert_eq!(axis, Vec3::Z);

        let (axis, flipped) = camera_correct_axis(Vec3::Z, camera, &Transform::IDENTITY, Vec3::ZERO);
        assert!(!flipped);
        assert_eq!(axis, Vec3::Z);
    }

    #[test]
    fn orthogonal_axis_is_left_alone() {
        let camera = Vec3::new(0.0, 0.0, 5.0);
        let (axis, flipped) = camera_correct_axis(Vec3::X, camera, &Transform::IDENTITY, Vec3::ZERO);
        assert!(!flipped);
        assert_eq!(axis, Vec3::X);
    }

    #[test]
    fn uses_manipulator_rotation() {
        // Rotating the manipulator half a turn makes local +Z face away.
        let world_from_local = Transform::from_rotation(Quat::from_rotation_y(std::f32::consts::PI));
        let camera = Vec3::new(0.0, 0.0, 5.0);
        assert!(should_flip_camera_axis(&world_from_local, Vec3::ZERO, Vec3::Z, camera));
    }

    #[test]
    fn axis_and_negation_agree_on_world_direction() {
        let world_from_local = Transform::from_xyz(1.0, 2.0, -3.0)
            .with_rotation(Quat::from_euler(EulerRot::XYZ, 0.3, -0.8, 1.1));
        let axis = Vec3::new(0.4, -0.2, 0.9);
        for camera in [
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(-7.0, 3.0, 0.5),
            Vec3::new(4.0, -9.0, -6.0),
        ] {
            let (a, _) = camera_correct_axis(axis, camera, &world_from_local, Vec3::ONE);
            let (b, _) = camera_correct_axis(-axis, camera, &world_from_local, Vec3::ONE);
            assert!(a.abs_diff_eq(b, 1e-6));
        }
    }

    #[test]
    fn frozen_while_dragging() {
        let world_from_local = Transform::IDENTITY;
        let mut corrected = CameraCorrectedAxis::new(Vec3::Z);
        corrected.update(Vec3::Z, false, Vec3::new(0.0, 0.0, -5.0), &world_from_local, Vec3::ZERO);
        assert!(corrected.flipped());
        let before = corrected;

        let manager = ManipulatorManagerState { interacting: true };
        let mouse = MouseInteraction {
            buttons: MouseButtons {
                left: true,
                ..default()
            },
            ray: None,
        };
        let interacting = is_interacting(&manager, &mouse);
        assert!(interacting);

        for z in [-5.0, 5.0, 50.0, -0.5] {
            corrected.update(Vec3::Z, interacting, Vec3::new(0.0, 0.0, z), &world_from_local, Vec3::ZERO);
            assert_eq!(corrected, before);
        }
    }

    #[test]
    fn released_button_is_not_interacting() {
        let manager = ManipulatorManagerState { interacting: true };
        assert!(!is_interacting(&manager, &MouseInteraction::default()));
    }
}
