//! Scale factors that keep screen-size-fixed views at a constant apparent size.

use bevy::prelude::*;

use crate::types::CameraState;

/// Camera distance at which a screen-size-fixed view is drawn at its
/// authored world size.
const APPARENT_DISTANCE: f32 = 10.0;

/// Multiplier converting a screen-stable size into world units at
/// `world_position`.
///
/// Perspective cameras scale with the distance along the view direction,
/// clamped to the near plane. Orthographic cameras use the inverse zoom.
pub fn screen_to_world_multiplier(world_position: Vec3, camera: &CameraState) -> f32 {
    if camera.orthographic {
        return if camera.ortho_zoom > 0.0 {
            1.0 / camera.ortho_zoom
        } else {
            1.0
        };
    }

    let projected_distance = (world_position - camera.position)
        .dot(camera.forward.normalize_or_zero())
        .abs();
    projected_distance.max(camera.near_clip) / APPARENT_DISTANCE
}

/// Scale applied to a view's authored dimensions this frame.
pub fn view_scale_multiplier(
    world_position: Vec3,
    camera: &CameraState,
    screen_size_fixed: bool,
    base_scale: f32,
) -> f32 {
    if screen_size_fixed {
        base_scale * screen_to_world_multiplier(world_position, camera)
    } else {
        base_scale
    }
}
