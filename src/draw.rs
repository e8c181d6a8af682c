//! Manipulator rendering systems.
//!
//! Views draw through [`GizmoDisplay`], which turns every [`DebugDisplay`]
//! primitive into line segments on Bevy's `Gizmos` API.

use std::f32::consts::PI;

use bevy::input::mouse::MouseButton;
use bevy::input::ButtonInput;
use bevy::log::trace;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::bound_registry::ManipulatorBoundRegistry;
use crate::debug_display::DebugDisplay;
use crate::interaction::mouse_interaction;
use crate::math::axis_basis;
use crate::types::{
    CameraState, Manipulator, ManipulatorCamera, ManipulatorId, ManipulatorInteraction,
    ManipulatorState, ManipulatorViewConfig,
};
use crate::views::ViewDrawContext;

/// Number of line segments used to draw cones, cylinders and circles.
const CONE_SEGMENTS: usize = 16;

/// Number of line segments used to draw manipulator rings.
const CIRCLE_SEGMENTS: usize = 64;

/// How far geometry drawn without depth testing is pulled toward the camera.
const NO_DEPTH_NUDGE: f32 = 0.02;

/// Points on a circle of `radius` around `axis`, first point repeated at the end.
fn circle_points(center: Vec3, radius: f32, axis: Vec3, segments: usize) -> Vec<Vec3> {
    let (t1, t2) = axis_basis(axis);
    (0..=segments)
        .map(|i| {
            let angle = 2.0 * PI * (i as f32) / (segments as f32);
            center + (t1 * angle.cos() + t2 * angle.sin()) * radius
        })
        .collect()
}

/// Segments of a circle whose half facing away from `view_position` is dotted.
fn half_dotted_circle_segments(
    center: Vec3,
    radius: f32,
    axis: Vec3,
    view_position: Vec3,
) -> Vec<(Vec3, Vec3)> {
    let to_view = view_position - center;
    circle_points(center, radius, axis, CIRCLE_SEGMENTS)
        .windows(2)
        .enumerate()
        .filter(|(i, pair)| {
            let mid = (pair[0] + pair[1]) * 0.5;
            let facing = (mid - center).dot(to_view) >= 0.0;
            facing || i % 2 == 0
        })
        .map(|(_, pair)| (pair[0], pair[1]))
        .collect()
}

/// Corners and edges of an oriented box.
fn obb_edges(center: Vec3, orientation: Quat, half_extents: Vec3) -> Vec<(Vec3, Vec3)> {
    let h = half_extents;
    let corners = [
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(-h.x, -h.y, h.z),
        Vec3::new(-h.x, h.y, -h.z),
        Vec3::new(-h.x, h.y, h.z),
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(h.x, -h.y, h.z),
        Vec3::new(h.x, h.y, -h.z),
        Vec3::new(h.x, h.y, h.z),
    ];
    let corners: Vec<Vec3> = corners.iter().map(|c| center + orientation * *c).collect();

    let edges = [
        (0, 1),
        (0, 2),
        (0, 4),
        (1, 3),
        (1, 5),
        (2, 3),
        (2, 6),
        (3, 7),
        (4, 5),
        (4, 6),
        (5, 7),
        (6, 7),
    ];
    edges
        .iter()
        .map(|&(i0, i1)| (corners[i0], corners[i1]))
        .collect()
}

/// [`DebugDisplay`] over Bevy's immediate-mode `Gizmos`.
///
/// Solid primitives are drawn as wireframes. Line width is global to the
/// gizmo config group (see `configure_gizmos`), and culling has no meaning
/// for lines, so both are accepted and ignored. With depth testing off,
/// geometry is nudged toward the camera so it draws over nearby handles.
pub struct GizmoDisplay<'a, 'w, 's> {
    gizmos: &'a mut Gizmos<'w, 's>,
    camera_position: Vec3,
    color: Color,
    depth_test: bool,
    matrices: Vec<Mat4>,
}

impl<'a, 'w, 's> GizmoDisplay<'a, 'w, 's> {
    /// Display drawing into `gizmos` for a camera at `camera_position`.
    pub fn new(gizmos: &'a mut Gizmos<'w, 's>, camera_position: Vec3) -> Self {
        Self {
            gizmos,
            camera_position,
            color: Color::WHITE,
            depth_test: true,
            matrices: Vec::new(),
        }
    }

    fn world_point(&self, point: Vec3) -> Vec3 {
        let point = self
            .matrices
            .last()
            .map_or(point, |matrix| matrix.transform_point3(point));
        if self.depth_test {
            point
        } else {
            point + (self.camera_position - point).normalize_or_zero() * NO_DEPTH_NUDGE
        }
    }

    fn line(&mut self, start: Vec3, end: Vec3) {
        let start = self.world_point(start);
        let end = self.world_point(end);
        self.gizmos.line(start, end, self.color);
    }

    fn polyline(&mut self, points: &[Vec3]) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1]);
        }
    }
}

impl DebugDisplay for GizmoDisplay<'_, '_, '_> {
    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn set_line_width(&mut self, _width: f32) {}

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_culling(&mut self, _enabled: bool) {}

    fn push_matrix(&mut self, matrix: Mat4) {
        let top = self.matrices.last().copied().unwrap_or(Mat4::IDENTITY);
        self.matrices.push(top * matrix);
    }

    fn pop_matrix(&mut self) {
        self.matrices.pop();
    }

    fn draw_line(&mut self, start: Vec3, end: Vec3) {
        self.line(start, end);
    }

    fn draw_quad(&mut self, corners: [Vec3; 4]) {
        for i in 0..4 {
            self.line(corners[i], corners[(i + 1) % 4]);
        }
        self.line(corners[0], corners[2]);
        self.line(corners[1], corners[3]);
    }

    fn draw_solid_cone(&mut self, base: Vec3, direction: Vec3, radius: f32, height: f32) {
        let direction = direction.normalize_or_zero();
        let tip = base + direction * height;
        let ring = circle_points(base, radius, direction, CONE_SEGMENTS);
        for pair in ring.windows(2) {
            self.line(tip, pair[0]);
            self.line(pair[0], pair[1]);
        }
    }

    fn draw_solid_obb(&mut self, center: Vec3, orientation: Quat, half_extents: Vec3) {
        for (start, end) in obb_edges(center, orientation, half_extents) {
            self.line(start, end);
        }
    }

    fn draw_solid_cylinder(&mut self, center: Vec3, direction: Vec3, radius: f32, height: f32) {
        let direction = direction.normalize_or_zero();
        let half = direction * height * 0.5;
        let bottom = circle_points(center - half, radius, direction, CONE_SEGMENTS);
        let top = circle_points(center + half, radius, direction, CONE_SEGMENTS);
        self.polyline(&bottom);
        self.polyline(&top);
        for (b, t) in bottom.iter().zip(&top).step_by(CONE_SEGMENTS / 4) {
            self.line(*b, *t);
        }
    }

    fn draw_ball(&mut self, center: Vec3, radius: f32) {
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let ring = circle_points(center, radius, axis, CONE_SEGMENTS * 2);
            self.polyline(&ring);
        }
    }

    fn draw_circle(&mut self, center: Vec3, radius: f32, axis: Vec3) {
        let ring = circle_points(center, radius, axis, CIRCLE_SEGMENTS);
        self.polyline(&ring);
    }

    fn draw_half_dotted_circle(&mut self, center: Vec3, radius: f32, axis: Vec3, view_position: Vec3) {
        for (start, end) in half_dotted_circle_segments(center, radius, axis, view_position) {
            self.line(start, end);
        }
    }
}

/// Rigid world-from-local transform and folded scale of a manipulator entity.
fn manipulator_state(
    global: &GlobalTransform,
    manipulator: &Manipulator,
    mouse_over: bool,
) -> ManipulatorState {
    let (scale, rotation, translation) = global.to_scale_rotation_translation();
    ManipulatorState {
        world_from_local: Transform::from_translation(translation).with_rotation(rotation),
        non_uniform_scale: scale * manipulator.non_uniform_scale,
        local_position: manipulator.local_position,
        mouse_over,
    }
}

/// Draw every manipulator's views and refresh their hit bounds.
///
/// Views of manipulators whose entity moved or whose [`Manipulator`] was
/// modified since the last run are marked dirty first, so world-sized views
/// pick up the new placement.
#[allow(clippy::too_many_arguments)]
pub fn draw_manipulators(
    config: Res<ManipulatorViewConfig>,
    interaction: Res<ManipulatorInteraction>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut registry: ResMut<ManipulatorBoundRegistry>,
    cameras: Query<(&Camera, &GlobalTransform, &Projection), With<ManipulatorCamera>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut manipulators: Query<(Entity, Ref<GlobalTransform>, Mut<Manipulator>)>,
    mut gizmos: Gizmos,
) {
    let Some((camera, camera_transform, projection)) = cameras.iter().next() else {
        return;
    };

    let viewport_size = camera.logical_viewport_size().unwrap_or(Vec2::ONE);
    let camera_state = CameraState::from_camera(camera_transform, projection, viewport_size);
    let mouse = mouse_interaction(&buttons, camera, camera_transform, windows.iter().next());
    let manager_state = interaction.manager_state();
    let manager_id = registry.manager_id();

    let mut display = GizmoDisplay::new(&mut gizmos, camera_state.position);

    for (entity, global, mut manipulator) in manipulators.iter_mut() {
        let manipulator_id = ManipulatorId::from(entity);
        let moved = global.is_changed() || manipulator.is_changed();
        // Refreshing views must not count as a change on the next run.
        let manipulator = manipulator.bypass_change_detection();
        if moved {
            trace!("{manipulator_id} changed, dirtying its views");
            for view in manipulator.views.iter_mut() {
                view.set_bound_dirty(&mut registry);
            }
        }

        let mouse_over =
            interaction.hovered == Some(manipulator_id) || interaction.active == Some(manipulator_id);
        let state = manipulator_state(&global, manipulator, mouse_over);

        let ctx = ViewDrawContext {
            manager_id,
            manipulator_id,
            manager_state,
            camera: &camera_state,
            mouse: &mouse,
            config: &config,
        };

        trace!("drawing {} views for {manipulator_id}", manipulator.views.len());
        for view in manipulator.views.iter_mut() {
            view.draw(&ctx, &state, &mut display, &mut registry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundShape;
    use crate::views::ManipulatorView;
    use approx::assert_relative_eq;
    use bevy::gizmos::config::{DefaultGizmoConfigGroup, GizmoConfig, GizmoConfigStore};
    use bevy::gizmos::gizmos::GizmoStorage;
    use bevy::math::Ray3d;

    fn world() -> World {
        let mut world = World::new();
        let mut store = GizmoConfigStore::default();
        store.insert(GizmoConfig::default(), DefaultGizmoConfigGroup);
        world.insert_resource(store);
        world.init_resource::<GizmoStorage<DefaultGizmoConfigGroup, ()>>();
        world.init_resource::<ButtonInput<MouseButton>>();
        world.init_resource::<ManipulatorViewConfig>();
        world.init_resource::<ManipulatorInteraction>();
        world.init_resource::<ManipulatorBoundRegistry>();
        world.spawn((
            Camera::default(),
            GlobalTransform::from(
                Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
            ),
            Projection::default(),
            ManipulatorCamera,
        ));
        world
    }

    fn sphere_center(world: &World, entity: Entity) -> Vec3 {
        let bound_id = world.get::<Manipulator>(entity).unwrap().views[0]
            .bound_id()
            .unwrap();
        match world.resource::<ManipulatorBoundRegistry>().bound(bound_id) {
            Some(BoundShape::Sphere(sphere)) => sphere.center,
            other => panic!("unexpected bound {other:?}"),
        }
    }

    fn world_sized_sphere() -> Manipulator {
        Manipulator::new(vec![
            ManipulatorView::sphere(Color::WHITE, 0.2, true).screen_size_fixed(false)
        ])
    }

    #[test]
    fn moving_entity_moves_world_sized_bound() {
        let mut world = world();
        let system = world.register_system(draw_manipulators);
        let entity = world.spawn((GlobalTransform::IDENTITY, world_sized_sphere())).id();

        world.run_system(system).unwrap();
        assert!(sphere_center(&world, entity).abs_diff_eq(Vec3::ZERO, 1e-6));

        world
            .entity_mut(entity)
            .insert(GlobalTransform::from_xyz(5.0, 0.0, 0.0));
        world.run_system(system).unwrap();
        assert!(sphere_center(&world, entity).abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-6));

        let ray = Ray3d {
            origin: Vec3::new(5.0, 0.0, 10.0),
            direction: Dir3::NEG_Z,
        };
        let hit = world.resource::<ManipulatorBoundRegistry>().raycast(&ray).unwrap();
        assert_eq!(hit.manipulator_id, ManipulatorId::from(entity));
    }

    #[test]
    fn editing_manipulator_anchor_moves_world_sized_bound() {
        let mut world = world();
        let system = world.register_system(draw_manipulators);
        let entity = world
            .spawn((
                GlobalTransform::IDENTITY,
                world_sized_sphere().with_local_position(Vec3::X),
            ))
            .id();

        world.run_system(system).unwrap();
        assert!(sphere_center(&world, entity).abs_diff_eq(Vec3::X, 1e-6));

        world.get_mut::<Manipulator>(entity).unwrap().local_position = Vec3::new(0.0, 2.0, 0.0);
        world.run_system(system).unwrap();
        assert!(sphere_center(&world, entity).abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn circle_points_lie_on_the_ring() {
        let center = Vec3::new(1.0, -2.0, 3.0);
        let axis = Vec3::new(1.0, 1.0, 0.0).normalize();
        let points = circle_points(center, 2.5, axis, 32);
        assert_eq!(points.len(), 33);
        assert!(points[0].abs_diff_eq(points[32], 1e-5));
        for point in points {
            assert_relative_eq!(point.distance(center), 2.5, epsilon = 1e-4);
            assert_relative_eq!((point - center).dot(axis), 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn far_half_of_circle_is_dotted() {
        let view = Vec3::new(0.0, 10.0, 0.0);
        let segments = half_dotted_circle_segments(Vec3::ZERO, 1.0, Vec3::Z, view);
        let (near, far): (Vec<(Vec3, Vec3)>, Vec<(Vec3, Vec3)>) = segments
            .into_iter()
            .partition(|(a, b)| ((*a + *b) * 0.5).y >= 0.0);
        assert_eq!(near.len(), CIRCLE_SEGMENTS / 2);
        assert_eq!(far.len(), CIRCLE_SEGMENTS / 4);
    }

    #[test]
    fn obb_edges_follow_orientation() {
        let orientation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let edges = obb_edges(Vec3::X, orientation, Vec3::new(2.0, 0.5, 0.5));
        assert_eq!(edges.len(), 12);
        for (start, end) in edges {
            let length = start.distance(end);
            let along_y = (end - start).normalize().dot(Vec3::Y).abs();
            // The long edges end up along world Y.
            if (length - 4.0).abs() < 1e-4 {
                assert_relative_eq!(along_y, 1.0, epsilon = 1e-4);
            } else {
                assert_relative_eq!(length, 1.0, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn entity_scale_folds_into_non_uniform_scale() {
        let global = GlobalTransform::from(
            Transform::from_xyz(1.0, 2.0, 3.0)
                .with_rotation(Quat::from_rotation_y(0.5))
                .with_scale(Vec3::new(2.0, 1.0, 3.0)),
        );
        let manipulator = Manipulator {
            non_uniform_scale: Vec3::new(1.0, 4.0, 1.0),
            ..Manipulator::new(Vec::new())
        };
        let state = manipulator_state(&global, &manipulator, true);
        assert!(state.world_from_local.scale.abs_diff_eq(Vec3::ONE, 1e-5));
        assert!(state
            .world_from_local
            .translation
            .abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
        assert!(state.non_uniform_scale.abs_diff_eq(Vec3::new(2.0, 4.0, 3.0), 1e-4));
        assert!(state.mouse_over);
    }
}
