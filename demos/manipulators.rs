//! Manipulator views example.
//!
//! Spawns one manipulator of each preset around a cube, plus a pickable
//! spline. Hover to highlight, click to start an interaction.
//! Use B to toggle hit-bound debug drawing, F to toggle screen-size-fixed
//! views.

use std::sync::Arc;

use bevy::prelude::*;
use bevy_manipulator_views::{
    angular_views, linear_scale_views, linear_translation_views, planar_translation_views,
    surface_views, LinearSpline, Manipulator, ManipulatorBoundRegistry, ManipulatorCamera,
    ManipulatorId, ManipulatorInteraction, ManipulatorView, ManipulatorViewConfig,
    ManipulatorViewPlugin, Spline,
};

#[derive(Component)]
struct Hud;

/// Keeps the demo spline alive; views only hold a weak reference.
#[derive(Resource)]
struct DemoSpline(#[allow(dead_code)] Arc<dyn Spline>);

const RED: Color = Color::srgb(1.0, 0.2, 0.2);
const GREEN: Color = Color::srgb(0.2, 1.0, 0.2);
const BLUE: Color = Color::srgb(0.3, 0.4, 1.0);
const ORANGE: Color = Color::srgb(1.0, 0.6, 0.1);

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(ManipulatorViewPlugin)
        .add_systems(Startup, setup)
        .add_systems(Update, (keyboard_controls, update_hud))
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(6.0, 6.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
        ManipulatorCamera,
    ));

    // Light
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 15.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Ground
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(10.0)))),
        MeshMaterial3d(materials.add(Color::srgb(0.2, 0.35, 0.18))),
    ));

    // Cube the manipulators sit on
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::from_length(1.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.2, 0.7, 1.0))),
        Transform::from_xyz(0.0, 0.5, 0.0),
    ));

    let anchor = Transform::from_xyz(0.0, 0.5, 0.0);
    for (axis, color) in [(Vec3::X, RED), (Vec3::Y, GREEN), (Vec3::Z, BLUE)] {
        commands.spawn((anchor, Manipulator::new(linear_translation_views(axis, color))));
    }
    commands.spawn((
        anchor,
        Manipulator::new(planar_translation_views(Vec3::X, Vec3::Z, RED, BLUE)),
    ));
    let surface = surface_views(Color::WHITE)
        .into_iter()
        .map(|view| view.with_mouse_over_color(ORANGE))
        .collect();
    commands.spawn((anchor, Manipulator::new(surface)));

    commands.spawn((
        Transform::from_xyz(-4.0, 0.5, 0.0),
        Manipulator::new(angular_views(Vec3::Y, GREEN)),
    ));
    commands.spawn((
        Transform::from_xyz(4.0, 0.5, 0.0),
        Manipulator::new(linear_scale_views(Vec3::Y, GREEN)),
    ));

    let spline: Arc<dyn Spline> = Arc::new(LinearSpline::new(vec![
        Vec3::new(-3.0, 0.05, 3.0),
        Vec3::new(-1.0, 0.05, 4.0),
        Vec3::new(1.0, 0.05, 3.0),
        Vec3::new(3.0, 0.05, 4.0),
    ]));
    commands.spawn((
        Transform::IDENTITY,
        Manipulator::new(vec![ManipulatorView::spline_select(&spline, 0.1, Color::WHITE)]),
    ));
    commands.insert_resource(DemoSpline(spline));

    // HUD
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
    )).with_children(|p| {
        p.spawn((
            Text::new(""),
            TextFont { font_size: 14.0, ..default() },
            TextColor(Color::WHITE),
            Hud,
        ));
    });
}

fn keyboard_controls(
    keys: Res<ButtonInput<KeyCode>>,
    mut config: ResMut<ManipulatorViewConfig>,
    mut registry: ResMut<ManipulatorBoundRegistry>,
    mut manipulators: Query<&mut Manipulator>,
) {
    if keys.just_pressed(KeyCode::KeyB) {
        config.debug_bounds_visible = !config.debug_bounds_visible;
    }
    if keys.just_pressed(KeyCode::KeyF) {
        for mut manipulator in manipulators.iter_mut() {
            for view in manipulator.views.iter_mut() {
                let fixed = !view.is_screen_size_fixed();
                view.set_screen_size_fixed(fixed, &mut registry);
            }
        }
    }
}

fn update_hud(
    config: Res<ManipulatorViewConfig>,
    interaction: Res<ManipulatorInteraction>,
    registry: Res<ManipulatorBoundRegistry>,
    mut query: Query<&mut Text, With<Hud>>,
) {
    let Ok(mut text) = query.single_mut() else { return };

    let describe =
        |id: Option<ManipulatorId>| id.map_or_else(|| "none".to_string(), |id| id.to_string());
    text.0 = format!(
        "Hovered: {} | Active: {} | Bounds: {}\n\n\
         [B] Debug bounds ({})\n\
         [F] Toggle screen-size-fixed",
        describe(interaction.hovered),
        describe(interaction.active),
        registry.len(),
        if config.debug_bounds_visible { "on" } else { "off" },
    );
}
