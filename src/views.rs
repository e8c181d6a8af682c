//! Manipulator views: the visual and hit-test representation of one part of
//! a manipulator.
//!
//! Every view follows the same per-frame skeleton in [`ManipulatorView::draw`]:
//! camera-correct its axes, compute the view scale, compute the visual bound,
//! draw it, then compute the (usually larger) hit bound and refresh it in the
//! [`ManipulatorBoundRegistry`].

use std::sync::{Arc, Weak};

use bevy::log::{debug, warn};
use bevy::prelude::*;

use crate::axis_correction::{is_interacting, CameraCorrectedAxis};
use crate::bound_registry::{BoundId, ManipulatorBoundRegistry};
use crate::bounds::{
    calculate_box_bound, calculate_cone_bound, calculate_cylinder_bound, calculate_line_bound,
    calculate_quad_bound, calculate_quad_bound_billboard, calculate_quad_hit_bound,
    calculate_sphere_bound, calculate_spline_bound, calculate_torus_bound, closest_spline_hit,
    BoundShape, Spline,
};
use crate::debug_display::{draw_bound_shape, DebugDisplay};
use crate::math::{closest_point_ray_segment, shortest_arc, transform_point};
use crate::types::{
    CameraState, ManipulatorId, ManipulatorManagerId, ManipulatorManagerState, ManipulatorState,
    ManipulatorViewConfig, MouseInteraction,
};
use crate::view_scale::view_scale_multiplier;

/// Radius of the marker ball drawn under the cursor by selection views.
pub const DEFAULT_MANIPULATOR_SPHERE_RADIUS: f32 = 0.1;

/// Alpha of the fill drawn over a hovered quad.
const QUAD_HOVER_FILL_ALPHA: f32 = 0.5;

/// Highlight colour used when no mouse-over colour is given.
fn default_mouse_over_color() -> Color {
    Color::srgb(1.0, 1.0, 0.0)
}

fn view_color(mouse_over: bool, color: Color, mouse_over_color: Color) -> Color {
    if mouse_over {
        mouse_over_color
    } else {
        color
    }
}

fn with_alpha(color: Color, alpha: f32) -> Color {
    let srgba = color.to_srgba();
    Color::srgba(srgba.red, srgba.green, srgba.blue, alpha)
}

/// Everything a view needs to know about the frame it is drawn in.
#[derive(Debug, Clone, Copy)]
pub struct ViewDrawContext<'a> {
    /// Manager owning the bound registry.
    pub manager_id: ManipulatorManagerId,
    /// Manipulator owning the view.
    pub manipulator_id: ManipulatorId,
    /// Whether any manipulator is being dragged.
    pub manager_state: ManipulatorManagerState,
    /// Camera for this frame.
    pub camera: &'a CameraState,
    /// Pointer state for this frame.
    pub mouse: &'a MouseInteraction,
    /// Drawing tunables.
    pub config: &'a ManipulatorViewConfig,
}

impl ViewDrawContext<'_> {
    /// Whether camera correction is frozen this frame.
    pub fn interacting(&self) -> bool {
        is_interacting(&self.manager_state, self.mouse)
    }

    fn line_width(&self, mouse_over: bool) -> f32 {
        if mouse_over {
            self.config.mouse_over_line_width
        } else {
            self.config.default_line_width
        }
    }

    fn correct(&self, corrected: &mut CameraCorrectedAxis, axis: Vec3, state: &ManipulatorState) {
        corrected.update(
            axis,
            self.interacting(),
            self.camera.position,
            &state.world_from_local,
            state.local_position,
        );
    }
}

/// How a [`CircleView`] draws its ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircleStyle {
    /// The half of the ring facing away from the camera is dotted.
    #[default]
    HalfDotted,
    /// A plain ring.
    Full,
}

/// Planar handle spanned by two axes.
#[derive(Debug, Clone)]
pub struct QuadView {
    /// First edge direction.
    pub axis1: Vec3,
    /// Second edge direction.
    pub axis2: Vec3,
    /// Side length.
    pub size: f32,
    /// Colour of the two edges meeting at the anchor-plus-`axis2` corner.
    pub axis1_color: Color,
    /// Colour of the two edges meeting at the anchor-plus-`axis1` corner.
    pub axis2_color: Color,
    /// Colour used while hovered.
    pub mouse_over_color: Color,
    corrected_axis1: CameraCorrectedAxis,
    corrected_axis2: CameraCorrectedAxis,
}

impl QuadView {
    fn draw(
        &mut self,
        ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        view_scale: f32,
    ) -> BoundShape {
        ctx.correct(&mut self.corrected_axis1, self.axis1, state);
        ctx.correct(&mut self.corrected_axis2, self.axis2, state);
        let axis1 = self.corrected_axis1.axis();
        let axis2 = self.corrected_axis2.axis();
        let size = self.size * view_scale;

        let visual = calculate_quad_bound(state.local_position, state, axis1, axis2, size);

        display.set_line_width(ctx.line_width(state.mouse_over));
        display.set_color(view_color(state.mouse_over, self.axis1_color, self.mouse_over_color));
        display.draw_line(visual.corner4, visual.corner3);
        display.draw_line(visual.corner1, visual.corner4);
        display.set_color(view_color(state.mouse_over, self.axis2_color, self.mouse_over_color));
        display.draw_line(visual.corner2, visual.corner3);
        display.draw_line(visual.corner1, visual.corner2);

        if state.mouse_over {
            display.set_color(with_alpha(self.mouse_over_color, QUAD_HOVER_FILL_ALPHA));
            display.set_culling(false);
            display.draw_quad(visual.corners());
            display.set_culling(true);
        }

        BoundShape::Quad(calculate_quad_hit_bound(
            state.local_position,
            state,
            axis1,
            axis2,
            size,
            ctx.config.hit_region_scale_factor,
        ))
    }
}

/// Camera-facing square.
#[derive(Debug, Clone)]
pub struct QuadBillboardView {
    /// Side length.
    pub size: f32,
    /// Idle colour.
    pub color: Color,
    /// Colour used while hovered.
    pub mouse_over_color: Color,
}

impl QuadBillboardView {
    fn draw(
        &mut self,
        ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        view_scale: f32,
    ) -> BoundShape {
        let visual = calculate_quad_bound_billboard(
            state.local_position,
            state,
            self.size * view_scale,
            ctx.camera,
        );
        display.set_color(view_color(state.mouse_over, self.color, self.mouse_over_color));
        display.draw_quad(visual.corners());
        BoundShape::Quad(visual)
    }
}

/// Straight line along an axis, such as the shaft of an arrow.
#[derive(Debug, Clone)]
pub struct LineView {
    /// Direction of the line.
    pub axis: Vec3,
    /// Length of the line.
    pub length: f32,
    /// Pick width of the line.
    pub width: f32,
    /// Idle colour.
    pub color: Color,
    /// Colour used while hovered.
    pub mouse_over_color: Color,
    corrected_axis: CameraCorrectedAxis,
}

impl LineView {
    fn draw(
        &mut self,
        ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        view_scale: f32,
    ) -> BoundShape {
        ctx.correct(&mut self.corrected_axis, self.axis, state);
        let axis = self.corrected_axis.axis();
        let width = self.width * view_scale;

        let visual = calculate_line_bound(
            state.local_position,
            state,
            axis,
            self.length * view_scale,
            width,
        );
        display.set_line_width(ctx.line_width(state.mouse_over));
        display.set_color(view_color(state.mouse_over, self.color, self.mouse_over_color));
        display.draw_line(visual.start, visual.end);

        // Shortened so the tip does not overlap whatever caps the line.
        BoundShape::LineSegment(calculate_line_bound(
            state.local_position,
            state,
            axis,
            (self.length - self.width) * view_scale,
            width,
        ))
    }
}

/// Pickable segment between two local points, with a marker under the cursor.
#[derive(Debug, Clone)]
pub struct LineSelectView {
    /// Segment start in local space.
    pub local_start: Vec3,
    /// Segment end in local space.
    pub local_end: Vec3,
    /// Pick width of the segment.
    pub width: f32,
    /// Colour of the hover marker.
    pub color: Color,
}

impl LineSelectView {
    fn draw(
        &mut self,
        ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        view_scale: f32,
    ) -> BoundShape {
        let delta = self.local_end - self.local_start;
        let bound = calculate_line_bound(
            self.local_start,
            state,
            delta.normalize_or_zero(),
            delta.length(),
            self.width,
        );

        if state.mouse_over {
            if let Some(ray) = ctx.mouse.ray {
                let (_, hit_point, _) = closest_point_ray_segment(&ray, bound.start, bound.end);
                display.set_color(self.color);
                display.draw_ball(hit_point, DEFAULT_MANIPULATOR_SPHERE_RADIUS * view_scale);
            }
        }

        BoundShape::LineSegment(bound)
    }
}

/// Cone, such as the head of a translation arrow.
#[derive(Debug, Clone)]
pub struct ConeView {
    /// Direction from base to apex.
    pub axis: Vec3,
    /// Offset of the base from the manipulator anchor.
    pub offset: Vec3,
    /// Distance from base to apex.
    pub length: f32,
    /// Base radius.
    pub radius: f32,
    /// Idle colour.
    pub color: Color,
    /// Colour used while hovered.
    pub mouse_over_color: Color,
    /// Whether the cone flips to face the camera.
    pub should_correct: bool,
    corrected_axis: CameraCorrectedAxis,
}

impl ConeView {
    fn draw(
        &mut self,
        ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        view_scale: f32,
    ) -> BoundShape {
        if self.should_correct {
            ctx.correct(&mut self.corrected_axis, self.axis, state);
        }
        // The offset follows the axis so the head stays on the flipped shaft.
        let sign = if self.should_correct && self.corrected_axis.flipped() {
            -1.0
        } else {
            1.0
        };

        let cone = calculate_cone_bound(
            state.local_position,
            state,
            self.axis * sign,
            self.offset * sign * view_scale,
            self.length * view_scale,
            self.radius * view_scale,
        );
        display.set_color(view_color(state.mouse_over, self.color, self.mouse_over_color));
        display.draw_solid_cone(cone.base, cone.axis, cone.radius, cone.height);

        BoundShape::Cone(cone)
    }
}

/// Oriented box, such as the head of a scale handle.
#[derive(Debug, Clone)]
pub struct BoxView {
    /// Local orientation of the box.
    pub orientation: Quat,
    /// Offset of the box centre from the manipulator anchor.
    pub offset: Vec3,
    /// Half size along each local axis.
    pub half_extents: Vec3,
    /// Idle colour.
    pub color: Color,
    /// Colour used while hovered.
    pub mouse_over_color: Color,
    corrected_offset: CameraCorrectedAxis,
}

impl BoxView {
    fn draw(
        &mut self,
        ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        view_scale: f32,
    ) -> BoundShape {
        ctx.correct(&mut self.corrected_offset, self.offset, state);

        let cuboid = calculate_box_bound(
            state.local_position,
            state,
            self.orientation,
            self.corrected_offset.axis() * view_scale,
            self.half_extents * view_scale,
        );
        display.set_color(view_color(state.mouse_over, self.color, self.mouse_over_color));
        display.draw_solid_obb(cuboid.center, cuboid.orientation, cuboid.half_extents);

        BoundShape::Box(cuboid)
    }
}

/// Cylinder along an axis.
#[derive(Debug, Clone)]
pub struct CylinderView {
    /// Direction of the cylinder.
    pub axis: Vec3,
    /// Cylinder length.
    pub length: f32,
    /// Cylinder radius.
    pub radius: f32,
    /// Idle colour.
    pub color: Color,
    /// Colour used while hovered.
    pub mouse_over_color: Color,
    corrected_axis: CameraCorrectedAxis,
}

impl CylinderView {
    fn draw(
        &mut self,
        ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        view_scale: f32,
    ) -> BoundShape {
        ctx.correct(&mut self.corrected_axis, self.axis, state);

        let cylinder = calculate_cylinder_bound(
            state.local_position,
            state,
            self.corrected_axis.axis(),
            Vec3::ZERO,
            self.length * view_scale,
            self.radius * view_scale,
        );
        let axis = cylinder.axis.normalize_or_zero();
        display.set_color(view_color(state.mouse_over, self.color, self.mouse_over_color));
        display.draw_solid_cylinder(
            cylinder.base + axis * cylinder.height * 0.5,
            axis,
            cylinder.radius,
            cylinder.height,
        );

        BoundShape::Cylinder(cylinder)
    }
}

/// Ball centred on the manipulator anchor.
#[derive(Debug, Clone)]
pub struct SphereView {
    /// Ball radius.
    pub radius: f32,
    /// Idle colour.
    pub color: Color,
    /// Colour used while hovered.
    pub mouse_over_color: Color,
    /// When false the ball is drawn on top of all geometry.
    pub depth_test: bool,
}

impl SphereView {
    fn draw(
        &mut self,
        _ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        view_scale: f32,
    ) -> BoundShape {
        let sphere = calculate_sphere_bound(state.local_position, state, self.radius * view_scale);

        display.set_color(view_color(state.mouse_over, self.color, self.mouse_over_color));
        if !self.depth_test {
            display.set_depth_test(false);
        }
        display.draw_ball(sphere.center, sphere.radius);
        if !self.depth_test {
            display.set_depth_test(true);
        }

        BoundShape::Sphere(sphere)
    }
}

/// Geometry shared by the circle views.
#[derive(Debug, Clone)]
pub struct CircleGeometry {
    /// Axis the circle is drawn around.
    pub axis: Vec3,
    /// Circle radius.
    pub radius: f32,
    /// Pick thickness of the ring.
    pub width: f32,
    /// Idle colour.
    pub color: Color,
    /// Colour used while hovered.
    pub mouse_over_color: Color,
}

impl CircleGeometry {
    /// Draw a canonical Z-up circle reoriented onto `axis`, and return its
    /// torus bound.
    fn draw(
        &self,
        ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        view_scale: f32,
        style: CircleStyle,
    ) -> BoundShape {
        let radius = self.radius * view_scale;
        let width = self.width * view_scale;

        let world_position = transform_point(state, state.local_position);
        let orientation = state.world_from_local.rotation * shortest_arc(Vec3::Z, self.axis);
        let world_from_circle = Mat4::from_rotation_translation(orientation, world_position);

        display.set_line_width(ctx.line_width(state.mouse_over));
        display.set_color(view_color(state.mouse_over, self.color, self.mouse_over_color));
        display.push_matrix(world_from_circle);
        match style {
            CircleStyle::HalfDotted => {
                let view_position = world_from_circle.inverse().transform_point3(ctx.camera.position);
                display.draw_half_dotted_circle(Vec3::ZERO, radius, Vec3::Z, view_position);
            }
            CircleStyle::Full => display.draw_circle(Vec3::ZERO, radius, Vec3::Z),
        }
        display.pop_matrix();

        BoundShape::Torus(calculate_torus_bound(
            state.local_position,
            state,
            self.axis,
            radius,
            width,
        ))
    }
}

/// Ring around an axis, such as an angular (rotation) handle.
#[derive(Debug, Clone)]
pub struct CircleView {
    /// Ring geometry and colours.
    pub circle: CircleGeometry,
    /// How the ring is drawn.
    pub style: CircleStyle,
}

/// Ring drawn on top of all geometry, typically around the view direction.
#[derive(Debug, Clone)]
pub struct ProjectedCircleView {
    /// Ring geometry and colours.
    pub circle: CircleGeometry,
}

/// Pickable externally owned curve, with a marker under the cursor.
#[derive(Clone)]
pub struct SplineSelectView {
    /// The curve. Nothing is drawn or picked once its owner drops it.
    pub spline: Weak<dyn Spline>,
    /// Pick width of the curve.
    pub width: f32,
    /// Colour of the hover marker.
    pub color: Color,
}

impl std::fmt::Debug for SplineSelectView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplineSelectView")
            .field("alive", &(self.spline.strong_count() > 0))
            .field("width", &self.width)
            .field("color", &self.color)
            .finish()
    }
}

impl SplineSelectView {
    fn draw(
        &mut self,
        ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        view_scale: f32,
    ) -> Option<BoundShape> {
        let spline = self.spline.upgrade()?;

        if state.mouse_over {
            let hit = ctx
                .mouse
                .ray
                .and_then(|ray| closest_spline_hit(spline.as_ref(), &state.world_from_local, &ray));
            if let Some(hit) = hit {
                display.set_color(self.color);
                display.draw_ball(hit.position, DEFAULT_MANIPULATOR_SPHERE_RADIUS * view_scale);
            }
        }

        Some(BoundShape::Spline(calculate_spline_bound(&spline, state, self.width)))
    }
}

/// The closed set of view primitives.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum ManipulatorViewKind {
    Quad(QuadView),
    QuadBillboard(QuadBillboardView),
    Line(LineView),
    LineSelect(LineSelectView),
    Cone(ConeView),
    Box(BoxView),
    Cylinder(CylinderView),
    Sphere(SphereView),
    ProjectedCircle(ProjectedCircleView),
    Circle(CircleView),
    SplineSelect(SplineSelectView),
}

impl ManipulatorViewKind {
    /// Flip state of each camera-corrected axis the view carries.
    fn axis_flips(&self) -> [bool; 2] {
        match self {
            Self::Quad(view) => [view.corrected_axis1.flipped(), view.corrected_axis2.flipped()],
            Self::Line(view) => [view.corrected_axis.flipped(), false],
            Self::Cone(view) => [view.corrected_axis.flipped(), false],
            Self::Box(view) => [view.corrected_offset.flipped(), false],
            Self::Cylinder(view) => [view.corrected_axis.flipped(), false],
            Self::QuadBillboard(_)
            | Self::LineSelect(_)
            | Self::Sphere(_)
            | Self::ProjectedCircle(_)
            | Self::Circle(_)
            | Self::SplineSelect(_) => [false; 2],
        }
    }

    /// Whether the hit bound depends on the camera even at a fixed size.
    fn faces_camera(&self) -> bool {
        matches!(self, Self::QuadBillboard(_))
    }
}

/// One rendered, pickable part of a manipulator.
///
/// A view is either unregistered (`bound_id()` is `None`) or holds exactly
/// one live registration in the registry it was first drawn with. The owner
/// must call [`ManipulatorView::invalidate`] when tearing the view down.
/// [`Manipulator`](crate::Manipulator) releases its views' bounds itself when
/// it is replaced or removed.
#[derive(Debug, Clone)]
pub struct ManipulatorView {
    kind: ManipulatorViewKind,
    screen_size_fixed: bool,
    bound_dirty: bool,
    bound_id: Option<BoundId>,
}

impl ManipulatorView {
    /// Wrap a view primitive. Views start screen-size-fixed and dirty.
    pub fn new(kind: ManipulatorViewKind) -> Self {
        Self {
            kind,
            screen_size_fixed: true,
            bound_dirty: true,
            bound_id: None,
        }
    }

    /// Planar quad spanned by `axis1` and `axis2`.
    pub fn quad(axis1: Vec3, axis2: Vec3, axis1_color: Color, axis2_color: Color, size: f32) -> Self {
        Self::new(ManipulatorViewKind::Quad(QuadView {
            axis1,
            axis2,
            size,
            axis1_color,
            axis2_color,
            mouse_over_color: default_mouse_over_color(),
            corrected_axis1: CameraCorrectedAxis::new(axis1),
            corrected_axis2: CameraCorrectedAxis::new(axis2),
        }))
    }

    /// Camera-facing square.
    pub fn quad_billboard(color: Color, size: f32) -> Self {
        Self::new(ManipulatorViewKind::QuadBillboard(QuadBillboardView {
            size,
            color,
            mouse_over_color: default_mouse_over_color(),
        }))
    }

    /// Line from the anchor along `axis`.
    pub fn line(axis: Vec3, length: f32, width: f32, color: Color) -> Self {
        Self::new(ManipulatorViewKind::Line(LineView {
            axis,
            length,
            width,
            color,
            mouse_over_color: default_mouse_over_color(),
            corrected_axis: CameraCorrectedAxis::new(axis),
        }))
    }

    /// Pickable segment between two local points.
    pub fn line_select(local_start: Vec3, local_end: Vec3, width: f32, color: Color) -> Self {
        Self::new(ManipulatorViewKind::LineSelect(LineSelectView {
            local_start,
            local_end,
            width,
            color,
        }))
    }

    /// Cone whose base sits at the anchor plus `offset`.
    pub fn cone(
        axis: Vec3,
        offset: Vec3,
        length: f32,
        radius: f32,
        color: Color,
        should_correct: bool,
    ) -> Self {
        Self::new(ManipulatorViewKind::Cone(ConeView {
            axis,
            offset,
            length,
            radius,
            color,
            mouse_over_color: default_mouse_over_color(),
            should_correct,
            corrected_axis: CameraCorrectedAxis::new(axis),
        }))
    }

    /// Oriented box centred at the anchor plus `offset`.
    pub fn cuboid(orientation: Quat, offset: Vec3, half_extents: Vec3, color: Color) -> Self {
        Self::new(ManipulatorViewKind::Box(BoxView {
            orientation,
            offset,
            half_extents,
            color,
            mouse_over_color: default_mouse_over_color(),
            corrected_offset: CameraCorrectedAxis::new(offset),
        }))
    }

    /// Cylinder from the anchor along `axis`.
    pub fn cylinder(axis: Vec3, length: f32, radius: f32, color: Color) -> Self {
        Self::new(ManipulatorViewKind::Cylinder(CylinderView {
            axis,
            length,
            radius,
            color,
            mouse_over_color: default_mouse_over_color(),
            corrected_axis: CameraCorrectedAxis::new(axis),
        }))
    }

    /// Ball centred on the anchor.
    pub fn sphere(color: Color, radius: f32, depth_test: bool) -> Self {
        Self::new(ManipulatorViewKind::Sphere(SphereView {
            radius,
            color,
            mouse_over_color: default_mouse_over_color(),
            depth_test,
        }))
    }

    /// Full ring around `axis`, drawn without depth testing.
    pub fn projected_circle(axis: Vec3, radius: f32, width: f32, color: Color) -> Self {
        Self::new(ManipulatorViewKind::ProjectedCircle(ProjectedCircleView {
            circle: CircleGeometry {
                axis,
                radius,
                width,
                color,
                mouse_over_color: default_mouse_over_color(),
            },
        }))
    }

    /// Ring around `axis`.
    pub fn circle(axis: Vec3, radius: f32, width: f32, color: Color, style: CircleStyle) -> Self {
        Self::new(ManipulatorViewKind::Circle(CircleView {
            circle: CircleGeometry {
                axis,
                radius,
                width,
                color,
                mouse_over_color: default_mouse_over_color(),
            },
            style,
        }))
    }

    /// Pickable curve. The view only keeps a weak reference to `spline`.
    pub fn spline_select(spline: &Arc<dyn Spline>, width: f32, color: Color) -> Self {
        Self::new(ManipulatorViewKind::SplineSelect(SplineSelectView {
            spline: Arc::downgrade(spline),
            width,
            color,
        }))
    }

    /// Builder-style setter for the highlight colour. Selection views, which
    /// only draw a hover marker, ignore it.
    pub fn with_mouse_over_color(mut self, color: Color) -> Self {
        match &mut self.kind {
            ManipulatorViewKind::Quad(view) => view.mouse_over_color = color,
            ManipulatorViewKind::QuadBillboard(view) => view.mouse_over_color = color,
            ManipulatorViewKind::Line(view) => view.mouse_over_color = color,
            ManipulatorViewKind::Cone(view) => view.mouse_over_color = color,
            ManipulatorViewKind::Box(view) => view.mouse_over_color = color,
            ManipulatorViewKind::Cylinder(view) => view.mouse_over_color = color,
            ManipulatorViewKind::Sphere(view) => view.mouse_over_color = color,
            ManipulatorViewKind::ProjectedCircle(view) => view.circle.mouse_over_color = color,
            ManipulatorViewKind::Circle(view) => view.circle.mouse_over_color = color,
            ManipulatorViewKind::LineSelect(_) | ManipulatorViewKind::SplineSelect(_) => {}
        }
        self
    }

    /// Builder-style setter for screen-size-fixed mode.
    pub fn screen_size_fixed(mut self, screen_size_fixed: bool) -> Self {
        self.screen_size_fixed = screen_size_fixed;
        self
    }

    /// Switch screen-size-fixed mode on a live view and mark its bound dirty.
    pub fn set_screen_size_fixed(
        &mut self,
        screen_size_fixed: bool,
        registry: &mut ManipulatorBoundRegistry,
    ) {
        self.screen_size_fixed = screen_size_fixed;
        self.set_bound_dirty(registry);
    }

    /// The view primitive.
    pub fn kind(&self) -> &ManipulatorViewKind {
        &self.kind
    }

    /// Mutable access to the view primitive. Marks nothing dirty; call
    /// [`Self::set_bound_dirty`] after changing geometry.
    pub fn kind_mut(&mut self) -> &mut ManipulatorViewKind {
        &mut self.kind
    }

    /// Whether the view keeps a constant apparent size on screen.
    pub fn is_screen_size_fixed(&self) -> bool {
        self.screen_size_fixed
    }

    /// Whether the registered bound needs refreshing on the next draw.
    pub fn is_bound_dirty(&self) -> bool {
        self.bound_dirty
    }

    /// Key of the registered bound, or `None` while unregistered.
    pub fn bound_id(&self) -> Option<BoundId> {
        self.bound_id
    }

    /// Draw the view and refresh its hit bound.
    pub fn draw(
        &mut self,
        ctx: &ViewDrawContext,
        state: &ManipulatorState,
        display: &mut dyn DebugDisplay,
        registry: &mut ManipulatorBoundRegistry,
    ) {
        let view_scale = view_scale_multiplier(
            state.world_position(),
            ctx.camera,
            self.screen_size_fixed,
            ctx.config.manipulator_scale,
        );

        let flips_before = self.kind.axis_flips();
        let bound = match &mut self.kind {
            ManipulatorViewKind::Quad(view) => Some(view.draw(ctx, state, display, view_scale)),
            ManipulatorViewKind::QuadBillboard(view) => {
                Some(view.draw(ctx, state, display, view_scale))
            }
            ManipulatorViewKind::Line(view) => Some(view.draw(ctx, state, display, view_scale)),
            ManipulatorViewKind::LineSelect(view) => {
                Some(view.draw(ctx, state, display, view_scale))
            }
            ManipulatorViewKind::Cone(view) => Some(view.draw(ctx, state, display, view_scale)),
            ManipulatorViewKind::Box(view) => Some(view.draw(ctx, state, display, view_scale)),
            ManipulatorViewKind::Cylinder(view) => Some(view.draw(ctx, state, display, view_scale)),
            ManipulatorViewKind::Sphere(view) => Some(view.draw(ctx, state, display, view_scale)),
            ManipulatorViewKind::ProjectedCircle(view) => {
                display.set_depth_test(false);
                let bound = view
                    .circle
                    .draw(ctx, state, display, view_scale, CircleStyle::Full);
                display.set_depth_test(true);
                Some(bound)
            }
            ManipulatorViewKind::Circle(view) => {
                Some(view.circle.draw(ctx, state, display, view_scale, view.style))
            }
            ManipulatorViewKind::SplineSelect(view) => view.draw(ctx, state, display, view_scale),
        };

        // Only a spline view whose curve has been dropped yields no bound.
        let Some(bound) = bound else {
            self.invalidate(registry);
            return;
        };

        if self.kind.axis_flips() != flips_before {
            self.bound_dirty = true;
        }

        if ctx.config.debug_bounds_visible {
            display.set_color(ctx.config.debug_bound_color);
            draw_bound_shape(display, &bound);
        }

        if self.bound_dirty || self.screen_size_fixed || self.kind.faces_camera() {
            self.refresh_bound(ctx.manager_id, ctx.manipulator_id, registry, bound);
        }
    }

    /// Register `bound` for this view, or replace the geometry of its
    /// existing registration.
    pub fn refresh_bound(
        &mut self,
        manager_id: ManipulatorManagerId,
        manipulator_id: ManipulatorId,
        registry: &mut ManipulatorBoundRegistry,
        bound: BoundShape,
    ) {
        // Released behind the view's back, e.g. with the manipulator that
        // used to own it.
        if let Some(stale) = self.bound_id.filter(|id| !registry.contains(*id)) {
            debug!("bound {stale:?} of {manipulator_id} was released, registering anew");
            self.bound_id = None;
        }
        match registry.update_bound(manager_id, manipulator_id, self.bound_id, bound) {
            Ok(bound_id) => {
                self.bound_id = Some(bound_id);
                self.bound_dirty = false;
            }
            Err(err) => warn!("failed to refresh bound for {manipulator_id}: {err}"),
        }
    }

    /// Mark the view's bound out of date so the next draw refreshes it.
    pub fn set_bound_dirty(&mut self, registry: &mut ManipulatorBoundRegistry) {
        if let Some(bound_id) = self.bound_id {
            if let Err(err) = registry.set_bound_dirty(bound_id) {
                warn!("failed to mark bound dirty: {err}");
            }
        }
        self.bound_dirty = true;
    }

    /// Remove the view's bound from the registry. The view is unregistered
    /// afterwards and re-registers on its next draw.
    pub fn invalidate(&mut self, registry: &mut ManipulatorBoundRegistry) {
        if let Some(bound_id) = self.bound_id.take() {
            registry.delete_bound(bound_id);
        }
        self.bound_dirty = true;
    }
}
