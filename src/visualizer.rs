//! Mapping from geometry values to renderable scene objects.
//!
//! [`Visualizer::show`] is the single dispatch entry: it inspects the variant
//! and appends exactly one [`SceneObject`] per call. The match is exhaustive;
//! adding a geometry variant will not compile until a rendering arm exists.

use glam::Vec3;

use crate::geometry::{
    Arc, BoundingBox, CoordinateSystem, GeometryValue, Line, Matrix, Plane, Point, Vector,
};
use crate::scene::{SceneHandle, SceneObject, Color, DEFAULT_COLOR};

/// Default sizes used when a script does not specify any.
#[derive(Debug, Clone)]
pub struct VisualizerConfig {
    /// Sphere radius used for points.
    pub point_radius: f32,
    /// Half extent of the quad drawn for a plane.
    pub plane_half_extent: f32,
    /// Tessellation density for arcs, segments per full turn.
    pub arc_segments_per_turn: u32,
    /// Color applied to every primitive.
    pub color: Color,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            point_radius: 0.1,
            plane_half_extent: 1.0,
            arc_segments_per_turn: 48,
            color: DEFAULT_COLOR,
        }
    }
}

/// Renders geometry values into a shared scene.
#[derive(Clone)]
pub struct Visualizer {
    scene: SceneHandle,
    config: VisualizerConfig,
}

impl Visualizer {
    pub fn new(scene: SceneHandle) -> Self {
        Self {
            scene,
            config: VisualizerConfig::default(),
        }
    }

    pub fn with_config(scene: SceneHandle, config: VisualizerConfig) -> Self {
        Self { scene, config }
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    /// Render one geometry value. Appends exactly one scene object.
    pub fn show(&self, value: &GeometryValue) {
        let object = match value {
            GeometryValue::Point(p) => self.render_point(p),
            GeometryValue::Vector(v) => self.render_vector(v),
            GeometryValue::Line(l) => self.render_line(l),
            GeometryValue::Arc(a) => self.render_arc(a),
            GeometryValue::Plane(p) => self.render_plane(p),
            GeometryValue::BoundingBox(b) => self.render_bounding_box(b),
            GeometryValue::CoordinateSystem(c) => self.render_coordinate_system(c),
            GeometryValue::Matrix(m) => self.render_matrix(m),
        };
        self.scene.borrow_mut().push(object);
    }

    fn render_point(&self, p: &Point) -> SceneObject {
        SceneObject::Sphere {
            center: [p.x, p.y, p.z],
            radius: self.config.point_radius,
            color: self.config.color,
        }
    }

    fn render_vector(&self, v: &Vector) -> SceneObject {
        SceneObject::Arrow {
            start: [0.0, 0.0, 0.0],
            end: [v.x, v.y, v.z],
            color: self.config.color,
        }
    }

    fn render_line(&self, l: &Line) -> SceneObject {
        SceneObject::Segment {
            start: [l.start.x, l.start.y, l.start.z],
            end: [l.end.x, l.end.y, l.end.z],
            color: self.config.color,
        }
    }

    fn render_arc(&self, a: &Arc) -> SceneObject {
        let (u, v) = basis_from_normal(a.normal.to_vec3());
        let center = a.center.to_vec3();

        let turns = (a.sweep_angle.abs() / std::f32::consts::TAU).min(1.0);
        let segments = ((self.config.arc_segments_per_turn as f32 * turns).ceil() as u32).max(8);

        let mut points = Vec::with_capacity(segments as usize + 1);
        for i in 0..=segments {
            let t = i as f32 / segments as f32;
            let angle = a.start_angle + a.sweep_angle * t;
            let p = center + (u * angle.cos() + v * angle.sin()) * a.radius;
            points.push([p.x, p.y, p.z]);
        }

        SceneObject::Polyline {
            points,
            color: self.config.color,
        }
    }

    fn render_plane(&self, p: &Plane) -> SceneObject {
        let (u, v) = basis_from_normal(p.normal.to_vec3());
        let origin = p.origin.to_vec3();
        let s = self.config.plane_half_extent;

        let corner = |a: f32, b: f32| {
            let c = origin + u * (a * s) + v * (b * s);
            [c.x, c.y, c.z]
        };

        SceneObject::Quad {
            corners: [
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            ],
            color: self.config.color,
        }
    }

    fn render_bounding_box(&self, b: &BoundingBox) -> SceneObject {
        SceneObject::WireBox {
            min: [b.min.x, b.min.y, b.min.z],
            max: [b.max.x, b.max.y, b.max.z],
            color: self.config.color,
        }
    }

    fn render_coordinate_system(&self, c: &CoordinateSystem) -> SceneObject {
        SceneObject::Triad {
            origin: [c.origin.x, c.origin.y, c.origin.z],
            x: [c.x_axis.x, c.x_axis.y, c.x_axis.z],
            y: [c.y_axis.x, c.y_axis.y, c.y_axis.z],
            z: [c.z_axis.x, c.z_axis.y, c.z_axis.z],
        }
    }

    fn render_matrix(&self, m: &Matrix) -> SceneObject {
        SceneObject::Triad {
            origin: [m.translation.x, m.translation.y, m.translation.z],
            x: [m.x_axis.x, m.x_axis.y, m.x_axis.z],
            y: [m.y_axis.x, m.y_axis.y, m.y_axis.z],
            z: [m.z_axis.x, m.z_axis.y, m.z_axis.z],
        }
    }
}

/// Orthonormal basis spanning the plane perpendicular to `normal`.
///
/// A degenerate normal falls back to +Z so rendering still produces
/// something visible rather than NaN geometry.
fn basis_from_normal(normal: Vec3) -> (Vec3, Vec3) {
    let n = normal.try_normalize().unwrap_or(Vec3::Z);
    let reference = if n.z.abs() < 0.999 { Vec3::Z } else { Vec3::X };
    let u = reference.cross(n).normalize();
    let v = n.cross(u);
    (u, v)
}
