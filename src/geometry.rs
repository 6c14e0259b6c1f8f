//! Geometry value types for the playground.
//!
//! Every value a script can build is one of the closed set of variants in
//! [`GeometryValue`]. Values are immutable: constructors and the arithmetic
//! operators always allocate a new value. Coordinates are plain `f32` with no
//! validation beyond type; non-finite numbers pass through untouched.
//!
//! The serde wire form uses a `type` tag with camelCase variant names
//! (`point`, `line`, `boundingBox`, ...), which is also the form fixture
//! documents use.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A location in 3-space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Point {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_vec3(self) -> glam::Vec3 {
        glam::Vec3::new(self.x, self.y, self.z)
    }

    pub fn from_vec3(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// A direction or offset. Structurally identical to [`Point`] but a distinct
/// type: a vector is not a location and the two do not interchange in typed
/// contexts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Vector {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        self.to_vec3().length()
    }

    pub fn to_vec3(self) -> glam::Vec3 {
        glam::Vec3::new(self.x, self.y, self.z)
    }

    pub fn from_vec3(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Translating a point by a vector yields a new point.
impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, v: Vector) -> Point {
        Point::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, other: Vector) -> Vector {
        Vector::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

/// The offset between two points.
impl Sub for Point {
    type Output = Vector;

    fn sub(self, other: Point) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;

    fn mul(self, s: f32) -> Vector {
        Vector::new(self.x * s, self.y * s, self.z * s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// A circular arc in the plane perpendicular to `normal`, swept from
/// `start_angle` by `sweep_angle` (radians).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arc {
    pub center: Point,
    pub radius: f32,
    pub start_angle: f32,
    pub sweep_angle: f32,
    pub normal: Vector,
}

impl Arc {
    pub fn new(center: Point, radius: f32, start_angle: f32, sweep_angle: f32, normal: Vector) -> Self {
        Self {
            center,
            radius,
            start_angle,
            sweep_angle,
            normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector,
    pub origin: Point,
}

impl Plane {
    pub fn new(normal: Vector, origin: Point) -> Self {
        Self { normal, origin }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateSystem {
    pub x_axis: Vector,
    pub y_axis: Vector,
    pub z_axis: Vector,
    pub origin: Point,
}

impl CoordinateSystem {
    pub fn new(x_axis: Vector, y_axis: Vector, z_axis: Vector, origin: Point) -> Self {
        Self {
            x_axis,
            y_axis,
            z_axis,
            origin,
        }
    }
}

/// A 3x4 transform: three basis axes plus a translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matrix {
    pub x_axis: Vector,
    pub y_axis: Vector,
    pub z_axis: Vector,
    pub translation: Vector,
}

impl Matrix {
    pub fn identity() -> Self {
        Self::from_axes(
            Vector::new(1.0, 0.0, 0.0),
            Vector::new(0.0, 1.0, 0.0),
            Vector::new(0.0, 0.0, 1.0),
            Vector::new(0.0, 0.0, 0.0),
        )
    }

    pub fn from_axes(x_axis: Vector, y_axis: Vector, z_axis: Vector, translation: Vector) -> Self {
        Self {
            x_axis,
            y_axis,
            z_axis,
            translation,
        }
    }

    /// The 9 linear components followed by the 3 translation components.
    pub fn components(&self) -> [f32; 12] {
        [
            self.x_axis.x,
            self.x_axis.y,
            self.x_axis.z,
            self.y_axis.x,
            self.y_axis.y,
            self.y_axis.z,
            self.z_axis.x,
            self.z_axis.y,
            self.z_axis.z,
            self.translation.x,
            self.translation.y,
            self.translation.z,
        ]
    }
}

/// The closed set of geometry values. Dispatch over this enum is exhaustive;
/// there is no "unknown" variant; unrecognized tags only exist at the JSON
/// and script boundaries and are rejected there (see [`from_json`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GeometryValue {
    Point(Point),
    Vector(Vector),
    Line(Line),
    Arc(Arc),
    Plane(Plane),
    BoundingBox(BoundingBox),
    CoordinateSystem(CoordinateSystem),
    Matrix(Matrix),
}

/// Tags accepted in the JSON wire form, in variant order.
pub const KNOWN_TAGS: [&str; 8] = [
    "point",
    "vector",
    "line",
    "arc",
    "plane",
    "boundingBox",
    "coordinateSystem",
    "matrix",
];

impl GeometryValue {
    /// The discriminant name, used for reporting and dynamic dispatch.
    pub fn tag(&self) -> &'static str {
        match self {
            GeometryValue::Point(_) => "point",
            GeometryValue::Vector(_) => "vector",
            GeometryValue::Line(_) => "line",
            GeometryValue::Arc(_) => "arc",
            GeometryValue::Plane(_) => "plane",
            GeometryValue::BoundingBox(_) => "boundingBox",
            GeometryValue::CoordinateSystem(_) => "coordinateSystem",
            GeometryValue::Matrix(_) => "matrix",
        }
    }
}

impl From<Point> for GeometryValue {
    fn from(v: Point) -> Self {
        GeometryValue::Point(v)
    }
}

impl From<Vector> for GeometryValue {
    fn from(v: Vector) -> Self {
        GeometryValue::Vector(v)
    }
}

impl From<Line> for GeometryValue {
    fn from(v: Line) -> Self {
        GeometryValue::Line(v)
    }
}

impl From<Arc> for GeometryValue {
    fn from(v: Arc) -> Self {
        GeometryValue::Arc(v)
    }
}

impl From<Plane> for GeometryValue {
    fn from(v: Plane) -> Self {
        GeometryValue::Plane(v)
    }
}

impl From<BoundingBox> for GeometryValue {
    fn from(v: BoundingBox) -> Self {
        GeometryValue::BoundingBox(v)
    }
}

impl From<CoordinateSystem> for GeometryValue {
    fn from(v: CoordinateSystem) -> Self {
        GeometryValue::CoordinateSystem(v)
    }
}

impl From<Matrix> for GeometryValue {
    fn from(v: Matrix) -> Self {
        GeometryValue::Matrix(v)
    }
}

/// Why a JSON document could not be decoded into a [`GeometryValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The `type` tag is present but not one of [`KNOWN_TAGS`].
    UnknownTag(String),
    /// Missing tag, wrong field types, or otherwise malformed.
    Malformed(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnknownTag(tag) => write!(f, "unknown geometry tag: {tag}"),
            DecodeError::Malformed(msg) => write!(f, "malformed geometry value: {msg}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode a JSON document into a geometry value.
///
/// The tag is checked before field decoding so an unrecognized kind is
/// distinguishable from a known kind with bad fields.
pub fn from_json(value: &serde_json::Value) -> Result<GeometryValue, DecodeError> {
    let tag = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| DecodeError::Malformed("missing \"type\" tag".to_string()))?;

    if !KNOWN_TAGS.contains(&tag) {
        return Err(DecodeError::UnknownTag(tag.to_string()));
    }

    serde_json::from_value(value.clone()).map_err(|e| DecodeError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_translated_by_vector() {
        let p = Point::new(1.0, 2.0, 3.0);
        let v = Vector::new(0.5, -1.0, 2.0);
        let q = p + v;

        assert_eq!(q, Point::new(1.5, 1.0, 5.0));
        // Original value untouched.
        assert_eq!(p, Point::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_point_difference_is_vector() {
        let a = Point::new(5.0, 5.0, 1.0);
        let b = Point::new(2.0, 3.0, 1.0);
        assert_eq!(a - b, Vector::new(3.0, 2.0, 0.0));
    }

    #[test]
    fn test_vector_scaling() {
        let v = Vector::new(1.0, -2.0, 0.5) * 2.0;
        assert_eq!(v, Vector::new(2.0, -4.0, 1.0));
    }

    #[test]
    fn test_tags_match_wire_form() {
        let values: Vec<GeometryValue> = vec![
            Point::new(0.0, 0.0, 0.0).into(),
            Vector::new(0.0, 0.0, 1.0).into(),
            Line::new(Point::default(), Point::new(1.0, 0.0, 0.0)).into(),
            Arc::new(Point::default(), 1.0, 0.0, 1.0, Vector::new(0.0, 0.0, 1.0)).into(),
            Plane::new(Vector::new(0.0, 0.0, 1.0), Point::default()).into(),
            BoundingBox::new(Point::default(), Point::new(1.0, 1.0, 1.0)).into(),
            CoordinateSystem::new(
                Vector::new(1.0, 0.0, 0.0),
                Vector::new(0.0, 1.0, 0.0),
                Vector::new(0.0, 0.0, 1.0),
                Point::default(),
            )
            .into(),
            Matrix::identity().into(),
        ];

        for (value, expected) in values.iter().zip(KNOWN_TAGS) {
            assert_eq!(value.tag(), expected);
            let json = serde_json::to_value(value).unwrap();
            assert_eq!(json["type"], expected);
        }
    }

    #[test]
    fn test_from_json_roundtrip() {
        let json = serde_json::json!({
            "type": "line",
            "start": { "x": 0.0, "y": 0.0, "z": 0.0 },
            "end": { "x": 5.0, "y": 5.0, "z": 1.0 },
        });

        let value = from_json(&json).unwrap();
        match value {
            GeometryValue::Line(line) => {
                assert_eq!(line.end, Point::new(5.0, 5.0, 1.0));
            }
            other => panic!("expected line, got {}", other.tag()),
        }
    }

    #[test]
    fn test_from_json_z_defaults_to_zero() {
        let json = serde_json::json!({ "type": "point", "x": 1.0, "y": 2.0 });
        let value = from_json(&json).unwrap();
        assert_eq!(value, GeometryValue::Point(Point::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_from_json_unknown_tag() {
        let json = serde_json::json!({ "type": "nurbsSurface", "x": 1.0 });
        match from_json(&json) {
            Err(DecodeError::UnknownTag(tag)) => assert_eq!(tag, "nurbsSurface"),
            other => panic!("expected unknown tag, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_missing_tag() {
        let json = serde_json::json!({ "x": 1.0, "y": 2.0 });
        assert!(matches!(from_json(&json), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_matrix_components_layout() {
        let m = Matrix::identity();
        assert_eq!(
            m.components(),
            [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_non_finite_coordinates_pass_through() {
        let p = Point::new(f32::NAN, f32::INFINITY, 0.0);
        assert!(p.x.is_nan());
        assert!(p.y.is_infinite());
    }
}
