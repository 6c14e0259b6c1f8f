//! The binding environment injected into script runs.
//!
//! Scripts see:
//! - geometry constructors: `point(x, y [, z])`, `vector(x, y [, z])`,
//!   `line(start, end)`, `arc(center, radius, start_angle, sweep_angle,
//!   normal)`, `plane(normal, origin)`, `bounding_box(min, max)`,
//!   `coordinate_system(x, y, z, origin)`, `matrix()` / `matrix(x, y, z, t)`
//! - combination operators: `point + vector`, `vector + vector`,
//!   `point - point`, `vector * scalar`
//! - `visualizer.show(value)` to render a value into the scene
//! - the scene handle proxy: `scene.len()`, `scene.remove(index)`,
//!   `scene.clear()`; the permanent helpers are untouchable through it
//! - fixture bindings: `json0..jsonN`, `fixtures()`, `fixture_points()`
//! - `print` / `debug`, forwarded to the host log with a per-run cap
//!
//! Numeric arguments accept both script ints and floats.

use rhai::{Dynamic, Engine, EvalAltResult, Scope};

use crate::fixtures::{dynamic_to_json, FixtureSet};
use crate::geometry::{
    self, Arc, BoundingBox, CoordinateSystem, GeometryValue, Line, Matrix, Plane, Point, Vector,
};
use crate::scene::SceneHandle;
use crate::script_log::{script_log, LogLevel};
use crate::transpile::SandboxLimits;
use crate::visualizer::Visualizer;

/// Coerce a script number (int or float) to `f32`.
fn to_f32(value: &Dynamic) -> Result<f32, Box<EvalAltResult>> {
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f32);
    }
    Err(format!("expected a number, got {}", value.type_name()).into())
}

/// Scene handle proxy exposed to scripts.
#[derive(Clone)]
pub struct ScriptScene(SceneHandle);

impl ScriptScene {
    pub fn new(scene: SceneHandle) -> Self {
        Self(scene)
    }
}

/// Interpret a script value as geometry.
///
/// Typed values come straight from the constructors; maps (fixtures, or
/// literals built in the script) are decoded through the JSON wire form so
/// they follow the same tag rules.
pub fn geometry_from_dynamic(value: &Dynamic) -> Result<GeometryValue, String> {
    if let Some(p) = value.clone().try_cast::<Point>() {
        return Ok(p.into());
    }
    if let Some(v) = value.clone().try_cast::<Vector>() {
        return Ok(v.into());
    }
    if let Some(l) = value.clone().try_cast::<Line>() {
        return Ok(l.into());
    }
    if let Some(a) = value.clone().try_cast::<Arc>() {
        return Ok(a.into());
    }
    if let Some(p) = value.clone().try_cast::<Plane>() {
        return Ok(p.into());
    }
    if let Some(b) = value.clone().try_cast::<BoundingBox>() {
        return Ok(b.into());
    }
    if let Some(c) = value.clone().try_cast::<CoordinateSystem>() {
        return Ok(c.into());
    }
    if let Some(m) = value.clone().try_cast::<Matrix>() {
        return Ok(m.into());
    }

    if value.is_map() {
        let json = dynamic_to_json(value)
            .ok_or_else(|| "map contains values with no JSON form".to_string())?;
        return geometry::from_json(&json).map_err(|e| e.to_string());
    }

    Err(format!("{} is not a geometry value", value.type_name()))
}

fn show_dynamic(viz: &Visualizer, value: &Dynamic) {
    match geometry_from_dynamic(value) {
        Ok(geometry) => viz.show(&geometry),
        // Unknown tags are non-fatal: warn and keep going.
        Err(msg) => log::warn!("show: {msg}"),
    }
}

/// Build an engine with the sandbox limits and the geometry API registered.
/// This part of the environment is identical for every run.
pub fn build_engine(limits: &SandboxLimits) -> Engine {
    let mut engine = Engine::new();
    limits.apply(&mut engine);

    engine.on_print(|s| script_log(LogLevel::Info, s));
    engine.on_debug(|s, _source, pos| script_log(LogLevel::Debug, &format!("{s} @ {pos}")));

    register_geometry_types(&mut engine);
    register_constructors(&mut engine);
    register_operators(&mut engine);
    register_scene_types(&mut engine);

    engine
}

fn register_geometry_types(engine: &mut Engine) {
    engine.register_type_with_name::<Point>("Point");
    engine.register_get("x", |p: &mut Point| p.x);
    engine.register_get("y", |p: &mut Point| p.y);
    engine.register_get("z", |p: &mut Point| p.z);
    engine.register_fn("to_string", |p: &mut Point| {
        format!("point({}, {}, {})", p.x, p.y, p.z)
    });

    engine.register_type_with_name::<Vector>("Vector");
    engine.register_get("x", |v: &mut Vector| v.x);
    engine.register_get("y", |v: &mut Vector| v.y);
    engine.register_get("z", |v: &mut Vector| v.z);
    engine.register_fn("length", |v: &mut Vector| v.length());
    engine.register_fn("to_string", |v: &mut Vector| {
        format!("vector({}, {}, {})", v.x, v.y, v.z)
    });

    engine.register_type_with_name::<Line>("Line");
    engine.register_get("start", |l: &mut Line| l.start);
    engine.register_get("end", |l: &mut Line| l.end);
    engine.register_fn("to_string", |l: &mut Line| {
        format!(
            "line(({}, {}, {}) -> ({}, {}, {}))",
            l.start.x, l.start.y, l.start.z, l.end.x, l.end.y, l.end.z
        )
    });

    engine.register_type_with_name::<Arc>("Arc");
    engine.register_get("center", |a: &mut Arc| a.center);
    engine.register_get("radius", |a: &mut Arc| a.radius);
    engine.register_get("start_angle", |a: &mut Arc| a.start_angle);
    engine.register_get("sweep_angle", |a: &mut Arc| a.sweep_angle);
    engine.register_get("normal", |a: &mut Arc| a.normal);

    engine.register_type_with_name::<Plane>("Plane");
    engine.register_get("normal", |p: &mut Plane| p.normal);
    engine.register_get("origin", |p: &mut Plane| p.origin);

    engine.register_type_with_name::<BoundingBox>("BoundingBox");
    engine.register_get("min", |b: &mut BoundingBox| b.min);
    engine.register_get("max", |b: &mut BoundingBox| b.max);

    engine.register_type_with_name::<CoordinateSystem>("CoordinateSystem");
    engine.register_get("x_axis", |c: &mut CoordinateSystem| c.x_axis);
    engine.register_get("y_axis", |c: &mut CoordinateSystem| c.y_axis);
    engine.register_get("z_axis", |c: &mut CoordinateSystem| c.z_axis);
    engine.register_get("origin", |c: &mut CoordinateSystem| c.origin);

    engine.register_type_with_name::<Matrix>("Matrix");
    engine.register_get("x_axis", |m: &mut Matrix| m.x_axis);
    engine.register_get("y_axis", |m: &mut Matrix| m.y_axis);
    engine.register_get("z_axis", |m: &mut Matrix| m.z_axis);
    engine.register_get("translation", |m: &mut Matrix| m.translation);
}

fn register_constructors(engine: &mut Engine) {
    engine.register_fn("point", |x: Dynamic, y: Dynamic| -> Result<Point, Box<EvalAltResult>> {
        Ok(Point::new(to_f32(&x)?, to_f32(&y)?, 0.0))
    });
    engine.register_fn(
        "point",
        |x: Dynamic, y: Dynamic, z: Dynamic| -> Result<Point, Box<EvalAltResult>> {
            Ok(Point::new(to_f32(&x)?, to_f32(&y)?, to_f32(&z)?))
        },
    );

    engine.register_fn("vector", |x: Dynamic, y: Dynamic| -> Result<Vector, Box<EvalAltResult>> {
        Ok(Vector::new(to_f32(&x)?, to_f32(&y)?, 0.0))
    });
    engine.register_fn(
        "vector",
        |x: Dynamic, y: Dynamic, z: Dynamic| -> Result<Vector, Box<EvalAltResult>> {
            Ok(Vector::new(to_f32(&x)?, to_f32(&y)?, to_f32(&z)?))
        },
    );

    engine.register_fn("line", |start: Point, end: Point| Line::new(start, end));

    engine.register_fn(
        "arc",
        |center: Point,
         radius: Dynamic,
         start_angle: Dynamic,
         sweep_angle: Dynamic,
         normal: Vector|
         -> Result<Arc, Box<EvalAltResult>> {
            Ok(Arc::new(
                center,
                to_f32(&radius)?,
                to_f32(&start_angle)?,
                to_f32(&sweep_angle)?,
                normal,
            ))
        },
    );

    engine.register_fn("plane", |normal: Vector, origin: Point| Plane::new(normal, origin));

    engine.register_fn("bounding_box", |min: Point, max: Point| BoundingBox::new(min, max));

    engine.register_fn(
        "coordinate_system",
        |x_axis: Vector, y_axis: Vector, z_axis: Vector, origin: Point| {
            CoordinateSystem::new(x_axis, y_axis, z_axis, origin)
        },
    );

    engine.register_fn("matrix", || Matrix::identity());
    engine.register_fn(
        "matrix",
        |x_axis: Vector, y_axis: Vector, z_axis: Vector, translation: Vector| {
            Matrix::from_axes(x_axis, y_axis, z_axis, translation)
        },
    );
}

fn register_operators(engine: &mut Engine) {
    engine.register_fn("+", |p: Point, v: Vector| p + v);
    engine.register_fn("+", |a: Vector, b: Vector| a + b);
    engine.register_fn("-", |a: Point, b: Point| a - b);
    engine.register_fn("*", |v: Vector, s: Dynamic| -> Result<Vector, Box<EvalAltResult>> {
        Ok(v * to_f32(&s)?)
    });
}

fn register_scene_types(engine: &mut Engine) {
    engine.register_type_with_name::<Visualizer>("Visualizer");
    engine.register_fn("show", |viz: &mut Visualizer, value: Dynamic| {
        show_dynamic(viz, &value);
    });

    engine.register_type_with_name::<ScriptScene>("Scene");
    engine.register_fn("len", |s: &mut ScriptScene| s.0.borrow().len() as i64);
    engine.register_fn("remove", |s: &mut ScriptScene, index: i64| -> bool {
        if index < 0 {
            return false;
        }
        s.0.borrow_mut().remove(index as usize).is_some()
    });
    engine.register_fn("clear", |s: &mut ScriptScene| {
        s.0.borrow_mut().clear_transient();
    });
}

/// Install the per-run bindings: the visualizer and scene proxies plus the
/// fixture values attached by the user.
pub fn install_bindings(
    engine: &mut Engine,
    scope: &mut Scope,
    scene: &SceneHandle,
    fixtures: &FixtureSet,
) {
    scope.push("visualizer", Visualizer::new(scene.clone()));
    scope.push("scene", ScriptScene::new(scene.clone()));

    let values = fixtures.to_dynamic();
    for (i, value) in values.iter().enumerate() {
        scope.push_dynamic(format!("json{i}"), value.clone());
    }

    let all = values;
    engine.register_fn("fixtures", move || -> rhai::Array { all.clone() });

    let points = fixtures.points();
    engine.register_fn("fixture_points", move || -> rhai::Array {
        points.iter().copied().map(Dynamic::from).collect()
    });
}
