//! Scene state shared between the sandbox executor and the host render loop.
//!
//! The scene is an ordered sequence of renderable objects. The first
//! [`Scene::permanent_len`] entries are the permanent helpers (axis triad and
//! ground grid) installed at construction; no clear or removal operation may
//! touch them. Everything after the prefix belongs to the current script run.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

/// RGB color, linear components in `[0, 1]`.
pub type Color = [f32; 3];

/// Default object color, the original playground blue (#2563eb).
pub const DEFAULT_COLOR: Color = [0.145, 0.388, 0.922];

/// Grid line color (#576075).
pub const GRID_COLOR: Color = [0.341, 0.376, 0.459];

/// A renderable primitive. The host renderer decides how each kind is drawn;
/// the scene only carries plain data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneObject {
    /// Permanent axis helper at the origin.
    Axes { length: f32 },
    /// Permanent ground grid in the XY plane.
    Grid {
        extent: f32,
        divisions: u32,
        color: Color,
    },
    Sphere {
        center: [f32; 3],
        radius: f32,
        color: Color,
    },
    Segment {
        start: [f32; 3],
        end: [f32; 3],
        color: Color,
    },
    Arrow {
        start: [f32; 3],
        end: [f32; 3],
        color: Color,
    },
    Polyline {
        points: Vec<[f32; 3]>,
        color: Color,
    },
    Quad {
        corners: [[f32; 3]; 4],
        color: Color,
    },
    WireBox {
        min: [f32; 3],
        max: [f32; 3],
        color: Color,
    },
    /// Three colored basis segments from a common origin.
    Triad {
        origin: [f32; 3],
        x: [f32; 3],
        y: [f32; 3],
        z: [f32; 3],
    },
}

/// Ordered scene with a fixed permanent prefix.
#[derive(Debug, Serialize)]
pub struct Scene {
    objects: Vec<SceneObject>,
    permanent_len: usize,
}

/// Shared handle used by the executor, the visualizer, and the host render
/// loop. Everything runs on one thread, and objects are added or removed
/// whole, so the render loop never observes a half-built object.
pub type SceneHandle = Rc<RefCell<Scene>>;

impl Scene {
    /// Create a scene holding only the permanent helpers.
    pub fn new() -> Self {
        let objects = vec![
            SceneObject::Axes { length: 2.0 },
            SceneObject::Grid {
                extent: 30.0,
                divisions: 50,
                color: GRID_COLOR,
            },
        ];
        let permanent_len = objects.len();
        Self {
            objects,
            permanent_len,
        }
    }

    pub fn new_handle() -> SceneHandle {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Number of leading objects that survive every clear.
    pub fn permanent_len(&self) -> usize {
        self.permanent_len
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects added by the current script run.
    pub fn transient(&self) -> &[SceneObject] {
        &self.objects[self.permanent_len..]
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn push(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// Remove the object at `index`. Indices inside the permanent prefix are
    /// refused and `None` is returned.
    pub fn remove(&mut self, index: usize) -> Option<SceneObject> {
        if index < self.permanent_len || index >= self.objects.len() {
            return None;
        }
        Some(self.objects.remove(index))
    }

    /// Drop everything after the permanent prefix.
    pub fn clear_transient(&mut self) {
        self.objects.truncate(self.permanent_len);
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
