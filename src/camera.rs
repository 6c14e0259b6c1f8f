//! Orbit camera state machine.
//!
//! The camera orbits a fixed target (the origin) with a fixed +Z up axis.
//! Two transitions exist: drag-rotate (pointer deltas while a drag is
//! active) and wheel-zoom along the target→camera direction. The target
//! never moves and the camera never translates off the orbit sphere except
//! along the zoom axis.
//!
//! [`OrbitCamera`] holds the pose and the pure delta-based transitions;
//! [`CameraController`] turns absolute pointer events into those deltas,
//! caching the pointer position at drag start. The host is expected to
//! suppress default scroll behavior before forwarding wheel events.

use glam::{Mat4, Vec3};

/// Raw pointer/wheel input, pixel coordinates relative to the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed { x: f32, y: f32 },
    Moved { x: f32, y: f32 },
    Released,
    Wheel { delta_y: f32 },
}

/// Orbit behavior constants.
#[derive(Debug, Clone)]
pub struct OrbitConfig {
    /// Radians of orbit per pixel of drag.
    pub rotate_speed: f32,
    /// World units moved per wheel notch.
    pub zoom_step: f32,
    /// Allowed distance band from the target.
    pub min_distance: f32,
    pub max_distance: f32,
    /// Keeps the inclination inside (margin, π − margin) so the camera never
    /// passes through the poles.
    pub pole_margin: f32,
    /// Perspective parameters handed to the host renderer.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 0.01,
            zoom_step: 1.0,
            min_distance: 5.0,
            max_distance: 100.0,
            pole_margin: 0.1,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Camera pose plus the orbit/zoom transitions.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    position: Vec3,
    config: OrbitConfig,
}

/// Fixed look-at target.
const TARGET: Vec3 = Vec3::ZERO;
/// Fixed up axis (the playground is z-up).
const UP: Vec3 = Vec3::Z;

impl OrbitCamera {
    pub fn new() -> Self {
        Self::with_config(OrbitConfig::default())
    }

    pub fn with_config(config: OrbitConfig) -> Self {
        Self {
            position: Vec3::new(15.0, -15.0, 15.0),
            config,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        TARGET
    }

    pub fn up(&self) -> Vec3 {
        UP
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn distance(&self) -> f32 {
        (self.position - TARGET).length()
    }

    /// Current inclination from the +Z pole, radians.
    pub fn inclination(&self) -> f32 {
        let r = self.distance();
        ((self.position.z - TARGET.z) / r).clamp(-1.0, 1.0).acos()
    }

    /// Rotate the orbit by pixel deltas: azimuth follows Δx, inclination
    /// follows −Δy and is clamped away from the poles.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let offset = self.position - TARGET;
        let r = offset.length();
        if r <= f32::EPSILON {
            return;
        }

        let theta = offset.x.atan2(offset.y);
        let phi = (offset.z / r).clamp(-1.0, 1.0).acos();

        let theta = theta + dx * self.config.rotate_speed;
        let phi = (phi - dy * self.config.rotate_speed).clamp(
            self.config.pole_margin,
            std::f32::consts::PI - self.config.pole_margin,
        );

        self.position = TARGET
            + Vec3::new(
                r * phi.sin() * theta.sin(),
                r * phi.sin() * theta.cos(),
                r * phi.cos(),
            );
    }

    /// Move along the target→camera direction by one signed step. The new
    /// position is rejected (old kept) if it leaves the distance band.
    pub fn zoom(&mut self, delta_y: f32) {
        let direction = (self.position - TARGET).normalize_or_zero();
        let sign = if delta_y > 0.0 { 1.0 } else { -1.0 };
        let candidate = self.position + direction * (sign * self.config.zoom_step);

        let distance = (candidate - TARGET).length();
        if distance >= self.config.min_distance && distance <= self.config.max_distance {
            self.position = candidate;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, TARGET, UP)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_degrees.to_radians(),
            aspect,
            self.config.near,
            self.config.far,
        )
    }

    pub fn view_projection_matrix(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts absolute pointer events into orbit deltas.
#[derive(Debug, Clone)]
pub struct CameraController {
    camera: OrbitCamera,
    dragging: bool,
    last_pointer: Option<(f32, f32)>,
}

impl CameraController {
    pub fn new(camera: OrbitCamera) -> Self {
        Self {
            camera,
            dragging: false,
            last_pointer: None,
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Pressed { x, y } => {
                self.dragging = true;
                self.last_pointer = Some((x, y));
            }
            PointerEvent::Released => {
                self.dragging = false;
            }
            PointerEvent::Moved { x, y } => {
                if !self.dragging {
                    return;
                }
                if let Some((px, py)) = self.last_pointer {
                    self.camera.orbit(x - px, y - py);
                }
                self.last_pointer = Some((x, y));
            }
            PointerEvent::Wheel { delta_y } => {
                self.camera.zoom(delta_y);
            }
        }
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(OrbitCamera::new())
    }
}
