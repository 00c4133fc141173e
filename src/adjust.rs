use crate::config::SpeedConfig;
use crate::surface::{Eye, EyeSurface, Transform};
use crate::wrap_degrees;
use glam::{Vec2, Vec3};

/// Meters of lateral/vertical travel per unit stick per unit `position_speed`, per frame.
pub const K_POS: f32 = 1e-3;
/// Scale change per unit stick per unit `scale_speed`, per frame.
pub const K_DEPTH: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdjustmentMode {
    #[default]
    Move,
    Rotate,
    Depth,
}

impl AdjustmentMode {
    pub const ALL: [AdjustmentMode; 3] = [AdjustmentMode::Move, AdjustmentMode::Rotate, AdjustmentMode::Depth];

    /// Next mode in declared order, wrapping.
    pub fn next(self) -> Self {
        match self {
            AdjustmentMode::Move => AdjustmentMode::Rotate,
            AdjustmentMode::Rotate => AdjustmentMode::Depth,
            AdjustmentMode::Depth => AdjustmentMode::Move,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AdjustmentMode::Move => "Move",
            AdjustmentMode::Rotate => "Rotate",
            AdjustmentMode::Depth => "Depth",
        }
    }
}

/// Applies one frame of stick input to a surface. `stick` must already be deadzone-filtered.
///
/// Returns true when the transform changed. A depth update that would push X or Y
/// scale under [`crate::surface::SCALE_FLOOR`] leaves scale and depth untouched, though
/// the lateral part of the same frame still applies.
pub fn adjust_surface(surface: &mut EyeSurface, mode: AdjustmentMode, stick: Vec2, speeds: &SpeedConfig) -> bool {
    let transform = &mut surface.transform;
    match mode {
        AdjustmentMode::Move => translate(transform, Vec3::new(stick.x, stick.y, 0.0), speeds),
        AdjustmentMode::Rotate => {
            if stick.x == 0.0 {
                return false;
            }
            transform.rotation.z = wrap_degrees(transform.rotation.z + stick.x * speeds.rotation_speed);
            true
        }
        AdjustmentMode::Depth => {
            let lateral = translate(transform, Vec3::new(stick.x, 0.0, 0.0), speeds);
            let depth = push_depth(transform, stick.y, speeds);
            lateral || depth
        }
    }
}

fn translate(transform: &mut Transform, direction: Vec3, speeds: &SpeedConfig) -> bool {
    if direction == Vec3::ZERO {
        return false;
    }
    transform.position += direction * speeds.position_speed * K_POS;
    true
}

// Scale and Z move together: growing pushes the surface away, shrinking brings it closer.
fn push_depth(transform: &mut Transform, amount: f32, speeds: &SpeedConfig) -> bool {
    if amount == 0.0 {
        return false;
    }
    let delta_scale = amount * speeds.scale_speed * K_DEPTH;
    let scale = transform.scale + Vec3::new(delta_scale, delta_scale, 0.0);
    if !Transform::scale_above_floor(scale) {
        return false;
    }
    transform.scale = scale;
    transform.position.z += amount * speeds.depth_adjust_speed;
    true
}

/// Current mode for each eye. The eyes cycle independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EyeModes {
    modes: [AdjustmentMode; 2],
}

impl EyeModes {
    pub fn get(&self, eye: Eye) -> AdjustmentMode {
        self.modes[eye.index()]
    }

    pub fn set(&mut self, eye: Eye, mode: AdjustmentMode) {
        self.modes[eye.index()] = mode;
    }

    pub fn cycle(&mut self, eye: Eye) -> AdjustmentMode {
        let next = self.get(eye).next();
        self.set(eye, next);
        next
    }

    pub fn set_all(&mut self, mode: AdjustmentMode) {
        self.modes = [mode; 2];
    }
}
