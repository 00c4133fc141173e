use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Smallest X/Y scale a surface may reach before updates are rejected.
pub const SCALE_FLOOR: f32 = 1e-4;

pub const DEFAULT_POSITION: Vec3 = Vec3::new(0.02, -0.09, 1.0);
pub const DEFAULT_ROTATION_DEGREES: Vec3 = Vec3::new(0.0, 180.0, 0.0);
pub const DEFAULT_SCALE: Vec3 = Vec3::ONE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    pub fn index(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }

    /// Sign of this eye's lateral offset when the surfaces are pulled apart.
    pub fn lateral_sign(self) -> f32 {
        match self {
            Eye::Left => -1.0,
            Eye::Right => 1.0,
        }
    }
}

/// Position, Euler rotation (degrees) and scale of one quad.
///
/// Rotation is stored as Euler angles because that is what profiles persist;
/// composition goes through [`Transform::rotation_quat`]. The Euler order
/// applies Z, then X, then Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: DEFAULT_POSITION, rotation: DEFAULT_ROTATION_DEGREES, scale: DEFAULT_SCALE }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y.to_radians(),
            self.rotation.x.to_radians(),
            self.rotation.z.to_radians(),
        )
    }

    pub fn set_rotation_quat(&mut self, rotation: Quat) {
        let (yaw, pitch, roll) = rotation.normalize().to_euler(EulerRot::YXZ);
        self.rotation = Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees());
    }

    pub fn scale_above_floor(scale: Vec3) -> bool {
        scale.x >= SCALE_FLOOR && scale.y >= SCALE_FLOOR
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeSurface {
    pub eye: Eye,
    pub transform: Transform,
}

impl EyeSurface {
    pub fn new(eye: Eye) -> Self {
        Self { eye, transform: Transform::default() }
    }
}

/// The pair of eye surfaces. Each eye owns its own transform.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoRig {
    surfaces: [EyeSurface; 2],
}

impl Default for StereoRig {
    fn default() -> Self {
        Self { surfaces: [EyeSurface::new(Eye::Left), EyeSurface::new(Eye::Right)] }
    }
}

impl StereoRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&self, eye: Eye) -> &EyeSurface {
        &self.surfaces[eye.index()]
    }

    pub fn surface_mut(&mut self, eye: Eye) -> &mut EyeSurface {
        &mut self.surfaces[eye.index()]
    }

    pub fn transform(&self, eye: Eye) -> &Transform {
        &self.surfaces[eye.index()].transform
    }

    pub fn transform_mut(&mut self, eye: Eye) -> &mut Transform {
        &mut self.surfaces[eye.index()].transform
    }

    pub fn set_transform(&mut self, eye: Eye, transform: Transform) {
        self.surfaces[eye.index()].transform = transform;
    }

    pub fn snapshot(&self) -> [Transform; 2] {
        [self.surfaces[0].transform, self.surfaces[1].transform]
    }

    pub fn restore(&mut self, snapshot: [Transform; 2]) {
        self.surfaces[0].transform = snapshot[0];
        self.surfaces[1].transform = snapshot[1];
    }

    pub fn reset_to_defaults(&mut self) {
        for surface in &mut self.surfaces {
            surface.transform = Transform::default();
        }
    }
}
